// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
	Inner,
	LeftOuter,
	RightOuter,
	FullOuter,
	/// Left rows with at least one match, each emitted once (EXISTS).
	LeftSemi,
	/// Left rows without any match (NOT EXISTS).
	LeftAntiSemi,
}

impl JoinType {
	/// Whether the output carries the right side's columns.
	pub fn emits_right(&self) -> bool {
		!matches!(self, JoinType::LeftSemi | JoinType::LeftAntiSemi)
	}

	pub fn is_outer(&self) -> bool {
		matches!(self, JoinType::LeftOuter | JoinType::RightOuter | JoinType::FullOuter)
	}
}

impl Display for JoinType {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			JoinType::Inner => "INNER",
			JoinType::LeftOuter => "LEFT OUTER",
			JoinType::RightOuter => "RIGHT OUTER",
			JoinType::FullOuter => "FULL OUTER",
			JoinType::LeftSemi => "LEFT SEMI",
			JoinType::LeftAntiSemi => "LEFT ANTI SEMI",
		})
	}
}
