// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! Diagnostic constructors grouped by the concern raising them.
//!
//! Every diagnostic carries a stable SQL Server compatible error number next
//! to the internal code, so callers can react to failures the same way they
//! would against a native server.

pub mod cast;
pub mod collation;
pub mod cursor;
pub mod internal;
pub mod mutate;
pub mod number;
pub mod plan;
pub mod query;
pub mod remote;
pub mod runtime;

pub use super::{Diagnostic, ErrorKind, IntoDiagnostic};

impl IntoDiagnostic for Diagnostic {
	fn into_diagnostic(self) -> Diagnostic {
		self
	}
}
