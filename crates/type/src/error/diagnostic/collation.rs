// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::error::{Diagnostic, ErrorKind};

pub fn invalid_collation(name: &str, reason: &str) -> Diagnostic {
	Diagnostic {
		code: "COLLATION_001".to_string(),
		number: 448,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Invalid collation '{}'.", name),
		label: Some(reason.to_string()),
		help: Some(
			"Collation names combine a locale with sensitivity flags, e.g. Latin1_General_CI_AS or Latin1_General_BIN2"
				.to_string(),
		),
		notes: vec![],
		cause: None,
	}
}

pub fn collation_conflict(left: &str, right: &str, operation: &str) -> Diagnostic {
	Diagnostic {
		code: "COLLATION_002".to_string(),
		number: 468,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!(
			"Cannot resolve the collation conflict between \"{}\" and \"{}\" in the {} operation.",
			left, right, operation
		),
		label: None,
		help: Some("Apply an explicit COLLATE clause to one of the operands".to_string()),
		notes: vec![],
		cause: None,
	}
}
