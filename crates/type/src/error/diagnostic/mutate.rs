// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::error::{Diagnostic, ErrorKind};

pub fn blocked_without_filter(operation: &str) -> Diagnostic {
	Diagnostic {
		code: "MUTATE_001".to_string(),
		number: 50010,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("{} without a WHERE clause is blocked by the current options.", operation),
		label: None,
		help: Some(format!("add a WHERE clause or disable block_{}_without_where", operation.to_lowercase())),
		notes: vec![],
		cause: None,
	}
}

pub fn not_confirmed(operation: &str, count: usize) -> Diagnostic {
	Diagnostic {
		code: "MUTATE_002".to_string(),
		number: 3980,
		kind: ErrorKind::Cancelled,
		statement: None,
		message: format!("{} of {} records was cancelled.", operation, count),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn missing_key(entity: &str) -> Diagnostic {
	Diagnostic {
		code: "MUTATE_003".to_string(),
		number: 50011,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("No primary key column is available to address records of '{}'.", entity),
		label: None,
		help: Some("include the primary key columns in the source of the statement".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn null_key(entity: &str) -> Diagnostic {
	Diagnostic {
		code: "MUTATE_004".to_string(),
		number: 515,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Cannot address a record of '{}' with a NULL primary key.", entity),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn partial_write_note(written: usize) -> String {
	format!("{} records were written before the failure and were not rolled back", written)
}
