// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::error::{Diagnostic, ErrorKind};

pub fn cancelled() -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_001".to_string(),
		number: 3980,
		kind: ErrorKind::Cancelled,
		statement: None,
		message: "The operation was cancelled.".to_string(),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// A user-visible assertion raised by an assert operator.
pub fn assertion_failed(number: u32, message: &str) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_002".to_string(),
		number,
		kind: ErrorKind::Execution,
		statement: None,
		message: message.to_string(),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn max_recursion_message(max: u32) -> String {
	format!("The statement terminated. The maximum recursion {} has been exhausted before statement completion.", max)
}

pub fn invalid_length(function: &str) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_003".to_string(),
		number: 537,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Invalid length parameter passed to the {} function.", function),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn date_out_of_range(function: &str) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_004".to_string(),
		number: 517,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Adding a value to a 'datetime' column caused an overflow in {}.", function),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn subquery_returned_multiple_rows() -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_005".to_string(),
		number: 512,
		kind: ErrorKind::Execution,
		statement: None,
		message: "Subquery returned more than 1 value. This is not permitted when the subquery follows =, !=, <, <= , >, >= or when the subquery is used as an expression.".to_string(),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn no_current_row() -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_006".to_string(),
		number: 50020,
		kind: ErrorKind::Execution,
		statement: None,
		message: "Invalid attempt to read when no data is present.".to_string(),
		label: None,
		help: Some("call read() and check that it returned true before accessing values".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn ordinal_out_of_range(ordinal: usize, count: usize) -> Diagnostic {
	Diagnostic {
		code: "RUNTIME_007".to_string(),
		number: 50021,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Column ordinal {} is out of range.", ordinal),
		label: Some(format!("the result has {} columns", count)),
		help: None,
		notes: vec![],
		cause: None,
	}
}
