// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::{
	error::{Diagnostic, ErrorKind},
	value::Type,
};

pub fn column_not_found(name: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_001".to_string(),
		number: 207,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Invalid column name '{}'.", name),
		label: Some("this column does not exist in the current context".to_string()),
		help: Some("check for typos or ensure the column is produced by the input".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn ambiguous_column(name: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_002".to_string(),
		number: 209,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Ambiguous column name '{}'.", name),
		label: Some("more than one input column matches this name".to_string()),
		help: Some("qualify the column with its table alias".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn variable_not_declared(name: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_003".to_string(),
		number: 137,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Must declare the scalar variable \"{}\".", name),
		label: None,
		help: Some(format!("Declare the variable with 'DECLARE {} <type>' before using it", name)),
		notes: vec![],
		cause: None,
	}
}

pub fn variable_already_declared(name: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_004".to_string(),
		number: 134,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!(
			"The variable name '{}' has already been declared. Variable names must be unique within a query batch.",
			name
		),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn unknown_function(name: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_005".to_string(),
		number: 195,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("'{}' is not a recognized built-in function name.", name),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn function_argument_count(name: &str, expected: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_006".to_string(),
		number: 174,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("The {} function requires {} argument(s).", name, expected),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn parameter_not_bound(name: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_007".to_string(),
		number: 137,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Must declare the scalar variable \"{}\".", name),
		label: Some("no value was bound for this parameter when the statement ran".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn column_count_mismatch(expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "QUERY_008".to_string(),
		number: 205,
		kind: ErrorKind::Plan,
		statement: None,
		message: "All queries combined using a UNION, INTERSECT or EXCEPT operator must have an equal number of expressions in their target lists.".to_string(),
		label: Some(format!("expected {} columns, found {}", expected, actual)),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn invalid_argument_type(function: &str, position: usize, ty: &Type) -> Diagnostic {
	Diagnostic {
		code: "QUERY_009".to_string(),
		number: 8116,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Argument data type {} is invalid for argument {} of {} function.", ty, position, function),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn invalid_datepart(function: &str, part: &str) -> Diagnostic {
	Diagnostic {
		code: "QUERY_010".to_string(),
		number: 1023,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Invalid parameter 1 specified for {}.", function),
		label: Some(format!("'{}' is not a recognized datepart", part)),
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn non_boolean_predicate(ty: &Type) -> Diagnostic {
	Diagnostic {
		code: "QUERY_011".to_string(),
		number: 4145,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("An expression of non-boolean type {} specified in a context where a condition is expected.", ty),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
