// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::{
	error::{Diagnostic, ErrorKind},
	value::Type,
};

pub fn arithmetic_overflow(target: &Type) -> Diagnostic {
	Diagnostic {
		code: "NUMBER_001".to_string(),
		number: 8115,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Arithmetic overflow error converting expression to data type {}.", target),
		label: None,
		help: Some("Use a wider data type, for example bigint or decimal(38, s)".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn divide_by_zero() -> Diagnostic {
	Diagnostic {
		code: "NUMBER_002".to_string(),
		number: 8134,
		kind: ErrorKind::Execution,
		statement: None,
		message: "Divide by zero error encountered.".to_string(),
		label: None,
		help: Some("Guard the divisor with NULLIF(divisor, 0)".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn invalid_floating_point() -> Diagnostic {
	Diagnostic {
		code: "NUMBER_003".to_string(),
		number: 3623,
		kind: ErrorKind::Execution,
		statement: None,
		message: "An invalid floating point operation occurred.".to_string(),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
