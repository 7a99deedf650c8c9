// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::{
	error::{Diagnostic, ErrorKind},
	value::Type,
};

pub fn conversion_failed(value: &str, from: &Type, to: &Type) -> Diagnostic {
	Diagnostic {
		code: "CAST_001".to_string(),
		number: 245,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Conversion failed when converting the {} value '{}' to data type {}.", from, value, to),
		label: None,
		help: Some(format!("Check that every value of the expression can be represented as {}", to)),
		notes: vec![],
		cause: None,
	}
}

pub fn unsupported_conversion(from: &Type, to: &Type) -> Diagnostic {
	Diagnostic {
		code: "CAST_002".to_string(),
		number: 529,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Explicit conversion from data type {} to {} is not allowed.", from, to),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn operand_type_clash(left: &Type, right: &Type) -> Diagnostic {
	Diagnostic {
		code: "CAST_003".to_string(),
		number: 206,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Operand type clash: {} is incompatible with {}", left, right),
		label: Some("the operands have no common type".to_string()),
		help: Some("Convert one of the operands explicitly with CAST or CONVERT".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn invalid_operand_for_operator(ty: &Type, operator: &str) -> Diagnostic {
	Diagnostic {
		code: "CAST_004".to_string(),
		number: 8117,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Operand data type {} is invalid for {} operator.", ty, operator),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
