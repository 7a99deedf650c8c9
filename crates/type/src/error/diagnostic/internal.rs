// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::error::{Diagnostic, ErrorKind};

pub fn internal(message: impl Into<String>) -> Diagnostic {
	Diagnostic {
		code: "INTERNAL_001".to_string(),
		number: 50000,
		kind: ErrorKind::Internal,
		statement: None,
		message: message.into(),
		label: None,
		help: Some("this is a bug in the engine, please report it".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn node_reentered(node: usize) -> Diagnostic {
	internal(format!("plan node {} was re-entered while it was executing", node))
}

pub fn node_not_found(node: usize) -> Diagnostic {
	internal(format!("plan node {} does not exist", node))
}

pub fn not_initialized(operator: &str) -> Diagnostic {
	internal(format!("{} was pulled before it was initialized", operator))
}
