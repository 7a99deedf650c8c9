// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::error::{Diagnostic, ErrorKind};

fn cursor(code: &str, number: u32, message: String) -> Diagnostic {
	Diagnostic {
		code: code.to_string(),
		number,
		kind: ErrorKind::Execution,
		statement: None,
		message,
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn already_open(name: &str) -> Diagnostic {
	cursor("CURSOR_001", 16905, format!("The cursor '{}' is already open.", name))
}

pub fn not_open(name: &str) -> Diagnostic {
	cursor("CURSOR_002", 16917, format!("Cursor '{}' is not open.", name))
}

pub fn not_found(name: &str) -> Diagnostic {
	cursor("CURSOR_003", 16916, format!("A cursor with the name '{}' does not exist.", name))
}

pub fn already_exists(name: &str) -> Diagnostic {
	cursor("CURSOR_004", 16915, format!("A cursor with the name '{}' already exists.", name))
}

pub fn fetch_into_mismatch(expected: usize, actual: usize) -> Diagnostic {
	let mut diagnostic = cursor(
		"CURSOR_005",
		16924,
		"Cursorfetch: The number of variables declared in the INTO list must match that of selected columns."
			.to_string(),
	);
	diagnostic.label = Some(format!("the cursor returns {} columns, {} variables were given", expected, actual));
	diagnostic
}

pub fn fetch_type_not_allowed(fetch: &str) -> Diagnostic {
	cursor(
		"CURSOR_006",
		16911,
		format!("fetch: The fetch type {} cannot be used with forward only cursors.", fetch),
	)
}
