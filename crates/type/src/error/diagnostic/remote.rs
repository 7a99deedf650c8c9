// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::error::{Diagnostic, ErrorKind};

pub fn data_source_not_found(name: &str) -> Diagnostic {
	Diagnostic {
		code: "REMOTE_001".to_string(),
		number: 208,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("Invalid object name '{}'.", name),
		label: Some("no data source is registered under this name".to_string()),
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// The remote store refused or failed a request it was able to understand.
pub fn request_failed(source: &str, message: &str) -> Diagnostic {
	Diagnostic {
		code: "REMOTE_002".to_string(),
		number: 50001,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!("The data source '{}' rejected the request: {}", source, message),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

/// The remote store cannot run this query shape. Fallback operators catch
/// exactly this kind and switch to their alternative plan.
pub fn incompatible_query(source: &str, reason: &str) -> Diagnostic {
	Diagnostic {
		code: "REMOTE_003".to_string(),
		number: 50002,
		kind: ErrorKind::Incompatible,
		statement: None,
		message: format!("The data source '{}' cannot execute this query: {}", source, reason),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn native_query_unavailable(source: &str) -> Diagnostic {
	Diagnostic {
		code: "REMOTE_004".to_string(),
		number: 50002,
		kind: ErrorKind::Incompatible,
		statement: None,
		message: format!("The native query endpoint of data source '{}' is not available.", source),
		label: None,
		help: Some("enable use_native_query_endpoint or let the engine evaluate the query locally".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn unexpected_shape(source: &str, expected: usize, actual: usize) -> Diagnostic {
	Diagnostic {
		code: "REMOTE_005".to_string(),
		number: 50003,
		kind: ErrorKind::Execution,
		statement: None,
		message: format!(
			"The data source '{}' returned rows with {} values where {} were expected.",
			source, actual, expected
		),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}
