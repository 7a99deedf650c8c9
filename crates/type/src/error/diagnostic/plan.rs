// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use crate::error::{Diagnostic, ErrorKind};

fn plan(code: &str, number: u32, message: String) -> Diagnostic {
	Diagnostic {
		code: code.to_string(),
		number,
		kind: ErrorKind::Plan,
		statement: None,
		message,
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn window_function_not_allowed() -> Diagnostic {
	Diagnostic {
		code: "PLAN_001".to_string(),
		number: 4108,
		kind: ErrorKind::Plan,
		statement: None,
		message: "Windowed functions can only appear in the SELECT or ORDER BY clauses.".to_string(),
		label: Some("window function used in a filter".to_string()),
		help: Some("compute the window function in a derived table and filter on its result".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn aggregate_not_allowed() -> Diagnostic {
	Diagnostic {
		code: "PLAN_002".to_string(),
		number: 147,
		kind: ErrorKind::Plan,
		statement: None,
		message: "An aggregate may not appear in the WHERE clause unless it is in a subquery contained in a HAVING clause or a select list, and the column being aggregated is an outer reference.".to_string(),
		label: None,
		help: Some("move the condition to a HAVING clause".to_string()),
		notes: vec![],
		cause: None,
	}
}

pub fn aggregate_outside_grouping() -> Diagnostic {
	Diagnostic {
		code: "PLAN_003".to_string(),
		number: 8120,
		kind: ErrorKind::Plan,
		statement: None,
		message: "An aggregate function can only be evaluated by an aggregation or window operator.".to_string(),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn recursive_multiple_references(cte: &str) -> Diagnostic {
	plan(
		"PLAN_004",
		253,
		format!("Recursive member of a common table expression '{}' has multiple recursive references.", cte),
	)
}

pub fn recursive_top(cte: &str) -> Diagnostic {
	plan(
		"PLAN_005",
		461,
		format!(
			"The TOP operator is not allowed in the recursive part of a recursive common table expression '{}'.",
			cte
		),
	)
}

pub fn recursive_distinct(cte: &str) -> Diagnostic {
	plan(
		"PLAN_006",
		460,
		format!(
			"DISTINCT operator is not allowed in the recursive part of a recursive common table expression '{}'.",
			cte
		),
	)
}

pub fn recursive_aggregate(cte: &str) -> Diagnostic {
	plan(
		"PLAN_007",
		467,
		format!(
			"GROUP BY, HAVING, or aggregate functions are not allowed in the recursive part of a recursive common table expression '{}'.",
			cte
		),
	)
}

pub fn recursive_outer_join(cte: &str) -> Diagnostic {
	plan(
		"PLAN_008",
		462,
		format!(
			"Outer join is not allowed in the recursive part of a recursive common table expression '{}'.",
			cte
		),
	)
}

pub fn recursive_order_by() -> Diagnostic {
	plan(
		"PLAN_009",
		1033,
		"The ORDER BY clause is invalid in views, inline functions, derived tables, subqueries, and common table expressions, unless TOP, OFFSET or FOR XML is also specified.".to_string(),
	)
}

pub fn recursive_missing_reference(cte: &str) -> Diagnostic {
	plan("PLAN_010", 252, format!("Recursive common table expression '{}' has no recursive reference in its recursive member.", cte))
}

pub fn recursive_type_mismatch(cte: &str, column: &str) -> Diagnostic {
	plan(
		"PLAN_011",
		240,
		format!(
			"Types don't match between the anchor and the recursive part in column \"{}\" of recursive query \"{}\".",
			column, cte
		),
	)
}

pub fn unsupported_join(operator: &str, join: &str) -> Diagnostic {
	Diagnostic {
		code: "PLAN_012".to_string(),
		number: 8622,
		kind: ErrorKind::Plan,
		statement: None,
		message: format!("Query processor could not produce a query plan: {} does not support {} joins.", operator, join),
		label: None,
		help: None,
		notes: vec![],
		cause: None,
	}
}

pub fn top_requires_non_negative() -> Diagnostic {
	plan("PLAN_013", 1060, "The number of rows in the TOP clause must be an integer.".to_string())
}
