// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

use std::collections::HashMap;

use crate::value::Value;

/// Statement parameters supplied by the caller.
///
/// Named parameters are matched case-insensitively and with or without the
/// leading `@`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Params {
	#[default]
	None,
	Positional(Vec<Value>),
	Named(HashMap<String, Value>),
}

impl Params {
	pub fn get_positional(&self, index: usize) -> Option<&Value> {
		match self {
			Params::Positional(values) => values.get(index),
			_ => None,
		}
	}

	pub fn get_named(&self, name: &str) -> Option<&Value> {
		match self {
			Params::Named(map) => map.get(&normalize_name(name)),
			_ => None,
		}
	}

	pub fn empty() -> Params {
		Params::None
	}

	/// Named view of the parameters; positional ones are exposed as `@p0`,
	/// `@p1`, ...
	pub fn into_named(self) -> HashMap<String, Value> {
		match self {
			Params::None => HashMap::new(),
			Params::Positional(values) => {
				values.into_iter().enumerate().map(|(i, v)| (format!("@p{}", i), v)).collect()
			}
			Params::Named(map) => map,
		}
	}
}

/// Lowercase, `@`-prefixed form used as the lookup key of variables and
/// parameters.
pub fn normalize_name(name: &str) -> String {
	let lower = name.to_lowercase();
	if lower.starts_with('@') {
		lower
	} else {
		format!("@{}", lower)
	}
}

impl From<()> for Params {
	fn from(_: ()) -> Self {
		Params::None
	}
}

impl From<Vec<Value>> for Params {
	fn from(values: Vec<Value>) -> Self {
		Params::Positional(values)
	}
}

impl From<HashMap<String, Value>> for Params {
	fn from(map: HashMap<String, Value>) -> Self {
		Params::Named(map.into_iter().map(|(k, v)| (normalize_name(&k), v)).collect())
	}
}

impl<const N: usize> From<[Value; N]> for Params {
	fn from(values: [Value; N]) -> Self {
		Params::Positional(values.to_vec())
	}
}

#[macro_export]
macro_rules! params {
    () => {
        $crate::Params::None
    };

    {} => {
        $crate::Params::None
    };

    // Named parameters: params!{ name: value, "@key": value }
    { $($key:tt : $value:expr),+ $(,)? } => {
        {
            let mut map = ::std::collections::HashMap::new();
            $(
                map.insert($crate::params::normalize_name(&$crate::params_key!($key)), $crate::IntoValue::into_value($value));
            )*
            $crate::Params::Named(map)
        }
    };

    [] => {
        $crate::Params::None
    };

    [ $($value:expr),+ $(,)? ] => {
        {
            let values = vec![
                $($crate::IntoValue::into_value($value)),*
            ];
            $crate::Params::Positional(values)
        }
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! params_key {
	($key:ident) => {
		stringify!($key).to_string()
	};
	($key:literal) => {
		$key.to_string()
	};
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_params_macro_positional() {
		let params = params![42, true, "hello"];
		match params {
			Params::Positional(values) => {
				assert_eq!(values.len(), 3);
				assert_eq!(values[0], Value::Int(42));
				assert_eq!(values[1], Value::Boolean(true));
				assert_eq!(values[2], Value::nvarchar("hello"));
			}
			_ => panic!("Expected positional params"),
		}
	}

	#[test]
	fn test_params_macro_named() {
		let params = params! {
		    Name: "x",
		    "@limit": 10
		};
		assert_eq!(params.get_named("@name"), Some(&Value::nvarchar("x")));
		assert_eq!(params.get_named("LIMIT"), Some(&Value::Int(10)));
		assert_eq!(params.get_named("other"), None);
	}

	#[test]
	fn test_positional_into_named() {
		let named = params![1, 2].into_named();
		assert_eq!(named.get("@p1"), Some(&Value::Int(2)));
	}
}
