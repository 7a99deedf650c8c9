// SPDX-License-Identifier: MIT
// Copyright (c) 2025 ReifyDB

//! SQL value, type and collation system.

pub mod collation;
pub mod error;
pub mod params;
pub mod value;

pub use collation::{BinaryOrder, Collation, CollationError, DEFAULT_COLLATION};
pub use error::{Diagnostic, Error, ErrorKind, IntoDiagnostic, Result};
pub use params::Params;
pub use value::{
	ArithmeticOp, Decimal, Family, FromValue, GetType, IntoValue, KeyValue, OrderedF32, OrderedF64, Type, Value,
};
