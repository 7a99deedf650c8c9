// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

//! Pull based execution operators. Every operator produces one row per
//! `next` call and is driven through the [`ExecutionPlan`](query::ExecutionPlan)
//! arena that owns it.

pub mod aggregate;
pub(crate) mod assert;
pub mod build;
pub(crate) mod compute;
pub(crate) mod concat;
pub(crate) mod distinct;
pub(crate) mod filter;
pub(crate) mod join;
pub(crate) mod project;
pub mod query;
pub(crate) mod scan;
pub(crate) mod sort;
pub mod spool;
pub(crate) mod top;
pub(crate) mod try_catch;
pub mod window;
