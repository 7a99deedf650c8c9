// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

use std::sync::{
	Arc,
	atomic::{AtomicBool, Ordering},
};

use quarry_type::{Result, error::diagnostic::runtime::cancelled, return_error};
use tracing::debug;

/// Cooperative cancellation flag shared between the caller and a running
/// statement. Long running loops poll [`check`](Self::check).
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		debug!("cancellation requested");
		self.0.store(true, Ordering::Release);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::Acquire)
	}

	pub fn check(&self) -> Result<()> {
		if self.is_cancelled() {
			return_error!(cancelled());
		}
		Ok(())
	}
}
