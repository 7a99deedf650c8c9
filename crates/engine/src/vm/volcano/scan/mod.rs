// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (c) 2025 ReifyDB

pub(crate) mod constant;
pub(crate) mod native;
pub(crate) mod remote;
