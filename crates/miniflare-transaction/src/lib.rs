// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! The optimistic transaction manager (§4.2): Kung-Robinson OCC with a
//! bounded write-set history, running closures against a [`ShadowTx`] view
//! that buffers writes until the manager validates and commits them.

pub use manager::OptimisticTransactionManager;
pub use shadow::ShadowTx;
pub use version::CommitVersion;

mod manager;
mod shadow;
mod version;

pub use miniflare_core::{Error, Result};
