// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

#![cfg_attr(not(debug_assertions), deny(warnings))]

//! Ambient per-request state (§4.6): subrequest accounting, pipeline and
//! request depth, and simulated time advancement, propagated implicitly to
//! every task spawned within a handler rather than threaded explicitly.

pub use context::{PipelineDepthGuard, RequestContext, RequestDepthGuard, SubrequestKind};
pub use usage::ConcurrencyTier;

mod context;
mod usage;

pub use miniflare_core::{Error, Result};
