// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::future::Future;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use miniflare_config::RequestLimits;
use miniflare_core::{Error, Result};
use tokio::task::JoinHandle;
use tokio::task_local;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::usage::ConcurrencyTier;

/// Whether a binding call counts against the internal or external
/// subrequest budget (§4.6): outbound `fetch` and cross-Worker calls are
/// external, Cache/KV/Durable-Object storage operations are internal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubrequestKind {
    Internal,
    External,
}

struct Inner {
    tier: ConcurrencyTier,
    external_limit: u32,
    request_depth: AtomicU32,
    pipeline_depth: AtomicU32,
    max_request_depth: u32,
    max_pipeline_depth: u32,
    internal_subrequests: AtomicU64,
    external_subrequests: AtomicU64,
    current_time_millis: AtomicU64,
    time_advance_millis: u64,
    cancel: CancellationToken,
}

task_local! {
    static CURRENT: RequestContext;
}

/// The ambient per-request state (§4.6): one instance is created per
/// top-level fetch and propagated implicitly to every task spawned inside
/// the handler via [`RequestContext::scope`] / [`RequestContext::spawn`].
///
/// Cloning shares the same counters; the clone is how the context reaches
/// spawned children, not a way to get an independent copy.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

impl RequestContext {
    pub fn new(tier: ConcurrencyTier, limits: &RequestLimits, now_millis: u64) -> Self {
        let external_limit = tier.external_limit(limits.external_limit_bundled, limits.external_limit_unbound);
        Self {
            inner: Arc::new(Inner {
                tier,
                external_limit,
                request_depth: AtomicU32::new(0),
                pipeline_depth: AtomicU32::new(0),
                max_request_depth: limits.max_request_depth,
                max_pipeline_depth: limits.max_pipeline_depth,
                internal_subrequests: AtomicU64::new(0),
                external_subrequests: AtomicU64::new(0),
                current_time_millis: AtomicU64::new(now_millis),
                time_advance_millis: limits.time_advance_millis,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn tier(&self) -> ConcurrencyTier {
        self.inner.tier
    }

    /// Establishes `self` as the ambient context for the duration of `fut`.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }

    /// The context ambient to the calling task, if any.
    pub fn try_current() -> Option<RequestContext> {
        CURRENT.try_with(|ctx| ctx.clone()).ok()
    }

    /// The ambient context, required for a binding call made while
    /// `block_global_async_io` is set: top-level module evaluation has no
    /// `RequestContext` to propagate, so the call fails per §4.6.
    pub fn current_or_outside_handler() -> Result<RequestContext> {
        Self::try_current().ok_or(Error::OutsideRequestHandler)
    }

    /// Spawns `fut` on the current runtime with this context propagated as
    /// ambient state, the way a handler's child tasks observe it.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let ctx = self.clone();
        tokio::spawn(ctx.scope(fut))
    }

    pub fn cancel(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    pub fn now_millis(&self) -> u64 {
        self.inner.current_time_millis.load(Ordering::SeqCst)
    }

    pub fn now_secs(&self) -> u64 {
        self.now_millis() / 1000
    }

    pub fn internal_subrequests(&self) -> u64 {
        self.inner.internal_subrequests.load(Ordering::SeqCst)
    }

    pub fn external_subrequests(&self) -> u64 {
        self.inner.external_subrequests.load(Ordering::SeqCst)
    }

    fn advance_time(&self) {
        self.inner.current_time_millis.fetch_add(self.inner.time_advance_millis, Ordering::SeqCst);
    }

    /// Called by every binding implementation before it does its work:
    /// advances simulated time and accounts the call against the
    /// appropriate subrequest budget, rejecting it if the context has been
    /// cancelled or the external limit has been exceeded.
    pub fn enter_binding_call(&self, kind: SubrequestKind) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.advance_time();
        match kind {
            SubrequestKind::External => {
                let count = self.inner.external_subrequests.fetch_add(1, Ordering::SeqCst) + 1;
                if count > self.inner.external_limit as u64 {
                    return Err(Error::SubrequestLimitExceeded);
                }
            }
            SubrequestKind::Internal => {
                self.inner.internal_subrequests.fetch_add(1, Ordering::SeqCst);
            }
        }
        trace!(
            internal = self.internal_subrequests(),
            external = self.external_subrequests(),
            now_millis = self.now_millis(),
            "binding call accounted"
        );
        Ok(())
    }

    /// Enters a nested `dispatchFetch`, bumping `requestDepth` for the
    /// duration of the returned guard and failing once the ceiling is hit.
    pub fn enter_dispatch_fetch(&self) -> Result<RequestDepthGuard> {
        let depth = self.inner.request_depth.fetch_add(1, Ordering::SeqCst) + 1;
        if depth > self.inner.max_request_depth {
            self.inner.request_depth.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::RequestDepthExceeded);
        }
        Ok(RequestDepthGuard { inner: self.inner.clone() })
    }

    /// Enters a service-binding hop, bumping `pipelineDepth` for the
    /// duration of the returned guard.
    pub fn enter_pipeline_hop(&self) -> Result<PipelineDepthGuard> {
        let depth = self.inner.pipeline_depth.fetch_add(1, Ordering::SeqCst) + 1;
        if depth > self.inner.max_pipeline_depth {
            self.inner.pipeline_depth.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::PipelineDepthExceeded);
        }
        Ok(PipelineDepthGuard { inner: self.inner.clone() })
    }
}

/// Releases one level of `requestDepth` when dropped.
pub struct RequestDepthGuard {
    inner: Arc<Inner>,
}

impl Drop for RequestDepthGuard {
    fn drop(&mut self) {
        self.inner.request_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Releases one level of `pipelineDepth` when dropped.
pub struct PipelineDepthGuard {
    inner: Arc<Inner>,
}

impl Drop for PipelineDepthGuard {
    fn drop(&mut self) {
        self.inner.pipeline_depth.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniflare_config::RequestLimits;

    fn ctx() -> RequestContext {
        RequestContext::new(ConcurrencyTier::Bundled, &RequestLimits::default(), 0)
    }

    #[tokio::test]
    async fn time_advances_once_per_binding_call() {
        let ctx = ctx();
        ctx.clone()
            .scope(async move {
                assert_eq!(ctx.now_millis(), 0);
                ctx.enter_binding_call(SubrequestKind::Internal).unwrap();
                assert_eq!(ctx.now_millis(), 1);
                ctx.enter_binding_call(SubrequestKind::Internal).unwrap();
                assert_eq!(ctx.now_millis(), 2);
            })
            .await;
    }

    #[tokio::test]
    async fn external_subrequests_beyond_the_limit_are_rejected() {
        let limits = RequestLimits { external_limit_bundled: 2, ..Default::default() };
        let ctx = RequestContext::new(ConcurrencyTier::Bundled, &limits, 0);
        ctx.enter_binding_call(SubrequestKind::External).unwrap();
        ctx.enter_binding_call(SubrequestKind::External).unwrap();
        let err = ctx.enter_binding_call(SubrequestKind::External).unwrap_err();
        assert_eq!(err, Error::SubrequestLimitExceeded);
    }

    #[tokio::test]
    async fn request_depth_guard_releases_on_drop() {
        let limits = RequestLimits { max_request_depth: 1, ..Default::default() };
        let ctx = RequestContext::new(ConcurrencyTier::Bundled, &limits, 0);
        {
            let _guard = ctx.enter_dispatch_fetch().unwrap();
            assert!(ctx.enter_dispatch_fetch().is_err());
        }
        assert!(ctx.enter_dispatch_fetch().is_ok());
    }

    #[tokio::test]
    async fn context_propagates_to_spawned_children() {
        let ctx = ctx();
        ctx.enter_binding_call(SubrequestKind::Internal).unwrap();
        let handle = ctx.spawn(async move {
            let inner = RequestContext::try_current().expect("context should propagate to spawned task");
            inner.internal_subrequests()
        });
        let count = handle.await.unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn cancelling_the_context_rejects_further_binding_calls() {
        let ctx = ctx();
        ctx.cancel();
        let err = ctx.enter_binding_call(SubrequestKind::Internal).unwrap_err();
        assert_eq!(err, Error::Cancelled);
    }

    #[test]
    fn no_ambient_context_outside_a_scope() {
        assert!(RequestContext::try_current().is_none());
    }
}
