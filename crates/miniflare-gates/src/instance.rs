// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use miniflare_core::Result;

use crate::gate::Gate;

/// The pair of gates a single Durable Object instance owns (§4.3): an input
/// gate that defers new event delivery while a write is outstanding, and an
/// output gate that defers outbound I/O until the writes that preceded it in
/// program order have been durably applied, giving callers write coalescing
/// for free when they group synchronous writes under one closed section.
pub struct DurableObjectGates {
    input: Gate,
    output: Gate,
    blocked: AtomicBool,
    cancel: CancellationToken,
}

impl DurableObjectGates {
    pub fn new() -> Self {
        Self { input: Gate::new(), output: Gate::new(), blocked: AtomicBool::new(false), cancel: CancellationToken::new() }
    }

    /// Cancels every waiter currently queued on either gate, e.g. because the
    /// instance is being evicted.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::Acquire)
    }

    /// Waits until new events may be delivered: the input gate must be open
    /// and the instance must not be inside a `block_concurrency_while` call.
    pub async fn admit_event(&self) -> Result<()> {
        loop {
            self.input.await_open(&self.cancel).await?;
            if !self.is_blocked() {
                return Ok(());
            }
            tokio::task::yield_now().await;
        }
    }

    /// Runs `f` with the input gate closed: no new event is delivered until
    /// it returns, matching a storage write's hold on the instance.
    pub async fn run_with_closed_input<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.input.run_closed(f).await
    }

    /// Runs `f` with the output gate closed: outbound I/O issued inside `f`
    /// is held until every write already queued ahead of it (in program
    /// order on this instance) has committed. Grouping several writes inside
    /// one closure is what coalesces them.
    pub async fn run_with_closed_output<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.output.run_closed(f).await
    }

    pub async fn await_open_output(&self) -> Result<()> {
        self.output.await_open(&self.cancel).await
    }

    /// Closes the input gate and marks the instance blocked for the duration
    /// of `f`, so even an event arriving while the gate happens to reopen
    /// between retries is refused until `f` completes.
    pub async fn block_concurrency_while<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.blocked.store(true, Ordering::Release);
        let result = self.input.run_closed(f).await;
        self.blocked.store(false, Ordering::Release);
        result
    }
}

impl Default for DurableObjectGates {
    fn default() -> Self {
        Self::new()
    }
}
