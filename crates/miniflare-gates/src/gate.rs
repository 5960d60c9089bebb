// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::collections::VecDeque;
use std::future::Future;

use tokio::sync::{oneshot, Mutex};
use tokio_util::sync::CancellationToken;

use miniflare_core::{Error, Result};

struct GateState {
    /// Depth rather than a bool so that closing the gate twice (a writer
    /// that issues another write while still inside its own closed section)
    /// does not let a third party observe the gate as open in between.
    closed_depth: u32,
    waiters: VecDeque<oneshot::Sender<()>>,
}

/// A FIFO gate (§4.3): closed while a critical section runs, queuing anyone
/// who asks to wait for it to reopen and releasing them in arrival order.
///
/// Closing is reentrant: running a closed section from inside another closed
/// section on the same gate just increments the depth, so nested writes
/// issued by the same logical call never deadlock against themselves.
pub struct Gate {
    state: Mutex<GateState>,
}

impl Gate {
    pub fn new() -> Self {
        Self { state: Mutex::new(GateState { closed_depth: 0, waiters: VecDeque::new() }) }
    }

    pub async fn is_closed(&self) -> bool {
        self.state.lock().await.closed_depth > 0
    }

    /// Runs `f` with the gate closed, then reopens it and wakes any queued
    /// waiters (oldest first) once the closed depth returns to zero.
    pub async fn run_closed<F, Fut, T>(&self, f: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        {
            let mut state = self.state.lock().await;
            state.closed_depth += 1;
        }
        let result = f().await;
        self.reopen().await;
        result
    }

    async fn reopen(&self) {
        let woken: Vec<oneshot::Sender<()>> = {
            let mut state = self.state.lock().await;
            state.closed_depth = state.closed_depth.saturating_sub(1);
            if state.closed_depth == 0 {
                state.waiters.drain(..).collect()
            } else {
                Vec::new()
            }
        };
        for waiter in woken {
            let _ = waiter.send(());
        }
    }

    /// Waits for the gate to be open, honoring `cancel`. A cancelled wait
    /// drops its queued receiver; the stale sender is discarded silently the
    /// next time the gate drains its queue, so other waiters are unaffected.
    pub async fn await_open(&self, cancel: &CancellationToken) -> Result<()> {
        let rx = {
            let mut state = self.state.lock().await;
            if state.closed_depth == 0 {
                return Ok(());
            }
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            rx
        };

        tokio::select! {
            res = rx => res.map_err(|_| Error::Cancelled),
            _ = cancel.cancelled() => Err(Error::Cancelled),
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
