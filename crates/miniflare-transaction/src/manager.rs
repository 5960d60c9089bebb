// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use miniflare_config::TransactionLimits;
use miniflare_core::{Error, Result};
use miniflare_storage::Operator;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::shadow::ShadowTx;
use crate::version::CommitVersion;

struct OracleState {
    current_version: CommitVersion,
    /// The last `history_window` write-sets, newest at the back. A
    /// transaction whose `start_version` predates everything retained here
    /// is outside the bounded history and must conservatively restart.
    history: VecDeque<(CommitVersion, HashSet<String>)>,
}

/// The OCC transaction manager (§4.2): runs a closure against a [`ShadowTx`]
/// view, retrying on conflict until it commits or exhausts
/// [`TransactionLimits::max_retries`].
///
/// `run_transaction` is `async fn` purely so it composes with the
/// async gate/request-context layers above it — the retry loop itself never
/// awaits, matching §5's "no locks span suspension points except the
/// exclusive validate-and-write lock".
pub struct OptimisticTransactionManager {
    base: Arc<dyn Operator>,
    limits: TransactionLimits,
    oracle: Mutex<OracleState>,
}

enum CommitOutcome {
    Committed,
    RolledBack,
    Conflict,
}

impl OptimisticTransactionManager {
    pub fn new(base: Arc<dyn Operator>, limits: TransactionLimits) -> Self {
        Self {
            base,
            limits,
            oracle: Mutex::new(OracleState { current_version: CommitVersion::ZERO, history: VecDeque::new() }),
        }
    }

    pub fn current_version(&self) -> CommitVersion {
        self.oracle.lock().current_version
    }

    pub async fn run_transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: Fn(&mut ShadowTx<'_>) -> Result<T>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            if attempt > self.limits.max_retries {
                warn!(attempts = attempt, "transaction exceeded max retries");
                return Err(Error::TransactionAborted);
            }

            let start_version = self.current_version();
            let mut tx = ShadowTx::new(self.base.as_ref(), start_version, self.limits);
            let outcome = f(&mut tx)?;

            match self.validate_and_commit(&tx)? {
                CommitOutcome::Committed | CommitOutcome::RolledBack => return Ok(outcome),
                CommitOutcome::Conflict => {
                    debug!(attempt, start_version = start_version.0, "transaction conflict, retrying");
                    continue;
                }
            }
        }
    }

    fn validate_and_commit(&self, tx: &ShadowTx<'_>) -> Result<CommitOutcome> {
        let mut state = self.oracle.lock();

        if tx.is_rolled_back() {
            return Ok(CommitOutcome::RolledBack);
        }

        // Validation runs even for a read-only transaction (empty write
        // set): a closure that issues more than one read must still see a
        // consistent snapshot, which the read-set check enforces by forcing
        // a retry if a concurrent commit touched any key it read.
        let oldest_retained = state.history.front().map(|(v, _)| *v);
        if let Some(oldest) = oldest_retained {
            if state.history.len() >= self.limits.history_window && tx.start_version() < oldest {
                return Ok(CommitOutcome::Conflict);
            }
        }

        for (version, write_set) in state.history.iter() {
            if *version > tx.start_version() && !write_set.is_disjoint(tx.read_set()) {
                return Ok(CommitOutcome::Conflict);
            }
        }

        let puts: Vec<(String, miniflare_storage::StoredValue)> = tx
            .shadow()
            .iter()
            .filter_map(|(k, v)| v.clone().map(|value| (k.clone(), value)))
            .collect();
        let deletes: Vec<String> =
            tx.shadow().iter().filter(|(_, v)| v.is_none()).map(|(k, _)| k.clone()).collect();

        if !puts.is_empty() {
            self.base.put_many(&puts)?;
        }
        if !deletes.is_empty() {
            self.base.delete_many(&deletes)?;
        }

        let new_version = state.current_version.next();
        state.current_version = new_version;
        state.history.push_back((new_version, tx.write_set()));
        while state.history.len() > self.limits.history_window {
            state.history.pop_front();
        }

        Ok(CommitOutcome::Committed)
    }
}
