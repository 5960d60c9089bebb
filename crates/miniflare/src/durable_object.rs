// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::sync::Arc;

use miniflare_config::TransactionLimits;
use miniflare_core::Result;
use miniflare_gates::DurableObjectGates;
use miniflare_storage::{ListOptions, Operator, StoredValue};
use miniflare_transaction::{OptimisticTransactionManager, ShadowTx};

/// The `DurableObjectStorage` binding (§6): every plain call runs as its
/// own one-shot OCC transaction, and every call that writes holds the
/// output gate for the duration so two writes issued back to back commit
/// as one coalesced unit (§4.3).
pub struct DurableObjectStorage {
    operator: Arc<dyn Operator>,
    manager: OptimisticTransactionManager,
    gates: DurableObjectGates,
}

impl DurableObjectStorage {
    pub fn new(operator: Arc<dyn Operator>, limits: TransactionLimits) -> DurableObjectStorage {
        DurableObjectStorage { manager: OptimisticTransactionManager::new(operator.clone(), limits), operator, gates: DurableObjectGates::new() }
    }

    pub fn gates(&self) -> &DurableObjectGates {
        &self.gates
    }

    pub async fn get(&self, key: &str) -> Result<Option<StoredValue>> {
        self.gates.await_open_output().await?;
        let key = key.to_string();
        self.manager.run_transaction(move |tx| tx.get(&key)).await
    }

    pub async fn put(&self, key: &str, value: StoredValue) -> Result<()> {
        let key = key.to_string();
        self.gates
            .run_with_closed_output(move || async move {
                self.manager.run_transaction(move |tx| tx.put(&key, value.clone())).await
            })
            .await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.gates
            .run_with_closed_output(move || async move { self.manager.run_transaction(move |tx| tx.delete(&key)).await })
            .await
    }

    pub async fn list(&self, options: ListOptions) -> Result<miniflare_storage::ListResult> {
        self.gates.await_open_output().await?;
        self.manager.run_transaction(move |tx| tx.list(options.clone())).await
    }

    /// Deletes every key in the object's storage. Unlike [`ShadowTx::delete_all`]
    /// (rejected inside an explicit transaction), this is the plain binding
    /// call and is allowed.
    pub async fn delete_all(&self) -> Result<usize> {
        self.gates
            .run_with_closed_output(|| async {
                let all = self.operator.list(ListOptions::default())?;
                let keys: Vec<String> = all.items.iter().map(|item| item.cursor_name().to_string()).collect();
                self.operator.delete_many(&keys)
            })
            .await
    }

    /// Runs an explicit multi-operation transaction (§4.2), retried on
    /// conflict, under the output gate so its writes are visible to
    /// external observers atomically once it commits.
    pub async fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: Fn(&mut ShadowTx<'_>) -> Result<T>,
    {
        self.gates.run_with_closed_output(|| self.manager.run_transaction(f)).await
    }
}
