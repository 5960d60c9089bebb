// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use miniflare_config::TransactionLimits;
use miniflare_core::Error;
use miniflare_storage::{Memory, Operator, StoredValue};
use miniflare_transaction::OptimisticTransactionManager;

fn manager() -> (OptimisticTransactionManager, Arc<Memory>) {
    let memory = Arc::new(Memory::new());
    let manager = OptimisticTransactionManager::new(memory.clone(), TransactionLimits::default());
    (manager, memory)
}

#[tokio::test]
async fn put_then_get_round_trips_through_a_transaction() {
    let (manager, _memory) = manager();
    manager
        .run_transaction(|tx| {
            tx.put("a", StoredValue::new(b"1".to_vec()))?;
            Ok(())
        })
        .await
        .unwrap();

    let value = manager.run_transaction(|tx| tx.get("a")).await.unwrap();
    assert_eq!(value.unwrap().bytes, b"1");
}

#[tokio::test]
async fn writes_within_one_attempt_are_visible_to_later_reads_in_the_same_attempt() {
    let (manager, _memory) = manager();
    manager
        .run_transaction(|tx| {
            tx.put("a", StoredValue::new(b"1".to_vec()))?;
            let seen = tx.get("a")?;
            assert_eq!(seen.unwrap().bytes, b"1");
            Ok(())
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn errors_from_the_closure_apply_no_writes() {
    let (manager, memory) = manager();
    let err = manager
        .run_transaction(|tx| {
            tx.put("a", StoredValue::new(b"1".to_vec()))?;
            Err(Error::Validation("boom".into()))
        })
        .await
        .unwrap_err();
    assert_eq!(err, Error::Validation("boom".into()));
    assert_eq!(memory.get("a").unwrap(), None);
}

#[tokio::test]
async fn rollback_discards_writes_but_returns_the_closures_value() {
    let (manager, memory) = manager();
    let value = manager
        .run_transaction(|tx| {
            tx.put("a", StoredValue::new(b"1".to_vec()))?;
            tx.rollback();
            Ok(42)
        })
        .await
        .unwrap();
    assert_eq!(value, 42);
    assert_eq!(memory.get("a").unwrap(), None);
}

#[tokio::test]
async fn delete_all_and_nested_transactions_are_rejected() {
    let (manager, _memory) = manager();
    let err = manager.run_transaction(|tx| tx.delete_all()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTransactionState(_)));

    let err = manager.run_transaction(|tx| tx.transaction()).await.unwrap_err();
    assert!(matches!(err, Error::InvalidTransactionState(_)));
}

#[tokio::test]
async fn concurrent_writers_never_lose_an_update() {
    // End-to-end scenario 5: T1 reads k, computes, writes k=1; T2 starts
    // after T1 begins but before it commits, reads k, writes k=2. One of the
    // two must retry and observe the other's write; the final value must be
    // exactly one of {1, 2}, never a value neither transaction wrote.
    let (manager, memory) = manager();
    memory.put("k", StoredValue::new(b"0".to_vec())).unwrap();
    let manager = Arc::new(manager);

    let attempts_t1 = Arc::new(AtomicUsize::new(0));
    let attempts_t2 = Arc::new(AtomicUsize::new(0));

    let m1 = manager.clone();
    let a1 = attempts_t1.clone();
    let t1 = tokio::spawn(async move {
        m1.run_transaction(|tx| {
            a1.fetch_add(1, Ordering::SeqCst);
            tx.get("k")?;
            tx.put("k", StoredValue::new(b"1".to_vec()))?;
            Ok(())
        })
        .await
        .unwrap();
    });

    let m2 = manager.clone();
    let a2 = attempts_t2.clone();
    let t2 = tokio::spawn(async move {
        m2.run_transaction(|tx| {
            a2.fetch_add(1, Ordering::SeqCst);
            tx.get("k")?;
            tx.put("k", StoredValue::new(b"2".to_vec()))?;
            Ok(())
        })
        .await
        .unwrap();
    });

    let _ = tokio::join!(t1, t2);

    let final_value = memory.get("k").unwrap().unwrap().bytes;
    assert!(final_value == b"1" || final_value == b"2", "unexpected final value: {final_value:?}");
}

#[tokio::test]
async fn batch_put_exceeding_the_limit_is_rejected() {
    let (manager, _memory) = manager();
    let entries: Vec<(String, StoredValue)> =
        (0..200).map(|i| (format!("k{i}"), StoredValue::new(vec![]))).collect();
    let err = manager.run_transaction(|tx| tx.put_many(&entries)).await.unwrap_err();
    assert!(matches!(err, Error::TooManyKeys { .. }));
}
