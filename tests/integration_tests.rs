//! Concurrency properties of transfers across the workspace crates

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use rust_decimal_macros::dec;
use transfer_ledger::account_service::{AccountService, NoopNotificationService};
use transfer_ledger::common::decimal::Amount;
use transfer_ledger::common::error::Error;

const DEADLOCK_TIMEOUT: Duration = Duration::from_secs(30);

fn service() -> Arc<AccountService> {
    Arc::new(AccountService::with_notifier(Arc::new(NoopNotificationService)))
}

async fn balance(service: &AccountService, id: &str) -> Amount {
    service.account_snapshot(id).await.unwrap().unwrap().balance
}

/// Read both balances under both locks, taken in id order
async fn consistent_total(service: &AccountService, first: &str, second: &str) -> Amount {
    let a = service.get_account(first).await.unwrap().unwrap();
    let b = service.get_account(second).await.unwrap().unwrap();
    let a = a.lock().unwrap();
    let b = b.lock().unwrap();
    a.balance + b.balance
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_opposite_direction_transfers_do_not_deadlock() {
    let service = service();
    service.create_account("Id-A", dec!(1000)).await.unwrap();
    service.create_account("Id-B", dec!(1000)).await.unwrap();

    let tasks = (0..2000).map(|i| {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if i % 2 == 0 {
                service.transfer_amount("Id-A", "Id-B", dec!(3)).await
            } else {
                service.transfer_amount("Id-B", "Id-A", dec!(3)).await
            }
        })
    });

    let outcomes = tokio::time::timeout(DEADLOCK_TIMEOUT, join_all(tasks))
        .await
        .expect("transfers deadlocked");

    for outcome in outcomes {
        match outcome.unwrap() {
            Ok(true) | Err(Error::InsufficientFunds { .. }) => {}
            other => panic!("Unexpected transfer outcome: {:?}", other),
        }
    }

    let a = balance(&service, "Id-A").await;
    let b = balance(&service, "Id-B").await;
    assert_eq!(a + b, dec!(2000));
    assert!(a >= Amount::ZERO && b >= Amount::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[allow(clippy::await_holding_lock)]
async fn test_disjoint_pairs_do_not_contend() {
    let service = service();
    for id in ["Id-A", "Id-B", "Id-C", "Id-D"] {
        service.create_account(id, dec!(100)).await.unwrap();
    }

    let held = service.get_account("Id-A").await.unwrap().unwrap();
    let guard = held.lock().unwrap();

    // A transfer touching the locked account has to wait
    let mut blocked = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.transfer_amount("Id-B", "Id-A", dec!(10)).await })
    };
    assert!(
        tokio::time::timeout(Duration::from_millis(200), &mut blocked).await.is_err(),
        "transfer into a locked account completed"
    );

    // An unrelated pair goes through meanwhile
    let free = {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.transfer_amount("Id-C", "Id-D", dec!(25)).await })
    };
    let outcome = tokio::time::timeout(Duration::from_secs(5), free)
        .await
        .expect("transfer on a disjoint pair was blocked")
        .unwrap();
    assert!(outcome.unwrap());
    assert_eq!(balance(&service, "Id-C").await, dec!(75));
    assert_eq!(balance(&service, "Id-D").await, dec!(125));

    drop(guard);
    let outcome = tokio::time::timeout(DEADLOCK_TIMEOUT, blocked)
        .await
        .expect("transfer stayed blocked after release")
        .unwrap();
    assert!(outcome.unwrap());
    assert_eq!(balance(&service, "Id-A").await, dec!(110));
    assert_eq!(balance(&service, "Id-B").await, dec!(90));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_withdrawals_never_overdraw() {
    let service = service();
    service.create_account("Id-source", dec!(100)).await.unwrap();
    for i in 0..10 {
        service.create_account(&format!("Id-sink-{}", i), dec!(0)).await.unwrap();
    }

    // 500 attempts of 1 against a balance of 100
    let tasks = (0..500).map(|i| {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            service
                .transfer_amount("Id-source", &format!("Id-sink-{}", i % 10), dec!(1))
                .await
        })
    });

    let mut succeeded = 0;
    let mut rejected = 0;
    for outcome in join_all(tasks).await {
        match outcome.unwrap() {
            Ok(_) => succeeded += 1,
            Err(Error::InsufficientFunds { .. }) => rejected += 1,
            Err(e) => panic!("Unexpected error: {}", e),
        }
    }

    assert_eq!(succeeded, 100);
    assert_eq!(rejected, 400);
    assert_eq!(balance(&service, "Id-source").await, dec!(0));

    let mut sinks = Amount::ZERO;
    for i in 0..10 {
        sinks += balance(&service, &format!("Id-sink-{}", i)).await;
    }
    assert_eq!(sinks, dec!(100));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_reader_never_sees_half_applied_transfer() {
    let service = service();
    service.create_account("Id-X", dec!(500)).await.unwrap();
    service.create_account("Id-Y", dec!(500)).await.unwrap();

    let writers: Vec<_> = (0..4)
        .map(|w| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                for i in 0..250 {
                    let (from, to) = if (w + i) % 2 == 0 { ("Id-X", "Id-Y") } else { ("Id-Y", "Id-X") };
                    let _ = service.transfer_amount(from, to, dec!(7.5)).await;
                }
            })
        })
        .collect();

    let reader = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            for _ in 0..1000 {
                assert_eq!(consistent_total(&service, "Id-X", "Id-Y").await, dec!(1000));
                tokio::task::yield_now().await;
            }
        })
    };

    tokio::time::timeout(DEADLOCK_TIMEOUT, async {
        for writer in writers {
            writer.await.unwrap();
        }
        reader.await.unwrap();
    })
    .await
    .expect("transfers deadlocked");

    assert_eq!(consistent_total(&service, "Id-X", "Id-Y").await, dec!(1000));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_ring_of_transfers_conserves_total() {
    let service = service();
    let ids: Vec<String> = (0..5).map(|i| format!("Id-ring-{}", i)).collect();
    for id in &ids {
        service.create_account(id, dec!(200)).await.unwrap();
    }

    // Each task walks the ring in its own direction, mixing lock orders
    let tasks = (0..400).map(|i| {
        let service = Arc::clone(&service);
        let ids = ids.clone();
        tokio::spawn(async move {
            let from = i % ids.len();
            let to = if i % 2 == 0 { (from + 1) % ids.len() } else { (from + ids.len() - 1) % ids.len() };
            service.transfer_amount(&ids[from], &ids[to], dec!(11)).await
        })
    });

    let outcomes = tokio::time::timeout(DEADLOCK_TIMEOUT, join_all(tasks))
        .await
        .expect("transfers deadlocked");
    for outcome in outcomes {
        assert!(matches!(outcome.unwrap(), Ok(true) | Err(Error::InsufficientFunds { .. })));
    }

    let mut total = Amount::ZERO;
    for id in &ids {
        let b = balance(&service, id).await;
        assert!(b >= Amount::ZERO);
        total += b;
    }
    assert_eq!(total, dec!(1000));
}

#[test]
fn test_transfers_from_os_threads() {
    let service = service();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        service.create_account("Id-1", dec!(100)).await.unwrap();
        service.create_account("Id-2", dec!(100)).await.unwrap();
    });

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
                for _ in 0..100 {
                    let (from, to) = if t % 2 == 0 { ("Id-1", "Id-2") } else { ("Id-2", "Id-1") };
                    let _ = runtime.block_on(service.transfer_amount(from, to, dec!(0.5)));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let total = runtime.block_on(async {
        balance(&service, "Id-1").await + balance(&service, "Id-2").await
    });
    assert_eq!(total, dec!(200));
}
