//! Refund path: a recipient that never claims must not strand provider
//! funds past expiry.

use std::time::Duration;

use chrono::{DateTime, Utc};

use corridor_core::messages::LockedRequest;
use corridor_core::SecretHashPair;
use corridor_integration_tests::{
    direct_instruction, funded_sender, spawn_provider, wait_until, LoopbackRelay, TOKEN,
};
use corridor_ledger::{InMemoryLedger, LockLedger, NewLock};
use corridor_store::RecordStatus;

const MARGIN: i64 = 65;

#[tokio::test]
async fn unclaimed_lock_is_refunded_after_grace() {
    let chain = InMemoryLedger::new();
    let relay = LoopbackRelay::new();

    // Short lock window so the fail-safe fires within the test.
    let base = Duration::from_secs(2);
    let grace = Duration::from_millis(200);
    let sender_side = spawn_provider(&chain, &relay, "0xfxp1", &["no:fxp1"], base, grace);
    let recipient_side = spawn_provider(&chain, &relay, "0xfxp1", &["se:fxp1"], base, grace);

    let ix = direct_instruction();
    let payment_id = ix.payment_id;
    let pair = SecretHashPair::generate();

    let sender = funded_sender(&chain, "0xab01").await;
    let lock1_timelock = Utc::now().timestamp() + base.as_secs() as i64 + MARGIN;
    let lock1 = sender
        .create_lock(NewLock {
            receiver: "0xfxp1".into(),
            hashlock: pair.hash,
            timelock: lock1_timelock,
            token: TOKEN.into(),
            amount: 1_000_000,
        })
        .await
        .unwrap();

    sender_side
        .handle_locked(LockedRequest {
            payment_instruction: ix,
            hash_of_secret: pair.hash,
            sender_system_lock_timeout: DateTime::from_timestamp(lock1_timelock, 0).unwrap(),
            lock_id: lock1,
        })
        .await
        .unwrap();

    let lock2 = recipient_side
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap()
        .lock_id;
    let balance_before = recipient_side.ledger().balance().await.unwrap();

    // Nobody withdraws. The fail-safe re-reads the lock at expiry+grace
    // and refunds it.
    let probe = chain.connect("0xprobe");
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let lock = probe.get_lock(&lock2).await.unwrap().unwrap();
        if lock.refunded {
            assert!(!lock.withdrawn);
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "fail-safe did not refund the expired lock"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }

    // The provider's funds are back and the record is terminal.
    let refunded = wait_until(
        || {
            matches!(
                recipient_side.outbound_record_by_payment(&payment_id),
                Ok(Some(record)) if record.status == RecordStatus::Refunded
            )
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(refunded, "outbound record not marked refunded");
    let balance_after = recipient_side.ledger().balance().await.unwrap();
    assert_eq!(balance_after, balance_before + 1_044_800);

    // A late withdrawal event for the refunded lock is a no-op, not an
    // error.
    recipient_side
        .on_lock_withdrawn(lock2, pair.secret.clone())
        .await
        .unwrap();
    let record = recipient_side
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RecordStatus::Refunded);
    assert!(record.secret.is_none());
}
