//! End-to-end intermediated (PVPVP) settlement: two providers bridge the
//! route, three locks with strictly decreasing timelocks, and the secret
//! cascades back across both hops.

use std::time::Duration;

use chrono::{DateTime, Utc};

use corridor_core::messages::LockedRequest;
use corridor_core::SecretHashPair;
use corridor_integration_tests::{
    funded_sender, intermediated_instruction, spawn_provider, wait_until, LoopbackRelay, TOKEN,
};
use corridor_ledger::{InMemoryLedger, LockLedger, NewLock};
use corridor_store::RecordStatus;

const HOUR: Duration = Duration::from_secs(3600);
const MARGIN: i64 = 65;

#[tokio::test]
async fn pvpvp_route_settles_across_two_hops() {
    let chain = InMemoryLedger::new();
    let relay = LoopbackRelay::new();

    let fxp1 = spawn_provider(
        &chain,
        &relay,
        "0xfxp1",
        &["no:fxp1"],
        HOUR,
        Duration::from_secs(1),
    );
    let fxp2 = spawn_provider(
        &chain,
        &relay,
        "0xfxp2",
        &["no:fxp2"],
        HOUR,
        Duration::from_secs(1),
    );

    let ix = intermediated_instruction();
    let payment_id = ix.payment_id;
    let pair = SecretHashPair::generate();

    // Sender lock: two margins above the recipient-side window.
    let sender = funded_sender(&chain, "0xab01").await;
    let lock1_timelock = Utc::now().timestamp() + 3600 + 2 * MARGIN;
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

    // One Locked message to the sender-side provider drives the whole
    // forward cascade: FXP1 locks toward FXP2, FXP2 locks toward the
    // recipient.
    fxp1.handle_locked(LockedRequest {
        payment_instruction: ix.clone(),
        hash_of_secret: pair.hash,
        sender_system_lock_timeout: DateTime::from_timestamp(lock1_timelock, 0).unwrap(),
        lock_id: lock1,
    })
    .await
    .unwrap();

    let lock2 = fxp1
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .expect("intermediate lock record")
        .lock_id;
    let lock3 = fxp2
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .expect("recipient-side lock record")
        .lock_id;

    // All three locks share the hash; timelocks strictly decrease from
    // sender to recipient by one margin per hop.
    let probe = chain.connect("0xprobe");
    let state1 = probe.get_lock(&lock1).await.unwrap().unwrap();
    let state2 = probe.get_lock(&lock2).await.unwrap().unwrap();
    let state3 = probe.get_lock(&lock3).await.unwrap().unwrap();

    assert_eq!(state1.hashlock, pair.hash);
    assert_eq!(state2.hashlock, pair.hash);
    assert_eq!(state3.hashlock, pair.hash);

    assert!(state1.timelock > state2.timelock);
    assert!(state2.timelock > state3.timelock);
    let upper = state1.timelock - state2.timelock;
    let lower = state2.timelock - state3.timelock;
    assert!(
        (MARGIN - 2..=MARGIN + 2).contains(&upper),
        "sender/intermediate spread {upper}s"
    );
    assert!(
        (MARGIN - 2..=MARGIN + 2).contains(&lower),
        "intermediate/recipient spread {lower}s"
    );

    assert_eq!(state2.sender, "0xfxp1".into());
    assert_eq!(state2.receiver, "0xfxp2".into());
    assert_eq!(state3.receiver, "0xcd02".into());

    // The recipient reveals the secret on the final lock; every upstream
    // hop claims in turn.
    let recipient = chain.connect("0xcd02");
    recipient.withdraw(&lock3, &pair.secret).await.unwrap();

    let settled = wait_until(
        || {
            matches!(
                fxp1.inbound_record_by_payment(&payment_id),
                Ok(Some(record)) if record.status == RecordStatus::Withdrawn
            )
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(settled, "secret did not cascade across both hops");

    for lock_id in [lock1, lock2, lock3] {
        let state = probe.get_lock(&lock_id).await.unwrap().unwrap();
        assert!(state.withdrawn, "lock {lock_id} must be withdrawn");
        assert!(!state.refunded);
    }

    // Every hop captured the verified secret in its audit records.
    let fxp1_outbound = fxp1
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap();
    let fxp2_outbound = fxp2
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap();
    assert_eq!(fxp1_outbound.status, RecordStatus::Withdrawn);
    assert_eq!(fxp2_outbound.status, RecordStatus::Withdrawn);
    assert_eq!(
        fxp1_outbound.secret.map(|s| s.hash()),
        Some(pair.hash)
    );
    assert_eq!(
        fxp2_outbound.secret.map(|s| s.hash()),
        Some(pair.hash)
    );
}
