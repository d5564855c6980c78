//! End-to-end direct (PVP) settlement: one provider bridges sender and
//! recipient, the revealed secret cascades backward, both locks end
//! withdrawn.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use corridor_core::messages::{DiscoveryRequest, LockedRequest};
use corridor_core::SecretHashPair;
use corridor_integration_tests::{
    direct_instruction, funded_sender, spawn_provider, wait_until, LoopbackRelay, TOKEN,
};
use corridor_ledger::{InMemoryLedger, LockLedger, NewLock};
use corridor_psp::{spawn_lock_created_listener, Psp, PspSettings};
use corridor_store::{MemorySecretStore, RecordStatus, SecretStore};

const HOUR: Duration = Duration::from_secs(3600);
const MARGIN: i64 = 65;

#[tokio::test]
async fn direct_route_settles_end_to_end() {
    let chain = InMemoryLedger::new();
    let relay = LoopbackRelay::new();

    // One provider organisation, two instances (sender-side and
    // recipient-side) sharing the wallet 0xfxp1.
    let sender_side = spawn_provider(
        &chain,
        &relay,
        "0xfxp1",
        &["no:fxp1"],
        HOUR,
        Duration::from_secs(1),
    );
    let recipient_side = spawn_provider(
        &chain,
        &relay,
        "0xfxp1",
        &["se:fxp1"],
        HOUR,
        Duration::from_secs(1),
    );

    // The originating service issues the secret/hash pair.
    let psp = Arc::new(Psp::new(
        Arc::new(MemorySecretStore::new()),
        PspSettings::default(),
    ));
    spawn_lock_created_listener(psp.clone(), chain.subscribe());

    let ix = direct_instruction();
    let payment_id = ix.payment_id;
    let discovery = psp
        .handle_discovery(DiscoveryRequest {
            payment_instruction: ix.clone(),
        })
        .unwrap();
    let hash = discovery.hash_of_secret;

    // Sender locks 100.00 NOK toward the provider, one margin above the
    // recipient-side window.
    let sender = funded_sender(&chain, "0xab01").await;
    let lock1_timelock = Utc::now().timestamp() + 3600 + MARGIN;
    let lock1 = sender
        .create_lock(NewLock {
            receiver: "0xfxp1".into(),
            hashlock: hash,
            timelock: lock1_timelock,
            token: TOKEN.into(),
            amount: 1_000_000,
        })
        .await
        .unwrap();

    // The issued secret record picks up the observed lock id.
    assert!(
        wait_until(
            || psp
                .secrets()
                .get_by_payment(&payment_id)
                .unwrap()
                .unwrap()
                .lock_id
                == Some(lock1),
            Duration::from_secs(5),
        )
        .await,
        "psp did not attach the sender lock"
    );

    // Locked → (verify, persist, relay Setup) → recipient-side lock.
    sender_side
        .handle_locked(LockedRequest {
            payment_instruction: ix.clone(),
            hash_of_secret: hash,
            sender_system_lock_timeout: DateTime::from_timestamp(lock1_timelock, 0).unwrap(),
            lock_id: lock1,
        })
        .await
        .unwrap();

    // The recipient-side instance created the final lock.
    let lock2_record = recipient_side
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .expect("recipient-side outbound record");
    let lock2_id = lock2_record.lock_id;
    assert_eq!(lock2_record.amount, 1_044_800);

    // Cascading timelocks: the sender's lock expires one margin after
    // the recipient-side lock.
    let probe = chain.connect("0xprobe");
    let lock1_state = probe.get_lock(&lock1).await.unwrap().unwrap();
    let lock2_state = probe.get_lock(&lock2_id).await.unwrap().unwrap();
    let spread = lock1_state.timelock - lock2_state.timelock;
    assert!(
        (MARGIN - 2..=MARGIN + 2).contains(&spread),
        "direct cascade must differ by one margin, got {spread}s"
    );
    assert!(lock1_state.timelock > lock2_state.timelock);

    // The recipient pulls the secret from the originating service and
    // claims the final lock.
    let secret = psp
        .secrets_by_address(&"0xcd02".into())
        .unwrap()
        .remove(0)
        .secret;
    let recipient = chain.connect("0xcd02");
    recipient.withdraw(&lock2_id, &secret).await.unwrap();

    // The secret cascades backward: the provider claims the sender lock.
    let settled = wait_until(
        || {
            matches!(
                sender_side.inbound_record_by_payment(&payment_id),
                Ok(Some(record)) if record.status == RecordStatus::Withdrawn
            )
        },
        Duration::from_secs(5),
    )
    .await;
    assert!(settled, "secret did not cascade to the sender-side lock");

    let lock1_state = probe.get_lock(&lock1).await.unwrap().unwrap();
    let lock2_state = probe.get_lock(&lock2_id).await.unwrap().unwrap();
    assert!(lock1_state.withdrawn && !lock1_state.refunded);
    assert!(lock2_state.withdrawn && !lock2_state.refunded);

    // Audit trail: both records terminal, secrets captured and verified.
    let outbound = recipient_side
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap();
    assert_eq!(outbound.status, RecordStatus::Withdrawn);
    assert_eq!(outbound.secret.as_ref().map(|s| s.hash()), Some(hash));

    let inbound = sender_side
        .inbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap();
    assert_eq!(inbound.secret.as_ref().map(|s| s.hash()), Some(hash));
}

#[tokio::test]
async fn replayed_locked_message_does_not_duplicate_or_relay_twice() {
    let chain = InMemoryLedger::new();
    let relay = LoopbackRelay::new();
    let sender_side = spawn_provider(
        &chain,
        &relay,
        "0xfxp1",
        &["no:fxp1"],
        HOUR,
        Duration::from_secs(1),
    );
    let recipient_side = spawn_provider(
        &chain,
        &relay,
        "0xfxp1",
        &["se:fxp1"],
        HOUR,
        Duration::from_secs(1),
    );

    let ix = direct_instruction();
    let payment_id = ix.payment_id;
    let pair = SecretHashPair::generate();

    let sender = funded_sender(&chain, "0xab01").await;
    let timelock = Utc::now().timestamp() + 3665;
    let lock1 = sender
        .create_lock(NewLock {
            receiver: "0xfxp1".into(),
            hashlock: pair.hash,
            timelock,
            token: TOKEN.into(),
            amount: 1_000_000,
        })
        .await
        .unwrap();

    let request = LockedRequest {
        payment_instruction: ix,
        hash_of_secret: pair.hash,
        sender_system_lock_timeout: DateTime::from_timestamp(timelock, 0).unwrap(),
        lock_id: lock1,
    };
    sender_side.handle_locked(request.clone()).await.unwrap();
    let first_lock2 = recipient_side
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap()
        .lock_id;

    // Replay: rejected on the unique key, and no second recipient-side
    // lock appears.
    let result = sender_side.handle_locked(request).await;
    assert!(result.is_err(), "replay must be rejected");
    let second_lock2 = recipient_side
        .outbound_record_by_payment(&payment_id)
        .unwrap()
        .unwrap()
        .lock_id;
    assert_eq!(first_lock2, second_lock2);
}
