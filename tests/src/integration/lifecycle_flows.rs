//! # Lifecycle Flows
//!
//! Mint, transfer and burn across two parties with the real notification
//! channel in between.
//!
//! 1. **Mint**: alice shields `art1` and holds commitment 0
//! 2. **Transfer**: alice hands it to bob, bob's listener picks up commitment 1
//! 3. **Burn**: bob releases the public asset to himself

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use shroud_bus::{ChannelConfig, IdentityRegistry, NotificationChannel, TRANSFER_TOPIC};
    use shroud_commitments::{
        BurnToken, CommitmentLifecycleApi, CommitmentService, CommittedReceipt, ErrorKind,
        InMemoryAccountService, InMemoryCommitmentService, InMemoryDirectory, InMemoryLedger,
        InMemoryProofEngine, Ledger, LifecycleConfig, Notice, PublicAssetStatus, TokenStatus,
        TransferToken,
    };
    use shroud_types::{Address, PartyIdentity, TokenId};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct World {
        service: Arc<InMemoryCommitmentService>,
        channel: Arc<NotificationChannel>,
        engine: Arc<InMemoryProofEngine>,
        ledger: Arc<InMemoryLedger>,
        alice: PartyIdentity,
        bob: PartyIdentity,
        carol: PartyIdentity,
    }

    fn world() -> World {
        let channel = Arc::new(NotificationChannel::new(
            Arc::new(IdentityRegistry::new()),
            ChannelConfig::default(),
        ));
        let engine = Arc::new(InMemoryProofEngine::new());
        let ledger = Arc::new(InMemoryLedger::new());
        let directory = Arc::new(InMemoryDirectory::new());

        let alice = PartyIdentity::new("alice", Address::random(20));
        let bob = PartyIdentity::new("bob", Address::random(20));
        let carol = PartyIdentity::new("carol", Address::random(20));
        for party in [&alice, &bob, &carol] {
            directory.register_party(party);
        }

        let service = Arc::new(CommitmentService::new(
            LifecycleConfig::default(),
            Arc::clone(&engine),
            Arc::clone(&ledger),
            Arc::new(InMemoryAccountService::new()),
            Arc::clone(&directory),
            Arc::clone(&channel),
        ));

        World {
            service,
            channel,
            engine,
            ledger,
            alice,
            bob,
            carol,
        }
    }

    fn t1() -> TokenId {
        TokenId::new(vec![0x01])
    }

    // =========================================================================
    // MINT -> TRANSFER -> BURN
    // =========================================================================

    #[tokio::test(start_paused = true)]
    async fn test_full_lifecycle_between_two_parties() {
        let w = world();
        w.service.listen(&w.bob).await.unwrap();

        // A second, raw subscription on bob's identity sees the notice itself.
        let bob_identity = w.service.channel_identity(&w.bob).await.unwrap();
        let mut observer = w
            .channel
            .subscribe(&bob_identity, TRANSFER_TOPIC.as_bytes())
            .unwrap();

        let minted = w.service.mint(&w.alice, t1(), "art1").await.unwrap();
        assert_eq!(minted.commitment_index, 0);
        assert_eq!(minted.status, TokenStatus::Minted);
        assert!(w.engine.is_shielded(&t1()));

        let receipt = w
            .service
            .transfer(&w.alice, TransferToken::of(&minted, "bob"))
            .await
            .unwrap();
        assert_eq!(receipt.commitment_index, 1);

        // Nothing arrives before the delivery delay.
        assert!(observer.try_recv().is_none());

        let envelope = timeout(Duration::from_secs(5), observer.recv())
            .await
            .unwrap()
            .unwrap();
        let notice: Notice = envelope.decode().unwrap();
        let Notice::Token(notice) = notice else {
            panic!("expected a token notice");
        };
        assert_eq!(notice.token_id, t1());
        assert_eq!(notice.commitment_index, 1);
        assert_eq!(notice.token_uri, "art1");
        assert_eq!(&notice.receiver_public_key, w.bob.public_key());

        // Let the listener finish applying the notice.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let sender_side = w.ledger.get_token_by_id("alice", &t1()).await.unwrap().unwrap();
        assert_eq!(sender_side.status, TokenStatus::Transferred);
        assert!(!sender_side.is_spendable());

        let held = w.ledger.get_token_by_id("bob", &t1()).await.unwrap().unwrap();
        assert_eq!(held.commitment_index, 1);
        assert_eq!(held.commitment, receipt.commitment);
        assert!(held.is_spendable());

        let burned = w
            .service
            .burn(&w.bob, BurnToken::of(&held, None))
            .await
            .unwrap();
        assert_eq!(burned.pay_to, "bob");
        assert_eq!(w.engine.released_to(&t1()), w.bob.address);

        let held = w.ledger.get_token_by_id("bob", &t1()).await.unwrap().unwrap();
        assert_eq!(held.status, TokenStatus::Burned);
        let asset = w.ledger.get_public_asset("bob", &t1()).await.unwrap().unwrap();
        assert_eq!(asset.status, PublicAssetStatus::Received);
        assert_eq!(asset.uri, "art1");

        w.channel.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_travels_back_to_original_owner() {
        let w = world();
        w.service.listen(&w.alice).await.unwrap();
        w.service.listen(&w.bob).await.unwrap();

        let minted = w.service.mint(&w.alice, t1(), "art1").await.unwrap();
        w.service
            .transfer(&w.alice, TransferToken::of(&minted, "bob"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;

        let held = w.ledger.get_token_by_id("bob", &t1()).await.unwrap().unwrap();
        let back = w
            .service
            .transfer(&w.bob, TransferToken::of(&held, "alice"))
            .await
            .unwrap();
        assert_eq!(back.commitment_index, 2);
        tokio::time::sleep(Duration::from_secs(4)).await;

        let returned = w.ledger.get_token_by_id("alice", &t1()).await.unwrap().unwrap();
        assert_eq!(returned.commitment_index, 2);
        assert!(returned.is_spendable());
        assert_eq!(w.engine.commitment_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burn_pays_out_to_third_party() {
        let w = world();
        w.service.listen(&w.carol).await.unwrap();

        let minted = w.service.mint(&w.alice, t1(), "art1").await.unwrap();
        let burned = w
            .service
            .burn(&w.alice, BurnToken::of(&minted, Some("carol".into())))
            .await
            .unwrap();
        assert!(burned.payee_notified);
        tokio::time::sleep(Duration::from_secs(4)).await;

        let asset = w.ledger.get_public_asset("carol", &t1()).await.unwrap().unwrap();
        assert_eq!(asset.status, PublicAssetStatus::Received);
        assert_eq!(asset.sender.as_deref(), Some("alice"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_listener_misses_notice() {
        let w = world();
        let handle = w.service.listen(&w.bob).await.unwrap();
        assert!(w.service.stop_listening(&handle));
        assert!(!w.service.stop_listening(&handle));

        let minted = w.service.mint(&w.alice, t1(), "art1").await.unwrap();
        w.service
            .transfer(&w.alice, TransferToken::of(&minted, "bob"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;

        assert!(w.ledger.get_token_by_id("bob", &t1()).await.unwrap().is_none());
        assert_eq!(w.channel.stats().undelivered, 1);
    }

    // =========================================================================
    // FAILURE PATHS
    // =========================================================================

    #[tokio::test]
    async fn test_spent_commitment_cannot_be_reused() {
        let w = world();
        w.service.listen(&w.bob).await.unwrap();
        let minted = w.service.mint(&w.alice, t1(), "art1").await.unwrap();
        w.service
            .transfer(&w.alice, TransferToken::of(&minted, "bob"))
            .await
            .unwrap();

        let replay = w
            .service
            .transfer(&w.alice, TransferToken::of(&minted, "carol"))
            .await
            .unwrap_err();
        assert_eq!(replay.kind(), ErrorKind::Validation);

        let burn = w
            .service
            .burn(&w.alice, BurnToken::of(&minted, None))
            .await
            .unwrap_err();
        assert_eq!(burn.kind(), ErrorKind::Validation);
        assert_eq!(w.engine.commitment_count(), 2);
    }

    #[tokio::test]
    async fn test_unknown_receiver_leaves_state_untouched() {
        let w = world();
        let minted = w.service.mint(&w.alice, t1(), "art1").await.unwrap();

        let err = w
            .service
            .transfer(&w.alice, TransferToken::of(&minted, "mallory"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Directory);
        assert!(err.is_retryable());

        let record = w.ledger.get_token_by_id("alice", &t1()).await.unwrap().unwrap();
        assert_eq!(record.status, TokenStatus::Minted);
        assert_eq!(w.engine.commitment_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lost_notice_is_recovered_by_resend() {
        let w = world();
        let minted = w.service.mint(&w.alice, t1(), "art1").await.unwrap();

        // Bob has no channel key yet, so the committed transfer cannot be announced.
        let err = w
            .service
            .transfer(&w.alice, TransferToken::of(&minted, "bob"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Notification);
        let receipt = match err.committed_receipt() {
            Some(CommittedReceipt::Transfer(receipt)) => receipt.clone(),
            other => panic!("unexpected receipt {other:?}"),
        };

        w.service.listen(&w.bob).await.unwrap();
        w.service
            .resend_transfer_notice(&w.alice, &receipt)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;

        let held = w.ledger.get_token_by_id("bob", &t1()).await.unwrap().unwrap();
        assert_eq!(held.commitment, receipt.commitment);
        assert_eq!(w.ledger.tokens("bob").await.unwrap().len(), 1);
    }
}
