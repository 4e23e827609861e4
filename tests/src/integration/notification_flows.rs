//! # Notification Flows
//!
//! The identity registry and the notification channel on their own:
//! identities, topic validation, delayed delivery, fan-out.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde::{Deserialize, Serialize};
    use tokio::time::timeout;

    use shroud_bus::{
        BusError, ChannelConfig, IdentityRegistry, NotificationChannel, NotificationTransport,
        TRANSFER_TOPIC,
    };
    use shroud_types::{Address, IdentityHandle, PartyIdentity};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Greeting {
        text: String,
    }

    fn channel() -> Arc<NotificationChannel> {
        Arc::new(NotificationChannel::new(
            Arc::new(IdentityRegistry::new()),
            ChannelConfig::default(),
        ))
    }

    fn identity(channel: &NotificationChannel, name: &str) -> IdentityHandle {
        let party = PartyIdentity::new(name, Address::random(20));
        channel.generate_identity(&party).unwrap().0
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribed_party_receives_exactly_once_after_delay() {
        let channel = channel();
        let alice = identity(&channel, "alice");
        let bob = identity(&channel, "bob");
        let bob_key = channel.public_key_of(&bob).unwrap();

        let mut subscription = channel.subscribe(&bob, TRANSFER_TOPIC.as_bytes()).unwrap();
        channel
            .publish(b"hello".to_vec(), &alice, &bob_key, TRANSFER_TOPIC.as_bytes())
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(subscription.try_recv().is_none());

        let envelope = timeout(Duration::from_secs(1), subscription.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.payload, b"hello");
        assert_eq!(envelope.sender_key, channel.public_key_of(&alice).unwrap());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(subscription.try_recv().is_none());
        assert_eq!(channel.stats().delivered, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_without_subscriber_is_silently_undelivered() {
        let channel = channel();
        let alice = identity(&channel, "alice");
        let bob = identity(&channel, "bob");
        let bob_key = channel.public_key_of(&bob).unwrap();

        channel
            .publish(b"nobody home".to_vec(), &alice, &bob_key, TRANSFER_TOPIC.as_bytes())
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;

        // Subscribing afterwards does not replay the message.
        let mut late = channel.subscribe(&bob, TRANSFER_TOPIC.as_bytes()).unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(late.try_recv().is_none());

        let stats = channel.stats();
        assert_eq!(stats.published, 1);
        assert_eq!(stats.delivered, 0);
        assert_eq!(stats.undelivered, 1);
    }

    #[tokio::test]
    async fn test_malformed_topics_are_rejected() {
        let channel = channel();
        let alice = identity(&channel, "alice");
        let bob_key = channel.public_key_of(&identity(&channel, "bob")).unwrap();

        for topic in [&b""[..], &b"\x01\x02\x03"[..], &b"\x01\x02\x03\x04\x05"[..]] {
            let err = channel
                .publish(b"x".to_vec(), &alice, &bob_key, topic)
                .await
                .unwrap_err();
            assert!(matches!(err, BusError::InvalidTopic { .. }), "{err:?}");
            assert!(channel.subscribe(&alice, topic).is_err());
        }
        assert_eq!(channel.stats().published, 0);
    }

    #[tokio::test]
    async fn test_identity_requires_address() {
        let channel = channel();
        let mut party = PartyIdentity::new("nobody", Address::random(20));
        party.address = None;

        let err = channel.generate_identity(&party).unwrap_err();
        assert!(matches!(err, BusError::InvalidIdentity { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_objects_fan_out_to_every_subscriber() {
        let channel = channel();
        let alice = identity(&channel, "alice");
        let bob = identity(&channel, "bob");
        let bob_key = channel.public_key_of(&bob).unwrap();

        let received = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let received = Arc::clone(&received);
            channel
                .subscribe_object(&bob, TRANSFER_TOPIC.as_bytes(), move |greeting: Greeting| {
                    let received = Arc::clone(&received);
                    async move {
                        assert_eq!(greeting.text, "hi bob");
                        received.fetch_add(1, Ordering::SeqCst);
                    }
                })
                .unwrap();
        }

        channel
            .publish_object(
                &Greeting {
                    text: "hi bob".into(),
                },
                &alice,
                &bob_key,
                TRANSFER_TOPIC.as_bytes(),
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;

        assert_eq!(received.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_trait_object_delivers() {
        let channel = channel();
        let alice = identity(&channel, "alice");
        let bob = identity(&channel, "bob");
        let transport: Arc<dyn NotificationTransport> = channel.clone();

        let bob_key = transport.public_key_of(&bob).unwrap();
        let mut subscription = channel.subscribe(&bob, TRANSFER_TOPIC.as_bytes()).unwrap();

        transport
            .publish(b"via trait".to_vec(), &alice, &bob_key, TRANSFER_TOPIC.as_bytes())
            .await
            .unwrap();

        let envelope = timeout(Duration::from_secs(5), subscription.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(envelope.payload, b"via trait");
    }

    #[tokio::test]
    async fn test_shut_down_channel_refuses_publish() {
        let channel = channel();
        let alice = identity(&channel, "alice");
        let bob_key = channel.public_key_of(&identity(&channel, "bob")).unwrap();

        channel.shutdown();
        let err = channel
            .publish(b"late".to_vec(), &alice, &bob_key, TRANSFER_TOPIC.as_bytes())
            .await
            .unwrap_err();
        assert_eq!(err, BusError::Closed);
    }
}
