//! # Listener Flows
//!
//! Block events published on the feed, dispatched by the registry (lc-04)
//! to block and contract-event listeners.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::{block_with, channel};
    use lc_04_event_registry::{
        BlockCallback, CallbackResult, ChaincodeCallback, EventRegistry, ExactMatcher,
        ListenerHandle, RegexMatcher,
    };
    use shared_bus::{EventPublisher, InMemoryEventFeed};
    use shared_types::{BlockEvent, ChaincodeEvent, ChannelId, TransactionId, ValidationCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn transfer_block(block_number: u64, contract: &str) -> BlockEvent {
        let tx_id = TransactionId(format!("tx-{block_number}"));
        let mut block = block_with(block_number, &tx_id, ValidationCode::Valid);
        block.transactions[0].chaincode_events.push(ChaincodeEvent {
            tx_id,
            contract_name: contract.into(),
            event_name: "evtsender".into(),
            payload: b"a->b:10".to_vec(),
        });
        block
    }

    fn counting_block(counter: &Arc<AtomicUsize>) -> BlockCallback {
        let counter = Arc::clone(counter);
        Arc::new(move |_: &BlockEvent| -> CallbackResult {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn counting_chaincode(counter: &Arc<AtomicUsize>) -> ChaincodeCallback {
        let counter = Arc::clone(counter);
        Arc::new(
            move |_: &ListenerHandle, _: &BlockEvent, _: &ChaincodeEvent| -> CallbackResult {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )
    }

    #[test]
    fn test_unregistered_listener_sees_nothing() {
        let registry = EventRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let handle = registry.register_block_listener(channel(), counting_block(&seen));

        registry.dispatch(&transfer_block(1, "example02"));
        registry.unregister(handle).unwrap();
        let report = registry.dispatch(&transfer_block(2, "example02"));

        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(report.delivered, 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_listeners_only_hear_their_channel() {
        let registry = EventRegistry::new();
        let seen = Arc::new(AtomicUsize::new(0));
        registry.register_block_listener(ChannelId::new("otherchannel"), counting_block(&seen));

        let report = registry.dispatch(&transfer_block(1, "example02"));
        assert_eq!(report.delivered, 0);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert_eq!(registry.stats().blocks_dispatched, 1);
    }

    #[test]
    fn test_patterns_match_whole_names() {
        let registry = EventRegistry::new();
        let seen_regex = Arc::new(AtomicUsize::new(0));
        let seen_exact = Arc::new(AtomicUsize::new(0));

        registry
            .register_chaincode_listener_regex(
                channel(),
                "example",
                "evt.*",
                counting_chaincode(&seen_regex),
            )
            .unwrap();
        registry.register_chaincode_listener(
            channel(),
            Arc::new(RegexMatcher::new("example0[0-9]").unwrap()),
            Arc::new(ExactMatcher::new("evtsender")),
            counting_chaincode(&seen_exact),
        );

        registry.dispatch(&transfer_block(1, "example02"));
        registry.dispatch(&transfer_block(2, "marbles"));

        assert_eq!(seen_regex.load(Ordering::SeqCst), 0);
        assert_eq!(seen_exact.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_follows_registration_order() {
        let registry = EventRegistry::new();
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        for label in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            registry.register_block_listener(
                channel(),
                Arc::new(move |_: &BlockEvent| -> CallbackResult {
                    order.lock().push(label);
                    Ok(())
                }),
            );
        }

        registry.dispatch(&transfer_block(1, "example02"));
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn test_feed_drives_contract_listener() {
        let feed = InMemoryEventFeed::new();
        let registry = Arc::new(EventRegistry::new());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let handle = registry
            .register_chaincode_listener_regex(
                channel(),
                "example.*",
                "evtsender",
                Arc::new(
                    move |handle: &ListenerHandle,
                          block: &BlockEvent,
                          event: &ChaincodeEvent|
                          -> CallbackResult {
                        let _ = tx.send((*handle, block.block_number, event.payload.clone()));
                        Ok(())
                    },
                ),
            )
            .unwrap();
        let task = registry.spawn(&feed);

        feed.publish(transfer_block(3, "marbles")).await;
        feed.publish(transfer_block(4, "example02")).await;

        let (seen_handle, block_number, payload) =
            tokio::time::timeout(Duration::from_secs(5), rx.recv())
                .await
                .unwrap()
                .unwrap();
        assert_eq!(seen_handle, handle);
        assert_eq!(block_number, 4);
        assert_eq!(payload, b"a->b:10");

        task.abort();
    }
}
