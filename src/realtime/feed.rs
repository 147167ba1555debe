//! # Change Feed
//!
//! Assigns sequence numbers to committed mutations and fans them out to every
//! registered listener.
//!
//! Sequence assignment and delivery happen under one lock, so every listener
//! receives events in sequence order. Listeners whose receiver is gone are
//! pruned on the next publish.

use std::sync::Mutex;

use tokio::sync::mpsc;

use super::errors::{RealtimeError, RealtimeResult};
use super::event::ChangeEvent;

/// Event sender for a listener
pub type EventSender = mpsc::UnboundedSender<ChangeEvent>;

/// Event receiver for a listener
pub type EventReceiver = mpsc::UnboundedReceiver<ChangeEvent>;

#[derive(Debug, Default)]
struct FeedState {
    /// Last assigned sequence (0 = nothing published yet)
    last_sequence: u64,
    listeners: Vec<EventSender>,
}

/// Publish/subscribe hub for change events
#[derive(Debug, Default)]
pub struct ChangeFeed {
    state: Mutex<FeedState>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener; it receives every event published from now on.
    pub fn listen(&self) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        if let Ok(mut state) = self.state.lock() {
            state.listeners.push(tx);
        }
        rx
    }

    /// Sequences `event` and delivers it to all live listeners.
    pub fn publish(&self, mut event: ChangeEvent) -> RealtimeResult<ChangeEvent> {
        let mut state = self.state.lock().map_err(|_| RealtimeError::lock_poisoned())?;

        state.last_sequence += 1;
        event.sequence = state.last_sequence;

        state.listeners.retain(|tx| tx.send(event.clone()).is_ok());

        Ok(event)
    }

    /// Sequence of the most recent published event
    pub fn current_sequence(&self) -> u64 {
        self.state.lock().map(|s| s.last_sequence).unwrap_or(0)
    }

    /// Get listener count
    pub fn listener_count(&self) -> usize {
        self.state.lock().map(|s| s.listeners.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::RecordId;
    use serde_json::json;

    fn insert_event() -> ChangeEvent {
        ChangeEvent::insert("students", RecordId::generate(), json!({}), None)
    }

    #[test]
    fn test_sequences_strictly_increase() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.current_sequence(), 0);

        let first = feed.publish(insert_event()).unwrap();
        let second = feed.publish(insert_event()).unwrap();

        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);
        assert_eq!(feed.current_sequence(), 2);
    }

    #[tokio::test]
    async fn test_every_listener_gets_every_event_in_order() {
        let feed = ChangeFeed::new();
        let mut a = feed.listen();
        let mut b = feed.listen();

        for _ in 0..3 {
            feed.publish(insert_event()).unwrap();
        }

        for rx in [&mut a, &mut b] {
            let seqs: Vec<u64> = (0..3).map(|_| rx.try_recv().unwrap().sequence).collect();
            assert_eq!(seqs, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let feed = ChangeFeed::new();
        let rx = feed.listen();
        let _kept = feed.listen();
        assert_eq!(feed.listener_count(), 2);

        drop(rx);
        feed.publish(insert_event()).unwrap();
        assert_eq!(feed.listener_count(), 1);
    }

    #[test]
    fn test_late_listener_misses_earlier_events() {
        let feed = ChangeFeed::new();
        feed.publish(insert_event()).unwrap();

        let mut rx = feed.listen();
        assert!(rx.try_recv().is_err());
    }
}
