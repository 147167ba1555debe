//! # Live Queries
//!
//! A live query is a [`QueryDescriptor`] whose result is pushed again after
//! every committed change that can affect it.
//!
//! The hub keeps one logical query per descriptor, shared by all of its
//! subscribers, and re-evaluates it once per relevant change event. Each
//! delivery carries the sequence of the newest change it reflects;
//! [`QuerySubscription`] drops any delivery that is not newer than the last one
//! it surfaced, so a consumer never moves backwards.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use super::errors::{RealtimeError, RealtimeResult};
use super::event::ChangeEvent;
use super::feed::ChangeFeed;
use crate::entity::{Entity, Record, RecordId};
use crate::observability::{log_event_with_fields, Event};
use crate::store::RecordStore;

/// What a live query watches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryDescriptor {
    /// Every row of the collection
    List,
    /// One row by identifier
    Get(RecordId),
}

impl QueryDescriptor {
    /// Whether a committed change can alter this query's result
    pub fn is_affected_by(&self, event: &ChangeEvent) -> bool {
        match self {
            QueryDescriptor::List => true,
            QueryDescriptor::Get(id) => event.record_id == *id,
        }
    }

    fn label(&self) -> String {
        match self {
            QueryDescriptor::List => "list".to_string(),
            QueryDescriptor::Get(id) => format!("get:{}", id),
        }
    }
}

/// Evaluated query result
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<E> {
    List(Vec<Record<E>>),
    /// `None` when the row does not exist
    Single(Option<Record<E>>),
}

/// What a subscriber currently sees
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<E> {
    /// Nothing evaluated yet
    Loading,
    /// Result reflecting every change up to `sequence`
    Ready { sequence: u64, result: QueryResult<E> },
    /// Evaluation at `sequence` failed
    Error { sequence: u64, message: String },
}

impl<E> QueryState<E> {
    /// Sequence this state reflects; `None` while loading
    pub fn sequence(&self) -> Option<u64> {
        match self {
            QueryState::Loading => None,
            QueryState::Ready { sequence, .. } | QueryState::Error { sequence, .. } => {
                Some(*sequence)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn result(&self) -> Option<&QueryResult<E>> {
        match self {
            QueryState::Ready { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Rows of a ready list query
    pub fn rows(&self) -> Option<&[Record<E>]> {
        match self.result() {
            Some(QueryResult::List(rows)) => Some(rows),
            _ => None,
        }
    }
}

type StateSender<E> = mpsc::UnboundedSender<QueryState<E>>;

struct LogicalQuery<E> {
    latest: Option<QueryState<E>>,
    subscribers: Vec<StateSender<E>>,
}

impl<E> Default for LogicalQuery<E> {
    fn default() -> Self {
        Self {
            latest: None,
            subscribers: Vec::new(),
        }
    }
}

impl<E: Clone> LogicalQuery<E> {
    fn remember(&mut self, state: &QueryState<E>) {
        let newer = match (&self.latest, state.sequence()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(latest), Some(seq)) => latest.sequence().map_or(true, |l| seq > l),
        };
        if newer {
            self.latest = Some(state.clone());
        }
    }
}

/// Shared live queries over one entity's store
pub struct LiveQueryHub<E, S> {
    store: Arc<S>,
    feed: Arc<ChangeFeed>,
    queries: RwLock<HashMap<QueryDescriptor, LogicalQuery<E>>>,
}

impl<E, S> LiveQueryHub<E, S>
where
    E: Entity,
    S: RecordStore<E> + 'static,
{
    /// Starts a hub that follows `feed`.
    ///
    /// Must be called inside a tokio runtime. The background task stops once
    /// the hub is dropped and the next event arrives, or the feed goes away.
    pub fn start(store: Arc<S>, feed: Arc<ChangeFeed>) -> Arc<Self> {
        let mut events = feed.listen();
        let hub = Arc::new(Self {
            store,
            feed,
            queries: RwLock::new(HashMap::new()),
        });

        let weak = Arc::downgrade(&hub);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(hub) = weak.upgrade() else {
                    break;
                };
                hub.apply(&event).await;
            }
        });

        hub
    }

    /// Attaches a subscriber to the logical query for `descriptor`.
    ///
    /// The subscription first yields `Loading`, then the current result, then
    /// a fresh result after each relevant change.
    pub async fn subscribe(&self, descriptor: QueryDescriptor) -> RealtimeResult<QuerySubscription<E>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(QueryState::Loading);

        // Register before evaluating so no change slips between the two.
        let cached = {
            let mut queries = self.queries.write().map_err(|_| RealtimeError::lock_poisoned())?;
            prune_abandoned(&mut queries);
            let query = queries.entry(descriptor).or_default();
            query.subscribers.push(tx.clone());
            query.latest.clone()
        };

        let query = descriptor.label();
        log_event_with_fields(
            Event::QuerySubscribed,
            &[("collection", E::COLLECTION), ("query", query.as_str())],
        );

        let initial = match cached {
            Some(state) => state,
            None => {
                let sequence = self.feed.current_sequence();
                let state = self.evaluate(&descriptor, sequence).await;
                if let Ok(mut queries) = self.queries.write() {
                    if let Some(query) = queries.get_mut(&descriptor) {
                        query.remember(&state);
                    }
                }
                state
            }
        };
        let _ = tx.send(initial);

        Ok(QuerySubscription::new(rx))
    }

    /// Number of distinct logical queries with live subscribers
    pub fn active_queries(&self) -> usize {
        match self.queries.write() {
            Ok(mut queries) => {
                prune_abandoned(&mut queries);
                queries.len()
            }
            Err(_) => 0,
        }
    }

    async fn apply(&self, event: &ChangeEvent) {
        if event.collection != E::COLLECTION {
            return;
        }

        let affected: Vec<QueryDescriptor> = match self.queries.write() {
            Ok(mut queries) => {
                prune_abandoned(&mut queries);
                queries
                    .keys()
                    .filter(|d| d.is_affected_by(event))
                    .copied()
                    .collect()
            }
            Err(_) => return,
        };

        for descriptor in affected {
            let state = self.evaluate(&descriptor, event.sequence).await;
            self.push(&descriptor, state);
        }
    }

    async fn evaluate(&self, descriptor: &QueryDescriptor, sequence: u64) -> QueryState<E> {
        let outcome = match descriptor {
            QueryDescriptor::List => self.store.list().await.map(QueryResult::List),
            QueryDescriptor::Get(id) => self.store.get(*id).await.map(QueryResult::Single),
        };

        match outcome {
            Ok(result) => QueryState::Ready { sequence, result },
            Err(err) => {
                let message = RealtimeError::QueryFailed(err.to_string()).to_string();
                let query = descriptor.label();
                log_event_with_fields(
                    Event::QueryRefreshFailed,
                    &[
                        ("collection", E::COLLECTION),
                        ("query", query.as_str()),
                        ("error", message.as_str()),
                    ],
                );
                QueryState::Error { sequence, message }
            }
        }
    }

    fn push(&self, descriptor: &QueryDescriptor, state: QueryState<E>) {
        let Ok(mut queries) = self.queries.write() else {
            return;
        };
        let Some(query) = queries.get_mut(descriptor) else {
            return;
        };

        query.remember(&state);
        query.subscribers.retain(|tx| tx.send(state.clone()).is_ok());

        if query.subscribers.is_empty() {
            queries.remove(descriptor);
        }
    }
}

/// Drops subscribers whose handle is gone, then queries left with none.
fn prune_abandoned<E>(queries: &mut HashMap<QueryDescriptor, LogicalQuery<E>>) {
    queries.retain(|_, query| {
        query.subscribers.retain(|tx| !tx.is_closed());
        !query.subscribers.is_empty()
    });
}

/// One consumer's view of a live query
pub struct QuerySubscription<E> {
    rx: mpsc::UnboundedReceiver<QueryState<E>>,
    last_sequence: Option<u64>,
    current: QueryState<E>,
}

impl<E> QuerySubscription<E> {
    fn new(rx: mpsc::UnboundedReceiver<QueryState<E>>) -> Self {
        Self {
            rx,
            last_sequence: None,
            current: QueryState::Loading,
        }
    }

    /// Waits for the next state that is newer than the current one.
    ///
    /// Returns `None` once the hub has gone away.
    pub async fn next(&mut self) -> Option<&QueryState<E>> {
        loop {
            let state = self.rx.recv().await?;
            if self.accept(state) {
                return Some(&self.current);
            }
        }
    }

    /// Drains already-delivered states without waiting.
    pub fn try_next(&mut self) -> Option<&QueryState<E>> {
        while let Ok(state) = self.rx.try_recv() {
            if self.accept(state) {
                return Some(&self.current);
            }
        }
        None
    }

    /// Most recent state surfaced to this consumer
    pub fn current(&self) -> &QueryState<E> {
        &self.current
    }

    fn accept(&mut self, state: QueryState<E>) -> bool {
        match (state.sequence(), self.last_sequence) {
            // Loading only makes sense before the first result.
            (None, Some(_)) => return false,
            (None, None) => {}
            (Some(seq), Some(last)) if seq <= last => return false,
            (Some(seq), _) => self.last_sequence = Some(seq),
        }
        self.current = state;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Program, Student, Term};
    use crate::store::MemoryRecordStore;
    use serde_json::json;

    fn student(name: &str) -> Student {
        Student {
            enrollment_number: "A12345".into(),
            full_name: name.into(),
            email: "ana@uni.edu".into(),
            program: Program::Law,
            term: Term::Second,
            age: 12,
        }
    }

    fn ready(sequence: u64) -> QueryState<Student> {
        QueryState::Ready {
            sequence,
            result: QueryResult::List(Vec::new()),
        }
    }

    #[test]
    fn test_descriptor_matching() {
        let id = RecordId::generate();
        let event = ChangeEvent::insert("students", id, json!({}), None);

        assert!(QueryDescriptor::List.is_affected_by(&event));
        assert!(QueryDescriptor::Get(id).is_affected_by(&event));
        assert!(!QueryDescriptor::Get(RecordId::generate()).is_affected_by(&event));
    }

    #[test]
    fn test_subscription_drops_stale_states() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut sub = QuerySubscription::new(rx);

        tx.send(QueryState::Loading).unwrap();
        tx.send(ready(3)).unwrap();
        tx.send(ready(2)).unwrap();
        tx.send(ready(3)).unwrap();
        tx.send(QueryState::Loading).unwrap();
        tx.send(ready(5)).unwrap();

        assert!(sub.try_next().unwrap().is_loading());
        assert_eq!(sub.try_next().unwrap().sequence(), Some(3));
        assert_eq!(sub.try_next().unwrap().sequence(), Some(5));
        assert!(sub.try_next().is_none());
        assert_eq!(sub.current().sequence(), Some(5));
    }

    #[tokio::test]
    async fn test_subscribe_yields_loading_then_current_rows() {
        let store = Arc::new(MemoryRecordStore::new());
        store.insert(student("Ana Ruiz"), None).await.unwrap();
        let hub = LiveQueryHub::start(store, Arc::new(ChangeFeed::new()));

        let mut sub = hub.subscribe(QueryDescriptor::List).await.unwrap();
        assert!(sub.next().await.unwrap().is_loading());

        let state = sub.next().await.unwrap();
        assert_eq!(state.sequence(), Some(0));
        assert_eq!(state.rows().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_share_one_logical_query() {
        let store: Arc<MemoryRecordStore<Student>> = Arc::new(MemoryRecordStore::new());
        let hub = LiveQueryHub::start(store, Arc::new(ChangeFeed::new()));

        let _a = hub.subscribe(QueryDescriptor::List).await.unwrap();
        let _b = hub.subscribe(QueryDescriptor::List).await.unwrap();
        let _c = hub.subscribe(QueryDescriptor::Get(RecordId::generate())).await.unwrap();

        assert_eq!(hub.active_queries(), 2);
    }

    #[tokio::test]
    async fn test_get_query_sees_missing_row_as_none() {
        let store: Arc<MemoryRecordStore<Student>> = Arc::new(MemoryRecordStore::new());
        let hub = LiveQueryHub::start(store, Arc::new(ChangeFeed::new()));

        let mut sub = hub
            .subscribe(QueryDescriptor::Get(RecordId::generate()))
            .await
            .unwrap();
        sub.next().await.unwrap();
        let state = sub.next().await.unwrap();

        assert_eq!(state.result(), Some(&QueryResult::Single(None)));
    }
}
