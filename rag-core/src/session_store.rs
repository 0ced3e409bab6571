//! Session State Store (C6).
//!
//! A per-query, in-memory record of `WorkflowState` plus a `tokio::sync::broadcast`
//! pub/sub channel for snapshot observers (no required persistence). Safe
//! for concurrent reads by subscribers while the Workflow Engine writes,
//! via an `RwLock`-guarded map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use crate::workflow::WorkflowState;

/// Channel capacity for the snapshot broadcast channel.
const CHANNEL_CAPACITY: usize = 256;

/// Shared handle to a `SessionStore`.
pub type SharedSessionStore = Arc<SessionStore>;

/// Per-query mutable record of history, current node, retry counter, and
/// (once terminal) the final response — plus the push notification surface
/// for external observers.
pub struct SessionStore {
    states: RwLock<HashMap<String, WorkflowState>>,
    sender: broadcast::Sender<(String, WorkflowState)>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            states: RwLock::new(HashMap::new()),
            sender,
        }
    }

    pub fn shared() -> SharedSessionStore {
        Arc::new(Self::new())
    }

    /// Write a snapshot for `query_id` and notify subscribers. Called after
    /// every node transition.
    pub async fn put(&self, query_id: &str, snapshot: WorkflowState) {
        debug!(query_id, node = ?snapshot.current_node, "publishing snapshot");
        self.states
            .write()
            .await
            .insert(query_id.to_string(), snapshot.clone());
        // A lapsed receiver (no subscribers) is not an error — we still
        // recorded the snapshot in `states`.
        let _ = self.sender.send((query_id.to_string(), snapshot));
    }

    pub async fn get(&self, query_id: &str) -> Option<WorkflowState> {
        self.states.read().await.get(query_id).cloned()
    }

    /// Subscribe to every snapshot published across all in-flight queries,
    /// tagged with the `query_id` that produced it. This is a broadcast
    /// channel rather than the per-query `subscribe(query_id, callback)`
    /// some designs expose — a caller wanting one query's stream uses
    /// `subscribe_to` instead of filtering the tag by hand.
    pub fn subscribe(&self) -> broadcast::Receiver<(String, WorkflowState)> {
        self.sender.subscribe()
    }

    /// Subscribe to snapshots for a single `query_id`, discarding every
    /// other in-flight query's traffic before the caller sees it.
    pub fn subscribe_to(&self, query_id: impl Into<String>) -> QuerySubscription {
        QuerySubscription {
            query_id: query_id.into(),
            receiver: self.sender.subscribe(),
        }
    }
}

/// A `subscribe()` receiver pre-filtered to one query's snapshots.
pub struct QuerySubscription {
    query_id: String,
    receiver: broadcast::Receiver<(String, WorkflowState)>,
}

impl QuerySubscription {
    /// Await the next snapshot for this subscription's `query_id`, skipping
    /// any snapshots published for other in-flight queries. Returns `None`
    /// once the channel is closed.
    pub async fn recv(&mut self) -> Option<WorkflowState> {
        loop {
            match self.receiver.recv().await {
                Ok((id, state)) if id == self.query_id => return Some(state),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Node;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = SessionStore::new();
        let state = WorkflowState::new(2, 0.7);
        store.put("q1", state.clone()).await;
        let fetched = store.get("q1").await.unwrap();
        assert_eq!(fetched.current_node, Node::Start);
    }

    #[tokio::test]
    async fn subscribers_observe_published_snapshots_in_order() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        let mut state = WorkflowState::new(2, 0.7);
        store.put("q1", state.clone()).await;
        state.current_node = Node::Rewrite;
        store.put("q1", state.clone()).await;

        let (id, first) = rx.recv().await.unwrap();
        let (_, second) = rx.recv().await.unwrap();
        assert_eq!(id, "q1");
        assert_eq!(first.current_node, Node::Start);
        assert_eq!(second.current_node, Node::Rewrite);
    }

    #[tokio::test]
    async fn subscribe_to_filters_out_other_queries() {
        let store = SessionStore::new();
        let mut sub = store.subscribe_to("q1");

        store.put("q2", WorkflowState::new(2, 0.7)).await;
        let mut state = WorkflowState::new(2, 0.7);
        state.current_node = Node::Rewrite;
        store.put("q1", state).await;

        let received = sub.recv().await.unwrap();
        assert_eq!(received.current_node, Node::Rewrite);
    }

    #[tokio::test]
    async fn get_on_unknown_query_returns_none() {
        let store = SessionStore::new();
        assert!(store.get("missing").await.is_none());
    }
}
