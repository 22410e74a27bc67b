//! Request/response access to the registry for callers outside the
//! entity tree.
//!
//! Every call is an `ask` bounded by the configured ask timeout. Request ids
//! are generated here and checked against the reply.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::actor::{ask, AskError};
use crate::registry::manager::{RegistryCommand, RegistryHandle};
use crate::registry::protocol::{
    AggregateRead, AggregateResult, FindLeaf, GroupList, LeafCommand, LeafHandle, LeafList, ListGroups,
    ListLeaves, ReadResult, RequestId, TrackLeaf, WriteAck, DEFAULT_AGGREGATE_TIMEOUT,
};

/// Extra time granted on top of an aggregate deadline before giving up.
const AGGREGATE_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct RegistryClient {
    registry: RegistryHandle,
    ask_timeout: Duration,
    aggregate_timeout: Duration,
    next_request_id: Arc<AtomicU64>,
}

impl RegistryClient {
    pub fn new(registry: RegistryHandle, ask_timeout: Duration) -> Self {
        Self {
            registry,
            ask_timeout,
            aggregate_timeout: DEFAULT_AGGREGATE_TIMEOUT,
            next_request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Deadline used by [`RegistryClient::aggregate`] when none is given.
    pub fn with_aggregate_timeout(mut self, timeout: Duration) -> Self {
        self.aggregate_timeout = timeout;
        self
    }

    fn next_request_id(&self) -> RequestId {
        self.next_request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a leaf, creating it and its group on first use.
    pub async fn track(&self, group_id: &str, leaf_id: &str) -> Result<LeafHandle, AskError> {
        let registered = ask(&self.registry, self.ask_timeout, |reply_to| {
            RegistryCommand::Track(TrackLeaf {
                group_id: group_id.to_string(),
                leaf_id: leaf_id.to_string(),
                reply_to,
            })
        })
        .await?;
        Ok(registered.leaf)
    }

    /// Handle of an already tracked leaf, without creating anything.
    pub async fn find(&self, group_id: &str, leaf_id: &str) -> Result<Option<LeafHandle>, AskError> {
        ask(&self.registry, self.ask_timeout, |reply_to| {
            RegistryCommand::Find(FindLeaf {
                group_id: group_id.to_string(),
                leaf_id: leaf_id.to_string(),
                reply_to,
            })
        })
        .await
    }

    pub async fn list_groups(&self) -> Result<GroupList, AskError> {
        let request_id = self.next_request_id();
        ask(&self.registry, self.ask_timeout, |reply_to| {
            RegistryCommand::ListGroups(ListGroups { request_id, reply_to })
        })
        .await
    }

    pub async fn list_leaves(&self, group_id: &str) -> Result<LeafList, AskError> {
        let request_id = self.next_request_id();
        ask(&self.registry, self.ask_timeout, |reply_to| {
            RegistryCommand::ListLeaves(ListLeaves {
                request_id,
                group_id: group_id.to_string(),
                reply_to,
            })
        })
        .await
    }

    /// Read every leaf of a group. `timeout` overrides the aggregate deadline.
    pub async fn aggregate(&self, group_id: &str, timeout: Option<Duration>) -> Result<AggregateResult, AskError> {
        let request_id = self.next_request_id();
        let deadline = timeout.unwrap_or(self.aggregate_timeout);
        let wait = self.ask_timeout.max(deadline + AGGREGATE_GRACE);

        ask(&self.registry, wait, |reply_to| {
            RegistryCommand::AggregateRead(
                AggregateRead::new(request_id, group_id, reply_to).with_timeout(deadline),
            )
        })
        .await
    }

    pub async fn record(&self, leaf: &LeafHandle, value: f64) -> Result<WriteAck, AskError> {
        let request_id = self.next_request_id();
        ask(leaf, self.ask_timeout, |reply_to| LeafCommand::Write {
            request_id,
            value,
            reply_to,
        })
        .await
    }

    pub async fn read(&self, leaf: &LeafHandle) -> Result<ReadResult, AskError> {
        let request_id = self.next_request_id();
        ask(leaf, self.ask_timeout, |reply_to| LeafCommand::Read { request_id, reply_to }).await
    }

    /// Stop a leaf. Returns `false` if it had already stopped.
    pub fn passivate(&self, leaf: &LeafHandle) -> bool {
        leaf.tell(LeafCommand::Passivate)
    }
}
