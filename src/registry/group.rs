//! Group registry: owns the leaves of one group.

use std::collections::HashMap;
use std::ops::ControlFlow;

use crate::actor::{mailbox, watch_with, Addr, Mailbox, Recipient};
use crate::registry::leaf::Leaf;
use crate::registry::protocol::{
    AggregateRead, FindLeaf, GroupId, LeafHandle, LeafId, LeafList, ListLeaves, Registered,
    TrackLeaf,
};
use crate::registry::session::AggregationSession;

/// Group-scoped requests, forwarded by the top-level registry.
#[derive(Debug)]
pub enum GroupRequest {
    Track(TrackLeaf),
    Find(FindLeaf),
    ListLeaves(ListLeaves),
    AggregateRead(AggregateRead),
}

/// Everything a group task can receive.
#[derive(Debug)]
pub enum GroupCommand {
    Request(GroupRequest),
    LeafTerminated {
        group_id: GroupId,
        leaf_id: LeafId,
        leaf: LeafHandle,
    },
}

impl From<GroupRequest> for GroupCommand {
    fn from(request: GroupRequest) -> Self {
        GroupCommand::Request(request)
    }
}

/// Handle to a running group.
pub type GroupHandle = Addr<GroupCommand>;

/// State owned by a single group task.
pub struct Group {
    group_id: GroupId,
    leaves: HashMap<LeafId, LeafHandle>,
    addr: GroupHandle,
    /// Receives requests still queued when the group stops.
    redeliver: Option<Recipient<GroupRequest>>,
}

impl Group {
    /// Start a group on its own task.
    ///
    /// Requests that are still queued when the group stops are handed to
    /// `redeliver` instead of being lost.
    pub fn spawn(group_id: GroupId, redeliver: Option<Recipient<GroupRequest>>) -> GroupHandle {
        let (addr, mailbox) = mailbox();
        let group = Self {
            group_id,
            leaves: HashMap::new(),
            addr: addr.clone(),
            redeliver,
        };
        tokio::spawn(group.run(mailbox));
        addr
    }

    async fn run(mut self, mut mailbox: Mailbox<GroupCommand>) {
        tracing::info!(group = %self.group_id, "Group started");

        while let Some(command) = mailbox.recv().await {
            if self.handle(command).is_break() {
                break;
            }
        }

        mailbox.close();
        while let Ok(command) = mailbox.try_recv() {
            if let GroupCommand::Request(request) = command {
                match &self.redeliver {
                    Some(redeliver) => {
                        redeliver.tell(request);
                    }
                    None => tracing::debug!(group = %self.group_id, "Dropping request queued after stop"),
                }
            }
        }

        tracing::info!(group = %self.group_id, "Group stopped");
    }

    fn handle(&mut self, command: GroupCommand) -> ControlFlow<()> {
        match command {
            GroupCommand::Request(GroupRequest::Track(request)) => self.on_track(request),
            GroupCommand::Request(GroupRequest::Find(request)) => self.on_find(request),
            GroupCommand::Request(GroupRequest::ListLeaves(request)) => self.on_list_leaves(request),
            GroupCommand::Request(GroupRequest::AggregateRead(request)) => self.on_aggregate_read(request),
            GroupCommand::LeafTerminated { group_id, leaf_id, leaf } => {
                return self.on_leaf_terminated(group_id, leaf_id, leaf);
            }
        }
        ControlFlow::Continue(())
    }

    fn owns(&self, group_id: &str, operation: &str) -> bool {
        if group_id == self.group_id {
            return true;
        }
        tracing::warn!(
            requested = %group_id,
            group = %self.group_id,
            operation,
            "Ignoring request for another group"
        );
        false
    }

    fn on_track(&mut self, request: TrackLeaf) {
        if !self.owns(&request.group_id, "track") {
            return;
        }

        let leaf = match self.leaves.get(&request.leaf_id) {
            Some(existing) if !existing.is_terminated() => existing.clone(),
            _ => {
                tracing::info!(group = %self.group_id, leaf = %request.leaf_id, "Creating leaf");
                let leaf = Leaf::spawn(self.group_id.clone(), request.leaf_id.clone());
                watch_with(
                    &leaf,
                    &self.addr,
                    GroupCommand::LeafTerminated {
                        group_id: self.group_id.clone(),
                        leaf_id: request.leaf_id.clone(),
                        leaf: leaf.clone(),
                    },
                );
                self.leaves.insert(request.leaf_id, leaf.clone());
                leaf
            }
        };

        request.reply_to.tell(Registered { leaf });
    }

    fn on_find(&self, request: FindLeaf) {
        if !self.owns(&request.group_id, "find") {
            return;
        }
        let leaf = self
            .leaves
            .get(&request.leaf_id)
            .filter(|leaf| !leaf.is_terminated())
            .cloned();
        request.reply_to.tell(leaf);
    }

    fn on_list_leaves(&self, request: ListLeaves) {
        if !self.owns(&request.group_id, "list_leaves") {
            return;
        }
        request.reply_to.tell(LeafList {
            request_id: request.request_id,
            ids: self.leaves.keys().cloned().collect(),
        });
    }

    fn on_aggregate_read(&self, request: AggregateRead) {
        if !self.owns(&request.group_id, "aggregate_read") {
            return;
        }
        tracing::debug!(
            group = %self.group_id,
            request_id = request.request_id,
            leaves = self.leaves.len(),
            "Starting aggregate read"
        );
        AggregationSession::spawn(
            self.leaves.clone(),
            request.request_id,
            request.reply_to,
            request.timeout,
        );
    }

    fn on_leaf_terminated(&mut self, group_id: GroupId, leaf_id: LeafId, leaf: LeafHandle) -> ControlFlow<()> {
        debug_assert_eq!(group_id, self.group_id);

        // A newer leaf may already have replaced the one that stopped.
        if self.leaves.get(&leaf_id) == Some(&leaf) {
            self.leaves.remove(&leaf_id);
            tracing::info!(group = %self.group_id, leaf = %leaf_id, "Leaf terminated");
        }

        if self.leaves.is_empty() {
            tracing::info!(group = %self.group_id, "Group has no leaves left, stopping");
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    }
}
