//! Top-level registry: owns every group and routes requests to them.

use std::collections::HashMap;
use tokio::sync::broadcast;

use crate::actor::{mailbox, watch_with, Addr, Mailbox, Recipient};
use crate::observability::metrics;
use crate::registry::group::{Group, GroupCommand, GroupHandle, GroupRequest};
use crate::registry::protocol::{
    AggregateRead, FindLeaf, GroupId, GroupList, LeafList, ListGroups, ListLeaves, TrackLeaf,
};

/// Everything the top-level registry can receive.
#[derive(Debug)]
pub enum RegistryCommand {
    Track(TrackLeaf),
    Find(FindLeaf),
    ListLeaves(ListLeaves),
    ListGroups(ListGroups),
    AggregateRead(AggregateRead),
    GroupTerminated {
        group_id: GroupId,
        group: GroupHandle,
    },
}

impl From<GroupRequest> for RegistryCommand {
    fn from(request: GroupRequest) -> Self {
        match request {
            GroupRequest::Track(r) => RegistryCommand::Track(r),
            GroupRequest::Find(r) => RegistryCommand::Find(r),
            GroupRequest::ListLeaves(r) => RegistryCommand::ListLeaves(r),
            GroupRequest::AggregateRead(r) => RegistryCommand::AggregateRead(r),
        }
    }
}

/// Handle to the running top-level registry.
pub type RegistryHandle = Addr<RegistryCommand>;

/// State owned by the top-level registry task.
pub struct Registry {
    groups: HashMap<GroupId, GroupHandle>,
    addr: RegistryHandle,
}

impl Registry {
    /// Start the registry. It runs until `shutdown` fires.
    pub fn spawn(shutdown: broadcast::Receiver<()>) -> RegistryHandle {
        let (addr, mailbox) = mailbox();
        let registry = Self {
            groups: HashMap::new(),
            addr: addr.clone(),
        };
        tokio::spawn(registry.run(mailbox, shutdown));
        addr
    }

    async fn run(mut self, mut mailbox: Mailbox<RegistryCommand>, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Registry started");

        loop {
            tokio::select! {
                command = mailbox.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Registry received shutdown signal, exiting loop");
                    break;
                }
            }
        }

        tracing::info!(groups = self.groups.len(), "Registry stopped");
    }

    fn handle(&mut self, command: RegistryCommand) {
        match command {
            RegistryCommand::Track(request) => self.on_track(request),
            RegistryCommand::Find(request) => self.on_find(request),
            RegistryCommand::ListLeaves(request) => self.on_list_leaves(request),
            RegistryCommand::ListGroups(request) => self.on_list_groups(request),
            RegistryCommand::AggregateRead(request) => self.on_aggregate_read(request),
            RegistryCommand::GroupTerminated { group_id, group } => self.on_group_terminated(group_id, group),
        }
    }

    /// Group that can still accept requests.
    fn live_group(&self, group_id: &str) -> Option<&GroupHandle> {
        self.groups.get(group_id).filter(|group| !group.is_terminated())
    }

    fn on_track(&mut self, request: TrackLeaf) {
        let group = match self.live_group(&request.group_id) {
            Some(group) => group.clone(),
            None => self.create_group(request.group_id.clone()),
        };
        self.deliver(&group, GroupRequest::Track(request));
    }

    fn create_group(&mut self, group_id: GroupId) -> GroupHandle {
        tracing::info!(group = %group_id, "Creating group");
        let group = Group::spawn(
            group_id.clone(),
            Some(Recipient::adapted(&self.addr, <RegistryCommand as From<GroupRequest>>::from)),
        );
        watch_with(
            &group,
            &self.addr,
            RegistryCommand::GroupTerminated {
                group_id: group_id.clone(),
                group: group.clone(),
            },
        );
        self.groups.insert(group_id, group.clone());
        metrics::record_groups_active(self.groups.len());
        group
    }

    fn on_find(&mut self, request: FindLeaf) {
        match self.live_group(&request.group_id) {
            Some(group) => {
                let group = group.clone();
                self.deliver(&group, GroupRequest::Find(request));
            }
            None => {
                request.reply_to.tell(None);
            }
        }
    }

    fn on_list_leaves(&mut self, request: ListLeaves) {
        match self.live_group(&request.group_id) {
            Some(group) => {
                let group = group.clone();
                self.deliver(&group, GroupRequest::ListLeaves(request));
            }
            None => {
                request.reply_to.tell(LeafList {
                    request_id: request.request_id,
                    ids: Default::default(),
                });
            }
        }
    }

    fn on_list_groups(&self, request: ListGroups) {
        let ids = self
            .groups
            .iter()
            .filter(|(_, group)| !group.is_terminated())
            .map(|(group_id, _)| group_id.clone())
            .collect();
        request.reply_to.tell(GroupList {
            request_id: request.request_id,
            ids,
        });
    }

    fn on_aggregate_read(&mut self, request: AggregateRead) {
        match self.live_group(&request.group_id) {
            Some(group) => {
                let group = group.clone();
                self.deliver(&group, GroupRequest::AggregateRead(request));
            }
            // No group, no reply: callers bound the wait with their own timeout.
            None => tracing::debug!(
                group = %request.group_id,
                request_id = request.request_id,
                "Aggregate read for unknown group dropped"
            ),
        }
    }

    fn on_group_terminated(&mut self, group_id: GroupId, group: GroupHandle) {
        if self.groups.get(&group_id) == Some(&group) {
            self.groups.remove(&group_id);
            tracing::info!(group = %group_id, "Group terminated");
            metrics::record_groups_active(self.groups.len());
        }
    }

    /// Forward a request to a group. If the group stopped in the meantime
    /// the request is routed again as if the group never existed.
    fn deliver(&mut self, group: &GroupHandle, request: GroupRequest) {
        match group.try_tell(GroupCommand::Request(request)) {
            Ok(()) => {}
            Err(GroupCommand::Request(request)) => {
                self.groups.retain(|_, existing| existing != group);
                metrics::record_groups_active(self.groups.len());
                self.handle(request.into());
            }
            // Only requests are ever sent from here.
            Err(GroupCommand::LeafTerminated { .. }) => {}
        }
    }
}
