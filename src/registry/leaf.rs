//! Leaf entity holding the most recent reading.

use std::ops::ControlFlow;

use crate::actor::{mailbox, Mailbox};
use crate::observability::metrics;
use crate::registry::protocol::{GroupId, LeafCommand, LeafHandle, LeafId, ReadResult, WriteAck};

/// State owned by a single leaf task.
#[derive(Debug)]
pub struct Leaf {
    group_id: GroupId,
    leaf_id: LeafId,
    last_reading: Option<f64>,
}

impl Leaf {
    pub fn new(group_id: GroupId, leaf_id: LeafId) -> Self {
        Self {
            group_id,
            leaf_id,
            last_reading: None,
        }
    }

    /// Start the leaf on its own task and return its handle.
    pub fn spawn(group_id: GroupId, leaf_id: LeafId) -> LeafHandle {
        let (addr, mailbox) = mailbox();
        tokio::spawn(Self::new(group_id, leaf_id).run(mailbox));
        addr
    }

    async fn run(mut self, mut mailbox: Mailbox<LeafCommand>) {
        tracing::debug!(group = %self.group_id, leaf = %self.leaf_id, "Leaf started");
        metrics::record_leaf_started();

        while let Some(command) = mailbox.recv().await {
            if self.handle(command).is_break() {
                break;
            }
        }

        tracing::debug!(group = %self.group_id, leaf = %self.leaf_id, "Leaf stopped");
        metrics::record_leaf_stopped();
    }

    /// Process one command. `Break` means the leaf must stop.
    pub fn handle(&mut self, command: LeafCommand) -> ControlFlow<()> {
        match command {
            LeafCommand::Write { request_id, value, reply_to } => {
                tracing::trace!(leaf = %self.leaf_id, request_id, value, "Recording reading");
                self.last_reading = Some(value);
                reply_to.tell(WriteAck { request_id });
            }
            LeafCommand::Read { request_id, reply_to } => {
                reply_to.tell(ReadResult {
                    request_id,
                    leaf_id: self.leaf_id.clone(),
                    value: self.last_reading,
                });
            }
            LeafCommand::Passivate => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    pub fn last_reading(&self) -> Option<f64> {
        self.last_reading
    }
}
