//! Message contracts between callers, registries, sessions and leaves.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::actor::{Addr, Recipient};

/// Identifier of a group of leaves.
pub type GroupId = String;
/// Identifier of a leaf within its group.
pub type LeafId = String;
/// Caller-supplied correlation token echoed in replies.
pub type RequestId = u64;

/// Default deadline for an aggregate read.
pub const DEFAULT_AGGREGATE_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of reading a single leaf during an aggregate read.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading {
    /// The leaf answered with a value.
    Value(f64),
    /// The leaf answered but has no value recorded yet.
    Unavailable,
    /// The leaf terminated before answering.
    Unreachable,
    /// The deadline elapsed before the leaf answered.
    TimedOut,
}

impl Reading {
    /// Label used for logs and metrics.
    pub fn status(&self) -> &'static str {
        match self {
            Reading::Value(_) => "value",
            Reading::Unavailable => "unavailable",
            Reading::Unreachable => "unreachable",
            Reading::TimedOut => "timed_out",
        }
    }
}

/// Commands understood by a leaf.
#[derive(Debug)]
pub enum LeafCommand {
    Write {
        request_id: RequestId,
        value: f64,
        reply_to: Recipient<WriteAck>,
    },
    Read {
        request_id: RequestId,
        reply_to: Recipient<ReadResult>,
    },
    /// Stop the leaf. No reply.
    Passivate,
}

/// Handle to a leaf returned on registration.
pub type LeafHandle = Addr<LeafCommand>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WriteAck {
    pub request_id: RequestId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadResult {
    pub request_id: RequestId,
    pub leaf_id: LeafId,
    pub value: Option<f64>,
}

/// Register a leaf, creating it and its group if needed.
#[derive(Debug)]
pub struct TrackLeaf {
    pub group_id: GroupId,
    pub leaf_id: LeafId,
    pub reply_to: Recipient<Registered>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Registered {
    pub leaf: LeafHandle,
}

/// Look up a running leaf without creating it or its group.
#[derive(Debug)]
pub struct FindLeaf {
    pub group_id: GroupId,
    pub leaf_id: LeafId,
    pub reply_to: Recipient<Option<LeafHandle>>,
}

#[derive(Debug)]
pub struct ListLeaves {
    pub request_id: RequestId,
    pub group_id: GroupId,
    pub reply_to: Recipient<LeafList>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafList {
    pub request_id: RequestId,
    pub ids: BTreeSet<LeafId>,
}

#[derive(Debug)]
pub struct ListGroups {
    pub request_id: RequestId,
    pub reply_to: Recipient<GroupList>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupList {
    pub request_id: RequestId,
    pub ids: BTreeSet<GroupId>,
}

/// Read every leaf of a group within `timeout`.
#[derive(Debug)]
pub struct AggregateRead {
    pub request_id: RequestId,
    pub group_id: GroupId,
    pub reply_to: Recipient<AggregateResult>,
    pub timeout: Duration,
}

impl AggregateRead {
    /// Aggregate read with the default deadline.
    pub fn new(request_id: RequestId, group_id: impl Into<GroupId>, reply_to: Recipient<AggregateResult>) -> Self {
        Self {
            request_id,
            group_id: group_id.into(),
            reply_to,
            timeout: DEFAULT_AGGREGATE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub request_id: RequestId,
    pub readings: BTreeMap<LeafId, Reading>,
}
