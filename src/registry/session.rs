//! Aggregation session: scatter a read to every leaf of a snapshot and
//! gather exactly one reading per leaf before a deadline.
//!
//! # State Machine
//! ```text
//! Collecting ── answer / termination / deadline ──▶ Collecting   (pending not empty)
//!            └─────────────────────────────────────▶ Done         (pending empty, reply sent)
//! ```
//!
//! Every transition is a membership test against `pending`, so the final
//! result does not depend on the order in which events arrive. An answer
//! that was already recorded is never replaced by a later termination.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, Instant};
use tokio::time;

use crate::actor::{mailbox, watch_with, Addr, Mailbox, Recipient};
use crate::observability::metrics;
use crate::registry::protocol::{
    AggregateResult, LeafCommand, LeafHandle, LeafId, ReadResult, Reading, RequestId,
};

/// Request id used for the per-leaf reads issued by a session.
const PROBE_REQUEST_ID: RequestId = 0;

/// Events delivered to a running session.
#[derive(Debug)]
pub enum SessionEvent {
    Answer(ReadResult),
    LeafTerminated(LeafId),
}

/// Pending/collected bookkeeping of one aggregate read.
#[derive(Debug, Clone)]
pub struct Collector {
    pending: HashSet<LeafId>,
    collected: BTreeMap<LeafId, Reading>,
}

impl Collector {
    pub fn new<I>(leaf_ids: I) -> Self
    where
        I: IntoIterator<Item = LeafId>,
    {
        Self {
            pending: leaf_ids.into_iter().collect(),
            collected: BTreeMap::new(),
        }
    }

    /// Record a leaf's answer. Returns `false` if the leaf was not pending.
    pub fn record_answer(&mut self, leaf_id: &str, value: Option<f64>) -> bool {
        if !self.pending.remove(leaf_id) {
            return false;
        }
        let reading = value.map(Reading::Value).unwrap_or(Reading::Unavailable);
        self.collected.insert(leaf_id.to_string(), reading);
        true
    }

    /// Record that a leaf stopped. Ignored once the leaf has answered.
    pub fn record_terminated(&mut self, leaf_id: &str) -> bool {
        if !self.pending.remove(leaf_id) {
            return false;
        }
        self.collected.insert(leaf_id.to_string(), Reading::Unreachable);
        true
    }

    /// Mark every leaf still pending as timed out. Returns how many were.
    pub fn record_deadline(&mut self) -> usize {
        let expired = self.pending.len();
        for leaf_id in self.pending.drain() {
            self.collected.insert(leaf_id, Reading::TimedOut);
        }
        expired
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn into_readings(self) -> BTreeMap<LeafId, Reading> {
        self.collected
    }
}

/// Ephemeral task answering a single aggregate read.
pub struct AggregationSession {
    request_id: RequestId,
    reply_to: Recipient<AggregateResult>,
    collector: Collector,
    timeout: Duration,
}

impl AggregationSession {
    /// Start a session over `leaves`.
    ///
    /// The session replies to `reply_to` exactly once and then stops.
    pub fn spawn(
        leaves: HashMap<LeafId, LeafHandle>,
        request_id: RequestId,
        reply_to: Recipient<AggregateResult>,
        timeout: Duration,
    ) -> Addr<SessionEvent> {
        let (addr, mailbox) = mailbox();
        let session = Self {
            request_id,
            reply_to,
            collector: Collector::new(leaves.keys().cloned()),
            timeout,
        };

        for (leaf_id, leaf) in &leaves {
            watch_with(leaf, &addr, SessionEvent::LeafTerminated(leaf_id.clone()));
            leaf.tell(LeafCommand::Read {
                request_id: PROBE_REQUEST_ID,
                reply_to: Recipient::adapted(&addr, SessionEvent::Answer),
            });
        }

        tokio::spawn(session.run(addr.clone(), mailbox));
        addr
    }

    async fn run(mut self, _addr: Addr<SessionEvent>, mut mailbox: Mailbox<SessionEvent>) {
        let started = Instant::now();
        tracing::debug!(
            request_id = self.request_id,
            leaves = self.collector.pending(),
            timeout = ?self.timeout,
            "Aggregation session started"
        );

        let deadline = time::sleep(self.timeout);
        tokio::pin!(deadline);

        while !self.collector.is_complete() {
            tokio::select! {
                event = mailbox.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => break,
                },
                _ = &mut deadline => {
                    let expired = self.collector.record_deadline();
                    tracing::debug!(request_id = self.request_id, expired, "Aggregation deadline elapsed");
                }
            }
        }

        let readings = self.collector.into_readings();
        metrics::record_session(&readings, started.elapsed());
        tracing::debug!(request_id = self.request_id, readings = readings.len(), "Aggregation session done");

        self.reply_to.tell(AggregateResult {
            request_id: self.request_id,
            readings,
        });
    }

    fn on_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Answer(result) => {
                if !self.collector.record_answer(&result.leaf_id, result.value) {
                    tracing::trace!(request_id = self.request_id, leaf = %result.leaf_id, "Ignoring unexpected answer");
                }
            }
            SessionEvent::LeafTerminated(leaf_id) => {
                if !self.collector.record_terminated(&leaf_id) {
                    tracing::trace!(request_id = self.request_id, leaf = %leaf_id, "Leaf terminated after answering");
                }
            }
        }
    }
}
