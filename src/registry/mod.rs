//! Device registry subsystem.
//!
//! # Data Flow
//! ```text
//! Track / Find / ListLeaves / AggregateRead:
//!     caller
//!     → manager.rs (Registry: get-or-create group)
//!     → group.rs (Group: get-or-create leaf)
//!     → leaf.rs (Leaf: reply Registered / Write / Read)
//!
//! AggregateRead inside a group:
//!     group.rs snapshots its leaves
//!     → session.rs (AggregationSession)
//!         → Read to every leaf, watch every leaf
//!         → collect Value / Unavailable / Unreachable / TimedOut
//!     → single AggregateResult straight to the caller
//!
//! Lifecycle:
//!     Leaf stops (Passivate)    → group removes it
//!     Group empty               → group stops → registry removes it
//! ```
//!
//! # Design Decisions
//! - One task per entity; maps are only touched by their owning task
//! - Get-or-create happens inside a single message handler; Find never creates
//! - Failures are data (`Reading`), never errors
//! - Requests for a mismatched group are dropped with a warning

pub mod client;
pub mod group;
pub mod leaf;
pub mod manager;
pub mod protocol;
pub mod session;

pub use client::RegistryClient;
pub use group::{Group, GroupCommand, GroupHandle, GroupRequest};
pub use leaf::Leaf;
pub use manager::{Registry, RegistryCommand, RegistryHandle};
pub use protocol::*;
pub use session::{AggregationSession, Collector, SessionEvent};
