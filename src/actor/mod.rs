//! Mailbox and addressing layer shared by every entity.
//!
//! # Data Flow
//! ```text
//! Entity task:
//!     mailbox() → (Addr<M>, Mailbox<M>)
//!     tokio::spawn(loop { mailbox.recv() → handle one message })
//!
//! Replies:
//!     Recipient<T> ← Addr<T>              (direct)
//!     Recipient<T> ← Addr<M> + fn(T) → M  (adapted into another protocol)
//!
//! Termination subscription:
//!     watch_with(watched, subscriber, notice)
//!     → forwarder task waits for the watched mailbox to close
//!     → subscriber receives `notice`
//! ```
//!
//! # Design Decisions
//! - Mailboxes are unbounded; an entity never blocks its senders
//! - An entity is terminated exactly when its mailbox receiver is dropped
//! - Handles compare equal when they address the same mailbox

pub mod addr;
pub mod ask;
pub mod watch;

pub use addr::{mailbox, Addr, Mailbox, Recipient};
pub use ask::{ask, AskError};
pub use watch::watch_with;
