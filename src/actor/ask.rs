//! Request/response on top of one-way messages.

use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time;

use crate::actor::{Addr, Recipient};

/// Errors produced when asking an entity for a reply.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AskError {
    /// The target entity has terminated.
    #[error("target entity has terminated")]
    Closed,

    /// The request was dropped without anyone replying.
    #[error("request was dropped without a reply")]
    NoReply,

    /// No reply arrived in time.
    #[error("no reply within {0:?}")]
    Timeout(Duration),
}

/// Send a request built by `make` and wait up to `timeout` for its reply.
pub async fn ask<M, R, F>(addr: &Addr<M>, timeout: Duration, make: F) -> Result<R, AskError>
where
    R: Send + 'static,
    F: FnOnce(Recipient<R>) -> M,
{
    let (tx, mut rx) = mpsc::unbounded_channel();

    if !addr.tell(make(Recipient::new(tx))) {
        return Err(AskError::Closed);
    }

    match time::timeout(timeout, rx.recv()).await {
        Ok(Some(reply)) => Ok(reply),
        Ok(None) => Err(AskError::NoReply),
        Err(_) => Err(AskError::Timeout(timeout)),
    }
}
