//! Typed entity addresses and reply recipients.

use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receiving end of an entity's message queue.
pub type Mailbox<M> = mpsc::UnboundedReceiver<M>;

/// Create a new mailbox together with the address that feeds it.
pub fn mailbox<M>() -> (Addr<M>, Mailbox<M>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Addr { tx }, rx)
}

/// Opaque, cloneable handle to a running entity.
///
/// Sending never blocks. Once the owning task exits every `tell` returns
/// `false` and [`Addr::terminated`] resolves.
pub struct Addr<M> {
    tx: mpsc::UnboundedSender<M>,
}

impl<M> Addr<M> {
    /// Enqueue a message. Returns `false` if the entity has terminated.
    pub fn tell(&self, msg: M) -> bool {
        self.try_tell(msg).is_ok()
    }

    /// Enqueue a message, handing it back if the entity has terminated.
    pub fn try_tell(&self, msg: M) -> Result<(), M> {
        self.tx.send(msg).map_err(|mpsc::error::SendError(msg)| msg)
    }

    /// Whether the entity has stopped processing messages.
    pub fn is_terminated(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the entity has stopped.
    pub async fn terminated(&self) {
        self.tx.closed().await
    }
}

impl<M> Clone for Addr<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<M> PartialEq for Addr<M> {
    fn eq(&self, other: &Self) -> bool {
        self.tx.same_channel(&other.tx)
    }
}

impl<M> Eq for Addr<M> {}

impl<M> fmt::Debug for Addr<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Addr")
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

/// Where a reply of type `T` should be delivered.
///
/// Either a plain channel (callers outside the entity tree) or an entity
/// address whose protocol wraps `T`.
pub struct Recipient<T> {
    deliver: Arc<dyn Fn(T) -> bool + Send + Sync>,
}

impl<T: Send + 'static> Recipient<T> {
    /// Deliver replies into a plain channel.
    pub fn new(tx: mpsc::UnboundedSender<T>) -> Self {
        Self {
            deliver: Arc::new(move |msg| tx.send(msg).is_ok()),
        }
    }

    /// Deliver replies to an entity that speaks another protocol, wrapping
    /// each reply with `wrap`.
    pub fn adapted<M: Send + 'static>(addr: &Addr<M>, wrap: fn(T) -> M) -> Self {
        let addr = addr.clone();
        Self {
            deliver: Arc::new(move |msg| addr.tell(wrap(msg))),
        }
    }

    /// Send the reply. Returns `false` if nobody is listening anymore.
    pub fn tell(&self, msg: T) -> bool {
        (self.deliver)(msg)
    }
}

impl<T: Send + 'static> From<Addr<T>> for Recipient<T> {
    fn from(addr: Addr<T>) -> Self {
        Self {
            deliver: Arc::new(move |msg| addr.tell(msg)),
        }
    }
}

impl<T> Clone for Recipient<T> {
    fn clone(&self) -> Self {
        Self {
            deliver: Arc::clone(&self.deliver),
        }
    }
}

impl<T> fmt::Debug for Recipient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Recipient")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum Wrapped {
        Number(u32),
    }

    #[tokio::test]
    async fn test_tell_after_drop_fails() {
        let (addr, mailbox) = mailbox::<u32>();
        assert!(addr.tell(1));
        assert!(!addr.is_terminated());

        drop(mailbox);
        assert!(addr.is_terminated());
        assert!(!addr.tell(2));
        assert_eq!(addr.try_tell(3), Err(3));
        addr.terminated().await;
    }

    #[tokio::test]
    async fn test_addr_identity() {
        let (a, _ma) = mailbox::<u32>();
        let (b, _mb) = mailbox::<u32>();

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_adapted_recipient_wraps_reply() {
        let (addr, mut mailbox) = mailbox::<Wrapped>();
        let recipient = Recipient::adapted(&addr, Wrapped::Number);

        assert!(recipient.tell(7));
        assert_eq!(mailbox.recv().await, Some(Wrapped::Number(7)));
    }
}
