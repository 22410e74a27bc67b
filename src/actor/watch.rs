//! Termination subscriptions.

use tokio::task::JoinHandle;

use crate::actor::Addr;

/// Notify `subscriber` with `notice` once `watched` terminates.
///
/// The subscription is dropped silently if the subscriber terminates first.
/// If `watched` is already gone the notice is delivered right away.
pub fn watch_with<W, S>(watched: &Addr<W>, subscriber: &Addr<S>, notice: S) -> JoinHandle<()>
where
    W: Send + 'static,
    S: Send + 'static,
{
    let watched = watched.clone();
    let subscriber = subscriber.clone();

    tokio::spawn(async move {
        tokio::select! {
            _ = watched.terminated() => {
                subscriber.tell(notice);
            }
            _ = subscriber.terminated() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::mailbox;

    #[tokio::test]
    async fn test_notice_on_termination() {
        let (watched, watched_mailbox) = mailbox::<()>();
        let (subscriber, mut inbox) = mailbox::<&'static str>();

        watch_with(&watched, &subscriber, "gone");
        drop(watched_mailbox);

        assert_eq!(inbox.recv().await, Some("gone"));
    }

    #[tokio::test]
    async fn test_already_terminated_is_notified() {
        let (watched, watched_mailbox) = mailbox::<()>();
        drop(watched_mailbox);

        let (subscriber, mut inbox) = mailbox::<&'static str>();
        watch_with(&watched, &subscriber, "gone");

        assert_eq!(inbox.recv().await, Some("gone"));
    }

    #[tokio::test]
    async fn test_subscription_ends_with_subscriber() {
        let (watched, _watched_mailbox) = mailbox::<()>();
        let (subscriber, inbox) = mailbox::<&'static str>();

        let forwarder = watch_with(&watched, &subscriber, "gone");
        drop(inbox);

        forwarder.await.unwrap();
    }
}
