//! Cancellable pull handle over a store's push channel.

use tokio::sync::mpsc;

use super::Push;

/// Store-side half of a subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionSender {
    sender: mpsc::UnboundedSender<Push>,
}

impl SubscriptionSender {
    /// Deliver a push. Returns `false` once the consumer has closed or
    /// dropped its [`Subscription`], so the store can forget it.
    pub fn send(&self, push: Push) -> bool {
        self.sender.send(push).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Consumer-side half of a subscription.
///
/// Pushes are pulled with [`next`](Subscription::next). After
/// [`close`](Subscription::close) nothing more is yielded, including pushes
/// that were already buffered. Dropping the handle closes it.
#[derive(Debug)]
pub struct Subscription {
    receiver: mpsc::UnboundedReceiver<Push>,
    closed: bool,
}

impl Subscription {
    pub fn channel() -> (SubscriptionSender, Subscription) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            SubscriptionSender { sender },
            Subscription {
                receiver,
                closed: false,
            },
        )
    }

    /// Wait for the next push. `None` once closed, or once the store side
    /// has gone away.
    pub async fn next(&mut self) -> Option<Push> {
        if self.closed {
            return None;
        }
        self.receiver.recv().await
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.receiver.close();
        while self.receiver.try_recv().is_ok() {}
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}
