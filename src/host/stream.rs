use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures_util::stream;
use tokio::sync::broadcast::{self, Receiver};
use tokio::time::timeout;

use crate::protocol::Update;

/// A live subscription to the bus's update sequence.
///
/// Backed by a bounded broadcast channel: a subscriber that falls behind
/// skips the missed updates and keeps going, with the skip count recorded
/// on the owning bus.
pub struct UpdateStream {
    receiver: Receiver<Update>,
    dropped: Arc<AtomicUsize>,
}

impl UpdateStream {
    pub(super) fn new(receiver: Receiver<Update>, dropped: Arc<AtomicUsize>) -> Self {
        Self { receiver, dropped }
    }

    pub async fn recv(&mut self) -> Result<Update, broadcast::error::RecvError> {
        match self.receiver.recv().await {
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                self.dropped.fetch_add(missed as usize, Ordering::Relaxed);
                Err(broadcast::error::RecvError::Lagged(missed))
            }
            other => other,
        }
    }

    pub fn try_recv(&mut self) -> Result<Update, broadcast::error::TryRecvError> {
        match self.receiver.try_recv() {
            Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                self.dropped.fetch_add(missed as usize, Ordering::Relaxed);
                Err(broadcast::error::TryRecvError::Lagged(missed))
            }
            other => other,
        }
    }

    /// Next update within `duration`, transparently skipping lag gaps.
    /// `None` on timeout or once the bus is gone.
    pub async fn next_timeout(&mut self, duration: Duration) -> Option<Update> {
        loop {
            match timeout(duration, self.recv()).await {
                Ok(Ok(update)) => return Some(update),
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) => return None,
                Err(_) => return None,
            }
        }
    }

    /// Adapt into a `futures_util` stream, ending when the bus is dropped.
    pub fn into_stream(self) -> impl stream::Stream<Item = Update> {
        stream::unfold(self, |mut this| async move {
            loop {
                match this.recv().await {
                    Ok(update) => return Some((update, this)),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        })
    }

    pub fn into_inner(self) -> Receiver<Update> {
        self.receiver
    }
}
