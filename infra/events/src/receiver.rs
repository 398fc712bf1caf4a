use crate::bus::Event;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Lag-tolerant receive for bus subscriptions.
pub trait EventReceiverExt<T> {
    /// Waits for the next event, skipping anything lost to lag.
    ///
    /// Returns `None` once every sender for `T` is gone.
    fn next_event(&mut self) -> impl Future<Output = Option<Arc<T>>> + Send;
}

impl<T: Event> EventReceiverExt<T> for broadcast::Receiver<Arc<T>> {
    async fn next_event(&mut self) -> Option<Arc<T>> {
        let mut lost = 0u64;
        loop {
            match self.recv().await {
                Ok(event) => {
                    if lost > 0 {
                        warn!(event = std::any::type_name::<T>(), lost, "Subscriber lagged behind");
                    }
                    return Some(event);
                },
                Err(broadcast::error::RecvError::Lagged(n)) => lost = lost.saturating_add(n),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
