use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{broadcast, oneshot};
use tokio::task;
use tracing::warn;

use super::sink::{StdOutSink, UpdateSink};
use super::stream::UpdateStream;
use crate::protocol::Update;

/// Default broadcast capacity for [`UpdateStream`] subscribers.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Receives the runtime's update sequence and fans it out.
///
/// Every update goes to all registered sinks in registration order and to
/// every live [`UpdateStream`] subscriber. Sinks see the sequence exactly;
/// slow subscribers may lag and skip (counted in [`UpdateBus::dropped`]).
pub struct UpdateBus {
    sinks: Arc<Mutex<Vec<Box<dyn UpdateSink>>>>,
    channel: (flume::Sender<Update>, flume::Receiver<Update>),
    broadcast: broadcast::Sender<Update>,
    dropped: Arc<AtomicUsize>,
    listener: Mutex<Option<ListenerState>>,
    capacity: usize,
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::with_sink(StdOutSink::default())
    }
}

impl UpdateBus {
    /// Bus with a single sink and the default subscriber capacity.
    pub fn with_sink<T>(sink: T) -> Self
    where
        T: UpdateSink + 'static,
    {
        Self::with_sinks(vec![Box::new(sink)])
    }

    pub fn with_sinks(sinks: Vec<Box<dyn UpdateSink>>) -> Self {
        Self::build(sinks, DEFAULT_CAPACITY)
    }

    /// Bus with no sinks; useful when every consumer subscribes instead.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::build(Vec::new(), capacity)
    }

    fn build(sinks: Vec<Box<dyn UpdateSink>>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (broadcast, _) = broadcast::channel(capacity);
        Self {
            sinks: Arc::new(Mutex::new(sinks)),
            channel: flume::unbounded(),
            broadcast,
            dropped: Arc::new(AtomicUsize::new(0)),
            listener: Mutex::new(None),
            capacity,
        }
    }

    /// Dynamically add a sink (useful for capture that starts mid-run).
    pub fn add_sink<T: UpdateSink + 'static>(&self, sink: T) {
        self.sinks.lock().unwrap().push(Box::new(sink));
    }

    /// Clone of the producing side; the runtime holds one of these.
    pub fn sender(&self) -> flume::Sender<Update> {
        self.channel.0.clone()
    }

    /// Subscribe to the live update sequence from this point on.
    pub fn subscribe(&self) -> UpdateStream {
        UpdateStream::new(self.broadcast.subscribe(), Arc::clone(&self.dropped))
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Updates skipped by lagging subscribers since the bus was created.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Spawn the background task that drains the queue into sinks and
    /// subscribers. Idempotent: later calls have no effect.
    pub fn listen(&self) {
        let mut guard = self.listener.lock().expect("listener poisoned");
        if guard.is_some() {
            return;
        }

        let receiver = self.channel.1.clone();
        let sinks = Arc::clone(&self.sinks);
        let broadcast = self.broadcast.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let handle = task::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    recv = receiver.recv_async() => match recv {
                        Err(_) => break,
                        Ok(update) => {
                            // No subscribers is fine; sinks still run.
                            let _ = broadcast.send(update.clone());
                            let mut sinks_guard = sinks.lock().unwrap();
                            for sink in sinks_guard.iter_mut() {
                                if let Err(err) = sink.handle(&update) {
                                    warn!(error = %err, "update sink failed");
                                }
                            }
                        }
                    }
                }
            }
        });

        *guard = Some(ListenerState {
            shutdown_tx,
            handle,
        });
    }

    /// Stop the listener and wait for it to drain the current update.
    pub async fn stop(&self) {
        let state = {
            let mut guard = self.listener.lock().expect("listener poisoned");
            guard.take()
        };
        if let Some(state) = state {
            let _ = state.shutdown_tx.send(());
            let _ = state.handle.await;
        }
    }
}

impl Drop for UpdateBus {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.listener.lock()
            && let Some(state) = guard.take()
        {
            let _ = state.shutdown_tx.send(());
            state.handle.abort();
        }
    }
}

struct ListenerState {
    shutdown_tx: oneshot::Sender<()>,
    handle: task::JoinHandle<()>,
}
