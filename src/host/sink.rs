use std::io::{self, Result as IoResult, Stdout, Write};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::protocol::Update;

/// Abstraction over an output target that consumes host updates.
pub trait UpdateSink: Send + Sync {
    /// Deliver one update. The sink decides how to serialize it.
    fn handle(&mut self, update: &Update) -> IoResult<()>;
}

/// Newline-delimited JSON on stdout, the wire format the host editor reads.
pub struct StdOutSink {
    handle: Stdout,
}

impl Default for StdOutSink {
    fn default() -> Self {
        Self {
            handle: io::stdout(),
        }
    }
}

impl UpdateSink for StdOutSink {
    fn handle(&mut self, update: &Update) -> IoResult<()> {
        let line = update.to_json_value().to_string();
        self.handle.write_all(line.as_bytes())?;
        self.handle.write_all(b"\n")?;
        self.handle.flush()
    }
}

/// In-memory sink for tests and snapshots.
#[derive(Clone, Default)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<Update>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything captured so far.
    pub fn snapshot(&self) -> Vec<Update> {
        self.entries.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl UpdateSink for MemorySink {
    fn handle(&mut self, update: &Update) -> IoResult<()> {
        self.entries.lock().unwrap().push(update.clone());
        Ok(())
    }
}

/// Forwards updates onto a tokio mpsc channel for async consumers
/// (websocket bridges, SSE endpoints, embedding applications).
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Update>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<Update>) -> Self {
        Self { tx }
    }
}

impl UpdateSink for ChannelSink {
    fn handle(&mut self, update: &Update) -> IoResult<()> {
        self.tx
            .send(update.clone())
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "channel receiver dropped"))
    }
}
