//! Socket adapters
//!
//! - `ChannelSocket`: backed by a bounded tokio channel read by a transport task
//! - `RecordingSocket`: keeps every frame in memory (for testing and harnesses)

use parking_lot::Mutex;
use shared_types::{Socket, SocketKind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

/// Socket whose frames are queued on a bounded mpsc channel.
///
/// `send` uses `try_send`: when the buffer is full or the reader is gone the
/// frame is dropped and counted.
pub struct ChannelSocket {
    id: String,
    kind: SocketKind,
    sender: mpsc::Sender<Vec<u8>>,
    dropped: AtomicU64,
}

impl ChannelSocket {
    /// Create a socket and the receiver its transport task reads from.
    pub fn new(
        id: impl Into<String>,
        kind: SocketKind,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let socket = Self {
            id: id.into(),
            kind,
            sender,
            dropped: AtomicU64::new(0),
        };
        (socket, receiver)
    }

    /// Frames dropped because the buffer was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Socket for ChannelSocket {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SocketKind {
        self.kind
    }

    fn send(&self, frame: &[u8]) {
        if let Err(e) = self.sender.try_send(frame.to_vec()) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            warn!(socket_id = %self.id, error = %e, "Frame dropped");
        }
    }

    fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// In-memory socket that records frames.
pub struct RecordingSocket {
    id: String,
    kind: SocketKind,
    frames: Mutex<Vec<Vec<u8>>>,
    closed: AtomicBool,
}

impl RecordingSocket {
    pub fn new(id: impl Into<String>, kind: SocketKind) -> Self {
        Self {
            id: id.into(),
            kind,
            frames: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// All frames sent so far.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.frames.lock().clone()
    }

    /// Take the frames sent so far, leaving the socket empty.
    pub fn drain(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.frames.lock())
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::Relaxed);
    }
}

impl Socket for RecordingSocket {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> SocketKind {
        self.kind
    }

    fn send(&self, frame: &[u8]) {
        self.frames.lock().push(frame.to_vec());
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}
