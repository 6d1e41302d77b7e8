//! Ordered many-producer, single-consumer hand-off of announcements.
//!
//! Every producer holds a [`Publisher`]. Dropping the last one is the
//! "producers done" signal: after that the consumer drains whatever is still
//! queued and then sees [`Consumed::Closed`]. A timed-out wait is reported as
//! [`Consumed::Empty`] and never ends consumption on its own.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::AnnounceError;

/// A line of text to be spoken once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Program that produced it; empty for session-level announcements.
    pub program_id: String,
    pub text: String,
}

impl Announcement {
    pub fn new(program_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            program_id: program_id.into(),
            text: text.into(),
        }
    }

    /// An announcement that belongs to no program.
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(String::new(), text)
    }

    /// Text as handed to the speech engine, prefixed with the program name.
    pub fn spoken(&self) -> String {
        if self.program_id.is_empty() {
            self.text.clone()
        } else {
            format!("{} {}", self.program_id, self.text)
        }
    }
}

/// Result of one [`Consumer::consume`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Consumed {
    Item(Announcement),
    /// Nothing arrived within the timeout; producers may still be live.
    Empty,
    /// Every publisher is gone and the queue is drained.
    Closed,
}

/// Create a connected publisher/consumer pair.
pub fn channel() -> (Publisher, Consumer) {
    let (tx, rx) = mpsc::unbounded_channel();
    let live = Arc::new(AtomicUsize::new(1));
    (
        Publisher {
            tx,
            live: Arc::clone(&live),
        },
        Consumer { rx, live },
    )
}

/// Producer handle. Clone one per producer; drop it when done publishing.
#[derive(Debug)]
pub struct Publisher {
    tx: mpsc::UnboundedSender<Announcement>,
    live: Arc<AtomicUsize>,
}

impl Publisher {
    /// Enqueue without blocking.
    pub fn publish(&self, announcement: Announcement) -> Result<(), AnnounceError> {
        self.tx
            .send(announcement)
            .map_err(|err| AnnounceError::ConsumerGone(err.0.spoken()))
    }
}

impl Clone for Publisher {
    fn clone(&self) -> Self {
        self.live.fetch_add(1, Ordering::SeqCst);
        Self {
            tx: self.tx.clone(),
            live: Arc::clone(&self.live),
        }
    }
}

impl Drop for Publisher {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The single consumer end.
#[derive(Debug)]
pub struct Consumer {
    rx: mpsc::UnboundedReceiver<Announcement>,
    live: Arc<AtomicUsize>,
}

impl Consumer {
    /// Wait up to `timeout` for the next announcement.
    pub async fn consume(&mut self, timeout: Duration) -> Consumed {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(announcement)) => Consumed::Item(announcement),
            Ok(None) => Consumed::Closed,
            Err(_) => Consumed::Empty,
        }
    }

    /// Publishers still alive.
    pub fn live_producers(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}
