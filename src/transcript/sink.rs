//! Transcript output handlers.

use crate::feed::protocol::FeedEvent;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// One transcript update, published after every processed batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptUpdate {
    /// True when this text started a new phrase (the previous line is now
    /// finalized); false when the live phrase was overwritten in place.
    pub finalized: bool,
    /// The just-produced text of the live phrase.
    pub text: String,
    /// The full transcript after the commit.
    pub transcript: Vec<String>,
}

/// Pluggable transcript output handler.
///
/// Pairs with the capture side for input; this handles transcription
/// output. A sink must not block the aggregator materially; a failing sink
/// is logged and skipped, never fatal.
pub trait TranscriptSink: Send {
    /// Handle one transcript update.
    fn publish(&mut self, update: &TranscriptUpdate) -> crate::error::Result<()>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

/// Console sink: clears the screen and reprints the whole transcript on
/// every update, the way a live caption display behaves.
pub struct ConsoleSink {
    out: io::Stdout,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { out: io::stdout() }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSink for ConsoleSink {
    fn publish(&mut self, update: &TranscriptUpdate) -> crate::error::Result<()> {
        let mut out = self.out.lock();
        // Full redraw: clear screen, home cursor, reprint every phrase
        write!(out, "\x1b[2J\x1b[H")?;
        for line in &update.transcript {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Feed sink: forwards updates to the feed server's broadcast channel.
///
/// "No subscribers" is not an error; the session runs fine with nobody
/// watching.
pub struct FeedSink {
    events: broadcast::Sender<FeedEvent>,
}

impl FeedSink {
    pub fn new(events: broadcast::Sender<FeedEvent>) -> Self {
        Self { events }
    }
}

impl TranscriptSink for FeedSink {
    fn publish(&mut self, update: &TranscriptUpdate) -> crate::error::Result<()> {
        let _ = self.events.send(FeedEvent::Phrase {
            finalized: update.finalized,
            text: update.text.clone(),
            transcript: update.transcript.clone(),
        });
        Ok(())
    }

    fn name(&self) -> &'static str {
        "feed"
    }
}

/// Collects updates for tests and library use.
///
/// Clones share the same backing store, so a clone kept outside the
/// aggregator observes everything the pipeline published.
#[derive(Clone)]
pub struct CollectorSink {
    collected: Arc<Mutex<Vec<TranscriptUpdate>>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            collected: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Snapshot of everything published so far.
    pub fn updates(&self) -> Vec<TranscriptUpdate> {
        self.collected.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptSink for CollectorSink {
    fn publish(&mut self, update: &TranscriptUpdate) -> crate::error::Result<()> {
        if let Ok(mut collected) = self.collected.lock() {
            collected.push(update.clone());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}
