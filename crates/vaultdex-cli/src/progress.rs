//! Indexing progress on stderr
//!
//! The indexer sends events into an unbounded channel; a separate task
//! drains them so a slow terminal never holds up indexing.

use std::io::{self, Write};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use vaultdex_core::IndexProgress;

/// Simple progress reporter for CLI commands
pub struct ProgressReporter {
    total: usize,
    processed: usize,
    enabled: bool,
}

impl ProgressReporter {
    pub fn new(enabled: bool) -> Self {
        Self {
            total: 0,
            processed: 0,
            enabled,
        }
    }

    /// Spawn the draining task and hand back the sender for the indexer
    pub fn spawn(self) -> (UnboundedSender<IndexProgress>, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.drain(rx));
        (tx, handle)
    }

    async fn drain(mut self, mut rx: UnboundedReceiver<IndexProgress>) {
        while let Some(event) = rx.recv().await {
            self.handle(&event);
        }
    }

    fn handle(&mut self, event: &IndexProgress) {
        match event {
            IndexProgress::Started { total } => {
                self.total = *total;
                self.set_message(&format!("Indexing {} files", total));
            }
            IndexProgress::Progress {
                processed, current, ..
            } => {
                self.processed = *processed;
                self.set_message(&format!("[{}/{}] {}", processed, self.total, current));
            }
            IndexProgress::Finished { .. } => self.finish(),
        }
    }

    fn set_message(&self, msg: &str) {
        if !self.enabled {
            return;
        }
        eprint!("\r{:<60}", truncate(msg, 60));
        io::stderr().flush().ok();
    }

    fn finish(&self) {
        if self.enabled {
            eprintln!("\rDone ({}/{}){:<40}", self.processed, self.total, "");
        }
    }
}

fn truncate(msg: &str, width: usize) -> String {
    if msg.chars().count() <= width {
        return msg.to_string();
    }
    let tail: String = msg
        .chars()
        .rev()
        .take(width - 3)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("...{}", tail)
}
