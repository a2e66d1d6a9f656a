//! Debouncing of free-text search input
//!
//! Every submitted query supersedes the pending one; a query is emitted only
//! after it stayed unchanged for the quiet period. Closing the debouncer
//! flushes whatever is pending.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct SearchDebouncer {
    input: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl SearchDebouncer {
    /// Start the debouncer; settled queries arrive on the returned receiver
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(quiet: Duration) -> (Self, mpsc::Receiver<String>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::channel(16);
        let task = tokio::spawn(run(input_rx, output, quiet));
        (Self { input, task }, output_rx)
    }

    /// Returns false once the debouncer has stopped
    pub fn submit(&self, query: impl Into<String>) -> bool {
        self.input.send(query.into()).is_ok()
    }

    /// Stop accepting input and wait for the pending query to be flushed
    pub async fn close(self) {
        drop(self.input);
        let _ = self.task.await;
    }
}

async fn run(mut input: mpsc::UnboundedReceiver<String>, output: mpsc::Sender<String>, quiet: Duration) {
    while let Some(mut pending) = input.recv().await {
        let closed = loop {
            match tokio::time::timeout(quiet, input.recv()).await {
                Ok(Some(next)) => pending = next,
                Ok(None) => break true,
                Err(_) => break false,
            }
        };
        debug!(query = %pending, "Search query settled");
        if output.send(pending).await.is_err() || closed {
            return;
        }
    }
}
