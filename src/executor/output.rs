//! The shared output panel and the text sinks that feed it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The text shown in the output panel.
///
/// Cloning shares the same underlying buffer, so interpreter sinks, runners
/// and the panel all observe the same text. Every write is atomic; when two
/// runs overlap, whichever writes last wins.
#[derive(Clone, Debug, Default)]
pub struct OutputBuffer {
    text: Arc<Mutex<String>>,
}

impl OutputBuffer {
    /// Create an empty output buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, String> {
        self.text.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Clear the buffer at the start of a run.
    pub fn reset(&self) {
        self.guard().clear();
    }

    /// Append text as-is.
    pub fn append(&self, text: &str) {
        self.guard().push_str(text);
    }

    /// Overwrite the whole buffer.
    pub fn replace(&self, text: impl Into<String>) {
        *self.guard() = text.into();
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> String {
        self.guard().clone()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}

/// A callback receiving one chunk of interpreter output at a time.
pub type TextSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Sink for interpreter stdout: each chunk becomes a line.
pub fn stdout_sink(output: &OutputBuffer) -> TextSink {
    let output = output.clone();
    Arc::new(move |text: &str| {
        let mut buffer = output.guard();
        buffer.push_str(text);
        buffer.push('\n');
    })
}

/// Sink for interpreter stderr: each chunk becomes an `Error: ` line.
pub fn stderr_sink(output: &OutputBuffer) -> TextSink {
    let output = output.clone();
    Arc::new(move |text: &str| {
        let mut buffer = output.guard();
        buffer.push_str("Error: ");
        buffer.push_str(text);
        buffer.push('\n');
    })
}
