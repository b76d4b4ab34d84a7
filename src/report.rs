//! Where run statistics go.
//!
//! The importer never logs its final statistics directly; it hands each line
//! to a [`Reporter`]. The binary uses [`TracingReporter`], embedders can
//! collect lines with [`MemoryReporter`] or plug in their own.

use tracing::info;

/// Receives human-readable status lines.
pub trait Reporter {
    fn report(&mut self, message: &str);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn report(&mut self, message: &str) {
        (**self).report(message);
    }
}

impl<R: Reporter + ?Sized> Reporter for Box<R> {
    fn report(&mut self, message: &str) {
        (**self).report(message);
    }
}

/// Emits each line as a `tracing` event at INFO level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, message: &str) {
        info!(target: "keysplit::report", "{message}");
    }
}

/// Keeps every line in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryReporter {
    messages: Vec<String>,
}

impl MemoryReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, message: &str) {
        self.messages.push(message.to_owned());
    }
}
