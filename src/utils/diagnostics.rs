use crate::domain::ports::Diagnostics;
use std::sync::Mutex;
use tracing::Level;

/// Forwards every diagnostic to `tracing` at the recorded level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            Level::INFO => tracing::info!("{}", message),
            Level::DEBUG => tracing::debug!("{}", message),
            _ => tracing::trace!("{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: Level::WARN,
            message: message.into(),
        }
    }
}

/// Keeps diagnostics in memory, optionally forwarding them to another sink.
#[derive(Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
    forward: Option<Box<dyn Diagnostics>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forwarding_to(sink: impl Diagnostics + 'static) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            forward: Some(Box::new(sink)),
        }
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, level: Level) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.iter().filter(|d| d.level == level).count())
            .unwrap_or(0)
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn record(&self, level: Level, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(Diagnostic {
                level,
                message: message.to_string(),
            });
        }
        if let Some(forward) = &self.forward {
            forward.record(level, message);
        }
    }
}
