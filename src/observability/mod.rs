//! Event observation for agent runs and stream parsing.
//!
//! Observers receive structured events (agent lifecycle, utensil execution,
//! parse diagnostics) from the code that does the work, without being able to
//! steer it. The default backend drops every event; the `log` backend
//! forwards events to `tracing`.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ObservabilityConfig;

/// A structured event emitted during an agent run.
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    /// An agent task started.
    AgentStart,
    /// An agent task finished.
    AgentEnd { success: bool },
    /// A utensil finished executing.
    UtensilCall {
        utensil: String,
        duration: Duration,
        success: bool,
    },
    /// The parser queued a completed call block.
    CallParsed { utensil: String },
    /// The parser dropped a `PARAM:` line that had no `=`.
    MalformedParam { line: String },
    /// End of stream arrived with a call block still open; it was discarded.
    UnterminatedCall { utensil: String },
}

/// Sink for [`ObserverEvent`]s. Implementations must be cheap and must not
/// fail; they see events, they do not influence results.
pub trait Observer: Send + Sync {
    fn record_event(&self, event: &ObserverEvent);
}

/// Observer that drops every event.
pub struct NoopObserver {}

impl Observer for NoopObserver {
    fn record_event(&self, _event: &ObserverEvent) {}
}

/// Observer that forwards events to `tracing`.
pub struct LogObserver {}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::AgentStart => tracing::info!("agent task started"),
            ObserverEvent::AgentEnd { success } => {
                tracing::info!(success, "agent task finished");
            }
            ObserverEvent::UtensilCall {
                utensil,
                duration,
                success,
            } => {
                tracing::info!(utensil = %utensil, ?duration, success, "utensil executed");
            }
            ObserverEvent::CallParsed { utensil } => {
                tracing::debug!(utensil = %utensil, "utensil call parsed");
            }
            ObserverEvent::MalformedParam { line } => {
                tracing::warn!(line = %line, "dropped PARAM line without '='");
            }
            ObserverEvent::UnterminatedCall { utensil } => {
                tracing::warn!(utensil = %utensil, "discarded unterminated utensil call");
            }
        }
    }
}

/// Builds the observer selected by `[observability] backend`.
pub fn create_observer(config: &ObservabilityConfig) -> Arc<dyn Observer> {
    match config.backend.as_str() {
        "log" => Arc::new(LogObserver {}),
        _ => Arc::new(NoopObserver {}),
    }
}
