//! crates/logging/src/tracing_bridge.rs
//! Bridge from the tracing crate into an [`Emitter`].
//!
//! Rust programs that already instrument themselves with `tracing` macros can
//! install [`ScriptLogLayer`] so their events land in the same syslog stream,
//! with the same record layout and wrapping, as the shell scripts around them.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use logging::{Emitter, LoggerConfig, ScriptLogLayer};
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let emitter = Arc::new(Emitter::new(LoggerConfig::from_env()?, transport));
//! tracing_subscriber::registry().with(ScriptLogLayer::new(emitter)).init();
//! tracing::warn!("disk almost full");
//! ```

use std::io::Write;
use std::sync::Arc;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::emitter::{EchoPolicy, Emitter};
use crate::record::CallSite;
use crate::severity::Severity;
use crate::transport::Transport;

/// A tracing layer that forwards every event to an [`Emitter`].
pub struct ScriptLogLayer<T, W> {
    emitter: Arc<Emitter<T, W>>,
}

impl<T, W> ScriptLogLayer<T, W> {
    /// Creates a layer writing through `emitter`.
    #[must_use]
    pub const fn new(emitter: Arc<Emitter<T, W>>) -> Self {
        Self { emitter }
    }

    /// Maps a tracing level onto a severity.
    #[must_use]
    pub fn severity_for(level: &Level) -> Severity {
        match *level {
            Level::ERROR => Severity::Error,
            Level::WARN => Severity::Warning,
            Level::INFO => Severity::Info,
            _ => Severity::Debug,
        }
    }
}

impl<S, T, W> Layer<S> for ScriptLogLayer<T, W>
where
    S: Subscriber,
    T: Transport + Send + Sync + 'static,
    W: Write + Send + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let severity = Self::severity_for(metadata.level());
        if !self.emitter.enabled(severity) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Events carry a module path and line but no function name.
        let site = CallSite::at_line(metadata.line().unwrap_or(0));

        self.emitter
            .emit(severity, &visitor.finish(), EchoPolicy::Never, &site);
    }
}

/// Collects the message and any extra fields of an event into one line of text.
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(self) -> String {
        let mut text = self.message.unwrap_or_default();
        for field in self.fields {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&field);
        }
        text
    }
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = Some(format!("{value:?}"));
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_owned());
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use crate::transport::MemoryTransport;
    use tracing_subscriber::layer::SubscriberExt;

    fn layer(max: Severity) -> (Arc<Emitter<MemoryTransport, Vec<u8>>>, impl Subscriber) {
        let emitter = Arc::new(Emitter::with_echo(
            LoggerConfig::new(9, "host", "host", max),
            MemoryTransport::new(),
            Vec::new(),
        ));
        let subscriber =
            tracing_subscriber::registry().with(ScriptLogLayer::new(Arc::clone(&emitter)));
        (emitter, subscriber)
    }

    #[test]
    fn levels_map_onto_severities() {
        type L = ScriptLogLayer<MemoryTransport, Vec<u8>>;
        assert_eq!(L::severity_for(&Level::ERROR), Severity::Error);
        assert_eq!(L::severity_for(&Level::WARN), Severity::Warning);
        assert_eq!(L::severity_for(&Level::INFO), Severity::Info);
        assert_eq!(L::severity_for(&Level::DEBUG), Severity::Debug);
        assert_eq!(L::severity_for(&Level::TRACE), Severity::Debug);
    }

    #[test]
    fn events_reach_the_transport() {
        let (emitter, subscriber) = layer(Severity::Info);
        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!(attempt = 2, "retrying upload");
            tracing::debug!("filtered out");
        });

        let lines = emitter.transport().lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("WARNING (PID: 9 , MN: host , FN: unknown , LI: "));
        assert!(lines[0].ends_with("retrying upload attempt=2"));
    }
}
