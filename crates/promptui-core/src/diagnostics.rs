//! Injectable diagnostics sink
//!
//! Core modules only emit `tracing` events. Whoever starts the process
//! decides where they go by building a [`Diagnostics`] and entering it:
//!
//! - [`Diagnostics::capture`] records events in memory only (tests)
//! - [`Diagnostics::with_stderr`] records in memory and also prints through
//!   `tracing_subscriber::fmt`, filtered by `RUST_LOG` or a default directive
//!
//! Entering returns a guard; dropping the guard tears the sink down. Work
//! moved onto other threads carries the sink along via [`Diagnostics::dispatch`].

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tracing::dispatcher::{self, DefaultGuard};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// One recorded event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub target: String,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.target, self.message)
    }
}

/// In-memory log of every event seen by the layer
///
/// Clones share the same buffer, so a test can keep one handle while the
/// other is installed in a subscriber.
#[derive(Debug, Clone, Default)]
pub struct DebugLog {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// True if any recorded message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|entry| entry.message.contains(needle))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: Subscriber> Layer<S> for DebugLog {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        self.lock().push(LogEntry {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            message: visitor.message,
        });
    }
}

/// Flattens an event into `message key=value ...`
#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl MessageVisitor {
    fn push_field(&mut self, field: &Field, value: fmt::Arguments<'_>) {
        if field.name() == "message" {
            let rest = std::mem::take(&mut self.message);
            self.message = value.to_string();
            if !rest.is_empty() {
                self.message.push(' ');
                self.message.push_str(&rest);
            }
        } else {
            if !self.message.is_empty() {
                self.message.push(' ');
            }
            self.message.push_str(&format!("{}={}", field.name(), value));
        }
    }
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push_field(field, format_args!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push_field(field, format_args!("{}", value));
    }
}

/// A process-scoped diagnostics sink
pub struct Diagnostics {
    log: DebugLog,
    dispatch: Dispatch,
}

impl Diagnostics {
    /// Memory-only sink that records every level.
    pub fn capture() -> Self {
        let log = DebugLog::new();
        let subscriber = Registry::default().with(log.clone());
        Self {
            dispatch: Dispatch::new(subscriber),
            log,
        }
    }

    /// Memory sink plus human-readable output on stderr.
    ///
    /// `RUST_LOG` takes precedence over `default_filter`.
    pub fn with_stderr(default_filter: &str) -> Result<Self> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(default_filter)?,
        };

        let log = DebugLog::new();
        let subscriber = Registry::default()
            .with(filter)
            .with(log.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            );

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            log,
        })
    }

    pub fn log(&self) -> &DebugLog {
        &self.log
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    /// Install for the current thread until the guard is dropped.
    pub fn enter(&self) -> DefaultGuard {
        dispatcher::set_default(&self.dispatch)
    }

    /// Run `f` with this sink installed.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        dispatcher::with_default(&self.dispatch, f)
    }
}
