//! Observability for the Global Contacts Data Store
//!
//! Structured logging through `tracing`. Lifecycle events are typed
//! (`Event`) and emitted with key/value fields.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//!
//! # Usage
//!
//! ```ignore
//! use globalcontacts::observability::{log_event, Event};
//!
//! log_event(Event::IndexFlushed, &[("revision", "…")]);
//! ```

mod events;

pub use events::Event;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Fields carried by lifecycle events.
///
/// Known keys become individual `tracing` fields; absent ones are not
/// recorded. Unknown keys are kept in `extra`, sorted by key.
#[derive(Debug, Default, PartialEq, Eq)]
struct EventFields<'a> {
    record: Option<&'a str>,
    datastore: Option<&'a str>,
    merged_id: Option<&'a str>,
    owner: Option<&'a str>,
    uid: Option<&'a str>,
    entries: Option<&'a str>,
    removed: Option<&'a str>,
    reason: Option<&'a str>,
    revision: Option<&'a str>,
    extra: Option<String>,
}

impl<'a> EventFields<'a> {
    fn from_pairs(pairs: &[(&'a str, &'a str)]) -> Self {
        let mut fields = EventFields::default();
        let mut extra: Vec<(&str, &str)> = Vec::new();

        for &(key, value) in pairs {
            let slot = match key {
                "record" => &mut fields.record,
                "datastore" => &mut fields.datastore,
                "merged_id" => &mut fields.merged_id,
                "owner" => &mut fields.owner,
                "uid" => &mut fields.uid,
                "entries" => &mut fields.entries,
                "removed" => &mut fields.removed,
                "reason" => &mut fields.reason,
                "revision" => &mut fields.revision,
                _ => {
                    extra.push((key, value));
                    continue;
                }
            };
            *slot = Some(value);
        }

        if !extra.is_empty() {
            extra.sort_by_key(|(k, _)| *k);
            fields.extra = Some(
                extra
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join(" "),
            );
        }
        fields
    }
}

macro_rules! emit {
    ($level:expr, $event:expr, $f:expr) => {
        tracing::event!(
            $level,
            event = $event,
            record = $f.record,
            datastore = $f.datastore,
            merged_id = $f.merged_id,
            owner = $f.owner,
            uid = $f.uid,
            entries = $f.entries,
            removed = $f.removed,
            reason = $f.reason,
            revision = $f.revision,
            extra = $f.extra.as_deref(),
        )
    };
}

/// Emit a lifecycle event with string fields.
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    let f = EventFields::from_pairs(fields);
    let name = event.as_str();
    let level = event.level();

    if level == Level::WARN {
        emit!(Level::WARN, name, f);
    } else if level == Level::DEBUG {
        emit!(Level::DEBUG, name, f);
    } else {
        emit!(Level::INFO, name, f);
    }
}

/// Install the global subscriber.
///
/// Filtering follows `RUST_LOG` (default `warn`); `json` switches to one
/// JSON object per line. Calling it twice is harmless.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
