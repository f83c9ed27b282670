//! JSON Event Sink
//!
//! Writes notices and completions as NDJSON, one object per line.

use std::io::{self, Write};
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::domain::ports::{Completion, Notice, OtaEventSink};
use crate::domain::value_objects::Revision;

/// Event sink that outputs NDJSON events to stdout
pub struct JsonEventSink {
    /// Notices arrive from the worker thread, completions from the caller
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonEventSink {
    /// Create a new JSON event sink writing to stdout
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Write the terminal event of an operation
    pub fn on_completion(&self, completion: &Completion) {
        self.write_event(completion_json(completion));
    }

    fn write_event(&self, event: Value) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event);
            let _ = writer.flush();
        }
    }
}

impl OtaEventSink for JsonEventSink {
    fn on_notice(&self, notice: Notice) {
        self.write_event(notice_json(&notice));
    }
}

fn revision_str(revision: Option<&Revision>) -> &str {
    revision.map(Revision::as_str).unwrap_or("")
}

pub fn notice_json(notice: &Notice) -> Value {
    match notice {
        Notice::StatusChanged(text) => json!({
            "event": "status",
            "text": text,
        }),
        Notice::ErrorOccurred(message) => json!({
            "event": "error",
            "message": message,
        }),
        Notice::RollbackChanged(descriptor) => json!({
            "event": "rollback_changed",
            "revision": descriptor.revision.as_str(),
            "info": descriptor.info,
            "deployment_count": descriptor.deployment_count,
        }),
    }
}

/// Render a completion. Failed completions carry empty revisions and an
/// `error` field.
pub fn completion_json(completion: &Completion) -> Value {
    let event = format!("{}_finished", completion.operation().as_str());
    let mut value = match completion {
        Completion::Initialized(result) => {
            let report = result.as_ref().ok();
            json!({
                "event": event,
                "default_revision": revision_str(report.and_then(|r| r.default_revision.as_ref())),
                "booted_revision": revision_str(report.and_then(|r| r.booted_revision.as_ref())),
                "booted_info": report.and_then(|r| r.booted_info.clone()),
                "remote_revision": revision_str(report.and_then(|r| r.remote_revision.as_ref())),
                "remote_info": report.and_then(|r| r.remote_info.clone()),
            })
        }
        Completion::RemoteInfoFetched(result) => {
            let remote = result.as_ref().ok();
            json!({
                "event": event,
                "remote_revision": revision_str(remote.map(|r| &r.revision)),
                "remote_info": remote.and_then(|r| r.info.clone()),
            })
        }
        Completion::Updated(_) | Completion::RolledBack(_) => json!({
            "event": event,
            "default_revision": revision_str(completion.revision()),
        }),
        Completion::OfflineApplied(_) => json!({
            "event": event,
            "revision": revision_str(completion.revision()),
        }),
    };

    value["ok"] = Value::Bool(completion.is_ok());
    if let Some(err) = completion.error() {
        value["error"] = Value::String(err.to_string());
    }
    value
}
