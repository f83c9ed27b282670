//! Event Sink Implementations
//!
//! Concrete `OtaEventSink`s:
//! - JsonEventSink: NDJSON output for scripts and fleet tooling
//! - ConsoleEventSink: human-readable progress on stderr

mod console;
mod json;

pub use console::{render_completion, ConsoleEventSink};
pub use json::{completion_json, notice_json, JsonEventSink};
