//! Console Event Sink
//!
//! Human-readable progress on stderr, colored when stderr is a terminal.

use std::io::{self, Write};
use std::sync::Mutex;

use crossterm::style::Stylize;
use is_terminal::IsTerminal;

use crate::domain::ports::{Completion, Notice, OtaEventSink};
use crate::domain::value_objects::Revision;

pub struct ConsoleEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
    color: bool,
}

impl ConsoleEventSink {
    pub fn stderr() -> Self {
        let color = io::stderr().is_terminal();
        Self::with_writer(io::stderr(), color)
    }

    pub fn with_writer<W: Write + Send + 'static>(writer: W, color: bool) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
            color,
        }
    }

    pub fn supports_color(&self) -> bool {
        self.color
    }

    fn write_line(&self, line: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
        }
    }
}

impl OtaEventSink for ConsoleEventSink {
    fn on_notice(&self, notice: Notice) {
        let line = match notice {
            Notice::StatusChanged(text) if self.color => format!("  {}", text.dim()),
            Notice::StatusChanged(text) => format!("  {}", text),
            Notice::ErrorOccurred(message) if self.color => {
                format!("{} {}", "error:".red().bold(), message)
            }
            Notice::ErrorOccurred(message) => format!("error: {}", message),
            Notice::RollbackChanged(descriptor) => format!(
                "rollback target: {} ({} deployments)",
                descriptor.revision, descriptor.deployment_count
            ),
        };
        self.write_line(&line);
    }
}

/// One-paragraph summary of a finished operation
pub fn render_completion(completion: &Completion, supports_color: bool) -> String {
    let operation = completion.operation().as_str();
    if let Some(err) = completion.error() {
        let head = format!("{} failed", operation);
        return if supports_color {
            format!("{}: {}", head.red().bold(), err)
        } else {
            format!("{}: {}", head, err)
        };
    }

    let mut lines = Vec::new();
    match completion {
        Completion::Initialized(Ok(report)) => {
            let rev = |r: &Option<Revision>| {
                r.as_ref()
                    .map(Revision::to_string)
                    .unwrap_or_else(|| "-".to_string())
            };
            lines.push(format!("default:  {}", rev(&report.default_revision)));
            lines.push(format!("booted:   {}", rev(&report.booted_revision)));
            if let Some(info) = &report.booted_info {
                lines.push(format!("          {}", info));
            }
            lines.push(format!("remote:   {}", rev(&report.remote_revision)));
            if let Some(info) = &report.remote_info {
                lines.push(format!("          {}", info));
            }
        }
        Completion::RemoteInfoFetched(Ok(remote)) => {
            lines.push(format!("remote:   {}", remote.revision));
            if let Some(info) = &remote.info {
                lines.push(format!("          {}", info));
            }
        }
        _ => {
            if let Some(revision) = completion.revision() {
                lines.push(format!("{} finished: {}", operation, revision));
            }
        }
    }
    lines.join("\n")
}
