//! Command runner shared by the pipelines
//!
//! Runs one store command to completion while forwarding its output as
//! notices: error-convention lines always become `ErrorOccurred`, other lines
//! become `StatusChanged` only for the long-running steps that stream
//! progress. The command's overall success is checked once it exits.

use tracing::debug;

use crate::domain::ports::{CommandExecutor, CommandLine, Notice, OtaEventSink, OutputLine};
use crate::error::{OtaError, OtaResult};

/// Whether informational lines are forwarded as status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Stream,
    Quiet,
}

pub struct CommandRunner<'a> {
    executor: &'a dyn CommandExecutor,
    sink: &'a dyn OtaEventSink,
}

impl<'a> CommandRunner<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, sink: &'a dyn OtaEventSink) -> Self {
        Self { executor, sink }
    }

    pub fn sink(&self) -> &'a dyn OtaEventSink {
        self.sink
    }

    /// Run `command` and return its output text.
    ///
    /// Fails if the command could not start, exited non-zero or printed an
    /// error line; output is fully drained first either way.
    pub fn run(&self, command: &CommandLine, progress: Progress) -> OtaResult<String> {
        debug!(command = %command, "running");
        let sink = self.sink;
        let output = self.executor.run(command, &mut |line: &OutputLine| {
            forward_line(sink, line, progress);
        })?;

        if output.ok() {
            return Ok(output.text());
        }

        let message = match output.last_error() {
            Some(error) => error.to_string(),
            None => "exited with non-zero status".to_string(),
        };
        Err(OtaError::CommandRuntime {
            command: command.to_string(),
            message,
        })
    }

    /// Post a status update
    pub fn status(&self, text: &str) {
        self.sink.on_notice(Notice::StatusChanged(text.to_string()));
    }
}

/// Turn one output line into the matching notice
pub fn forward_line(sink: &dyn OtaEventSink, line: &OutputLine, progress: Progress) {
    debug!(line = line.text(), error = line.is_error(), "output");
    match line {
        OutputLine::Error(text) => sink.on_notice(Notice::ErrorOccurred(text.clone())),
        OutputLine::Info(text) if progress == Progress::Stream => {
            sink.on_notice(Notice::StatusChanged(text.clone()))
        }
        OutputLine::Info(_) => {}
    }
}
