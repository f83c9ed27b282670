//! CommandExecutor port - runs external update commands
//!
//! The store's own tooling is driven through this port. Implementations
//! merge stdout and stderr, hand each line to the caller as soon as it is
//! read, and separate error lines from informational ones.

use std::fmt;

/// Prefix the store tooling uses for error lines
pub const ERROR_LINE_PREFIX: &str = "error:";

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// One line of merged command output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    /// Progress or result text
    Info(String),
    /// A line that followed the error convention, prefix stripped
    Error(String),
}

impl OutputLine {
    /// Classify a raw output line. Blank lines yield `None`.
    pub fn classify(raw: &str) -> Option<Self> {
        let line = raw.trim();
        if line.is_empty() {
            return None;
        }
        match line.strip_prefix(ERROR_LINE_PREFIX) {
            Some(rest) => Some(OutputLine::Error(humanize_error(rest.trim_start()))),
            None => Some(OutputLine::Info(line.to_string())),
        }
    }

    pub fn text(&self) -> &str {
        match self {
            OutputLine::Info(s) | OutputLine::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OutputLine::Error(_))
    }
}

fn humanize_error(message: &str) -> String {
    if message.starts_with("Remote") && message.ends_with("not found") {
        "Repository configuration not found".to_string()
    } else {
        message.to_string()
    }
}

/// Collected result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Every non-blank line, in arrival order
    pub lines: Vec<OutputLine>,
    /// Exit status was zero
    pub success: bool,
}

impl CommandOutput {
    /// All lines joined with newlines
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(OutputLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Exited zero and printed no error lines
    pub fn ok(&self) -> bool {
        self.success && !self.lines.iter().any(OutputLine::is_error)
    }

    /// Last error line, if any
    pub fn last_error(&self) -> Option<&str> {
        self.lines
            .iter()
            .rev()
            .find(|l| l.is_error())
            .map(OutputLine::text)
    }
}

/// Failure to run a command at all
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Failed to start: {command} : {message}")]
    Start { command: String, message: String },

    #[error("Process failed: {command} : {message}")]
    Runtime { command: String, message: String },
}

/// Runs external commands, streaming output line by line
pub trait CommandExecutor: Send + Sync {
    /// Run `command` to completion.
    ///
    /// `on_line` sees every classified line as it arrives. Non-zero exit is
    /// reported through `CommandOutput::success`, not as an `Err`.
    fn run(
        &self,
        command: &CommandLine,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<CommandOutput, CommandError>;
}
