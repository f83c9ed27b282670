//! Process Command Executor
//!
//! Implements the CommandExecutor port over `std::process`. Stdout and
//! stderr are read on their own threads and merged through one channel, so
//! lines reach the caller in roughly the order the tool printed them.
//! Carriage returns end a line too: progress bars redraw with `\r` and each
//! redraw is delivered as it is printed.

use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use tracing::trace;

use crate::domain::ports::{CommandError, CommandExecutor, CommandLine, CommandOutput, OutputLine};

/// Runs commands as child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for ProcessExecutor {
    fn run(
        &self,
        command: &CommandLine,
        on_line: &mut dyn FnMut(&OutputLine),
    ) -> Result<CommandOutput, CommandError> {
        let mut child = Command::new(command.program())
            .args(command.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CommandError::Start {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        let (tx, rx) = mpsc::channel::<String>();
        let streams: Vec<Box<dyn Read + Send>> = [
            child.stdout.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
            child.stderr.take().map(|s| Box::new(s) as Box<dyn Read + Send>),
        ]
        .into_iter()
        .flatten()
        .collect();

        let readers: Vec<_> = streams
            .into_iter()
            .map(|stream| {
                let tx = tx.clone();
                thread::spawn(move || {
                    for_each_line(stream, |bytes| {
                        tx.send(String::from_utf8_lossy(&bytes).into_owned()).is_ok()
                    })
                })
            })
            .collect();
        drop(tx);

        let mut lines = Vec::new();
        for raw in rx {
            if let Some(line) = OutputLine::classify(&raw) {
                trace!(line = line.text(), "child output");
                on_line(&line);
                lines.push(line);
            }
        }
        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait().map_err(|e| CommandError::Runtime {
            command: command.to_string(),
            message: e.to_string(),
        })?;

        Ok(CommandOutput {
            lines,
            success: status.success(),
        })
    }
}

/// Feed every `\n`- or `\r`-terminated chunk of `stream` to `emit` until it
/// returns false or the stream ends. A trailing unterminated chunk is
/// emitted as well.
fn for_each_line<R: Read>(stream: R, mut emit: impl FnMut(Vec<u8>) -> bool) {
    let mut reader = BufReader::new(stream);
    let mut line = Vec::new();
    loop {
        let (complete, used) = {
            let buf = match reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(_) => break,
            };
            if buf.is_empty() {
                break;
            }
            match buf.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(end) => {
                    line.extend_from_slice(&buf[..end]);
                    (true, end + 1)
                }
                None => {
                    line.extend_from_slice(buf);
                    (false, buf.len())
                }
            }
        };
        reader.consume(used);
        if complete && !emit(std::mem::take(&mut line)) {
            return;
        }
    }
    if !line.is_empty() {
        emit(line);
    }
}
