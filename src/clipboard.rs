//! Clipboard text through the platform paste command.

use std::io::{self, Read};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use wait_timeout::ChildExt;

pub const DEFAULT_CLIPBOARD_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("no clipboard command available (tried: {tried})")]
    Unavailable { tried: String },
    #[error("clipboard is empty")]
    Empty,
    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },
    #[error("`{command}` failed: {status}")]
    Failed { command: String, status: ExitStatus },
    #[error("`{command}` failed: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },
}

/// Source of extra chat context.
pub trait ClipboardSource {
    fn read_text(&self) -> Result<String, ClipboardError>;
}

/// One candidate paste command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PasteCommand {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| (*arg).to_string()).collect(),
        }
    }

    fn label(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Paste commands for the current platform, in preference order.
pub fn platform_paste_commands() -> Vec<PasteCommand> {
    if cfg!(target_os = "macos") {
        vec![PasteCommand::new("pbpaste", &[])]
    } else if cfg!(windows) {
        vec![PasteCommand::new(
            "powershell",
            &["-NoProfile", "-Command", "Get-Clipboard"],
        )]
    } else {
        let wayland = std::env::var_os("WAYLAND_DISPLAY").is_some_and(|value| !value.is_empty());
        unix_paste_commands(wayland)
    }
}

/// `wl-paste` is only worth trying inside a Wayland session.
fn unix_paste_commands(wayland: bool) -> Vec<PasteCommand> {
    let mut commands = Vec::with_capacity(3);
    if wayland {
        commands.push(PasteCommand::new("wl-paste", &["--no-newline"]));
    }
    commands.push(PasteCommand::new("xclip", &["-selection", "clipboard", "-o"]));
    commands.push(PasteCommand::new("xsel", &["--clipboard", "--output"]));
    commands
}

/// Tries each command in turn; the first one that runs successfully wins.
#[derive(Debug, Clone)]
pub struct SystemClipboard {
    commands: Vec<PasteCommand>,
    timeout: Duration,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::with_commands(platform_paste_commands())
    }
}

impl SystemClipboard {
    pub fn with_commands(commands: Vec<PasteCommand>) -> Self {
        Self {
            commands,
            timeout: DEFAULT_CLIPBOARD_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl ClipboardSource for SystemClipboard {
    fn read_text(&self) -> Result<String, ClipboardError> {
        let mut last_failure = None;
        for command in &self.commands {
            match run_paste_command(command, self.timeout) {
                Ok(Some(text)) => {
                    tracing::debug!(
                        command = %command.label(),
                        bytes = text.len(),
                        "read clipboard"
                    );
                    return Ok(text);
                }
                Ok(None) => continue,
                Err(error @ ClipboardError::Failed { .. }) => {
                    tracing::debug!(%error, "clipboard command failed, trying next");
                    last_failure = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        if let Some(error) = last_failure {
            return Err(error);
        }
        Err(ClipboardError::Unavailable {
            tried: self
                .commands
                .iter()
                .map(|command| command.program.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Reads clipboard text for use as chat context. Blank clipboards are errors.
pub fn clipboard_context(source: &dyn ClipboardSource) -> Result<String, ClipboardError> {
    let text = source.read_text()?;
    if text.trim().is_empty() {
        return Err(ClipboardError::Empty);
    }
    Ok(text)
}

/// `Ok(None)` when the program is not installed.
fn run_paste_command(
    command: &PasteCommand,
    timeout: Duration,
) -> Result<Option<String>, ClipboardError> {
    let label = command.label();
    let io_error = |source: io::Error| ClipboardError::Io {
        command: command.label(),
        source,
    };

    let mut child = match Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(error) => return Err(io_error(error)),
    };

    let Some(mut stdout) = child.stdout.take() else {
        let _ = child.kill();
        return Err(io_error(io::Error::other("stdout was not captured")));
    };
    let reader = thread::spawn(move || {
        let mut buffer = Vec::new();
        stdout.read_to_end(&mut buffer).map(|_| buffer)
    });

    let status = match child.wait_timeout(timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ClipboardError::TimedOut {
                command: label,
                timeout,
            });
        }
        Err(error) => {
            let _ = child.kill();
            return Err(io_error(error));
        }
    };

    let bytes = match reader.join() {
        Ok(result) => result.map_err(io_error)?,
        Err(_) => return Err(io_error(io::Error::other("clipboard reader panicked"))),
    };

    if !status.success() {
        return Err(ClipboardError::Failed {
            command: label,
            status,
        });
    }

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
