//! Command-line surface.

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "chatsh",
    version,
    about = "Chat with GitHub Copilot from the shell",
    after_help = "Examples:\n  chatsh setup\n  chatsh chat \"How to install Git on Windows\"\n  chatsh chat --chat-file ./test.json \"Rewrite everything with Go\""
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Authorize this CLI through the GitHub device flow
    Setup,
    /// Send one query to Copilot
    Chat(ChatArgs),
}

#[derive(Debug, Args, Default)]
pub struct ChatArgs {
    /// History file to load before and rewrite after the query
    #[arg(long = "chat-file", value_name = "PATH")]
    pub chat_file: Option<PathBuf>,
    /// Custom system prompt
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,
    /// Send the clipboard content as extra context
    #[arg(long = "clipboard-context")]
    pub clipboard_context: bool,
    /// Query text; read from stdin when omitted
    #[arg(value_name = "QUERY", trailing_var_arg = true)]
    pub query: Vec<String>,
}

impl ChatArgs {
    /// Query words joined by single spaces, or stdin with trailing newlines trimmed.
    pub fn read_query(&self, stdin: &mut dyn Read) -> io::Result<String> {
        if !self.query.is_empty() {
            return Ok(self.query.join(" "));
        }

        let mut input = String::new();
        stdin.read_to_string(&mut input)?;
        Ok(input.trim_end_matches(['\r', '\n']).to_string())
    }
}
