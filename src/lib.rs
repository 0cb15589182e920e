//! Command-line GitHub Copilot chat client.
//!
//! `chatsh setup` runs the OAuth device-code handshake and stores the
//! resulting long-lived GitHub token. `chatsh chat` exchanges that token for
//! a short-lived Copilot session token, sends one chat-completion request and
//! prints the first candidate to stdout.
//!
//! ## Environment
//!
//! - `CHATSH_CREDENTIALS_PATH` overrides the credential file location
//!   (default `~/.config/.chatsh`).
//! - `CHATSH_MODEL` selects the chat model (default `gpt-4`).
//! - `CHATSH_SYSTEM_PROMPT` replaces the built-in system prompt; `--prompt`
//!   wins over it.
//! - `CHATSH_TIMEOUT_SEC` sets a per-request HTTP timeout and must be > 0
//!   when provided.
//! - `CHATSH_GITHUB_URL`, `CHATSH_GITHUB_API_URL` and `CHATSH_COPILOT_API_URL`
//!   override the three endpoint base URLs.
//! - `CHATSH_LOG` is a `tracing` filter directive (default `warn`). Logs go
//!   to stderr so stdout carries only the reply.
//!
//! Blank values are treated as unset.
//!
//! History contract: a history file holds only user and assistant turns.
//! The system prompt is rebuilt on every run and never written back, and
//! each successful turn rewrites the whole file.

pub mod auth;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod logging;
pub mod session;
pub mod token;

pub use auth::{AuthError, DeviceFlow, FlowState, Sleeper, ThreadSleeper};
pub use error::ChatshError;
pub use session::{build_outbound_messages, ChatSession, ChatSettings, ChatTurn, SessionError};
pub use token::{fresh_session_token, TokenError};
