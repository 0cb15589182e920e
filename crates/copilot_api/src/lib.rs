//! Transport-only GitHub Copilot API client primitives.
//!
//! This crate owns request building and response parsing for the three
//! endpoint families `chatsh` talks to: the GitHub OAuth device flow, the
//! Copilot session-token exchange and the Copilot chat-completions endpoint.
//! It intentionally contains no persistence, no polling loop and no retry
//! policy; callers decide what each outcome means.

pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod payload;
pub mod url;

pub use client::CopilotApiClient;
pub use config::CopilotApiConfig;
pub use error::CopilotApiError;
pub use payload::{
    AccessTokenResponse, ChatCompletionRequest, ChatCompletionResponse, CopilotTokenResponse,
    DeviceCodeResponse, WireMessage, WireRole,
};
pub use reqwest::StatusCode;
pub use url::{access_token_url, chat_completions_url, device_code_url, token_exchange_url};
