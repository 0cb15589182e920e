//! Minimal provider-agnostic contract for authenticating and running one chat turn.
//!
//! This crate defines only the shared value types and the three synchronous
//! seams the `chatsh` session lifecycle is driven through: the device
//! authorization endpoints, the session-token exchange and the chat
//! completion call. It excludes transport details, wire payloads and
//! persistence.

use std::fmt;
use std::sync::{atomic::AtomicBool, Arc};
use std::time::Duration;

/// Shared cancellation flag for long-running waits such as device-code polling.
pub type CancelSignal = Arc<AtomicBool>;

/// Author of one chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Some(match value {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            _ => return None,
        })
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider-neutral, role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Transient ticket returned when a device-code handshake starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTicket {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub expires_in: Duration,
    /// Poll interval advertised by the provider, if any.
    pub interval: Option<Duration>,
}

/// Result of one poll against the device-flow token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The user completed verification; carries the long-lived token.
    Authorized(String),
    /// The user has not finished verification yet.
    Pending,
    /// The provider asked the client to poll less often.
    SlowDown { interval: Option<Duration> },
}

/// Short-lived bearer token scoped to the inference API.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    value: String,
    expires_at: Option<u64>,
}

impl SessionToken {
    #[must_use]
    pub fn new(value: impl Into<String>, expires_at: Option<u64>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry as unix epoch seconds, when the provider reported one.
    #[must_use]
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Input for one chat completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub candidate_count: u32,
}

/// Candidate completions returned by the provider, in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChatReply {
    pub candidates: Vec<String>,
}

impl ChatReply {
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.candidates.first().map(String::as_str)
    }
}

/// Failure reported by a provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network failure or a response body that could not be read.
    Transport(String),
    /// Non-success HTTP status.
    Status { status: u16, message: String },
    /// Response arrived but lacked required fields.
    MalformedResponse(String),
    /// The authorization server rejected the device flow (denied, expired, ...).
    Authorization {
        code: String,
        description: Option<String>,
    },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Status { status, message } => write!(f, "HTTP {status}: {message}"),
            Self::MalformedResponse(message) => write!(f, "malformed response: {message}"),
            Self::Authorization { code, description } => match description {
                Some(description) if !description.trim().is_empty() => {
                    write!(f, "authorization failed ({code}): {description}")
                }
                _ => write!(f, "authorization failed ({code})"),
            },
        }
    }
}

impl std::error::Error for ProviderError {}

/// OAuth device-code endpoints.
pub trait DeviceAuthProvider {
    /// Starts a handshake and returns the ticket to show the operator.
    fn request_ticket(&self) -> Result<DeviceTicket, ProviderError>;

    /// Polls once for the long-lived token bound to `device_code`.
    fn poll_token(&self, device_code: &str) -> Result<PollOutcome, ProviderError>;
}

/// Exchanges the long-lived credential for a per-session bearer token.
pub trait TokenExchangeProvider {
    fn exchange(&self, long_lived_token: &str) -> Result<SessionToken, ProviderError>;
}

/// Non-streaming chat completion endpoint.
pub trait ChatCompletionProvider {
    fn complete(
        &self,
        token: &SessionToken,
        request: &ChatRequest,
    ) -> Result<ChatReply, ProviderError>;
}

impl<T: DeviceAuthProvider + ?Sized> DeviceAuthProvider for &T {
    fn request_ticket(&self) -> Result<DeviceTicket, ProviderError> {
        (**self).request_ticket()
    }

    fn poll_token(&self, device_code: &str) -> Result<PollOutcome, ProviderError> {
        (**self).poll_token(device_code)
    }
}

impl<T: TokenExchangeProvider + ?Sized> TokenExchangeProvider for &T {
    fn exchange(&self, long_lived_token: &str) -> Result<SessionToken, ProviderError> {
        (**self).exchange(long_lived_token)
    }
}

impl<T: ChatCompletionProvider + ?Sized> ChatCompletionProvider for &T {
    fn complete(
        &self,
        token: &SessionToken,
        request: &ChatRequest,
    ) -> Result<ChatReply, ProviderError> {
        (**self).complete(token, request)
    }
}
