use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Error as JsonError;

#[derive(Debug)]
pub enum CopilotApiError {
    /// A required credential was blank; carries which one.
    MissingToken(&'static str),
    InvalidHeader(String),
    InvalidRequestPayload(String),
    Request(reqwest::Error),
    Status(StatusCode, String),
    Serde(JsonError),
    MalformedResponse(String),
    Unknown(String),
}

/// Error body shapes returned by GitHub: REST errors carry `message`,
/// OAuth errors carry `error` plus `error_description`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorPayload {
    pub message: Option<String>,
    pub error: Option<ErrorField>,
    pub error_description: Option<String>,
}

/// Copilot's own errors nest an object under `error`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ErrorField {
    Code(String),
    Object {
        message: Option<String>,
        code: Option<String>,
    },
}

impl ErrorPayload {
    fn message_or_fallback(&self) -> Option<String> {
        if let Some(message) = self.message.as_deref().and_then(non_empty_string) {
            return Some(message.to_owned());
        }
        if let Some(description) = self.error_description.as_deref().and_then(non_empty_string) {
            return Some(description.to_owned());
        }
        match &self.error {
            Some(ErrorField::Code(code)) => non_empty_string(code).map(str::to_owned),
            Some(ErrorField::Object { message, code }) => message
                .as_deref()
                .and_then(non_empty_string)
                .or_else(|| code.as_deref().and_then(non_empty_string))
                .map(str::to_owned),
            None => None,
        }
    }
}

impl fmt::Display for CopilotApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingToken(kind) => write!(f, "{kind} token is required"),
            Self::InvalidHeader(message) => write!(f, "invalid header: {message}"),
            Self::InvalidRequestPayload(message) => write!(f, "invalid request payload: {message}"),
            Self::Request(error) => write!(f, "request error: {error}"),
            Self::Status(status, message) => write!(f, "HTTP {status} {message}"),
            Self::Serde(error) => write!(f, "serialization error: {error}"),
            Self::MalformedResponse(message) => write!(f, "malformed response: {message}"),
            Self::Unknown(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for CopilotApiError {}

impl From<reqwest::Error> for CopilotApiError {
    fn from(error: reqwest::Error) -> Self {
        Self::Request(error)
    }
}

impl From<JsonError> for CopilotApiError {
    fn from(error: JsonError) -> Self {
        Self::Serde(error)
    }
}

pub fn parse_error_message(status: StatusCode, body: &str) -> String {
    let fallback = || {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        } else {
            body.to_string()
        }
    };

    match serde_json::from_str::<ErrorPayload>(body) {
        Ok(payload) => payload.message_or_fallback().unwrap_or_else(fallback),
        Err(_) => fallback(),
    }
}

fn non_empty_string(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
