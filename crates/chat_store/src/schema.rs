use chat_provider::{ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// On-disk authentication state. Only `github_token` is authoritative;
/// the other two fields are written for compatibility and never read back.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default)]
    pub github_token: String,
    #[serde(default)]
    pub copilot_token: String,
    #[serde(default)]
    pub expires_at: String,
}

impl CredentialRecord {
    /// Fresh record holding only the long-lived token.
    #[must_use]
    pub fn from_github_token(github_token: impl Into<String>) -> Self {
        Self {
            github_token: github_token.into(),
            copilot_token: String::new(),
            expires_at: String::new(),
        }
    }

    /// Non-blank long-lived token, if the record has one.
    #[must_use]
    pub fn github_token(&self) -> Option<&str> {
        let trimmed = self.github_token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Roles allowed in a history file. `system` is deliberately absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub role: HistoryRole,
    pub content: String,
}

impl HistoryRecord {
    /// `None` for system messages, which have no history representation.
    #[must_use]
    pub fn from_message(message: &ChatMessage) -> Option<Self> {
        let role = match message.role {
            Role::User => HistoryRole::User,
            Role::Assistant => HistoryRole::Assistant,
            Role::System => return None,
        };
        Some(Self {
            role,
            content: message.content.clone(),
        })
    }

    #[must_use]
    pub fn into_message(self) -> ChatMessage {
        let role = match self.role {
            HistoryRole::User => Role::User,
            HistoryRole::Assistant => Role::Assistant,
        };
        ChatMessage::new(role, self.content)
    }
}
