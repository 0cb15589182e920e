use std::collections::BTreeMap;
use std::time::Duration;

use crate::url::{
    DEFAULT_COPILOT_API_BASE_URL, DEFAULT_GITHUB_API_BASE_URL, DEFAULT_GITHUB_BASE_URL,
};

/// OAuth application id registered for Copilot editor integrations.
pub const DEFAULT_CLIENT_ID: &str = "Iv1.b507a08c87ecfe98";
/// Scope requested during the device flow.
pub const DEFAULT_SCOPE: &str = "read:user";

/// Transport configuration for Copilot API requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopilotApiConfig {
    /// Base URL for the OAuth device flow endpoints.
    pub github_base_url: String,
    /// Base URL for the token exchange endpoint.
    pub github_api_base_url: String,
    /// Base URL for the chat-completions endpoint.
    pub copilot_api_base_url: String,
    pub client_id: String,
    pub scope: String,
    /// Editor identity sent with device-flow requests.
    pub login_editor_version: String,
    pub login_plugin_version: String,
    pub login_user_agent: String,
    /// Editor identity sent with token-exchange requests.
    pub exchange_editor_version: String,
    pub exchange_plugin_version: String,
    pub exchange_user_agent: String,
    /// Editor identity sent with chat requests.
    pub chat_editor_version: String,
    pub chat_plugin_version: String,
    pub chat_user_agent: String,
    /// Additional headers merged into chat request headers.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional request timeout.
    pub timeout: Option<Duration>,
}

impl Default for CopilotApiConfig {
    fn default() -> Self {
        Self {
            github_base_url: DEFAULT_GITHUB_BASE_URL.to_string(),
            github_api_base_url: DEFAULT_GITHUB_API_BASE_URL.to_string(),
            copilot_api_base_url: DEFAULT_COPILOT_API_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            login_editor_version: "Neovim/0.9.2".to_string(),
            login_plugin_version: "chat.sh/0.1".to_string(),
            login_user_agent: "GithubCopilot/1.133.0".to_string(),
            exchange_editor_version: "vscode/1.80.1".to_string(),
            exchange_plugin_version: "copilot-chat/0.4.1".to_string(),
            exchange_user_agent: "GitHubCopilotChat/0.4.1".to_string(),
            chat_editor_version: "vscode/1.83.1".to_string(),
            chat_plugin_version: "copilot-chat/0.8.0".to_string(),
            chat_user_agent: "GitHubCopilotChat/0.8.0".to_string(),
            extra_headers: BTreeMap::new(),
            timeout: None,
        }
    }
}

impl CopilotApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_github_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.github_base_url = base_url.into();
        self
    }

    pub fn with_github_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.github_api_base_url = base_url.into();
        self
    }

    pub fn with_copilot_api_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.copilot_api_base_url = base_url.into();
        self
    }

    /// Points every endpoint family at one base URL (local test servers).
    pub fn with_single_base_url(self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.with_github_base_url(base_url.clone())
            .with_github_api_base_url(base_url.clone())
            .with_copilot_api_base_url(base_url)
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn insert_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(key.into(), value.into());
        self
    }
}
