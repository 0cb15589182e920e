use std::collections::BTreeMap;

use crate::config::CopilotApiConfig;
use crate::error::CopilotApiError;

pub const HEADER_ACCEPT: &str = "accept";
pub const HEADER_CONTENT_TYPE: &str = "content-type";
pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_EDITOR_VERSION: &str = "editor-version";
pub const HEADER_EDITOR_PLUGIN_VERSION: &str = "editor-plugin-version";
pub const HEADER_USER_AGENT: &str = "user-agent";
pub const HEADER_REQUEST_ID: &str = "x-request-id";
pub const HEADER_OPENAI_ORGANIZATION: &str = "openai-organization";
pub const HEADER_OPENAI_INTENT: &str = "openai-intent";

/// Headers for the device-code and access-token endpoints.
pub fn build_login_headers(config: &CopilotApiConfig) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert(HEADER_ACCEPT.to_owned(), "application/json".to_owned());
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json".to_owned(),
    );
    insert_editor_identity(
        &mut headers,
        &config.login_editor_version,
        &config.login_plugin_version,
        &config.login_user_agent,
    );
    headers
}

/// Headers for the token exchange endpoint, authorized by the long-lived token.
pub fn build_exchange_headers(
    config: &CopilotApiConfig,
    github_token: &str,
) -> Result<BTreeMap<String, String>, CopilotApiError> {
    let github_token = github_token.trim();
    if github_token.is_empty() {
        return Err(CopilotApiError::MissingToken("github"));
    }

    let mut headers = BTreeMap::new();
    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("token {github_token}"),
    );
    insert_editor_identity(
        &mut headers,
        &config.exchange_editor_version,
        &config.exchange_plugin_version,
        &config.exchange_user_agent,
    );
    Ok(headers)
}

/// Headers for one chat-completion request.
pub fn build_chat_headers(
    config: &CopilotApiConfig,
    copilot_token: &str,
    request_id: &str,
) -> Result<BTreeMap<String, String>, CopilotApiError> {
    let copilot_token = copilot_token.trim();
    if copilot_token.is_empty() {
        return Err(CopilotApiError::MissingToken("copilot"));
    }

    let mut headers = BTreeMap::new();
    headers.insert(
        HEADER_AUTHORIZATION.to_owned(),
        format!("Bearer {copilot_token}"),
    );
    headers.insert(HEADER_REQUEST_ID.to_owned(), request_id.trim().to_owned());
    headers.insert(
        HEADER_OPENAI_ORGANIZATION.to_owned(),
        "github-copilot".to_owned(),
    );
    headers.insert(
        HEADER_OPENAI_INTENT.to_owned(),
        "conversation-panel".to_owned(),
    );
    headers.insert(
        HEADER_CONTENT_TYPE.to_owned(),
        "application/json; charset=utf-8".to_owned(),
    );
    headers.insert(HEADER_ACCEPT.to_owned(), "*/*".to_owned());
    insert_editor_identity(
        &mut headers,
        &config.chat_editor_version,
        &config.chat_plugin_version,
        &config.chat_user_agent,
    );

    for (key, value) in &config.extra_headers {
        headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_owned());
    }

    Ok(headers)
}

fn insert_editor_identity(
    headers: &mut BTreeMap<String, String>,
    editor_version: &str,
    plugin_version: &str,
    user_agent: &str,
) {
    if let Some(value) = sanitize_nonempty(editor_version) {
        headers.insert(HEADER_EDITOR_VERSION.to_owned(), value);
    }
    if let Some(value) = sanitize_nonempty(plugin_version) {
        headers.insert(HEADER_EDITOR_PLUGIN_VERSION.to_owned(), value);
    }
    if let Some(value) = sanitize_nonempty(user_agent) {
        headers.insert(HEADER_USER_AGENT.to_owned(), value);
    }
}

fn sanitize_nonempty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
