/// Default base URL for the GitHub OAuth device flow.
pub const DEFAULT_GITHUB_BASE_URL: &str = "https://github.com";
/// Default base URL for the GitHub REST API hosting the token exchange.
pub const DEFAULT_GITHUB_API_BASE_URL: &str = "https://api.github.com";
/// Default base URL for the Copilot inference API.
pub const DEFAULT_COPILOT_API_BASE_URL: &str = "https://api.githubcopilot.com";

const DEVICE_CODE_PATH: &str = "/login/device/code";
const ACCESS_TOKEN_PATH: &str = "/login/oauth/access_token";
const TOKEN_EXCHANGE_PATH: &str = "/copilot_internal/v2/token";
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Device-code endpoint under a GitHub base URL.
pub fn device_code_url(base: &str) -> String {
    normalize_endpoint(base, DEFAULT_GITHUB_BASE_URL, DEVICE_CODE_PATH)
}

/// OAuth access-token endpoint under a GitHub base URL.
pub fn access_token_url(base: &str) -> String {
    normalize_endpoint(base, DEFAULT_GITHUB_BASE_URL, ACCESS_TOKEN_PATH)
}

/// Copilot token exchange endpoint under a GitHub API base URL.
pub fn token_exchange_url(base: &str) -> String {
    normalize_endpoint(base, DEFAULT_GITHUB_API_BASE_URL, TOKEN_EXCHANGE_PATH)
}

/// Chat-completions endpoint under a Copilot API base URL.
pub fn chat_completions_url(base: &str) -> String {
    normalize_endpoint(base, DEFAULT_COPILOT_API_BASE_URL, CHAT_COMPLETIONS_PATH)
}

/// Normalization rules:
/// 1) blank input falls back to `default_base`
/// 2) trailing slashes are dropped
/// 3) `path` is appended unless the input already ends with it
fn normalize_endpoint(input: &str, default_base: &str, path: &str) -> String {
    let base = if input.trim().is_empty() {
        default_base
    } else {
        input.trim()
    };

    let trimmed = base.trim_end_matches('/');
    if trimmed.ends_with(path) {
        return trimmed.to_string();
    }
    format!("{trimmed}{path}")
}
