//! Environment configuration.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chat_store::{FileCredentialStore, StoreError};
use copilot_api::CopilotApiConfig;
use thiserror::Error;

use crate::session::ChatSettings;

pub const CREDENTIALS_PATH_ENV_VAR: &str = "CHATSH_CREDENTIALS_PATH";
pub const MODEL_ENV_VAR: &str = "CHATSH_MODEL";
pub const SYSTEM_PROMPT_ENV_VAR: &str = "CHATSH_SYSTEM_PROMPT";
pub const TIMEOUT_ENV_VAR: &str = "CHATSH_TIMEOUT_SEC";
pub const GITHUB_URL_ENV_VAR: &str = "CHATSH_GITHUB_URL";
pub const GITHUB_API_URL_ENV_VAR: &str = "CHATSH_GITHUB_API_URL";
pub const COPILOT_API_URL_ENV_VAR: &str = "CHATSH_COPILOT_API_URL";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CHATSH_TIMEOUT_SEC must be a positive number of seconds, got '{value}'")]
    InvalidTimeout { value: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatshConfig {
    pub credentials_path: Option<PathBuf>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub timeout: Option<Duration>,
    pub github_url: Option<String>,
    pub github_api_url: Option<String>,
    pub copilot_api_url: Option<String>,
}

impl ChatshConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout = match env_string_opt(TIMEOUT_ENV_VAR) {
            Some(raw) => Some(parse_timeout(&raw)?),
            None => None,
        };

        Ok(Self {
            credentials_path: env_trimmed_opt(CREDENTIALS_PATH_ENV_VAR).map(PathBuf::from),
            model: env_trimmed_opt(MODEL_ENV_VAR),
            system_prompt: env_string_opt(SYSTEM_PROMPT_ENV_VAR),
            timeout,
            github_url: env_trimmed_opt(GITHUB_URL_ENV_VAR),
            github_api_url: env_trimmed_opt(GITHUB_API_URL_ENV_VAR),
            copilot_api_url: env_trimmed_opt(COPILOT_API_URL_ENV_VAR),
        })
    }

    pub fn credential_store(&self) -> Result<FileCredentialStore, StoreError> {
        match &self.credentials_path {
            Some(path) => Ok(FileCredentialStore::new(path)),
            None => FileCredentialStore::at_default_location(),
        }
    }

    pub fn api_config(&self) -> CopilotApiConfig {
        let mut config = CopilotApiConfig::new();
        if let Some(url) = &self.github_url {
            config = config.with_github_base_url(url);
        }
        if let Some(url) = &self.github_api_url {
            config = config.with_github_api_base_url(url);
        }
        if let Some(url) = &self.copilot_api_url {
            config = config.with_copilot_api_base_url(url);
        }
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }

    /// Chat settings with a `--prompt` value taking precedence over the environment.
    pub fn chat_settings(&self, prompt_override: Option<&str>) -> ChatSettings {
        ChatSettings::default()
            .with_model(self.model.as_deref())
            .with_system_prompt(self.system_prompt.as_deref())
            .with_system_prompt(prompt_override)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(Duration::from_secs(seconds)),
        _ => Err(ConfigError::InvalidTimeout {
            value: raw.to_string(),
        }),
    }
}

/// Raw value, or `None` when unset or blank.
fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_trimmed_opt(key: &str) -> Option<String> {
    env_string_opt(key).map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    const ALL_VARS: [&str; 7] = [
        CREDENTIALS_PATH_ENV_VAR,
        MODEL_ENV_VAR,
        SYSTEM_PROMPT_ENV_VAR,
        TIMEOUT_ENV_VAR,
        GITHUB_URL_ENV_VAR,
        GITHUB_API_URL_ENV_VAR,
        COPILOT_API_URL_ENV_VAR,
    ];

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = &self.previous {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set_env_guard(key: &'static str, value: Option<&str>) -> EnvGuard {
        let previous = env::var(key).ok();
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
        EnvGuard { key, previous }
    }

    fn clear_all() -> Vec<EnvGuard> {
        ALL_VARS
            .iter()
            .map(|key| set_env_guard(*key, None))
            .collect()
    }

    #[test]
    fn unset_env_yields_defaults() {
        let _lock = env_lock();
        let _guards = clear_all();

        let config = ChatshConfig::from_env().expect("empty env should parse");
        assert_eq!(config, ChatshConfig::default());
        assert_eq!(config.chat_settings(None), ChatSettings::default());

        let api = config.api_config();
        assert_eq!(api, CopilotApiConfig::new());
    }

    #[test]
    fn values_are_trimmed_and_blank_values_ignored() {
        let _lock = env_lock();
        let _guards = clear_all();
        let _model = set_env_guard(MODEL_ENV_VAR, Some(" gpt-4o "));
        let _prompt = set_env_guard(SYSTEM_PROMPT_ENV_VAR, Some("   "));
        let _path = set_env_guard(CREDENTIALS_PATH_ENV_VAR, Some("/tmp/chatsh-creds"));

        let config = ChatshConfig::from_env().expect("env should parse");
        assert_eq!(config.model.as_deref(), Some("gpt-4o"));
        assert_eq!(config.system_prompt, None);
        assert_eq!(
            config
                .credential_store()
                .expect("explicit path needs no home dir")
                .path(),
            std::path::Path::new("/tmp/chatsh-creds")
        );
    }

    #[test]
    fn system_prompt_keeps_surrounding_newlines() {
        let _lock = env_lock();
        let _guards = clear_all();
        let _prompt = set_env_guard(SYSTEM_PROMPT_ENV_VAR, Some("\nYou are terse.\n"));

        let config = ChatshConfig::from_env().expect("env should parse");
        assert_eq!(config.system_prompt.as_deref(), Some("\nYou are terse.\n"));
        assert_eq!(config.chat_settings(None).system_prompt, "\nYou are terse.\n");
    }

    #[test]
    fn prompt_flag_beats_env_prompt() {
        let config = ChatshConfig {
            system_prompt: Some("from env".to_string()),
            ..ChatshConfig::default()
        };

        assert_eq!(config.chat_settings(None).system_prompt, "from env");
        assert_eq!(
            config.chat_settings(Some("from flag")).system_prompt,
            "from flag"
        );
    }

    #[test]
    fn timeout_must_be_positive_integer() {
        let _lock = env_lock();
        let _guards = clear_all();

        for invalid in ["0", "-1", "soon"] {
            let _timeout = set_env_guard(TIMEOUT_ENV_VAR, Some(invalid));
            assert_eq!(
                ChatshConfig::from_env(),
                Err(ConfigError::InvalidTimeout {
                    value: invalid.to_string()
                })
            );
        }

        let _timeout = set_env_guard(TIMEOUT_ENV_VAR, Some("30"));
        let config = ChatshConfig::from_env().expect("valid timeout");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.api_config().timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn endpoint_overrides_reach_api_config() {
        let config = ChatshConfig {
            github_url: Some("http://127.0.0.1:9000".to_string()),
            copilot_api_url: Some("http://127.0.0.1:9001/".to_string()),
            ..ChatshConfig::default()
        };

        let api = config.api_config();
        assert_eq!(api.github_base_url, "http://127.0.0.1:9000");
        assert_eq!(api.github_api_base_url, CopilotApiConfig::new().github_api_base_url);
        assert!(api.copilot_api_base_url.starts_with("http://127.0.0.1:9001"));
    }
}
