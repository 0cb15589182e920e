//! One chat turn: exchange, request, reconcile history.

use std::path::PathBuf;

use chat_provider::{
    ChatCompletionProvider, ChatMessage, ChatRequest, ProviderError, Role, TokenExchangeProvider,
};
use chat_store::{load_conversation, save_conversation, CredentialStore, StoreError};
use thiserror::Error;

use crate::token::{fresh_session_token, TokenError};

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_TOP_P: f64 = 1.0;
pub const DEFAULT_CANDIDATE_COUNT: u32 = 1;
pub const DEFAULT_SYSTEM_PROMPT: &str = "\nYou are ChatGPT, a large language model trained by OpenAI.\nKnowledge cutoff: 2021-09\nCurrent model: gpt-4\n";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("query is empty")]
    EmptyInput,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("failed to load chat history: {0}")]
    LoadHistory(#[source] StoreError),
    #[error("failed to save chat history: {0}")]
    SaveHistory(#[source] StoreError),
    #[error("chat request failed: {0}")]
    Chat(#[source] ProviderError),
    #[error("malformed response: chat completion returned no choices")]
    NoCandidates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub system_prompt: String,
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub candidate_count: u32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            candidate_count: DEFAULT_CANDIDATE_COUNT,
        }
    }
}

impl ChatSettings {
    /// Replaces the system prompt unless `prompt` is absent or blank.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: Option<&str>) -> Self {
        if let Some(prompt) = prompt.filter(|value| !value.trim().is_empty()) {
            self.system_prompt = prompt.to_string();
        }
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model.map(str::trim).filter(|value| !value.is_empty()) {
            self.model = model.to_string();
        }
        self
    }
}

/// Input for [`ChatSession::run_chat`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTurn {
    /// History file to load and rewrite; `None` keeps the turn stateless.
    pub history_path: Option<PathBuf>,
    pub input: String,
    /// Sent as a user message right before `input`, e.g. clipboard content.
    pub extra_context: Option<String>,
}

pub struct ChatSession<S, E, C> {
    store: S,
    exchanger: E,
    chat: C,
    settings: ChatSettings,
}

impl<S, E, C> ChatSession<S, E, C>
where
    S: CredentialStore,
    E: TokenExchangeProvider,
    C: ChatCompletionProvider,
{
    pub fn new(store: S, exchanger: E, chat: C, settings: ChatSettings) -> Self {
        Self {
            store,
            exchanger,
            chat,
            settings,
        }
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Runs one turn and returns the assistant reply.
    ///
    /// The history file is written only after a reply has been received, so
    /// any failure leaves it untouched.
    pub fn run_chat(&self, turn: &ChatTurn) -> Result<String, SessionError> {
        if turn.input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let history =
            load_conversation(turn.history_path.as_deref()).map_err(SessionError::LoadHistory)?;
        let token = fresh_session_token(&self.store, &self.exchanger)?;

        let messages = build_outbound_messages(
            &self.settings.system_prompt,
            &history,
            turn.extra_context.as_deref(),
            &turn.input,
        );
        let request = ChatRequest {
            messages,
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            top_p: self.settings.top_p,
            candidate_count: self.settings.candidate_count,
        };

        let reply = self
            .chat
            .complete(&token, &request)
            .map_err(SessionError::Chat)?;
        let content = reply.first().ok_or(SessionError::NoCandidates)?.to_string();

        if let Some(path) = turn.history_path.as_deref() {
            let mut conversation: Vec<ChatMessage> = request
                .messages
                .into_iter()
                .filter(|message| message.role != Role::System)
                .collect();
            conversation.push(ChatMessage::assistant(content.clone()));
            save_conversation(path, &conversation).map_err(SessionError::SaveHistory)?;
        }

        Ok(content)
    }
}

/// System prompt, then history in order, then extra context, then the input.
pub fn build_outbound_messages(
    system_prompt: &str,
    history: &[ChatMessage],
    extra_context: Option<&str>,
    input: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(history.iter().cloned());
    if let Some(context) = extra_context {
        messages.push(ChatMessage::user(context));
    }
    messages.push(ChatMessage::user(input));
    messages
}
