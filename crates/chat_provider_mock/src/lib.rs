//! Deterministic mock implementation of the shared `chat_provider` contract.
//!
//! This crate contains no transport/protocol logic. Every answer is scripted
//! up front and every call is counted, so `chatsh` tests can assert exactly
//! how many polls, exchanges and completions a flow performed.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chat_provider::{
    ChatCompletionProvider, ChatReply, ChatRequest, DeviceAuthProvider, DeviceTicket,
    PollOutcome, ProviderError, SessionToken, TokenExchangeProvider,
};

pub const MOCK_DEVICE_CODE: &str = "mock-device-code";
pub const MOCK_USER_CODE: &str = "MOCK-0000";
pub const MOCK_VERIFICATION_URI: &str = "https://example.invalid/login/device";
pub const MOCK_SESSION_TOKEN: &str = "mock-session-token";

#[derive(Debug, Default)]
struct CallLog {
    tickets: usize,
    polls: Vec<String>,
    exchanges: Vec<String>,
    completions: Vec<(String, ChatRequest)>,
}

/// Scripted provider covering device auth, token exchange and chat.
///
/// Polls consume the scripted queue in order; once it is drained every
/// further poll answers [`PollOutcome::Pending`].
#[derive(Debug)]
pub struct MockProvider {
    ticket: Result<DeviceTicket, ProviderError>,
    polls: Mutex<VecDeque<Result<PollOutcome, ProviderError>>>,
    exchange: Result<SessionToken, ProviderError>,
    reply: Result<ChatReply, ProviderError>,
    calls: Mutex<CallLog>,
}

impl MockProvider {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ticket: Ok(default_ticket()),
            polls: Mutex::new(VecDeque::new()),
            exchange: Ok(SessionToken::new(MOCK_SESSION_TOKEN, None)),
            reply: Ok(ChatReply {
                candidates: vec!["mock reply".to_string()],
            }),
            calls: Mutex::new(CallLog::default()),
        }
    }

    /// Answers `pending` times with [`PollOutcome::Pending`], then authorizes.
    #[must_use]
    pub fn authorizing_after(pending: usize, github_token: &str) -> Self {
        let mut polls: Vec<Result<PollOutcome, ProviderError>> =
            (0..pending).map(|_| Ok(PollOutcome::Pending)).collect();
        polls.push(Ok(PollOutcome::Authorized(github_token.to_string())));
        Self::new().with_polls(polls)
    }

    #[must_use]
    pub fn with_ticket(mut self, ticket: Result<DeviceTicket, ProviderError>) -> Self {
        self.ticket = ticket;
        self
    }

    #[must_use]
    pub fn with_polls(self, polls: Vec<Result<PollOutcome, ProviderError>>) -> Self {
        *lock_unpoisoned(&self.polls) = polls.into();
        self
    }

    #[must_use]
    pub fn with_exchange(mut self, exchange: Result<SessionToken, ProviderError>) -> Self {
        self.exchange = exchange;
        self
    }

    #[must_use]
    pub fn with_reply(mut self, reply: Result<ChatReply, ProviderError>) -> Self {
        self.reply = reply;
        self
    }

    #[must_use]
    pub fn with_candidates(self, candidates: &[&str]) -> Self {
        self.with_reply(Ok(ChatReply {
            candidates: candidates.iter().map(|value| (*value).to_string()).collect(),
        }))
    }

    pub fn ticket_count(&self) -> usize {
        lock_unpoisoned(&self.calls).tickets
    }

    pub fn poll_count(&self) -> usize {
        lock_unpoisoned(&self.calls).polls.len()
    }

    /// Device codes passed to each poll, in call order.
    pub fn polled_device_codes(&self) -> Vec<String> {
        lock_unpoisoned(&self.calls).polls.clone()
    }

    pub fn exchange_count(&self) -> usize {
        lock_unpoisoned(&self.calls).exchanges.len()
    }

    /// Long-lived tokens passed to each exchange, in call order.
    pub fn exchanged_tokens(&self) -> Vec<String> {
        lock_unpoisoned(&self.calls).exchanges.clone()
    }

    pub fn completion_count(&self) -> usize {
        lock_unpoisoned(&self.calls).completions.len()
    }

    /// Requests received by `complete`, in call order.
    pub fn completion_requests(&self) -> Vec<ChatRequest> {
        lock_unpoisoned(&self.calls)
            .completions
            .iter()
            .map(|(_, request)| request.clone())
            .collect()
    }

    /// Session token values presented to `complete`, in call order.
    pub fn completion_tokens(&self) -> Vec<String> {
        lock_unpoisoned(&self.calls)
            .completions
            .iter()
            .map(|(token, _)| token.clone())
            .collect()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAuthProvider for MockProvider {
    fn request_ticket(&self) -> Result<DeviceTicket, ProviderError> {
        lock_unpoisoned(&self.calls).tickets += 1;
        self.ticket.clone()
    }

    fn poll_token(&self, device_code: &str) -> Result<PollOutcome, ProviderError> {
        lock_unpoisoned(&self.calls)
            .polls
            .push(device_code.to_string());
        lock_unpoisoned(&self.polls)
            .pop_front()
            .unwrap_or(Ok(PollOutcome::Pending))
    }
}

impl TokenExchangeProvider for MockProvider {
    fn exchange(&self, long_lived_token: &str) -> Result<SessionToken, ProviderError> {
        lock_unpoisoned(&self.calls)
            .exchanges
            .push(long_lived_token.to_string());
        self.exchange.clone()
    }
}

impl ChatCompletionProvider for MockProvider {
    fn complete(
        &self,
        token: &SessionToken,
        request: &ChatRequest,
    ) -> Result<ChatReply, ProviderError> {
        lock_unpoisoned(&self.calls)
            .completions
            .push((token.value().to_string(), request.clone()));
        self.reply.clone()
    }
}

fn default_ticket() -> DeviceTicket {
    DeviceTicket {
        device_code: MOCK_DEVICE_CODE.to_string(),
        user_code: MOCK_USER_CODE.to_string(),
        verification_uri: MOCK_VERIFICATION_URI.to_string(),
        expires_in: Duration::from_secs(900),
        interval: Some(Duration::from_secs(5)),
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
