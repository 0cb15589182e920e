//! OAuth device authorization flow.
//!
//! A [`DeviceFlow`] requests a ticket, shows the operator where to verify,
//! then polls until the provider issues a long-lived token. The loop has no
//! deadline of its own; it ends on success, on a terminal provider error, or
//! when the caller's [`CancelSignal`] is raised.

use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chat_provider::{CancelSignal, DeviceAuthProvider, DeviceTicket, PollOutcome, ProviderError};
use chat_store::{CredentialRecord, CredentialStore, StoreError};
use thiserror::Error;

/// Poll interval used when the ticket does not advertise one.
pub const FALLBACK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Added to the interval on `slow_down` when the provider sends no new value.
pub const SLOW_DOWN_INCREMENT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to request device code: {0}")]
    Ticket(#[source] ProviderError),
    #[error("device authorization failed: {0}")]
    Poll(#[source] ProviderError),
    #[error("device authorization cancelled")]
    Cancelled,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to write verification instructions: {0}")]
    Output(#[from] io::Error),
}

/// Observable handshake state.
#[derive(Clone, PartialEq, Eq)]
pub enum FlowState {
    /// No ticket requested yet.
    Idle,
    Requested(DeviceTicket),
    Pending { polls: usize },
    /// Holds the issued long-lived token.
    Authorized(String),
    Failed(String),
}

impl std::fmt::Debug for FlowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Requested(ticket) => f
                .debug_struct("Requested")
                .field("user_code", &ticket.user_code)
                .field("verification_uri", &ticket.verification_uri)
                .finish(),
            Self::Pending { polls } => f.debug_struct("Pending").field("polls", polls).finish(),
            Self::Authorized(_) => f.write_str("Authorized(<redacted>)"),
            Self::Failed(message) => f.debug_tuple("Failed").field(message).finish(),
        }
    }
}

/// Blocking wait between polls.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

pub struct DeviceFlow<'a, P: ?Sized, S: ?Sized> {
    provider: &'a P,
    store: &'a S,
    sleeper: &'a dyn Sleeper,
    cancel: CancelSignal,
    state: FlowState,
    interval: Duration,
}

impl<'a, P, S> DeviceFlow<'a, P, S>
where
    P: DeviceAuthProvider + ?Sized,
    S: CredentialStore + ?Sized,
{
    /// Flow that sleeps on the current thread and is never cancelled.
    pub fn new(provider: &'a P, store: &'a S) -> Self {
        Self {
            provider,
            store,
            sleeper: &ThreadSleeper,
            cancel: Arc::new(AtomicBool::new(false)),
            state: FlowState::Idle,
            interval: FALLBACK_POLL_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    #[must_use]
    pub fn with_cancel_signal(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Current wait between polls.
    pub fn poll_interval(&self) -> Duration {
        self.interval
    }

    pub fn request_ticket(&mut self) -> Result<DeviceTicket, AuthError> {
        let ticket = match self.provider.request_ticket() {
            Ok(ticket) => ticket,
            Err(error) => return Err(self.fail(AuthError::Ticket(error))),
        };

        self.interval = ticket
            .interval
            .filter(|interval| !interval.is_zero())
            .unwrap_or(FALLBACK_POLL_INTERVAL);
        tracing::debug!(
            interval_secs = self.interval.as_secs(),
            expires_in_secs = ticket.expires_in.as_secs(),
            "device code issued"
        );
        self.state = FlowState::Requested(ticket.clone());
        Ok(ticket)
    }

    /// Polls once. `Some(token)` when authorized, `None` while still pending.
    ///
    /// A `slow_down` answer counts as pending and raises the poll interval.
    pub fn poll_for_token(&mut self, device_code: &str) -> Result<Option<String>, AuthError> {
        let outcome = match self.provider.poll_token(device_code) {
            Ok(outcome) => outcome,
            Err(error) => return Err(self.fail(AuthError::Poll(error))),
        };

        match outcome {
            PollOutcome::Authorized(token) => {
                self.state = FlowState::Authorized(token.clone());
                Ok(Some(token))
            }
            PollOutcome::Pending => {
                self.record_pending();
                tracing::debug!(polls = self.pending_polls(), "authorization pending");
                Ok(None)
            }
            PollOutcome::SlowDown { interval } => {
                self.interval = interval
                    .filter(|interval| !interval.is_zero())
                    .unwrap_or_else(|| self.interval.saturating_add(SLOW_DOWN_INCREMENT));
                self.record_pending();
                tracing::warn!(
                    interval_secs = self.interval.as_secs(),
                    "provider asked to slow down polling"
                );
                Ok(None)
            }
        }
    }

    /// Runs the full handshake and saves the issued token exactly once.
    pub fn run_handshake(&mut self, out: &mut dyn Write) -> Result<(), AuthError> {
        let ticket = self.request_ticket()?;
        writeln!(out, "please visit {}", ticket.verification_uri)?;
        writeln!(out, "and enter {} code", ticket.user_code)?;
        out.flush()?;

        let token = loop {
            if self.cancel.load(Ordering::SeqCst) {
                return Err(self.fail(AuthError::Cancelled));
            }

            if let Some(token) = self.poll_for_token(&ticket.device_code)? {
                break token;
            }

            self.sleeper.sleep(self.interval);
        };

        if let Err(error) = self.store.save(&CredentialRecord::from_github_token(token)) {
            return Err(self.fail(AuthError::Store(error)));
        }
        Ok(())
    }

    fn pending_polls(&self) -> usize {
        match self.state {
            FlowState::Pending { polls } => polls,
            _ => 0,
        }
    }

    fn record_pending(&mut self) {
        let polls = self.pending_polls() + 1;
        self.state = FlowState::Pending { polls };
    }

    fn fail(&mut self, error: AuthError) -> AuthError {
        self.state = FlowState::Failed(error.to_string());
        error
    }
}
