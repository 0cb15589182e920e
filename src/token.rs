//! Per-run session token exchange.

use chat_provider::{ProviderError, SessionToken, TokenExchangeProvider};
use chat_store::{CredentialStore, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("not authenticated: run `chatsh setup` first")]
    NotAuthenticated,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to exchange token: {0}")]
    Exchange(#[source] ProviderError),
}

/// Loads the stored long-lived token and exchanges it once.
///
/// The returned token is never persisted; every call performs a new exchange.
pub fn fresh_session_token<S, E>(store: &S, exchanger: &E) -> Result<SessionToken, TokenError>
where
    S: CredentialStore + ?Sized,
    E: TokenExchangeProvider + ?Sized,
{
    let record = store.load()?.ok_or(TokenError::NotAuthenticated)?;
    let github_token = record.github_token().ok_or(TokenError::NotAuthenticated)?;

    let token = exchanger
        .exchange(github_token)
        .map_err(TokenError::Exchange)?;
    tracing::debug!(expires_at = ?token.expires_at(), "exchanged session token");
    Ok(token)
}
