//! Top-level failure taxonomy for the `chatsh` commands.

use std::io;

use chat_provider::ProviderError;
use chat_store::StoreError;
use thiserror::Error;

use crate::auth::AuthError;
use crate::clipboard::ClipboardError;
use crate::config::ConfigError;
use crate::session::SessionError;

#[derive(Debug, Error)]
pub enum ChatshError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to initialize provider: {0}")]
    Provider(#[source] ProviderError),
    #[error("failed to read query from stdin: {0}")]
    Stdin(#[source] io::Error),
}
