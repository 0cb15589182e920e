//! GitHub Copilot implementation of the shared `chat_provider` contract.
//!
//! This adapter drives the async `copilot_api` transport to completion on a
//! per-call current-thread runtime and translates wire payloads into the
//! provider-neutral outcomes `chatsh` reasons about.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chat_provider::{
    ChatCompletionProvider, ChatMessage, ChatReply, ChatRequest, DeviceAuthProvider,
    DeviceTicket, PollOutcome, ProviderError, Role, SessionToken, TokenExchangeProvider,
};
use copilot_api::{
    AccessTokenResponse, ChatCompletionRequest, ChatCompletionResponse, CopilotApiClient,
    CopilotApiConfig, CopilotApiError, CopilotTokenResponse, DeviceCodeResponse, WireMessage,
    WireRole,
};

const AUTHORIZATION_PENDING: &str = "authorization_pending";
const SLOW_DOWN: &str = "slow_down";

trait CopilotTransport: Send + Sync {
    fn request_device_code(&self) -> Result<DeviceCodeResponse, CopilotApiError>;
    fn poll_access_token(&self, device_code: &str) -> Result<AccessTokenResponse, CopilotApiError>;
    fn exchange_token(&self, github_token: &str) -> Result<CopilotTokenResponse, CopilotApiError>;
    fn chat_completion(
        &self,
        copilot_token: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, CopilotApiError>;
}

#[derive(Debug)]
struct DefaultTransport {
    client: CopilotApiClient,
}

impl DefaultTransport {
    fn block_on<F, T>(&self, future: F) -> Result<T, CopilotApiError>
    where
        F: Future<Output = Result<T, CopilotApiError>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                CopilotApiError::Unknown(format!("failed to initialize tokio runtime: {error}"))
            })?;

        runtime.block_on(future)
    }
}

impl CopilotTransport for DefaultTransport {
    fn request_device_code(&self) -> Result<DeviceCodeResponse, CopilotApiError> {
        self.block_on(self.client.request_device_code())
    }

    fn poll_access_token(
        &self,
        device_code: &str,
    ) -> Result<AccessTokenResponse, CopilotApiError> {
        self.block_on(self.client.poll_access_token(device_code))
    }

    fn exchange_token(&self, github_token: &str) -> Result<CopilotTokenResponse, CopilotApiError> {
        self.block_on(self.client.exchange_token(github_token))
    }

    fn chat_completion(
        &self,
        copilot_token: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, CopilotApiError> {
        self.block_on(self.client.chat_completion(copilot_token, request))
    }
}

/// Provider backed by real Copilot transport.
pub struct CopilotProvider {
    transport: Arc<dyn CopilotTransport>,
}

impl CopilotProvider {
    pub fn new(config: CopilotApiConfig) -> Result<Self, ProviderError> {
        let client = CopilotApiClient::new(config).map_err(map_transport_error)?;
        Ok(Self {
            transport: Arc::new(DefaultTransport { client }),
        })
    }

    #[cfg(test)]
    fn with_transport_for_tests(transport: Arc<dyn CopilotTransport>) -> Self {
        Self { transport }
    }
}

impl DeviceAuthProvider for CopilotProvider {
    fn request_ticket(&self) -> Result<DeviceTicket, ProviderError> {
        let response = self
            .transport
            .request_device_code()
            .map_err(map_transport_error)?;
        Ok(ticket_from_response(response))
    }

    fn poll_token(&self, device_code: &str) -> Result<PollOutcome, ProviderError> {
        let response = self
            .transport
            .poll_access_token(device_code)
            .map_err(map_transport_error)?;
        poll_outcome_from_response(response)
    }
}

impl TokenExchangeProvider for CopilotProvider {
    fn exchange(&self, long_lived_token: &str) -> Result<SessionToken, ProviderError> {
        let response = self
            .transport
            .exchange_token(long_lived_token)
            .map_err(map_transport_error)?;
        session_token_from_response(response)
    }
}

impl ChatCompletionProvider for CopilotProvider {
    fn complete(
        &self,
        token: &SessionToken,
        request: &ChatRequest,
    ) -> Result<ChatReply, ProviderError> {
        let payload = wire_request(request);
        let response = self
            .transport
            .chat_completion(token.value(), &payload)
            .map_err(map_transport_error)?;
        tracing::debug!(choices = response.choices.len(), "chat completion returned");
        Ok(ChatReply {
            candidates: response.contents(),
        })
    }
}

fn ticket_from_response(response: DeviceCodeResponse) -> DeviceTicket {
    DeviceTicket {
        device_code: response.device_code,
        user_code: response.user_code,
        verification_uri: response.verification_uri,
        expires_in: Duration::from_secs(response.expires_in),
        interval: response
            .interval
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs),
    }
}

/// Classifies a poll by its structured fields; message text is never inspected.
fn poll_outcome_from_response(
    response: AccessTokenResponse,
) -> Result<PollOutcome, ProviderError> {
    if let Some(token) = response.token() {
        return Ok(PollOutcome::Authorized(token.to_string()));
    }

    match response.error.as_deref().map(str::trim) {
        None | Some("") | Some(AUTHORIZATION_PENDING) => Ok(PollOutcome::Pending),
        Some(SLOW_DOWN) => Ok(PollOutcome::SlowDown {
            interval: response
                .interval
                .filter(|seconds| *seconds > 0)
                .map(Duration::from_secs),
        }),
        Some(code) => {
            tracing::debug!(%code, "device flow rejected");
            Err(ProviderError::Authorization {
                code: code.to_string(),
                description: response.error_description,
            })
        }
    }
}

fn session_token_from_response(
    response: CopilotTokenResponse,
) -> Result<SessionToken, ProviderError> {
    let token = response.token.trim();
    if token.is_empty() {
        return Err(ProviderError::MalformedResponse(
            "token exchange response is missing 'token'".to_string(),
        ));
    }
    Ok(SessionToken::new(token, response.expires_at))
}

fn wire_request(request: &ChatRequest) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        request.model.clone(),
        request.messages.iter().map(wire_message).collect(),
    )
    .with_temperature(request.temperature)
    .with_top_p(request.top_p)
    .with_n(request.candidate_count)
}

fn wire_message(message: &ChatMessage) -> WireMessage {
    let role = match message.role {
        Role::System => WireRole::System,
        Role::User => WireRole::User,
        Role::Assistant => WireRole::Assistant,
    };
    WireMessage::new(role, message.content.clone())
}

fn map_transport_error(error: CopilotApiError) -> ProviderError {
    match error {
        CopilotApiError::Status(status, message) => ProviderError::Status {
            status: status.as_u16(),
            message,
        },
        CopilotApiError::MalformedResponse(message) => ProviderError::MalformedResponse(message),
        CopilotApiError::Serde(error) => ProviderError::MalformedResponse(error.to_string()),
        other => ProviderError::Transport(other.to_string()),
    }
}
