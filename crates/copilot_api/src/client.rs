use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::config::CopilotApiConfig;
use crate::error::{parse_error_message, CopilotApiError};
use crate::headers::{build_chat_headers, build_exchange_headers, build_login_headers};
use crate::payload::{
    AccessTokenRequest, AccessTokenResponse, ChatCompletionRequest, ChatCompletionResponse,
    CopilotTokenResponse, DeviceCodeRequest, DeviceCodeResponse,
};
use crate::url::{access_token_url, chat_completions_url, device_code_url, token_exchange_url};

#[derive(Debug)]
pub struct CopilotApiClient {
    http: Client,
    config: CopilotApiConfig,
}

impl CopilotApiClient {
    pub fn new(config: CopilotApiConfig) -> Result<Self, CopilotApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(CopilotApiError::from)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &CopilotApiConfig {
        &self.config
    }

    pub fn device_code_endpoint(&self) -> String {
        device_code_url(&self.config.github_base_url)
    }

    pub fn access_token_endpoint(&self) -> String {
        access_token_url(&self.config.github_base_url)
    }

    pub fn token_exchange_endpoint(&self) -> String {
        token_exchange_url(&self.config.github_api_base_url)
    }

    pub fn chat_completions_endpoint(&self) -> String {
        chat_completions_url(&self.config.copilot_api_base_url)
    }

    pub fn build_device_code_request(&self) -> Result<RequestBuilder, CopilotApiError> {
        let body = DeviceCodeRequest {
            client_id: self.config.client_id.clone(),
            scope: self.config.scope.clone(),
        };
        let headers = to_header_map(build_login_headers(&self.config))?;
        Ok(self
            .http
            .post(self.device_code_endpoint())
            .headers(headers)
            .json(&body))
    }

    pub fn build_access_token_request(
        &self,
        device_code: &str,
    ) -> Result<RequestBuilder, CopilotApiError> {
        if device_code.trim().is_empty() {
            return Err(CopilotApiError::InvalidRequestPayload(
                "'device_code' must not be empty".to_owned(),
            ));
        }

        let body = AccessTokenRequest::new(self.config.client_id.clone(), device_code.trim());
        let headers = to_header_map(build_login_headers(&self.config))?;
        Ok(self
            .http
            .post(self.access_token_endpoint())
            .headers(headers)
            .json(&body))
    }

    pub fn build_exchange_request(
        &self,
        github_token: &str,
    ) -> Result<RequestBuilder, CopilotApiError> {
        let headers = to_header_map(build_exchange_headers(&self.config, github_token)?)?;
        Ok(self.http.get(self.token_exchange_endpoint()).headers(headers))
    }

    pub fn build_chat_request(
        &self,
        copilot_token: &str,
        request: &ChatCompletionRequest,
        request_id: &str,
    ) -> Result<RequestBuilder, CopilotApiError> {
        validate_request_payload_shape(request)?;

        let headers = to_header_map(build_chat_headers(
            &self.config,
            copilot_token,
            request_id,
        )?)?;
        let payload = request_with_transport_defaults(request);
        Ok(self
            .http
            .post(self.chat_completions_endpoint())
            .headers(headers)
            .json(&payload))
    }

    pub async fn request_device_code(&self) -> Result<DeviceCodeResponse, CopilotApiError> {
        let response: DeviceCodeResponse = send_json(self.build_device_code_request()?).await?;
        if response.device_code.trim().is_empty() || response.user_code.trim().is_empty() {
            return Err(CopilotApiError::MalformedResponse(
                "device code response is missing 'device_code' or 'user_code'".to_owned(),
            ));
        }
        Ok(response)
    }

    pub async fn poll_access_token(
        &self,
        device_code: &str,
    ) -> Result<AccessTokenResponse, CopilotApiError> {
        send_json(self.build_access_token_request(device_code)?).await
    }

    pub async fn exchange_token(
        &self,
        github_token: &str,
    ) -> Result<CopilotTokenResponse, CopilotApiError> {
        let response: CopilotTokenResponse =
            send_json(self.build_exchange_request(github_token)?).await?;
        if response.token.trim().is_empty() {
            return Err(CopilotApiError::MalformedResponse(
                "token exchange response is missing 'token'".to_owned(),
            ));
        }
        Ok(response)
    }

    /// Sends one chat request tagged with a fresh request id.
    pub async fn chat_completion(
        &self,
        copilot_token: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, CopilotApiError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(
            %request_id,
            model = %request.model,
            messages = request.messages.len(),
            "sending chat completion"
        );
        send_json(self.build_chat_request(copilot_token, request, &request_id)?).await
    }
}

fn request_with_transport_defaults(request: &ChatCompletionRequest) -> ChatCompletionRequest {
    let mut payload = request.clone();
    payload.stream = false;
    if payload.n == 0 {
        payload.n = 1;
    }
    payload
}

fn validate_request_payload_shape(request: &ChatCompletionRequest) -> Result<(), CopilotApiError> {
    if request.model.trim().is_empty() {
        return Err(CopilotApiError::InvalidRequestPayload(
            "'model' must not be empty".to_owned(),
        ));
    }
    if request.messages.is_empty() {
        return Err(CopilotApiError::InvalidRequestPayload(
            "'messages' must contain at least one message".to_owned(),
        ));
    }
    Ok(())
}

fn to_header_map(headers: BTreeMap<String, String>) -> Result<HeaderMap, CopilotApiError> {
    let mut out = HeaderMap::new();
    for (key, value) in headers {
        out.insert(
            HeaderName::from_bytes(key.as_bytes())
                .map_err(|_| CopilotApiError::InvalidHeader(format!("invalid header key: {key}")))?,
            HeaderValue::from_str(&value)
                .map_err(|_| CopilotApiError::InvalidHeader(format!("invalid value for {key}")))?,
        );
    }
    Ok(out)
}

async fn send_json<T>(builder: RequestBuilder) -> Result<T, CopilotApiError>
where
    T: DeserializeOwned,
{
    let response = builder.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CopilotApiError::Status(
            status,
            parse_error_message(status, &body),
        ));
    }

    serde_json::from_str(&body).map_err(CopilotApiError::from)
}
