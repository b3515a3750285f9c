//! HTTP clients for the external inference microservice.
//!
//! The microservice answers chat turns, summarizes recent sessions, and
//! mines behavioral patterns. Each concern has its own endpoint config
//! (base URL, timeout, optional bearer key) so they can be split across
//! hosts. API keys are wrapped in [`SecretString`] and only exposed when
//! building request headers.

pub mod client;
pub mod patterns;
pub mod summarizer;
pub mod types;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sora_types::config::EndpointConfig;
use sora_types::inference::InferenceError;

/// One configured collaborator endpoint.
pub(crate) struct Endpoint {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl Endpoint {
    pub(crate) fn from_config(config: &EndpointConfig) -> Result<Self, InferenceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| InferenceError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config
                .api_key
                .as_ref()
                .map(|key| SecretString::from(key.expose_secret().to_string())),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and decode a JSON reply.
    pub(crate) async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, InferenceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| InferenceError::Deserialization(format!("failed to parse response: {e}")))
    }
}

fn transport_error(e: reqwest::Error) -> InferenceError {
    if e.is_timeout() {
        InferenceError::Timeout
    } else {
        InferenceError::Transport(e.to_string())
    }
}
