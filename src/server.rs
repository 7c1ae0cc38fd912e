//! # Ceremony Server
//!
//! The remote half of each ceremony: a start call that issues options and a
//! finish call that verifies the credential. [`CeremonyServer`] is the seam;
//! [`HttpCeremonyServer`] speaks JSON over HTTP.
//!
//! Every call returns the raw JSON body. Its shape is loose (an `{"error"}`
//! object, wrapped or bare options, a `{"success"}` verdict) and is sorted
//! out by the orchestrator, so a body of the wrong shape is a malformed
//! response rather than a transport failure.

use crate::config::ClientConfig;
use crate::webauthn::types::{
    AuthenticationFinishRequest, AuthenticationStartRequest, RegistrationFinishRequest,
    RegistrationStartRequest,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A request that never produced a usable answer
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection refused, timeout, TLS failure, ...
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-JSON body with a failure status (proxy error page, crash, ...)
    #[error("Unexpected HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Invalid response body: {0}")]
    Body(#[from] serde_json::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// The ceremony server's four endpoints
#[async_trait]
pub trait CeremonyServer: Send + Sync {
    async fn start_registration(
        &self,
        request: &RegistrationStartRequest,
    ) -> Result<Value, TransportError>;

    async fn finish_registration(
        &self,
        request: &RegistrationFinishRequest,
    ) -> Result<Value, TransportError>;

    async fn start_authentication(
        &self,
        request: &AuthenticationStartRequest,
    ) -> Result<Value, TransportError>;

    async fn finish_authentication(
        &self,
        request: &AuthenticationFinishRequest,
    ) -> Result<Value, TransportError>;
}

#[async_trait]
impl<T: CeremonyServer + ?Sized> CeremonyServer for Arc<T> {
    async fn start_registration(
        &self,
        request: &RegistrationStartRequest,
    ) -> Result<Value, TransportError> {
        (**self).start_registration(request).await
    }

    async fn finish_registration(
        &self,
        request: &RegistrationFinishRequest,
    ) -> Result<Value, TransportError> {
        (**self).finish_registration(request).await
    }

    async fn start_authentication(
        &self,
        request: &AuthenticationStartRequest,
    ) -> Result<Value, TransportError> {
        (**self).start_authentication(request).await
    }

    async fn finish_authentication(
        &self,
        request: &AuthenticationFinishRequest,
    ) -> Result<Value, TransportError> {
        (**self).finish_authentication(request).await
    }
}

/// [`CeremonyServer`] over HTTP
///
/// Domain errors come back with a 4xx/5xx status *and* a JSON body such as
/// `{"error": "User not found"}`, so the body is read whatever the status.
/// Only a failure status without a JSON body is a transport error.
#[derive(Debug, Clone)]
pub struct HttpCeremonyServer {
    client: reqwest::Client,
    register_start_url: String,
    register_finish_url: String,
    authenticate_start_url: String,
    authenticate_finish_url: String,
}

impl HttpCeremonyServer {
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Reuse an existing client (shared connection pool, cookie store, ...)
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            register_start_url: config.endpoint(&config.register_start_path),
            register_finish_url: config.endpoint(&config.register_finish_path),
            authenticate_start_url: config.endpoint(&config.authenticate_start_path),
            authenticate_finish_url: config.endpoint(&config.authenticate_finish_path),
        }
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<Value, TransportError> {
        tracing::debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                tracing::debug!(%url, %status, "response received");
                Ok(value)
            }
            Err(e) if status.is_success() => Err(TransportError::Body(e)),
            Err(_) => Err(TransportError::Status { status, body: text }),
        }
    }
}

#[async_trait]
impl CeremonyServer for HttpCeremonyServer {
    async fn start_registration(
        &self,
        request: &RegistrationStartRequest,
    ) -> Result<Value, TransportError> {
        self.post_json(&self.register_start_url, request).await
    }

    async fn finish_registration(
        &self,
        request: &RegistrationFinishRequest,
    ) -> Result<Value, TransportError> {
        self.post_json(&self.register_finish_url, request).await
    }

    async fn start_authentication(
        &self,
        request: &AuthenticationStartRequest,
    ) -> Result<Value, TransportError> {
        self.post_json(&self.authenticate_start_url, request).await
    }

    async fn finish_authentication(
        &self,
        request: &AuthenticationFinishRequest,
    ) -> Result<Value, TransportError> {
        self.post_json(&self.authenticate_finish_url, request).await
    }
}
