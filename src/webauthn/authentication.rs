//! # Authentication Steps
//!
//! Start with a username, sign the challenge with `get()`, send the assertion
//! back.

use crate::config::OptionsEnvelope;
use crate::error::{CeremonyError, CeremonyResult};
use crate::webauthn::credential::SerializedAssertion;
use crate::webauthn::options::{
    sanitize_authentication_options, PublicKeyCredentialRequestOptions,
};
use crate::webauthn::types::{
    start_error, AuthenticationFinishRequest, AuthenticationStartRequest,
    ServerAuthenticationOptions,
};
use serde_json::Value;

pub fn start_request(username: &str) -> CeremonyResult<AuthenticationStartRequest> {
    let username = username.trim();
    if username.is_empty() {
        return Err(CeremonyError::UserInput("Username is required".to_string()));
    }
    Ok(AuthenticationStartRequest {
        username: username.to_string(),
    })
}

/// Turn the start-authentication answer into `get()` options
///
/// The error check runs on the body as received, before any unwrapping.
pub fn request_options(
    envelope: &OptionsEnvelope,
    body: Value,
) -> CeremonyResult<PublicKeyCredentialRequestOptions> {
    if let Some(message) = start_error(&body) {
        return Err(CeremonyError::Server(message));
    }

    let options = envelope.unwrap_options(body).ok_or_else(|| {
        CeremonyError::MalformedResponse("authentication options missing".to_string())
    })?;
    let options: ServerAuthenticationOptions = serde_json::from_value(options)?;
    Ok(sanitize_authentication_options(options)?)
}

pub fn finish_request(
    start: AuthenticationStartRequest,
    credential: SerializedAssertion,
) -> AuthenticationFinishRequest {
    AuthenticationFinishRequest {
        username: start.username,
        credential,
    }
}
