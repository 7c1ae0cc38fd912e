//! # Registration Steps
//!
//! The registration-specific pieces of the ceremony: what goes into the start
//! call, how its answer becomes `create()` options, and what goes into the
//! finish call. The orchestrator strings these together.
//!
//! ## Registration Flow
//! 1. **Start**: send the username (and display name, per profile)
//! 2. **Platform**: `create()` with the sanitized options
//! 3. **Finish**: send the serialized attestation plus the optional label

use crate::ceremony::{CeremonyKind, CeremonyProfile, DisplayNamePolicy, RegistrationRequest};
use crate::error::{CeremonyError, CeremonyResult};
use crate::webauthn::credential::SerializedAttestation;
use crate::webauthn::options::{sanitize_registration_options, PublicKeyCredentialCreationOptions};
use crate::webauthn::types::{
    start_error, RegistrationFinishRequest, RegistrationStartRequest, ServerRegistrationOptions,
};
use serde_json::Value;

/// Validate caller input and build the start-registration body
///
/// ## Errors
/// `UserInput` when the username is blank, or when the profile requires a
/// display name and none was given.
pub fn start_request(
    kind: CeremonyKind,
    profile: &CeremonyProfile,
    request: &RegistrationRequest,
) -> CeremonyResult<RegistrationStartRequest> {
    let username = request.username.trim();
    if username.is_empty() {
        let message = match kind {
            CeremonyKind::AddAuthenticator => "Session expired, please sign in again",
            _ => "Username is required",
        };
        return Err(CeremonyError::UserInput(message.to_string()));
    }

    let display_name = request
        .display_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let display_name = match profile.display_name {
        DisplayNamePolicy::Required => match display_name {
            Some(name) => Some(name.to_string()),
            None => {
                return Err(CeremonyError::UserInput(
                    "Username and display name are required".to_string(),
                ))
            }
        },
        DisplayNamePolicy::Optional => display_name.map(str::to_string),
        DisplayNamePolicy::Omitted => None,
    };

    Ok(RegistrationStartRequest {
        username: username.to_string(),
        display_name,
    })
}

/// Turn the start-registration answer into `create()` options
///
/// ## Errors
/// - `Server` when the body carries an `error`
/// - `MalformedResponse` when it is not a usable options object
pub fn creation_options(body: Value) -> CeremonyResult<PublicKeyCredentialCreationOptions> {
    if let Some(message) = start_error(&body) {
        return Err(CeremonyError::Server(message));
    }

    let options: ServerRegistrationOptions = serde_json::from_value(body)?;
    Ok(sanitize_registration_options(options)?)
}

/// Build the finish-registration body
///
/// The label is trimmed, and a blank one is sent as `null`.
pub fn finish_request(
    start: RegistrationStartRequest,
    label: Option<String>,
    credential: SerializedAttestation,
) -> RegistrationFinishRequest {
    RegistrationFinishRequest {
        username: start.username,
        display_name: start.display_name,
        credential,
        nickname: label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string),
    }
}
