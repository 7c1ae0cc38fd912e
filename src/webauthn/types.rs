//! # Ceremony Server Wire Types
//!
//! Request and response bodies for the four ceremony endpoints, plus the
//! server's view of the ceremony options.
//!
//! ## API Flow
//! Each ceremony has two calls: start and finish
//! - Start: client names the principal, server answers with options
//! - Finish: client sends the serialized credential, server verifies it
//!
//! ## Permissive options
//! The server serializes an internal model in which optional fields may be
//! missing, `null`, or present-but-empty. Every optional field here is an
//! `Option` with `#[serde(default)]`, so all three shapes deserialize. The
//! sanitizer in [`super::options`] turns these into the strict shape the
//! platform accepts.

use crate::webauthn::credential::{SerializedAssertion, SerializedAttestation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request to start registration
///
/// ## Example JSON
/// ```json
/// {
///   "username": "alice",
///   "displayName": "Alice Smith"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationStartRequest {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Request to complete registration
///
/// `nickname` is always sent; an unlabelled authenticator goes out as `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFinishRequest {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub credential: SerializedAttestation,
    pub nickname: Option<String>,
}

/// Request to start authentication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthenticationStartRequest {
    pub username: String,
}

/// Request to complete authentication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationFinishRequest {
    pub username: String,
    pub credential: SerializedAssertion,
}

/// Answer to either finish call
///
/// A body of just `{"error": "..."}` (no `success` key) counts as a failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinishResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Confirmed principal identity, if the server echoes it
    #[serde(default, alias = "principalName")]
    pub username: Option<String>,
}

/// Relying party entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerRelyingParty {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// User entity with a text-encoded id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerUser {
    pub id: String,
    pub name: String,
    pub display_name: String,
}

/// One entry of `pubKeyCredParams`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerCredentialParameter {
    #[serde(rename = "type")]
    pub type_: String,
    /// COSE algorithm identifier (-7 for ES256, -257 for RS256, ...)
    pub alg: i64,
}

/// Credential descriptor with a text-encoded id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerCredentialDescriptor {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: String,
    #[serde(default)]
    pub transports: Option<Vec<String>>,
}

/// Start-registration response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerRegistrationOptions {
    #[serde(default)]
    pub rp: Option<ServerRelyingParty>,
    pub user: ServerUser,
    pub challenge: String,
    #[serde(default)]
    pub pub_key_cred_params: Option<Vec<ServerCredentialParameter>>,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub exclude_credentials: Option<Vec<ServerCredentialDescriptor>>,
    /// Kept as a raw map: any key may arrive as `null` or `""`, including
    /// boolean ones, and unknown keys pass through to the platform
    #[serde(default)]
    pub authenticator_selection: Option<Map<String, Value>>,
    #[serde(default)]
    pub attestation: Option<String>,
    #[serde(default)]
    pub extensions: Option<Map<String, Value>>,
}

/// Start-authentication options (after unwrapping, see
/// [`OptionsEnvelope`](crate::config::OptionsEnvelope))
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerAuthenticationOptions {
    pub challenge: String,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub rp_id: Option<String>,
    #[serde(default)]
    pub allow_credentials: Option<Vec<ServerCredentialDescriptor>>,
    #[serde(default)]
    pub user_verification: Option<String>,
    #[serde(default)]
    pub extensions: Option<Map<String, Value>>,
}

/// Pull the domain error out of a start-call body, if there is one
///
/// The server reports start failures as `{"error": "..."}`. A falsy error
/// (`null`, `false`, `0` or `""`) means no error.
pub fn start_error(body: &Value) -> Option<String> {
    match body.get("error") {
        None | Some(Value::Null) | Some(Value::Bool(false)) => None,
        Some(Value::String(message)) if message.is_empty() => None,
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
        Some(Value::String(message)) => Some(message.clone()),
        Some(other) => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registration_options_accept_null_and_missing_fields() {
        let body = json!({
            "rp": {"name": "Demo", "id": null},
            "user": {"id": "AQ", "name": "alice", "displayName": "Alice"},
            "challenge": "AAEC",
            "excludeCredentials": null,
            "authenticatorSelection": null,
            "extensions": {"credProps": true, "appidExclude": null}
        });
        let options: ServerRegistrationOptions = serde_json::from_value(body).unwrap();
        assert_eq!(options.rp.unwrap().id, None);
        assert!(options.exclude_credentials.is_none());
        assert!(options.authenticator_selection.is_none());
        assert!(options.pub_key_cred_params.is_none());
        assert_eq!(options.extensions.unwrap().len(), 2);
    }

    #[test]
    fn finish_response_without_success_is_a_failure() {
        let response: FinishResponse =
            serde_json::from_value(json!({"error": "No registration in progress"})).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("No registration in progress"));
    }

    #[test]
    fn finish_response_accepts_principal_name_spelling() {
        let response: FinishResponse =
            serde_json::from_value(json!({"success": true, "principalName": "alice"})).unwrap();
        assert_eq!(response.username.as_deref(), Some("alice"));
    }

    #[test]
    fn start_error_ignores_null_and_falsy_values() {
        assert_eq!(start_error(&json!({"error": null, "challenge": "AA"})), None);
        assert_eq!(start_error(&json!({"error": "", "challenge": "AA"})), None);
        assert_eq!(start_error(&json!({"error": false, "challenge": "AA"})), None);
        assert_eq!(start_error(&json!({"error": 0})), None);
        assert_eq!(start_error(&json!({"error": true})).as_deref(), Some("true"));
        assert_eq!(
            start_error(&json!({"error": "User not found"})).as_deref(),
            Some("User not found")
        );
    }

    #[test]
    fn registration_start_request_omits_missing_display_name() {
        let body = serde_json::to_value(RegistrationStartRequest {
            username: "alice".to_string(),
            display_name: None,
        })
        .unwrap();
        assert_eq!(body, json!({"username": "alice"}));
    }
}
