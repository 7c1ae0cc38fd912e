//! # Credential Result Serializer
//!
//! The platform hands back credentials full of raw bytes. The server wants
//! JSON. Every binary field is base64url-encoded; the textual id, the type
//! tag and the client extension results pass through untouched.

use crate::codec;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `AuthenticatorAttestationResponse` as returned by `create()`
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationResponse {
    pub attestation_object: Vec<u8>,
    pub client_data_json: Vec<u8>,
    /// From `getTransports()`, when the platform reports it
    pub transports: Vec<String>,
}

/// `AuthenticatorAssertionResponse` as returned by `get()`
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionResponse {
    pub authenticator_data: Vec<u8>,
    pub client_data_json: Vec<u8>,
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

/// A newly created credential
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationCredential {
    /// Already base64url text, as the platform exposes it
    pub id: String,
    pub raw_id: Vec<u8>,
    pub type_: String,
    pub response: AttestationResponse,
    pub client_extension_results: Map<String, Value>,
}

/// A credential assertion
#[derive(Debug, Clone, PartialEq)]
pub struct AssertionCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub type_: String,
    pub response: AssertionResponse,
    pub client_extension_results: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAttestationResponse {
    pub attestation_object: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

/// Registration credential, ready for the finish endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAttestation {
    pub id: String,
    pub raw_id: String,
    pub response: SerializedAttestationResponse,
    #[serde(rename = "type")]
    pub type_: String,
    pub client_extension_results: Map<String, Value>,
}

/// The assertion response payload
///
/// `user_handle` is always written: `None` becomes an explicit `null`, which
/// the server reads differently from a missing key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAssertionResponse {
    pub authenticator_data: String,
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    pub signature: String,
    pub user_handle: Option<String>,
}

/// Authentication credential, ready for the finish endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SerializedAssertion {
    pub id: String,
    pub raw_id: String,
    pub response: SerializedAssertionResponse,
    #[serde(rename = "type")]
    pub type_: String,
    pub client_extension_results: Map<String, Value>,
}

pub fn serialize_attestation(credential: AttestationCredential) -> SerializedAttestation {
    let AttestationCredential {
        id,
        raw_id,
        type_,
        response,
        client_extension_results,
    } = credential;

    SerializedAttestation {
        id,
        raw_id: codec::encode(&raw_id),
        response: SerializedAttestationResponse {
            attestation_object: codec::encode(&response.attestation_object),
            client_data_json: codec::encode(&response.client_data_json),
            transports: Some(response.transports).filter(|t| !t.is_empty()),
        },
        type_,
        client_extension_results,
    }
}

pub fn serialize_assertion(credential: AssertionCredential) -> SerializedAssertion {
    let AssertionCredential {
        id,
        raw_id,
        type_,
        response,
        client_extension_results,
    } = credential;

    SerializedAssertion {
        id,
        raw_id: codec::encode(&raw_id),
        response: SerializedAssertionResponse {
            authenticator_data: codec::encode(&response.authenticator_data),
            client_data_json: codec::encode(&response.client_data_json),
            signature: codec::encode(&response.signature),
            user_handle: response.user_handle.as_deref().map(codec::encode),
        },
        type_,
        client_extension_results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assertion(user_handle: Option<Vec<u8>>) -> AssertionCredential {
        AssertionCredential {
            id: "AQID".to_string(),
            raw_id: vec![1, 2, 3],
            type_: "public-key".to_string(),
            response: AssertionResponse {
                authenticator_data: vec![0xaa; 37],
                client_data_json: br#"{"type":"webauthn.get"}"#.to_vec(),
                signature: vec![0x30, 0x45],
                user_handle,
            },
            client_extension_results: Map::new(),
        }
    }

    #[test]
    fn attestation_fields_are_encoded() {
        let mut extensions = Map::new();
        extensions.insert("credProps".to_string(), json!({"rk": true}));

        let serialized = serialize_attestation(AttestationCredential {
            id: "AQID".to_string(),
            raw_id: vec![1, 2, 3],
            type_: "public-key".to_string(),
            response: AttestationResponse {
                attestation_object: vec![0xa3, 0x63],
                client_data_json: vec![0xfb, 0xff],
                transports: vec![],
            },
            client_extension_results: extensions,
        });

        let body = serde_json::to_value(&serialized).unwrap();
        assert_eq!(
            body,
            json!({
                "id": "AQID",
                "rawId": "AQID",
                "response": {"attestationObject": "o2M", "clientDataJSON": "-_8"},
                "type": "public-key",
                "clientExtensionResults": {"credProps": {"rk": true}}
            })
        );
    }

    #[test]
    fn attestation_keeps_reported_transports() {
        let serialized = serialize_attestation(AttestationCredential {
            id: "AQ".to_string(),
            raw_id: vec![1],
            type_: "public-key".to_string(),
            response: AttestationResponse {
                attestation_object: vec![],
                client_data_json: vec![],
                transports: vec!["internal".to_string()],
            },
            client_extension_results: Map::new(),
        });
        assert_eq!(
            serialized.response.transports,
            Some(vec!["internal".to_string()])
        );
    }

    #[test]
    fn missing_user_handle_is_explicit_null() {
        let body = serde_json::to_value(serialize_assertion(assertion(None))).unwrap();
        let response = body["response"].as_object().unwrap();
        assert!(response.contains_key("userHandle"));
        assert_eq!(response["userHandle"], Value::Null);
    }

    #[test]
    fn empty_user_handle_differs_from_missing() {
        let empty = serde_json::to_value(serialize_assertion(assertion(Some(vec![])))).unwrap();
        assert_eq!(empty["response"]["userHandle"], json!(""));

        let present = serialize_assertion(assertion(Some(vec![1])));
        assert_eq!(present.response.user_handle.as_deref(), Some("AQ"));
        assert_eq!(present.raw_id, "AQID");
        assert_eq!(present.response.signature, "MEU");
    }
}
