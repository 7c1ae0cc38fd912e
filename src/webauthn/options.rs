//! # Ceremony Option Sanitizer
//!
//! Turns the server's permissive options into the exact shape the platform
//! credential API accepts.
//!
//! The platform API treats the *presence* of a key as meaningful, even when
//! its value is `null`. A server that emits `"residentKey": null` or
//! `"extensions": {}` can make `create()`/`get()` reject the whole request.
//! So, before anything reaches the platform:
//!
//! 1. every binary field (challenge, user id, descriptor ids) is decoded
//! 2. `transports` survives only as a non-empty list
//! 3. authenticator selection and extension inputs lose every null/empty
//!    entry, and disappear entirely if nothing is left
//!
//! Both entry points are pure functions of their input.

use crate::codec::{self, CodecError};
use crate::webauthn::types::{
    ServerAuthenticationOptions, ServerCredentialDescriptor, ServerCredentialParameter,
    ServerRegistrationOptions, ServerRelyingParty, ServerUser,
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Relying party as handed to the platform
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RelyingParty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// User entity with a decoded id
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserEntity {
    pub id: Vec<u8>,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CredentialParameter {
    #[serde(rename = "type")]
    pub type_: String,
    pub alg: i64,
}

/// Credential descriptor with a decoded id
///
/// `transports` is `Some` only for a non-empty list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CredentialDescriptor {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transports: Option<Vec<String>>,
}

/// Platform-ready registration options (`publicKey` argument of `create()`)
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialCreationOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rp: Option<RelyingParty>,
    pub user: UserEntity,
    pub challenge: Vec<u8>,
    pub pub_key_cred_params: Vec<CredentialParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_credentials: Vec<CredentialDescriptor>,
    /// Selection criteria with every null or empty entry removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attestation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

/// Platform-ready authentication options (`publicKey` argument of `get()`)
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialRequestOptions {
    pub challenge: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_credentials: Vec<CredentialDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_verification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

/// Sanitize start-registration options for `create()`
///
/// ## Errors
/// Fails only when a binary field is not valid base64url.
pub fn sanitize_registration_options(
    options: ServerRegistrationOptions,
) -> Result<PublicKeyCredentialCreationOptions, CodecError> {
    Ok(PublicKeyCredentialCreationOptions {
        rp: options.rp.map(sanitize_relying_party),
        user: sanitize_user(options.user)?,
        challenge: codec::decode(&options.challenge)?,
        pub_key_cred_params: options
            .pub_key_cred_params
            .unwrap_or_default()
            .into_iter()
            .map(|ServerCredentialParameter { type_, alg }| CredentialParameter { type_, alg })
            .collect(),
        timeout: options.timeout,
        exclude_credentials: sanitize_descriptors(options.exclude_credentials)?,
        authenticator_selection: options
            .authenticator_selection
            .and_then(prune_empty_entries),
        attestation: non_empty(options.attestation),
        extensions: options.extensions.and_then(prune_empty_entries),
    })
}

/// Sanitize start-authentication options for `get()`
pub fn sanitize_authentication_options(
    options: ServerAuthenticationOptions,
) -> Result<PublicKeyCredentialRequestOptions, CodecError> {
    Ok(PublicKeyCredentialRequestOptions {
        challenge: codec::decode(&options.challenge)?,
        timeout: options.timeout,
        rp_id: non_empty(options.rp_id),
        allow_credentials: sanitize_descriptors(options.allow_credentials)?,
        user_verification: non_empty(options.user_verification),
        extensions: options.extensions.and_then(prune_empty_entries),
    })
}

/// Drop every entry whose value is `null` or `""`
///
/// Returns `None` when nothing is left, so the caller omits the whole map.
pub fn prune_empty_entries(mut map: Map<String, Value>) -> Option<Map<String, Value>> {
    map.retain(|_, value| !is_empty_value(value));
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

fn sanitize_relying_party(rp: ServerRelyingParty) -> RelyingParty {
    RelyingParty {
        id: non_empty(rp.id),
        name: rp.name,
    }
}

fn sanitize_user(user: ServerUser) -> Result<UserEntity, CodecError> {
    Ok(UserEntity {
        id: codec::decode(&user.id)?,
        name: user.name,
        display_name: user.display_name,
    })
}

fn sanitize_descriptors(
    descriptors: Option<Vec<ServerCredentialDescriptor>>,
) -> Result<Vec<CredentialDescriptor>, CodecError> {
    descriptors
        .unwrap_or_default()
        .into_iter()
        .map(sanitize_descriptor)
        .collect()
}

fn sanitize_descriptor(
    descriptor: ServerCredentialDescriptor,
) -> Result<CredentialDescriptor, CodecError> {
    Ok(CredentialDescriptor {
        id: codec::decode(&descriptor.id)?,
        type_: descriptor.type_,
        transports: descriptor.transports.filter(|t| !t.is_empty()),
    })
}
