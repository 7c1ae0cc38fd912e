//! # Platform Credential Provider
//!
//! The boundary to the host's credential API (`navigator.credentials` in a
//! browser, a software or roaming authenticator elsewhere). The provider is a
//! black box: it receives sanitized options and either hands back a
//! credential or rejects.

use crate::webauthn::credential::{AssertionCredential, AttestationCredential};
use crate::webauthn::options::{
    PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Why the platform rejected a ceremony
///
/// Mirrors the error names the WebAuthn API reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformErrorKind {
    /// `NotAllowedError`: the user cancelled, or the ceremony timed out
    NotAllowed,
    /// `AbortError`
    Abort,
    /// `InvalidStateError`: e.g. the authenticator already holds an excluded credential
    InvalidState,
    /// `SecurityError`: origin or RP id policy violation
    Security,
    /// `NotSupportedError`: no eligible authenticator or algorithm
    NotSupported,
    /// `TimeoutError`
    Timeout,
    Other,
}

impl PlatformErrorKind {
    /// Map a platform error name onto a kind
    pub fn from_name(name: &str) -> Self {
        match name {
            "NotAllowedError" => Self::NotAllowed,
            "AbortError" => Self::Abort,
            "InvalidStateError" => Self::InvalidState,
            "SecurityError" => Self::Security,
            "NotSupportedError" => Self::NotSupported,
            "TimeoutError" => Self::Timeout,
            _ => Self::Other,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NotAllowed => "NotAllowedError",
            Self::Abort => "AbortError",
            Self::InvalidState => "InvalidStateError",
            Self::Security => "SecurityError",
            Self::NotSupported => "NotSupportedError",
            Self::Timeout => "TimeoutError",
            Self::Other => "Error",
        }
    }
}

impl fmt::Display for PlatformErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rejected platform ceremony, with the provider's own message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct PlatformError {
    pub kind: PlatformErrorKind,
    pub message: String,
}

impl PlatformError {
    pub fn new(kind: PlatformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The user dismissed the prompt (or let it time out)
    pub fn cancelled() -> Self {
        Self::new(
            PlatformErrorKind::NotAllowed,
            "The operation either timed out or was not allowed.",
        )
    }
}

/// The host's credential API
///
/// `create` backs registration, `get` backs authentication. Either call may
/// suspend for as long as the user takes to interact with the authenticator.
#[async_trait]
pub trait PlatformCredentialProvider: Send + Sync {
    async fn create(
        &self,
        options: PublicKeyCredentialCreationOptions,
    ) -> Result<AttestationCredential, PlatformError>;

    async fn get(
        &self,
        options: PublicKeyCredentialRequestOptions,
    ) -> Result<AssertionCredential, PlatformError>;
}

#[async_trait]
impl<T: PlatformCredentialProvider + ?Sized> PlatformCredentialProvider for Arc<T> {
    async fn create(
        &self,
        options: PublicKeyCredentialCreationOptions,
    ) -> Result<AttestationCredential, PlatformError> {
        (**self).create(options).await
    }

    async fn get(
        &self,
        options: PublicKeyCredentialRequestOptions,
    ) -> Result<AssertionCredential, PlatformError> {
        (**self).get(options).await
    }
}
