//! # Error Handling
//!
//! Every way a ceremony can fail, classified so the caller can react to it.
//!
//! ## Failure classes
//! - **UserInput**: something required was not supplied; nothing was sent
//! - **Server**: the start call answered with a domain error
//! - **PlatformCeremony**: the authenticator or the user said no
//! - **Network**: a request never produced a readable answer
//! - **ServerVerification**: the platform ceremony succeeded but the server
//!   rejected the result
//!
//! A failed ceremony is never resumed. The challenge it carried is spent, so
//! the caller starts again from the beginning.

use crate::codec::CodecError;
use crate::platform::PlatformError;
use crate::server::TransportError;
use thiserror::Error;

/// Ceremony-wide error type
///
/// Returned by every [`Orchestrator`](crate::ceremony::Orchestrator)
/// ceremony method. None of these are fatal to the host: each one ends the
/// current ceremony and leaves the orchestrator ready for the next.
#[derive(Error, Debug)]
pub enum CeremonyError {
    /// Required input missing (e.g. no username)
    ///
    /// Detected locally, before any network call.
    #[error("Invalid input: {0}")]
    UserInput(String),

    /// The start call reported a domain error
    ///
    /// The server's message is carried verbatim, e.g. "User not found".
    #[error("Server error: {0}")]
    Server(String),

    /// The platform credential provider rejected the ceremony
    ///
    /// Covers user cancellation, timeout, policy violations and the absence
    /// of an eligible authenticator.
    #[error("Platform ceremony failed: {0}")]
    PlatformCeremony(#[from] PlatformError),

    /// Transport failure while talking to the ceremony server
    #[error("Network error during {context}: {source}")]
    Network {
        context: &'static str,
        #[source]
        source: TransportError,
    },

    /// The finish call rejected a credential the platform produced
    #[error("Verification failed: {0}")]
    ServerVerification(String),

    /// The server answered, but not in a shape we can use
    #[error("Malformed server response: {0}")]
    MalformedResponse(String),

    /// Another ceremony is still running on this orchestrator
    #[error("A ceremony is already in progress")]
    AlreadyInProgress,
}

/// Flat classification of a [`CeremonyError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UserInput,
    Server,
    PlatformCeremony,
    Network,
    ServerVerification,
    MalformedResponse,
    AlreadyInProgress,
}

impl CeremonyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CeremonyError::UserInput(_) => ErrorKind::UserInput,
            CeremonyError::Server(_) => ErrorKind::Server,
            CeremonyError::PlatformCeremony(_) => ErrorKind::PlatformCeremony,
            CeremonyError::Network { .. } => ErrorKind::Network,
            CeremonyError::ServerVerification(_) => ErrorKind::ServerVerification,
            CeremonyError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            CeremonyError::AlreadyInProgress => ErrorKind::AlreadyInProgress,
        }
    }

    pub(crate) fn network(context: &'static str, source: TransportError) -> Self {
        CeremonyError::Network { context, source }
    }
}

impl From<CodecError> for CeremonyError {
    fn from(e: CodecError) -> Self {
        CeremonyError::MalformedResponse(e.to_string())
    }
}

impl From<serde_json::Error> for CeremonyError {
    fn from(e: serde_json::Error) -> Self {
        CeremonyError::MalformedResponse(e.to_string())
    }
}

/// Convenience type alias for Results using CeremonyError
pub type CeremonyResult<T> = Result<T, CeremonyError>;
