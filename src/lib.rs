//! # Passkey Ceremony Client
//!
//! Client-side orchestration for WebAuthn (passkey) registration and
//! authentication. It sits between a ceremony server and the platform's
//! credential API:
//!
//! ```text
//! Orchestrator → server start → sanitize options → platform create()/get()
//!              → serialize credential → server finish → caller
//! ```
//!
//! ## Key Concepts
//! - **Ceremony**: one complete registration or authentication interaction
//! - **Challenge**: single-use random bytes issued by the server; a failed
//!   ceremony is restarted, never resumed
//! - **base64url**: how every binary field travels as JSON text
//!
//! ## Example
//! ```no_run
//! # async fn run<P: passkey_ceremony_client::PlatformCredentialProvider>(provider: P) -> anyhow::Result<()> {
//! use passkey_ceremony_client::{ClientConfig, HttpCeremonyServer, Orchestrator};
//!
//! let config = ClientConfig::from_env()?;
//! let server = HttpCeremonyServer::new(&config)?;
//! let orchestrator = Orchestrator::new(server, provider, &config);
//!
//! let outcome = orchestrator.authenticate("alice").await?;
//! println!("signed in as {}", outcome.username);
//! # Ok(())
//! # }
//! ```

pub mod ceremony;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod platform;
pub mod server;
pub mod webauthn;

pub use ceremony::{
    CeremonyKind, CeremonyOutcome, CeremonyProfile, CeremonyState, DisplayNamePolicy,
    Orchestrator, RegistrationRequest, SessionContext, SuccessAction,
};
pub use config::{ClientConfig, OptionsEnvelope};
pub use error::{CeremonyError, CeremonyResult, ErrorKind};
pub use events::{CeremonyEvent, CeremonyObserver, TracingObserver};
pub use platform::{PlatformCredentialProvider, PlatformError, PlatformErrorKind};
pub use server::{CeremonyServer, HttpCeremonyServer, TransportError};
