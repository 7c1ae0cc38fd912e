//! # Ceremony Orchestrator
//!
//! Drives one ceremony at a time through
//!
//! ```text
//! Idle → AwaitingOptions → AwaitingPlatformCeremony → AwaitingVerification → Completed
//!   └──────────────┴──────────────────┴────────────────────────┴──────────→ Failed
//! ```
//!
//! Registration, authenticator addition and authentication share the same
//! machine; a [`CeremonyProfile`] carries what differs between them.
//!
//! ## Suspension points
//! A ceremony only waits on the ceremony server and on the platform. Neither
//! wait is cancelled from here: the platform times out or the user cancels,
//! the network aborts. Dropping the ceremony future is the one exception and
//! leaves the orchestrator in `Failed`.
//!
//! ## No retries
//! The challenge is single-use. A failed ceremony is never resumed; the
//! caller starts a fresh one and gets a fresh challenge.

use crate::config::{ClientConfig, OptionsEnvelope};
use crate::error::{CeremonyError, CeremonyResult};
use crate::events::{CeremonyEvent, CeremonyObserver, TracingObserver};
use crate::platform::PlatformCredentialProvider;
use crate::server::CeremonyServer;
use crate::webauthn::credential::{serialize_assertion, serialize_attestation};
use crate::webauthn::types::FinishResponse;
use crate::webauthn::{authentication, registration};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CeremonyKind {
    /// New principal, or new credential for a principal typed in by the user
    Registration,
    /// New credential for the principal of the current session
    AddAuthenticator,
    Authentication,
}

/// Where the orchestrator's current ceremony stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyState {
    /// Nothing started yet, or a ceremony was claimed and is validating input
    Idle,
    /// Waiting for the server's start call to return options
    AwaitingOptions,
    /// Options handed to the platform; waiting for the user and authenticator
    AwaitingPlatformCeremony,
    /// Credential sent to the server's finish call
    AwaitingVerification,
    /// The server verified the credential
    Completed,
    /// Ended with an error, or the ceremony future was dropped
    Failed,
}

impl CeremonyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CeremonyState::Completed | CeremonyState::Failed)
    }

    /// Whether a ceremony may start from this state
    pub fn is_ready(&self) -> bool {
        matches!(self, CeremonyState::Idle) || self.is_terminal()
    }

    fn can_advance_to(&self, next: CeremonyState) -> bool {
        use CeremonyState::*;
        match (self, next) {
            (Idle, AwaitingOptions)
            | (AwaitingOptions, AwaitingPlatformCeremony)
            | (AwaitingPlatformCeremony, AwaitingVerification)
            | (AwaitingVerification, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

/// How registration treats the display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayNamePolicy {
    /// Refuse to start without one
    Required,
    /// Send it when the user gave one
    Optional,
    /// Never send it
    Omitted,
}

/// What the caller should do once a ceremony completes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuccessAction {
    ShowMessage(String),
    Redirect(String),
    /// Reload the list of registered authenticators
    RefreshList,
}

/// Per-variant ceremony settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CeremonyProfile {
    pub display_name: DisplayNamePolicy,
    pub on_success: SuccessAction,
}

impl CeremonyProfile {
    pub fn registration() -> Self {
        Self {
            display_name: DisplayNamePolicy::Optional,
            on_success: SuccessAction::ShowMessage("Registration complete".to_string()),
        }
    }

    pub fn add_authenticator() -> Self {
        Self {
            display_name: DisplayNamePolicy::Omitted,
            on_success: SuccessAction::RefreshList,
        }
    }

    pub fn authentication() -> Self {
        Self {
            display_name: DisplayNamePolicy::Omitted,
            on_success: SuccessAction::Redirect("/".to_string()),
        }
    }
}

/// Caller input for registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub username: String,
    pub display_name: Option<String>,
    /// Human-readable authenticator label ("nickname")
    pub label: Option<String>,
}

/// The already-identified principal, supplied by whoever owns the session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    pub username: Option<String>,
}

impl SessionContext {
    pub fn signed_in(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
        }
    }
}

/// A completed ceremony
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CeremonyOutcome {
    pub ceremony_id: Uuid,
    pub kind: CeremonyKind,
    /// Confirmed by the server when it says so, otherwise the one we sent
    pub username: String,
    pub server_message: Option<String>,
    pub action: SuccessAction,
}

#[derive(Debug)]
struct Slot {
    state: CeremonyState,
    ceremony_id: Option<Uuid>,
    /// Held from `begin` until the ceremony's handle is dropped, so a ceremony
    /// still sitting in `Idle` cannot be claimed twice
    claimed: bool,
}

/// Runs WebAuthn ceremonies against a ceremony server and a platform provider
///
/// Not reentrant: while one ceremony is in flight, starting another fails
/// with [`CeremonyError::AlreadyInProgress`]. Use one orchestrator per
/// independent principal if ceremonies must overlap.
pub struct Orchestrator<S, P> {
    server: S,
    provider: P,
    observer: Arc<dyn CeremonyObserver>,
    envelope: OptionsEnvelope,
    registration: CeremonyProfile,
    add_authenticator: CeremonyProfile,
    authentication: CeremonyProfile,
    slot: Mutex<Slot>,
}

impl<S, P> Orchestrator<S, P>
where
    S: CeremonyServer,
    P: PlatformCredentialProvider,
{
    pub fn new(server: S, provider: P, config: &ClientConfig) -> Self {
        let mut registration = CeremonyProfile::registration();
        if config.require_display_name {
            registration.display_name = DisplayNamePolicy::Required;
        }

        Self {
            server,
            provider,
            observer: Arc::new(TracingObserver),
            envelope: config.auth_options_envelope.clone(),
            registration,
            add_authenticator: CeremonyProfile::add_authenticator(),
            authentication: CeremonyProfile::authentication(),
            slot: Mutex::new(Slot {
                state: CeremonyState::Idle,
                ceremony_id: None,
                claimed: false,
            }),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn CeremonyObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_profile(mut self, kind: CeremonyKind, profile: CeremonyProfile) -> Self {
        match kind {
            CeremonyKind::Registration => self.registration = profile,
            CeremonyKind::AddAuthenticator => self.add_authenticator = profile,
            CeremonyKind::Authentication => self.authentication = profile,
        }
        self
    }

    pub fn state(&self) -> CeremonyState {
        self.slot().state
    }

    /// Register a new credential for the principal typed in by the user
    #[tracing::instrument(skip_all, fields(username = %request.username))]
    pub async fn register(&self, request: RegistrationRequest) -> CeremonyResult<CeremonyOutcome> {
        self.run_registration(CeremonyKind::Registration, request).await
    }

    /// Register another credential for the signed-in principal
    ///
    /// The principal comes from `session`, never from user input.
    #[tracing::instrument(skip_all, fields(username = ?session.username))]
    pub async fn add_authenticator(
        &self,
        session: &SessionContext,
        label: Option<String>,
    ) -> CeremonyResult<CeremonyOutcome> {
        let request = RegistrationRequest {
            username: session.username.clone().unwrap_or_default(),
            display_name: None,
            label,
        };
        self.run_registration(CeremonyKind::AddAuthenticator, request)
            .await
    }

    /// Sign in with an existing credential
    #[tracing::instrument(skip(self))]
    pub async fn authenticate(&self, username: &str) -> CeremonyResult<CeremonyOutcome> {
        let ceremony = self.begin(CeremonyKind::Authentication)?;

        let start = ceremony.check(authentication::start_request(username))?;

        ceremony.advance(CeremonyState::AwaitingOptions);
        let body = ceremony.check(
            self.server
                .start_authentication(&start)
                .await
                .map_err(|e| CeremonyError::network("authentication start", e)),
        )?;
        let options = ceremony.check(authentication::request_options(&self.envelope, body))?;

        ceremony.advance(CeremonyState::AwaitingPlatformCeremony);
        let credential = ceremony.check(self.provider.get(options).await)?;
        let finish = authentication::finish_request(start, serialize_assertion(credential));

        ceremony.advance(CeremonyState::AwaitingVerification);
        let response = ceremony.check(
            self.server
                .finish_authentication(&finish)
                .await
                .map_err(|e| CeremonyError::network("authentication finish", e)),
        )?;
        let response = ceremony.check(verified(response))?;

        Ok(ceremony.complete(&self.authentication, finish.username, response))
    }

    async fn run_registration(
        &self,
        kind: CeremonyKind,
        request: RegistrationRequest,
    ) -> CeremonyResult<CeremonyOutcome> {
        let profile = match kind {
            CeremonyKind::AddAuthenticator => &self.add_authenticator,
            _ => &self.registration,
        };
        let ceremony = self.begin(kind)?;

        let start = ceremony.check(registration::start_request(kind, profile, &request))?;

        ceremony.advance(CeremonyState::AwaitingOptions);
        let body = ceremony.check(
            self.server
                .start_registration(&start)
                .await
                .map_err(|e| CeremonyError::network("registration start", e)),
        )?;
        let options = ceremony.check(registration::creation_options(body))?;

        ceremony.advance(CeremonyState::AwaitingPlatformCeremony);
        let credential = ceremony.check(self.provider.create(options).await)?;
        let finish =
            registration::finish_request(start, request.label, serialize_attestation(credential));

        ceremony.advance(CeremonyState::AwaitingVerification);
        let response = ceremony.check(
            self.server
                .finish_registration(&finish)
                .await
                .map_err(|e| CeremonyError::network("registration finish", e)),
        )?;
        let response = ceremony.check(verified(response))?;

        Ok(ceremony.complete(profile, finish.username, response))
    }

    /// Claim the slot for a new ceremony
    fn begin(&self, kind: CeremonyKind) -> CeremonyResult<ActiveCeremony<'_>> {
        let ceremony_id = Uuid::new_v4();
        let event = {
            let mut slot = self.slot();
            if slot.claimed || !slot.state.is_ready() {
                let running = slot.ceremony_id.unwrap_or_default();
                drop(slot);
                self.observer
                    .on_event(&CeremonyEvent::Rejected { kind, running });
                return Err(CeremonyError::AlreadyInProgress);
            }

            let from = slot.state;
            slot.state = CeremonyState::Idle;
            slot.ceremony_id = Some(ceremony_id);
            slot.claimed = true;
            (from != CeremonyState::Idle).then_some(CeremonyEvent::Transition {
                ceremony_id,
                kind,
                from,
                to: CeremonyState::Idle,
            })
        };
        if let Some(event) = event {
            self.observer.on_event(&event);
        }

        Ok(ActiveCeremony {
            slot: &self.slot,
            observer: self.observer.as_ref(),
            ceremony_id,
            kind,
        })
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        lock(&self.slot)
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    // Slot is plain data; a panic elsewhere cannot leave it half-written
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Decode a finish-call body and check that the server accepted the credential
fn verified(body: Value) -> CeremonyResult<FinishResponse> {
    let response: FinishResponse = serde_json::from_value(body)?;
    if response.success {
        Ok(response)
    } else {
        Err(CeremonyError::ServerVerification(
            response
                .error
                .unwrap_or_else(|| "Unknown error".to_string()),
        ))
    }
}

/// The in-flight ceremony's handle on the orchestrator slot
///
/// Dropping it before a terminal state (the ceremony future was dropped)
/// marks the ceremony `Failed`.
struct ActiveCeremony<'a> {
    slot: &'a Mutex<Slot>,
    observer: &'a dyn CeremonyObserver,
    ceremony_id: Uuid,
    kind: CeremonyKind,
}

impl ActiveCeremony<'_> {
    fn advance(&self, to: CeremonyState) {
        let from = {
            let mut slot = lock(self.slot);
            let from = slot.state;
            debug_assert!(from.can_advance_to(to), "{from:?} -> {to:?}");
            slot.state = to;
            from
        };
        self.observer.on_event(&CeremonyEvent::Transition {
            ceremony_id: self.ceremony_id,
            kind: self.kind,
            from,
            to,
        });
    }

    /// Move to `Failed` on error, pass the value through otherwise
    fn check<T, E: Into<CeremonyError>>(&self, result: Result<T, E>) -> CeremonyResult<T> {
        result.map_err(|e| self.fail(e.into()))
    }

    fn fail(&self, error: CeremonyError) -> CeremonyError {
        self.advance(CeremonyState::Failed);
        self.observer.on_event(&CeremonyEvent::Failed {
            ceremony_id: self.ceremony_id,
            kind: self.kind,
            error: error.kind(),
            message: error.to_string(),
        });
        error
    }

    fn complete(
        &self,
        profile: &CeremonyProfile,
        username: String,
        response: FinishResponse,
    ) -> CeremonyOutcome {
        self.advance(CeremonyState::Completed);
        CeremonyOutcome {
            ceremony_id: self.ceremony_id,
            kind: self.kind,
            username: response.username.unwrap_or(username),
            server_message: response.message,
            action: profile.on_success.clone(),
        }
    }
}

impl Drop for ActiveCeremony<'_> {
    fn drop(&mut self) {
        let from = {
            let mut slot = lock(self.slot);
            if slot.ceremony_id != Some(self.ceremony_id) {
                return;
            }
            slot.claimed = false;
            if slot.state.is_terminal() {
                return;
            }
            let from = slot.state;
            slot.state = CeremonyState::Failed;
            from
        };
        tracing::debug!(ceremony_id = %self.ceremony_id, ?from, "ceremony abandoned");
        self.observer.on_event(&CeremonyEvent::Transition {
            ceremony_id: self.ceremony_id,
            kind: self.kind,
            from,
            to: CeremonyState::Failed,
        });
    }
}
