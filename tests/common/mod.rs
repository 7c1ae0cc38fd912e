#![allow(dead_code)]

use async_trait::async_trait;
use passkey_ceremony_client::codec;
use passkey_ceremony_client::webauthn::credential::{
    AssertionCredential, AssertionResponse, AttestationCredential, AttestationResponse,
};
use passkey_ceremony_client::webauthn::options::{
    PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
};
use passkey_ceremony_client::webauthn::types::{
    AuthenticationFinishRequest, AuthenticationStartRequest, RegistrationFinishRequest,
    RegistrationStartRequest,
};
use passkey_ceremony_client::{
    CeremonyEvent, CeremonyObserver, CeremonyServer, PlatformCredentialProvider, PlatformError,
    TransportError,
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "passkey_ceremony_client=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub const CREDENTIAL_ID: [u8; 3] = [1, 2, 3];

/// Start-registration body in the shape the deployed server produces
pub fn registration_options() -> Value {
    json!({
        "rp": {"name": "Passkey Demo", "id": "localhost"},
        "user": {"id": "AQ", "name": "alice", "displayName": "Alice"},
        "challenge": "AAEC",
        "pubKeyCredParams": [{"type": "public-key", "alg": -7}],
        "excludeCredentials": [],
        "authenticatorSelection": {"residentKey": null, "userVerification": "preferred"},
        "extensions": {"credProps": true, "appidExclude": null}
    })
}

pub fn authentication_options() -> Value {
    json!({
        "publicKeyCredentialRequestOptions": {
            "challenge": "AAEC",
            "rpId": "localhost",
            "allowCredentials": [{"type": "public-key", "id": "AQID", "transports": []}],
            "userVerification": "preferred",
            "extensions": {"appid": null}
        }
    })
}

/// clientDataJSON carrying the challenge, so a server can check it
pub fn client_data(kind: &str, challenge: &[u8]) -> Vec<u8> {
    json!({
        "type": kind,
        "challenge": codec::encode(challenge),
        "origin": "http://localhost:8080"
    })
    .to_string()
    .into_bytes()
}

pub fn attestation_for(options: &PublicKeyCredentialCreationOptions) -> AttestationCredential {
    AttestationCredential {
        id: codec::encode(&CREDENTIAL_ID),
        raw_id: CREDENTIAL_ID.to_vec(),
        type_: "public-key".to_string(),
        response: AttestationResponse {
            attestation_object: vec![0xa3, 0x63, 0x66, 0x6d, 0x74],
            client_data_json: client_data("webauthn.create", &options.challenge),
            transports: vec!["internal".to_string()],
        },
        client_extension_results: Map::new(),
    }
}

pub fn assertion_for(options: &PublicKeyCredentialRequestOptions) -> AssertionCredential {
    AssertionCredential {
        id: codec::encode(&CREDENTIAL_ID),
        raw_id: CREDENTIAL_ID.to_vec(),
        type_: "public-key".to_string(),
        response: AssertionResponse {
            authenticator_data: vec![0x49; 37],
            client_data_json: client_data("webauthn.get", &options.challenge),
            signature: vec![0x30, 0x45, 0x02, 0x21],
            user_handle: None,
        },
        client_extension_results: Map::new(),
    }
}

#[derive(Debug, Clone)]
pub enum ProviderMode {
    Succeed,
    Reject(PlatformError),
    /// Park until the gate is notified, then succeed
    WaitForGate,
}

/// Stand-in for the platform credential API
pub struct FakeProvider {
    mode: Mutex<ProviderMode>,
    pub gate: Notify,
    pub created: Mutex<Vec<PublicKeyCredentialCreationOptions>>,
    pub requested: Mutex<Vec<PublicKeyCredentialRequestOptions>>,
}

impl FakeProvider {
    pub fn new(mode: ProviderMode) -> Arc<Self> {
        Arc::new(Self {
            mode: Mutex::new(mode),
            gate: Notify::new(),
            created: Mutex::new(Vec::new()),
            requested: Mutex::new(Vec::new()),
        })
    }

    pub fn set_mode(&self, mode: ProviderMode) {
        *self.mode.lock().unwrap() = mode;
    }

    async fn settle(&self) -> Result<(), PlatformError> {
        let mode = self.mode.lock().unwrap().clone();
        match mode {
            ProviderMode::Succeed => Ok(()),
            ProviderMode::Reject(e) => Err(e),
            ProviderMode::WaitForGate => {
                self.gate.notified().await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl PlatformCredentialProvider for FakeProvider {
    async fn create(
        &self,
        options: PublicKeyCredentialCreationOptions,
    ) -> Result<AttestationCredential, PlatformError> {
        self.created.lock().unwrap().push(options.clone());
        self.settle().await?;
        Ok(attestation_for(&options))
    }

    async fn get(
        &self,
        options: PublicKeyCredentialRequestOptions,
    ) -> Result<AssertionCredential, PlatformError> {
        self.requested.lock().unwrap().push(options.clone());
        self.settle().await?;
        Ok(assertion_for(&options))
    }
}

/// Scripted ceremony server that records every call
pub struct MockServer {
    pub register_start: Value,
    pub register_finish: Value,
    pub authenticate_start: Value,
    pub authenticate_finish: Value,
    pub unreachable: bool,
    /// Start calls answer, finish calls fail in transport
    pub unreachable_on_finish: bool,
    pub calls: Mutex<Vec<&'static str>>,
    pub registration_starts: Mutex<Vec<RegistrationStartRequest>>,
    pub registration_finishes: Mutex<Vec<RegistrationFinishRequest>>,
    pub authentication_finishes: Mutex<Vec<AuthenticationFinishRequest>>,
}

impl Default for MockServer {
    fn default() -> Self {
        Self {
            register_start: registration_options(),
            register_finish: json!({"success": true}),
            authenticate_start: authentication_options(),
            authenticate_finish: json!({"success": true, "username": "alice"}),
            unreachable: false,
            unreachable_on_finish: false,
            calls: Mutex::new(Vec::new()),
            registration_starts: Mutex::new(Vec::new()),
            registration_finishes: Mutex::new(Vec::new()),
            authentication_finishes: Mutex::new(Vec::new()),
        }
    }
}

impl MockServer {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn reply(&self, call: &'static str, body: &Value) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(call);
        if self.unreachable || (self.unreachable_on_finish && call.ends_with("/finish")) {
            return Err(TransportError::Unavailable("connection reset".to_string()));
        }
        Ok(body.clone())
    }
}

#[async_trait]
impl CeremonyServer for MockServer {
    async fn start_registration(
        &self,
        request: &RegistrationStartRequest,
    ) -> Result<Value, TransportError> {
        self.registration_starts.lock().unwrap().push(request.clone());
        self.reply("register/start", &self.register_start)
    }

    async fn finish_registration(
        &self,
        request: &RegistrationFinishRequest,
    ) -> Result<Value, TransportError> {
        self.registration_finishes.lock().unwrap().push(request.clone());
        self.reply("register/finish", &self.register_finish)
    }

    async fn start_authentication(
        &self,
        _request: &AuthenticationStartRequest,
    ) -> Result<Value, TransportError> {
        self.reply("authenticate/start", &self.authenticate_start)
    }

    async fn finish_authentication(
        &self,
        request: &AuthenticationFinishRequest,
    ) -> Result<Value, TransportError> {
        self.authentication_finishes.lock().unwrap().push(request.clone());
        self.reply("authenticate/finish", &self.authenticate_finish)
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<CeremonyEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<CeremonyEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl CeremonyObserver for RecordingObserver {
    fn on_event(&self, event: &CeremonyEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
