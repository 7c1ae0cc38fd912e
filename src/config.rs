//! # Configuration Management
//!
//! Client settings come from the environment (12-factor style), with a
//! `.env` file honoured during development.
//!
//! ## Environment Variables
//! - `CEREMONY_SERVER_URL`: base URL of the ceremony server (default: http://localhost:8080)
//! - `REGISTER_START_PATH` / `REGISTER_FINISH_PATH`
//! - `AUTHENTICATE_START_PATH` / `AUTHENTICATE_FINISH_PATH`
//! - `REQUEST_TIMEOUT_SECS`: per-request timeout (default: 30)
//! - `AUTH_OPTIONS_FIELD`: field wrapping the authentication options; empty
//!   means the start response *is* the options
//! - `REQUIRE_DISPLAY_NAME`: registration refuses to start without a display name

use anyhow::Result;
use serde_json::Value;
use std::env;
use std::time::Duration;

pub const DEFAULT_AUTH_OPTIONS_FIELD: &str = "publicKeyCredentialRequestOptions";

/// Where the authentication options live in the start response
///
/// Deployments disagree: some wrap the options in a named field, some return
/// them directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsEnvelope {
    /// The body is the options object
    Direct,
    /// The options are always under this field
    Wrapped(String),
    /// Use this field when present, otherwise treat the body as the options
    Auto(String),
}

impl OptionsEnvelope {
    /// Extract the options object from a start response
    ///
    /// Returns `None` when a `Wrapped` field is missing.
    pub fn unwrap_options(&self, body: Value) -> Option<Value> {
        match self {
            OptionsEnvelope::Direct => Some(body),
            OptionsEnvelope::Wrapped(field) => match body {
                Value::Object(mut map) => map.remove(field),
                _ => None,
            },
            OptionsEnvelope::Auto(field) => match body {
                Value::Object(mut map) if map.contains_key(field) => map.remove(field),
                other => Some(other),
            },
        }
    }
}

impl Default for OptionsEnvelope {
    fn default() -> Self {
        OptionsEnvelope::Auto(DEFAULT_AUTH_OPTIONS_FIELD.to_string())
    }
}

/// Ceremony client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the ceremony server, e.g. "https://example.com"
    pub server_url: String,

    /// Start-registration endpoint, joined onto `server_url`
    /// (default: /api/webauthn/register/start)
    pub register_start_path: String,

    /// Finish-registration endpoint (default: /api/webauthn/register/finish)
    pub register_finish_path: String,

    /// Start-authentication endpoint (default: /api/webauthn/authenticate/start)
    pub authenticate_start_path: String,

    /// Finish-authentication endpoint (default: /api/webauthn/authenticate/finish)
    pub authenticate_finish_path: String,

    /// Applies to each server call, not to the platform ceremony
    pub request_timeout: Duration,

    /// How to find the options in the start-authentication response
    pub auth_options_envelope: OptionsEnvelope,

    /// Refuse to start registration without a display name
    pub require_display_name: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            server_url: "http://localhost:8080".to_string(),
            register_start_path: "/api/webauthn/register/start".to_string(),
            register_finish_path: "/api/webauthn/register/finish".to_string(),
            authenticate_start_path: "/api/webauthn/authenticate/start".to_string(),
            authenticate_finish_path: "/api/webauthn/authenticate/finish".to_string(),
            request_timeout: Duration::from_secs(30),
            auth_options_envelope: OptionsEnvelope::default(),
            require_display_name: false,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to [`ClientConfig::default`].
    ///
    /// ## Example .env file
    /// ```text
    /// CEREMONY_SERVER_URL=https://example.com
    /// REQUEST_TIMEOUT_SECS=15
    /// AUTH_OPTIONS_FIELD=publicKeyCredentialRequestOptions
    /// REQUIRE_DISPLAY_NAME=true
    /// ```
    ///
    /// # Errors
    /// Returns an error if a numeric or boolean variable does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ClientConfig::default();
        let var = |key: &str, default: String| lookup(key).unwrap_or(default);

        let auth_options_envelope = match lookup("AUTH_OPTIONS_FIELD") {
            None => defaults.auth_options_envelope,
            Some(field) if field.is_empty() => OptionsEnvelope::Direct,
            Some(field) => OptionsEnvelope::Auto(field),
        };

        Ok(ClientConfig {
            server_url: var("CEREMONY_SERVER_URL", defaults.server_url),
            register_start_path: var("REGISTER_START_PATH", defaults.register_start_path),
            register_finish_path: var("REGISTER_FINISH_PATH", defaults.register_finish_path),
            authenticate_start_path: var(
                "AUTHENTICATE_START_PATH",
                defaults.authenticate_start_path,
            ),
            authenticate_finish_path: var(
                "AUTHENTICATE_FINISH_PATH",
                defaults.authenticate_finish_path,
            ),
            request_timeout: match lookup("REQUEST_TIMEOUT_SECS") {
                Some(secs) => Duration::from_secs(secs.parse()?),
                None => defaults.request_timeout,
            },
            auth_options_envelope,
            require_display_name: match lookup("REQUIRE_DISPLAY_NAME") {
                Some(flag) => flag.parse()?,
                None => defaults.require_display_name,
            },
        })
    }

    /// Full URL for an endpoint path
    ///
    /// Example: "http://localhost:8080" + "/api/webauthn/register/start"
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
