//! # WebAuthn Module
//!
//! Everything that knows the shape of WebAuthn data on the client side.
//!
//! ## Submodules
//! - `types`: request/response bodies for the ceremony server
//! - `options`: sanitizing server options for the platform API
//! - `credential`: serializing platform credentials for the server
//! - `registration`: registration-specific ceremony steps
//! - `authentication`: authentication-specific ceremony steps
//!
//! ## WebAuthn Flow Overview
//!
//! ### Registration (Creating a Passkey)
//! 1. Client asks the server to start → options with a fresh challenge
//! 2. Options are sanitized and passed to the platform's `create()`
//! 3. The attestation is serialized and sent to the server to finish
//!
//! ### Authentication (Signing In)
//! 1. Client asks the server to start → options listing allowed credentials
//! 2. Options are sanitized and passed to the platform's `get()`
//! 3. The assertion is serialized and sent to the server to finish

pub mod authentication;
pub mod credential;
pub mod options;
pub mod registration;
pub mod types;
