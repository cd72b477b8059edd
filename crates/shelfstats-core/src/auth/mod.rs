//! Credentials for the optional reading-progress service.
//!
//! This module provides:
//! - `CredentialStore`: OS-level storage of the API key and user id via keyring
//! - `HardcoverCredentials::resolve`: picks the first value available from
//!   build-time injection, the environment, the keychain and the config file

pub mod credentials;

pub use credentials::{CredentialSource, CredentialStore, HardcoverCredentials};
