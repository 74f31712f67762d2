//! Credential handling.

pub mod credentials;

pub use credentials::{OracleCredentials, SecretString, DEFAULT_LARGE_MODEL, DEFAULT_SMALL_MODEL};
