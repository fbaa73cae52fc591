//! Configuration error types with clear, actionable messages

use thiserror::Error;

/// Errors raised while building a [`crate::Config`].
///
/// All of these are fatal: a partially configured instrumentation must never
/// start, so `ConfigBuilder::build()` refuses rather than defaulting.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No ingest access token was provided.
    #[error("no access token configured.\n\nEvery install needs a token to authenticate against the ingest endpoint.\nCall ConfigBuilder::access_token(..) before build().")]
    MissingAccessToken,

    /// Neither an explicit endpoint nor a realm was provided.
    #[error("no ingest endpoint configured.\n\nSet a full endpoint with ConfigBuilder::endpoint(..) or derive one from a\nrealm with ConfigBuilder::realm(..) before build().")]
    MissingEndpoint,

    /// No application name was provided.
    #[error("no application name configured.\n\nSpans are grouped per application in the backend; call\nConfigBuilder::application_name(..) before build().")]
    MissingApplicationName,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
