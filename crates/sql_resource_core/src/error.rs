//! Error taxonomy for a single provisioning invocation.

use std::fmt;

use thiserror::Error;

/// Opaque failure reported by a secret store or database driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Resource property that must be present for a Create request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Database,
    SqlQuery,
    SecretId,
}

impl RequiredField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Database => "Database",
            Self::SqlQuery => "SqlQuery",
            Self::SecretId => "SecretId",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocking step was still outstanding when the invocation deadline passed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invocation deadline exceeded while waiting for {stage}")]
pub struct DeadlineExceeded {
    pub stage: &'static str,
}

/// Errors that terminate an invocation.
///
/// Every variant except [`ProvisionError::MissingParameter`] and
/// [`ProvisionError::EmptySecret`] renders the underlying error text verbatim,
/// so the orchestrator sees the driver's own message.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Missing required '{0}' parameter")]
    MissingParameter(RequiredField),

    #[error("{0}")]
    SecretStore(#[source] DriverError),

    #[error("Unable to parse secret")]
    EmptySecret,

    #[error("{0}")]
    MalformedSecret(#[source] serde_json::Error),

    #[error("{0}")]
    Connection(#[source] DriverError),

    #[error("{0}")]
    Transaction(#[source] DriverError),

    #[error("{0}")]
    Statement(#[source] DriverError),

    #[error("{0}")]
    Commit(#[source] DriverError),
}

impl ProvisionError {
    /// Stable tag for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::SecretStore(_) => "secret_store_error",
            Self::EmptySecret => "empty_secret",
            Self::MalformedSecret(_) => "malformed_secret",
            Self::Connection(_) => "connection_error",
            Self::Transaction(_) => "transaction_error",
            Self::Statement(_) => "statement_error",
            Self::Commit(_) => "commit_error",
        }
    }
}
