//! Error types for image transfer
//!
//! Provides error handling for:
//! - External `docker`/`aws` command failures
//! - Registry operations (pull, repository creation, login, tag, push)
//! - Account identity resolution
//! - Per-image transfer step failures

use trimg_manifest::ImageError;

use crate::orchestrator::TransferStep;

/// Failure running an external command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Program could not be started
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Program exited unsuccessfully
    #[error("`{program}` exited with {}: {stderr}", .code.map_or_else(|| "signal".to_string(), |c| format!("status {c}")))]
    Failed {
        program: String,
        /// Exit code, `None` if killed by a signal
        code: Option<i32>,
        /// Trimmed standard error
        stderr: String,
    },
}

impl CommandError {
    /// Standard error output of a failed command
    #[inline]
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            Self::Spawn { .. } => None,
        }
    }
}

/// Registry operation errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Destination repository is already present
    #[error("repository already exists: {0}")]
    RepositoryAlreadyExists(String),

    /// Authorization token did not decode to `user:password`
    #[error("cannot get registry login token: {0}")]
    InvalidAuthorizationToken(String),

    /// Underlying command failed
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Pull failed under its own name and again from Docker Hub
    #[error("pull of {reference} failed: {first}; retry as {canonical} failed: {fallback}")]
    PullFailed {
        /// Reference as given
        reference: String,
        /// Fully qualified Docker Hub name tried second
        canonical: String,
        /// Failure of the first pull
        first: CommandError,
        /// Failure of the Docker Hub pull
        fallback: CommandError,
    },

    /// Registry rejected the operation
    #[error("{0}")]
    Rejected(String),
}

/// Account identity resolution errors
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Identity service call failed
    #[error("failed to resolve account id: {0}")]
    Command(#[from] CommandError),

    /// Identity service answered without an account
    #[error("identity service returned no account id")]
    EmptyAccount,
}

/// Cause of a failed transfer step
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Image reference could not be split
    #[error(transparent)]
    Image(#[from] ImageError),

    /// Registry call failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Worker ended without reporting an outcome
    #[error("transfer task aborted: {0}")]
    TaskAborted(String),
}

/// A transfer that stopped at one of its steps
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {cause}")]
pub struct TransferStepFailure {
    /// Step that failed; later steps were not attempted
    pub step: TransferStep,
    /// What went wrong
    #[source]
    pub cause: TransferError,
}

impl TransferStepFailure {
    /// Create failure for `step`
    #[inline]
    pub fn new(step: TransferStep, cause: impl Into<TransferError>) -> Self {
        Self {
            step,
            cause: cause.into(),
        }
    }
}
