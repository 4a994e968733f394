//! Account identity resolution

use crate::command;
use crate::error::IdentityError;

/// Resolves the account that owns the destination registry
#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Account id of the caller in `region`
    async fn account_id(&self, region: &str) -> Result<String, IdentityError>;
}

/// Asks `aws sts get-caller-identity`
#[derive(Debug, Clone)]
pub struct AwsCliIdentity {
    program: String,
}

impl AwsCliIdentity {
    /// Run this executable instead of `aws` from `PATH`
    #[inline]
    #[must_use]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for AwsCliIdentity {
    fn default() -> Self {
        Self::with_program("aws")
    }
}

#[async_trait::async_trait]
impl IdentityResolver for AwsCliIdentity {
    async fn account_id(&self, region: &str) -> Result<String, IdentityError> {
        let args = [
            "sts",
            "get-caller-identity",
            "--region",
            region,
            "--query",
            "Account",
            "--output",
            "text",
        ];
        let account = command::run(&self.program, &args, None).await?;
        if account.is_empty() || account == "None" {
            return Err(IdentityError::EmptyAccount);
        }
        tracing::debug!(%account, "resolved caller account");
        Ok(account)
    }
}

/// Fixed account id, for callers that already know it
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub String);

#[async_trait::async_trait]
impl IdentityResolver for StaticIdentity {
    async fn account_id(&self, _region: &str) -> Result<String, IdentityError> {
        if self.0.is_empty() {
            return Err(IdentityError::EmptyAccount);
        }
        Ok(self.0.clone())
    }
}
