//! Registry client seam
//!
//! The orchestrator drives every transfer through [`RegistryClient`]; the
//! production implementation is [`crate::docker::DockerCliRegistry`].

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use trimg_manifest::ImageReference;

use crate::error::RegistryError;

/// Login for the destination registry
#[derive(Clone, PartialEq, Eq)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
    /// Registry endpoint the credentials are valid for
    pub endpoint: String,
}

impl RegistryCredentials {
    /// Create credentials
    #[inline]
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Decode an ECR authorization token (base64 of `user:password`)
    ///
    /// # Errors
    /// `RegistryError::InvalidAuthorizationToken` if the token is not base64,
    /// not UTF-8, or does not split into exactly two parts on `:`.
    pub fn from_authorization_token(
        token: &str,
        endpoint: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let decoded = STANDARD
            .decode(token.trim())
            .map_err(|e| RegistryError::InvalidAuthorizationToken(e.to_string()))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|e| RegistryError::InvalidAuthorizationToken(e.to_string()))?;

        let parts: Vec<&str> = decoded.split(':').collect();
        match parts.as_slice() {
            [username, password] => Ok(Self::new(*username, *password, endpoint)),
            _ => Err(RegistryError::InvalidAuthorizationToken(
                "expected user:password".to_string(),
            )),
        }
    }
}

impl fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Operations the transfer pipeline needs from a registry
///
/// Implementations are shared across concurrently running transfers.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RegistryClient: Send + Sync {
    /// Pull `reference` from its source registry
    async fn pull(&self, reference: &str, image: &ImageReference) -> Result<(), RegistryError>;

    /// Create the destination repository
    ///
    /// Returns `RegistryError::RepositoryAlreadyExists` if it is already there.
    async fn ensure_repository(&self, repository: &str) -> Result<(), RegistryError>;

    /// Obtain credentials for the destination registry
    async fn authenticate(&self) -> Result<RegistryCredentials, RegistryError>;

    /// Tag the local `source` image as `destination`
    async fn tag(&self, source: &str, destination: &str) -> Result<(), RegistryError>;

    /// Push `destination` to the destination registry
    async fn push(
        &self,
        destination: &str,
        credentials: &RegistryCredentials,
    ) -> Result<(), RegistryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_authorization_token() {
        let token = STANDARD.encode("AWS:s3cret");
        let creds =
            RegistryCredentials::from_authorization_token(&token, "https://registry").unwrap();
        assert_eq!(creds.username, "AWS");
        assert_eq!(creds.password, "s3cret");
        assert_eq!(creds.endpoint, "https://registry");
    }

    #[test]
    fn reject_token_without_separator() {
        let token = STANDARD.encode("no-separator");
        assert!(matches!(
            RegistryCredentials::from_authorization_token(&token, "e"),
            Err(RegistryError::InvalidAuthorizationToken(_))
        ));
    }

    #[test]
    fn reject_token_with_extra_colon() {
        let token = STANDARD.encode("a:b:c");
        assert!(RegistryCredentials::from_authorization_token(&token, "e").is_err());
    }

    #[test]
    fn reject_non_base64_token() {
        assert!(RegistryCredentials::from_authorization_token("%%%", "e").is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = RegistryCredentials::new("AWS", "s3cret", "e");
        let debug = format!("{creds:?}");
        assert!(!debug.contains("s3cret"));
        assert!(debug.contains("AWS"));
    }
}
