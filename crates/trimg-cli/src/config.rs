//! Command configuration
//!
//! Region comes from the environment; account id, concurrency and the image
//! source come from command line flags.

use std::path::PathBuf;

use trimg_manifest::RegistryHost;
use trimg_transfer::{IdentityError, IdentityResolver, DEFAULT_MAX_CONCURRENCY};

/// Environment variable holding the AWS region
pub const REGION_ENV: &str = "AWS_DEFAULT_REGION";

/// Fatal precondition failures
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Region is not configured
    #[error("you should do `export AWS_DEFAULT_REGION=...`")]
    MissingRegionConfig,

    /// Account id could not be resolved
    #[error(transparent)]
    MissingIdentity(#[from] IdentityError),

    /// `replace` needs exactly one path
    #[error("you can only specify one filepath")]
    ArgumentCount,

    /// `transfer` got neither images nor a manifest
    #[error("You should set image paths")]
    MissingImages,
}

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// AWS region of the destination registry
    pub region: String,
    /// Destination account; resolved from the caller identity when unset
    pub account_id: Option<String>,
    /// Transfers allowed to run at once
    pub max_concurrency: usize,
}

impl AppConfig {
    /// Configuration for `region`
    #[inline]
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            account_id: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Read the region from `AWS_DEFAULT_REGION`
    ///
    /// # Errors
    /// `CliError::MissingRegionConfig` if the variable is unset or empty.
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_region(std::env::var(REGION_ENV).ok())
    }

    /// Build from an optional region value
    ///
    /// # Errors
    /// `CliError::MissingRegionConfig` if `region` is `None` or blank.
    pub fn from_region(region: Option<String>) -> Result<Self, CliError> {
        match region {
            Some(region) if !region.trim().is_empty() => Ok(Self::new(region.trim())),
            _ => Err(CliError::MissingRegionConfig),
        }
    }

    /// With explicit account id; empty values are ignored
    #[inline]
    #[must_use]
    pub fn with_account_id(mut self, account_id: Option<String>) -> Self {
        self.account_id = account_id.filter(|id| !id.is_empty());
        self
    }

    /// With concurrency limit (at least 1)
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Destination registry host, resolving the account if needed
    ///
    /// # Errors
    /// `CliError::MissingIdentity` if the account cannot be resolved.
    pub async fn registry_host(
        &self,
        identity: &dyn IdentityResolver,
    ) -> Result<RegistryHost, CliError> {
        let account = match &self.account_id {
            Some(account) => account.clone(),
            None => identity.account_id(&self.region).await?,
        };
        Ok(RegistryHost::ecr(&account, &self.region))
    }
}

/// Where `transfer` takes its images from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// References given on the command line
    Arguments(Vec<String>),
    /// Container images of a manifest file
    ManifestFile(PathBuf),
}

impl ImageSource {
    /// Pick the source; a manifest file wins over arguments
    ///
    /// # Errors
    /// `CliError::MissingImages` if there is neither.
    pub fn resolve(images: Vec<String>, filename: Option<PathBuf>) -> Result<Self, CliError> {
        match filename {
            Some(path) => Ok(Self::ManifestFile(path)),
            None if images.is_empty() => Err(CliError::MissingImages),
            None => Ok(Self::Arguments(images)),
        }
    }
}

/// Settings of one `transfer` invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferConfig {
    pub source: ImageSource,
    /// Only print what would be transferred
    pub dry_run: bool,
    pub max_concurrency: usize,
    /// Render live progress on stderr
    pub show_progress: bool,
}

impl TransferConfig {
    #[inline]
    #[must_use]
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            dry_run: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            show_progress: true,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// With concurrency limit (at least 1)
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimg_transfer::StaticIdentity;

    #[test]
    fn region_is_required() {
        assert!(matches!(
            AppConfig::from_region(None),
            Err(CliError::MissingRegionConfig)
        ));
        assert!(matches!(
            AppConfig::from_region(Some("  ".into())),
            Err(CliError::MissingRegionConfig)
        ));
        assert_eq!(
            AppConfig::from_region(Some("eu-west-1".into())).unwrap().region,
            "eu-west-1"
        );
    }

    #[test]
    fn region_error_message() {
        assert_eq!(
            CliError::MissingRegionConfig.to_string(),
            "you should do `export AWS_DEFAULT_REGION=...`"
        );
    }

    #[test]
    fn concurrency_floor() {
        let config = AppConfig::new("us-east-1").with_max_concurrency(0);
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(AppConfig::new("us-east-1").max_concurrency, 4);
    }

    #[tokio::test]
    async fn explicit_account_skips_identity_lookup() {
        let config = AppConfig::new("us-east-1").with_account_id(Some("222222222222".into()));
        let host = config
            .registry_host(&StaticIdentity(String::new()))
            .await
            .unwrap();
        assert_eq!(host.as_str(), "222222222222.dkr.ecr.us-east-1.amazonaws.com");
    }

    #[tokio::test]
    async fn empty_account_falls_back_to_identity() {
        let config = AppConfig::new("ap-northeast-1").with_account_id(Some(String::new()));
        let host = config
            .registry_host(&StaticIdentity("333333333333".into()))
            .await
            .unwrap();
        assert_eq!(host.as_str(), "333333333333.dkr.ecr.ap-northeast-1.amazonaws.com");
    }

    #[test]
    fn manifest_file_wins_over_arguments() {
        let source = ImageSource::resolve(vec!["nginx".into()], Some("k8s.yaml".into())).unwrap();
        assert_eq!(source, ImageSource::ManifestFile("k8s.yaml".into()));
        assert!(matches!(
            ImageSource::resolve(Vec::new(), None),
            Err(CliError::MissingImages)
        ));
    }
}
