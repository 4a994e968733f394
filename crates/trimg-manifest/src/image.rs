//! Image reference parsing and destination path formatting
//!
//! [`ImageReference::split`] and [`rewrite`] are independent: rewriting
//! prefixes the original string as-is and never validates it.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::ImageError;

/// Tag used when a reference carries none
pub const DEFAULT_TAG: &str = "latest";

/// Repository and tag of an image reference
///
/// `tag` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    /// Everything before the `:`
    pub repository: String,
    /// Everything after the `:`, or `latest`
    pub tag: String,
}

impl ImageReference {
    /// Split a reference on its `:`
    ///
    /// # Examples
    /// - `nginx` → `nginx` / `latest`
    /// - `golang:1.13.5` → `golang` / `1.13.5`
    ///
    /// # Errors
    /// `ImageError::MalformedImageReference` when the reference holds more than
    /// one `:`, which includes `host:port/repo:tag` forms.
    pub fn split(reference: &str) -> Result<Self, ImageError> {
        let mut parts = reference.split(':');
        let repository = parts.next().unwrap_or_default();
        let tag = parts.next();
        if parts.next().is_some() {
            return Err(ImageError::MalformedImageReference(reference.to_string()));
        }

        // `repo:` has an empty tag; keep the tag non-empty.
        let tag = match tag {
            Some(tag) if !tag.is_empty() => tag,
            _ => DEFAULT_TAG,
        };

        Ok(Self {
            repository: repository.to_string(),
            tag: tag.to_string(),
        })
    }

    /// Whether the first path component is a registry host
    ///
    /// A host contains a `.` or a `:`, or is `localhost`; `gcr.io/team/app`
    /// names one, `bitnami/redis` and `nginx` do not.
    #[must_use]
    pub fn names_registry(&self) -> bool {
        match self.repository.split_once('/') {
            Some((first, _)) => first.contains(['.', ':']) || first == "localhost",
            None => false,
        }
    }

    /// Fully qualified Docker Hub name (`docker.io/library/nginx:latest`)
    #[must_use]
    pub fn docker_hub_name(&self) -> String {
        if self.repository.contains('/') {
            format!("docker.io/{}:{}", self.repository, self.tag)
        } else {
            format!("docker.io/library/{}:{}", self.repository, self.tag)
        }
    }
}

impl FromStr for ImageReference {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::split(s)
    }
}

impl Display for ImageReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Address of the destination registry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryHost(String);

impl RegistryHost {
    /// Arbitrary registry address
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self(host.into())
    }

    /// Private ECR registry for an account in a region
    #[must_use]
    pub fn ecr(account_id: &str, region: &str) -> Self {
        Self(format!("{account_id}.dkr.ecr.{region}.amazonaws.com"))
    }

    /// Host string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RegistryHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination path for `reference` under `host`
///
/// The full original string, tag included, is kept verbatim.
#[inline]
#[must_use]
pub fn rewrite(reference: &str, host: &RegistryHost) -> String {
    format!("{}/{}", host.as_str(), reference)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_without_tag_defaults_to_latest() {
        let image = ImageReference::split("nginx").unwrap();
        assert_eq!(
            image,
            ImageReference {
                repository: "nginx".into(),
                tag: "latest".into()
            }
        );
    }

    #[test]
    fn split_with_tag() {
        let image: ImageReference = "repo:tag".parse().unwrap();
        assert_eq!(image.repository, "repo");
        assert_eq!(image.tag, "tag");
    }

    #[test]
    fn split_keeps_path_segments_in_repository() {
        let image = ImageReference::split("bitnami/redis:6.0").unwrap();
        assert_eq!(image.repository, "bitnami/redis");
        assert_eq!(image.tag, "6.0");
    }

    #[test]
    fn split_rejects_two_colons() {
        assert_eq!(
            ImageReference::split("a:b:c"),
            Err(ImageError::MalformedImageReference("a:b:c".into()))
        );
    }

    #[test]
    fn split_rejects_registry_port() {
        assert!(ImageReference::split("localhost:5000/app:v1").is_err());
    }

    #[test]
    fn split_empty_tag_is_latest() {
        assert_eq!(ImageReference::split("nginx:").unwrap().tag, "latest");
    }

    #[test]
    fn display_includes_tag() {
        assert_eq!(ImageReference::split("nginx").unwrap().to_string(), "nginx:latest");
    }

    #[test]
    fn registry_qualified_repositories() {
        for qualified in ["gcr.io/team/app:1", "localhost/app", "registry.example.com/app"] {
            assert!(ImageReference::split(qualified).unwrap().names_registry(), "{qualified}");
        }
        for short in ["nginx", "bitnami/redis:6", "library/nginx"] {
            assert!(!ImageReference::split(short).unwrap().names_registry(), "{short}");
        }
    }

    #[test]
    fn docker_hub_names() {
        assert_eq!(
            ImageReference::split("nginx").unwrap().docker_hub_name(),
            "docker.io/library/nginx:latest"
        );
        assert_eq!(
            ImageReference::split("bitnami/redis:6").unwrap().docker_hub_name(),
            "docker.io/bitnami/redis:6"
        );
    }

    #[test]
    fn ecr_host() {
        let host = RegistryHost::ecr("123456789012", "ap-northeast-1");
        assert_eq!(host.as_str(), "123456789012.dkr.ecr.ap-northeast-1.amazonaws.com");
    }

    #[test]
    fn rewrite_prefixes_full_reference() {
        let host = RegistryHost::ecr("123456789012", "ap-northeast1");
        assert_eq!(
            rewrite("nginx:latest", &host),
            "123456789012.dkr.ecr.ap-northeast1.amazonaws.com/nginx:latest"
        );
    }

    #[test]
    fn rewrite_does_not_validate() {
        let host = RegistryHost::new("registry.local");
        assert_eq!(rewrite("a:b:c", &host), "registry.local/a:b:c");
    }
}
