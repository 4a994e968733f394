//! Error types for manifest addressing and rewriting
//!
//! Provides typed failures for:
//! - Path traversal over the document tree
//! - Workload manifests that lack a kind or have an unexpected shape
//! - Image references that cannot be split into repository and tag
//! - Reading and writing multi-document YAML

use std::path::PathBuf;

use crate::node::NodeShape;
use crate::path::ImagePath;

/// Path traversal errors raised by the navigator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    /// A segment met a node of the wrong variant
    #[error("shape mismatch at '{path}': expected {expected}, found {found}")]
    ShapeMismatch {
        /// Path up to and including the offending segment
        path: ImagePath,
        /// Variant the segment required
        expected: NodeShape,
        /// Variant actually present
        found: NodeShape,
    },

    /// A value that must be a string holds something else
    #[error("expected string at '{path}', found {found}")]
    NotAString {
        /// Path of the offending value
        path: ImagePath,
        /// Kind of value present, e.g. `null` or `integer`
        found: &'static str,
    },

    /// Key absent or index out of range
    #[error("path not found: '{path}'")]
    PathNotFound {
        /// Path up to and including the missing segment
        path: ImagePath,
    },
}

impl NavError {
    /// Path at which traversal stopped
    #[inline]
    #[must_use]
    pub fn path(&self) -> &ImagePath {
        match self {
            Self::ShapeMismatch { path, .. }
            | Self::NotAString { path, .. }
            | Self::PathNotFound { path } => path,
        }
    }
}

/// Workload manifest errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Document has no top-level `kind`
    #[error("invalid format manifest: missing 'kind' field")]
    MissingKindField,

    /// Pod spec or container list could not be resolved
    #[error("invalid format manifest: {0}")]
    InvalidManifestShape(#[from] NavError),

    /// YAML syntax or structure error
    #[error("YAML parse error: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// YAML serialization error
    #[error("YAML serialization error: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// Manifest file could not be read
    #[error("failed to read manifest '{}': {source}", path.display())]
    Io {
        /// File that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    /// Whether the error concerns the document's structure rather than I/O or syntax
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MissingKindField | Self::InvalidManifestShape(_))
    }
}

/// Image reference errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageError {
    /// More than one `:` in the reference
    #[error("image format is wrong: '{0}'")]
    MalformedImageReference(String),
}
