//! Finding and rewriting container images in workload manifests
//!
//! Both directions share one traversal, [`image_slots`], which resolves the
//! pod spec for the manifest's kind and yields the literal path of every
//! container `image` field. Reads go through [`navigator::locate`], writes
//! through [`navigator::assign`]; nothing is matched by text.

use tracing::debug;

use crate::error::{ManifestError, NavError};
use crate::image::{rewrite, RegistryHost};
use crate::kind::{WorkloadKind, CONTAINER_LIST_KEYS};
use crate::navigator;
use crate::node::{ManifestNode, NodeShape};
use crate::path::{ImagePath, PathSegment};

const KIND_KEY: &str = "kind";
const IMAGE_KEY: &str = "image";

/// One container `image` field and where it lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    /// Path from the document root to the `image` scalar
    pub path: ImagePath,
    /// Current image reference
    pub image: String,
}

/// Workload kind declared by a manifest
///
/// A `kind` that is not a string scalar is treated as `Other`.
///
/// # Errors
/// - `ManifestError::MissingKindField` if the document has no `kind`
/// - `ManifestError::InvalidManifestShape` if the document is not a mapping
pub fn workload_kind(manifest: &ManifestNode) -> Result<WorkloadKind, ManifestError> {
    let path = ImagePath::from_keys(&[KIND_KEY]);
    match navigator::locate(manifest, &path) {
        Ok(kind) => Ok(kind.as_str().map_or(WorkloadKind::Other, WorkloadKind::from_kind)),
        Err(NavError::PathNotFound { .. }) => Err(ManifestError::MissingKindField),
        Err(err) => Err(ManifestError::InvalidManifestShape(err)),
    }
}

/// Every container and init container `image` field of a manifest
///
/// Slots come back as `containers` entries in list order followed by
/// `initContainers` entries. Entries without an `image` key are skipped.
/// Manifests of an unsupported kind yield no slots.
///
/// # Errors
/// - `ManifestError::MissingKindField` if the document has no `kind`
/// - `ManifestError::InvalidManifestShape` if the pod spec is missing, a
///   container list is not a sequence of mappings, or an `image` is not a string
pub fn image_slots(manifest: &ManifestNode) -> Result<Vec<ImageSlot>, ManifestError> {
    let kind = workload_kind(manifest)?;
    let Some(pod_spec_path) = kind.pod_spec_path() else {
        debug!(%kind, "manifest kind carries no images");
        return Ok(Vec::new());
    };

    let pod_spec = navigator::locate(manifest, &pod_spec_path)?;
    let Some(pod_spec_map) = pod_spec.as_mapping() else {
        return Err(shape_mismatch(pod_spec_path, NodeShape::Mapping, pod_spec));
    };

    let mut slots = Vec::new();
    for list_key in CONTAINER_LIST_KEYS {
        let Some(list) = pod_spec_map.get(list_key) else {
            continue;
        };
        let list_path = pod_spec_path.child(list_key);
        let Some(entries) = list.as_sequence() else {
            return Err(shape_mismatch(list_path, NodeShape::Sequence, list));
        };

        for (index, entry) in entries.iter().enumerate() {
            let entry_path = list_path.child(index);
            let Some(container) = entry.as_mapping() else {
                return Err(shape_mismatch(entry_path, NodeShape::Mapping, entry));
            };
            let Some(image) = container.get(IMAGE_KEY) else {
                continue;
            };
            let image_path = entry_path.child(IMAGE_KEY);
            let Some(reference) = image.as_str() else {
                return Err(ManifestError::InvalidManifestShape(NavError::NotAString {
                    path: image_path,
                    found: image.type_name(),
                }));
            };
            slots.push(ImageSlot {
                path: image_path,
                image: reference.to_string(),
            });
        }
    }

    debug!(%kind, images = slots.len(), "located container images");
    Ok(slots)
}

/// Image references used by a manifest, in slot order
///
/// # Errors
/// Same as [`image_slots`].
pub fn get_using_images(manifest: &ManifestNode) -> Result<Vec<String>, ManifestError> {
    Ok(image_slots(manifest)?
        .into_iter()
        .map(|slot| slot.image)
        .collect())
}

/// Rewrite every container image of a manifest to live under `host`
///
/// Only the addressed `image` scalars change; key order, sibling values and
/// scalar types elsewhere are untouched. Unsupported kinds come back as-is.
///
/// # Errors
/// Same as [`image_slots`]. No slot is written unless all were resolved.
pub fn replace_using_images(
    mut manifest: ManifestNode,
    host: &RegistryHost,
) -> Result<ManifestNode, ManifestError> {
    let slots = image_slots(&manifest)?;
    for slot in slots {
        debug_assert!(is_image_path(&slot.path));
        let replacement = ManifestNode::string(rewrite(&slot.image, host));
        navigator::assign(&mut manifest, &slot.path, replacement)?;
    }
    Ok(manifest)
}

/// Shape error for a node that was found but is the wrong variant
fn shape_mismatch(path: ImagePath, expected: NodeShape, found: &ManifestNode) -> ManifestError {
    ManifestError::InvalidManifestShape(NavError::ShapeMismatch {
        path,
        expected,
        found: found.shape(),
    })
}

/// Whether `path` addresses a container list entry's `image` field
#[must_use]
pub fn is_image_path(path: &ImagePath) -> bool {
    let segments = path.segments();
    matches!(
        segments,
        [.., PathSegment::Key(list), PathSegment::Index(_), PathSegment::Key(leaf)]
            if CONTAINER_LIST_KEYS.contains(&list.as_str()) && leaf == IMAGE_KEY
    )
}
