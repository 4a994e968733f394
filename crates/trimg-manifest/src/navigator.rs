//! Path-addressed read/write over a manifest tree
//!
//! Each [`PathSegment`] is checked against the node it meets:
//! - `Key` requires a mapping containing the key
//! - `Index` requires a sequence long enough for the index
//!
//! The document owns every node it contains, so writing through a `&mut`
//! borrow cannot reach into another tree.

use crate::error::NavError;
use crate::node::{ManifestNode, NodeShape};
use crate::path::{ImagePath, PathSegment};

/// Resolve `path` against `root` for reading
///
/// # Errors
/// - `NavError::ShapeMismatch` if a segment meets the wrong node variant
/// - `NavError::PathNotFound` if a key is absent or an index out of range
pub fn locate<'a>(root: &'a ManifestNode, path: &ImagePath) -> Result<&'a ManifestNode, NavError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        current = step(current, segment, path, depth)?;
    }
    Ok(current)
}

/// Resolve `path` against `root` for in-place mutation
///
/// # Errors
/// Same as [`locate`].
pub fn locate_mut<'a>(
    root: &'a mut ManifestNode,
    path: &ImagePath,
) -> Result<&'a mut ManifestNode, NavError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        current = step_mut(current, segment, path, depth)?;
    }
    Ok(current)
}

/// Replace the node addressed by `path`, returning the previous node
///
/// The root itself is replaced when `path` is empty.
///
/// # Errors
/// Same as [`locate`]; the document is untouched on error.
pub fn assign(
    root: &mut ManifestNode,
    path: &ImagePath,
    value: ManifestNode,
) -> Result<ManifestNode, NavError> {
    let slot = locate_mut(root, path)?;
    Ok(std::mem::replace(slot, value))
}

fn step<'a>(
    node: &'a ManifestNode,
    segment: &PathSegment,
    path: &ImagePath,
    depth: usize,
) -> Result<&'a ManifestNode, NavError> {
    match (segment, node) {
        (PathSegment::Key(key), ManifestNode::Mapping(map)) => {
            map.get(key).ok_or_else(|| not_found(path, depth))
        }
        (PathSegment::Index(index), ManifestNode::Sequence(items)) => {
            items.get(*index).ok_or_else(|| not_found(path, depth))
        }
        _ => Err(mismatch(node, segment, path, depth)),
    }
}

fn step_mut<'a>(
    node: &'a mut ManifestNode,
    segment: &PathSegment,
    path: &ImagePath,
    depth: usize,
) -> Result<&'a mut ManifestNode, NavError> {
    match (segment, node) {
        (PathSegment::Key(key), ManifestNode::Mapping(map)) => {
            map.get_mut(key).ok_or_else(|| not_found(path, depth))
        }
        (PathSegment::Index(index), ManifestNode::Sequence(items)) => {
            items.get_mut(*index).ok_or_else(|| not_found(path, depth))
        }
        (segment, node) => Err(mismatch(node, segment, path, depth)),
    }
}

fn expected_shape(segment: &PathSegment) -> NodeShape {
    match segment {
        PathSegment::Key(_) => NodeShape::Mapping,
        PathSegment::Index(_) => NodeShape::Sequence,
    }
}

fn mismatch(node: &ManifestNode, segment: &PathSegment, path: &ImagePath, depth: usize) -> NavError {
    NavError::ShapeMismatch {
        path: path.truncated(depth + 1),
        expected: expected_shape(segment),
        found: node.shape(),
    }
}

fn not_found(path: &ImagePath, depth: usize) -> NavError {
    NavError::PathNotFound {
        path: path.truncated(depth + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> ManifestNode {
        serde_yaml::from_str(
            r"
spec:
  containers:
    - name: web
      image: nginx
    - name: sidecar
      image: envoy
  replicas: 2
",
        )
        .unwrap()
    }

    fn path(s: &str) -> ImagePath {
        s.parse().unwrap()
    }

    #[test]
    fn locate_nested_value() {
        let root = doc();
        let node = locate(&root, &path("spec.containers[1].image")).unwrap();
        assert_eq!(node.as_str(), Some("envoy"));
    }

    #[test]
    fn locate_empty_path_is_root() {
        let root = doc();
        assert_eq!(locate(&root, &ImagePath::root()).unwrap(), &root);
    }

    #[test]
    fn locate_missing_key() {
        let root = doc();
        let err = locate(&root, &path("spec.initContainers")).unwrap_err();
        assert_eq!(
            err,
            NavError::PathNotFound {
                path: path("spec.initContainers")
            }
        );
    }

    #[test]
    fn locate_index_out_of_range() {
        let root = doc();
        let err = locate(&root, &path("spec.containers[2].image")).unwrap_err();
        assert_eq!(err.path(), &path("spec.containers[2]"));
        assert!(matches!(err, NavError::PathNotFound { .. }));
    }

    #[test]
    fn key_on_sequence_is_shape_mismatch() {
        let root = doc();
        let err = locate(&root, &path("spec.containers.image")).unwrap_err();
        assert_eq!(
            err,
            NavError::ShapeMismatch {
                path: path("spec.containers.image"),
                expected: NodeShape::Mapping,
                found: NodeShape::Sequence,
            }
        );
    }

    #[test]
    fn index_on_scalar_is_shape_mismatch() {
        let root = doc();
        let err = locate(&root, &path("spec.replicas[0]")).unwrap_err();
        assert!(matches!(
            err,
            NavError::ShapeMismatch {
                expected: NodeShape::Sequence,
                found: NodeShape::Scalar,
                ..
            }
        ));
    }

    #[test]
    fn assign_replaces_only_target() {
        let mut root = doc();
        let old = assign(
            &mut root,
            &path("spec.containers[0].image"),
            ManifestNode::string("registry/nginx"),
        )
        .unwrap();

        assert_eq!(old.as_str(), Some("nginx"));
        assert_eq!(
            locate(&root, &path("spec.containers[0].image")).unwrap().as_str(),
            Some("registry/nginx")
        );
        assert_eq!(
            locate(&root, &path("spec.containers[1].image")).unwrap().as_str(),
            Some("envoy")
        );
        assert_eq!(
            locate(&root, &path("spec.containers[0].name")).unwrap().as_str(),
            Some("web")
        );
    }

    #[test]
    fn assign_failure_leaves_document_untouched() {
        let mut root = doc();
        let before = root.clone();
        let result = assign(&mut root, &path("spec.volumes[0]"), ManifestNode::null());
        assert!(result.is_err());
        assert_eq!(root, before);
    }

    #[test]
    fn assign_on_clone_does_not_touch_original() {
        let original = doc();
        let mut copy = original.clone();
        assign(&mut copy, &path("spec.replicas"), ManifestNode::string("3")).unwrap();
        assert_ne!(copy, original);
        assert_eq!(
            locate(&original, &path("spec.replicas")).unwrap(),
            &crate::node::Scalar::Int(2).into()
        );
    }
}
