//! trimg Manifest
//!
//! Shape-aware addressing of container images in Kubernetes workload manifests.
//!
//! # Core Concepts
//!
//! - [`ManifestNode`]: one parsed YAML document as a closed scalar/sequence/mapping tree
//! - [`ImagePath`]: ordered keys and indices addressing a node
//! - [`navigator`]: checked read ([`locate`]) and write ([`assign`]) by path
//! - [`WorkloadKind`]: which pod spec path each workload kind uses
//! - [`get_using_images`] / [`replace_using_images`]: find or rewrite container images
//! - [`ImageReference`] / [`rewrite`]: split references and build destination paths
//!
//! # Example
//!
//! ```rust
//! use trimg_manifest::{parse_documents, replace_using_images, get_using_images, RegistryHost};
//!
//! let docs = parse_documents("kind: Pod\nspec:\n  containers:\n    - image: nginx\n").unwrap();
//! assert_eq!(get_using_images(&docs[0]).unwrap(), vec!["nginx"]);
//!
//! let host = RegistryHost::ecr("111111111111", "us-east-1");
//! let replaced = replace_using_images(docs[0].clone(), &host).unwrap();
//! assert_eq!(
//!     get_using_images(&replaced).unwrap(),
//!     vec!["111111111111.dkr.ecr.us-east-1.amazonaws.com/nginx"]
//! );
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod document;
pub mod error;
pub mod image;
pub mod kind;
pub mod navigator;
pub mod node;
pub mod path;
pub mod workload;

// Re-exports
pub use document::{parse_documents, read_documents, render_document, render_documents};
pub use error::{ImageError, ManifestError, NavError};
pub use image::{rewrite, ImageReference, RegistryHost, DEFAULT_TAG};
pub use kind::WorkloadKind;
pub use navigator::{assign, locate, locate_mut};
pub use node::{ManifestNode, Mapping, NodeShape, Scalar};
pub use path::{ImagePath, PathError, PathSegment};
pub use workload::{get_using_images, image_slots, replace_using_images, workload_kind, ImageSlot};
