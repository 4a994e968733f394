//! `trimg replace`: print a manifest with images pointing at ECR

use std::path::Path;

use anyhow::Context;
use tracing::{debug, warn};
use trimg_manifest::document::join_documents;
use trimg_manifest::{read_documents, render_document, replace_using_images, ManifestNode, RegistryHost};

/// Rewrite every document of the manifest at `path`
///
/// # Errors
/// Fails if the file cannot be read or parsed, or a document cannot be
/// serialized.
pub fn execute(path: &Path, host: &RegistryHost) -> anyhow::Result<String> {
    let documents = read_documents(path)
        .with_context(|| format!("failed to load manifest {}", path.display()))?;
    debug!(path = %path.display(), documents = documents.len(), "replacing images");
    replace_documents(documents, host)
}

/// Rewrite documents and render them as one stream
///
/// A document whose images cannot be rewritten is emitted unchanged.
///
/// # Errors
/// Fails only if a document cannot be serialized.
pub fn replace_documents(
    documents: Vec<ManifestNode>,
    host: &RegistryHost,
) -> anyhow::Result<String> {
    let mut rendered = Vec::with_capacity(documents.len());
    for (index, document) in documents.into_iter().enumerate() {
        let output = match replace_using_images(document.clone(), host) {
            Ok(replaced) => replaced,
            Err(err) => {
                warn!(index, error = %err, "emitting document unchanged");
                document
            }
        };
        rendered.push(render_document(&output)?);
    }
    Ok(join_documents(&rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimg_manifest::parse_documents;

    fn host() -> RegistryHost {
        RegistryHost::ecr("111111111111", "us-east-1")
    }

    #[test]
    fn failed_document_is_kept_as_is() {
        let documents =
            parse_documents("apiVersion: v1\nmetadata:\n  name: x\n---\nkind: Pod\nspec:\n  containers:\n  - image: nginx\n")
                .unwrap();
        let output = replace_documents(documents, &host()).unwrap();

        let parsed = parse_documents(&output).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].get("kind").is_none());
        assert!(output.contains("111111111111.dkr.ecr.us-east-1.amazonaws.com/nginx"));
        assert!(!output.starts_with("---"));
    }

    #[test]
    fn empty_stream_renders_nothing() {
        assert_eq!(replace_documents(Vec::new(), &host()).unwrap(), "");
    }
}
