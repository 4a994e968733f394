//! Multi-document YAML manifest files

use std::path::Path;

use serde::Deserialize;

use crate::error::ManifestError;
use crate::node::ManifestNode;

/// Separator written between documents
pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// Parse every document of a YAML stream
///
/// Empty documents (`---` with nothing after it) are dropped.
///
/// # Errors
/// `ManifestError::Parse` on the first document that is not valid YAML.
pub fn parse_documents(content: &str) -> Result<Vec<ManifestNode>, ManifestError> {
    let mut documents = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(content) {
        let node = ManifestNode::deserialize(doc).map_err(ManifestError::Parse)?;
        if !node.is_null() {
            documents.push(node);
        }
    }
    tracing::debug!(documents = documents.len(), "parsed manifest stream");
    Ok(documents)
}

/// Read and parse a manifest file
///
/// # Errors
/// `ManifestError::Io` if the file cannot be read, otherwise as [`parse_documents`].
pub fn read_documents(path: impl AsRef<Path>) -> Result<Vec<ManifestNode>, ManifestError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_documents(&content)
}

/// Serialize a single document
///
/// # Errors
/// `ManifestError::Serialize` if the document cannot be emitted as YAML.
pub fn render_document(document: &ManifestNode) -> Result<String, ManifestError> {
    serde_yaml::to_string(document).map_err(ManifestError::Serialize)
}

/// Serialize documents in order, separated by `---`
///
/// # Errors
/// As [`render_document`].
pub fn render_documents<'a>(
    documents: impl IntoIterator<Item = &'a ManifestNode>,
) -> Result<String, ManifestError> {
    let rendered = documents
        .into_iter()
        .map(render_document)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(join_documents(&rendered))
}

/// Join already-rendered documents with `---` separators
#[must_use]
pub fn join_documents(rendered: &[String]) -> String {
    rendered.join(DOCUMENT_SEPARATOR)
}
