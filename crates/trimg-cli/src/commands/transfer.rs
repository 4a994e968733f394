//! `trimg transfer`: copy images into ECR

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use trimg_manifest::{get_using_images, read_documents, RegistryHost};
use trimg_transfer::{dedup, plan, ProgressSink, RegistryClient, TransferOrchestrator};

use crate::config::{ImageSource, TransferConfig};
use crate::progress::spawn_renderer;

/// Header printed before a dry-run listing
pub const DRY_RUN_HEADER: &str = "following images will be transfer";

/// Images named by `source`, deduplicated in first-seen order
///
/// # Errors
/// Fails if the manifest cannot be read or any document's images cannot be
/// located.
pub fn collect_images(source: &ImageSource) -> anyhow::Result<Vec<String>> {
    let images = match source {
        ImageSource::Arguments(images) => images.clone(),
        ImageSource::ManifestFile(path) => {
            let documents = read_documents(path)
                .with_context(|| format!("failed to load manifest {}", path.display()))?;
            let mut images = Vec::new();
            for document in &documents {
                images.extend(get_using_images(document)?);
            }
            images
        }
    };
    Ok(dedup(images))
}

/// Transfer, or with `dry_run` only list, every image of `config.source`
///
/// Individual transfer failures are listed in the report written to `out`;
/// they do not make this function fail.
///
/// # Errors
/// Fails if the images cannot be collected or `out` cannot be written.
pub async fn execute(
    config: &TransferConfig,
    host: &RegistryHost,
    registry: Arc<dyn RegistryClient>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let images = collect_images(&config.source)?;

    if config.dry_run {
        writeln!(out, "{DRY_RUN_HEADER}")?;
        for entry in plan(images, host) {
            writeln!(out, "{entry}")?;
        }
        return Ok(());
    }

    info!(images = images.len(), %host, "transferring images");
    let orchestrator = TransferOrchestrator::new(registry, host.clone())
        .with_max_concurrency(config.max_concurrency);

    let report = if config.show_progress {
        let (sink, events) = ProgressSink::channel();
        let renderer = spawn_renderer(events);
        let report = orchestrator.run(images, &sink).await;
        drop(sink);
        let _ = renderer.await;
        report
    } else {
        orchestrator.run(images, &ProgressSink::disabled()).await
    };

    for line in report.lines() {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argument_images_are_deduplicated() {
        let source = ImageSource::Arguments(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(collect_images(&source).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn unreadable_manifest_is_an_error() {
        let source = ImageSource::ManifestFile("/nonexistent/trimg/manifest.yaml".into());
        let err = collect_images(&source).unwrap_err();
        assert!(err.to_string().contains("failed to load manifest"));
    }
}
