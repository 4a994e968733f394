//! Subcommands against manifest files and an in-memory registry

use std::io::Write;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use trimg_cli::commands::{replace, transfer};
use trimg_cli::{ImageSource, TransferConfig};
use trimg_manifest::{get_using_images, parse_documents, RegistryHost};
use trimg_test_utils::{
    multi_document, FakeRegistry, CONFIG_MAP, DEPLOYMENT, NO_KIND, POD, TEST_ACCOUNT, TEST_HOST,
    TEST_REGION,
};
use trimg_transfer::{RegistryClient, TransferStep};

fn host() -> RegistryHost {
    RegistryHost::ecr(TEST_ACCOUNT, TEST_REGION)
}

fn manifest_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

async fn run_transfer(config: TransferConfig, registry: &Arc<FakeRegistry>) -> String {
    let mut out: Vec<u8> = Vec::new();
    transfer::execute(
        &config.with_progress(false),
        &host(),
        Arc::clone(registry) as Arc<dyn RegistryClient>,
        &mut out,
    )
    .await
    .unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_replace_rewrites_workloads_and_keeps_other_documents() {
    let file = manifest_file(&multi_document(&[DEPLOYMENT, CONFIG_MAP, NO_KIND]));
    let output = replace::execute(file.path(), &host()).unwrap();

    let documents = parse_documents(&output).unwrap();
    assert_eq!(documents.len(), 3);
    assert_eq!(
        get_using_images(&documents[0]).unwrap(),
        vec![
            format!("{TEST_HOST}/nginx:latest"),
            format!("{TEST_HOST}/nginx:latest"),
            format!("{TEST_HOST}/initImage:latest"),
        ]
    );
    assert_eq!(documents[1], parse_documents(CONFIG_MAP).unwrap()[0]);
    assert_eq!(documents[2], parse_documents(NO_KIND).unwrap()[0]);
    assert_eq!(output.matches("---\n").count(), 2);
}

#[test]
fn test_replace_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(replace::execute(&dir.path().join("absent.yaml"), &host()).is_err());
}

#[tokio::test]
async fn test_dry_run_lists_unique_images_without_transferring() {
    let registry = Arc::new(FakeRegistry::new());
    let config = TransferConfig::new(ImageSource::Arguments(vec![
        "nginx:latest".into(),
        "redis".into(),
        "nginx:latest".into(),
    ]))
    .with_dry_run(true);

    let output = run_transfer(config, &registry).await;
    assert_eq!(
        output,
        format!(
            "following images will be transfer\nnginx:latest -> {TEST_HOST}/nginx:latest\nredis -> {TEST_HOST}/redis\n"
        )
    );
    assert_eq!(registry.call_count(), 0);
}

#[tokio::test]
async fn test_transfer_from_manifest_reports_each_unique_image() {
    let file = manifest_file(&multi_document(&[DEPLOYMENT, POD, CONFIG_MAP]));
    let registry = Arc::new(FakeRegistry::new().failing("initImage:latest", TransferStep::Pull));
    let config = TransferConfig::new(ImageSource::ManifestFile(file.path().to_path_buf()));

    let output = run_transfer(config, &registry).await;
    let lines: Vec<String> = output.lines().map(str::to_string).collect();
    assert_eq!(
        lines,
        vec![
            format!("1: nginx:latest transfer to {TEST_HOST}/nginx:latest"),
            "2: initImage:latest failed to transfer. step: pull, error message: pull rejected for initImage:latest".to_string(),
            format!("3: nginx transfer to {TEST_HOST}/nginx"),
        ]
    );
}

#[tokio::test]
async fn test_manifest_without_kind_stops_transfer() {
    let file = manifest_file(&multi_document(&[POD, NO_KIND]));
    let registry = Arc::new(FakeRegistry::new());
    let config = TransferConfig::new(ImageSource::ManifestFile(file.path().to_path_buf()));

    let mut out: Vec<u8> = Vec::new();
    let result = transfer::execute(
        &config.with_progress(false),
        &host(),
        Arc::clone(&registry) as Arc<dyn RegistryClient>,
        &mut out,
    )
    .await;

    assert!(result.is_err());
    assert_eq!(registry.call_count(), 0);
}
