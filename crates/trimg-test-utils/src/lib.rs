//! Testing utilities for the trimg workspace
//!
//! Manifest fixtures and an in-memory registry client.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use trimg_manifest::{ImageReference, ManifestNode};
use trimg_transfer::{RegistryClient, RegistryCredentials, RegistryError, TransferStep};

pub const TEST_ACCOUNT: &str = "111111111111";
pub const TEST_REGION: &str = "us-east-1";
pub const TEST_HOST: &str = "111111111111.dkr.ecr.us-east-1.amazonaws.com";

pub const DEPLOYMENT: &str = r"apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
  labels:
    app: web
spec:
  replicas: 2
  selector:
    matchLabels:
      app: web
  template:
    metadata:
      labels:
        app: web
    spec:
      initContainers:
      - name: init
        image: initImage:latest
      containers:
      - name: nginx
        image: nginx:latest
        ports:
        - containerPort: 80
      - name: sidecar
        image: nginx:latest
";

pub const POD: &str = r"apiVersion: v1
kind: Pod
metadata:
  name: nginx
spec:
  containers:
  - name: nginx
    image: nginx
";

pub const JOB: &str = r#"apiVersion: batch/v1
kind: Job
metadata:
  name: pi
spec:
  backoffLimit: 4
  template:
    spec:
      restartPolicy: Never
      containers:
      - name: pi
        image: perl
        command: ["perl", "-Mbignum=bpi", "-wle", "print bpi(2000)"]
"#;

pub const CRON_JOB: &str = r"apiVersion: batch/v1
kind: CronJob
metadata:
  name: cleanup
spec:
  schedule: '*/5 * * * *'
  jobTemplate:
    spec:
      template:
        spec:
          initContainers:
          - name: wait
            image: busybox:1.36
          containers:
          - name: cache
            image: redis:7
          restartPolicy: OnFailure
";

pub const CONFIG_MAP: &str = r"apiVersion: v1
kind: ConfigMap
metadata:
  name: settings
data:
  image: not-a-container-image
";

pub const NO_KIND: &str = r"apiVersion: v1
metadata:
  name: anonymous
";

/// Parse a single-document fixture
pub fn manifest(yaml: &str) -> ManifestNode {
    let mut documents = trimg_manifest::parse_documents(yaml).unwrap();
    assert_eq!(documents.len(), 1, "fixture must hold exactly one document");
    documents.remove(0)
}

/// Join fixtures into one multi-document stream
pub fn multi_document(fixtures: &[&str]) -> String {
    fixtures.join("---\n")
}

/// One call received by [`FakeRegistry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    Pull(String),
    EnsureRepository(String),
    Authenticate,
    Tag { source: String, destination: String },
    Push(String),
}

/// In-memory registry client
///
/// Records every call, fails chosen steps for chosen images, and tracks
/// how many calls were in flight at once.
#[derive(Debug, Default)]
pub struct FakeRegistry {
    calls: Mutex<Vec<RegistryCall>>,
    failures: Vec<(String, TransferStep)>,
    existing: HashSet<String>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail `step` for transfers whose reference or repository is `image`
    pub fn failing(mut self, image: &str, step: TransferStep) -> Self {
        self.failures.push((image.to_string(), step));
        self
    }

    /// Treat `repository` as already created
    pub fn with_existing_repository(mut self, repository: &str) -> Self {
        self.existing.insert(repository.to_string());
        self
    }

    /// Sleep this long inside every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Highest number of simultaneous calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn fails(&self, subject: &str, step: TransferStep) -> bool {
        self.failures
            .iter()
            .any(|(image, failing)| *failing == step && image == subject)
    }

    async fn record(&self, call: RegistryCall) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().push(call);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }

    fn rejected(step: TransferStep, subject: &str) -> RegistryError {
        RegistryError::Rejected(format!("{step} rejected for {subject}"))
    }
}

#[async_trait::async_trait]
impl RegistryClient for FakeRegistry {
    async fn pull(&self, reference: &str, _image: &ImageReference) -> Result<(), RegistryError> {
        self.record(RegistryCall::Pull(reference.to_string())).await;
        if self.fails(reference, TransferStep::Pull) {
            return Err(Self::rejected(TransferStep::Pull, reference));
        }
        Ok(())
    }

    async fn ensure_repository(&self, repository: &str) -> Result<(), RegistryError> {
        self.record(RegistryCall::EnsureRepository(repository.to_string()))
            .await;
        if self.fails(repository, TransferStep::EnsureRepository) {
            return Err(Self::rejected(TransferStep::EnsureRepository, repository));
        }
        if self.existing.contains(repository) {
            return Err(RegistryError::RepositoryAlreadyExists(repository.to_string()));
        }
        Ok(())
    }

    async fn authenticate(&self) -> Result<RegistryCredentials, RegistryError> {
        self.record(RegistryCall::Authenticate).await;
        Ok(RegistryCredentials::new(
            "AWS",
            "password",
            format!("https://{TEST_HOST}"),
        ))
    }

    async fn tag(&self, source: &str, destination: &str) -> Result<(), RegistryError> {
        self.record(RegistryCall::Tag {
            source: source.to_string(),
            destination: destination.to_string(),
        })
        .await;
        if self.fails(source, TransferStep::Tag) {
            return Err(Self::rejected(TransferStep::Tag, source));
        }
        Ok(())
    }

    async fn push(
        &self,
        destination: &str,
        _credentials: &RegistryCredentials,
    ) -> Result<(), RegistryError> {
        self.record(RegistryCall::Push(destination.to_string())).await;
        let source = destination
            .strip_prefix(TEST_HOST)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(destination);
        if self.fails(source, TransferStep::Push) {
            return Err(Self::rejected(TransferStep::Push, source));
        }
        Ok(())
    }
}
