//! Transfer orchestration
//!
//! One independent task per unique image, each running five steps in order:
//! pull, create the destination repository, authenticate, tag, push.
//!
//! # Invariants
//!
//! - The input is deduplicated first, keeping first-seen order
//! - A failing step ends that task only; sibling tasks keep running
//! - At most `max_concurrency` tasks talk to the registry at once
//! - The report holds one entry per unique image, in input order,
//!   regardless of the order tasks complete in

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use trimg_manifest::{rewrite, ImageReference, RegistryHost};

use crate::error::{RegistryError, TransferError, TransferStepFailure};
use crate::progress::{ProgressKind, ProgressSink};
use crate::registry::RegistryClient;

/// Default number of transfers allowed to run at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Steps of a single image transfer, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStep {
    Pull,
    EnsureRepository,
    Authenticate,
    Tag,
    Push,
}

impl TransferStep {
    /// All steps in execution order
    pub const ALL: [Self; 5] = [
        Self::Pull,
        Self::EnsureRepository,
        Self::Authenticate,
        Self::Tag,
        Self::Push,
    ];

    /// Number of steps per transfer
    pub const COUNT: usize = Self::ALL.len();
}

impl Display for TransferStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pull => "pull",
            Self::EnsureRepository => "create repository",
            Self::Authenticate => "authenticate",
            Self::Tag => "tag",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// Result of one image transfer
#[derive(Debug)]
pub enum TransferOutcome {
    /// Image now lives at `destination`
    Success { destination: String },
    /// Transfer stopped at a step
    Failure(TransferStepFailure),
}

impl TransferOutcome {
    /// Whether the transfer succeeded
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// One image's transfer and its outcome
#[derive(Debug)]
pub struct TransferTask {
    /// Image reference as given
    pub image: String,
    /// Position in the deduplicated input
    pub index: usize,
    pub outcome: TransferOutcome,
}

impl TransferTask {
    /// One-line human summary
    #[must_use]
    pub fn summary(&self) -> String {
        match &self.outcome {
            TransferOutcome::Success { destination } => {
                format!("{} transfer to {}", self.image, destination)
            }
            TransferOutcome::Failure(failure) => format!(
                "{} failed to transfer. step: {}, error message: {}",
                self.image, failure.step, failure.cause
            ),
        }
    }
}

/// Outcomes of a transfer run, in deduplicated input order
#[derive(Debug, Default)]
pub struct TransferReport {
    tasks: Vec<TransferTask>,
}

impl TransferReport {
    /// All tasks
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &[TransferTask] {
        &self.tasks
    }

    /// Number of tasks
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no image was transferred
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Tasks that succeeded
    pub fn successes(&self) -> impl Iterator<Item = &TransferTask> {
        self.tasks.iter().filter(|t| t.outcome.is_success())
    }

    /// Tasks that failed
    pub fn failures(&self) -> impl Iterator<Item = &TransferTask> {
        self.tasks.iter().filter(|t| !t.outcome.is_success())
    }

    /// Numbered summary lines, starting at 1
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.tasks
            .iter()
            .map(|task| format!("{}: {}", task.index + 1, task.summary()))
            .collect()
    }
}

/// Would-be destination of an image, for dry runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    pub source: String,
    pub destination: String,
}

impl Display for TransferPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}

/// Drop repeated images, keeping the first occurrence of each
///
/// # Examples
/// `["a", "b", "a", "c"]` → `["a", "b", "c"]`
#[must_use]
pub fn dedup<I, S>(images: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = HashSet::new();
    images
        .into_iter()
        .map(Into::into)
        .filter(|image: &String| seen.insert(image.clone()))
        .collect()
}

/// Destinations for each unique image without contacting any registry
#[must_use]
pub fn plan<I, S>(images: I, host: &RegistryHost) -> Vec<TransferPlan>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    dedup(images)
        .into_iter()
        .map(|source| TransferPlan {
            destination: rewrite(&source, host),
            source,
        })
        .collect()
}

/// Runs image transfers against a registry client
pub struct TransferOrchestrator {
    registry: Arc<dyn RegistryClient>,
    host: RegistryHost,
    max_concurrency: usize,
}

impl TransferOrchestrator {
    /// Create orchestrator pushing into `host`
    #[must_use]
    pub fn new(registry: Arc<dyn RegistryClient>, host: RegistryHost) -> Self {
        Self {
            registry,
            host,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// With concurrency limit (at least 1)
    #[inline]
    #[must_use]
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    /// Concurrency limit
    #[inline]
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Transfer every unique image and wait for all of them
    ///
    /// Never fails as a whole: each image's failure is carried in its own
    /// [`TransferOutcome`].
    pub async fn run<I, S>(&self, images: I, progress: &ProgressSink) -> TransferReport
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let images = dedup(images);
        let total = images.len();
        if total == 0 {
            return TransferReport::default();
        }
        info!(images = total, max_concurrency = self.max_concurrency, "starting transfers");

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let (results_tx, mut results_rx) = mpsc::channel::<TransferTask>(total);
        let trackers: Vec<Arc<AtomicUsize>> = (0..total).map(|_| Arc::default()).collect();
        let mut workers = JoinSet::new();

        for (index, image) in images.iter().enumerate() {
            let worker = Worker {
                registry: Arc::clone(&self.registry),
                host: self.host.clone(),
                progress: progress.clone(),
                completed: Arc::clone(&trackers[index]),
                index,
                image: image.clone(),
            };
            let semaphore = Arc::clone(&semaphore);
            let results_tx = results_tx.clone();

            workers.spawn(async move {
                // The semaphore is never closed, so acquiring only waits.
                let _permit = semaphore.acquire_owned().await;
                let task = worker.run().await;
                // Capacity equals the task count; every worker sends once.
                let _ = results_tx.send(task).await;
            });
        }
        drop(results_tx);

        // Wait for all workers before reading any result.
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "transfer worker ended abnormally");
            }
        }

        let mut slots: Vec<Option<TransferTask>> = (0..total).map(|_| None).collect();
        while let Some(task) = results_rx.recv().await {
            let index = task.index;
            slots[index] = Some(task);
        }

        let tasks: Vec<TransferTask> = slots
            .into_iter()
            .zip(images)
            .enumerate()
            .map(|(index, (slot, image))| {
                slot.unwrap_or_else(|| {
                    let completed = trackers[index].load(Ordering::SeqCst);
                    let step = TransferStep::ALL[completed.min(TransferStep::COUNT - 1)];
                    progress.emit(index, &image, ProgressKind::Finished { success: false });
                    TransferTask {
                        outcome: TransferOutcome::Failure(TransferStepFailure::new(
                            step,
                            TransferError::TaskAborted(image.clone()),
                        )),
                        image,
                        index,
                    }
                })
            })
            .collect();

        let report = TransferReport { tasks };
        info!(
            succeeded = report.successes().count(),
            failed = report.failures().count(),
            "transfers finished"
        );
        report
    }
}

/// State owned by one transfer task
struct Worker {
    registry: Arc<dyn RegistryClient>,
    host: RegistryHost,
    progress: ProgressSink,
    completed: Arc<AtomicUsize>,
    index: usize,
    image: String,
}

impl Worker {
    async fn run(self) -> TransferTask {
        self.progress.emit(
            self.index,
            &self.image,
            ProgressKind::Started {
                total: TransferStep::COUNT,
            },
        );

        let outcome = match self.steps().await {
            Ok(destination) => {
                info!(image = %self.image, %destination, "transfer succeeded");
                TransferOutcome::Success { destination }
            }
            Err(failure) => {
                warn!(image = %self.image, step = %failure.step, error = %failure.cause, "transfer failed");
                TransferOutcome::Failure(failure)
            }
        };

        self.progress.emit(
            self.index,
            &self.image,
            ProgressKind::Finished {
                success: outcome.is_success(),
            },
        );

        TransferTask {
            image: self.image,
            index: self.index,
            outcome,
        }
    }

    /// Run the five steps, stopping at the first failure
    async fn steps(&self) -> Result<String, TransferStepFailure> {
        let registry = self.registry.as_ref();
        let image = self.image.as_str();

        let reference = ImageReference::split(image)
            .map_err(|e| TransferStepFailure::new(TransferStep::Pull, e))?;

        registry
            .pull(image, &reference)
            .await
            .map_err(|e| TransferStepFailure::new(TransferStep::Pull, e))?;
        self.complete(TransferStep::Pull);

        match registry.ensure_repository(&reference.repository).await {
            Ok(()) => {}
            Err(RegistryError::RepositoryAlreadyExists(repository)) => {
                debug!(%repository, "destination repository already exists");
            }
            Err(e) => return Err(TransferStepFailure::new(TransferStep::EnsureRepository, e)),
        }
        self.complete(TransferStep::EnsureRepository);

        let credentials = registry
            .authenticate()
            .await
            .map_err(|e| TransferStepFailure::new(TransferStep::Authenticate, e))?;
        self.complete(TransferStep::Authenticate);

        let destination = rewrite(image, &self.host);
        registry
            .tag(image, &destination)
            .await
            .map_err(|e| TransferStepFailure::new(TransferStep::Tag, e))?;
        self.complete(TransferStep::Tag);

        registry
            .push(&destination, &credentials)
            .await
            .map_err(|e| TransferStepFailure::new(TransferStep::Push, e))?;
        self.complete(TransferStep::Push);

        Ok(destination)
    }

    fn complete(&self, step: TransferStep) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(image = %self.image, %step, completed, "transfer step completed");
        self.progress.emit(
            self.index,
            &self.image,
            ProgressKind::StepCompleted {
                step,
                completed,
                total: TransferStep::COUNT,
            },
        );
    }
}
