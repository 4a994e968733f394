//! trimg transfer pipeline
//!
//! Moves container images into a private ECR registry. Each unique image
//! is pulled, its destination repository created, the registry logged
//! into, the image retagged and pushed. Transfers run concurrently and
//! fail independently.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trimg_manifest::RegistryHost;
//! use trimg_transfer::{DockerCliRegistry, ProgressSink, TransferOrchestrator};
//!
//! # async fn example() {
//! let host = RegistryHost::ecr("123456789012", "us-east-1");
//! let registry = Arc::new(DockerCliRegistry::new("us-east-1", host.clone()));
//! let orchestrator = TransferOrchestrator::new(registry, host).with_max_concurrency(2);
//!
//! let report = orchestrator
//!     .run(["nginx:1.19", "redis"], &ProgressSink::disabled())
//!     .await;
//! for line in report.lines() {
//!     println!("{line}");
//! }
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod command;
pub mod docker;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod progress;
pub mod registry;

pub use docker::DockerCliRegistry;
pub use error::{CommandError, IdentityError, RegistryError, TransferError, TransferStepFailure};
pub use identity::{AwsCliIdentity, IdentityResolver, StaticIdentity};
pub use orchestrator::{
    dedup, plan, TransferOrchestrator, TransferOutcome, TransferPlan, TransferReport,
    TransferStep, TransferTask, DEFAULT_MAX_CONCURRENCY,
};
pub use progress::{ProgressEvent, ProgressKind, ProgressSink};
pub use registry::{RegistryClient, RegistryCredentials};
