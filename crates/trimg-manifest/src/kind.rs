//! Workload kinds and where each keeps its pod spec

use std::fmt::{self, Display, Formatter};

use crate::path::ImagePath;

/// Kubernetes workload kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkloadKind {
    Deployment,
    ReplicaSet,
    StatefulSet,
    Job,
    Pod,
    CronJob,
    /// Any kind without containers of its own
    Other,
}

const TEMPLATE_POD_SPEC: &[&str] = &["spec", "template", "spec"];
const POD_SPEC: &[&str] = &["spec"];
const CRONJOB_POD_SPEC: &[&str] = &["spec", "jobTemplate", "spec", "template", "spec"];

/// Sibling keys under a pod spec holding container lists, in report order
pub const CONTAINER_LIST_KEYS: [&str; 2] = ["containers", "initContainers"];

impl WorkloadKind {
    /// Kind for a manifest's `kind` value; unknown kinds map to `Other`
    #[must_use]
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "Deployment" => Self::Deployment,
            "ReplicaSet" => Self::ReplicaSet,
            "StatefulSet" => Self::StatefulSet,
            "Job" => Self::Job,
            "Pod" => Self::Pod,
            "CronJob" => Self::CronJob,
            _ => Self::Other,
        }
    }

    /// Key path from the document root to the pod spec
    #[inline]
    #[must_use]
    pub fn pod_spec_keys(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Deployment | Self::ReplicaSet | Self::StatefulSet | Self::Job => {
                Some(TEMPLATE_POD_SPEC)
            }
            Self::Pod => Some(POD_SPEC),
            Self::CronJob => Some(CRONJOB_POD_SPEC),
            Self::Other => None,
        }
    }

    /// Path from the document root to the pod spec
    #[inline]
    #[must_use]
    pub fn pod_spec_path(self) -> Option<ImagePath> {
        self.pod_spec_keys().map(ImagePath::from_keys)
    }
}

impl Display for WorkloadKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deployment => "Deployment",
            Self::ReplicaSet => "ReplicaSet",
            Self::StatefulSet => "StatefulSet",
            Self::Job => "Job",
            Self::Pod => "Pod",
            Self::CronJob => "CronJob",
            Self::Other => "Other",
        };
        f.write_str(name)
    }
}
