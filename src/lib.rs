//! Core library for the `rename-pvc` tool.
//!
//! A PersistentVolumeClaim cannot be renamed in place. The crate recreates
//! the claim under a new name, moves the bound volume over to it, and deletes
//! the old claim once the new one is bound. Cluster access sits behind the
//! [`ClusterClient`] trait so the workflow runs unchanged against a real
//! cluster or the in-memory double in [`test_support`].

pub mod cancel;
pub mod claim;
pub mod cluster;
pub mod config;
pub mod confirm;
pub mod logging;
pub mod mount_check;
pub mod poller;
pub mod rename;
pub mod request;
pub mod test_support;

pub use cancel::{Cancelled, run_cancellable};
pub use cluster::{ClusterClient, ClusterError, ClusterFuture, ConnectOptions, KubeClient};
pub use config::{ConfigError, RenameConfig};
pub use confirm::{ConfirmError, confirm};
pub use logging::{LoggingError, init_logging};
pub use mount_check::{MountCheckError, ensure_not_mounted};
pub use poller::{BoundPoller, PollError, PollSettings};
pub use rename::{
    Progress, RenameError, RenameFailure, RenameOrchestrator, RenameOutcome, RenameStage,
};
pub use request::{RenameRequest, RenameRequestBuilder, RequestError};
