//! Resource client abstraction over the cluster API.
//!
//! The rename workflow only needs a handful of request/response calls against
//! claims, volumes, and pods. [`ClusterClient`] captures that surface so the
//! orchestrator can run against the real API server or an in-memory double.

mod error;
mod kubernetes;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Pod};

pub use error::ClusterError;
pub use kubernetes::{ConnectOptions, KubeClient};

/// Future returned by cluster operations.
pub type ClusterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClusterError>> + Send + 'a>>;

/// Resource kinds touched by the rename workflow.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    /// A namespaced `PersistentVolumeClaim`.
    Claim,
    /// A cluster-scoped `PersistentVolume`.
    Volume,
    /// A namespaced `Pod`.
    Workload,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Claim => "PersistentVolumeClaim",
            Self::Volume => "PersistentVolume",
            Self::Workload => "Pod",
        };
        f.write_str(label)
    }
}

/// Capability set the rename workflow consumes.
///
/// Errors are classified into [`ClusterError`] so callers can tell a missing
/// resource from a naming collision without inspecting transport details.
pub trait ClusterClient {
    /// Fetches a claim by namespace and name.
    fn get_claim<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> ClusterFuture<'a, PersistentVolumeClaim>;

    /// Creates a claim and returns the object as stored by the server.
    fn create_claim<'a>(
        &'a self,
        namespace: &'a str,
        claim: &'a PersistentVolumeClaim,
    ) -> ClusterFuture<'a, PersistentVolumeClaim>;

    /// Deletes a claim by namespace and name.
    fn delete_claim<'a>(&'a self, namespace: &'a str, name: &'a str) -> ClusterFuture<'a, ()>;

    /// Fetches a cluster-scoped volume by name.
    fn get_volume<'a>(&'a self, name: &'a str) -> ClusterFuture<'a, PersistentVolume>;

    /// Replaces a volume with the supplied object.
    fn update_volume<'a>(
        &'a self,
        volume: &'a PersistentVolume,
    ) -> ClusterFuture<'a, PersistentVolume>;

    /// Lists every pod in a namespace.
    fn list_workloads<'a>(&'a self, namespace: &'a str) -> ClusterFuture<'a, Vec<Pod>>;
}
