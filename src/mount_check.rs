//! Pre-flight check that refuses to rename a claim a pod is using.
//!
//! The check is a snapshot, not a lock: a pod scheduled after the listing
//! can still mount the claim before it is deleted.

use k8s_openapi::api::core::v1::Pod;
use thiserror::Error;
use tracing::debug;

use crate::claim::mounts_claim;
use crate::cluster::{ClusterClient, ClusterError};

/// Errors raised by [`ensure_not_mounted`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum MountCheckError {
    /// A pod references the claim.
    #[error("claim '{claim}' is currently mounted in pod '{workload}'")]
    InUse {
        /// Claim being checked.
        claim: String,
        /// First pod found mounting it.
        workload: String,
    },
    /// Listing pods failed.
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Returns the name of the first pod, in listing order, that mounts the claim.
#[must_use]
pub fn first_mounting_workload<'a>(pods: &'a [Pod], claim_name: &str) -> Option<&'a str> {
    pods.iter()
        .find(|pod| mounts_claim(pod, claim_name))
        .map(|pod| pod.metadata.name.as_deref().unwrap_or_default())
}

/// Fails when any pod in `namespace` mounts the claim `claim_name`.
///
/// # Errors
///
/// Returns [`MountCheckError::InUse`] naming the first mounting pod, or
/// [`MountCheckError::Cluster`] when the pod listing fails.
pub async fn ensure_not_mounted<C>(
    client: &C,
    namespace: &str,
    claim_name: &str,
) -> Result<(), MountCheckError>
where
    C: ClusterClient + ?Sized,
{
    let pods = client.list_workloads(namespace).await?;
    debug!(namespace, claim = claim_name, pods = pods.len(), "checking pod mounts");

    match first_mounting_workload(&pods, claim_name) {
        Some(workload) => Err(MountCheckError::InUse {
            claim: claim_name.to_owned(),
            workload: workload.to_owned(),
        }),
        None => Ok(()),
    }
}
