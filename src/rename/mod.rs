//! Orchestrates the rename of a claim.
//!
//! Claims cannot be renamed in place, so the workflow recreates the claim
//! under the new name and moves the volume over to it:
//!
//! 1. confirm with the operator,
//! 2. fetch the source claim and refuse if a pod mounts it,
//! 3. create the replacement claim with the same spec,
//! 4. point the volume's `claimRef` at the replacement,
//! 5. wait for the replacement to bind,
//! 6. delete the source claim.
//!
//! Steps never retry and nothing is rolled back. The source claim is only
//! deleted after the replacement reports `Bound`.

mod error;
mod progress;

use std::fmt;
use std::io::{BufRead, Write};

use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, PersistentVolumeSpec};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::cancel::run_cancellable;
use crate::claim::{claim_reference, replacement_claim, volume_name};
use crate::cluster::ClusterClient;
use crate::confirm::confirm;
use crate::mount_check::ensure_not_mounted;
use crate::poller::{BoundPoller, PollSettings};
use crate::request::RenameRequest;

pub use error::{RenameError, RenameFailure};
pub use progress::Progress;

/// Stages of a rename, in execution order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RenameStage {
    /// Nothing has happened yet.
    Init,
    /// The operator confirmed, or confirmation was skipped.
    Confirmed,
    /// The source claim was read.
    SourceFetched,
    /// No pod mounts the source claim.
    MountChecked,
    /// The replacement claim exists.
    ReplacementCreated,
    /// The volume's back-reference names the replacement.
    VolumeRebound,
    /// The replacement reported `Bound`.
    ReplacementBound,
    /// The source claim was deleted.
    SourceDeleted,
}

impl fmt::Display for RenameStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "init",
            Self::Confirmed => "confirmed",
            Self::SourceFetched => "source fetched",
            Self::MountChecked => "mount checked",
            Self::ReplacementCreated => "replacement created",
            Self::VolumeRebound => "volume rebound",
            Self::ReplacementBound => "replacement bound",
            Self::SourceDeleted => "source deleted",
        };
        f.write_str(label)
    }
}

/// Result of a completed rename.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenameOutcome {
    /// Name of the replacement claim.
    pub claim: String,
    /// Namespace of the replacement claim.
    pub namespace: String,
    /// Volume now bound to the replacement.
    pub volume: String,
    /// Final stage, always [`RenameStage::SourceDeleted`].
    pub reached: RenameStage,
}

/// Executes the rename workflow against a cluster client.
#[derive(Clone, Debug)]
pub struct RenameOrchestrator<C> {
    client: C,
    poller: BoundPoller,
}

impl<C> RenameOrchestrator<C>
where
    C: ClusterClient,
{
    /// Creates an orchestrator with the default bind wait.
    #[must_use]
    pub fn new(client: C) -> Self {
        Self {
            client,
            poller: BoundPoller::default(),
        }
    }

    /// Overrides the bind wait timing.
    #[must_use]
    pub const fn with_poll_settings(mut self, settings: PollSettings) -> Self {
        self.poller = BoundPoller::new(settings);
        self
    }

    /// Returns the cluster client.
    #[must_use]
    pub const fn client(&self) -> &C {
        &self.client
    }

    /// Runs the rename described by `request`.
    ///
    /// The confirmation prompt reads from `input` and writes to `output`.
    /// Each mutation writes one progress line to `output`. Every cluster
    /// call and every wait tick is raced against `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`RenameFailure`] carrying the first error and the last stage
    /// that completed. Completed steps are left as they are.
    pub async fn execute<R, W>(
        &self,
        request: &RenameRequest,
        input: &mut R,
        output: &mut W,
        cancel: &CancellationToken,
    ) -> Result<RenameOutcome, RenameFailure>
    where
        R: BufRead,
        W: Write,
    {
        let span = info_span!(
            "rename",
            source_namespace = %request.source_namespace,
            source = %request.source_name,
            target_namespace = %request.target_namespace,
            target = %request.target_name,
        );

        let mut stage = RenameStage::Init;
        let result = self
            .run(request, input, output, cancel, &mut stage)
            .instrument(span)
            .await;

        result.map_err(|error| {
            warn!(stage = %stage, %error, "rename failed");
            RenameFailure {
                reached: stage,
                error,
            }
        })
    }

    async fn run<R, W>(
        &self,
        request: &RenameRequest,
        input: &mut R,
        output: &mut W,
        cancel: &CancellationToken,
        stage: &mut RenameStage,
    ) -> Result<RenameOutcome, RenameError>
    where
        R: BufRead,
        W: Write,
    {
        confirm(request, input, output)?;
        *stage = RenameStage::Confirmed;

        let (source, volume) = self.fetch_source(request, cancel).await?;
        *stage = RenameStage::SourceFetched;

        run_cancellable(
            cancel,
            ensure_not_mounted(
                &self.client,
                &request.source_namespace,
                &request.source_name,
            ),
        )
        .await??;
        *stage = RenameStage::MountChecked;
        debug!("no pod mounts the source claim");

        let replacement = self.create_replacement(request, &source, cancel).await?;
        *stage = RenameStage::ReplacementCreated;
        notify(
            output,
            &Progress::ReplacementCreated {
                claim: request.target_name.clone(),
            },
        );

        self.rebind_volume(&volume, &replacement, cancel).await?;
        *stage = RenameStage::VolumeRebound;
        notify(
            output,
            &Progress::VolumeRebound {
                volume: volume.clone(),
                claim: request.target_name.clone(),
            },
        );

        self.poller
            .wait_until_bound(
                &self.client,
                &request.target_namespace,
                &request.target_name,
                cancel,
            )
            .await?;
        *stage = RenameStage::ReplacementBound;
        notify(
            output,
            &Progress::ReplacementBound {
                claim: request.target_name.clone(),
                volume: volume.clone(),
            },
        );

        run_cancellable(
            cancel,
            self.client
                .delete_claim(&request.source_namespace, &request.source_name),
        )
        .await?
        .map_err(|err| {
            RenameError::claim_lookup(err, &request.source_namespace, &request.source_name)
        })?;
        *stage = RenameStage::SourceDeleted;
        notify(
            output,
            &Progress::SourceDeleted {
                claim: request.source_name.clone(),
            },
        );

        Ok(RenameOutcome {
            claim: request.target_name.clone(),
            namespace: request.target_namespace.clone(),
            volume,
            reached: *stage,
        })
    }

    async fn fetch_source(
        &self,
        request: &RenameRequest,
        cancel: &CancellationToken,
    ) -> Result<(PersistentVolumeClaim, String), RenameError> {
        let namespace = &request.source_namespace;
        let name = &request.source_name;

        let source = run_cancellable(cancel, self.client.get_claim(namespace, name))
            .await?
            .map_err(|err| RenameError::claim_lookup(err, namespace, name))?;

        let volume = volume_name(&source)
            .ok_or_else(|| RenameError::ClaimNotBound {
                namespace: namespace.clone(),
                name: name.clone(),
            })?
            .to_owned();
        debug!(volume = %volume, "fetched source claim");
        Ok((source, volume))
    }

    async fn create_replacement(
        &self,
        request: &RenameRequest,
        source: &PersistentVolumeClaim,
        cancel: &CancellationToken,
    ) -> Result<PersistentVolumeClaim, RenameError> {
        let namespace = &request.target_namespace;
        let name = &request.target_name;
        let replacement = replacement_claim(source, name, namespace);

        run_cancellable(cancel, self.client.create_claim(namespace, &replacement))
            .await?
            .map_err(|err| RenameError::claim_create(err, namespace, name))
    }

    async fn rebind_volume(
        &self,
        name: &str,
        replacement: &PersistentVolumeClaim,
        cancel: &CancellationToken,
    ) -> Result<PersistentVolume, RenameError> {
        let mut volume = run_cancellable(cancel, self.client.get_volume(name))
            .await?
            .map_err(|err| RenameError::volume_lookup(err, name))?;

        volume
            .spec
            .get_or_insert_with(PersistentVolumeSpec::default)
            .claim_ref = Some(claim_reference(replacement));

        run_cancellable(cancel, self.client.update_volume(&volume))
            .await?
            .map_err(|err| RenameError::volume_lookup(err, name))
    }
}

fn notify<W: Write>(output: &mut W, event: &Progress) {
    info!(%event, "rename progress");
    writeln!(output, "{event}").ok();
}
