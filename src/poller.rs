//! Bounded wait for a claim to reach the `Bound` phase.
//!
//! Binding is performed asynchronously by the cluster's volume controller, so
//! the attempt budget is a heuristic timeout rather than a guarantee.

use std::time::Duration;

use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use thiserror::Error;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cancel::{Cancelled, run_cancellable};
use crate::claim::ClaimPhase;
use crate::cluster::{ClusterClient, ClusterError};

/// Delay between two reads of the claim.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Number of reads before giving up.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 60;

/// Timing used by [`BoundPoller`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollSettings {
    /// Delay between two reads.
    pub interval: Duration,
    /// Maximum number of reads.
    pub attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

/// Errors raised while waiting for a claim to bind.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum PollError {
    /// The claim never reported `Bound`.
    #[error("claim '{name}' in namespace '{namespace}' did not get bound after {attempts} checks")]
    BindTimeout {
        /// Namespace of the claim.
        namespace: String,
        /// Name of the claim.
        name: String,
        /// Number of reads performed.
        attempts: u32,
    },
    /// The run was cancelled while waiting.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    /// Reading the claim failed.
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

/// Re-reads a claim until it binds, the budget runs out, or the run is
/// cancelled.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BoundPoller {
    settings: PollSettings,
}

impl BoundPoller {
    /// Creates a poller with the given timing.
    #[must_use]
    pub const fn new(settings: PollSettings) -> Self {
        Self { settings }
    }

    /// Returns the timing used by this poller.
    #[must_use]
    pub const fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Waits for the claim to report `Bound` and returns it.
    ///
    /// Sleeps only between reads. Both the reads and the sleeps are raced
    /// against `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::BindTimeout`] when the budget runs out,
    /// [`PollError::Cancelled`] when `cancel` fires, and
    /// [`PollError::Cluster`] when a read fails.
    pub async fn wait_until_bound<C>(
        &self,
        client: &C,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<PersistentVolumeClaim, PollError>
    where
        C: ClusterClient + ?Sized,
    {
        let attempts = self.settings.attempts;
        for attempt in 1..=attempts {
            let claim = run_cancellable(cancel, client.get_claim(namespace, name)).await??;
            let phase = ClaimPhase::of(&claim);
            if phase == Some(ClaimPhase::Bound) {
                return Ok(claim);
            }
            debug!(
                namespace,
                claim = name,
                attempt,
                phase = phase.map_or("unknown", ClaimPhase::as_str),
                "claim not bound yet"
            );

            if attempt < attempts {
                run_cancellable(cancel, sleep(self.settings.interval)).await?;
            }
        }

        Err(PollError::BindTimeout {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            attempts,
        })
    }
}
