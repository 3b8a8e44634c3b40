//! Error types for the rename workflow.

use std::fmt;

use thiserror::Error;

use crate::cancel::Cancelled;
use crate::cluster::ClusterError;
use crate::confirm::ConfirmError;
use crate::mount_check::MountCheckError;
use crate::poller::PollError;

use super::RenameStage;

/// Errors that abort a rename.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum RenameError {
    /// The operator answered no.
    #[error("confirmation was not successful, please type yes to continue")]
    ConfirmationDeclined,
    /// The operator answered something other than yes or no.
    #[error("unrecognised answer '{answer}', please type yes or no")]
    ConfirmationUnrecognized {
        /// Normalised answer that was read.
        answer: String,
    },
    /// The confirmation prompt could not be written or read.
    #[error("failed to prompt for confirmation: {0}")]
    Prompt(String),
    /// A pod mounts the source claim.
    #[error("volume currently mounted: claim '{claim}' is used by pod '{workload}'")]
    ClaimInUse {
        /// Source claim name.
        claim: String,
        /// First pod found mounting it.
        workload: String,
    },
    /// A claim the workflow needs does not exist.
    #[error("claim '{name}' not found in namespace '{namespace}'")]
    ClaimNotFound {
        /// Namespace that was searched.
        namespace: String,
        /// Claim name.
        name: String,
    },
    /// The source claim does not name a volume, so there is nothing to rebind.
    #[error("claim '{name}' in namespace '{namespace}' is not bound to a volume")]
    ClaimNotBound {
        /// Namespace of the claim.
        namespace: String,
        /// Claim name.
        name: String,
    },
    /// The replacement name is already taken.
    #[error("claim '{name}' already exists in namespace '{namespace}'")]
    ClaimAlreadyExists {
        /// Target namespace.
        namespace: String,
        /// Target name.
        name: String,
    },
    /// The volume named by the source claim does not exist.
    #[error("volume '{name}' not found")]
    VolumeNotFound {
        /// Volume name.
        name: String,
    },
    /// The replacement never reported `Bound`.
    #[error("new claim '{name}' in namespace '{namespace}' did not get bound after {attempts} checks")]
    BindTimeout {
        /// Target namespace.
        namespace: String,
        /// Target name.
        name: String,
        /// Number of reads performed.
        attempts: u32,
    },
    /// The run was cancelled.
    #[error("rename cancelled")]
    Cancelled,
    /// Any other cluster failure, passed through unchanged.
    #[error(transparent)]
    Cluster(#[from] ClusterError),
}

impl RenameError {
    /// Maps a claim lookup failure, turning not-found into
    /// [`RenameError::ClaimNotFound`].
    pub(crate) fn claim_lookup(err: ClusterError, namespace: &str, name: &str) -> Self {
        if err.is_not_found() {
            Self::ClaimNotFound {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            }
        } else {
            Self::Cluster(err)
        }
    }

    /// Maps a claim creation failure, turning a collision into
    /// [`RenameError::ClaimAlreadyExists`].
    pub(crate) fn claim_create(err: ClusterError, namespace: &str, name: &str) -> Self {
        if err.is_already_exists() {
            Self::ClaimAlreadyExists {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            }
        } else {
            Self::Cluster(err)
        }
    }

    /// Maps a volume failure, turning not-found into
    /// [`RenameError::VolumeNotFound`].
    pub(crate) fn volume_lookup(err: ClusterError, name: &str) -> Self {
        if err.is_not_found() {
            Self::VolumeNotFound {
                name: name.to_owned(),
            }
        } else {
            Self::Cluster(err)
        }
    }
}

impl From<Cancelled> for RenameError {
    fn from(_: Cancelled) -> Self {
        Self::Cancelled
    }
}

impl From<ConfirmError> for RenameError {
    fn from(value: ConfirmError) -> Self {
        match value {
            ConfirmError::Declined => Self::ConfirmationDeclined,
            ConfirmError::Unrecognized { answer } => Self::ConfirmationUnrecognized { answer },
            ConfirmError::Io(message) => Self::Prompt(message),
        }
    }
}

impl From<MountCheckError> for RenameError {
    fn from(value: MountCheckError) -> Self {
        match value {
            MountCheckError::InUse { claim, workload } => Self::ClaimInUse { claim, workload },
            MountCheckError::Cluster(err) => Self::Cluster(err),
        }
    }
}

impl From<PollError> for RenameError {
    fn from(value: PollError) -> Self {
        match value {
            PollError::BindTimeout {
                namespace,
                name,
                attempts,
            } => Self::BindTimeout {
                namespace,
                name,
                attempts,
            },
            PollError::Cancelled(_) => Self::Cancelled,
            PollError::Cluster(err) => Self::Cluster(err),
        }
    }
}

/// A failed rename together with the last stage that completed.
///
/// Nothing is rolled back. Once the replacement exists the message says so,
/// because the operator has to inspect both claims.
#[derive(Debug, Eq, PartialEq)]
pub struct RenameFailure {
    /// Last stage that completed before the failure.
    pub reached: RenameStage,
    /// Cause of the failure.
    pub error: RenameError,
}

impl fmt::Display for RenameFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.reached >= RenameStage::ReplacementCreated {
            write!(
                f,
                "{} (stopped after: {}; the new claim was left in place)",
                self.error, self.reached
            )
        } else {
            write!(f, "{}", self.error)
        }
    }
}

impl std::error::Error for RenameFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
