//! Progress notifications written after each cluster mutation.

use std::fmt;

/// One completed mutation step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Progress {
    /// The replacement claim was created.
    ReplacementCreated {
        /// Replacement claim name.
        claim: String,
    },
    /// The volume's back-reference now names the replacement.
    VolumeRebound {
        /// Volume name.
        volume: String,
        /// Replacement claim name.
        claim: String,
    },
    /// The replacement reported `Bound`.
    ReplacementBound {
        /// Replacement claim name.
        claim: String,
        /// Volume name.
        volume: String,
    },
    /// The source claim was deleted.
    SourceDeleted {
        /// Source claim name.
        claim: String,
    },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReplacementCreated { claim } => {
                write!(f, "New PVC with name '{claim}' created")
            }
            Self::VolumeRebound { volume, claim } => {
                write!(f, "ClaimRef of PV '{volume}' is updated to new PVC '{claim}'")
            }
            Self::ReplacementBound { claim, volume } => {
                write!(f, "New PVC '{claim}' is bound to PV '{volume}'")
            }
            Self::SourceDeleted { claim } => write!(f, "Old PVC '{claim}' is deleted"),
        }
    }
}
