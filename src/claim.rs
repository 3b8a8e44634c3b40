//! Helpers for shaping claims and the volume back-reference.

use k8s_openapi::Resource;
use k8s_openapi::api::core::v1::{ObjectReference, PersistentVolumeClaim, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use k8s_openapi::chrono::Utc;

/// Lifecycle phase reported in a claim's status.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClaimPhase {
    /// The claim is not yet bound to a volume.
    Pending,
    /// The claim is bound to a volume and usable.
    Bound,
    /// The claim lost its underlying volume.
    Lost,
}

impl ClaimPhase {
    /// Parses the phase string used by the API server.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(Self::Pending),
            "Bound" => Some(Self::Bound),
            "Lost" => Some(Self::Lost),
            _ => None,
        }
    }

    /// Returns the phase string used by the API server.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Bound => "Bound",
            Self::Lost => "Lost",
        }
    }

    /// Reads the phase of a claim, if the server reported one.
    #[must_use]
    pub fn of(claim: &PersistentVolumeClaim) -> Option<Self> {
        claim
            .status
            .as_ref()
            .and_then(|status| status.phase.as_deref())
            .and_then(Self::parse)
    }
}

/// Returns the name of the volume a claim is bound to, if any.
#[must_use]
pub fn volume_name(claim: &PersistentVolumeClaim) -> Option<&str> {
    claim
        .spec
        .as_ref()
        .and_then(|spec| spec.volume_name.as_deref())
        .filter(|name| !name.is_empty())
}

/// Builds the replacement for `source` under a new identity.
///
/// The spec payload, labels, and annotations are copied verbatim. Server-owned
/// identity (UID, resource version, self-link) and status are cleared so the
/// API server treats the object as new.
#[must_use]
pub fn replacement_claim(
    source: &PersistentVolumeClaim,
    name: &str,
    namespace: &str,
) -> PersistentVolumeClaim {
    let mut claim = source.clone();
    claim.metadata.name = Some(name.to_owned());
    claim.metadata.namespace = Some(namespace.to_owned());
    claim.metadata.uid = None;
    claim.metadata.resource_version = None;
    claim.metadata.self_link = None;
    claim.metadata.creation_timestamp = Some(Time(Utc::now()));
    claim.status = None;
    claim
}

/// Builds the volume back-reference pointing at `claim`.
///
/// Typed objects do not carry their type metadata, so kind and API version
/// come from the resource definition.
#[must_use]
pub fn claim_reference(claim: &PersistentVolumeClaim) -> ObjectReference {
    ObjectReference {
        api_version: Some(PersistentVolumeClaim::API_VERSION.to_owned()),
        kind: Some(PersistentVolumeClaim::KIND.to_owned()),
        namespace: claim.metadata.namespace.clone(),
        name: claim.metadata.name.clone(),
        uid: claim.metadata.uid.clone(),
        resource_version: claim.metadata.resource_version.clone(),
        field_path: None,
    }
}

/// Returns `true` when any volume of `pod` mounts the named claim.
#[must_use]
pub fn mounts_claim(pod: &Pod, claim_name: &str) -> bool {
    pod.spec.as_ref().is_some_and(|spec| {
        spec.volumes.iter().flatten().any(|volume| {
            volume
                .persistent_volume_claim
                .as_ref()
                .is_some_and(|source| source.claim_name == claim_name)
        })
    })
}
