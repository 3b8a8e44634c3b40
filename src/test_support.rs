//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use k8s_openapi::api::core::v1::{
    ObjectReference, PersistentVolume, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimStatus, PersistentVolumeClaimVolumeSource, PersistentVolumeSpec, Pod,
    PodSpec, Volume, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

use crate::claim::ClaimPhase;
use crate::cluster::{ClusterClient, ClusterError, ClusterFuture, ResourceKind};

/// Kinds of calls recorded by [`InMemoryCluster`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OperationKind {
    /// `get_claim`.
    GetClaim,
    /// `create_claim`.
    CreateClaim,
    /// `delete_claim`.
    DeleteClaim,
    /// `get_volume`.
    GetVolume,
    /// `update_volume`.
    UpdateVolume,
    /// `list_workloads`.
    ListWorkloads,
}

/// A single call recorded by [`InMemoryCluster`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Operation {
    /// Claim read.
    GetClaim {
        /// Namespace passed by the caller.
        namespace: String,
        /// Claim name passed by the caller.
        name: String,
    },
    /// Claim creation.
    CreateClaim {
        /// Namespace passed by the caller.
        namespace: String,
        /// Name of the submitted claim.
        name: String,
    },
    /// Claim deletion.
    DeleteClaim {
        /// Namespace passed by the caller.
        namespace: String,
        /// Claim name passed by the caller.
        name: String,
    },
    /// Volume read.
    GetVolume {
        /// Volume name passed by the caller.
        name: String,
    },
    /// Volume update.
    UpdateVolume {
        /// Name of the submitted volume.
        name: String,
    },
    /// Pod listing.
    ListWorkloads {
        /// Namespace passed by the caller.
        namespace: String,
    },
}

impl Operation {
    /// Returns the kind of this call.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::GetClaim { .. } => OperationKind::GetClaim,
            Self::CreateClaim { .. } => OperationKind::CreateClaim,
            Self::DeleteClaim { .. } => OperationKind::DeleteClaim,
            Self::GetVolume { .. } => OperationKind::GetVolume,
            Self::UpdateVolume { .. } => OperationKind::UpdateVolume,
            Self::ListWorkloads { .. } => OperationKind::ListWorkloads,
        }
    }
}

type ClaimKey = (String, String);

#[derive(Debug)]
struct State {
    claims: BTreeMap<ClaimKey, PersistentVolumeClaim>,
    volumes: BTreeMap<String, PersistentVolume>,
    pods: Vec<Pod>,
    operations: Vec<Operation>,
    failures: HashMap<OperationKind, ClusterError>,
    bind_after_reads: HashMap<ClaimKey, u32>,
    claim_reads: HashMap<ClaimKey, u32>,
    binding_controller: bool,
    next_uid: u64,
}

impl Default for State {
    fn default() -> Self {
        Self {
            claims: BTreeMap::new(),
            volumes: BTreeMap::new(),
            pods: Vec::new(),
            operations: Vec::new(),
            failures: HashMap::new(),
            bind_after_reads: HashMap::new(),
            claim_reads: HashMap::new(),
            binding_controller: true,
            next_uid: 1,
        }
    }
}

/// In-memory cluster double implementing [`ClusterClient`].
///
/// Records every call, supports per-operation failure injection, and by
/// default simulates the volume binding controller: when a volume's
/// back-reference is pointed at a claim whose `volumeName` names that volume,
/// the claim reports `Bound` from then on.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCluster {
    state: Arc<Mutex<State>>,
}

impl InMemoryCluster {
    /// Creates an empty cluster with the binding controller enabled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|err| panic!("in-memory cluster lock poisoned: {err}"))
    }

    /// Stores a claim, replacing any claim with the same namespace and name.
    pub fn insert_claim(&self, claim: PersistentVolumeClaim) {
        let key = claim_key(&claim);
        self.state().claims.insert(key, claim);
    }

    /// Stores a volume, replacing any volume with the same name.
    pub fn insert_volume(&self, volume: PersistentVolume) {
        let name = volume.metadata.name.clone().unwrap_or_default();
        self.state().volumes.insert(name, volume);
    }

    /// Appends a pod; listings preserve insertion order.
    pub fn insert_pod(&self, pod: Pod) {
        self.state().pods.push(pod);
    }

    /// Makes every call of `kind` fail with `error`.
    pub fn fail_on(&self, kind: OperationKind, error: ClusterError) {
        self.state().failures.insert(kind, error);
    }

    /// Disables the simulated binding controller so claims never bind on
    /// their own.
    pub fn disable_binding_controller(&self) {
        self.state().binding_controller = false;
    }

    /// Marks a claim as bound once it has been read more than `reads` times.
    pub fn bind_after_reads(&self, namespace: &str, name: &str, reads: u32) {
        self.state()
            .bind_after_reads
            .insert((namespace.to_owned(), name.to_owned()), reads);
    }

    /// Returns a stored claim.
    #[must_use]
    pub fn claim(&self, namespace: &str, name: &str) -> Option<PersistentVolumeClaim> {
        self.state()
            .claims
            .get(&(namespace.to_owned(), name.to_owned()))
            .cloned()
    }

    /// Returns a stored volume.
    #[must_use]
    pub fn volume(&self, name: &str) -> Option<PersistentVolume> {
        self.state().volumes.get(name).cloned()
    }

    /// Returns the volume's back-reference.
    #[must_use]
    pub fn volume_claim_ref(&self, name: &str) -> Option<ObjectReference> {
        self.volume(name)
            .and_then(|volume| volume.spec)
            .and_then(|spec| spec.claim_ref)
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    /// Counts recorded calls of `kind`.
    #[must_use]
    pub fn count(&self, kind: OperationKind) -> usize {
        self.state()
            .operations
            .iter()
            .filter(|op| op.kind() == kind)
            .count()
    }

    fn record(state: &mut State, operation: Operation) -> Result<(), ClusterError> {
        let kind = operation.kind();
        state.operations.push(operation);
        state.failures.get(&kind).cloned().map_or(Ok(()), Err)
    }

    fn read_claim(&self, namespace: &str, name: &str) -> Result<PersistentVolumeClaim, ClusterError> {
        let mut state = self.state();
        Self::record(
            &mut state,
            Operation::GetClaim {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            },
        )?;

        let key = (namespace.to_owned(), name.to_owned());
        let reads = {
            let counter = state.claim_reads.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        let threshold = state.bind_after_reads.get(&key).copied();
        let claim = state.claims.get_mut(&key).ok_or_else(|| ClusterError::NotFound {
            kind: ResourceKind::Claim,
            name: name.to_owned(),
        })?;
        if threshold.is_some_and(|limit| reads > limit) {
            set_phase(claim, ClaimPhase::Bound);
        }
        Ok(claim.clone())
    }

    fn store_claim(
        &self,
        namespace: &str,
        claim: &PersistentVolumeClaim,
    ) -> Result<PersistentVolumeClaim, ClusterError> {
        let mut state = self.state();
        let name = claim.metadata.name.clone().unwrap_or_default();
        Self::record(
            &mut state,
            Operation::CreateClaim {
                namespace: namespace.to_owned(),
                name: name.clone(),
            },
        )?;

        let key = (namespace.to_owned(), name.clone());
        if state.claims.contains_key(&key) {
            return Err(ClusterError::AlreadyExists {
                kind: ResourceKind::Claim,
                name,
            });
        }

        let mut stored = claim.clone();
        stored.metadata.namespace = Some(namespace.to_owned());
        stored.metadata.uid = Some(format!("uid-{}", state.next_uid));
        stored.metadata.resource_version = Some(String::from("1"));
        state.next_uid += 1;
        set_phase(&mut stored, ClaimPhase::Pending);
        state.claims.insert(key, stored.clone());
        Ok(stored)
    }

    fn remove_claim(&self, namespace: &str, name: &str) -> Result<(), ClusterError> {
        let mut state = self.state();
        Self::record(
            &mut state,
            Operation::DeleteClaim {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            },
        )?;

        state
            .claims
            .remove(&(namespace.to_owned(), name.to_owned()))
            .map(|_| ())
            .ok_or_else(|| ClusterError::NotFound {
                kind: ResourceKind::Claim,
                name: name.to_owned(),
            })
    }

    fn read_volume(&self, name: &str) -> Result<PersistentVolume, ClusterError> {
        let mut state = self.state();
        Self::record(
            &mut state,
            Operation::GetVolume {
                name: name.to_owned(),
            },
        )?;
        state
            .volumes
            .get(name)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound {
                kind: ResourceKind::Volume,
                name: name.to_owned(),
            })
    }

    fn replace_volume(&self, volume: &PersistentVolume) -> Result<PersistentVolume, ClusterError> {
        let mut state = self.state();
        let name = volume.metadata.name.clone().unwrap_or_default();
        Self::record(&mut state, Operation::UpdateVolume { name: name.clone() })?;

        if !state.volumes.contains_key(&name) {
            return Err(ClusterError::NotFound {
                kind: ResourceKind::Volume,
                name,
            });
        }

        let mut stored = volume.clone();
        let version = stored
            .metadata
            .resource_version
            .as_deref()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(0);
        stored.metadata.resource_version = Some((version + 1).to_string());

        if state.binding_controller {
            bind_referenced_claim(&mut state, &stored);
        }
        state.volumes.insert(name, stored.clone());
        Ok(stored)
    }

    fn pods_in(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        let mut state = self.state();
        Self::record(
            &mut state,
            Operation::ListWorkloads {
                namespace: namespace.to_owned(),
            },
        )?;
        Ok(state
            .pods
            .iter()
            .filter(|pod| pod.metadata.namespace.as_deref() == Some(namespace))
            .cloned()
            .collect())
    }
}

impl ClusterClient for InMemoryCluster {
    fn get_claim<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> ClusterFuture<'a, PersistentVolumeClaim> {
        Box::pin(async move { self.read_claim(namespace, name) })
    }

    fn create_claim<'a>(
        &'a self,
        namespace: &'a str,
        claim: &'a PersistentVolumeClaim,
    ) -> ClusterFuture<'a, PersistentVolumeClaim> {
        Box::pin(async move { self.store_claim(namespace, claim) })
    }

    fn delete_claim<'a>(&'a self, namespace: &'a str, name: &'a str) -> ClusterFuture<'a, ()> {
        Box::pin(async move { self.remove_claim(namespace, name) })
    }

    fn get_volume<'a>(&'a self, name: &'a str) -> ClusterFuture<'a, PersistentVolume> {
        Box::pin(async move { self.read_volume(name) })
    }

    fn update_volume<'a>(
        &'a self,
        volume: &'a PersistentVolume,
    ) -> ClusterFuture<'a, PersistentVolume> {
        Box::pin(async move { self.replace_volume(volume) })
    }

    fn list_workloads<'a>(&'a self, namespace: &'a str) -> ClusterFuture<'a, Vec<Pod>> {
        Box::pin(async move { self.pods_in(namespace) })
    }
}

fn claim_key(claim: &PersistentVolumeClaim) -> ClaimKey {
    (
        claim.metadata.namespace.clone().unwrap_or_default(),
        claim.metadata.name.clone().unwrap_or_default(),
    )
}

fn set_phase(claim: &mut PersistentVolumeClaim, phase: ClaimPhase) {
    claim
        .status
        .get_or_insert_with(PersistentVolumeClaimStatus::default)
        .phase = Some(phase.as_str().to_owned());
}

fn bind_referenced_claim(state: &mut State, volume: &PersistentVolume) {
    let Some(reference) = volume.spec.as_ref().and_then(|spec| spec.claim_ref.as_ref()) else {
        return;
    };
    let key = (
        reference.namespace.clone().unwrap_or_default(),
        reference.name.clone().unwrap_or_default(),
    );
    let volume_name = volume.metadata.name.as_deref();
    if let Some(claim) = state
        .claims
        .get_mut(&key)
        .filter(|claim| crate::claim::volume_name(claim) == volume_name)
    {
        set_phase(claim, ClaimPhase::Bound);
    }
}

fn claim_with_phase(
    namespace: &str,
    name: &str,
    volume: &str,
    phase: ClaimPhase,
) -> PersistentVolumeClaim {
    let mut requests = BTreeMap::new();
    requests.insert(String::from("storage"), Quantity(String::from("1Gi")));
    let mut claim = PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..ObjectMeta::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec![String::from("ReadWriteOnce")]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(requests),
                ..VolumeResourceRequirements::default()
            }),
            storage_class_name: Some(String::from("standard")),
            volume_name: Some(volume.to_owned()),
            ..PersistentVolumeClaimSpec::default()
        }),
        status: None,
    };
    set_phase(&mut claim, phase);
    claim
}

/// Builds a claim bound to `volume`.
#[must_use]
pub fn bound_claim(namespace: &str, name: &str, volume: &str) -> PersistentVolumeClaim {
    claim_with_phase(namespace, name, volume, ClaimPhase::Bound)
}

/// Builds a claim naming `volume` that has not bound yet.
#[must_use]
pub fn pending_claim(namespace: &str, name: &str, volume: &str) -> PersistentVolumeClaim {
    claim_with_phase(namespace, name, volume, ClaimPhase::Pending)
}

/// Builds a volume whose back-reference names the given claim.
#[must_use]
pub fn volume_bound_to(name: &str, claim_namespace: &str, claim_name: &str) -> PersistentVolume {
    PersistentVolume {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            resource_version: Some(String::from("10")),
            ..ObjectMeta::default()
        },
        spec: Some(PersistentVolumeSpec {
            claim_ref: Some(ObjectReference {
                kind: Some(String::from("PersistentVolumeClaim")),
                api_version: Some(String::from("v1")),
                namespace: Some(claim_namespace.to_owned()),
                name: Some(claim_name.to_owned()),
                ..ObjectReference::default()
            }),
            persistent_volume_reclaim_policy: Some(String::from("Retain")),
            ..PersistentVolumeSpec::default()
        }),
        status: None,
    }
}

/// Builds a pod that mounts `claim`.
#[must_use]
pub fn pod_mounting(namespace: &str, name: &str, claim: &str) -> Pod {
    let mut pod = pod_without_claims(namespace, name);
    if let Some(spec) = pod.spec.as_mut() {
        spec.volumes = Some(vec![Volume {
            name: String::from("data"),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: claim.to_owned(),
                read_only: None,
            }),
            ..Volume::default()
        }]);
    }
    pod
}

/// Builds a pod without claim volumes.
#[must_use]
pub fn pod_without_claims(namespace: &str, name: &str) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_owned()),
            namespace: Some(namespace.to_owned()),
            ..ObjectMeta::default()
        },
        spec: Some(PodSpec {
            volumes: Some(Vec::new()),
            ..PodSpec::default()
        }),
        status: None,
    }
}
