//! `kube`-backed implementation of [`ClusterClient`].

use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim, Pod};
use kube::api::{Api, DeleteParams, ListParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use tracing::debug;

use super::{ClusterClient, ClusterError, ClusterFuture, ResourceKind};

/// Kubeconfig selection used when connecting to the cluster.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConnectOptions {
    /// Explicit kubeconfig path. When absent the default discovery applies
    /// (`KUBECONFIG`, `~/.kube/config`, or the in-cluster service account).
    pub kubeconfig: Option<String>,
    /// Kubeconfig context to use instead of the current context.
    pub context: Option<String>,
}

/// Resource client that talks to a Kubernetes API server.
#[derive(Clone)]
pub struct KubeClient {
    client: Client,
}

impl KubeClient {
    /// Wraps an existing `kube` client.
    #[must_use]
    pub const fn new(client: Client) -> Self {
        Self { client }
    }

    /// Loads a kubeconfig and builds a client for it.
    ///
    /// Returns the client together with the default namespace of the selected
    /// context so callers can fall back to it when no namespace was given.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Config`] when the kubeconfig cannot be read or
    /// the client cannot be constructed from it.
    pub async fn connect(options: &ConnectOptions) -> Result<(Self, String), ClusterError> {
        let kube_options = KubeConfigOptions {
            context: options.context.clone(),
            cluster: None,
            user: None,
        };

        let config = match (&options.kubeconfig, &options.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path)?;
                Config::from_custom_kubeconfig(kubeconfig, &kube_options).await?
            }
            (None, Some(_)) => Config::from_kubeconfig(&kube_options).await?,
            (None, None) => Config::infer()
                .await
                .map_err(|err| ClusterError::Config(err.to_string()))?,
        };

        let namespace = config.default_namespace.clone();
        debug!(cluster_url = %config.cluster_url, namespace = %namespace, "loaded kubeconfig");
        let client =
            Client::try_from(config).map_err(|err| ClusterError::Config(err.to_string()))?;
        Ok((Self::new(client), namespace))
    }

    fn claims(&self, namespace: &str) -> Api<PersistentVolumeClaim> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn volumes(&self) -> Api<PersistentVolume> {
        Api::all(self.client.clone())
    }
}

impl ClusterClient for KubeClient {
    fn get_claim<'a>(
        &'a self,
        namespace: &'a str,
        name: &'a str,
    ) -> ClusterFuture<'a, PersistentVolumeClaim> {
        Box::pin(async move {
            self.claims(namespace)
                .get(name)
                .await
                .map_err(|err| ClusterError::from_kube(err, ResourceKind::Claim, name))
        })
    }

    fn create_claim<'a>(
        &'a self,
        namespace: &'a str,
        claim: &'a PersistentVolumeClaim,
    ) -> ClusterFuture<'a, PersistentVolumeClaim> {
        Box::pin(async move {
            let name = claim.metadata.name.as_deref().unwrap_or_default();
            self.claims(namespace)
                .create(&PostParams::default(), claim)
                .await
                .map_err(|err| ClusterError::from_kube(err, ResourceKind::Claim, name))
        })
    }

    fn delete_claim<'a>(&'a self, namespace: &'a str, name: &'a str) -> ClusterFuture<'a, ()> {
        Box::pin(async move {
            self.claims(namespace)
                .delete(name, &DeleteParams::default())
                .await
                .map(|_| ())
                .map_err(|err| ClusterError::from_kube(err, ResourceKind::Claim, name))
        })
    }

    fn get_volume<'a>(&'a self, name: &'a str) -> ClusterFuture<'a, PersistentVolume> {
        Box::pin(async move {
            self.volumes()
                .get(name)
                .await
                .map_err(|err| ClusterError::from_kube(err, ResourceKind::Volume, name))
        })
    }

    fn update_volume<'a>(
        &'a self,
        volume: &'a PersistentVolume,
    ) -> ClusterFuture<'a, PersistentVolume> {
        Box::pin(async move {
            let name = volume.metadata.name.as_deref().unwrap_or_default();
            self.volumes()
                .replace(name, &PostParams::default(), volume)
                .await
                .map_err(|err| ClusterError::from_kube(err, ResourceKind::Volume, name))
        })
    }

    fn list_workloads<'a>(&'a self, namespace: &'a str) -> ClusterFuture<'a, Vec<Pod>> {
        Box::pin(async move {
            Api::<Pod>::namespaced(self.client.clone(), namespace)
                .list(&ListParams::default())
                .await
                .map(|list| list.items)
                .map_err(|err| ClusterError::from_kube(err, ResourceKind::Workload, namespace))
        })
    }
}
