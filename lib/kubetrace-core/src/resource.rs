//! Typed resource clients
//!
//! `ResourceInterface` is the verb set every wrapped resource exposes. The
//! extension traits cover subresources that only some kinds have. All of them
//! are implemented for `kube::Api`, which performs the actual requests.

use async_trait::async_trait;
use either::Either;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::authentication::v1::TokenRequest;
use k8s_openapi::api::autoscaling::v1::Scale;
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use k8s_openapi::api::core::v1::{Binding, Namespace, Pod, ReplicationController, ServiceAccount};
use kube::api::{
    Api, DeleteParams, EvictParams, ListParams, LogParams, ObjectList, Patch, PatchParams,
    PostParams, WatchEvent, WatchParams,
};
use kube::core::response::Status;
use kube::core::PartialObjectMeta;
use kube::{Resource, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Bounds shared by every object a resource client reads or writes
pub trait KubeObject: Clone + Serialize + DeserializeOwned + Debug + Send + Sync + 'static {}

impl<T> KubeObject for T where T: Clone + Serialize + DeserializeOwned + Debug + Send + Sync + 'static
{}

/// Verbs available on every typed resource client
#[async_trait]
pub trait ResourceInterface<K: KubeObject>: Send + Sync {
    async fn get(&self, name: &str) -> Result<K>;

    async fn list(&self, lp: &ListParams) -> Result<ObjectList<K>>;

    /// Open a watch starting at `version`
    async fn watch(
        &self,
        wp: &WatchParams,
        version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<K>>>>;

    async fn create(&self, pp: &PostParams, data: &K) -> Result<K>;

    /// Replace the whole object
    async fn update(&self, name: &str, pp: &PostParams, data: &K) -> Result<K>;

    /// Replace the status subresource
    async fn update_status(&self, name: &str, pp: &PostParams, data: &K) -> Result<K>;

    async fn patch<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync;

    async fn patch_status<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync;

    async fn get_status(&self, name: &str) -> Result<K>;

    async fn delete(&self, name: &str, dp: &DeleteParams) -> Result<Either<K, Status>>;

    async fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> Result<Either<ObjectList<K>, Status>>;

    /// Server-side apply; `pp` must carry a field manager
    async fn apply(&self, name: &str, pp: &PatchParams, data: &K) -> Result<K>;

    async fn apply_status(&self, name: &str, pp: &PatchParams, data: &K) -> Result<K>;

    /// URL path of the collection this client targets
    fn resource_url(&self) -> String;
}

/// The scale subresource of workload kinds
#[async_trait]
pub trait ScaleInterface: Send + Sync {
    async fn get_scale(&self, name: &str) -> Result<Scale>;

    async fn update_scale(&self, name: &str, pp: &PostParams, scale: &Scale) -> Result<Scale>;

    async fn patch_scale<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<Scale>
    where
        P: Serialize + Debug + Send + Sync;

    async fn apply_scale(&self, name: &str, pp: &PatchParams, scale: &Scale) -> Result<Scale>;
}

/// Pod-only subresources
#[async_trait]
pub trait PodInterface: Send + Sync {
    async fn evict(&self, name: &str, ep: &EvictParams) -> Result<Status>;

    async fn get_logs(&self, name: &str, lp: &LogParams) -> Result<String>;

    /// Bind the pod to a node
    async fn bind(&self, name: &str, pp: &PostParams, binding: &Binding) -> Result<Status>;

    async fn get_ephemeral_containers(&self, name: &str) -> Result<Pod>;

    async fn update_ephemeral_containers(&self, name: &str, pp: &PostParams, pod: &Pod) -> Result<Pod>;

    async fn patch_ephemeral_containers<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<Pod>
    where
        P: Serialize + Debug + Send + Sync;

    /// GET through the API server proxy to `[scheme:]name[:port]/path`
    async fn proxy_get(&self, scheme: &str, name: &str, port: &str, path: &str) -> Result<String>;
}

/// The finalize subresource of namespaces
#[async_trait]
pub trait NamespaceInterface: Send + Sync {
    async fn finalize(&self, name: &str, pp: &PostParams, namespace: &Namespace) -> Result<Namespace>;
}

/// Verbs that read and patch object metadata only
#[async_trait]
pub trait MetadataInterface<K: KubeObject>: Send + Sync {
    async fn get_metadata(&self, name: &str) -> Result<PartialObjectMeta<K>>;

    async fn list_metadata(&self, lp: &ListParams) -> Result<ObjectList<PartialObjectMeta<K>>>;

    async fn watch_metadata(
        &self,
        wp: &WatchParams,
        version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<PartialObjectMeta<K>>>>>;

    async fn patch_metadata<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<PartialObjectMeta<K>>
    where
        P: Serialize + Debug + Send + Sync;
}

/// The approval subresource of certificate signing requests
#[async_trait]
pub trait CertificateSigningRequestInterface: Send + Sync {
    async fn get_approval(&self, name: &str) -> Result<CertificateSigningRequest>;

    async fn update_approval<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<CertificateSigningRequest>
    where
        P: Serialize + Debug + Send + Sync;
}

/// Token requests for service accounts
#[async_trait]
pub trait ServiceAccountInterface: Send + Sync {
    async fn create_token(
        &self,
        name: &str,
        pp: &PostParams,
        token_request: &TokenRequest,
    ) -> Result<TokenRequest>;
}

#[async_trait]
impl<K: KubeObject + Resource> ResourceInterface<K> for Api<K> {
    async fn get(&self, name: &str) -> Result<K> {
        Api::get(self, name).await
    }

    async fn list(&self, lp: &ListParams) -> Result<ObjectList<K>> {
        Api::list(self, lp).await
    }

    async fn watch(
        &self,
        wp: &WatchParams,
        version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<K>>>> {
        Api::watch(self, wp, version).await.map(StreamExt::boxed)
    }

    async fn create(&self, pp: &PostParams, data: &K) -> Result<K> {
        Api::create(self, pp, data).await
    }

    async fn update(&self, name: &str, pp: &PostParams, data: &K) -> Result<K> {
        Api::replace(self, name, pp, data).await
    }

    async fn update_status(&self, name: &str, pp: &PostParams, data: &K) -> Result<K> {
        let body = serde_json::to_vec(data).map_err(kube::Error::SerdeError)?;
        Api::replace_status(self, name, pp, body).await
    }

    async fn patch<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        Api::patch(self, name, pp, patch).await
    }

    async fn patch_status<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        Api::patch_status(self, name, pp, patch).await
    }

    async fn get_status(&self, name: &str) -> Result<K> {
        Api::get_status(self, name).await
    }

    async fn delete(&self, name: &str, dp: &DeleteParams) -> Result<Either<K, Status>> {
        Api::delete(self, name, dp).await
    }

    async fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> Result<Either<ObjectList<K>, Status>> {
        Api::delete_collection(self, dp, lp).await
    }

    async fn apply(&self, name: &str, pp: &PatchParams, data: &K) -> Result<K> {
        Api::patch(self, name, pp, &Patch::Apply(data)).await
    }

    async fn apply_status(&self, name: &str, pp: &PatchParams, data: &K) -> Result<K> {
        Api::patch_status(self, name, pp, &Patch::Apply(data)).await
    }

    fn resource_url(&self) -> String {
        Api::resource_url(self).to_string()
    }
}

macro_rules! impl_scale_interface {
    ($($kind:ty),* $(,)?) => {
        $(
            #[async_trait]
            impl ScaleInterface for Api<$kind> {
                async fn get_scale(&self, name: &str) -> Result<Scale> {
                    Api::get_scale(self, name).await
                }

                async fn update_scale(
                    &self,
                    name: &str,
                    pp: &PostParams,
                    scale: &Scale,
                ) -> Result<Scale> {
                    let body = serde_json::to_vec(scale).map_err(kube::Error::SerdeError)?;
                    Api::replace_scale(self, name, pp, body).await
                }

                async fn patch_scale<P>(
                    &self,
                    name: &str,
                    pp: &PatchParams,
                    patch: &Patch<P>,
                ) -> Result<Scale>
                where
                    P: Serialize + Debug + Send + Sync,
                {
                    Api::patch_scale(self, name, pp, patch).await
                }

                async fn apply_scale(
                    &self,
                    name: &str,
                    pp: &PatchParams,
                    scale: &Scale,
                ) -> Result<Scale> {
                    Api::patch_scale(self, name, pp, &Patch::Apply(scale)).await
                }
            }
        )*
    };
}

impl_scale_interface!(Deployment, ReplicaSet, StatefulSet, ReplicationController);

#[async_trait]
impl PodInterface for Api<Pod> {
    async fn evict(&self, name: &str, ep: &EvictParams) -> Result<Status> {
        Api::evict(self, name, ep).await
    }

    async fn get_logs(&self, name: &str, lp: &LogParams) -> Result<String> {
        Api::logs(self, name, lp).await
    }

    async fn bind(&self, name: &str, pp: &PostParams, binding: &Binding) -> Result<Status> {
        let body = serde_json::to_vec(binding).map_err(kube::Error::SerdeError)?;
        Api::create_subresource(self, "binding", name, pp, body).await
    }

    async fn get_ephemeral_containers(&self, name: &str) -> Result<Pod> {
        Api::get_ephemeral_containers(self, name).await
    }

    async fn update_ephemeral_containers(&self, name: &str, pp: &PostParams, pod: &Pod) -> Result<Pod> {
        Api::replace_ephemeral_containers(self, name, pp, pod).await
    }

    async fn patch_ephemeral_containers<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<Pod>
    where
        P: Serialize + Debug + Send + Sync,
    {
        Api::patch_ephemeral_containers(self, name, pp, patch).await
    }

    async fn proxy_get(&self, scheme: &str, name: &str, port: &str, path: &str) -> Result<String> {
        let url = format!(
            "{}/{}/proxy/{}",
            Api::resource_url(self),
            join_scheme_name_port(scheme, name, port),
            path.trim_start_matches('/')
        );
        let request = http::Request::get(url)
            .body(Vec::new())
            .map_err(kube::Error::HttpError)?;
        self.clone().into_client().request_text(request).await
    }
}

/// Proxy target in the `[scheme:]name[:port]` form the API server expects
pub fn join_scheme_name_port(scheme: &str, name: &str, port: &str) -> String {
    if !scheme.is_empty() {
        return format!("{}:{}:{}", scheme, name, port);
    }
    if !port.is_empty() {
        return format!("{}:{}", name, port);
    }
    name.to_string()
}

#[async_trait]
impl NamespaceInterface for Api<Namespace> {
    async fn finalize(&self, name: &str, pp: &PostParams, namespace: &Namespace) -> Result<Namespace> {
        let body = serde_json::to_vec(namespace).map_err(kube::Error::SerdeError)?;
        Api::replace_subresource(self, "finalize", name, pp, body).await
    }
}

#[async_trait]
impl<K: KubeObject + Resource> MetadataInterface<K> for Api<K> {
    async fn get_metadata(&self, name: &str) -> Result<PartialObjectMeta<K>> {
        Api::get_metadata(self, name).await
    }

    async fn list_metadata(&self, lp: &ListParams) -> Result<ObjectList<PartialObjectMeta<K>>> {
        Api::list_metadata(self, lp).await
    }

    async fn watch_metadata(
        &self,
        wp: &WatchParams,
        version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<PartialObjectMeta<K>>>>> {
        Api::watch_metadata(self, wp, version)
            .await
            .map(StreamExt::boxed)
    }

    async fn patch_metadata<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<PartialObjectMeta<K>>
    where
        P: Serialize + Debug + Send + Sync,
    {
        Api::patch_metadata(self, name, pp, patch).await
    }
}

#[async_trait]
impl CertificateSigningRequestInterface for Api<CertificateSigningRequest> {
    async fn get_approval(&self, name: &str) -> Result<CertificateSigningRequest> {
        Api::get_approval(self, name).await
    }

    async fn update_approval<P>(
        &self,
        name: &str,
        pp: &PatchParams,
        patch: &Patch<P>,
    ) -> Result<CertificateSigningRequest>
    where
        P: Serialize + Debug + Send + Sync,
    {
        Api::patch_approval(self, name, pp, patch).await
    }
}

#[async_trait]
impl ServiceAccountInterface for Api<ServiceAccount> {
    async fn create_token(
        &self,
        name: &str,
        pp: &PostParams,
        token_request: &TokenRequest,
    ) -> Result<TokenRequest> {
        Api::create_token_request(self, name, pp, token_request).await
    }
}
