//! Decorating resource clients with per-call interceptors

use crate::operation::Operation;
use crate::resource::{
    CertificateSigningRequestInterface, KubeObject, MetadataInterface, NamespaceInterface,
    PodInterface, ResourceInterface, ScaleInterface, ServiceAccountInterface,
};
use async_trait::async_trait;
use either::Either;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use k8s_openapi::api::authentication::v1::TokenRequest;
use k8s_openapi::api::autoscaling::v1::Scale;
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use k8s_openapi::api::core::v1::{Binding, Namespace, Pod};
use kube::api::{
    Api, DeleteParams, EvictParams, ListParams, LogParams, ObjectList, Patch, PatchParams,
    PostParams, WatchEvent, WatchParams,
};
use kube::core::response::Status;
use kube::core::PartialObjectMeta;
use kube::{Client, Resource, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;

/// Wraps one in-flight client call.
///
/// Implementations must drive `call` to completion exactly once and hand its
/// output back unchanged.
pub trait Interceptor: Send + Sync {
    fn intercept<'a, T>(
        &'a self,
        operation: Operation,
        call: BoxFuture<'a, Result<T>>,
    ) -> BoxFuture<'a, Result<T>>
    where
        T: Send + 'a;
}

impl Interceptor for () {
    fn intercept<'a, T>(
        &'a self,
        _operation: Operation,
        call: BoxFuture<'a, Result<T>>,
    ) -> BoxFuture<'a, Result<T>>
    where
        T: Send + 'a,
    {
        call
    }
}

impl<I: Interceptor> Interceptor for Option<I> {
    fn intercept<'a, T>(
        &'a self,
        operation: Operation,
        call: BoxFuture<'a, Result<T>>,
    ) -> BoxFuture<'a, Result<T>>
    where
        T: Send + 'a,
    {
        match self {
            Some(interceptor) => interceptor.intercept(operation, call),
            None => call,
        }
    }
}

impl<I: Interceptor> Interceptor for Arc<I> {
    fn intercept<'a, T>(
        &'a self,
        operation: Operation,
        call: BoxFuture<'a, Result<T>>,
    ) -> BoxFuture<'a, Result<T>>
    where
        T: Send + 'a,
    {
        (**self).intercept(operation, call)
    }
}

/// `(outer, inner)`: the first interceptor wraps the second
impl<A: Interceptor, B: Interceptor> Interceptor for (A, B) {
    fn intercept<'a, T>(
        &'a self,
        operation: Operation,
        call: BoxFuture<'a, Result<T>>,
    ) -> BoxFuture<'a, Result<T>>
    where
        T: Send + 'a,
    {
        self.0.intercept(operation, self.1.intercept(operation, call))
    }
}

/// A resource client whose calls all pass through an interceptor
#[derive(Clone, Debug)]
pub struct Intercepted<R, I> {
    inner: R,
    interceptor: I,
}

impl<R, I> Intercepted<R, I> {
    pub fn new(inner: R, interceptor: I) -> Self {
        Self { inner, interceptor }
    }

    /// The wrapped client, bypassing interception
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn interceptor(&self) -> &I {
        &self.interceptor
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<K: Clone + Resource, I> Intercepted<Api<K>, I> {
    /// The underlying client, without instrumentation
    pub fn rest_client(&self) -> Client {
        self.inner.clone().into_client()
    }
}

#[async_trait]
impl<K, R, I> ResourceInterface<K> for Intercepted<R, I>
where
    K: KubeObject,
    R: ResourceInterface<K>,
    I: Interceptor,
{
    async fn get(&self, name: &str) -> Result<K> {
        self.interceptor
            .intercept(Operation::Get, self.inner.get(name))
            .await
    }

    async fn list(&self, lp: &ListParams) -> Result<ObjectList<K>> {
        self.interceptor
            .intercept(Operation::List, self.inner.list(lp))
            .await
    }

    async fn watch(
        &self,
        wp: &WatchParams,
        version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<K>>>> {
        self.interceptor
            .intercept(Operation::Watch, self.inner.watch(wp, version))
            .await
    }

    async fn create(&self, pp: &PostParams, data: &K) -> Result<K> {
        self.interceptor
            .intercept(Operation::Create, self.inner.create(pp, data))
            .await
    }

    async fn update(&self, name: &str, pp: &PostParams, data: &K) -> Result<K> {
        self.interceptor
            .intercept(Operation::Update, self.inner.update(name, pp, data))
            .await
    }

    async fn update_status(&self, name: &str, pp: &PostParams, data: &K) -> Result<K> {
        self.interceptor
            .intercept(Operation::UpdateStatus, self.inner.update_status(name, pp, data))
            .await
    }

    async fn patch<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.interceptor
            .intercept(Operation::Patch, self.inner.patch(name, pp, patch))
            .await
    }

    async fn patch_status<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.interceptor
            .intercept(Operation::PatchStatus, self.inner.patch_status(name, pp, patch))
            .await
    }

    async fn get_status(&self, name: &str) -> Result<K> {
        self.interceptor
            .intercept(Operation::GetStatus, self.inner.get_status(name))
            .await
    }

    async fn delete(&self, name: &str, dp: &DeleteParams) -> Result<Either<K, Status>> {
        self.interceptor
            .intercept(Operation::Delete, self.inner.delete(name, dp))
            .await
    }

    async fn delete_collection(
        &self,
        dp: &DeleteParams,
        lp: &ListParams,
    ) -> Result<Either<ObjectList<K>, Status>> {
        self.interceptor
            .intercept(Operation::DeleteCollection, self.inner.delete_collection(dp, lp))
            .await
    }

    async fn apply(&self, name: &str, pp: &PatchParams, data: &K) -> Result<K> {
        self.interceptor
            .intercept(Operation::Apply, self.inner.apply(name, pp, data))
            .await
    }

    async fn apply_status(&self, name: &str, pp: &PatchParams, data: &K) -> Result<K> {
        self.interceptor
            .intercept(Operation::ApplyStatus, self.inner.apply_status(name, pp, data))
            .await
    }

    fn resource_url(&self) -> String {
        self.inner.resource_url()
    }
}

#[async_trait]
impl<R, I> ScaleInterface for Intercepted<R, I>
where
    R: ScaleInterface,
    I: Interceptor,
{
    async fn get_scale(&self, name: &str) -> Result<Scale> {
        self.interceptor
            .intercept(Operation::GetScale, self.inner.get_scale(name))
            .await
    }

    async fn update_scale(&self, name: &str, pp: &PostParams, scale: &Scale) -> Result<Scale> {
        self.interceptor
            .intercept(Operation::UpdateScale, self.inner.update_scale(name, pp, scale))
            .await
    }

    async fn patch_scale<P>(&self, name: &str, pp: &PatchParams, patch: &Patch<P>) -> Result<Scale>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.interceptor
            .intercept(Operation::PatchScale, self.inner.patch_scale(name, pp, patch))
            .await
    }

    async fn apply_scale(&self, name: &str, pp: &PatchParams, scale: &Scale) -> Result<Scale> {
        self.interceptor
            .intercept(Operation::ApplyScale, self.inner.apply_scale(name, pp, scale))
            .await
    }
}

#[async_trait]
impl<R, I> PodInterface for Intercepted<R, I>
where
    R: PodInterface,
    I: Interceptor,
{
    async fn evict(&self, name: &str, ep: &EvictParams) -> Result<Status> {
        self.interceptor
            .intercept(Operation::Evict, self.inner.evict(name, ep))
            .await
    }

    async fn get_logs(&self, name: &str, lp: &LogParams) -> Result<String> {
        self.interceptor
            .intercept(Operation::GetLogs, self.inner.get_logs(name, lp))
            .await
    }

    async fn bind(&self, name: &str, pp: &PostParams, binding: &Binding) -> Result<Status> {
        self.interceptor
            .intercept(Operation::Bind, self.inner.bind(name, pp, binding))
            .await
    }

    async fn get_ephemeral_containers(&self, name: &str) -> Result<Pod> {
        self.interceptor
            .intercept(
                Operation::GetEphemeralContainers,
                self.inner.get_ephemeral_containers(name),
            )
            .await
    }

    async fn update_ephemeral_containers(&self, name: &str, pp: &PostParams, pod: &Pod) -> Result<Pod> {
        self.interceptor
            .intercept(
                Operation::UpdateEphemeralContainers,
                self.inner.update_ephemeral_containers(name, pp, pod),
            )
            .await
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
        self.interceptor
            .intercept(
                Operation::PatchEphemeralContainers,
                self.inner.patch_ephemeral_containers(name, pp, patch),
            )
            .await
    }

    /// Not intercepted
    async fn proxy_get(&self, scheme: &str, name: &str, port: &str, path: &str) -> Result<String> {
        self.inner.proxy_get(scheme, name, port, path).await
    }
}

#[async_trait]
impl<R, I> NamespaceInterface for Intercepted<R, I>
where
    R: NamespaceInterface,
    I: Interceptor,
{
    async fn finalize(&self, name: &str, pp: &PostParams, namespace: &Namespace) -> Result<Namespace> {
        self.interceptor
            .intercept(Operation::Finalize, self.inner.finalize(name, pp, namespace))
            .await
    }
}

#[async_trait]
impl<K, R, I> MetadataInterface<K> for Intercepted<R, I>
where
    K: KubeObject,
    R: MetadataInterface<K>,
    I: Interceptor,
{
    async fn get_metadata(&self, name: &str) -> Result<PartialObjectMeta<K>> {
        self.interceptor
            .intercept(Operation::GetMetadata, self.inner.get_metadata(name))
            .await
    }

    async fn list_metadata(&self, lp: &ListParams) -> Result<ObjectList<PartialObjectMeta<K>>> {
        self.interceptor
            .intercept(Operation::ListMetadata, self.inner.list_metadata(lp))
            .await
    }

    async fn watch_metadata(
        &self,
        wp: &WatchParams,
        version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<PartialObjectMeta<K>>>>> {
        self.interceptor
            .intercept(Operation::WatchMetadata, self.inner.watch_metadata(wp, version))
            .await
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
        self.interceptor
            .intercept(Operation::PatchMetadata, self.inner.patch_metadata(name, pp, patch))
            .await
    }
}

#[async_trait]
impl<R, I> CertificateSigningRequestInterface for Intercepted<R, I>
where
    R: CertificateSigningRequestInterface,
    I: Interceptor,
{
    async fn get_approval(&self, name: &str) -> Result<CertificateSigningRequest> {
        self.interceptor
            .intercept(Operation::GetApproval, self.inner.get_approval(name))
            .await
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
        self.interceptor
            .intercept(Operation::UpdateApproval, self.inner.update_approval(name, pp, patch))
            .await
    }
}

#[async_trait]
impl<R, I> ServiceAccountInterface for Intercepted<R, I>
where
    R: ServiceAccountInterface,
    I: Interceptor,
{
    async fn create_token(
        &self,
        name: &str,
        pp: &PostParams,
        token_request: &TokenRequest,
    ) -> Result<TokenRequest> {
        self.interceptor
            .intercept(Operation::CreateToken, self.inner.create_token(name, pp, token_request))
            .await
    }
}
