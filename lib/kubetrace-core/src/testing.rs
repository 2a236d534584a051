//! Test doubles for resource clients and span assertions

use crate::operation::Operation;
use crate::resource::{
    join_scheme_name_port, CertificateSigningRequestInterface, KubeObject, MetadataInterface,
    NamespaceInterface, PodInterface, ResourceInterface, ServiceAccountInterface,
};
use async_trait::async_trait;
use either::Either;
use futures::stream::{self, BoxStream, StreamExt};
use k8s_openapi::api::authentication::v1::TokenRequest;
use k8s_openapi::api::certificates::v1::CertificateSigningRequest;
use k8s_openapi::api::core::v1::{Binding, Namespace, Pod, ServiceAccount};
use kube::api::{
    DeleteParams, EvictParams, ListParams, LogParams, ObjectList, Patch, PatchParams, PostParams,
    WatchEvent, WatchParams,
};
use kube::core::response::Status;
use kube::core::PartialObjectMeta;
use kube::error::ErrorResponse;
use kube::{Resource, Result};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Span, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// One call observed by a `RecordingClient`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub name: Option<String>,
    /// Name of the span that was current when the call ran
    pub span: Option<String>,
}

/// Resource client that answers every call with a fixed object and
/// remembers what it was asked
#[derive(Clone, Debug)]
pub struct RecordingClient<K> {
    template: K,
    failure: Option<ErrorResponse>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl<K: KubeObject> RecordingClient<K> {
    pub fn new(template: K) -> Self {
        Self {
            template,
            failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A client whose calls all fail with `failure`
    pub fn failing(template: K, failure: ErrorResponse) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new(template)
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.calls().into_iter().map(|call| call.operation).collect()
    }

    fn answer<T>(&self, operation: Operation, name: Option<&str>, value: T) -> Result<T> {
        let span = Span::current()
            .metadata()
            .map(|metadata| metadata.name().to_string());
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(RecordedCall {
                operation,
                name: name.map(str::to_string),
                span,
            });
        match &self.failure {
            Some(failure) => Err(kube::Error::Api(failure.clone())),
            None => Ok(value),
        }
    }

    fn object_list(&self) -> ObjectList<K> {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "List",
            "metadata": {},
            "items": [self.template],
        }))
        .expect("template object forms a valid list")
    }

    fn partial_metadata_value(&self) -> serde_json::Value {
        let object = serde_json::to_value(&self.template).expect("template serializes");
        json!({
            "apiVersion": "meta.k8s.io/v1",
            "kind": "PartialObjectMetadata",
            "metadata": object["metadata"],
        })
    }

    fn partial_metadata(&self) -> PartialObjectMeta<K> {
        serde_json::from_value(self.partial_metadata_value())
            .expect("template metadata forms a partial object")
    }
}

/// A `404 NotFound` response for `name`
pub fn not_found(name: &str) -> ErrorResponse {
    ErrorResponse {
        status: "Failure".to_string(),
        message: format!("\"{}\" not found", name),
        reason: "NotFound".to_string(),
        code: 404,
    }
}

fn success_status() -> Status {
    serde_json::from_value(json!({"status": "Success", "code": 201}))
        .expect("success status deserializes")
}

#[async_trait]
impl<K> ResourceInterface<K> for RecordingClient<K>
where
    K: KubeObject + Resource<DynamicType = ()>,
{
    async fn get(&self, name: &str) -> Result<K> {
        self.answer(Operation::Get, Some(name), self.template.clone())
    }

    async fn list(&self, _lp: &ListParams) -> Result<ObjectList<K>> {
        self.answer(Operation::List, None, self.object_list())
    }

    async fn watch(
        &self,
        _wp: &WatchParams,
        _version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<K>>>> {
        let events = stream::iter(vec![Ok(WatchEvent::Added(self.template.clone()))]).boxed();
        self.answer(Operation::Watch, None, events)
    }

    async fn create(&self, _pp: &PostParams, data: &K) -> Result<K> {
        self.answer(Operation::Create, None, data.clone())
    }

    async fn update(&self, name: &str, _pp: &PostParams, data: &K) -> Result<K> {
        self.answer(Operation::Update, Some(name), data.clone())
    }

    async fn update_status(&self, name: &str, _pp: &PostParams, data: &K) -> Result<K> {
        self.answer(Operation::UpdateStatus, Some(name), data.clone())
    }

    async fn patch<P>(&self, name: &str, _pp: &PatchParams, _patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.answer(Operation::Patch, Some(name), self.template.clone())
    }

    async fn patch_status<P>(&self, name: &str, _pp: &PatchParams, _patch: &Patch<P>) -> Result<K>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.answer(Operation::PatchStatus, Some(name), self.template.clone())
    }

    async fn get_status(&self, name: &str) -> Result<K> {
        self.answer(Operation::GetStatus, Some(name), self.template.clone())
    }

    async fn delete(&self, name: &str, _dp: &DeleteParams) -> Result<Either<K, Status>> {
        self.answer(Operation::Delete, Some(name), Either::Left(self.template.clone()))
    }

    async fn delete_collection(
        &self,
        _dp: &DeleteParams,
        _lp: &ListParams,
    ) -> Result<Either<ObjectList<K>, Status>> {
        self.answer(Operation::DeleteCollection, None, Either::Left(self.object_list()))
    }

    async fn apply(&self, name: &str, _pp: &PatchParams, data: &K) -> Result<K> {
        self.answer(Operation::Apply, Some(name), data.clone())
    }

    async fn apply_status(&self, name: &str, _pp: &PatchParams, data: &K) -> Result<K> {
        self.answer(Operation::ApplyStatus, Some(name), data.clone())
    }

    fn resource_url(&self) -> String {
        K::url_path(&(), Some("default"))
    }
}

#[async_trait]
impl PodInterface for RecordingClient<Pod> {
    async fn evict(&self, name: &str, _ep: &EvictParams) -> Result<Status> {
        self.answer(Operation::Evict, Some(name), success_status())
    }

    async fn get_logs(&self, name: &str, _lp: &LogParams) -> Result<String> {
        self.answer(Operation::GetLogs, Some(name), format!("logs for {}", name))
    }

    async fn bind(&self, name: &str, _pp: &PostParams, _binding: &Binding) -> Result<Status> {
        self.answer(Operation::Bind, Some(name), success_status())
    }

    async fn get_ephemeral_containers(&self, name: &str) -> Result<Pod> {
        self.answer(Operation::GetEphemeralContainers, Some(name), self.template.clone())
    }

    async fn update_ephemeral_containers(&self, name: &str, _pp: &PostParams, pod: &Pod) -> Result<Pod> {
        self.answer(Operation::UpdateEphemeralContainers, Some(name), pod.clone())
    }

    async fn patch_ephemeral_containers<P>(
        &self,
        name: &str,
        _pp: &PatchParams,
        _patch: &Patch<P>,
    ) -> Result<Pod>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.answer(Operation::PatchEphemeralContainers, Some(name), self.template.clone())
    }

    /// Echoes the proxy target without recording a call
    async fn proxy_get(&self, scheme: &str, name: &str, port: &str, path: &str) -> Result<String> {
        Ok(format!("{}/{}", join_scheme_name_port(scheme, name, port), path))
    }
}

#[async_trait]
impl NamespaceInterface for RecordingClient<Namespace> {
    async fn finalize(&self, name: &str, _pp: &PostParams, namespace: &Namespace) -> Result<Namespace> {
        self.answer(Operation::Finalize, Some(name), namespace.clone())
    }
}

#[async_trait]
impl CertificateSigningRequestInterface for RecordingClient<CertificateSigningRequest> {
    async fn get_approval(&self, name: &str) -> Result<CertificateSigningRequest> {
        self.answer(Operation::GetApproval, Some(name), self.template.clone())
    }

    async fn update_approval<P>(
        &self,
        name: &str,
        _pp: &PatchParams,
        _patch: &Patch<P>,
    ) -> Result<CertificateSigningRequest>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.answer(Operation::UpdateApproval, Some(name), self.template.clone())
    }
}

#[async_trait]
impl ServiceAccountInterface for RecordingClient<ServiceAccount> {
    async fn create_token(
        &self,
        name: &str,
        _pp: &PostParams,
        token_request: &TokenRequest,
    ) -> Result<TokenRequest> {
        self.answer(Operation::CreateToken, Some(name), token_request.clone())
    }
}

#[async_trait]
impl<K: KubeObject> MetadataInterface<K> for RecordingClient<K> {
    async fn get_metadata(&self, name: &str) -> Result<PartialObjectMeta<K>> {
        self.answer(Operation::GetMetadata, Some(name), self.partial_metadata())
    }

    async fn list_metadata(&self, _lp: &ListParams) -> Result<ObjectList<PartialObjectMeta<K>>> {
        let list = serde_json::from_value(json!({
            "apiVersion": "meta.k8s.io/v1",
            "kind": "PartialObjectMetadataList",
            "metadata": {},
            "items": [self.partial_metadata_value()],
        }))
        .expect("partial metadata forms a valid list");
        self.answer(Operation::ListMetadata, None, list)
    }

    async fn watch_metadata(
        &self,
        _wp: &WatchParams,
        _version: &str,
    ) -> Result<BoxStream<'static, Result<WatchEvent<PartialObjectMeta<K>>>>> {
        let events = stream::iter(vec![Ok(WatchEvent::Added(self.partial_metadata()))]).boxed();
        self.answer(Operation::WatchMetadata, None, events)
    }

    async fn patch_metadata<P>(
        &self,
        name: &str,
        _pp: &PatchParams,
        _patch: &Patch<P>,
    ) -> Result<PartialObjectMeta<K>>
    where
        P: Serialize + Debug + Send + Sync,
    {
        self.answer(Operation::PatchMetadata, Some(name), self.partial_metadata())
    }
}

/// A span as it looked when it closed
#[derive(Clone, Debug, Default)]
pub struct CapturedSpan {
    pub name: String,
    pub fields: BTreeMap<String, String>,
}

impl CapturedSpan {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// An event emitted while capturing
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: tracing::Level,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn message(&self) -> Option<&str> {
        self.field("message")
    }
}

#[derive(Default)]
struct FieldMap(BTreeMap<String, String>);

impl Visit for FieldMap {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.0
            .insert(field.name().to_string(), format!("{:?}", value));
    }
}

/// Subscriber layer that keeps closed spans and events for inspection
#[derive(Clone, Default)]
pub struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl SpanCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install as the thread's default subscriber until the guard drops
    pub fn set_default(&self) -> DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }

    /// Closed spans in closing order
    pub fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().expect("span lock poisoned").clone()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().expect("event lock poisoned").clone()
    }
}

impl<S> Layer<S> for SpanCapture
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        attrs.record(&mut fields);
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(fields);
        }
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(id) {
            if let Some(fields) = span.extensions_mut().get_mut::<FieldMap>() {
                values.record(fields);
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut fields = FieldMap::default();
        event.record(&mut fields);
        self.events
            .lock()
            .expect("event lock poisoned")
            .push(CapturedEvent {
                level: *event.metadata().level(),
                fields: fields.0,
            });
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        if let Some(span) = ctx.span(&id) {
            let fields = span
                .extensions_mut()
                .remove::<FieldMap>()
                .unwrap_or_default();
            self.spans
                .lock()
                .expect("span lock poisoned")
                .push(CapturedSpan {
                    name: span.name().to_string(),
                    fields: fields.0,
                });
        }
    }
}
