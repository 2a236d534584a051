//! The instrumented clientset

use crate::groups::*;
use crate::instrumentation::{InstrumentedApi, Instrumentation};
use k8s_openapi::NamespaceResourceScope;
use kube::core::{ApiResource, DynamicObject};
use kube::{Client, Config, Discovery, Resource};
use kubetrace_core::{KubeObject, Result};
use kubetrace_layers::ClientQueryMetrics;
use std::sync::Arc;
use tracing::debug;

/// Every API group of the typed clientset, with each resource client traced.
///
/// Group clients are built once and shared. `discovery` and `rest_client`
/// hand out the inner client without instrumentation.
#[derive(Clone)]
pub struct Clientset {
    client: Client,
    instrumentation: Instrumentation,
    core_v1: CoreV1,
    admissionregistration_v1: AdmissionregistrationV1,
    apps_v1: AppsV1,
    authentication_v1: AuthenticationV1,
    authorization_v1: AuthorizationV1,
    autoscaling_v1: AutoscalingV1,
    autoscaling_v2: AutoscalingV2,
    batch_v1: BatchV1,
    certificates_v1: CertificatesV1,
    coordination_v1: CoordinationV1,
    discovery_v1: DiscoveryV1,
    events_v1: EventsV1,
    flowcontrol_v1: FlowcontrolV1,
    networking_v1: NetworkingV1,
    node_v1: NodeV1,
    policy_v1: PolicyV1,
    rbac_v1: RbacV1,
    scheduling_v1: SchedulingV1,
    storage_v1: StorageV1,
}

impl Clientset {
    /// Wrap an existing client with tracing only
    pub fn wrap(client: Client) -> Self {
        ClientsetBuilder::new(client).build()
    }

    /// Build the inner client from `config`, then wrap it
    pub fn new_for_config(config: Config) -> Result<Self> {
        let client = Client::try_from(config)?;
        Ok(Self::wrap(client))
    }

    /// Wrap a client inferred from the environment (kubeconfig or in-cluster)
    pub async fn try_default() -> Result<Self> {
        let client = Client::try_default().await?;
        Ok(Self::wrap(client))
    }

    fn from_parts(client: Client, instrumentation: Instrumentation) -> Self {
        Self {
            core_v1: CoreV1::new(client.clone(), instrumentation.clone()),
            admissionregistration_v1: AdmissionregistrationV1::new(client.clone(), instrumentation.clone()),
            apps_v1: AppsV1::new(client.clone(), instrumentation.clone()),
            authentication_v1: AuthenticationV1::new(client.clone(), instrumentation.clone()),
            authorization_v1: AuthorizationV1::new(client.clone(), instrumentation.clone()),
            autoscaling_v1: AutoscalingV1::new(client.clone(), instrumentation.clone()),
            autoscaling_v2: AutoscalingV2::new(client.clone(), instrumentation.clone()),
            batch_v1: BatchV1::new(client.clone(), instrumentation.clone()),
            certificates_v1: CertificatesV1::new(client.clone(), instrumentation.clone()),
            coordination_v1: CoordinationV1::new(client.clone(), instrumentation.clone()),
            discovery_v1: DiscoveryV1::new(client.clone(), instrumentation.clone()),
            events_v1: EventsV1::new(client.clone(), instrumentation.clone()),
            flowcontrol_v1: FlowcontrolV1::new(client.clone(), instrumentation.clone()),
            networking_v1: NetworkingV1::new(client.clone(), instrumentation.clone()),
            node_v1: NodeV1::new(client.clone(), instrumentation.clone()),
            policy_v1: PolicyV1::new(client.clone(), instrumentation.clone()),
            rbac_v1: RbacV1::new(client.clone(), instrumentation.clone()),
            scheduling_v1: SchedulingV1::new(client.clone(), instrumentation.clone()),
            storage_v1: StorageV1::new(client.clone(), instrumentation.clone()),
            client,
            instrumentation,
        }
    }

    /// Discovery for the inner client; not traced
    pub fn discovery(&self) -> Discovery {
        Discovery::new(self.client.clone())
    }

    /// The underlying client, without instrumentation
    pub fn rest_client(&self) -> Client {
        self.client.clone()
    }

    /// Instrumented client for any namespaced kind, custom resources included
    pub fn namespaced<K>(&self, namespace: &str) -> InstrumentedApi<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()> + KubeObject,
    {
        self.instrumentation.namespaced(&self.client, namespace)
    }

    /// Instrumented client for a cluster-scoped kind, or a namespaced kind
    /// across all namespaces
    pub fn cluster<K>(&self) -> InstrumentedApi<K>
    where
        K: Resource<DynamicType = ()> + KubeObject,
    {
        self.instrumentation.cluster(&self.client)
    }

    /// Instrumented untyped client for a kind discovered at runtime.
    ///
    /// `namespace` is `None` for cluster-scoped kinds or to span all
    /// namespaces. Fails when `ar` lacks a kind, version or plural.
    pub fn dynamic(
        &self,
        ar: &ApiResource,
        namespace: Option<&str>,
    ) -> Result<InstrumentedApi<DynamicObject>> {
        self.instrumentation.dynamic(&self.client, ar, namespace)
    }

    pub fn core_v1(&self) -> &CoreV1 {
        &self.core_v1
    }

    pub fn admissionregistration_v1(&self) -> &AdmissionregistrationV1 {
        &self.admissionregistration_v1
    }

    pub fn apps_v1(&self) -> &AppsV1 {
        &self.apps_v1
    }

    pub fn authentication_v1(&self) -> &AuthenticationV1 {
        &self.authentication_v1
    }

    pub fn authorization_v1(&self) -> &AuthorizationV1 {
        &self.authorization_v1
    }

    pub fn autoscaling_v1(&self) -> &AutoscalingV1 {
        &self.autoscaling_v1
    }

    pub fn autoscaling_v2(&self) -> &AutoscalingV2 {
        &self.autoscaling_v2
    }

    pub fn batch_v1(&self) -> &BatchV1 {
        &self.batch_v1
    }

    pub fn certificates_v1(&self) -> &CertificatesV1 {
        &self.certificates_v1
    }

    pub fn coordination_v1(&self) -> &CoordinationV1 {
        &self.coordination_v1
    }

    pub fn discovery_v1(&self) -> &DiscoveryV1 {
        &self.discovery_v1
    }

    pub fn events_v1(&self) -> &EventsV1 {
        &self.events_v1
    }

    pub fn flowcontrol_v1(&self) -> &FlowcontrolV1 {
        &self.flowcontrol_v1
    }

    pub fn networking_v1(&self) -> &NetworkingV1 {
        &self.networking_v1
    }

    pub fn node_v1(&self) -> &NodeV1 {
        &self.node_v1
    }

    pub fn policy_v1(&self) -> &PolicyV1 {
        &self.policy_v1
    }

    pub fn rbac_v1(&self) -> &RbacV1 {
        &self.rbac_v1
    }

    pub fn scheduling_v1(&self) -> &SchedulingV1 {
        &self.scheduling_v1
    }

    pub fn storage_v1(&self) -> &StorageV1 {
        &self.storage_v1
    }
}

/// Chooses the optional layers before building a `Clientset`
pub struct ClientsetBuilder {
    client: Client,
    instrumentation: Instrumentation,
}

impl ClientsetBuilder {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            instrumentation: Instrumentation::default(),
        }
    }

    /// Record query counts and latency, labelled with `client_type`
    pub fn metrics(mut self, metrics: Arc<ClientQueryMetrics>, client_type: impl Into<String>) -> Self {
        self.instrumentation = self.instrumentation.with_metrics(metrics, client_type.into());
        self
    }

    /// Log the outcome of every call
    pub fn logging(mut self, enabled: bool) -> Self {
        self.instrumentation = self.instrumentation.with_logging(enabled);
        self
    }

    /// Trace only calls made inside an existing span
    pub fn parent_only(mut self, enabled: bool) -> Self {
        self.instrumentation = self.instrumentation.with_parent_only(enabled);
        self
    }

    pub fn build(self) -> Clientset {
        debug!(
            metrics = self.instrumentation.has_metrics(),
            logging = self.instrumentation.has_logging(),
            "Building instrumented clientset"
        );
        Clientset::from_parts(self.client, self.instrumentation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{Request, Response, StatusCode};
    use k8s_openapi::api::authentication::v1::{TokenRequest, TokenRequestSpec};
    use k8s_openapi::api::autoscaling::v1::{Scale, ScaleSpec};
    use k8s_openapi::api::core::v1::{Binding, Namespace, Node, ObjectReference, Pod};
    use kube::api::{ListParams, Patch, PatchParams, PostParams};
    use kube::client::Body;
    use kube::CustomResource;
    use kubetrace_core::testing::SpanCapture;
    use kubetrace_core::{
        CertificateSigningRequestInterface, Error, MetadataInterface, NamespaceInterface,
        PodInterface, ResourceInterface, ScaleInterface, ServiceAccountInterface,
    };
    use tracing::Instrument;
    use kubetrace_layers::SPAN_NAME;
    use schemars::JsonSchema;
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use std::convert::Infallible;
    use std::sync::Mutex;

    #[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema)]
    #[kube(
        group = "policies.example.com",
        version = "v1alpha1",
        kind = "ClusterPolicy",
        plural = "clusterpolicies"
    )]
    pub struct ClusterPolicySpec {
        pub background: bool,
    }

    /// Client backed by a function of the request path; records every request
    fn mock_client<F>(requests: Arc<Mutex<Vec<String>>>, respond: F) -> Client
    where
        F: Fn(&str) -> (StatusCode, Value) + Clone + Send + Sync + 'static,
    {
        let service = tower::service_fn(move |req: Request<Body>| {
            let requests = requests.clone();
            let respond = respond.clone();
            async move {
                let path = req.uri().path().to_string();
                requests
                    .lock()
                    .unwrap()
                    .push(format!("{} {}", req.method(), path));
                let (status, body) = respond(&path);
                let bytes = serde_json::to_vec(&body).unwrap();
                Ok::<_, Infallible>(
                    Response::builder()
                        .status(status)
                        .header("content-type", "application/json")
                        .body(Body::from(bytes))
                        .unwrap(),
                )
            }
        });
        Client::new(service, "default")
    }

    fn pod_json(name: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": name, "namespace": "default"}
        })
    }

    fn client_spans(capture: &SpanCapture) -> Vec<kubetrace_core::testing::CapturedSpan> {
        capture
            .spans()
            .into_iter()
            .filter(|span| span.name == SPAN_NAME)
            .collect()
    }

    #[tokio::test]
    async fn test_pod_get_hits_api_and_is_traced() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), |_| {
            (StatusCode::OK, pod_json("nginx"))
        }));

        let pod = clientset.core_v1().pods("default").get("nginx").await.unwrap();
        assert_eq!(pod.metadata.name.as_deref(), Some("nginx"));

        assert_eq!(
            *requests.lock().unwrap(),
            vec!["GET /api/v1/namespaces/default/pods/nginx".to_string()]
        );

        let spans = client_spans(&capture);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].field("otel.name"), Some("CoreV1/Pods"));
        assert_eq!(spans[0].field("client"), Some("CoreV1"));
        assert_eq!(spans[0].field("resource"), Some("Pods"));
        assert_eq!(spans[0].field("kind"), Some("Pod"));
        assert_eq!(spans[0].field("operation"), Some("Get"));
        assert_eq!(spans[0].field("otel.status_code"), Some("OK"));
    }

    #[tokio::test]
    async fn test_api_error_is_returned_and_recorded() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests, |_| {
            (
                StatusCode::NOT_FOUND,
                json!({
                    "kind": "Status",
                    "apiVersion": "v1",
                    "status": "Failure",
                    "message": "pods \"missing\" not found",
                    "reason": "NotFound",
                    "code": 404
                }),
            )
        }));

        let err = clientset
            .core_v1()
            .pods("default")
            .get("missing")
            .await
            .unwrap_err();
        assert!(matches!(err, kube::Error::Api(ref response) if response.code == 404));

        let spans = client_spans(&capture);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].field("otel.status_code"), Some("ERROR"));
        assert_eq!(spans[0].field("error"), Some(err.to_string().as_str()));
    }

    #[tokio::test]
    async fn test_cluster_scoped_list() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), |_| {
            (
                StatusCode::OK,
                json!({
                    "apiVersion": "v1",
                    "kind": "NodeList",
                    "metadata": {"resourceVersion": "1"},
                    "items": [{"apiVersion": "v1", "kind": "Node", "metadata": {"name": "worker-0"}}]
                }),
            )
        }));

        let nodes = clientset
            .core_v1()
            .nodes()
            .list(&ListParams::default())
            .await
            .unwrap();
        assert_eq!(nodes.items.len(), 1);
        assert_eq!(
            *requests.lock().unwrap(),
            vec!["GET /api/v1/nodes".to_string()]
        );

        let spans = client_spans(&capture);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].field("otel.name"), Some("CoreV1/Nodes"));
        assert_eq!(spans[0].field("operation"), Some("List"));
    }

    #[tokio::test]
    async fn test_custom_resource_is_traced() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), |_| {
            (
                StatusCode::CREATED,
                json!({
                    "apiVersion": "policies.example.com/v1alpha1",
                    "kind": "ClusterPolicy",
                    "metadata": {"name": "require-labels"},
                    "spec": {"background": true}
                }),
            )
        }));

        let policy = ClusterPolicy::new("require-labels", ClusterPolicySpec { background: true });
        let created = clientset
            .cluster::<ClusterPolicy>()
            .create(&PostParams::default(), &policy)
            .await
            .unwrap();
        assert!(created.spec.background);

        assert_eq!(
            *requests.lock().unwrap(),
            vec!["POST /apis/policies.example.com/v1alpha1/clusterpolicies".to_string()]
        );

        let spans = client_spans(&capture);
        assert_eq!(spans.len(), 1);
        assert_eq!(
            spans[0].field("otel.name"),
            Some("PoliciesV1alpha1/ClusterPolicies")
        );
        assert_eq!(spans[0].field("operation"), Some("Create"));
    }

    #[tokio::test]
    async fn test_metrics_and_logging_layers() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let metrics = Arc::new(ClientQueryMetrics::new().expect("Failed to create metrics"));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = ClientsetBuilder::new(mock_client(requests, |_| {
            (StatusCode::OK, pod_json("nginx"))
        }))
        .metrics(metrics.clone(), "kube")
        .logging(true)
        .build();

        clientset
            .namespaced::<Pod>("default")
            .get("nginx")
            .await
            .unwrap();

        let count = metrics
            .queries_total
            .with_label_values(&["kube", "Pod", "default", "get"])
            .get();
        assert_eq!(count, 1.0);

        let done: Vec<_> = capture
            .events()
            .into_iter()
            .filter(|event| event.message() == Some("Get done"))
            .collect();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].field("kind"), Some("Pod"));
        assert_eq!(client_spans(&capture).len(), 1);
    }

    #[tokio::test]
    async fn test_rest_client_and_discovery_are_untraced() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), |path| {
            let body = match path {
                "/api" => json!({
                    "kind": "APIVersions",
                    "apiVersion": "v1",
                    "versions": ["v1"],
                    "serverAddressByClientCIDRs": []
                }),
                "/apis" => json!({"kind": "APIGroupList", "apiVersion": "v1", "groups": []}),
                _ => json!({
                    "kind": "APIResourceList",
                    "apiVersion": "v1",
                    "groupVersion": "v1",
                    "resources": []
                }),
            };
            (StatusCode::OK, body)
        }));

        clientset.discovery().run().await.unwrap();

        let nodes: kube::Api<Node> = kube::Api::all(clientset.rest_client());
        assert_eq!(nodes.resource_url(), "/api/v1/nodes");
        let pods: kube::Api<Pod> = kube::Api::namespaced(
            clientset.core_v1().pods("default").rest_client(),
            "default",
        );
        assert_eq!(pods.resource_url(), "/api/v1/namespaces/default/pods");
        assert_eq!(clientset.core_v1().nodes().resource_url(), "/api/v1/nodes");

        assert!(requests.lock().unwrap().iter().any(|r| r == "GET /api"));
        assert!(client_spans(&capture).is_empty());
    }

    fn requests_of(requests: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        requests.lock().unwrap().clone()
    }

    fn span_operations(capture: &SpanCapture) -> Vec<(String, String)> {
        client_spans(capture)
            .iter()
            .map(|span| {
                (
                    span.field("otel.name").unwrap_or_default().to_string(),
                    span.field("operation").unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    fn scale_json(name: &str, replicas: i32) -> Value {
        json!({
            "apiVersion": "autoscaling/v1",
            "kind": "Scale",
            "metadata": {"name": name, "namespace": "default"},
            "spec": {"replicas": replicas}
        })
    }

    fn subresource_response(path: &str) -> (StatusCode, Value) {
        let body = if path.ends_with("/scale") {
            scale_json("web", 5)
        } else if path.contains("/certificatesigningrequests/") {
            json!({
                "apiVersion": "certificates.k8s.io/v1",
                "kind": "CertificateSigningRequest",
                "metadata": {"name": "csr-1"},
                "spec": {
                    "request": "cmVxdWVzdA==",
                    "signerName": "kubernetes.io/kube-apiserver-client"
                }
            })
        } else if path.ends_with("/token") {
            json!({
                "apiVersion": "authentication.k8s.io/v1",
                "kind": "TokenRequest",
                "metadata": {"name": "builder"},
                "spec": {"audiences": ["api"]},
                "status": {"token": "secret", "expirationTimestamp": "2026-10-17T00:00:00Z"}
            })
        } else if path.ends_with("/binding") {
            json!({
                "kind": "Status",
                "apiVersion": "v1",
                "metadata": {},
                "status": "Success",
                "code": 201
            })
        } else if path.ends_with("/finalize") {
            json!({"apiVersion": "v1", "kind": "Namespace", "metadata": {"name": "scratch"}})
        } else {
            pod_json("nginx")
        };
        (StatusCode::OK, body)
    }

    #[tokio::test]
    async fn test_status_and_scale_subresources_reach_their_paths() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), subresource_response));

        let pod: Pod = serde_json::from_value(pod_json("nginx")).unwrap();
        clientset
            .core_v1()
            .pods("default")
            .update_status("nginx", &PostParams::default(), &pod)
            .await
            .unwrap();

        let deployments = clientset.apps_v1().deployments("default");
        let mut scale: Scale = serde_json::from_value(scale_json("web", 3)).unwrap();
        scale.spec = Some(ScaleSpec { replicas: Some(5) });
        let updated = deployments
            .update_scale("web", &PostParams::default(), &scale)
            .await
            .unwrap();
        deployments
            .apply_scale("web", &PatchParams::apply("kubetrace"), &scale)
            .await
            .unwrap();

        assert_eq!(updated.spec.and_then(|spec| spec.replicas), Some(5));
        assert_eq!(
            requests_of(&requests),
            vec![
                "PUT /api/v1/namespaces/default/pods/nginx/status".to_string(),
                "PUT /apis/apps/v1/namespaces/default/deployments/web/scale".to_string(),
                "PATCH /apis/apps/v1/namespaces/default/deployments/web/scale".to_string(),
            ]
        );
        assert_eq!(
            span_operations(&capture),
            vec![
                ("CoreV1/Pods".to_string(), "UpdateStatus".to_string()),
                ("AppsV1/Deployments".to_string(), "UpdateScale".to_string()),
                ("AppsV1/Deployments".to_string(), "ApplyScale".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_approval_and_token_subresources_reach_their_paths() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), subresource_response));

        let approval = Patch::Merge(json!({
            "status": {"conditions": [{"type": "Approved", "status": "True", "reason": "Test"}]}
        }));
        let csr = clientset
            .certificates_v1()
            .certificate_signing_requests()
            .update_approval("csr-1", &PatchParams::default(), &approval)
            .await
            .unwrap();
        assert_eq!(csr.metadata.name.as_deref(), Some("csr-1"));

        let token_request = TokenRequest {
            spec: TokenRequestSpec {
                audiences: vec!["api".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        let token = clientset
            .core_v1()
            .service_accounts("default")
            .create_token("builder", &PostParams::default(), &token_request)
            .await
            .unwrap();
        assert_eq!(token.status.map(|status| status.token).as_deref(), Some("secret"));

        assert_eq!(
            requests_of(&requests),
            vec![
                "PATCH /apis/certificates.k8s.io/v1/certificatesigningrequests/csr-1/approval".to_string(),
                "POST /api/v1/namespaces/default/serviceaccounts/builder/token".to_string(),
            ]
        );
        assert_eq!(
            span_operations(&capture),
            vec![
                (
                    "CertificatesV1/CertificateSigningRequests".to_string(),
                    "UpdateApproval".to_string()
                ),
                ("CoreV1/ServiceAccounts".to_string(), "CreateToken".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_pod_and_namespace_subresources_reach_their_paths() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), subresource_response));
        let pods = clientset.core_v1().pods("default");

        let binding = Binding {
            target: ObjectReference {
                kind: Some("Node".to_string()),
                name: Some("worker-0".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        pods.bind("nginx", &PostParams::default(), &binding).await.unwrap();
        pods.patch_ephemeral_containers(
            "nginx",
            &PatchParams::default(),
            &Patch::Strategic(json!({"spec": {"ephemeralContainers": [{"name": "debug", "image": "busybox"}]}})),
        )
        .await
        .unwrap();

        let mut namespace = Namespace::default();
        namespace.metadata.name = Some("scratch".to_string());
        let finalized = clientset
            .core_v1()
            .namespaces()
            .finalize("scratch", &PostParams::default(), &namespace)
            .await
            .unwrap();
        assert_eq!(finalized.metadata.name.as_deref(), Some("scratch"));

        assert_eq!(
            requests_of(&requests),
            vec![
                "POST /api/v1/namespaces/default/pods/nginx/binding".to_string(),
                "PATCH /api/v1/namespaces/default/pods/nginx/ephemeralcontainers".to_string(),
                "PUT /api/v1/namespaces/scratch/finalize".to_string(),
            ]
        );
        assert_eq!(
            span_operations(&capture),
            vec![
                ("CoreV1/Pods".to_string(), "Bind".to_string()),
                ("CoreV1/Pods".to_string(), "PatchEphemeralContainers".to_string()),
                ("CoreV1/Namespaces".to_string(), "Finalize".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_proxy_get_is_untraced() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), |_| {
            (StatusCode::OK, json!({"status": "ok"}))
        }));

        let body = clientset
            .core_v1()
            .pods("default")
            .proxy_get("https", "nginx", "8443", "healthz")
            .await
            .unwrap();

        assert!(body.contains("ok"));
        assert_eq!(
            requests_of(&requests),
            vec!["GET /api/v1/namespaces/default/pods/https:nginx:8443/proxy/healthz".to_string()]
        );
        assert!(client_spans(&capture).is_empty());
    }

    #[tokio::test]
    async fn test_new_for_config_keeps_default_namespace() {
        let config = Config::new("http://127.0.0.1:6443".parse().unwrap());
        let clientset = Clientset::new_for_config(config).unwrap();

        assert_eq!(clientset.rest_client().default_namespace(), "default");
        assert_eq!(
            clientset.core_v1().pods("default").resource_url(),
            "/api/v1/namespaces/default/pods"
        );
    }

    fn certificate_resource() -> ApiResource {
        ApiResource {
            group: "cert-manager.io".to_string(),
            version: "v1".to_string(),
            api_version: "cert-manager.io/v1".to_string(),
            kind: "Certificate".to_string(),
            plural: "certificates".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dynamic_resource_is_traced() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), |_| {
            (
                StatusCode::OK,
                json!({
                    "apiVersion": "cert-manager.io/v1",
                    "kind": "Certificate",
                    "metadata": {"name": "web", "namespace": "default"},
                    "spec": {"secretName": "web-tls"}
                }),
            )
        }));

        let certificates = clientset
            .dynamic(&certificate_resource(), Some("default"))
            .unwrap();
        let certificate = certificates.get("web").await.unwrap();
        assert_eq!(certificate.data["spec"]["secretName"], "web-tls");

        assert_eq!(
            requests_of(&requests),
            vec!["GET /apis/cert-manager.io/v1/namespaces/default/certificates/web".to_string()]
        );
        let spans = client_spans(&capture);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].field("otel.name"), Some("CertManagerV1/Certificates"));
        assert_eq!(spans[0].field("kind"), Some("Certificate"));
    }

    #[tokio::test]
    async fn test_dynamic_rejects_incomplete_api_resource() {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests, |_| (StatusCode::OK, json!({}))));

        let ar = ApiResource {
            kind: String::new(),
            ..certificate_resource()
        };
        assert!(matches!(
            clientset.dynamic(&ar, None),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_metadata_get_is_traced() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = Clientset::wrap(mock_client(requests.clone(), |_| {
            (
                StatusCode::OK,
                json!({
                    "apiVersion": "meta.k8s.io/v1",
                    "kind": "PartialObjectMetadata",
                    "metadata": {"name": "nginx", "namespace": "default", "labels": {"app": "web"}}
                }),
            )
        }));

        let meta = clientset
            .core_v1()
            .pods("default")
            .get_metadata("nginx")
            .await
            .unwrap();
        assert_eq!(
            meta.metadata.labels.unwrap_or_default().get("app").map(String::as_str),
            Some("web")
        );

        assert_eq!(
            requests_of(&requests),
            vec!["GET /api/v1/namespaces/default/pods/nginx".to_string()]
        );
        assert_eq!(
            span_operations(&capture),
            vec![("CoreV1/Pods".to_string(), "GetMetadata".to_string())]
        );
    }

    #[tokio::test]
    async fn test_parent_only_traces_calls_inside_a_span() {
        let capture = SpanCapture::new();
        let _guard = capture.set_default();

        let requests = Arc::new(Mutex::new(Vec::new()));
        let clientset = ClientsetBuilder::new(mock_client(requests.clone(), |_| {
            (StatusCode::OK, pod_json("nginx"))
        }))
        .parent_only(true)
        .build();
        let pods = clientset.core_v1().pods("default");

        pods.get("nginx").await.unwrap();
        assert!(client_spans(&capture).is_empty());

        pods.get("nginx")
            .instrument(tracing::info_span!("reconcile"))
            .await
            .unwrap();
        assert_eq!(
            span_operations(&capture),
            vec![("CoreV1/Pods".to_string(), "Get".to_string())]
        );
        assert_eq!(requests_of(&requests).len(), 2);
    }
}
