//! Instrumented API group clients

use crate::instrumentation::{InstrumentedApi, Instrumentation};
use k8s_openapi::api::{
    admissionregistration, apps, authentication, authorization, autoscaling, batch, certificates,
    coordination, core, discovery, events, flowcontrol, networking, node, policy, rbac, scheduling,
    storage,
};
use kube::Client;

macro_rules! api_group {
    (@accessor namespaced $method:ident => $kind:ty) => {
        pub fn $method(&self, namespace: &str) -> InstrumentedApi<$kind> {
            self.instrumentation.namespaced(&self.client, namespace)
        }
    };
    (@accessor cluster $method:ident => $kind:ty) => {
        pub fn $method(&self) -> InstrumentedApi<$kind> {
            self.instrumentation.cluster(&self.client)
        }
    };
    ($(#[$meta:meta])* $group:ident { $($scope:ident $method:ident => $kind:ty),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone)]
        pub struct $group {
            client: Client,
            instrumentation: Instrumentation,
        }

        impl $group {
            pub(crate) fn new(client: Client, instrumentation: Instrumentation) -> Self {
                Self { client, instrumentation }
            }

            /// The underlying client, without instrumentation
            pub fn rest_client(&self) -> Client {
                self.client.clone()
            }

            $(api_group!(@accessor $scope $method => $kind);)*
        }
    };
}

api_group! {
    /// `v1` core resources
    CoreV1 {
        cluster component_statuses => core::v1::ComponentStatus,
        namespaced config_maps => core::v1::ConfigMap,
        namespaced endpoints => core::v1::Endpoints,
        namespaced events => core::v1::Event,
        namespaced limit_ranges => core::v1::LimitRange,
        cluster namespaces => core::v1::Namespace,
        cluster nodes => core::v1::Node,
        cluster persistent_volumes => core::v1::PersistentVolume,
        namespaced persistent_volume_claims => core::v1::PersistentVolumeClaim,
        namespaced pods => core::v1::Pod,
        namespaced pod_templates => core::v1::PodTemplate,
        namespaced replication_controllers => core::v1::ReplicationController,
        namespaced resource_quotas => core::v1::ResourceQuota,
        namespaced secrets => core::v1::Secret,
        namespaced services => core::v1::Service,
        namespaced service_accounts => core::v1::ServiceAccount,
    }
}

api_group! {
    AdmissionregistrationV1 {
        cluster mutating_webhook_configurations => admissionregistration::v1::MutatingWebhookConfiguration,
        cluster validating_webhook_configurations => admissionregistration::v1::ValidatingWebhookConfiguration,
        cluster validating_admission_policies => admissionregistration::v1::ValidatingAdmissionPolicy,
        cluster validating_admission_policy_bindings => admissionregistration::v1::ValidatingAdmissionPolicyBinding,
    }
}

api_group! {
    AppsV1 {
        namespaced controller_revisions => apps::v1::ControllerRevision,
        namespaced daemon_sets => apps::v1::DaemonSet,
        namespaced deployments => apps::v1::Deployment,
        namespaced replica_sets => apps::v1::ReplicaSet,
        namespaced stateful_sets => apps::v1::StatefulSet,
    }
}

api_group! {
    /// Review kinds are create-only on the server
    AuthenticationV1 {
        cluster token_reviews => authentication::v1::TokenReview,
        cluster self_subject_reviews => authentication::v1::SelfSubjectReview,
    }
}

api_group! {
    AuthorizationV1 {
        namespaced local_subject_access_reviews => authorization::v1::LocalSubjectAccessReview,
        cluster self_subject_access_reviews => authorization::v1::SelfSubjectAccessReview,
        cluster self_subject_rules_reviews => authorization::v1::SelfSubjectRulesReview,
        cluster subject_access_reviews => authorization::v1::SubjectAccessReview,
    }
}

api_group! {
    AutoscalingV1 {
        namespaced horizontal_pod_autoscalers => autoscaling::v1::HorizontalPodAutoscaler,
    }
}

api_group! {
    AutoscalingV2 {
        namespaced horizontal_pod_autoscalers => autoscaling::v2::HorizontalPodAutoscaler,
    }
}

api_group! {
    BatchV1 {
        namespaced cron_jobs => batch::v1::CronJob,
        namespaced jobs => batch::v1::Job,
    }
}

api_group! {
    CertificatesV1 {
        cluster certificate_signing_requests => certificates::v1::CertificateSigningRequest,
    }
}

api_group! {
    CoordinationV1 {
        namespaced leases => coordination::v1::Lease,
    }
}

api_group! {
    DiscoveryV1 {
        namespaced endpoint_slices => discovery::v1::EndpointSlice,
    }
}

api_group! {
    EventsV1 {
        namespaced events => events::v1::Event,
    }
}

api_group! {
    FlowcontrolV1 {
        cluster flow_schemas => flowcontrol::v1::FlowSchema,
        cluster priority_level_configurations => flowcontrol::v1::PriorityLevelConfiguration,
    }
}

api_group! {
    NetworkingV1 {
        namespaced ingresses => networking::v1::Ingress,
        cluster ingress_classes => networking::v1::IngressClass,
        namespaced network_policies => networking::v1::NetworkPolicy,
    }
}

api_group! {
    NodeV1 {
        cluster runtime_classes => node::v1::RuntimeClass,
    }
}

api_group! {
    PolicyV1 {
        namespaced pod_disruption_budgets => policy::v1::PodDisruptionBudget,
    }
}

api_group! {
    RbacV1 {
        cluster cluster_roles => rbac::v1::ClusterRole,
        cluster cluster_role_bindings => rbac::v1::ClusterRoleBinding,
        namespaced roles => rbac::v1::Role,
        namespaced role_bindings => rbac::v1::RoleBinding,
    }
}

api_group! {
    SchedulingV1 {
        cluster priority_classes => scheduling::v1::PriorityClass,
    }
}

api_group! {
    StorageV1 {
        cluster csi_drivers => storage::v1::CSIDriver,
        cluster csi_nodes => storage::v1::CSINode,
        namespaced csi_storage_capacities => storage::v1::CSIStorageCapacity,
        cluster storage_classes => storage::v1::StorageClass,
        cluster volume_attachments => storage::v1::VolumeAttachment,
    }
}
