//! Core types for instrumenting typed Kubernetes clients
//!
//! This library provides:
//! - `ResourceInterface` and the kind-specific extension traits, implemented for `kube::Api`
//! - `ResourceDescriptor`, the client/resource/kind triple every span is tagged with
//! - `Interceptor` and `Intercepted`, the decorator that wraps each API verb

pub mod descriptor;
pub mod error;
pub mod interceptor;
pub mod operation;
pub mod resource;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use descriptor::ResourceDescriptor;
pub use error::{Error, Result};
pub use interceptor::{Intercepted, Interceptor};
pub use operation::Operation;
pub use resource::{
    CertificateSigningRequestInterface, KubeObject, MetadataInterface, NamespaceInterface,
    PodInterface, ResourceInterface, ScaleInterface, ServiceAccountInterface,
};
