//! An instrumented Kubernetes clientset
//!
//! `Clientset` mirrors the typed clientset's API groups. Every resource
//! client it hands out is a `kube::Api` wrapped so each call opens a client
//! span, with Prometheus metrics and call logging available as extra layers.
//!
//! ```no_run
//! # async fn demo() -> kubetrace_core::Result<()> {
//! use kubetrace_clientset::Clientset;
//! use kubetrace_core::ResourceInterface;
//!
//! let clientset = Clientset::try_default().await?;
//! let pod = clientset.core_v1().pods("default").get("nginx").await?;
//! # Ok(())
//! # }
//! ```

pub mod clientset;
pub mod groups;
pub mod instrumentation;

pub use clientset::{Clientset, ClientsetBuilder};
pub use groups::*;
pub use instrumentation::{InstrumentedApi, Instrumentation, ResourceInterceptor};
