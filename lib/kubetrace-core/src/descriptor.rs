//! Span attributes identifying a wrapped resource client

use crate::{Error, Result};
use kube::core::ApiResource;
use kube::Resource;

/// Identifies the client, resource and kind a wrapper was built for.
///
/// These three values tag every span and metric the wrapper emits. `client`
/// names the API group/version the way the typed clientset does (`CoreV1`,
/// `RbacV1`), `resource` is the PascalCase plural (`ConfigMaps`) and `kind`
/// the singular (`ConfigMap`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    pub client: String,
    pub resource: String,
    pub kind: String,
}

impl ResourceDescriptor {
    /// Create a descriptor from explicit names
    pub fn new(
        client: impl Into<String>,
        resource: impl Into<String>,
        kind: impl Into<String>,
    ) -> Result<Self> {
        let descriptor = Self {
            client: client.into(),
            resource: resource.into(),
            kind: kind.into(),
        };
        if descriptor.client.is_empty()
            || descriptor.resource.is_empty()
            || descriptor.kind.is_empty()
        {
            return Err(Error::InvalidConfiguration(format!(
                "resource descriptor needs a client, resource and kind, got {:?}",
                descriptor
            )));
        }
        Ok(descriptor)
    }

    /// Derive the descriptor from a statically typed resource
    pub fn for_resource<K>() -> Self
    where
        K: Resource<DynamicType = ()>,
    {
        Self::from_parts(&K::group(&()), &K::version(&()), &K::kind(&()), &K::plural(&()))
    }

    /// Derive the descriptor for a dynamically typed resource.
    ///
    /// Fails when the version, kind or plural is empty.
    pub fn for_api_resource(ar: &ApiResource) -> Result<Self> {
        if ar.version.is_empty() || ar.plural.is_empty() {
            return Err(Error::InvalidConfiguration(format!(
                "api resource {}/{} needs a version and a plural",
                ar.api_version, ar.kind
            )));
        }
        let Self {
            client,
            resource,
            kind,
        } = Self::from_parts(&ar.group, &ar.version, &ar.kind, &ar.plural);
        Self::new(client, resource, kind)
    }

    /// Derive the descriptor from raw API metadata
    pub fn from_parts(group: &str, version: &str, kind: &str, plural: &str) -> Self {
        Self {
            client: client_name(group, version),
            resource: resource_name(kind, plural),
            kind: kind.to_string(),
        }
    }

    /// Span name, `<client>/<resource>`
    pub fn span_name(&self) -> String {
        format!("{}/{}", self.client, self.resource)
    }
}

fn client_name(group: &str, version: &str) -> String {
    let group = match group.split('.').next() {
        Some(label) if !label.is_empty() => label.split('-').map(capitalize).collect(),
        _ => "Core".to_string(),
    };
    format!("{}{}", group, capitalize(version))
}

fn resource_name(kind: &str, plural: &str) -> String {
    let lower = kind.to_ascii_lowercase();
    if plural == lower {
        return kind.to_string();
    }
    if let Some(suffix) = plural.strip_prefix(lower.as_str()) {
        if suffix == "s" || suffix == "es" {
            return format!("{}{}", kind, suffix);
        }
    }
    if let (Some(stem), Some(kind_stem)) = (lower.strip_suffix('y'), kind.strip_suffix('y')) {
        if plural == format!("{}ies", stem) {
            return format!("{}ies", kind_stem);
        }
    }
    capitalize(plural)
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
