//! Minimal resource identity and the filter that decides what is a resource.

use serde::{Deserialize, Serialize};

use crate::schema::GroupVersionKind;

/// Identity is the part of a document that names its role in the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    /// Empty for cluster-scoped or unqualified resources.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MinimalResource {
    api_version: Option<String>,
    kind: Option<String>,
    metadata: Option<MinimalMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MinimalMetadata {
    name: Option<String>,
    namespace: Option<String>,
}

/// Decodes the identity of the first YAML document in `bytes`.
///
/// Returns None for anything that is not a typed resource: undecodable
/// content, a document that is not a mapping, or a missing apiVersion or
/// kind. Later documents of a multi-document stream are not inspected.
pub fn classify(bytes: &[u8]) -> Option<Identity> {
    let document = serde_yaml::Deserializer::from_slice(bytes).next()?;
    let resource = MinimalResource::deserialize(document).ok()?;

    let api_version = resource.api_version.unwrap_or_default();
    let kind = resource.kind.unwrap_or_default();
    if api_version.is_empty() || kind.is_empty() {
        return None;
    }

    let metadata = resource.metadata.unwrap_or_default();
    Some(Identity {
        api_version,
        kind,
        name: metadata.name.unwrap_or_default(),
        namespace: metadata.namespace.unwrap_or_default(),
    })
}

impl Identity {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Identity {
            api_version: api_version.into(),
            kind: kind.into(),
            name: name.into(),
            namespace: String::new(),
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Namespaces are compatible when either is empty or both are equal.
    pub fn namespace_compatible(&self, other: &Identity) -> bool {
        self.namespace.is_empty() || other.namespace.is_empty() || self.namespace == other.namespace
    }

    /// Returns the Kubernetes group/version/kind. An apiVersion without a
    /// `/` belongs to the core group.
    pub fn group_version_kind(&self) -> GroupVersionKind {
        match self.api_version.split_once('/') {
            Some((group, version)) => GroupVersionKind::new(group, version, &self.kind),
            None => GroupVersionKind::new("", &self.api_version, &self.kind),
        }
    }
}
