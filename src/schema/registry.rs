//! Lookup from a resource's group/version/kind to its merge strategy type.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::elements::{Schema, TypeDef, TypeRef, DEDUCED_TYPE_NAME};
use super::kubernetes::KUBERNETES_SCHEMA_YAML;
use crate::error::{Error, Result};

static KUBERNETES: Lazy<Registry> = Lazy::new(|| {
    Registry::from_yaml(KUBERNETES_SCHEMA_YAML).expect("built-in kubernetes schema should parse")
});

/// GroupVersionKind identifies a resource type. The core group is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersionKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        GroupVersionKind {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}, Kind={}", self.version, self.kind)
        } else {
            write!(f, "{}/{}, Kind={}", self.group, self.version, self.kind)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResourceType {
    #[serde(flatten)]
    gvk: GroupVersionKind,
    #[serde(rename = "type")]
    type_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    types: Vec<TypeDef>,
    #[serde(default)]
    resources: Vec<ResourceType>,
}

/// Registry pairs a schema with the resource types it describes.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schema: Schema,
    resources: HashMap<GroupVersionKind, String>,
}

impl Registry {
    /// Returns the built-in registry of common Kubernetes kinds.
    pub fn kubernetes() -> &'static Registry {
        &KUBERNETES
    }

    /// Parses a registry document with `types` and `resources` sections.
    ///
    /// Every resource must reference a type declared in the same document.
    pub fn from_yaml(yaml: &str) -> Result<Registry> {
        let file: RegistryFile = serde_yaml::from_str(yaml).map_err(|e| Error::Schema {
            message: format!("failed to parse schema: {}", e),
        })?;

        let schema = Schema::with_types(file.types);
        let mut resources = HashMap::new();
        for resource in file.resources {
            if schema.find_named_type(&resource.type_name).is_none() {
                return Err(Error::Schema {
                    message: format!(
                        "resource {} references unknown type {:?}",
                        resource.gvk, resource.type_name
                    ),
                });
            }
            resources.insert(resource.gvk, resource.type_name);
        }

        Ok(Registry { schema, resources })
    }

    /// Reads and parses a registry file.
    pub fn from_file(path: &Path) -> Result<Registry> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Registry::from_yaml(&content)
    }

    /// Adds the types and resources of `other`, which win on conflicts.
    pub fn extend(&mut self, other: Registry) {
        self.schema.extend(other.schema);
        self.resources.extend(other.resources);
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the type registered for the resource, if any.
    pub fn type_for(&self, gvk: &GroupVersionKind) -> Option<TypeRef> {
        self.resources.get(gvk).map(TypeRef::named)
    }

    /// Returns the fallback type used for unregistered resources.
    pub fn deduced_type(&self) -> TypeRef {
        TypeRef::named(DEDUCED_TYPE_NAME)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
