//! Type-aware diff between an upstream document and its forked counterpart.
//!
//! [`TwoWayDiff`] is the seam the overlay builder depends on; the
//! [`StrategicMergeDiff`] implementation resolves each resource's merge
//! strategy from a [`Registry`] and emits a kustomize-ready strategic merge
//! patch.

use thiserror::Error;

use crate::resource::{Document, Identity};
use crate::schema::{GroupVersionKind, Registry};
use crate::typed::TypedValue;
use crate::value::{self, Map, Value};

/// Reasons a pair of documents cannot be diffed. Both are recoverable: the
/// forked document is dropped from the overlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiffError {
    /// The input does not decode to exactly one resource.
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),

    /// No merge strategy is known for the resource type.
    #[error("no merge strategy known for {0}")]
    UnknownType(GroupVersionKind),
}

/// Computes the patch that turns `original` into `modified`.
pub trait TwoWayDiff {
    fn diff(&self, original: &Document, modified: &Document) -> Result<Vec<u8>, DiffError>;
}

/// Strategic merge patch generation backed by a schema registry.
#[derive(Debug, Clone)]
pub struct StrategicMergeDiff {
    registry: Registry,
    deduce_unknown_types: bool,
}

impl StrategicMergeDiff {
    pub fn new(registry: Registry) -> Self {
        StrategicMergeDiff {
            registry,
            deduce_unknown_types: false,
        }
    }

    /// Uses the built-in Kubernetes registry.
    pub fn kubernetes() -> Self {
        StrategicMergeDiff::new(Registry::kubernetes().clone())
    }

    /// Diffs unregistered kinds with the deduced type instead of failing
    /// with [`DiffError::UnknownType`].
    pub fn deduce_unknown_types(mut self, deduce: bool) -> Self {
        self.deduce_unknown_types = deduce;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl TwoWayDiff for StrategicMergeDiff {
    fn diff(&self, original: &Document, modified: &Document) -> Result<Vec<u8>, DiffError> {
        let original_value = decode_single_resource(original)?;
        let modified_value = decode_single_resource(modified)?;

        let gvk = original.identity().group_version_kind();
        let type_ref = match self.registry.type_for(&gvk) {
            Some(type_ref) => type_ref,
            None if self.deduce_unknown_types => self.registry.deduced_type(),
            None => return Err(DiffError::UnknownType(gvk)),
        };

        let schema = self.registry.schema();
        let shape_error = |e: crate::typed::TypedError| DiffError::UnsupportedShape(e.to_string());
        let original_typed = TypedValue::new(Value::Map(original_value), schema, type_ref.clone()).map_err(shape_error)?;
        let modified_typed = TypedValue::new(Value::Map(modified_value), schema, type_ref).map_err(shape_error)?;
        let changes = original_typed.two_way_patch(&modified_typed).map_err(shape_error)?;

        let mut patch = patch_header(modified.identity());
        patch.overlay(changes);

        value::to_yaml(&Value::Map(patch))
            .map(String::into_bytes)
            .map_err(|e| DiffError::UnsupportedShape(format!("failed to encode patch: {}", e)))
    }
}

/// Decodes a document that must hold exactly one resource mapping. Empty
/// documents in the stream are ignored; lists of resources are rejected.
fn decode_single_resource(document: &Document) -> Result<Map, DiffError> {
    let unsupported = |reason: String| DiffError::UnsupportedShape(format!("{}: {}", document.key(), reason));

    let content = std::str::from_utf8(document.bytes()).map_err(|e| unsupported(e.to_string()))?;
    let documents = value::from_yaml_stream(content).map_err(|e| unsupported(e.to_string()))?;

    let mut resources = documents.into_iter().filter(|d| !d.is_null());
    match (resources.next(), resources.next()) {
        (Some(Value::Map(map)), None) => {
            let kind = map.get("kind").and_then(Value::as_str).unwrap_or_default();
            if kind.ends_with("List") && map.get("items").is_some_and(Value::is_list) {
                return Err(unsupported(format!("cannot handle a {} of resources", kind)));
            }
            Ok(map)
        }
        (Some(other), None) => Err(unsupported(format!("expected a mapping, got {}", other.type_name()))),
        (None, _) => Err(unsupported("no resource found".to_string())),
        (Some(_), Some(_)) => Err(unsupported("cannot handle more than one resource".to_string())),
    }
}

/// The identity fields kustomize needs to find the patch target.
fn patch_header(identity: &Identity) -> Map {
    let mut metadata = Map::new();
    metadata.set("name", Value::String(identity.name.clone()));
    if !identity.namespace.is_empty() {
        metadata.set("namespace", Value::String(identity.namespace.clone()));
    }

    let mut header = Map::new();
    header.set("apiVersion", Value::String(identity.api_version.clone()));
    header.set("kind", Value::String(identity.kind.clone()));
    header.set("metadata", Value::Map(metadata));
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;

    const DEPLOYMENT: &str = r#"apiVersion: apps/v1
kind: Deployment
metadata:
  name: nginx-deployment
spec:
  replicas: 3
"#;

    const DATABASE: &str = r#"apiVersion: databases.schemahero.io/v1alpha2
kind: Database
metadata:
  name: rds-postgres
  namespace: default
connection:
  postgres:
    host: db
"#;

    fn doc(key: &str, content: &str) -> Document {
        Document::from_bytes(key, content).unwrap()
    }

    fn patch_value(bytes: Vec<u8>) -> Value {
        from_yaml(std::str::from_utf8(&bytes).unwrap()).unwrap()
    }

    #[test]
    fn test_patch_carries_identity_header() {
        let modified = DEPLOYMENT.replace("replicas: 3", "replicas: 5");
        let patch = StrategicMergeDiff::kubernetes()
            .diff(&doc("a.yaml", DEPLOYMENT), &doc("a.yaml", &modified))
            .unwrap();
        assert_eq!(
            patch_value(patch),
            from_yaml("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: nginx-deployment\nspec:\n  replicas: 5\n").unwrap()
        );
    }

    #[test]
    fn test_namespace_only_change_stays_in_metadata() {
        let modified = DEPLOYMENT.replace("  name: nginx-deployment\n", "  name: nginx-deployment\n  namespace: default\n");
        let patch = StrategicMergeDiff::kubernetes()
            .diff(&doc("a.yaml", DEPLOYMENT), &doc("a.yaml", &modified))
            .unwrap();
        assert_eq!(
            patch_value(patch),
            from_yaml("apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: nginx-deployment\n  namespace: default\n").unwrap()
        );
    }

    #[test]
    fn test_unknown_kind_is_rejected_unless_deduced() {
        let modified = DATABASE.replace("host: db", "host: db.internal");
        let original = doc("db.yaml", DATABASE);
        let modified = doc("db.yaml", &modified);

        let err = StrategicMergeDiff::kubernetes().diff(&original, &modified).unwrap_err();
        assert_eq!(
            err,
            DiffError::UnknownType(GroupVersionKind::new("databases.schemahero.io", "v1alpha2", "Database"))
        );

        let patch = StrategicMergeDiff::kubernetes()
            .deduce_unknown_types(true)
            .diff(&original, &modified)
            .unwrap();
        assert_eq!(
            patch_value(patch).lookup(&["connection", "postgres", "host"]),
            Some(&Value::String("db.internal".to_string()))
        );
    }

    #[test]
    fn test_multiple_resources_are_unsupported() {
        let stream = format!("{}---\n{}", DEPLOYMENT, DEPLOYMENT.replace("nginx-deployment", "other"));
        let err = StrategicMergeDiff::kubernetes()
            .diff(&doc("a.yaml", DEPLOYMENT), &doc("a.yaml", &stream))
            .unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedShape(ref m) if m.contains("more than one")), "{:?}", err);
    }

    #[test]
    fn test_trailing_empty_document_is_ignored() {
        let with_separator = format!("{}---\n", DEPLOYMENT);
        assert!(StrategicMergeDiff::kubernetes()
            .diff(&doc("a.yaml", DEPLOYMENT), &doc("a.yaml", &with_separator))
            .is_ok());
    }

    #[test]
    fn test_resource_lists_are_unsupported() {
        let list = "apiVersion: v1\nkind: List\nitems:\n- apiVersion: v1\n  kind: Service\n";
        let err = StrategicMergeDiff::kubernetes()
            .diff(&doc("l.yaml", list), &doc("l.yaml", list))
            .unwrap_err();
        assert!(matches!(err, DiffError::UnsupportedShape(_)));
    }
}
