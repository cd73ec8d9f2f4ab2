//! Run options shared by the library entry points and the CLI.

use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::diff::StrategicMergeDiff;
use crate::error::Result;
use crate::schema::Registry;
use crate::unfork::MeaningfulnessRule;

/// Options controls how an overlay is computed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    pub meaningfulness: MeaningfulnessRule,
    /// Extra registry file whose types and resources extend the built-in
    /// Kubernetes registry.
    pub schema: Option<PathBuf>,
    /// Diff kinds missing from the registry with the deduced type.
    pub deduce_unknown_types: bool,
}

impl Options {
    /// Returns the built-in registry, extended by [`Options::schema`] if set.
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::kubernetes().clone();
        if let Some(path) = &self.schema {
            let custom = Registry::from_file(path)?;
            debug!("extending registry with {} resources from {}", custom.len(), path.display());
            registry.extend(custom);
        }
        Ok(registry)
    }

    /// Builds the diff implementation these options describe.
    pub fn differ(&self) -> Result<StrategicMergeDiff> {
        Ok(StrategicMergeDiff::new(self.registry()?).deduce_unknown_types(self.deduce_unknown_types))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::GroupVersionKind;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.meaningfulness, MeaningfulnessRule::TopLevel);
        assert!(options.schema.is_none());
        assert!(!options.deduce_unknown_types);
        assert_eq!(options.registry().unwrap().len(), Registry::kubernetes().len());
    }

    #[test]
    fn test_schema_file_extends_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(
            &path,
            "types:\n- name: database\n  map:\n    elementType:\n      namedType: __untyped_deduced_\nresources:\n- {group: databases.schemahero.io, version: v1alpha2, kind: Database, type: database}\n",
        )
        .unwrap();

        let options = Options {
            schema: Some(path),
            ..Options::default()
        };
        let registry = options.registry().unwrap();
        assert!(registry
            .type_for(&GroupVersionKind::new("databases.schemahero.io", "v1alpha2", "Database"))
            .is_some());
    }

    #[test]
    fn test_missing_schema_file_is_an_error() {
        let options = Options {
            schema: Some(PathBuf::from("/nonexistent/schema.yaml")),
            ..Options::default()
        };
        assert!(matches!(options.differ(), Err(Error::Io { .. })));
    }

    #[test]
    fn test_options_from_yaml() {
        let options: Options = serde_yaml::from_str("meaningfulness: include-metadata\ndeduceUnknownTypes: true\n").unwrap();
        assert_eq!(options.meaningfulness, MeaningfulnessRule::IncludeMetadata);
        assert!(options.deduce_unknown_types);
    }
}
