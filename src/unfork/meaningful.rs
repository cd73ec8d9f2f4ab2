//! Deciding whether a computed patch customizes anything beyond identity.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

const IDENTITY_KEYS: [&str; 3] = ["apiVersion", "kind", "metadata"];
const IDENTITY_METADATA_KEYS: [&str; 2] = ["name", "namespace"];

/// Which patches count as real customizations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MeaningfulnessRule {
    /// Only top-level keys other than apiVersion, kind and metadata count.
    #[default]
    TopLevel,
    /// Metadata keys other than name and namespace (labels, annotations,
    /// ...) count as well.
    IncludeMetadata,
}

/// Returns true when `patch` changes something other than the resource's
/// identity fields.
pub fn is_meaningful(patch: &[u8], rule: MeaningfulnessRule) -> Result<bool> {
    let decoded: Value = serde_yaml::from_slice(patch).map_err(|source| Error::PatchDecode { source })?;

    let fields = match decoded {
        Value::Null => return Ok(false),
        Value::Map(fields) => fields,
        other => {
            return Err(Error::PatchDecode {
                source: serde::de::Error::custom(format!("expected a mapping, got {}", other.type_name())),
            })
        }
    };

    if fields.keys().any(|key| !IDENTITY_KEYS.contains(&key.as_str())) {
        return Ok(true);
    }

    Ok(match rule {
        MeaningfulnessRule::TopLevel => false,
        MeaningfulnessRule::IncludeMetadata => fields
            .get("metadata")
            .and_then(Value::as_map)
            .is_some_and(|metadata| {
                metadata
                    .keys()
                    .any(|key| !IDENTITY_METADATA_KEYS.contains(&key.as_str()))
            }),
    })
}
