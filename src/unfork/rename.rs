//! Rename patches for upstream resources the fork gave a name prefix.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::resource::{Document, Identity};

/// PatchTarget identifies the upstream resource a rename applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchTarget {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub group: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub name: String,
}

/// One RFC 6902 operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonPatchOperation {
    pub op: String,
    pub path: String,
    pub value: String,
}

/// RenamePatch is a JSON patch renaming one upstream resource, plus the
/// target that tells the consumer which resource to apply it to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePatch {
    pub target: PatchTarget,
    pub operations: Vec<JsonPatchOperation>,
}

impl RenamePatch {
    /// Serializes the operations as a JSON patch document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.operations)?)
    }

    /// The name the target resource ends up with.
    pub fn new_name(&self) -> &str {
        self.operations
            .iter()
            .rev()
            .find(|op| op.path == "/metadata/name")
            .map(|op| op.value.as_str())
            .unwrap_or(&self.target.name)
    }
}

/// Splits an apiVersion at its first `/`. Without a separator the whole
/// apiVersion is the group and the version is empty.
pub fn split_api_version(identity: &Identity) -> Result<(String, String)> {
    let malformed = || Error::MalformedIdentity {
        api_version: identity.api_version.clone(),
        kind: identity.kind.clone(),
        name: identity.name.clone(),
    };

    match identity.api_version.split_once('/') {
        None => Ok((identity.api_version.clone(), String::new())),
        Some((group, version)) if group.is_empty() || version.is_empty() || version.contains('/') => Err(malformed()),
        Some((group, version)) => Ok((group.to_string(), version.to_string())),
    }
}

/// Replaces the first occurrence of `name: <name>` with
/// `name: <prefix><name>`. The match is textual and may hit a label or
/// reference that precedes `metadata.name`.
pub fn rewrite_name(content: &str, name: &str, prefix: &str) -> String {
    content.replacen(&format!("name: {}", name), &format!("name: {}{}", prefix, name), 1)
}

/// Builds the rename patch for `upstream` and the upstream document as it
/// reads after the rename, for diffing against the fork.
pub fn build_rename(upstream: &Document, prefix: &str) -> Result<(RenamePatch, Document)> {
    debug_assert!(!prefix.is_empty(), "rename prefix must not be empty");
    let identity = upstream.identity();
    let (group, version) = split_api_version(identity)?;

    let patch = RenamePatch {
        target: PatchTarget {
            group,
            version,
            kind: identity.kind.clone(),
            namespace: identity.namespace.clone(),
            name: identity.name.clone(),
        },
        operations: vec![JsonPatchOperation {
            op: "replace".to_string(),
            path: "/metadata/name".to_string(),
            value: format!("{}{}", prefix, identity.name),
        }],
    };

    let rewritten = rewrite_name(&upstream.content(), &identity.name, prefix);
    let renamed = upstream.with_bytes(rewritten).ok_or_else(|| Error::RenameLostIdentity {
        key: upstream.key().to_string(),
    })?;

    Ok((patch, renamed))
}
