//! Schema module defines the merge strategy of each resource type.
//!
//! The schema language describes, per field, whether a container is merged
//! item by item or replaced as a whole, and which fields identify the items
//! of an associative list. The registry maps Kubernetes group/version/kind
//! triples onto named schema types.

mod elements;
mod kubernetes;
mod registry;

pub use elements::*;
pub use kubernetes::KUBERNETES_SCHEMA_YAML;
pub use registry::{GroupVersionKind, Registry};
