//! Resource module - loading trees of manifests and identifying resources.

mod document;
mod identity;

pub use document::{Document, DocumentSet};
pub use identity::{classify, Identity};
