//! # unfork
//!
//! Recovers a kustomize overlay from a forked copy of upstream Kubernetes
//! manifests.
//!
//! Given the upstream tree and the fork, every forked resource is paired with
//! the upstream resource it came from. Name prefixes the fork introduced
//! become JSON rename patches, remaining differences become strategic merge
//! patches, and resources with no upstream counterpart are kept whole.
//!
//! ## Modules
//!
//! - [`resource`] - Loading manifest trees and identifying resources
//! - [`unfork`] - Matching, renaming and building the overlay
//! - [`diff`] - Type-aware two-way diff between a pair of documents
//! - [`schema`] - Merge strategy schema and the Kubernetes type registry
//! - [`typed`] - Values paired with their schema type, and two-way patches
//! - [`value`] - In-memory representation of YAML/JSON documents
//! - [`kustomize`] - Writing an overlay out as a kustomize directory

pub mod config;
pub mod diff;
pub mod error;
pub mod kustomize;
pub mod resource;
pub mod schema;
pub mod typed;
pub mod unfork;
pub mod value;

pub use config::Options;
pub use diff::{DiffError, StrategicMergeDiff, TwoWayDiff};
pub use error::{Error, Result};
pub use kustomize::{write_overlay, Kustomization};
pub use resource::{Document, DocumentSet, Identity};
pub use schema::{GroupVersionKind, Registry, Schema};
pub use typed::TypedValue;
pub use unfork::{
    create_overlay, find_upstream_match, is_meaningful, MatchResult, MeaningfulnessRule, Overlay, OverlayBuilder,
    RenamePatch,
};
pub use value::Value;
