//! Unfork module - recovering an overlay from an upstream tree and its fork.
//!
//! [`find_upstream_match`] pairs each forked resource with its origin,
//! [`build_rename`] records name prefixes the fork introduced, and
//! [`OverlayBuilder`] drives both over whole trees.

mod builder;
mod matcher;
mod meaningful;
mod rename;

pub use builder::{Overlay, OverlayBuilder};
pub use matcher::{find_upstream_match, MatchResult};
pub use meaningful::{is_meaningful, MeaningfulnessRule};
pub use rename::{build_rename, rewrite_name, split_api_version, JsonPatchOperation, PatchTarget, RenamePatch};

use std::path::Path;

use log::info;

use crate::config::Options;
use crate::error::Result;
use crate::resource::DocumentSet;

/// Loads both trees from disk and builds their overlay with `options`.
pub fn create_overlay(upstream_root: &Path, forked_root: &Path, options: &Options) -> Result<Overlay> {
    let upstream = DocumentSet::load(upstream_root)?;
    let forked = DocumentSet::load(forked_root)?;
    info!(
        "loaded {} upstream and {} forked resources",
        upstream.len(),
        forked.len()
    );

    let diff = options.differ()?;
    OverlayBuilder::new(&diff)
        .meaningfulness(options.meaningfulness)
        .build(&upstream, &forked)
}
