//! Turning an upstream tree and its fork into a kustomize overlay.

use std::collections::{BTreeMap, HashSet};

use log::{debug, info, warn};

use super::matcher::find_upstream_match;
use super::meaningful::{is_meaningful, MeaningfulnessRule};
use super::rename::{build_rename, RenamePatch};
use crate::diff::TwoWayDiff;
use crate::error::Result;
use crate::resource::DocumentSet;

/// Overlay is the set of files that, layered over upstream, reproduce the fork.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overlay {
    /// Forked resources with no upstream counterpart, by base file name.
    pub resources: BTreeMap<String, Vec<u8>>,
    /// Strategic merge patches, by base file name of the forked document.
    pub patches: BTreeMap<String, Vec<u8>>,
    /// Renames of upstream resources, in the order they were discovered.
    pub rename_patches: Vec<RenamePatch>,
}

impl Overlay {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.patches.is_empty() && self.rename_patches.is_empty()
    }
}

/// OverlayBuilder pairs forked documents with upstream ones and collects the
/// differences.
pub struct OverlayBuilder<'d, D: TwoWayDiff + ?Sized> {
    diff: &'d D,
    rule: MeaningfulnessRule,
}

impl<'d, D: TwoWayDiff + ?Sized> OverlayBuilder<'d, D> {
    pub fn new(diff: &'d D) -> Self {
        OverlayBuilder {
            diff,
            rule: MeaningfulnessRule::default(),
        }
    }

    pub fn meaningfulness(mut self, rule: MeaningfulnessRule) -> Self {
        self.rule = rule;
        self
    }

    /// Computes the overlay that turns `upstream` into `forked`.
    ///
    /// Forked documents are visited in key order. A name prefix discovered on
    /// one document is suspected on every later one, whatever its kind.
    pub fn build(&self, upstream: &DocumentSet, forked: &DocumentSet) -> Result<Overlay> {
        let mut working = upstream.clone();
        let mut global_prefix = String::new();
        let mut renamed: HashSet<String> = HashSet::new();
        let mut overlay = Overlay::default();

        for document in forked {
            let found = find_upstream_match(document.identity(), &working, &global_prefix);
            let Some(upstream_key) = found.upstream_key else {
                debug!("{} has no upstream counterpart", document.key());
                insert_unique(&mut overlay.resources, document.file_name(), document.bytes());
                continue;
            };

            if !found.prefix.is_empty() {
                global_prefix = found.prefix;
                if renamed.insert(upstream_key.clone()) {
                    if let Some(original) = working.get(&upstream_key) {
                        let (patch, rewritten) = build_rename(original, &global_prefix)?;
                        debug!(
                            "renaming upstream {} {:?} to {:?}",
                            patch.target.kind,
                            patch.target.name,
                            patch.new_name()
                        );
                        overlay.rename_patches.push(patch);
                        working.insert(rewritten);
                    }
                }
            }

            let Some(original) = working.get(&upstream_key) else {
                continue;
            };

            let patch = match self.diff.diff(original, document) {
                Ok(patch) => patch,
                Err(e) => {
                    debug!("dropping {}: {}", document.key(), e);
                    continue;
                }
            };

            if is_meaningful(&patch, self.rule)? {
                insert_unique(&mut overlay.patches, document.file_name(), &patch);
            } else {
                debug!("{} only differs in identity", document.key());
            }
        }

        info!(
            "overlay has {} resources, {} patches and {} renames",
            overlay.resources.len(),
            overlay.patches.len(),
            overlay.rename_patches.len()
        );
        Ok(overlay)
    }
}

fn insert_unique(files: &mut BTreeMap<String, Vec<u8>>, name: &str, bytes: &[u8]) {
    if files.insert(name.to_string(), bytes.to_vec()).is_some() {
        warn!("{} appears more than once in the fork, keeping the last one", name);
    }
}
