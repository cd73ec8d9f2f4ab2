//! Writing an [`Overlay`] out as a kustomize directory.

use std::collections::HashSet;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::unfork::{Overlay, PatchTarget};

const RESOURCES_DIR: &str = "resources";
const PATCHES_DIR: &str = "patches";

/// The `kustomization.yaml` of a generated overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    pub api_version: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bases: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches_strategic_merge: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patches_json6902: Vec<Json6902Patch>,
}

impl Default for Kustomization {
    fn default() -> Self {
        Kustomization {
            api_version: "kustomize.config.k8s.io/v1beta1".to_string(),
            kind: "Kustomization".to_string(),
            bases: Vec::new(),
            resources: Vec::new(),
            patches_strategic_merge: Vec::new(),
            patches_json6902: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Json6902Patch {
    pub target: PatchTarget,
    pub path: String,
}

/// Writes `overlay` under `out_dir` and returns the kustomization written
/// alongside it.
pub fn write_overlay(overlay: &Overlay, out_dir: &Path, bases: &[String]) -> Result<Kustomization> {
    let mut kustomization = Kustomization {
        bases: bases.to_vec(),
        ..Kustomization::default()
    };

    create_dir(out_dir)?;

    if !overlay.resources.is_empty() {
        create_dir(&out_dir.join(RESOURCES_DIR))?;
    }
    for (name, bytes) in &overlay.resources {
        let relative = format!("{}/{}", RESOURCES_DIR, name);
        write_file(&out_dir.join(&relative), bytes)?;
        kustomization.resources.push(relative);
    }

    if !overlay.patches.is_empty() || !overlay.rename_patches.is_empty() {
        create_dir(&out_dir.join(PATCHES_DIR))?;
    }
    for (name, bytes) in &overlay.patches {
        let relative = format!("{}/{}", PATCHES_DIR, name);
        write_file(&out_dir.join(&relative), bytes)?;
        kustomization.patches_strategic_merge.push(relative);
    }

    let mut used: HashSet<String> = kustomization.patches_strategic_merge.iter().cloned().collect();
    for rename in &overlay.rename_patches {
        let relative = rename_patch_path(&rename.target, &mut used);
        write_file(&out_dir.join(&relative), rename.to_json()?.as_bytes())?;
        kustomization.patches_json6902.push(Json6902Patch {
            target: rename.target.clone(),
            path: relative,
        });
    }

    let manifest = serde_yaml::to_string(&kustomization)?;
    write_file(&out_dir.join("kustomization.yaml"), manifest.as_bytes())?;
    info!("wrote overlay to {}", out_dir.display());

    Ok(kustomization)
}

/// `patches/rename-<kind>[-<namespace>]-<name>.json`, with a numeric suffix
/// when two targets would share a file.
fn rename_patch_path(target: &PatchTarget, used: &mut HashSet<String>) -> String {
    let mut stem = format!("rename-{}", target.kind.to_lowercase());
    if !target.namespace.is_empty() {
        stem.push('-');
        stem.push_str(&target.namespace);
    }
    stem.push('-');
    stem.push_str(&target.name);

    let mut relative = format!("{}/{}.json", PATCHES_DIR, stem);
    let mut index = 2;
    while !used.insert(relative.clone()) {
        relative = format!("{}/{}-{}.json", PATCHES_DIR, stem, index);
        index += 1;
    }
    relative
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    debug!("writing {}", path.display());
    std::fs::write(path, bytes).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
