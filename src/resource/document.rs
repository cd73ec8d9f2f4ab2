//! Documents and the keyed sets loaded from each tree.

use std::borrow::Cow;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, trace};
use walkdir::WalkDir;

use super::identity::{classify, Identity};
use crate::error::{Error, Result};

/// Document is the raw content of one resource file plus its decoded identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    key: String,
    bytes: Vec<u8>,
    identity: Identity,
}

impl Document {
    /// Creates a document if `bytes` classify as a resource.
    pub fn from_bytes(key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Option<Document> {
        let bytes = bytes.into();
        let identity = classify(&bytes)?;
        Some(Document {
            key: key.into(),
            bytes,
            identity,
        })
    }

    /// Returns a new document with the same key and different content.
    pub fn with_bytes(&self, bytes: impl Into<Vec<u8>>) -> Option<Document> {
        Document::from_bytes(self.key.clone(), bytes)
    }

    /// The stable key of the document inside its set.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The last `/`-separated segment of the key.
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn content(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}

/// DocumentSet maps keys to documents, iterated in lexicographic key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSet {
    documents: BTreeMap<String, Document>,
}

impl DocumentSet {
    pub fn new() -> Self {
        DocumentSet::default()
    }

    /// Loads every resource file under `root`.
    ///
    /// Keys are paths relative to `root` joined with `/`. Links to files are
    /// read, links to directories are not descended into. Files that do not
    /// classify as resources are skipped; any I/O failure aborts the load.
    pub fn load(root: &Path) -> Result<DocumentSet> {
        let mut set = DocumentSet::new();

        for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|source| Error::Walk {
                path: source.path().unwrap_or(root).to_path_buf(),
                source,
            })?;
            let path = entry.path();
            let file_type = entry.file_type();
            if file_type.is_symlink() && !path.is_file() {
                debug!("skipping {}: link does not point at a file", path.display());
                continue;
            }
            if !file_type.is_file() && !file_type.is_symlink() {
                continue;
            }

            let bytes = std::fs::read(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;

            let key = relative_key(root, path);
            match Document::from_bytes(key, bytes) {
                Some(document) => {
                    trace!("loaded {} as {:?}", document.key(), document.identity());
                    set.insert(document);
                }
                None => debug!("skipping {}: not a resource", path.display()),
            }
        }

        Ok(set)
    }

    /// Builds a set from in-memory `(key, bytes)` pairs, skipping entries that
    /// are not resources.
    pub fn from_entries<I, K, B>(entries: I) -> DocumentSet
    where
        I: IntoIterator<Item = (K, B)>,
        K: Into<String>,
        B: Into<Vec<u8>>,
    {
        let documents = entries
            .into_iter()
            .filter_map(|(key, bytes)| Document::from_bytes(key, bytes))
            .map(|document| (document.key.clone(), document))
            .collect();
        DocumentSet { documents }
    }

    /// Inserts a document, returning the one it replaced.
    pub fn insert(&mut self, document: Document) -> Option<Document> {
        self.documents.insert(document.key.clone(), document)
    }

    pub fn get(&self, key: &str) -> Option<&Document> {
        self.documents.get(key)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, Document> {
        self.documents.values()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<'a> IntoIterator for &'a DocumentSet {
    type Item = &'a Document;
    type IntoIter = btree_map::Values<'a, String, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let key = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    if key.is_empty() {
        // `root` itself is a file
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVICE: &str = "apiVersion: v1\nkind: Service\nmetadata:\n  name: web\n";

    #[test]
    fn test_load_walks_tree_and_skips_non_resources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("base/nested")).unwrap();
        std::fs::write(dir.path().join("base/nested/service.yaml"), SERVICE).unwrap();
        std::fs::write(dir.path().join("README.md"), "# hello\n").unwrap();
        std::fs::write(dir.path().join("config.yaml"), "replicas: 3\n").unwrap();

        let set = DocumentSet::load(dir.path()).unwrap();
        assert_eq!(set.len(), 1);
        let document = set.get("base/nested/service.yaml").unwrap();
        assert_eq!(document.file_name(), "service.yaml");
        assert_eq!(document.identity().name, "web");
        assert_eq!(document.content(), SERVICE);
    }

    #[cfg(unix)]
    #[test]
    fn test_load_reads_linked_files() {
        let dir = tempfile::tempdir().unwrap();
        let shared = dir.path().join("shared");
        let tree = dir.path().join("tree");
        std::fs::create_dir_all(&shared).unwrap();
        std::fs::create_dir_all(&tree).unwrap();
        std::fs::write(shared.join("service.yaml"), SERVICE).unwrap();
        std::os::unix::fs::symlink(shared.join("service.yaml"), tree.join("linked.yaml")).unwrap();
        std::os::unix::fs::symlink(&shared, tree.join("linked-dir")).unwrap();
        std::os::unix::fs::symlink(shared.join("missing.yaml"), tree.join("dangling.yaml")).unwrap();

        let set = DocumentSet::load(&tree).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("linked.yaml").unwrap().identity().name, "web");
    }

    #[test]
    fn test_load_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = DocumentSet::load(&missing).unwrap_err();
        assert!(matches!(err, Error::Walk { ref path, .. } if path == &missing), "{:?}", err);
    }

    #[test]
    fn test_from_entries_orders_by_key() {
        let set = DocumentSet::from_entries([
            ("b.yaml", SERVICE),
            ("notes.txt", "just text"),
            ("a.yaml", SERVICE),
        ]);
        let keys: Vec<&str> = set.iter().map(Document::key).collect();
        assert_eq!(keys, vec!["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_with_bytes_reclassifies() {
        let document = Document::from_bytes("svc.yaml", SERVICE).unwrap();
        let renamed = document.with_bytes(SERVICE.replace("name: web", "name: x-web")).unwrap();
        assert_eq!(renamed.key(), "svc.yaml");
        assert_eq!(renamed.identity().name, "x-web");
        assert!(document.with_bytes("plain text").is_none());
    }
}
