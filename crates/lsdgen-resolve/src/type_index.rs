//! Type index written by the analysis front end
//!
//! The front end stores one JSON document per package:
//!
//! ```json
//! {
//!   "files": { "index": { "exportedImportedAll": [{ "fileName": "lib/Foo" }] }, "lib/Foo": { ... } },
//!   "declarations": [ { "type": "class", "reference": { ... }, "constructor": { ... } } ]
//! }
//! ```
//!
//! Paths are extension-less and relative to the package root. Indexes of all
//! packages of a run are merged so re-exports across sibling packages resolve.

use ahash::AHashMap;
use indexmap::IndexMap;
use lsdgen_manifest::{normalize_path, ClassReference, DeclaredType, GeneratorError};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::exports::{ExportSource, FileExports};

#[derive(Debug, Default, Deserialize)]
struct TypeIndexDocument {
    #[serde(default)]
    files: IndexMap<PathBuf, FileExports>,
    #[serde(default)]
    declarations: Vec<DeclaredType>,
}

#[derive(Debug, Clone, Default)]
pub struct TypeIndex {
    files: IndexMap<PathBuf, FileExports>,
    /// Declarations keyed by (declaring file, local name)
    declarations: AHashMap<(PathBuf, String), DeclaredType>,
}

impl TypeIndex {
    /// Load the index at `path`, resolving relative paths against `root`
    pub fn load(path: &Path, root: &Path) -> Result<Self, GeneratorError> {
        debug!("Loading type index: {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| GeneratorError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, root).map_err(|source| GeneratorError::ParseJson {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str, root: &Path) -> Result<Self, serde_json::Error> {
        let document: TypeIndexDocument = serde_json::from_str(content)?;
        let mut index = TypeIndex::default();

        for (file, mut exports) in document.files {
            absolutize_exports(&mut exports, root);
            index.files.insert(resolve(root, &file), exports);
        }
        for mut declared in document.declarations {
            declared.absolutize(root);
            index.insert_declaration(declared);
        }
        Ok(index)
    }

    fn insert_declaration(&mut self, declared: DeclaredType) {
        let key = (
            declared.reference.file_name.clone(),
            declared.reference.local_name.to_string(),
        );
        self.declarations.insert(key, declared);
    }

    /// Add every file and declaration of `other`
    pub fn merge(&mut self, other: TypeIndex) {
        self.files.extend(other.files);
        self.declarations.extend(other.declarations);
    }

    /// Declaration of the type a reference points at
    pub fn declaration(&self, reference: &ClassReference) -> Option<&DeclaredType> {
        self.declarations.get(&(
            reference.file_name.clone(),
            reference.local_name.to_string(),
        ))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }
}

impl ExportSource for TypeIndex {
    fn file_exports(&self, _package_name: &str, file: &Path) -> Result<&FileExports, GeneratorError> {
        self.files
            .get(file)
            .ok_or_else(|| GeneratorError::MissingTypeIndexEntry(file.to_path_buf()))
    }
}

fn resolve(root: &Path, file: &Path) -> PathBuf {
    normalize_path(&root.join(file))
}

fn absolutize_exports(exports: &mut FileExports, root: &Path) {
    for element in exports.exported_imported_elements.values_mut() {
        element.file_name = resolve(root, &element.file_name);
    }
    for target in &mut exports.exported_imported_all {
        target.file_name = resolve(root, &target.file_name);
    }
    for reference in exports.imported_elements.values_mut() {
        reference.absolutize(root);
    }
}
