//! Package descriptors loaded from `package.json`

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::GeneratorError;
use crate::jsonld::NPMD_IRI;

/// Default entry point of the type declarations when `types` is absent
const DEFAULT_TYPES_ENTRY: &str = "index.d.ts";

/// Value of `lsd:module`: an explicit module IRI or `true` for the conventional layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModuleField {
    Iri(String),
    Flag(bool),
}

/// The subset of `package.json` the generator reads
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dependencies: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typings: Option<String>,
    #[serde(rename = "lsd:module", default, skip_serializing_if = "Option::is_none")]
    pub lsd_module: Option<ModuleField>,
    #[serde(rename = "lsd:components", default, skip_serializing_if = "Option::is_none")]
    pub lsd_components: Option<String>,
    #[serde(rename = "lsd:contexts", default, skip_serializing_if = "Option::is_none")]
    pub lsd_contexts: Option<IndexMap<String, String>>,
    #[serde(rename = "lsd:importPaths", default, skip_serializing_if = "Option::is_none")]
    pub lsd_import_paths: Option<IndexMap<String, String>>,
}

impl PackageJson {
    /// Read and preprocess the `package.json` at `path`
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        debug!("Loading package.json: {:?}", path);
        let content = fs::read_to_string(path).map_err(|source| GeneratorError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let mut package_json: PackageJson =
            serde_json::from_str(&content).map_err(|source| GeneratorError::ParseJson {
                path: path.to_path_buf(),
                source,
            })?;
        package_json.preprocess()?;
        Ok(package_json)
    }

    /// Expand `"lsd:module": true` into the conventional component layout
    ///
    /// Explicit `lsd:components`, `lsd:contexts` and `lsd:importPaths` entries
    /// are kept as they are.
    pub fn preprocess(&mut self) -> Result<(), GeneratorError> {
        if self.lsd_module != Some(ModuleField::Flag(true)) {
            return Ok(());
        }
        let module_iri = format!("{}{}", NPMD_IRI, self.name);
        let versioned = format!("{}/^{}.0.0/", module_iri, major_version(&self.name, &self.version)?);

        self.lsd_components
            .get_or_insert_with(|| "components/components.jsonld".to_string());
        self.lsd_contexts.get_or_insert_with(|| {
            IndexMap::from([(
                format!("{}components/context.jsonld", versioned),
                "components/context.jsonld".to_string(),
            )])
        });
        self.lsd_import_paths.get_or_insert_with(|| {
            IndexMap::from([
                (format!("{}components/", versioned), "components/".to_string()),
                (format!("{}config/", versioned), "config/".to_string()),
            ])
        });
        self.lsd_module = Some(ModuleField::Iri(module_iri));
        Ok(())
    }

    /// Module IRI, if this package is a components module
    pub fn module_iri(&self) -> Option<&str> {
        match &self.lsd_module {
            Some(ModuleField::Iri(iri)) => Some(iri),
            _ => None,
        }
    }
}

fn major_version(package: &str, version: &str) -> Result<u64, GeneratorError> {
    semver::Version::parse(version)
        .map(|v| v.major)
        .map_err(|source| GeneratorError::InvalidVersion {
            package: package.to_string(),
            version: version.to_string(),
            source,
        })
}

/// Metadata of a package whose components are being generated
#[derive(Debug, Clone, PartialEq)]
pub struct PackageDescriptor {
    pub root: PathBuf,
    pub name: String,
    pub version: String,
    pub major_version: u64,
    pub module_iri: String,
    pub components_path: Option<String>,
    /// Context IRI mapped to the file (relative to `root`) that holds it
    pub contexts: IndexMap<String, String>,
    /// Import IRI prefix mapped to the relative path prefix it stands for
    pub import_paths: IndexMap<String, String>,
    /// Custom JSON-LD prefix replacing the one derived from the name
    pub prefix: Option<String>,
    pub dependencies: IndexMap<String, String>,
    /// Extension-less types entry, relative to `root`
    pub types_entry: String,
}

impl PackageDescriptor {
    /// Load the descriptor of the package rooted at `root`
    pub fn load(root: &Path, prefix: Option<String>) -> Result<Self, GeneratorError> {
        let path = root.join("package.json");
        let package_json = PackageJson::load(&path)?;
        Self::from_package_json(root, package_json, prefix)
    }

    pub fn from_package_json(
        root: &Path,
        package_json: PackageJson,
        prefix: Option<String>,
    ) -> Result<Self, GeneratorError> {
        if package_json.name.is_empty() {
            return Err(GeneratorError::InvalidDescriptor {
                path: root.join("package.json"),
                message: "missing 'name'".to_string(),
            });
        }
        let Some(module_iri) = package_json.module_iri().map(str::to_string) else {
            return Err(GeneratorError::NotAModule(package_json.name));
        };
        let major_version = major_version(&package_json.name, &package_json.version)?;

        let types = package_json
            .types
            .or(package_json.typings)
            .unwrap_or_else(|| DEFAULT_TYPES_ENTRY.to_string());

        Ok(PackageDescriptor {
            root: root.to_path_buf(),
            name: package_json.name,
            version: package_json.version,
            major_version,
            module_iri,
            components_path: package_json.lsd_components,
            contexts: package_json.lsd_contexts.unwrap_or_default(),
            import_paths: package_json.lsd_import_paths.unwrap_or_default(),
            prefix,
            dependencies: package_json.dependencies,
            types_entry: strip_types_extension(&types).to_string(),
        })
    }

    /// Module IRI pinned to the major version range, with a trailing slash
    pub fn versioned_module_iri(&self) -> String {
        format!("{}/^{}.0.0/", self.module_iri, self.major_version)
    }

    /// Absolute, extension-less path of the types entry file
    pub fn types_path(&self) -> PathBuf {
        self.root.join(&self.types_entry)
    }

    pub fn context_iris(&self) -> Vec<String> {
        self.contexts.keys().cloned().collect()
    }

    /// Where the components index document is written
    pub fn index_path(&self) -> Option<PathBuf> {
        self.components_path.as_ref().map(|p| self.root.join(p))
    }

    /// Where the context document is written: the first declared context file
    pub fn context_path(&self) -> Option<PathBuf> {
        self.contexts.values().next().map(|p| self.root.join(p))
    }

    /// Map a path relative to the package root onto its import IRI
    pub fn import_path_iri(&self, relative: &str) -> Result<String, GeneratorError> {
        let relative = relative.strip_prefix('/').unwrap_or(relative);
        self.import_paths
            .iter()
            .find_map(|(iri, prefix)| {
                relative
                    .strip_prefix(prefix.as_str())
                    .map(|rest| format!("{}{}", iri, rest))
            })
            .ok_or_else(|| GeneratorError::MissingImportPath(relative.to_string()))
    }
}

fn strip_types_extension(entry: &str) -> &str {
    [".d.ts", ".ts", ".js"]
        .iter()
        .find_map(|ext| entry.strip_suffix(ext))
        .unwrap_or(entry)
}
