use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal conditions of a generation run
///
/// Every variant aborts the whole run; nothing is written for a package that
/// produced one of these.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse JSON in {path}: {source}")]
    ParseJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid version '{version}' of package {package}: {source}")]
    InvalidVersion {
        package: String,
        version: String,
        #[source]
        source: semver::Error,
    },

    #[error("Invalid package.json at {path}: {message}")]
    InvalidDescriptor { path: PathBuf, message: String },

    #[error("Package {0} is not a components module: 'lsd:module' is missing in its package.json")]
    NotAModule(String),

    #[error("Tried to reference a class '{local_name}' from an external module '{package_name}' that is not a dependency")]
    NotADependency {
        local_name: String,
        package_name: String,
    },

    #[error("Tried to reference a class '{local_name}' from an external module '{package_name}' that does not expose this component")]
    ComponentNotExposed {
        local_name: String,
        package_name: String,
    },

    #[error("JSON parsing error in default value of {field_id}: {message}")]
    InvalidJsonDefault { field_id: String, message: String },

    #[error("Composition of nested fields is unsupported (in {field_id})")]
    NestedComposition { field_id: String },

    #[error("Detected illegal indexed element inside a non-field in {local_name} at {file}")]
    IllegalIndexedElement { local_name: String, file: PathBuf },

    #[error("Tried to reference a file outside the current package: {0}")]
    OutsidePackage(PathBuf),

    #[error("Could not find a valid import path for {0}. 'lsd:importPaths' in package.json may be invalid.")]
    MissingImportPath(String),

    #[error("No entry for file {0} in the type index")]
    MissingTypeIndexEntry(PathBuf),

    #[error("Could not load exported '{local_name}' from {file}: no declaration found in the type index")]
    MissingDeclaration { local_name: String, file: PathBuf },
}
