//! Mapping of source files onto generated component files

use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

use crate::errors::GeneratorError;

/// Source and destination directories of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathDestination {
    /// Absolute path to the package root
    pub package_root: PathBuf,
    /// Absolute path to the source directory
    pub source_dir: PathBuf,
    /// Absolute path to the components directory
    pub destination_dir: PathBuf,
}

impl PathDestination {
    pub fn new(package_root: &Path, source: &str, destination: &str) -> Self {
        PathDestination {
            package_root: package_root.to_path_buf(),
            source_dir: package_root.join(source.trim_end_matches('/')),
            destination_dir: package_root.join(destination.trim_end_matches('/')),
        }
    }

    /// Where the components of a source file are written (without extension)
    ///
    /// Files outside the source directory keep their location.
    pub fn destination_of(&self, source_path: &Path) -> Result<PathBuf, GeneratorError> {
        self.ensure_inside(source_path)?;
        Ok(match source_path.strip_prefix(&self.source_dir) {
            Ok(rest) => self.destination_dir.join(rest),
            Err(_) => source_path.to_path_buf(),
        })
    }

    /// Path relative to the package root, `/`-separated
    pub fn relative(&self, path: &Path) -> Result<String, GeneratorError> {
        self.ensure_inside(path)?;
        let stripped = path
            .strip_prefix(&self.package_root)
            .map_err(|_| GeneratorError::OutsidePackage(path.to_path_buf()))?;
        let parts: Vec<String> = stripped
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Ok(parts.join("/"))
    }

    fn ensure_inside(&self, path: &Path) -> Result<(), GeneratorError> {
        if path.starts_with(&self.package_root) && path != self.package_root {
            Ok(())
        } else {
            Err(GeneratorError::OutsidePackage(path.to_path_buf()))
        }
    }
}

/// Lexically resolve `.` and `..` components
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let leading_parent = matches!(
                    normalized.components().next_back(),
                    Some(Component::ParentDir)
                );
                if leading_parent || !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Append `.{extension}` to a path without touching dots already in the file name
pub fn with_appended_extension(path: &Path, extension: &str) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_owned();
    os.push(".");
    os.push(extension);
    PathBuf::from(os)
}
