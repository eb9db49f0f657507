//! Locating dependency packages in `node_modules` directories

use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolve installed package directories the way Node resolves `require` paths
#[derive(Debug, Clone)]
pub struct NodeModuleLocator {
    /// `node_modules` directories from the main module up to the filesystem root
    import_paths: Vec<PathBuf>,
}

impl NodeModuleLocator {
    pub fn new(main_module_path: &Path) -> Self {
        debug!("Initializing node module locator for: {:?}", main_module_path);
        let import_paths = main_module_path
            .ancestors()
            .filter(|dir| !dir.ends_with("node_modules"))
            .map(|dir| dir.join("node_modules"))
            .collect();
        NodeModuleLocator { import_paths }
    }

    /// Return the `node_modules` directories searched, closest first
    pub fn import_paths(&self) -> &[PathBuf] {
        &self.import_paths
    }

    /// Directory of an installed package
    ///
    /// Returns the first import path holding `{name}/package.json`.
    pub fn find_package(&self, package_name: &str) -> Option<PathBuf> {
        self.import_paths
            .iter()
            .map(|dir| dir.join(package_name))
            .find(|dir| dir.join("package.json").is_file())
    }

    /// Directories of the given packages, in order
    ///
    /// Packages that are not installed are reported and skipped.
    pub fn find_packages(&self, package_names: &[String]) -> Vec<PathBuf> {
        package_names
            .iter()
            .filter_map(|name| {
                let found = self.find_package(name);
                if found.is_none() {
                    warn!("Could not resolve dependency package '{}' from {:?}", name, self.import_paths.first());
                }
                found
            })
            .collect()
    }
}
