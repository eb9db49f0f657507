//! Snapshot of the dependency packages needed for one generation run

use ahash::AHashSet;
use indexmap::IndexMap;
use lsdgen_manifest::{GeneratorError, PackageJson};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::locator::NodeModuleLocator;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleState {
    pub main_module_path: PathBuf,
    pub node_module_import_paths: Vec<PathBuf>,
    /// Package directories in the order they were discovered
    pub node_module_paths: Vec<PathBuf>,
    #[serde(skip)]
    pub package_jsons: IndexMap<PathBuf, PackageJson>,
    /// Module IRI mapped to the absolute path of its components index
    pub component_modules: IndexMap<String, PathBuf>,
    /// Context IRI mapped to the parsed context document
    pub contexts: IndexMap<String, Value>,
    /// Import IRI prefix mapped to the absolute directory it stands for
    pub import_paths: IndexMap<String, PathBuf>,
}

impl ModuleState {
    /// Build the state for `package_names` and the dependencies they pull in
    ///
    /// Each round resolves the pending names, loads their `package.json`
    /// files in parallel and keeps the components modules among them. Only
    /// packages that contributed a module not seen before have their
    /// dependencies queued for the next round; a name is never queued twice.
    pub fn build_selective(
        main_module_path: &Path,
        package_names: &[String],
    ) -> Result<Self, GeneratorError> {
        let locator = NodeModuleLocator::new(main_module_path);
        let mut state = ModuleState {
            main_module_path: main_module_path.to_path_buf(),
            node_module_import_paths: locator.import_paths().to_vec(),
            ..Default::default()
        };

        let mut queued: AHashSet<String> = AHashSet::new();
        let mut pending: Vec<String> = package_names
            .iter()
            .filter(|name| queued.insert((*name).clone()))
            .cloned()
            .collect();

        let mut round = 0;
        while !pending.is_empty() {
            round += 1;
            debug!("Module state round {}: {:?}", round, pending);

            let paths_new = locator.find_packages(&pending);
            let package_jsons_new = load_package_jsons(&paths_new)?;
            let component_modules_new = component_modules(&package_jsons_new);

            let new_module_iris: AHashSet<&str> = component_modules_new
                .keys()
                .filter(|iri| !state.component_modules.contains_key(*iri))
                .map(String::as_str)
                .collect();

            pending = Vec::new();
            for package_json in package_jsons_new.values() {
                let contributes_new = package_json
                    .module_iri()
                    .is_some_and(|iri| new_module_iris.contains(iri));
                if !contributes_new {
                    continue;
                }
                for dependency in package_json.dependencies.keys() {
                    if queued.insert(dependency.clone()) {
                        pending.push(dependency.clone());
                    }
                }
            }

            state.node_module_paths.extend(paths_new);
            state.component_modules.extend(component_modules_new);
            state.package_jsons.extend(package_jsons_new);
        }

        state.contexts = component_contexts(&state.package_jsons);
        state.import_paths = component_import_paths(&state.package_jsons);
        info!(
            "Module state: {} packages, {} components modules",
            state.package_jsons.len(),
            state.component_modules.len()
        );
        Ok(state)
    }

    /// File that an import IRI refers to, through the known import paths
    pub fn resolve_import(&self, iri: &str) -> Option<PathBuf> {
        self.import_paths.iter().find_map(|(prefix, dir)| {
            iri.strip_prefix(prefix.as_str())
                .map(|rest| dir.join(rest.trim_start_matches('/')))
        })
    }

    /// Loaded `package.json` of a package, by name
    pub fn package_json_by_name(&self, name: &str) -> Option<&PackageJson> {
        self.package_jsons.values().find(|p| p.name == name)
    }
}

/// Load `package.json` of each directory in parallel, preserving input order
fn load_package_jsons(paths: &[PathBuf]) -> Result<IndexMap<PathBuf, PackageJson>, GeneratorError> {
    let loaded: Vec<Result<(PathBuf, PackageJson), GeneratorError>> = paths
        .par_iter()
        .map(|dir| PackageJson::load(&dir.join("package.json")).map(|p| (dir.clone(), p)))
        .collect();
    loaded.into_iter().collect()
}

fn component_modules(package_jsons: &IndexMap<PathBuf, PackageJson>) -> IndexMap<String, PathBuf> {
    package_jsons
        .iter()
        .filter_map(|(dir, package_json)| {
            let iri = package_json.module_iri()?;
            let components = package_json.lsd_components.as_ref()?;
            Some((iri.to_string(), dir.join(components)))
        })
        .collect()
}

fn component_contexts(package_jsons: &IndexMap<PathBuf, PackageJson>) -> IndexMap<String, Value> {
    let mut contexts = IndexMap::new();
    for (dir, package_json) in package_jsons {
        let Some(declared) = &package_json.lsd_contexts else {
            continue;
        };
        for (iri, file) in declared {
            let path = dir.join(file);
            match fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            {
                Some(document) => {
                    contexts.insert(iri.clone(), document);
                }
                None => warn!("Could not load context {} of '{}' from {:?}", iri, package_json.name, path),
            }
        }
    }
    contexts
}

fn component_import_paths(package_jsons: &IndexMap<PathBuf, PackageJson>) -> IndexMap<String, PathBuf> {
    package_jsons
        .iter()
        .filter_map(|(dir, package_json)| {
            package_json
                .lsd_import_paths
                .as_ref()
                .map(|paths| (dir, paths))
        })
        .flat_map(|(dir, paths)| paths.iter().map(move |(iri, rel)| (iri.clone(), dir.join(rel))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn install(node_modules: &Path, name: &str, package_json: &str) -> bool {
        let dir = node_modules.join(name);
        fs::create_dir_all(dir.join("components")).is_ok()
            && fs::write(dir.join("package.json"), package_json).is_ok()
            && fs::write(
                dir.join("components").join("context.jsonld"),
                r#"{ "@context": {} }"#,
            )
            .is_ok()
    }

    #[test]
    fn test_fixed_point_follows_module_dependencies() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path().join("main");
        let node_modules = root.join("node_modules");
        assert!(install(
            &node_modules,
            "dep-a",
            r#"{ "name": "dep-a", "version": "1.0.0", "lsd:module": true,
                 "dependencies": { "dep-b": "^1.0.0", "main": "^1.0.0" } }"#,
        ));
        assert!(install(
            &node_modules,
            "dep-b",
            r#"{ "name": "dep-b", "version": "2.0.0", "lsd:module": true,
                 "dependencies": { "plain": "^1.0.0" } }"#,
        ));
        assert!(install(
            &node_modules,
            "plain",
            r#"{ "name": "plain", "version": "1.0.0", "dependencies": { "never": "1" } }"#,
        ));

        let Ok(state) = ModuleState::build_selective(&root, &["dep-a".to_string()]) else {
            panic!("module state should build");
        };

        let names: Vec<&str> = state.package_jsons.values().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["dep-a", "dep-b", "plain"]);
        assert_eq!(state.component_modules.len(), 2);
        assert_eq!(
            state.component_modules["https://linkedsoftwaredependencies.org/bundles/npm/dep-b"],
            node_modules.join("dep-b").join("components/components.jsonld")
        );
        assert!(state
            .contexts
            .contains_key("https://linkedsoftwaredependencies.org/bundles/npm/dep-a/^1.0.0/components/context.jsonld"));
        assert_eq!(
            state.resolve_import(
                "https://linkedsoftwaredependencies.org/bundles/npm/dep-b/^2.0.0/components/Foo.jsonld"
            ),
            Some(node_modules.join("dep-b").join("components/").join("Foo.jsonld"))
        );
        assert!(state.package_json_by_name("plain").is_some());
    }

    #[test]
    fn test_unresolvable_packages_are_skipped() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let state = ModuleState::build_selective(temp_dir.path(), &["missing".to_string()]);
        assert!(state.is_ok_and(|s| s.package_jsons.is_empty() && s.node_module_paths.is_empty()));
    }
}
