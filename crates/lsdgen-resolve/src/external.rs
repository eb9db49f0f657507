//! Components of packages that are not generated in this run
//!
//! Only dependency packages actually referenced by the types of the current
//! package are loaded, together with the components modules they depend on.

use ahash::AHashSet;
use indexmap::{IndexMap, IndexSet};
use lsdgen_manifest::{
    write_to_path, ClassIndex, ClassReference, DeclaredType, GeneratorError, JsonLdContext,
    PackageDescriptor, PathDestination,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::module_state::ModuleState;
use crate::registry::ComponentRegistry;

/// File name of the module state dump
pub const DEBUG_STATE_FILE: &str = "componentsjs-generator-debug-state.json";

/// A package whose components are generated in this run
#[derive(Debug, Clone)]
pub struct PackageScope {
    pub descriptor: PackageDescriptor,
    pub paths: PathDestination,
    /// Context used to compact the identifiers of this package
    pub minimal_context: JsonLdContext,
}

/// Packages generated in this run, by name
pub type PackagesBeingGenerated = IndexMap<String, PackageScope>;

/// Published components of one dependency package
#[derive(Debug, Clone, Default)]
pub struct ModuleComponents {
    pub context_iris: Vec<String>,
    /// Context built from `context_iris`, for compacting published identifiers
    pub context: JsonLdContext,
    /// Exported name mapped to the expanded component IRI
    pub component_names_to_iris: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExternalComponents {
    pub module_state: ModuleState,
    /// Package name mapped to its published components
    pub components: IndexMap<String, ModuleComponents>,
    pub packages_being_generated: Arc<PackagesBeingGenerated>,
}

impl ExternalComponents {
    /// External components of a run that references no dependency
    pub fn empty(packages_being_generated: Arc<PackagesBeingGenerated>) -> Self {
        ExternalComponents {
            packages_being_generated,
            ..Default::default()
        }
    }
}

pub struct ExternalModulesLoader<'a> {
    package: &'a PackageDescriptor,
    packages_being_generated: Arc<PackagesBeingGenerated>,
    /// Where the module state is dumped, when requested
    debug_state: Option<PathBuf>,
}

impl<'a> ExternalModulesLoader<'a> {
    pub fn new(
        package: &'a PackageDescriptor,
        packages_being_generated: Arc<PackagesBeingGenerated>,
        debug_state: Option<PathBuf>,
    ) -> Self {
        ExternalModulesLoader {
            package,
            packages_being_generated,
            debug_state,
        }
    }

    /// Packages referenced by the given types, in order of first appearance
    ///
    /// Supertypes are followed through `lookup`, constructor parameter ranges
    /// are searched for class references. The current package and packages
    /// generated in this run are left out.
    pub fn find_external_packages<'t>(
        &self,
        class_index: &'t ClassIndex<DeclaredType>,
        lookup: &dyn Fn(&ClassReference) -> Option<&'t DeclaredType>,
    ) -> Vec<String> {
        let mut packages: IndexSet<String> = IndexSet::new();
        let mut visited: AHashSet<(PathBuf, String)> = AHashSet::new();

        for declared in class_index.values() {
            self.index_class(&declared.reference, Some(declared), lookup, &mut packages, &mut visited);
        }

        for declared in class_index.values() {
            let Some(constructor) = declared.constructor() else {
                continue;
            };
            let mut references = Vec::new();
            for parameter in &constructor.parameters {
                parameter.range.visit_references(&mut |r| references.push(r));
            }
            for reference in references {
                self.index_class(reference, lookup(reference), lookup, &mut packages, &mut visited);
            }
        }

        packages
            .into_iter()
            .filter(|name| !self.packages_being_generated.contains_key(name))
            .collect()
    }

    fn index_class<'t>(
        &self,
        reference: &ClassReference,
        declared: Option<&'t DeclaredType>,
        lookup: &dyn Fn(&ClassReference) -> Option<&'t DeclaredType>,
        packages: &mut IndexSet<String>,
        visited: &mut AHashSet<(PathBuf, String)>,
    ) {
        if !visited.insert((reference.file_name.clone(), reference.local_name.to_string())) {
            return;
        }
        if reference.package_name.as_ref() != self.package.name {
            packages.insert(reference.package_name.to_string());
        }
        let Some(declared) = declared else {
            return;
        };
        for supertype in declared.supertypes() {
            self.index_class(supertype, lookup(supertype), lookup, packages, visited);
        }
    }

    /// Load the published components of `external_packages` and their component dependencies
    pub fn load_external_components(
        &self,
        external_packages: &[String],
    ) -> Result<ExternalComponents, GeneratorError> {
        let module_state = ModuleState::build_selective(&self.package.root, external_packages)?;

        if let Some(path) = &self.debug_state {
            dump_module_state(path, &module_state, external_packages)?;
        }

        let mut registry = ComponentRegistry::new(&module_state);
        registry.register_available_modules()?;

        let mut components: IndexMap<String, ModuleComponents> = IndexMap::new();
        let mut unknown: AHashSet<String> = AHashSet::new();
        for component in registry.components() {
            let package_name = &component.require_name;
            if !components.contains_key(package_name) {
                let Some(package_json) = module_state.package_json_by_name(package_name) else {
                    if unknown.insert(package_name.clone()) {
                        warn!("Could not find a package.json for '{}'", package_name);
                    }
                    continue;
                };
                let context_iris: Vec<String> = package_json
                    .lsd_contexts
                    .as_ref()
                    .map(|contexts| contexts.keys().cloned().collect())
                    .unwrap_or_default();
                let context = JsonLdContext::parse(
                    &serde_json::Value::from(context_iris.clone()),
                    &module_state.contexts,
                );
                components.insert(
                    package_name.clone(),
                    ModuleComponents {
                        context_iris,
                        context,
                        component_names_to_iris: IndexMap::new(),
                    },
                );
            }
            if let Some(module) = components.get_mut(package_name) {
                module
                    .component_names_to_iris
                    .insert(component.require_element.clone(), component.iri.clone());
            }
        }

        info!(
            "Loaded external components of {} packages for {}",
            components.len(),
            self.package.name
        );
        Ok(ExternalComponents {
            module_state,
            components,
            packages_being_generated: Arc::clone(&self.packages_being_generated),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugState<'a> {
    external_packages: &'a [String],
    module_state: DebugModuleState<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DebugModuleState<'a> {
    main_module_path: &'a Path,
    component_modules: &'a IndexMap<String, PathBuf>,
    import_paths: &'a IndexMap<String, PathBuf>,
    contexts: &'a IndexMap<String, serde_json::Value>,
    node_module_import_paths: &'a [PathBuf],
    node_module_paths: &'a [PathBuf],
}

/// Write the module state of a run for offline inspection
pub fn dump_module_state(
    path: &Path,
    state: &ModuleState,
    external_packages: &[String],
) -> Result<(), GeneratorError> {
    debug!("Dumping module state to {:?}", path);
    let dump = DebugState {
        external_packages,
        module_state: DebugModuleState {
            main_module_path: &state.main_module_path,
            component_modules: &state.component_modules,
            import_paths: &state.import_paths,
            contexts: &state.contexts,
            node_module_import_paths: &state.node_module_import_paths,
            node_module_paths: &state.node_module_paths,
        },
    };
    write_to_path(&dump, path)
}
