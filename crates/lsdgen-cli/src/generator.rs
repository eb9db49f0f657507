//! Component generation for a set of packages
//!
//! All packages of a run share one merged type index and know about each
//! other, so a package may extend or reference types of its siblings without
//! them being published yet.

use lsdgen_config::GeneratorConfig;
use lsdgen_manifest::{
    normalize_path, with_appended_extension, write_to_path, ClassIndex, ComponentDefinitions,
    ComponentDefinitionsIndex, ContextRaw, DeclaredType, GeneratorError, PackageDescriptor,
};
use lsdgen_resolve::{
    ExportResolver, ExternalModulesLoader, PackageScope, PackagesBeingGenerated, TypeIndex,
    DEBUG_STATE_FILE,
};
use lsdgen_serialize::{package_scope, ComponentConstructor, ContextConstructor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Generator {
    cwd: PathBuf,
    config: GeneratorConfig,
    package_roots: Vec<PathBuf>,
}

/// Documents computed for one package, written only once all of them succeeded
#[derive(Debug)]
pub struct PackageOutput {
    pub package_name: String,
    pub components: ComponentDefinitions,
    pub index: Option<(PathBuf, ComponentDefinitionsIndex)>,
    pub context: Option<(PathBuf, ContextRaw)>,
}

impl PackageOutput {
    /// Number of components over all documents
    pub fn component_count(&self) -> usize {
        self.components
            .values()
            .map(|document| document.components.len())
            .sum()
    }
}

impl Generator {
    pub fn new(cwd: PathBuf, config: GeneratorConfig, package_roots: Vec<PathBuf>) -> Self {
        Generator {
            cwd,
            config,
            package_roots,
        }
    }

    pub fn package_roots(&self) -> &[PathBuf] {
        &self.package_roots
    }

    /// Generate and write the documents of every package
    ///
    /// Packages are handled in order. An error stops the run; packages
    /// handled before it keep their written documents.
    pub fn generate(&self) -> Result<Vec<PackageOutput>, GeneratorError> {
        let (packages, type_index) = self.load_packages()?;
        let packages = Arc::new(packages);

        let mut outputs = Vec::with_capacity(packages.len());
        for scope in packages.values() {
            lsdgen_logger::spinner_start(&format!("Generating components of {}", scope.descriptor.name));
            let generated = self
                .generate_package(scope, &packages, &type_index)
                .and_then(|output| self.write_package(&output).map(|()| output));
            let output = match generated {
                Ok(output) => output,
                Err(e) => {
                    lsdgen_logger::spinner_error(&format!("Failed to generate {}", scope.descriptor.name));
                    return Err(e);
                }
            };
            lsdgen_logger::spinner_success(&format!(
                "Generated {} components for {}",
                output.component_count(),
                output.package_name
            ));
            outputs.push(output);
        }
        Ok(outputs)
    }

    /// Descriptors of all packages and their merged type index
    fn load_packages(&self) -> Result<(PackagesBeingGenerated, TypeIndex), GeneratorError> {
        let mut packages = PackagesBeingGenerated::new();
        let mut type_index = TypeIndex::default();

        for root in &self.package_roots {
            let descriptor = PackageDescriptor::load(root, self.config.module_prefix.clone())?;
            debug!("Loaded package {} {} from {:?}", descriptor.name, descriptor.version, root);

            let index = TypeIndex::load(&root.join(&self.config.type_index), root)?;
            debug!(
                "Type index of {}: {} files, {} declarations",
                descriptor.name,
                index.file_count(),
                index.declaration_count()
            );
            type_index.merge(index);

            let name = descriptor.name.clone();
            let scope = package_scope(descriptor, &self.config.source, &self.config.destination);
            if packages.insert(name.clone(), scope).is_some() {
                warn!("Package {} is listed more than once, using {:?}", name, root);
            }
        }
        Ok((packages, type_index))
    }

    /// Compute every document of one package without touching the disk
    pub fn generate_package(
        &self,
        scope: &PackageScope,
        packages: &Arc<PackagesBeingGenerated>,
        type_index: &TypeIndex,
    ) -> Result<PackageOutput, GeneratorError> {
        let descriptor = &scope.descriptor;
        let class_index = self.class_index(descriptor, type_index)?;
        info!("Found {} exported types in {}", class_index.len(), descriptor.name);

        let debug_state = self
            .config
            .debug_state
            .then(|| self.cwd.join(DEBUG_STATE_FILE));
        let loader = ExternalModulesLoader::new(descriptor, Arc::clone(packages), debug_state);
        let external_packages =
            loader.find_external_packages(&class_index, &|reference| type_index.declaration(reference));
        debug!("External packages of {}: {:?}", descriptor.name, external_packages);
        let external = loader.load_external_components(&external_packages)?;

        let constructor = ComponentConstructor::new(scope, &self.config.extension, &external);
        let components = constructor.construct_components(&class_index)?;

        let index = match descriptor.index_path() {
            Some(path) => Some((path, constructor.construct_components_index(&components)?)),
            None => {
                warn!("{} has no lsd:components entry, skipping the components index", descriptor.name);
                None
            }
        };
        let context = match descriptor.context_path() {
            Some(path) => Some((
                path,
                ContextConstructor::new(descriptor).construct_context(Some(&components)),
            )),
            None => {
                warn!("{} has no lsd:contexts entry, skipping the context", descriptor.name);
                None
            }
        };

        Ok(PackageOutput {
            package_name: descriptor.name.clone(),
            components,
            index,
            context,
        })
    }

    /// Declared types of every exported name that is not ignored
    fn class_index(
        &self,
        descriptor: &PackageDescriptor,
        type_index: &TypeIndex,
    ) -> Result<ClassIndex<DeclaredType>, GeneratorError> {
        let exports = ExportResolver::new(type_index)
            .package_exports(&descriptor.name, &normalize_path(&descriptor.types_path()))?;

        let mut class_index = ClassIndex::with_capacity(exports.len());
        for (exported_name, reference) in exports {
            if self.config.ignore_components.contains(&exported_name) {
                debug!("Ignoring component {}", exported_name);
                continue;
            }
            let Some(declared) = type_index.declaration(&reference) else {
                return Err(GeneratorError::MissingDeclaration {
                    local_name: reference.local_name.to_string(),
                    file: reference.file_name.clone(),
                });
            };
            let mut declared = declared.clone();
            declared.reference = reference;
            class_index.insert(exported_name, declared);
        }
        Ok(class_index)
    }

    fn write_package(&self, output: &PackageOutput) -> Result<(), GeneratorError> {
        for (path, document) in &output.components {
            write_to_path(document, &with_appended_extension(path, &self.config.extension))?;
        }
        if let Some((path, index)) = &output.index {
            write_to_path(index, path)?;
        }
        if let Some((path, context)) = &output.context {
            write_to_path(context, path)?;
        }
        debug!("Wrote {} component files for {}", output.components.len(), output.package_name);
        Ok(())
    }
}

/// Display form of a package root relative to the working directory
pub fn display_root(cwd: &Path, root: &Path) -> String {
    root.strip_prefix(cwd)
        .ok()
        .filter(|relative| !relative.as_os_str().is_empty())
        .map_or_else(|| root.display().to_string(), |relative| relative.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) -> bool {
        path.parent().map_or(true, |parent| fs::create_dir_all(parent).is_ok())
            && fs::write(path, content).is_ok()
    }

    fn fixture_package(root: &Path, types: &str) -> bool {
        write(
            &root.join("package.json"),
            r#"{"name": "my-package", "version": "1.0.0", "lsd:module": true}"#,
        ) && write(&root.join(".lsdgen/types.json"), types)
    }

    const TYPES: &str = r#"{
      "files": {
        "index": { "exportedImportedAll": [{ "fileName": "lib/Foo" }] },
        "lib/Foo": { "exportedClasses": ["Foo", "Bar"] }
      },
      "declarations": [
        {
          "type": "class",
          "reference": { "packageName": "my-package", "localName": "Foo", "fileName": "lib/Foo" },
          "constructor": { "parameters": [
            { "type": "field", "name": "size", "range": { "type": "raw", "value": "integer" } }
          ] }
        },
        {
          "type": "class",
          "reference": { "packageName": "my-package", "localName": "Bar", "fileName": "lib/Foo" },
          "superClass": { "packageName": "my-package", "localName": "Foo", "fileName": "lib/Foo" }
        }
      ]
    }"#;

    #[test]
    fn test_generate_package_in_memory() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path().join("my-package");
        if !fixture_package(&root, TYPES) {
            return;
        }
        let generator = Generator::new(
            temp_dir.path().to_path_buf(),
            GeneratorConfig::default(),
            vec![root.clone()],
        );
        let Ok((packages, type_index)) = generator.load_packages() else {
            panic!("fixture package should load");
        };
        let packages = Arc::new(packages);
        let Some(scope) = packages.get("my-package") else {
            panic!("package scope should exist");
        };

        let output = match generator.generate_package(scope, &packages, &type_index) {
            Ok(output) => output,
            Err(e) => panic!("generation failed: {}", e),
        };
        assert_eq!(output.component_count(), 2);
        let paths: Vec<&PathBuf> = output.components.keys().collect();
        assert_eq!(paths, vec![&root.join("components/Foo")]);
        assert!(output
            .index
            .as_ref()
            .is_some_and(|(path, _)| *path == root.join("components/components.jsonld")));
        assert!(output
            .context
            .as_ref()
            .is_some_and(|(path, _)| *path == root.join("components/context.jsonld")));
        // Nothing is written by the in-memory pass
        assert!(!root.join("components").exists());
    }

    #[test]
    fn test_ignored_components_are_skipped() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path().join("my-package");
        if !fixture_package(&root, TYPES) {
            return;
        }
        let config = GeneratorConfig {
            ignore_components: vec!["Bar".to_string()],
            ..GeneratorConfig::default()
        };
        let generator = Generator::new(temp_dir.path().to_path_buf(), config, vec![root.clone()]);
        let outputs = match generator.generate() {
            Ok(outputs) => outputs,
            Err(e) => panic!("generation failed: {}", e),
        };
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].component_count(), 1);
        assert!(root.join("components/Foo.jsonld").exists());
        assert!(root.join("components/components.jsonld").exists());
        assert!(root.join("components/context.jsonld").exists());
    }

    #[test]
    fn test_missing_declaration_fails() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let root = temp_dir.path().join("my-package");
        let types = r#"{ "files": { "index": { "exportedClasses": ["Ghost"] } }, "declarations": [] }"#;
        if !fixture_package(&root, types) {
            return;
        }
        let generator = Generator::new(
            temp_dir.path().to_path_buf(),
            GeneratorConfig::default(),
            vec![root.clone()],
        );
        let result = generator.generate();
        assert!(matches!(
            result,
            Err(GeneratorError::MissingDeclaration { ref local_name, .. }) if local_name == "Ghost"
        ));
        assert!(!root.join("components").exists());
    }

    #[test]
    fn test_display_root() {
        let cwd = Path::new("/ws");
        assert_eq!(display_root(cwd, Path::new("/ws/packages/a")), "packages/a");
        assert_eq!(display_root(cwd, Path::new("/ws")), "/ws");
        assert_eq!(display_root(cwd, Path::new("/other")), "/other");
    }
}
