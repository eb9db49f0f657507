//! Component documents of a package
//!
//! Every exported class and interface becomes one component. Components are
//! grouped into one document per source file, and an index document lists all
//! of them for the dependency-injection runtime.

use lsdgen_manifest::{
    with_appended_extension, ClassIndex, ClassReference, ComponentDefinition, ComponentDefinitions,
    ComponentDefinitionsDocument, ComponentDefinitionsIndex, ComponentKind, DeclaredType,
    GeneratorError,
};
use lsdgen_resolve::{ExternalComponents, PackageScope};
use tracing::debug;

mod parameters;
mod scope;


use parameters::ParameterTraversal;

/// `@type` of the index document
const MODULE_TYPE: &str = "Module";

pub struct ComponentConstructor<'a> {
    pub(crate) package: &'a PackageScope,
    pub(crate) extension: &'a str,
    pub(crate) external: &'a ExternalComponents,
}

impl<'a> ComponentConstructor<'a> {
    pub fn new(package: &'a PackageScope, extension: &'a str, external: &'a ExternalComponents) -> Self {
        ComponentConstructor {
            package,
            extension,
            external,
        }
    }

    /// Build the component documents of every type in `class_index`
    ///
    /// Documents are keyed by destination path, in order of first use. Types
    /// re-exported from another package are grouped with the file that
    /// re-exports them.
    pub fn construct_components(
        &self,
        class_index: &ClassIndex<DeclaredType>,
    ) -> Result<ComponentDefinitions, GeneratorError> {
        let mut definitions = ComponentDefinitions::new();

        for (class_name, declared) in class_index {
            let reference = &declared.reference;
            let source = if reference.package_name.as_ref() == self.package.descriptor.name {
                &reference.file_name
            } else {
                &reference.file_name_referenced
            };
            let path = self.package.paths.destination_of(source)?;

            let mut external_contexts = Vec::new();
            let component = self.construct_component(declared, &mut external_contexts)?;
            debug!("Constructed component {} for '{}'", component.id, class_name);

            let document = definitions
                .entry(path)
                .or_insert_with(|| ComponentDefinitionsDocument {
                    context: self.package.descriptor.context_iris(),
                    id: self.module_iri_to_id(),
                    components: Vec::new(),
                });
            for iri in &external_contexts {
                document.add_context(iri);
            }
            document.components.push(component);
        }

        Ok(definitions)
    }

    /// Build the index document listing every components document
    pub fn construct_components_index(
        &self,
        definitions: &ComponentDefinitions,
    ) -> Result<ComponentDefinitionsIndex, GeneratorError> {
        let descriptor = &self.package.descriptor;
        let import = definitions
            .keys()
            .map(|path| {
                let relative = self
                    .package
                    .paths
                    .relative(&with_appended_extension(path, self.extension))?;
                let iri = descriptor.import_path_iri(&relative)?;
                Ok(self.package.minimal_context.compact_iri(&iri))
            })
            .collect::<Result<Vec<_>, GeneratorError>>()?;

        Ok(ComponentDefinitionsIndex {
            context: descriptor.context_iris(),
            id: self.module_iri_to_id(),
            index_type: MODULE_TYPE.to_string(),
            require_name: descriptor.name.clone(),
            import,
        })
    }

    /// Build the component of one class or interface
    ///
    /// Context IRIs of other packages that identifiers were taken from are
    /// appended to `external_contexts` in the order they are needed.
    pub fn construct_component(
        &self,
        declared: &DeclaredType,
        external_contexts: &mut Vec<String>,
    ) -> Result<ComponentDefinition, GeneratorError> {
        let id = self.class_name_to_id(&declared.reference, external_contexts)?;

        let mut parameters = Vec::new();
        let constructor_arguments = match declared.constructor() {
            Some(constructor) => ParameterTraversal::new(self, declared, external_contexts)
                .construct_parameters(constructor, &mut parameters)?,
            None => Vec::new(),
        };

        let mut extends = Vec::new();
        for supertype in declared.supertypes() {
            extends.push(self.class_name_to_id(supertype, external_contexts)?);
        }

        Ok(ComponentDefinition {
            id,
            kind: if declared.is_abstract() {
                ComponentKind::AbstractClass
            } else {
                ComponentKind::Class
            },
            require_element: declared.reference.local_name.to_string(),
            extends: (!extends.is_empty()).then_some(extends),
            comment: declared.comment.clone(),
            parameters,
            constructor_arguments,
        })
    }

    /// Compacted module IRI of the package
    pub fn module_iri_to_id(&self) -> String {
        self.package
            .minimal_context
            .compact_iri(&self.package.descriptor.module_iri)
    }

    /// Compacted identifier of a class or interface
    ///
    /// Types of this package and of packages generated in the same run are
    /// minted; types of other packages must be published by a dependency.
    pub fn class_name_to_id(
        &self,
        reference: &ClassReference,
        external_contexts: &mut Vec<String>,
    ) -> Result<String, GeneratorError> {
        let package_name = reference.package_name.as_ref();
        if package_name == self.package.descriptor.name {
            return class_id_for_package(self.package, reference, self.extension);
        }

        if let Some(other) = self.external.packages_being_generated.get(package_name) {
            external_contexts.extend(other.descriptor.context_iris());
            return class_id_for_package(other, reference, self.extension);
        }

        let Some(module) = self.external.components.get(package_name) else {
            return Err(GeneratorError::NotADependency {
                local_name: reference.local_name.to_string(),
                package_name: package_name.to_string(),
            });
        };
        external_contexts.extend(module.context_iris.iter().cloned());
        let Some(iri) = module.component_names_to_iris.get(reference.local_name.as_ref()) else {
            return Err(GeneratorError::ComponentNotExposed {
                local_name: reference.local_name.to_string(),
                package_name: package_name.to_string(),
            });
        };
        Ok(module.context.compact_iri(iri))
    }
}

/// Full IRI of a type declared in `package`
///
/// `{module}/^{major}.0.0/{components file}.{extension}#{name}`
pub fn class_iri_for_package(
    package: &PackageScope,
    reference: &ClassReference,
    extension: &str,
) -> Result<String, GeneratorError> {
    let paths = &package.paths;
    let file_path = paths.relative(&paths.destination_of(&reference.file_name)?)?;
    Ok(format!(
        "{}{}.{}#{}",
        package.descriptor.versioned_module_iri(),
        file_path,
        extension,
        reference.local_name
    ))
}

fn class_id_for_package(
    package: &PackageScope,
    reference: &ClassReference,
    extension: &str,
) -> Result<String, GeneratorError> {
    let iri = class_iri_for_package(package, reference, extension)?;
    Ok(package.minimal_context.compact_iri(&iri))
}
