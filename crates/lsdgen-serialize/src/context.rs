//! JSON-LD context of a package
//!
//! The minimal context binds `npmd` and the package prefix. The combined
//! context written next to the components additionally holds one shortcut per
//! component, scoped so that parameters can be written without their
//! component prefix in configuration files.

use lsdgen_manifest::jsonld::{COMPONENTS_CONTEXT_URL, NPMD_IRI};
use lsdgen_manifest::{
    ComponentDefinition, ComponentDefinitions, ContextRaw, JsonLdContext, NoRemoteContexts,
    PackageDescriptor, PathDestination,
};
use lsdgen_resolve::PackageScope;
use serde_json::{json, Map, Value};
use tracing::debug;

pub struct ContextConstructor<'a> {
    descriptor: &'a PackageDescriptor,
}

impl<'a> ContextConstructor<'a> {
    pub fn new(descriptor: &'a PackageDescriptor) -> Self {
        ContextConstructor { descriptor }
    }

    /// Derive a prefix from the first letter of each part of a package name
    ///
    /// `@comunica/actor-init-sparql` becomes `cais`.
    pub fn package_name_prefix(package_name: &str) -> String {
        package_name
            .replace('@', "")
            .split(['/', '-'])
            .filter_map(|part| part.chars().next())
            .collect()
    }

    fn prefix(&self) -> String {
        self.descriptor
            .prefix
            .clone()
            .unwrap_or_else(|| Self::package_name_prefix(&self.descriptor.name))
    }

    /// Build the context document, with shortcuts when `components` is given
    pub fn construct_context(&self, components: Option<&ComponentDefinitions>) -> ContextRaw {
        let mut definitions = Map::new();
        definitions.insert("npmd".to_string(), Value::from(NPMD_IRI));
        definitions.insert(
            self.prefix(),
            Value::from(format!(
                "npmd:{}/^{}.0.0/",
                self.descriptor.name, self.descriptor.major_version
            )),
        );
        if let Some(components) = components {
            definitions.extend(self.construct_component_shortcuts(components));
        }

        ContextRaw {
            context: vec![Value::from(COMPONENTS_CONTEXT_URL), Value::Object(definitions)],
        }
    }

    /// One prefix term per component, carrying a type-scoped context of its parameters
    pub fn construct_component_shortcuts(&self, definitions: &ComponentDefinitions) -> Map<String, Value> {
        let mut shortcuts = Map::new();
        for component in definitions.values().flat_map(|document| &document.components) {
            let name = shortcut_name(&component.id);
            debug!("Shortcut '{}' for {}", name, component.id);
            shortcuts.insert(
                name.to_string(),
                json!({
                    "@id": component.id,
                    "@prefix": true,
                    "@context": type_scoped_context(component),
                }),
            );
        }
        shortcuts
    }

    /// Processed minimal context, used to compact the identifiers of this package
    pub fn minimal_context(&self) -> JsonLdContext {
        let raw = self.construct_context(None);
        JsonLdContext::parse(&Value::Array(raw.context), &NoRemoteContexts)
    }
}

/// Everything the constructors need to know about a package being generated
pub fn package_scope(descriptor: PackageDescriptor, source: &str, destination: &str) -> PackageScope {
    let minimal_context = ContextConstructor::new(&descriptor).minimal_context();
    PackageScope {
        paths: PathDestination::new(&descriptor.root, source, destination),
        descriptor,
        minimal_context,
    }
}

/// Trailing alphanumeric run of an identifier
fn shortcut_name(id: &str) -> &str {
    let start = id
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_alphanumeric())
        .last()
        .map_or(id.len(), |(index, _)| index);
    &id[start..]
}

fn type_scoped_context(component: &ComponentDefinition) -> Map<String, Value> {
    let mut scoped = Map::new();
    for parameter in &component.parameters {
        let key = parameter
            .id
            .get(component.id.len() + 1..)
            .unwrap_or_default()
            .to_string();
        let mut term = Map::new();
        term.insert("@id".to_string(), Value::from(parameter.id.as_str()));
        if let Some(range) = &parameter.range {
            if range.is_json() {
                term.insert("@type".to_string(), Value::from("@json"));
            }
            if range.is_list() {
                term.insert("@container".to_string(), Value::from("@list"));
            }
        }
        scoped.insert(key, Value::Object(term));
    }
    scoped
}
