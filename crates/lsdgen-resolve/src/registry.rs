//! Registry of components published by dependency packages
//!
//! Every components module's index document is read, its `import` entries are
//! followed through the known import paths, and each component found along the
//! way is registered under the `requireName` of the module that imported it.

use ahash::AHashSet;
use indexmap::IndexMap;
use lsdgen_manifest::{read_from_path, GeneratorError, JsonLdContext};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::module_state::ModuleState;

/// A component published by a dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredComponent {
    /// Expanded component IRI
    pub iri: String,
    pub require_name: String,
    pub require_element: String,
}

pub struct ComponentRegistry<'a> {
    state: &'a ModuleState,
    components: IndexMap<String, RegisteredComponent>,
    loaded: AHashSet<PathBuf>,
}

impl<'a> ComponentRegistry<'a> {
    pub fn new(state: &'a ModuleState) -> Self {
        ComponentRegistry {
            state,
            components: IndexMap::new(),
            loaded: AHashSet::new(),
        }
    }

    /// Register the components of every module in the state
    pub fn register_available_modules(&mut self) -> Result<(), GeneratorError> {
        let state = self.state;
        for path in state.component_modules.values() {
            self.register_module_file(path, None)?;
        }
        debug!("Registered {} external components", self.components.len());
        Ok(())
    }

    fn register_module_file(
        &mut self,
        path: &Path,
        inherited_require_name: Option<&str>,
    ) -> Result<(), GeneratorError> {
        if !self.loaded.insert(path.to_path_buf()) {
            return Ok(());
        }
        debug!("Registering components file {:?}", path);

        let document: Value = read_from_path(path)?;
        let context = JsonLdContext::parse(
            document.get("@context").unwrap_or(&Value::Null),
            &self.state.contexts,
        );
        let require_name = document
            .get("requireName")
            .and_then(Value::as_str)
            .or(inherited_require_name)
            .map(str::to_string);

        if let (Some(require_name), Some(components)) = (
            require_name.as_deref(),
            document.get("components").and_then(Value::as_array),
        ) {
            for component in components {
                self.register_component(&context, require_name, component);
            }
        }

        for import in imports(&document) {
            let iri = context.expand_term(import);
            let file = self
                .state
                .resolve_import(&iri)
                .ok_or_else(|| GeneratorError::MissingImportPath(iri.clone()))?;
            self.register_module_file(&file, require_name.as_deref())?;
        }
        Ok(())
    }

    fn register_component(&mut self, context: &JsonLdContext, require_name: &str, component: &Value) {
        let Some(id) = component.get("@id").and_then(Value::as_str) else {
            return;
        };
        let iri = context.expand_term(id);
        let require_element = component
            .get("requireElement")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| iri.rsplit_once('#').map(|(_, name)| name.to_string()))
            .unwrap_or_default();
        self.components.insert(
            iri.clone(),
            RegisteredComponent {
                iri,
                require_name: require_name.to_string(),
                require_element,
            },
        );
    }

    pub fn components(&self) -> impl Iterator<Item = &RegisteredComponent> {
        self.components.values()
    }
}

fn imports(document: &Value) -> Vec<&str> {
    match document.get("import") {
        Some(Value::String(single)) => vec![single.as_str()],
        Some(Value::Array(entries)) => entries.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const MODULE: &str = "https://linkedsoftwaredependencies.org/bundles/npm/dep";

    fn write(path: &Path, value: &Value) -> bool {
        path.parent().is_some_and(|p| fs::create_dir_all(p).is_ok())
            && fs::write(path, value.to_string()).is_ok()
    }

    #[test]
    fn test_imports_are_followed_with_inherited_require_name() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let dir = temp_dir.path().join("dep");
        let context_iri = format!("{MODULE}/^1.0.0/components/context.jsonld");
        let context = json!({ "@context": [{
            "npmd": "https://linkedsoftwaredependencies.org/bundles/npm/",
            "d": "npmd:dep/^1.0.0/"
        }]});
        assert!(write(
            &dir.join("components/components.jsonld"),
            &json!({
                "@context": [context_iri],
                "@id": "npmd:dep",
                "@type": "Module",
                "requireName": "dep",
                "import": ["d:components/Logger.jsonld", "d:components/Logger.jsonld"]
            })
        ));
        assert!(write(
            &dir.join("components/Logger.jsonld"),
            &json!({
                "@context": [context_iri],
                "@id": "npmd:dep",
                "components": [
                    { "@id": "d:components/Logger.jsonld#Logger", "@type": "Class", "requireElement": "Logger" },
                    { "@id": "d:components/Logger.jsonld#Level", "@type": "Class" }
                ]
            })
        ));

        let mut state = ModuleState::default();
        state
            .component_modules
            .insert(MODULE.to_string(), dir.join("components/components.jsonld"));
        state.contexts.insert(context_iri.clone(), context);
        state
            .import_paths
            .insert(format!("{MODULE}/^1.0.0/components/"), dir.join("components/"));

        let mut registry = ComponentRegistry::new(&state);
        assert!(registry.register_available_modules().is_ok());

        let components: Vec<&RegisteredComponent> = registry.components().collect();
        assert_eq!(components.len(), 2);
        assert_eq!(
            components[0].iri,
            format!("{MODULE}/^1.0.0/components/Logger.jsonld#Logger")
        );
        assert_eq!(components[0].require_name, "dep");
        assert_eq!(components[1].require_element, "Level");
    }

    #[test]
    fn test_unmapped_import_is_an_error() {
        let Ok(temp_dir) = TempDir::new() else {
            return;
        };
        let index = temp_dir.path().join("components.jsonld");
        assert!(write(
            &index,
            &json!({ "requireName": "dep", "import": ["https://nowhere.org/components/A.jsonld"] })
        ));
        let mut state = ModuleState::default();
        state.component_modules.insert(MODULE.to_string(), index);

        let mut registry = ComponentRegistry::new(&state);
        assert!(matches!(
            registry.register_available_modules(),
            Err(GeneratorError::MissingImportPath(_))
        ));
    }
}
