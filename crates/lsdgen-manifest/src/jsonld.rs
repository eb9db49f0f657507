//! Minimal JSON-LD context processing
//!
//! Only the parts of JSON-LD needed for identifier handling are supported:
//! term definitions (simple or expanded with `@id`/`@prefix`), remote context
//! references resolved through a [`ContextSource`], IRI compaction and term
//! expansion. Remote references that no source can provide are skipped since
//! the generator never touches the network.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// Context shared by every Components.js document
pub const COMPONENTS_CONTEXT_URL: &str =
    "https://linkedsoftwaredependencies.org/bundles/npm/componentsjs/^5.0.0/components/context.jsonld";

/// Namespace of all npm packages
pub const NPMD_IRI: &str = "https://linkedsoftwaredependencies.org/bundles/npm/";

/// Characters that make a simple term usable as a compaction prefix
const GEN_DELIMS: [char; 7] = ['/', '#', ':', '?', '[', ']', '@'];

/// Provides the contents of context documents referenced by IRI
pub trait ContextSource {
    /// The context document for `iri`, if known
    fn resolve_context(&self, iri: &str) -> Option<Value>;
}

/// Source that knows no remote contexts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteContexts;

impl ContextSource for NoRemoteContexts {
    fn resolve_context(&self, _iri: &str) -> Option<Value> {
        None
    }
}

impl ContextSource for IndexMap<String, Value> {
    fn resolve_context(&self, iri: &str) -> Option<Value> {
        self.get(iri).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TermDefinition {
    iri: String,
    prefix: bool,
}

/// A processed JSON-LD context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonLdContext {
    terms: IndexMap<String, TermDefinition>,
    vocab: Option<String>,
}

impl JsonLdContext {
    /// Process a raw context value (string, object or array of those)
    pub fn parse(context: &Value, source: &dyn ContextSource) -> Self {
        let mut processed = JsonLdContext::default();
        let mut visited = HashSet::new();
        processed.process(context, source, &mut visited);
        processed.expand_definitions();
        processed
    }

    fn process(&mut self, context: &Value, source: &dyn ContextSource, visited: &mut HashSet<String>) {
        match context {
            Value::Array(entries) => {
                for entry in entries {
                    self.process(entry, source, visited);
                }
            }
            Value::String(iri) => {
                if !visited.insert(iri.clone()) {
                    return;
                }
                match source.resolve_context(iri) {
                    Some(document) => {
                        let inner = document.get("@context").cloned().unwrap_or(document);
                        self.process(&inner, source, visited);
                    }
                    None => debug!("Skipping unavailable remote context {}", iri),
                }
            }
            Value::Object(definitions) => self.process_definitions(definitions),
            _ => {}
        }
    }

    fn process_definitions(&mut self, definitions: &Map<String, Value>) {
        for (term, definition) in definitions {
            if term == "@vocab" {
                self.vocab = definition.as_str().map(str::to_string);
                continue;
            }
            if term.starts_with('@') {
                continue;
            }
            match definition {
                Value::Null => {
                    self.terms.shift_remove(term);
                }
                Value::String(iri) => {
                    let prefix = iri.ends_with(GEN_DELIMS);
                    self.terms.insert(
                        term.clone(),
                        TermDefinition {
                            iri: iri.clone(),
                            prefix,
                        },
                    );
                }
                Value::Object(expanded) => {
                    let Some(iri) = expanded.get("@id").and_then(Value::as_str) else {
                        continue;
                    };
                    let prefix = expanded
                        .get("@prefix")
                        .and_then(Value::as_bool)
                        .unwrap_or(false);
                    self.terms.insert(
                        term.clone(),
                        TermDefinition {
                            iri: iri.to_string(),
                            prefix,
                        },
                    );
                }
                _ => {}
            }
        }
    }

    /// Resolve compact IRIs inside term definitions
    fn expand_definitions(&mut self) {
        // Chains of prefixes are short; each round resolves one level.
        for _ in 0..self.terms.len() {
            let mut changed = false;
            let snapshot = self.terms.clone();
            for definition in self.terms.values_mut() {
                let Some((prefix, suffix)) = definition.iri.split_once(':') else {
                    continue;
                };
                if suffix.starts_with("//") {
                    continue;
                }
                if let Some(base) = snapshot.get(prefix) {
                    definition.iri = format!("{}{}", base.iri, suffix);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Compact an absolute IRI into a term or `prefix:suffix` form
    ///
    /// An exact term match wins. Otherwise the prefix leaving the shortest
    /// suffix is used; IRIs no prefix applies to are returned unchanged.
    pub fn compact_iri(&self, iri: &str) -> String {
        if let Some(vocab) = &self.vocab {
            if let Some(rest) = iri.strip_prefix(vocab.as_str()) {
                if !rest.is_empty() {
                    return rest.to_string();
                }
            }
        }

        let mut shortest: Option<(&str, &str)> = None;
        for (term, definition) in &self.terms {
            let Some(suffix) = iri.strip_prefix(definition.iri.as_str()) else {
                continue;
            };
            if suffix.is_empty() {
                return term.clone();
            }
            let shorter = match shortest {
                Some((_, best)) => suffix.len() < best.len(),
                None => true,
            };
            if definition.prefix && shorter {
                shortest = Some((term, suffix));
            }
        }

        match shortest {
            Some((term, suffix)) => format!("{}:{}", term, suffix),
            None => iri.to_string(),
        }
    }

    /// Expand a term or compact IRI into an absolute IRI
    pub fn expand_term(&self, value: &str) -> String {
        if let Some(definition) = self.terms.get(value) {
            return definition.iri.clone();
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if !suffix.starts_with("//") {
                if let Some(definition) = self.terms.get(prefix) {
                    return format!("{}{}", definition.iri, suffix);
                }
            }
            return value.to_string();
        }
        match &self.vocab {
            Some(vocab) => format!("{}{}", vocab, value),
            None => value.to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn package_context() -> Value {
        json!([
            COMPONENTS_CONTEXT_URL,
            {
                "npmd": NPMD_IRI,
                "mp": "npmd:my-package/^1.0.0/"
            }
        ])
    }

    #[test]
    fn test_compaction_uses_shortest_suffix() {
        let context = JsonLdContext::parse(&package_context(), &NoRemoteContexts);
        assert_eq!(
            context.compact_iri(
                "https://linkedsoftwaredependencies.org/bundles/npm/my-package/^1.0.0/components/Foo.jsonld#Foo"
            ),
            "mp:components/Foo.jsonld#Foo"
        );
        assert_eq!(
            context.compact_iri("https://linkedsoftwaredependencies.org/bundles/npm/other/^2.0.0/x"),
            "npmd:other/^2.0.0/x"
        );
        assert_eq!(
            context.compact_iri("https://linkedsoftwaredependencies.org/bundles/npm/my-package"),
            "npmd:my-package"
        );
        assert_eq!(context.compact_iri("http://example.org/a"), "http://example.org/a");
    }

    #[test]
    fn test_exact_match_and_prefix_eligibility() {
        let context = JsonLdContext::parse(
            &json!({
                "ex": "http://example.org/",
                "Foo": { "@id": "ex:components/Foo.jsonld#Foo", "@prefix": true },
                "Bar": { "@id": "ex:components/Bar.jsonld#Bar" }
            }),
            &NoRemoteContexts,
        );
        assert_eq!(
            context.compact_iri("http://example.org/components/Foo.jsonld#Foo"),
            "Foo"
        );
        assert_eq!(
            context.compact_iri("http://example.org/components/Foo.jsonld#Foo_name"),
            "Foo:_name"
        );
        // Expanded definitions without @prefix are never used as prefixes
        assert_eq!(
            context.compact_iri("http://example.org/components/Bar.jsonld#Bar_name"),
            "ex:components/Bar.jsonld#Bar_name"
        );
    }

    #[test]
    fn test_remote_contexts_and_expansion() {
        let mut remote = IndexMap::new();
        remote.insert(
            "https://example.org/context.jsonld".to_string(),
            json!({ "@context": { "dep": "https://example.org/dep/", "removed": "https://x/" } }),
        );
        let context = JsonLdContext::parse(
            &json!([
                "https://example.org/context.jsonld",
                "https://unknown.org/context.jsonld",
                { "removed": null }
            ]),
            &remote,
        );
        assert_eq!(context.expand_term("dep:components/A.jsonld"), "https://example.org/dep/components/A.jsonld");
        assert_eq!(context.expand_term("removed:x"), "removed:x");
        assert_eq!(context.expand_term("https://a.org/b"), "https://a.org/b");
        assert_eq!(context.compact_iri("https://example.org/dep/A"), "dep:A");
    }

    #[test]
    fn test_vocab() {
        let context = JsonLdContext::parse(
            &json!({ "@vocab": "http://vocab.org/" }),
            &NoRemoteContexts,
        );
        assert_eq!(context.compact_iri("http://vocab.org/Thing"), "Thing");
        assert_eq!(context.expand_term("Thing"), "http://vocab.org/Thing");
    }
}
