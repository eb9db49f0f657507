//! Output side of the generator: linked-data component documents
//!
//! Field names follow the Components.js vocabulary, so these types serialize
//! directly into the documents that a dependency-injection runtime reads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

/// Scalar range of JSON-blob parameters
pub const RANGE_JSON: &str = "rdf:JSON";

/// Prefix of scalar ranges
pub const XSD_PREFIX: &str = "xsd:";

/// Generated documents keyed by their absolute destination path (without extension)
pub type ComponentDefinitions = IndexMap<PathBuf, ComponentDefinitionsDocument>;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// One generated components file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDefinitionsDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "@id")]
    pub id: String,
    pub components: Vec<ComponentDefinition>,
}

impl ComponentDefinitionsDocument {
    /// Append a context IRI unless it is already listed
    pub fn add_context(&mut self, iri: &str) {
        if !self.context.iter().any(|c| c == iri) {
            self.context.push(iri.to_string());
        }
    }
}

/// Index of all components files of a package
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinitionsIndex {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub index_type: String,
    pub require_name: String,
    pub import: Vec<String>,
}

/// A JSON-LD context document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRaw {
    #[serde(rename = "@context")]
    pub context: Vec<Value>,
}

// =============================================================================
// COMPONENTS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    Class,
    AbstractClass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDefinition {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(rename = "@type")]
    pub kind: ComponentKind,
    pub require_element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub parameters: Vec<ParameterDefinition>,
    #[serde(default)]
    pub constructor_arguments: Vec<ConstructorArgumentDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDefinition {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<RangeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Vec<DefaultValueDefinition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ParameterDefinition {
    /// A parameter that only carries its identifier
    pub fn bare(id: &str) -> Self {
        ParameterDefinition {
            id: id.to_string(),
            range: None,
            default: None,
            comment: None,
        }
    }
}

// =============================================================================
// RANGES
// =============================================================================

/// Range of a parameter: a (compacted) type IRI or a structured range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RangeDescriptor {
    Iri(String),
    Typed(TypedRange),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum TypedRange {
    #[serde(rename = "ParameterRangeLiteral", rename_all = "camelCase")]
    Literal { parameter_range_value: Value },
    #[serde(rename = "ParameterRangeUndefined")]
    Undefined,
    #[serde(rename = "ParameterRangeWildcard")]
    Wildcard,
    #[serde(rename = "ParameterRangeGenericTypeReference", rename_all = "camelCase")]
    GenericTypeReference { parameter_range_generic_type: String },
    #[serde(rename = "ParameterRangeUnion", rename_all = "camelCase")]
    Union {
        parameter_range_elements: Vec<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeIntersection", rename_all = "camelCase")]
    Intersection {
        parameter_range_elements: Vec<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeTuple", rename_all = "camelCase")]
    Tuple {
        parameter_range_elements: Vec<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeRest", rename_all = "camelCase")]
    Rest {
        parameter_range_value: Box<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeArray", rename_all = "camelCase")]
    Array {
        parameter_range_value: Box<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeKeyof", rename_all = "camelCase")]
    Keyof {
        parameter_range_value: Box<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeTypeof", rename_all = "camelCase")]
    Typeof {
        parameter_range_value: Box<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeIndexed", rename_all = "camelCase")]
    Indexed {
        parameter_range_indexed_object: Box<RangeDescriptor>,
        parameter_range_indexed_index: Box<RangeDescriptor>,
    },
    #[serde(rename = "ParameterRangeCollectEntries", rename_all = "camelCase")]
    CollectEntries {
        parameter_range_collect_entries_parameters: Vec<ParameterDefinition>,
    },
}

impl RangeDescriptor {
    pub fn is_undefined(&self) -> bool {
        matches!(self, RangeDescriptor::Typed(TypedRange::Undefined))
    }

    pub fn is_json(&self) -> bool {
        matches!(self, RangeDescriptor::Iri(iri) if iri == RANGE_JSON)
    }

    /// Whether values of this range are ordered lists
    ///
    /// Arrays and collected entries are lists, and so is an optional list:
    /// a two-armed union of undefined and a list-like range, in either order.
    pub fn is_list(&self) -> bool {
        match self {
            RangeDescriptor::Typed(TypedRange::Array { .. })
            | RangeDescriptor::Typed(TypedRange::CollectEntries { .. }) => true,
            RangeDescriptor::Typed(TypedRange::Union {
                parameter_range_elements,
            }) if parameter_range_elements.len() == 2 => {
                let left = &parameter_range_elements[0];
                let right = &parameter_range_elements[1];
                (left.is_undefined() && right.is_list()) || (right.is_undefined() && left.is_list())
            }
            _ => false,
        }
    }
}

// =============================================================================
// DEFAULTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValueDefinition {
    Raw(String),
    Json {
        #[serde(rename = "@type")]
        value_type: String,
        #[serde(rename = "@value")]
        value: Value,
    },
    Iri {
        #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
        type_iri: Option<String>,
    },
}

impl DefaultValueDefinition {
    pub fn json(value: Value) -> Self {
        DefaultValueDefinition::Json {
            value_type: "@json".to_string(),
            value,
        }
    }
}

// =============================================================================
// CONSTRUCTOR ARGUMENTS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstructorArgumentDefinition {
    /// Inline object built from `fields`
    Fields {
        #[serde(rename = "@id")]
        id: String,
        fields: Vec<ConstructorFieldDefinition>,
    },
    /// Direct reference to a parameter
    Reference {
        #[serde(rename = "@id")]
        id: String,
    },
}

impl ConstructorArgumentDefinition {
    pub fn id(&self) -> &str {
        match self {
            ConstructorArgumentDefinition::Fields { id, .. }
            | ConstructorArgumentDefinition::Reference { id } => id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstructorFieldDefinition {
    #[serde(rename_all = "camelCase")]
    CollectEntries {
        collect_entries: String,
        key: String,
        value: ConstructorArgumentDefinition,
    },
    #[serde(rename_all = "camelCase")]
    KeyValue {
        key_raw: String,
        value: ConstructorArgumentDefinition,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn undefined() -> RangeDescriptor {
        RangeDescriptor::Typed(TypedRange::Undefined)
    }

    fn array_of(iri: &str) -> RangeDescriptor {
        RangeDescriptor::Typed(TypedRange::Array {
            parameter_range_value: Box::new(RangeDescriptor::Iri(iri.to_string())),
        })
    }

    fn union(elements: Vec<RangeDescriptor>) -> RangeDescriptor {
        RangeDescriptor::Typed(TypedRange::Union {
            parameter_range_elements: elements,
        })
    }

    #[test]
    fn test_list_detection() {
        assert!(array_of("xsd:string").is_list());
        assert!(RangeDescriptor::Typed(TypedRange::CollectEntries {
            parameter_range_collect_entries_parameters: vec![],
        })
        .is_list());
        assert!(union(vec![undefined(), array_of("xsd:string")]).is_list());
        assert!(union(vec![array_of("xsd:string"), undefined()]).is_list());
        assert!(!union(vec![
            RangeDescriptor::Iri("ex:A".to_string()),
            RangeDescriptor::Iri("ex:B".to_string()),
        ])
        .is_list());
        assert!(!union(vec![undefined(), undefined(), array_of("xsd:string")]).is_list());
        assert!(!RangeDescriptor::Iri("xsd:string".to_string()).is_list());
    }

    #[test]
    fn test_component_serialization_shape() {
        let component = ComponentDefinition {
            id: "ex:components/Foo.jsonld#Foo".to_string(),
            kind: ComponentKind::Class,
            require_element: "Foo".to_string(),
            extends: None,
            comment: None,
            parameters: vec![ParameterDefinition {
                id: "ex:components/Foo.jsonld#Foo_foo".to_string(),
                range: Some(RangeDescriptor::Iri("xsd:string".to_string())),
                default: Some(vec![DefaultValueDefinition::Raw("bar".to_string())]),
                comment: None,
            }],
            constructor_arguments: vec![ConstructorArgumentDefinition::Reference {
                id: "ex:components/Foo.jsonld#Foo_foo".to_string(),
            }],
        };
        let value = serde_json::to_value(&component).unwrap_or_default();
        assert_eq!(
            value,
            json!({
                "@id": "ex:components/Foo.jsonld#Foo",
                "@type": "Class",
                "requireElement": "Foo",
                "parameters": [{
                    "@id": "ex:components/Foo.jsonld#Foo_foo",
                    "range": "xsd:string",
                    "default": ["bar"]
                }],
                "constructorArguments": [{ "@id": "ex:components/Foo.jsonld#Foo_foo" }]
            })
        );
    }

    #[test]
    fn test_collect_entries_field_shape() {
        let field = ConstructorFieldDefinition::CollectEntries {
            collect_entries: "ex:F_map".to_string(),
            key: "ex:F_map_key".to_string(),
            value: ConstructorArgumentDefinition::Reference {
                id: "ex:F_map_value".to_string(),
            },
        };
        let value = serde_json::to_value(&field).unwrap_or_default();
        assert_eq!(
            value,
            json!({
                "collectEntries": "ex:F_map",
                "key": "ex:F_map_key",
                "value": { "@id": "ex:F_map_value" }
            })
        );

        let json_default = serde_json::to_value(DefaultValueDefinition::json(json!({ "a": 1 })))
            .unwrap_or_default();
        assert_eq!(json_default, json!({ "@type": "@json", "@value": { "a": 1 } }));
    }

    #[test]
    fn test_add_context_deduplicates() {
        let mut document = ComponentDefinitionsDocument {
            context: vec!["https://a/context.jsonld".to_string()],
            id: "npmd:a".to_string(),
            components: vec![],
        };
        document.add_context("https://b/context.jsonld");
        document.add_context("https://a/context.jsonld");
        document.add_context("https://b/context.jsonld");
        assert_eq!(
            document.context,
            vec!["https://a/context.jsonld", "https://b/context.jsonld"]
        );
    }
}
