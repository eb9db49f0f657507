//! Input side of the generator: the canonical type index
//!
//! These types mirror what the type-analysis front end emits for a package:
//! references to exported classes and interfaces, their declarations, and the
//! recursive parameter-range grammar of constructor arguments. They are built
//! once per run and never mutated afterwards.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::paths::normalize_path;

/// Exported names of one package mapped to the value known about them
pub type ClassIndex<T> = IndexMap<String, T>;

// =============================================================================
// CLASS REFERENCE
// =============================================================================

/// Location of a class or interface
///
/// `file_name` is the declaring file (used for identifier minting) while
/// `file_name_referenced` is the file through which the export was reached
/// (used for diagnostics and output grouping of foreign types). Both are
/// extension-less absolute paths once the type index has been loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassReference {
    pub package_name: Arc<str>,
    pub local_name: Arc<str>,
    pub file_name: PathBuf,
    #[serde(default)]
    pub file_name_referenced: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_path: Option<SmallVec<[Arc<str>; 2]>>,
}

impl ClassReference {
    pub fn new(package_name: &str, local_name: &str, file_name: impl Into<PathBuf>) -> Self {
        let file_name = file_name.into();
        ClassReference {
            package_name: Arc::from(package_name),
            local_name: Arc::from(local_name),
            file_name_referenced: file_name.clone(),
            file_name,
            qualified_path: None,
        }
    }

    /// Same reference, reached through another file
    pub fn referenced_from(mut self, file: &Path) -> Self {
        self.file_name_referenced = file.to_path_buf();
        self
    }

    /// Resolve relative file paths against `root` and fill a missing referenced file
    pub fn absolutize(&mut self, root: &Path) {
        self.file_name = normalize_path(&root.join(&self.file_name));
        if self.file_name_referenced.as_os_str().is_empty() {
            self.file_name_referenced = self.file_name.clone();
        } else {
            self.file_name_referenced = normalize_path(&root.join(&self.file_name_referenced));
        }
    }
}

// =============================================================================
// DECLARED TYPES
// =============================================================================

/// A loaded class or interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclaredType {
    pub reference: ClassReference,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(flatten)]
    pub kind: DeclaredKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeclaredKind {
    #[serde(rename_all = "camelCase")]
    Class {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        super_class: Option<ClassReference>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        implements_interfaces: Vec<ClassReference>,
        #[serde(default, rename = "abstract")]
        is_abstract: bool,
        #[serde(default)]
        constructor: ConstructorDescriptor,
    },
    #[serde(rename_all = "camelCase")]
    Interface {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        super_interfaces: Vec<ClassReference>,
    },
}

impl DeclaredType {
    /// Interfaces and abstract classes can not be instantiated directly
    pub fn is_abstract(&self) -> bool {
        match &self.kind {
            DeclaredKind::Class { is_abstract, .. } => *is_abstract,
            DeclaredKind::Interface { .. } => true,
        }
    }

    /// Supertypes in `extends` order: superclass first, then interfaces
    pub fn supertypes(&self) -> Vec<&ClassReference> {
        match &self.kind {
            DeclaredKind::Class {
                super_class,
                implements_interfaces,
                ..
            } => super_class
                .iter()
                .chain(implements_interfaces.iter())
                .collect(),
            DeclaredKind::Interface { super_interfaces } => super_interfaces.iter().collect(),
        }
    }

    pub fn constructor(&self) -> Option<&ConstructorDescriptor> {
        match &self.kind {
            DeclaredKind::Class { constructor, .. } => Some(constructor),
            DeclaredKind::Interface { .. } => None,
        }
    }

    /// Resolve every relative path in this declaration against `root`
    pub fn absolutize(&mut self, root: &Path) {
        self.reference.absolutize(root);
        match &mut self.kind {
            DeclaredKind::Class {
                super_class,
                implements_interfaces,
                constructor,
                ..
            } => {
                if let Some(super_class) = super_class {
                    super_class.absolutize(root);
                }
                for iface in implements_interfaces {
                    iface.absolutize(root);
                }
                for parameter in &mut constructor.parameters {
                    parameter.visit_references_mut(&mut |r| r.absolutize(root));
                }
            }
            DeclaredKind::Interface { super_interfaces } => {
                for iface in super_interfaces {
                    iface.absolutize(root);
                }
            }
        }
    }
}

/// Ordered constructor parameters of a class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstructorDescriptor {
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
}

// =============================================================================
// PARAMETERS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// A named field of a constructor or of an inline object shape
    Field,
    /// An index signature entry (`[key: string]: V`)
    Index,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    #[serde(default)]
    pub name: String,
    pub range: ParameterRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<DefaultValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_nested: Vec<DefaultNested>,
}

impl ParameterDescriptor {
    pub fn field(name: &str, range: ParameterRange) -> Self {
        ParameterDescriptor {
            kind: ParameterKind::Field,
            name: name.to_string(),
            range,
            comment: None,
            defaults: Vec::new(),
            default_nested: Vec::new(),
        }
    }

    pub fn index(range: ParameterRange) -> Self {
        ParameterDescriptor {
            kind: ParameterKind::Index,
            name: String::new(),
            range,
            comment: None,
            defaults: Vec::new(),
            default_nested: Vec::new(),
        }
    }

    pub fn is_field(&self) -> bool {
        self.kind == ParameterKind::Field
    }

    fn visit_references_mut(&mut self, visit: &mut dyn FnMut(&mut ClassReference)) {
        self.range.visit_references_mut(visit);
        for default in self.defaults.iter_mut() {
            default.visit_references_mut(visit);
        }
        for nested in self.default_nested.iter_mut() {
            nested.value.visit_references_mut(visit);
        }
    }
}

/// Default value declared on a parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DefaultValue {
    Raw {
        value: String,
    },
    #[serde(rename_all = "camelCase")]
    Iri {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        type_iri: Option<String>,
        base_component: ClassReference,
    },
}

impl DefaultValue {
    fn visit_references_mut(&mut self, visit: &mut dyn FnMut(&mut ClassReference)) {
        if let DefaultValue::Iri { base_component, .. } = self {
            visit(base_component);
        }
    }
}

/// Default value that targets a field deeper in an inline object shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultNested {
    pub param_path: Vec<String>,
    pub value: DefaultValue,
}

// =============================================================================
// PARAMETER RANGE - closed recursive grammar
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ParameterRange {
    /// Primitive type name (`string`, `number`, `boolean`, ...)
    Raw { value: String },
    /// Special-cased primitive; `json` marks an opaque JSON blob
    Override { value: String },
    Literal { value: Value },
    Undefined,
    Wildcard,
    GenericTypeReference { value: String },
    Class { value: ClassReference },
    /// Inline object shape
    Nested { value: Vec<ParameterDescriptor> },
    Union { elements: Vec<ParameterRange> },
    Intersection { elements: Vec<ParameterRange> },
    Tuple { elements: Vec<ParameterRange> },
    Rest { value: Box<ParameterRange> },
    Array { value: Box<ParameterRange> },
    Keyof { value: Box<ParameterRange> },
    Typeof { value: Box<ParameterRange> },
    Indexed {
        object: Box<ParameterRange>,
        index: Box<ParameterRange>,
    },
}

impl ParameterRange {
    pub fn raw(value: &str) -> Self {
        ParameterRange::Raw {
            value: value.to_string(),
        }
    }

    pub fn class(reference: ClassReference) -> Self {
        ParameterRange::Class { value: reference }
    }

    pub fn array(value: ParameterRange) -> Self {
        ParameterRange::Array {
            value: Box::new(value),
        }
    }

    /// Whether this range is the JSON-blob override
    pub fn is_json(&self) -> bool {
        matches!(self, ParameterRange::Override { value } if value == "json")
    }

    /// Sub-parameters of an inline object, directly or as a member of a union
    ///
    /// Only the first nested member of a union is considered.
    pub fn nested_members(&self) -> Option<&[ParameterDescriptor]> {
        match self {
            ParameterRange::Nested { value } => Some(value),
            ParameterRange::Union { elements } => elements.iter().find_map(|e| match e {
                ParameterRange::Nested { value } => Some(value.as_slice()),
                _ => None,
            }),
            _ => None,
        }
    }

    /// Visit every class reference reachable from this range
    pub fn visit_references<'a>(&'a self, visit: &mut dyn FnMut(&'a ClassReference)) {
        match self {
            ParameterRange::Raw { .. }
            | ParameterRange::Override { .. }
            | ParameterRange::Literal { .. }
            | ParameterRange::Undefined
            | ParameterRange::Wildcard
            | ParameterRange::GenericTypeReference { .. } => {}
            ParameterRange::Class { value } => visit(value),
            ParameterRange::Nested { value } => {
                for parameter in value {
                    parameter.range.visit_references(visit);
                }
            }
            ParameterRange::Union { elements }
            | ParameterRange::Intersection { elements }
            | ParameterRange::Tuple { elements } => {
                for element in elements {
                    element.visit_references(visit);
                }
            }
            ParameterRange::Rest { value }
            | ParameterRange::Array { value }
            | ParameterRange::Keyof { value }
            | ParameterRange::Typeof { value } => value.visit_references(visit),
            ParameterRange::Indexed { object, index } => {
                object.visit_references(visit);
                index.visit_references(visit);
            }
        }
    }

    fn visit_references_mut(&mut self, visit: &mut dyn FnMut(&mut ClassReference)) {
        match self {
            ParameterRange::Raw { .. }
            | ParameterRange::Override { .. }
            | ParameterRange::Literal { .. }
            | ParameterRange::Undefined
            | ParameterRange::Wildcard
            | ParameterRange::GenericTypeReference { .. } => {}
            ParameterRange::Class { value } => visit(value),
            ParameterRange::Nested { value } => {
                for parameter in value {
                    parameter.visit_references_mut(visit);
                }
            }
            ParameterRange::Union { elements }
            | ParameterRange::Intersection { elements }
            | ParameterRange::Tuple { elements } => {
                for element in elements {
                    element.visit_references_mut(visit);
                }
            }
            ParameterRange::Rest { value }
            | ParameterRange::Array { value }
            | ParameterRange::Keyof { value }
            | ParameterRange::Typeof { value } => value.visit_references_mut(visit),
            ParameterRange::Indexed { object, index } => {
                object.visit_references_mut(visit);
                index.visit_references_mut(visit);
            }
        }
    }
}
