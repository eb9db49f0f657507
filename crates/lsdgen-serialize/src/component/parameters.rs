//! Constructor parameters to parameter definitions and constructor arguments
//!
//! Parameters are traversed depth first in declaration order. Every leaf range
//! becomes a parameter definition; inline objects become `fields` arguments
//! whose entries point at those definitions, and index signatures become
//! collect-entries parameters with a key and a value.

use ahash::AHashMap;
use lsdgen_manifest::definitions::{RANGE_JSON, XSD_PREFIX};
use lsdgen_manifest::{
    ConstructorArgumentDefinition, ConstructorDescriptor, ConstructorFieldDefinition, DeclaredType,
    DefaultValue, DefaultValueDefinition, GeneratorError, ParameterDefinition, ParameterDescriptor,
    ParameterRange, RangeDescriptor, TypedRange,
};

use super::scope::FieldScope;
use super::{class_iri_for_package, ComponentConstructor};

/// State of one constructor traversal
pub(crate) struct ParameterTraversal<'c, 'a> {
    constructor: &'c ComponentConstructor<'a>,
    owner: &'c DeclaredType,
    /// Next disambiguation counter of every minted field identifier
    field_ids: AHashMap<String, usize>,
    external_contexts: &'c mut Vec<String>,
}

impl<'c, 'a> ParameterTraversal<'c, 'a> {
    pub(crate) fn new(
        constructor: &'c ComponentConstructor<'a>,
        owner: &'c DeclaredType,
        external_contexts: &'c mut Vec<String>,
    ) -> Self {
        ParameterTraversal {
            constructor,
            owner,
            field_ids: AHashMap::new(),
            external_contexts,
        }
    }

    /// Constructor arguments of the owner, appending its parameters to `parameters`
    pub(crate) fn construct_parameters(
        mut self,
        constructor: &'c ConstructorDescriptor,
        parameters: &mut Vec<ParameterDefinition>,
    ) -> Result<Vec<ConstructorArgumentDefinition>, GeneratorError> {
        let scope = FieldScope::default();
        let mut arguments = Vec::with_capacity(constructor.parameters.len());
        for parameter in &constructor.parameters {
            let field_id = self.field_name_to_id(&parameter.name, &scope)?;
            arguments.push(self.parameter_to_argument(parameter, parameters, field_id, &scope)?);
        }
        Ok(arguments)
    }

    /// Mint the compacted identifier of a field, unique within this traversal
    fn field_name_to_id(&mut self, field_name: &str, scope: &FieldScope<'c>) -> Result<String, GeneratorError> {
        let field_name = if scope.parent_field_names.is_empty() {
            field_name.to_string()
        } else {
            format!("{}_{}", scope.path(), field_name)
        };
        let class_iri = class_iri_for_package(
            self.constructor.package,
            &self.owner.reference,
            self.constructor.extension,
        )?;
        let mut id = self
            .constructor
            .package
            .minimal_context
            .compact_iri(&format!("{}_{}", class_iri, field_name));

        match self.field_ids.get_mut(&id) {
            Some(counter) => {
                id = format!("{}_{}", id, counter);
                *counter += 1;
            }
            None => {
                self.field_ids.insert(id.clone(), 1);
            }
        }
        Ok(id)
    }

    fn parameter_to_argument(
        &mut self,
        parameter: &'c ParameterDescriptor,
        parameters: &mut Vec<ParameterDefinition>,
        field_id: String,
        scope: &FieldScope<'c>,
    ) -> Result<ConstructorArgumentDefinition, GeneratorError> {
        let field_scope;
        let scope = if parameter.is_field() {
            field_scope = scope.with_field(&parameter.name, &parameter.default_nested);
            &field_scope
        } else {
            scope
        };

        if let Some(members) = parameter.range.nested_members() {
            let mut fields = Vec::with_capacity(members.len());
            for member in members {
                fields.push(self.field_definition_nested(parameter, parameters, member, &field_id, scope)?);
            }
            return Ok(ConstructorArgumentDefinition::Fields {
                id: format!("{}__constructorArgument", field_id),
                fields,
            });
        }

        let defaults: Vec<&DefaultValue> = parameter
            .defaults
            .iter()
            .chain(scope.matching_defaults().map(|nested| &nested.value))
            .collect();

        let range = self.parameter_range(&parameter.range, &field_id)?;
        let default = if defaults.is_empty() {
            None
        } else {
            let mut materialized = Vec::with_capacity(defaults.len());
            for value in defaults {
                materialized.push(self.default_value(&field_id, value, &parameter.range)?);
            }
            Some(materialized)
        };

        parameters.push(ParameterDefinition {
            id: field_id.clone(),
            range: Some(range),
            default,
            comment: parameter.comment.clone(),
        });
        Ok(ConstructorArgumentDefinition::Reference { id: field_id })
    }

    /// Field entry for one member of an inline object
    fn field_definition_nested(
        &mut self,
        parent: &'c ParameterDescriptor,
        parameters: &mut Vec<ParameterDefinition>,
        member: &'c ParameterDescriptor,
        field_id: &str,
        scope: &FieldScope<'c>,
    ) -> Result<ConstructorFieldDefinition, GeneratorError> {
        if member.is_field() {
            let member_id = self.field_name_to_id(&member.name, scope)?;
            let value = self.parameter_to_argument(member, parameters, member_id, scope)?;
            return Ok(ConstructorFieldDefinition::KeyValue {
                key_raw: member.name.clone(),
                value,
            });
        }

        if !parent.is_field() {
            return Err(GeneratorError::IllegalIndexedElement {
                local_name: self.owner.reference.local_name.to_string(),
                file: self.owner.reference.file_name.clone(),
            });
        }

        // The keyed field's own name is already part of the key and value names.
        let scope = scope.without_last_field();
        let id_key = self.field_name_to_id(&format!("{}_key", parent.name), &scope)?;
        let id_value = self.field_name_to_id(&format!("{}_value", parent.name), &scope)?;

        let mut entry_parameters = vec![ParameterDefinition::bare(&id_key)];
        let value = self.parameter_to_argument(member, &mut entry_parameters, id_value, &scope)?;

        parameters.push(ParameterDefinition {
            id: field_id.to_string(),
            range: Some(RangeDescriptor::Typed(TypedRange::CollectEntries {
                parameter_range_collect_entries_parameters: entry_parameters,
            })),
            default: None,
            comment: parent.comment.clone(),
        });
        Ok(ConstructorFieldDefinition::CollectEntries {
            collect_entries: field_id.to_string(),
            key: id_key,
            value,
        })
    }

    fn parameter_range(&mut self, range: &ParameterRange, field_id: &str) -> Result<RangeDescriptor, GeneratorError> {
        let typed = match range {
            ParameterRange::Raw { value } | ParameterRange::Override { value } => {
                return Ok(RangeDescriptor::Iri(if value == "json" {
                    RANGE_JSON.to_string()
                } else {
                    format!("{}{}", XSD_PREFIX, value)
                }));
            }
            ParameterRange::Class { value } => {
                return self
                    .constructor
                    .class_name_to_id(value, self.external_contexts)
                    .map(RangeDescriptor::Iri);
            }
            ParameterRange::Nested { .. } => {
                return Err(GeneratorError::NestedComposition {
                    field_id: field_id.to_string(),
                });
            }
            ParameterRange::Literal { value } => TypedRange::Literal {
                parameter_range_value: value.clone(),
            },
            ParameterRange::Undefined => TypedRange::Undefined,
            ParameterRange::Wildcard => TypedRange::Wildcard,
            ParameterRange::GenericTypeReference { value } => TypedRange::GenericTypeReference {
                parameter_range_generic_type: value.clone(),
            },
            ParameterRange::Union { elements } => TypedRange::Union {
                parameter_range_elements: self.parameter_ranges(elements, field_id)?,
            },
            ParameterRange::Intersection { elements } => TypedRange::Intersection {
                parameter_range_elements: self.parameter_ranges(elements, field_id)?,
            },
            ParameterRange::Tuple { elements } => TypedRange::Tuple {
                parameter_range_elements: self.parameter_ranges(elements, field_id)?,
            },
            ParameterRange::Rest { value } => TypedRange::Rest {
                parameter_range_value: Box::new(self.parameter_range(value, field_id)?),
            },
            ParameterRange::Array { value } => TypedRange::Array {
                parameter_range_value: Box::new(self.parameter_range(value, field_id)?),
            },
            ParameterRange::Keyof { value } => TypedRange::Keyof {
                parameter_range_value: Box::new(self.parameter_range(value, field_id)?),
            },
            ParameterRange::Typeof { value } => TypedRange::Typeof {
                parameter_range_value: Box::new(self.parameter_range(value, field_id)?),
            },
            ParameterRange::Indexed { object, index } => TypedRange::Indexed {
                parameter_range_indexed_object: Box::new(self.parameter_range(object, field_id)?),
                parameter_range_indexed_index: Box::new(self.parameter_range(index, field_id)?),
            },
        };
        Ok(RangeDescriptor::Typed(typed))
    }

    fn parameter_ranges(
        &mut self,
        elements: &[ParameterRange],
        field_id: &str,
    ) -> Result<Vec<RangeDescriptor>, GeneratorError> {
        elements
            .iter()
            .map(|element| self.parameter_range(element, field_id))
            .collect()
    }

    fn default_value(
        &mut self,
        field_id: &str,
        value: &DefaultValue,
        range: &ParameterRange,
    ) -> Result<DefaultValueDefinition, GeneratorError> {
        match value {
            DefaultValue::Raw { value } if range.is_json() => serde_json::from_str(value)
                .map(DefaultValueDefinition::json)
                .map_err(|e| GeneratorError::InvalidJsonDefault {
                    field_id: field_id.to_string(),
                    message: e.to_string(),
                }),
            DefaultValue::Raw { value } => Ok(DefaultValueDefinition::Raw(value.clone())),
            DefaultValue::Iri {
                value,
                type_iri,
                base_component,
            } => {
                let id = match value.as_deref() {
                    Some(relative) if !relative.is_empty() && !relative.contains(':') => {
                        let base = self
                            .constructor
                            .class_name_to_id(base_component, self.external_contexts)?;
                        Some(format!("{}_{}", base, relative))
                    }
                    other => other.map(str::to_string),
                };
                Ok(DefaultValueDefinition::Iri {
                    id,
                    type_iri: type_iri.clone(),
                })
            }
        }
    }
}
