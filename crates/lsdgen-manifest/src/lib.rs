//! lsdgen manifest model
//!
//! This crate holds the data shared by every stage of the generator: the
//! canonical type index produced by the analysis front end, the linked-data
//! documents written for a package, the package descriptor read from
//! `package.json`, and the small amount of JSON-LD processing needed to mint
//! compact identifiers.

pub mod definitions;
pub mod errors;
pub mod jsonld;
pub mod manifest_writer;
pub mod package;
pub mod paths;
pub mod types;

pub use definitions::{
    ComponentDefinition, ComponentDefinitions, ComponentDefinitionsDocument,
    ComponentDefinitionsIndex, ComponentKind, ConstructorArgumentDefinition,
    ConstructorFieldDefinition, ContextRaw, DefaultValueDefinition, ParameterDefinition,
    RangeDescriptor, TypedRange,
};
pub use errors::GeneratorError;
pub use jsonld::{ContextSource, JsonLdContext, NoRemoteContexts};
pub use package::{PackageDescriptor, PackageJson};
pub use paths::{normalize_path, with_appended_extension, PathDestination};
pub use types::{
    ClassIndex, ClassReference, ConstructorDescriptor, DeclaredKind, DeclaredType, DefaultNested,
    DefaultValue, ParameterDescriptor, ParameterKind, ParameterRange,
};

// Re-export writer utilities for the CLI and tests
pub use manifest_writer::{read_from_path, write_to_path};
