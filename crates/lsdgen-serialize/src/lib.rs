//! lsdgen document construction
//!
//! Turns the declared types of a package into the documents a
//! dependency-injection runtime reads: one components document per source
//! file, an index document listing them, and the package's JSON-LD context.

pub mod component;
pub mod context;

pub use component::{class_iri_for_package, ComponentConstructor};
pub use context::{package_scope, ContextConstructor};
