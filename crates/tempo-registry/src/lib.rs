//! Type and function registry for the tempo compiler.
//!
//! The registry is the read-only view of the type system the emitter
//! consults for value sizes, object-ness, class ancestry and template
//! specializations.

mod entry;
mod hierarchy;
mod registry;

pub use entry::{FunctionEntry, TemplateInstance, TypeEntry};
pub use hierarchy::ClassHierarchy;
pub use registry::TypeRegistry;
