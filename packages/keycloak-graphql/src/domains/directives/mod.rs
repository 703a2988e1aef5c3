//! Authorization directives
//!
//! `@auth`, `@hasRole(role: ...)` and `@hasPermission(resources: ...)` on a
//! field definition put the field's resolver behind a guard:
//!
//!   SchemaDefinition → DirectiveTransformer → guarded SchemaDefinition → build_schema
//!
//! Malformed directive arguments fail the transform. Authorization failures
//! are field errors at request time.

pub mod annotation;
pub mod guard;
pub mod transformer;

pub use annotation::{Annotation, DirectiveNames};
pub use guard::{Check, FieldRequirements, Guard, GuardedResolver};
pub use transformer::{apply_directive_transformers, DirectiveTransformer};
