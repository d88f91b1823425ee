//! Type descriptors, the [`Node`] reflection trait and the process-wide
//! type registry for the induction engine.
//!
//! This crate provides foundational types used by every derivation crate:
//! - [`TypeKey`] / [`Kind`] — type identity and coarse shape.
//! - [`TypeDescriptor`] and friends — the metadata a type exposes to the
//!   introspector (§4.A).
//! - [`Node`] — the object-safe trait a type implements to participate in
//!   the engine; the Rust stand-in for an inspectable `System.Object`.
//! - [`register`] / [`lookup`] — the process-wide registry.
//! - [`DeriveError`] — the typed error kinds of §7.
//! - [`InductionOptions`] — the one tunable the engine exposes.

pub mod builtins;
pub mod descriptor;
pub mod error;
pub mod key;
pub mod node;
pub mod options;
pub mod refmap;
pub mod registry;


pub use descriptor::{
    ConstructorDescriptor, ConstructorParam, CopierThunk, FieldDescriptor, MethodDescriptor,
    ReadOnlyInitializers, TypeDescriptor, Visibility,
};
pub use error::DeriveError;
pub use key::{Kind, TypeKey};
pub use node::{FieldRef, Node};
pub use options::{grow_stack_for_recursion, InductionOptions};
pub use refmap::RefMap;
pub use registry::{ensure_registered, fields_of, lookup, lookup_by_key, register, subtypes};
