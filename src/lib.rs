//! Type-directed structural induction (§1 OVERVIEW): given a static
//! description of an aggregate type `T`, derive four procedures specialized
//! to `T` — mutability classification, an acyclicity test, a deep copier
//! that preserves sharing and cycles, and a structural equality that
//! terminates on cyclic graphs. Each derivation is produced once per `T`,
//! memoized in its own crate, and driven by the metadata [`Node`] exposes.
//!
//! This crate is a thin facade over four independently useful crates —
//! `induction-model` (the introspector and registry, §4.A),
//! `induction-mutability` (§4.B), `induction-cycles` (§4.C),
//! `induction-copy` (§4.D), and `induction-equality` (§4.E) — re-exported
//! under the names §6 gives the public API.

pub use induction_model::{
    register, ConstructorDescriptor, ConstructorParam, DeriveError, FieldDescriptor, FieldRef, InductionOptions, Kind,
    MethodDescriptor, Node, RefMap, TypeDescriptor, TypeKey, Visibility,
};

pub use induction_mutability::{is_mutable, mutability, try_mutability, Mutability};

pub use induction_cycles::{cycles, Cycles};

pub use induction_copy::{copy, copy_dyn, override_copier, override_create, CopierFn, CreateFn};

pub use induction_equality::{default_eq, default_hash, structural_eq, VisitedPairs};
