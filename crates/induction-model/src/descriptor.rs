use crate::error::DeriveError;
use crate::key::{Kind, TypeKey};
use crate::node::Node;
use crate::refmap::RefMap;
use std::collections::HashMap;

bitflags::bitflags! {
    /// Field/member visibility, mirroring the original design's
    /// `public`/non-`public` distinction (Rust has no `protected`, so the
    /// tri-valued CLR visibility collapses to two bits here).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Visibility: u8 {
        const PUBLIC  = 1 << 0;
        const PRIVATE = 1 << 1;
    }
}

impl Visibility {
    #[must_use]
    pub const fn is_public(self) -> bool {
        self.contains(Visibility::PUBLIC)
    }
}

/// One declared field of a registered type.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// Declared (possibly backing-field-mangled) name.
    pub name: &'static str,
    /// Identity of the field's declared type.
    pub type_key: TypeKey,
    /// True for fields assignable only from a constructor of the declaring
    /// type (§4.D "read-only fields").
    pub init_only: bool,
    pub visibility: Visibility,
    /// True if this field is itself an embedded "base" whose own fields are
    /// logically inherited (§4.A `fields_of` "including inherited fields,
    /// base classes first"). Rust has no implementation inheritance, so
    /// composition stands in for it: a field marked `is_base` contributes
    /// its own registered fields ahead of `T`'s remaining fields.
    pub is_base: bool,
}

impl FieldDescriptor {
    /// True if `name` follows the compiler-generated auto-property backing
    /// field convention (`__<name>_backing`, the Rust-flavored analogue of
    /// `<Name>k__BackingField`). Brittle by construction (§9) — callers
    /// should prefer an explicit `is_backing_field` marker from derive
    /// macros where one is available; this is the naming-convention
    /// fallback the original design documents.
    #[must_use]
    pub fn is_backing_field(name: &str) -> bool {
        name.starts_with("__") && name.ends_with("_backing")
    }

    /// Strip the backing-field naming convention, recovering the logical
    /// property name. Returns `name` unchanged if it is not a backing field.
    #[must_use]
    pub fn normalize_field_name(name: &str) -> &str {
        name.strip_prefix("__")
            .and_then(|s| s.strip_suffix("_backing"))
            .unwrap_or(name)
    }
}

/// One declared constructor parameter.
#[derive(Clone, Debug)]
pub struct ConstructorParam {
    pub name: &'static str,
    pub type_key: TypeKey,
}

/// Lowercase-normalized field name → copied value, threaded through
/// constructor selection (§4.D "read-only initializer map").
pub type ReadOnlyInitializers = HashMap<String, Box<dyn Node>>;

/// A constructor a registered type exposes to the deep copier.
///
/// `invoke` is the unavoidable per-type glue a reflection-free language
/// needs in place of `ConstructorInfo.Invoke`: the *selection* of which
/// constructor to call is the generic best-fit algorithm in
/// `induction-copy`, driven purely by `params`; only the final call is
/// type-specific.
pub struct ConstructorDescriptor {
    pub params: Vec<ConstructorParam>,
    pub invoke: Box<dyn Fn(&mut ReadOnlyInitializers) -> Result<Box<dyn Node>, DeriveError> + Send + Sync>,
}

impl std::fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A hand-written copier for a "well-known" shape that has no declared
/// fields/constructors to drive a generic walker over: primitives, strings,
/// and the built-in containers (`Vec<T>`, `Option<T>`, `Box<T>`, `Rc<T>`,
/// `Arc<T>`) (§4.D point 5). Supplied at registration time, when `T` is
/// still statically known, exactly like [`ConstructorDescriptor::invoke`].
///
/// The third argument is the engine's own `copy_dyn` entry point, passed in
/// by the caller rather than named directly: a well-known copier for, say,
/// `Vec<T>` needs to deep-copy each element through the *full* algorithm
/// (short-circuiting on `Mutability`, dispatching to `T`'s own well-known or
/// synthesized copier, preserving `refs` sharing) and `induction-model`
/// cannot call back into `induction-copy` without an import cycle.
///
/// The fourth argument answers "does this declared type classify as
/// `Mutability::Immutable`" for a given [`TypeKey`], injected for the same
/// reason: `induction-model` cannot depend on `induction-mutability` either.
/// `Rc<T>`/`Arc<T>`'s copiers consult it to satisfy §8 invariant 1 — an
/// immutable payload never needs a fresh allocation, so handing back a
/// clone of the original pointer is both cheaper and still correct.
pub type CopierThunk = Box<
    dyn Fn(
            &dyn Node,
            &mut RefMap,
            &mut dyn FnMut(&dyn Node, &mut RefMap) -> Result<Box<dyn Node>, DeriveError>,
            &dyn Fn(TypeKey) -> bool,
        ) -> Result<Box<dyn Node>, DeriveError>
        + Send
        + Sync,
>;

/// A declared method, used only by the purity analysis of §4.B.
#[derive(Clone, Copy, Debug)]
pub struct MethodDescriptor {
    pub name: &'static str,
    pub is_static: bool,
    /// True if the static method's parameter list contains the declaring
    /// type `T` (disqualifies it from "pure" per §4.B.d).
    pub takes_self_type: bool,
    /// True if this is an auto-generated property getter (§4.B.c).
    pub is_generated_getter: bool,
    /// True if this is a private auto-generated property setter (§4.B.d).
    pub is_private_generated_setter: bool,
    pub is_pure_attributed: bool,
    /// True if this method is the implementation of a method from the
    /// curated observation-only interface set (§4.B.a) — the Rust
    /// analogues of `Formattable`/`Convertible`/`Cloneable`/etc are
    /// `Display`/`From`/`Clone`/`PartialEq`/`PartialOrd`/`Hash`/`Debug`/
    /// `Default`/`IntoIterator`.
    pub from_curated_interface: bool,
}

/// Immutable metadata about one registered type (§3 "Type descriptor").
pub struct TypeDescriptor {
    pub name: &'static str,
    pub kind: Kind,
    pub sealed: bool,
    pub is_value_type: bool,
    pub is_primitive: bool,
    pub fields: Vec<FieldDescriptor>,
    pub constructors: Vec<ConstructorDescriptor>,
    /// Trait-object marker types this concrete type implements; consulted
    /// for subtype dispatch (§4.A `subtypes`) and the curated
    /// observation-only interface set (§4.B).
    pub interfaces: Vec<TypeKey>,
    pub element_type: Option<TypeKey>,
    pub is_pure_attributed: bool,
    pub methods: Vec<MethodDescriptor>,
    /// `None` for ordinary aggregates, which the deep copier synthesizes a
    /// constructor-driven walker for instead (§4.D point 6).
    pub well_known_copier: Option<CopierThunk>,
}

impl TypeDescriptor {
    #[must_use]
    pub fn has_no_arg_constructor(&self) -> bool {
        self.constructors.iter().any(|c| c.params.is_empty())
    }

    /// All methods are observation-only per §4.B's purity rule.
    #[must_use]
    pub fn is_pure(&self) -> bool {
        if self.is_pure_attributed {
            return true;
        }
        self.methods.iter().all(|m| {
            m.is_pure_attributed
                || m.is_generated_getter
                || m.is_private_generated_setter
                || m.from_curated_interface
                || (m.is_static && !m.takes_self_type)
        })
    }
}

impl std::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("sealed", &self.sealed)
            .field("fields", &self.fields.len())
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}
