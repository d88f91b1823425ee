use crate::descriptor::TypeDescriptor;
use crate::key::TypeKey;
use smallvec::SmallVec;
use std::any::Any;

/// One field as seen dynamically from an instance: its declared name and a
/// borrowed handle to the child value.
pub struct FieldRef<'a> {
    pub name: &'static str,
    pub value: &'a dyn Node,
}

/// The Rust stand-in for "an inspectable `System.Object`".
///
/// Every type that participates in mutability classification, cycle
/// detection, deep copy or structural equality implements `Node`. The trait
/// is object-safe so that the four derivations can recurse over
/// heterogeneous field types through `&dyn Node` exactly as the original
/// design recurses over `object`-typed fields via reflection.
pub trait Node: Any {
    /// Identity of `Self`'s registered type.
    fn type_key(&self) -> TypeKey;

    /// Metadata for `Self`'s registered type. Implementations should simply
    /// forward to [`Node::ensure_registered`]; the split exists only
    /// because `ensure_registered` needs `Self: Sized` (to be callable
    /// without an instance from the type-level `mutability::<T>()` /
    /// `cycles::<T>()` entry points) while `descriptor` must stay
    /// object-safe (to be callable through `&dyn Node` while recursing
    /// over heterogeneous fields).
    fn descriptor(&self) -> &'static TypeDescriptor;

    /// Register (idempotently, on first call) and return `Self`'s
    /// descriptor, without needing an instance. This is what makes
    /// `Mutability(T)`/`Cycles(T)` (§4.B/§4.C), which are genuinely
    /// type-level constants with no instance in scope, possible in a
    /// language with no ambient reflection.
    fn ensure_registered() -> &'static TypeDescriptor
    where
        Self: Sized;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// The dynamic (name, value) view over this instance's fields, in the
    /// same declaration order as `descriptor().fields` (base fields first).
    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]>;

    /// `Some(data pointer)` for reference-type nodes (used as the identity
    /// key in the copier's reference map and the equality walker's
    /// visited-pair set); `None` for value types, which have no identity.
    fn identity(&self) -> Option<usize>;
}

impl dyn Node {
    #[must_use]
    pub fn downcast_ref<T: Node>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}
