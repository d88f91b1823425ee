use std::any::{Any, TypeId};
use std::fmt;

/// Identity of a registered type.
///
/// The Rust stand-in for `System.Type`: there is no ambient reflection
/// service to hand us one, so we wrap [`TypeId`] and rely on every
/// participating type registering its [`TypeDescriptor`](crate::TypeDescriptor)
/// ahead of time (see [`crate::register`]).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey(TypeId);

impl TypeKey {
    #[must_use]
    pub fn of<T: Any + ?Sized + 'static>() -> Self {
        TypeKey(TypeId::of::<T>())
    }

    #[must_use]
    pub fn from_value(value: &dyn Any) -> Self {
        TypeKey(value.type_id())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({:?})", self.0)
    }
}

/// Coarse shape of a registered type, used by the purity analysis (§4.B),
/// the cycle detector's element-type recursion (§4.C) and the deep copier's
/// well-known-type dispatch (§4.D.5).
///
/// This is the Rust stand-in for the kind taxonomy in the original design
/// (parameter / plain / generic definition / generic application / pointer /
/// managed reference) — Rust monomorphizes generics away, so the taxonomy
/// collapses to the handful of shapes that actually affect recursion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    /// A primitive, whitelisted-immutable scalar (integers, bool, char, f32/f64).
    Primitive,
    /// A plain aggregate: struct or enum with named/positional fields.
    Aggregate,
    /// A contiguous homogeneous collection (`[T; N]`, `Vec<T>`).
    Array,
    /// `Option<T>` — nullable-of-`U` in the original design's terms.
    Option,
    /// A heap indirection with identity (`Box<T>`, `Rc<T>`, `Arc<T>`).
    Pointer,
    /// An erased trait object (`dyn Node`) standing in for an open class
    /// hierarchy / interface reference; concrete subtype is resolved at
    /// call time via [`crate::Node::as_any`].
    TraitObject,
}

impl Kind {
    #[must_use]
    pub const fn is_whitelisted_immutable(self) -> bool {
        matches!(self, Kind::Primitive)
    }

    #[must_use]
    pub const fn is_blacklisted_mutable(self) -> bool {
        matches!(self, Kind::Array)
    }
}
