//! Per-type structural acyclicity test (§4.C): depth-first over a type's
//! declared field graph, memoized per [`TypeKey`].
//!
//! This is deliberately the smallest of the four derivations: it answers one
//! question — "can the declared shape of `T` ever produce a cyclic object
//! graph". Unlike the source design this is ported from, `induction-copy`
//! and `induction-equality` don't consult it to skip reference-map /
//! visited-pair bookkeeping: in this port that bookkeeping is needed for
//! sharing preservation (not just cycle-breaking) and lives entirely inside
//! `Rc<T>`/`Arc<T>`'s own well-known copiers and the identity-based
//! short-circuit in `structural_eq`, neither of which is expensive enough
//! on an acyclic graph to be worth gating on a separate classification
//! (see `DESIGN.md`). `Cycles(T)` stands on its own as a client-facing
//! query.

use dashmap::DashMap;
use induction_model::{registry, Kind, Node, TypeDescriptor, TypeKey};
use once_cell::sync::Lazy;


/// Whether a type's declared field graph can reach itself (or any type on
/// the path back to itself) along some sequence of fields and element
/// types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cycles {
    No,
    Yes,
}

/// One slot per type ever requested as a *derivation root* via [`cycles`] or
/// [`cycles_of`]. Intermediate types touched only while walking some other
/// root's field graph are deliberately not cached here: whether such a type
/// closes a cycle depends on which ancestors are already on that specific
/// root's stack, so the answer isn't reusable as a standalone fact about
/// the intermediate type. Each root still derives exactly once, which is
/// the cost the specialization cache is meant to amortize.
static CACHE: Lazy<DashMap<TypeKey, Cycles, rustc_hash::FxBuildHasher>> = Lazy::new(DashMap::default);

/// `Cycles(T)` (§4.C). Registers `T` on first call; later calls are a cache
/// hit.
#[tracing::instrument(level = "debug", skip_all, fields(type_name = std::any::type_name::<T>()))]
pub fn cycles<T: Node + 'static>() -> Cycles {
    let descriptor = T::ensure_registered();
    cycles_of(TypeKey::of::<T>(), descriptor)
}

/// Same derivation, entered from a `TypeKey` whose descriptor is already in
/// hand — used by `induction-copy`/`induction-equality` when recursing
/// through a field without a compile-time type parameter for it.
#[tracing::instrument(level = "debug", skip_all, fields(type_name = descriptor.name))]
pub fn cycles_of(key: TypeKey, descriptor: &'static TypeDescriptor) -> Cycles {
    if let Some(hit) = CACHE.get(&key) {
        return *hit;
    }
    let result = classify(descriptor, &mut vec![key]);
    CACHE.insert(key, result);
    tracing::trace!(type_name = descriptor.name, ?result, "cycle classification cached");
    result
}

fn classify(descriptor: &'static TypeDescriptor, ancestors: &mut Vec<TypeKey>) -> Cycles {
    if descriptor.is_primitive {
        return Cycles::No;
    }

    match descriptor.kind {
        Kind::Primitive => Cycles::No,
        Kind::Array | Kind::Option | Kind::Pointer => match descriptor.element_type {
            Some(elem_key) => classify_field(elem_key, descriptor.name, ancestors),
            None => Cycles::No,
        },
        // A field statically typed as a trait object could be filled with
        // any implementor at runtime, including one that closes a cycle
        // back through an ancestor already on the stack; §4.C's "is a
        // supertype of any ancestor" clause exists for exactly this case,
        // so any reachable trait-object-typed field is conservatively
        // treated as a potential cycle rather than attempting to enumerate
        // implementors.
        Kind::TraitObject => Cycles::Yes,
        Kind::Aggregate => registry::fields_of(descriptor)
            .into_iter()
            .map(|field| classify_field(field.type_key, field.name, ancestors))
            .find(|c| *c == Cycles::Yes)
            .unwrap_or(Cycles::No),
    }
}

fn classify_field(key: TypeKey, field_name: &'static str, ancestors: &mut Vec<TypeKey>) -> Cycles {
    if ancestors.contains(&key) {
        return Cycles::Yes;
    }
    match registry::lookup_by_key(key, field_name) {
        Ok(descriptor) => {
            ancestors.push(key);
            let result = classify(descriptor, ancestors);
            ancestors.pop();
            result
        }
        Err(_) => {
            // §4.A: the introspector never fails. A field type that was
            // never registered is structurally unknown; assume the worst so
            // the downstream optimization (skipping ref-map bookkeeping)
            // never fires on an unverified subgraph.
            tracing::warn!(field_name, "unregistered field type during cycle analysis, assuming Cycles::Yes");
            Cycles::Yes
        }
    }
}
