//! Per-type conservative tri-valued mutability classification plus the
//! per-instance residual predicate (§4.B).
//!
//! Subtype dispatch for `IsMutable` needs no separate thunk cache the way
//! the original reflection-based design does: a `&dyn Node` value already
//! carries its own concrete type behind the vtable, so `v.type_key()` /
//! `v.descriptor()` *are* the dispatch — calling them on a trait object
//! naturally resolves to whatever concrete type backs it. The dispatch
//! genuinely goes missing only when a field's *declared* type was never
//! registered at all, which is reported as
//! [`DeriveError::MutabilityDispatchMissing`] rather than guessed at.

use dashmap::DashMap;
use induction_model::{registry, DeriveError, Kind, Node, TypeDescriptor, TypeKey};
use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;

#[cfg(test)]
mod tests;

/// Tri-valued classification of a declared type's mutability (§3).
///
/// Monotone: `Mutable` dominates `Maybe`, which dominates `Immutable`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    Immutable,
    Maybe,
    Mutable,
}

impl Mutability {
    fn join(self, other: Mutability) -> Mutability {
        use Mutability::{Immutable, Maybe, Mutable};
        match (self, other) {
            (Mutable, _) | (_, Mutable) => Mutable,
            (Maybe, _) | (_, Maybe) => Maybe,
            (Immutable, Immutable) => Immutable,
        }
    }
}

/// One slot per type ever classified, keyed by [`TypeKey`]. Populated with a
/// *provisional* value (the transitive algorithm's starting point, sealed ?
/// `Immutable` : `Maybe`) before a type's own fields are walked, so a
/// self-referential or mutually recursive field sees that provisional value
/// instead of recursing forever — exactly the "start with X, then adjust"
/// reading of §4.B's transitive algorithm.
static CACHE: Lazy<DashMap<TypeKey, Mutability, rustc_hash::FxBuildHasher>> = Lazy::new(DashMap::default);

/// `Mutability(T)` (§4.B), never failing: an unresolvable field type is
/// reported via `tracing::error!` and conservatively folded in as `Mutable`
/// (the safe direction — see [`try_mutability`] for the fallible form).
pub fn mutability<T: Node + 'static>() -> Mutability {
    try_mutability::<T>().unwrap_or_else(|err| {
        tracing::error!(error = %err, "mutability derivation degraded to Mutable");
        Mutability::Mutable
    })
}

/// `Mutability(T)`, surfacing [`DeriveError::MutabilityDispatchMissing`]
/// instead of swallowing it.
#[tracing::instrument(level = "debug", skip_all, fields(type_name = std::any::type_name::<T>()))]
pub fn try_mutability<T: Node + 'static>() -> Result<Mutability, DeriveError> {
    let descriptor = T::ensure_registered();
    classify(TypeKey::of::<T>(), descriptor)
}

/// `Mutability(T)` entered from a `TypeKey` whose descriptor is already in
/// hand, never failing — used by `induction-copy`/`induction-equality` to
/// query a field's declared-type mutability without a compile-time type
/// parameter for it.
pub fn mutability_of(key: TypeKey, descriptor: &'static TypeDescriptor) -> Mutability {
    classify(key, descriptor).unwrap_or_else(|err| {
        tracing::error!(error = %err, "mutability derivation degraded to Mutable");
        Mutability::Mutable
    })
}

/// `IsMutable(v)` (§4.B "instance-level check"). Dispatch on `v`'s runtime
/// type is implicit: `v.descriptor()` already resolves to whatever concrete
/// type backs the trait object.
pub fn is_mutable(v: &dyn Node) -> bool {
    let mut visited = Visited::default();
    is_mutable_inner(v, &mut visited)
}

/// Identity-keyed visited set (§4.B "prevents infinite recursion on mutually
/// recursive objects"); value types are never inserted since they have no
/// identity.
#[derive(Default)]
struct Visited(FxHashSet<usize>);

impl Visited {
    /// Returns `true` the first time `id` is seen, `false` on a repeat.
    fn mark(&mut self, id: usize) -> bool {
        self.0.insert(id)
    }
}

fn is_mutable_inner(v: &dyn Node, visited: &mut Visited) -> bool {
    let key = v.type_key();
    let descriptor = v.descriptor();
    let classification = classify(key, descriptor).unwrap_or_else(|err| {
        tracing::error!(error = %err, "IsMutable dispatch degraded to Mutable");
        Mutability::Mutable
    });

    match classification {
        Mutability::Immutable => false,
        Mutability::Mutable => true,
        Mutability::Maybe => {
            if let Some(id) = v.identity() {
                if !visited.mark(id) {
                    return false;
                }
            }
            residual(v, descriptor, visited)
        }
    }
}

/// OR over the instance's fields whose *declared* type classifies as
/// `Maybe` — fields whose declared type is already `Immutable` contribute
/// nothing, and fields whose declared type is `Mutable` would already have
/// forced this type's own classification to `Mutable` in [`classify`], so
/// only `Maybe` fields carry residual, instance-dependent information.
fn residual(v: &dyn Node, descriptor: &'static TypeDescriptor, visited: &mut Visited) -> bool {
    match descriptor.kind {
        Kind::Array | Kind::Option | Kind::Pointer => {
            let Some(elem_key) = descriptor.element_type else {
                return false;
            };
            if !matches!(CACHE.get(&elem_key).map(|c| *c), Some(Mutability::Maybe)) {
                return false;
            }
            v.fields().iter().any(|f| is_mutable_inner(f.value, visited))
        }
        Kind::TraitObject | Kind::Primitive => false,
        Kind::Aggregate => {
            let declared = registry::fields_of(descriptor);
            v.fields().iter().any(|field_ref| {
                declared
                    .iter()
                    .find(|f| f.name == field_ref.name)
                    .is_some_and(|f| matches!(CACHE.get(&f.type_key).map(|c| *c), Some(Mutability::Maybe)))
                    && is_mutable_inner(field_ref.value, visited)
            })
        }
    }
}

fn classify(key: TypeKey, descriptor: &'static TypeDescriptor) -> Result<Mutability, DeriveError> {
    if let Some(hit) = CACHE.get(&key) {
        return Ok(*hit);
    }

    // Whitelist (§4.B.1).
    if descriptor.is_pure_attributed || descriptor.kind.is_whitelisted_immutable() {
        CACHE.insert(key, Mutability::Immutable);
        return Ok(Mutability::Immutable);
    }

    // Blacklist (§4.B.2).
    if descriptor.kind.is_blacklisted_mutable() {
        CACHE.insert(key, Mutability::Mutable);
        return Ok(Mutability::Mutable);
    }

    // An open (trait-object) field could be filled by any implementor at
    // runtime, including a mutable one; there is no "sealed" to trust.
    if matches!(descriptor.kind, Kind::TraitObject) {
        CACHE.insert(key, Mutability::Maybe);
        return Ok(Mutability::Maybe);
    }

    let provisional = if descriptor.sealed { Mutability::Immutable } else { Mutability::Maybe };
    CACHE.insert(key, provisional);

    let result = transitive(descriptor);
    match &result {
        Ok(value) => {
            CACHE.insert(key, *value);
            tracing::trace!(type_name = descriptor.name, ?value, "mutability classification cached");
        }
        Err(_) => {
            // Leave the provisional value in place (§7 "synthesis failures
            // ... are not cached as failed outcomes" — here there is no
            // separate failure slot, so the conservative starting estimate
            // stands until a caller retries).
            tracing::error!(type_name = descriptor.name, "mutability transitive step failed");
        }
    }
    result
}

fn transitive(descriptor: &'static TypeDescriptor) -> Result<Mutability, DeriveError> {
    let pure = descriptor.is_pure();
    let mut acc = if descriptor.sealed { Mutability::Immutable } else { Mutability::Maybe };

    match descriptor.kind {
        Kind::Array | Kind::Option | Kind::Pointer => {
            if let Some(elem_key) = descriptor.element_type {
                acc = acc.join(field_mutability(elem_key, descriptor.name, descriptor.name)?);
            }
        }
        Kind::Primitive | Kind::TraitObject => {}
        Kind::Aggregate => {
            for field in registry::fields_of(descriptor) {
                if !field.init_only && (field.visibility.is_public() || !pure) {
                    return Ok(Mutability::Mutable);
                }
                acc = acc.join(field_mutability(field.type_key, descriptor.name, field.name)?);
                if acc == Mutability::Mutable {
                    return Ok(Mutability::Mutable);
                }
            }
        }
    }
    Ok(acc)
}

fn field_mutability(key: TypeKey, owner: &'static str, field_name: &'static str) -> Result<Mutability, DeriveError> {
    if let Some(hit) = CACHE.get(&key) {
        return Ok(*hit);
    }
    match registry::lookup_by_key(key, field_name) {
        Ok(descriptor) => classify(key, descriptor),
        Err(_) => Err(DeriveError::MutabilityDispatchMissing {
            static_type: owner,
            runtime_type: field_name,
        }),
    }
}
