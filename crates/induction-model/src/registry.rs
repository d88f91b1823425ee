use crate::descriptor::TypeDescriptor;
use crate::error::DeriveError;
use crate::key::TypeKey;
use dashmap::DashMap;
use once_cell::sync::Lazy;

/// The Rust stand-in for the CLR's ambient type metadata: a process-wide,
/// publish-safe map from [`TypeKey`] to the [`TypeDescriptor`] a type
/// registered for itself. `DashMap` gives the same publish-safe concurrent
/// insertion semantics §5 requires of the specialization caches downstream.
static REGISTRY: Lazy<DashMap<TypeKey, &'static TypeDescriptor, rustc_hash::FxBuildHasher>> =
    Lazy::new(DashMap::default);

/// Register `T`'s metadata with the introspector.
///
/// Idempotent: re-registering the same `TypeKey` overwrites the previous
/// descriptor's slot (the leaked allocation from a prior call is simply
/// orphaned). Intended to run once at process startup, not under
/// derivation pressure.
pub fn register<T: 'static>(descriptor: TypeDescriptor) -> &'static TypeDescriptor {
    let leaked: &'static TypeDescriptor = Box::leak(Box::new(descriptor));
    REGISTRY.insert(TypeKey::of::<T>(), leaked);
    tracing::trace!(type_name = leaked.name, "registered type descriptor");
    leaked
}

/// Look up `T`'s descriptor, failing if nothing ever registered it (§4.A
/// "the introspector never fails; missing data is reported as empty
/// sequences or `false`" — except for *lookup itself*, which the original
/// design never needs since CLR metadata always exists; here, absence is a
/// genuine configuration error surfaced as [`DeriveError::UnregisteredType`]).
pub fn lookup<T: 'static>() -> Result<&'static TypeDescriptor, DeriveError> {
    lookup_by_key(TypeKey::of::<T>(), std::any::type_name::<T>())
}

pub fn lookup_by_key(key: TypeKey, type_name: &'static str) -> Result<&'static TypeDescriptor, DeriveError> {
    REGISTRY
        .get(&key)
        .map(|entry| *entry.value())
        .ok_or(DeriveError::UnregisteredType { type_name })
}

/// Register `T` on first call, returning the existing descriptor on every
/// later call instead of leaking a fresh one each time.
///
/// Generic `Node` impls (`Vec<T>`, `Option<T>`) can't hold a local `static`
/// keyed on their own type parameter directly — a local `static` item can't
/// depend on a generic parameter from its enclosing function. Routing
/// through the `DashMap` instead gets the same one-descriptor-per-`T`
/// guarantee without it.
pub fn ensure_registered<T: 'static>(build: impl FnOnce() -> TypeDescriptor) -> &'static TypeDescriptor {
    if let Some(entry) = REGISTRY.get(&TypeKey::of::<T>()) {
        return *entry.value();
    }
    register::<T>(build())
}

/// `true` if `sub`'s descriptor lists `sup` among its implemented
/// interfaces, or `sub == sup` (§4.A `subtypes`).
#[must_use]
pub fn subtypes(sub: &TypeDescriptor, sub_key: TypeKey, sup_key: TypeKey) -> bool {
    sub_key == sup_key || sub.interfaces.contains(&sup_key)
}

/// `fields_of(T)`: base fields first (declaration order), then `T`'s own
/// fields, recursively expanding any field marked `is_base` (§4.A).
#[must_use]
pub fn fields_of(descriptor: &'static TypeDescriptor) -> Vec<&'static crate::descriptor::FieldDescriptor> {
    let mut out = Vec::with_capacity(descriptor.fields.len());
    for field in &descriptor.fields {
        if field.is_base {
            if let Ok(base) = lookup_by_key(field.type_key, field.name) {
                out.extend(fields_of(base));
                continue;
            }
        }
        out.push(field);
    }
    out
}
