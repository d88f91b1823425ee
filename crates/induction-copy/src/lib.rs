//! Per-type deep-copy walker (§4.D): preserves sharing, dispatches on
//! runtime subtype, and short-circuits structurally immutable payloads.
//!
//! Rust's `Node` trait gives dynamic dispatch for free the same way
//! `induction-mutability`/`induction-cycles` already rely on: a `&dyn Node`
//! value's `type_key()`/`descriptor()` always resolve to its concrete
//! backing type, so there is no separate "runtime type differs from static
//! type" case to special-case the way a reflection-based copier needs to —
//! `copy_dyn` just asks the value what it is and dispatches once.
//!
//! What *is* kept, because nothing else in the engine can stand in for it,
//! is the reference map: `Rc<T>`/`Arc<T>` are the only Rust types with true
//! aliasing, and their well-known copiers (registered in
//! `induction_model::builtins`) are the only code that ever touches
//! [`RefMap`]. Plain aggregates have no shared ownership in Rust, so the
//! generic constructor-driven walker below never needs to consult it.
//!
//! This crate also depends on `induction-mutability` (no cycle: that crate
//! only depends on `induction-model`) so `Rc<T>`/`Arc<T>`'s copiers can ask
//! whether their payload classifies as `Mutability::Immutable` and, if so,
//! hand back a clone of the original pointer instead of allocating a new
//! one (§8 invariant 1) — see [`declared_type_is_immutable`].
//!
//! **Scope boundary on cycles**: a genuine reference cycle (some value
//! reachable from itself, §8 invariant 5 / scenario S4) can only be built in
//! safe Rust through interior mutability (`Rc<RefCell<T>>` and friends). The
//! copiers below publish a fresh `Rc`/`Arc` into [`RefMap`] only *after*
//! fully copying its payload, because the payload must already exist before
//! `Rc::new`/`Arc::new` can wrap it — there is no slot to publish a pointer
//! into before its children are known. That ordering is sufficient for
//! preserving sharing in an acyclic (possibly diamond-shaped) object graph,
//! which is the case `induction-copy/src/tests.rs`'s
//! `shared_reference_fields_copy_to_a_single_shared_rc` and
//! `tests/mutual_recursion_tests.rs` exercise, but a true cycle through
//! plain `Rc<T>`/`Arc<T>` would recurse until `induction_model::
//! grow_stack_for_recursion`'s stack guard gives out. Breaking a genuine
//! cycle needs a placeholder published before recursion, which in turn
//! needs an interior-mutable `Node` impl (`Rc<RefCell<T>>`, requiring `T:
//! Default` to seed the placeholder) that this engine does not register as
//! a well-known type. `induction-cycles`' `Cycles(T)` classification still
//! answers "can this declared shape ever be cyclic" accurately on its own
//! terms; it is `copy`/`copy_dyn` specifically that do not attempt to
//! *copy* an instance that actually is one.

use dashmap::DashMap;
use induction_model::{
    registry, ConstructorParam, DeriveError, FieldDescriptor, Kind, Node, ReadOnlyInitializers, TypeDescriptor, TypeKey,
};
use once_cell::sync::{Lazy, OnceCell};
use rustc_hash::FxBuildHasher;


pub use induction_model::RefMap;

/// A user-installed replacement for `T`'s copier (§4.D `OverrideCopier`).
/// Takes priority over every other dispatch path, including a registered
/// well-known copier.
pub type CopierFn = Box<dyn Fn(&dyn Node, &mut RefMap) -> Result<Box<dyn Node>, DeriveError> + Send + Sync>;

/// A user-installed replacement for `T`'s construction step (§6
/// `OverrideCreate`): takes the same read-only initializer map a winning
/// constructor's `invoke` would have received, skipping best-fit selection
/// entirely.
pub type CreateFn = Box<dyn Fn(&mut ReadOnlyInitializers) -> Result<Box<dyn Node>, DeriveError> + Send + Sync>;

static OVERRIDE_COPIER: Lazy<DashMap<TypeKey, CopierFn, FxBuildHasher>> = Lazy::new(DashMap::default);
static OVERRIDE_CREATE: Lazy<DashMap<TypeKey, CreateFn, FxBuildHasher>> = Lazy::new(DashMap::default);

/// One slot per aggregate type ever copied: the index into
/// `descriptor.constructors` the best-fit algorithm selected. Computed once
/// and reused — selection only depends on field *metadata*, never on a
/// particular instance's values, so it is safe to cache keyed purely by
/// `TypeKey` (§3 "specialization cache", §4.D "executed once per
/// synthesized type"). `OnceCell::get_or_try_init` leaves the slot empty on
/// `Err`, matching §7's "synthesis failures ... are not cached as failed
/// outcomes".
static PLAN_CACHE: Lazy<DashMap<TypeKey, OnceCell<usize>, FxBuildHasher>> = Lazy::new(DashMap::default);

/// `Copy(T, v) -> T` (§4.D, §6), the owned top-level entry point.
///
/// `T: Clone` is required here, not on [`Node`] itself: the only place this
/// engine ever needs to extract an owned concrete value back out of a
/// type-erased `Box<dyn Node>` is at this boundary and at the well-known
/// container copiers (`Vec<T>`/`Option<T>`/`Rc<T>`/`Arc<T>`/`Box<T>` in
/// `induction_model::builtins`) — ordinary aggregates never downcast their
/// own fields, their registered constructor's `invoke` closure does that
/// with full knowledge of the concrete field types.
#[tracing::instrument(level = "debug", skip_all, fields(type_name = std::any::type_name::<T>()))]
pub fn copy<T: Node + Clone + 'static>(v: &T) -> Result<T, DeriveError> {
    let mut refs = RefMap::new();
    let boxed = copy_dyn(v as &dyn Node, &mut refs)?;
    Ok(boxed
        .as_any()
        .downcast_ref::<T>()
        .expect("copy_dyn returned a value of the wrong concrete type")
        .clone())
}

/// `Copy(T, v, refs) -> T` (§4.D), the recursive form threading the
/// identity map. This is the function every well-known container copier's
/// injected `recurse` callback ultimately is.
pub fn copy_dyn(v: &dyn Node, refs: &mut RefMap) -> Result<Box<dyn Node>, DeriveError> {
    induction_model::grow_stack_for_recursion(induction_model::InductionOptions::default(), || copy_dyn_inner(v, refs))
}

fn copy_dyn_inner(v: &dyn Node, refs: &mut RefMap) -> Result<Box<dyn Node>, DeriveError> {
    let key = v.type_key();

    if let Some(over) = OVERRIDE_COPIER.get(&key) {
        tracing::trace!(type_name = v.descriptor().name, "dispatching to overridden copier");
        return over.value()(v, refs);
    }

    let descriptor = v.descriptor();

    if let Some(thunk) = &descriptor.well_known_copier {
        return thunk(v, refs, &mut |child, refs| copy_dyn(child, refs), &declared_type_is_immutable);
    }

    match descriptor.kind {
        Kind::Aggregate | Kind::TraitObject => copy_aggregate(v, key, descriptor, refs),
        Kind::Primitive | Kind::Array | Kind::Option | Kind::Pointer => {
            // Every built-in primitive/container registers a well-known
            // copier in `induction_model::builtins`; reaching here means a
            // caller registered a non-aggregate kind without one.
            Err(DeriveError::NoBindableConstructor {
                type_name: descriptor.name,
                fields: Vec::new(),
            })
        }
    }
}

/// Answers a well-known copier's "is this declared type immutable" query
/// (§8 invariant 1), threaded through [`induction_model::CopierThunk`]'s
/// fourth parameter rather than called directly: `induction-copy` may
/// depend on `induction-mutability`, but `induction-model`, where the
/// `Rc<T>`/`Arc<T>` copiers live, cannot. An unregistered key (which should
/// not arise for anything actually reachable from a copy) degrades to
/// `false`, the same conservative direction `mutability()` itself takes on
/// a dispatch failure.
fn declared_type_is_immutable(key: TypeKey) -> bool {
    match induction_model::registry::lookup_by_key(key, "<copier payload>") {
        Ok(descriptor) => induction_mutability::mutability_of(key, descriptor) == induction_mutability::Mutability::Immutable,
        Err(_) => false,
    }
}

/// "Otherwise synthesize a constructor-driven walker" (§4.D point 6): copy
/// every declared field, stash each copy under its lowercase-normalized
/// field name, then invoke the best-fit constructor over the resulting map.
fn copy_aggregate(
    v: &dyn Node,
    key: TypeKey,
    descriptor: &'static TypeDescriptor,
    refs: &mut RefMap,
) -> Result<Box<dyn Node>, DeriveError> {
    let mut initializers: ReadOnlyInitializers = ReadOnlyInitializers::with_capacity(descriptor.fields.len());
    for field in v.fields() {
        let copied = copy_dyn(field.value, refs)?;
        let normalized = FieldDescriptor::normalize_field_name(field.name).to_ascii_lowercase();
        initializers.insert(normalized, copied);
    }

    if let Some(create) = OVERRIDE_CREATE.get(&key) {
        tracing::trace!(type_name = descriptor.name, "dispatching to overridden create");
        return create.value()(&mut initializers);
    }

    let idx = constructor_index(key, descriptor)?;
    (descriptor.constructors[idx].invoke)(&mut initializers)
}

fn constructor_index(key: TypeKey, descriptor: &'static TypeDescriptor) -> Result<usize, DeriveError> {
    let cell = PLAN_CACHE.entry(key).or_insert_with(OnceCell::new);
    let idx = cell.get_or_try_init(|| select_constructor(key, descriptor))?;
    Ok(*idx)
}

/// Best-fit constructor selection (§4.D, §9, §10.2): name match first, then
/// first-unused type match, with the self-referential special case. Runs
/// purely over field/parameter *metadata* — no instance values are needed,
/// which is exactly why the result can be cached per `TypeKey` rather than
/// recomputed per call.
fn select_constructor(self_key: TypeKey, descriptor: &'static TypeDescriptor) -> Result<usize, DeriveError> {
    let entries: Vec<(String, TypeKey)> = registry::fields_of(descriptor)
        .iter()
        .map(|f| (FieldDescriptor::normalize_field_name(f.name).to_ascii_lowercase(), f.type_key))
        .collect();

    descriptor
        .constructors
        .iter()
        .position(|ctor| is_bindable(ctor, &entries, self_key))
        .ok_or_else(|| DeriveError::NoBindableConstructor {
            type_name: descriptor.name,
            fields: registry::fields_of(descriptor).iter().map(|f| f.name).collect(),
        })
}

fn is_bindable(ctor: &induction_model::ConstructorDescriptor, entries: &[(String, TypeKey)], self_key: TypeKey) -> bool {
    let mut used = vec![false; entries.len()];
    let mut unmatched: Vec<&ConstructorParam> = Vec::new();

    // Name match first (§9 "match by name first (lowercase)").
    for p in &ctor.params {
        let pname = p.name.to_ascii_lowercase();
        match entries.iter().position(|(name, _)| *name == pname) {
            Some(idx) if !used[idx] => used[idx] = true,
            _ => unmatched.push(p),
        }
    }

    // Self-referential special case (§9): if more self-typed entries remain
    // unused than there are self-typed parameters still to bind, set one
    // aside before type-based matching so it isn't mistaken for an ordinary
    // same-type sibling field.
    let self_typed_params = unmatched.iter().filter(|p| p.type_key == self_key).count();
    let self_typed_unused: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(i, (_, tk))| !used[*i] && *tk == self_key)
        .map(|(i, _)| i)
        .collect();
    if self_typed_unused.len() > self_typed_params {
        if let Some(&idx) = self_typed_unused.last() {
            used[idx] = true;
        }
    }

    // First-unused type match for everything name matching missed.
    for p in unmatched {
        match entries.iter().enumerate().find(|(i, (_, tk))| !used[*i] && *tk == p.type_key) {
            Some((idx, _)) => used[idx] = true,
            None => return false,
        }
    }

    // §9's open question, resolved: a constructor that leaves any declared
    // field unbound would silently produce an incomplete copy (there is no
    // generic field-assignment fallback in this port to patch the rest in
    // afterward), so it is rejected rather than accepted as a shorter match.
    used.iter().all(|&u| u)
}

/// Replace `T`'s copier (§4.D `OverrideCopier`, §5 "last-write-wins").
pub fn override_copier<T: Node + 'static>(f: CopierFn) {
    OVERRIDE_COPIER.insert(TypeKey::of::<T>(), f);
    tracing::debug!(type_name = std::any::type_name::<T>(), "copier overridden");
}

/// Replace `T`'s construction step (§6 `OverrideCreate`).
pub fn override_create<T: Node + 'static>(f: CreateFn) {
    OVERRIDE_CREATE.insert(TypeKey::of::<T>(), f);
    tracing::debug!(type_name = std::any::type_name::<T>(), "create overridden");
}
