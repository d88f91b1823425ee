/// Error kinds the engine can report (§7).
///
/// These are the only three failure modes the original design names.
/// Runtime per-call walkers never retry internally: a derivation failure is
/// surfaced to the caller of the first operation that triggered synthesis
/// and is *not* cached, so a later `override_copier`/`override_create` can
/// still populate the specialization slot.
#[derive(Debug, thiserror::Error, Clone)]
pub enum DeriveError {
    /// Deep-copy synthesis could not bind every read-only field of `type_name`
    /// to a declared constructor (§4.D "best-fit constructor selection").
    #[error("type `{type_name}` has no constructor that can absorb read-only fields {fields:?}")]
    NoBindableConstructor {
        type_name: &'static str,
        fields: Vec<&'static str>,
    },

    /// A `Maybe`-classified type received an instance whose runtime type has
    /// no accessible `Mutability` specialization and a dispatch thunk could
    /// not be synthesized for it (§4.B, §7).
    #[error("no Mutability specialization reachable for runtime type `{runtime_type}` via static type `{static_type}`")]
    MutabilityDispatchMissing {
        static_type: &'static str,
        runtime_type: &'static str,
    },

    /// An operation was requested for a type that never called
    /// [`crate::register`].
    #[error("type `{type_name}` is not registered with the introspector")]
    UnregisteredType { type_name: &'static str },
}
