use crate::{is_mutable, mutability, Mutability};
use induction_model::{
    register, ConstructorDescriptor, FieldDescriptor, Kind, Node, TypeDescriptor, TypeKey, Visibility,
};
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::any::Any;

struct ImmutablePod {
    x: i32,
}

impl Node for ImmutablePod {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<ImmutablePod>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            i32::ensure_registered();
            register::<ImmutablePod>(TypeDescriptor {
                name: "ImmutablePod",
                kind: Kind::Aggregate,
                sealed: true,
                is_value_type: true,
                is_primitive: false,
                fields: vec![FieldDescriptor {
                    name: "x",
                    type_key: TypeKey::of::<i32>(),
                    init_only: true,
                    visibility: Visibility::PRIVATE,
                    is_base: false,
                }],
                constructors: vec![ConstructorDescriptor {
                    params: Vec::new(),
                    invoke: Box::new(|_| Ok(Box::new(ImmutablePod { x: 0 }) as Box<dyn Node>)),
                }],
                interfaces: Vec::new(),
                element_type: None,
                is_pure_attributed: false,
                methods: Vec::new(),
                well_known_copier: None,
            })
        });
        *DESC
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn fields(&self) -> SmallVec<[induction_model::FieldRef<'_>; 4]> {
        let mut out = SmallVec::new();
        out.push(induction_model::FieldRef { name: "x", value: &self.x });
        out
    }
    fn identity(&self) -> Option<usize> {
        None
    }
}

struct MutablePublicField {
    #[allow(dead_code)]
    count: i32,
}

impl Node for MutablePublicField {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<MutablePublicField>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            i32::ensure_registered();
            register::<MutablePublicField>(TypeDescriptor {
                name: "MutablePublicField",
                kind: Kind::Aggregate,
                sealed: true,
                is_value_type: false,
                is_primitive: false,
                fields: vec![FieldDescriptor {
                    name: "count",
                    type_key: TypeKey::of::<i32>(),
                    init_only: false,
                    visibility: Visibility::PUBLIC,
                    is_base: false,
                }],
                constructors: Vec::new(),
                interfaces: Vec::new(),
                element_type: None,
                is_pure_attributed: false,
                methods: Vec::new(),
                well_known_copier: None,
            })
        });
        *DESC
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn fields(&self) -> SmallVec<[induction_model::FieldRef<'_>; 4]> {
        SmallVec::new()
    }
    fn identity(&self) -> Option<usize> {
        Some(self as *const Self as usize)
    }
}

/// Stand-in for a declared trait-object field type: never itself a `Node`,
/// only registered so `dyn_field`'s declared type resolves to
/// `Kind::TraitObject` during static classification.
struct DynFieldMarker;

struct MaybeHolder {
    dyn_field: Box<dyn Node>,
}

impl Node for MaybeHolder {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<MaybeHolder>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            register::<DynFieldMarker>(TypeDescriptor {
                name: "DynFieldMarker",
                kind: Kind::TraitObject,
                sealed: false,
                is_value_type: false,
                is_primitive: false,
                fields: Vec::new(),
                constructors: Vec::new(),
                interfaces: Vec::new(),
                element_type: None,
                is_pure_attributed: false,
                methods: Vec::new(),
                well_known_copier: None,
            });
            register::<MaybeHolder>(TypeDescriptor {
                name: "MaybeHolder",
                kind: Kind::Aggregate,
                sealed: true,
                is_value_type: false,
                is_primitive: false,
                fields: vec![FieldDescriptor {
                    name: "dyn_field",
                    type_key: TypeKey::of::<DynFieldMarker>(),
                    init_only: true,
                    visibility: Visibility::PRIVATE,
                    is_base: false,
                }],
                constructors: Vec::new(),
                interfaces: Vec::new(),
                element_type: None,
                is_pure_attributed: false,
                methods: Vec::new(),
                well_known_copier: None,
            })
        });
        *DESC
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
    fn fields(&self) -> SmallVec<[induction_model::FieldRef<'_>; 4]> {
        let mut out = SmallVec::new();
        out.push(induction_model::FieldRef {
            name: "dyn_field",
            value: self.dyn_field.as_ref(),
        });
        out
    }
    fn identity(&self) -> Option<usize> {
        Some(self as *const Self as usize)
    }
}

#[test]
fn primitives_are_immutable() {
    assert_eq!(mutability::<i32>(), Mutability::Immutable);
    assert_eq!(mutability::<bool>(), Mutability::Immutable);
}

#[test]
fn vec_is_mutable_by_blacklist() {
    assert_eq!(mutability::<Vec<i32>>(), Mutability::Mutable);
}

#[test]
fn sealed_private_init_only_pod_is_immutable() {
    assert_eq!(mutability::<ImmutablePod>(), Mutability::Immutable);
    assert!(!is_mutable(&ImmutablePod { x: 7 }));
}

#[test]
fn publicly_exposed_mutable_field_forces_mutable() {
    assert_eq!(mutability::<MutablePublicField>(), Mutability::Mutable);
    assert!(is_mutable(&MutablePublicField { count: 1 }));
}

#[test]
fn trait_object_field_classifies_as_maybe() {
    assert_eq!(mutability::<MaybeHolder>(), Mutability::Maybe);
}

#[test]
fn maybe_type_defers_to_instance_payload() {
    let immutable_payload = MaybeHolder {
        dyn_field: Box::new(5i32),
    };
    assert!(!is_mutable(&immutable_payload));

    let mutable_payload = MaybeHolder {
        dyn_field: Box::new(vec![1, 2, 3]),
    };
    assert!(is_mutable(&mutable_payload));
}
