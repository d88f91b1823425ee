//! `Node` implementations for the whitelisted primitives and the few
//! "well-known" container shapes the original design hand-writes copiers
//! for (§4.B.1, §4.D.5): lists, fixed-size arrays, nullable, pointer/
//! reference indirections.

use crate::descriptor::TypeDescriptor;
use crate::key::{Kind, TypeKey};
use crate::node::{FieldRef, Node};
use crate::registry::{ensure_registered, register};
use once_cell::sync::Lazy;
use smallvec::{smallvec, SmallVec};
use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

macro_rules! primitive_node {
    ($ty:ty, $name:literal) => {
        impl Node for $ty {
            fn type_key(&self) -> TypeKey {
                TypeKey::of::<$ty>()
            }

            fn descriptor(&self) -> &'static TypeDescriptor {
                Self::ensure_registered()
            }

            fn ensure_registered() -> &'static TypeDescriptor {
                static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
                    register::<$ty>(TypeDescriptor {
                        name: $name,
                        kind: Kind::Primitive,
                        sealed: true,
                        is_value_type: true,
                        is_primitive: true,
                        fields: Vec::new(),
                        constructors: Vec::new(),
                        interfaces: Vec::new(),
                        element_type: None,
                        is_pure_attributed: false,
                        methods: Vec::new(),
                        well_known_copier: Some(Box::new(|v, _refs, _recurse, _is_immutable| {
                            let value = *v
                                .as_any()
                                .downcast_ref::<$ty>()
                                .expect("well-known copier invoked on the wrong concrete type");
                            Ok(Box::new(value) as Box<dyn Node>)
                        })),
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

            fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
                SmallVec::new()
            }

            fn identity(&self) -> Option<usize> {
                None
            }
        }
    };
}

primitive_node!(bool, "bool");
primitive_node!(char, "char");
primitive_node!(i8, "i8");
primitive_node!(i16, "i16");
primitive_node!(i32, "i32");
primitive_node!(i64, "i64");
primitive_node!(i128, "i128");
primitive_node!(isize, "isize");
primitive_node!(u8, "u8");
primitive_node!(u16, "u16");
primitive_node!(u32, "u32");
primitive_node!(u64, "u64");
primitive_node!(u128, "u128");
primitive_node!(usize, "usize");
primitive_node!(f32, "f32");
primitive_node!(f64, "f64");

impl Node for String {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<String>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            register::<String>(TypeDescriptor {
                name: "String",
                kind: Kind::Primitive,
                sealed: true,
                is_value_type: false,
                is_primitive: true,
                fields: Vec::new(),
                constructors: Vec::new(),
                interfaces: Vec::new(),
                element_type: None,
                is_pure_attributed: false,
                methods: Vec::new(),
                well_known_copier: Some(Box::new(|v, _refs, _recurse, _is_immutable| {
                    let value = v
                        .as_any()
                        .downcast_ref::<String>()
                        .expect("well-known copier invoked on the wrong concrete type")
                        .clone();
                    Ok(Box::new(value) as Box<dyn Node>)
                })),
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

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        SmallVec::new()
    }

    fn identity(&self) -> Option<usize> {
        Some(self.as_ptr() as usize)
    }
}

impl<T: Node + Clone + 'static> Node for Vec<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Vec<T>>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        // Register the element type eagerly so the registry always has an
        // entry for `element_type` by the time anything looks it up.
        T::ensure_registered();
        ensure_registered::<Vec<T>>(|| TypeDescriptor {
            name: "Vec",
            kind: Kind::Array,
            sealed: true,
            is_value_type: false,
            is_primitive: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            element_type: Some(TypeKey::of::<T>()),
            is_pure_attributed: false,
            methods: Vec::new(),
            well_known_copier: Some(Box::new(|v, refs, recurse, _is_immutable| {
                let vec = v
                    .as_any()
                    .downcast_ref::<Vec<T>>()
                    .expect("well-known copier invoked on the wrong concrete type");
                let mut out = Vec::with_capacity(vec.len());
                for item in vec {
                    let copied = recurse(item as &dyn Node, refs)?;
                    out.push(downcast_copy::<T>(&*copied));
                }
                Ok(Box::new(out) as Box<dyn Node>)
            })),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        self.iter()
            .map(|item| FieldRef {
                name: "$elem",
                value: item as &dyn Node,
            })
            .collect()
    }

    fn identity(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.as_ptr() as usize)
        }
    }
}

impl<T: Node + Clone + 'static, const N: usize> Node for [T; N] {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<[T; N]>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        T::ensure_registered();
        ensure_registered::<[T; N]>(|| TypeDescriptor {
            name: "array",
            kind: Kind::Array,
            sealed: true,
            is_value_type: true,
            is_primitive: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            element_type: Some(TypeKey::of::<T>()),
            is_pure_attributed: false,
            methods: Vec::new(),
            well_known_copier: Some(Box::new(|v, refs, recurse, _is_immutable| {
                let arr = v
                    .as_any()
                    .downcast_ref::<[T; N]>()
                    .expect("well-known copier invoked on the wrong concrete type");
                let mut out: Vec<T> = Vec::with_capacity(N);
                for item in arr {
                    let copied = recurse(item as &dyn Node, refs)?;
                    out.push(downcast_copy::<T>(&*copied));
                }
                let array: [T; N] = out.try_into().unwrap_or_else(|_| unreachable!("copied exactly N elements"));
                Ok(Box::new(array) as Box<dyn Node>)
            })),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        self.iter()
            .map(|item| FieldRef {
                name: "$elem",
                value: item as &dyn Node,
            })
            .collect()
    }

    fn identity(&self) -> Option<usize> {
        None
    }
}

impl<T: Node + Clone + 'static> Node for Option<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Option<T>>()
    }

    /// Nullable-of-`U` inherits `U`'s descriptor identity for mutability
    /// purposes (§4.B "special case"); the descriptor's own shape records
    /// `Kind::Option` so the cycle detector and copier know to recurse
    /// through the element type unconditionally rather than through named
    /// fields.
    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        T::ensure_registered();
        ensure_registered::<Option<T>>(|| TypeDescriptor {
            name: "Option",
            kind: Kind::Option,
            sealed: true,
            is_value_type: true,
            is_primitive: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            element_type: Some(TypeKey::of::<T>()),
            is_pure_attributed: false,
            methods: Vec::new(),
            well_known_copier: Some(Box::new(|v, refs, recurse, _is_immutable| {
                let opt = v
                    .as_any()
                    .downcast_ref::<Option<T>>()
                    .expect("well-known copier invoked on the wrong concrete type");
                let copied = match opt {
                    Some(inner) => Some(downcast_copy::<T>(&*recurse(inner as &dyn Node, refs)?)),
                    None => None,
                };
                Ok(Box::new(copied) as Box<dyn Node>)
            })),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        match self {
            Some(inner) => smallvec![FieldRef {
                name: "$some",
                value: inner as &dyn Node,
            }],
            None => SmallVec::new(),
        }
    }

    fn identity(&self) -> Option<usize> {
        None
    }
}

impl<T: Node + Clone + 'static> Node for Box<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Box<T>>()
    }

    /// `Box<T>` gets its own descriptor (`Kind::Pointer`, `element_type =
    /// T`) rather than delegating straight to `T`'s: the well-known copier
    /// that knows how to rewrap a recursive copy back into a `Box` has to
    /// live *somewhere* findable from a `Box<T>` node's own `descriptor()`,
    /// and `induction-mutability`'s `Kind::Pointer` branch already treats
    /// an indirection's mutability as `T`'s own by recursing through
    /// `element_type`, so no information is lost by keeping the two
    /// descriptors distinct.
    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        T::ensure_registered();
        ensure_registered::<Box<T>>(|| TypeDescriptor {
            name: "Box",
            kind: Kind::Pointer,
            sealed: true,
            is_value_type: false,
            is_primitive: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            element_type: Some(TypeKey::of::<T>()),
            is_pure_attributed: false,
            methods: Vec::new(),
            well_known_copier: Some(Box::new(|v, refs, recurse, _is_immutable| {
                let boxed = v
                    .as_any()
                    .downcast_ref::<Box<T>>()
                    .expect("well-known copier invoked on the wrong concrete type");
                let copied = downcast_copy::<T>(&*recurse(boxed.as_ref() as &dyn Node, refs)?);
                Ok(Box::new(Box::new(copied)) as Box<dyn Node>)
            })),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        smallvec![FieldRef {
            name: "$boxed",
            value: self.as_ref() as &dyn Node,
        }]
    }

    fn identity(&self) -> Option<usize> {
        Some(self.as_ref() as *const T as usize)
    }
}

impl<T: Node + Clone + 'static> Node for Rc<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Rc<T>>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        T::ensure_registered();
        ensure_registered::<Rc<T>>(|| TypeDescriptor {
            name: "Rc",
            kind: Kind::Pointer,
            sealed: true,
            is_value_type: false,
            is_primitive: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            element_type: Some(TypeKey::of::<T>()),
            is_pure_attributed: false,
            methods: Vec::new(),
            // Unlike `Box<T>`, reuse through `refs` is load-bearing here:
            // two fields holding clones of the same `Rc` must copy to
            // clones of the same *new* `Rc`, not two independent copies.
            well_known_copier: Some(Box::new(|v, refs, recurse, is_immutable| {
                let rc = v
                    .as_any()
                    .downcast_ref::<Rc<T>>()
                    .expect("well-known copier invoked on the wrong concrete type");
                let id = Rc::as_ptr(rc) as usize;
                if let Some(existing) = refs.get(id) {
                    let shared = existing
                        .as_any()
                        .downcast_ref::<Rc<T>>()
                        .expect("reference map entry has the wrong concrete type")
                        .clone();
                    return Ok(Box::new(shared) as Box<dyn Node>);
                }
                // §8 invariant 1: a structurally immutable payload never
                // needs a fresh allocation. Handing back a clone of the
                // same `Rc` is cheaper than rebuilding it and trivially
                // preserves sharing, since every holder now points at the
                // identical original allocation.
                if is_immutable(TypeKey::of::<T>()) {
                    return Ok(Box::new(Rc::clone(rc)) as Box<dyn Node>);
                }
                let copied = downcast_copy::<T>(&*recurse(rc.as_ref() as &dyn Node, refs)?);
                let new_rc = Rc::new(copied);
                refs.insert(id, Box::new(Rc::clone(&new_rc)));
                Ok(Box::new(new_rc) as Box<dyn Node>)
            })),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        // `Rc` is shared by design: exposing a mutable view requires
        // `Rc::get_mut`, which legitimately fails when other owners exist.
        // Callers that need `downcast_mut` on the payload should go
        // through `Rc::get_mut` directly.
        self
    }

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        smallvec![FieldRef {
            name: "$shared",
            value: self.as_ref() as &dyn Node,
        }]
    }

    fn identity(&self) -> Option<usize> {
        Some(Rc::as_ptr(self) as usize)
    }
}

impl<T: Node + Clone + 'static> Node for Arc<T> {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Arc<T>>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        T::ensure_registered();
        ensure_registered::<Arc<T>>(|| TypeDescriptor {
            name: "Arc",
            kind: Kind::Pointer,
            sealed: true,
            is_value_type: false,
            is_primitive: false,
            fields: Vec::new(),
            constructors: Vec::new(),
            interfaces: Vec::new(),
            element_type: Some(TypeKey::of::<T>()),
            is_pure_attributed: false,
            methods: Vec::new(),
            well_known_copier: Some(Box::new(|v, refs, recurse, is_immutable| {
                let arc = v
                    .as_any()
                    .downcast_ref::<Arc<T>>()
                    .expect("well-known copier invoked on the wrong concrete type");
                let id = Arc::as_ptr(arc) as usize;
                if let Some(existing) = refs.get(id) {
                    let shared = existing
                        .as_any()
                        .downcast_ref::<Arc<T>>()
                        .expect("reference map entry has the wrong concrete type")
                        .clone();
                    return Ok(Box::new(shared) as Box<dyn Node>);
                }
                if is_immutable(TypeKey::of::<T>()) {
                    return Ok(Box::new(Arc::clone(arc)) as Box<dyn Node>);
                }
                let copied = downcast_copy::<T>(&*recurse(arc.as_ref() as &dyn Node, refs)?);
                let new_arc = Arc::new(copied);
                refs.insert(id, Box::new(Arc::clone(&new_arc)));
                Ok(Box::new(new_arc) as Box<dyn Node>)
            })),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        smallvec![FieldRef {
            name: "$shared",
            value: self.as_ref() as &dyn Node,
        }]
    }

    fn identity(&self) -> Option<usize> {
        Some(Arc::as_ptr(self) as usize)
    }
}

impl Node for () {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<()>()
    }

    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }

    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            register::<()>(TypeDescriptor {
                name: "()",
                kind: Kind::Primitive,
                sealed: true,
                is_value_type: true,
                is_primitive: true,
                fields: Vec::new(),
                constructors: Vec::new(),
                interfaces: Vec::new(),
                element_type: None,
                is_pure_attributed: false,
                methods: Vec::new(),
                well_known_copier: Some(Box::new(|_v, _refs, _recurse, _is_immutable| Ok(Box::new(()) as Box<dyn Node>))),
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

    fn fields(&self) -> SmallVec<[FieldRef<'_>; 4]> {
        SmallVec::new()
    }

    fn identity(&self) -> Option<usize> {
        None
    }
}

/// Extract an owned `T` out of a freshly produced `Box<dyn Node>`, the
/// boundary every well-known container copier crosses to rebuild its
/// concretely typed container (`Vec<T>`, `Option<T>`, `Rc<T>`, ...) from a
/// type-erased recursive copy.
fn downcast_copy<T: Node + Clone + 'static>(copied: &dyn Node) -> T {
    copied
        .as_any()
        .downcast_ref::<T>()
        .expect("recursive copy returned a different concrete type")
        .clone()
}
