//! S5: two mutually recursive aggregate types compared/copied across the
//! type boundary.

use induction::{
    copy, register, structural_eq, ConstructorDescriptor, ConstructorParam, FieldDescriptor, Kind, Node, TypeDescriptor,
    TypeKey, Visibility,
};
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::any::Any;

#[derive(Clone)]
struct ANode {
    value: i32,
    next: Box<BNode>,
}

#[derive(Clone)]
struct BNode {
    value: i32,
    back: Option<Box<ANode>>,
}

impl Node for ANode {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<ANode>()
    }
    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }
    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            i32::ensure_registered();
            BNode::ensure_registered();
            register::<ANode>(TypeDescriptor {
                name: "ANode",
                kind: Kind::Aggregate,
                sealed: true,
                is_value_type: false,
                is_primitive: false,
                fields: vec![
                    FieldDescriptor {
                        name: "value",
                        type_key: TypeKey::of::<i32>(),
                        init_only: true,
                        visibility: Visibility::PUBLIC,
                        is_base: false,
                    },
                    FieldDescriptor {
                        name: "next",
                        type_key: TypeKey::of::<BNode>(),
                        init_only: true,
                        visibility: Visibility::PUBLIC,
                        is_base: false,
                    },
                ],
                constructors: vec![ConstructorDescriptor {
                    params: vec![
                        ConstructorParam { name: "value", type_key: TypeKey::of::<i32>() },
                        ConstructorParam { name: "next", type_key: TypeKey::of::<BNode>() },
                    ],
                    invoke: Box::new(|m| {
                        let value = *m.remove("value").expect("value stashed").as_any().downcast_ref::<i32>().unwrap();
                        let next = m.remove("next").expect("next stashed");
                        let next = Box::new(next.as_any().downcast_ref::<BNode>().expect("next is BNode").clone());
                        Ok(Box::new(ANode { value, next }) as Box<dyn Node>)
                    }),
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
    fn fields(&self) -> SmallVec<[induction::FieldRef<'_>; 4]> {
        let mut out = SmallVec::new();
        out.push(induction::FieldRef { name: "value", value: &self.value });
        out.push(induction::FieldRef { name: "next", value: self.next.as_ref() as &dyn Node });
        out
    }
    fn identity(&self) -> Option<usize> {
        Some(self as *const Self as usize)
    }
}

impl Node for BNode {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<BNode>()
    }
    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }
    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            i32::ensure_registered();
            register::<BNode>(TypeDescriptor {
                name: "BNode",
                kind: Kind::Aggregate,
                sealed: true,
                is_value_type: false,
                is_primitive: false,
                fields: vec![
                    FieldDescriptor {
                        name: "value",
                        type_key: TypeKey::of::<i32>(),
                        init_only: true,
                        visibility: Visibility::PUBLIC,
                        is_base: false,
                    },
                    FieldDescriptor {
                        name: "back",
                        type_key: TypeKey::of::<ANode>(),
                        init_only: true,
                        visibility: Visibility::PUBLIC,
                        is_base: false,
                    },
                ],
                constructors: vec![ConstructorDescriptor {
                    params: vec![
                        ConstructorParam { name: "value", type_key: TypeKey::of::<i32>() },
                        ConstructorParam { name: "back", type_key: TypeKey::of::<ANode>() },
                    ],
                    invoke: Box::new(|m| {
                        let value = *m.remove("value").expect("value stashed").as_any().downcast_ref::<i32>().unwrap();
                        let back = m
                            .remove("back")
                            .map(|boxed| Box::new(boxed.as_any().downcast_ref::<ANode>().expect("back is ANode").clone()));
                        Ok(Box::new(BNode { value, back }) as Box<dyn Node>)
                    }),
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
    fn fields(&self) -> SmallVec<[induction::FieldRef<'_>; 4]> {
        let mut out = SmallVec::new();
        out.push(induction::FieldRef { name: "value", value: &self.value });
        if let Some(back) = &self.back {
            out.push(induction::FieldRef { name: "back", value: back.as_ref() as &dyn Node });
        }
        out
    }
    fn identity(&self) -> Option<usize> {
        Some(self as *const Self as usize)
    }
}

#[test]
fn identical_shape_graphs_compare_equal() {
    let a1 = ANode { value: 1, next: Box::new(BNode { value: 2, back: None }) };
    let a2 = ANode { value: 1, next: Box::new(BNode { value: 2, back: None }) };
    assert!(structural_eq(&a1, &a2));
}

#[test]
fn changing_one_leaf_compares_unequal() {
    let a1 = ANode { value: 1, next: Box::new(BNode { value: 2, back: None }) };
    let a2 = ANode { value: 1, next: Box::new(BNode { value: 99, back: None }) };
    assert!(!structural_eq(&a1, &a2));
}

#[test]
fn non_identical_shape_compares_unequal() {
    let shallow = ANode { value: 1, next: Box::new(BNode { value: 2, back: None }) };
    let deep = ANode {
        value: 1,
        next: Box::new(BNode {
            value: 2,
            back: Some(Box::new(ANode { value: 1, next: Box::new(BNode { value: 2, back: None }) })),
        }),
    };
    assert!(!structural_eq(&shallow, &deep));
}

#[test]
fn copy_round_trips_across_the_mutually_recursive_boundary() {
    let original = ANode { value: 7, next: Box::new(BNode { value: 8, back: None }) };
    let copied = copy(&original).unwrap();
    assert!(structural_eq(&original, &copied));
    assert_eq!(copied.value, 7);
    assert_eq!(copied.next.value, 8);
}
