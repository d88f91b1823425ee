//! Steady-state `structural_eq`/`is_mutable` cost on representative type
//! graphs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use induction::{
    is_mutable, register, structural_eq, ConstructorDescriptor, ConstructorParam, FieldDescriptor, Kind, Node,
    TypeDescriptor, TypeKey, Visibility,
};
use once_cell::sync::Lazy;
use smallvec::SmallVec;
use std::any::Any;

#[derive(Clone)]
struct Point {
    x: i32,
    y: i32,
}

impl Node for Point {
    fn type_key(&self) -> TypeKey {
        TypeKey::of::<Point>()
    }
    fn descriptor(&self) -> &'static TypeDescriptor {
        Self::ensure_registered()
    }
    fn ensure_registered() -> &'static TypeDescriptor {
        static DESC: Lazy<&'static TypeDescriptor> = Lazy::new(|| {
            i32::ensure_registered();
            register::<Point>(TypeDescriptor {
                name: "Point",
                kind: Kind::Aggregate,
                sealed: true,
                is_value_type: true,
                is_primitive: false,
                fields: vec![
                    FieldDescriptor { name: "x", type_key: TypeKey::of::<i32>(), init_only: true, visibility: Visibility::PUBLIC, is_base: false },
                    FieldDescriptor { name: "y", type_key: TypeKey::of::<i32>(), init_only: true, visibility: Visibility::PUBLIC, is_base: false },
                ],
                constructors: vec![ConstructorDescriptor {
                    params: vec![
                        ConstructorParam { name: "x", type_key: TypeKey::of::<i32>() },
                        ConstructorParam { name: "y", type_key: TypeKey::of::<i32>() },
                    ],
                    invoke: Box::new(|m| {
                        let x = *m.remove("x").unwrap().as_any().downcast_ref::<i32>().unwrap();
                        let y = *m.remove("y").unwrap().as_any().downcast_ref::<i32>().unwrap();
                        Ok(Box::new(Point { x, y }) as Box<dyn Node>)
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
        out.push(induction::FieldRef { name: "x", value: &self.x });
        out.push(induction::FieldRef { name: "y", value: &self.y });
        out
    }
    fn identity(&self) -> Option<usize> {
        None
    }
}

fn bench_primitive_eq(c: &mut Criterion) {
    c.bench_function("structural_eq/i32_equal", |b| b.iter(|| structural_eq(black_box(&1i32), black_box(&1i32))));
    c.bench_function("structural_eq/i32_unequal", |b| b.iter(|| structural_eq(black_box(&1i32), black_box(&2i32))));
}

fn bench_struct_eq(c: &mut Criterion) {
    Point::ensure_registered();
    let a = Point { x: 1, y: 2 };
    let b = Point { x: 1, y: 2 };
    c.bench_function("structural_eq/struct_point", |bencher| bencher.iter(|| structural_eq(black_box(&a), black_box(&b))));
}

fn bench_vec_eq_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural_eq/vec_i32");
    for size in [8usize, 64, 512, 4096] {
        let a: Vec<i32> = (0..size as i32).collect();
        let b = a.clone();
        group.bench_with_input(BenchmarkId::from_parameter(size), &(a, b), |bencher, (a, b)| {
            bencher.iter(|| structural_eq(black_box(a), black_box(b)))
        });
    }
    group.finish();
}

fn bench_is_mutable(c: &mut Criterion) {
    let v = vec![1, 2, 3];
    c.bench_function("is_mutable/vec_i32", |b| b.iter(|| is_mutable(black_box(&v))));
    c.bench_function("is_mutable/i32", |b| b.iter(|| is_mutable(black_box(&42i32))));
}

criterion_group!(equality_benches, bench_primitive_eq, bench_struct_eq, bench_vec_eq_scaling, bench_is_mutable);
criterion_main!(equality_benches);
