// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::hint::black_box;

use arrayshape::ast::DynamicType;
use arrayshape::shape::as_constant_extents;
use arrayshape::symbol::{ArraySpec, ObjectEntityDetails};
use arrayshape::*;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn real_array(name: &str, rank: usize) -> SymbolRef {
    let bounds: Vec<(i64, i64)> = (0..rank).map(|d| (1, 4 + d as i64)).collect();
    Symbol::object(
        name,
        Attrs::empty(),
        ObjectEntityDetails::new(ArraySpec::explicit(&bounds)).with_type(DynamicType::real(8)),
    )
}

fn strided_section(array: &SymbolRef, rank: usize) -> Expr {
    let subscripts = (0..rank)
        .map(|_| {
            Subscript::Triplet(Triplet::new(
                Some(ExtentExpr::Constant(2)),
                None,
                ExtentExpr::Constant(2),
            ))
        })
        .collect();
    Expr::from(DataRef::ArrayRef(ArrayRef::new(
        NamedEntity::Symbol(array.clone()),
        subscripts,
    )))
}

fn sections(c: &mut Criterion) {
    let mut group = c.benchmark_group("section shape");
    for rank in [1usize, 3, 7, 15].iter() {
        group.bench_with_input(BenchmarkId::new("folded", rank), rank, |b, &rank| {
            let section = strided_section(&real_array("a", rank), rank);
            let context = FoldingContext::new();
            b.iter(|| {
                let shape = get_shape_folded(&context, black_box(&section));
                assert!(shape.is_some());
            })
        });

        group.bench_with_input(BenchmarkId::new("symbolic", rank), rank, |b, &rank| {
            let section = strided_section(&real_array("a", rank), rank);
            b.iter(|| get_shape(black_box(&section)))
        });
    }
    group.finish();
}

fn constructors(c: &mut Criterion) {
    // [(i, i = 1, n), 0, 0]
    let mut group = c.benchmark_group("array constructor");
    for trips in [16i64, 1024, 65536].iter() {
        group.bench_with_input(BenchmarkId::new("implied do", trips), trips, |b, &trips| {
            let constructor = Expr::from(ArrayConstructor::new(vec![
                ArrayConstructorValue::ImpliedDo(ImpliedDo::new(
                    "i",
                    ExtentExpr::Constant(1),
                    ExtentExpr::Constant(trips),
                    ExtentExpr::Constant(1),
                    vec![ArrayConstructorValue::Expr(Expr::Extent(
                        ExtentExpr::ImpliedDoIndex("i".into()),
                    ))],
                )),
                ArrayConstructorValue::Expr(Expr::integer(0)),
                ArrayConstructorValue::Expr(Expr::integer(0)),
            ]));
            let context = FoldingContext::new();
            b.iter(|| {
                let shape = get_shape_folded(&context, black_box(&constructor));
                assert_eq!(
                    shape.as_deref().and_then(|s| as_constant_extents(&context, s)),
                    Some(vec![trips + 2])
                );
            })
        });
    }
    group.finish();
}

fn conformance(c: &mut Criterion) {
    let left: Shape = (1..=7).map(|e| Some(ExtentExpr::Constant(e))).collect();
    let right = left.clone();
    c.bench_function("check conformance of rank 7 shapes", |b| {
        b.iter(|| {
            let mut messages = Messages::new();
            let conforms = check_conformance(
                &mut messages,
                black_box(&left),
                black_box(&right),
                CheckConformanceFlags::NONE,
                "left",
                "right",
            );
            assert_eq!(conforms, Some(true));
        })
    });
}

criterion_group!(benches, sections, constructors, conformance);
criterion_main!(benches);
