// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use super::common::*;
use crate::ast::DynamicType;
use crate::characteristics::TypeAndShape;
use crate::expr::InquiryField;
use crate::intrinsics::{
    lookup, override_intrinsic_table, IntrinsicProber, IntrinsicTableError, ShapeRule,
    SpecificCall, StandardIntrinsics,
};
use crate::shape::*;
use crate::*;

use alloc::vec;
use alloc::vec::Vec;

struct Fixture {
    m: SymbolRef,
    v: SymbolRef,
    w: SymbolRef,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            m: array("m", &[(1, 3), (1, 4)]),
            v: array("v", &[(1, 4)]),
            w: array("w", &[(1, 4), (1, 2)]),
        }
    }
}

fn keyword(expr: Expr, name: &str) -> Option<ActualArgument> {
    Some(ActualArgument::with_keyword(expr, name))
}

fn positional(expr: Expr) -> Option<ActualArgument> {
    Some(ActualArgument::new(expr))
}

/// A 3x4 mask with five true elements.
fn sparse_mask() -> Expr {
    let values = [
        true, false, true, false, true, false, false, false, true, true, false, false,
    ];
    Expr::Constant(Constant::logical_array(&values, vec![3, 4]).unwrap())
}

#[test]
fn rank_vectors() {
    let f = Fixture::new();
    assert_eq!(get_shape(&call("shape", vec![var(&f.m)])), Some(literal_shape(&[2])));
    assert_eq!(get_shape(&call("lbound", vec![var(&f.v)])), Some(literal_shape(&[1])));
    assert_eq!(
        get_shape(&call("ubound", vec![var(&f.m), Expr::integer(1)])),
        Some(scalar_shape())
    );
}

#[test]
fn reductions() {
    let f = Fixture::new();
    let context = FoldingContext::new();

    let along_rows = call("sum", vec![var(&f.m), Expr::integer(2)]);
    assert_eq!(get_shape(&along_rows), Some(literal_shape(&[3])));

    assert_eq!(get_shape(&call("sum", vec![var(&f.m)])), Some(scalar_shape()));
    assert_eq!(get_shape(&call("sum", vec![var(&f.m), Expr::integer(3)])), None);
    assert_eq!(get_shape(&call("all", vec![sparse_mask(), Expr::integer(1)])), Some(literal_shape(&[4])));

    let d = dummy_scalar("d");
    let unknown_dim = call("maxval", vec![var(&f.m), var(&d)]);
    assert_eq!(unknown_dim.rank(), 1);
    assert_eq!(get_shape_folded(&context, &unknown_dim), None);

    let one = parameter("one", 1);
    let named_dim = call("product", vec![var(&f.m), var(&one)]);
    assert_eq!(get_shape(&named_dim), None);
    assert_eq!(get_shape_folded(&context, &named_dim), Some(literal_shape(&[4])));
}

#[test]
fn locations() {
    let f = Fixture::new();
    assert_eq!(get_shape(&call("maxloc", vec![var(&f.m)])), Some(literal_shape(&[2])));
    assert_eq!(
        get_shape(&call("minloc", vec![var(&f.m), Expr::integer(1)])),
        Some(literal_shape(&[4]))
    );
    assert_eq!(
        get_shape(&call(
            "findloc",
            vec![var(&f.m), Expr::integer(1), Expr::integer(2)]
        )),
        Some(literal_shape(&[3]))
    );
    assert_eq!(
        get_shape(&call("findloc", vec![var(&f.v), Expr::integer(0)])),
        Some(literal_shape(&[1]))
    );
}

#[test]
fn same_shape_as_argument() {
    let f = Fixture::new();
    assert_eq!(
        get_shape(&call("cshift", vec![var(&f.m), Expr::integer(1)])),
        Some(literal_shape(&[3, 4]))
    );
    assert_eq!(
        get_shape(&call("eoshift", vec![var(&f.v), Expr::integer(-1)])),
        Some(literal_shape(&[4]))
    );
    let unpacked = call("unpack", vec![var(&f.v), sparse_mask(), Expr::integer(0)]);
    assert_eq!(get_shape(&unpacked), Some(literal_shape(&[3, 4])));
}

#[test]
fn matrix_products() {
    let f = Fixture::new();
    assert_eq!(
        get_shape(&call("matmul", vec![var(&f.m), var(&f.w)])),
        Some(literal_shape(&[3, 2]))
    );
    assert_eq!(
        get_shape(&call("matmul", vec![var(&f.v), var(&f.w)])),
        Some(literal_shape(&[2]))
    );
    assert_eq!(
        get_shape(&call("matmul", vec![var(&f.m), var(&f.v)])),
        Some(literal_shape(&[3]))
    );
}

#[test]
fn reshapes() {
    let f = Fixture::new();
    let square = call(
        "reshape",
        vec![var(&f.v), Expr::Constant(Constant::integer_vector(&[2, 2]))],
    );
    assert_eq!(get_shape(&square), Some(literal_shape(&[2, 2])));

    let n = dummy_scalar("n");
    let extents = Expr::from(ArrayConstructor::new(vec![
        ArrayConstructorValue::Expr(Expr::integer(2)),
        ArrayConstructorValue::Expr(var(&n)),
    ]));
    let open = call("reshape", vec![var(&f.v), extents]);
    assert_eq!(get_shape(&open), Some(vec![lit(2), Some(sym(&n))]));
}

#[test]
fn pack_counts_the_mask() {
    let f = Fixture::new();
    let context = FoldingContext::new();

    let packed = call("pack", vec![var(&f.m), sparse_mask()]);
    assert_eq!(get_shape_folded(&context, &packed), Some(literal_shape(&[5])));
    // The element count needs the intrinsic prober.
    assert_eq!(get_shape(&packed), None);

    let unfolded = FoldingContext::with_options(FoldingOptions {
        fold_intrinsics: false,
        ..FoldingOptions::default()
    });
    let shape = get_shape_folded(&unfolded, &packed).unwrap();
    assert!(matches!(shape[0], Some(ExtentExpr::FunctionRef(_))));
}

#[test]
fn pack_with_scalar_mask() {
    let f = Fixture::new();
    let context = FoldingContext::new();

    let all = call("pack", vec![var(&f.m), Expr::Constant(Constant::logical(true))]);
    assert_eq!(get_shape_folded(&context, &all), Some(literal_shape(&[12])));

    let none = call("pack", vec![var(&f.m), Expr::Constant(Constant::logical(false))]);
    assert_eq!(get_shape_folded(&context, &none), Some(literal_shape(&[0])));
}

#[test]
fn pack_with_vector() {
    let f = Fixture::new();
    let packed = call("pack", vec![var(&f.m), sparse_mask(), var(&f.v)]);
    assert_eq!(get_shape(&packed), Some(literal_shape(&[4])));
}

struct NoIntrinsics;

impl IntrinsicProber for NoIntrinsics {
    fn probe(
        &self,
        _name: &str,
        _arguments: &[Option<ActualArgument>],
        _context: &FoldingContext,
    ) -> Option<SpecificCall> {
        None
    }
}

#[test]
fn pack_without_prober() {
    let f = Fixture::new();
    let context = FoldingContext::new().with_prober(Rc::new(NoIntrinsics));
    let packed = call("pack", vec![var(&f.m), sparse_mask()]);
    assert_eq!(get_shape_folded(&context, &packed), None);
}

#[test]
fn spreads() {
    let f = Fixture::new();
    assert_eq!(
        get_shape(&call(
            "spread",
            vec![var(&f.v), Expr::integer(1), Expr::integer(3)]
        )),
        Some(literal_shape(&[3, 4]))
    );

    let n = dummy_scalar("n");
    assert_eq!(
        get_shape(&call("spread", vec![var(&f.v), Expr::integer(2), var(&n)])),
        Some(vec![lit(4), Some(sym(&n))])
    );

    assert_eq!(
        get_shape(&call(
            "spread",
            vec![var(&f.v), Expr::integer(3), Expr::integer(2)]
        )),
        None
    );
    assert_eq!(
        get_shape(&call(
            "spread",
            vec![var(&f.v), Expr::integer(0), Expr::integer(2)]
        )),
        None
    );
}

#[test]
fn transfers() {
    let f = Fixture::new();
    let context = FoldingContext::new();
    let mold = Expr::Constant(Constant::integer_vector(&[0]));

    // Sixteen bytes of real(4) need two integer(8) elements.
    let reinterpreted = call("transfer", vec![var(&f.v), mold.clone()]);
    assert_eq!(get_shape_folded(&context, &reinterpreted), Some(literal_shape(&[2])));
    assert_eq!(get_shape(&reinterpreted), None);

    let sized = call("transfer", vec![var(&f.v), mold, Expr::integer(5)]);
    assert_eq!(get_shape(&sized), Some(literal_shape(&[5])));

    let scalar = call("transfer", vec![var(&f.v), Expr::integer(0)]);
    assert_eq!(get_shape(&scalar), Some(scalar_shape()));
}

#[test]
fn transposes() {
    let f = Fixture::new();
    assert_eq!(
        get_shape(&call("transpose", vec![var(&f.m)])),
        Some(literal_shape(&[4, 3]))
    );
}

#[test]
fn null_takes_the_mold_shape() {
    let p = object(
        "p",
        Attrs::empty().with(Attr::Pointer),
        vec![
            crate::symbol::ShapeSpec::deferred(),
            crate::symbol::ShapeSpec::deferred(),
        ],
    );
    let null = call_with("null", &[keyword(var(&p), "mold")]);
    assert_eq!(null.rank(), 2);
    assert_eq!(
        get_shape(&null),
        Some(vec![
            Some(ExtentExpr::inquiry(entity(&p), InquiryField::Extent, 0)),
            Some(ExtentExpr::inquiry(entity(&p), InquiryField::Extent, 1)),
        ])
    );
    assert_eq!(get_shape(&call_with("null", &[])), Some(scalar_shape()));
}

#[test]
fn unknown_intrinsic_has_no_shape() {
    let f = Fixture::new();
    let mystery = ProcedureRef::new(
        ProcedureDesignator::Intrinsic(SpecificIntrinsic::new("mystery", 1)),
        vec![positional(var(&f.v))],
    );
    assert_eq!(get_shape(&mystery), None);
}

#[test]
fn keyword_arguments() {
    let f = Fixture::new();
    let reordered = call_with(
        "sum",
        &[keyword(Expr::integer(1), "DIM"), keyword(var(&f.m), "Array")],
    );
    assert_eq!(get_shape(&reordered), Some(literal_shape(&[4])));

    let resolved = StandardIntrinsics
        .resolve("SUM", &[positional(var(&f.m)), keyword(Expr::integer(2), "dim")])
        .unwrap();
    assert_eq!(resolved.intrinsic.name(), "sum");
    assert_eq!(resolved.intrinsic.rank(), 1);
    assert_eq!(resolved.arguments.len(), 3);
    assert!(resolved.arguments[2].is_none());
}

#[test]
fn unresolvable_calls() {
    let f = Fixture::new();
    let intrinsics = StandardIntrinsics;

    assert!(intrinsics.resolve("frobnicate", &[positional(var(&f.m))]).is_none());
    // MATMUL needs both matrices.
    assert!(intrinsics.resolve("matmul", &[positional(var(&f.m))]).is_none());
    // ARRAY given twice.
    assert!(intrinsics
        .resolve("sum", &[positional(var(&f.m)), keyword(var(&f.m), "array")])
        .is_none());
    assert!(intrinsics
        .resolve("sum", &[positional(var(&f.m)), keyword(Expr::integer(1), "along")])
        .is_none());
    // More positional arguments than dummies.
    let too_many: Vec<_> = (0..4).map(|_| positional(var(&f.v))).collect();
    assert!(intrinsics.resolve("transpose", &too_many).is_none());
}

#[test]
fn probing_through_the_context() {
    let context = FoldingContext::new();
    let call = context
        .intrinsics()
        .probe("count", &[positional(sparse_mask())], &context)
        .unwrap();
    assert_eq!(call.intrinsic.rank(), 0);
    let count = ExtentExpr::FunctionRef(alloc::boxed::Box::new(call.into_procedure_ref()));
    assert_eq!(context.fold(count), int(5));
}

#[test]
fn catalog_lookup() {
    let spec = lookup("MatMul").unwrap();
    assert_eq!(spec.shape_rule(), ShapeRule::Matmul);
    assert_eq!(spec.required(), 2);
    assert_eq!(spec.keywords(), ["matrix_a", "matrix_b"]);

    let null = lookup("null").unwrap();
    assert!(null.is_pointer());
    assert_eq!(null.required(), 0);
    assert!(lookup("sin").unwrap().is_elemental());
    assert!(lookup("frobnicate").is_none());
}

#[test]
fn rejected_catalogs() {
    // None of these replace the active table.
    assert!(matches!(
        override_intrinsic_table("not json"),
        Err(IntrinsicTableError::Parse(_))
    ));
    assert!(matches!(
        override_intrinsic_table(r#"{"intrinsics": [{"name": "x"}, {"name": "x"}]}"#),
        Err(IntrinsicTableError::DuplicateIntrinsic(name)) if name == "x"
    ));
    assert!(matches!(
        override_intrinsic_table(
            r#"{"intrinsics": [{"name": "x", "keywords": ["a"], "required": 2}]}"#
        ),
        Err(IntrinsicTableError::TooManyRequired {
            required: 2,
            available: 1,
            ..
        })
    ));
    assert!(matches!(
        override_intrinsic_table(r#"{"intrinsics": [{"name": "x", "elemental": true}]}"#),
        Err(IntrinsicTableError::InvalidRule { .. })
    ));
    assert!(matches!(
        override_intrinsic_table(
            r#"{"intrinsics": [{"name": "x", "keywords": ["a"],
                "shape": {"kind": "same_as_argument", "index": 1}}]}"#
        ),
        Err(IntrinsicTableError::InvalidRule { .. })
    ));

    assert!(lookup("sum").is_some());
}

#[test]
fn storage_sizes() {
    let f = Fixture::new();
    let context = FoldingContext::new();

    let v = TypeAndShape::characterize(&var(&f.v), &context).unwrap();
    assert_eq!(v.ty(), &DynamicType::real(4));
    assert_eq!(v.rank(), 1);
    assert_eq!(v.measure_element_size_in_bytes(&context), Some(int(4)));
    assert_eq!(v.measure_size_in_bytes(&context), Some(int(16)));

    let m = TypeAndShape::characterize_symbol(&f.m, &context).unwrap();
    assert_eq!(m.shape(), &literal_shape(&[3, 4]));
    assert_eq!(m.measure_size_in_bytes(&context), Some(int(48)));

    let z = TypeAndShape::new(DynamicType::complex(8), scalar_shape());
    assert_eq!(z.measure_size_in_bytes(&context), Some(int(16)));

    let text = TypeAndShape::new(DynamicType::character(4, Some(int(3))), literal_shape(&[2]));
    assert_eq!(text.measure_element_size_in_bytes(&context), Some(int(12)));
    assert_eq!(text.measure_size_in_bytes(&context), Some(int(24)));

    let unknown_length = TypeAndShape::new(DynamicType::character(1, None), scalar_shape());
    assert_eq!(unknown_length.measure_element_size_in_bytes(&context), None);

    let record = TypeAndShape::characterize_symbol(&derived_scalar("t"), &context).unwrap();
    assert_eq!(record.measure_size_in_bytes(&context), None);

    assert!(TypeAndShape::characterize_argument(None, &context).is_none());
    let argument = ActualArgument::new(var(&f.w));
    assert_eq!(
        TypeAndShape::characterize_argument(Some(&argument), &context)
            .unwrap()
            .shape(),
        &literal_shape(&[4, 2])
    );
}
