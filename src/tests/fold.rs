// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used)]

use super::common::*;
use crate::ast::TypeCategory;
use crate::shape::ShapeOptions;
use crate::*;

use alloc::string::ToString;
use alloc::vec;

#[test]
fn literal_arithmetic() {
    let context = FoldingContext::new();
    assert_eq!(context.fold(int(2) + int(3) * int(4)), int(14));
    assert_eq!(context.fold((int(10) - int(4)) / int(4)), int(1));
    assert_eq!(context.fold(-(int(6))), int(-6));
    assert_eq!(context.fold(ExtentExpr::max(int(3), int(-1))), int(3));
    assert_eq!(context.fold(ExtentExpr::min(int(3), int(-1))), int(-1));
}

#[test]
fn overflow_and_division_by_zero_stay_symbolic() {
    let context = FoldingContext::new();
    let overflow = int(i64::MAX) + int(1);
    assert_eq!(context.fold(overflow.clone()), overflow);

    let by_zero = int(4) / int(0);
    assert_eq!(context.fold(by_zero.clone()), by_zero);

    let negated = -int(i64::MIN);
    assert_eq!(context.fold(negated.clone()), negated);
}

#[test]
fn identities() {
    let context = FoldingContext::new();
    let n = dummy_scalar("n");
    assert_eq!(context.fold(int(0) + sym(&n)), sym(&n));
    assert_eq!(context.fold(sym(&n) + int(0)), sym(&n));
    assert_eq!(context.fold(sym(&n) - int(0)), sym(&n));
    assert_eq!(context.fold(int(1) * sym(&n)), sym(&n));
    assert_eq!(context.fold(sym(&n) * int(1)), sym(&n));
    assert_eq!(context.fold(sym(&n) / int(1)), sym(&n));
    assert_eq!(context.fold(sym(&n) * int(2)), sym(&n) * int(2));
}

#[test]
fn reassociation() {
    let context = FoldingContext::new();
    let n = dummy_scalar("n");
    assert_eq!(context.fold((sym(&n) + int(2)) - int(3)), sym(&n) - 1);
    assert_eq!(context.fold((sym(&n) - int(1)) + int(1)), sym(&n));
    assert_eq!(context.fold((sym(&n) + int(2)) + int(3)), sym(&n) + 5);
    assert_eq!(
        context.fold(sym(&n) - int(2) + int(1)).to_string(),
        "(n-1)"
    );
}

#[test]
fn named_constants() {
    let k = parameter("k", 6);
    let context = FoldingContext::new();
    assert_eq!(context.fold(sym(&k) * int(2)), int(12));
    assert_eq!(context.fold_to_i64(&var(&k)), Some(6));
    assert_eq!(
        context.constant_value(&var(&k)),
        Some(Constant::integer(6))
    );

    let literal_only = FoldingContext::with_options(FoldingOptions {
        substitute_parameters: false,
        ..FoldingOptions::default()
    });
    assert_eq!(literal_only.fold(sym(&k) * int(2)), sym(&k) * int(2));
    assert_eq!(literal_only.constant_value(&var(&k)), None);

    // Variables are never substituted.
    let n = dummy_scalar("n");
    assert_eq!(context.fold(sym(&n)), sym(&n));
    assert_eq!(context.fold_to_i64(&var(&n)), None);
}

#[test]
fn inquiries_stay_unfolded() {
    let p = object(
        "p",
        Attrs::empty().with(Attr::Allocatable),
        vec![crate::symbol::ShapeSpec::deferred()],
    );
    let context = FoldingContext::new();
    let extent = crate::shape::get_extent(&entity(&p), 0).unwrap();
    assert_eq!(context.fold(extent.clone() * int(1)), extent);
    assert_eq!(
        context.fold(extent.clone() + int(1)).to_string(),
        "(size(p,dim=1)+1)"
    );
}

#[test]
fn implied_do_index_stays_unfolded() {
    let context = FoldingContext::new();
    let i = ExtentExpr::implied_do_index("i");
    assert_eq!(context.fold(i.clone()), i);
    assert!(i.contains_implied_do_index());
    assert!(!(i.clone() + int(1)).is_constant_expr());
}

#[test]
fn size_of_constant_shaped_arrays() {
    let a = array("a", &[(1, 10), (1, 5)]);
    let context = FoldingContext::new();

    let whole = crate::intrinsics::StandardIntrinsics
        .call("size", &[Some(ActualArgument::new(var(&a)))])
        .unwrap();
    assert_eq!(
        context.fold(ExtentExpr::FunctionRef(alloc::boxed::Box::new(whole))),
        int(50)
    );

    let rows = crate::intrinsics::StandardIntrinsics
        .call(
            "size",
            &[
                Some(ActualArgument::new(var(&a))),
                Some(ActualArgument::new(Expr::integer(1))),
            ],
        )
        .unwrap();
    let rows = ExtentExpr::FunctionRef(alloc::boxed::Box::new(rows));
    assert_eq!(context.fold(rows.clone()), int(10));
    assert_eq!(rows.to_string(), "size(a,1)");

    // Only literal results are folded.
    let n = dummy_scalar("n");
    let x = dummy("x", vec![crate::symbol::ShapeSpec::explicit(1, n)]);
    let open = crate::intrinsics::StandardIntrinsics
        .call("size", &[Some(ActualArgument::new(var(&x)))])
        .unwrap();
    let open = ExtentExpr::FunctionRef(alloc::boxed::Box::new(open));
    assert_eq!(context.fold(open.clone()), open);
}

#[test]
fn conversions_to_extent_form() {
    let n = dummy_scalar("n");
    let sum = Expr::from(Operation::binary(Operator::Add, var(&n), Expr::integer(1)));
    assert_eq!(sum.to_extent_expr(), Some(sym(&n) + int(1)));

    let converted = Expr::from(Operation::unary(
        Operator::Convert(TypeCategory::Integer, 8),
        Expr::integer(3),
    ));
    assert_eq!(converted.to_extent_expr(), Some(int(3)));

    let power = Expr::from(Operation::binary(Operator::Power, var(&n), Expr::integer(2)));
    assert_eq!(power.to_extent_expr(), None);
}

#[test]
fn options_from_json() {
    let options: FoldingOptions = serde_json::from_str(r#"{"substituteParameters": false}"#).unwrap();
    assert!(!options.substitute_parameters);
    assert!(options.fold_intrinsics);

    let options: FoldingOptions = serde_json::from_str("{}").unwrap();
    assert_eq!(options, FoldingOptions::default());

    let options: ShapeOptions = serde_json::from_str(r#"{"useResultSymbolShape": true}"#).unwrap();
    assert!(options.use_result_symbol_shape);
    assert_eq!(
        serde_json::to_string(&ShapeOptions::default()).unwrap(),
        r#"{"useResultSymbolShape":false}"#
    );
}
