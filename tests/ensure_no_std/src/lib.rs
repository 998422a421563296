// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![no_std]

extern crate alloc;

use alloc::vec;

use arrayshape::ast::DynamicType;
use arrayshape::symbol::{ArraySpec, ObjectEntityDetails};
use arrayshape::*;

/// Folded extents of `a(2:, ::2)` for `real :: a(10, 0:7)`.
pub fn section_extents() -> Option<ConstantSubscripts> {
    let a = Symbol::object(
        "a",
        Attrs::empty(),
        ObjectEntityDetails::new(ArraySpec::explicit(&[(1, 10), (0, 7)]))
            .with_type(DynamicType::real(4)),
    );
    let section = Expr::from(DataRef::ArrayRef(ArrayRef::new(
        NamedEntity::Symbol(a),
        vec![
            Subscript::Triplet(Triplet::new(
                Some(ExtentExpr::Constant(2)),
                None,
                ExtentExpr::Constant(1),
            )),
            Subscript::Triplet(Triplet::new(None, None, ExtentExpr::Constant(2))),
        ],
    )));
    let context = FoldingContext::new();
    let shape = get_shape_folded(&context, &section)?;
    shape::as_constant_extents(&context, &shape)
}
