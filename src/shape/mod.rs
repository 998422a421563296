// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Array shape and bound inference.
//!
//! A [`Shape`] has one entry per dimension; an entry is `None` when that
//! extent cannot be expressed. A [`MaybeShape`] of `None` means even the
//! rank is unknown. Extents are symbolic [`ExtentExpr`]s that may refer to
//! named constants, dummy arguments, and descriptor inquiries.

mod bounds;
mod conformance;
mod intrinsic_rules;
mod subscripts;
mod traversal;

pub use bounds::{
    compute_upper_bound, compute_upper_bound_folded, get_extent, get_extent_folded, get_lbound,
    get_lbound_folded, get_lbounds, get_lbounds_folded, get_raw_lower_bound,
    get_raw_lower_bound_folded, get_raw_lower_bounds, get_raw_lower_bounds_folded,
    get_raw_upper_bound, get_raw_upper_bound_folded, get_subscript_extent,
    get_subscript_extent_folded, get_ubound, get_ubound_folded, get_ubounds, get_ubounds_folded,
};
pub use conformance::{check_conformance, CheckConformanceFlags};
pub use intrinsic_rules::as_shape_of_expr;
pub use subscripts::{increment_subscripts, SubscriptIter};
pub use traversal::{
    get_shape, get_shape_folded, get_shape_with, GetShapeHelper, ShapeOf, ShapeOptions,
};

use crate::ast::Constant;
use crate::expr::{ConstantSubscripts, ExtentExpr, MaybeExtentExpr};
use crate::fold::FoldingContext;

use alloc::vec::Vec;

pub type Shape = Vec<MaybeExtentExpr>;
pub type MaybeShape = Option<Shape>;

pub fn scalar_shape() -> Shape {
    Shape::new()
}

pub fn get_rank(shape: &[MaybeExtentExpr]) -> usize {
    shape.len()
}

/// Number of iterations of `lower:upper:stride`, never negative.
pub fn count_trips(lower: ExtentExpr, upper: ExtentExpr, stride: ExtentExpr) -> ExtentExpr {
    let trips = (upper - lower + stride.clone()) / stride;
    ExtentExpr::max(trips, ExtentExpr::Constant(0))
}

pub fn count_trips_maybe(
    lower: MaybeExtentExpr,
    upper: MaybeExtentExpr,
    stride: MaybeExtentExpr,
) -> MaybeExtentExpr {
    Some(count_trips(lower?, upper?, stride?))
}

/// Total element count: the product of all extents, `1` for a scalar.
pub fn get_size(shape: Shape) -> MaybeExtentExpr {
    let mut size: MaybeExtentExpr = None;
    for extent in shape {
        let extent = extent?;
        size = Some(match size {
            Some(size) => size * extent,
            None => extent,
        });
    }
    Some(size.unwrap_or(ExtentExpr::Constant(1)))
}

/// Element count of literal extents; `None` if it overflows.
pub fn get_constant_size(extents: &[i64]) -> Option<i64> {
    extents.iter().try_fold(1i64, |size, extent| {
        assert!(*extent >= 0, "negative extent {extent}");
        size.checked_mul(*extent)
    })
}

/// Shape of a rank-1 integer constant holding extents.
pub fn constant_shape(shape: &Constant) -> Shape {
    assert_eq!(shape.rank(), 1, "a constant shape must be a vector");
    shape
        .values()
        .iter()
        .map(|v| v.as_i64().map(ExtentExpr::Constant))
        .collect()
}

pub fn as_shape(extents: &[i64]) -> Shape {
    extents
        .iter()
        .map(|extent| Some(ExtentExpr::Constant(*extent)))
        .collect()
}

pub fn as_shape_opt(extents: Option<ConstantSubscripts>) -> MaybeShape {
    extents.map(|extents| as_shape(&extents))
}

/// Every extent as an expression, or `None` if any is unknown.
pub fn as_extent_array(shape: &[MaybeExtentExpr]) -> Option<Vec<ExtentExpr>> {
    shape.iter().cloned().collect()
}

pub fn as_constant_extents(
    context: &FoldingContext,
    shape: &[MaybeExtentExpr],
) -> Option<ConstantSubscripts> {
    shape
        .iter()
        .map(|extent| context.fold(extent.clone()?).to_i64())
        .collect()
}

pub fn as_constant_extents_opt(
    context: &FoldingContext,
    shape: &MaybeShape,
) -> Option<ConstantSubscripts> {
    as_constant_extents(context, shape.as_ref()?)
}

/// The shape as a rank-1 integer constant, if every extent folds.
pub fn as_constant_shape(context: &FoldingContext, shape: &[MaybeExtentExpr]) -> Option<Constant> {
    as_constant_extents(context, shape).map(|extents| Constant::integer_vector(&extents))
}

pub fn as_constant_shape_of(extents: &[i64]) -> Constant {
    Constant::integer_vector(extents)
}

/// Literal extents of a rank-1 integer constant.
pub fn as_constant_extents_of(shape: &Constant) -> Option<ConstantSubscripts> {
    if shape.rank() != 1 {
        return None;
    }
    shape.values().iter().map(|v| v.as_i64()).collect()
}
