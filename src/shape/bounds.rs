// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Lower bounds, upper bounds, and extents of named entities.
//!
//! Each query comes in two flavours: a plain one that only performs
//! literal simplifications, and a `_folded` one that takes a
//! [`FoldingContext`], may use it to prove a dimension empty, and folds the
//! result.

use super::count_trips_maybe;
use super::traversal::get_shape;
use super::Shape;
use crate::ast::{Component, Expr, NamedEntity, Subscript};
use crate::expr::{ExtentExpr, InquiryField, MaybeExtentExpr};
use crate::fold::FoldingContext;
use crate::symbol::{Bound, Details, ShapeSpec, Symbol, SymbolRef};

use alloc::vec::Vec;

#[derive(Clone, Copy, PartialEq, Eq)]
enum BoundSemantics {
    /// Declared lower bound, defaulting to 1.
    Raw,
    /// Value the LBOUND intrinsic would return; unknown unless provable.
    Lbound,
}

struct LowerBoundHelper<'a> {
    dimension: usize,
    context: Option<&'a FoldingContext>,
    semantics: BoundSemantics,
}

impl LowerBoundHelper<'_> {
    fn fallback(&self) -> MaybeExtentExpr {
        match self.semantics {
            BoundSemantics::Raw => Some(ExtentExpr::Constant(1)),
            BoundSemantics::Lbound => None,
        }
    }

    fn entity(&self, base: &NamedEntity) -> MaybeExtentExpr {
        match base {
            NamedEntity::Symbol(symbol) => self.symbol(symbol),
            NamedEntity::Component(component) => self.component(component),
        }
    }

    fn component(&self, component: &Component) -> MaybeExtentExpr {
        if component.base().rank() == 0 {
            self.symbol(component.last_symbol())
        } else {
            Some(ExtentExpr::Constant(1))
        }
    }

    /// Only whole objects and components can have a lower bound other than 1.
    fn expr(&self, expr: &Expr) -> MaybeExtentExpr {
        use crate::ast::{DataRef, Designator};
        match expr {
            Expr::Designator(Designator::DataRef(DataRef::Symbol(symbol))) => self.symbol(symbol),
            Expr::Designator(Designator::DataRef(DataRef::Component(component))) => {
                self.component(component)
            }
            _ => Some(ExtentExpr::Constant(1)),
        }
    }

    fn symbol(&self, symbol0: &SymbolRef) -> MaybeExtentExpr {
        let symbol = symbol0.ultimate();
        match symbol.details() {
            Details::Object(details) => {
                let rank = details.shape().rank();
                if self.dimension < rank {
                    let spec = &details.shape()[self.dimension];
                    if let Bound::Explicit(lbound) = spec.lbound() {
                        return match self.semantics {
                            BoundSemantics::Raw => Some(lbound.clone()),
                            BoundSemantics::Lbound => {
                                let last = self.dimension + 1 == rank && details.is_assumed_size();
                                self.lbound_of_explicit(spec, lbound, last)
                            }
                        };
                    }
                    if symbol.is_descriptor() {
                        return Some(self.inquiry(symbol0));
                    }
                }
            }
            Details::AssocEntity(assoc) => match assoc.rank() {
                Some(rank) => {
                    if symbol.resolve_associations().is_descriptor() && self.dimension < rank {
                        return Some(self.inquiry(symbol0));
                    }
                }
                None => return self.expr(assoc.expr()),
            },
            _ => {}
        }
        self.fallback()
    }

    fn inquiry(&self, symbol0: &SymbolRef) -> ExtentExpr {
        ExtentExpr::inquiry(
            NamedEntity::Symbol(symbol0.clone()),
            InquiryField::LowerBound,
            self.dimension,
        )
    }

    /// LBOUND of a dimension with an explicit lower bound: the declared
    /// bound when the dimension is provably non-empty, 1 when it is provably
    /// empty, unknown otherwise.
    fn lbound_of_explicit(
        &self,
        spec: &ShapeSpec,
        lbound: &ExtentExpr,
        last_assumed_size: bool,
    ) -> MaybeExtentExpr {
        let lb_value = lbound.to_i64();
        let ok = if last_assumed_size {
            lbound.is_scope_invariant()
        } else if lb_value == Some(1) {
            true
        } else if let Bound::Explicit(ubound) = spec.ubound() {
            match self.context {
                Some(context) => {
                    let extent = ubound.clone() - lbound.clone() + ExtentExpr::Constant(1);
                    match context.fold(extent).to_i64() {
                        Some(extent) if extent <= 0 => return Some(ExtentExpr::Constant(1)),
                        Some(_) => true,
                        None => false,
                    }
                }
                None => match (lb_value, ubound.to_i64()) {
                    (Some(lb), Some(ub)) if lb > ub => return Some(ExtentExpr::Constant(1)),
                    (Some(_), Some(_)) => true,
                    _ => false,
                },
            }
        } else {
            false
        };
        ok.then(|| lbound.clone())
    }
}

fn lower_bound(
    context: Option<&FoldingContext>,
    semantics: BoundSemantics,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    LowerBoundHelper {
        dimension,
        context,
        semantics,
    }
    .entity(base)
}

/// Declared lower bound of a dimension, or a descriptor inquiry.
pub fn get_raw_lower_bound(base: &NamedEntity, dimension: usize) -> ExtentExpr {
    lower_bound(None, BoundSemantics::Raw, base, dimension).unwrap_or(ExtentExpr::Constant(1))
}

pub fn get_raw_lower_bound_folded(
    context: &FoldingContext,
    base: &NamedEntity,
    dimension: usize,
) -> ExtentExpr {
    let bound = lower_bound(Some(context), BoundSemantics::Raw, base, dimension)
        .unwrap_or(ExtentExpr::Constant(1));
    context.fold(bound)
}

/// Lower bound as the LBOUND intrinsic would report it.
pub fn get_lbound(base: &NamedEntity, dimension: usize) -> MaybeExtentExpr {
    lower_bound(None, BoundSemantics::Lbound, base, dimension)
}

pub fn get_lbound_folded(
    context: &FoldingContext,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    context.fold_maybe(lower_bound(
        Some(context),
        BoundSemantics::Lbound,
        base,
        dimension,
    ))
}

pub fn get_raw_lower_bounds(base: &NamedEntity) -> Shape {
    (0..base.rank())
        .map(|dim| Some(get_raw_lower_bound(base, dim)))
        .collect()
}

pub fn get_raw_lower_bounds_folded(context: &FoldingContext, base: &NamedEntity) -> Shape {
    (0..base.rank())
        .map(|dim| Some(get_raw_lower_bound_folded(context, base, dim)))
        .collect()
}

pub fn get_lbounds(base: &NamedEntity) -> Shape {
    (0..base.rank()).map(|dim| get_lbound(base, dim)).collect()
}

pub fn get_lbounds_folded(context: &FoldingContext, base: &NamedEntity) -> Shape {
    (0..base.rank())
        .map(|dim| get_lbound_folded(context, base, dim))
        .collect()
}

/// Extent of a dimension whose bounds are both literal or both
/// scope-invariant; never negative.
fn get_non_negative_extent(spec: &ShapeSpec) -> MaybeExtentExpr {
    let lbound = spec.lbound().explicit();
    let ubound = spec.ubound().explicit();
    let lval = lbound.and_then(ExtentExpr::to_i64);
    let uval = ubound.and_then(ExtentExpr::to_i64);
    match (lbound, ubound, lval, uval) {
        (_, _, Some(l), Some(u)) => Some(ExtentExpr::Constant(if u < l {
            0
        } else {
            u.checked_sub(l)?.checked_add(1)?
        })),
        (Some(lbound), Some(ubound), lval, _)
            if lbound.is_scope_invariant() && ubound.is_scope_invariant() =>
        {
            let extent = match lval {
                Some(1) => ubound.clone(),
                _ => ubound.clone() - lbound.clone() + ExtentExpr::Constant(1),
            };
            Some(ExtentExpr::max(ExtentExpr::Constant(0), extent))
        }
        _ => None,
    }
}

pub fn get_extent(base: &NamedEntity, dimension: usize) -> MaybeExtentExpr {
    let last = base.last_symbol();
    let symbol = last.resolve_associations();
    if let Details::AssocEntity(assoc) = last.details() {
        match assoc.rank() {
            Some(rank) => {
                if symbol.is_descriptor() && dimension < rank {
                    return Some(ExtentExpr::inquiry(
                        base.clone(),
                        InquiryField::Extent,
                        dimension,
                    ));
                }
            }
            None => {
                if let Some(mut shape) = get_shape(assoc.expr()) {
                    if dimension < shape.len() {
                        return shape.swap_remove(dimension);
                    }
                }
            }
        }
    }
    if let Details::Object(details) = symbol.details() {
        if symbol.is_implied_shape() && details.init().is_some() {
            if let Some(mut shape) = get_shape(details.init()?) {
                if dimension < shape.len() {
                    return shape.swap_remove(dimension);
                }
            }
        } else if dimension < details.shape().rank() {
            let spec = &details.shape()[dimension];
            if let Some(extent) = get_non_negative_extent(spec) {
                return Some(extent);
            } else if details.is_assumed_size() && dimension + 1 == symbol.rank() {
                return None;
            } else if symbol.is_descriptor() {
                return Some(ExtentExpr::inquiry(
                    base.clone(),
                    InquiryField::Extent,
                    dimension,
                ));
            }
        }
    }
    None
}

pub fn get_extent_folded(
    context: &FoldingContext,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    context.fold_maybe(get_extent(base, dimension))
}

/// Number of elements a subscript selects along `dimension` of `base`.
pub fn get_subscript_extent(
    subscript: &Subscript,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    match subscript {
        Subscript::Triplet(triplet) => {
            let upper = triplet
                .upper()
                .cloned()
                .or_else(|| get_ubound(base, dimension));
            let lower = triplet
                .lower()
                .cloned()
                .or_else(|| get_lbound(base, dimension));
            count_trips_maybe(lower, upper, Some(triplet.stride().clone()))
        }
        Subscript::Indirect(expr) => {
            let mut shape = get_shape(expr.as_ref())?;
            match shape.len() {
                0 => None,
                rank => {
                    assert_eq!(rank, 1, "vector-valued subscript must have rank 1");
                    shape.pop()?
                }
            }
        }
    }
}

pub fn get_subscript_extent_folded(
    context: &FoldingContext,
    subscript: &Subscript,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    context.fold_maybe(get_subscript_extent(subscript, base, dimension))
}

/// `extent + lower - 1`, or just `extent` when `lower` is literally 1.
pub fn compute_upper_bound(lower: ExtentExpr, extent: MaybeExtentExpr) -> MaybeExtentExpr {
    let extent = extent?;
    match lower.to_i64() {
        Some(1) => Some(extent),
        _ => Some(extent + lower - ExtentExpr::Constant(1)),
    }
}

pub fn compute_upper_bound_folded(
    context: &FoldingContext,
    lower: ExtentExpr,
    extent: MaybeExtentExpr,
) -> MaybeExtentExpr {
    context.fold_maybe(compute_upper_bound(lower, extent))
}

pub fn get_raw_upper_bound(base: &NamedEntity, dimension: usize) -> MaybeExtentExpr {
    let symbol = base.last_symbol().resolve_associations();
    match symbol.details() {
        Details::Object(details) if dimension < details.shape().rank() => {
            match details.shape()[dimension].ubound().explicit() {
                Some(bound) if bound.is_scope_invariant() => Some(bound.clone()),
                _ if details.is_assumed_size() && dimension + 1 == symbol.rank() => None,
                _ => compute_upper_bound(
                    get_raw_lower_bound(base, dimension),
                    get_extent(base, dimension),
                ),
            }
        }
        Details::AssocEntity(assoc) => {
            let mut shape = get_shape(assoc.expr())?;
            if dimension < shape.len() {
                compute_upper_bound(
                    get_raw_lower_bound(base, dimension),
                    shape.swap_remove(dimension),
                )
            } else {
                None
            }
        }
        _ => None,
    }
}

pub fn get_raw_upper_bound_folded(
    context: &FoldingContext,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    context.fold_maybe(get_raw_upper_bound(base, dimension))
}

/// The declared upper bound when the dimension is provably non-empty,
/// 0 when it is provably empty.
fn get_explicit_ubound(context: Option<&FoldingContext>, spec: &ShapeSpec) -> MaybeExtentExpr {
    let ubound = spec.ubound().explicit()?;
    if !ubound.is_scope_invariant() {
        return None;
    }
    let extent = get_non_negative_extent(spec)?;
    let extent = match context {
        Some(context) => context.fold(extent),
        None => extent,
    };
    match extent.to_i64()? {
        extent if extent > 0 => Some(ubound.clone()),
        0 => Some(ExtentExpr::Constant(0)),
        _ => None,
    }
}

fn ubound_impl(
    context: Option<&FoldingContext>,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    let symbol = base.last_symbol().resolve_associations();
    match symbol.details() {
        Details::Object(details) if dimension < details.shape().rank() => {
            let spec = &details.shape()[dimension];
            if let Some(ubound) = get_explicit_ubound(context, spec) {
                Some(ubound)
            } else if details.is_assumed_size() && dimension + 1 == symbol.rank() {
                None
            } else {
                let lower = lower_bound(context, BoundSemantics::Lbound, base, dimension)?;
                compute_upper_bound(lower, get_extent(base, dimension))
            }
        }
        Details::AssocEntity(assoc) => {
            let mut shape = get_shape(assoc.expr())?;
            if dimension < shape.len() {
                let lower = lower_bound(context, BoundSemantics::Lbound, base, dimension)?;
                compute_upper_bound(lower, shape.swap_remove(dimension))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Upper bound as the UBOUND intrinsic would report it.
pub fn get_ubound(base: &NamedEntity, dimension: usize) -> MaybeExtentExpr {
    ubound_impl(None, base, dimension)
}

pub fn get_ubound_folded(
    context: &FoldingContext,
    base: &NamedEntity,
    dimension: usize,
) -> MaybeExtentExpr {
    context.fold_maybe(ubound_impl(Some(context), base, dimension))
}

fn ubounds_impl(context: Option<&FoldingContext>, base: &NamedEntity) -> Shape {
    let symbol: &Symbol = base.last_symbol().resolve_associations();
    match symbol.details() {
        Details::Object(details) => {
            let result: Shape = details
                .shape()
                .dims()
                .iter()
                .enumerate()
                .map(|(dim, spec)| {
                    if let Some(ubound) = get_explicit_ubound(context, spec) {
                        Some(ubound)
                    } else if details.is_assumed_size() && dim + 1 == base.rank() {
                        None
                    } else {
                        let lower = lower_bound(context, BoundSemantics::Lbound, base, dim)?;
                        compute_upper_bound(lower, get_extent(base, dim))
                    }
                })
                .collect();
            debug_assert_eq!(result.len(), symbol.rank());
            result
        }
        _ => (0..base.rank())
            .map(|dim| ubound_impl(context, base, dim))
            .collect::<Vec<_>>(),
    }
}

pub fn get_ubounds(base: &NamedEntity) -> Shape {
    ubounds_impl(None, base)
}

pub fn get_ubounds_folded(context: &FoldingContext, base: &NamedEntity) -> Shape {
    context.fold_shape(ubounds_impl(Some(context), base))
}
