// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Result shapes of non-elemental intrinsic calls.

use super::traversal::GetShapeHelper;
use super::{constant_shape, get_size, scalar_shape, MaybeShape, Shape};
use crate::ast::{ActualArgument, ArrayConstructorValue, Expr, SpecificIntrinsic};
use crate::characteristics::TypeAndShape;
use crate::expr::ExtentExpr;
use crate::fold::FoldingContext;
use crate::intrinsics::{self, ShapeRule};

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;

fn argument(arguments: &[Option<ActualArgument>], index: usize) -> Option<&Expr> {
    arguments.get(index)?.as_ref().map(ActualArgument::expr)
}

pub(super) fn intrinsic_shape(
    helper: &GetShapeHelper<'_>,
    intrinsic: &SpecificIntrinsic,
    arguments: &[Option<ActualArgument>],
) -> MaybeShape {
    let rule = intrinsics::lookup(intrinsic.name())
        .map(|spec| spec.shape_rule())
        .unwrap_or(ShapeRule::Unknown);
    let rules = IntrinsicShapeRules { helper, arguments };
    match rule {
        ShapeRule::RankVector => rules.rank_vector(),
        ShapeRule::Reduction { dim } => rules.reduction(dim),
        ShapeRule::Location { dim } => rules.location(dim),
        ShapeRule::SameAsArgument { index } => rules.shape_of(index),
        ShapeRule::Matmul => rules.matmul(),
        ShapeRule::Reshape => rules.reshape(),
        ShapeRule::Pack => rules.pack(),
        ShapeRule::Spread => rules.spread(),
        ShapeRule::Transfer => rules.transfer(),
        ShapeRule::Transpose => rules.transpose(),
        ShapeRule::Unknown if intrinsic.is_null_pointer() => arguments
            .iter()
            .flatten()
            .find_map(|argument| helper.actual_argument(argument)),
        ShapeRule::Unknown => {
            tracing::debug!(name = intrinsic.name(), "no shape rule for intrinsic");
            None
        }
    }
}

struct IntrinsicShapeRules<'h, 'a> {
    helper: &'h GetShapeHelper<'h>,
    arguments: &'a [Option<ActualArgument>],
}

impl IntrinsicShapeRules<'_, '_> {
    fn shape_of(&self, index: usize) -> MaybeShape {
        self.helper.expr(argument(self.arguments, index)?)
    }

    fn actual(&self, index: usize) -> Option<&ActualArgument> {
        self.arguments.get(index).and_then(Option::as_ref)
    }

    fn context(&self) -> Option<&FoldingContext> {
        self.helper.context()
    }

    /// DIM= value, folded when a context is available.
    fn dim(&self, index: usize) -> Option<i64> {
        let expr = argument(self.arguments, index)?;
        let value = match self.context() {
            Some(context) => context.fold_to_i64(expr),
            None => expr.to_i64(),
        };
        if value.is_none() {
            tracing::debug!(%expr, "DIM= argument is not a known integer");
        }
        value
    }

    /// SHAPE, LBOUND and UBOUND without DIM=: a vector of length rank(ARRAY).
    fn rank_vector(&self) -> MaybeShape {
        let array = argument(self.arguments, 0)?;
        Some(vec![Some(ExtentExpr::Constant(array.rank() as i64))])
    }

    fn reduction(&self, dim_index: usize) -> MaybeShape {
        if self.arguments.len() <= dim_index {
            return None;
        }
        let mut shape = self.shape_of(0)?;
        let dim = self.dim(dim_index)?;
        remove_dimension(&mut shape, dim)?;
        Some(shape)
    }

    fn location(&self, dim_index: usize) -> MaybeShape {
        let mut shape = self.shape_of(0)?;
        match argument(self.arguments, dim_index) {
            Some(_) => {
                let dim = self.dim(dim_index)?;
                remove_dimension(&mut shape, dim)?;
                Some(shape)
            }
            None => Some(vec![Some(ExtentExpr::Constant(shape.len() as i64))]),
        }
    }

    fn matmul(&self) -> MaybeShape {
        if self.arguments.len() != 2 {
            return None;
        }
        let mut a = self.shape_of(0)?;
        let mut b = self.shape_of(1)?;
        match (a.len(), b.len()) {
            (1, 2) => {
                b.remove(0);
                Some(b)
            }
            (2, 1) => {
                a.pop();
                Some(a)
            }
            (2, 2) => {
                a[1] = b.swap_remove(1);
                Some(a)
            }
            _ => None,
        }
    }

    fn reshape(&self) -> MaybeShape {
        as_shape_of_expr(self.context(), argument(self.arguments, 1)?)
    }

    /// With VECTOR= the result has its shape; otherwise it holds as many
    /// elements as MASK= selects.
    fn pack(&self) -> MaybeShape {
        if argument(self.arguments, 2).is_some() {
            return self.shape_of(2);
        }
        let context = self.context()?;
        let mask = argument(self.arguments, 1)?;
        let mask_shape = self.helper.expr(mask)?;
        let (name, probe_arguments) = if mask_shape.is_empty() {
            let array_size = get_size(self.shape_of(0)?)?;
            (
                "merge",
                vec![
                    Some(ActualArgument::new(Expr::Extent(array_size))),
                    Some(ActualArgument::new(Expr::integer(0))),
                    Some(ActualArgument::new(mask.clone())),
                ],
            )
        } else {
            ("count", vec![Some(ActualArgument::new(mask.clone()))])
        };
        match context.intrinsics().probe(name, &probe_arguments, context) {
            Some(call) => Some(vec![Some(ExtentExpr::FunctionRef(Box::new(
                call.into_procedure_ref(),
            )))]),
            None => {
                tracing::debug!(name, "could not resolve intrinsic for PACK result size");
                None
            }
        }
    }

    fn spread(&self) -> MaybeShape {
        if self.arguments.len() != 3 {
            return None;
        }
        let mut shape = self.shape_of(0)?;
        let ncopies = argument(self.arguments, 2)?;
        let dim = self.dim(1)?;
        if dim < 1 || dim as usize > shape.len() + 1 {
            return None;
        }
        shape.insert(dim as usize - 1, ncopies.to_extent_expr());
        Some(shape)
    }

    /// With SIZE= the result is a vector of that length; otherwise a scalar
    /// MOLD= gives a scalar, and an array MOLD= gives as many elements as it
    /// takes to hold SOURCE=.
    fn transfer(&self) -> MaybeShape {
        if self.arguments.len() == 3 {
            if let Some(size) = argument(self.arguments, 2) {
                return Some(vec![size.to_extent_expr()]);
            }
        }
        let context = self.context()?;
        let mold = TypeAndShape::characterize_argument(self.actual(1), context)?;
        if mold.rank() == 0 {
            return Some(scalar_shape());
        }
        let source = TypeAndShape::characterize_argument(self.actual(0), context)?;
        let source_bytes = source.measure_size_in_bytes(context)?;
        let element_bytes = mold.measure_element_size_in_bytes(context)?;
        let extent = (source_bytes + element_bytes.clone() - 1) / element_bytes;
        Some(vec![Some(context.fold(extent))])
    }

    fn transpose(&self) -> MaybeShape {
        let mut shape = self.shape_of(0)?;
        if shape.len() != 2 {
            return None;
        }
        shape.swap(0, 1);
        Some(shape)
    }
}

/// Drops 1-based dimension `dim`; `None` when out of range.
fn remove_dimension(shape: &mut Shape, dim: i64) -> Option<()> {
    let index = usize::try_from(dim).ok()?.checked_sub(1)?;
    if index >= shape.len() {
        return None;
    }
    shape.remove(index);
    Some(())
}

/// Interprets a rank-1 integer expression as a list of extents.
pub fn as_shape_of_expr(context: Option<&FoldingContext>, expr: &Expr) -> MaybeShape {
    let constant = match context {
        Some(context) => context.constant_value(expr),
        None => expr.as_constant().cloned(),
    };
    if let Some(constant) = constant {
        return (constant.rank() == 1).then(|| constant_shape(&constant));
    }
    let mut inner = expr;
    while let Expr::Parentheses(e) = inner {
        inner = e;
    }
    match inner {
        Expr::ArrayConstructor(constructor) => constructor
            .values()
            .iter()
            .map(|value| match value {
                ArrayConstructorValue::Expr(e) if e.rank() == 0 => {
                    let extent = e.to_extent_expr()?;
                    Some(Some(match context {
                        Some(context) => context.fold(extent),
                        None => extent,
                    }))
                }
                _ => None,
            })
            .collect::<Option<Vec<_>>>(),
        _ => None,
    }
}
