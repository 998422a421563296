// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Type and shape of a data object, and its storage size.

use crate::ast::{ActualArgument, DynamicType, Expr, TypeCategory};
use crate::expr::ExtentExpr;
use crate::fold::FoldingContext;
use crate::shape::{get_shape_folded, get_size, Shape};
use crate::symbol::SymbolRef;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAndShape {
    ty: DynamicType,
    shape: Shape,
}

impl TypeAndShape {
    pub fn new(ty: DynamicType, shape: Shape) -> Self {
        TypeAndShape { ty, shape }
    }

    pub fn characterize(expr: &Expr, context: &FoldingContext) -> Option<Self> {
        let ty = expr.dynamic_type()?;
        let shape = get_shape_folded(context, expr)?;
        Some(TypeAndShape { ty, shape })
    }

    pub fn characterize_symbol(symbol: &SymbolRef, context: &FoldingContext) -> Option<Self> {
        let ty = symbol.dynamic_type()?;
        let shape = get_shape_folded(context, symbol)?;
        Some(TypeAndShape { ty, shape })
    }

    pub fn characterize_argument(
        argument: Option<&ActualArgument>,
        context: &FoldingContext,
    ) -> Option<Self> {
        Self::characterize(argument?.expr(), context)
    }

    pub fn ty(&self) -> &DynamicType {
        &self.ty
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Bytes occupied by one element. Unknown for derived types and for
    /// characters of unknown length.
    pub fn measure_element_size_in_bytes(&self, context: &FoldingContext) -> Option<ExtentExpr> {
        let kind = i64::from(self.ty.kind);
        let bytes = match self.ty.category {
            TypeCategory::Integer | TypeCategory::Real | TypeCategory::Logical => {
                ExtentExpr::Constant(kind)
            }
            TypeCategory::Complex => ExtentExpr::Constant(2 * kind),
            TypeCategory::Character => match kind {
                1 => self.ty.length.clone()?,
                _ => self.ty.length.clone()? * kind,
            },
            TypeCategory::Derived => return None,
        };
        Some(context.fold(bytes))
    }

    pub fn measure_size_in_bytes(&self, context: &FoldingContext) -> Option<ExtentExpr> {
        let element = self.measure_element_size_in_bytes(context)?;
        let size = get_size(self.shape.clone())?;
        Some(context.fold(size * element))
    }
}
