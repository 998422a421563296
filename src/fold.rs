// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Constant folding of extent expressions.

use crate::ast::{Constant, Expr, ProcedureRef};
use crate::expr::{BinaryOp, ExtentExpr, ExtremumKind, MaybeExtentExpr};
use crate::intrinsics::{IntrinsicProber, StandardIntrinsics};
use crate::shape::{get_shape_folded, MaybeShape, Shape};
use crate::*;

use alloc::boxed::Box;
use core::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FoldingOptions {
    /// Replace scalar named constants by their values.
    pub substitute_parameters: bool,
    /// Evaluate SIZE, MERGE and COUNT over constant arguments.
    pub fold_intrinsics: bool,
}

impl Default for FoldingOptions {
    fn default() -> Self {
        FoldingOptions {
            substitute_parameters: true,
            fold_intrinsics: true,
        }
    }
}

/// Simplifies extent expressions and resolves intrinsic calls synthesized
/// during shape inference.
///
/// Folding never evaluates descriptor inquiries, implied-DO indices, or
/// symbols that are not named constants.
#[derive(Clone)]
pub struct FoldingContext {
    options: FoldingOptions,
    intrinsics: Rc<dyn IntrinsicProber>,
}

impl fmt::Debug for FoldingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FoldingContext")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for FoldingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FoldingContext {
    pub fn new() -> Self {
        Self::with_options(FoldingOptions::default())
    }

    pub fn with_options(options: FoldingOptions) -> Self {
        FoldingContext {
            options,
            intrinsics: Rc::new(StandardIntrinsics),
        }
    }

    pub fn with_prober(mut self, intrinsics: Rc<dyn IntrinsicProber>) -> Self {
        self.intrinsics = intrinsics;
        self
    }

    pub fn options(&self) -> &FoldingOptions {
        &self.options
    }

    pub fn intrinsics(&self) -> &dyn IntrinsicProber {
        self.intrinsics.as_ref()
    }

    pub fn fold(&self, expr: ExtentExpr) -> ExtentExpr {
        match expr {
            ExtentExpr::Constant(_)
            | ExtentExpr::ImpliedDoIndex(_)
            | ExtentExpr::DescriptorInquiry(_) => expr,
            ExtentExpr::Symbol(symbol) => self
                .parameter_value(&symbol)
                .map_or(ExtentExpr::Symbol(symbol), ExtentExpr::Constant),
            ExtentExpr::Negate(x) => {
                let x = self.fold(*x);
                match x.to_i64().and_then(i64::checked_neg) {
                    Some(v) => ExtentExpr::Constant(v),
                    None => -x,
                }
            }
            ExtentExpr::Binary { op, left, right } => {
                self.fold_binary(op, self.fold(*left), self.fold(*right))
            }
            ExtentExpr::Extremum { kind, left, right } => {
                let left = self.fold(*left);
                let right = self.fold(*right);
                match (left.to_i64(), right.to_i64()) {
                    (Some(x), Some(y)) => ExtentExpr::Constant(match kind {
                        ExtremumKind::Max => x.max(y),
                        ExtremumKind::Min => x.min(y),
                    }),
                    _ => ExtentExpr::extremum(kind, left, right),
                }
            }
            ExtentExpr::FunctionRef(call) => self.fold_function_ref(*call),
        }
    }

    pub fn fold_maybe(&self, expr: MaybeExtentExpr) -> MaybeExtentExpr {
        expr.map(|e| self.fold(e))
    }

    pub fn fold_shape(&self, shape: Shape) -> Shape {
        shape.into_iter().map(|e| self.fold_maybe(e)).collect()
    }

    pub fn fold_maybe_shape(&self, shape: MaybeShape) -> MaybeShape {
        shape.map(|s| self.fold_shape(s))
    }

    /// Folds a scalar integer expression to a literal.
    pub fn fold_to_i64(&self, expr: &Expr) -> Option<i64> {
        expr.to_extent_expr().and_then(|e| self.fold(e).to_i64())
    }

    /// The constant value of a literal or named constant.
    pub fn constant_value(&self, expr: &Expr) -> Option<Constant> {
        match expr {
            Expr::Constant(c) => Some(c.clone()),
            Expr::Extent(e) => self.fold(e.clone()).to_i64().map(Constant::integer),
            Expr::Parentheses(e) => self.constant_value(e),
            Expr::Designator(_) if self.options.substitute_parameters => {
                let symbol = expr.as_whole_symbol()?.ultimate();
                if !symbol.attrs().test(Attr::Parameter) {
                    return None;
                }
                let init = symbol.object_details()?.init()?;
                self.constant_value(init)
            }
            _ => None,
        }
    }

    fn parameter_value(&self, symbol: &SymbolRef) -> Option<i64> {
        if !self.options.substitute_parameters {
            return None;
        }
        let symbol = symbol.ultimate();
        if !symbol.attrs().test(Attr::Parameter) || symbol.rank() != 0 {
            return None;
        }
        self.fold_to_i64(symbol.object_details()?.init()?)
    }

    fn fold_binary(&self, op: BinaryOp, left: ExtentExpr, right: ExtentExpr) -> ExtentExpr {
        match (op, left.to_i64(), right.to_i64()) {
            (_, Some(x), Some(y)) => match op.apply(x, y) {
                Some(v) => ExtentExpr::Constant(v),
                None => ExtentExpr::binary(op, left, right),
            },
            (BinaryOp::Add, Some(0), _) | (BinaryOp::Multiply, Some(1), _) => right,
            (BinaryOp::Add | BinaryOp::Subtract, _, Some(0))
            | (BinaryOp::Multiply | BinaryOp::Divide, _, Some(1)) => left,
            (BinaryOp::Add | BinaryOp::Subtract, _, Some(c2)) => Self::reassociate(op, left, c2),
            _ => ExtentExpr::binary(op, left, right),
        }
    }

    /// `(x +/- c1) +/- c2` becomes `x +/- c` for literals `c1` and `c2`.
    fn reassociate(op: BinaryOp, left: ExtentExpr, c2: i64) -> ExtentExpr {
        if let ExtentExpr::Binary {
            op: inner @ (BinaryOp::Add | BinaryOp::Subtract),
            left: x,
            right: c1,
        } = &left
        {
            let signed = |op: BinaryOp, c: i64| match op {
                BinaryOp::Add => Some(c),
                _ => c.checked_neg(),
            };
            let offset = c1
                .to_i64()
                .and_then(|c1| signed(*inner, c1)?.checked_add(signed(op, c2)?));
            match offset {
                Some(0) => return (**x).clone(),
                Some(k) if k > 0 => return (**x).clone() + k,
                Some(k) => {
                    if let Some(k) = k.checked_neg() {
                        return (**x).clone() - k;
                    }
                }
                None => {}
            }
        }
        ExtentExpr::binary(op, left, ExtentExpr::Constant(c2))
    }

    fn fold_function_ref(&self, call: ProcedureRef) -> ExtentExpr {
        if self.options.fold_intrinsics {
            if let Some(intrinsic) = call.proc().specific_intrinsic() {
                let folded = match intrinsic.name() {
                    "size" => self.fold_size(&call),
                    "merge" => self.fold_merge(&call),
                    "count" => self.fold_count(&call),
                    _ => None,
                };
                if let Some(folded) = folded {
                    return folded;
                }
            }
        }
        ExtentExpr::FunctionRef(Box::new(call))
    }

    fn argument(call: &ProcedureRef, index: usize) -> Option<&Expr> {
        call.arguments()
            .get(index)
            .and_then(Option::as_ref)
            .map(|a| a.expr())
    }

    fn fold_size(&self, call: &ProcedureRef) -> Option<ExtentExpr> {
        let shape = get_shape_folded(self, Self::argument(call, 0)?)?;
        let size = match Self::argument(call, 1) {
            Some(dim) => {
                let dim = self.fold_to_i64(dim)?;
                let index = usize::try_from(dim).ok()?.checked_sub(1)?;
                shape.get(index)?.clone()
            }
            None => {
                let mut size: i64 = 1;
                for extent in shape.iter() {
                    size = size.checked_mul(extent.as_ref()?.to_i64()?)?;
                }
                Some(ExtentExpr::Constant(size))
            }
        };
        size.filter(|e| e.to_i64().is_some())
    }

    fn fold_merge(&self, call: &ProcedureRef) -> Option<ExtentExpr> {
        let mask = self.constant_value(Self::argument(call, 2)?)?.as_bool()?;
        let chosen = Self::argument(call, if mask { 0 } else { 1 })?;
        Some(self.fold(chosen.to_extent_expr()?))
    }

    fn fold_count(&self, call: &ProcedureRef) -> Option<ExtentExpr> {
        if Self::argument(call, 1).is_some() {
            return None;
        }
        let mask = self.constant_value(Self::argument(call, 0)?)?;
        let mut count: i64 = 0;
        for index in mask.subscripts() {
            if mask.at(&index)?.as_bool()? {
                count += 1;
            }
        }
        Some(ExtentExpr::Constant(count))
    }
}
