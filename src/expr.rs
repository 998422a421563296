// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Symbolic scalar integer expressions used for extents and bounds.

use crate::ast::{call_symbols, NamedEntity, ProcedureRef};
use crate::symbol::Symbol;
use crate::*;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::ops;

pub type ConstantSubscript = i64;
pub type ConstantSubscripts = Vec<ConstantSubscript>;
pub type MaybeExtentExpr = Option<ExtentExpr>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOp {
    /// Checked evaluation; `None` on overflow or division by zero.
    pub fn apply(self, x: i64, y: i64) -> Option<i64> {
        match self {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Subtract => x.checked_sub(y),
            BinaryOp::Multiply => x.checked_mul(y),
            BinaryOp::Divide => x.checked_div(y),
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumKind {
    Max,
    Min,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InquiryField {
    LowerBound,
    Extent,
}

/// Run-time read of an array descriptor field.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorInquiry {
    base: NamedEntity,
    field: InquiryField,
    dimension: usize,
}

impl DescriptorInquiry {
    pub fn new(base: NamedEntity, field: InquiryField, dimension: usize) -> Self {
        DescriptorInquiry {
            base,
            field,
            dimension,
        }
    }

    pub fn base(&self) -> &NamedEntity {
        &self.base
    }

    pub fn field(&self) -> InquiryField {
        self.field
    }

    /// Zero-based dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

impl fmt::Display for DescriptorInquiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.field {
            InquiryField::LowerBound => "lbound",
            InquiryField::Extent => "size",
        };
        write!(f, "{name}({},dim={})", self.base, self.dimension + 1)
    }
}

/// Scalar integer expression of extent kind (64-bit).
#[derive(Debug, Clone, PartialEq)]
pub enum ExtentExpr {
    Constant(i64),
    Symbol(SymbolRef),
    ImpliedDoIndex(Rc<str>),
    Negate(Box<ExtentExpr>),
    Binary {
        op: BinaryOp,
        left: Box<ExtentExpr>,
        right: Box<ExtentExpr>,
    },
    Extremum {
        kind: ExtremumKind,
        left: Box<ExtentExpr>,
        right: Box<ExtentExpr>,
    },
    DescriptorInquiry(DescriptorInquiry),
    FunctionRef(Box<ProcedureRef>),
}

impl ExtentExpr {
    pub fn binary(op: BinaryOp, left: ExtentExpr, right: ExtentExpr) -> Self {
        ExtentExpr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn extremum(kind: ExtremumKind, left: ExtentExpr, right: ExtentExpr) -> Self {
        ExtentExpr::Extremum {
            kind,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn max(left: ExtentExpr, right: ExtentExpr) -> Self {
        Self::extremum(ExtremumKind::Max, left, right)
    }

    pub fn min(left: ExtentExpr, right: ExtentExpr) -> Self {
        Self::extremum(ExtremumKind::Min, left, right)
    }

    pub fn inquiry(base: NamedEntity, field: InquiryField, dimension: usize) -> Self {
        ExtentExpr::DescriptorInquiry(DescriptorInquiry::new(base, field, dimension))
    }

    pub fn implied_do_index(name: &str) -> Self {
        ExtentExpr::ImpliedDoIndex(name.into())
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            ExtentExpr::Constant(v) => Some(*v),
            _ => None,
        }
    }

    /// True when every symbol the expression references satisfies `pred`.
    pub fn all_symbols(&self, pred: &mut dyn FnMut(&Symbol) -> bool) -> bool {
        match self {
            ExtentExpr::Constant(_) | ExtentExpr::ImpliedDoIndex(_) => true,
            ExtentExpr::Symbol(s) => pred(&**s),
            ExtentExpr::Negate(x) => x.all_symbols(pred),
            ExtentExpr::Binary { left, right, .. } | ExtentExpr::Extremum { left, right, .. } => {
                left.all_symbols(pred) && right.all_symbols(pred)
            }
            ExtentExpr::DescriptorInquiry(inquiry) => pred(&**inquiry.base().last_symbol()),
            ExtentExpr::FunctionRef(call) => call_symbols(call, pred),
        }
    }

    /// Whether the expression is a constant expression: literals, named
    /// constants, and intrinsic calls over them.
    pub fn is_constant_expr(&self) -> bool {
        match self {
            ExtentExpr::Constant(_) => true,
            ExtentExpr::Symbol(s) => s.ultimate().attrs().test(Attr::Parameter),
            ExtentExpr::ImpliedDoIndex(_) | ExtentExpr::DescriptorInquiry(_) => false,
            ExtentExpr::Negate(x) => x.is_constant_expr(),
            ExtentExpr::Binary { left, right, .. } | ExtentExpr::Extremum { left, right, .. } => {
                left.is_constant_expr() && right.is_constant_expr()
            }
            ExtentExpr::FunctionRef(call) => Expr::FunctionRef(call.clone()).is_constant_expr(),
        }
    }

    /// Whether the value cannot change during execution of the scope.
    pub fn is_scope_invariant(&self) -> bool {
        self.all_symbols(&mut |s: &Symbol| s.is_scope_invariant())
    }

    pub fn contains_implied_do_index(&self) -> bool {
        match self {
            ExtentExpr::ImpliedDoIndex(_) => true,
            ExtentExpr::Constant(_) | ExtentExpr::Symbol(_) | ExtentExpr::DescriptorInquiry(_) => {
                false
            }
            ExtentExpr::Negate(x) => x.contains_implied_do_index(),
            ExtentExpr::Binary { left, right, .. } | ExtentExpr::Extremum { left, right, .. } => {
                left.contains_implied_do_index() || right.contains_implied_do_index()
            }
            ExtentExpr::FunctionRef(call) => call
                .arguments()
                .iter()
                .flatten()
                .any(|a| a.expr().contains_implied_do_index()),
        }
    }
}

pub fn to_i64(expr: &MaybeExtentExpr) -> Option<i64> {
    expr.as_ref().and_then(ExtentExpr::to_i64)
}

impl From<i64> for ExtentExpr {
    fn from(value: i64) -> Self {
        ExtentExpr::Constant(value)
    }
}

impl From<SymbolRef> for ExtentExpr {
    fn from(symbol: SymbolRef) -> Self {
        ExtentExpr::Symbol(symbol)
    }
}

impl ops::Neg for ExtentExpr {
    type Output = ExtentExpr;

    fn neg(self) -> ExtentExpr {
        ExtentExpr::Negate(Box::new(self))
    }
}

macro_rules! binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl ops::$trait for ExtentExpr {
            type Output = ExtentExpr;

            fn $method(self, rhs: ExtentExpr) -> ExtentExpr {
                ExtentExpr::binary($op, self, rhs)
            }
        }

        impl ops::$trait<i64> for ExtentExpr {
            type Output = ExtentExpr;

            fn $method(self, rhs: i64) -> ExtentExpr {
                ExtentExpr::binary($op, self, ExtentExpr::Constant(rhs))
            }
        }
    };
}

binary_operator!(Add, add, BinaryOp::Add);
binary_operator!(Sub, sub, BinaryOp::Subtract);
binary_operator!(Mul, mul, BinaryOp::Multiply);
binary_operator!(Div, div, BinaryOp::Divide);

impl fmt::Display for ExtentExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtentExpr::Constant(v) => write!(f, "{v}"),
            ExtentExpr::Symbol(s) => f.write_str(s.name()),
            ExtentExpr::ImpliedDoIndex(name) => f.write_str(name),
            ExtentExpr::Negate(x) => write!(f, "(-{x})"),
            ExtentExpr::Binary { op, left, right } => {
                write!(f, "({left}{}{right})", op.symbol())
            }
            ExtentExpr::Extremum { kind, left, right } => {
                let name = match kind {
                    ExtremumKind::Max => "max",
                    ExtremumKind::Min => "min",
                };
                write!(f, "{name}({left},{right})")
            }
            ExtentExpr::DescriptorInquiry(inquiry) => inquiry.fmt(f),
            ExtentExpr::FunctionRef(call) => call.fmt(f),
        }
    }
}
