// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(feature = "arc")]
pub use alloc::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub use alloc::rc::Rc;

pub mod ast;
pub mod characteristics;
pub mod error;
pub mod expr;
pub mod fold;
pub mod intrinsics;
pub mod messages;
pub mod shape;
pub mod symbol;

pub use ast::{
    ActualArgument, ArrayConstructor, ArrayConstructorValue, ArrayRef, CoarrayRef, Component,
    Constant, DataRef, Designator, Expr, ImpliedDo, NamedEntity, Operation, Operator,
    ProcedureDesignator, ProcedureRef, Ref, Scalar, SpecificIntrinsic, Subscript, Substring,
    Triplet,
};
pub use error::ModelError;
pub use expr::{ConstantSubscript, ConstantSubscripts, ExtentExpr, MaybeExtentExpr};
pub use fold::{FoldingContext, FoldingOptions};
pub use messages::{Message, Messages, Severity};
pub use shape::{
    check_conformance, get_shape, get_shape_folded, increment_subscripts, CheckConformanceFlags,
    MaybeShape, Shape, ShapeOptions,
};
pub use symbol::{Attr, Attrs, Details, Scope, Symbol, SymbolRef};

#[cfg(test)]
mod tests;
