// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builders for symbols and expressions used across the unit tests.

#![allow(clippy::unwrap_used, clippy::panic)]

use crate::ast::{DynamicType, TypeCategory};
use crate::intrinsics::StandardIntrinsics;
use crate::symbol::{ArraySpec, AssocEntityDetails, ObjectEntityDetails, ShapeSpec};
use crate::*;

use alloc::boxed::Box;
use alloc::vec::Vec;

pub fn int(value: i64) -> ExtentExpr {
    ExtentExpr::Constant(value)
}

pub fn lit(value: i64) -> MaybeExtentExpr {
    Some(ExtentExpr::Constant(value))
}

pub fn literal_shape(extents: &[i64]) -> Shape {
    extents.iter().map(|e| lit(*e)).collect()
}

pub fn sym(symbol: &SymbolRef) -> ExtentExpr {
    ExtentExpr::Symbol(symbol.clone())
}

pub fn var(symbol: &SymbolRef) -> Expr {
    Expr::symbol(symbol)
}

pub fn entity(symbol: &SymbolRef) -> NamedEntity {
    NamedEntity::Symbol(symbol.clone())
}

/// `real :: name(lb:ub, ...)`
pub fn array(name: &str, bounds: &[(i64, i64)]) -> SymbolRef {
    Symbol::object(
        name,
        Attrs::empty(),
        ObjectEntityDetails::new(ArraySpec::explicit(bounds)).with_type(DynamicType::real(4)),
    )
}

pub fn object(name: &str, attrs: Attrs, dims: Vec<ShapeSpec>) -> SymbolRef {
    Symbol::object(
        name,
        attrs,
        ObjectEntityDetails::new(ArraySpec::new(dims).unwrap()).with_type(DynamicType::real(4)),
    )
}

pub fn dummy(name: &str, dims: Vec<ShapeSpec>) -> SymbolRef {
    Symbol::object(
        name,
        Attrs::empty(),
        ObjectEntityDetails::new(ArraySpec::new(dims).unwrap())
            .with_type(DynamicType::real(4))
            .dummy(),
    )
}

/// `integer, intent(in) :: name`
pub fn dummy_scalar(name: &str) -> SymbolRef {
    Symbol::object(
        name,
        Attrs::empty(),
        ObjectEntityDetails::new(ArraySpec::scalar())
            .with_type(DynamicType::integer(4))
            .dummy(),
    )
}

/// `integer, parameter :: name = value`
pub fn parameter(name: &str, value: i64) -> SymbolRef {
    Symbol::object(
        name,
        Attrs::empty().with(Attr::Parameter),
        ObjectEntityDetails::new(ArraySpec::scalar())
            .with_type(DynamicType::integer(4))
            .with_init(Expr::integer(value)),
    )
}

pub fn derived_scalar(name: &str) -> SymbolRef {
    Symbol::object(
        name,
        Attrs::empty(),
        ObjectEntityDetails::new(ArraySpec::scalar())
            .with_type(DynamicType::new(TypeCategory::Derived, 0)),
    )
}

pub fn derived_array(name: &str, bounds: &[(i64, i64)]) -> SymbolRef {
    Symbol::object(
        name,
        Attrs::empty(),
        ObjectEntityDetails::new(ArraySpec::explicit(bounds))
            .with_type(DynamicType::new(TypeCategory::Derived, 0)),
    )
}

pub fn associate(name: &str, selector: Expr) -> SymbolRef {
    Symbol::new(
        name,
        Attrs::empty(),
        Details::AssocEntity(AssocEntityDetails::new(selector)),
    )
}

pub fn triplet(lower: i64, upper: i64, stride: i64) -> Subscript {
    Subscript::Triplet(Triplet::new(Some(int(lower)), Some(int(upper)), int(stride)))
}

pub fn section(base: &SymbolRef, subscripts: Vec<Subscript>) -> Expr {
    Expr::from(DataRef::ArrayRef(ArrayRef::new(entity(base), subscripts)))
}

pub fn component(base: &SymbolRef, field: &SymbolRef) -> Component {
    Component::new(DataRef::Symbol(base.clone()), field.clone())
}

/// Resolved intrinsic call with positional arguments.
pub fn call(name: &str, arguments: Vec<Expr>) -> Expr {
    let arguments: Vec<_> = arguments
        .into_iter()
        .map(|e| Some(ActualArgument::new(e)))
        .collect();
    call_with(name, &arguments)
}

pub fn call_with(name: &str, arguments: &[Option<ActualArgument>]) -> Expr {
    match StandardIntrinsics.call(name, arguments) {
        Some(call) => Expr::FunctionRef(Box::new(call)),
        None => panic!("could not resolve call to {name}"),
    }
}
