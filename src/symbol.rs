// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Symbols, declared array specifications, and scopes.

use crate::ast::{DynamicType, Expr, Ref};
use crate::error::ModelError;
use crate::expr::ExtentExpr;
use crate::*;

use alloc::collections::BTreeMap;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::ops;

pub type SymbolRef = Ref<Symbol>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Parameter,
    Pointer,
    Allocatable,
    Elemental,
    Optional,
}

impl Attr {
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Attrs(u8);

impl Attrs {
    pub const fn empty() -> Self {
        Attrs(0)
    }

    pub fn test(self, attr: Attr) -> bool {
        self.0 & attr.bit() != 0
    }

    pub fn set(&mut self, attr: Attr) {
        self.0 |= attr.bit();
    }

    pub fn with(mut self, attr: Attr) -> Self {
        self.set(attr);
        self
    }
}

impl From<&[Attr]> for Attrs {
    fn from(attrs: &[Attr]) -> Self {
        attrs.iter().fold(Attrs::empty(), |acc, a| acc.with(*a))
    }
}

/// One side of a declared dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Explicit(ExtentExpr),
    /// `*`
    Assumed,
    /// `:`
    Deferred,
}

impl Bound {
    pub fn explicit(&self) -> Option<&ExtentExpr> {
        match self {
            Bound::Explicit(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_assumed(&self) -> bool {
        matches!(self, Bound::Assumed)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Bound::Deferred)
    }
}

impl From<i64> for Bound {
    fn from(value: i64) -> Self {
        Bound::Explicit(ExtentExpr::Constant(value))
    }
}

impl From<ExtentExpr> for Bound {
    fn from(expr: ExtentExpr) -> Self {
        Bound::Explicit(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeSpec {
    lbound: Bound,
    ubound: Bound,
}

impl ShapeSpec {
    pub fn new(lbound: impl Into<Bound>, ubound: impl Into<Bound>) -> Self {
        ShapeSpec {
            lbound: lbound.into(),
            ubound: ubound.into(),
        }
    }

    /// `lb:ub`
    pub fn explicit(lbound: impl Into<ExtentExpr>, ubound: impl Into<ExtentExpr>) -> Self {
        Self::new(Bound::Explicit(lbound.into()), Bound::Explicit(ubound.into()))
    }

    /// `lb:`
    pub fn assumed_shape(lbound: impl Into<ExtentExpr>) -> Self {
        Self::new(Bound::Explicit(lbound.into()), Bound::Deferred)
    }

    /// `:`
    pub fn deferred() -> Self {
        Self::new(Bound::Deferred, Bound::Deferred)
    }

    /// `lb:*`
    pub fn assumed_size(lbound: impl Into<ExtentExpr>) -> Self {
        Self::new(Bound::Explicit(lbound.into()), Bound::Assumed)
    }

    pub fn lbound(&self) -> &Bound {
        &self.lbound
    }

    pub fn ubound(&self) -> &Bound {
        &self.ubound
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArraySpec {
    dims: Vec<ShapeSpec>,
    assumed_rank: bool,
}

impl ArraySpec {
    pub fn scalar() -> Self {
        ArraySpec::default()
    }

    pub fn assumed_rank() -> Self {
        ArraySpec {
            dims: Vec::new(),
            assumed_rank: true,
        }
    }

    /// Validates the dimension list: `*` only as the final upper bound
    /// (or in every dimension for an implied shape) and `:` lower bounds
    /// only with `:` upper bounds.
    pub fn new(dims: Vec<ShapeSpec>) -> Result<Self, ModelError> {
        let implied = !dims.is_empty() && dims.iter().all(|d| d.ubound.is_assumed());
        for (j, dim) in dims.iter().enumerate() {
            if dim.ubound.is_assumed() && !implied && j + 1 != dims.len() {
                return Err(ModelError::MisplacedAssumedSize { dimension: j + 1 });
            }
            if dim.lbound.is_assumed() || (dim.lbound.is_deferred() && !dim.ubound.is_deferred()) {
                return Err(ModelError::InconsistentDeferredBound { dimension: j + 1 });
            }
        }
        Ok(ArraySpec {
            dims,
            assumed_rank: false,
        })
    }

    /// Shorthand for an explicit-shape array with literal bounds.
    pub fn explicit(bounds: &[(i64, i64)]) -> Self {
        ArraySpec {
            dims: bounds
                .iter()
                .map(|(lb, ub)| ShapeSpec::explicit(*lb, *ub))
                .collect(),
            assumed_rank: false,
        }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn dims(&self) -> &[ShapeSpec] {
        &self.dims
    }

    pub fn is_assumed_rank(&self) -> bool {
        self.assumed_rank
    }

    pub fn is_explicit_shape(&self) -> bool {
        !self.assumed_rank
            && self
                .dims
                .iter()
                .all(|d| d.lbound.explicit().is_some() && d.ubound.explicit().is_some())
    }

    pub fn is_assumed_shape(&self) -> bool {
        !self.dims.is_empty()
            && self
                .dims
                .iter()
                .all(|d| d.lbound.explicit().is_some() && d.ubound.is_deferred())
    }

    pub fn is_deferred_shape(&self) -> bool {
        !self.dims.is_empty()
            && self
                .dims
                .iter()
                .all(|d| d.lbound.is_deferred() && d.ubound.is_deferred())
    }

    pub fn is_assumed_size(&self) -> bool {
        match self.dims.split_last() {
            Some((last, rest)) => {
                last.ubound.is_assumed() && rest.iter().all(|d| d.ubound.explicit().is_some())
            }
            None => false,
        }
    }

    pub fn is_implied_shape(&self) -> bool {
        !self.dims.is_empty() && self.dims.iter().all(|d| d.ubound.is_assumed())
    }
}

impl ops::Index<usize> for ArraySpec {
    type Output = ShapeSpec;

    fn index(&self, index: usize) -> &ShapeSpec {
        &self.dims[index]
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectEntityDetails {
    type_spec: Option<DynamicType>,
    shape: ArraySpec,
    init: Option<Expr>,
    dummy: bool,
}

impl ObjectEntityDetails {
    pub fn new(shape: ArraySpec) -> Self {
        ObjectEntityDetails {
            shape,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, ty: DynamicType) -> Self {
        self.type_spec = Some(ty);
        self
    }

    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }

    pub fn dummy(mut self) -> Self {
        self.dummy = true;
        self
    }

    pub fn type_spec(&self) -> Option<&DynamicType> {
        self.type_spec.as_ref()
    }

    pub fn shape(&self) -> &ArraySpec {
        &self.shape
    }

    pub fn init(&self) -> Option<&Expr> {
        self.init.as_ref()
    }

    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    pub fn is_assumed_size(&self) -> bool {
        self.dummy && self.shape.is_assumed_size()
    }
}

/// Construct-associated name (ASSOCIATE, SELECT TYPE, SELECT RANK).
#[derive(Debug, Clone, PartialEq)]
pub struct AssocEntityDetails {
    expr: Expr,
    rank: Option<usize>,
}

impl AssocEntityDetails {
    pub fn new(expr: Expr) -> Self {
        AssocEntityDetails { expr, rank: None }
    }

    /// A SELECT RANK case with a specific rank.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn rank(&self) -> Option<usize> {
        self.rank
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Details {
    Object(ObjectEntityDetails),
    /// Entity without array properties yet.
    Entity(Option<DynamicType>),
    ProcEntity { interface: Option<SymbolRef> },
    AssocEntity(AssocEntityDetails),
    /// Function subprogram and its result variable.
    Subprogram { result: Option<SymbolRef> },
    ProcBinding { symbol: SymbolRef },
    TypeParam(Option<DynamicType>),
    UseAssoc { symbol: SymbolRef },
    HostAssoc { symbol: SymbolRef },
    DerivedType,
    Misc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    name: Rc<str>,
    attrs: Attrs,
    details: Details,
}

impl Symbol {
    pub fn new(name: &str, attrs: Attrs, details: Details) -> SymbolRef {
        Ref::new(Symbol {
            name: name.into(),
            attrs,
            details,
        })
    }

    pub fn object(name: &str, attrs: Attrs, details: ObjectEntityDetails) -> SymbolRef {
        Self::new(name, attrs, Details::Object(details))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> Attrs {
        self.attrs
    }

    pub fn details(&self) -> &Details {
        &self.details
    }

    /// Follows use and host association to the original declaration.
    pub fn ultimate(&self) -> &Symbol {
        match &self.details {
            Details::UseAssoc { symbol } | Details::HostAssoc { symbol } => symbol.ultimate(),
            _ => self,
        }
    }

    /// Like [`Symbol::ultimate`], also seeing through construct
    /// associations whose selector is a whole variable.
    pub fn resolve_associations(&self) -> &Symbol {
        let ultimate = self.ultimate();
        if let Details::AssocEntity(assoc) = &ultimate.details {
            if assoc.rank().is_none() {
                if let Some(selector) = assoc.expr().as_whole_symbol() {
                    return selector.resolve_associations();
                }
            }
        }
        ultimate
    }

    pub fn object_details(&self) -> Option<&ObjectEntityDetails> {
        match &self.details {
            Details::Object(details) => Some(details),
            _ => None,
        }
    }

    pub fn rank(&self) -> usize {
        match &self.details {
            Details::Object(details) => details.shape.rank(),
            Details::ProcEntity {
                interface: Some(interface),
            } => interface.rank(),
            Details::AssocEntity(assoc) => assoc.rank.unwrap_or_else(|| assoc.expr.rank()),
            Details::Subprogram {
                result: Some(result),
            } => result.rank(),
            Details::ProcBinding { symbol }
            | Details::UseAssoc { symbol }
            | Details::HostAssoc { symbol } => symbol.rank(),
            _ => 0,
        }
    }

    pub fn dynamic_type(&self) -> Option<DynamicType> {
        match &self.ultimate().details {
            Details::Object(details) => details.type_spec.clone(),
            Details::Entity(ty) | Details::TypeParam(ty) => ty.clone(),
            Details::ProcEntity {
                interface: Some(interface),
            } => interface.dynamic_type(),
            Details::AssocEntity(assoc) => assoc.expr.dynamic_type(),
            Details::Subprogram {
                result: Some(result),
            } => result.dynamic_type(),
            Details::ProcBinding { symbol } => symbol.dynamic_type(),
            _ => None,
        }
    }

    pub fn is_assumed_size(&self) -> bool {
        self.ultimate()
            .object_details()
            .is_some_and(ObjectEntityDetails::is_assumed_size)
    }

    /// Implied-shape named constant (`PARAMETER :: x(*) = ...`).
    pub fn is_implied_shape(&self) -> bool {
        let ultimate = self.ultimate();
        ultimate.attrs.test(Attr::Parameter)
            && ultimate
                .object_details()
                .is_some_and(|d| d.shape.is_implied_shape())
    }

    pub fn is_explicit_shape(&self) -> bool {
        self.ultimate()
            .object_details()
            .is_some_and(|d| d.shape.is_explicit_shape())
    }

    /// Whether bounds and extents of the entity live in a run-time descriptor.
    pub fn is_descriptor(&self) -> bool {
        let symbol = self.resolve_associations();
        match &symbol.details {
            Details::Object(details) => {
                symbol.attrs.test(Attr::Pointer)
                    || symbol.attrs.test(Attr::Allocatable)
                    || details.shape.is_assumed_rank()
                    || details.shape.is_assumed_shape()
                    || details.shape.is_deferred_shape()
            }
            Details::AssocEntity(assoc) => assoc.rank.is_some(),
            _ => false,
        }
    }

    pub fn is_scope_invariant(&self) -> bool {
        if matches!(
            self.details,
            Details::UseAssoc { .. } | Details::HostAssoc { .. }
        ) {
            return true;
        }
        let ultimate = self.ultimate();
        ultimate.attrs.test(Attr::Parameter)
            || matches!(ultimate.details, Details::TypeParam(_))
            || ultimate.object_details().is_some_and(|d| d.dummy)
    }
}

/// Symbols declared in one scoping unit, in name order.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    name: Rc<str>,
    symbols: BTreeMap<Rc<str>, SymbolRef>,
}

impl Scope {
    pub fn new(name: &str) -> Self {
        Scope {
            name: name.into(),
            symbols: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declare(&mut self, symbol: SymbolRef) -> Result<SymbolRef, ModelError> {
        let name: Rc<str> = symbol.name().into();
        if self.symbols.contains_key(&name) {
            return Err(ModelError::DuplicateSymbol {
                name: name.to_string(),
            });
        }
        self.symbols.insert(name, symbol.clone());
        Ok(symbol)
    }

    pub fn get(&self, name: &str) -> Option<&SymbolRef> {
        self.symbols.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SymbolRef> {
        self.symbols.values()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
