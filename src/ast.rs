// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Expression graph consumed by shape inference.
//!
//! The graph is produced by semantic analysis elsewhere; this crate only
//! reads it. Symbols are shared through [`Ref`] handles that compare by
//! identity, everything else is a plain value that can be cloned freely.

use crate::error::ModelError;
use crate::expr::{ConstantSubscripts, ExtentExpr};
use crate::shape::SubscriptIter;
use crate::symbol::{Symbol, SymbolRef};
use crate::*;

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::{cmp, fmt, ops::Deref};

pub struct NodeRef<T> {
    r: Rc<T>,
}

impl<T> Clone for NodeRef<T> {
    fn clone(&self) -> Self {
        Self { r: self.r.clone() }
    }
}

impl<T: fmt::Debug> fmt::Debug for NodeRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.r.as_ref().fmt(f)
    }
}

impl<T> cmp::PartialEq for NodeRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::as_ptr(&self.r).eq(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::Eq for NodeRef<T> {}

impl<T> cmp::Ord for NodeRef<T> {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        Rc::as_ptr(&self.r).cmp(&Rc::as_ptr(&other.r))
    }
}

impl<T> cmp::PartialOrd for NodeRef<T> {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Deref for NodeRef<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.r
    }
}

impl<T> AsRef<T> for NodeRef<T> {
    fn as_ref(&self) -> &T {
        self.deref()
    }
}

impl<T> NodeRef<T> {
    pub fn new(t: T) -> Self {
        Self { r: Rc::new(t) }
    }
}

pub type Ref<T> = NodeRef<T>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Real,
    Complex,
    Character,
    Logical,
    Derived,
}

/// Type of an expression or entity. `kind` is the storage size of one
/// element (or one character) in bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicType {
    pub category: TypeCategory,
    pub kind: u8,
    pub length: Option<ExtentExpr>,
}

impl DynamicType {
    pub fn new(category: TypeCategory, kind: u8) -> Self {
        DynamicType {
            category,
            kind,
            length: None,
        }
    }

    pub fn integer(kind: u8) -> Self {
        Self::new(TypeCategory::Integer, kind)
    }

    pub fn real(kind: u8) -> Self {
        Self::new(TypeCategory::Real, kind)
    }

    pub fn complex(kind: u8) -> Self {
        Self::new(TypeCategory::Complex, kind)
    }

    pub fn logical(kind: u8) -> Self {
        Self::new(TypeCategory::Logical, kind)
    }

    pub fn character(kind: u8, length: Option<ExtentExpr>) -> Self {
        DynamicType {
            category: TypeCategory::Character,
            kind,
            length,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.category == TypeCategory::Integer
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Real(f64),
    Complex(f64, f64),
    Logical(bool),
    Character(Rc<str>),
}

impl Scalar {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Logical(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(v) => write!(f, "{v}"),
            Scalar::Real(v) => write!(f, "{v:?}"),
            Scalar::Complex(re, im) => write!(f, "({re:?},{im:?})"),
            Scalar::Logical(true) => f.write_str(".true."),
            Scalar::Logical(false) => f.write_str(".false."),
            Scalar::Character(s) => write!(f, "'{s}'"),
        }
    }
}

/// A literal scalar or array value. Elements are stored in column-major
/// (array element) order.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    ty: DynamicType,
    values: Vec<Scalar>,
    shape: ConstantSubscripts,
}

impl Constant {
    pub fn new(
        ty: DynamicType,
        values: Vec<Scalar>,
        shape: ConstantSubscripts,
    ) -> Result<Self, ModelError> {
        let mut expected: i64 = 1;
        for (dimension, extent) in shape.iter().enumerate() {
            if *extent < 0 {
                return Err(ModelError::NegativeExtent {
                    dimension: dimension + 1,
                    extent: *extent,
                });
            }
            expected = expected.saturating_mul(*extent);
        }
        if usize::try_from(expected).ok() != Some(values.len()) {
            return Err(ModelError::ConstantSizeMismatch {
                values: values.len(),
                expected,
                shape,
            });
        }
        Ok(Constant { ty, values, shape })
    }

    pub fn scalar(ty: DynamicType, value: Scalar) -> Self {
        Constant {
            ty,
            values: vec![value],
            shape: Vec::new(),
        }
    }

    pub fn integer(value: i64) -> Self {
        Self::scalar(DynamicType::integer(8), Scalar::Integer(value))
    }

    pub fn logical(value: bool) -> Self {
        Self::scalar(DynamicType::logical(4), Scalar::Logical(value))
    }

    /// Rank-1 integer constant, the representation of a constant shape.
    pub fn integer_vector(values: &[i64]) -> Self {
        Constant {
            ty: DynamicType::integer(8),
            values: values.iter().copied().map(Scalar::Integer).collect(),
            shape: vec![values.len() as i64],
        }
    }

    pub fn logical_array(values: &[bool], shape: ConstantSubscripts) -> Result<Self, ModelError> {
        Self::new(
            DynamicType::logical(4),
            values.iter().copied().map(Scalar::Logical).collect(),
            shape,
        )
    }

    pub fn ty(&self) -> &DynamicType {
        &self.ty
    }

    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    pub fn shape(&self) -> &ConstantSubscripts {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn to_i64(&self) -> Option<i64> {
        match (self.rank(), self.values.first()) {
            (0, Some(v)) => v.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match (self.rank(), self.values.first()) {
            (0, Some(v)) => v.as_bool(),
            _ => None,
        }
    }

    /// Element at a 1-based subscript.
    pub fn at(&self, index: &[i64]) -> Option<&Scalar> {
        if index.len() != self.rank() {
            return None;
        }
        let mut offset: i64 = 0;
        let mut stride: i64 = 1;
        for (j, extent) in index.iter().zip(self.shape.iter()) {
            if *j < 1 || *j > *extent {
                return None;
            }
            offset += (*j - 1) * stride;
            stride *= *extent;
        }
        self.values.get(usize::try_from(offset).ok()?)
    }

    /// Iterates every subscript of the constant in array element order.
    pub fn subscripts(&self) -> SubscriptIter {
        SubscriptIter::new(self.shape.clone())
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rank() == 0 {
            if let Some(v) = self.values.first() {
                return v.fmt(f);
            }
        }
        let items = join(self.values.iter());
        if self.rank() == 1 {
            write!(f, "[{items}]")
        } else {
            write!(f, "reshape([{items}],[{}])", join(self.shape.iter()))
        }
    }
}

/// An entity whose shape and bounds can be queried: a whole symbol or a
/// component reference.
#[derive(Debug, Clone, PartialEq)]
pub enum NamedEntity {
    Symbol(SymbolRef),
    Component(Component),
}

impl NamedEntity {
    pub fn last_symbol(&self) -> &SymbolRef {
        match self {
            NamedEntity::Symbol(s) => s,
            NamedEntity::Component(c) => c.last_symbol(),
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            NamedEntity::Component(c) => Some(c),
            NamedEntity::Symbol(_) => None,
        }
    }

    pub fn rank(&self) -> usize {
        match self {
            NamedEntity::Symbol(s) => s.rank(),
            NamedEntity::Component(c) => c.rank(),
        }
    }
}

impl From<SymbolRef> for NamedEntity {
    fn from(symbol: SymbolRef) -> Self {
        NamedEntity::Symbol(symbol)
    }
}

impl From<Component> for NamedEntity {
    fn from(component: Component) -> Self {
        NamedEntity::Component(component)
    }
}

impl fmt::Display for NamedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamedEntity::Symbol(s) => f.write_str(s.name()),
            NamedEntity::Component(c) => c.fmt(f),
        }
    }
}

/// `base%symbol`.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    base: Box<DataRef>,
    symbol: SymbolRef,
}

impl Component {
    pub fn new(base: DataRef, symbol: SymbolRef) -> Self {
        Component {
            base: Box::new(base),
            symbol,
        }
    }

    pub fn base(&self) -> &DataRef {
        &self.base
    }

    pub fn last_symbol(&self) -> &SymbolRef {
        &self.symbol
    }

    pub fn rank(&self) -> usize {
        match self.symbol.rank() {
            0 => self.base.rank(),
            rank => rank,
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%{}", self.base, self.symbol.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Triplet {
    lower: Option<ExtentExpr>,
    upper: Option<ExtentExpr>,
    stride: ExtentExpr,
}

impl Triplet {
    pub fn new(lower: Option<ExtentExpr>, upper: Option<ExtentExpr>, stride: ExtentExpr) -> Self {
        Triplet {
            lower,
            upper,
            stride,
        }
    }

    /// `(:)`
    pub fn full() -> Self {
        Self::new(None, None, ExtentExpr::Constant(1))
    }

    pub fn lower(&self) -> Option<&ExtentExpr> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&ExtentExpr> {
        self.upper.as_ref()
    }

    pub fn stride(&self) -> &ExtentExpr {
        &self.stride
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    Triplet(Triplet),
    /// Scalar or vector-valued integer subscript.
    Indirect(Box<Expr>),
}

impl Subscript {
    pub fn scalar(index: ExtentExpr) -> Self {
        Subscript::Indirect(Box::new(Expr::Extent(index)))
    }

    pub fn vector(expr: Expr) -> Self {
        Subscript::Indirect(Box::new(expr))
    }

    pub fn rank(&self) -> usize {
        match self {
            Subscript::Triplet(_) => 1,
            Subscript::Indirect(e) => e.rank(),
        }
    }
}

impl fmt::Display for Subscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subscript::Triplet(t) => {
                if let Some(lower) = t.lower() {
                    lower.fmt(f)?;
                }
                f.write_str(":")?;
                if let Some(upper) = t.upper() {
                    upper.fmt(f)?;
                }
                if t.stride().to_i64() != Some(1) {
                    write!(f, ":{}", t.stride())?;
                }
                Ok(())
            }
            Subscript::Indirect(e) => e.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayRef {
    base: NamedEntity,
    subscripts: Vec<Subscript>,
}

impl ArrayRef {
    pub fn new(base: NamedEntity, subscripts: Vec<Subscript>) -> Self {
        ArrayRef { base, subscripts }
    }

    pub fn base(&self) -> &NamedEntity {
        &self.base
    }

    pub fn subscripts(&self) -> &[Subscript] {
        &self.subscripts
    }

    pub fn rank(&self) -> usize {
        let rank: usize = self.subscripts.iter().map(Subscript::rank).sum();
        if rank > 0 {
            rank
        } else if let Some(component) = self.base.as_component() {
            component.base().rank()
        } else {
            0
        }
    }
}

impl fmt::Display for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.base, join(self.subscripts.iter()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CoarrayRef {
    base: NamedEntity,
    subscripts: Vec<Subscript>,
    cosubscripts: Vec<ExtentExpr>,
}

impl CoarrayRef {
    pub fn new(base: NamedEntity, subscripts: Vec<Subscript>, cosubscripts: Vec<ExtentExpr>) -> Self {
        CoarrayRef {
            base,
            subscripts,
            cosubscripts,
        }
    }

    pub fn base(&self) -> &NamedEntity {
        &self.base
    }

    pub fn subscripts(&self) -> &[Subscript] {
        &self.subscripts
    }

    pub fn cosubscripts(&self) -> &[ExtentExpr] {
        &self.cosubscripts
    }

    pub fn rank(&self) -> usize {
        if self.subscripts.is_empty() {
            self.base.rank()
        } else {
            self.subscripts.iter().map(Subscript::rank).sum()
        }
    }
}

impl fmt::Display for CoarrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.base.fmt(f)?;
        if !self.subscripts.is_empty() {
            write!(f, "({})", join(self.subscripts.iter()))?;
        }
        write!(f, "[{}]", join(self.cosubscripts.iter()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataRef {
    Symbol(SymbolRef),
    Component(Component),
    ArrayRef(ArrayRef),
    CoarrayRef(CoarrayRef),
}

impl DataRef {
    pub fn rank(&self) -> usize {
        match self {
            DataRef::Symbol(s) => s.rank(),
            DataRef::Component(c) => c.rank(),
            DataRef::ArrayRef(a) => a.rank(),
            DataRef::CoarrayRef(c) => c.rank(),
        }
    }

    pub fn last_symbol(&self) -> &SymbolRef {
        match self {
            DataRef::Symbol(s) => s,
            DataRef::Component(c) => c.last_symbol(),
            DataRef::ArrayRef(a) => a.base().last_symbol(),
            DataRef::CoarrayRef(c) => c.base().last_symbol(),
        }
    }
}

impl From<NamedEntity> for DataRef {
    fn from(entity: NamedEntity) -> Self {
        match entity {
            NamedEntity::Symbol(s) => DataRef::Symbol(s),
            NamedEntity::Component(c) => DataRef::Component(c),
        }
    }
}

impl fmt::Display for DataRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataRef::Symbol(s) => f.write_str(s.name()),
            DataRef::Component(c) => c.fmt(f),
            DataRef::ArrayRef(a) => a.fmt(f),
            DataRef::CoarrayRef(c) => c.fmt(f),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubstringParent {
    DataRef(DataRef),
    Literal(Constant),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Substring {
    parent: SubstringParent,
    lower: Option<ExtentExpr>,
    upper: Option<ExtentExpr>,
}

impl Substring {
    pub fn new(parent: SubstringParent, lower: Option<ExtentExpr>, upper: Option<ExtentExpr>) -> Self {
        Substring {
            parent,
            lower,
            upper,
        }
    }

    pub fn parent(&self) -> &SubstringParent {
        &self.parent
    }

    pub fn lower(&self) -> Option<&ExtentExpr> {
        self.lower.as_ref()
    }

    pub fn upper(&self) -> Option<&ExtentExpr> {
        self.upper.as_ref()
    }

    pub fn rank(&self) -> usize {
        match &self.parent {
            SubstringParent::DataRef(d) => d.rank(),
            SubstringParent::Literal(c) => c.rank(),
        }
    }

    fn parent_type(&self) -> Option<DynamicType> {
        match &self.parent {
            SubstringParent::DataRef(d) => d.last_symbol().dynamic_type(),
            SubstringParent::Literal(c) => Some(c.ty().clone()),
        }
    }

    /// Character type with the substring's length when it can be expressed.
    pub fn dynamic_type(&self) -> Option<DynamicType> {
        let parent = self.parent_type()?;
        let lower = self.lower.clone().unwrap_or(ExtentExpr::Constant(1));
        let upper = self.upper.clone().or_else(|| parent.length.clone());
        let length = upper.map(|upper| {
            ExtentExpr::max(
                ExtentExpr::Constant(0),
                upper - lower + ExtentExpr::Constant(1),
            )
        });
        Some(DynamicType::character(parent.kind, length))
    }
}

impl fmt::Display for Substring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            SubstringParent::DataRef(d) => d.fmt(f)?,
            SubstringParent::Literal(c) => c.fmt(f)?,
        }
        f.write_str("(")?;
        if let Some(lower) = &self.lower {
            lower.fmt(f)?;
        }
        f.write_str(":")?;
        if let Some(upper) = &self.upper {
            upper.fmt(f)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Designator {
    DataRef(DataRef),
    Substring(Substring),
}

impl Designator {
    pub fn rank(&self) -> usize {
        match self {
            Designator::DataRef(d) => d.rank(),
            Designator::Substring(s) => s.rank(),
        }
    }

    pub fn dynamic_type(&self) -> Option<DynamicType> {
        match self {
            Designator::DataRef(d) => d.last_symbol().dynamic_type(),
            Designator::Substring(s) => s.dynamic_type(),
        }
    }
}

impl fmt::Display for Designator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Designator::DataRef(d) => d.fmt(f),
            Designator::Substring(s) => s.fmt(f),
        }
    }
}

/// An intrinsic procedure after generic resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificIntrinsic {
    name: Rc<str>,
    rank: usize,
    elemental: bool,
    null_pointer: bool,
    result_type: Option<DynamicType>,
}

impl SpecificIntrinsic {
    pub fn new(name: &str, rank: usize) -> Self {
        SpecificIntrinsic {
            name: name.into(),
            rank,
            elemental: false,
            null_pointer: false,
            result_type: None,
        }
    }

    pub fn elemental(mut self, elemental: bool) -> Self {
        self.elemental = elemental;
        self
    }

    pub fn null_pointer(mut self, null_pointer: bool) -> Self {
        self.null_pointer = null_pointer;
        self
    }

    pub fn with_result_type(mut self, ty: DynamicType) -> Self {
        self.result_type = Some(ty);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn is_elemental(&self) -> bool {
        self.elemental
    }

    pub fn is_null_pointer(&self) -> bool {
        self.null_pointer
    }

    pub fn result_type(&self) -> Option<&DynamicType> {
        self.result_type.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProcedureDesignator {
    Intrinsic(SpecificIntrinsic),
    Symbol(SymbolRef),
    Component(Component),
}

impl ProcedureDesignator {
    pub fn symbol(&self) -> Option<&SymbolRef> {
        match self {
            ProcedureDesignator::Intrinsic(_) => None,
            ProcedureDesignator::Symbol(s) => Some(s),
            ProcedureDesignator::Component(c) => Some(c.last_symbol()),
        }
    }

    pub fn specific_intrinsic(&self) -> Option<&SpecificIntrinsic> {
        match self {
            ProcedureDesignator::Intrinsic(i) => Some(i),
            _ => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ProcedureDesignator::Intrinsic(i) => i.name(),
            ProcedureDesignator::Symbol(s) => s.name(),
            ProcedureDesignator::Component(c) => c.last_symbol().name(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActualArgument {
    expr: Expr,
    keyword: Option<Rc<str>>,
}

impl ActualArgument {
    pub fn new(expr: Expr) -> Self {
        ActualArgument {
            expr,
            keyword: None,
        }
    }

    pub fn with_keyword(expr: Expr, keyword: &str) -> Self {
        ActualArgument {
            expr,
            keyword: Some(keyword.into()),
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn rank(&self) -> usize {
        self.expr.rank()
    }
}

impl From<Expr> for ActualArgument {
    fn from(expr: Expr) -> Self {
        ActualArgument::new(expr)
    }
}

impl fmt::Display for ActualArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = &self.keyword {
            write!(f, "{keyword}=")?;
        }
        self.expr.fmt(f)
    }
}

/// A function reference. Absent optional arguments are `None`, the rest
/// sit at their dummy argument positions.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureRef {
    proc: ProcedureDesignator,
    arguments: Vec<Option<ActualArgument>>,
}

impl ProcedureRef {
    pub fn new(proc: ProcedureDesignator, arguments: Vec<Option<ActualArgument>>) -> Self {
        ProcedureRef { proc, arguments }
    }

    pub fn proc(&self) -> &ProcedureDesignator {
        &self.proc
    }

    pub fn arguments(&self) -> &[Option<ActualArgument>] {
        &self.arguments
    }

    pub fn is_elemental(&self) -> bool {
        match &self.proc {
            ProcedureDesignator::Intrinsic(i) => i.is_elemental(),
            ProcedureDesignator::Symbol(s) => s.ultimate().attrs().test(Attr::Elemental),
            ProcedureDesignator::Component(c) => {
                c.last_symbol().ultimate().attrs().test(Attr::Elemental)
            }
        }
    }

    pub fn rank(&self) -> usize {
        if self.is_elemental() {
            return self
                .arguments
                .iter()
                .flatten()
                .map(ActualArgument::rank)
                .max()
                .unwrap_or(0);
        }
        match &self.proc {
            ProcedureDesignator::Intrinsic(i) => i.rank(),
            ProcedureDesignator::Symbol(s) => s.rank(),
            ProcedureDesignator::Component(c) => c.last_symbol().rank(),
        }
    }

    pub fn dynamic_type(&self) -> Option<DynamicType> {
        match &self.proc {
            ProcedureDesignator::Intrinsic(i) => i.result_type().cloned(),
            ProcedureDesignator::Symbol(s) => s.dynamic_type(),
            ProcedureDesignator::Component(c) => c.last_symbol().dynamic_type(),
        }
    }
}

impl fmt::Display for ProcedureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.proc.name())?;
        let mut first = true;
        for argument in self.arguments.iter().flatten() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            argument.fmt(f)?;
        }
        f.write_str(")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationalOperator {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Negate,
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Not,
    And,
    Or,
    Eqv,
    Neqv,
    Concat,
    Relational(RelationalOperator),
    Convert(TypeCategory, u8),
}

impl Operator {
    fn symbol(&self) -> &'static str {
        match self {
            Operator::Negate | Operator::Subtract => "-",
            Operator::Add => "+",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Power => "**",
            Operator::Not => ".not.",
            Operator::And => ".and.",
            Operator::Or => ".or.",
            Operator::Eqv => ".eqv.",
            Operator::Neqv => ".neqv.",
            Operator::Concat => "//",
            Operator::Relational(RelationalOperator::Lt) => "<",
            Operator::Relational(RelationalOperator::Le) => "<=",
            Operator::Relational(RelationalOperator::Eq) => "==",
            Operator::Relational(RelationalOperator::Ne) => "/=",
            Operator::Relational(RelationalOperator::Ge) => ">=",
            Operator::Relational(RelationalOperator::Gt) => ">",
            Operator::Convert(..) => "",
        }
    }
}

/// Intrinsic operator application; all intrinsic operators are elemental.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    operator: Operator,
    operands: Vec<Expr>,
}

impl Operation {
    pub fn new(operator: Operator, operands: Vec<Expr>) -> Self {
        Operation { operator, operands }
    }

    pub fn unary(operator: Operator, operand: Expr) -> Self {
        Self::new(operator, vec![operand])
    }

    pub fn binary(operator: Operator, left: Expr, right: Expr) -> Self {
        Self::new(operator, vec![left, right])
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operands(&self) -> &[Expr] {
        &self.operands
    }

    pub fn rank(&self) -> usize {
        self.operands.iter().map(Expr::rank).max().unwrap_or(0)
    }

    pub fn dynamic_type(&self) -> Option<DynamicType> {
        match self.operator {
            Operator::Relational(_)
            | Operator::Not
            | Operator::And
            | Operator::Or
            | Operator::Eqv
            | Operator::Neqv => Some(DynamicType::logical(4)),
            Operator::Convert(category, kind) => Some(DynamicType::new(category, kind)),
            _ => self.operands.first().and_then(Expr::dynamic_type),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.operator, self.operands.as_slice()) {
            (Operator::Convert(..), [operand]) => operand.fmt(f),
            (operator, [operand]) => write!(f, "({}{operand})", operator.symbol()),
            (operator, operands) => {
                f.write_str("(")?;
                for (j, operand) in operands.iter().enumerate() {
                    if j > 0 {
                        f.write_str(operator.symbol())?;
                    }
                    operand.fmt(f)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImpliedDo {
    name: Rc<str>,
    lower: ExtentExpr,
    upper: ExtentExpr,
    stride: ExtentExpr,
    values: Vec<ArrayConstructorValue>,
}

impl ImpliedDo {
    pub fn new(
        name: &str,
        lower: ExtentExpr,
        upper: ExtentExpr,
        stride: ExtentExpr,
        values: Vec<ArrayConstructorValue>,
    ) -> Self {
        ImpliedDo {
            name: name.into(),
            lower,
            upper,
            stride,
            values,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lower(&self) -> &ExtentExpr {
        &self.lower
    }

    pub fn upper(&self) -> &ExtentExpr {
        &self.upper
    }

    pub fn stride(&self) -> &ExtentExpr {
        &self.stride
    }

    pub fn values(&self) -> &[ArrayConstructorValue] {
        &self.values
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayConstructorValue {
    Expr(Expr),
    ImpliedDo(ImpliedDo),
}

impl fmt::Display for ArrayConstructorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayConstructorValue::Expr(e) => e.fmt(f),
            ArrayConstructorValue::ImpliedDo(ido) => write!(
                f,
                "({},{}={},{},{})",
                join(ido.values.iter()),
                ido.name,
                ido.lower,
                ido.upper,
                ido.stride
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayConstructor {
    values: Vec<ArrayConstructorValue>,
}

impl ArrayConstructor {
    pub fn new(values: Vec<ArrayConstructorValue>) -> Self {
        ArrayConstructor { values }
    }

    pub fn values(&self) -> &[ArrayConstructorValue] {
        &self.values
    }

    fn first_type(values: &[ArrayConstructorValue]) -> Option<DynamicType> {
        values.iter().find_map(|value| match value {
            ArrayConstructorValue::Expr(e) => e.dynamic_type(),
            ArrayConstructorValue::ImpliedDo(ido) => Self::first_type(ido.values()),
        })
    }
}

impl fmt::Display for ArrayConstructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", join(self.values.iter()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Constant),
    /// Scalar integer expression in extent form (subscripts, DIM=, NCOPIES=).
    Extent(ExtentExpr),
    Designator(Designator),
    FunctionRef(Box<ProcedureRef>),
    Operation(Operation),
    Parentheses(Box<Expr>),
    ArrayConstructor(ArrayConstructor),
    NullPointer,
}

impl Expr {
    pub fn symbol(symbol: &SymbolRef) -> Self {
        Expr::Designator(Designator::DataRef(DataRef::Symbol(symbol.clone())))
    }

    pub fn integer(value: i64) -> Self {
        Expr::Extent(ExtentExpr::Constant(value))
    }

    pub fn rank(&self) -> usize {
        match self {
            Expr::Constant(c) => c.rank(),
            Expr::Extent(_) | Expr::NullPointer => 0,
            Expr::Designator(d) => d.rank(),
            Expr::FunctionRef(call) => call.rank(),
            Expr::Operation(op) => op.rank(),
            Expr::Parentheses(e) => e.rank(),
            Expr::ArrayConstructor(_) => 1,
        }
    }

    /// The whole variable this expression designates, if it is one.
    pub fn as_whole_symbol(&self) -> Option<&SymbolRef> {
        match self {
            Expr::Designator(Designator::DataRef(DataRef::Symbol(s))) => Some(s),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expr::Constant(c) => Some(c),
            Expr::Parentheses(e) => e.as_constant(),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Expr::Constant(c) => c.to_i64(),
            Expr::Extent(e) => e.to_i64(),
            Expr::Parentheses(e) => e.to_i64(),
            _ => None,
        }
    }

    /// Converts a scalar integer expression to the extent algebra.
    pub fn to_extent_expr(&self) -> Option<ExtentExpr> {
        match self {
            Expr::Constant(c) => c.to_i64().map(ExtentExpr::Constant),
            Expr::Extent(e) => Some(e.clone()),
            Expr::Designator(Designator::DataRef(DataRef::Symbol(s))) if s.rank() == 0 => {
                Some(ExtentExpr::Symbol(s.clone()))
            }
            Expr::Parentheses(e) => e.to_extent_expr(),
            Expr::FunctionRef(call) if call.rank() == 0 => {
                Some(ExtentExpr::FunctionRef(call.clone()))
            }
            Expr::Operation(op) => {
                let mut operands = op.operands().iter().map(Expr::to_extent_expr);
                match (op.operator(), operands.next(), operands.next()) {
                    (Operator::Negate, Some(x), None) => Some(-x?),
                    (Operator::Convert(TypeCategory::Integer, _), Some(x), None) => x,
                    (Operator::Add, Some(x), Some(y)) => Some(x? + y?),
                    (Operator::Subtract, Some(x), Some(y)) => Some(x? - y?),
                    (Operator::Multiply, Some(x), Some(y)) => Some(x? * y?),
                    (Operator::Divide, Some(x), Some(y)) => Some(x? / y?),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn dynamic_type(&self) -> Option<DynamicType> {
        match self {
            Expr::Constant(c) => Some(c.ty().clone()),
            Expr::Extent(_) => Some(DynamicType::integer(8)),
            Expr::Designator(d) => d.dynamic_type(),
            Expr::FunctionRef(call) => call.dynamic_type(),
            Expr::Operation(op) => op.dynamic_type(),
            Expr::Parentheses(e) => e.dynamic_type(),
            Expr::ArrayConstructor(ac) => ArrayConstructor::first_type(ac.values()),
            Expr::NullPointer => None,
        }
    }

    /// True when every symbol the expression references satisfies `pred`.
    pub fn all_symbols(&self, pred: &mut dyn FnMut(&Symbol) -> bool) -> bool {
        match self {
            Expr::Constant(_) | Expr::NullPointer => true,
            Expr::Extent(e) => e.all_symbols(pred),
            Expr::Designator(d) => designator_symbols(d, pred),
            Expr::FunctionRef(call) => call_symbols(call, pred),
            Expr::Operation(op) => op.operands().iter().all(|e| e.all_symbols(pred)),
            Expr::Parentheses(e) => e.all_symbols(pred),
            Expr::ArrayConstructor(ac) => constructor_symbols(ac.values(), pred),
        }
    }

    pub fn is_constant_expr(&self) -> bool {
        match self {
            Expr::Constant(_) | Expr::NullPointer => true,
            Expr::Extent(e) => e.is_constant_expr(),
            Expr::Designator(Designator::DataRef(DataRef::Symbol(s))) => {
                s.ultimate().attrs().test(Attr::Parameter)
            }
            Expr::Designator(_) => false,
            Expr::FunctionRef(call) => {
                call.proc().specific_intrinsic().is_some()
                    && call
                        .arguments()
                        .iter()
                        .flatten()
                        .all(|a| a.expr().is_constant_expr())
            }
            Expr::Operation(op) => op.operands().iter().all(Expr::is_constant_expr),
            Expr::Parentheses(e) => e.is_constant_expr(),
            Expr::ArrayConstructor(ac) => ac.values().iter().all(|v| match v {
                ArrayConstructorValue::Expr(e) => e.is_constant_expr(),
                ArrayConstructorValue::ImpliedDo(_) => false,
            }),
        }
    }

    pub fn contains_implied_do_index(&self) -> bool {
        match self {
            Expr::Extent(e) => e.contains_implied_do_index(),
            Expr::FunctionRef(call) => call
                .arguments()
                .iter()
                .flatten()
                .any(|a| a.expr().contains_implied_do_index()),
            Expr::Operation(op) => op.operands().iter().any(Expr::contains_implied_do_index),
            Expr::Parentheses(e) => e.contains_implied_do_index(),
            _ => false,
        }
    }
}

fn subscript_symbols(subscript: &Subscript, pred: &mut dyn FnMut(&Symbol) -> bool) -> bool {
    match subscript {
        Subscript::Triplet(t) => {
            t.lower().map_or(true, |e| e.all_symbols(pred))
                && t.upper().map_or(true, |e| e.all_symbols(pred))
                && t.stride().all_symbols(pred)
        }
        Subscript::Indirect(e) => e.all_symbols(pred),
    }
}

fn named_entity_symbols(entity: &NamedEntity, pred: &mut dyn FnMut(&Symbol) -> bool) -> bool {
    match entity {
        NamedEntity::Symbol(s) => pred(&**s),
        NamedEntity::Component(c) => data_ref_symbols(c.base(), pred),
    }
}

fn data_ref_symbols(data_ref: &DataRef, pred: &mut dyn FnMut(&Symbol) -> bool) -> bool {
    match data_ref {
        DataRef::Symbol(s) => pred(&**s),
        DataRef::Component(c) => data_ref_symbols(c.base(), pred),
        DataRef::ArrayRef(a) => {
            named_entity_symbols(a.base(), pred)
                && a.subscripts().iter().all(|s| subscript_symbols(s, pred))
        }
        DataRef::CoarrayRef(c) => {
            named_entity_symbols(c.base(), pred)
                && c.subscripts().iter().all(|s| subscript_symbols(s, pred))
                && c.cosubscripts().iter().all(|e| e.all_symbols(pred))
        }
    }
}

fn designator_symbols(designator: &Designator, pred: &mut dyn FnMut(&Symbol) -> bool) -> bool {
    match designator {
        Designator::DataRef(d) => data_ref_symbols(d, pred),
        Designator::Substring(s) => {
            let parent = match s.parent() {
                SubstringParent::DataRef(d) => data_ref_symbols(d, pred),
                SubstringParent::Literal(_) => true,
            };
            parent
                && s.lower().map_or(true, |e| e.all_symbols(pred))
                && s.upper().map_or(true, |e| e.all_symbols(pred))
        }
    }
}

pub(crate) fn call_symbols(call: &ProcedureRef, pred: &mut dyn FnMut(&Symbol) -> bool) -> bool {
    let proc = match call.proc() {
        ProcedureDesignator::Intrinsic(_) => true,
        ProcedureDesignator::Symbol(s) => pred(&**s),
        ProcedureDesignator::Component(c) => data_ref_symbols(c.base(), pred),
    };
    proc && call
        .arguments()
        .iter()
        .flatten()
        .all(|a| a.expr().all_symbols(pred))
}

fn constructor_symbols(
    values: &[ArrayConstructorValue],
    pred: &mut dyn FnMut(&Symbol) -> bool,
) -> bool {
    values.iter().all(|value| match value {
        ArrayConstructorValue::Expr(e) => e.all_symbols(pred),
        ArrayConstructorValue::ImpliedDo(ido) => {
            ido.lower().all_symbols(pred)
                && ido.upper().all_symbols(pred)
                && ido.stride().all_symbols(pred)
                && constructor_symbols(ido.values(), pred)
        }
    })
}

impl From<Constant> for Expr {
    fn from(constant: Constant) -> Self {
        Expr::Constant(constant)
    }
}

impl From<ExtentExpr> for Expr {
    fn from(extent: ExtentExpr) -> Self {
        Expr::Extent(extent)
    }
}

impl From<DataRef> for Expr {
    fn from(data_ref: DataRef) -> Self {
        Expr::Designator(Designator::DataRef(data_ref))
    }
}

impl From<Designator> for Expr {
    fn from(designator: Designator) -> Self {
        Expr::Designator(designator)
    }
}

impl From<ProcedureRef> for Expr {
    fn from(call: ProcedureRef) -> Self {
        Expr::FunctionRef(Box::new(call))
    }
}

impl From<Operation> for Expr {
    fn from(operation: Operation) -> Self {
        Expr::Operation(operation)
    }
}

impl From<ArrayConstructor> for Expr {
    fn from(constructor: ArrayConstructor) -> Self {
        Expr::ArrayConstructor(constructor)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(c) => c.fmt(f),
            Expr::Extent(e) => e.fmt(f),
            Expr::Designator(d) => d.fmt(f),
            Expr::FunctionRef(call) => call.fmt(f),
            Expr::Operation(op) => op.fmt(f),
            Expr::Parentheses(e) => write!(f, "({e})"),
            Expr::ArrayConstructor(ac) => ac.fmt(f),
            Expr::NullPointer => f.write_str("null()"),
        }
    }
}

fn join<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    use core::fmt::Write;
    let mut out = String::new();
    for (j, item) in items.enumerate() {
        if j > 0 {
            out.push(',');
        }
        let _ = write!(out, "{item}");
    }
    out
}
