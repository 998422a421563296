// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use super::bounds::{get_extent, get_subscript_extent};
use super::intrinsic_rules;
use super::{get_size, scalar_shape, MaybeShape, Shape};
use crate::ast::{
    ActualArgument, ArrayConstructor, ArrayConstructorValue, ArrayRef, CoarrayRef, Component,
    Constant, DataRef, Designator, Expr, ImpliedDo, NamedEntity, ProcedureRef, Substring,
    Subscript, SubstringParent,
};
use crate::expr::{ExtentExpr, MaybeExtentExpr};
use crate::fold::FoldingContext;
use crate::symbol::{Details, SymbolRef};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeOptions {
    /// Report a function result's declared shape even when it refers to
    /// names only meaningful inside the function.
    pub use_result_symbol_shape: bool,
}

/// Visitor computing the shape of expression nodes.
#[derive(Debug, Clone, Copy)]
pub struct GetShapeHelper<'a> {
    context: Option<&'a FoldingContext>,
    use_result_symbol_shape: bool,
}

impl<'a> GetShapeHelper<'a> {
    pub fn new(context: Option<&'a FoldingContext>) -> Self {
        GetShapeHelper {
            context,
            use_result_symbol_shape: false,
        }
    }

    pub fn with_options(context: Option<&'a FoldingContext>, options: &ShapeOptions) -> Self {
        GetShapeHelper {
            context,
            use_result_symbol_shape: options.use_result_symbol_shape,
        }
    }

    pub fn context(&self) -> Option<&'a FoldingContext> {
        self.context
    }

    pub fn expr(&self, expr: &Expr) -> MaybeShape {
        match expr {
            Expr::Constant(constant) => Some(self.constant(constant)),
            Expr::Extent(_) | Expr::NullPointer => Some(scalar_shape()),
            Expr::Designator(designator) => self.designator(designator),
            Expr::FunctionRef(call) => self.procedure_ref(call),
            Expr::Operation(operation) => self.first_nonscalar(operation.operands()),
            Expr::Parentheses(inner) => self.expr(inner),
            Expr::ArrayConstructor(constructor) => self.array_constructor(constructor),
        }
    }

    fn first_nonscalar(&self, operands: &[Expr]) -> MaybeShape {
        match operands.iter().find(|operand| operand.rank() > 0) {
            Some(operand) => self.expr(operand),
            None => Some(scalar_shape()),
        }
    }

    pub fn constant(&self, constant: &Constant) -> Shape {
        super::as_shape(constant.shape())
    }

    pub fn symbol(&self, symbol: &SymbolRef) -> MaybeShape {
        let ultimate = symbol.ultimate();
        match ultimate.details() {
            Details::Object(object) => {
                if ultimate.is_implied_shape() {
                    if let Some(init) = object.init() {
                        return self.expr(init);
                    }
                }
                if object.shape().is_assumed_rank() {
                    return None;
                }
                Some(create_shape(
                    object.shape().rank(),
                    &NamedEntity::Symbol(symbol.clone()),
                ))
            }
            Details::Entity(_) | Details::TypeParam(_) => Some(scalar_shape()),
            Details::ProcEntity { interface } => match interface {
                Some(interface) => self.symbol(interface),
                None => Some(scalar_shape()),
            },
            Details::AssocEntity(assoc) => match assoc.rank() {
                Some(rank) => Some(create_shape(rank, &NamedEntity::Symbol(symbol.clone()))),
                None => self.expr(assoc.expr()),
            },
            Details::Subprogram { result: Some(result) } => {
                let shape = self.symbol(result)?;
                let caller_safe = shape
                    .iter()
                    .flatten()
                    .all(ExtentExpr::is_constant_expr);
                if !self.use_result_symbol_shape && !caller_safe {
                    return None;
                }
                Some(shape)
            }
            Details::ProcBinding { symbol } => self.symbol(symbol),
            _ => None,
        }
    }

    pub fn component(&self, component: &Component) -> MaybeShape {
        let symbol = component.last_symbol();
        if symbol.rank() == 0 {
            return self.data_ref(component.base());
        }
        match symbol.details() {
            Details::Object(_) | Details::AssocEntity(_) => Some(create_shape(
                symbol.rank(),
                &NamedEntity::Component(component.clone()),
            )),
            _ => self.symbol(symbol),
        }
    }

    pub fn named_entity(&self, entity: &NamedEntity) -> MaybeShape {
        match entity {
            NamedEntity::Symbol(symbol) => self.symbol(symbol),
            NamedEntity::Component(component) => self.component(component),
        }
    }

    pub fn array_ref(&self, array_ref: &ArrayRef) -> MaybeShape {
        let shape = self.subscript_extents(array_ref.base(), array_ref.subscripts());
        if shape.is_empty() {
            if let NamedEntity::Component(component) = array_ref.base() {
                return self.data_ref(component.base());
            }
        }
        Some(shape)
    }

    pub fn coarray_ref(&self, coarray_ref: &CoarrayRef) -> MaybeShape {
        if coarray_ref.subscripts().is_empty() {
            return self.named_entity(coarray_ref.base());
        }
        Some(self.subscript_extents(coarray_ref.base(), coarray_ref.subscripts()))
    }

    fn subscript_extents(&self, base: &NamedEntity, subscripts: &[Subscript]) -> Shape {
        subscripts
            .iter()
            .enumerate()
            .filter(|(_, subscript)| subscript.rank() > 0)
            .map(|(dimension, subscript)| get_subscript_extent(subscript, base, dimension))
            .collect()
    }

    pub fn data_ref(&self, data_ref: &DataRef) -> MaybeShape {
        match data_ref {
            DataRef::Symbol(symbol) => self.symbol(symbol),
            DataRef::Component(component) => self.component(component),
            DataRef::ArrayRef(array_ref) => self.array_ref(array_ref),
            DataRef::CoarrayRef(coarray_ref) => self.coarray_ref(coarray_ref),
        }
    }

    pub fn substring(&self, substring: &Substring) -> MaybeShape {
        match substring.parent() {
            SubstringParent::DataRef(data_ref) => self.data_ref(data_ref),
            SubstringParent::Literal(constant) => Some(self.constant(constant)),
        }
    }

    pub fn designator(&self, designator: &Designator) -> MaybeShape {
        match designator {
            Designator::DataRef(data_ref) => self.data_ref(data_ref),
            Designator::Substring(substring) => self.substring(substring),
        }
    }

    pub fn actual_argument(&self, argument: &ActualArgument) -> MaybeShape {
        self.expr(argument.expr())
    }

    pub fn procedure_ref(&self, call: &ProcedureRef) -> MaybeShape {
        if call.rank() == 0 {
            return Some(scalar_shape());
        }
        if call.is_elemental() {
            return match call.arguments().iter().flatten().find(|a| a.rank() > 0) {
                Some(argument) => self.actual_argument(argument),
                None => Some(scalar_shape()),
            };
        }
        if let Some(symbol) = call.proc().symbol() {
            return self.symbol(symbol);
        }
        let intrinsic = call.proc().specific_intrinsic()?;
        intrinsic_rules::intrinsic_shape(self, intrinsic, call.arguments())
    }

    pub fn array_constructor(&self, constructor: &ArrayConstructor) -> MaybeShape {
        let extent = self.constructor_extent(constructor.values())?;
        Some(alloc::vec![Some(extent)])
    }

    /// Total element count of a list of array constructor values.
    fn constructor_extent(&self, values: &[ArrayConstructorValue]) -> MaybeExtentExpr {
        let mut result = ExtentExpr::Constant(0);
        for value in values {
            let count = match value {
                ArrayConstructorValue::Expr(expr) => get_size(self.expr(expr)?)?,
                ArrayConstructorValue::ImpliedDo(ido) => self.implied_do_extent(ido)?,
            };
            result = match (result.to_i64(), count.to_i64()) {
                (Some(0), _) => count,
                (Some(x), Some(y)) if x.checked_add(y).is_some() => ExtentExpr::Constant(x + y),
                _ => result + count,
            };
            if let Some(context) = self.context {
                result = context.fold(result);
            }
        }
        Some(result)
    }

    /// Loops whose bounds or inner extent depend on another implied-DO
    /// index (triangular nests) have no expressible extent.
    fn implied_do_extent(&self, ido: &ImpliedDo) -> MaybeExtentExpr {
        if ido.lower().contains_implied_do_index()
            || ido.upper().contains_implied_do_index()
            || ido.stride().contains_implied_do_index()
        {
            return None;
        }
        let inner = self.constructor_extent(ido.values())?;
        if inner.contains_implied_do_index() {
            return None;
        }
        let trips = super::count_trips(
            ido.lower().clone(),
            ido.upper().clone(),
            ido.stride().clone(),
        );
        Some(match inner.to_i64() {
            Some(1) => trips,
            _ => inner * trips,
        })
    }
}

/// One extent per dimension of `base`.
pub(super) fn create_shape(rank: usize, base: &NamedEntity) -> Shape {
    (0..rank).map(|dimension| get_extent(base, dimension)).collect()
}

/// Nodes whose shape can be computed.
pub trait ShapeOf {
    fn shape_with(&self, helper: &GetShapeHelper<'_>) -> MaybeShape;
}

macro_rules! shape_of {
    ($ty:ty, $method:ident) => {
        impl ShapeOf for $ty {
            fn shape_with(&self, helper: &GetShapeHelper<'_>) -> MaybeShape {
                helper.$method(self)
            }
        }
    };
}

shape_of!(Expr, expr);
shape_of!(SymbolRef, symbol);
shape_of!(NamedEntity, named_entity);
shape_of!(Component, component);
shape_of!(ArrayRef, array_ref);
shape_of!(CoarrayRef, coarray_ref);
shape_of!(DataRef, data_ref);
shape_of!(Substring, substring);
shape_of!(Designator, designator);
shape_of!(ActualArgument, actual_argument);
shape_of!(ProcedureRef, procedure_ref);
shape_of!(ArrayConstructor, array_constructor);

impl ShapeOf for Constant {
    fn shape_with(&self, helper: &GetShapeHelper<'_>) -> MaybeShape {
        Some(helper.constant(self))
    }
}

impl ShapeOf for ExtentExpr {
    fn shape_with(&self, _helper: &GetShapeHelper<'_>) -> MaybeShape {
        Some(scalar_shape())
    }
}

impl<T: ShapeOf> ShapeOf for Option<T> {
    fn shape_with(&self, helper: &GetShapeHelper<'_>) -> MaybeShape {
        self.as_ref()?.shape_with(helper)
    }
}

/// Shape without folding.
pub fn get_shape<T: ShapeOf + ?Sized>(x: &T) -> MaybeShape {
    x.shape_with(&GetShapeHelper::new(None))
}

/// Shape with every extent folded.
pub fn get_shape_folded<T: ShapeOf + ?Sized>(context: &FoldingContext, x: &T) -> MaybeShape {
    get_shape_with(Some(context), &ShapeOptions::default(), x)
}

pub fn get_shape_with<T: ShapeOf + ?Sized>(
    context: Option<&FoldingContext>,
    options: &ShapeOptions,
    x: &T,
) -> MaybeShape {
    let shape = x.shape_with(&GetShapeHelper::with_options(context, options))?;
    Some(match context {
        Some(context) => context.fold_shape(shape),
        None => shape,
    })
}
