// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Intrinsic procedure catalog and call resolution.
//!
//! The catalog is data driven: `intrinsics.json` describes each intrinsic's
//! dummy argument keywords, how its result rank is computed, and which rule
//! derives the shape of an array-valued result.

mod catalog;
mod spec;
mod table;

pub use spec::{IntrinsicSpec, IntrinsicTableError, ResultRank, ShapeRule};
pub use table::{lookup, override_intrinsic_table, reset_intrinsic_table};

use crate::ast::{ActualArgument, ProcedureDesignator, ProcedureRef, SpecificIntrinsic};
use crate::fold::FoldingContext;

use alloc::vec;
use alloc::vec::Vec;

/// A resolved call to a specific intrinsic, arguments in dummy order.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecificCall {
    pub intrinsic: SpecificIntrinsic,
    pub arguments: Vec<Option<ActualArgument>>,
}

impl SpecificCall {
    pub fn into_procedure_ref(self) -> ProcedureRef {
        ProcedureRef::new(ProcedureDesignator::Intrinsic(self.intrinsic), self.arguments)
    }
}

/// Resolves a generic intrinsic name against actual arguments.
pub trait IntrinsicProber {
    fn probe(
        &self,
        name: &str,
        arguments: &[Option<ActualArgument>],
        context: &FoldingContext,
    ) -> Option<SpecificCall>;
}

/// Prober backed by the active intrinsic table.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardIntrinsics;

impl StandardIntrinsics {
    pub fn resolve(
        &self,
        name: &str,
        arguments: &[Option<ActualArgument>],
    ) -> Option<SpecificCall> {
        let spec = match lookup(name) {
            Some(spec) => spec,
            None => {
                tracing::debug!(name, "no intrinsic with this name");
                return None;
            }
        };

        let arguments = match normalize_arguments(&spec, arguments) {
            Some(arguments) => arguments,
            None => {
                tracing::debug!(name, "arguments do not match intrinsic keywords");
                return None;
            }
        };

        let missing = (0..spec.required()).any(|j| !matches!(arguments.get(j), Some(Some(_))));
        if missing {
            tracing::debug!(name, required = spec.required(), "missing required argument");
            return None;
        }

        let rank = spec.result_rank(&arguments)?;
        let intrinsic = SpecificIntrinsic::new(&name.to_ascii_lowercase(), rank)
            .elemental(spec.is_elemental())
            .null_pointer(spec.is_pointer());
        Some(SpecificCall {
            intrinsic,
            arguments,
        })
    }

    /// Resolves and builds the call expression in one step.
    pub fn call(&self, name: &str, arguments: &[Option<ActualArgument>]) -> Option<ProcedureRef> {
        self.resolve(name, arguments)
            .map(SpecificCall::into_procedure_ref)
    }
}

impl IntrinsicProber for StandardIntrinsics {
    fn probe(
        &self,
        name: &str,
        arguments: &[Option<ActualArgument>],
        _context: &FoldingContext,
    ) -> Option<SpecificCall> {
        self.resolve(name, arguments)
    }
}

/// Places keyword arguments at their dummy positions; the result has one
/// slot per dummy argument.
fn normalize_arguments(
    spec: &IntrinsicSpec,
    arguments: &[Option<ActualArgument>],
) -> Option<Vec<Option<ActualArgument>>> {
    let keywords = spec.keywords();
    let mut result: Vec<Option<ActualArgument>> = vec![None; keywords.len()];
    for (position, argument) in arguments.iter().enumerate() {
        let argument = match argument {
            Some(argument) => argument,
            None => continue,
        };
        let index = match argument.keyword() {
            Some(keyword) => keywords
                .iter()
                .position(|k| k.eq_ignore_ascii_case(keyword))?,
            None => position,
        };
        let slot = result.get_mut(index)?;
        if slot.is_some() {
            return None;
        }
        *slot = Some(argument.clone());
    }
    Some(result)
}
