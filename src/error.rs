// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::expr::ConstantSubscripts;

use alloc::string::String;

/// Errors raised while building the expression and symbol model.
///
/// Shape inference itself never fails with an error: an unknown result is
/// reported as `None`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("constant has {values} values but shape {shape:?} requires {expected}")]
    ConstantSizeMismatch {
        values: usize,
        expected: i64,
        shape: ConstantSubscripts,
    },

    #[error("constant shape has negative extent {extent} in dimension {dimension}")]
    NegativeExtent { dimension: usize, extent: i64 },

    #[error("assumed-size bound `*` in dimension {dimension} is not the last dimension")]
    MisplacedAssumedSize { dimension: usize },

    #[error("inconsistent lower bound in dimension {dimension}")]
    InconsistentDeferredBound { dimension: usize },

    #[error("symbol `{name}` is already declared in this scope")]
    DuplicateSymbol { name: String },
}
