// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::borrow::ToOwned;
use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;

use crate::ast::ActualArgument;
use crate::expr::to_i64;
use crate::shape::get_shape;

use super::catalog::IntrinsicConfig;

/// How the rank of a call result follows from its arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultRank {
    Fixed(usize),
    Elemental,
    SameAsArgument(usize),
    Reduction(usize),
    Location(usize),
    VectorUnlessDim(usize),
    Spread,
    Matmul,
    Reshape,
    Transfer,
}

/// How the shape of an array-valued call result is derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeRule {
    /// `[rank(ARRAY)]`: SHAPE, LBOUND, UBOUND without DIM=.
    RankVector,
    /// ARRAY's shape with the DIM= dimension removed.
    Reduction { dim: usize },
    /// Like `Reduction`, but `[rank(ARRAY)]` when DIM= is absent.
    Location { dim: usize },
    SameAsArgument { index: usize },
    Matmul,
    Reshape,
    Pack,
    Spread,
    Transfer,
    Transpose,
    Unknown,
}

#[derive(Clone, Debug)]
pub struct IntrinsicSpec {
    elemental: bool,
    pointer: bool,
    keywords: Box<[String]>,
    required: usize,
    rank: ResultRank,
    shape: ShapeRule,
}

fn argument(arguments: &[Option<ActualArgument>], index: usize) -> Option<&ActualArgument> {
    arguments.get(index).and_then(Option::as_ref)
}

impl IntrinsicSpec {
    pub(super) fn from_config(cfg: &IntrinsicConfig) -> Result<Self, IntrinsicTableError> {
        let keywords: Box<[String]> = cfg.keywords.clone().into_boxed_slice();
        let required = cfg.required.unwrap_or(keywords.len().min(1));
        if required > keywords.len() {
            return Err(IntrinsicTableError::TooManyRequired {
                intrinsic: cfg.name.clone(),
                required,
                available: keywords.len(),
            });
        }

        let spec = IntrinsicSpec {
            elemental: cfg.elemental,
            pointer: cfg.pointer,
            keywords,
            required,
            rank: cfg.rank.into_rank(),
            shape: cfg.shape.into_rule(),
        };
        spec.validate(&cfg.name)?;
        Ok(spec)
    }

    fn validate(&self, name: &str) -> Result<(), IntrinsicTableError> {
        let total = self.keywords.len();
        let invalid = |detail: String| IntrinsicTableError::InvalidRule {
            intrinsic: name.to_owned(),
            detail,
        };

        if self.elemental != matches!(self.rank, ResultRank::Elemental) {
            return Err(invalid(format!(
                "elemental flag is {} but result rank is {:?}",
                self.elemental, self.rank
            )));
        }

        let rank_index = match self.rank {
            ResultRank::SameAsArgument(index)
            | ResultRank::Reduction(index)
            | ResultRank::Location(index)
            | ResultRank::VectorUnlessDim(index) => Some(index),
            _ => None,
        };
        if let Some(index) = rank_index.filter(|index| *index >= total) {
            return Err(invalid(format!(
                "result rank references argument {index} but only {total} arguments defined"
            )));
        }

        let shape_index = match self.shape {
            ShapeRule::Reduction { dim } | ShapeRule::Location { dim } => Some(dim),
            ShapeRule::SameAsArgument { index } => Some(index),
            _ => None,
        };
        if let Some(index) = shape_index.filter(|index| *index >= total) {
            return Err(invalid(format!(
                "shape rule references argument {index} but only {total} arguments defined"
            )));
        }

        Ok(())
    }

    pub fn is_elemental(&self) -> bool {
        self.elemental
    }

    /// Result is a pointer whose shape comes from its arguments (NULL).
    pub fn is_pointer(&self) -> bool {
        self.pointer
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn shape_rule(&self) -> ShapeRule {
        self.shape
    }

    /// Result rank for arguments in dummy argument order.
    pub fn result_rank(&self, arguments: &[Option<ActualArgument>]) -> Option<usize> {
        let rank_of = |index: usize| argument(arguments, index).map(ActualArgument::rank);
        let has = |index: usize| argument(arguments, index).is_some();
        match self.rank {
            ResultRank::Fixed(rank) => Some(rank),
            ResultRank::Elemental => Some(
                arguments
                    .iter()
                    .flatten()
                    .map(ActualArgument::rank)
                    .max()
                    .unwrap_or(0),
            ),
            ResultRank::SameAsArgument(index) => Some(rank_of(index).unwrap_or(0)),
            ResultRank::Reduction(dim) => match has(dim) {
                true => rank_of(0)?.checked_sub(1),
                false => Some(0),
            },
            ResultRank::Location(dim) => match has(dim) {
                true => rank_of(0)?.checked_sub(1),
                false => Some(1),
            },
            ResultRank::VectorUnlessDim(dim) => Some(if has(dim) { 0 } else { 1 }),
            ResultRank::Spread => Some(rank_of(0)? + 1),
            ResultRank::Matmul => (rank_of(0)? + rank_of(1)?).checked_sub(2),
            ResultRank::Reshape => {
                let shape = get_shape(argument(arguments, 1)?.expr())?;
                match shape.as_slice() {
                    [extent] => usize::try_from(to_i64(extent)?).ok(),
                    _ => None,
                }
            }
            ResultRank::Transfer => match (has(2), rank_of(1)?) {
                (false, 0) => Some(0),
                _ => Some(1),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IntrinsicTableError {
    #[error("failed to parse intrinsic table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate intrinsic entry `{0}` in table")]
    DuplicateIntrinsic(String),

    #[error("intrinsic `{intrinsic}` requires {required} arguments but declares only {available}")]
    TooManyRequired {
        intrinsic: String,
        required: usize,
        available: usize,
    },

    #[error("intrinsic `{intrinsic}` has invalid rule: {detail}")]
    InvalidRule { intrinsic: String, detail: String },
}
