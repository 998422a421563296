// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::string::String;
use alloc::vec::Vec;

use serde::Deserialize;

use super::spec::{ResultRank, ShapeRule};

#[derive(Debug, Deserialize, Default)]
pub(super) struct IntrinsicCatalog {
    #[serde(default)]
    pub(super) intrinsics: Vec<IntrinsicConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub(super) struct IntrinsicConfig {
    pub(super) name: String,
    #[serde(default)]
    pub(super) elemental: bool,
    #[serde(default)]
    pub(super) pointer: bool,
    #[serde(default)]
    pub(super) keywords: Vec<String>,
    #[serde(default)]
    pub(super) required: Option<usize>,
    #[serde(default)]
    pub(super) rank: RankConfig,
    #[serde(default)]
    pub(super) shape: ShapeConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(super) enum RankConfig {
    #[default]
    Scalar,
    Elemental,
    Fixed {
        rank: usize,
    },
    SameAsArgument {
        index: usize,
    },
    /// Rank of ARRAY minus one with DIM=, scalar without.
    Reduction {
        dim: usize,
    },
    /// Rank of ARRAY minus one with DIM=, vector without.
    Location {
        dim: usize,
    },
    /// Scalar with DIM=, vector without.
    VectorUnlessDim {
        dim: usize,
    },
    Spread,
    Matmul,
    Reshape,
    Transfer,
}

impl RankConfig {
    pub(super) fn into_rank(self) -> ResultRank {
        match self {
            RankConfig::Scalar => ResultRank::Fixed(0),
            RankConfig::Elemental => ResultRank::Elemental,
            RankConfig::Fixed { rank } => ResultRank::Fixed(rank),
            RankConfig::SameAsArgument { index } => ResultRank::SameAsArgument(index),
            RankConfig::Reduction { dim } => ResultRank::Reduction(dim),
            RankConfig::Location { dim } => ResultRank::Location(dim),
            RankConfig::VectorUnlessDim { dim } => ResultRank::VectorUnlessDim(dim),
            RankConfig::Spread => ResultRank::Spread,
            RankConfig::Matmul => ResultRank::Matmul,
            RankConfig::Reshape => ResultRank::Reshape,
            RankConfig::Transfer => ResultRank::Transfer,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(super) enum ShapeConfig {
    #[default]
    Unknown,
    RankVector,
    Reduction {
        dim: usize,
    },
    Location {
        dim: usize,
    },
    SameAsArgument {
        index: usize,
    },
    Matmul,
    Reshape,
    Pack,
    Spread,
    Transfer,
    Transpose,
}

impl ShapeConfig {
    pub(super) fn into_rule(self) -> ShapeRule {
        match self {
            ShapeConfig::Unknown => ShapeRule::Unknown,
            ShapeConfig::RankVector => ShapeRule::RankVector,
            ShapeConfig::Reduction { dim } => ShapeRule::Reduction { dim },
            ShapeConfig::Location { dim } => ShapeRule::Location { dim },
            ShapeConfig::SameAsArgument { index } => ShapeRule::SameAsArgument { index },
            ShapeConfig::Matmul => ShapeRule::Matmul,
            ShapeConfig::Reshape => ShapeRule::Reshape,
            ShapeConfig::Pack => ShapeRule::Pack,
            ShapeConfig::Spread => ShapeRule::Spread,
            ShapeConfig::Transfer => ShapeRule::Transfer,
            ShapeConfig::Transpose => ShapeRule::Transpose,
        }
    }
}
