// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::expr::{to_i64, MaybeExtentExpr};
use crate::messages::Messages;

use alloc::format;
use core::ops;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckConformanceFlags(u8);

impl CheckConformanceFlags {
    pub const NONE: Self = CheckConformanceFlags(0);
    pub const LEFT_SCALAR_EXPANDABLE: Self = CheckConformanceFlags(1);
    pub const RIGHT_SCALAR_EXPANDABLE: Self = CheckConformanceFlags(2);
    pub const LEFT_IS_DEFERRED_SHAPE: Self = CheckConformanceFlags(4);
    pub const RIGHT_IS_DEFERRED_SHAPE: Self = CheckConformanceFlags(8);
    pub const EITHER_SCALAR_EXPANDABLE: Self = CheckConformanceFlags(1 | 2);
    pub const BOTH_DEFERRED_SHAPE: Self = CheckConformanceFlags(4 | 8);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl ops::BitOr for CheckConformanceFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        CheckConformanceFlags(self.0 | rhs.0)
    }
}

impl ops::BitOrAssign for CheckConformanceFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Checks that two shapes conform.
///
/// `Some(true)` means they are known to conform, `Some(false)` means they
/// do not (and an error was reported), `None` means conformance cannot be
/// decided at compile time.
pub fn check_conformance(
    messages: &mut Messages,
    left: &[MaybeExtentExpr],
    right: &[MaybeExtentExpr],
    flags: CheckConformanceFlags,
    left_is: &str,
    right_is: &str,
) -> Option<bool> {
    let n = left.len();
    if n == 0 && flags.contains(CheckConformanceFlags::LEFT_SCALAR_EXPANDABLE) {
        return Some(true);
    }
    let rn = right.len();
    if rn == 0 && flags.contains(CheckConformanceFlags::RIGHT_SCALAR_EXPANDABLE) {
        return Some(true);
    }
    if n != rn {
        tracing::debug!(left = n, right = rn, "rank mismatch");
        messages.error(format!(
            "Rank of {left_is} is {n}, but {right_is} has rank {rn}"
        ));
        return Some(false);
    }
    for (j, (l, r)) in left.iter().zip(right).enumerate() {
        match (to_i64(l), to_i64(r)) {
            (Some(x), Some(y)) if x != y => {
                messages.error(format!(
                    "Dimension {} of {left_is} has extent {x}, but {right_is} has extent {y}",
                    j + 1
                ));
                return Some(false);
            }
            (Some(_), Some(_)) => {}
            (Some(_), None) => {
                if !flags.contains(CheckConformanceFlags::RIGHT_IS_DEFERRED_SHAPE) {
                    return None;
                }
            }
            // An unknown left extent is judged by the left flag alone.
            (None, _) => {
                if !flags.contains(CheckConformanceFlags::LEFT_IS_DEFERRED_SHAPE) {
                    return None;
                }
            }
        }
    }
    Some(true)
}
