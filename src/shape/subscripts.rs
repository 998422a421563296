// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::expr::ConstantSubscripts;

/// Advances 1-based `indices` to the next element in column-major order.
///
/// Returns `false` once every element has been visited, or immediately if
/// any extent is empty. Only the first `indices.len()` extents are used.
pub fn increment_subscripts(indices: &mut [i64], extents: &[i64]) -> bool {
    let rank = indices.len();
    assert!(
        rank <= extents.len(),
        "{rank} subscripts for {} extents",
        extents.len()
    );
    if extents[..rank].iter().any(|extent| *extent < 1) {
        return false;
    }
    for (index, extent) in indices.iter_mut().zip(extents) {
        if *index < *extent {
            *index += 1;
            return true;
        }
        *index = 1;
    }
    false
}

/// Every subscript of an array with the given extents, in array element
/// order.
#[derive(Debug, Clone)]
pub struct SubscriptIter {
    extents: ConstantSubscripts,
    next: Option<ConstantSubscripts>,
}

impl SubscriptIter {
    pub fn new(extents: ConstantSubscripts) -> Self {
        let next = match extents.iter().any(|extent| *extent < 1) {
            true => None,
            false => Some(alloc::vec![1; extents.len()]),
        };
        SubscriptIter { extents, next }
    }
}

impl Iterator for SubscriptIter {
    type Item = ConstantSubscripts;

    fn next(&mut self) -> Option<ConstantSubscripts> {
        let current = self.next.take()?;
        let mut advanced = current.clone();
        if increment_subscripts(&mut advanced, &self.extents) {
            self.next = Some(advanced);
        }
        Some(current)
    }
}
