//! Tolerance pairs (C6): ordered bipartitions of conditionals and constants
//! into subsets `(R_0, D_0), ..., (R_m, D_m)`, plus the §4.7.4 ordering used
//! to prefer pairs with fewer, larger subsets.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub type CondIndex = usize;
pub type ConstIndex = usize;

/// One subset `(R_i, D_i)` of a tolerance pair. Stored as `BTreeSet`s so the
/// whole `TolerancePair` has a canonical, hashable form regardless of the
/// order items were inserted in during search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PartitionBlock {
    pub conditionals: BTreeSet<CondIndex>,
    pub constants: BTreeSet<ConstIndex>,
}

impl PartitionBlock {
    pub fn is_empty(&self) -> bool {
        self.conditionals.is_empty()
    }
}

/// An ordered bipartition `(R_0, D_0), ..., (R_m, D_m)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TolerancePair {
    pub blocks: Vec<PartitionBlock>,
}

impl TolerancePair {
    pub fn highest_index(&self) -> usize {
        self.blocks.len() - 1
    }

    /// The §4.7.4 ordering: fewer subsets is smaller; among pairs with the
    /// same subset count, larger `R_i`/`D_i` at the first differing index
    /// is smaller. Used both to rank final results and to prune partial
    /// search nodes.
    pub fn compare(&self, other: &TolerancePair) -> Ordering {
        match self.blocks.len().cmp(&other.blocks.len()) {
            Ordering::Equal => {}
            ord => return ord,
        }
        for (a, b) in self.blocks.iter().zip(other.blocks.iter()) {
            match b.conditionals.len().cmp(&a.conditionals.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
            match b.constants.len().cmp(&a.constants.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Comparison ignoring each pair's trailing (still-open) subset, used by
    /// the backtracking search to order sibling partial nodes before the
    /// partition is complete.
    pub fn compare_partial(&self, other: &TolerancePair) -> Ordering {
        let a_len = self.blocks.len().saturating_sub(1);
        let b_len = other.blocks.len().saturating_sub(1);
        match a_len.cmp(&b_len) {
            Ordering::Equal => {}
            ord => return ord,
        }
        for (a, b) in self.blocks[..a_len].iter().zip(other.blocks[..b_len].iter()) {
            match b.conditionals.len().cmp(&a.conditionals.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
            match b.constants.len().cmp(&a.constants.len()) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

/// A witness that a single conditional tolerates its subset: the world and
/// (for open conditionals) the constant that verify it without being
/// falsified by anything in a later-or-equal subset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Witness {
    pub conditional: CondIndex,
    pub subset: usize,
    pub constant: Option<ConstIndex>,
    pub world: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(r: &[usize], d: &[usize]) -> PartitionBlock {
        PartitionBlock { conditionals: r.iter().copied().collect(), constants: d.iter().copied().collect() }
    }

    #[test]
    fn fewer_subsets_sorts_smaller() {
        let p1 = TolerancePair { blocks: vec![block(&[0, 1], &[0])] };
        let p2 = TolerancePair { blocks: vec![block(&[0], &[0]), block(&[1], &[])] };
        assert_eq!(p1.compare(&p2), Ordering::Less);
    }

    #[test]
    fn larger_subset_at_first_index_sorts_smaller() {
        let p1 = TolerancePair { blocks: vec![block(&[0, 1], &[]), block(&[2], &[])] };
        let p2 = TolerancePair { blocks: vec![block(&[0], &[]), block(&[1, 2], &[])] };
        assert_eq!(p1.compare(&p2), Ordering::Less);
    }
}
