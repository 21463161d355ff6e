//! Possible worlds (C3): interpretables, a compact bitset world
//! representation, and the iterative-doubling world generator.
//!
//! The bitset mirrors the teacher's `DynTruthTable` word-packing
//! (`services/truth_table.rs`): bits packed into `Vec<u64>` words instead of
//! `Vec<bool>`, so a world set with a couple dozen interpretables stays a
//! few megabytes instead of blowing up a byte per bit.

use crate::error::CapacityError;
use crate::formula::{Constant, KnowledgeBase, RelationalAtom, Term};
use std::collections::HashMap;
use std::rc::Rc;

/// Above this many interpretables, `2^n` worlds is no longer a reasonable
/// thing to materialize in memory. Keeps the in-process demo usable; a host
/// embedding this engine for larger signatures would need a symbolic
/// representation instead.
pub const MAX_INTERPRETABLES: usize = 24;

fn words_for(len: usize) -> usize {
    (len + 63) / 64
}

/// A total boolean assignment over a fixed, ordered set of ground atoms.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct World {
    words: Vec<u64>,
    len: usize,
}

impl World {
    pub fn zeros(len: usize) -> Self {
        Self { words: vec![0u64; words_for(len)], len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    pub fn set(&mut self, index: usize, value: bool) {
        debug_assert!(index < self.len);
        let word = &mut self.words[index / 64];
        if value {
            *word |= 1u64 << (index % 64);
        } else {
            *word &= !(1u64 << (index % 64));
        }
    }

    pub fn bits(&self) -> Vec<bool> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

/// The ordered set of ground atoms that distinguish possible worlds.
/// Order is: predicates in signature order, and for a unary predicate, one
/// atom per domain constant in domain order.
#[derive(Debug, Clone)]
pub struct Interpretables {
    atoms: Vec<RelationalAtom>,
    index: HashMap<RelationalAtom, usize>,
}

impl Interpretables {
    pub fn from_kb(kb: &KnowledgeBase) -> Self {
        let mut atoms = Vec::new();
        for predicate in &kb.predicates {
            if predicate.arity == 0 {
                atoms.push(RelationalAtom::nullary(predicate.clone()));
            } else {
                for constant in &kb.domain {
                    atoms.push(RelationalAtom::unary(predicate.clone(), Term::Const(constant.clone())));
                }
            }
        }
        let index = atoms.iter().cloned().enumerate().map(|(i, a)| (a, i)).collect();
        Self { atoms, index }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[RelationalAtom] {
        &self.atoms
    }

    pub fn position(&self, atom: &RelationalAtom) -> Option<usize> {
        self.index.get(atom).copied()
    }
}

/// The full set of possible worlds over a knowledge base's signature.
pub struct WorldSet {
    pub interpretables: Rc<Interpretables>,
    pub worlds: Vec<World>,
}

impl WorldSet {
    /// Generate all `2^n` worlds by iterative doubling: start from the
    /// single empty-length world and, for each interpretable in turn,
    /// double the frontier by appending both truth values.
    pub fn build(kb: &KnowledgeBase) -> Result<WorldSet, CapacityError> {
        let interpretables = Interpretables::from_kb(kb);
        let n = interpretables.len();
        if n > MAX_INTERPRETABLES {
            return Err(CapacityError { interpretable_count: n, limit: MAX_INTERPRETABLES });
        }
        let mut worlds = vec![World::zeros(0)];
        for i in 0..n {
            let mut next = Vec::with_capacity(worlds.len() * 2);
            for w in &worlds {
                let mut w0 = World::zeros(i + 1);
                for j in 0..i {
                    w0.set(j, w.get(j));
                }
                w0.set(i, false);
                let mut w1 = w0.clone();
                w1.set(i, true);
                next.push(w0);
                next.push(w1);
            }
            worlds = next;
        }
        Ok(WorldSet { interpretables: Rc::new(interpretables), worlds })
    }

    pub fn len(&self) -> usize {
        self.worlds.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Predicate;

    fn kb_with(predicates: Vec<Predicate>, domain: Vec<&str>) -> KnowledgeBase {
        KnowledgeBase {
            predicates,
            domain: domain.into_iter().map(|s| Constant(s.to_string())).collect(),
            conditionals: vec![],
            facts: vec![],
        }
    }

    #[test]
    fn world_count_is_two_to_the_number_of_interpretables() {
        let kb = kb_with(vec![Predicate::new("B", 1), Predicate::new("F", 1)], vec!["tweety", "polly"]);
        let ws = WorldSet::build(&kb).unwrap();
        assert_eq!(ws.interpretables.len(), 4);
        assert_eq!(ws.len(), 16);
    }

    #[test]
    fn all_worlds_are_distinct() {
        let kb = kb_with(vec![Predicate::new("Q", 0), Predicate::new("P", 1)], vec!["a", "b"]);
        let ws = WorldSet::build(&kb).unwrap();
        let mut seen = std::collections::HashSet::new();
        for w in &ws.worlds {
            assert!(seen.insert(w.bits()), "duplicate world generated");
        }
        assert_eq!(seen.len(), ws.len());
    }

    #[test]
    fn propositional_kb_still_generates_the_nullary_worlds() {
        let kb = kb_with(vec![Predicate::new("P", 0), Predicate::new("Q", 0)], vec![]);
        let ws = WorldSet::build(&kb).unwrap();
        assert_eq!(ws.len(), 4);
    }

    #[test]
    fn capacity_error_when_signature_too_large() {
        let predicates = (0..30).map(|i| Predicate::new(format!("P{i}"), 0)).collect();
        let kb = kb_with(predicates, vec![]);
        assert!(WorldSet::build(&kb).is_err());
    }
}
