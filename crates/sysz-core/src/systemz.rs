//! The System-Z-like constructor (C8): turns a validated tolerance pair
//! into a ranking function.

use crate::formula::KnowledgeBase;
use crate::rank::{Rank, RankingFunction};
use crate::tolerance::{ConstIndex, TolerancePair};
use crate::validator::validate_tolerance_pair;
use crate::world::{World, WorldSet};
use std::rc::Rc;

fn candidates_for(kb: &KnowledgeBase, constants: &std::collections::BTreeSet<ConstIndex>) -> Vec<Option<ConstIndex>> {
    if kb.domain.is_empty() {
        vec![None]
    } else {
        constants.iter().copied().map(Some).collect()
    }
}

/// λ(i, w): scanning from the highest subset index down to `0`, the index
/// of the first (highest) subset containing a conditional that falsifies
/// `w` when grounded by a constant from `Dᵢ`, plus one; `0` if none do.
fn lambda(kb: &KnowledgeBase, worlds: &WorldSet, pair: &TolerancePair, i: usize, w: &World) -> u64 {
    let candidates_i = candidates_for(kb, &pair.blocks[i].constants);
    for j in (0..pair.blocks.len()).rev() {
        for &cond_idx in &pair.blocks[j].conditionals {
            let cond = &kb.conditionals[cond_idx];
            for &a in &candidates_i {
                let grounded = match (cond.free_variable(), a) {
                    (Some(var), Some(idx)) => crate::grounding::ground_conditional(cond, &var, &kb.domain[idx]),
                    _ => cond.clone(),
                };
                if crate::satisfaction::satisfies(w, &worlds.interpretables, &kb.domain, &grounded.falsification()) {
                    return (j + 1) as u64;
                }
            }
        }
    }
    0
}

/// κ(w) = Σᵢ (m+2)^i · λ(i, w), for worlds satisfying every fact; other
/// worlds get ∞. Finally normalized by subtracting the global minimum
/// finite rank so the ranking is grounded at 0.
pub fn build_ranking(kb: &KnowledgeBase, worlds: Rc<WorldSet>, pair: &TolerancePair) -> Option<RankingFunction> {
    validate_tolerance_pair(kb, &worlds, pair)?;
    let m = pair.highest_index();
    let base = (m as u64) + 2;

    let mut raw: Vec<Option<u64>> = Vec::with_capacity(worlds.worlds.len());
    for w in &worlds.worlds {
        if !crate::satisfaction::satisfies_all(w, &worlds.interpretables, &kb.domain, &kb.facts) {
            raw.push(None);
            continue;
        }
        let mut total: u64 = 0;
        for i in 0..=m {
            total += base.pow(i as u32) * lambda(kb, &worlds, pair, i, w);
        }
        raw.push(Some(total));
    }

    let min_finite = raw.iter().filter_map(|r| *r).min()?;
    let ranks: Vec<Rank> = raw
        .into_iter()
        .map(|r| match r {
            None => Rank::INFINITY,
            Some(v) => Rank::finite((v - min_finite) as u32),
        })
        .collect();
    Some(RankingFunction { world_set: worlds, ranks })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Conditional, Constant, Formula, Literal, Predicate, RelationalAtom, Term, Variable};
    use crate::search::search_all;
    use crate::tolerance::PartitionBlock;

    fn penguin_kb() -> KnowledgeBase {
        let x = Variable("X".to_string());
        let bird = Predicate::new("B", 1);
        let flies = Predicate::new("F", 1);
        let penguin = Predicate::new("P", 1);
        let b = Formula::Atom(RelationalAtom::unary(bird.clone(), Term::Var(x.clone())));
        let f = Formula::Atom(RelationalAtom::unary(flies.clone(), Term::Var(x.clone())));
        let p = Formula::Atom(RelationalAtom::unary(penguin.clone(), Term::Var(x.clone())));
        KnowledgeBase {
            predicates: vec![bird, flies, penguin],
            domain: vec![Constant("tweety".to_string()), Constant("opus".to_string())],
            conditionals: vec![
                Conditional::new(f.clone(), b.clone()),
                Conditional::new(
                    Formula::Literal(Literal::negative(RelationalAtom::unary(
                        Predicate::new("F", 1),
                        Term::Var(x.clone()),
                    ))),
                    p.clone(),
                ),
                Conditional::new(b, p),
            ],
            facts: vec![],
        }
    }

    #[test]
    fn ranking_is_normalized_to_a_zero_minimum() {
        let kb = penguin_kb();
        let worlds = Rc::new(WorldSet::build(&kb).unwrap());
        let mut noop = |_: f64| true;
        let pairs = search_all(&kb, &worlds, &mut noop);
        if let Some((pair, _)) = pairs.first() {
            let ranking = build_ranking(&kb, Rc::clone(&worlds), pair).expect("validated pair must build");
            assert!(ranking.ranks.iter().any(|r| r.0 == 0));
        }
    }

    #[test]
    fn invalid_pair_yields_no_ranking() {
        let kb = penguin_kb();
        let worlds = Rc::new(WorldSet::build(&kb).unwrap());
        let empty_pair = TolerancePair { blocks: vec![PartitionBlock::default()] };
        assert!(build_ranking(&kb, worlds, &empty_pair).is_none());
    }
}
