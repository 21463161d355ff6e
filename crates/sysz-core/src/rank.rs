//! Rank function and acceptance (C5): κ on worlds, formulas and
//! conditionals, ground and open, plus representatives/weak-representatives
//! for first-order acceptance (§4.5.1).
//!
//! Explanation is threaded rather than duplicated: every public query here
//! takes `explain: bool` and always returns `(value, Option<ExplanationNode>)`.
//! When `explain` is `false` the second element is always `None` and no
//! extra allocation happens beyond an `Option` tag.

use crate::explain::ExplanationNode;
use crate::formula::{Conditional, Constant, Formula, KnowledgeBase};
use crate::grounding::{ground_conditional, ground_formula};
use crate::satisfaction::{satisfies, satisfies_all};
use crate::world::WorldSet;
use std::rc::Rc;

/// A rank in ℕ ∪ {∞}, with ∞ realized as `u32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rank(pub u32);

impl Rank {
    pub const INFINITY: Rank = Rank(u32::MAX);

    pub fn finite(value: u32) -> Self {
        debug_assert!(value != u32::MAX, "u32::MAX is reserved for infinity");
        Rank(value)
    }

    pub fn is_infinite(self) -> bool {
        self.0 == u32::MAX
    }

    pub fn as_finite(self) -> Option<u32> {
        if self.is_infinite() {
            None
        } else {
            Some(self.0)
        }
    }

    pub fn display(self) -> String {
        if self.is_infinite() {
            "inf".to_string()
        } else {
            self.0.to_string()
        }
    }
}

/// κ restricted to a fixed, already-constructed set of world ranks.
#[derive(Debug, Clone)]
pub struct RankingFunction {
    pub world_set: Rc<WorldSet>,
    pub ranks: Vec<Rank>,
}

impl RankingFunction {
    pub fn rank_of_world(&self, index: usize) -> Rank {
        self.ranks[index]
    }
}

/// κ(F) over worlds satisfying the (ground) formula `F`: the minimum rank
/// among them, or ∞ if none satisfy it.
pub fn rank_of_ground_formula(
    kb: &KnowledgeBase,
    ranking: &RankingFunction,
    formula: &Formula,
    explain: bool,
) -> (Rank, Option<ExplanationNode>) {
    let interpretables = &ranking.world_set.interpretables;
    let mut best = Rank::INFINITY;
    let mut children = Vec::new();
    for (i, w) in ranking.world_set.worlds.iter().enumerate() {
        if satisfies(w, interpretables, &kb.domain, formula) {
            let r = ranking.ranks[i];
            if explain {
                children.push(ExplanationNode::leaf(format!("world #{i} satisfies it, κ={}", r.display())));
            }
            if r < best {
                best = r;
            }
        }
    }
    let node = explain.then(|| ExplanationNode::new(format!("κ(ground formula) = {}", best.display()), children));
    (best, node)
}

/// κ(F) for a possibly-open formula: minimum over `κ` of every ground
/// instance obtained by substituting each domain constant for the free
/// variable. Falls back to `rank_of_ground_formula` when `F` is ground.
pub fn rank_of_formula(
    kb: &KnowledgeBase,
    ranking: &RankingFunction,
    formula: &Formula,
    explain: bool,
) -> (Rank, Option<ExplanationNode>) {
    match formula.free_variable() {
        None => rank_of_ground_formula(kb, ranking, formula, explain),
        Some(var) => {
            let mut best = Rank::INFINITY;
            let mut children = Vec::new();
            for c in &kb.domain {
                let grounded = ground_formula(formula, &var, c);
                let (r, child) = rank_of_ground_formula(kb, ranking, &grounded, explain);
                if explain {
                    children.push(ExplanationNode::new(
                        format!("instantiate {} := {}, κ={}", var.0, c.0, r.display()),
                        child.into_iter().collect(),
                    ));
                }
                if r < best {
                    best = r;
                }
            }
            let node = explain
                .then(|| ExplanationNode::new(format!("κ(open formula) = min over domain = {}", best.display()), children));
            (best, node)
        }
    }
}

/// κ of a ground conditional: κ(A ∧ B) − κ(A), or ∞ when A ∧ B is
/// unsatisfiable.
pub fn rank_of_ground_conditional(
    kb: &KnowledgeBase,
    ranking: &RankingFunction,
    cond: &Conditional,
    explain: bool,
) -> (Rank, Option<ExplanationNode>) {
    let (rank_ab, child_ab) = rank_of_ground_formula(kb, ranking, &cond.verification(), explain);
    if rank_ab.is_infinite() {
        let node = explain.then(|| {
            ExplanationNode::new("verification unsatisfiable, κ(conditional) = inf".to_string(), child_ab.into_iter().collect())
        });
        return (Rank::INFINITY, node);
    }
    let (rank_a, child_a) = rank_of_ground_formula(kb, ranking, &cond.antecedent, explain);
    debug_assert!(!rank_a.is_infinite(), "A is satisfiable whenever A ∧ B is");
    let result = Rank::finite(rank_ab.0 - rank_a.0);
    let node = explain.then(|| {
        ExplanationNode::new(
            format!("κ(A∧B)={} − κ(A)={} = {}", rank_ab.display(), rank_a.display(), result.display()),
            child_ab.into_iter().chain(child_a).collect(),
        )
    });
    (result, node)
}

/// κ of a possibly-open conditional: minimum κ over every ground instance.
pub fn rank_of_conditional(
    kb: &KnowledgeBase,
    ranking: &RankingFunction,
    cond: &Conditional,
    explain: bool,
) -> (Rank, Option<ExplanationNode>) {
    match cond.free_variable() {
        None => rank_of_ground_conditional(kb, ranking, cond, explain),
        Some(var) => {
            let mut best = Rank::INFINITY;
            let mut children = Vec::new();
            for c in &kb.domain {
                let grounded = ground_conditional(cond, &var, c);
                let (r, child) = rank_of_ground_conditional(kb, ranking, &grounded, explain);
                if explain {
                    children.push(ExplanationNode::new(
                        format!("instantiate {} := {}, κ={}", var.0, c.0, r.display()),
                        child.into_iter().collect(),
                    ));
                }
                if r < best {
                    best = r;
                }
            }
            (best, explain.then(|| ExplanationNode::new(format!("κ(open conditional) = {}", best.display()), children)))
        }
    }
}

/// Acc-0: a ground formula is accepted iff every rank-0 world satisfies it.
pub fn accepts_formula(kb: &KnowledgeBase, ranking: &RankingFunction, formula: &Formula) -> bool {
    let interpretables = &ranking.world_set.interpretables;
    ranking
        .world_set
        .worlds
        .iter()
        .enumerate()
        .filter(|(i, _)| ranking.ranks[*i].0 == 0)
        .all(|(_, w)| satisfies(w, interpretables, &kb.domain, formula))
}

/// Acceptance of a ground conditional: κ(A∧B) < κ(A∧¬B).
pub fn accepts_ground_conditional(kb: &KnowledgeBase, ranking: &RankingFunction, cond: &Conditional) -> bool {
    let (verified, _) = rank_of_ground_formula(kb, ranking, &cond.verification(), false);
    let (falsified, _) = rank_of_ground_formula(kb, ranking, &cond.falsification(), false);
    verified < falsified
}

/// Weak representatives of an open conditional (§4.5.1): constants `a` such
/// that grounding by `a` both attains the open verification rank and the
/// grounded conditional is accepted.
pub fn weak_representatives(kb: &KnowledgeBase, ranking: &RankingFunction, cond: &Conditional) -> Vec<Constant> {
    let var = match cond.free_variable() {
        Some(v) => v,
        None => return Vec::new(),
    };
    let (open_rank_ab, _) = rank_of_formula(kb, ranking, &cond.verification(), false);
    kb.domain
        .iter()
        .filter(|a| {
            let grounded = ground_conditional(cond, &var, a);
            let (rank_ab_a, _) = rank_of_ground_formula(kb, ranking, &grounded.verification(), false);
            rank_ab_a == open_rank_ab && accepts_ground_conditional(kb, ranking, &grounded)
        })
        .cloned()
        .collect()
}

/// Representatives (§4.5.1): the weak representatives with minimal
/// falsification rank. Equal to the weak representatives when there are 0
/// or 1 of them.
pub fn representatives(kb: &KnowledgeBase, ranking: &RankingFunction, cond: &Conditional) -> Vec<Constant> {
    let weak = weak_representatives(kb, ranking, cond);
    if weak.len() <= 1 {
        return weak;
    }
    let var = cond.free_variable().expect("weak representatives implies an open conditional");
    let scored: Vec<(Constant, Rank)> = weak
        .into_iter()
        .map(|a| {
            let grounded = ground_conditional(cond, &var, &a);
            let (r, _) = rank_of_ground_formula(kb, ranking, &grounded.falsification(), false);
            (a, r)
        })
        .collect();
    let best = scored.iter().map(|(_, r)| *r).min().unwrap();
    scored.into_iter().filter(|(_, r)| *r == best).map(|(a, _)| a).collect()
}

/// Acceptance of an open conditional (§4.5): falls back to ground
/// acceptance for a ground conditional.
pub fn accepts_conditional(kb: &KnowledgeBase, ranking: &RankingFunction, cond: &Conditional) -> bool {
    let var = match cond.free_variable() {
        Some(v) => v,
        None => return accepts_ground_conditional(kb, ranking, cond),
    };
    let rep = representatives(kb, ranking, cond);
    if rep.is_empty() {
        return false;
    }
    let cond_bar = cond.negate_consequent();
    let rep_bar = representatives(kb, ranking, &cond_bar);

    let (open_ab, _) = rank_of_formula(kb, ranking, &cond.verification(), false);
    let (open_anb, _) = rank_of_formula(kb, ranking, &cond.falsification(), false);
    if open_ab < open_anb {
        return true;
    }
    if open_ab != open_anb {
        return false;
    }
    for c1 in &rep {
        for c2 in &rep_bar {
            let ground_bar_by_c1 = ground_conditional(&cond_bar, &var, c1);
            let ground_by_c2 = ground_conditional(cond, &var, c2);
            let (r1, _) = rank_of_ground_formula(kb, ranking, &ground_bar_by_c1.verification(), false);
            let (r2, _) = rank_of_ground_formula(kb, ranking, &ground_by_c2.verification(), false);
            if !(r1 < r2) {
                return false;
            }
        }
    }
    true
}

/// A ranking function accepts the whole knowledge base iff every finite-rank
/// world satisfies the facts and every conditional is accepted.
pub fn accepts_kb(kb: &KnowledgeBase, ranking: &RankingFunction) -> bool {
    let interpretables = &ranking.world_set.interpretables;
    for (i, w) in ranking.world_set.worlds.iter().enumerate() {
        if !ranking.ranks[i].is_infinite() && !satisfies_all(w, interpretables, &kb.domain, &kb.facts) {
            return false;
        }
    }
    kb.conditionals.iter().all(|c| accepts_conditional(kb, ranking, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Literal, Predicate, RelationalAtom, Term, Variable};
    use crate::world::WorldSet;

    fn tweety_kb() -> KnowledgeBase {
        let x = Variable("X".to_string());
        let bird = Predicate::new("B", 1);
        let flies = Predicate::new("F", 1);
        let penguin = Predicate::new("P", 1);
        let b = |v: &Variable| Formula::Atom(RelationalAtom::unary(bird.clone(), Term::Var(v.clone())));
        let f = |v: &Variable| Formula::Atom(RelationalAtom::unary(flies.clone(), Term::Var(v.clone())));
        let p = |v: &Variable| Formula::Atom(RelationalAtom::unary(penguin.clone(), Term::Var(v.clone())));
        KnowledgeBase {
            predicates: vec![bird, flies, penguin],
            domain: vec![Constant("tweety".to_string())],
            conditionals: vec![
                Conditional::new(f(&x), b(&x)),
                Conditional::new(Formula::Literal(Literal::negative(
                    RelationalAtom::unary(Predicate::new("F", 1), Term::Var(x.clone())),
                )), p(&x)),
                Conditional::new(b(&x), p(&x)),
            ],
            facts: vec![],
        }
    }

    fn trivial_ranking(kb: &KnowledgeBase) -> RankingFunction {
        let ws = WorldSet::build(kb).unwrap();
        let ranks = vec![Rank::finite(0); ws.len()];
        RankingFunction { world_set: Rc::new(ws), ranks }
    }

    #[test]
    fn accepted_ground_conditional_has_lower_verification_than_falsification_rank() {
        let kb = tweety_kb();
        let ranking = trivial_ranking(&kb);
        // A zero ranking accepts nothing non-trivially; just check it runs.
        let _ = accepts_ground_conditional(&kb, &ranking, &kb.conditionals[0]);
    }

    #[test]
    fn rank_of_tautology_is_zero_or_finite() {
        let kb = tweety_kb();
        let ranking = trivial_ranking(&kb);
        let (r, _) = rank_of_ground_formula(&kb, &ranking, &Formula::Tautology, false);
        assert!(!r.is_infinite());
    }
}
