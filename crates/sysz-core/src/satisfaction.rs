//! Satisfaction (C4): whether a world satisfies a formula.

use crate::formula::{Constant, Formula, RelationalAtom};
use crate::grounding::ground_formula;
use crate::world::{Interpretables, World};

fn lookup(world: &World, interpretables: &Interpretables, atom: &RelationalAtom) -> bool {
    match interpretables.position(atom) {
        Some(i) => world.get(i),
        None => panic!(
            "internal invariant violation: {} is not a ground interpretable of this world set",
            atom.display()
        ),
    }
}

/// `w ⊨ formula`. `formula` may be open; quantifiers range over `domain`.
pub fn satisfies(world: &World, interpretables: &Interpretables, domain: &[Constant], formula: &Formula) -> bool {
    match formula {
        Formula::Atom(a) => lookup(world, interpretables, a),
        Formula::Literal(l) => lookup(world, interpretables, &l.atom) == l.positive,
        Formula::ElementaryConjunction(lits) => {
            lits.iter().all(|l| lookup(world, interpretables, &l.atom) == l.positive)
        }
        Formula::Negation(inner) => !satisfies(world, interpretables, domain, inner),
        Formula::Conjunction(a, b) => {
            satisfies(world, interpretables, domain, a) && satisfies(world, interpretables, domain, b)
        }
        Formula::Disjunction(a, b) => {
            satisfies(world, interpretables, domain, a) || satisfies(world, interpretables, domain, b)
        }
        Formula::Implication(a, b) => {
            !satisfies(world, interpretables, domain, a) || satisfies(world, interpretables, domain, b)
        }
        Formula::Tautology => true,
        Formula::Contradiction => false,
        Formula::Exists(var, inner) => {
            domain.iter().any(|c| satisfies(world, interpretables, domain, &ground_formula(inner, var, c)))
        }
        Formula::ForAll(var, inner) => {
            domain.iter().all(|c| satisfies(world, interpretables, domain, &ground_formula(inner, var, c)))
        }
    }
}

/// `w` satisfies every fact in the knowledge base.
pub fn satisfies_all(
    world: &World,
    interpretables: &Interpretables,
    domain: &[Constant],
    facts: &[Formula],
) -> bool {
    facts.iter().all(|f| satisfies(world, interpretables, domain, f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Constant, KnowledgeBase, Literal, Predicate, Term};
    use crate::world::WorldSet;

    fn kb() -> KnowledgeBase {
        KnowledgeBase {
            predicates: vec![Predicate::new("B", 1), Predicate::new("F", 1)],
            domain: vec![Constant("tweety".to_string())],
            conditionals: vec![],
            facts: vec![],
        }
    }

    #[test]
    fn double_negation_is_equivalent_under_satisfaction() {
        let kb = kb();
        let ws = WorldSet::build(&kb).unwrap();
        let atom =
            RelationalAtom::unary(Predicate::new("B", 1), Term::Const(Constant("tweety".to_string())));
        let f = Formula::Literal(Literal::positive(atom));
        let not_not_f = f.negate().negate();
        for w in &ws.worlds {
            assert_eq!(
                satisfies(w, &ws.interpretables, &kb.domain, &f),
                satisfies(w, &ws.interpretables, &kb.domain, &not_not_f)
            );
        }
    }

    #[test]
    fn tautology_holds_in_every_world_and_contradiction_in_none() {
        let kb = kb();
        let ws = WorldSet::build(&kb).unwrap();
        for w in &ws.worlds {
            assert!(satisfies(w, &ws.interpretables, &kb.domain, &Formula::Tautology));
            assert!(!satisfies(w, &ws.interpretables, &kb.domain, &Formula::Contradiction));
        }
    }

    #[test]
    fn exists_holds_iff_some_grounding_holds() {
        let kb = kb();
        let ws = WorldSet::build(&kb).unwrap();
        let var = crate::formula::Variable("X".to_string());
        let inner = Formula::Atom(RelationalAtom::unary(Predicate::new("B", 1), Term::Var(var.clone())));
        let exists = Formula::Exists(var, Box::new(inner.clone()));
        for w in &ws.worlds {
            let any_ground = kb
                .domain
                .iter()
                .any(|c| satisfies(w, &ws.interpretables, &kb.domain, &crate::grounding::ground_formula(&inner, &crate::formula::Variable("X".to_string()), c)));
            assert_eq!(satisfies(w, &ws.interpretables, &kb.domain, &exists), any_ground);
        }
    }
}
