//! Substitution of the single free variable by a domain constant (C2).

use crate::formula::{Conditional, Constant, Formula, Literal, RelationalAtom, Term, Variable};

fn ground_term(term: &Term, var: &Variable, constant: &Constant) -> Term {
    match term {
        Term::Var(v) if v == var => Term::Const(constant.clone()),
        other => other.clone(),
    }
}

fn ground_atom(atom: &RelationalAtom, var: &Variable, constant: &Constant) -> RelationalAtom {
    RelationalAtom {
        predicate: atom.predicate.clone(),
        args: atom.args.iter().map(|t| ground_term(t, var, constant)).collect(),
    }
}

fn ground_literal(lit: &Literal, var: &Variable, constant: &Constant) -> Literal {
    Literal { atom: ground_atom(&lit.atom, var, constant), positive: lit.positive }
}

/// Substitute every free occurrence of `var` in `formula` by `constant`.
/// A quantifier that rebinds the same variable name shadows it; recursion
/// stops descending into that subtree's substitution for `var`.
pub fn ground_formula(formula: &Formula, var: &Variable, constant: &Constant) -> Formula {
    match formula {
        Formula::Atom(a) => Formula::Atom(ground_atom(a, var, constant)),
        Formula::Literal(l) => Formula::Literal(ground_literal(l, var, constant)),
        Formula::ElementaryConjunction(lits) => {
            Formula::ElementaryConjunction(lits.iter().map(|l| ground_literal(l, var, constant)).collect())
        }
        Formula::Negation(inner) => Formula::Negation(Box::new(ground_formula(inner, var, constant))),
        Formula::Conjunction(a, b) => Formula::Conjunction(
            Box::new(ground_formula(a, var, constant)),
            Box::new(ground_formula(b, var, constant)),
        ),
        Formula::Disjunction(a, b) => Formula::Disjunction(
            Box::new(ground_formula(a, var, constant)),
            Box::new(ground_formula(b, var, constant)),
        ),
        Formula::Implication(a, b) => Formula::Implication(
            Box::new(ground_formula(a, var, constant)),
            Box::new(ground_formula(b, var, constant)),
        ),
        Formula::Tautology => Formula::Tautology,
        Formula::Contradiction => Formula::Contradiction,
        Formula::Exists(bound, inner) => {
            if bound == var {
                formula.clone()
            } else {
                Formula::Exists(bound.clone(), Box::new(ground_formula(inner, var, constant)))
            }
        }
        Formula::ForAll(bound, inner) => {
            if bound == var {
                formula.clone()
            } else {
                Formula::ForAll(bound.clone(), Box::new(ground_formula(inner, var, constant)))
            }
        }
    }
}

/// Ground `formula` over every constant in `domain`. A formula with no free
/// variable grounds to a single-element vector containing itself.
pub fn ground_formula_all(formula: &Formula, domain: &[Constant]) -> Vec<Formula> {
    match formula.free_variable() {
        None => vec![formula.clone()],
        Some(var) => domain.iter().map(|c| ground_formula(formula, &var, c)).collect(),
    }
}

pub fn ground_conditional(cond: &Conditional, var: &Variable, constant: &Constant) -> Conditional {
    Conditional {
        antecedent: ground_formula(&cond.antecedent, var, constant),
        consequent: ground_formula(&cond.consequent, var, constant),
    }
}

pub fn ground_conditional_all(cond: &Conditional, domain: &[Constant]) -> Vec<Conditional> {
    match cond.free_variable() {
        None => vec![cond.clone()],
        Some(var) => domain.iter().map(|c| ground_conditional(cond, &var, c)).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Predicate;

    #[test]
    fn grounding_replaces_only_the_matching_variable() {
        let x = Variable("X".to_string());
        let p = Predicate::new("P", 1);
        let atom = RelationalAtom::unary(p, Term::Var(x.clone()));
        let formula = Formula::Atom(atom);
        let tweety = Constant("tweety".to_string());
        let grounded = ground_formula(&formula, &x, &tweety);
        assert!(grounded.is_ground());
    }

    #[test]
    fn quantifier_rebinding_the_same_name_shadows_substitution() {
        let x = Variable("X".to_string());
        let p = Predicate::new("P", 1);
        let inner = Formula::Atom(RelationalAtom::unary(p, Term::Var(x.clone())));
        let quantified = Formula::ForAll(x.clone(), Box::new(inner));
        let tweety = Constant("tweety".to_string());
        let grounded = ground_formula(&quantified, &x, &tweety);
        assert_eq!(grounded, quantified);
    }

    #[test]
    fn ground_all_over_empty_domain_yields_no_groundings_for_open_formula() {
        let x = Variable("X".to_string());
        let p = Predicate::new("P", 1);
        let formula = Formula::Atom(RelationalAtom::unary(p, Term::Var(x)));
        assert!(ground_formula_all(&formula, &[]).is_empty());
    }
}
