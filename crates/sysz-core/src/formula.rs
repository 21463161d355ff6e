//! Signature and formula AST (C1).
//!
//! A purely syntactic layer: predicates, constants, variables, relational
//! atoms, literals, and formulas built over them. Formulas hold no state;
//! equality and hashing are structural (`derive`d straight off the enum),
//! the same way the teacher's `Formula` is a plain, `Box`-recursive,
//! `PartialEq + Eq + Hash` enum rather than a class hierarchy.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A predicate of arity 0 or 1. Only monadic and nullary predicates are
/// supported (see Non-goals).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Predicate {
    pub name: String,
    pub arity: u8,
}

impl Predicate {
    pub fn new(name: impl Into<String>, arity: u8) -> Self {
        Self { name: name.into(), arity }
    }
}

/// A constant individual. All constants share a single sort.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constant(pub String);

/// The single free variable a conditional or formula may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Variable(pub String);

/// A predicate argument: either a constant or the (unique) free variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    Const(Constant),
    Var(Variable),
}

/// A relational atom: a predicate applied to arguments (length == arity).
/// Ground iff it contains no `Term::Var`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationalAtom {
    pub predicate: Predicate,
    pub args: Vec<Term>,
}

impl RelationalAtom {
    pub fn nullary(predicate: Predicate) -> Self {
        Self { predicate, args: Vec::new() }
    }

    pub fn unary(predicate: Predicate, arg: Term) -> Self {
        Self { predicate, args: vec![arg] }
    }

    pub fn is_ground(&self) -> bool {
        !self.args.iter().any(|t| matches!(t, Term::Var(_)))
    }

    pub fn free_variable(&self) -> Option<&Variable> {
        self.args.iter().find_map(|t| match t {
            Term::Var(v) => Some(v),
            Term::Const(_) => None,
        })
    }

    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.predicate.name.clone()
        } else {
            let args = self
                .args
                .iter()
                .map(|t| match t {
                    Term::Const(c) => c.0.clone(),
                    Term::Var(v) => v.0.clone(),
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{}({})", self.predicate.name, args)
        }
    }
}

/// An atom or its negation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub atom: RelationalAtom,
    pub positive: bool,
}

impl Literal {
    pub fn positive(atom: RelationalAtom) -> Self {
        Self { atom, positive: true }
    }

    pub fn negative(atom: RelationalAtom) -> Self {
        Self { atom, positive: false }
    }

    pub fn negate(&self) -> Literal {
        Literal { atom: self.atom.clone(), positive: !self.positive }
    }
}

/// A propositional/singly-quantified first-order formula.
///
/// `Box`-recursive and structurally `PartialEq`/`Eq`/`Hash`, so formulas
/// can be used as map keys directly, with no inheritance-based dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Formula {
    Atom(RelationalAtom),
    Literal(Literal),
    ElementaryConjunction(Vec<Literal>),
    Negation(Box<Formula>),
    Conjunction(Box<Formula>, Box<Formula>),
    Disjunction(Box<Formula>, Box<Formula>),
    Implication(Box<Formula>, Box<Formula>),
    Tautology,
    Contradiction,
    Exists(Variable, Box<Formula>),
    ForAll(Variable, Box<Formula>),
}

impl Formula {
    /// `A ∧ B`. Never aliases an existing `ElementaryConjunction`'s literal
    /// list: two elementary conjunctions merge into a freshly allocated
    /// `Vec`, everything else wraps in a fresh `Conjunction` node. This is
    /// the defensive copy the verification/falsification derivation in
    /// C5 depends on — the source's in-place `and()` on an elementary
    /// conjunction is the aliasing pitfall to avoid.
    pub fn and(&self, other: &Formula) -> Formula {
        match (self, other) {
            (Formula::Tautology, _) => other.clone(),
            (_, Formula::Tautology) => self.clone(),
            (Formula::ElementaryConjunction(a), Formula::ElementaryConjunction(b)) => {
                let mut literals = a.clone();
                literals.extend(b.iter().cloned());
                Formula::ElementaryConjunction(literals)
            }
            (Formula::ElementaryConjunction(a), Formula::Literal(l)) => {
                let mut literals = a.clone();
                literals.push(l.clone());
                Formula::ElementaryConjunction(literals)
            }
            (Formula::Literal(l), Formula::ElementaryConjunction(b)) => {
                let mut literals = vec![l.clone()];
                literals.extend(b.iter().cloned());
                Formula::ElementaryConjunction(literals)
            }
            _ => Formula::Conjunction(Box::new(self.clone()), Box::new(other.clone())),
        }
    }

    /// `A ∨ B`.
    pub fn or(&self, other: &Formula) -> Formula {
        Formula::Disjunction(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// `A → B`.
    pub fn implies(&self, other: &Formula) -> Formula {
        Formula::Implication(Box::new(self.clone()), Box::new(other.clone()))
    }

    /// `¬A`, always a fresh node.
    pub fn negate(&self) -> Formula {
        match self {
            Formula::Literal(l) => Formula::Literal(l.negate()),
            _ => Formula::Negation(Box::new(self.clone())),
        }
    }

    /// All relational atoms occurring anywhere in the formula.
    pub fn atoms(&self) -> HashSet<RelationalAtom> {
        let mut out = HashSet::new();
        self.collect_atoms(&mut out);
        out
    }

    fn collect_atoms(&self, out: &mut HashSet<RelationalAtom>) {
        match self {
            Formula::Atom(a) => {
                out.insert(a.clone());
            }
            Formula::Literal(l) => {
                out.insert(l.atom.clone());
            }
            Formula::ElementaryConjunction(lits) => {
                for l in lits {
                    out.insert(l.atom.clone());
                }
            }
            Formula::Negation(inner) => inner.collect_atoms(out),
            Formula::Conjunction(a, b)
            | Formula::Disjunction(a, b)
            | Formula::Implication(a, b) => {
                a.collect_atoms(out);
                b.collect_atoms(out);
            }
            Formula::Tautology | Formula::Contradiction => {}
            Formula::Exists(_, inner) | Formula::ForAll(_, inner) => inner.collect_atoms(out),
        }
    }

    /// Free variables: variables not captured by an enclosing quantifier.
    pub fn variables(&self) -> HashSet<Variable> {
        let mut out = HashSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut HashSet<Variable>) {
        match self {
            Formula::Atom(a) => {
                if let Some(v) = a.free_variable() {
                    out.insert(v.clone());
                }
            }
            Formula::Literal(l) => {
                if let Some(v) = l.atom.free_variable() {
                    out.insert(v.clone());
                }
            }
            Formula::ElementaryConjunction(lits) => {
                for l in lits {
                    if let Some(v) = l.atom.free_variable() {
                        out.insert(v.clone());
                    }
                }
            }
            Formula::Negation(inner) => inner.collect_variables(out),
            Formula::Conjunction(a, b)
            | Formula::Disjunction(a, b)
            | Formula::Implication(a, b) => {
                a.collect_variables(out);
                b.collect_variables(out);
            }
            Formula::Tautology | Formula::Contradiction => {}
            Formula::Exists(bound, inner) | Formula::ForAll(bound, inner) => {
                let mut inner_vars = HashSet::new();
                inner.collect_variables(&mut inner_vars);
                inner_vars.remove(bound);
                out.extend(inner_vars);
            }
        }
    }

    /// True iff the formula has no free variable.
    pub fn is_ground(&self) -> bool {
        self.variables().is_empty()
    }

    /// The single free variable, if any. Callers rely on the KB-level
    /// invariant that a formula carries at most one.
    pub fn free_variable(&self) -> Option<Variable> {
        self.variables().into_iter().next()
    }
}

/// A defeasible conditional `(B | A)`: "if A then typically B".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Conditional {
    pub antecedent: Formula,
    pub consequent: Formula,
}

impl Conditional {
    pub fn new(consequent: Formula, antecedent: Formula) -> Self {
        Self { antecedent, consequent }
    }

    /// Verification formula: `A ∧ B`.
    pub fn verification(&self) -> Formula {
        self.antecedent.and(&self.consequent)
    }

    /// Falsification formula: `A ∧ ¬B`.
    pub fn falsification(&self) -> Formula {
        self.antecedent.and(&self.consequent.negate())
    }

    /// `(¬B | A)`, used when evaluating open-conditional acceptance (§4.5).
    pub fn negate_consequent(&self) -> Conditional {
        Conditional { antecedent: self.antecedent.clone(), consequent: self.consequent.negate() }
    }

    pub fn free_variable(&self) -> Option<Variable> {
        let mut vars = self.antecedent.variables();
        vars.extend(self.consequent.variables());
        vars.into_iter().next()
    }

    pub fn is_ground(&self) -> bool {
        self.free_variable().is_none()
    }
}

/// Unordered set of conditionals plus closed facts, over a shared signature
/// and domain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub predicates: Vec<Predicate>,
    pub domain: Vec<Constant>,
    pub conditionals: Vec<Conditional>,
    pub facts: Vec<Formula>,
}

impl KnowledgeBase {
    pub fn is_propositional(&self) -> bool {
        self.domain.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(name: &str) -> RelationalAtom {
        RelationalAtom::nullary(Predicate::new(name, 0))
    }

    #[test]
    fn and_on_two_elementary_conjunctions_does_not_alias() {
        let a = Formula::ElementaryConjunction(vec![Literal::positive(atom("P"))]);
        let b = Formula::ElementaryConjunction(vec![Literal::positive(atom("Q"))]);
        let merged = a.and(&b);
        match (&a, &merged) {
            (Formula::ElementaryConjunction(orig), Formula::ElementaryConjunction(new)) => {
                assert_eq!(orig.len(), 1, "original conjunction must be untouched");
                assert_eq!(new.len(), 2);
            }
            _ => panic!("unexpected formula shape"),
        }
    }

    #[test]
    fn verification_does_not_mutate_antecedent() {
        let antecedent = Formula::ElementaryConjunction(vec![Literal::positive(atom("A"))]);
        let consequent = Formula::Literal(Literal::positive(atom("B")));
        let cond = Conditional::new(consequent, antecedent.clone());
        let _ = cond.verification();
        assert_eq!(cond.antecedent, antecedent);
    }

    #[test]
    fn free_variable_excludes_bound_occurrences() {
        let p = Predicate::new("P", 1);
        let var = Variable("X".to_string());
        let atom = RelationalAtom::unary(p, Term::Var(var.clone()));
        let inner = Formula::Atom(atom);
        let quantified = Formula::ForAll(var, Box::new(inner));
        assert!(quantified.is_ground());
    }

    #[test]
    fn atoms_collects_across_connectives() {
        let a = Formula::Literal(Literal::positive(atom("A")));
        let b = Formula::Literal(Literal::positive(atom("B")));
        let f = a.and(&b).or(&a.implies(&b));
        assert_eq!(f.atoms().len(), 2);
    }
}
