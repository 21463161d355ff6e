//! Knowledge-base text loader (A1, ambient — an external collaborator to
//! the core C1–C8 components, not part of their budget). A hand-rolled
//! recursive-descent parser in the shape of the teacher's `FormulaParser`:
//! a cursor over the input, an explicit position, and a depth guard against
//! pathological nesting, rather than a parser-combinator or generated
//! grammar.
//!
//! Grammar, line-oriented, `#` starts a line (or trailing) comment:
//!
//! ```text
//! signature {
//!   B(D)
//!   F(D)
//!   Q
//! }
//! D = { tweety, opus }
//! Conditionals {
//!   (F(X) | B(X))
//!   (~F(X) | P(X))
//! }
//! Facts {
//!   B(tweety)
//! }
//! ```
//!
//! Formula syntax: `~`/`¬` negation, `&`/`∧` conjunction, `v`/`∨`
//! disjunction, `->`/`⊃` implication, `true`/`⊤` and `false`/`⊥`, predicate
//! application `P(x)` or bare `P` for a nullary predicate, parens for
//! grouping, and `\forall`/`\exists ident : formula` for quantification.
//! Bare `|` is reserved for the conditional separator `(B | A)` and is not
//! a disjunction operator in this loader's grammar — a pragmatic
//! disambiguation, since the two would otherwise collide inside a
//! `Conditionals{}` line.

use crate::error::InputError;
use crate::formula::{Constant, Formula, KnowledgeBase, Predicate, RelationalAtom, Term, Variable};
use std::collections::{HashMap, HashSet};

const MAX_PARSE_DEPTH: usize = 100;

/// Either a plain formula or a conditional, as accepted by a query.
#[derive(Debug, Clone)]
pub enum QueryTarget {
    Formula(Formula),
    Conditional(crate::formula::Conditional),
}

struct FormulaParser<'a> {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    constants: &'a HashSet<String>,
    seen_variable: Option<String>,
    source: &'a str,
}

impl<'a> FormulaParser<'a> {
    fn new(input: &'a str, constants: &'a HashSet<String>) -> Self {
        Self { chars: input.chars().collect(), pos: 0, depth: 0, constants, seen_variable: None, source: input }
    }

    fn enter_depth(&mut self) -> Result<(), InputError> {
        self.depth += 1;
        if self.depth > MAX_PARSE_DEPTH {
            return Err(InputError::at("formula nesting too deep", self.pos));
        }
        Ok(())
    }

    fn exit_depth(&mut self) {
        self.depth -= 1;
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        self.skip_ws();
        let s_chars: Vec<char> = s.chars().collect();
        if self.chars[self.pos..].len() >= s_chars.len() && self.chars[self.pos..self.pos + s_chars.len()] == s_chars[..] {
            self.pos += s_chars.len();
            true
        } else {
            false
        }
    }

    fn eat_char(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_ident(&mut self) -> Result<String, InputError> {
        self.skip_ws();
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(InputError::at("expected an identifier", self.pos));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_formula(&mut self) -> Result<Formula, InputError> {
        self.enter_depth()?;
        let result = self.parse_implication();
        self.exit_depth();
        result
    }

    fn parse_implication(&mut self) -> Result<Formula, InputError> {
        let left = self.parse_disjunction()?;
        self.skip_ws();
        if self.eat_str("->") || self.eat_str("⊃") {
            let right = self.parse_implication()?;
            Ok(left.implies(&right))
        } else {
            Ok(left)
        }
    }

    fn parse_disjunction(&mut self) -> Result<Formula, InputError> {
        let mut left = self.parse_conjunction()?;
        loop {
            self.skip_ws();
            let is_or = self.eat_char('∨')
                || (self.peek() == Some('v') && self.looks_like_word_boundary_op("v"));
            if is_or {
                let right = self.parse_conjunction()?;
                left = left.or(&right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn looks_like_word_boundary_op(&mut self, word: &str) -> bool {
        // `v` is only an operator when it stands alone, not as a prefix of
        // a longer identifier (so a constant literally named `very` is
        // still a valid identifier token elsewhere).
        let save = self.pos;
        self.skip_ws();
        let start = self.pos;
        if self.eat_str(word) {
            let next_is_ident_char = matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_');
            if !next_is_ident_char {
                return true;
            }
        }
        self.pos = save;
        let _ = start;
        false
    }

    fn parse_conjunction(&mut self) -> Result<Formula, InputError> {
        let mut left = self.parse_unary()?;
        loop {
            self.skip_ws();
            if self.eat_char('∧') || self.eat_char('&') {
                let right = self.parse_unary()?;
                left = left.and(&right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Formula, InputError> {
        self.enter_depth()?;
        self.skip_ws();
        let result = if self.eat_char('¬') || self.eat_char('~') {
            let inner = self.parse_unary()?;
            Ok(inner.negate())
        } else if self.eat_str("\\forall") {
            self.parse_quantifier(true)
        } else if self.eat_str("\\exists") {
            self.parse_quantifier(false)
        } else {
            self.parse_primary()
        };
        self.exit_depth();
        result
    }

    fn parse_quantifier(&mut self, universal: bool) -> Result<Formula, InputError> {
        let name = self.parse_ident()?;
        self.skip_ws();
        if !self.eat_char(':') {
            return Err(InputError::at("expected ':' after quantified variable", self.pos));
        }
        let var = Variable(name);
        let inner = self.parse_unary()?;
        Ok(if universal {
            Formula::ForAll(var, Box::new(inner))
        } else {
            Formula::Exists(var, Box::new(inner))
        })
    }

    fn parse_primary(&mut self) -> Result<Formula, InputError> {
        self.skip_ws();
        if self.eat_char('(') {
            let inner = self.parse_implication()?;
            self.skip_ws();
            if !self.eat_char(')') {
                return Err(InputError::at("expected closing ')'", self.pos));
            }
            return Ok(inner);
        }
        if self.eat_str("⊤") || self.eat_str("true") {
            return Ok(Formula::Tautology);
        }
        if self.eat_str("⊥") || self.eat_str("false") {
            return Ok(Formula::Contradiction);
        }
        let name = self.parse_ident()?;
        self.skip_ws();
        if self.eat_char('(') {
            let arg_name = self.parse_ident()?;
            self.skip_ws();
            if !self.eat_char(')') {
                return Err(InputError::at("expected closing ')' after predicate argument", self.pos));
            }
            let term = self.resolve_term(&arg_name)?;
            let atom = RelationalAtom::unary(Predicate::new(name, 1), term);
            Ok(Formula::Atom(atom))
        } else {
            let atom = RelationalAtom::nullary(Predicate::new(name, 0));
            Ok(Formula::Atom(atom))
        }
    }

    fn resolve_term(&mut self, name: &str) -> Result<Term, InputError> {
        if self.constants.contains(name) {
            return Ok(Term::Const(Constant(name.to_string())));
        }
        match &self.seen_variable {
            Some(v) if v == name => {}
            Some(other) => {
                return Err(InputError::new(format!(
                    "formula uses two distinct free variables ('{other}' and '{name}'): at most one is allowed in '{}'",
                    self.source
                )))
            }
            None => self.seen_variable = Some(name.to_string()),
        }
        Ok(Term::Var(Variable(name.to_string())))
    }

    fn finish(&mut self) -> Result<(), InputError> {
        self.skip_ws();
        if self.pos != self.chars.len() {
            return Err(InputError::at("unexpected trailing input", self.pos));
        }
        Ok(())
    }
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| match line.find('#') {
            Some(i) => &line[..i],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn extract_block(text: &str, keyword: &str) -> Option<String> {
    let kw_pos = text.find(keyword)?;
    let after_kw = &text[kw_pos + keyword.len()..];
    let brace_offset = after_kw.find('{')?;
    let chars: Vec<char> = text.chars().collect();
    let open_idx = text[..kw_pos + keyword.len() + brace_offset].chars().count();
    let mut depth = 0usize;
    let mut close_idx = None;
    for (i, &c) in chars.iter().enumerate().skip(open_idx) {
        if c == '{' {
            depth += 1;
        } else if c == '}' {
            depth -= 1;
            if depth == 0 {
                close_idx = Some(i);
                break;
            }
        }
    }
    let close_idx = close_idx?;
    Some(chars[open_idx + 1..close_idx].iter().collect())
}

fn extract_domain(text: &str) -> Result<Vec<Constant>, InputError> {
    let line = text.lines().find(|l| {
        let t = l.trim_start();
        t.starts_with('D') && t[1..].trim_start().starts_with('=')
    });
    let line = match line {
        Some(l) => l,
        None => return Ok(Vec::new()),
    };
    let eq = line.find('=').ok_or_else(|| InputError::new("malformed domain line: missing '='"))?;
    let rhs = line[eq + 1..].trim();
    let rhs = rhs.strip_prefix('{').ok_or_else(|| InputError::new("domain must be a brace-enclosed list"))?;
    let rhs = rhs.strip_suffix('}').ok_or_else(|| InputError::new("domain must be a brace-enclosed list"))?;
    Ok(rhs
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Constant(s.to_string()))
        .collect())
}

fn extract_predicates(text: &str) -> Result<Vec<Predicate>, InputError> {
    let block = match extract_block(text, "signature") {
        Some(b) => b,
        None => return Ok(Vec::new()),
    };
    let mut predicates = Vec::new();
    for line in block.lines() {
        let line = line.trim().trim_end_matches(['.', ',']);
        if line.is_empty() {
            continue;
        }
        if let Some(open) = line.find('(') {
            let name = line[..open].trim();
            predicates.push(Predicate::new(name, 1));
        } else {
            predicates.push(Predicate::new(line, 0));
        }
    }
    Ok(predicates)
}

fn split_conditional_line(line: &str) -> Result<(String, String), InputError> {
    let trimmed = line.trim();
    let inner = trimmed
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .ok_or_else(|| InputError::new(format!("conditional '{trimmed}' must be wrapped in parentheses")))?;
    let mut depth = 0i32;
    let mut split_at = None;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            '|' if depth == 0 => {
                split_at = Some(i);
                break;
            }
            _ => {}
        }
    }
    let split_at = split_at.ok_or_else(|| InputError::new(format!("conditional '{trimmed}' is missing its '|' separator")))?;
    let consequent = inner[..split_at].trim().to_string();
    let antecedent = inner[split_at + 1..].trim().to_string();
    Ok((consequent, antecedent))
}

fn parse_formula_str(text: &str, constants: &HashSet<String>) -> Result<Formula, InputError> {
    let mut parser = FormulaParser::new(text, constants);
    let f = parser.parse_formula()?;
    parser.finish()?;
    Ok(f)
}

fn extract_conditionals(
    text: &str,
    constants: &HashSet<String>,
) -> Result<Vec<crate::formula::Conditional>, InputError> {
    let block = match extract_block(text, "Conditionals") {
        Some(b) => b,
        None => return Ok(Vec::new()),
    };
    let mut conditionals = Vec::new();
    for line in block.lines() {
        let line = line.trim().trim_end_matches(';');
        if line.is_empty() {
            continue;
        }
        let (consequent_src, antecedent_src) = split_conditional_line(line)?;
        let antecedent = parse_formula_str(&antecedent_src, constants)?;
        let consequent = parse_formula_str(&consequent_src, constants)?;
        let mut vars: HashSet<String> =
            antecedent.variables().into_iter().map(|v| v.0).collect();
        vars.extend(consequent.variables().into_iter().map(|v| v.0));
        if vars.len() > 1 {
            return Err(InputError::new(format!(
                "conditional '{line}' uses more than one free variable: {vars:?}"
            )));
        }
        conditionals.push(crate::formula::Conditional::new(consequent, antecedent));
    }
    Ok(conditionals)
}

fn extract_facts(text: &str, constants: &HashSet<String>) -> Result<Vec<Formula>, InputError> {
    let block = match extract_block(text, "Facts") {
        Some(b) => b,
        None => return Ok(Vec::new()),
    };
    let mut facts = Vec::new();
    for line in block.lines() {
        let line = line.trim().trim_end_matches(';');
        if line.is_empty() {
            continue;
        }
        let formula = parse_formula_str(line, constants)?;
        if !formula.is_ground() {
            return Err(InputError::new(format!("fact '{line}' must be a closed (ground) formula")));
        }
        facts.push(formula);
    }
    Ok(facts)
}

/// Parse a complete knowledge base from its textual grammar.
pub fn load_kb(text: &str) -> Result<KnowledgeBase, InputError> {
    let stripped = strip_comments(text);
    let predicates = extract_predicates(&stripped)?;
    let domain = extract_domain(&stripped)?;
    let constants: HashSet<String> = domain.iter().map(|c| c.0.clone()).collect();
    let conditionals = extract_conditionals(&stripped, &constants)?;
    let facts = extract_facts(&stripped, &constants)?;

    let predicate_arity: HashMap<&str, u8> =
        predicates.iter().map(|p| (p.name.as_str(), p.arity)).collect();
    for cond in &conditionals {
        for atom in cond.antecedent.atoms().into_iter().chain(cond.consequent.atoms()) {
            check_arity(&atom, &predicate_arity)?;
        }
    }
    for fact in &facts {
        for atom in fact.atoms() {
            check_arity(&atom, &predicate_arity)?;
        }
    }

    Ok(KnowledgeBase { predicates, domain, conditionals, facts })
}

fn check_arity(atom: &RelationalAtom, arities: &HashMap<&str, u8>) -> Result<(), InputError> {
    match arities.get(atom.predicate.name.as_str()) {
        Some(&arity) if arity == atom.predicate.arity => Ok(()),
        Some(&arity) => Err(InputError::new(format!(
            "predicate '{}' declared with arity {arity} but used with arity {}",
            atom.predicate.name, atom.predicate.arity
        ))),
        None => Err(InputError::new(format!("predicate '{}' is not declared in the signature", atom.predicate.name))),
    }
}

/// Parse a standalone query: a bare formula, or a conditional `(B | A)`.
pub fn parse_query(text: &str, kb: &KnowledgeBase) -> Result<QueryTarget, InputError> {
    let constants: HashSet<String> = kb.domain.iter().map(|c| c.0.clone()).collect();
    let trimmed = text.trim();
    if trimmed.starts_with('(') {
        if let Ok((consequent_src, antecedent_src)) = split_conditional_line(trimmed) {
            let antecedent = parse_formula_str(&antecedent_src, &constants)?;
            let consequent = parse_formula_str(&consequent_src, &constants)?;
            return Ok(QueryTarget::Conditional(crate::formula::Conditional::new(consequent, antecedent)));
        }
    }
    let formula = parse_formula_str(trimmed, &constants)?;
    Ok(QueryTarget::Formula(formula))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWEETY_KB: &str = r#"
        # classic flying-birds example
        signature {
            B(D)
            F(D)
            P(D)
        }
        D = { tweety }
        Conditionals {
            (F(X) | B(X))
            (~F(X) | P(X))
            (B(X) | P(X))
        }
        Facts {
        }
    "#;

    #[test]
    fn loads_the_tweety_knowledge_base() {
        let kb = load_kb(TWEETY_KB).expect("should parse");
        assert_eq!(kb.predicates.len(), 3);
        assert_eq!(kb.domain.len(), 1);
        assert_eq!(kb.conditionals.len(), 3);
        assert!(kb.facts.is_empty());
    }

    #[test]
    fn rejects_conditional_with_two_free_variables() {
        let text = r#"
            signature { B(D) F(D) }
            D = { a, b }
            Conditionals {
                (F(X) | B(Y))
            }
        "#;
        assert!(load_kb(text).is_err());
    }

    #[test]
    fn rejects_undeclared_predicate() {
        let text = r#"
            signature { B(D) }
            D = { a }
            Conditionals {
                (Q(X) | B(X))
            }
        "#;
        assert!(load_kb(text).is_err());
    }

    #[test]
    fn parses_a_bare_formula_query_and_a_conditional_query() {
        let kb = load_kb(TWEETY_KB).unwrap();
        match parse_query("F(tweety)", &kb).unwrap() {
            QueryTarget::Formula(_) => {}
            _ => panic!("expected a formula"),
        }
        match parse_query("(F(X) | B(X))", &kb).unwrap() {
            QueryTarget::Conditional(_) => {}
            _ => panic!("expected a conditional"),
        }
    }
}
