//! Explanation tree (cross-cutting): a single narration of whatever
//! derivation `rank.rs` already computed, not a second algorithm. Every
//! ranking query threads an `explain: bool`; when `false` the tree is
//! simply never built.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationNode {
    pub label: String,
    pub children: Vec<ExplanationNode>,
}

impl ExplanationNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self { label: label.into(), children: Vec::new() }
    }

    pub fn new(label: impl Into<String>, children: Vec<ExplanationNode>) -> Self {
        Self { label: label.into(), children }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.label);
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}
