//! CSV export/import (A3, ambient): one row per world, one column per
//! interpretable plus a trailing `k` column holding the rank (`inf` for
//! infinite).

use crate::error::InputError;
use crate::rank::{Rank, RankingFunction};
use crate::world::WorldSet;
use std::collections::HashMap;

pub fn ranking_to_csv(worlds: &WorldSet, ranking: &RankingFunction) -> String {
    let mut out = String::new();
    let headers: Vec<String> = worlds.interpretables.atoms().iter().map(|a| a.display()).collect();
    out.push_str(&headers.join(","));
    if !headers.is_empty() {
        out.push(',');
    }
    out.push_str("k\n");
    for (i, w) in worlds.worlds.iter().enumerate() {
        let mut cols: Vec<String> = (0..worlds.interpretables.len())
            .map(|j| if w.get(j) { "1".to_string() } else { "0".to_string() })
            .collect();
        cols.push(ranking.ranks[i].display());
        out.push_str(&cols.join(","));
        out.push('\n');
    }
    out
}

/// Parsed back as a map from a world's boolean assignment (in column order)
/// to its rank, independent of any particular `WorldSet` instance — enough
/// to check a round trip without requiring identical `Rc` allocations.
pub fn csv_to_ranks(csv: &str) -> Result<HashMap<Vec<bool>, Rank>, InputError> {
    let mut lines = csv.lines();
    let header = lines.next().ok_or_else(|| InputError::new("empty CSV: missing header row"))?;
    let column_count = header.split(',').count();
    if column_count == 0 {
        return Err(InputError::new("CSV header has no columns"));
    }
    let bit_columns = column_count - 1;

    let mut out = HashMap::new();
    for (row_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != column_count {
            return Err(InputError::new(format!(
                "row {row_no} has {} columns, expected {column_count}",
                fields.len()
            )));
        }
        let mut bits = Vec::with_capacity(bit_columns);
        for field in &fields[..bit_columns] {
            bits.push(match *field {
                "0" => false,
                "1" => true,
                other => return Err(InputError::new(format!("row {row_no}: expected 0/1, got '{other}'"))),
            });
        }
        let rank_field = fields[bit_columns];
        let rank = if rank_field == "inf" {
            Rank::INFINITY
        } else {
            let value: u32 = rank_field
                .parse()
                .map_err(|_| InputError::new(format!("row {row_no}: invalid rank '{rank_field}'")))?;
            Rank::finite(value)
        };
        out.insert(bits, rank);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{Conditional, Constant, Formula, KnowledgeBase, Literal, Predicate, RelationalAtom, Term, Variable};
    use crate::systemz::build_ranking;
    use crate::tolerance::PartitionBlock;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    fn small_kb() -> KnowledgeBase {
        let x = Variable("X".to_string());
        let b = Predicate::new("B", 1);
        let f = Predicate::new("F", 1);
        KnowledgeBase {
            predicates: vec![b.clone(), f.clone()],
            domain: vec![Constant("tweety".to_string())],
            conditionals: vec![Conditional::new(
                Formula::Atom(RelationalAtom::unary(f, Term::Var(x.clone()))),
                Formula::Atom(RelationalAtom::unary(b, Term::Var(x))),
            )],
            facts: vec![],
        }
    }

    #[test]
    fn export_then_import_round_trips_every_world_rank() {
        let kb = small_kb();
        let worlds = Rc::new(crate::world::WorldSet::build(&kb).unwrap());
        let mut conditionals = BTreeSet::new();
        conditionals.insert(0);
        let mut constants = BTreeSet::new();
        constants.insert(0);
        let pair = crate::tolerance::TolerancePair {
            blocks: vec![PartitionBlock { conditionals, constants }],
        };
        let ranking = build_ranking(&kb, Rc::clone(&worlds), &pair).expect("single-subset pair should validate");
        let csv = ranking_to_csv(&worlds, &ranking);
        let parsed = csv_to_ranks(&csv).unwrap();
        for (i, w) in worlds.worlds.iter().enumerate() {
            let rank = parsed.get(&w.bits()).expect("world missing from round trip");
            assert_eq!(*rank, ranking.ranks[i]);
        }
    }

    #[test]
    fn malformed_csv_row_is_rejected() {
        let bad = "a,b,k\n1,0\n";
        assert!(csv_to_ranks(bad).is_err());
    }
}
