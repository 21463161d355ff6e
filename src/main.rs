use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;
use std::rc::Rc;

use sysz_core::rank::{accepts_conditional, accepts_formula, rank_of_conditional, rank_of_formula};
use sysz_core::search::{search_tolerance_pairs, SearchStrategy};
use sysz_core::systemz::build_ranking;
use sysz_core::{csv, kb_text, CoreError, InputError, QueryTarget, WorldSet};

#[derive(Parser)]
#[command(name = "sysz", about = "A System-Z-like ranked default reasoner over restricted first-order knowledge bases")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether a formula or conditional query is accepted by a knowledge base.
    Check {
        #[arg(long)]
        kb: String,
        #[arg(long)]
        query: String,
        /// Print the explanation tree behind the acceptance verdict.
        #[arg(long)]
        explain: bool,
        /// Which search strategy to use when looking for a tolerance pair.
        #[arg(long, value_enum, default_value = "min")]
        strategy: StrategyArg,
    },
    /// List the tolerance pairs a knowledge base admits.
    Pairs {
        #[arg(long)]
        kb: String,
        #[arg(long, value_enum, default_value = "all")]
        strategy: StrategyArg,
    },
    /// Build a ranking function and export it as CSV.
    Export {
        #[arg(long)]
        kb: String,
        #[arg(long)]
        out: String,
        #[arg(long, value_enum, default_value = "min")]
        strategy: StrategyArg,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum StrategyArg {
    Brute,
    All,
    Min,
}

impl From<StrategyArg> for SearchStrategy {
    fn from(s: StrategyArg) -> Self {
        match s {
            StrategyArg::Brute => SearchStrategy::Brute,
            StrategyArg::All => SearchStrategy::SearchAll,
            StrategyArg::Min => SearchStrategy::SearchMin,
        }
    }
}

/// Exit codes: 0 success, 1 input/parse error, 2 capacity error, 3
/// inconsistent knowledge base (no tolerance pair exists).
const EXIT_OK: u8 = 0;
const EXIT_INPUT_ERROR: u8 = 1;
const EXIT_CAPACITY_ERROR: u8 = 2;
const EXIT_INCONSISTENT: u8 = 3;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let code = match run(cli.command) {
        Ok(()) => EXIT_OK,
        Err(err) => {
            eprintln!("sysz: {err}");
            match err {
                CoreError::Input(_) => EXIT_INPUT_ERROR,
                CoreError::Capacity(_) => EXIT_CAPACITY_ERROR,
                CoreError::Inconsistent => EXIT_INCONSISTENT,
            }
        }
    };
    ExitCode::from(code)
}

fn read_kb(path: &str) -> Result<sysz_core::KnowledgeBase, CoreError> {
    let text = fs::read_to_string(path)
        .map_err(|e| InputError::new(format!("could not read '{path}': {e}")))?;
    let kb = kb_text::load_kb(&text)?;
    Ok(kb)
}

fn find_any_pair(
    kb: &sysz_core::KnowledgeBase,
    worlds: &WorldSet,
    strategy: SearchStrategy,
) -> Result<(sysz_core::TolerancePair, Vec<sysz_core::Witness>), CoreError> {
    let mut progress = |_: f64| true;
    let mut pairs = search_tolerance_pairs(kb, worlds, strategy, &mut progress);
    if pairs.is_empty() {
        return Err(CoreError::Inconsistent);
    }
    Ok(pairs.remove(0))
}

fn run(command: Command) -> Result<(), CoreError> {
    match command {
        Command::Check { kb, query, explain, strategy } => cmd_check(&kb, &query, explain, strategy.into()),
        Command::Pairs { kb, strategy } => cmd_pairs(&kb, strategy.into()),
        Command::Export { kb, out, strategy } => cmd_export(&kb, &out, strategy.into()),
    }
}

fn cmd_check(kb_path: &str, query_text: &str, explain: bool, strategy: SearchStrategy) -> Result<(), CoreError> {
    let kb = read_kb(kb_path)?;
    let worlds = WorldSet::build(&kb)?;
    let (pair, _witnesses) = find_any_pair(&kb, &worlds, strategy)?;
    let worlds = Rc::new(worlds);
    let ranking = build_ranking(&kb, Rc::clone(&worlds), &pair).ok_or(CoreError::Inconsistent)?;

    let target = kb_text::parse_query(query_text, &kb)?;
    let (accepted, explanation) = match &target {
        QueryTarget::Formula(f) => {
            let accepted = accepts_formula(&kb, &ranking, f);
            let explanation = if explain { rank_of_formula(&kb, &ranking, f, true).1 } else { None };
            (accepted, explanation)
        }
        QueryTarget::Conditional(c) => {
            let accepted = accepts_conditional(&kb, &ranking, c);
            let explanation = if explain { rank_of_conditional(&kb, &ranking, c, true).1 } else { None };
            (accepted, explanation)
        }
    };

    println!("{}", if accepted { "accepted" } else { "not accepted" });
    if let Some(node) = explanation {
        println!("{}", node.render());
    }
    Ok(())
}

fn cmd_pairs(kb_path: &str, strategy: SearchStrategy) -> Result<(), CoreError> {
    let kb = read_kb(kb_path)?;
    let worlds = WorldSet::build(&kb)?;
    let mut progress = |_: f64| true;
    let pairs = search_tolerance_pairs(&kb, &worlds, strategy, &mut progress);
    if pairs.is_empty() {
        return Err(CoreError::Inconsistent);
    }
    for (pair, _witnesses) in &pairs {
        let summary: Vec<String> = pair
            .blocks
            .iter()
            .map(|b| format!("{{R={:?}, D={:?}}}", b.conditionals, b.constants))
            .collect();
        println!("{}", summary.join(" < "));
    }
    Ok(())
}

fn cmd_export(kb_path: &str, out_path: &str, strategy: SearchStrategy) -> Result<(), CoreError> {
    let kb = read_kb(kb_path)?;
    let worlds = WorldSet::build(&kb)?;
    let (pair, _witnesses) = find_any_pair(&kb, &worlds, strategy)?;
    let worlds = Rc::new(worlds);
    let ranking = build_ranking(&kb, Rc::clone(&worlds), &pair).ok_or(CoreError::Inconsistent)?;
    let text = csv::ranking_to_csv(&worlds, &ranking);
    fs::write(out_path, text).map_err(|e| InputError::new(format!("could not write '{out_path}': {e}")))?;
    Ok(())
}
