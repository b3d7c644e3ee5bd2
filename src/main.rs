use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use color_eyre::Result;

use tdmax::decompose::{DecomposeConfig, Decomposer, Heuristic};
use tdmax::formula::Formula;
use tdmax::preprocess::{apply_changes, process_table, FormulaChange};
use tdmax::table::Table;

#[derive(Parser)]
#[command(author, version, about = "Tree-decomposition-based preprocessor for Weighted MaxSAT")]
struct Cli {
    /// Input instance in WCNF format
    file: PathBuf,

    /// Vertex elimination heuristic
    #[arg(long, value_enum, default_value_t = HeuristicArg::MinDegree)]
    heuristic: HeuristicArg,

    /// Only produce bags of width at most this bound; uneliminated
    /// vertices stay in the remainder
    #[arg(long, value_name = "INT")]
    max_width: Option<usize>,

    /// Time budget in seconds; on expiry the best partial result is used
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log: String,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum HeuristicArg {
    MinDegree,
    MinFill,
}

impl From<HeuristicArg> for Heuristic {
    fn from(arg: HeuristicArg) -> Self {
        match arg {
            HeuristicArg::MinDegree => Heuristic::MinDegree,
            HeuristicArg::MinFill => Heuristic::MinFill,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    simplelog::TermLogger::init(
        cli.log.parse()?,
        simplelog::Config::default(),
        simplelog::TerminalMode::Stderr,
        simplelog::ColorChoice::Auto,
    )?;

    let deadline = cli.timeout.map(|secs| Instant::now() + Duration::from_secs(secs));

    let file = File::open(&cli.file)?;
    let mut formula =
        Formula::parse(BufReader::new(file)).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;
    log::info!(
        "parsed {} clauses over {} variables, hard weight {}",
        formula.clauses.len(),
        formula.num_vars,
        formula.hard_weight
    );

    let graph = formula.primal_graph();
    let config = DecomposeConfig {
        heuristic: cli.heuristic.into(),
        max_width: cli.max_width,
        normalize: true,
        minimize_roots: false,
        deadline,
    };
    let decomposition = Decomposer::new(&graph, config).decompose();
    log::info!(
        "decomposition: {} root(s), width {:?}, {} remainder vertices",
        decomposition.roots.len(),
        decomposition.width(),
        decomposition.remainder.len()
    );

    let mut change = FormulaChange::default();
    for tree in &decomposition.roots {
        if tree.children().is_empty() {
            continue;
        }
        log::info!("processing partial decomposition:\n{}", tree);
        let mut table = Table::new(tree, &formula);
        if !table.compute(&formula, deadline) {
            log::warn!("time budget exhausted, skipping this decomposition");
            continue;
        }
        log::debug!("table:\n{}", table);
        change.merge(process_table(&table, tree, &formula));
    }

    log::info!(
        "applying changes: {} clause(s) removed, {} added",
        change.remove.len(),
        change.add.len()
    );
    apply_changes(&mut formula, change);
    formula.remove_variable_gaps();
    formula.write_wcnf(io::stdout().lock())?;

    Ok(())
}
