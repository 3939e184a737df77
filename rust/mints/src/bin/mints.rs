//! Command-line front end: load an MPS or OPB/WBO file, solve it, and write
//! the result JSON files.

use clap::{Parser, ValueEnum};
use mints::{helper, mps, pb, solve, Model, SelectionMode, SolverOption, Status, TabuMode, Verbose};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VerboseArg {
    Off,
    Warning,
    Outer,
    Full,
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TabuModeArg {
    All,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SelectionModeArg {
    Off,
    Defined,
    Smaller,
    Larger,
    Independent,
}

#[derive(Debug, Parser)]
#[command(name = "mints", about = "Metaheuristic integer solver", version)]
struct Args {
    /// Input problem: .mps, or .opb/.pb/.wbo pseudo-Boolean
    input: PathBuf,

    /// Wall-clock budget in seconds
    #[arg(short = 't', long)]
    time_max: Option<f64>,

    /// Total tabu-search iteration budget
    #[arg(short = 'i', long)]
    iteration_max: Option<u64>,

    /// Stop once a feasible solution reaches this objective value
    #[arg(long)]
    target_objective: Option<f64>,

    /// Random seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = VerboseArg::Off)]
    verbose: VerboseArg,

    #[arg(long, value_enum)]
    tabu_mode: Option<TabuModeArg>,

    #[arg(long, value_enum)]
    selection_mode: Option<SelectionModeArg>,

    /// Run the Lagrange-dual bounding stage before the first episode
    #[arg(long)]
    lagrange_dual: bool,

    /// Worker threads for the move-update region (0 = all cores)
    #[arg(long, default_value_t = 0)]
    threads_move_update: usize,

    /// Worker threads for the move-evaluation region (0 = all cores)
    #[arg(long, default_value_t = 0)]
    threads_move_evaluation: usize,

    /// Solution JSON output path
    #[arg(short = 'o', long, default_value = "incumbent.json")]
    output: PathBuf,

    /// Feasible-solution history JSON output path
    #[arg(long)]
    history: Option<PathBuf>,

    /// Per-iteration trend TSV output path
    #[arg(long)]
    trend: Option<PathBuf>,

    /// File of `name value` lines: variables fixed before the solve
    #[arg(long)]
    fixed: Option<PathBuf>,

    /// File of `name value` lines: initial solution hint
    #[arg(long)]
    initial: Option<PathBuf>,

    /// File of `name name` lines: binary pairs for the two-flip family
    #[arg(long)]
    flip_pairs: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);
    match run(&args) {
        Ok(status) => match status {
            Status::Optimal | Status::Feasible => ExitCode::SUCCESS,
            Status::Infeasible => ExitCode::from(1),
        },
        Err(error) => {
            error!("{error:#}");
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: VerboseArg) {
    let filter = match verbose {
        VerboseArg::Off => "error",
        VerboseArg::Warning => "warn",
        VerboseArg::Outer => "mints=info",
        VerboseArg::Full => "mints=debug",
        VerboseArg::Debug => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn load_model(path: &Path) -> anyhow::Result<Model> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let model = match extension.as_str() {
        "opb" | "pb" | "wbo" => pb::load_file(path)?,
        _ => mps::load_file(path)?,
    };
    Ok(model)
}

fn run(args: &Args) -> anyhow::Result<Status> {
    let started = std::time::Instant::now();
    let mut model = load_model(&args.input)?;
    info!(
        name = model.name(),
        variables = model.number_of_variables(),
        constraints = model.number_of_constraints(),
        "model loaded"
    );

    if let Some(path) = &args.fixed {
        for (name, value) in helper::read_names_and_values(path)? {
            match model.variable_id_by_name(&name) {
                Some(id) => {
                    let variable = model.variable(id);
                    let clipped = value.clamp(variable.lower(), variable.upper());
                    model.fix_variable(id, clipped)?;
                }
                None => warn!(%name, "fixed variable not in the model"),
            }
        }
    }
    if let Some(path) = &args.initial {
        for (name, value) in helper::read_names_and_values(path)? {
            if model.set_initial_value_by_name(&name, value).is_err() {
                warn!(%name, "initial-value variable not in the model");
            }
        }
    }
    if let Some(path) = &args.flip_pairs {
        for (first, second) in helper::read_name_pairs(path)? {
            match (
                model.variable_id_by_name(&first),
                model.variable_id_by_name(&second),
            ) {
                (Some(a), Some(b)) => model.register_flippable_pair(a, b),
                _ => warn!(%first, %second, "flip pair not in the model"),
            }
        }
    }

    let mut option = SolverOption::default();
    option.general.seed = args.seed;
    option.general.time_offset = started.elapsed().as_secs_f64();
    if let Some(time_max) = args.time_max {
        option.general.time_max = time_max;
    }
    if let Some(iteration_max) = args.iteration_max {
        option.general.iteration_max = iteration_max;
    }
    if let Some(target) = args.target_objective {
        option.general.target_objective_value = target;
    }
    option.output.verbose = match args.verbose {
        VerboseArg::Off => Verbose::Off,
        VerboseArg::Warning => Verbose::Warning,
        VerboseArg::Outer => Verbose::Outer,
        VerboseArg::Full => Verbose::Full,
        VerboseArg::Debug => Verbose::Debug,
    };
    if let Some(mode) = args.tabu_mode {
        option.tabu_search.tabu_mode = match mode {
            TabuModeArg::All => TabuMode::All,
            TabuModeArg::Any => TabuMode::Any,
        };
    }
    if let Some(mode) = args.selection_mode {
        option.neighborhood.selection_mode = match mode {
            SelectionModeArg::Off => SelectionMode::Off,
            SelectionModeArg::Defined => SelectionMode::Defined,
            SelectionModeArg::Smaller => SelectionMode::Smaller,
            SelectionModeArg::Larger => SelectionMode::Larger,
            SelectionModeArg::Independent => SelectionMode::Independent,
        };
    }
    option.lagrange_dual.is_enabled = args.lagrange_dual;
    option.parallel.number_of_threads_move_update = args.threads_move_update;
    option.parallel.number_of_threads_move_evaluation = args.threads_move_evaluation;
    if args.flip_pairs.is_some() {
        option.neighborhood.is_enabled_two_flip_move = true;
    }
    if let Some(path) = &args.trend {
        option.output.is_enabled_write_trend = true;
        option.output.trend_file_name = Some(path.display().to_string());
    }

    let result = solve(&mut model, &option)?;
    println!(
        "status = {}, objective = {}, violation = {}, iterations = {}, elapsed = {:.3}s",
        result.status,
        result.solution.objective,
        result.solution.total_violation,
        result.statistics.number_of_tabu_search_iterations,
        result.statistics.elapsed_seconds,
    );
    result.solution.write_json(&args.output)?;
    if let Some(path) = &args.history {
        result.history.write_json(
            path,
            model.name(),
            model.number_of_variables(),
            model.number_of_constraints(),
        )?;
    }
    if let Some(bound) = result.dual_bound {
        info!(bound, "lagrange dual bound");
    }
    Ok(result.status)
}
