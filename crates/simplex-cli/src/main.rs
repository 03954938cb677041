use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use simplex_tableau::{CalculationResult, Simplex, SimplexConfig, Status, Tableau, Tolerance};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "simplex")]
#[command(about = "Solve standard-form LP tableaux with the simplex method", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a tableau and print it
    Parse {
        /// The file to parse ("-" or omitted for stdin)
        file: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = ParseFormat::Pretty)]
        format: ParseFormat,
    },
    /// Run the simplex method and print every tableau
    Solve {
        /// The file containing the tableau ("-" or omitted for stdin)
        file: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = SolveFormat::Text)]
        format: SolveFormat,
        /// Maximum number of pivots
        #[arg(long, default_value_t = simplex_tableau::DEFAULT_MAX_PIVOTS)]
        max_pivots: usize,
        /// Values at or below this are treated as zero in the optimality test
        #[arg(long, default_value_t = simplex_tableau::DEFAULT_TOLERANCE)]
        tolerance: f64,
    },
    /// Check a tableau for errors
    Check {
        /// The file to check ("-" or omitted for stdin)
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ParseFormat {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum SolveFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Parse { file, format } => {
            let tableau = load(file.as_deref());
            match format {
                ParseFormat::Json => println!("{}", to_json(&tableau)),
                ParseFormat::Pretty => print!("{}", tableau),
            }
        }
        Commands::Solve {
            file,
            format,
            max_pivots,
            tolerance,
        } => {
            let tableau = load(file.as_deref());

            let solver = Simplex::new().with_config(SimplexConfig {
                tolerance: Tolerance::new(tolerance),
                max_pivots,
            });
            let result = solver.calculate(&tableau);

            match format {
                SolveFormat::Json => println!("{}", to_json(&result)),
                SolveFormat::Text => print_trace(&result, solver.config().tolerance),
            }

            if !result.status().is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let tableau = load(file.as_deref());
            let name = display_name(file.as_deref());

            println!("✓ {} is valid", name);
            println!("  {} constraint rows", tableau.constraint_rows());
            println!("  {} variable columns", tableau.variable_columns());
            if tableau.is_optimal(Tolerance::default()) {
                println!("  already optimal, no pivot needed");
            }
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }
}

fn display_name(file: Option<&Path>) -> String {
    match file {
        Some(path) if path != Path::new("-") => path.display().to_string(),
        _ => "<stdin>".to_string(),
    }
}

fn read_source(file: Option<&Path>) -> std::io::Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path),
        _ => {
            let mut source = String::new();
            std::io::stdin().read_to_string(&mut source)?;
            Ok(source)
        }
    }
}

fn load(file: Option<&Path>) -> Tableau {
    let source = match read_source(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading {}: {}", display_name(file), e);
            std::process::exit(1);
        }
    };

    match Tableau::parse(&source) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("✗ {} has errors:", display_name(file));
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("Error: {}", e))
}

fn print_trace(result: &CalculationResult, tolerance: Tolerance) {
    print!("{}", result);

    match result.status() {
        Status::Optimal => {
            let last = result.last();
            println!("Status: OPTIMAL");
            println!("Pivots: {}", result.pivot_count());
            println!("Objective: {}", format_value(last.objective_value()));
            println!();
            println!("Basic solution:");
            for (j, value) in last.basic_solution(tolerance).iter().enumerate() {
                if !tolerance.is_zero(*value) {
                    println!("  x{:<4} {:>10}", j + 1, format_value(*value));
                }
            }
        }
        Status::SolutionNotFound => {
            println!("Status: UNBOUNDED");
            println!("No admissible pivot exists; the problem has no finite optimum.");
        }
        Status::MaxPivotsExceeded => {
            println!("Status: PIVOT LIMIT");
            println!(
                "Stopped after {} pivots without reaching optimality (the tableau may be cycling).",
                result.pivot_count()
            );
        }
    }
}

fn format_value(value: f64) -> String {
    match simplex_tableau::Rational::from_f64(value) {
        Ok(r) => r.to_string(),
        Err(_) => value.to_string(),
    }
}
