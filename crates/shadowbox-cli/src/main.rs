use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "shadowbox-cli", version, about = "Shadowbox CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a shadow-boxing workout
    Workout(commands::workout::WorkoutArgs),
    /// Guided breathing exercise
    Breathe(commands::breathe::BreatheArgs),
    /// Count-up stopwatch with round splits
    Stopwatch(commands::stopwatch::StopwatchArgs),
    /// Print combos without running a workout
    Combo(commands::combo::ComboArgs),
    /// Workout streak and totals
    Stats,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SHADOWBOX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Workout(args) => commands::workout::run(args),
        Commands::Breathe(args) => commands::breathe::run(args),
        Commands::Stopwatch(args) => commands::stopwatch::run(args),
        Commands::Combo(args) => commands::combo::run(args),
        Commands::Stats => commands::stats::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
