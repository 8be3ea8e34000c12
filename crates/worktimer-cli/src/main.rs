use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use worktimer_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "worktimer", version, about = "Agency time tracking timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Client projects that time is tracked against
    Subject {
        #[command(subcommand)]
        action: commands::subject::SubjectAction,
    },
    /// Tasks within a subject
    Activity {
        #[command(subcommand)]
        action: commands::activity::ActivityAction,
    },
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Recorded time entries
    Entries {
        #[command(subcommand)]
        action: commands::entries::EntriesAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr so stdout stays machine-readable.
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config);

    let result = match cli.command {
        Commands::Subject { action } => commands::subject::run(action, &config),
        Commands::Activity { action } => commands::activity::run(action, &config),
        Commands::Timer { action } => commands::timer::run(action, &config),
        Commands::Entries { action } => commands::entries::run(action, &config),
        Commands::Config { action } => commands::config::run(action, &config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
