use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "studymaestro-cli", version, about = "StudyMaestro CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Subject management
    Subject {
        #[command(subcommand)]
        action: commands::subject::SubjectAction,
    },
    /// Task management
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Study session history
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Overview of subjects, upcoming tasks and recent sessions
    Dashboard {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Stopwatch for a study session
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env("STUDYMAESTRO_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = studymaestro_core::Config::load_or_default();
    init_logging(&config.logging.level);

    let result = match cli.command {
        Commands::Subject { action } => commands::subject::run(action).await,
        Commands::Task { action } => commands::task::run(action).await,
        Commands::Session { action } => commands::session::run(action).await,
        Commands::Dashboard { json } => commands::dashboard::run(json).await,
        Commands::Timer { action } => commands::timer::run(action).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
