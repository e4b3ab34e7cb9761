//! Campus Tasks CLI
//!
//! Main entry point for the `campus` command-line tool.
//! Searches campus tasks and answers questions about them from task knowledge.

mod commands;
mod loader;
mod state;

use campus_core::{config::AppConfig, logging, AppResult};
use clap::{Parser, Subcommand};
use commands::{ChatCommand, CheckCommand, SearchCommand, StatsCommand};
use state::CampusState;
use std::path::PathBuf;

/// Campus Tasks - task search and knowledge-grounded answers
#[derive(Parser, Debug)]
#[command(name = "campus")]
#[command(about = "Search campus tasks and ask questions about them", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "CAMPUS_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "CAMPUS_CONFIG")]
    config: Option<PathBuf>,

    /// Task collection (JSON array or JSON Lines)
    #[arg(long, global = true, env = "CAMPUS_TASKS")]
    tasks: Option<PathBuf>,

    /// Knowledge collection (JSON array or JSON Lines)
    #[arg(long, global = true, env = "CAMPUS_KNOWLEDGE")]
    knowledge: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Client identity used for rate limiting
    #[arg(long, global = true, env = "CAMPUS_CLIENT", default_value = "cli")]
    client: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rank tasks by relevance to a query
    Search(SearchCommand),

    /// Ask a question about a task
    Chat(ChatCommand),

    /// Show index and service statistics
    Stats(StatsCommand),

    /// Check that tasks and knowledge line up
    Check(CheckCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Workspace and config file must be known before the file is merged
    let path_flag = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());
    let config = AppConfig::load_with(|key| match key {
        "CAMPUS_WORKSPACE" => path_flag(&cli.workspace),
        "CAMPUS_CONFIG" => path_flag(&cli.config),
        _ => std::env::var(key).ok(),
    })?
    .with_overrides(
        cli.workspace,
        cli.config,
        cli.tasks,
        cli.knowledge,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::info!("Campus CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.generator.provider);

    let command_name = match &cli.command {
        Commands::Search(_) => "search",
        Commands::Chat(_) => "chat",
        Commands::Stats(_) => "stats",
        Commands::Check(_) => "check",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let state = bootstrap(config)?;

    let result = match cli.command {
        Commands::Search(cmd) => cmd.execute(&state, &cli.client),
        Commands::Chat(cmd) => cmd.execute(&state, &cli.client).await,
        Commands::Stats(cmd) => cmd.execute(&state),
        Commands::Check(cmd) => cmd.execute(&state),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

/// Build the service state and load both data collections into it.
fn bootstrap(config: AppConfig) -> AppResult<CampusState> {
    let generator = campus_llm::create_generator(&config.generator)?;
    let tasks = loader::load_tasks(&config.resolve_path(&config.tasks_path))?;
    let knowledge = loader::load_knowledge(&config.resolve_path(&config.knowledge_path))?;

    let state = CampusState::new(config, generator)?;
    state.load(tasks, knowledge);
    Ok(state)
}
