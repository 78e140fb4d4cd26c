//! # Lium CLI
//!
//! Command-line interface for the Lium GPU pod platform.
//! This crate provides the CLI structure, argument parsing, and command routing.

pub mod commands;
pub mod config;
pub mod display;
pub mod resolvers;
pub mod storage;

// Re-export common types
pub use config::Config;

use clap::{Parser, Subcommand};
use log::LevelFilter;
use thiserror::Error;

/// Application-level errors for the CLI
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Core domain error: {0}")]
    Core(#[from] lium_core::LiumError),

    #[error("{0}")]
    Api(#[from] lium_api::ApiError),

    #[error("Utils error: {0}")]
    Utils(#[from] lium_utils::UtilsError),

    #[error("Config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Other(format!("Input error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

/// Main CLI struct
#[derive(Parser)]
#[command(name = "lium")]
#[command(about = "Rent and drive GPU pods from the command line")]
#[command(version)]
pub struct Cli {
    /// Debug logging for lium crates
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// All available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Set up API key and SSH key interactively
    Init,
    /// List available executors
    Ls(commands::ls::LsArgs),
    /// Rent a pod on an executor
    Up(commands::up::UpArgs),
    /// List active pods
    Ps(commands::ps::PsArgs),
    /// Execute a command on one or more pods
    #[command(long_about = "Execute a command on one or more running pods via SSH.\n\n\
        Examples:\n  \
        lium exec 1 nvidia-smi\n  \
        lium exec 1,2,3 uptime\n  \
        lium exec all --script setup.sh\n  \
        lium exec 2 --env TOKEN=abc -- sh -c 'echo $TOKEN'")]
    Exec(commands::exec::ExecArgs),
    /// Open an interactive SSH session
    Ssh(commands::ssh::SshArgs),
    /// Copy files to or from pods
    Scp(commands::scp::ScpArgs),
    /// Sync a directory with pods using rsync
    Rsync(commands::rsync::RsyncArgs),
    /// Remove pods, now or on a schedule
    #[command(visible_alias = "down")]
    Rm(commands::rm::RmArgs),
    /// Reboot pods
    Reboot(commands::reboot::RebootArgs),
    /// List templates
    Templates(commands::templates::TemplatesArgs),
    /// Build, push and register a Docker image as a template
    Image(commands::image::ImageArgs),
    /// Switch a pod to another template
    Switch(commands::switch::SwitchArgs),
    /// Edit the template of a pod
    Edit(commands::edit::EditArgs),
    /// Manage volumes
    Volumes {
        #[command(subcommand)]
        action: Option<commands::volumes::VolumeCommands>,
    },
    /// Manage pod backups
    Backup {
        #[command(subcommand)]
        action: commands::backup::BackupCommands,
    },
    /// Manage scheduled pod removal
    Schedule {
        #[command(subcommand)]
        action: commands::schedule::ScheduleCommands,
    },
    /// Install Jupyter on a pod
    Jupyter(commands::jupyter::JupyterArgs),
    /// Balance, wallets and payments
    Fund {
        #[command(subcommand)]
        action: commands::fund::FundCommands,
    },
    /// Run a Python script on a fresh GPU pod
    Run(commands::run::RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigCommands,
    },
    /// Theme management
    Theme {
        #[command(subcommand)]
        action: commands::theme::ThemeCommands,
    },
}

/// Install env_logger. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let mut builder = if std::env::var_os("RUST_LOG").is_some() {
        env_logger::Builder::from_default_env()
    } else {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(LevelFilter::Warn);
        if verbose {
            for module in ["lium", "lium_cli", "lium_api", "lium_utils", "lium_core"] {
                builder.filter_module(module, LevelFilter::Debug);
            }
        }
        builder
    };
    builder.format_timestamp(None);
    let _ = builder.try_init();
}

/// Main CLI runner
pub async fn run() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load()?;
    commands::theme::apply(&config.theme());

    match cli.command {
        Commands::Init => commands::init::handle(&mut config).await,
        Commands::Ls(args) => commands::ls::handle(args, &mut config).await,
        Commands::Up(args) => commands::up::handle(args, &config).await,
        Commands::Ps(args) => commands::ps::handle(args, &mut config).await,
        Commands::Exec(args) => commands::exec::handle(args, &config).await,
        Commands::Ssh(args) => commands::ssh::handle(args, &config).await,
        Commands::Scp(args) => commands::scp::handle(args, &config).await,
        Commands::Rsync(args) => commands::rsync::handle(args, &config).await,
        Commands::Rm(args) => commands::rm::handle(args, &config).await,
        Commands::Reboot(args) => commands::reboot::handle(args, &config).await,
        Commands::Templates(args) => commands::templates::handle(args, &config).await,
        Commands::Image(args) => commands::image::handle(args, &config).await,
        Commands::Switch(args) => commands::switch::handle(args, &config).await,
        Commands::Edit(args) => commands::edit::handle(args, &config).await,
        Commands::Volumes { action } => commands::volumes::handle(action, &mut config).await,
        Commands::Backup { action } => commands::backup::handle(action, &mut config).await,
        Commands::Schedule { action } => commands::schedule::handle(action, &config).await,
        Commands::Jupyter(args) => commands::jupyter::handle(args, &config).await,
        Commands::Fund { action } => commands::fund::handle(action, &config).await,
        Commands::Run(args) => commands::run::handle(args, &config).await,
        Commands::Config { action } => commands::config::handle(action, &mut config).await,
        Commands::Theme { action } => commands::theme::handle(action, &mut config).await,
    }
}
