mod commands;
mod context;
mod logging;
mod output;

use std::path::PathBuf;

use cc_protocol::{AdminAction, SubpluginKind};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cleanupcourses",
    version,
    about = "Flag stale courses and drive them through cleanup steps"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project directory containing `.cleanup-courses/`
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the `.cleanup-courses` configuration directory
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
        /// Only write config.toml
        #[arg(long)]
        minimal: bool,
    },
    /// List and reorder trigger subplugins
    Trigger {
        #[command(subcommand)]
        action: SubpluginCommand,
    },
    /// List and reorder step subplugins
    Step {
        #[command(subcommand)]
        action: SubpluginCommand,
    },
    /// Flag courses through the enabled trigger chain
    Evaluate {
        /// Show decisions without creating entries
        #[arg(long)]
        dry_run: bool,
    },
    /// Run the current step of every pending entry once
    Advance,
    /// Evaluate, then advance (the scheduled task)
    Run,
    /// Supply input to an entry awaiting it
    Resume {
        course_id: i64,
        /// Input as JSON, e.g. '{"fullname": "...", "shortname": "..."}'
        input: String,
    },
    /// Put a failed entry back to pending
    Retry { course_id: i64 },
    /// Archive a failed entry
    Dismiss { course_id: i64 },
    /// Show live entries, or archived ones with --history
    Status {
        #[arg(long)]
        history: bool,
        /// Limit to one course
        #[arg(long)]
        course: Option<i64>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List or restore course backups
    Backups {
        #[command(subcommand)]
        action: BackupCommand,
    },
}

#[derive(Subcommand)]
pub enum SubpluginCommand {
    /// Show registered subplugins in chain order
    List,
    /// Append to the enabled chain
    Enable { id: i64 },
    /// Remove from the enabled chain
    Disable { id: i64 },
    /// Move one position earlier
    Up { id: i64 },
    /// Move one position later
    Down { id: i64 },
}

impl SubpluginCommand {
    /// The registry action, or `None` for `list`.
    fn action(&self) -> Option<(AdminAction, i64)> {
        match *self {
            SubpluginCommand::List => None,
            SubpluginCommand::Enable { id } => Some((AdminAction::Enable, id)),
            SubpluginCommand::Disable { id } => Some((AdminAction::Disable, id)),
            SubpluginCommand::Up { id } => Some((AdminAction::MoveUp, id)),
            SubpluginCommand::Down { id } => Some((AdminAction::MoveDown, id)),
        }
    }
}

#[derive(Subcommand)]
pub enum BackupCommand {
    /// Show recorded backups, newest first
    List {
        #[arg(long)]
        course: Option<i64>,
    },
    /// Restore a backup as a new course
    Restore { backup_id: i64 },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    logging::init(&cli.log_level);

    match cli.command {
        Commands::Init { force, minimal } => commands::init::execute(&cli.root, force, minimal).await,
        Commands::Trigger { action } => {
            commands::subplugins::execute(&cli.root, SubpluginKind::Trigger, action.action()).await
        }
        Commands::Step { action } => {
            commands::subplugins::execute(&cli.root, SubpluginKind::Step, action.action()).await
        }
        Commands::Evaluate { dry_run } => commands::run::evaluate(&cli.root, dry_run).await,
        Commands::Advance => commands::run::advance(&cli.root).await,
        Commands::Run => commands::run::run(&cli.root).await,
        Commands::Resume { course_id, input } => {
            commands::entries::resume(&cli.root, course_id, &input).await
        }
        Commands::Retry { course_id } => commands::entries::retry(&cli.root, course_id).await,
        Commands::Dismiss { course_id } => commands::entries::dismiss(&cli.root, course_id).await,
        Commands::Status {
            history,
            course,
            json,
        } => commands::entries::status(&cli.root, history, course, json).await,
        Commands::Backups { action } => match action {
            BackupCommand::List { course } => commands::backups::list(&cli.root, course).await,
            BackupCommand::Restore { backup_id } => {
                commands::backups::restore(&cli.root, backup_id).await
            }
        },
    }
}
