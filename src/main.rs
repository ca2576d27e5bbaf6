//! Staffdesk CLI - operator console for the employee and task store

mod commands;

use clap::{Parser, Subcommand};
use staffdesk::config;
use staffdesk::{Role, SqliteStore, TaskStatus};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "staffdesk")]
#[command(version)]
#[command(about = "Employee accounts and task assignment backed by a local SQLite store")]
#[command(long_about = r#"
Staffdesk keeps employee accounts and their assigned tasks in a local database:
  • HR creates, updates and removes employee accounts
  • HR assigns tasks with a supervising manager and reviews their status
  • Employees accept, reject or complete the tasks assigned to them

Example usage:
  staffdesk init
  staffdesk account add -u alice -p s3cret -r Employee --first-name Alice --last-name Smith -e alice@example.com
  staffdesk task add -t "Q3 audit" --description "Reconcile invoices" -a alice -m hana
  staffdesk task accept 1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database schema
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Sign in and show the view for the account's role
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },

    /// Manage accounts (HR)
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },

    /// Manage and act on tasks
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },

    /// Show account and task counts
    Stats,
}

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Create an account
    Add {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Employee or HR
        #[arg(short, long, default_value = "Employee")]
        role: Role,

        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        job_title: Option<String>,
    },

    /// Delete an account
    Remove { username: String },

    /// Show an account's profile
    Show { username: String },

    /// Change profile fields of an account
    Update {
        username: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(short, long)]
        role: Option<Role>,

        #[arg(long)]
        department: Option<String>,

        #[arg(long)]
        job_title: Option<String>,

        #[arg(short, long)]
        email: Option<String>,
    },

    /// List every non-HR account
    List {
        /// Only print usernames
        #[arg(long)]
        names: bool,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Assign a new task
    Add {
        #[arg(short, long)]
        title: String,

        #[arg(long)]
        description: String,

        /// Username of the assignee
        #[arg(short, long)]
        assignee: String,

        /// Username of the supervising manager
        #[arg(short, long)]
        manager: String,

        #[arg(short, long)]
        feedback: Option<String>,
    },

    /// Overwrite task fields, including status
    Update {
        id: i64,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(short, long)]
        status: Option<TaskStatus>,

        #[arg(short, long)]
        assignee: Option<String>,

        #[arg(short, long)]
        manager: Option<String>,

        #[arg(short, long)]
        feedback: Option<String>,
    },

    /// Delete a task
    Remove { id: i64 },

    /// List every task
    List,

    /// Tasks assigned to a user
    Assigned { username: String },

    /// Tasks supervised by a user
    Managed { username: String },

    /// Accept an assigned task
    Accept { id: i64 },

    /// Reject an assigned task
    Reject { id: i64 },

    /// Complete an accepted task
    Complete { id: i64 },

    /// Show the manager feedback on a task
    Feedback { id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(&self) -> bool {
        matches!(self, OutputMode::Human)
    }
}

pub fn emit_success(
    output_mode: OutputMode,
    command: &str,
    data: serde_json::Value,
) -> anyhow::Result<()> {
    if output_mode == OutputMode::Json {
        let envelope = serde_json::json!({
            "status": "ok",
            "command": command,
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }
    Ok(())
}

fn emit_error(output_mode: OutputMode, err: &anyhow::Error) {
    match output_mode {
        OutputMode::Json => {
            let envelope = serde_json::json!({
                "status": "error",
                "message": err.to_string(),
            });
            println!("{envelope}");
        }
        OutputMode::Human => staffdesk::ui::error(&err.to_string()),
    }
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Err(e) = run(cli, output_mode) {
        emit_error(output_mode, &e);
        std::process::exit(1);
    }
}

fn open_store(config_path: Option<&Path>, database: Option<&Path>) -> anyhow::Result<SqliteStore> {
    let file_config = config::load_config(config_path)?.unwrap_or_default();
    let store = SqliteStore::open(file_config.resolve(database));
    tracing::debug!(path = %store.path().display(), "Using database");
    Ok(store)
}

fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    let database = cli.database.as_deref();

    match cli.command {
        Commands::Init { force } => commands::run_init(config_path, database, force, output_mode),
        Commands::Login { username, password } => {
            let store = open_store(config_path, database)?;
            commands::run_login(&store, &username, &password, output_mode)
        }
        Commands::Account { command } => {
            let store = open_store(config_path, database)?;
            commands::run_account(&store, command, output_mode)
        }
        Commands::Task { command } => {
            let store = open_store(config_path, database)?;
            commands::run_task(&store, command, output_mode)
        }
        Commands::Stats => {
            let store = open_store(config_path, database)?;
            commands::run_stats(&store, output_mode)
        }
    }
}
