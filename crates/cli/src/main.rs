//! TaskVault command-line interface
//!
//! Presentation layer over `tv-core`: each invocation restores the session
//! from the data directory, runs one command against the managers, and
//! renders their notifications.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tv_core::event::{EventSink, NavTarget, Notification, Severity};
use tv_core::session::{SessionManager, StaticVerifier, User};
use tv_core::storage::FileStore;
use tv_core::task::{TaskDraft, TaskFilter, TaskPatch, TaskStore};

#[derive(Parser)]
#[command(name = "taskvault", about = "Local-first per-user task manager", version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Data directory for the persistent store
    #[arg(long, env = "TV_DATA_DIR", default_value = ".tv-data", global = true)]
    data_dir: PathBuf,

    /// Log filter (e.g. "tv_core=debug")
    #[arg(long, env = "TV_LOG", global = true)]
    log: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Log in (demo credentials: demo@example.com / password)
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Register a new account and log in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the session and clear stored task data
    Logout,
    /// Show the current session
    Whoami,
    /// Add a task
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: NaiveDate,
    },
    /// List tasks
    List {
        /// all, completed or pending
        #[arg(long, default_value = "all")]
        filter: TaskFilter,
    },
    /// Edit a task
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Completion flag (true or false)
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Flip a task's completion flag
    Toggle { id: String },
    /// Delete a task
    Rm { id: String },
}

/// Renders notifications to the terminal; navigation requests become hints
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Normal => {
                println!("{}: {}", notification.title, notification.description)
            }
            Severity::Destructive => {
                eprintln!("{}: {}", notification.title, notification.description)
            }
        }
    }

    fn navigate(&self, target: NavTarget) {
        match target {
            NavTarget::Dashboard => tracing::debug!("navigation requested: dashboard"),
            NavTarget::Landing => tracing::debug!("navigation requested: landing"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log.as_deref());

    let store = Arc::new(
        FileStore::open(args.data_dir.join("store.json"))
            .await
            .context("failed to open data store")?,
    );
    let sink: Arc<dyn EventSink> = Arc::new(ConsoleSink);
    let session = SessionManager::new(
        store.clone(),
        Arc::new(StaticVerifier::demo()),
        sink.clone(),
    );
    let tasks = TaskStore::new(store, sink);

    let user = session.initialize().await?;

    match args.command {
        Command::Login { email, password } => {
            session.login(&email, &password).await?;
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            session.register(&name, &email, &password).await?;
        }
        Command::Logout => {
            tasks.clear().await;
            session.logout().await?;
        }
        Command::Whoami => match user {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.id),
            None => println!("Not logged in."),
        },
        command => {
            let user = user
                .context("not logged in; run `taskvault login` or `taskvault register` first")?;
            run_task_command(&tasks, &user, command).await?;
        }
    }

    Ok(())
}

async fn run_task_command(tasks: &TaskStore, user: &User, command: Command) -> anyhow::Result<()> {
    // A corrupt collection is reported but leaves an empty, usable list
    if let Err(err) = tasks.load(user).await {
        tracing::warn!("Task collection reset: {}", err);
    }

    match command {
        Command::Add {
            title,
            description,
            due,
        } => {
            let task = tasks
                .add(TaskDraft::new(title, due).with_description(description))
                .await?;
            println!("{}", task.id);
        }
        Command::List { filter } => {
            let list = tasks.filtered(filter).await;
            if list.is_empty() {
                println!("No tasks.");
            }
            for task in list {
                let mark = if task.completed { "x" } else { " " };
                println!("[{}] {}  {}  (due {})", mark, task.id, task.title, task.due_date);
                if !task.description.is_empty() {
                    println!("      {}", task.description);
                }
            }
        }
        Command::Edit {
            id,
            title,
            description,
            due,
            completed,
        } => {
            let patch = TaskPatch {
                title,
                description,
                due_date: due,
                completed,
            };
            tasks.update(&id, patch).await?;
        }
        Command::Toggle { id } => {
            let task = tasks.toggle(&id).await?;
            let state = if task.completed { "completed" } else { "pending" };
            println!("\"{}\" is now {}.", task.title, state);
        }
        Command::Rm { id } => {
            tasks.delete(&id).await?;
        }
        Command::Login { .. }
        | Command::Register { .. }
        | Command::Logout
        | Command::Whoami => unreachable!("session commands are handled in main"),
    }

    Ok(())
}

fn init_tracing(filter: Option<&str>) {
    let filter = filter
        .map(str::to_owned)
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "tv_core=info,taskvault=info".to_string());

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}
