use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use task_dashboard::cache::FileCache;
use task_dashboard::config::{AppConfig, GlobalArgs};
use task_dashboard::dashboard::{Dashboard, SortBy};
use task_dashboard::history::UndoRedoLog;
use task_dashboard::models::{Priority, Status};
use task_dashboard::repository::HttpTaskRepository;
use task_dashboard::routes_tasks;
use task_dashboard::store::JsonFileDb;
use task_dashboard::task_store::{ExportFormat, TaskStore};
use task_dashboard::validation::TaskDraft;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser, Debug)]
#[command(version, about = "Task dashboard: REST backend and client")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST backend.
    Serve,
    #[command(flatten)]
    Client(ClientCommand),
}

#[derive(Subcommand, Debug)]
enum ClientCommand {
    /// List tasks.
    List {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<Status>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "priority")]
        sort: SortBy,
    },
    /// Add a task.
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: String,
        /// `YYYY-MM-DD` or RFC 3339.
        #[arg(long)]
        due: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Comma separated.
        #[arg(long, default_value = "")]
        tags: String,
        #[arg(long)]
        assigned_to: Option<String>,
        /// Minutes.
        #[arg(long)]
        estimate: Option<String>,
    },
    /// Flip a task between done and todo.
    Toggle { id: String },
    /// Delete a task.
    Delete { id: String },
    /// Write tasks.json or tasks.csv.
    Export {
        #[arg(long, default_value = "json")]
        format: ExportFormat,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load(&cli.global) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let result = match cli.command {
        Command::Serve => serve(&config).await,
        Command::Client(command) => run_client(&config, command).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn serve(config: &AppConfig) -> Result<(), BoxError> {
    let db = JsonFileDb::new(&config.db_path);
    let static_dir = config.static_dir.is_dir().then_some(config.static_dir.as_path());
    let app = routes_tasks::app(db, static_dir);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let addr = listener.local_addr()?;

    tracing::info!(%addr, db = %config.db_path.display(), "task backend listening");
    if let Some(dir) = static_dir {
        tracing::info!(dir = %dir.display(), "serving static files");
    }

    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_client(config: &AppConfig, command: ClientCommand) -> Result<(), BoxError> {
    let store = TaskStore::new(
        Arc::new(HttpTaskRepository::new(&config.api_base)),
        Arc::new(FileCache::new(&config.cache_dir)),
        UndoRedoLog::shared(),
    );
    let mut dashboard = Dashboard::new(store);
    dashboard.mount(Vec::new());
    if let Err(e) = dashboard.store().fetch_tasks().await {
        tracing::warn!(error = %e, "showing cached tasks");
    }

    match command {
        ClientCommand::List {
            search,
            status,
            priority,
            category,
            sort,
        } => {
            dashboard.set_search(&search);
            dashboard.set_status_filter(status);
            dashboard.set_priority_filter(priority);
            dashboard.set_category_filter(category);
            dashboard.set_sort(sort);
            let visible = dashboard.visible_tasks();
            if visible.is_empty() {
                println!("No tasks found. Start by adding a task!");
            }
            for t in visible {
                println!(
                    "{}  [{:<11}] {:<6} {}  ({}, due {})",
                    t.id,
                    t.status,
                    t.priority,
                    t.title,
                    t.category,
                    t.due_date.format("%Y-%m-%d")
                );
            }
        }
        ClientCommand::Add {
            title,
            description,
            category,
            due,
            priority,
            tags,
            assigned_to,
            estimate,
        } => {
            let draft = TaskDraft {
                title,
                description,
                priority,
                status: Status::Todo,
                category,
                tags,
                due_date: due,
                assigned_to,
                estimated_time: estimate,
            };
            let task = dashboard.add_task(draft).await?;
            println!("added {}", task.id);
        }
        ClientCommand::Toggle { id } => {
            dashboard.toggle_complete(&id).await?;
            if let Some(t) = dashboard.store().find(&id) {
                println!("{} is now {}", t.id, t.status);
            }
        }
        ClientCommand::Delete { id } => {
            dashboard.delete_task(&id).await?;
            println!("deleted {id}");
        }
        ClientCommand::Export { format, out } => {
            let path = dashboard.export(format, &out)?;
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
