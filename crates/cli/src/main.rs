//! Command-line front end for Taskdeck
//!
//! Opens the on-disk task board and runs one command against it.

mod output;

use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskdeck_core::filter::{StatusFilter, TaskFilter};
use taskdeck_core::storage::ImportRequest;
use taskdeck_core::task::{CreateTaskRequest, TaskPriority, TaskUpdate};
use taskdeck_core::{Config, TaskBoard};

#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about = "Local task and category manager")]
struct Cli {
    /// Data directory (overrides TASKDECK_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List tasks, pending first, then by priority and age
    List {
        #[arg(long, default_value = "all", value_parser = parse_status)]
        status: StatusFilter,
        #[arg(long)]
        category: Option<String>,
    },
    /// Create a task
    Add(AddArgs),
    /// Edit fields of an existing task
    Edit(EditArgs),
    /// Flip a task between pending and completed
    Toggle { id: String },
    /// Delete a task
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Show task counts
    Stats,
    /// Manage categories
    #[command(subcommand)]
    Categories(CategoryCommand),
    /// Manage named settings
    #[command(subcommand)]
    Setting(SettingCommand),
    /// Write tasks and categories as JSON
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Restore tasks and/or categories from a JSON export
    Import { file: PathBuf },
    /// Remove all tasks, categories and settings
    Clear {
        #[arg(long)]
        yes: bool,
    },
    /// Show what the primary store holds
    Info,
}

#[derive(Debug, Args)]
struct AddArgs {
    title: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, default_value = "medium", value_parser = parse_priority)]
    priority: TaskPriority,
    /// Due date in RFC 3339 form
    #[arg(long, value_parser = parse_timestamp)]
    due: Option<DateTime<Utc>>,
}

#[derive(Debug, Args)]
struct EditArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    /// New description; an empty value clears it
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = parse_priority)]
    priority: Option<TaskPriority>,
    #[arg(long)]
    category: Option<String>,
}

#[derive(Debug, Subcommand)]
enum CategoryCommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "#667eea")]
        color: String,
        #[arg(long, default_value = "folder")]
        icon: String,
    },
    /// Delete a category that no task references
    Delete {
        id: String,
        #[arg(long)]
        yes: bool,
    },
    /// Replace every category with the built-in defaults
    Reset,
}

#[derive(Debug, Subcommand)]
enum SettingCommand {
    Get { key: String },
    /// Store a JSON value
    Set { key: String, value: String },
    Remove { key: String },
}

fn parse_status(raw: &str) -> Result<StatusFilter, String> {
    raw.parse().map_err(|e: taskdeck_core::Error| e.to_string())
}

fn parse_priority(raw: &str) -> Result<TaskPriority, String> {
    raw.parse().map_err(|e: taskdeck_core::Error| e.to_string())
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn require_confirmation(yes: bool, action: &str) -> anyhow::Result<()> {
    if !yes {
        bail!("Refusing to {} without --yes", action);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(data_dir) = cli.data_dir.clone() {
        config = config.with_data_dir(data_dir);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Running {:?}", cli.command);
    let board = TaskBoard::open(&config).await;
    run(&board, cli.command).await
}

async fn run(board: &TaskBoard, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List { status, category } => {
            let view = board.list_view();
            view.set_filter(TaskFilter {
                status,
                category_id: category,
            });
            let categories = view.categories();
            for task in view.visible() {
                println!("{}", output::task_line(&task, &categories));
            }
        }
        Command::Add(args) => {
            let mut request = CreateTaskRequest::new(args.title, args.category)
                .with_priority(args.priority);
            if let Some(description) = args.description {
                request = request.with_description(description);
            }
            if let Some(due) = args.due {
                request = request.with_due_date(due);
            }
            let task = board.add_task(request).await?;
            println!("{}", task.id);
        }
        Command::Edit(args) => {
            let mut update = TaskUpdate::new();
            if let Some(title) = args.title {
                update = update.title(title);
            }
            if let Some(description) = args.description {
                update = update.description(description);
            }
            if let Some(priority) = args.priority {
                update = update.priority(priority);
            }
            if let Some(category) = args.category {
                update = update.category_id(category);
            }
            if update.is_empty() {
                bail!("Nothing to change");
            }
            let task = board.update_task(&args.id, update).await?;
            println!("{}", output::task_line(&task, &board.categories().all()));
        }
        Command::Toggle { id } => {
            let task = board
                .tasks()
                .toggle(&id)
                .await
                .with_context(|| format!("Task not found: {}", id))?;
            println!("{}", output::task_line(&task, &board.categories().all()));
        }
        Command::Delete { id, yes } => {
            require_confirmation(yes, "delete a task")?;
            board
                .tasks()
                .delete(&id)
                .await
                .with_context(|| format!("Task not found: {}", id))?;
        }
        Command::Stats => {
            println!("{}", serde_json::to_string_pretty(&board.tasks().stats())?);
        }
        Command::Categories(command) => run_category(board, command).await?,
        Command::Setting(command) => run_setting(board, command).await?,
        Command::Export { output } => {
            let content = serde_json::to_string_pretty(&board.export_all())?;
            match output {
                Some(path) => tokio::fs::write(&path, content)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?,
                None => println!("{}", content),
            }
        }
        Command::Import { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let request: ImportRequest =
                serde_json::from_str(&content).context("Invalid backup file")?;
            board.import_all(request).await;
        }
        Command::Clear { yes } => {
            require_confirmation(yes, "clear all data")?;
            board.clear_all().await?;
        }
        Command::Info => {
            let info = board.storage_info().await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }
    Ok(())
}

async fn run_category(board: &TaskBoard, command: CategoryCommand) -> anyhow::Result<()> {
    match command {
        CategoryCommand::List => {
            for category in board.categories().all() {
                let count = board.tasks().count_for_category(&category.id);
                println!("{}", output::category_line(&category, count));
            }
        }
        CategoryCommand::Add { name, color, icon } => {
            let category = board.categories().add(&name, color, icon).await?;
            println!("{}", category.id);
        }
        CategoryCommand::Delete { id, yes } => {
            require_confirmation(yes, "delete a category")?;
            board.delete_category(&id).await?;
        }
        CategoryCommand::Reset => board.categories().reset_to_defaults().await,
    }
    Ok(())
}

async fn run_setting(board: &TaskBoard, command: SettingCommand) -> anyhow::Result<()> {
    let store = board.store();
    match command {
        SettingCommand::Get { key } => {
            let value = store
                .load_setting(&key, serde_json::Value::Null)
                .await;
            println!("{}", value);
        }
        SettingCommand::Set { key, value } => {
            let value: serde_json::Value =
                serde_json::from_str(&value).context("Setting value must be JSON")?;
            store.save_setting(&key, &value).await?;
        }
        SettingCommand::Remove { key } => store.remove_setting(&key).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::config::FallbackKind;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("taskdeck").chain(args.iter().copied())).unwrap()
    }

    async fn open_board(temp: &TempDir) -> TaskBoard {
        let mut config = Config::default().with_data_dir(temp.path());
        config.fallback = FallbackKind::Memory;
        TaskBoard::open(&config).await
    }

    #[test]
    fn test_parse_list_filters() {
        let cli = parse(&["list", "--status", "pending", "--category", "default-2"]);
        match cli.command {
            Command::List { status, category } => {
                assert_eq!(status, StatusFilter::Pending);
                assert_eq!(category.as_deref(), Some("default-2"));
            }
            other => panic!("Expected List, got: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_priority() {
        let result = Cli::try_parse_from([
            "taskdeck",
            "add",
            "Title",
            "--category",
            "default-1",
            "--priority",
            "urgent",
        ]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_add_and_toggle_commands() {
        let temp = TempDir::new().unwrap();
        let board = open_board(&temp).await;

        let cli = parse(&["add", "Buy milk", "--category", "default-1", "--priority", "high"]);
        run(&board, cli.command).await.unwrap();

        let task = board.tasks().all().pop().unwrap();
        assert_eq!(task.priority, TaskPriority::High);

        run(&board, parse(&["toggle", task.id.as_str()]).command).await.unwrap();
        assert!(board.tasks().get(&task.id).unwrap().completed);
    }

    #[tokio::test]
    async fn test_destructive_commands_need_confirmation() {
        let temp = TempDir::new().unwrap();
        let board = open_board(&temp).await;

        assert!(run(&board, parse(&["clear"]).command).await.is_err());
        assert!(run(&board, parse(&["categories", "delete", "default-1"]).command)
            .await
            .is_err());
        assert_eq!(board.categories().all().len(), 3);

        run(&board, parse(&["categories", "delete", "default-1", "--yes"]).command)
            .await
            .unwrap();
        assert_eq!(board.categories().all().len(), 2);
    }

    #[tokio::test]
    async fn test_setting_commands() {
        let temp = TempDir::new().unwrap();
        let board = open_board(&temp).await;

        run(&board, parse(&["setting", "set", "theme", "\"dark\""]).command)
            .await
            .unwrap();
        let theme: String = board.store().load_setting("theme", String::new()).await;
        assert_eq!(theme, "dark");

        assert!(run(&board, parse(&["setting", "set", "theme", "dark"]).command)
            .await
            .is_err());
    }
}
