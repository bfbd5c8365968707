//! Command-line front-end for the todo list.
//!
//! # Responsibility
//! - Act as the view layer: turn invocations into view events.
//! - Confirm destructive events (`--yes`) before dispatching them.
//! - Render the list after the model reports a change.

mod render;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use todolist_core::{
    dispatch, init_logging, open_storage, AppConfig, DispatchOutcome, MemoryBackend,
    PersistenceAdapter, StorageService, TodoEvent, TodoFilter, TodoId, TodoModel,
    DEFAULT_STORAGE_PREFIX,
};

#[derive(Parser)]
#[command(name = "todolist")]
#[command(about = "Manage a persistent todo list", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite store file; state is kept in memory when omitted
    #[arg(long, env = "TODOLIST_DB", value_name = "PATH")]
    db: Option<PathBuf>,

    /// Namespace for persisted keys
    #[arg(long, env = "TODOLIST_PREFIX", default_value = DEFAULT_STORAGE_PREFIX)]
    prefix: String,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "TODOLIST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files
    #[arg(long, env = "TODOLIST_LOG_DIR", value_name = "DIR")]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show todos
    List {
        #[arg(long, value_enum, default_value = "all")]
        filter: FilterArg,
    },
    /// Add a todo
    Add {
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Toggle completion of a todo
    Toggle { id: TodoId },
    /// Delete a todo
    Delete {
        id: TodoId,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Replace the text of a todo
    Edit {
        id: TodoId,
        #[arg(value_name = "TEXT")]
        text: String,
    },
    /// Set the due date of a todo (empty string clears it)
    Due {
        id: TodoId,
        #[arg(value_name = "DATE")]
        due_date: String,
    },
    /// Set the importance of a todo: unset|high|medium|low
    Importance {
        id: TodoId,
        #[arg(value_name = "LEVEL")]
        level: String,
    },
    /// Remove all completed todos
    ClearCompleted {
        #[arg(long)]
        yes: bool,
    },
    /// Mark every todo as not completed
    UncheckAll,
    /// Remove every todo
    ClearAll {
        #[arg(long)]
        yes: bool,
    },
    /// Dispatch a raw view event, e.g. '{"type":"toggle-todo","id":1}'
    Event {
        #[arg(value_name = "JSON")]
        payload: String,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Active,
    Completed,
}

impl From<FilterArg> for TodoFilter {
    fn from(value: FilterArg) -> Self {
        match value {
            FilterArg::All => Self::All,
            FilterArg::Active => Self::Active,
            FilterArg::Completed => Self::Completed,
        }
    }
}

/// What one invocation asks for.
enum Request {
    Show(TodoFilter),
    Dispatch { event: TodoEvent, confirmed: bool },
}

impl Commands {
    fn into_request(self) -> Result<Request> {
        let (event, confirmed) = match self {
            Self::List { filter } => return Ok(Request::Show(filter.into())),
            Self::Add { text } => (TodoEvent::AddTodo { text }, false),
            Self::Toggle { id } => (TodoEvent::ToggleTodo { id }, false),
            Self::Delete { id, yes } => (TodoEvent::DeleteTodo { id }, yes),
            Self::Edit { id, text } => (TodoEvent::UpdateTodo { id, text }, false),
            Self::Due { id, due_date } => (TodoEvent::UpdateDueDate { id, due_date }, false),
            Self::Importance { id, level } => (
                TodoEvent::UpdateImportance {
                    id,
                    importance: level.into(),
                },
                false,
            ),
            Self::ClearCompleted { yes } => (TodoEvent::ClearCompleted, yes),
            Self::UncheckAll => (TodoEvent::UncheckAllRemaining, false),
            Self::ClearAll { yes } => (TodoEvent::ClearAll, yes),
            Self::Event { payload, yes } => (
                TodoEvent::from_json(&payload).context("invalid event payload")?,
                yes,
            ),
        };
        Ok(Request::Dispatch { event, confirmed })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig {
        storage_prefix: cli.prefix,
        db_path: cli.db,
        log_level: cli
            .log_level
            .unwrap_or_else(|| todolist_core::default_log_level().to_string()),
        log_dir: cli.log_dir,
    }
    .normalized()
    .map_err(anyhow::Error::msg)?;

    if let Some(log_dir) = &config.log_dir {
        let log_dir = log_dir
            .to_str()
            .context("log directory must be valid UTF-8")?;
        init_logging(&config.log_level, log_dir).map_err(anyhow::Error::msg)?;
    }

    let request = cli.command.into_request()?;

    match open_storage(&config) {
        Ok(storage) => run(TodoModel::new(storage), request),
        Err(err) => {
            warn!("event=storage_open module=cli status=error error={err}");
            eprintln!("warning: store unavailable ({err}); changes will not survive this run");
            run(
                TodoModel::new(StorageService::with_prefix(
                    MemoryBackend::new(),
                    config.storage_prefix.as_str(),
                )),
                request,
            )
        }
    }
}

fn run<S: PersistenceAdapter>(mut model: TodoModel<S>, request: Request) -> Result<()> {
    let (event, confirmed) = match request {
        Request::Show(filter) => {
            print!("{}", render::render_list(&model, filter));
            return Ok(());
        }
        Request::Dispatch { event, confirmed } => (event, confirmed),
    };

    if event.is_destructive() && !confirmed {
        bail!("`{}` removes todos; re-run with --yes to confirm", event.name());
    }

    let changed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&changed);
    model.subscribe(move || flag.set(true));

    if dispatch(&mut model, event) == DispatchOutcome::Ignored {
        println!("nothing changed");
    }
    if changed.get() {
        print!("{}", render::render_list(&model, TodoFilter::All));
    }
    Ok(())
}
