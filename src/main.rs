use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::Result;
use std::path::PathBuf;
use todostore::{FilterMode, SqliteStorage, Todo, TodoStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "todostore")]
#[command(about = "TodoStore CLI - Todo list with local persistence")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the store directory (default: platform data directory)
    #[arg(short, long, env = "TODOSTORE_PATH")]
    store_path: Option<PathBuf>,

    /// Which todos to show and to address with `move`
    #[arg(short, long, default_value = "all")]
    filter: FilterMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new todo
    Add { text: String },

    /// Remove a todo by id
    Remove { id: i64 },

    /// Flip a todo between done and not done
    Toggle { id: i64 },

    /// Replace the text of a todo
    Edit { id: i64, text: String },

    /// Complete all todos, or reopen them if all are done
    ToggleAll,

    /// Remove all completed todos
    ClearCompleted,

    /// Move a todo within the filtered list (positions are 0-based)
    Move { from: usize, to: usize },

    /// Show the filtered list
    List,

    /// Show completion statistics
    Stats,

    /// Flip the dark mode preference
    DarkMode,
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("todostore"))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn print_todo(todo: &Todo) {
    if todo.completed {
        println!("[x] {} {}", todo.id.to_string().dimmed(), todo.text.dimmed().strikethrough());
    } else {
        println!("[ ] {} {}", todo.id.to_string().dimmed(), todo.text);
    }
}

fn print_list(store: &TodoStore<SqliteStorage>) {
    let visible = store.filtered_todos();
    if visible.is_empty() {
        println!("{}", format!("No {} todos", store.filter()).dimmed());
    }
    for todo in visible {
        print_todo(todo);
    }
    print_stats(store);
}

fn print_stats(store: &TodoStore<SqliteStorage>) {
    let stats = store.completion_stats();
    let line = format!("{}/{} done ({:.0}%)", stats.completed, stats.total, stats.progress);
    let done = stats.total > 0 && stats.completed == stats.total;
    match (done, store.dark_mode()) {
        (true, true) => println!("{}", line.bright_green()),
        (true, false) => println!("{}", line.green()),
        (false, true) => println!("{}", line.bright_white().bold()),
        (false, false) => println!("{}", line.bold()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store_path = cli.store_path.unwrap_or_else(default_store_path);

    let storage = SqliteStorage::open(&store_path)?;
    let mut store = TodoStore::new(storage);
    store.load_todos();
    store.set_filter(cli.filter);

    match cli.command {
        Commands::Add { text } => {
            store.add_todo(text);
            print_list(&store);
        }
        Commands::Remove { id } => {
            store.remove_todo(id);
            print_list(&store);
        }
        Commands::Toggle { id } => {
            store.toggle_todo(id);
            print_list(&store);
        }
        Commands::Edit { id, text } => {
            store.update_todo_text(id, text);
            print_list(&store);
        }
        Commands::ToggleAll => {
            store.toggle_all();
            print_list(&store);
        }
        Commands::ClearCompleted => {
            store.clear_completed();
            print_list(&store);
        }
        Commands::Move { from, to } => {
            store.reorder_todos(from, to);
            print_list(&store);
        }
        Commands::List => print_list(&store),
        Commands::Stats => print_stats(&store),
        Commands::DarkMode => {
            store.toggle_dark_mode();
            println!("Dark mode {}", if store.dark_mode() { "on" } else { "off" });
        }
    }

    Ok(())
}
