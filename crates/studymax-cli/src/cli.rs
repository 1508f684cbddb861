use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use studymax_core::{Day, TaskFilter, Workload};

#[derive(Parser)]
#[command(name = "studymax")]
#[command(about = "Classes, tasks and documents for students", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database file (overrides storage.path in the config)
    #[arg(long, global = true, env = "STUDYMAX_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage classes
    #[command(subcommand)]
    Class(ClassCommands),

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommands),

    /// Manage uploaded documents
    #[command(subcommand)]
    Document(DocumentCommands),

    /// Show database location, version and collection sizes
    Info,
}

#[derive(Subcommand)]
pub enum ClassCommands {
    /// Add a class
    Add {
        /// Course title (must be unique)
        title: String,

        #[arg(long)]
        description: Option<String>,

        /// Meeting days, e.g. "Mon,Wed" or "Monday,Wednesday"
        #[arg(long, value_delimiter = ',')]
        days: Vec<Day>,

        /// Meeting time, e.g. "09:00"
        #[arg(long)]
        time: Option<String>,

        /// Display color, e.g. "#4f46e5"
        #[arg(long)]
        color: Option<String>,
    },

    /// List classes
    List {
        /// Only classes meeting on this day
        #[arg(long)]
        day: Option<Day>,
    },

    /// Remove a class
    Remove {
        id: i64,

        /// Also remove the class's tasks and documents
        #[arg(long)]
        cascade: bool,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task to a class
    Add {
        title: String,

        /// Title of the class this task belongs to
        #[arg(long)]
        class: String,

        /// Deadline as YYYY-MM-DDTHH:MM
        #[arg(long)]
        deadline: String,

        #[arg(long)]
        description: Option<String>,

        /// Light, Moderate, Heavy or "Very Heavy"
        #[arg(long)]
        workload: Option<Workload>,

        #[arg(long)]
        notes: Option<String>,

        /// File to attach
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List tasks, pending first
    List {
        #[arg(long, value_enum, default_value = "all")]
        status: Status,

        /// Only tasks for this class title
        #[arg(long)]
        class: Option<String>,
    },

    /// Mark a task as completed
    Complete {
        id: i64,

        /// Mark it pending again instead
        #[arg(long)]
        undo: bool,
    },

    /// Remove a task
    Remove { id: i64 },
}

#[derive(Subcommand)]
pub enum DocumentCommands {
    /// Upload a file against a class
    Add {
        path: PathBuf,

        /// Title of the class this document belongs to
        #[arg(long)]
        class: String,

        /// Title to store instead of the file name
        #[arg(long)]
        title: Option<String>,

        /// MIME type (guessed from the extension by default)
        #[arg(long)]
        mime: Option<String>,
    },

    /// List documents
    List {
        /// Only documents for this class title
        #[arg(long)]
        class: Option<String>,
    },

    /// Save a document's content to disk
    Download {
        id: i64,

        /// Output path (defaults to the document title in the current directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Remove a document
    Remove { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Status {
    All,
    Pending,
    Completed,
}

impl From<Status> for TaskFilter {
    fn from(status: Status) -> Self {
        match status {
            Status::All => TaskFilter::All,
            Status::Pending => TaskFilter::Pending,
            Status::Completed => TaskFilter::Completed,
        }
    }
}
