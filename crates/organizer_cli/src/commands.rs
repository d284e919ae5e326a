use clap::{Args, Parser, Subcommand};
use organizer_core::RecordId;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "organizer")]
#[command(version, about = "Tasks, notes, transactions and trader balances in one local store")]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite database file (overrides ORGANIZER_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Absolute directory for rolling log files (overrides ORGANIZER_LOG_DIR)
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log level for file logs: trace, debug, info, warn or error
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage tasks
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        action: NoteAction,
    },
    /// Manage financial transactions
    Tx {
        #[command(subcommand)]
        action: TxAction,
    },
    /// Manage trader balances
    Trader {
        #[command(subcommand)]
        action: TraderAction,
    },
    /// Send the incomplete-task reminder
    Remind {
        /// Keep sending reminders on an interval until Enter is pressed
        #[arg(long)]
        watch: bool,

        /// Interval between reminders in seconds (defaults to the configured interval)
        #[arg(long, requires = "watch", value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,
    },
    /// Print every record of every collection as JSON
    Export,
}

#[derive(Subcommand, Debug)]
pub enum TaskAction {
    /// Add a task (1-200 characters)
    Add { text: String },
    /// Replace the text of a task
    Edit { id: RecordId, text: String },
    /// Mark a task done, or not done again
    Toggle { id: RecordId },
    /// Delete a task
    Rm(RemoveArgs),
    /// List tasks in insertion order
    List {
        /// Only tasks that are not completed
        #[arg(long)]
        open: bool,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum NoteAction {
    /// Add a note (1-1000 characters)
    Add { text: String },
    /// Replace the text of a note
    Edit { id: RecordId, text: String },
    /// Delete a note
    Rm(RemoveArgs),
    /// List notes in insertion order
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum TxAction {
    /// Record a transaction
    Add(TxFieldArgs),
    /// Change a transaction; omitted fields keep their stored values
    Edit {
        id: RecordId,

        #[command(flatten)]
        fields: TxFieldArgs,
    },
    /// Delete a transaction
    Rm(RemoveArgs),
    /// List transactions with pay/receive totals
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct TxFieldArgs {
    /// Calendar date, for example 2024-01-31
    #[arg(long)]
    pub date: Option<String>,

    /// Operation description (1-100 characters)
    #[arg(long)]
    pub operation: Option<String>,

    /// Amount paid out (>= 0, empty means 0)
    #[arg(long, allow_hyphen_values = true)]
    pub pay: Option<String>,

    /// Amount received (>= 0, empty means 0)
    #[arg(long, allow_hyphen_values = true)]
    pub receive: Option<String>,

    #[arg(long)]
    pub call: Option<String>,

    #[arg(long)]
    pub contact: Option<String>,

    #[arg(long)]
    pub other: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TraderAction {
    /// Add a trader balance
    Add {
        name: String,

        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Change a trader; omitted fields keep their stored values
    Edit {
        id: RecordId,

        #[arg(long)]
        name: Option<String>,

        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
    },
    /// Delete a trader
    Rm(RemoveArgs),
    /// List traders in insertion order
    List {
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct RemoveArgs {
    pub id: RecordId,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}
