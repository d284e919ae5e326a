use crate::commands::{
    Cli, Commands, NoteAction, RemoveArgs, TaskAction, TraderAction, TxAction, TxFieldArgs,
};
use organizer_core::{
    init_logging, CollectionKey, KvBackend, ManagerError, NoteDraft, NotificationSink, Organizer,
    OrganizerConfig, ReminderSummary, TaskDraft, TraderDraft, TransactionDraft,
    TransactionTotals,
};
use serde::Serialize;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

pub type CliResult = Result<(), Box<dyn Error>>;

/// Prints reminders to stdout; stands in for an external messaging channel.
struct StdoutSink;

impl NotificationSink for StdoutSink {
    fn notify(&self, summary: &ReminderSummary) {
        println!("{}", summary.message());
    }
}

pub fn run(cli: Cli) -> CliResult {
    let mut config = OrganizerConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    let level_requested = cli.log_level.is_some();
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(warning) = ignored_log_level_warning(&config, level_requested) {
        eprintln!("warning: {warning}");
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let organizer = Organizer::open(&config, Arc::new(StdoutSink))?;

    match cli.command {
        Commands::Task { action } => handle_task(&organizer, action),
        Commands::Note { action } => handle_note(&organizer, action),
        Commands::Tx { action } => handle_tx(&organizer, action),
        Commands::Trader { action } => handle_trader(&organizer, action),
        Commands::Remind {
            watch,
            interval_secs,
        } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.reminder_interval);
            handle_remind(&organizer, watch, interval)
        }
        Commands::Export => print_json(&organizer.export()),
    }
}

fn handle_task<B: KvBackend + 'static>(organizer: &Organizer<B>, action: TaskAction) -> CliResult {
    match action {
        TaskAction::Add { text } => {
            let task = organizer.tasks().add(&TaskDraft::new(text))?;
            println!("Added task {}", task.id);
        }
        TaskAction::Edit { id, text } => {
            organizer.tasks().update(id, &TaskDraft::new(text))?;
            println!("Updated task {id}");
        }
        TaskAction::Toggle { id } => {
            let task = organizer.tasks().toggle(id)?;
            let state = if task.completed { "done" } else { "open" };
            println!("Task {id} is now {state}");
        }
        TaskAction::Rm(args) => {
            if confirm_removal(CollectionKey::Tasks, &args)? {
                organizer.tasks().remove(args.id)?;
                println!("Deleted task {}", args.id);
            }
        }
        TaskAction::List { open, json } => {
            let manager = organizer.tasks();
            let tasks: Vec<_> = manager
                .list()
                .iter()
                .filter(|task| !open || !task.completed)
                .collect();
            if json {
                return print_json(&tasks);
            }
            if tasks.is_empty() {
                println!("No tasks yet.");
            }
            for task in tasks {
                let mark = if task.completed { "x" } else { " " };
                println!("[{mark}] {}  {}", task.id, task.text);
            }
        }
    }
    Ok(())
}

fn handle_note<B: KvBackend + 'static>(organizer: &Organizer<B>, action: NoteAction) -> CliResult {
    match action {
        NoteAction::Add { text } => {
            let note = organizer.notes().add(&NoteDraft::new(text))?;
            println!("Added note {}", note.id);
        }
        NoteAction::Edit { id, text } => {
            organizer.notes().update(id, &NoteDraft::new(text))?;
            println!("Updated note {id}");
        }
        NoteAction::Rm(args) => {
            if confirm_removal(CollectionKey::Notes, &args)? {
                organizer.notes().remove(args.id)?;
                println!("Deleted note {}", args.id);
            }
        }
        NoteAction::List { json } => {
            let manager = organizer.notes();
            if json {
                return print_json(manager.list());
            }
            if manager.is_empty() {
                println!("No notes yet.");
            }
            for note in manager.list() {
                println!(
                    "{}  {}\n    {}",
                    note.id,
                    note.created_at.format("%Y-%m-%d %H:%M"),
                    note.text.replace('\n', "\n    ")
                );
            }
        }
    }
    Ok(())
}

fn handle_tx<B: KvBackend + 'static>(organizer: &Organizer<B>, action: TxAction) -> CliResult {
    match action {
        TxAction::Add(fields) => {
            let draft = fields.apply_to(TransactionDraft::default());
            let transaction = organizer.transactions().add(&draft)?;
            println!("Added transaction {}", transaction.id);
        }
        TxAction::Edit { id, fields } => {
            let mut manager = organizer.transactions();
            let current = manager.get(id).ok_or(ManagerError::NotFound(id))?;
            let draft = fields.apply_to(TransactionDraft::from(current));
            manager.update(id, &draft)?;
            println!("Updated transaction {id}");
        }
        TxAction::Rm(args) => {
            if confirm_removal(CollectionKey::Transactions, &args)? {
                organizer.transactions().remove(args.id)?;
                println!("Deleted transaction {}", args.id);
            }
        }
        TxAction::List { json } => {
            let manager = organizer.transactions();
            if json {
                return print_json(manager.list());
            }
            if manager.is_empty() {
                println!("No transactions yet.");
                return Ok(());
            }
            println!("id\tdate\toperation\tpay\treceive\tcall\tcontact\tother");
            for tx in manager.list() {
                println!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    tx.id,
                    tx.date,
                    tx.operation,
                    amount_cell(tx.pay),
                    amount_cell(tx.receive),
                    tx.call,
                    tx.contact,
                    tx.other
                );
            }
            let totals = TransactionTotals::of(manager.list());
            println!(
                "total pay {}  total receive {}  net {}",
                totals.pay,
                totals.receive,
                totals.net()
            );
        }
    }
    Ok(())
}

fn handle_trader<B: KvBackend + 'static>(
    organizer: &Organizer<B>,
    action: TraderAction,
) -> CliResult {
    match action {
        TraderAction::Add { name, amount } => {
            let trader = organizer.traders().add(&TraderDraft::new(name, amount))?;
            println!("Added trader {}", trader.id);
        }
        TraderAction::Edit { id, name, amount } => {
            let mut manager = organizer.traders();
            let current = manager.get(id).ok_or(ManagerError::NotFound(id))?;
            let mut draft = TraderDraft::from(current);
            if let Some(name) = name {
                draft.name = name;
            }
            if let Some(amount) = amount {
                draft.amount = amount;
            }
            manager.update(id, &draft)?;
            println!("Updated trader {id}");
        }
        TraderAction::Rm(args) => {
            if confirm_removal(CollectionKey::Traders, &args)? {
                organizer.traders().remove(args.id)?;
                println!("Deleted trader {}", args.id);
            }
        }
        TraderAction::List { json } => {
            let manager = organizer.traders();
            if json {
                return print_json(manager.list());
            }
            if manager.is_empty() {
                println!("No traders yet.");
            }
            for trader in manager.list() {
                println!(
                    "{}  {}  {}  since {}",
                    trader.id,
                    trader.name,
                    trader.amount,
                    trader.created_at.format("%Y-%m-%d")
                );
            }
        }
    }
    Ok(())
}

fn handle_remind<B: KvBackend + 'static>(
    organizer: &Organizer<B>,
    watch: bool,
    interval: Duration,
) -> CliResult {
    let summary = organizer.send_reminder();
    if summary.is_empty() {
        println!("No incomplete tasks.");
    }
    if !watch {
        return Ok(());
    }

    let scheduler = organizer.start_reminders(interval)?;
    println!(
        "Sending reminders every {}s; press Enter to stop.",
        interval.as_secs()
    );
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    scheduler.stop();
    Ok(())
}

impl TxFieldArgs {
    fn apply_to(self, mut draft: TransactionDraft) -> TransactionDraft {
        let fields = [
            (self.date, &mut draft.date),
            (self.operation, &mut draft.operation),
            (self.pay, &mut draft.pay),
            (self.receive, &mut draft.receive),
            (self.call, &mut draft.call),
            (self.contact, &mut draft.contact),
            (self.other, &mut draft.other),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        draft
    }
}

fn confirm_removal(collection: CollectionKey, args: &RemoveArgs) -> io::Result<bool> {
    if args.yes {
        return Ok(true);
    }

    print!(
        "Delete {} record {}? This cannot be undone. [y/N] ",
        collection, args.id
    );
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let confirmed = matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes");
    if !confirmed {
        println!("Cancelled.");
    }
    Ok(confirmed)
}

/// Warning for a `--log-level` that cannot take effect.
fn ignored_log_level_warning(config: &OrganizerConfig, level_requested: bool) -> Option<String> {
    if !level_requested || config.log_dir.is_some() {
        return None;
    }
    Some(format!(
        "--log-level {} has no effect without --log-dir or ORGANIZER_LOG_DIR",
        config.log_level
    ))
}

fn amount_cell(value: f64) -> String {
    if value == 0.0 {
        "-".to_string()
    } else {
        value.to_string()
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
