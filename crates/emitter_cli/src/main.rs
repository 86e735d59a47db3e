//! Command-line front end for the message emitter.
//!
//! # Responsibility
//! - Resolve configuration (file, then flags) and pick a storage backend.
//! - Map each subcommand onto one `MessageService` operation.
//! - Render the three named views and the summary footer.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use emitter_core::db::open_db;
use emitter_core::{
    core_version, fixture_messages, init_logging, DisabledNotifier, EditOutcome, EmitterConfig,
    FixtureMessageRepository, HttpNotifier, Message, MessageFilter, MessageId, MessageRepository,
    MessageService, MessageSummary, NotifierConfig, Notifier, SqliteMessageRepository,
    StorageBackend,
};
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "emitter", about = "Create, send and tidy up a list of messages")]
struct Cli {
    /// TOML config file.
    #[arg(long, global = true, env = "EMITTER_CONFIG")]
    config: Option<PathBuf>,

    /// Storage backend; overrides `storage.backend`.
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// SQLite file; implies `--backend sqlite` unless a backend is given.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Notification endpoint; overrides `notifier.endpoint`.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Skip the outbound POST when sending.
    #[arg(long, global = true)]
    no_notify: bool,

    /// Directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new unsent message
    Add {
        #[arg(allow_hyphen_values = true)]
        body: String,
    },
    /// Show one view of the collection
    List {
        #[arg(long, value_enum, default_value_t = ViewArg::All)]
        view: ViewArg,
        #[arg(long)]
        json: bool,
    },
    /// Show counts only
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Mark a message sent without notifying
    MarkSent { id: i64 },
    /// Mark a message unsent
    MarkUnsent { id: i64 },
    /// POST the body to the endpoint and mark the message sent
    Send { id: i64 },
    /// Mark a message unsent without notifying
    Reset { id: i64 },
    /// Replace a body; an empty body deletes the message
    Edit {
        id: i64,
        #[arg(allow_hyphen_values = true)]
        body: String,
    },
    /// Delete a message
    Delete { id: i64 },
    /// Delete every sent message
    ClearSent,
    /// Mark all sent, or all unsent when every message is already sent
    ToggleAll,
    /// Insert the demo fixture messages
    Seed,
    /// Print the core version
    Version,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::List { .. } => "list",
            Self::Stats { .. } => "stats",
            Self::MarkSent { .. } => "mark-sent",
            Self::MarkUnsent { .. } => "mark-unsent",
            Self::Send { .. } => "send",
            Self::Reset { .. } => "reset",
            Self::Edit { .. } => "edit",
            Self::Delete { .. } => "delete",
            Self::ClearSent => "clear-sent",
            Self::ToggleAll => "toggle-all",
            Self::Seed => "seed",
            Self::Version => "version",
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Fixture,
    Sqlite,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ViewArg {
    All,
    Active,
    Completed,
}

impl From<ViewArg> for MessageFilter {
    fn from(value: ViewArg) -> Self {
        match value {
            ViewArg::All => MessageFilter::All,
            ViewArg::Active => MessageFilter::Unsent,
            ViewArg::Completed => MessageFilter::Sent,
        }
    }
}

#[derive(Serialize)]
struct ListOutput<'a> {
    view: &'static str,
    messages: &'a [Message],
    summary: &'a MessageSummary,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if matches!(cli.command, Command::Version) {
        println!("emitter_core {}", core_version());
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    if let Some(dir) = &config.logging.dir {
        let dir = absolute_path(dir)?;
        init_logging(&config.logging.level, &dir)
            .map_err(anyhow::Error::msg)
            .context("failed to initialize logging")?;
    }

    let notifier = build_notifier(&config.notifier)?;
    match config.storage.backend {
        StorageBackend::Fixture => {
            let service = MessageService::new(FixtureMessageRepository::with_fixtures(), notifier);
            execute(&service, cli.command)
        }
        StorageBackend::Sqlite => {
            let conn = open_db(&config.storage.path).with_context(|| {
                format!("failed to open database `{}`", config.storage.path.display())
            })?;
            let repo = SqliteMessageRepository::try_new(&conn)?;
            let service = MessageService::new(repo, notifier);
            execute(&service, cli.command)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<EmitterConfig> {
    let mut config = match &cli.config {
        Some(path) => EmitterConfig::load(path)?,
        None => EmitterConfig::default(),
    };

    if let Some(path) = &cli.db {
        config.storage.path = path.clone();
        config.storage.backend = StorageBackend::Sqlite;
    }
    match cli.backend {
        Some(BackendArg::Fixture) => config.storage.backend = StorageBackend::Fixture,
        Some(BackendArg::Sqlite) => config.storage.backend = StorageBackend::Sqlite,
        None => {}
    }
    if let Some(endpoint) = &cli.endpoint {
        config.notifier.endpoint = endpoint.clone();
    }
    if cli.no_notify {
        config.notifier.enabled = false;
    }
    if let Some(dir) = &cli.log_dir {
        config.logging.dir = Some(dir.clone());
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn build_notifier(config: &NotifierConfig) -> Result<Box<dyn Notifier>> {
    if !config.enabled {
        return Ok(Box::new(DisabledNotifier));
    }
    let notifier = HttpNotifier::new(&config.endpoint, config.timeout())?;
    Ok(Box::new(notifier))
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

fn execute<R: MessageRepository, N: Notifier>(
    service: &MessageService<R, N>,
    command: Command,
) -> Result<()> {
    info!(
        "event=cli_command module=cli status=start command={}",
        command.name()
    );
    match command {
        Command::Add { body } => match service.create_message(&body)? {
            Some(message) => println!("added {}", message.id),
            None => eprintln!("nothing to add: message body is empty"),
        },
        Command::List { view, json } => {
            let filter = MessageFilter::from(view);
            let messages = service.list_messages(filter)?;
            let summary = service.summary()?;
            if json {
                let output = ListOutput {
                    view: filter.route_name(),
                    messages: &messages,
                    summary: &summary,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                for message in &messages {
                    println!("{}", render_line(message));
                }
                print_footer(&summary);
            }
        }
        Command::Stats { json } => {
            let summary = service.summary()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_footer(&summary);
            }
        }
        Command::MarkSent { id } => {
            let mut message = service.require_message(MessageId(id))?;
            service.set_sent(&mut message, true)?;
            println!("marked {} sent", message.id);
        }
        Command::MarkUnsent { id } => {
            let mut message = service.require_message(MessageId(id))?;
            service.set_sent(&mut message, false)?;
            println!("marked {} unsent", message.id);
        }
        Command::Send { id } => {
            let mut message = service.require_message(MessageId(id))?;
            service.notify_sent(&mut message)?;
            println!("sent {}", message.id);
        }
        Command::Reset { id } => {
            let mut message = service.require_message(MessageId(id))?;
            service.reset_sent(&mut message)?;
            println!("reset {}", message.id);
        }
        Command::Edit { id, body } => {
            let mut message = service.require_message(MessageId(id))?;
            match service.edit_body(&mut message, body)? {
                EditOutcome::Saved(saved) => println!("saved {}", saved.id),
                EditOutcome::Deleted(id) => println!("deleted {id} (empty body)"),
            }
        }
        Command::Delete { id } => {
            let mut message = service.require_message(MessageId(id))?;
            service.delete_message(&mut message)?;
            println!("deleted {}", message.id);
        }
        Command::ClearSent => {
            let cleared = service.clear_sent()?;
            println!("cleared {cleared} sent {}", plural(cleared));
        }
        Command::ToggleAll => {
            let target = !service.all_are_done()?;
            let changed = service.set_all_done(target)?;
            let state = if target { "sent" } else { "unsent" };
            println!("marked {changed} {} {state}", plural(changed));
        }
        Command::Seed => {
            let fixtures = fixture_messages();
            for draft in &fixtures {
                service.repository().create_message(draft)?;
            }
            println!("seeded {} {}", fixtures.len(), plural(fixtures.len()));
        }
        Command::Version => println!("emitter_core {}", core_version()),
    }
    Ok(())
}

fn render_line(message: &Message) -> String {
    let mark = if message.is_sent { 'x' } else { ' ' };
    format!("[{mark}] {} {}", message.id, message.body)
}

fn print_footer(summary: &MessageSummary) {
    println!("{} {} left", summary.remaining, summary.label);
    if summary.has_sent {
        println!("clear sent ({})", summary.sent);
    }
}

fn plural(count: usize) -> &'static str {
    emitter_core::message_label(count as u64)
}
