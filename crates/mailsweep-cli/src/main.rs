use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use mailsweep::db::list_repo::{self, PatternList};
use mailsweep::db::{filter_repo, settings_repo};
use mailsweep::{logging, Config, Database, LinkSelection, Orchestrator, Progress};

#[derive(Debug, Parser)]
#[command(author, version, about = "Scan a mailbox for unsubscribe links and visit them")]
struct Cli {
    /// Env file to load before reading the environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that mailbox credentials are configured
    CheckConfig,
    /// Scan the mailbox and store unsubscribe links
    Scan {
        /// Maximum number of messages to examine (0 = no limit)
        #[arg(long)]
        max: Option<usize>,
    },
    /// Visit stored unsubscribe links
    Unsubscribe {
        /// Visit every link not clicked yet
        #[arg(long, conflicts_with = "id", required_unless_present = "id")]
        all: bool,
        /// Link ids to visit
        #[arg(long, num_args = 1..)]
        id: Vec<i64>,
    },
    /// Show statistics
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Show recent operations
    History {
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Write a plain-text report of all links
    Export {
        #[arg(long, default_value = "unsubscribe_links.txt")]
        output: PathBuf,
    },
    /// Manage whitelisted sender patterns
    Whitelist(ListArgs),
    /// Manage blacklisted sender patterns
    Blacklist(ListArgs),
    /// Manage custom filters
    Filters {
        #[command(subcommand)]
        action: FilterAction,
    },
    /// Read or write a stored setting
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(subcommand)]
    action: ListAction,
}

#[derive(Debug, Subcommand)]
enum ListAction {
    Add {
        pattern: String,
        #[arg(long)]
        notes: Option<String>,
    },
    List,
    Remove {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum FilterAction {
    Add {
        name: String,
        pattern: String,
        filter_type: String,
    },
    List,
    Disable {
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum SettingsAction {
    Get { key: String },
    Set { key: String, value: String },
}

fn print_progress(progress: Progress) {
    info!("[{}/{}] {}", progress.current, progress.total, progress.message);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.env_file {
        Some(path) => Config::from_env_file(path)?,
        None => Config::from_env(),
    };
    logging::init(&config.log).context("failed to initialise logging")?;

    if let Command::CheckConfig = cli.command {
        config.validate()?;
        println!("Configuration OK");
        return Ok(());
    }

    let db = Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))?;
    run(cli.command, config, db).await
}

async fn run(command: Command, config: Config, db: Database) -> Result<()> {
    match command {
        Command::CheckConfig => config.validate()?,
        Command::Scan { max } => {
            let mut config = config;
            if let Some(max) = max {
                config.max_emails_per_scan = max;
            }
            let orchestrator = Orchestrator::new(config, db)?;
            let report = orchestrator.scan_mailbox(&print_progress).await?;
            if !report.connected {
                bail!("could not connect to the mailbox; see the operation history");
            }
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Unsubscribe { all, id } => {
            let selection = if all {
                LinkSelection::AllUnclicked
            } else {
                LinkSelection::Ids(id)
            };
            let orchestrator = Orchestrator::new(config, db)?;
            let report = orchestrator.unsubscribe(selection, &print_progress).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Stats { json } => {
            let stats = Orchestrator::new(config, db)?.statistics()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Processed emails:   {}", stats.total_processed);
                println!("Emails with links:  {}", stats.emails_with_links);
                println!("Links clicked:      {}", stats.links_clicked);
                println!("Successful clicks:  {}", stats.successful_clicks);
                for (category, count) in &stats.category_breakdown {
                    println!("  {:<14} {}", category, count);
                }
            }
        }
        Command::History { limit } => {
            for op in Orchestrator::new(config, db)?.recent_operations(limit)? {
                println!(
                    "{}  {:<12} {:<8} {}",
                    op.timestamp,
                    op.operation_type,
                    op.status,
                    op.details.unwrap_or_default()
                );
            }
        }
        Command::Export { output } => {
            let count = Orchestrator::new(config, db)?.export_links(&output)?;
            println!("Exported {} links to {}", count, output.display());
        }
        Command::Whitelist(args) => run_list(&db, PatternList::Whitelist, args.action)?,
        Command::Blacklist(args) => run_list(&db, PatternList::Blacklist, args.action)?,
        Command::Filters { action } => match action {
            FilterAction::Add {
                name,
                pattern,
                filter_type,
            } => {
                let id = filter_repo::add(&db, &name, &pattern, &filter_type)?;
                println!("Added filter {}", id);
            }
            FilterAction::List => {
                for filter in filter_repo::list_enabled(&db)? {
                    println!(
                        "{:>4}  {:<20} {:<10} {}",
                        filter.id, filter.name, filter.filter_type, filter.pattern
                    );
                }
            }
            FilterAction::Disable { id } => {
                if !filter_repo::set_enabled(&db, id, false)? {
                    bail!("no filter with id {}", id);
                }
                println!("Disabled filter {}", id);
            }
        },
        Command::Settings { action } => match action {
            SettingsAction::Get { key } => match settings_repo::get(&db, &key)? {
                Some(value) => println!("{}", value),
                None => bail!("setting '{}' is not set", key),
            },
            SettingsAction::Set { key, value } => {
                settings_repo::set(&db, &key, &value)?;
                println!("{} = {}", key, value);
            }
        },
    }

    Ok(())
}

fn run_list(db: &Database, list: PatternList, action: ListAction) -> Result<()> {
    match action {
        ListAction::Add { pattern, notes } => {
            if list_repo::add(db, list, &pattern, notes.as_deref())? {
                println!("Added '{}' to the {}", pattern, list);
            } else {
                warn!("'{}' is already in the {}", pattern, list);
            }
        }
        ListAction::List => {
            for row in list_repo::list(db, list)? {
                println!(
                    "{:>4}  {:<40} {}",
                    row.id,
                    row.email_pattern,
                    row.notes.unwrap_or_default()
                );
            }
        }
        ListAction::Remove { id } => {
            if !list_repo::remove(db, list, id)? {
                bail!("no {} entry with id {}", list, id);
            }
            println!("Removed entry {} from the {}", id, list);
        }
    }
    Ok(())
}
