use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use citemark::batch::{filter_identifiers, process_batch, process_document, ProcessOutcome};
use citemark::config::{SettingsController, SettingsStore};
use citemark::document::{insert_citation, restore_document, InsertFormat, TextBuffer};
use citemark::sync::{SyncEngine, SyncScheduler};
use citemark::transport::{CitationResolver, HttpTransport};
use citemark::ui::{
    clipboard, NotificationSink, PresetPrompt, TerminalNotifier, TerminalPrompt,
};

/// citemark - look up citations, insert them into markdown, keep settings in sync
#[derive(Parser, Debug)]
#[command(name = "citemark")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resolve bibliographic identifiers into footnote citations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (repeat for more: -v, -vv, -vvv)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Settings file path (default: platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Insertion format
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    /// Inline mark only
    Inline,
    /// Endnote text only
    Endnote,
    /// Inline mark plus deduplicated endnote in the references section
    Full,
}

impl From<FormatArg> for InsertFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Inline => InsertFormat::Inline,
            FormatArg::Endnote => InsertFormat::Endnote,
            FormatArg::Full => InsertFormat::Full,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Look up one identifier (PMID, DOI, PMCID, title, or URL)
    Lookup {
        /// The identifier to resolve
        identifier: String,

        /// Citation style (default: the synced setting)
        #[arg(long)]
        style: Option<String>,

        /// What to insert (default: the configured format)
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Markdown file to insert into (at end of document); omitted: print only
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Search for articles by free-text query
    Search {
        query: String,

        /// Maximum results (default: the synced setting)
        #[arg(long)]
        max: Option<u32>,
    },

    /// Resolve a file of identifiers (one per line, `#` comments allowed)
    Batch {
        /// File containing identifiers
        file: PathBuf,
    },

    /// Send a whole document through the resolver service and rewrite it
    Process {
        /// Markdown document to process
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// Skip the pre-rewrite backup for this run
        #[arg(long)]
        no_backup: bool,
    },

    /// Print the content of the last document backup
    Restore {
        /// Write the restored content here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Recent lookup history
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },

    /// Show, edit, or synchronize settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Check the resolver service
    Health,
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recent lookups, most recent first
    List,
    /// Clear the history
    Clear,
}

#[derive(Subcommand, Debug)]
enum SettingsCommands {
    /// Print the current settings
    Show,
    /// Set one setting (synced fields push to the server immediately)
    Set { key: String, value: String },
    /// Pull settings from the server once
    Pull,
    /// Push the synced fields to the server once
    Push,
    /// Run the background settings poll until interrupted
    Sync,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "citemark=warn",
        1 => "citemark=info",
        2 => "citemark=debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = cli
        .config
        .map(SettingsStore::at)
        .unwrap_or_else(SettingsStore::new);
    let controller = SettingsController::load(store).context("failed to load settings")?;
    let notifier = TerminalNotifier;

    match cli.command {
        Commands::Lookup {
            identifier,
            style,
            format,
            file,
        } => cmd_lookup(&controller, &notifier, identifier, style, format, file).await,
        Commands::Search { query, max } => cmd_search(&controller, query, max).await,
        Commands::Batch { file } => cmd_batch(&controller, &notifier, file).await,
        Commands::Process {
            file,
            yes,
            no_backup,
        } => cmd_process(&controller, &notifier, file, yes, no_backup).await,
        Commands::Restore { output } => cmd_restore(&controller, &notifier, output),
        Commands::History { command } => cmd_history(&controller, command),
        Commands::Settings { command } => cmd_settings(&controller, &notifier, command).await,
        Commands::Health => cmd_health(&controller).await,
    }
}

async fn cmd_lookup(
    controller: &SettingsController,
    notifier: &dyn NotificationSink,
    identifier: String,
    style: Option<String>,
    format: Option<FormatArg>,
    file: Option<PathBuf>,
) -> Result<()> {
    let settings = controller.snapshot();
    let resolver = CitationResolver::from_settings(&settings)?;
    let style = style.unwrap_or_else(|| settings.citation_style.clone());

    let result = resolver.lookup(&identifier, &style).await;
    if !result.success {
        bail!("lookup failed for {}: {}", identifier, result.error_message());
    }

    controller.update(|s| {
        s.recent_lookups.record(&result.identifier, &result.inline_mark)
    })?;

    let format: InsertFormat = format.map(Into::into).unwrap_or(settings.default_insert_format);

    match file {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let mut buffer = TextBuffer::new(content);
            let outcome = insert_citation(&result, format, &mut buffer)?;
            std::fs::write(&path, buffer.into_content())
                .with_context(|| format!("failed to write {}", path.display()))?;

            if settings.auto_copy {
                if let Err(e) = clipboard().copy(&outcome.inserted) {
                    tracing::debug!("auto-copy failed: {}", e);
                }
            }
            notifier.notify(&format!(
                "inserted {} citation for {} into {}",
                format,
                result.identifier,
                path.display()
            ));
        }
        None => {
            println!("{}", result.inline_mark);
            if format != InsertFormat::Inline && !result.endnote_text.is_empty() {
                println!("{}", result.endnote_text);
            }
        }
    }

    Ok(())
}

async fn cmd_search(
    controller: &SettingsController,
    query: String,
    max: Option<u32>,
) -> Result<()> {
    let settings = controller.snapshot();
    let resolver = CitationResolver::from_settings(&settings)?;
    let max = max.unwrap_or(settings.max_search_results);

    let articles = resolver.search(&query, max).await?;
    if articles.is_empty() {
        println!("no results for {:?}", query);
        return Ok(());
    }

    for article in &articles {
        println!("{}", article.summary());
        if !article.authors.is_empty() {
            println!("    {}", article.authors.join(", ").dimmed());
        }
        if let Some(doi) = &article.doi {
            println!("    doi:{}", doi.dimmed());
        }
    }

    Ok(())
}

async fn cmd_batch(
    controller: &SettingsController,
    notifier: &dyn NotificationSink,
    file: PathBuf,
) -> Result<()> {
    let input = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let identifiers = filter_identifiers(&input);
    if identifiers.is_empty() {
        bail!("no identifiers in {}", file.display());
    }

    let settings = controller.snapshot();
    let resolver = CitationResolver::from_settings(&settings)?;
    let report = process_batch(&identifiers, &resolver, &settings.citation_style, notifier).await;

    controller.update(|s| {
        for result in report.successes() {
            s.recent_lookups.record(&result.identifier, &result.inline_mark);
        }
    })?;

    let successes = report.successes();
    if !successes.is_empty() {
        println!("\n{}", "Resolved citations:".bold());
        for result in &successes {
            println!("{}", result.endnote_text);
        }
    }

    let failures = report.failures();
    if !failures.is_empty() {
        println!("\n{}", "Failed:".bold());
        for (identifier, error) in &failures {
            println!("{} {}: {}", "✗".red(), identifier, error);
        }
    }

    println!(
        "\n{} of {} resolved",
        successes.len(),
        report.len()
    );
    Ok(())
}

async fn cmd_process(
    controller: &SettingsController,
    notifier: &dyn NotificationSink,
    file: PathBuf,
    yes: bool,
    no_backup: bool,
) -> Result<()> {
    let mut settings = controller.snapshot();
    if no_backup {
        settings.backup_before_processing = false;
    }

    let server = HttpTransport::new(&settings.server_url)?;
    let outcome = if yes {
        process_document(&server, &file, &mut settings, &PresetPrompt(true), notifier).await?
    } else {
        process_document(&server, &file, &mut settings, &TerminalPrompt, notifier).await?
    };

    // Persist the backup pointer the helper recorded
    controller.update(|s| s.last_backup_path = settings.last_backup_path.clone())?;

    match outcome {
        ProcessOutcome::Processed {
            statistics,
            failed_references,
        } => {
            notifier.notify(&format!("processed {}", file.display()));
            if let Some(stats) = statistics {
                println!("statistics: {}", stats);
            }
            if !failed_references.is_empty() {
                println!("{}", "Unresolved references:".bold());
                for reference in failed_references {
                    println!("  {}", reference);
                }
            }
        }
        ProcessOutcome::Cancelled => {
            println!("cancelled");
        }
    }
    Ok(())
}

fn cmd_restore(
    controller: &SettingsController,
    notifier: &dyn NotificationSink,
    output: Option<PathBuf>,
) -> Result<()> {
    let settings = controller.snapshot();
    let content = restore_document(&settings)?;

    match output {
        Some(path) => {
            std::fs::write(&path, content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            notifier.notify(&format!("restored backup to {}", path.display()));
        }
        None => print!("{}", content),
    }
    Ok(())
}

fn cmd_history(controller: &SettingsController, command: HistoryCommands) -> Result<()> {
    match command {
        HistoryCommands::List => {
            let settings = controller.snapshot();
            let entries = settings.recent_lookups.list();
            if entries.is_empty() {
                println!("no recent lookups");
                return Ok(());
            }
            for entry in entries {
                let when = chrono::DateTime::from_timestamp_millis(entry.timestamp)
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!("{}  {}  {}", when.dimmed(), entry.identifier, entry.inline_mark);
            }
        }
        HistoryCommands::Clear => {
            controller.update(|s| s.recent_lookups.clear())?;
            println!("history cleared");
        }
    }
    Ok(())
}

async fn cmd_settings(
    controller: &SettingsController,
    notifier: &dyn NotificationSink,
    command: SettingsCommands,
) -> Result<()> {
    match command {
        SettingsCommands::Show => {
            let settings = controller.snapshot();
            let rendered = toml::to_string_pretty(&settings)?;
            print!("{}", rendered);
        }
        SettingsCommands::Set { key, value } => {
            let synced_changed = controller.update(|s| set_field(s, &key, &value))??;
            notifier.notify(&format!("{} = {}", key, value));

            // A synced-field edit pushes immediately; a failure is surfaced
            // but keeps the local change.
            if synced_changed {
                let settings = controller.snapshot();
                let engine = SyncEngine::new(HttpTransport::new(&settings.server_url)?);
                match engine.push(controller).await {
                    Ok(_) => notifier.notify("pushed to server"),
                    Err(e) => eprintln!("{} push failed: {}", "⚠".yellow(), e),
                }
            }
        }
        SettingsCommands::Pull => {
            let settings = controller.snapshot();
            let engine = SyncEngine::new(HttpTransport::new(&settings.server_url)?);
            let changed = engine.pull(controller).await?;
            notifier.notify(if changed {
                "settings updated from server"
            } else {
                "already up to date"
            });
        }
        SettingsCommands::Push => {
            let settings = controller.snapshot();
            let engine = SyncEngine::new(HttpTransport::new(&settings.server_url)?);
            engine.push(controller).await?;
            notifier.notify("settings pushed to server");
        }
        SettingsCommands::Sync => {
            let settings = controller.snapshot();
            if !settings.sync_enabled {
                bail!("sync is disabled (settings set sync_enabled true)");
            }
            let engine = SyncEngine::new(HttpTransport::new(&settings.server_url)?);
            let mut scheduler = SyncScheduler::new();
            scheduler.start(engine, controller.clone());
            notifier.notify(&format!(
                "polling every {}s, ctrl-c to stop",
                settings.sync_interval_secs
            ));
            tokio::signal::ctrl_c().await?;
            scheduler.stop();
        }
    }
    Ok(())
}

async fn cmd_health(controller: &SettingsController) -> Result<()> {
    let settings = controller.snapshot();
    let server = HttpTransport::new(&settings.server_url)?;
    let health = server.health().await?;
    println!(
        "{} {} ({})",
        "✓".green(),
        health.status,
        health.version.as_deref().unwrap_or("unknown version")
    );
    Ok(())
}

/// Apply one `settings set` edit. Returns whether a synced field changed.
fn set_field(
    settings: &mut citemark::ClientSettings,
    key: &str,
    value: &str,
) -> Result<bool> {
    match key {
        "citation_style" => {
            settings.citation_style = value.to_string();
            Ok(true)
        }
        "backup_before_processing" => {
            settings.backup_before_processing = parse_bool(value)?;
            Ok(true)
        }
        "max_search_results" => {
            settings.max_search_results = value
                .parse()
                .with_context(|| format!("invalid number {:?}", value))?;
            Ok(true)
        }
        "server_url" => {
            settings.server_url = value.to_string();
            Ok(false)
        }
        "server_enabled" => {
            settings.server_enabled = parse_bool(value)?;
            Ok(false)
        }
        "resolver_cli_path" => {
            settings.resolver_cli_path = value.to_string();
            Ok(false)
        }
        "default_insert_format" => {
            settings.default_insert_format = match value {
                "inline" => InsertFormat::Inline,
                "endnote" => InsertFormat::Endnote,
                "full" => InsertFormat::Full,
                other => bail!("unknown format {:?} (inline, endnote, full)", other),
            };
            Ok(false)
        }
        "auto_copy" => {
            settings.auto_copy = parse_bool(value)?;
            Ok(false)
        }
        "sync_enabled" => {
            settings.sync_enabled = parse_bool(value)?;
            Ok(false)
        }
        "sync_interval_secs" => {
            settings.sync_interval_secs = value
                .parse()
                .with_context(|| format!("invalid number {:?}", value))?;
            Ok(false)
        }
        other => bail!("unknown setting {:?}", other),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("expected true/false, got {:?}", other),
    }
}
