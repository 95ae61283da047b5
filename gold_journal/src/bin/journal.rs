// src/bin/journal.rs
use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use gold_journal::{
    setup_logging, AnalysisType, Analyzer, Config, GeminiClient, GenerationConfig, JournalStore,
};
use journal_core::backup::default_backup_file_name;
use journal_core::format::{format_currency, format_pnl, format_profit_factor};
use journal_core::metrics::{calculate_detailed_statistics, cumulative_pnl, daily_pnl, generate_report};
use journal_core::stats::overall_proportion;
use journal_core::transfer::default_export_file_name;
use journal_core::{
    calculate_period_breakdown, calculate_trade_pnl, chronological, create_backup, export_csv,
    export_json, import_json, parse_capital_input, restore_backup, NewTrade, Timeframe,
    TradeType, TradeUpdate,
};
use log::*;
use std::fs;
use std::path::{Path, PathBuf};

// CLI Arguments using clap
#[derive(Parser)]
#[clap(name = "gold-journal", author, version, about = "Gold trading journal")]
struct Args {
    /// Path to configuration file
    #[clap(short, long, default_value = gold_journal::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Data directory, overrides the configured one
    #[clap(long)]
    data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a closed trade
    Add {
        /// Trade date (YYYY-MM-DD), defaults to today
        #[clap(short, long)]
        date: Option<String>,

        /// buy or sell
        #[clap(short = 't', long = "type", default_value = "buy")]
        trade_type: TradeType,

        /// Entry price in USD per ounce
        #[clap(long)]
        entry: f64,

        /// Exit price in USD per ounce
        #[clap(long)]
        exit: f64,

        /// Size in lots (1 lot = 100 oz)
        #[clap(long)]
        lot: f64,

        #[clap(short, long)]
        note: Option<String>,
    },

    /// Edit fields of an existing trade
    Update {
        id: String,

        #[clap(short, long)]
        date: Option<String>,

        #[clap(short = 't', long = "type")]
        trade_type: Option<TradeType>,

        #[clap(long)]
        entry: Option<f64>,

        #[clap(long)]
        exit: Option<f64>,

        #[clap(long)]
        lot: Option<f64>,

        /// New note; pass an empty string to remove it
        #[clap(short, long)]
        note: Option<String>,
    },

    /// Delete a trade by id
    Delete { id: String },

    /// List trades in date order
    List,

    /// Remove every trade
    Clear {
        #[clap(long)]
        yes: bool,
    },

    /// Show trade statistics
    Stats {
        /// Print as JSON
        #[clap(long)]
        json: bool,
    },

    /// Win/loss proportion per period
    Breakdown {
        #[clap(short, long, default_value = "monthly")]
        timeframe: Timeframe,
    },

    /// P&L per trading day
    Daily {
        /// Show the running P&L trade by trade instead
        #[clap(long)]
        cumulative: bool,
    },

    /// Starting capital
    Capital {
        #[clap(subcommand)]
        action: CapitalAction,
    },

    /// Export trades to JSON or CSV
    Export {
        #[clap(value_enum)]
        format: ExportFormat,

        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace the journal with trades from a JSON file
    Import {
        file: PathBuf,

        /// Apply without asking
        #[clap(long)]
        yes: bool,
    },

    /// Write a backup of trades and capital
    Backup {
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Restore trades and capital from a backup file
    Restore {
        /// Backup file; omit together with --auto to use the auto-backup
        file: Option<PathBuf>,

        /// Restore trades from the latest auto-backup
        #[clap(long)]
        auto: bool,

        /// Apply without asking
        #[clap(long)]
        yes: bool,
    },

    /// Manage the analysis service API key
    ApiKey {
        #[clap(subcommand)]
        action: ApiKeyAction,
    },

    /// Ask the analysis service to review the journal
    Analyze {
        #[clap(short, long, default_value = "performance")]
        kind: AnalysisType,

        /// Also write the analysis to this file
        #[clap(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CapitalAction {
    /// Set the starting capital in USD
    Set { amount: String },
    /// Reset the starting capital to zero
    Clear,
    /// Show capital, P&L and net capital
    Show,
}

#[derive(Subcommand)]
enum ApiKeyAction {
    Set { key: String },
    Clear,
    /// Send a short request to check the key
    Test,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(&args.config)?;
    setup_logging(&config.general.log_level);

    let data_dir = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.general.data_dir.clone());
    let mut store = JournalStore::load(&data_dir)
        .with_context(|| format!("Failed to load journal from {}", data_dir.display()))?;

    match args.command {
        Commands::Add { date, trade_type, entry, exit, lot, note } => {
            let trade = store.add_trade(NewTrade {
                date: date.unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string()),
                entry_price: entry,
                exit_price: exit,
                lot_size: lot,
                trade_type,
                note: note.filter(|n| !n.trim().is_empty()),
            })?;
            store.save()?;
            println!(
                "Added {} {} {} ({})",
                trade.id,
                trade.trade_type,
                trade.date,
                format_pnl(calculate_trade_pnl(&trade), 2)
            );
        }
        Commands::Update { id, date, trade_type, entry, exit, lot, note } => {
            let trade = store.update_trade(
                &id,
                TradeUpdate {
                    date,
                    entry_price: entry,
                    exit_price: exit,
                    lot_size: lot,
                    trade_type,
                    note,
                },
            )?;
            store.save()?;
            println!("Updated {} ({})", trade.id, format_pnl(calculate_trade_pnl(&trade), 2));
        }
        Commands::Delete { id } => {
            store.delete_trade(&id)?;
            store.save()?;
            println!("Deleted {}", id);
        }
        Commands::List => list_trades(&store),
        Commands::Clear { yes } => {
            if !yes {
                bail!("This removes all {} trades; rerun with --yes", store.trades().len());
            }
            store.clear_trades();
            store.save()?;
            println!("All trades removed");
        }
        Commands::Stats { json } => show_stats(&store, json)?,
        Commands::Breakdown { timeframe } => show_breakdown(&store, timeframe),
        Commands::Daily { cumulative } => show_daily(&store, cumulative),
        Commands::Capital { action } => match action {
            CapitalAction::Set { amount } => {
                let capital = parse_capital_input(&amount)?;
                store.set_capital(capital);
                store.save()?;
                println!("Capital set to {}", format_currency(capital, 2));
            }
            CapitalAction::Clear => {
                store.clear_capital();
                store.save()?;
                println!("Capital cleared");
            }
            CapitalAction::Show => show_capital(&store),
        },
        Commands::Export { format, output } => {
            let today = Utc::now().date_naive();
            let (content, default_name) = match format {
                ExportFormat::Json => (export_json(store.trades())?, default_export_file_name("json", today)),
                ExportFormat::Csv => (export_csv(store.trades())?, default_export_file_name("csv", today)),
            };
            let path = output.unwrap_or_else(|| PathBuf::from(default_name));
            write_file(&path, &content)?;
            println!("Exported {} trades to {}", store.trades().len(), path.display());
        }
        Commands::Import { file, yes } => {
            let content = read_file(&file)?;
            let report = import_json(&content)?;
            if !yes {
                println!(
                    "{} valid trades found ({} skipped). Importing replaces the {} trades in the journal; rerun with --yes",
                    report.trades.len(),
                    report.skipped,
                    store.trades().len()
                );
                return Ok(());
            }
            let skipped = report.skipped;
            let count = store.import_trades(report);
            store.save()?;
            println!("Imported {} trades ({} skipped)", count, skipped);
        }
        Commands::Backup { output } => {
            let content = create_backup(store.trades(), store.capital())?;
            let path = output.unwrap_or_else(|| PathBuf::from(default_backup_file_name(Utc::now().date_naive())));
            write_file(&path, &content)?;
            println!("Backup written to {}", path.display());
        }
        Commands::Restore { file, auto, yes } => restore(&mut store, file, auto, yes)?,
        Commands::ApiKey { action } => match action {
            ApiKeyAction::Set { key } => {
                store.set_api_key(&key)?;
                store.save()?;
                println!("API key saved");
            }
            ApiKeyAction::Clear => {
                store.clear_api_key();
                store.save()?;
                println!("API key removed");
            }
            ApiKeyAction::Test => {
                let analyzer = analyzer(&config)?;
                let reply = analyzer.test_connection(resolve_api_key(&store, &config)).await?;
                println!("Connection OK: {}", reply.trim());
            }
        },
        Commands::Analyze { kind, output } => {
            let analyzer = analyzer(&config)?;
            println!("Requesting {} analysis...", kind);
            let result = analyzer
                .analyze(
                    resolve_api_key(&store, &config),
                    store.trades(),
                    store.capital(),
                    kind,
                )
                .await?;
            println!("{}", result.analysis);
            if let Some(path) = output {
                write_file(&path, &result.analysis)?;
                info!("Analysis saved to {}", path.display());
            }
        }
    }

    Ok(())
}

fn analyzer(config: &Config) -> Result<Analyzer<GeminiClient>> {
    let client = GeminiClient::from_config(&config.analysis)?;
    Ok(Analyzer::new(client, GenerationConfig::from(&config.analysis)))
}

/// A key saved in the journal wins over one from the environment.
fn resolve_api_key<'a>(store: &'a JournalStore, config: &'a Config) -> Option<&'a str> {
    store.api_key().or(config.analysis.api_key.as_deref())
}

fn restore(store: &mut JournalStore, file: Option<PathBuf>, auto: bool, yes: bool) -> Result<()> {
    match (file, auto) {
        (Some(file), false) => {
            let data = restore_backup(&read_file(&file)?)?;
            if !yes {
                println!(
                    "Backup from {} holds {} trades and capital {}. Restoring replaces current data; rerun with --yes",
                    data.backup_date.as_deref().unwrap_or("unknown date"),
                    data.trades.len(),
                    format_currency(data.capital, 2)
                );
                return Ok(());
            }
            store.restore(data);
        }
        (None, true) => {
            let Some(backup) = store.load_auto_backup()? else {
                bail!("No auto-backup found in {}", store.dir().display());
            };
            if !yes {
                println!(
                    "Auto-backup from {} holds {} trades. Restoring replaces current trades; rerun with --yes",
                    backup.export_date.as_deref().unwrap_or("unknown date"),
                    backup.trades.len()
                );
                return Ok(());
            }
            store.replace_trades(backup.trades)?;
        }
        _ => bail!("Pass either a backup file or --auto"),
    }

    store.save()?;
    println!("Restored {} trades", store.trades().len());
    Ok(())
}

fn list_trades(store: &JournalStore) {
    let trades = chronological(store.trades());
    if trades.is_empty() {
        println!("No trades logged yet");
        return;
    }

    println!(
        "{:<36}  {:<10}  {:<4}  {:>10}  {:>10}  {:>6}  {:>12}  Note",
        "ID", "Date", "Type", "Entry", "Exit", "Lot", "P&L"
    );
    for trade in &trades {
        println!(
            "{:<36}  {:<10}  {:<4}  {:>10.2}  {:>10.2}  {:>6}  {:>12}  {}",
            trade.id,
            trade.date,
            trade.trade_type.to_string().to_uppercase(),
            trade.entry_price,
            trade.exit_price,
            trade.lot_size,
            format_pnl(calculate_trade_pnl(trade), 2),
            trade.note.as_deref().unwrap_or("")
        );
    }
}

fn show_stats(store: &JournalStore, json: bool) -> Result<()> {
    let detailed = calculate_detailed_statistics(&chronological(store.trades()));
    if json {
        println!("{}", serde_json::to_string_pretty(&detailed)?);
        return Ok(());
    }

    println!("{}", generate_report(&detailed.summary));
    println!("\nAverage Trades per Day: {:.2}", detailed.average_trades_per_day);
    if let Some(best) = &detailed.best_trading_day {
        println!("Best Day: {} ({})", best.date, format_pnl(best.pnl, 2));
    }
    if let Some(worst) = &detailed.worst_trading_day {
        println!("Worst Day: {} ({})", worst.date, format_pnl(worst.pnl, 2));
    }
    Ok(())
}

fn show_breakdown(store: &JournalStore, timeframe: Timeframe) {
    let breakdown = calculate_period_breakdown(store.trades(), timeframe);
    if breakdown.is_empty() {
        println!("No trades logged yet");
        return;
    }

    println!("{} breakdown", timeframe);
    println!("{:<12}  {:>5}  {:>5}  {:>5}  {:>5}  {:>8}", "Period", "Win", "Loss", "Flat", "Total", "Win %");
    for period in &breakdown {
        println!(
            "{:<12}  {:>5}  {:>5}  {:>5}  {:>5}  {:>7.1}%",
            period.period, period.winning, period.losing, period.neutral, period.total, period.win_rate
        );
    }

    let overall = overall_proportion(store.trades());
    println!(
        "{:<12}  {:>5}  {:>5}  {:>5}  {:>5}  {:>7.1}%",
        "All", overall.winning, overall.losing, overall.neutral, overall.total, overall.win_rate
    );
}

fn show_daily(store: &JournalStore, cumulative: bool) {
    if cumulative {
        for point in cumulative_pnl(store.trades()) {
            println!(
                "{:>4}  {:<12}  {:>12}  {:>14}",
                point.trade_number,
                point.date,
                format_pnl(point.trade_pnl, 2),
                format_pnl(point.cumulative_pnl, 2)
            );
        }
        return;
    }

    for day in daily_pnl(store.trades()) {
        println!("{:<12}  {:>3} trades  {:>12}", day.date, day.trades, format_pnl(day.pnl, 2));
    }
}

fn show_capital(store: &JournalStore) {
    let stats = store.statistics();
    println!("Starting capital: {}", format_currency(store.capital(), 2));
    println!("Total P&L:        {}", format_pnl(stats.total_pnl, 2));
    println!("Net capital:      {}", format_currency(store.net_capital(), 2));
    println!("Return:           {:.2}%", store.return_percent());
    println!("Profit factor:    {}", format_profit_factor(stats.profit_factor));
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
