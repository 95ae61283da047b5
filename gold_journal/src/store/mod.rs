// src/store/mod.rs
use anyhow::{Context, Result};
use journal_core::backup::{
    restore_auto_backup, should_auto_backup, AutoBackup, RestoredData, RestoredTrades,
};
use journal_core::transfer::{validate_records, ImportReport};
use journal_core::{
    calculate_trade_statistics, chronological, CapitalTracker, JournalError, NewTrade, Trade,
    TradeStatistics, TradeUpdate,
};
use log::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const TRADES_FILE: &str = "gold-trades.json";
pub const CAPITAL_FILE: &str = "base-capital.json";
pub const API_KEY_FILE: &str = "gemini-api-key.json";
pub const AUTO_BACKUP_FILE: &str = "gold-trades-auto-backup.json";

/// The journal's persistent state, one JSON file per key in `dir`.
///
/// Mutations only touch memory; nothing reaches disk until [`JournalStore::save`].
#[derive(Debug)]
pub struct JournalStore {
    dir: PathBuf,
    trades: Vec<Trade>,
    capital: CapitalTracker,
    api_key: Option<String>,
    pending_auto_backup: Option<AutoBackup>,
}

impl JournalStore {
    /// Reads every key. Missing or unreadable files fall back to defaults.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        let trades_path = dir.join(TRADES_FILE);
        let trades = match read_key::<Vec<Value>>(&trades_path)? {
            Some(records) => {
                let report = validate_records(&records);
                if report.skipped > 0 {
                    // The next save drops these records from the main file.
                    let aside = keep_aside(&trades_path)?;
                    warn!(
                        "Ignored {} malformed records in {}, full copy kept at {}",
                        report.skipped,
                        TRADES_FILE,
                        aside.display()
                    );
                }
                report.trades
            }
            None => Vec::new(),
        };

        let capital = match read_key::<f64>(&dir.join(CAPITAL_FILE))? {
            Some(value) if value.is_finite() && value >= 0.0 => value,
            Some(value) => {
                warn!("Stored capital {} is invalid, using 0", value);
                0.0
            }
            None => 0.0,
        };

        let api_key = read_key::<String>(&dir.join(API_KEY_FILE))?
            .filter(|key| !key.trim().is_empty());

        debug!(
            "Loaded journal from {}: {} trades, capital {:.2}",
            dir.display(),
            trades.len(),
            capital
        );

        Ok(Self {
            dir,
            trades,
            capital: CapitalTracker::new(capital),
            api_key,
            pending_auto_backup: None,
        })
    }

    /// Writes every key. Each file is replaced atomically.
    pub fn save(&mut self) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create data directory {}", self.dir.display()))?;

        write_key(&self.dir.join(TRADES_FILE), &self.trades)?;
        write_key(&self.dir.join(CAPITAL_FILE), &self.capital.capital())?;

        let key_path = self.dir.join(API_KEY_FILE);
        match &self.api_key {
            Some(key) => write_key(&key_path, key)?,
            None if key_path.exists() => fs::remove_file(&key_path)
                .with_context(|| format!("Failed to remove {}", key_path.display()))?,
            None => {}
        }

        if let Some(backup) = self.pending_auto_backup.take() {
            write_key(&self.dir.join(AUTO_BACKUP_FILE), &backup)?;
            info!("Auto-backup written with {} trades", backup.trades.len());
        }

        debug!("Saved journal to {}", self.dir.display());
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn add_trade(&mut self, new: NewTrade) -> journal_core::Result<Trade> {
        new.validate()?;
        let trade = Trade::from_new(new);
        self.trades.push(trade.clone());

        if should_auto_backup(self.trades.len()) {
            self.pending_auto_backup = Some(AutoBackup::new(&self.trades));
        }

        info!("Added trade {} ({} {})", trade.id, trade.trade_type, trade.date);
        Ok(trade)
    }

    pub fn delete_trade(&mut self, id: &str) -> journal_core::Result<Trade> {
        let index = self
            .trades
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| JournalError::TradeNotFound(id.to_string()))?;
        let removed = self.trades.remove(index);
        info!("Deleted trade {}", id);
        Ok(removed)
    }

    pub fn update_trade(&mut self, id: &str, update: TradeUpdate) -> journal_core::Result<Trade> {
        let trade = self
            .trades
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| JournalError::TradeNotFound(id.to_string()))?;
        trade.apply_update(update)?;
        info!("Updated trade {}", id);
        Ok(trade.clone())
    }

    pub fn clear_trades(&mut self) {
        self.trades.clear();
    }

    /// Swaps in a whole new trade list. Rejected as a whole if any trade is
    /// invalid or an id repeats.
    pub fn replace_trades(&mut self, trades: Vec<Trade>) -> journal_core::Result<()> {
        let mut ids = HashSet::new();
        for trade in &trades {
            trade.validate()?;
            if !ids.insert(trade.id.as_str()) {
                return Err(JournalError::Validation(format!("duplicate trade id {}", trade.id)));
            }
        }
        self.trades = trades;
        Ok(())
    }

    /// Imported trades replace the journal, like a restore without capital.
    pub fn import_trades(&mut self, report: ImportReport) -> usize {
        let count = report.trades.len();
        self.trades = report.trades;
        count
    }

    pub fn restore(&mut self, data: RestoredData) {
        info!(
            "Restoring {} trades and capital {:.2}",
            data.trades.len(),
            data.capital
        );
        self.trades = data.trades;
        self.capital.update_capital(data.capital);
    }

    /// Reads the last auto-backup, if one was ever written. Its trades pass
    /// through the same validator as an import.
    pub fn load_auto_backup(&self) -> Result<Option<RestoredTrades>> {
        let path = self.dir.join(AUTO_BACKUP_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let restored = restore_auto_backup(&content)
            .with_context(|| format!("Auto-backup {} is unreadable", path.display()))?;
        Ok(Some(restored))
    }

    pub fn capital(&self) -> f64 {
        self.capital.capital()
    }

    pub fn set_capital(&mut self, value: f64) {
        self.capital.update_capital(value);
    }

    pub fn clear_capital(&mut self) {
        self.capital.clear();
    }

    pub fn net_capital(&self) -> f64 {
        self.capital.net_capital(&self.trades)
    }

    pub fn return_percent(&self) -> f64 {
        self.capital.return_percent(&self.trades)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, key: &str) -> journal_core::Result<()> {
        let key = key.trim();
        if key.is_empty() {
            return Err(JournalError::Validation("API key must not be empty".to_string()));
        }
        self.api_key = Some(key.to_string());
        Ok(())
    }

    pub fn clear_api_key(&mut self) {
        self.api_key = None;
    }

    /// Statistics over the journal in date order.
    pub fn statistics(&self) -> TradeStatistics {
        calculate_trade_statistics(&chronological(&self.trades))
    }
}

fn read_key<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match serde_json::from_str(&content) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            let aside = keep_aside(path)?;
            warn!(
                "Ignoring unreadable {} ({}), copy kept at {}",
                path.display(),
                e,
                aside.display()
            );
            Ok(None)
        }
    }
}

/// Copies `path` to `<name>.json.corrupt` before a save can overwrite it.
fn keep_aside(path: &Path) -> Result<PathBuf> {
    let aside = path.with_extension("json.corrupt");
    fs::copy(path, &aside).with_context(|| format!("Failed to preserve {}", path.display()))?;
    Ok(aside)
}

fn write_key<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
