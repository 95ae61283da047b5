// src/backup.rs
use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{JournalError, Result};
use crate::models::Trade;
use crate::transfer::validate_records;

pub const BACKUP_VERSION: &str = "1.0";

/// Auto-backups are taken whenever the trade count reaches a multiple of this.
pub const AUTO_BACKUP_INTERVAL: usize = 5;

/// Trades plus capital, written on demand by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Backup {
    pub backup_date: DateTime<Utc>,
    pub trades: Vec<Trade>,
    pub capital: f64,
    pub version: String,
}

/// Snapshot kept next to the journal every few additions. Trades only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoBackup {
    pub export_date: DateTime<Utc>,
    pub trades: Vec<Trade>,
    pub version: String,
}

impl AutoBackup {
    pub fn new(trades: &[Trade]) -> Self {
        Self {
            export_date: Utc::now(),
            trades: trades.to_vec(),
            version: BACKUP_VERSION.to_string(),
        }
    }
}

pub fn should_auto_backup(trade_count: usize) -> bool {
    trade_count > 0 && trade_count % AUTO_BACKUP_INTERVAL == 0
}

#[derive(Debug, Clone)]
pub struct RestoredData {
    pub trades: Vec<Trade>,
    pub capital: f64,
    pub backup_date: Option<String>,
}

pub fn create_backup(trades: &[Trade], capital: f64) -> Result<String> {
    if trades.is_empty() {
        return Err(JournalError::EmptyTrades);
    }

    let backup = Backup {
        backup_date: Utc::now(),
        trades: trades.to_vec(),
        capital,
        version: BACKUP_VERSION.to_string(),
    };
    Ok(serde_json::to_string_pretty(&backup)?)
}

/// Checks a backup file and returns its contents. Nothing is applied here.
pub fn restore_backup(content: &str) -> Result<RestoredData> {
    let data = parse_document(content)?;

    let capital = data
        .get("capital")
        .filter(|v| v.is_number())
        .and_then(Value::as_f64)
        .ok_or_else(|| JournalError::InvalidFormat("backup capital is not a number".to_string()))?;
    if !capital.is_finite() || capital < 0.0 {
        return Err(JournalError::InvalidFormat(format!(
            "backup capital must be non-negative, got {}",
            capital
        )));
    }

    let trades = read_trades(&data)?;
    info!("Backup read: {} trades, capital {:.2}", trades.len(), capital);

    Ok(RestoredData {
        trades,
        capital,
        backup_date: document_date(&data),
    })
}

/// Trades from an auto-backup, checked the same way as a backup file.
#[derive(Debug, Clone)]
pub struct RestoredTrades {
    pub trades: Vec<Trade>,
    pub export_date: Option<String>,
}

pub fn restore_auto_backup(content: &str) -> Result<RestoredTrades> {
    let data = parse_document(content)?;
    let trades = read_trades(&data)?;
    info!("Auto-backup read: {} trades", trades.len());

    Ok(RestoredTrades {
        trades,
        export_date: document_date(&data),
    })
}

fn parse_document(content: &str) -> Result<Value> {
    serde_json::from_str(content.trim_start_matches('\u{FEFF}'))
        .map_err(|e| JournalError::InvalidFormat(format!("backup is not valid JSON: {}", e)))
}

fn read_trades(data: &Value) -> Result<Vec<Trade>> {
    let records = data
        .get("trades")
        .and_then(Value::as_array)
        .ok_or_else(|| JournalError::InvalidFormat("backup has no trades array".to_string()))?;

    let report = validate_records(records);
    if report.skipped > 0 {
        warn!("Backup contained {} unreadable trades, they were dropped", report.skipped);
    }
    Ok(report.trades)
}

fn document_date(data: &Value) -> Option<String> {
    data.get("backupDate")
        .or_else(|| data.get("exportDate"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

pub fn default_backup_file_name(today: NaiveDate) -> String {
    format!("gold-trading-backup-{}.json", today.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTrade, TradeType};

    fn trades() -> Vec<Trade> {
        vec![Trade::from_new(NewTrade {
            date: "2024-01-01".to_string(),
            entry_price: 2000.0,
            exit_price: 2010.0,
            lot_size: 0.1,
            trade_type: TradeType::Sell,
            note: Some("fade".to_string()),
        })]
    }

    #[test]
    fn test_backup_round_trip() {
        let original = trades();
        let content = create_backup(&original, 5000.0).unwrap();
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["version"], "1.0");
        assert!(value.get("backupDate").is_some());

        let restored = restore_backup(&content).unwrap();
        assert_eq!(restored.capital, 5000.0);
        assert_eq!(restored.trades, original);
        assert!(restored.backup_date.is_some());
    }

    #[test]
    fn test_backup_rejects_empty() {
        assert!(matches!(create_backup(&[], 10.0), Err(JournalError::EmptyTrades)));
    }

    #[test]
    fn test_restore_validation() {
        assert!(matches!(restore_backup("nope"), Err(JournalError::InvalidFormat(_))));
        assert!(matches!(
            restore_backup(r#"{"trades":{},"capital":1}"#),
            Err(JournalError::InvalidFormat(_))
        ));
        assert!(matches!(
            restore_backup(r#"{"trades":[],"capital":"1000"}"#),
            Err(JournalError::InvalidFormat(_))
        ));
        assert!(matches!(
            restore_backup(r#"{"trades":[],"capital":-5}"#),
            Err(JournalError::InvalidFormat(_))
        ));

        let restored = restore_backup(r#"{"trades":[],"capital":0}"#).unwrap();
        assert!(restored.trades.is_empty());
        assert!(restored.backup_date.is_none());
    }

    #[test]
    fn test_auto_backup_restore_runs_validator() {
        let content = r#"{
            "exportDate": "2024-06-01T10:00:00Z",
            "version": "1.0",
            "trades": [
                {"id": "x", "date": "2024-05-01", "entryPrice": 2300, "exitPrice": 2310, "lotSize": 0.1, "type": "buy"},
                {"id": "x", "date": "2024-05-02", "entryPrice": 2300, "exitPrice": 2310, "lotSize": -1, "type": "buy"},
                {"id": "x", "date": "2024-05-03", "entryPrice": 2300, "exitPrice": 2290, "lotSize": 0.2}
            ]
        }"#;

        let restored = restore_auto_backup(content).unwrap();
        assert_eq!(restored.export_date.as_deref(), Some("2024-06-01T10:00:00Z"));
        assert_eq!(restored.trades.len(), 2);
        assert_eq!(restored.trades[0].id, "x");
        assert_ne!(restored.trades[1].id, "x");
        assert!(restored.trades.iter().all(|t| t.lot_size >= 0.0));

        let written = serde_json::to_string(&AutoBackup::new(&trades())).unwrap();
        assert_eq!(restore_auto_backup(&written).unwrap().trades, trades());

        assert!(matches!(
            restore_auto_backup(r#"{"exportDate": "2024-06-01"}"#),
            Err(JournalError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_auto_backup_interval() {
        assert!(!should_auto_backup(0));
        assert!(!should_auto_backup(4));
        assert!(should_auto_backup(5));
        assert!(should_auto_backup(10));
        assert_eq!(AutoBackup::new(&trades()).version, "1.0");
    }

    #[test]
    fn test_default_backup_file_name() {
        let day = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(default_backup_file_name(day), "gold-trading-backup-2024-12-31.json");
    }
}
