// src/transfer.rs
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::error::{JournalError, Result};
use crate::models::{generate_id, RawTrade, Trade};
use crate::pnl::{calculate_trade_pnl, total_pnl};

pub const CSV_HEADERS: [&str; 7] = [
    "วันที่",
    "ประเภท",
    "ราคาเข้า",
    "ราคาออก",
    "ขนาด Lot",
    "กำไร/ขาดทุน",
    "หมายเหตุ",
];

const UTF8_BOM: &str = "\u{FEFF}";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: DateTime<Utc>,
    pub trades: Vec<Trade>,
    pub summary: ExportSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSummary {
    #[serde(rename = "totalTrades")]
    pub total_trades: usize,
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
}

#[derive(Debug, Clone)]
pub struct ImportReport {
    pub trades: Vec<Trade>,
    pub skipped: usize,
}

pub fn export_json(trades: &[Trade]) -> Result<String> {
    if trades.is_empty() {
        return Err(JournalError::EmptyTrades);
    }

    let document = ExportDocument {
        export_date: Utc::now(),
        trades: trades.to_vec(),
        summary: ExportSummary {
            total_trades: trades.len(),
            total_pnl: total_pnl(trades),
        },
    };

    let json = serde_json::to_string_pretty(&document)?;
    info!("Exported {} trades as JSON", trades.len());
    Ok(json)
}

/// Spreadsheet export: UTF-8 with BOM, every value quoted.
pub fn export_csv(trades: &[Trade]) -> Result<String> {
    if trades.is_empty() {
        return Err(JournalError::EmptyTrades);
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for trade in trades {
        writer.write_record([
            trade.date.clone(),
            trade.trade_type.label().to_string(),
            format!("{:.2}", trade.entry_price),
            format!("{:.2}", trade.exit_price),
            trade.lot_size.to_string(),
            format!("{:.2}", calculate_trade_pnl(trade)),
            trade.note.clone().unwrap_or_default(),
        ])?;
    }

    let rows = writer
        .into_inner()
        .map_err(|e| JournalError::Io(e.into_error()))?;
    let rows = String::from_utf8(rows)
        .map_err(|e| JournalError::InvalidFormat(format!("CSV output is not UTF-8: {}", e)))?;

    info!("Exported {} trades as CSV", trades.len());
    Ok(format!("{}{}\n{}", UTF8_BOM, CSV_HEADERS.join(","), rows))
}

/// Reads a bare array of trades or any object carrying a `trades` array.
pub fn import_json(content: &str) -> Result<ImportReport> {
    let data: Value = serde_json::from_str(content.trim_start_matches(UTF8_BOM))
        .map_err(|e| JournalError::InvalidFormat(format!("file is not valid JSON: {}", e)))?;

    let records = match &data {
        Value::Array(items) => items,
        Value::Object(obj) => match obj.get("trades") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(JournalError::InvalidFormat(
                    "expected an array of trades or an object with a trades array".to_string(),
                ))
            }
        },
        _ => {
            return Err(JournalError::InvalidFormat(
                "expected an array of trades or an object with a trades array".to_string(),
            ))
        }
    };

    let report = validate_records(records);
    if report.trades.is_empty() {
        return Err(JournalError::InvalidFormat("no valid trades found".to_string()));
    }

    info!(
        "Imported {} trades ({} skipped)",
        report.trades.len(),
        report.skipped
    );
    Ok(report)
}

/// Keeps trade-shaped records, normalizes them and makes ids unique.
pub fn validate_records(records: &[Value]) -> ImportReport {
    let mut seen = HashSet::new();
    let mut trades = Vec::with_capacity(records.len());

    for record in records {
        if let Some(raw) = RawTrade::from_value(record) {
            let mut trade = raw.normalize();
            if !seen.insert(trade.id.clone()) {
                debug!("Duplicate trade id {} in import, assigning a new one", trade.id);
                trade.id = generate_id();
                seen.insert(trade.id.clone());
            }
            trades.push(trade);
        }
    }

    let skipped = records.len() - trades.len();
    if skipped > 0 {
        debug!("Dropped {} records that did not look like trades", skipped);
    }

    ImportReport { trades, skipped }
}

pub fn default_export_file_name(extension: &str, today: NaiveDate) -> String {
    format!("gold-trades-{}.{}", today.format("%Y-%m-%d"), extension)
}
