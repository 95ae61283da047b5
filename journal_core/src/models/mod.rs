// src/models/mod.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{JournalError, Result};

/// Ounces in one standard gold lot.
pub const GOLD_LOT_SIZE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    #[default]
    Buy,
    Sell,
}

impl TradeType {
    /// Label used in spreadsheet exports.
    pub fn label(&self) -> &'static str {
        match self {
            TradeType::Buy => "ซื้อ",
            TradeType::Sell => "ขาย",
        }
    }
}

impl fmt::Display for TradeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeType::Buy => write!(f, "buy"),
            TradeType::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for TradeType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Ok(TradeType::Buy),
            "sell" => Ok(TradeType::Sell),
            other => Err(JournalError::Validation(format!(
                "trade type must be buy or sell, got '{}'",
                other
            ))),
        }
    }
}

/// A closed gold position as kept in the journal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub date: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub lot_size: f64,
    #[serde(rename = "type", default)]
    pub trade_type: TradeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    pub fn from_new(new: NewTrade) -> Self {
        Self {
            id: generate_id(),
            date: new.date,
            entry_price: new.entry_price,
            exit_price: new.exit_price,
            lot_size: new.lot_size,
            trade_type: new.trade_type,
            note: new.note,
            created_at: Utc::now(),
        }
    }

    pub fn date_key(&self) -> Option<NaiveDate> {
        parse_trade_date(&self.date)
    }

    /// Checks the stored fields hold the same rules as a new entry.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(JournalError::Validation("trade id is required".to_string()));
        }
        if self.date.trim().is_empty() {
            return Err(JournalError::Validation("date is required".to_string()));
        }
        check_amount("entry price", self.entry_price)?;
        check_amount("exit price", self.exit_price)?;
        check_amount("lot size", self.lot_size)?;
        Ok(())
    }

    /// Applies a partial edit. `id` and `created_at` never change.
    pub fn apply_update(&mut self, update: TradeUpdate) -> Result<()> {
        let candidate = NewTrade {
            date: update.date.unwrap_or_else(|| self.date.clone()),
            entry_price: update.entry_price.unwrap_or(self.entry_price),
            exit_price: update.exit_price.unwrap_or(self.exit_price),
            lot_size: update.lot_size.unwrap_or(self.lot_size),
            trade_type: update.trade_type.unwrap_or(self.trade_type),
            note: match update.note {
                Some(note) if note.trim().is_empty() => None,
                Some(note) => Some(note),
                None => self.note.clone(),
            },
        };
        candidate.validate()?;

        self.date = candidate.date;
        self.entry_price = candidate.entry_price;
        self.exit_price = candidate.exit_price;
        self.lot_size = candidate.lot_size;
        self.trade_type = candidate.trade_type;
        self.note = candidate.note;
        Ok(())
    }
}

pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Reads `YYYY-MM-DD`, RFC 3339 timestamps, or anything starting with a plain date.
pub fn parse_trade_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            value
                .get(..10)
                .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        })
}

/// User-entered fields of a trade before it is given an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub date: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub lot_size: f64,
    pub trade_type: TradeType,
    pub note: Option<String>,
}

impl NewTrade {
    pub fn validate(&self) -> Result<()> {
        if self.date.trim().is_empty() {
            return Err(JournalError::Validation("date is required".to_string()));
        }
        check_amount("entry price", self.entry_price)?;
        check_amount("exit price", self.exit_price)?;
        check_amount("lot size", self.lot_size)?;
        Ok(())
    }
}

fn check_amount(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(JournalError::Validation(format!(
            "{} must be a non-negative number, got {}",
            name, value
        )));
    }
    Ok(())
}

/// Partial edit of an existing trade. An empty note clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TradeUpdate {
    pub date: Option<String>,
    pub entry_price: Option<f64>,
    pub exit_price: Option<f64>,
    pub lot_size: Option<f64>,
    pub trade_type: Option<TradeType>,
    pub note: Option<String>,
}

/// A trade-shaped record read from an import or backup file.
///
/// Only records that pass [`RawTrade::from_value`] exist, so the numeric fields
/// are always present; identity fields may still be missing until
/// [`RawTrade::normalize`] fills them in.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTrade {
    pub id: Option<String>,
    pub date: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub lot_size: f64,
    pub trade_type: Option<TradeType>,
    pub note: Option<String>,
    pub created_at: Option<String>,
}

impl RawTrade {
    /// Returns `None` when the value does not look like a trade.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let number = |key: &str| {
            obj.get(key)
                .filter(|v| v.is_number())
                .and_then(Value::as_f64)
                .filter(|n| n.is_finite() && *n >= 0.0)
        };
        let entry_price = number("entryPrice")?;
        let exit_price = number("exitPrice")?;
        let lot_size = number("lotSize")?;

        let date = obj.get("date")?.as_str()?.trim();
        if date.is_empty() {
            return None;
        }

        let trade_type = match obj.get("type") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s == "buy" => Some(TradeType::Buy),
            Some(Value::String(s)) if s == "sell" => Some(TradeType::Sell),
            Some(_) => return None,
        };

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        Some(Self {
            id,
            date: date.to_string(),
            entry_price,
            exit_price,
            lot_size,
            trade_type,
            note: obj.get("note").and_then(Value::as_str).map(str::to_string),
            created_at: obj.get("createdAt").and_then(Value::as_str).map(str::to_string),
        })
    }

    pub fn normalize(self) -> Trade {
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Trade {
            id: self.id.unwrap_or_else(generate_id),
            date: self.date,
            entry_price: self.entry_price,
            exit_price: self.exit_price,
            lot_size: self.lot_size,
            trade_type: self.trade_type.unwrap_or_default(),
            note: self.note,
            created_at,
        }
    }
}
