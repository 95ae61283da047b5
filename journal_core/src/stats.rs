// src/stats.rs
use chrono::{Datelike, Duration, NaiveDate};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::JournalError;
use crate::models::Trade;
use crate::pnl::calculate_trade_pnl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Daily,
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

impl Timeframe {
    /// Bucket label for a date. Weeks start on Sunday.
    pub fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            Timeframe::Daily => date.format("%Y-%m-%d").to_string(),
            Timeframe::Weekly => {
                let offset = date.weekday().num_days_from_sunday() as i64;
                (date - Duration::days(offset)).format("%Y-%m-%d").to_string()
            }
            Timeframe::Monthly => date.format("%Y-%m").to_string(),
            Timeframe::Yearly => date.year().to_string(),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Timeframe::Daily => "daily",
            Timeframe::Weekly => "weekly",
            Timeframe::Monthly => "monthly",
            Timeframe::Yearly => "yearly",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Timeframe {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Timeframe::Daily),
            "weekly" => Ok(Timeframe::Weekly),
            "monthly" => Ok(Timeframe::Monthly),
            "yearly" => Ok(Timeframe::Yearly),
            other => Err(JournalError::Validation(format!("unknown timeframe '{}'", other))),
        }
    }
}

/// Win/loss/flat counts for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub period: String,
    pub winning: usize,
    pub losing: usize,
    pub neutral: usize,
    pub total: usize,
    pub win_rate: f64,
}

impl PeriodStats {
    fn record(&mut self, pnl: f64) {
        if pnl > 0.0 {
            self.winning += 1;
        } else if pnl < 0.0 {
            self.losing += 1;
        } else {
            self.neutral += 1;
        }
        self.total += 1;
        self.win_rate = self.winning as f64 / self.total as f64 * 100.0;
    }
}

/// Groups trades into period buckets, sorted by bucket key.
pub fn calculate_period_breakdown(trades: &[Trade], timeframe: Timeframe) -> Vec<PeriodStats> {
    let mut buckets: BTreeMap<String, PeriodStats> = BTreeMap::new();

    for trade in trades {
        let Some(date) = trade.date_key() else {
            warn!("Skipping trade {} with unreadable date '{}'", trade.id, trade.date);
            continue;
        };

        let key = timeframe.bucket_key(date);
        buckets
            .entry(key.clone())
            .or_insert_with(|| PeriodStats {
                period: key,
                ..Default::default()
            })
            .record(calculate_trade_pnl(trade));
    }

    buckets.into_values().collect()
}

/// Whole-collection proportion, the pie-chart view of the journal.
pub fn overall_proportion(trades: &[Trade]) -> PeriodStats {
    let mut overall = PeriodStats {
        period: "all".to_string(),
        ..Default::default()
    };
    for trade in trades {
        overall.record(calculate_trade_pnl(trade));
    }
    overall
}
