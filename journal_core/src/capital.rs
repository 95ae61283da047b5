// src/capital.rs
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};
use crate::models::Trade;
use crate::pnl::total_pnl;

/// Starting capital. Net capital is always derived from the trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CapitalTracker {
    capital: f64,
}

impl CapitalTracker {
    pub fn new(capital: f64) -> Self {
        Self { capital }
    }

    pub fn capital(&self) -> f64 {
        self.capital
    }

    /// Replaces the stored value. Input checking belongs to the caller; see
    /// [`parse_capital_input`].
    pub fn update_capital(&mut self, value: f64) {
        self.capital = value;
    }

    pub fn clear(&mut self) {
        self.capital = 0.0;
    }

    pub fn net_capital(&self, trades: &[Trade]) -> f64 {
        self.capital + total_pnl(trades)
    }

    pub fn return_percent(&self, trades: &[Trade]) -> f64 {
        if self.capital > 0.0 {
            total_pnl(trades) / self.capital * 100.0
        } else {
            0.0
        }
    }
}

/// Parses a capital amount typed by the user.
pub fn parse_capital_input(input: &str) -> Result<f64> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| JournalError::Validation(format!("'{}' is not a valid amount", input.trim())))?;

    if !value.is_finite() || value < 0.0 {
        return Err(JournalError::Validation(format!(
            "capital must be a non-negative amount, got {}",
            value
        )));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTrade, TradeType};

    fn trade(exit: f64) -> Trade {
        Trade::from_new(NewTrade {
            date: "2024-01-01".to_string(),
            entry_price: 2000.0,
            exit_price: exit,
            lot_size: 1.0,
            trade_type: TradeType::Buy,
            note: None,
        })
    }

    #[test]
    fn test_net_capital_is_recomputed() {
        let mut tracker = CapitalTracker::default();
        assert_eq!(tracker.capital(), 0.0);

        tracker.update_capital(10_000.0);
        let mut trades = vec![trade(2010.0)];
        assert_eq!(tracker.net_capital(&trades), 11_000.0);
        assert_eq!(tracker.return_percent(&trades), 10.0);

        trades.push(trade(1995.0));
        assert_eq!(tracker.net_capital(&trades), 10_500.0);

        tracker.clear();
        assert_eq!(tracker.net_capital(&trades), 500.0);
        assert_eq!(tracker.return_percent(&trades), 0.0);
    }

    #[test]
    fn test_parse_capital_input() {
        assert_eq!(parse_capital_input(" 2500.50 ").unwrap(), 2500.5);
        assert_eq!(parse_capital_input("0").unwrap(), 0.0);
        assert!(parse_capital_input("-1").is_err());
        assert!(parse_capital_input("abc").is_err());
        assert!(parse_capital_input("NaN").is_err());
        assert!(parse_capital_input("inf").is_err());
    }
}
