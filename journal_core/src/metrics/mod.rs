// src/metrics/mod.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::format::{format_amount, format_profit_factor};
use crate::models::Trade;
use crate::pnl::calculate_trade_pnl;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub neutral_trades: usize,
    pub total_pnl: f64,
    pub win_rate: f64,
    pub average_win: f64,
    pub average_loss: f64,
    /// `+∞` when there are wins and no losses; written to JSON as `"Infinity"`.
    #[serde(with = "profit_factor_json")]
    pub profit_factor: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub max_drawdown: f64,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
}

/// JSON has no infinity, and `serde_json` would write `null`.
mod profit_factor_json {
    use serde::{de, Deserialize, Deserializer, Serializer};

    const INFINITY: &str = "Infinity";

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            serializer.serialize_str(INFINITY)
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(n),
            Repr::Text(s) if s == INFINITY || s == "∞" => Ok(f64::INFINITY),
            Repr::Text(s) => Err(de::Error::custom(format!("invalid profit factor '{}'", s))),
        }
    }
}

/// Returns the trades ordered by trade date. The sort is stable, so trades on
/// the same day keep their insertion order; unparseable dates sort first.
pub fn chronological(trades: &[Trade]) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    sorted.sort_by_key(|t| t.date_key());
    sorted
}

/// Aggregate statistics over `trades` in the order given.
///
/// Drawdown and streaks walk the slice front to back, so they depend on the
/// ordering. Pass the output of [`chronological`] for date-ordered figures.
pub fn calculate_trade_statistics(trades: &[Trade]) -> TradeStatistics {
    if trades.is_empty() {
        return TradeStatistics::default();
    }

    let pnls: Vec<f64> = trades.iter().map(calculate_trade_pnl).collect();

    let mut winning_trades = 0;
    let mut losing_trades = 0;
    let mut neutral_trades = 0;
    let mut total_wins = 0.0;
    let mut total_losses = 0.0;
    let mut largest_win: f64 = 0.0;
    let mut largest_loss: f64 = 0.0;

    for &pnl in &pnls {
        if pnl > 0.0 {
            winning_trades += 1;
            total_wins += pnl;
            largest_win = largest_win.max(pnl);
        } else if pnl < 0.0 {
            losing_trades += 1;
            total_losses += pnl.abs();
            largest_loss = largest_loss.min(pnl);
        } else {
            neutral_trades += 1;
        }
    }

    let total_trades = trades.len();
    let total_pnl: f64 = pnls.iter().sum();
    let (max_win_streak, max_loss_streak) = calculate_streaks(&pnls);

    let profit_factor = if total_losses > 0.0 {
        total_wins / total_losses
    } else if total_wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    };

    TradeStatistics {
        total_trades,
        winning_trades,
        losing_trades,
        neutral_trades,
        total_pnl,
        win_rate: winning_trades as f64 / total_trades as f64 * 100.0,
        average_win: if winning_trades > 0 {
            total_wins / winning_trades as f64
        } else {
            0.0
        },
        average_loss: if losing_trades > 0 {
            total_losses / losing_trades as f64
        } else {
            0.0
        },
        profit_factor,
        largest_win,
        largest_loss,
        max_drawdown: calculate_max_drawdown(&pnls),
        max_win_streak,
        max_loss_streak,
    }
}

/// Largest peak-to-trough fall of the running P&L total. The peak starts at 0.
pub fn calculate_max_drawdown(pnls: &[f64]) -> f64 {
    let mut max_drawdown: f64 = 0.0;
    let mut peak: f64 = 0.0;
    let mut cumulative = 0.0;

    for pnl in pnls {
        cumulative += pnl;
        if cumulative > peak {
            peak = cumulative;
        }
        max_drawdown = max_drawdown.max(peak - cumulative);
    }

    max_drawdown
}

/// Longest (win, loss) runs. A flat trade breaks both.
pub fn calculate_streaks(pnls: &[f64]) -> (usize, usize) {
    let mut max_win = 0;
    let mut max_loss = 0;
    let mut current_win = 0;
    let mut current_loss = 0;

    for &pnl in pnls {
        if pnl > 0.0 {
            current_win += 1;
            current_loss = 0;
            max_win = max_win.max(current_win);
        } else if pnl < 0.0 {
            current_loss += 1;
            current_win = 0;
            max_loss = max_loss.max(current_loss);
        } else {
            current_win = 0;
            current_loss = 0;
        }
    }

    (max_win, max_loss)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPnl {
    pub date: String,
    pub pnl: f64,
    pub trades: usize,
}

/// P&L summed per date string, ordered by date.
pub fn daily_pnl(trades: &[Trade]) -> Vec<DailyPnl> {
    let mut days: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for trade in trades {
        let entry = days.entry(trade.date.clone()).or_insert((0.0, 0));
        entry.0 += calculate_trade_pnl(trade);
        entry.1 += 1;
    }

    days.into_iter()
        .map(|(date, (pnl, trades))| DailyPnl { date, pnl, trades })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStatistics {
    #[serde(flatten)]
    pub summary: TradeStatistics,
    pub average_trades_per_day: f64,
    pub best_trading_day: Option<DailyPnl>,
    pub worst_trading_day: Option<DailyPnl>,
}

pub fn calculate_detailed_statistics(trades: &[Trade]) -> DetailedStatistics {
    let summary = calculate_trade_statistics(trades);
    let days = daily_pnl(trades);

    let average_trades_per_day = if days.is_empty() {
        0.0
    } else {
        trades.len() as f64 / days.len() as f64
    };

    // First occurrence wins on ties.
    let best_trading_day = days
        .iter()
        .fold(None::<&DailyPnl>, |best, day| match best {
            Some(b) if b.pnl >= day.pnl => Some(b),
            _ => Some(day),
        })
        .cloned();
    let worst_trading_day = days
        .iter()
        .fold(None::<&DailyPnl>, |worst, day| match worst {
            Some(w) if w.pnl <= day.pnl => Some(w),
            _ => Some(day),
        })
        .cloned();

    DetailedStatistics {
        summary,
        average_trades_per_day,
        best_trading_day,
        worst_trading_day,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativePoint {
    pub trade_number: usize,
    pub date: String,
    pub trade_pnl: f64,
    pub cumulative_pnl: f64,
}

/// Running P&L over the trades sorted by date.
pub fn cumulative_pnl(trades: &[Trade]) -> Vec<CumulativePoint> {
    let mut cumulative = 0.0;
    chronological(trades)
        .iter()
        .enumerate()
        .map(|(i, trade)| {
            let trade_pnl = calculate_trade_pnl(trade);
            cumulative += trade_pnl;
            CumulativePoint {
                trade_number: i + 1,
                date: trade.date.clone(),
                trade_pnl,
                cumulative_pnl: cumulative,
            }
        })
        .collect()
}

pub fn generate_report(stats: &TradeStatistics) -> String {
    format!(
        "Trade Statistics\n\
        ----------------\n\
        Total Trades: {}\n\
        Winning / Losing / Flat: {} / {} / {}\n\
        Win Rate: {:.1}%\n\
        Total P&L: ${}\n\
        Profit Factor: {}\n\
        Average Win: ${}\n\
        Average Loss: ${}\n\
        Largest Win: ${}\n\
        Largest Loss: ${}\n\
        \n\
        Risk\n\
        ----\n\
        Max Drawdown: ${}\n\
        Max Win Streak: {}\n\
        Max Loss Streak: {}",
        stats.total_trades,
        stats.winning_trades,
        stats.losing_trades,
        stats.neutral_trades,
        stats.win_rate,
        format_amount(stats.total_pnl, 2),
        format_profit_factor(stats.profit_factor),
        format_amount(stats.average_win, 2),
        format_amount(stats.average_loss, 2),
        format_amount(stats.largest_win, 2),
        format_amount(stats.largest_loss, 2),
        format_amount(stats.max_drawdown, 2),
        stats.max_win_streak,
        stats.max_loss_streak,
    )
}
