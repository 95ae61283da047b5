// src/pnl.rs
use crate::models::{Trade, TradeType, GOLD_LOT_SIZE};

/// Signed USD result of a closed trade. Sells profit when price falls.
pub fn calculate_trade_pnl(trade: &Trade) -> f64 {
    calculate_pnl(trade.entry_price, trade.exit_price, trade.lot_size, trade.trade_type)
}

pub fn calculate_pnl(entry_price: f64, exit_price: f64, lot_size: f64, trade_type: TradeType) -> f64 {
    let price_difference = exit_price - entry_price;
    match trade_type {
        TradeType::Buy => price_difference * lot_size * GOLD_LOT_SIZE,
        TradeType::Sell => -price_difference * lot_size * GOLD_LOT_SIZE,
    }
}

pub fn calculate_pnl_per_ounce(trade: &Trade) -> f64 {
    let price_difference = trade.exit_price - trade.entry_price;
    match trade.trade_type {
        TradeType::Buy => price_difference,
        TradeType::Sell => -price_difference,
    }
}

pub fn calculate_total_ounces(lot_size: f64) -> f64 {
    lot_size * GOLD_LOT_SIZE
}

pub fn calculate_notional_value(price: f64, lot_size: f64) -> f64 {
    price * lot_size * GOLD_LOT_SIZE
}

/// P&L relative to the entry notional, in percent.
pub fn calculate_pnl_percentage(trade: &Trade) -> f64 {
    let entry_value = calculate_notional_value(trade.entry_price, trade.lot_size);
    if entry_value > 0.0 {
        calculate_trade_pnl(trade) / entry_value * 100.0
    } else {
        0.0
    }
}

pub fn is_profit(trade: &Trade) -> bool {
    calculate_trade_pnl(trade) > 0.0
}

pub fn is_loss(trade: &Trade) -> bool {
    calculate_trade_pnl(trade) < 0.0
}

pub fn total_pnl(trades: &[Trade]) -> f64 {
    trades.iter().map(calculate_trade_pnl).sum()
}
