pub mod backup;
pub mod capital;
pub mod error;
pub mod format;
pub mod metrics;
pub mod models;
pub mod pnl;
pub mod stats;
pub mod transfer;

// Re-export key types to make them easier to use from the front-end and tests
pub use crate::backup::{
    create_backup, restore_auto_backup, restore_backup, AutoBackup, Backup, RestoredData,
    RestoredTrades,
};
pub use crate::capital::{parse_capital_input, CapitalTracker};
pub use crate::error::{JournalError, Result};
pub use crate::metrics::{calculate_trade_statistics, chronological, TradeStatistics};
pub use crate::models::{NewTrade, RawTrade, Trade, TradeType, TradeUpdate, GOLD_LOT_SIZE};
pub use crate::pnl::calculate_trade_pnl;
pub use crate::stats::{calculate_period_breakdown, PeriodStats, Timeframe};
pub use crate::transfer::{export_csv, export_json, import_json, ImportReport};
