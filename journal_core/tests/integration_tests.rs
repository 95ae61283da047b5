// tests/integration_tests.rs
use journal_core::metrics::calculate_detailed_statistics;
use journal_core::{
    calculate_period_breakdown, calculate_trade_pnl, calculate_trade_statistics, chronological,
    create_backup, export_csv, export_json, import_json, restore_backup, CapitalTracker,
    JournalError, NewTrade, Timeframe, Trade, TradeType,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn log_trade(date: &str, trade_type: TradeType, entry: f64, exit: f64, lot: f64, note: Option<&str>) -> Trade {
    Trade::from_new(NewTrade {
        date: date.to_string(),
        entry_price: entry,
        exit_price: exit,
        lot_size: lot,
        trade_type,
        note: note.map(str::to_string),
    })
}

fn journal() -> Vec<Trade> {
    vec![
        log_trade("2024-01-03", TradeType::Buy, 2040.0, 2052.5, 0.2, Some("NY session")),
        log_trade("2024-01-04", TradeType::Sell, 2050.0, 2058.0, 0.5, None),
        log_trade("2024-01-08", TradeType::Sell, 2030.0, 2011.0, 0.3, Some("CPI fade")),
        log_trade("2024-02-01", TradeType::Buy, 2035.0, 2035.0, 1.0, None),
        log_trade("2024-02-02", TradeType::Buy, 2040.0, 2031.0, 0.1, None),
    ]
}

#[test]
fn test_pnl_examples() {
    let buy = log_trade("2024-01-01", TradeType::Buy, 2000.0, 2010.0, 0.1, None);
    let sell = log_trade("2024-01-01", TradeType::Sell, 2010.0, 2000.0, 0.1, None);
    assert!((calculate_trade_pnl(&buy) - 100.0).abs() < 1e-9);
    assert!((calculate_trade_pnl(&sell) - 100.0).abs() < 1e-9);
}

#[test]
fn test_statistics_over_journal() {
    init_logger();
    let trades = chronological(&journal());
    let stats = calculate_trade_statistics(&trades);

    // +250, -400, +570, 0, -90
    assert_eq!(stats.total_trades, 5);
    assert_eq!(stats.winning_trades, 2);
    assert_eq!(stats.losing_trades, 2);
    assert_eq!(stats.neutral_trades, 1);
    assert!((stats.total_pnl - 330.0).abs() < 1e-6);
    assert!((stats.win_rate - 40.0).abs() < 1e-9);
    assert!((stats.profit_factor - 820.0 / 490.0).abs() < 1e-6);
    assert!((stats.max_drawdown - 400.0).abs() < 1e-6);
    assert_eq!(stats.max_win_streak, 1);
    assert_eq!(stats.max_loss_streak, 1);
    assert!((stats.largest_loss + 400.0).abs() < 1e-6);

    let detailed = calculate_detailed_statistics(&trades);
    assert_eq!(detailed.summary, stats);
    assert_eq!(detailed.best_trading_day.unwrap().date, "2024-01-08");
}

#[test]
fn test_monthly_breakdown_over_journal() {
    let breakdown = calculate_period_breakdown(&journal(), Timeframe::Monthly);
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0].period, "2024-01");
    assert_eq!(breakdown[0].winning, 2);
    assert_eq!(breakdown[1].neutral, 1);
    assert_eq!(breakdown[1].losing, 1);
}

#[test]
fn test_json_export_import_round_trip() {
    init_logger();
    let trades = journal();
    let exported = export_json(&trades).expect("export should succeed");
    let imported = import_json(&exported).expect("import should succeed");

    assert_eq!(imported.skipped, 0);
    assert_eq!(imported.trades.len(), trades.len());
    for (before, after) in trades.iter().zip(&imported.trades) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.date, after.date);
        assert_eq!(before.entry_price, after.entry_price);
        assert_eq!(before.exit_price, after.exit_price);
        assert_eq!(before.lot_size, after.lot_size);
        assert_eq!(before.trade_type, after.trade_type);
        assert_eq!(before.note, after.note);
    }
}

#[test]
fn test_import_of_legacy_file() {
    let content = r#"{"trades":[{"entryPrice":2000,"exitPrice":2010,"lotSize":0.1,"date":"2024-01-01"}]}"#;
    let report = import_json(content).unwrap();
    assert_eq!(report.trades.len(), 1);
    assert_eq!(report.trades[0].trade_type, TradeType::Buy);
    assert!(!report.trades[0].id.is_empty());

    let mixed = r#"[
        {"entryPrice":2000,"exitPrice":2010,"lotSize":0.1,"date":"2024-01-01"},
        {"entryPrice":2000,"exitPrice":2010,"date":"2024-01-01"}
    ]"#;
    assert_eq!(import_json(mixed).unwrap().trades.len(), 1);

    assert!(matches!(import_json("[]"), Err(JournalError::InvalidFormat(_))));
}

#[test]
fn test_csv_export_has_row_per_trade() {
    let csv = export_csv(&journal()).unwrap();
    assert!(csv.starts_with('\u{FEFF}'));
    assert_eq!(csv.lines().count(), 6);
    assert!(csv.contains("\"CPI fade\""));
}

#[test]
fn test_backup_restore_and_capital() {
    let trades = journal();
    let content = create_backup(&trades, 10_000.0).unwrap();
    let restored = restore_backup(&content).unwrap();

    let tracker = CapitalTracker::new(restored.capital);
    assert!((tracker.net_capital(&restored.trades) - 10_330.0).abs() < 1e-6);
}
