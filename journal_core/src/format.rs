// src/format.rs
//! USD display helpers shared by reports, exports and prompts.

/// `1234.5` -> `1,234.50`. Negative values keep a leading minus.
pub fn format_amount(amount: f64, decimals: usize) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let fixed = format!("{:.*}", decimals, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// `-1234.5` -> `-$1,234.50`
pub fn format_currency(amount: f64, decimals: usize) -> String {
    let body = format_amount(amount.abs(), decimals);
    if amount < 0.0 && body.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-${}", body)
    } else {
        format!("${}", body)
    }
}

/// Signed P&L, e.g. `+$100.00` or `-$50.00`.
pub fn format_pnl(amount: f64, decimals: usize) -> String {
    let sign = if amount >= 0.0 { "+" } else { "-" };
    format!("{}${}", sign, format_amount(amount.abs(), decimals))
}

pub fn format_compact_currency(amount: f64) -> String {
    let abs = amount.abs();
    if abs >= 1_000_000_000.0 {
        format!("${:.1}B", amount / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("${:.1}M", amount / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("${:.1}K", amount / 1_000.0)
    } else {
        format_currency(amount, 2)
    }
}

pub fn format_profit_factor(profit_factor: f64) -> String {
    if profit_factor.is_infinite() {
        "∞".to_string()
    } else {
        format!("{:.2}", profit_factor)
    }
}
