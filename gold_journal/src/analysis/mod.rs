// src/analysis/mod.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use journal_core::format::{format_amount, format_pnl, format_profit_factor};
use journal_core::{
    calculate_trade_pnl, calculate_trade_statistics, chronological, JournalError, Trade,
    TradeStatistics,
};
use log::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::instrument;

use crate::config::AnalysisConfig;

pub mod gemini;

pub use gemini::GeminiClient;

/// Number of most recent trades listed in a prompt.
pub const RECENT_TRADES: usize = 10;

const CONNECTION_TEST_PROMPT: &str = "สวัสดี กรุณาตอบว่า \"การเชื่อมต่อสำเร็จ\" เป็นภาษาไทย";

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Analysis API key is not set")]
    MissingApiKey,

    #[error("API key is invalid or has no access")]
    InvalidKey,

    #[error("API key is not permitted to use this model")]
    Forbidden,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error(transparent)]
    Journal(#[from] JournalError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Performance,
    Risk,
    Improvement,
    Strategy,
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnalysisType::Performance => "performance",
            AnalysisType::Risk => "risk",
            AnalysisType::Improvement => "improvement",
            AnalysisType::Strategy => "strategy",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for AnalysisType {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "performance" => Ok(AnalysisType::Performance),
            "risk" => Ok(AnalysisType::Risk),
            "improvement" => Ok(AnalysisType::Improvement),
            "strategy" => Ok(AnalysisType::Strategy),
            other => Err(JournalError::Validation(format!("unknown analysis type '{}'", other))),
        }
    }
}

/// Sampling settings forwarded to the text-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_k: u32,
    pub top_p: f64,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
        }
    }
}

impl GenerationConfig {
    /// Short, near-deterministic reply for checking a key.
    pub fn connection_test() -> Self {
        Self {
            temperature: 0.1,
            top_k: 1,
            top_p: 0.1,
            max_output_tokens: 50,
        }
    }
}

impl From<&AnalysisConfig> for GenerationConfig {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_k: config.top_k,
            top_p: config.top_p,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// A hosted model that turns a prompt into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<String, AnalysisError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub analysis: String,
    pub stats: TradeStatistics,
    pub analysis_type: AnalysisType,
    pub timestamp: DateTime<Utc>,
}

/// Builds the analysis prompt: statistics, the latest trades by date, then
/// the instructions for the requested kind of analysis.
pub fn build_prompt(
    trades: &[Trade],
    capital: f64,
    analysis_type: AnalysisType,
) -> Result<String, JournalError> {
    if trades.is_empty() {
        return Err(JournalError::EmptyTrades);
    }

    let sorted = chronological(trades);
    let stats = calculate_trade_statistics(&sorted);
    Ok(render_prompt(&sorted, &stats, capital, analysis_type))
}

/// `sorted` must already be in date order and `stats` computed over it.
fn render_prompt(
    sorted: &[Trade],
    stats: &TradeStatistics,
    capital: f64,
    analysis_type: AnalysisType,
) -> String {
    let recent = &sorted[sorted.len().saturating_sub(RECENT_TRADES)..];

    let trade_lines = recent
        .iter()
        .enumerate()
        .map(|(i, trade)| format_trade_line(i + 1, trade))
        .collect::<Vec<_>>()
        .join("\n");

    let base = format!(
        "คุณเป็น AI Trading Analyst ผู้เชี่ยวชาญด้านการวิเคราะห์การเทรดทองคำ\n\
        \n\
        ข้อมูลการเทรด:\n\
        - เงินทุนเริ่มต้น: ${} USD\n\
        - จำนวนการเทรดทั้งหมด: {}\n\
        - อัตราชนะ: {:.1}%\n\
        - กำไรขาดทุนรวม: ${} USD\n\
        - Profit Factor: {}\n\
        - กำไรเฉลี่ย: ${} USD\n\
        - ขาดทุนเฉลี่ย: ${} USD\n\
        - Max Drawdown: ${} USD\n\
        - ชนะติดต่อกันสูงสุด: {} ครั้ง\n\
        - แพ้ติดต่อกันสูงสุด: {} ครั้ง\n\
        \n\
        การเทรด {} รายการล่าสุด:\n\
        {}\n",
        format_amount(capital, 2),
        stats.total_trades,
        stats.win_rate,
        format_amount(stats.total_pnl, 2),
        format_profit_factor(stats.profit_factor),
        format_amount(stats.average_win, 2),
        format_amount(stats.average_loss, 2),
        format_amount(stats.max_drawdown, 2),
        stats.max_win_streak,
        stats.max_loss_streak,
        recent.len(),
        trade_lines,
    );

    format!("{}\n{}", base, instructions(analysis_type))
}

fn format_trade_line(number: usize, trade: &Trade) -> String {
    let note = trade
        .note
        .as_deref()
        .filter(|n| !n.is_empty())
        .map(|n| format!(" ({})", n))
        .unwrap_or_default();

    format!(
        "{}. {}: {} - เข้า ${:.2} ออก ${:.2} ขนาด {} = {} USD{}",
        number,
        trade.date,
        trade.trade_type.to_string().to_uppercase(),
        trade.entry_price,
        trade.exit_price,
        trade.lot_size,
        format_pnl(calculate_trade_pnl(trade), 2),
        note
    )
}

fn instructions(analysis_type: AnalysisType) -> &'static str {
    match analysis_type {
        AnalysisType::Performance => {
            "กรุณาวิเคราะห์ประสิทธิภาพการเทรดโดยครอบคลุม:\n\
            1. **ประเมินผลงานโดยรวม** - ดีหรือต้องปรับปรุง และเพราะอะไร\n\
            2. **จุดแข็งของการเทรด** - สิ่งที่ทำได้ดี\n\
            3. **จุดที่ต้องปรับปรุง** - ปัญหาที่พบและวิธีแก้ไข\n\
            4. **การจัดการความเสี่ยง** - ประเมิน Risk Management\n\
            5. **แนวโน้มการเทรด** - pattern ที่สังเกตได้\n\
            \n\
            ตอบเป็นภาษาไทยในรูปแบบ Markdown ที่อ่านง่าย"
        }
        AnalysisType::Risk => {
            "กรุณาวิเคราะห์ความเสี่ยงในการเทรดโดยครอบคลุม:\n\
            1. **ระดับความเสี่ยงปัจจุบัน** - สูง กลาง หรือต่ำ\n\
            2. **การกระจายความเสี่ยง** - วิเคราะห์ position sizing\n\
            3. **Max Drawdown Analysis** - ผลกระทบและการป้องกัน\n\
            4. **Consecutive Losses** - ความเสี่ยงจากการแพ้ติดต่อกัน\n\
            5. **คำแนะนำการจัดการความเสี่ยง** - วิธีลดความเสี่ยง\n\
            \n\
            ตอบเป็นภาษาไทยในรูปแบบ Markdown"
        }
        AnalysisType::Improvement => {
            "กรุณาให้คำแนะนำในการปรับปรุงการเทรดโดยครอบคลุม:\n\
            1. **จุดที่ต้องปรับปรุงเร่งด่วน** - ปัญหาสำคัญที่สุด\n\
            2. **กลยุทธ์การปรับปรุง** - วิธีการเฉพาะ\n\
            3. **การตั้งเป้าหมาย** - เป้าหมายระยะสั้นและยาว\n\
            4. **การพัฒนาทักษะ** - ทักษะที่ควรฝึกฝน\n\
            5. **แผนการดำเนินการ** - ขั้นตอนการปรับปรุง\n\
            \n\
            ตอบเป็นภาษาไทยในรูปแบบ Markdown"
        }
        AnalysisType::Strategy => {
            "กรุณาวิเคราะห์กลยุทธ์การเทรดโดยครอบคลุม:\n\
            1. **รูปแบบการเทรดปัจจุบัน** - วิเคราะห์ strategy ที่ใช้\n\
            2. **ประสิทธิภาพของกลยุทธ์** - ผลตอบแทนและความเสี่ยง\n\
            3. **การปรับปรุงกลยุทธ์** - ข้อเสนอแนะการพัฒนา\n\
            4. **กลยุทธ์ทางเลือก** - แนะนำ strategy ใหม่\n\
            5. **การเลือกจังหวะ** - timing ในการเข้าและออก\n\
            \n\
            ตอบเป็นภาษาไทยในรูปแบบ Markdown"
        }
    }
}

fn require_key(api_key: Option<&str>) -> Result<&str, AnalysisError> {
    api_key
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AnalysisError::MissingApiKey)
}

/// Runs analysis requests against a [`TextGenerator`]. One request at a time,
/// no retries; the caller decides what to show on failure.
pub struct Analyzer<G> {
    generator: G,
    generation: GenerationConfig,
}

impl<G: TextGenerator> Analyzer<G> {
    pub fn new(generator: G, generation: GenerationConfig) -> Self {
        Self {
            generator,
            generation,
        }
    }

    #[instrument(skip(self, api_key, trades), fields(trade_count = trades.len()))]
    pub async fn analyze(
        &self,
        api_key: Option<&str>,
        trades: &[Trade],
        capital: f64,
        analysis_type: AnalysisType,
    ) -> Result<AnalysisResult, AnalysisError> {
        if trades.is_empty() {
            return Err(JournalError::EmptyTrades.into());
        }
        let api_key = require_key(api_key)?;

        let sorted = chronological(trades);
        let stats = calculate_trade_statistics(&sorted);
        let prompt = render_prompt(&sorted, &stats, capital, analysis_type);
        debug!("Sending {} analysis prompt ({} chars)", analysis_type, prompt.chars().count());

        let analysis = self
            .generator
            .generate(api_key, &prompt, &self.generation)
            .await
            .map_err(|e| {
                error!("Analysis request failed: {}", e);
                e
            })?;

        info!("Received {} analysis", analysis_type);
        Ok(AnalysisResult {
            analysis,
            stats,
            analysis_type,
            timestamp: Utc::now(),
        })
    }

    /// Sends a tiny prompt to check that the key works. Returns the reply.
    pub async fn test_connection(&self, api_key: Option<&str>) -> Result<String, AnalysisError> {
        let api_key = require_key(api_key)?;
        let reply = self
            .generator
            .generate(api_key, CONNECTION_TEST_PROMPT, &GenerationConfig::connection_test())
            .await?;
        info!("Connection test succeeded");
        Ok(reply)
    }
}
