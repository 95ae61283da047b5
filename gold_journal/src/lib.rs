pub mod analysis;
pub mod config;
pub mod store;

// Re-export commonly used types
pub use crate::analysis::{
    build_prompt, AnalysisError, AnalysisResult, AnalysisType, Analyzer, GeminiClient,
    GenerationConfig, TextGenerator,
};
pub use crate::config::{AnalysisConfig, Config, GeneralConfig};
pub use crate::store::JournalStore;

use tracing_subscriber::{fmt, EnvFilter};
use log::info;

/// Logs go to stderr so command output on stdout stays clean.
/// `RUST_LOG` overrides the configured level.
pub fn setup_logging(default_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    info!("Logging initialized");
}
