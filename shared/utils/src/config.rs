use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use validator::{Validate, ValidationError};

use crate::error::{FinRiskError, FinRiskResult};
use crate::validation::format_validation_errors;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    #[validate]
    pub extraction: ExtractionConfig,
    #[validate]
    pub chunking: ChunkingConfig,
    #[validate]
    pub relevance: RelevanceConfig,
    #[validate]
    pub limits: OutputLimits,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub file_path: Option<String>,
}

/// Which characters survive final text normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacterPolicy {
    /// Every non-control character, including currency symbols and CJK names.
    #[default]
    Unicode,
    /// Printable ASCII plus the Latin-1 supplement and Latin Extended-A/B.
    Latin,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Total characters a strategy must recover before it is accepted.
    #[validate(range(min = 1, message = "min_document_chars must be positive"))]
    pub min_document_chars: usize,
    /// Vertical movement (user-space units) that starts a new line.
    #[validate(range(min = 0.0, message = "line_tolerance must not be negative"))]
    pub line_tolerance: f64,
    /// Horizontal gap on one line rendered as a single space.
    #[validate(range(min = 0.0, message = "column_gap must not be negative"))]
    pub column_gap: f64,
    #[validate(range(min = 1, message = "min_fragment_chars must be positive"))]
    pub min_fragment_chars: usize,
    #[validate(range(min = 1, message = "min_raw_run_chars must be positive"))]
    pub min_raw_run_chars: usize,
    pub character_policy: CharacterPolicy,
    /// Try the `pdf-extract` crate after the content-stream walk.
    pub use_pdf_extract: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_chunk_window", skip_on_field_errors = false))]
pub struct ChunkingConfig {
    #[validate(range(min = 1, message = "chunk_size must be positive"))]
    pub chunk_size: usize,
    pub overlap: usize,
    #[validate(range(min = 1, message = "min_chunk_length must be positive"))]
    pub min_chunk_length: usize,
    pub sentence_snap: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelevanceMode {
    #[default]
    None,
    Keyword,
    Section,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RelevanceConfig {
    pub mode: RelevanceMode,
    pub keywords: Vec<String>,
    pub allowed_sections: Vec<String>,
    /// Pages kept when no page matches `allowed_sections`.
    #[validate(range(min = 1, message = "fallback_pages must be positive"))]
    pub fallback_pages: usize,
    /// Chunks kept when no chunk matches `keywords`.
    #[validate(range(min = 1, message = "fallback_chunks must be positive"))]
    pub fallback_chunks: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputLimits {
    #[validate(range(min = 1, message = "max_text_chars must be positive"))]
    pub max_text_chars: usize,
    #[validate(range(min = 1, message = "max_chunks must be positive"))]
    pub max_chunks: usize,
}

fn validate_chunk_window(config: &ChunkingConfig) -> Result<(), ValidationError> {
    if config.chunk_size > 0 && config.overlap >= config.chunk_size {
        let mut error = ValidationError::new("overlap_not_less_than_chunk_size");
        error.message = Some("overlap must be strictly less than chunk_size".into());
        return Err(error);
    }
    Ok(())
}

/// Risk and financial terms used by keyword relevance and chunk annotation.
pub const DEFAULT_RISK_KEYWORDS: &[&str] = &[
    "risk",
    "uncertainty",
    "threat",
    "challenge",
    "exposure",
    "liquidity",
    "default",
    "volatility",
    "credit",
    "debt",
    "leverage",
    "impairment",
    "litigation",
    "regulatory",
    "covenant",
];

impl AppConfig {
    pub fn load() -> FinRiskResult<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                File::with_name(&format!(
                    "config/{}",
                    env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // Add local config (gitignored)
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("FINRISK")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("relevance.keywords")
                    .with_list_parse_key("relevance.allowed_sections")
                    .try_parsing(true),
            );

        let app_config: AppConfig = config.build()?.try_deserialize()?;
        app_config.ensure_valid()?;
        Ok(app_config)
    }

    /// Rejects invalid settings as a configuration error.
    pub fn ensure_valid(&self) -> FinRiskResult<()> {
        self.validate()
            .map_err(|errors| FinRiskError::configuration(format_validation_errors(&errors)))
    }
}

impl ChunkingConfig {
    pub fn ensure_valid(&self) -> FinRiskResult<()> {
        self.validate()
            .map_err(|errors| FinRiskError::configuration(format_validation_errors(&errors)))
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            file_path: None,
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_document_chars: 50,
            line_tolerance: 5.0,
            column_gap: 20.0,
            min_fragment_chars: 2,
            min_raw_run_chars: 5,
            character_policy: CharacterPolicy::Unicode,
            use_pdf_extract: true,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
            min_chunk_length: 50,
            sentence_snap: true,
        }
    }
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            mode: RelevanceMode::None,
            keywords: DEFAULT_RISK_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            allowed_sections: vec!["Risk Factors".to_string(), "MD&A".to_string()],
            fallback_pages: 50,
            fallback_chunks: 50,
        }
    }
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            max_text_chars: 50_000,
            max_chunks: 150,
        }
    }
}
