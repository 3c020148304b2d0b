use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const CONFIDENCE_THRESHOLD: f64 = 70.0;
pub const STAGING_DIR_NAME: &str = "_UNKNOWN_NEEDS_REVIEW";
pub const LEARNING_STATE_FILENAME: &str = ".selfsort_learning.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub organize: OrganizeConfig,
    pub scan: ScanConfig,
    pub learning: LearningConfig,
    pub labeling: LabelingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizeConfig {
    pub confidence_threshold: f64,
    pub staging_dir_name: String,
    pub conflict: ConflictPolicy,
    pub copy_then_delete: bool,
}

impl Default for OrganizeConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: CONFIDENCE_THRESHOLD,
            staging_dir_name: STAGING_DIR_NAME.to_string(),
            conflict: ConflictPolicy::default(),
            copy_then_delete: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Glob patterns matched against full paths.
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Defaults to `<root>/.selfsort_learning.json`.
    pub state_path: Option<String>,
    pub suggestion_limit: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            state_path: None,
            suggestion_limit: crate::learning::DEFAULT_SUGGESTION_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelingConfig {
    pub ranker: RankerKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Defaults to the root directory.
    pub dir: Option<String>,
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            level: "info".to_string(),
        }
    }
}

/// What to do when a file with the same name already sits at the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Rename,
    Skip,
    Overwrite,
}

impl FromStr for ConflictPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rename" => Ok(ConflictPolicy::Rename),
            "skip" => Ok(ConflictPolicy::Skip),
            "overwrite" => Ok(ConflictPolicy::Overwrite),
            other => {
                anyhow::bail!("unknown conflict policy: {other} (expected rename|skip|overwrite)")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankerKind {
    /// Plain word counting, always available.
    #[default]
    Frequency,
    Tfidf,
}

impl FromStr for RankerKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "frequency" => Ok(RankerKind::Frequency),
            "tfidf" | "tf-idf" => Ok(RankerKind::Tfidf),
            other => anyhow::bail!("unknown ranker: {other} (expected frequency|tfidf)"),
        }
    }
}

/// Defaults, then the config file (explicit or `selfsort.toml` if present), then
/// `SELFSORT__SECTION__KEY` environment variables.
pub fn load(path: Option<&str>) -> anyhow::Result<AppConfig> {
    let mut settings = config::Config::builder();
    if let Some(p) = path {
        settings = settings.add_source(config::File::with_name(p));
    } else {
        settings = settings.add_source(config::File::with_name("selfsort").required(false));
    }
    settings = settings.add_source(
        config::Environment::with_prefix("SELFSORT")
            .separator("__")
            .try_parsing(true),
    );
    let cfg = settings.build()?;
    Ok(cfg.try_deserialize()?)
}
