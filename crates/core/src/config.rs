//! Configuration management for the campus task service.
//!
//! Configuration is layered, later sources overriding earlier ones:
//! - Built-in defaults
//! - Config file (`.campus/config.yaml`, or the path in `CAMPUS_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The ranking constants (BM25 `k1`/`b`, the IDF floor and the minimum match
//! ratios) are empirically chosen and kept configurable rather than derived.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Generation providers the service knows how to construct.
pub const KNOWN_PROVIDERS: [&str; 1] = ["mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .campus/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Task collection (JSON array or JSON lines)
    pub tasks_path: PathBuf,

    /// Knowledge collection (JSON array or JSON lines)
    pub knowledge_path: PathBuf,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub search: SearchConfig,
    pub retrieval: RetrievalConfig,
    pub retry: RetryConfig,
    pub timeout: TimeoutConfig,
    pub rate_limit: RateLimitConfig,
    pub generator: GeneratorConfig,
}

/// BM25 ranking and result-shaping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchConfig {
    /// Term-frequency saturation
    pub k1: f64,
    /// Document length normalization
    pub b: f64,
    /// Lower bound applied to every IDF value
    pub idf_floor: f64,
    /// Minimum match ratio when the query carries an ASCII word
    pub ascii_min_match_ratio: f64,
    /// Minimum match ratio for character-granular (CJK) queries
    pub cjk_min_match_ratio: f64,
    pub default_top_n: usize,
    pub max_top_n: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            k1: 1.5,
            b: 0.75,
            idf_floor: 0.1,
            ascii_min_match_ratio: 0.8,
            cjk_min_match_ratio: 0.3,
            default_top_n: 10,
            max_top_n: 50,
        }
    }
}

/// How knowledge snippets are scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    #[default]
    Keyword,
    Semantic,
}

impl RetrievalMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "keyword" => Some(Self::Keyword),
            "semantic" => Some(Self::Semantic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Semantic => "semantic",
        }
    }
}

/// Knowledge retrieval parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalConfig {
    /// Maximum characters accumulated into one chunk
    pub chunk_size: usize,
    /// Chunks fetched per chat request
    pub top_k: usize,
    /// Characters of chunk content kept in a citation
    pub citation_chars: usize,
    pub mode: RetrievalMode,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            top_k: 3,
            citation_chars: 100,
            mode: RetrievalMode::Keyword,
        }
    }
}

/// Retry budget for the generation gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_backoff: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            exponential_backoff: true,
        }
    }
}

impl RetryConfig {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Wall-clock budgets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimeoutConfig {
    /// Budget for one whole inbound request
    pub request_timeout_ms: u64,
    /// Budget for a single generation attempt
    pub llm_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 30_000,
            llm_timeout_ms: 25_000,
        }
    }
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_millis(self.llm_timeout_ms)
    }
}

/// Per-client sliding-window quotas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub chat_calls: usize,
    pub chat_period_secs: u64,
    pub search_calls: usize,
    pub search_period_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chat_calls: 20,
            chat_period_secs: 60,
            search_calls: 50,
            search_period_secs: 60,
        }
    }
}

/// Answer generation backend settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GeneratorConfig {
    pub provider: String,
    /// Sleep a seeded random delay before answering
    pub simulate_delay: bool,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Delay used when the prompt asks for a slow response
    pub slow_delay_ms: u64,
    /// Probability that a call fails (half timeouts, half errors)
    pub failure_rate: f64,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            simulate_delay: false,
            min_delay_ms: 500,
            max_delay_ms: 2_000,
            slow_delay_ms: 7_500,
            failure_rate: 0.0,
            seed: 42,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    data: Option<DataConfig>,
    logging: Option<LoggingConfig>,
    search: Option<SearchConfig>,
    retrieval: Option<RetrievalConfig>,
    retry: Option<RetryConfig>,
    timeout: Option<TimeoutConfig>,
    rate_limit: Option<RateLimitConfig>,
    generator: Option<GeneratorConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DataConfig {
    tasks: Option<String>,
    knowledge: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            tasks_path: PathBuf::from("data/tasks.json"),
            knowledge_path: PathBuf::from("data/task_kb.jsonl"),
            log_level: None,
            verbose: false,
            no_color: false,
            search: SearchConfig::default(),
            retrieval: RetrievalConfig::default(),
            retry: RetryConfig::default(),
            timeout: TimeoutConfig::default(),
            rate_limit: RateLimitConfig::default(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the process environment.
    ///
    /// Environment variables:
    /// - `CAMPUS_WORKSPACE`: Override workspace path
    /// - `CAMPUS_CONFIG`: Path to config file
    /// - `CAMPUS_TASKS`, `CAMPUS_KNOWLEDGE`: Data collection paths
    /// - `MAX_RETRIES`, `BASE_DELAY`, `MAX_DELAY`, `EXPONENTIAL_BACKOFF`
    /// - `REQUEST_TIMEOUT`, `LLM_TIMEOUT` (seconds)
    /// - `RETRIEVAL_MODE`: `keyword` or `semantic`
    /// - `RATE_LIMIT_ENABLED`, `CHAT_RATE_LIMIT_CALLS`, `CHAT_RATE_LIMIT_PERIOD`,
    ///   `SEARCH_RATE_LIMIT_CALLS`, `SEARCH_RATE_LIMIT_PERIOD`
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use campus_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using `lookup` in place of the process environment.
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = lookup("CAMPUS_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = lookup("CAMPUS_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.workspace.join(".campus/config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        config.apply_env(&lookup)?;

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(data) = config_file.data {
            if let Some(tasks) = data.tasks {
                result.tasks_path = PathBuf::from(tasks);
            }
            if let Some(knowledge) = data.knowledge {
                result.knowledge_path = PathBuf::from(knowledge);
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(search) = config_file.search {
            result.search = search;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(retry) = config_file.retry {
            result.retry = retry;
        }
        if let Some(timeout) = config_file.timeout {
            result.timeout = timeout;
        }
        if let Some(rate_limit) = config_file.rate_limit {
            result.rate_limit = rate_limit;
        }
        if let Some(generator) = config_file.generator {
            result.generator = generator;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply environment overrides. Durations in the environment are seconds.
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) -> AppResult<()> {
        if let Some(tasks) = lookup("CAMPUS_TASKS") {
            self.tasks_path = PathBuf::from(tasks);
        }
        if let Some(knowledge) = lookup("CAMPUS_KNOWLEDGE") {
            self.knowledge_path = PathBuf::from(knowledge);
        }

        if let Some(v) = parse_env::<u32>(lookup, "MAX_RETRIES")? {
            self.retry.max_retries = v;
        }
        if let Some(v) = parse_env::<f64>(lookup, "BASE_DELAY")? {
            self.retry.base_delay_ms = secs_to_ms(v);
        }
        if let Some(v) = parse_env::<f64>(lookup, "MAX_DELAY")? {
            self.retry.max_delay_ms = secs_to_ms(v);
        }
        if let Some(v) = lookup("EXPONENTIAL_BACKOFF") {
            self.retry.exponential_backoff = v.eq_ignore_ascii_case("true");
        }

        if let Some(v) = parse_env::<f64>(lookup, "REQUEST_TIMEOUT")? {
            self.timeout.request_timeout_ms = secs_to_ms(v);
        }
        if let Some(v) = parse_env::<f64>(lookup, "LLM_TIMEOUT")? {
            self.timeout.llm_timeout_ms = secs_to_ms(v);
        }

        if let Some(v) = lookup("RETRIEVAL_MODE") {
            self.retrieval.mode = RetrievalMode::parse(&v).ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid RETRIEVAL_MODE: {}. Expected keyword or semantic",
                    v
                ))
            })?;
        }

        if let Some(v) = lookup("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = v.eq_ignore_ascii_case("true");
        }
        if let Some(v) = parse_env::<usize>(lookup, "CHAT_RATE_LIMIT_CALLS")? {
            self.rate_limit.chat_calls = v;
        }
        if let Some(v) = parse_env::<u64>(lookup, "CHAT_RATE_LIMIT_PERIOD")? {
            self.rate_limit.chat_period_secs = v;
        }
        if let Some(v) = parse_env::<usize>(lookup, "SEARCH_RATE_LIMIT_CALLS")? {
            self.rate_limit.search_calls = v;
        }
        if let Some(v) = parse_env::<u64>(lookup, "SEARCH_RATE_LIMIT_PERIOD")? {
            self.rate_limit.search_period_secs = v;
        }

        if let Some(level) = lookup("RUST_LOG") {
            self.log_level = Some(level);
        }
        if lookup("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        tasks_path: Option<PathBuf>,
        knowledge_path: Option<PathBuf>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(tasks_path) = tasks_path {
            self.tasks_path = tasks_path;
        }

        if let Some(knowledge_path) = knowledge_path {
            self.knowledge_path = knowledge_path;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a possibly relative data path against the workspace.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        let provider = self.generator.provider.as_str();
        if !KNOWN_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        let search = &self.search;
        if search.k1 < 0.0 {
            return Err(AppError::Config(format!("k1 must be >= 0, got {}", search.k1)));
        }
        if !(0.0..=1.0).contains(&search.b) {
            return Err(AppError::Config(format!("b must be within [0, 1], got {}", search.b)));
        }
        for (name, ratio) in [
            ("asciiMinMatchRatio", search.ascii_min_match_ratio),
            ("cjkMinMatchRatio", search.cjk_min_match_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(AppError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, ratio
                )));
            }
        }
        if search.default_top_n == 0 || search.default_top_n > search.max_top_n {
            return Err(AppError::Config(format!(
                "defaultTopN must be within [1, {}], got {}",
                search.max_top_n, search.default_top_n
            )));
        }

        if self.retrieval.chunk_size == 0 {
            return Err(AppError::Config("chunkSize must be positive".to_string()));
        }

        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(AppError::Config(format!(
                "maxDelayMs ({}) must not be below baseDelayMs ({})",
                self.retry.max_delay_ms, self.retry.base_delay_ms
            )));
        }

        if !(0.0..=1.0).contains(&self.generator.failure_rate) {
            return Err(AppError::Config(format!(
                "failureRate must be within [0, 1], got {}",
                self.generator.failure_rate
            )));
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> AppResult<Option<T>> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Config(format!("Invalid value for {}: {:?}", key, raw))),
        None => Ok(None),
    }
}

fn secs_to_ms(secs: f64) -> u64 {
    (secs.max(0.0) * 1000.0).round() as u64
}
