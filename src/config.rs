//! Configuration module for the bean analysis tool.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file (`.beanscope/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `BS_` and use double underscores
//! to separate nested levels:
//! - `BS_ANALYSIS__SELF_REFERENCE_WINDOW=3` sets `analysis.self_reference_window`
//! - `BS_SEARCH__CONFIG_FILE_LIMIT=25` sets `search.config_file_limit`
//! - `BS_SCHEDULER__DEBOUNCE_MS=250` sets `scheduler.debounce_ms`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".beanscope";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "BS_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Workspace root directory (where .beanscope is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    /// Annotation dialect and heuristic thresholds
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Workspace search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Re-scan scheduling
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Logging levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AnalysisConfig {
    /// Class-level markers that make the class itself a bean
    #[serde(default = "default_stereotype_annotations")]
    pub stereotype_annotations: Vec<String>,

    /// Method-level markers whose return value is a bean
    #[serde(default = "default_factory_annotations")]
    pub factory_annotations: Vec<String>,

    /// Markers flagging the default candidate among several beans
    #[serde(default = "default_primary_annotations")]
    pub primary_annotations: Vec<String>,

    /// Markers for field and constructor injection
    #[serde(default = "default_injection_annotations")]
    pub injection_annotations: Vec<String>,

    /// Markers accepted as injection evidence when filtering usages
    #[serde(default = "default_usage_injection_annotations")]
    pub usage_injection_annotations: Vec<String>,

    /// Class-level markers requesting a generated constructor
    #[serde(default = "default_convention_constructor_annotations")]
    pub convention_constructor_annotations: Vec<String>,

    /// References this many lines or closer to a type's own declaration are ignored
    #[serde(default = "default_self_reference_window")]
    pub self_reference_window: u32,

    /// Lines above a reference inspected for annotations
    #[serde(default = "default_usage_context_lines")]
    pub usage_context_lines: u32,

    /// Lines at the top of a file searched for convention constructor markers
    #[serde(default = "default_header_lines")]
    pub header_lines: u32,

    /// Upper bound on references opened while searching for a factory method
    #[serde(default = "default_max_reference_candidates")]
    pub max_reference_candidates: usize,

    /// Lines above a reference inspected for a factory marker
    #[serde(default = "default_factory_lookback_lines")]
    pub factory_lookback_lines: u32,

    /// Path fragments that rank a file as configuration-like
    #[serde(default = "default_config_name_tokens")]
    pub config_name_tokens: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Glob for convention-named configuration files
    #[serde(default = "default_config_file_glob")]
    pub config_file_glob: String,

    /// Glob excluded from the configuration file search
    #[serde(default = "default_exclude_glob")]
    pub exclude_glob: String,

    /// Maximum number of configuration files scanned
    #[serde(default = "default_config_file_limit")]
    pub config_file_limit: usize,

    /// Extensions of source files searched for references
    #[serde(default = "default_source_extensions")]
    pub source_extensions: Vec<String>,

    /// Patterns to ignore while walking the workspace
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulerConfig {
    /// Quiet period before a re-scan fires after the last edit
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `scanner = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_stereotype_annotations() -> Vec<String> {
    names(&[
        "Component",
        "Service",
        "Repository",
        "Controller",
        "RestController",
        "Configuration",
    ])
}
fn default_factory_annotations() -> Vec<String> {
    names(&["Bean"])
}
fn default_primary_annotations() -> Vec<String> {
    names(&["Primary"])
}
fn default_injection_annotations() -> Vec<String> {
    names(&["Autowired", "Inject", "Resource"])
}
fn default_usage_injection_annotations() -> Vec<String> {
    names(&["Autowired", "Inject", "Resource", "Value"])
}
fn default_convention_constructor_annotations() -> Vec<String> {
    names(&["RequiredArgsConstructor", "AllArgsConstructor"])
}
fn default_self_reference_window() -> u32 {
    2
}
fn default_usage_context_lines() -> u32 {
    2
}
fn default_header_lines() -> u32 {
    30
}
fn default_max_reference_candidates() -> usize {
    50
}
fn default_factory_lookback_lines() -> u32 {
    5
}
fn default_config_name_tokens() -> Vec<String> {
    names(&["Config", "App"])
}
fn default_config_file_glob() -> String {
    "**/*{Config,Configuration,Application}.java".to_string()
}
fn default_exclude_glob() -> String {
    "**/node_modules/**".to_string()
}
fn default_config_file_limit() -> usize {
    10
}
fn default_source_extensions() -> Vec<String> {
    names(&["java"])
}
fn default_ignore_patterns() -> Vec<String> {
    names(&["target/**", "build/**", "node_modules/**", ".git/**"])
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            analysis: AnalysisConfig::default(),
            search: SearchConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stereotype_annotations: default_stereotype_annotations(),
            factory_annotations: default_factory_annotations(),
            primary_annotations: default_primary_annotations(),
            injection_annotations: default_injection_annotations(),
            usage_injection_annotations: default_usage_injection_annotations(),
            convention_constructor_annotations: default_convention_constructor_annotations(),
            self_reference_window: default_self_reference_window(),
            usage_context_lines: default_usage_context_lines(),
            header_lines: default_header_lines(),
            max_reference_candidates: default_max_reference_candidates(),
            factory_lookback_lines: default_factory_lookback_lines(),
            config_name_tokens: default_config_name_tokens(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            config_file_glob: default_config_file_glob(),
            exclude_glob: default_exclude_glob(),
            config_file_limit: default_config_file_limit(),
            source_extensions: default_source_extensions(),
            ignore_patterns: default_ignore_patterns(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        // Try to find the workspace root by looking for .beanscope directory
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels, single underscore stays
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the workspace config by looking for .beanscope directory
    /// Searches from current directory up to root
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Get the workspace root directory (where .beanscope is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Root used for workspace searches: configured root, else the current directory.
    pub fn effective_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        let mut settings = Settings::default();
        if let Ok(current_dir) = std::env::current_dir() {
            settings.workspace_root = Some(current_dir);
        }

        settings.save(&config_path)?;
        Ok(config_path)
    }
}
