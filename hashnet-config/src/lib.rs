//! Loader for pipeline configuration with YAML + environment overlays.
//!
//! Sources are merged in order: the YAML file (or inline snippets), then
//! `HASHNET_`-prefixed environment variables using `__` as the section
//! separator (`HASHNET_STORAGE__DATABASE_URL`). After merging, every string is
//! run through `${VAR}` expansion so secrets can stay out of the file.
//!
//! Every section except `version` has defaults, so an empty document is a
//! valid (if not very useful) configuration.
use config::{Config, ConfigError, Environment, File};
use hashnet_common::HashnetError;
use hashnet_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HashnetConfig {
    pub version: Option<String>,
    #[serde(default)]
    pub twitter: TwitterConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwitterConfig {
    #[serde(default)]
    pub bearer_token: String,
    #[serde(default = "default_twitter_base_url")]
    pub base_url: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            bearer_token: String::new(),
            base_url: default_twitter_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

/// What to search for and which posts to keep.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    pub hashtags: Vec<String>,
    pub lang: String,
    /// Upper bound on posts fetched per hashtag query (across pages).
    pub max_results_per_query: usize,
    /// A post is kept when it reaches either threshold.
    pub min_reposts: u64,
    pub min_likes: u64,
    /// Pause between hashtag queries.
    pub pause_ms: u64,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            hashtags: Vec::new(),
            lang: "en".into(),
            max_results_per_query: 1000,
            min_reposts: 0,
            min_likes: 0,
            pause_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CooccurrenceDirection {
    /// One edge per pair, lexicographically smaller tag first.
    #[default]
    Canonical,
    /// Both directions incremented for every co-occurring pair.
    Symmetric,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Distinct nodes required across the built graphs.
    pub min_nodes: usize,
    pub top_n: usize,
    pub output_dir: PathBuf,
    pub cooccurrence: CooccurrenceDirection,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_nodes: 1000,
            top_n: 10,
            output_dir: PathBuf::from("output"),
            cooccurrence: CooccurrenceDirection::Canonical,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub emit_stderr: bool,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            emit_stderr: true,
            filter: "info".into(),
            dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
}

fn default_twitter_base_url() -> String {
    "https://api.twitter.com".into()
}
fn default_database_url() -> String {
    "sqlite://hashnet.db".into()
}

impl HashnetConfig {
    /// Credential keys that are empty or still hold an unexpanded `${VAR}`.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let token = self.twitter.bearer_token.trim();
        if token.is_empty() || token.contains("${") {
            missing.push("TWITTER_BEARER_TOKEN");
        }
        missing
    }

    /// Sanity checks that do not involve credentials.
    pub fn validate(&self) -> Result<(), HashnetError> {
        if self.analysis.top_n == 0 {
            return Err(HashnetError::Config("analysis.top_n must be > 0".into()));
        }
        if self.collection.max_results_per_query == 0 {
            return Err(HashnetError::Config(
                "collection.max_results_per_query must be > 0".into(),
            ));
        }
        if self
            .collection
            .hashtags
            .iter()
            .any(|h| h.trim().is_empty())
        {
            return Err(HashnetError::Config(
                "collection.hashtags contains an empty entry".into(),
            ));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct HashnetConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for HashnetConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl HashnetConfigLoader {
    /// Start empty; `HASHNET_` env overrides are layered on last in [`load`](Self::load).
    ///
    /// ```
    /// use hashnet_config::HashnetConfigLoader;
    ///
    /// let config = HashnetConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.analysis.min_nodes, 1000);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Like [`with_file`](Self::with_file) but a missing file is not an error,
    /// so a run can be configured purely from the environment.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use hashnet_config::{CooccurrenceDirection, HashnetConfigLoader};
    ///
    /// let cfg = HashnetConfigLoader::new()
    ///     .with_yaml_str(
    ///         r##"
    /// collection:
    ///   hashtags: ["#rust", "#wasm"]
    ///   min_likes: 5
    /// analysis:
    ///   cooccurrence: symmetric
    /// "##,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.collection.hashtags.len(), 2);
    /// assert_eq!(cfg.collection.min_likes, 5);
    /// assert_eq!(cfg.collection.lang, "en");
    /// assert_eq!(cfg.analysis.cooccurrence, CooccurrenceDirection::Symmetric);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use hashnet_config::HashnetConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOCTEST_BEARER", "injected-from-env"); }
    ///
    /// let config = HashnetConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// twitter:
    ///   bearer_token: "${DOCTEST_BEARER}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.twitter.bearer_token, "injected-from-env");
    /// assert!(config.missing_credentials().is_empty());
    ///
    /// unsafe { std::env::remove_var("DOCTEST_BEARER"); }
    /// ```
    pub fn load(self) -> Result<HashnetConfig, ConfigError> {
        // Later sources win, so the environment goes last.
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("HASHNET")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("collection.hashtags"),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: HashnetConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
