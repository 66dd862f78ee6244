use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

/// Configuration file picked up from the working directory when no explicit
/// path is given.
pub const DEFAULT_CONFIG_FILE: &str = "rotations.toml";

/// Prefix for environment overrides, e.g. `ROTATIONS__STORAGE__REGION`.
pub const ENV_PREFIX: &str = "ROTATIONS__";

/// Keys whose environment values are used verbatim. Figment otherwise parses
/// `2023` as an integer and `2023.10` as a float.
const VERBATIM_ENV_KEYS: [&str; 3] = ["bucket", "name_filter", "prefixes"];

/// Hard cap of keys a single bulk-delete request may carry (S3 `DeleteObjects`).
pub const MAX_KEYS_PER_BULK_DELETE: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    S3,
    File,
    Memory,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which object store implementation backs the bucket.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Custom endpoint for S3-compatible stores (MinIO, LocalStack).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Region override; falls back to `AWS_DEFAULT_REGION`/`AWS_REGION`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    /// Root directory for the `file` backend. The bucket is a directory below it.
    pub root: String,
    /// Upper bound for every listing page and bulk-delete call.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Keys per bulk-delete request.
    pub max_keys_per_request: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            endpoint: None,
            region: None,
            root: ".data".to_string(),
            request_timeout: Duration::from_secs(30),
            max_keys_per_request: MAX_KEYS_PER_BULK_DELETE,
        }
    }
}

/// What happens to the remaining prefixes once one prefix fails to list or delete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrefixErrorPolicy {
    /// Report the failed prefix and keep going; the run still fails at the end.
    #[default]
    Continue,
    /// Abandon every prefix after the failing one.
    Abort,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Configuration {
    /// Bucket holding the rotated files
    pub bucket: String,
    /// Prefixes to scan, either a list or a single comma-delimited string
    #[serde(deserialize_with = "deserialize_prefixes")]
    pub prefixes: Vec<String>,
    /// Only keys containing this substring are rotated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_filter: Option<String>,
    /// Minimum age in whole days before an object is deleted
    pub threshold_days: u32,
    /// Log candidates without deleting anything
    pub dry_run: bool,
    pub on_prefix_error: PrefixErrorPolicy,
    /// Prefixes processed at the same time (1 = strictly sequential)
    pub max_concurrent_prefixes: usize,
    pub storage: StorageConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            prefixes: Vec::new(),
            name_filter: None,
            threshold_days: 42,
            dry_run: false,
            on_prefix_error: PrefixErrorPolicy::default(),
            max_concurrent_prefixes: 1,
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),

    #[error("Bucket name must not be empty")]
    EmptyBucket,

    #[error("At least one prefix must be configured")]
    NoPrefixes,

    #[error("Prefix '{0}' is configured more than once")]
    DuplicatePrefix(String),

    #[error("max_concurrent_prefixes must be positive")]
    InvalidConcurrency,

    #[error(
        "max_keys_per_request must be between 1 and {max}, got {0}",
        max = MAX_KEYS_PER_BULK_DELETE
    )]
    InvalidBatchSize(usize),

    #[error("request_timeout must be positive")]
    InvalidTimeout,
}

impl Configuration {
    /// Layered figment: defaults, then TOML, then `ROTATIONS__*` environment.
    ///
    /// An explicit path must exist; the default file is optional.
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Configuration::default()));
        let figment = match path {
            Some(path) => figment.merge(Toml::file_exact(path)),
            None => figment.merge(Toml::file(DEFAULT_CONFIG_FILE)),
        };
        let env = Env::prefixed(ENV_PREFIX).split("__");
        let figment = figment.merge(env.clone());

        env.only(&VERBATIM_ENV_KEYS)
            .iter()
            .fold(figment, |figment, (key, value)| {
                figment.merge(Serialized::default(key.as_str(), value))
            })
    }

    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// Checks everything that can be checked without touching the store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::EmptyBucket);
        }

        if self.prefixes.is_empty() {
            return Err(ConfigError::NoPrefixes);
        }

        let mut seen = HashSet::new();
        for prefix in &self.prefixes {
            if !seen.insert(prefix.trim_end_matches('/')) {
                return Err(ConfigError::DuplicatePrefix(prefix.clone()));
            }
        }

        for (i, outer) in self.prefixes.iter().enumerate() {
            for inner in &self.prefixes[i + 1..] {
                if prefixes_overlap(outer, inner) {
                    tracing::warn!(
                        first = %outer,
                        second = %inner,
                        "Configured prefixes overlap; shared keys are evaluated twice"
                    );
                }
            }
        }

        if self.max_concurrent_prefixes == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }

        let batch = self.storage.max_keys_per_request;
        if batch == 0 || batch > MAX_KEYS_PER_BULK_DELETE {
            return Err(ConfigError::InvalidBatchSize(batch));
        }

        if self.storage.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(())
    }

    /// The name filter with blank values treated as "no filter".
    pub fn effective_name_filter(&self) -> Option<&str> {
        self.name_filter
            .as_deref()
            .filter(|filter| !filter.is_empty())
    }
}

fn prefixes_overlap(a: &str, b: &str) -> bool {
    let a = a.trim_end_matches('/');
    let b = b.trim_end_matches('/');
    let nested = |outer: &str, inner: &str| {
        inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.starts_with('/'))
    };
    nested(a, b) || nested(b, a)
}

fn deserialize_prefixes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Prefixes {
        Delimited(String),
        List(Vec<String>),
    }

    let raw = match Prefixes::deserialize(deserializer)? {
        Prefixes::Delimited(value) => value.split(',').map(str::to_owned).collect(),
        Prefixes::List(values) => values,
    };

    Ok(raw
        .into_iter()
        .map(|prefix| prefix.trim().to_string())
        .filter(|prefix| !prefix.is_empty())
        .collect())
}
