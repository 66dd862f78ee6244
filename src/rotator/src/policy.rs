use common::config::{Configuration, PrefixErrorPolicy};

/// Immutable rules for one run, built once from validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub bucket: String,
    /// Scanned in this order; always at least one.
    pub prefixes: Vec<String>,
    /// Case-sensitive substring a key must contain. `None` matches every key.
    pub name_filter: Option<String>,
    pub threshold_days: u32,
    pub dry_run: bool,
    pub on_prefix_error: PrefixErrorPolicy,
    pub max_concurrent_prefixes: usize,
    /// Keys per bulk-delete request.
    pub batch_size: usize,
}

impl From<&Configuration> for RetentionPolicy {
    fn from(config: &Configuration) -> Self {
        Self {
            bucket: config.bucket.clone(),
            prefixes: config.prefixes.clone(),
            name_filter: config.effective_name_filter().map(str::to_owned),
            threshold_days: config.threshold_days,
            dry_run: config.dry_run,
            on_prefix_error: config.on_prefix_error,
            max_concurrent_prefixes: config.max_concurrent_prefixes.max(1),
            batch_size: config.storage.max_keys_per_request.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_from_configuration() {
        let config = Configuration {
            bucket: "tariff-files".to_string(),
            prefixes: vec!["uk/reporting/".to_string()],
            name_filter: Some(String::new()),
            dry_run: true,
            ..Default::default()
        };

        let policy = RetentionPolicy::from(&config);
        assert_eq!(policy.bucket, "tariff-files");
        assert_eq!(policy.prefixes, vec!["uk/reporting/"]);
        assert_eq!(policy.name_filter, None);
        assert_eq!(policy.threshold_days, 42);
        assert!(policy.dry_run);
        assert_eq!(policy.batch_size, 1000);
    }
}
