use serde::Deserialize;
use std::path::PathBuf;

/// Options for one specification build.
///
/// Every field has a default, so a manifest may set only what it needs:
///
/// ```
/// use openapi_from_handlers::config::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_yaml::from_str("title: Pets\nstrict_source: true\n").unwrap();
/// assert_eq!(config.title, "Pets");
/// assert_eq!(config.version, "1.0.0");
/// assert!(config.strict_source);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// `info.title` of the document
    pub title: String,
    /// `info.version` of the document
    pub version: String,
    /// `info.description` of the document
    pub description: Option<String>,
    /// Directory holding the crate root module (`lib.rs` / `main.rs`)
    pub source_root: PathBuf,
    /// Fail when a handler's source declaration cannot be found
    pub strict_source: bool,
    /// Fail on malformed annotation values instead of skipping them
    pub strict_annotations: bool,
    /// Worker threads resolving handlers; defaults to the available parallelism
    pub workers: Option<usize>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            title: "Generated API".to_string(),
            version: "1.0.0".to_string(),
            description: None,
            source_root: PathBuf::from("src"),
            strict_source: false,
            strict_annotations: false,
            workers: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    pub fn with_source_root(mut self, source_root: impl Into<PathBuf>) -> Self {
        self.source_root = source_root.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Turns missing sources and malformed annotations into errors.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_source = strict;
        self.strict_annotations = strict;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Number of worker threads to use for `route_count` routes
    pub fn worker_count(&self, route_count: usize) -> usize {
        let available = std::thread::available_parallelism().map_or(1, |n| n.get());
        self.workers
            .unwrap_or(available)
            .clamp(1, route_count.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.title, "Generated API");
        assert_eq!(config.source_root, PathBuf::from("src"));
        assert!(!config.strict_source);
        assert!(!config.strict_annotations);
    }

    #[test]
    fn test_worker_count_is_bounded_by_routes() {
        let config = GeneratorConfig::default().with_workers(16);
        assert_eq!(config.worker_count(3), 3);
        assert_eq!(config.worker_count(0), 1);

        let config = GeneratorConfig::default().with_workers(0);
        assert_eq!(config.worker_count(10), 1);
    }

    #[test]
    fn test_strict_sets_both_flags() {
        let config = GeneratorConfig::new("API", "2.0.0").strict(true);
        assert!(config.strict_source);
        assert!(config.strict_annotations);
        assert_eq!(config.version, "2.0.0");
    }
}
