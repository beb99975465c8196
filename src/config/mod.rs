mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./reelmatch.toml",
        "~/.config/reelmatch/config.toml",
        "/etc/reelmatch/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let tmdb = &config.tmdb;
    if !(tmdb.rate_limit.is_finite() && tmdb.rate_limit > 0.0) {
        anyhow::bail!("tmdb.rate_limit must be a positive number");
    }
    if tmdb.burst == 0 {
        anyhow::bail!("tmdb.burst must be at least 1");
    }
    if tmdb.base_url.trim().is_empty() {
        anyhow::bail!("tmdb.base_url cannot be empty");
    }
    if tmdb.timeout_secs == 0 || config.stashdb.timeout_secs == 0 {
        anyhow::bail!("Request timeouts cannot be 0");
    }
    if config.stashdb.endpoint.trim().is_empty() {
        anyhow::bail!("stashdb.endpoint cannot be empty");
    }
    if config.enrichment.queue_capacity == 0 {
        anyhow::bail!("enrichment.queue_capacity must be at least 1");
    }

    if tmdb.api_key.is_empty() {
        tracing::warn!("No TMDB API key configured; movie libraries cannot be matched");
    }
    if config.stashdb.api_key.is_empty() {
        tracing::warn!("No StashDB API key configured; scene libraries cannot be matched");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.tmdb.rate_limit, 4.0);
        assert_eq!(config.tmdb.burst, 10);
        assert_eq!(config.tmdb.cache_ttl_secs, 86_400);
        assert_eq!(config.tmdb.search_cache_ttl_secs, 900);
        assert_eq!(config.stashdb.endpoint, "https://stashdb.org/graphql");
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [tmdb]
            api_key = "abc"
            rate_limit = 2.5

            [enrichment]
            queue_new_records = true
            "#,
        )
        .unwrap();

        assert_eq!(config.tmdb.api_key, "abc");
        assert_eq!(config.tmdb.rate_limit, 2.5);
        assert_eq!(config.tmdb.burst, 10);
        assert_eq!(config.tmdb.language, "en-US");
        assert!(config.enrichment.queue_new_records);
        assert_eq!(config.enrichment.queue_capacity, 100);
        assert_eq!(config.database.path, std::path::PathBuf::from("reelmatch.db"));
    }

    #[test]
    fn rejects_zero_rate() {
        let mut config = Config::default();
        config.tmdb.rate_limit = 0.0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.tmdb.burst = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[stashdb]\napi_key = \"secret\"\nendpoint = \"http://localhost:9999/graphql\"\n",
        )
        .unwrap();

        let config = load_config_or_default(Some(&path)).unwrap();
        assert_eq!(config.stashdb.api_key, "secret");
        assert_eq!(config.stashdb.endpoint, "http://localhost:9999/graphql");
    }

    #[test]
    fn load_invalid_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tmdb]\nburst = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }
}
