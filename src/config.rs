use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    /// Base URL of the bookmark/news API, without a trailing slash.
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SyncConfig {
    /// Remove the signing-out user's cached snapshot on sign-out.
    /// Off by default so the snapshot is still there for a fast redisplay
    /// when the same user signs back in; turn on for shared devices.
    #[serde(default)]
    pub purge_cache_on_signout: bool,
}

impl Config {
    /// Minimal configuration for tests and tooling that never touches the
    /// network or a real database path.
    #[allow(dead_code)]
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from(".ncl/state.db"),
            },
            remote: RemoteConfig {
                base_url: "http://127.0.0.1:1/api".to_string(),
                timeout_secs: default_timeout_secs(),
            },
            sync: SyncConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.remote.base_url.is_empty() {
        anyhow::bail!("remote.base_url must be set");
    }

    if !config.remote.base_url.starts_with("http") {
        anyhow::bail!(
            "remote.base_url must be an http(s) URL, got '{}'",
            config.remote.base_url
        );
    }

    if config.remote.timeout_secs == 0 {
        anyhow::bail!("remote.timeout_secs must be > 0");
    }

    // Normalize so request paths can always be joined with a '/'.
    while config.remote.base_url.ends_with('/') {
        config.remote.base_url.pop();
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_full_config() {
        let file = write_config(
            r#"
            [db]
            path = "/tmp/ncl/state.db"

            [remote]
            base_url = "https://api.example.com/api/"
            timeout_secs = 5

            [sync]
            purge_cache_on_signout = true
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.remote.base_url, "https://api.example.com/api");
        assert_eq!(config.remote.timeout_secs, 5);
        assert!(config.sync.purge_cache_on_signout);
    }

    #[test]
    fn sync_section_is_optional() {
        let file = write_config(
            r#"
            [db]
            path = "/tmp/ncl/state.db"

            [remote]
            base_url = "https://api.example.com"
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert!(!config.sync.purge_cache_on_signout);
        assert_eq!(config.remote.timeout_secs, 10);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let file = write_config(
            r#"
            [db]
            path = "/tmp/ncl/state.db"

            [remote]
            base_url = "ftp://api.example.com"
            "#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let file = write_config(
            r#"
            [db]
            path = "/tmp/ncl/state.db"

            [remote]
            base_url = "https://api.example.com"
            timeout_secs = 0
            "#,
        );
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_config(Path::new("/nonexistent/ncl.toml")).is_err());
    }
}
