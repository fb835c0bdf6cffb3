//! Static configuration loading for the daemon

use quietcool_core::{default_config_path, QuietCoolError, Result, StaticConfig};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "QUIETCOOL_CONFIG";

/// Pick the configuration path: CLI flag > env var > default
pub fn resolve_config_path(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(|| {
        std::env::var(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path())
    })
}

/// Load the static config from TOML, creating it with defaults if missing.
pub async fn load_static_config(path: &Path) -> Result<StaticConfig> {
    if !path.exists() {
        info!(
            "Static config not found at {}. Creating with defaults.",
            path.display()
        );

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                QuietCoolError::Config(format!(
                    "Failed to create config directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let config = StaticConfig::default();
        let toml_str = config
            .to_toml()
            .map_err(|e| QuietCoolError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, &toml_str)
            .await
            .map_err(|e| QuietCoolError::Config(format!("Failed to write config file: {}", e)))?;

        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|e| QuietCoolError::Config(format!("Failed to read config file: {}", e)))?;

    let config = StaticConfig::from_toml(&content)
        .map_err(|e| QuietCoolError::Config(format!("Failed to parse config file: {}", e)))?;

    debug!("  Server: {}:{}", config.server.hostname, config.server.port);
    debug!(
        "  Controller: {} (timeout {}s)",
        config.controller.endpoint, config.controller.communication_timeout
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_config_is_created_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = load_static_config(&path).await.unwrap();

        assert_eq!(config.server.port, 3080);
        assert_eq!(config.controller.manufacturer, "QuietCool");
        assert!(path.exists());

        // Second load reads the file just written
        let reloaded = load_static_config(&path).await.unwrap();
        assert_eq!(reloaded.controller.endpoint, config.controller.endpoint);
    }

    #[tokio::test]
    async fn test_existing_config_is_parsed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
hostname = "0.0.0.0"
port = 9000

[controller]
endpoint = "10.0.0.7:8080"
"#,
        )
        .unwrap();

        let config = load_static_config(&path).await.unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.controller.endpoint().unwrap().port(), Some(8080));
        assert_eq!(config.controller.communication_timeout, 5);
    }

    #[tokio::test]
    async fn test_unparsable_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        assert!(matches!(
            load_static_config(&path).await,
            Err(QuietCoolError::Config(_))
        ));
    }

    #[test]
    fn test_flag_takes_precedence() {
        let path = resolve_config_path(Some(PathBuf::from("/tmp/bridge.toml")));
        assert_eq!(path, PathBuf::from("/tmp/bridge.toml"));
    }
}
