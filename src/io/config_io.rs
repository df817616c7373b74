use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::ClientConfig;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "TASKBOARD_CONFIG";
/// Environment variable holding the API base URL
pub const BASE_URL_ENV: &str = "TASKBOARD_API_BASE_URL";

/// Error type for configuration loading and editing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    EditError(#[from] toml_edit::TomlError),
    #[error("no config directory available; pass --config")]
    NoConfigDir,
    #[error("no API base URL: pass --api-url, set TASKBOARD_API_BASE_URL, or run `tb config set-url`")]
    MissingBaseUrl,
}

/// Everything the binaries need to start talking to the API
#[derive(Debug, Clone)]
pub struct Settings {
    pub config: ClientConfig,
    pub config_path: Option<PathBuf>,
    pub base_url: String,
}

/// Config path: `--config`, then `$TASKBOARD_CONFIG`, then
/// `<config dir>/taskboard/config.toml`.
pub fn config_path(flag: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(CONFIG_ENV)
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("taskboard").join("config.toml"))
}

/// Read the config file. A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<ClientConfig, ConfigError> {
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(toml::from_str(&text)?)
}

/// Pick the base URL: flag, then environment, then config file.
pub fn resolve_base_url(
    flag: Option<&str>,
    env: Option<&str>,
    config: &ClientConfig,
) -> Result<String, ConfigError> {
    [flag, env, config.api.base_url.as_deref()]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::MissingBaseUrl)
}

/// Load config and resolve the base URL for a run.
pub fn load_settings(
    config_flag: Option<&Path>,
    api_url_flag: Option<&str>,
) -> Result<Settings, ConfigError> {
    let config_path = config_path(config_flag);
    let config = match &config_path {
        Some(path) => read_config(path)?,
        None => ClientConfig::default(),
    };
    let env = std::env::var(BASE_URL_ENV).ok();
    let base_url = resolve_base_url(api_url_flag, env.as_deref(), &config)?;
    Ok(Settings {
        config,
        config_path,
        base_url,
    })
}

/// Set `[api] base_url` in the config file, preserving the rest of the
/// file's formatting. Creates the file (and its directory) if needed.
pub fn set_base_url(path: &Path, url: &str) -> Result<(), ConfigError> {
    let text = if path.exists() {
        fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?
    } else {
        String::new()
    };
    let mut doc: toml_edit::DocumentMut = text.parse()?;
    if !doc.contains_key("api") {
        doc["api"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["api"]["base_url"] = toml_edit::value(url);

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, doc.to_string()).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r##"# taskboard settings
[api]
base_url = "http://localhost:3333"
timeout_secs = 3

[ui.colors]
background = "#000000"
"##
    }

    #[test]
    fn test_read_config() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, sample_config()).unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("http://localhost:3333"));
        assert_eq!(config.api.timeout_secs, 3);
        assert_eq!(config.ui.colors.get("background").map(String::as_str), Some("#000000"));
        assert_eq!(config.log.file, None);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = read_config(&tmp.path().join("nope.toml")).unwrap();
        assert_eq!(config.api.base_url, None);
        assert_eq!(config.api.timeout_secs, 10);
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[api\nbase_url = 1").unwrap();
        assert!(matches!(read_config(&path), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_resolve_base_url_precedence() {
        let mut config = ClientConfig::default();
        config.api.base_url = Some("http://from-file".into());

        assert_eq!(
            resolve_base_url(Some("http://flag"), Some("http://env"), &config).unwrap(),
            "http://flag"
        );
        assert_eq!(
            resolve_base_url(None, Some("http://env"), &config).unwrap(),
            "http://env"
        );
        assert_eq!(
            resolve_base_url(None, Some("  "), &config).unwrap(),
            "http://from-file"
        );
        config.api.base_url = None;
        assert!(matches!(
            resolve_base_url(None, None, &config),
            Err(ConfigError::MissingBaseUrl)
        ));
    }

    #[test]
    fn test_set_base_url_preserves_formatting() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, sample_config()).unwrap();

        set_base_url(&path, "https://tasks.example.com").unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# taskboard settings\n"));
        assert!(written.contains("base_url = \"https://tasks.example.com\""));
        assert!(written.contains("timeout_secs = 3"));
        assert!(written.contains("background = \"#000000\""));
    }

    #[test]
    fn test_set_base_url_creates_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        set_base_url(&path, "http://localhost:8080").unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.api.base_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_config_path_flag_wins() {
        let path = config_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, Some(PathBuf::from("/tmp/custom.toml")));
    }
}
