//! Locating and layering `tally.toml` files.
//!
//! Layers, lowest precedence first:
//! 1. the user file, `config.toml` in [`config_dir`]
//! 2. `tally.toml` in the project directory (the working directory by default)
//! 3. `TALLY_REDIS_URL`, which only replaces `store.url`
//!
//! Command-line flags are applied by the binary on top of the result.

use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, TallyConfig};

const PROJECT_CONFIG_FILE: &str = "tally.toml";
const USER_CONFIG_FILE: &str = "config.toml";
const APP_NAME: &str = "tally";

/// Points the user layer at another directory.
const CONFIG_DIR_ENV: &str = "TALLY_CONFIG_DIR";

/// Replaces `store.url` after the file layers.
const REDIS_URL_ENV: &str = "TALLY_REDIS_URL";

/// One file layer that discovery looked at.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// False when the file is absent or failed to parse.
    pub loaded: bool,
}

/// Merged configuration plus an account of how it was assembled.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: TallyConfig,
    /// File layers in merge order.
    pub sources: Vec<ConfigSource>,
    /// Names of the environment variables that were applied.
    pub env_overrides: Vec<String>,
    /// One entry per file layer that existed but could not be used.
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Files that contributed to the merged config.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter_map(|s| s.loaded.then_some(s.path.as_path()))
            .collect()
    }
}

/// Discover and merge every layer using the default user directory.
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Discover and merge every layer.
///
/// `user_dir` takes precedence over `TALLY_CONFIG_DIR` and the platform
/// directory. A layer that fails to parse is skipped with a warning; the
/// merged result must still pass [`TallyConfig::validate`].
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    user_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let user_file = user_dir
        .map(|dir| dir.join(USER_CONFIG_FILE))
        .or_else(config_path);
    let project_file = project_dir.map_or_else(
        || PathBuf::from(PROJECT_CONFIG_FILE),
        |dir| dir.join(PROJECT_CONFIG_FILE),
    );

    let mut loaded = LoadedConfig {
        config: TallyConfig::new(),
        sources: Vec::with_capacity(2),
        env_overrides: Vec::new(),
        warnings: Vec::new(),
    };
    for path in user_file.into_iter().chain(std::iter::once(project_file)) {
        let source = merge_layer(&mut loaded, path);
        loaded.sources.push(source);
    }

    if let Some(url) = non_empty_env(REDIS_URL_ENV) {
        loaded.config.override_store_url(url);
        loaded.env_overrides.push(REDIS_URL_ENV.to_string());
    }

    loaded.config.validate()?;
    Ok(loaded)
}

/// Parse one config file without discovery or validation.
pub fn load_config_file(path: &Path) -> Result<TallyConfig> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.display().to_string(),
        source,
    })?;
    TallyConfig::from_toml(&text)
}

/// Write `config` as TOML, creating missing parent directories.
pub fn save_config(config: &TallyConfig, path: &Path) -> Result<()> {
    let write_error = |at: &Path, source| ConfigError::WriteFile {
        path: at.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| write_error(parent, e))?;
    }
    std::fs::write(path, config.to_toml()?).map_err(|e| write_error(path, e))
}

/// The user layer's file.
pub fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join(USER_CONFIG_FILE))
}

/// `TALLY_CONFIG_DIR` when set, else `tally` under the platform config
/// directory (`~/.config/tally` on Linux).
pub fn config_dir() -> Option<PathBuf> {
    non_empty_env(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|| Some(dirs::config_dir()?.join(APP_NAME)))
}

/// Where the binary writes its rolling log files.
pub fn log_dir() -> Option<PathBuf> {
    Some(config_dir()?.join("logs"))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn merge_layer(loaded: &mut LoadedConfig, path: PathBuf) -> ConfigSource {
    if !path.is_file() {
        return ConfigSource {
            path,
            loaded: false,
        };
    }
    match load_config_file(&path) {
        Ok(layer) => {
            loaded.config.merge(layer);
            ConfigSource { path, loaded: true }
        }
        Err(e) => {
            loaded
                .warnings
                .push(format!("Skipped {}: {e}", path.display()));
            ConfigSource {
                path,
                loaded: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    use crate::StoreBackend;

    fn clear_env() {
        unsafe { std::env::remove_var(REDIS_URL_ENV) };
    }

    #[test]
    #[serial]
    fn test_config_dir_env_override() {
        let dir = TempDir::new().unwrap();
        unsafe { std::env::set_var(CONFIG_DIR_ENV, dir.path()) };
        assert_eq!(config_dir().unwrap(), dir.path());
        assert_eq!(config_path().unwrap(), dir.path().join("config.toml"));
        assert_eq!(log_dir().unwrap(), dir.path().join("logs"));
        unsafe { std::env::remove_var(CONFIG_DIR_ENV) };

        if let Some(p) = config_path() {
            assert!(p.ends_with("tally/config.toml"));
        }
    }

    #[test]
    fn test_load_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(&path, "[store]\nbackend = \"memory\"\n").unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.store().backend, StoreBackend::Memory);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config_file(Path::new("/nonexistent/tally/tally.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tally.toml");
        fs::write(&path, "[cache\nttl_secs = ").unwrap();

        let err = load_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    #[serial]
    fn test_defaults_without_files() {
        clear_env();
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.config, TallyConfig::new());
        assert!(loaded.loaded_from().is_empty());
        assert!(loaded.env_overrides.is_empty());
    }

    #[test]
    #[serial]
    fn test_project_layer_overrides_user_layer() {
        clear_env();
        let user = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();

        fs::write(
            user.path().join("config.toml"),
            r#"
[cache]
ttl_secs = 120

[store]
url = "redis://user:6379"
"#,
        )
        .unwrap();
        fs::write(
            project.path().join("tally.toml"),
            r#"
[store]
url = "redis://project:6379"
"#,
        )
        .unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();

        assert_eq!(loaded.config.store().url, "redis://project:6379");
        assert_eq!(loaded.config.cache().ttl_secs, 120);
        assert_eq!(loaded.loaded_from().len(), 2);
    }

    #[test]
    #[serial]
    fn test_redis_url_env_override() {
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(
            project.path().join("tally.toml"),
            "[store]\nurl = \"redis://file:6379\"\noperation_timeout_ms = 250\n",
        )
        .unwrap();

        unsafe { std::env::set_var(REDIS_URL_ENV, "redis://env:6379") };
        let loaded = load_config_with_options(Some(project.path()), Some(user.path()));
        clear_env();

        let loaded = loaded.unwrap();
        assert_eq!(loaded.config.store().url, "redis://env:6379");
        assert_eq!(loaded.config.store().operation_timeout_ms, 250);
        assert_eq!(loaded.env_overrides, vec![REDIS_URL_ENV.to_string()]);
    }

    #[test]
    #[serial]
    fn test_unparsable_layer_is_skipped_with_warning() {
        clear_env();
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("tally.toml"), "not valid toml {{{{").unwrap();

        let loaded = load_config_with_options(Some(project.path()), Some(user.path())).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].starts_with("Skipped"));
    }

    #[test]
    #[serial]
    fn test_invalid_merged_config_is_error() {
        clear_env();
        let project = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        fs::write(project.path().join("tally.toml"), "[cache]\nttl_secs = 0\n").unwrap();

        let err = load_config_with_options(Some(project.path()), Some(user.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = TallyConfig::from_toml("[cache]\npreview_rows = 10\n").unwrap();

        save_config(&config, &path).unwrap();
        assert_eq!(load_config_file(&path).unwrap(), config);
    }
}
