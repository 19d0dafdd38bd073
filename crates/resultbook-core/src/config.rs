use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = ".resultbook/results.db";
pub const DEFAULT_CONFIG_PATH: &str = "resultbook.yaml";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub format: OutputFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: "info".to_string(),
            format: OutputFormat::Text,
        }
    }
}

impl AppConfig {
    /// Defaults with `RESULTBOOK_*` overrides from the process environment.
    pub fn from_env() -> Self {
        Self::default().with_overrides(env_var)
    }

    /// Applies `RESULTBOOK_*` overrides looked up through `var`.
    /// Unparseable values are ignored.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = var("RESULTBOOK_DB").filter(|v| !v.trim().is_empty()) {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = var("RESULTBOOK_LOG") {
            self.log_level = v;
        }
        if let Some(f) = var("RESULTBOOK_FORMAT").and_then(|v| OutputFormat::parse(&v)) {
            self.format = f;
        }
        self
    }
}

/// Reads a YAML config file. Relative `db_path`s resolve against the
/// file's directory.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    if raw.trim().is_empty() {
        return Ok(AppConfig::default());
    }

    let mut cfg: AppConfig = serde_yaml::from_str(&raw).map_err(|e| {
        ConfigError(format!(
            "failed to parse YAML: {} (file: {})",
            e,
            path.display()
        ))
    })?;

    if cfg.db_path.is_relative() {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            cfg.db_path = dir.join(&cfg.db_path);
        }
    }
    Ok(cfg)
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// File config if `path` exists, defaults otherwise; env wins over both.
pub fn resolve_config(path: &Path) -> Result<AppConfig, ConfigError> {
    if path.exists() {
        Ok(load_config(path)?.with_overrides(env_var))
    } else {
        Ok(AppConfig::from_env())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.db_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.format, OutputFormat::Text);
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("RESULTBOOK_DB", "/tmp/x.db"),
            ("RESULTBOOK_LOG", "debug"),
            ("RESULTBOOK_FORMAT", "JSON"),
        ]
        .into_iter()
        .collect();
        let cfg = AppConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.format, OutputFormat::Json);
    }

    #[test]
    fn test_bad_format_override_is_ignored() {
        let cfg = AppConfig::default().with_overrides(|k| {
            (k == "RESULTBOOK_FORMAT").then(|| "xml".to_string())
        });
        assert_eq!(cfg.format, OutputFormat::Text);
    }

    #[test]
    fn test_load_yaml_resolves_relative_db() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resultbook.yaml");
        std::fs::write(&path, "db_path: data/results.db\nformat: json\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.db_path, dir.path().join("data/results.db"));
        assert_eq!(cfg.format, OutputFormat::Json);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resultbook.yaml");
        std::fs::write(&path, "db: results.db\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.0.contains("failed to parse YAML"), "{}", err);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = load_config(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(err.0.contains("failed to read config"));
    }

    #[test]
    fn test_resolve_without_file_uses_env_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = resolve_config(&dir.path().join(DEFAULT_CONFIG_PATH)).unwrap();
        assert_eq!(cfg, AppConfig::from_env());
    }
}
