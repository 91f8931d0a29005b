//! Layered configuration loading.
//!
//! Settings are assembled from (lowest to highest precedence):
//!
//! 1. the `#[serde(default)]` values of the target type,
//! 2. an optional settings file (YAML, TOML, JSON, INI, RON or JSON5;
//!    the format is detected from the file extension),
//! 3. environment variables sharing a prefix, with `__` marking nesting.
//!
//! `${VAR}` and `$VAR` references inside a settings file are substituted
//! from the environment before parsing.

use config::{Config as Cfg, Environment, File};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

pub use config::FileFormat;

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));
static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("valid regex"));

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// `${VAR_NAME}` is replaced first, then bare `$VAR_NAME`.  References to
/// unset variables are left untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

/// Load configuration from a string with explicit format
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let substituted = substitute_env_vars(content);

    let config = Cfg::builder()
        .add_source(File::from_str(&substituted, format))
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Deserialize(e.to_string()))
}

/// Load an optional settings file, then overlay environment variables.
///
/// For `env_prefix = "APP"`, the key `server.port` is overridden by
/// `APP_SERVER__PORT`.  Environment values that look like numbers or
/// booleans are parsed as such.
pub fn load_layered<T>(path: Option<&str>, env_prefix: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let mut builder = Cfg::builder();

    if let Some(path) = path {
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&content);
        builder = builder.add_source(File::from_str(&substituted, format));
    }

    let config = builder
        .add_source(
            Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[derive(serde::Deserialize, Debug, PartialEq)]
    struct Upstream {
        base_url: String,
        timeout_ms: u64,
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("gateway.yaml").unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format("gateway.yml").unwrap(), FileFormat::Yaml);
        assert_eq!(detect_format("gateway.toml").unwrap(), FileFormat::Toml);
        assert_eq!(detect_format("gateway.json").unwrap(), FileFormat::Json);
        assert_eq!(detect_format("gateway.ini").unwrap(), FileFormat::Ini);
        assert_eq!(detect_format("gateway.ron").unwrap(), FileFormat::Ron);
        assert_eq!(detect_format("gateway.json5").unwrap(), FileFormat::Json5);
        assert!(detect_format("gateway.txt").is_err());
        assert!(detect_format("gateway").is_err());
    }

    #[test]
    fn test_from_str_toml() {
        let toml = r#"
base_url = "http://analytics:8000"
timeout_ms = 2500
"#;
        let cfg: Upstream = from_str(toml, FileFormat::Toml).unwrap();
        assert_eq!(
            cfg,
            Upstream {
                base_url: "http://analytics:8000".to_string(),
                timeout_ms: 2500,
            }
        );
    }

    #[test]
    fn test_from_str_yaml() {
        let yaml = "base_url: http://analytics:8000\ntimeout_ms: 100\n";
        let cfg: Upstream = from_str(yaml, FileFormat::Yaml).unwrap();
        assert_eq!(cfg.timeout_ms, 100);
    }

    #[test]
    fn test_substitution_leaves_unknown_vars() {
        let out = substitute_env_vars("url: ${MARKET_INTEL_TEST_SURELY_UNSET_VAR}");
        assert_eq!(out, "url: ${MARKET_INTEL_TEST_SURELY_UNSET_VAR}");
    }

    #[test]
    fn test_load_layered_reads_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "base_url": "http://10.0.0.5:8000", "timeout_ms": 900 }}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cfg: Upstream = load_layered(Some(&path), "MARKET_INTEL_KERNEL_TEST").unwrap();
        assert_eq!(cfg.base_url, "http://10.0.0.5:8000");
        assert_eq!(cfg.timeout_ms, 900);
    }

    #[test]
    fn test_load_layered_missing_file_is_io_error() {
        let result: ConfigResult<Upstream> =
            load_layered(Some("/definitely/not/here.toml"), "MARKET_INTEL_KERNEL_TEST");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
