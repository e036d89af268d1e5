// In: src/config.rs

//! The single source of truth for codec configuration.
//!
//! `CodecConfig` is created once at the application boundary (typically from a
//! JSON file) and turned into a `Codec` with `Codec::from_config`. Every field
//! has a serde default, so an empty object `{}` is a valid configuration.

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::CodecError;
use crate::observability;
use crate::transport::http::DEFAULT_RESULT_FORMAT;
use crate::transport::{HttpTransport, NativeTransport, Transport, TransportKind};

//==================================================================================
// I. Sections
//==================================================================================

/// Settings that only apply to the HTTP transport.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// The output format appended to row-returning statements. Results are
    /// parsed assuming a TabSeparated family format.
    #[serde(default = "default_result_format")]
    pub result_format: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            result_format: default_result_format(),
        }
    }
}

/// Optional logger setup, applied by [`CodecConfig::init_logging`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append log lines to this file instead of stderr.
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: None,
        }
    }
}

//==================================================================================
// II. The Unified CodecConfig
//==================================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CodecConfig {
    /// Which wire encoding processors are derived for.
    #[serde(default)]
    pub transport: TransportKind,

    #[serde(default)]
    pub http: HttpConfig,

    /// If true, derived processors are cached per descriptor and direction.
    #[serde(default = "default_true")]
    pub memoize_processors: bool,

    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            http: HttpConfig::default(),
            memoize_processors: true,
            logging: None,
        }
    }
}

impl CodecConfig {
    pub fn from_json_str(json: &str) -> Result<Self, CodecError> {
        let config: CodecConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CodecError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), CodecError> {
        let format = self.http.result_format.trim();
        if format.is_empty() || format.contains(char::is_whitespace) {
            return Err(CodecError::Config(format!(
                "invalid HTTP result format '{}'",
                self.http.result_format
            )));
        }
        if let Some(logging) = &self.logging {
            parse_level(&logging.level)?;
        }
        Ok(())
    }

    /// Builds the transport adapter this configuration selects.
    pub fn build_transport(&self) -> Arc<dyn Transport> {
        match self.transport {
            TransportKind::Native => Arc::new(NativeTransport::new()),
            TransportKind::Http => {
                Arc::new(HttpTransport::with_result_format(self.http.result_format.trim()))
            }
        }
    }

    /// Installs the configured logger, if a `logging` section is present.
    pub fn init_logging(&self) -> Result<(), CodecError> {
        match &self.logging {
            Some(logging) => observability::enable_verbose_logging(
                parse_level(&logging.level)?,
                logging.log_file.as_deref(),
            ),
            None => Ok(()),
        }
    }
}

fn parse_level(level: &str) -> Result<LevelFilter, CodecError> {
    level
        .parse()
        .map_err(|_| CodecError::Config(format!("invalid log level '{}'", level)))
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

fn default_result_format() -> String {
    DEFAULT_RESULT_FORMAT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = CodecConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CodecConfig::default());
        assert_eq!(config.transport, TransportKind::Native);
        assert!(config.memoize_processors);
        assert_eq!(config.http.result_format, "TabSeparatedWithNamesAndTypes");
    }

    #[test]
    fn test_http_config_builds_http_transport() {
        let config = CodecConfig::from_json_str(
            r#"{"transport": "http", "http": {"result_format": "TSVWithNamesAndTypes"}}"#,
        )
        .unwrap();
        let transport = config.build_transport();
        assert_eq!(transport.kind(), TransportKind::Http);
        assert_eq!(transport.result_format(), Some("TSVWithNamesAndTypes"));
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(matches!(
            CodecConfig::from_json_str(r#"{"transport": "grpc"}"#),
            Err(CodecError::SerdeJson(_))
        ));
        assert!(matches!(
            CodecConfig::from_json_str(r#"{"http": {"result_format": "TSV JSON"}}"#),
            Err(CodecError::Config(_))
        ));
        assert!(matches!(
            CodecConfig::from_json_str(r#"{"logging": {"level": "loud"}}"#),
            Err(CodecError::Config(_))
        ));
    }

    #[test]
    fn test_init_logging() {
        assert!(CodecConfig::default().init_logging().is_ok());

        let unopenable = CodecConfig::from_json_str(
            r#"{"logging": {"level": "debug", "log_file": "/definitely/not/here/codec.log"}}"#,
        )
        .unwrap();
        assert!(matches!(unopenable.init_logging(), Err(CodecError::Io(_))));

        let path = std::env::temp_dir().join("clickhouse_codec_init_logging.log");
        let config = CodecConfig {
            logging: Some(LoggingConfig {
                level: "warn".to_string(),
                log_file: Some(path.to_string_lossy().into_owned()),
            }),
            ..CodecConfig::default()
        };
        assert!(config.init_logging().is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            CodecConfig::from_json_file("/definitely/not/here.json"),
            Err(CodecError::Io(_))
        ));
    }
}
