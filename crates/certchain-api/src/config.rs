//! Service configuration.
//!
//! Read from environment variables with defaults. A variable that is set but
//! malformed is an error, never silently replaced by its default.

use std::path::PathBuf;
use std::time::Duration;

/// Log output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Listen port. Binds on all interfaces.
    pub port: u16,
    /// Record snapshot file.
    pub db_path: PathBuf,
    /// Directory blobs are written to and served from.
    pub uploads_dir: PathBuf,
    /// Base for `pdfUrl`/`photoUrl` locators.
    pub public_base: String,
    /// Bound on a single record write.
    pub write_timeout: Duration,
    /// Per-blob size ceiling in bytes.
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            db_path: PathBuf::from("data/database.json"),
            uploads_dir: PathBuf::from("uploads"),
            public_base: "/uploads".to_string(),
            write_timeout: Duration::from_millis(5000),
            max_upload_bytes: 10 * 1024 * 1024,
            log_format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 5000)
    /// - `CERTCHAIN_DB_PATH` (default: `data/database.json`)
    /// - `CERTCHAIN_UPLOADS_DIR` (default: `uploads`)
    /// - `CERTCHAIN_PUBLIC_BASE` (default: `/uploads`)
    /// - `CERTCHAIN_WRITE_TIMEOUT_MS` (default: 5000)
    /// - `CERTCHAIN_MAX_UPLOAD_BYTES` (default: 10485760)
    /// - `CERTCHAIN_LOG_FORMAT`: `text` or `json` (default: `text`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(v) => parse_number("PORT", &v)?,
            None => defaults.port,
        };
        let write_timeout = match get("CERTCHAIN_WRITE_TIMEOUT_MS") {
            Some(v) => {
                let ms: u64 = parse_number("CERTCHAIN_WRITE_TIMEOUT_MS", &v)?;
                if ms == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: "CERTCHAIN_WRITE_TIMEOUT_MS".to_string(),
                        value: v,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Duration::from_millis(ms)
            }
            None => defaults.write_timeout,
        };
        let max_upload_bytes = match get("CERTCHAIN_MAX_UPLOAD_BYTES") {
            Some(v) => parse_number("CERTCHAIN_MAX_UPLOAD_BYTES", &v)?,
            None => defaults.max_upload_bytes,
        };
        let log_format = match get("CERTCHAIN_LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    var: "CERTCHAIN_LOG_FORMAT".to_string(),
                    value: other.to_string(),
                    reason: "expected `text` or `json`".to_string(),
                })
            }
        };

        Ok(Self {
            port,
            db_path: get("CERTCHAIN_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            uploads_dir: get("CERTCHAIN_UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            public_base: get("CERTCHAIN_PUBLIC_BASE").unwrap_or(defaults.public_base),
            write_timeout,
            max_upload_bytes,
            log_format,
        })
    }

    /// Request body ceiling: two blobs plus room for the text fields.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes
            .saturating_mul(2)
            .saturating_add(64 * 1024)
    }
}

fn parse_number<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            var: var.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidValue {
        var: String,
        value: String,
        reason: String,
    },
}
