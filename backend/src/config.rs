//! Service configuration read from the process environment.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::predictor::DEFAULT_PLACEHOLDER_INCOME;

pub const DEFAULT_MODEL_PATH: &str = "models/income_model.onnx";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which scorer the service starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerKind {
    /// Load the ONNX model at `model_path`; startup fails if it is absent.
    Onnx,
    /// Serve the placeholder income without any model.
    Placeholder,
}

impl FromStr for ScorerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "onnx" => Ok(ScorerKind::Onnx),
            "placeholder" | "none" => Ok(ScorerKind::Placeholder),
            other => Err(format!("expected 'onnx' or 'placeholder', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub scorer: ScorerKind,
    pub model_path: PathBuf,
    /// Income returned when no scorer is configured (default: 52)
    pub placeholder_income: f64,
    pub static_dir: PathBuf,
    pub json_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            workers: num_cpus::get(),
            scorer: ScorerKind::Onnx,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            placeholder_income: DEFAULT_PLACEHOLDER_INCOME,
            static_dir: PathBuf::from("./static"),
            json_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let placeholder_income: f64 =
            parse_or("PLACEHOLDER_INCOME", &lookup, defaults.placeholder_income)?;
        if !placeholder_income.is_finite() {
            return Err(ConfigError::Invalid {
                key: "PLACEHOLDER_INCOME",
                value: placeholder_income.to_string(),
                reason: "must be finite".to_string(),
            });
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", &lookup, defaults.port)?,
            workers: parse_or("WORKERS", &lookup, defaults.workers)?.max(1),
            scorer: parse_or("INCOME_SCORER", &lookup, defaults.scorer)?,
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            placeholder_income,
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            json_limit_bytes: parse_or("JSON_LIMIT_BYTES", &lookup, defaults.json_limit_bytes)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, F>(key: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: e.to_string(),
        }),
    }
}
