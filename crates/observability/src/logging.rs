//! Structured Logging Setup via tracing-subscriber
//!
//! Konfigurierbar per Datei (`[logging]`) und Umgebungsvariable:
//! - `FL_LOG_LEVEL`: Filter-Direktive (z.B. `debug` oder `fluester_chat=trace`),
//!   Standard: info
//! - `FL_LOG_FORMAT`: Format (text/json), Standard: text
//!
//! Umgebungsvariablen haben Vorrang vor der Datei.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing_subscriber::{fmt, EnvFilter};

pub const ENV_LOG_LEVEL: &str = "FL_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "FL_LOG_FORMAT";

/// Fehler beim Logging-Setup
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Ungueltiger Log-Filter '{0}'")]
    UngueltigerFilter(String),

    #[error("Unbekanntes Log-Format '{0}' (erlaubt: text, json)")]
    UnbekanntesFormat(String),

    #[error("Logging bereits initialisiert")]
    BereitsInitialisiert,
}

/// Ausgabeformat der Log-Zeilen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            andere => Err(LoggingError::UnbekanntesFormat(andere.to_string())),
        }
    }
}

/// Logging-Abschnitt der Konfiguration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Wendet `FL_LOG_LEVEL` / `FL_LOG_FORMAT` aus der Prozess-Umgebung an
    pub fn mit_umgebung(self) -> Result<Self, LoggingError> {
        self.mit_overrides(|name| std::env::var(name).ok())
    }

    /// Wendet Overrides aus einer beliebigen Quelle an
    pub fn mit_overrides<F>(mut self, lesen: F) -> Result<Self, LoggingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lesen(ENV_LOG_LEVEL) {
            self.level = level;
        }
        if let Some(format) = lesen(ENV_LOG_FORMAT) {
            self.format = format.parse()?;
        }
        Ok(self)
    }

    fn filter(&self) -> Result<EnvFilter, LoggingError> {
        EnvFilter::try_new(&self.level)
            .map_err(|_| LoggingError::UngueltigerFilter(self.level.clone()))
    }
}

/// Initialisiert das Logging-System
///
/// Darf pro Prozess nur einmal erfolgreich aufgerufen werden.
pub fn logging_initialisieren(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = config.filter()?;

    let ergebnis = match config.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };
    ergebnis.map_err(|_| LoggingError::BereitsInitialisiert)
}
