//! # fluester-observability
//!
//! Observability-Crate fuer Fluester:
//! - Structured Logging via tracing-subscriber (Text oder JSON)
//! - Logging-Konfiguration mit Umgebungs-Overrides (`FL_LOG_LEVEL`, `FL_LOG_FORMAT`)

pub mod logging;

pub use logging::{logging_initialisieren, LogFormat, LoggingConfig, LoggingError};
