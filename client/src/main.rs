//! Fluester Client – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet den Client.

use anyhow::Result;
use fluester_client::{config::ClientConfig, Client};
use fluester_observability::logging_initialisieren;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad = std::env::var("FLUESTER_CONFIG").unwrap_or_else(|_| "fluester.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = ClientConfig::laden(&config_pfad)?;

    // Logging initialisieren, FL_LOG_LEVEL / FL_LOG_FORMAT haben Vorrang
    let logging = config.logging.clone().mit_umgebung()?;
    logging_initialisieren(&logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Fluester Client wird initialisiert"
    );

    Client::neu(config).starten().await
}
