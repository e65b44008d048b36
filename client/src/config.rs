//! Client-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! Standardwerte, der Client laeuft also auch ohne Konfigurationsdatei.

use fluester_chat::SitzungsConfig;
use fluester_core::PeerId;
use fluester_observability::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Vollstaendige Client-Konfiguration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Peer-IDs
    pub peer: PeerEinstellungen,
    /// Sitzungs-Einstellungen (Nonce-Modus, Tipp-Indikator, Warteschlange)
    pub chat: SitzungsConfig,
    /// Logging-Einstellungen
    pub logging: LoggingConfig,
}

/// Peer-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerEinstellungen {
    /// Eigene ID (leer = zufaellig)
    pub id: Option<String>,
    /// ID des Echo-Partners im selben Prozess
    pub partner: String,
}

impl Default for PeerEinstellungen {
    fn default() -> Self {
        Self {
            id: None,
            partner: "echo".into(),
        }
    }
}

impl ClientConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => toml::from_str(&inhalt)
                .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Eigene Peer-ID (aus der Datei oder zufaellig)
    pub fn lokale_id(&self) -> PeerId {
        match self.peer.id.as_deref() {
            Some(id) if !id.trim().is_empty() => PeerId::new(id.trim()),
            _ => PeerId::zufaellig(),
        }
    }

    pub fn partner_id(&self) -> PeerId {
        PeerId::new(self.peer.partner.as_str())
    }
}
