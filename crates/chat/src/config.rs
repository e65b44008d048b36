//! Sitzungs-Konfiguration

use fluester_crypto::NonceModus;
use serde::{Deserialize, Serialize};

/// Einstellungen einer Chat-Sitzung
///
/// Wird im Client aus dem `[chat]`-Abschnitt der TOML-Datei gelesen.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitzungsConfig {
    /// Nonce-Behandlung der Nachrichten-Chiffre, muss bei beiden Peers gleich sein
    pub nonce_modus: NonceModus,
    /// Typing/StopTyping an den Peer senden
    pub tipp_indikator_senden: bool,
    /// Maximale Anzahl zurueckgestellter Envelopes pro Peer (eingehend ohne
    /// Schluessel, ausgehend waehrend eines Schluesselwechsels). 0 = keine.
    pub max_zurueckgestellt: usize,
}

impl Default for SitzungsConfig {
    fn default() -> Self {
        Self {
            nonce_modus: NonceModus::default(),
            tipp_indikator_senden: true,
            max_zurueckgestellt: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standardwerte() {
        let config = SitzungsConfig::default();
        assert_eq!(config.nonce_modus, NonceModus::ProNachricht);
        assert!(config.tipp_indikator_senden);
        assert_eq!(config.max_zurueckgestellt, 64);
    }

    #[test]
    fn teilweise_toml() {
        let config: SitzungsConfig = toml::from_str("nonce_modus = \"fest\"").unwrap();
        assert_eq!(config.nonce_modus, NonceModus::Fest);
        assert!(config.tipp_indikator_senden);
    }
}
