//! Fehlertypen fuer das Kryptografie-Subsystem

use fluester_core::PeerId;
use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Entschluesselung fehlgeschlagen: {0}")]
    Entschluesselung(String),

    #[error("Ungueltiges Schluesselformat: {0}")]
    SchluesselFormat(String),

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Kein Schluessel fuer Peer {peer_id}")]
    KeinSchluessel { peer_id: PeerId },

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),
}

impl CryptoError {
    /// Parse-Fehler (Schluessel-Kodierung) im Sinne der Fehler-Taxonomie
    pub fn ist_parse_fehler(&self) -> bool {
        matches!(
            self,
            Self::SchluesselFormat(_) | Self::UngueltigeSchluesselLaenge { .. }
        )
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;
