//! Fehlertypen fuer das Chat-Crate

use fluester_core::{MessageId, PeerId};
use fluester_crypto::CryptoError;
use fluester_protocol::ProtocolError;
use thiserror::Error;

/// Chat-Fehlertypen
#[derive(Debug, Error)]
pub enum ChatError {
    /// Aktion im aktuellen Zustand nicht erlaubt (z.B. Bearbeiten ohne Zustellung)
    #[error("Ungueltiger Zustand: {0}")]
    UngueltigerZustand(String),

    #[error("Nachricht nicht gefunden: {0}")]
    NachrichtNichtGefunden(MessageId),

    #[error("Kein etablierter Schluessel fuer Peer {0}")]
    KeinSchluessel(PeerId),

    #[error("Transport-Fehler: {0}")]
    Transport(#[from] TransportError),

    #[error("Nicht implementiert: {0}")]
    NichtImplementiert(String),

    /// `from` im Envelope passt nicht zur Verbindung auf der es ankam
    #[error("Absender {angegeben} kam ueber die Verbindung von {verbindung}")]
    AbsenderAbweichung { verbindung: PeerId, angegeben: PeerId },

    #[error("Sitzung beendet")]
    SitzungBeendet,

    #[error("Krypto-Fehler: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Protokoll-Fehler: {0}")]
    Protokoll(#[from] ProtocolError),
}

impl ChatError {
    /// Unlesbares Envelope oder unlesbarer Schluessel (Parse-Fehler)
    pub fn ist_parse_fehler(&self) -> bool {
        match self {
            Self::Protokoll(_) => true,
            Self::Crypto(e) => e.ist_parse_fehler(),
            _ => false,
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

/// Fehler der Transportschicht
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Peer nicht erreichbar: {0}")]
    NichtErreichbar(PeerId),

    #[error("Verbindung zu {0} geschlossen")]
    Geschlossen(PeerId),
}

pub type TransportResult<T> = Result<T, TransportError>;
