//! Fehlertypen fuer das Draht-Format

use thiserror::Error;

/// Fehler beim Parsen oder Pruefen eines Envelopes
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Ungueltiges Envelope-JSON: {0}")]
    UngueltigesJson(#[from] serde_json::Error),

    #[error("Unbekannter Ereignis-Code: {0}")]
    UnbekanntesEreignis(u8),

    #[error("Envelope ohne Nachrichten-ID: {0}")]
    FehlendeId(&'static str),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
