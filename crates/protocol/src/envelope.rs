//! Envelope – die Nachrichteneinheit auf dem Draht
//!
//! ## Format
//! Flaches JSON-Objekt, Feldreihenfolge egal, fehlende optionale Felder
//! werden beim Serialisieren weggelassen und beim Parsen toleriert:
//! ```text
//! { "from": string, "body": string, "time": string, "id": string,
//!   "event"?: 0..=7, "prev"?: string, "effect"?: number }
//! ```
//!
//! ## Ereignis-Codes
//! ```text
//! 0 Typing   1 StopTyping   2 Edit   3 Delivered
//! 4 RSAKeyShare   5 AESKeyShare
//! 6 GroupRSAKeyRequest   7 GroupRSAKeyShare   (reserviert)
//! ```

use chrono::Local;
use fluester_core::{MessageId, PeerId};
use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};

// ---------------------------------------------------------------------------
// Ereignis
// ---------------------------------------------------------------------------

/// Ereignis-Tag eines Envelopes
///
/// Ein Envelope ohne Ereignis ist eine normale Textnachricht.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EnvelopeEvent {
    Typing,
    StopTyping,
    Edit,
    Delivered,
    /// Oeffentlicher Schluessel des Initiators (Name historisch)
    RsaKeyShare,
    /// Eingewickelter Gespraechsschluessel (Name historisch)
    AesKeyShare,
    /// Reserviert, nicht implementiert
    GroupRsaKeyRequest,
    /// Reserviert, nicht implementiert
    GroupRsaKeyShare,
}

impl EnvelopeEvent {
    /// Gruppen-Ereignisse sind reserviert
    pub fn ist_gruppe(&self) -> bool {
        matches!(self, Self::GroupRsaKeyRequest | Self::GroupRsaKeyShare)
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Typing => 0,
            Self::StopTyping => 1,
            Self::Edit => 2,
            Self::Delivered => 3,
            Self::RsaKeyShare => 4,
            Self::AesKeyShare => 5,
            Self::GroupRsaKeyRequest => 6,
            Self::GroupRsaKeyShare => 7,
        }
    }
}

impl From<EnvelopeEvent> for u8 {
    fn from(event: EnvelopeEvent) -> Self {
        event.code()
    }
}

impl TryFrom<u8> for EnvelopeEvent {
    type Error = ProtocolError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0 => Self::Typing,
            1 => Self::StopTyping,
            2 => Self::Edit,
            3 => Self::Delivered,
            4 => Self::RsaKeyShare,
            5 => Self::AesKeyShare,
            6 => Self::GroupRsaKeyRequest,
            7 => Self::GroupRsaKeyShare,
            andere => return Err(ProtocolError::UnbekanntesEreignis(andere)),
        })
    }
}

/// Effekt-Code (reserviert, wird unveraendert durchgereicht)
///
/// Beliebige JSON-Zahl, auch negativ oder mit Nachkommastellen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectCode(pub serde_json::Number);

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Eine Nachrichteneinheit zwischen zwei Peers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Absender
    pub from: PeerId,
    /// Ciphertext (Base64), Schluesselmaterial bei Key-Shares, leer bei Steuer-Ereignissen
    #[serde(default)]
    pub body: String,
    /// Anzeige-Zeitstempel
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<EnvelopeEvent>,
    /// ID der Nachricht auf die geantwortet wird
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<MessageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<EffectCode>,
}

impl Envelope {
    fn steuerung(from: PeerId, event: EnvelopeEvent, id: MessageId, body: String) -> Self {
        Self {
            from,
            body,
            time: zeit_jetzt(),
            id,
            event: Some(event),
            prev: None,
            effect: None,
        }
    }

    /// Normale Textnachricht (Body bereits verschluesselt)
    pub fn nachricht(from: PeerId, body: String, id: MessageId, prev: Option<MessageId>) -> Self {
        Self {
            from,
            body,
            time: zeit_jetzt(),
            id,
            event: None,
            prev,
            effect: None,
        }
    }

    /// Bearbeitung einer bestehenden Nachricht (Body bereits verschluesselt)
    pub fn edit(from: PeerId, body: String, id: MessageId) -> Self {
        Self::steuerung(from, EnvelopeEvent::Edit, id, body)
    }

    pub fn typing(from: PeerId) -> Self {
        Self::steuerung(from, EnvelopeEvent::Typing, MessageId::leer(), String::new())
    }

    pub fn stop_typing(from: PeerId) -> Self {
        Self::steuerung(from, EnvelopeEvent::StopTyping, MessageId::leer(), String::new())
    }

    /// Zustellbestaetigung fuer die Nachricht `id`
    pub fn delivered(from: PeerId, id: MessageId) -> Self {
        Self::steuerung(from, EnvelopeEvent::Delivered, id, String::new())
    }

    /// Oeffentlicher Schluessel in Text-Kodierung
    pub fn rsa_key_share(from: PeerId, public_key_text: String) -> Self {
        Self::steuerung(from, EnvelopeEvent::RsaKeyShare, MessageId::leer(), public_key_text)
    }

    /// Eingewickelter Gespraechsschluessel (Base64)
    pub fn aes_key_share(from: PeerId, wrapped_base64: String) -> Self {
        Self::steuerung(from, EnvelopeEvent::AesKeyShare, MessageId::leer(), wrapped_base64)
    }

    /// Prueft die Adressierbarkeits-Invariante
    ///
    /// Textnachrichten, Edit und Delivered brauchen eine ID. Fuer die
    /// uebrigen Ereignisse wird eine gesetzte ID toleriert.
    pub fn pruefen(&self) -> ProtocolResult<()> {
        if !self.id.ist_leer() {
            return Ok(());
        }
        match self.event {
            None => Err(ProtocolError::FehlendeId("Textnachricht")),
            Some(EnvelopeEvent::Edit) => Err(ProtocolError::FehlendeId("Edit")),
            Some(EnvelopeEvent::Delivered) => Err(ProtocolError::FehlendeId("Delivered")),
            Some(_) => Ok(()),
        }
    }

    /// Serialisiert das Envelope als JSON-Payload
    pub fn to_payload(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parst und prueft einen empfangenen JSON-Payload
    pub fn from_payload(payload: &str) -> ProtocolResult<Self> {
        let envelope: Self = serde_json::from_str(payload)?;
        envelope.pruefen()?;
        Ok(envelope)
    }
}

/// Aktuelle Uhrzeit als Anzeige-String (lokale Zeit, `HH:MM`)
pub fn zeit_jetzt() -> String {
    Local::now().format("%H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
