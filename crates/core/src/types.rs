//! Gemeinsame Identifikationstypen fuer Fluester
//!
//! Alle IDs verwenden das Newtype-Pattern um Verwechslungen zwischen
//! Peer-IDs und Nachrichten-IDs zur Compilezeit auszuschliessen.
//! Auf dem Draht sind beide schlichte Strings (`#[serde(transparent)]`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opake Peer-ID, vergeben von der Transportschicht
///
/// Nur fuer die Dauer einer Sitzung stabil, keine persistente Identitaet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Erstellt eine zufaellige PeerId (wenn der Transport keine vorgibt)
    pub fn zufaellig() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PeerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Nachrichten-ID
///
/// Leer fuer Ereignisse die nicht einzeln adressierbar sind (Typing,
/// StopTyping, Key-Shares), sonst eine frische UUID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Erstellt eine neue eindeutige MessageId
    pub fn neu() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Die leere ID fuer nicht adressierbare Ereignisse
    pub fn leer() -> Self {
        Self(String::new())
    }

    pub fn ist_leer(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
