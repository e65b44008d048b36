//! Zustand pro Gespraech und prozessweite Cursor

use fluester_core::{MessageId, PeerId};
use fluester_protocol::Envelope;
use std::collections::VecDeque;

use crate::ansicht::GespraechsAnsicht;

/// Fortschritt des Schluesselaustauschs mit einem Peer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchluesselZustand {
    #[default]
    Uninitialisiert,
    /// RSAKeyShare gesendet, AESKeyShare steht aus
    AustauschAusstehend,
    Etabliert,
}

/// Alles was die Sitzung ueber ein Gespraech mit einem Peer weiss
#[derive(Debug)]
pub struct Gespraech {
    pub zustand: SchluesselZustand,
    pub ansicht: GespraechsAnsicht,
    /// Aktueller Inhalt des Eingabefelds
    pub(crate) puffer: String,
    /// Envelopes die vor dem Schluesselaustausch ankamen (Ankunftsreihenfolge)
    pub(crate) zurueckgestellt: VecDeque<Envelope>,
    /// Eigenes RSAKeyShare gesendet, noch keine Antwort
    pub(crate) anfrage_offen: bool,
    /// Ausgehende Nachrichten waehrend eines Schluesselwechsels, Body im Klartext
    pub(crate) zurueckgehalten: VecDeque<Envelope>,
}

impl Gespraech {
    pub fn neu(peer: PeerId) -> Self {
        Self {
            zustand: SchluesselZustand::Uninitialisiert,
            ansicht: GespraechsAnsicht::neu(peer),
            puffer: String::new(),
            zurueckgestellt: VecDeque::new(),
            anfrage_offen: false,
            zurueckgehalten: VecDeque::new(),
        }
    }

    pub fn puffer(&self) -> &str {
        &self.puffer
    }

    pub fn anzahl_zurueckgestellt(&self) -> usize {
        self.zurueckgestellt.len()
    }

    pub fn anfrage_offen(&self) -> bool {
        self.anfrage_offen
    }

    pub fn anzahl_zurueckgehalten(&self) -> usize {
        self.zurueckgehalten.len()
    }
}

/// Verweis auf eine Nachricht in einem Gespraech
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ziel {
    pub peer: PeerId,
    pub id: MessageId,
}

/// Bearbeitungs- und Antwort-Cursor (einer pro Sitzung)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    pub bearbeiten: Option<Ziel>,
    pub antworten: Option<Ziel>,
}

impl Cursor {
    /// Bearbeitungsziel, falls es im Gespraech mit `peer` liegt
    pub fn bearbeiten_in(&self, peer: &PeerId) -> Option<&MessageId> {
        self.bearbeiten
            .as_ref()
            .filter(|z| z.peer == *peer)
            .map(|z| &z.id)
    }

    /// Antwortziel, falls es im Gespraech mit `peer` liegt
    pub fn antworten_in(&self, peer: &PeerId) -> Option<&MessageId> {
        self.antworten
            .as_ref()
            .filter(|z| z.peer == *peer)
            .map(|z| &z.id)
    }
}
