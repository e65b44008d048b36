//! Transport-Schnittstelle
//!
//! Die Transportschicht (Signaling, NAT-Traversal, Reconnect) ist extern.
//! Der Chat-Kern braucht nur:
//! - `Transport::verbinden` – Verbindung zu einer Peer-ID oeffnen
//! - `Verbindung::senden` – opaken Payload uebertragen
//! - eingehende `TransportEreignis`se ueber einen mpsc-Kanal
//!
//! `SpeicherHub` ist eine In-Process-Implementierung fuer Tests und den
//! Demo-Client.

use async_trait::async_trait;
use dashmap::DashMap;
use fluester_core::PeerId;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{TransportError, TransportResult};

/// Ereignisse der Transportschicht
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEreignis {
    /// Ein Peer hat eine Verbindung zu uns geoeffnet
    Offen { peer: PeerId },
    /// Payload von einem Peer empfangen
    Daten { peer: PeerId, payload: String },
    Geschlossen { peer: PeerId },
    Fehler { peer: Option<PeerId>, grund: String },
}

/// Offene Verbindung zu einem Peer
#[async_trait]
pub trait Verbindung: Send + Sync {
    async fn senden(&self, payload: String) -> TransportResult<()>;
}

/// Transport-Adapter
#[async_trait]
pub trait Transport: Send + Sync {
    /// Von der Transportschicht vergebene lokale ID
    fn lokale_id(&self) -> &PeerId;

    async fn verbinden(&self, peer: &PeerId) -> TransportResult<Arc<dyn Verbindung>>;
}

// ---------------------------------------------------------------------------
// SpeicherHub
// ---------------------------------------------------------------------------

/// In-Process Relay: verbindet alle registrierten Peers miteinander
///
/// Clone teilt die Registry.
#[derive(Clone, Default)]
pub struct SpeicherHub {
    peers: Arc<DashMap<PeerId, mpsc::UnboundedSender<TransportEreignis>>>,
}

impl SpeicherHub {
    pub fn neu() -> Self {
        Self::default()
    }

    /// Registriert einen Peer und gibt Transport + Ereignis-Empfaenger zurueck
    pub fn registrieren(
        &self,
        id: PeerId,
    ) -> (SpeicherTransport, mpsc::UnboundedReceiver<TransportEreignis>) {
        let (tx, rx) = mpsc::unbounded_channel();
        if self.peers.insert(id.clone(), tx).is_some() {
            tracing::warn!(peer = %id, "Peer-ID erneut registriert, alte Registrierung ersetzt");
        }
        let transport = SpeicherTransport {
            lokale_id: id,
            hub: self.clone(),
        };
        (transport, rx)
    }

    /// Entfernt einen Peer und meldet allen anderen `Geschlossen`
    pub fn abmelden(&self, id: &PeerId) {
        if self.peers.remove(id).is_none() {
            return;
        }
        for eintrag in self.peers.iter() {
            let _ = eintrag
                .value()
                .send(TransportEreignis::Geschlossen { peer: id.clone() });
        }
    }

    pub fn ist_registriert(&self, id: &PeerId) -> bool {
        self.peers.contains_key(id)
    }

    fn sender(&self, id: &PeerId) -> Option<mpsc::UnboundedSender<TransportEreignis>> {
        self.peers.get(id).map(|e| e.value().clone())
    }
}

/// Transport eines Peers am `SpeicherHub`
pub struct SpeicherTransport {
    lokale_id: PeerId,
    hub: SpeicherHub,
}

#[async_trait]
impl Transport for SpeicherTransport {
    fn lokale_id(&self) -> &PeerId {
        &self.lokale_id
    }

    async fn verbinden(&self, peer: &PeerId) -> TransportResult<Arc<dyn Verbindung>> {
        let tx = self
            .hub
            .sender(peer)
            .ok_or_else(|| TransportError::NichtErreichbar(peer.clone()))?;

        tx.send(TransportEreignis::Offen {
            peer: self.lokale_id.clone(),
        })
        .map_err(|_| TransportError::Geschlossen(peer.clone()))?;

        tracing::debug!(lokal = %self.lokale_id, peer = %peer, "Verbindung geoeffnet");
        Ok(Arc::new(SpeicherVerbindung {
            lokal: self.lokale_id.clone(),
            remote: peer.clone(),
            tx,
        }))
    }
}

struct SpeicherVerbindung {
    lokal: PeerId,
    remote: PeerId,
    tx: mpsc::UnboundedSender<TransportEreignis>,
}

#[async_trait]
impl Verbindung for SpeicherVerbindung {
    async fn senden(&self, payload: String) -> TransportResult<()> {
        self.tx
            .send(TransportEreignis::Daten {
                peer: self.lokal.clone(),
                payload,
            })
            .map_err(|_| TransportError::Geschlossen(self.remote.clone()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
