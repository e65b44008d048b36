//! Szenario-Tests ueber den In-Process-Transport


use std::sync::Arc;

use fluester_core::PeerId;
use tokio::sync::mpsc;

use crate::{
    AnsichtsAktion, ChatError, KanalDarstellung, Sitzung, SitzungsConfig, SpeicherHub,
    TransportEreignis,
};

/// Ein Peer im Test: Sitzung plus beide Empfaenger
pub(crate) struct TestPeer {
    pub id: PeerId,
    pub sitzung: Sitzung,
    pub ereignisse: mpsc::UnboundedReceiver<TransportEreignis>,
    pub aktionen: mpsc::UnboundedReceiver<AnsichtsAktion>,
}

pub(crate) fn test_peer(hub: &SpeicherHub, id: &str, config: SitzungsConfig) -> TestPeer {
    let id = PeerId::new(id);
    let (transport, ereignisse) = hub.registrieren(id.clone());
    let (darstellung, aktionen) = KanalDarstellung::neu();
    let sitzung = Sitzung::neu(Arc::new(transport), Box::new(darstellung), config)
        .expect("Sitzung konnte nicht erstellt werden");
    TestPeer {
        id,
        sitzung,
        ereignisse,
        aktionen,
    }
}

impl TestPeer {
    /// Verarbeitet alle anstehenden Transport-Ereignisse dieses Peers
    pub async fn abarbeiten(&mut self) -> Vec<ChatError> {
        let mut fehler = Vec::new();
        while let Ok(ereignis) = self.ereignisse.try_recv() {
            if let Err(e) = self.sitzung.verarbeiten(ereignis).await {
                fehler.push(e);
            }
        }
        fehler
    }

    /// Alle bisher ausgegebenen Ansichts-Aktionen
    pub fn aktionen_leeren(&mut self) -> Vec<AnsichtsAktion> {
        let mut alle = Vec::new();
        while let Ok(aktion) = self.aktionen.try_recv() {
            alle.push(aktion);
        }
        alle
    }
}

/// Reicht Ereignisse zwischen zwei Peers hin und her bis Ruhe herrscht
pub(crate) async fn pumpen(a: &mut TestPeer, b: &mut TestPeer) -> Vec<ChatError> {
    let mut fehler = Vec::new();
    loop {
        let mut verarbeitet = 0;
        for peer in [&mut *a, &mut *b] {
            while let Ok(ereignis) = peer.ereignisse.try_recv() {
                verarbeitet += 1;
                if let Err(e) = peer.sitzung.verarbeiten(ereignis).await {
                    fehler.push(e);
                }
            }
        }
        if verarbeitet == 0 {
            break;
        }
    }
    fehler
}

/// Zwei Peers mit etabliertem Schluessel (Alice hat den Austausch gestartet)
pub(crate) async fn verbundenes_paar(config: SitzungsConfig) -> (SpeicherHub, TestPeer, TestPeer) {
    let hub = SpeicherHub::neu();
    let mut alice = test_peer(&hub, "alice", config.clone());
    let mut bob = test_peer(&hub, "bob", config);

    alice
        .sitzung
        .gespraech_beginnen(&bob.id)
        .await
        .expect("Schluesselaustausch konnte nicht gestartet werden");
    let fehler = pumpen(&mut alice, &mut bob).await;
    assert!(fehler.is_empty(), "Fehler beim Austausch: {fehler:?}");

    alice.aktionen_leeren();
    bob.aktionen_leeren();
    (hub, alice, bob)
}

/// Tippt einen Text ein und schickt ihn ab
pub(crate) async fn schreiben(peer: &mut TestPeer, an: &PeerId, text: &str) -> fluester_core::MessageId {
    peer.sitzung
        .eingabe_aendern(an, text)
        .await
        .expect("Eingabe fehlgeschlagen");
    peer.sitzung
        .absenden(an)
        .await
        .expect("Absenden fehlgeschlagen")
        .expect("Puffer war leer")
}
