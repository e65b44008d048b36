//! SitzungsLaeufer – ein Task pro Sitzung
//!
//! Der Laeufer besitzt die `Sitzung` und bedient zwei Quellen in einer
//! `tokio::select!`-Schleife:
//! - Befehle der Oberflaeche ueber `SitzungsHandle` (mpsc + oneshot-Antwort)
//! - Ereignisse der Transportschicht
//!
//! Jedes Ereignis wird vollstaendig verarbeitet bevor das naechste beginnt.
//! Fehler auf dem Empfangsweg werden geloggt und beenden die Schleife nicht.

use fluester_core::{MessageId, PeerId};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{ChatError, ChatResult};
use crate::session::Sitzung;
use crate::transport::TransportEreignis;

/// Puffergroesse der Befehls-Mailbox
const BEFEHL_PUFFER: usize = 64;

type Antwort<T> = oneshot::Sender<ChatResult<T>>;

/// Befehle der Oberflaeche an die Sitzung
enum Befehl {
    GespraechBeginnen {
        peer: PeerId,
        antwort: Antwort<()>,
    },
    NeuerSchluessel {
        peer: PeerId,
        antwort: Antwort<()>,
    },
    EingabeAendern {
        peer: PeerId,
        puffer: String,
        antwort: Antwort<()>,
    },
    Absenden {
        peer: PeerId,
        antwort: Antwort<Option<MessageId>>,
    },
    BearbeitenStarten {
        peer: PeerId,
        id: MessageId,
        antwort: Antwort<()>,
    },
    AntwortenStarten {
        peer: PeerId,
        id: MessageId,
        antwort: Antwort<()>,
    },
    VerlaufLeeren {
        peer: PeerId,
        antwort: Antwort<()>,
    },
    TippIndikatorSenden {
        an: bool,
    },
}

/// Startet den Laeufer fuer eine Sitzung
///
/// Der Task endet wenn alle Handles verworfen wurden oder der
/// Ereignis-Kanal schliesst, und gibt die Sitzung zurueck.
pub fn starten(
    sitzung: Sitzung,
    ereignisse: mpsc::UnboundedReceiver<TransportEreignis>,
) -> (SitzungsHandle, JoinHandle<Sitzung>) {
    let (tx, rx) = mpsc::channel(BEFEHL_PUFFER);
    let laeufer = SitzungsLaeufer {
        sitzung,
        befehle: rx,
        ereignisse,
    };
    let task = tokio::spawn(laeufer.laufen());
    (SitzungsHandle { tx }, task)
}

struct SitzungsLaeufer {
    sitzung: Sitzung,
    befehle: mpsc::Receiver<Befehl>,
    ereignisse: mpsc::UnboundedReceiver<TransportEreignis>,
}

impl SitzungsLaeufer {
    async fn laufen(mut self) -> Sitzung {
        let peer = self.sitzung.lokale_id().clone();
        tracing::debug!(peer = %peer, "Sitzungs-Laeufer gestartet");

        loop {
            tokio::select! {
                befehl = self.befehle.recv() => {
                    match befehl {
                        Some(befehl) => self.befehl_ausfuehren(befehl).await,
                        None => {
                            tracing::debug!(peer = %peer, "Alle Handles verworfen");
                            break;
                        }
                    }
                }
                ereignis = self.ereignisse.recv() => {
                    match ereignis {
                        Some(ereignis) => {
                            match self.sitzung.verarbeiten(ereignis).await {
                                Ok(()) => {}
                                Err(e) if e.ist_parse_fehler() => {
                                    tracing::warn!(peer = %peer, fehler = %e, "Unlesbares Envelope verworfen");
                                }
                                Err(e) => {
                                    tracing::warn!(
                                        peer = %peer,
                                        fehler = %e,
                                        "Verarbeitung eines Ereignisses fehlgeschlagen"
                                    );
                                }
                            }
                        }
                        None => {
                            tracing::info!(peer = %peer, "Transport beendet");
                            break;
                        }
                    }
                }
            }
        }

        tracing::debug!(peer = %peer, "Sitzungs-Laeufer beendet");
        self.sitzung
    }

    async fn befehl_ausfuehren(&mut self, befehl: Befehl) {
        let s = &mut self.sitzung;
        match befehl {
            Befehl::GespraechBeginnen { peer, antwort } => {
                let _ = antwort.send(s.gespraech_beginnen(&peer).await);
            }
            Befehl::NeuerSchluessel { peer, antwort } => {
                let _ = antwort.send(s.neuer_schluessel(&peer).await);
            }
            Befehl::EingabeAendern {
                peer,
                puffer,
                antwort,
            } => {
                let _ = antwort.send(s.eingabe_aendern(&peer, puffer).await);
            }
            Befehl::Absenden { peer, antwort } => {
                let _ = antwort.send(s.absenden(&peer).await);
            }
            Befehl::BearbeitenStarten { peer, id, antwort } => {
                let _ = antwort.send(s.bearbeiten_starten(&peer, &id));
            }
            Befehl::AntwortenStarten { peer, id, antwort } => {
                let _ = antwort.send(s.antworten_starten(&peer, &id));
            }
            Befehl::VerlaufLeeren { peer, antwort } => {
                s.verlauf_leeren(&peer);
                let _ = antwort.send(Ok(()));
            }
            Befehl::TippIndikatorSenden { an } => s.tipp_indikator_senden_setzen(an),
        }
    }
}

/// Handle fuer Befehle an einen laufenden `SitzungsLaeufer`
///
/// Clone ist billig, alle Klone teilen dieselbe Mailbox.
#[derive(Clone)]
pub struct SitzungsHandle {
    tx: mpsc::Sender<Befehl>,
}

impl SitzungsHandle {
    async fn anfragen<T>(&self, befehl: impl FnOnce(Antwort<T>) -> Befehl) -> ChatResult<T> {
        let (antwort_tx, antwort_rx) = oneshot::channel();
        self.tx
            .send(befehl(antwort_tx))
            .await
            .map_err(|_| ChatError::SitzungBeendet)?;
        antwort_rx.await.map_err(|_| ChatError::SitzungBeendet)?
    }

    pub async fn gespraech_beginnen(&self, peer: PeerId) -> ChatResult<()> {
        self.anfragen(|antwort| Befehl::GespraechBeginnen { peer, antwort })
            .await
    }

    pub async fn neuer_schluessel(&self, peer: PeerId) -> ChatResult<()> {
        self.anfragen(|antwort| Befehl::NeuerSchluessel { peer, antwort })
            .await
    }

    pub async fn eingabe_aendern(&self, peer: PeerId, puffer: impl Into<String>) -> ChatResult<()> {
        let puffer = puffer.into();
        self.anfragen(|antwort| Befehl::EingabeAendern {
            peer,
            puffer,
            antwort,
        })
        .await
    }

    pub async fn absenden(&self, peer: PeerId) -> ChatResult<Option<MessageId>> {
        self.anfragen(|antwort| Befehl::Absenden { peer, antwort })
            .await
    }

    pub async fn bearbeiten_starten(&self, peer: PeerId, id: MessageId) -> ChatResult<()> {
        self.anfragen(|antwort| Befehl::BearbeitenStarten { peer, id, antwort })
            .await
    }

    pub async fn antworten_starten(&self, peer: PeerId, id: MessageId) -> ChatResult<()> {
        self.anfragen(|antwort| Befehl::AntwortenStarten { peer, id, antwort })
            .await
    }

    pub async fn verlauf_leeren(&self, peer: PeerId) -> ChatResult<()> {
        self.anfragen(|antwort| Befehl::VerlaufLeeren { peer, antwort })
            .await
    }

    pub async fn tipp_indikator_senden(&self, an: bool) -> ChatResult<()> {
        self.tx
            .send(Befehl::TippIndikatorSenden { an })
            .await
            .map_err(|_| ChatError::SitzungBeendet)
    }
}
