//! Ansichts-Modell und Darstellungs-Schnittstelle
//!
//! Die Zustandsmaschine entscheidet anhand des Modells (`GespraechsAnsicht`)
//! und beschreibt jede Aenderung als `AnsichtsAktion`. Eine `Darstellung`
//! (DOM, Terminal, Test-Aufzeichnung) setzt die Aktionen nur um.
//!
//! ## Knoten-Reihenfolge pro Gespraech
//! ```text
//! [Nachricht] [Nachricht] ... [Nachricht] [TippIndikator?]
//! ```
//! Der Tipp-Indikator ist hoechstens einmal vorhanden und immer der letzte
//! Knoten.

use fluester_core::{MessageId, PeerId};
use tokio::sync::mpsc;

// ---------------------------------------------------------------------------
// Knoten
// ---------------------------------------------------------------------------

/// Richtung einer Nachricht aus Sicht des lokalen Peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Richtung {
    Gesendet,
    Empfangen,
}

/// Markierung einer gesendeten Nachricht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marke {
    /// Empfaenger hat die Nachricht verarbeitet
    Zugestellt,
    /// Nachricht wird gerade bearbeitet bzw. Bearbeitung ist unbestaetigt
    Bearbeitung,
}

/// Eine dargestellte Nachricht
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NachrichtenKnoten {
    pub id: MessageId,
    pub richtung: Richtung,
    /// Entschluesselter Text
    pub text: String,
    /// Zeitstempel aus dem Envelope
    pub zeit: String,
    pub marke: Option<Marke>,
    /// Nachricht auf die geantwortet wurde
    pub antwort_auf: Option<MessageId>,
}

impl NachrichtenKnoten {
    pub fn neu(
        id: MessageId,
        richtung: Richtung,
        text: String,
        zeit: String,
        antwort_auf: Option<MessageId>,
    ) -> Self {
        Self {
            id,
            richtung,
            text,
            zeit,
            marke: None,
            antwort_auf,
        }
    }

    /// Angezeigter Inhalt: Text gefolgt vom Zeit-Suffix
    pub fn inhalt(&self) -> String {
        format!("{} {}", self.text, self.zeit)
    }
}

/// Ein Knoten im Inhaltsbereich eines Gespraechs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Knoten {
    Nachricht(NachrichtenKnoten),
    TippIndikator { id: MessageId },
}

// ---------------------------------------------------------------------------
// Aktionen
// ---------------------------------------------------------------------------

/// Beschreibung einer Ansichts-Aenderung
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnsichtsAktion {
    /// Container fuer ein Gespraech anlegen (Kopfzeile zeigt die lokale ID)
    GespraechAnlegen { peer: PeerId, lokale_id: PeerId },
    /// Nachrichten-Knoten an Position `index` einfuegen
    KnotenEinfuegen {
        peer: PeerId,
        index: usize,
        knoten: NachrichtenKnoten,
    },
    /// Inhalt eines Knotens ersetzen
    KnotenErsetzen {
        peer: PeerId,
        id: MessageId,
        text: String,
        zeit: String,
    },
    MarkeSetzen {
        peer: PeerId,
        id: MessageId,
        marke: Option<Marke>,
    },
    TippIndikatorZeigen { peer: PeerId, id: MessageId },
    TippIndikatorEntfernen { peer: PeerId },
    /// Eingabefeld auf einen Text setzen (leer = leeren)
    EingabeSetzen { peer: PeerId, text: String },
    /// Hervorhebung des Antwort-Ziels (None = keine)
    AntwortZiel { peer: PeerId, id: Option<MessageId> },
    VerlaufGeleert { peer: PeerId },
}

/// Darstellungs-Adapter (DOM, Terminal, ...)
pub trait Darstellung: Send {
    fn anwenden(&mut self, aktion: &AnsichtsAktion);
}

/// Leitet Aktionen in einen Kanal weiter (z.B. an einen UI-Thread)
pub struct KanalDarstellung {
    tx: mpsc::UnboundedSender<AnsichtsAktion>,
}

impl KanalDarstellung {
    pub fn neu() -> (Self, mpsc::UnboundedReceiver<AnsichtsAktion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Darstellung for KanalDarstellung {
    fn anwenden(&mut self, aktion: &AnsichtsAktion) {
        if self.tx.send(aktion.clone()).is_err() {
            tracing::trace!("Darstellungs-Kanal geschlossen");
        }
    }
}

// ---------------------------------------------------------------------------
// GespraechsAnsicht
// ---------------------------------------------------------------------------

/// Ansichts-Zustand eines Gespraechs
#[derive(Debug, Clone)]
pub struct GespraechsAnsicht {
    peer: PeerId,
    knoten: Vec<Knoten>,
}

impl GespraechsAnsicht {
    pub fn neu(peer: PeerId) -> Self {
        Self {
            peer,
            knoten: Vec::new(),
        }
    }

    pub fn knoten(&self) -> &[Knoten] {
        &self.knoten
    }

    /// Alle Nachrichten-Knoten in Reihenfolge
    pub fn nachrichten(&self) -> impl Iterator<Item = &NachrichtenKnoten> {
        self.knoten.iter().filter_map(|k| match k {
            Knoten::Nachricht(n) => Some(n),
            Knoten::TippIndikator { .. } => None,
        })
    }

    pub fn letzter_ist_tipp_indikator(&self) -> bool {
        matches!(self.knoten.last(), Some(Knoten::TippIndikator { .. }))
    }

    /// Letzter Knoten mit der ID und Richtung
    pub fn finden(&self, id: &MessageId, richtung: Richtung) -> Option<&NachrichtenKnoten> {
        self.nachrichten()
            .filter(|n| n.id == *id && n.richtung == richtung)
            .last()
    }

    /// Letzter Knoten mit der ID, gleich welcher Richtung
    pub fn finden_beliebig(&self, id: &MessageId) -> Option<&NachrichtenKnoten> {
        self.nachrichten().filter(|n| n.id == *id).last()
    }

    fn finden_mut(&mut self, id: &MessageId, richtung: Richtung) -> Option<&mut NachrichtenKnoten> {
        self.knoten.iter_mut().rev().find_map(|k| match k {
            Knoten::Nachricht(n) if n.id == *id && n.richtung == richtung => Some(n),
            _ => None,
        })
    }

    /// Haengt einen Tipp-Indikator an, falls nicht schon einer am Ende steht
    pub fn tipp_indikator_anhaengen(&mut self, id: MessageId) -> Option<AnsichtsAktion> {
        if self.letzter_ist_tipp_indikator() {
            return None;
        }
        self.knoten.push(Knoten::TippIndikator { id: id.clone() });
        Some(AnsichtsAktion::TippIndikatorZeigen {
            peer: self.peer.clone(),
            id,
        })
    }

    /// Entfernt einen Tipp-Indikator am Ende
    pub fn tipp_indikator_entfernen(&mut self) -> Option<AnsichtsAktion> {
        if !self.letzter_ist_tipp_indikator() {
            return None;
        }
        self.knoten.pop();
        Some(AnsichtsAktion::TippIndikatorEntfernen {
            peer: self.peer.clone(),
        })
    }

    /// Haengt eine Nachricht ans Ende an
    pub fn anhaengen(&mut self, knoten: NachrichtenKnoten) -> AnsichtsAktion {
        self.einfuegen_an(self.knoten.len(), knoten)
    }

    /// Fuegt eine Nachricht vor einem Tipp-Indikator am Ende ein, sonst ans Ende
    pub fn einfuegen_vor_tipp_indikator(&mut self, knoten: NachrichtenKnoten) -> AnsichtsAktion {
        let index = if self.letzter_ist_tipp_indikator() {
            self.knoten.len() - 1
        } else {
            self.knoten.len()
        };
        self.einfuegen_an(index, knoten)
    }

    fn einfuegen_an(&mut self, index: usize, knoten: NachrichtenKnoten) -> AnsichtsAktion {
        self.knoten.insert(index, Knoten::Nachricht(knoten.clone()));
        AnsichtsAktion::KnotenEinfuegen {
            peer: self.peer.clone(),
            index,
            knoten,
        }
    }

    /// Ersetzt Text und Zeit des juengsten passenden Knotens
    pub fn ersetzen(
        &mut self,
        id: &MessageId,
        richtung: Richtung,
        text: String,
        zeit: String,
    ) -> Option<AnsichtsAktion> {
        let knoten = self.finden_mut(id, richtung)?;
        knoten.text = text.clone();
        knoten.zeit = zeit.clone();
        Some(AnsichtsAktion::KnotenErsetzen {
            peer: self.peer.clone(),
            id: id.clone(),
            text,
            zeit,
        })
    }

    /// Markiert die juengste gesendete Nachricht mit der ID als zugestellt
    ///
    /// Nachrichten die schon zugestellt markiert sind werden uebersprungen.
    /// Unbekannte IDs ergeben `None`.
    pub fn zugestellt_markieren(&mut self, id: &MessageId) -> Option<AnsichtsAktion> {
        let knoten = self.knoten.iter_mut().rev().find_map(|k| match k {
            Knoten::Nachricht(n)
                if n.id == *id
                    && n.richtung == Richtung::Gesendet
                    && n.marke != Some(Marke::Zugestellt) =>
            {
                Some(n)
            }
            _ => None,
        })?;
        knoten.marke = Some(Marke::Zugestellt);
        Some(AnsichtsAktion::MarkeSetzen {
            peer: self.peer.clone(),
            id: id.clone(),
            marke: Some(Marke::Zugestellt),
        })
    }

    /// Setzt die Marke einer gesendeten Nachricht
    pub fn marke_setzen(&mut self, id: &MessageId, marke: Option<Marke>) -> Option<AnsichtsAktion> {
        let knoten = self.finden_mut(id, Richtung::Gesendet)?;
        knoten.marke = marke;
        Some(AnsichtsAktion::MarkeSetzen {
            peer: self.peer.clone(),
            id: id.clone(),
            marke,
        })
    }

    /// Entfernt alle Knoten
    pub fn leeren(&mut self) -> AnsichtsAktion {
        self.knoten.clear();
        AnsichtsAktion::VerlaufGeleert {
            peer: self.peer.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ansicht() -> GespraechsAnsicht {
        GespraechsAnsicht::neu(PeerId::new("bob"))
    }

    fn gesendet(id: &str) -> NachrichtenKnoten {
        NachrichtenKnoten::neu(
            MessageId::from(id),
            Richtung::Gesendet,
            format!("text-{id}"),
            "12:00".into(),
            None,
        )
    }

    #[test]
    fn inhalt_mit_zeit_suffix() {
        assert_eq!(gesendet("a").inhalt(), "text-a 12:00");
    }

    #[test]
    fn tipp_indikator_nur_einmal() {
        let mut a = ansicht();
        assert!(a.tipp_indikator_anhaengen(MessageId::leer()).is_some());
        assert!(a.tipp_indikator_anhaengen(MessageId::leer()).is_none());
        assert_eq!(a.knoten().len(), 1);
    }

    #[test]
    fn tipp_indikator_entfernen_ohne_indikator() {
        let mut a = ansicht();
        a.anhaengen(gesendet("a"));
        assert!(a.tipp_indikator_entfernen().is_none());
        assert_eq!(a.knoten().len(), 1);
    }

    #[test]
    fn einfuegen_vor_tipp_indikator() {
        let mut a = ansicht();
        a.anhaengen(gesendet("a"));
        a.tipp_indikator_anhaengen(MessageId::leer());

        let aktion = a.einfuegen_vor_tipp_indikator(gesendet("b"));
        assert!(matches!(aktion, AnsichtsAktion::KnotenEinfuegen { index: 1, .. }));
        assert!(a.letzter_ist_tipp_indikator());
        assert_eq!(a.nachrichten().count(), 2);
    }

    #[test]
    fn zugestellt_markiert_juengste_unmarkierte() {
        let mut a = ansicht();
        a.anhaengen(gesendet("x"));
        a.anhaengen(gesendet("x"));

        assert!(a.zugestellt_markieren(&MessageId::from("x")).is_some());
        let marken: Vec<_> = a.nachrichten().map(|n| n.marke).collect();
        assert_eq!(marken, vec![None, Some(Marke::Zugestellt)]);

        // Zweite Bestaetigung trifft die aeltere Nachricht
        assert!(a.zugestellt_markieren(&MessageId::from("x")).is_some());
        assert!(a.nachrichten().all(|n| n.marke == Some(Marke::Zugestellt)));

        // Dritte findet nichts mehr
        assert!(a.zugestellt_markieren(&MessageId::from("x")).is_none());
    }

    #[test]
    fn zugestellt_unbekannte_id_ist_none() {
        let mut a = ansicht();
        a.anhaengen(gesendet("a"));
        assert!(a.zugestellt_markieren(&MessageId::from("zzz")).is_none());
    }

    #[test]
    fn ersetzen_aendert_text_und_zeit() {
        let mut a = ansicht();
        a.anhaengen(gesendet("a"));
        let aktion = a.ersetzen(
            &MessageId::from("a"),
            Richtung::Gesendet,
            "neu".into(),
            "13:37".into(),
        );
        assert!(aktion.is_some());
        let n = a.finden(&MessageId::from("a"), Richtung::Gesendet).unwrap();
        assert_eq!(n.inhalt(), "neu 13:37");
        assert!(a
            .ersetzen(&MessageId::from("a"), Richtung::Empfangen, "x".into(), "".into())
            .is_none());
    }

    #[test]
    fn leeren_entfernt_alles() {
        let mut a = ansicht();
        a.anhaengen(gesendet("a"));
        a.tipp_indikator_anhaengen(MessageId::leer());
        a.leeren();
        assert!(a.knoten().is_empty());
    }
}
