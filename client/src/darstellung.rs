//! Text-Darstellung fuer das Terminal

use fluester_chat::{AnsichtsAktion, Darstellung, Marke, NachrichtenKnoten, Richtung};

/// Schreibt Ansichts-Aktionen als Zeilen auf stdout
#[derive(Debug, Default)]
pub struct TextDarstellung;

impl Darstellung for TextDarstellung {
    fn anwenden(&mut self, aktion: &AnsichtsAktion) {
        if let Some(zeile) = zeile(aktion) {
            println!("{zeile}");
        }
    }
}

fn nachricht(peer: &str, knoten: &NachrichtenKnoten) -> String {
    let absender = match knoten.richtung {
        Richtung::Gesendet => "du",
        Richtung::Empfangen => peer,
    };
    let mut zeile = format!("[{}] {absender}: {}", knoten.id, knoten.inhalt());
    if let Some(ziel) = &knoten.antwort_auf {
        zeile.push_str(&format!(" (Antwort auf {ziel})"));
    }
    zeile
}

/// Formatiert eine Aktion, `None` fuer Aktionen ohne Ausgabe
pub fn zeile(aktion: &AnsichtsAktion) -> Option<String> {
    match aktion {
        AnsichtsAktion::GespraechAnlegen { peer, lokale_id } => {
            Some(format!("== Gespraech mit {peer} (du bist {lokale_id}) =="))
        }
        AnsichtsAktion::KnotenEinfuegen { peer, knoten, .. } => {
            Some(nachricht(peer.as_str(), knoten))
        }
        AnsichtsAktion::KnotenErsetzen { id, text, zeit, .. } => {
            Some(format!("[{id}] bearbeitet: {text} {zeit}"))
        }
        AnsichtsAktion::MarkeSetzen { id, marke, .. } => match marke {
            Some(Marke::Zugestellt) => Some(format!("[{id}] zugestellt")),
            Some(Marke::Bearbeitung) => Some(format!("[{id}] wird bearbeitet")),
            None => None,
        },
        AnsichtsAktion::TippIndikatorZeigen { peer, .. } => Some(format!("{peer} tippt...")),
        AnsichtsAktion::EingabeSetzen { text, .. } if !text.is_empty() => {
            Some(format!("Eingabe: {text}"))
        }
        AnsichtsAktion::AntwortZiel { id: Some(id), .. } => Some(format!("Antwort auf [{id}]")),
        AnsichtsAktion::VerlaufGeleert { peer } => Some(format!("-- Verlauf mit {peer} geleert --")),
        AnsichtsAktion::TippIndikatorEntfernen { .. }
        | AnsichtsAktion::EingabeSetzen { .. }
        | AnsichtsAktion::AntwortZiel { .. } => None,
    }
}
