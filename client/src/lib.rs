//! fluester-client – Bibliotheks-Root
//!
//! Startet zwei Sitzungen im selben Prozess, verbunden ueber den
//! `SpeicherHub`: den lokalen Peer (Eingabe ueber stdin, Ausgabe als Text)
//! und einen Echo-Partner, der jede empfangene Nachricht zurueckschickt.

pub mod config;
pub mod darstellung;

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use config::ClientConfig;
use darstellung::TextDarstellung;
use fluester_chat::{
    laeufer, AnsichtsAktion, ChatResult, KanalDarstellung, Richtung, Sitzung, SitzungsHandle, SpeicherHub,
};
use fluester_core::{MessageId, PeerId};

/// Eine Eingabezeile des Benutzers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eingabe {
    /// Text abschicken (bzw. Bearbeitung abschliessen)
    Text(String),
    NeuerSchluessel,
    VerlaufLeeren,
    TippIndikator(bool),
    Antworten(MessageId),
    Bearbeiten(MessageId),
    Hilfe,
    Beenden,
}

impl Eingabe {
    /// Parst eine Zeile, `None` bei leerer Zeile
    pub fn parsen(zeile: &str) -> Option<Self> {
        let zeile = zeile.trim();
        if zeile.is_empty() {
            return None;
        }
        let Some(befehl) = zeile.strip_prefix('/') else {
            return Some(Self::Text(zeile.to_string()));
        };

        let mut teile = befehl.split_whitespace();
        let name = teile.next().unwrap_or_default();
        let argument = teile.next();
        Some(match (name, argument) {
            ("neu", _) => Self::NeuerSchluessel,
            ("leeren", _) => Self::VerlaufLeeren,
            ("tippen", Some("an")) => Self::TippIndikator(true),
            ("tippen", Some("aus")) => Self::TippIndikator(false),
            ("antworten", Some(id)) => Self::Antworten(MessageId::from(id)),
            ("bearbeiten", Some(id)) => Self::Bearbeiten(MessageId::from(id)),
            ("quit" | "beenden", _) => Self::Beenden,
            _ => Self::Hilfe,
        })
    }
}

const HILFE: &str = "\
Befehle:
  <text>             Nachricht senden (bzw. Bearbeitung abschliessen)
  /antworten <id>    Auf eine Nachricht antworten (nochmal = aufheben)
  /bearbeiten <id>   Eigene zugestellte Nachricht bearbeiten (nochmal = abbrechen)
  /neu               Neuen Gespraechsschluessel anfordern
  /leeren            Lokalen Verlauf leeren
  /tippen an|aus     Tipp-Indikator senden ein/aus
  /quit              Beenden";

/// Haelt den Client-Zustand zusammen
pub struct Client {
    pub config: ClientConfig,
}

impl Client {
    /// Erstellt einen neuen Client aus der gegebenen Konfiguration
    pub fn neu(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Startet beide Sitzungen und liest stdin bis `/quit`, EOF oder Ctrl-C
    pub async fn starten(self) -> Result<()> {
        let hub = SpeicherHub::neu();
        let lokale_id = self.config.lokale_id();
        let partner_id = self.config.partner_id();
        if lokale_id == partner_id {
            anyhow::bail!("Eigene ID und Partner-ID sind gleich: {lokale_id}");
        }

        // Echo-Partner
        let (transport, ereignisse) = hub.registrieren(partner_id.clone());
        let (kanal, aktionen) = KanalDarstellung::neu();
        let sitzung = Sitzung::neu(Arc::new(transport), Box::new(kanal), self.config.chat.clone())?;
        let (partner, _partner_task) = laeufer::starten(sitzung, ereignisse);
        tokio::spawn(echo_partner(partner, aktionen));

        // Lokaler Peer
        let (transport, ereignisse) = hub.registrieren(lokale_id.clone());
        let sitzung = Sitzung::neu(
            Arc::new(transport),
            Box::new(TextDarstellung),
            self.config.chat.clone(),
        )?;
        let (handle, _task) = laeufer::starten(sitzung, ereignisse);

        tracing::info!(peer = %lokale_id, partner = %partner_id, "Client gestartet");
        handle.gespraech_beginnen(partner_id.clone()).await?;
        println!("{HILFE}");

        let mut zeilen = BufReader::new(tokio::io::stdin()).lines();
        loop {
            tokio::select! {
                zeile = zeilen.next_line() => {
                    let Some(zeile) = zeile? else {
                        break;
                    };
                    let Some(eingabe) = Eingabe::parsen(&zeile) else {
                        continue;
                    };
                    if eingabe == Eingabe::Beenden {
                        break;
                    }
                    if let Err(e) = ausfuehren(&handle, &partner_id, eingabe).await {
                        println!("Fehler: {e}");
                        tracing::debug!(fehler = %e, "Befehl fehlgeschlagen");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl-C empfangen");
                    break;
                }
            }
        }

        tracing::info!("Client wird beendet");
        Ok(())
    }
}

async fn ausfuehren(handle: &SitzungsHandle, partner: &PeerId, eingabe: Eingabe) -> Result<()> {
    match eingabe {
        Eingabe::Text(text) => {
            handle.eingabe_aendern(partner.clone(), text).await?;
            handle.absenden(partner.clone()).await?;
        }
        Eingabe::NeuerSchluessel => handle.neuer_schluessel(partner.clone()).await?,
        Eingabe::VerlaufLeeren => handle.verlauf_leeren(partner.clone()).await?,
        Eingabe::TippIndikator(an) => handle.tipp_indikator_senden(an).await?,
        Eingabe::Antworten(id) => handle.antworten_starten(partner.clone(), id).await?,
        Eingabe::Bearbeiten(id) => handle.bearbeiten_starten(partner.clone(), id).await?,
        Eingabe::Hilfe => println!("{HILFE}"),
        Eingabe::Beenden => {}
    }
    Ok(())
}

/// Schickt jede empfangene Nachricht mit Praefix zurueck
async fn echo_partner(handle: SitzungsHandle, mut aktionen: mpsc::UnboundedReceiver<AnsichtsAktion>) {
    while let Some(aktion) = aktionen.recv().await {
        let AnsichtsAktion::KnotenEinfuegen { peer, knoten, .. } = aktion else {
            continue;
        };
        if knoten.richtung != Richtung::Empfangen {
            continue;
        }

        let antwort = format!("Echo: {}", knoten.text);
        let ergebnis: ChatResult<Option<MessageId>> = async {
            handle.eingabe_aendern(peer.clone(), antwort).await?;
            handle.absenden(peer.clone()).await
        }
        .await;
        if let Err(e) = ergebnis {
            tracing::warn!(peer = %peer, fehler = %e, "Echo fehlgeschlagen");
        }
    }
}
