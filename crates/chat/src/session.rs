//! Sitzung – die Gespraechs-Zustandsmaschine
//!
//! Eine `Sitzung` gehoert genau einem Task (siehe `laeufer`). Alle Methoden
//! nehmen `&mut self`, eingehende Ereignisse werden also nacheinander und
//! vollstaendig verarbeitet.
//!
//! ## Schluesselaustausch
//! ```text
//! Initiator                                   Antwortender
//!   | -- RSAKeyShare (oeffentlicher Schluessel) -> |  erzeugt IV + Key
//!   | <- AESKeyShare (eingewickelt, Base64) ------ |  Etabliert
//!   Etabliert, zurueckgestellte Envelopes abarbeiten
//! ```
//!
//! Starten beide Seiten gleichzeitig, antwortet nur die Seite mit der
//! kleineren Peer-ID. Die andere verwirft das fremde RSAKeyShare und wartet
//! auf das AESKeyShare.
//!
//! ## Schluesselwechsel
//! Solange das eigene RSAKeyShare unbeantwortet ist, werden ausgehende
//! Nachrichten im Klartext zurueckgehalten und erst mit dem neuen Schluessel
//! verschluesselt und gesendet.
//!
//! ## Empfang ohne Schluessel
//! Nicht-Key-Envelopes vor dem Austausch werden pro Peer zurueckgestellt und
//! danach in Ankunftsreihenfolge verarbeitet. Ist noch kein Austausch
//! unterwegs, startet der erste solche Envelope ihn.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use fluester_core::{MessageId, PeerId};
use fluester_crypto::{decrypt_text, encrypt_text, CryptoError, KeyManager};
use fluester_protocol::{Envelope, EnvelopeEvent};
use std::collections::HashMap;
use std::sync::Arc;

use crate::ansicht::{
    AnsichtsAktion, Darstellung, GespraechsAnsicht, Marke, NachrichtenKnoten, Richtung,
};
use crate::config::SitzungsConfig;
use crate::error::{ChatError, ChatResult};
use crate::gespraech::{Cursor, Gespraech, SchluesselZustand, Ziel};
use crate::transport::{Transport, TransportEreignis, Verbindung};

/// Zustand eines Chat-Clients: Schluessel, Gespraeche, Verbindungen, Cursor
pub struct Sitzung {
    lokale_id: PeerId,
    schluessel: Arc<KeyManager>,
    transport: Arc<dyn Transport>,
    darstellung: Box<dyn Darstellung>,
    config: SitzungsConfig,
    gespraeche: HashMap<PeerId, Gespraech>,
    /// Offene Verbindungen, wiederverwendet bis der Transport sie schliesst
    verbindungen: HashMap<PeerId, Arc<dyn Verbindung>>,
    cursor: Cursor,
}

impl Sitzung {
    /// Erstellt eine Sitzung mit frisch erzeugtem Schluessel-Paar
    pub fn neu(
        transport: Arc<dyn Transport>,
        darstellung: Box<dyn Darstellung>,
        config: SitzungsConfig,
    ) -> ChatResult<Self> {
        let schluessel = Arc::new(KeyManager::generate_identity(config.nonce_modus)?);
        Ok(Self::mit_schluessel(transport, darstellung, config, schluessel))
    }

    /// Erstellt eine Sitzung mit vorhandenem Key Manager
    pub fn mit_schluessel(
        transport: Arc<dyn Transport>,
        darstellung: Box<dyn Darstellung>,
        config: SitzungsConfig,
        schluessel: Arc<KeyManager>,
    ) -> Self {
        let lokale_id = transport.lokale_id().clone();
        tracing::info!(peer = %lokale_id, modus = ?config.nonce_modus, "Sitzung erstellt");
        Self {
            lokale_id,
            schluessel,
            transport,
            darstellung,
            config,
            gespraeche: HashMap::new(),
            verbindungen: HashMap::new(),
            cursor: Cursor::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Abfragen
    // -----------------------------------------------------------------------

    pub fn lokale_id(&self) -> &PeerId {
        &self.lokale_id
    }

    pub fn schluessel(&self) -> &Arc<KeyManager> {
        &self.schluessel
    }

    pub fn config(&self) -> &SitzungsConfig {
        &self.config
    }

    pub fn gespraech(&self, peer: &PeerId) -> Option<&Gespraech> {
        self.gespraeche.get(peer)
    }

    pub fn ansicht(&self, peer: &PeerId) -> Option<&GespraechsAnsicht> {
        self.gespraeche.get(peer).map(|g| &g.ansicht)
    }

    pub fn zustand(&self, peer: &PeerId) -> SchluesselZustand {
        self.gespraeche
            .get(peer)
            .map(|g| g.zustand)
            .unwrap_or_default()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    /// Schaltet das Senden von Typing/StopTyping zur Laufzeit um
    pub fn tipp_indikator_senden_setzen(&mut self, an: bool) {
        self.config.tipp_indikator_senden = an;
    }

    // -----------------------------------------------------------------------
    // Schluesselaustausch
    // -----------------------------------------------------------------------

    /// Startet den Schluesselaustausch mit einem Peer
    pub async fn gespraech_beginnen(&mut self, peer: &PeerId) -> ChatResult<()> {
        let envelope =
            Envelope::rsa_key_share(self.lokale_id.clone(), self.schluessel.export_public_key());
        self.senden(peer, envelope).await?;
        let gespraech = self.gespraech_mut(peer);
        gespraech.zustand = SchluesselZustand::AustauschAusstehend;
        gespraech.anfrage_offen = true;
        tracing::info!(peer = %peer, "Schluesselaustausch gestartet");
        Ok(())
    }

    /// Fordert einen neuen Gespraechsschluessel an
    ///
    /// Der Peer erzeugt einen frischen Schluessel, der den alten auf beiden
    /// Seiten ueberschreibt. Bis zur Antwort bleibt der alte Schluessel fuer
    /// den Empfang gueltig, ausgehende Nachrichten werden zurueckgehalten.
    pub async fn neuer_schluessel(&mut self, peer: &PeerId) -> ChatResult<()> {
        let envelope =
            Envelope::rsa_key_share(self.lokale_id.clone(), self.schluessel.export_public_key());
        self.senden(peer, envelope).await?;
        self.gespraech_mut(peer).anfrage_offen = true;
        tracing::info!(peer = %peer, "Neuer Schluessel angefordert");
        Ok(())
    }

    async fn rsa_key_share_empfangen(&mut self, envelope: Envelope) -> ChatResult<()> {
        let peer = envelope.from;
        if self.gespraech_mut(&peer).anfrage_offen && self.lokale_id > peer {
            tracing::debug!(peer = %peer, "Gleichzeitiger Austausch, warte auf AESKeyShare");
            return Ok(());
        }
        let oeffentlich = KeyManager::import_public_key(&envelope.body)?;

        self.schluessel.establish_symmetric_key(&peer);
        let eingewickelt = self.schluessel.wrap_symmetric_key(&peer, &oeffentlich)?;
        let antwort = Envelope::aes_key_share(self.lokale_id.clone(), STANDARD.encode(eingewickelt));
        self.senden(&peer, antwort).await?;

        let gespraech = self.gespraech_mut(&peer);
        gespraech.zustand = SchluesselZustand::Etabliert;
        gespraech.anfrage_offen = false;
        tracing::info!(peer = %peer, "Gespraechsschluessel erzeugt und gesendet");
        self.zurueckgestellte_abarbeiten(&peer).await;
        self.zurueckgehaltene_senden(&peer).await;
        Ok(())
    }

    async fn aes_key_share_empfangen(&mut self, envelope: Envelope) -> ChatResult<()> {
        let peer = envelope.from;
        let eingewickelt = STANDARD
            .decode(envelope.body.as_bytes())
            .map_err(|e| CryptoError::SchluesselFormat(e.to_string()))?;
        self.schluessel.unwrap_symmetric_key(&peer, &eingewickelt)?;

        let gespraech = self.gespraech_mut(&peer);
        if gespraech.zustand == SchluesselZustand::Uninitialisiert {
            tracing::debug!(peer = %peer, "AESKeyShare ohne eigene Anfrage angenommen");
        }
        gespraech.zustand = SchluesselZustand::Etabliert;
        gespraech.anfrage_offen = false;
        tracing::info!(peer = %peer, "Gespraechsschluessel etabliert");
        self.zurueckgestellte_abarbeiten(&peer).await;
        self.zurueckgehaltene_senden(&peer).await;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Empfang
    // -----------------------------------------------------------------------

    /// Verarbeitet ein Ereignis der Transportschicht
    pub async fn verarbeiten(&mut self, ereignis: TransportEreignis) -> ChatResult<()> {
        match ereignis {
            TransportEreignis::Offen { peer } => {
                tracing::debug!(peer = %peer, "Eingehende Verbindung");
                self.gespraech_mut(&peer);
                Ok(())
            }
            TransportEreignis::Daten { peer, payload } => {
                self.payload_empfangen(&peer, &payload).await
            }
            TransportEreignis::Geschlossen { peer } => {
                if self.verbindungen.remove(&peer).is_some() {
                    tracing::info!(peer = %peer, "Verbindung geschlossen");
                }
                Ok(())
            }
            TransportEreignis::Fehler { peer, grund } => {
                tracing::warn!(peer = ?peer, grund = %grund, "Transport-Fehler");
                if let Some(peer) = peer {
                    self.verbindungen.remove(&peer);
                }
                Ok(())
            }
        }
    }

    /// Parst einen Payload und verarbeitet das Envelope
    pub async fn payload_empfangen(&mut self, von: &PeerId, payload: &str) -> ChatResult<()> {
        let envelope = Envelope::from_payload(payload)?;
        if envelope.from != *von {
            return Err(ChatError::AbsenderAbweichung {
                verbindung: von.clone(),
                angegeben: envelope.from,
            });
        }
        self.envelope_verarbeiten(envelope).await
    }

    /// Verteilt ein empfangenes Envelope nach Ereignis und Schluessel-Zustand
    pub async fn envelope_verarbeiten(&mut self, envelope: Envelope) -> ChatResult<()> {
        tracing::trace!(
            peer = %envelope.from,
            event = ?envelope.event,
            id = %envelope.id,
            "Envelope empfangen"
        );
        match envelope.event {
            Some(EnvelopeEvent::RsaKeyShare) => self.rsa_key_share_empfangen(envelope).await,
            Some(EnvelopeEvent::AesKeyShare) => self.aes_key_share_empfangen(envelope).await,
            Some(event) if event.ist_gruppe() => Err(ChatError::NichtImplementiert(format!(
                "Gruppen-Ereignis {event:?} von {}",
                envelope.from
            ))),
            _ if self.zustand(&envelope.from) == SchluesselZustand::Etabliert => {
                self.etabliert_verarbeiten(envelope).await
            }
            _ => self.zurueckstellen(envelope).await,
        }
    }

    async fn zurueckstellen(&mut self, envelope: Envelope) -> ChatResult<()> {
        let peer = envelope.from.clone();
        let max = self.config.max_zurueckgestellt;
        let gespraech = self.gespraech_mut(&peer);

        if max == 0 {
            tracing::warn!(peer = %peer, id = %envelope.id, "Envelope ohne Schluessel verworfen");
        } else {
            if gespraech.zurueckgestellt.len() >= max {
                if let Some(verworfen) = gespraech.zurueckgestellt.pop_front() {
                    tracing::warn!(
                        peer = %peer,
                        id = %verworfen.id,
                        "Warteschlange voll, aeltestes Envelope verworfen"
                    );
                }
            }
            gespraech.zurueckgestellt.push_back(envelope);
            tracing::debug!(
                peer = %peer,
                wartend = gespraech.zurueckgestellt.len(),
                "Envelope ohne Schluessel zurueckgestellt"
            );
        }

        if gespraech.zustand == SchluesselZustand::Uninitialisiert {
            self.gespraech_beginnen(&peer).await?;
        }
        Ok(())
    }

    async fn zurueckgestellte_abarbeiten(&mut self, peer: &PeerId) {
        let wartend: Vec<Envelope> = self.gespraech_mut(peer).zurueckgestellt.drain(..).collect();
        if wartend.is_empty() {
            return;
        }
        tracing::debug!(peer = %peer, anzahl = wartend.len(), "Zurueckgestellte Envelopes abarbeiten");
        for envelope in wartend {
            if let Err(e) = self.etabliert_verarbeiten(envelope).await {
                tracing::warn!(peer = %peer, fehler = %e, "Zurueckgestelltes Envelope fehlgeschlagen");
            }
        }
    }

    /// Sendet waehrend des Schluesselwechsels zurueckgehaltene Nachrichten
    async fn zurueckgehaltene_senden(&mut self, peer: &PeerId) {
        let wartend: Vec<Envelope> = self.gespraech_mut(peer).zurueckgehalten.drain(..).collect();
        if wartend.is_empty() {
            return;
        }
        tracing::debug!(peer = %peer, anzahl = wartend.len(), "Zurueckgehaltene Nachrichten senden");
        for envelope in wartend {
            let id = envelope.id.clone();
            if let Err(e) = self.zurueckgehaltene_nachricht_senden(peer, envelope).await {
                tracing::warn!(peer = %peer, id = %id, fehler = %e, "Zurueckgehaltene Nachricht verloren");
            }
        }
    }

    async fn zurueckgehaltene_nachricht_senden(
        &mut self,
        peer: &PeerId,
        mut envelope: Envelope,
    ) -> ChatResult<()> {
        let key = self.schluessel.get_key(peer)?;
        envelope.body = encrypt_text(&key, &envelope.body)?;
        self.uebertragen(peer, envelope).await
    }

    /// Verarbeitung bei etabliertem Schluessel
    async fn etabliert_verarbeiten(&mut self, envelope: Envelope) -> ChatResult<()> {
        let peer = envelope.from.clone();
        match envelope.event {
            None => self.nachricht_empfangen(envelope).await,
            Some(EnvelopeEvent::Edit) => self.bearbeitung_empfangen(envelope).await,
            Some(EnvelopeEvent::Typing) => {
                let id = envelope.id;
                self.ansicht_aendern(&peer, |a| a.tipp_indikator_anhaengen(id));
                Ok(())
            }
            Some(EnvelopeEvent::StopTyping) => {
                self.ansicht_aendern(&peer, |a| a.tipp_indikator_entfernen());
                Ok(())
            }
            Some(EnvelopeEvent::Delivered) => {
                let id = envelope.id;
                if !self.ansicht_aendern(&peer, |a| a.zugestellt_markieren(&id)) {
                    tracing::debug!(peer = %peer, id = %id, "Zustellbestaetigung ohne passende Nachricht");
                }
                Ok(())
            }
            Some(
                event @ (EnvelopeEvent::RsaKeyShare
                | EnvelopeEvent::AesKeyShare
                | EnvelopeEvent::GroupRsaKeyRequest
                | EnvelopeEvent::GroupRsaKeyShare),
            ) => Err(ChatError::UngueltigerZustand(format!(
                "{event:?} ist kein Nachrichten-Ereignis"
            ))),
        }
    }

    async fn nachricht_empfangen(&mut self, envelope: Envelope) -> ChatResult<()> {
        let peer = envelope.from;
        let text = self.entschluesseln(&peer, &envelope.body)?;

        self.ansicht_aendern(&peer, |a| a.tipp_indikator_entfernen());
        let knoten = NachrichtenKnoten::neu(
            envelope.id.clone(),
            Richtung::Empfangen,
            text,
            envelope.time,
            envelope.prev,
        );
        self.ansicht_aendern(&peer, |a| Some(a.anhaengen(knoten)));

        let bestaetigung = Envelope::delivered(self.lokale_id.clone(), envelope.id);
        self.senden(&peer, bestaetigung).await
    }

    async fn bearbeitung_empfangen(&mut self, envelope: Envelope) -> ChatResult<()> {
        let peer = envelope.from;
        let text = self.entschluesseln(&peer, &envelope.body)?;

        let id = envelope.id.clone();
        let zeit = envelope.time;
        if !self.ansicht_aendern(&peer, |a| a.ersetzen(&id, Richtung::Empfangen, text, zeit)) {
            tracing::warn!(peer = %peer, id = %id, "Bearbeitung fuer unbekannte Nachricht");
        }
        self.ansicht_aendern(&peer, |a| a.tipp_indikator_entfernen());

        let bestaetigung = Envelope::delivered(self.lokale_id.clone(), envelope.id);
        self.senden(&peer, bestaetigung).await
    }

    // -----------------------------------------------------------------------
    // Senden
    // -----------------------------------------------------------------------

    /// Sendet ein Envelope und aktualisiert die lokale Ansicht
    ///
    /// Schlaegt die Uebertragung fehl, ist das Envelope verloren: kein
    /// lokales Echo, die Verbindung wird verworfen. Nach Nachrichten und
    /// Edits werden die Cursor geleert.
    pub async fn senden(&mut self, an: &PeerId, envelope: Envelope) -> ChatResult<()> {
        let inhalt = matches!(envelope.event, None | Some(EnvelopeEvent::Edit));
        self.uebertragen(an, envelope).await?;
        if inhalt {
            self.cursor_leeren();
        }
        Ok(())
    }

    /// Uebertraegt ein Envelope und erzeugt das lokale Echo
    async fn uebertragen(&mut self, an: &PeerId, envelope: Envelope) -> ChatResult<()> {
        let payload = envelope.to_payload()?;
        let verbindung = self.verbindung(an).await?;
        if let Err(e) = verbindung.senden(payload).await {
            self.verbindungen.remove(an);
            tracing::warn!(peer = %an, fehler = %e, "Senden fehlgeschlagen");
            return Err(e.into());
        }
        tracing::trace!(peer = %an, event = ?envelope.event, id = %envelope.id, "Envelope gesendet");

        self.lokales_echo(an, &envelope)
    }

    async fn verbindung(&mut self, peer: &PeerId) -> ChatResult<Arc<dyn Verbindung>> {
        if let Some(verbindung) = self.verbindungen.get(peer) {
            return Ok(Arc::clone(verbindung));
        }
        let verbindung = self.transport.verbinden(peer).await?;
        self.verbindungen.insert(peer.clone(), Arc::clone(&verbindung));
        Ok(verbindung)
    }

    fn lokales_echo(&mut self, an: &PeerId, envelope: &Envelope) -> ChatResult<()> {
        match envelope.event {
            None => {
                let text = self.entschluesseln(an, &envelope.body)?;
                let knoten = NachrichtenKnoten::neu(
                    envelope.id.clone(),
                    Richtung::Gesendet,
                    text,
                    envelope.time.clone(),
                    envelope.prev.clone(),
                );
                self.ansicht_aendern(an, |a| Some(a.einfuegen_vor_tipp_indikator(knoten)));
            }
            Some(EnvelopeEvent::Edit) => {
                let text = self.entschluesseln(an, &envelope.body)?;
                let zeit = envelope.time.clone();
                let id = &envelope.id;
                if !self.ansicht_aendern(an, |a| a.ersetzen(id, Richtung::Gesendet, text, zeit)) {
                    tracing::warn!(peer = %an, id = %id, "Bearbeitete Nachricht nicht in der Ansicht");
                }
            }
            Some(
                EnvelopeEvent::Typing
                | EnvelopeEvent::StopTyping
                | EnvelopeEvent::Delivered
                | EnvelopeEvent::RsaKeyShare
                | EnvelopeEvent::AesKeyShare
                | EnvelopeEvent::GroupRsaKeyRequest
                | EnvelopeEvent::GroupRsaKeyShare,
            ) => {}
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Eingabe
    // -----------------------------------------------------------------------

    /// Meldet den neuen Inhalt des Eingabefelds
    ///
    /// Leer -> nicht leer sendet Typing, nicht leer -> leer sendet StopTyping.
    pub async fn eingabe_aendern(&mut self, peer: &PeerId, puffer: impl Into<String>) -> ChatResult<()> {
        let puffer = puffer.into();
        let gespraech = self.gespraech_mut(peer);
        let war_leer = gespraech.puffer.is_empty();
        let ist_leer = puffer.is_empty();
        gespraech.puffer = puffer;

        if war_leer == ist_leer
            || !self.config.tipp_indikator_senden
            || self.zustand(peer) != SchluesselZustand::Etabliert
        {
            return Ok(());
        }

        let envelope = if ist_leer {
            Envelope::stop_typing(self.lokale_id.clone())
        } else {
            Envelope::typing(self.lokale_id.clone())
        };
        self.senden(peer, envelope).await
    }

    /// Schickt den Eingabepuffer ab (Enter)
    ///
    /// Wird gerade eine Nachricht in diesem Gespraech bearbeitet, geht ein
    /// Edit mit deren ID raus, sonst eine neue Nachricht (ggf. mit Antwort-
    /// Verweis). Gibt die ID zurueck, `None` bei leerem Puffer.
    ///
    /// Waehrend eines eigenen Schluesselwechsels wird die Nachricht
    /// zurueckgehalten und nach dem AESKeyShare gesendet.
    pub async fn absenden(&mut self, peer: &PeerId) -> ChatResult<Option<MessageId>> {
        if self.gespraech_mut(peer).puffer.is_empty() {
            return Ok(None);
        }
        let key = self
            .schluessel
            .get_key(peer)
            .map_err(|_| ChatError::KeinSchluessel(peer.clone()))?;

        let max = self.config.max_zurueckgestellt;
        let gespraech = self.gespraech_mut(peer);
        let zurueckhalten = gespraech.anfrage_offen;
        if zurueckhalten && gespraech.zurueckgehalten.len() >= max {
            return Err(ChatError::UngueltigerZustand(
                "Schluesselwechsel laeuft, Warteschlange voll".to_string(),
            ));
        }
        let body = if zurueckhalten {
            gespraech.puffer.clone()
        } else {
            encrypt_text(&key, &gespraech.puffer)?
        };
        gespraech.puffer.clear();
        self.darstellen(AnsichtsAktion::EingabeSetzen {
            peer: peer.clone(),
            text: String::new(),
        });

        let bearbeitung = if self.cursor.bearbeiten_in(peer).is_some() {
            self.cursor.bearbeiten.take()
        } else {
            None
        };
        let envelope = match &bearbeitung {
            Some(ziel) => Envelope::edit(self.lokale_id.clone(), body, ziel.id.clone()),
            None => Envelope::nachricht(
                self.lokale_id.clone(),
                body,
                MessageId::neu(),
                self.cursor.antworten_in(peer).cloned(),
            ),
        };
        let id = envelope.id.clone();

        if zurueckhalten {
            tracing::debug!(peer = %peer, id = %id, "Schluesselwechsel laeuft, Nachricht zurueckgehalten");
            self.gespraech_mut(peer).zurueckgehalten.push_back(envelope);
            self.cursor_leeren();
            return Ok(Some(id));
        }
        if let Err(e) = self.senden(peer, envelope).await {
            if let Some(ziel) = &bearbeitung {
                self.bearbeitung_zuruecknehmen(ziel);
            }
            return Err(e);
        }
        Ok(Some(id))
    }

    /// Beginnt oder beendet die Bearbeitung einer eigenen Nachricht (Doppelklick)
    ///
    /// Nur zugestellte Nachrichten duerfen bearbeitet werden. Ein laufendes
    /// Antworten wird verworfen, eine andere laufende Bearbeitung ebenso.
    pub fn bearbeiten_starten(&mut self, peer: &PeerId, id: &MessageId) -> ChatResult<()> {
        let knoten = self
            .ansicht(peer)
            .and_then(|a| a.finden(id, Richtung::Gesendet))
            .ok_or_else(|| ChatError::NachrichtNichtGefunden(id.clone()))?;
        let marke = knoten.marke;
        let text = knoten.text.clone();

        let ziel = Ziel {
            peer: peer.clone(),
            id: id.clone(),
        };
        match marke {
            Some(Marke::Zugestellt) => {}
            Some(Marke::Bearbeitung) if self.cursor.bearbeiten.as_ref() == Some(&ziel) => {
                // Zweiter Doppelklick bricht ab
                self.cursor.bearbeiten = None;
                self.bearbeitung_zuruecknehmen(&ziel);
                self.darstellen(AnsichtsAktion::EingabeSetzen {
                    peer: peer.clone(),
                    text: String::new(),
                });
                self.gespraech_mut(peer).puffer.clear();
                return Ok(());
            }
            Some(Marke::Bearbeitung) => {
                return Err(ChatError::UngueltigerZustand(
                    "Letzte Bearbeitung noch nicht bestaetigt".into(),
                ))
            }
            None => {
                return Err(ChatError::UngueltigerZustand(
                    "Nachricht noch nicht zugestellt".into(),
                ))
            }
        }

        if let Some(antwort) = self.cursor.antworten.take() {
            self.darstellen(AnsichtsAktion::AntwortZiel {
                peer: antwort.peer,
                id: None,
            });
        }
        if let Some(alt) = self.cursor.bearbeiten.take() {
            self.bearbeitung_zuruecknehmen(&alt);
        }

        self.ansicht_aendern(peer, |a| a.marke_setzen(id, Some(Marke::Bearbeitung)));
        self.gespraech_mut(peer).puffer = text.clone();
        self.darstellen(AnsichtsAktion::EingabeSetzen {
            peer: peer.clone(),
            text,
        });
        self.cursor.bearbeiten = Some(ziel);
        tracing::debug!(peer = %peer, id = %id, "Bearbeitung gestartet");
        Ok(())
    }

    /// Setzt oder loest das Antwort-Ziel (Klick auf eine Nachricht)
    pub fn antworten_starten(&mut self, peer: &PeerId, id: &MessageId) -> ChatResult<()> {
        if self
            .ansicht(peer)
            .and_then(|a| a.finden_beliebig(id))
            .is_none()
        {
            return Err(ChatError::NachrichtNichtGefunden(id.clone()));
        }

        let ziel = Ziel {
            peer: peer.clone(),
            id: id.clone(),
        };
        if let Some(alt) = self.cursor.antworten.take() {
            self.darstellen(AnsichtsAktion::AntwortZiel {
                peer: alt.peer.clone(),
                id: None,
            });
            if alt == ziel {
                return Ok(());
            }
        }
        if let Some(alt) = self.cursor.bearbeiten.take() {
            self.bearbeitung_zuruecknehmen(&alt);
        }

        self.darstellen(AnsichtsAktion::AntwortZiel {
            peer: peer.clone(),
            id: Some(id.clone()),
        });
        self.cursor.antworten = Some(ziel);
        Ok(())
    }

    /// Leert die lokale Ansicht eines Gespraechs
    ///
    /// Schluessel und Verbindung bleiben bestehen.
    pub fn verlauf_leeren(&mut self, peer: &PeerId) {
        if self.cursor.bearbeiten_in(peer).is_some() {
            self.cursor.bearbeiten = None;
        }
        if self.cursor.antworten_in(peer).is_some() {
            self.cursor.antworten = None;
        }
        self.ansicht_aendern(peer, |a| Some(a.leeren()));
        tracing::info!(peer = %peer, "Verlauf geleert");
    }

    // -----------------------------------------------------------------------
    // Hilfsfunktionen
    // -----------------------------------------------------------------------

    fn entschluesseln(&self, peer: &PeerId, body: &str) -> ChatResult<String> {
        let key = self.schluessel.get_key(peer)?;
        Ok(decrypt_text(&key, body)?)
    }

    /// Legt das Gespraech beim ersten Zugriff an
    fn gespraech_mut(&mut self, peer: &PeerId) -> &mut Gespraech {
        let darstellung = &mut self.darstellung;
        let lokale_id = &self.lokale_id;
        self.gespraeche.entry(peer.clone()).or_insert_with(|| {
            darstellung.anwenden(&AnsichtsAktion::GespraechAnlegen {
                peer: peer.clone(),
                lokale_id: lokale_id.clone(),
            });
            Gespraech::neu(peer.clone())
        })
    }

    /// Aendert die Ansicht und reicht eine entstandene Aktion weiter
    fn ansicht_aendern<F>(&mut self, peer: &PeerId, aenderung: F) -> bool
    where
        F: FnOnce(&mut GespraechsAnsicht) -> Option<AnsichtsAktion>,
    {
        match aenderung(&mut self.gespraech_mut(peer).ansicht) {
            Some(aktion) => {
                self.darstellung.anwenden(&aktion);
                true
            }
            None => false,
        }
    }

    fn darstellen(&mut self, aktion: AnsichtsAktion) {
        self.darstellung.anwenden(&aktion);
    }

    /// Setzt eine nicht abgeschickte Bearbeitung zurueck auf zugestellt
    fn bearbeitung_zuruecknehmen(&mut self, ziel: &Ziel) {
        let in_bearbeitung = self
            .ansicht(&ziel.peer)
            .and_then(|a| a.finden(&ziel.id, Richtung::Gesendet))
            .is_some_and(|n| n.marke == Some(Marke::Bearbeitung));
        if in_bearbeitung {
            self.ansicht_aendern(&ziel.peer, |a| {
                a.marke_setzen(&ziel.id, Some(Marke::Zugestellt))
            });
        }
    }

    fn cursor_leeren(&mut self) {
        if let Some(ziel) = self.cursor.bearbeiten.take() {
            self.bearbeitung_zuruecknehmen(&ziel);
        }
        if let Some(ziel) = self.cursor.antworten.take() {
            self.darstellen(AnsichtsAktion::AntwortZiel {
                peer: ziel.peer,
                id: None,
            });
        }
    }
}
