//! Schluessel-Verwaltung (Key Manager)
//!
//! Haelt das prozessweite Schluessel-Paar und genau einen
//! Gespraechsschluessel pro Peer:
//! - Erstellen bei Schluesselaustausch (Antwortseite)
//! - Einwickeln fuer den Initiator
//! - Auswickeln und Speichern (Initiatorseite)
//! - Ueberschreiben bei erneutem Austausch

use dashmap::DashMap;
use fluester_core::PeerId;
use rand_core::{OsRng, RngCore};
use std::sync::Arc;

use crate::e2e::key_wrap::{decrypt_asymmetric, encrypt_asymmetric};
use crate::error::{CryptoError, CryptoResult};
use crate::identity::{export_public_key, import_public_key, Identity};
use crate::types::{
    ConversationKey, Iv, NonceModus, PublicKey, SecretBytes, IV_LAENGE, SCHLUESSEL_LAENGE,
};

/// Verwaltet Identitaet und Gespraechsschluessel
#[derive(Debug)]
pub struct KeyManager {
    identity: Identity,
    /// Aktueller Schluessel pro Peer (peer_id -> ConversationKey)
    keys: DashMap<PeerId, Arc<ConversationKey>>,
    modus: NonceModus,
}

impl KeyManager {
    /// Erzeugt das prozessweite Schluessel-Paar
    pub fn generate_identity(modus: NonceModus) -> CryptoResult<Self> {
        let identity = Identity::generate()?;
        tracing::debug!(?modus, "Schluessel-Paar erzeugt");
        Ok(Self {
            identity,
            keys: DashMap::new(),
            modus,
        })
    }

    pub fn public_key(&self) -> PublicKey {
        self.identity.public_key()
    }

    pub fn nonce_modus(&self) -> NonceModus {
        self.modus
    }

    /// Eigener oeffentlicher Schluessel in Text-Kodierung
    pub fn export_public_key(&self) -> String {
        export_public_key(&self.identity.public_key())
    }

    /// Parst einen fremden oeffentlichen Schluessel
    pub fn import_public_key(text: &str) -> CryptoResult<PublicKey> {
        import_public_key(text)
    }

    /// Erzeugt IV + Schluessel fuer ein Gespraech und speichert sie
    ///
    /// Ein vorhandener Schluessel wird ueberschrieben. Der Versand ist
    /// Sache des Aufrufers.
    pub fn establish_symmetric_key(&self, peer_id: &PeerId) -> Arc<ConversationKey> {
        let key = Arc::new(neuer_conversation_key(self.modus));
        self.keys.insert(peer_id.clone(), Arc::clone(&key));
        tracing::debug!(peer = %peer_id, "Gespraechsschluessel erzeugt");
        key
    }

    /// Wickelt den Schluessel eines Peers fuer dessen oeffentlichen Schluessel ein
    pub fn wrap_symmetric_key(
        &self,
        peer_id: &PeerId,
        recipient: &PublicKey,
    ) -> CryptoResult<Vec<u8>> {
        let key = self.get_key(peer_id)?;
        encrypt_asymmetric(recipient, &key.to_bytes())
    }

    /// Wickelt einen empfangenen Schluessel aus und speichert ihn fuer den Peer
    pub fn unwrap_symmetric_key(
        &self,
        peer_id: &PeerId,
        wrapped: &[u8],
    ) -> CryptoResult<Arc<ConversationKey>> {
        let bytes = decrypt_asymmetric(&self.identity, wrapped)?;
        let key = ConversationKey::from_bytes(&bytes, self.modus).ok_or(
            CryptoError::UngueltigeSchluesselLaenge {
                erwartet: IV_LAENGE + SCHLUESSEL_LAENGE,
                erhalten: bytes.len(),
            },
        )?;

        let key = Arc::new(key);
        self.keys.insert(peer_id.clone(), Arc::clone(&key));
        tracing::debug!(peer = %peer_id, "Gespraechsschluessel ausgewickelt");
        Ok(key)
    }

    /// Gibt den aktuellen Schluessel fuer einen Peer zurueck
    pub fn get_key(&self, peer_id: &PeerId) -> CryptoResult<Arc<ConversationKey>> {
        self.keys
            .get(peer_id)
            .map(|entry| Arc::clone(&*entry))
            .ok_or_else(|| CryptoError::KeinSchluessel {
                peer_id: peer_id.clone(),
            })
    }

    pub fn has_key(&self, peer_id: &PeerId) -> bool {
        self.keys.contains_key(peer_id)
    }
}

/// Frischer zufaelliger Gespraechsschluessel
pub(crate) fn neuer_conversation_key(modus: NonceModus) -> ConversationKey {
    let mut iv = [0u8; IV_LAENGE];
    OsRng.fill_bytes(&mut iv);
    let mut key_bytes = vec![0u8; SCHLUESSEL_LAENGE];
    OsRng.fill_bytes(&mut key_bytes);

    ConversationKey {
        iv: Iv { bytes: iv },
        key_bytes: SecretBytes::new(key_bytes),
        modus,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
