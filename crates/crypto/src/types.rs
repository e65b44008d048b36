//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use serde::{Deserialize, Serialize};

/// Laenge des symmetrischen Schluessels (AES-256)
pub const SCHLUESSEL_LAENGE: usize = 32;
/// Laenge von IV bzw. Nonce (AES-GCM)
pub const IV_LAENGE: usize = 12;
/// Laenge eines X25519-Schluessels
pub const PUBLIC_KEY_LAENGE: usize = 32;

/// Oeffentlicher X25519-Schluessel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    pub bytes: [u8; PUBLIC_KEY_LAENGE],
}

impl PublicKey {
    pub fn new(bytes: [u8; PUBLIC_KEY_LAENGE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LAENGE] {
        &self.bytes
    }
}

/// Initialisierungsvektor eines Gespraechsschluessels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv {
    pub bytes: [u8; IV_LAENGE],
}

impl Iv {
    pub fn as_bytes(&self) -> &[u8; IV_LAENGE] {
        &self.bytes
    }
}

/// Nonce-Verwendung beim symmetrischen Verschluesseln
///
/// Beide Peers muessen denselben Modus verwenden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonceModus {
    /// Frische Zufalls-Nonce pro Nachricht, dem Ciphertext vorangestellt
    #[default]
    ProNachricht,
    /// Ein IV fuer das ganze Gespraech (kompatibel zu aelteren Clients, schwach)
    Fest,
}

/// Symmetrischer Schluessel eines Gespraechs (IV + AES-256-Schluessel)
#[derive(Debug, Clone)]
pub struct ConversationKey {
    pub iv: Iv,
    pub key_bytes: SecretBytes,
    pub modus: NonceModus,
}

impl ConversationKey {
    /// Serialisiert zu Bytes: [iv(12)] + [key(32)]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(IV_LAENGE + SCHLUESSEL_LAENGE);
        out.extend_from_slice(&self.iv.bytes);
        out.extend_from_slice(self.key_bytes.as_bytes());
        out
    }

    /// Deserialisiert aus Bytes
    pub fn from_bytes(bytes: &[u8], modus: NonceModus) -> Option<Self> {
        if bytes.len() != IV_LAENGE + SCHLUESSEL_LAENGE {
            return None;
        }
        let mut iv = [0u8; IV_LAENGE];
        iv.copy_from_slice(&bytes[..IV_LAENGE]);
        Some(Self {
            iv: Iv { bytes: iv },
            key_bytes: SecretBytes::new(bytes[IV_LAENGE..].to_vec()),
            modus,
        })
    }
}

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(pub Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
