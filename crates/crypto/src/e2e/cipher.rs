//! Symmetrische Nachrichten-Verschluesselung (AES-256-GCM)
//!
//! ## Format je nach `NonceModus`
//! ```text
//! ProNachricht: [nonce(12)] [ciphertext + auth_tag(16)]
//! Fest:         [ciphertext + auth_tag(16)]   (Nonce = IV des Gespraechs)
//! ```
//!
//! Im Envelope wird der Ciphertext als Standard-Base64 transportiert.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand_core::{OsRng, RngCore};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{ConversationKey, NonceModus, IV_LAENGE, SCHLUESSEL_LAENGE};

/// Verschluesselt Klartext-Bytes mit dem Gespraechsschluessel
pub fn encrypt_symmetric(key: &ConversationKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = cipher_fuer(key)?;

    match key.modus {
        NonceModus::ProNachricht => {
            let mut nonce_bytes = [0u8; IV_LAENGE];
            OsRng.fill_bytes(&mut nonce_bytes);
            let ciphertext = cipher
                .encrypt(AesNonce::from_slice(&nonce_bytes), plaintext)
                .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

            let mut out = Vec::with_capacity(IV_LAENGE + ciphertext.len());
            out.extend_from_slice(&nonce_bytes);
            out.extend_from_slice(&ciphertext);
            Ok(out)
        }
        NonceModus::Fest => cipher
            .encrypt(AesNonce::from_slice(key.iv.as_bytes()), plaintext)
            .map_err(|e| CryptoError::Verschluesselung(e.to_string())),
    }
}

/// Entschluesselt Ciphertext-Bytes mit dem Gespraechsschluessel
///
/// Manipulierte Daten oder ein falscher Schluessel ergeben
/// `CryptoError::Entschluesselung`.
pub fn decrypt_symmetric(key: &ConversationKey, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
    let cipher = cipher_fuer(key)?;

    let (nonce, daten) = match key.modus {
        NonceModus::ProNachricht => {
            if ciphertext.len() < IV_LAENGE {
                return Err(CryptoError::Entschluesselung(
                    "Ciphertext kuerzer als Nonce".to_string(),
                ));
            }
            let (nonce, rest) = ciphertext.split_at(IV_LAENGE);
            (AesNonce::from_slice(nonce), rest)
        }
        NonceModus::Fest => (AesNonce::from_slice(key.iv.as_bytes()), ciphertext),
    };

    cipher
        .decrypt(nonce, daten)
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

/// Verschluesselt Text und kodiert das Ergebnis als Base64 (Envelope-Body)
pub fn encrypt_text(key: &ConversationKey, text: &str) -> CryptoResult<String> {
    Ok(STANDARD.encode(encrypt_symmetric(key, text.as_bytes())?))
}

/// Umkehrung von [`encrypt_text`]
pub fn decrypt_text(key: &ConversationKey, body: &str) -> CryptoResult<String> {
    let bytes = STANDARD
        .decode(body)
        .map_err(|e| CryptoError::Entschluesselung(format!("Body ist kein Base64: {e}")))?;
    let klartext = decrypt_symmetric(key, &bytes)?;
    String::from_utf8(klartext)
        .map_err(|_| CryptoError::UngueltigeDaten("Klartext ist kein UTF-8".to_string()))
}

fn cipher_fuer(key: &ConversationKey) -> CryptoResult<Aes256Gcm> {
    let key_bytes = key.key_bytes.as_bytes();
    if key_bytes.len() != SCHLUESSEL_LAENGE {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: SCHLUESSEL_LAENGE,
            erhalten: key_bytes.len(),
        });
    }
    Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key_bytes)))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
