//! Asymmetrisches Ein-/Auswickeln von Gespraechsschluesseln
//!
//! Nutzt ein ECIES-aehnliches Schema:
//! 1. Ephemeres X25519-Schluessel-Paar generieren
//! 2. DH mit Empfaenger-Public-Key
//! 3. HKDF-SHA256 -> Wrapping Key
//! 4. AES-256-GCM verschluesseln
//!
//! ## Format
//! ```text
//! [ephemeral_public(32)] [nonce(12)] [ciphertext + auth_tag(16)]
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use hkdf::Hkdf;
use rand_core::{OsRng, RngCore};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};

use crate::error::{CryptoError, CryptoResult};
use crate::identity::Identity;
use crate::types::{PublicKey, IV_LAENGE, PUBLIC_KEY_LAENGE};

const WRAP_INFO: &[u8] = b"fluester-key-wrap-v1";
const MIN_LAENGE: usize = PUBLIC_KEY_LAENGE + IV_LAENGE + 16;

/// Verschluesselt kleine Payloads (Schluesselmaterial) fuer einen Empfaenger
pub fn encrypt_asymmetric(recipient: &PublicKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    // Ephemeres Schluessel-Paar
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral_secret);

    // DH-Austausch
    let recipient_pk = X25519PublicKey::from(*recipient.as_bytes());
    let dh_output = ephemeral_secret.diffie_hellman(&recipient_pk);

    let wrapping_key = hkdf_derive(dh_output.as_bytes(), recipient.as_bytes(), WRAP_INFO, 32)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrapping_key));

    let mut nonce_bytes = [0u8; IV_LAENGE];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    let mut out = Vec::with_capacity(PUBLIC_KEY_LAENGE + IV_LAENGE + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Entschluesselt einen eingewickelten Payload mit dem lokalen privaten Schluessel
pub fn decrypt_asymmetric(identity: &Identity, wrapped: &[u8]) -> CryptoResult<Vec<u8>> {
    if wrapped.len() < MIN_LAENGE {
        return Err(CryptoError::UngueltigeDaten(
            "Zu kurzer wrapped key".to_string(),
        ));
    }

    let (ephemeral_pub_bytes, rest) = wrapped.split_at(PUBLIC_KEY_LAENGE);
    let (nonce_bytes, ciphertext) = rest.split_at(IV_LAENGE);

    let mut ephemeral = [0u8; PUBLIC_KEY_LAENGE];
    ephemeral.copy_from_slice(ephemeral_pub_bytes);

    // DH mit dem empfaengerseitigen privaten Schluessel
    let dh_output = identity
        .secret()
        .diffie_hellman(&X25519PublicKey::from(ephemeral));

    let wrapping_key = hkdf_derive(
        dh_output.as_bytes(),
        identity.public_key().as_bytes(),
        WRAP_INFO,
        32,
    )?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&wrapping_key));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| CryptoError::Entschluesselung(e.to_string()))
}

/// HKDF-basierte Key Derivation
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_und_unwrap_roundtrip() {
        let empfaenger = Identity::generate().unwrap();
        let payload = [42u8; 44];

        let wrapped = encrypt_asymmetric(&empfaenger.public_key(), &payload).unwrap();
        assert_eq!(wrapped.len(), 32 + 12 + 44 + 16);

        let unwrapped = decrypt_asymmetric(&empfaenger, &wrapped).unwrap();
        assert_eq!(unwrapped, payload);
    }

    #[test]
    fn jeder_wrap_ist_verschieden() {
        let empfaenger = Identity::generate().unwrap();
        let a = encrypt_asymmetric(&empfaenger.public_key(), b"key").unwrap();
        let b = encrypt_asymmetric(&empfaenger.public_key(), b"key").unwrap();
        // Ephemerer Schluessel und Nonce unterscheiden sich
        assert_ne!(a, b);
    }

    #[test]
    fn falscher_private_key_schlaegt_fehl() {
        let empfaenger = Identity::generate().unwrap();
        let fremder = Identity::generate().unwrap();

        let wrapped = encrypt_asymmetric(&empfaenger.public_key(), b"geheim").unwrap();
        assert!(matches!(
            decrypt_asymmetric(&fremder, &wrapped),
            Err(CryptoError::Entschluesselung(_))
        ));
    }

    #[test]
    fn zu_kurzer_wrapped_key_schlaegt_fehl() {
        let empfaenger = Identity::generate().unwrap();
        assert!(matches!(
            decrypt_asymmetric(&empfaenger, &[0u8; 10]),
            Err(CryptoError::UngueltigeDaten(_))
        ));
    }

    #[test]
    fn hkdf_derive_deterministisch() {
        let key1 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        let key2 = hkdf_derive(b"ikm", b"salt", b"info", 32).unwrap();
        assert_eq!(key1, key2);
        assert_ne!(key1, hkdf_derive(b"ikm", b"salt", b"info-2", 32).unwrap());
    }
}
