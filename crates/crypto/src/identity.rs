//! Prozessweites Schluessel-Paar (X25519)
//!
//! Wird einmal beim Start erzeugt und nur zum Ein-/Auswickeln von
//! Gespraechsschluesseln verwendet. Der private Teil verlaesst den
//! Prozess nie.
//!
//! ## Text-Kodierung des oeffentlichen Schluessels
//! ```text
//! -----BEGIN FLUESTER PUBLIC KEY-----
//! <Base64 der 32 Bytes>
//! -----END FLUESTER PUBLIC KEY-----
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};
use rand_core::{OsRng, RngCore};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::error::{CryptoError, CryptoResult};
use crate::types::{PublicKey, PUBLIC_KEY_LAENGE};

const KOPF: &str = "-----BEGIN FLUESTER PUBLIC KEY-----";
const FUSS: &str = "-----END FLUESTER PUBLIC KEY-----";

/// Lokales Schluessel-Paar
pub struct Identity {
    secret: StaticSecret,
    public_key: PublicKey,
}

impl Identity {
    /// Generiert ein neues X25519-Schluessel-Paar aus dem OS-Zufall
    pub fn generate() -> CryptoResult<Self> {
        let mut bytes = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| CryptoError::SchluesselGenerierung(e.to_string()))?;
        let secret = StaticSecret::from(bytes);
        bytes.iter_mut().for_each(|b| *b = 0);

        let public_key = PublicKey::new(X25519PublicKey::from(&secret).to_bytes());
        Ok(Self { secret, public_key })
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.secret
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Identity {{ public_key: [X25519 PublicKey] }}")
    }
}

/// Kodiert einen oeffentlichen Schluessel als ASCII-Text mit Begrenzern
pub fn export_public_key(key: &PublicKey) -> String {
    format!("{KOPF}\n{}\n{FUSS}", STANDARD.encode(key.as_bytes()))
}

/// Exakte Umkehrung von [`export_public_key`]
pub fn import_public_key(text: &str) -> CryptoResult<PublicKey> {
    let inhalt = text
        .trim()
        .strip_prefix(KOPF)
        .ok_or_else(|| CryptoError::SchluesselFormat("Kopfzeile fehlt".to_string()))?
        .strip_suffix(FUSS)
        .ok_or_else(|| CryptoError::SchluesselFormat("Fusszeile fehlt".to_string()))?;

    // Zeilenumbrueche im Base64-Block sind erlaubt
    let base64: String = inhalt.split_whitespace().collect();
    let bytes = STANDARD
        .decode(base64)
        .map_err(|e| CryptoError::SchluesselFormat(format!("Base64: {e}")))?;

    let bytes: [u8; PUBLIC_KEY_LAENGE] =
        bytes
            .as_slice()
            .try_into()
            .map_err(|_| CryptoError::UngueltigeSchluesselLaenge {
                erwartet: PUBLIC_KEY_LAENGE,
                erhalten: bytes.len(),
            })?;
    Ok(PublicKey::new(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_generieren() {
        let a = Identity::generate().unwrap();
        let b = Identity::generate().unwrap();
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn export_import_roundtrip() {
        let identity = Identity::generate().unwrap();
        let text = export_public_key(&identity.public_key());

        assert!(text.starts_with(KOPF));
        assert!(text.ends_with(FUSS));
        assert!(text.is_ascii());

        let importiert = import_public_key(&text).unwrap();
        assert_eq!(importiert.as_bytes(), identity.public_key().as_bytes());
    }

    #[test]
    fn export_ist_stabil() {
        let key = PublicKey::new([7u8; 32]);
        assert_eq!(export_public_key(&key), export_public_key(&key));
    }

    #[test]
    fn umgebrochener_base64_block_wird_akzeptiert() {
        let key = PublicKey::new([9u8; 32]);
        let b64 = STANDARD.encode(key.as_bytes());
        let (a, b) = b64.split_at(20);
        let text = format!("  {KOPF}\n{a}\n{b}\n{FUSS}\n");
        assert_eq!(import_public_key(&text).unwrap(), key);
    }

    #[test]
    fn fehlende_begrenzer_abgelehnt() {
        let b64 = STANDARD.encode([1u8; 32]);
        let ohne_kopf = format!("{b64}\n{FUSS}");
        let ohne_fuss = format!("{KOPF}\n{b64}");

        assert!(matches!(
            import_public_key(&ohne_kopf),
            Err(CryptoError::SchluesselFormat(_))
        ));
        assert!(matches!(
            import_public_key(&ohne_fuss),
            Err(CryptoError::SchluesselFormat(_))
        ));
    }

    #[test]
    fn ungueltiges_base64_abgelehnt() {
        let text = format!("{KOPF}\n***kein base64***\n{FUSS}");
        let err = import_public_key(&text).unwrap_err();
        assert!(err.ist_parse_fehler());
    }

    #[test]
    fn falsche_laenge_abgelehnt() {
        let text = format!("{KOPF}\n{}\n{FUSS}", STANDARD.encode([1u8; 16]));
        assert!(matches!(
            import_public_key(&text),
            Err(CryptoError::UngueltigeSchluesselLaenge { erwartet: 32, erhalten: 16 })
        ));
    }
}
