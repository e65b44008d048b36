//! E2E Verschluesselung (End-to-End)
//!
//! Peer <-> Peer Verschluesselung. Der Relay-Dienst sieht nur Envelopes
//! mit Ciphertext bzw. eingewickeltem Schluesselmaterial.
//!
//! ## Ablauf
//! 1. Jeder Peer hat ein X25519-Schluessel-Paar (`Identity`)
//! 2. Initiator sendet seinen oeffentlichen Schluessel (RSAKeyShare)
//! 3. Antwortender erzeugt IV + AES-256-Schluessel und wickelt sie ein (AESKeyShare)
//! 4. Nachrichten werden mit AES-256-GCM verschluesselt

pub mod cipher;
pub mod key_manager;
pub mod key_wrap;

pub use cipher::{decrypt_symmetric, decrypt_text, encrypt_symmetric, encrypt_text};
pub use key_manager::KeyManager;
pub use key_wrap::{decrypt_asymmetric, encrypt_asymmetric, hkdf_derive};
