//! # fluester-crypto
//!
//! Schluesselverwaltung und Chiffren fuer Fluester. Einzige Stelle im
//! Workspace, die kryptografische Primitive direkt verwendet.
//!
//! ## Module
//! - `e2e` - Schluesselaustausch, Key Manager, symmetrische Chiffre
//! - `identity` - X25519 Schluessel-Paar und Text-Kodierung
//! - `types` - Gemeinsame Typen (ConversationKey, PublicKey, SecretBytes)
//! - `error` - Fehlertypen

pub mod e2e;
pub mod error;
pub mod identity;
pub mod types;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use identity::{export_public_key, import_public_key, Identity};
pub use types::{ConversationKey, Iv, NonceModus, PublicKey, SecretBytes};

pub use e2e::{
    decrypt_asymmetric, decrypt_symmetric, decrypt_text, encrypt_asymmetric, encrypt_symmetric,
    encrypt_text, KeyManager,
};
