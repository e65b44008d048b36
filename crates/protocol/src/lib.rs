//! fluester-protocol – Draht-Format
//!
//! Dieses Crate definiert das `Envelope`, die einzige Nachrichteneinheit
//! die zwischen zwei Peers ausgetauscht wird, samt JSON-Serialisierung.

pub mod envelope;
pub mod error;

pub use envelope::{zeit_jetzt, EffectCode, Envelope, EnvelopeEvent};
pub use error::{ProtocolError, ProtocolResult};
