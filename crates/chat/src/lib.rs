//! fluester-chat – Gespraechs-Zustandsmaschine
//!
//! Dieses Crate implementiert:
//! - Sitzung: Schluesselaustausch, Empfang, Senden, Tippen, Zustellung,
//!   Bearbeiten und Antworten
//! - SitzungsLaeufer: ein Task pro Sitzung, Befehle per `SitzungsHandle`
//! - Transport-Trait + SpeicherHub (In-Process-Transport)
//! - Ansichts-Modell + Darstellung-Trait
//!
//! # Beispiel
//!
//! ```no_run
//! use std::sync::Arc;
//! use fluester_chat::{laeufer, KanalDarstellung, Sitzung, SitzungsConfig, SpeicherHub};
//! use fluester_core::PeerId;
//!
//! #[tokio::main]
//! async fn main() {
//!     let hub = SpeicherHub::neu();
//!     let (transport, ereignisse) = hub.registrieren(PeerId::new("alice"));
//!     let (darstellung, _aktionen) = KanalDarstellung::neu();
//!
//!     let sitzung = Sitzung::neu(
//!         Arc::new(transport),
//!         Box::new(darstellung),
//!         SitzungsConfig::default(),
//!     )
//!     .unwrap();
//!     let (handle, _task) = laeufer::starten(sitzung, ereignisse);
//!
//!     handle.gespraech_beginnen(PeerId::new("bob")).await.unwrap();
//! }
//! ```

pub mod ansicht;
pub mod config;
pub mod error;
pub mod gespraech;
pub mod laeufer;
pub mod session;
pub mod transport;

#[cfg(test)]
mod tests;

// Bequeme Re-Exporte
pub use ansicht::{
    AnsichtsAktion, Darstellung, GespraechsAnsicht, KanalDarstellung, Knoten, Marke,
    NachrichtenKnoten, Richtung,
};
pub use config::SitzungsConfig;
pub use error::{ChatError, ChatResult, TransportError, TransportResult};
pub use gespraech::{Cursor, Gespraech, SchluesselZustand, Ziel};
pub use laeufer::SitzungsHandle;
pub use session::Sitzung;
pub use transport::{SpeicherHub, SpeicherTransport, Transport, TransportEreignis, Verbindung};
