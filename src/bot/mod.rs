//! # Conversation bot
//!
//! Multi-turn encode/decode flows over an abstract delivery transport.
//!
//! The transport turns incoming messages into [`Inbound`] events and sends
//! back whatever [`Outbound`] events [`Orchestrator::handle`] returns.
//!
//! ## Guarantees
//!
//! - **Per-session ordering**: one session's events are handled one at a time
//! - **Isolation**: sessions never read or write each other's buffers
//! - **Ephemeral**: buffers are zeroized on reset; nothing touches disk
//! - **No oracle**: wrong password and missing payload get the same reply

mod error;
mod event;
mod orchestrator;
mod pipeline;
mod session;

pub use error::PipelineError;
pub use event::{Command, Inbound, InboundKind, Outbound, Reply, SecretText, SessionId, Upload};
pub use orchestrator::{Orchestrator, MAX_UPLOAD_BYTES};
pub use pipeline::{open_from_png, seal_into_cover, STEGO_FILE_NAME};
pub use session::{Session, SessionTable, Stage};
