//! Worker lifecycle plumbing shared by both programs.
//!
//! - `handshake`: the acknowledged quit rendezvous between an orchestrator
//!   and one worker task.
//! - `signals`: process-wide interrupt registration.

pub mod handshake;
pub mod signals;

pub use handshake::{Ack, QuitHandle, QuitSignal, handshake};
pub use signals::Interrupts;
