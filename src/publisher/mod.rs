//! The publisher program: motion events from a GPIO line to an MQTT topic.
//!
//! ```text
//! Detector ──► MessageSink ══[queue]══► MessageSource ──► Publish worker ──► broker
//!     ▲                                                          ▲
//!     └──────────── QuitHandle ── orchestrator ── QuitHandle ─────┘
//! ```
//!
//! - `message`: the immutable event carried through the queue
//! - `queue`: bounded FIFO between detector and publish worker
//! - `connection`: connection manager owning the publish worker
//! - `detector`: GPIO polling worker
//! - `orchestrator`: startup, interrupt wait and acknowledged teardown

pub mod connection;
pub mod detector;
pub mod message;
pub mod orchestrator;
pub mod queue;

pub use connection::connect;
pub use detector::{Detection, detect};
pub use message::EventMessage;
pub use orchestrator::{Stage, run_publisher};
pub use queue::{MessageSink, MessageSource, QUEUE_CAPACITY};
