//! The `sensor` module is the boundary to the motion sensor's GPIO line.
//!
//! The detector only talks to [`PinDriver`]; [`SysfsPin`] is the Linux
//! implementation.

pub mod pin;
pub mod sysfs;

pub use pin::{PinDriver, PinState};
pub use sysfs::SysfsPin;
