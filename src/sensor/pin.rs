use crate::utils::Result;

/// Level read from a digital input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// Line is high: the PIR sensor sees motion.
    Active,
    Inactive,
}

/// Exclusive access to one digital input line.
///
/// Calls are short and synchronous; the detector issues them from its own
/// task, one per poll tick.
pub trait PinDriver: Send + 'static {
    /// Acquires the underlying GPIO resource.
    fn open(&mut self) -> Result<()>;

    /// Selects `pin` and sets it up as an input.
    fn configure_as_input(&mut self, pin: u8) -> Result<()>;

    fn read_state(&mut self) -> Result<PinState>;

    /// Releases the resource. Safe to call more than once.
    fn close(&mut self);
}
