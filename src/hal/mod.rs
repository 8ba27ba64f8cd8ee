//! Hardware abstraction boundary.
//!
//! The runtime never speaks wire-level Firmata; it drives a [`BoardDriver`]
//! exposing logical pin primitives and consumes the driver's event stream
//! (pin readings plus board lifecycle). The driver behind the trait may be a
//! serial Firmata transport, a network tunnel, or the in-process
//! [`mock::MockBoard`] used by tests and demos.
//!
//! One board handle exists per physical connection. The runtime owns it;
//! hardware-bound components share it read-only and never close it.

pub mod mock;

pub use mock::{BoardCommand, MockBoard};

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

/// Logical pin number. Analog pins are addressed by their analog index.
pub type Pin = u16;

/// What kind of reporting a component wants from a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinMode {
    /// Digital transitions (button, switch) plus driver-computed holds.
    Digital,
    /// Periodic analog readings.
    Analog,
    /// Servo movement completion notices.
    Servo,
}

/// A watch registration: pin plus desired reporting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinRequest {
    pub pin: Pin,
    pub mode: PinMode,
}

impl PinRequest {
    pub fn new(pin: Pin, mode: PinMode) -> Self {
        Self { pin, mode }
    }
}

/// One reading or notification for a watched pin.
#[derive(Debug, Clone, PartialEq)]
pub enum PinEvent {
    /// Digital level transition. `true` is the active level.
    Digital { level: bool },
    /// Analog reading, 10-bit range on common boards.
    Analog { level: u16 },
    /// The driver decided the active level was held long enough.
    Hold,
    /// A commanded servo movement finished.
    MoveComplete,
}

/// Everything the driver pushes at the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardEvent {
    Pin { pin: Pin, event: PinEvent },
    Ready,
    Error { message: String },
    Close,
    Exit,
}

/// Failures at the board boundary. Dispatch-isolated: a failing write is a
/// logged per-edge error, never a runtime stop.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum BoardError {
    #[error("pin {pin} does not support {wanted}")]
    #[diagnostic(
        code(breadboard::board::unsupported_pin),
        help("check the node's pin assignment against the board's capabilities")
    )]
    Unsupported { pin: Pin, wanted: &'static str },

    #[error("board connection lost")]
    #[diagnostic(code(breadboard::board::disconnected))]
    Disconnected,

    #[error("board i/o failure: {message}")]
    #[diagnostic(code(breadboard::board::io))]
    Io { message: String },
}

/// Logical pin primitives plus the driver event stream.
///
/// Commands are synchronous from the runtime's point of view; a real driver
/// queues them onto its transport. Watches are additive until
/// [`clear_watches`](BoardDriver::clear_watches), which the runtime calls on
/// every graph teardown.
pub trait BoardDriver: Send + Sync {
    fn digital_write(&self, pin: Pin, level: bool) -> Result<(), BoardError>;

    /// PWM duty, 0–255.
    fn pwm_write(&self, pin: Pin, level: u8) -> Result<(), BoardError>;

    /// Servo position in degrees, 0–180.
    fn servo_write(&self, pin: Pin, degrees: f64) -> Result<(), BoardError>;

    /// Square wave on a piezo pin for `duration`.
    fn tone(&self, pin: Pin, frequency: f64, duration: Duration) -> Result<(), BoardError>;

    /// Push an 8x8 frame to an attached LED matrix device.
    fn draw_matrix(&self, device: u8, rows: [u8; 8]) -> Result<(), BoardError>;

    /// Start reporting events for a pin in the given mode.
    fn watch(&self, pin: Pin, mode: PinMode) -> Result<(), BoardError>;

    /// Drop every watch registration. Called on graph teardown.
    fn clear_watches(&self);

    /// The driver's event stream. Receivers are clones of one underlying
    /// channel; the runtime pumps this into its envelope queue.
    fn events(&self) -> flume::Receiver<BoardEvent>;
}
