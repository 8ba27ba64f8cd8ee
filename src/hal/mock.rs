//! In-process board double for tests and demos.
//!
//! Records every command, lets callers inject pin and lifecycle events, and
//! can be told to fail writes to exercise dispatch-error isolation. Compiled
//! unconditionally: demos run on it too.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{BoardDriver, BoardError, BoardEvent, Pin, PinEvent, PinMode, PinRequest};

/// Everything a [`MockBoard`] was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BoardCommand {
    Digital { pin: Pin, level: bool },
    Pwm { pin: Pin, level: u8 },
    Servo { pin: Pin, degrees: f64 },
    Tone { pin: Pin, frequency: f64, duration: Duration },
    Matrix { device: u8, rows: [u8; 8] },
}

#[derive(Clone)]
pub struct MockBoard {
    commands: Arc<Mutex<Vec<BoardCommand>>>,
    watches: Arc<Mutex<Vec<PinRequest>>>,
    write_failure: Arc<Mutex<Option<BoardError>>>,
    watch_failure: Arc<Mutex<Option<BoardError>>>,
    events_tx: flume::Sender<BoardEvent>,
    events_rx: flume::Receiver<BoardEvent>,
}

impl MockBoard {
    pub fn new() -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        Self {
            commands: Arc::new(Mutex::new(Vec::new())),
            watches: Arc::new(Mutex::new(Vec::new())),
            write_failure: Arc::new(Mutex::new(None)),
            watch_failure: Arc::new(Mutex::new(None)),
            events_tx,
            events_rx,
        }
    }

    /// Snapshot of every recorded command, oldest first.
    pub fn commands(&self) -> Vec<BoardCommand> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Active watch registrations.
    pub fn watched(&self) -> Vec<PinRequest> {
        self.watches.lock().map(|w| w.clone()).unwrap_or_default()
    }

    pub fn clear_commands(&self) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.clear();
        }
    }

    /// Make every subsequent write fail with `failure`; `None` restores
    /// normal behavior.
    pub fn fail_writes(&self, failure: Option<BoardError>) {
        if let Ok(mut slot) = self.write_failure.lock() {
            *slot = failure;
        }
    }

    /// Same, for watch registrations.
    pub fn fail_watches(&self, failure: Option<BoardError>) {
        if let Ok(mut slot) = self.watch_failure.lock() {
            *slot = failure;
        }
    }

    /// Inject a raw driver event.
    pub fn inject(&self, event: BoardEvent) {
        let _ = self.events_tx.send(event);
    }

    /// Digital transition on `pin`.
    pub fn inject_digital(&self, pin: Pin, level: bool) {
        self.inject(BoardEvent::Pin {
            pin,
            event: PinEvent::Digital { level },
        });
    }

    /// Analog reading on `pin`.
    pub fn inject_analog(&self, pin: Pin, level: u16) {
        self.inject(BoardEvent::Pin {
            pin,
            event: PinEvent::Analog { level },
        });
    }

    pub fn inject_hold(&self, pin: Pin) {
        self.inject(BoardEvent::Pin {
            pin,
            event: PinEvent::Hold,
        });
    }

    pub fn inject_move_complete(&self, pin: Pin) {
        self.inject(BoardEvent::Pin {
            pin,
            event: PinEvent::MoveComplete,
        });
    }

    pub fn announce_ready(&self) {
        self.inject(BoardEvent::Ready);
    }

    fn record(&self, command: BoardCommand) -> Result<(), BoardError> {
        if let Ok(slot) = self.write_failure.lock()
            && let Some(failure) = slot.clone()
        {
            return Err(failure);
        }
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        Ok(())
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardDriver for MockBoard {
    fn digital_write(&self, pin: Pin, level: bool) -> Result<(), BoardError> {
        self.record(BoardCommand::Digital { pin, level })
    }

    fn pwm_write(&self, pin: Pin, level: u8) -> Result<(), BoardError> {
        self.record(BoardCommand::Pwm { pin, level })
    }

    fn servo_write(&self, pin: Pin, degrees: f64) -> Result<(), BoardError> {
        self.record(BoardCommand::Servo { pin, degrees })
    }

    fn tone(&self, pin: Pin, frequency: f64, duration: Duration) -> Result<(), BoardError> {
        self.record(BoardCommand::Tone {
            pin,
            frequency,
            duration,
        })
    }

    fn draw_matrix(&self, device: u8, rows: [u8; 8]) -> Result<(), BoardError> {
        self.record(BoardCommand::Matrix { device, rows })
    }

    fn watch(&self, pin: Pin, mode: PinMode) -> Result<(), BoardError> {
        if let Ok(slot) = self.watch_failure.lock()
            && let Some(failure) = slot.clone()
        {
            return Err(failure);
        }
        if let Ok(mut watches) = self.watches.lock() {
            watches.push(PinRequest::new(pin, mode));
        }
        Ok(())
    }

    fn clear_watches(&self) {
        if let Ok(mut watches) = self.watches.lock() {
            watches.clear();
        }
    }

    fn events(&self) -> flume::Receiver<BoardEvent> {
        self.events_rx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_commands_in_order() {
        let board = MockBoard::new();
        board.digital_write(13, true).unwrap();
        board.pwm_write(9, 128).unwrap();
        assert_eq!(
            board.commands(),
            vec![
                BoardCommand::Digital { pin: 13, level: true },
                BoardCommand::Pwm { pin: 9, level: 128 },
            ]
        );
    }

    #[test]
    fn injected_events_reach_the_stream() {
        let board = MockBoard::new();
        let events = board.events();
        board.inject_digital(2, true);
        assert_eq!(
            events.recv().unwrap(),
            BoardEvent::Pin {
                pin: 2,
                event: PinEvent::Digital { level: true }
            }
        );
    }

    #[test]
    fn write_failure_is_injectable_and_reversible() {
        let board = MockBoard::new();
        board.fail_writes(Some(BoardError::Disconnected));
        assert_eq!(
            board.digital_write(13, true),
            Err(BoardError::Disconnected)
        );
        board.fail_writes(None);
        assert!(board.digital_write(13, true).is_ok());
        assert_eq!(board.commands().len(), 1);
    }

    #[test]
    fn watches_accumulate_until_cleared() {
        let board = MockBoard::new();
        board.watch(2, PinMode::Digital).unwrap();
        board.watch(14, PinMode::Analog).unwrap();
        assert_eq!(board.watched().len(), 2);
        board.clear_watches();
        assert!(board.watched().is_empty());
    }
}
