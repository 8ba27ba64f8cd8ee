//! Output hardware kinds: LED, servo, relay, piezo, LED matrix. Every
//! action drives the board first and then updates the node's value, so a
//! board refusal (wrong pin mode, disconnect) surfaces as a dispatch error
//! without a phantom value change.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::MissedTickBehavior;

use super::coerce_number;
use crate::component::{
    BuildError, Component, ComponentError, ComponentSeed, TaskGuard, ValueCell,
};
use crate::hal::{BoardDriver, Pin, PinEvent, PinMode, PinRequest};
use crate::value::Value;

// =============================================================================
// Led
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedConfig {
    pub pin: Pin,
}

/// Single LED. `on`/`off`/`toggle` drive the pin digitally, `brightness`
/// switches to PWM, and `strobe` blinks on an owned timer task until `stop`
/// or `off`.
pub struct Led {
    cell: ValueCell,
    board: Arc<dyn BoardDriver>,
    pin: Pin,
    strobe: Option<TaskGuard>,
}

impl Led {
    pub const KIND: &'static str = "led";

    const DEFAULT_STROBE_MS: u64 = 100;

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: LedConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Bool(false)),
            board: Arc::clone(&seed.env.board),
            pin: config.pin,
            strobe: None,
        })
    }

    fn write(&mut self, lit: bool) -> Result<(), ComponentError> {
        self.board.digital_write(self.pin, lit)?;
        self.cell.set(Value::Bool(lit));
        Ok(())
    }

    fn start_strobe(&mut self, period: Duration) {
        let board = Arc::clone(&self.board);
        let pin = self.pin;
        self.strobe = Some(TaskGuard::spawn(async move {
            let mut lit = false;
            let mut ticks = tokio::time::interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                lit = !lit;
                if board.digital_write(pin, lit).is_err() {
                    break;
                }
            }
        }));
        // The value reports the strobe, not each blink.
        self.cell.set(Value::Bool(true));
    }
}

impl Component for Led {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, action: &str, payload: Value) -> Result<bool, ComponentError> {
        match action {
            "on" => {
                self.strobe = None;
                self.write(true)?;
            }
            "off" => {
                self.strobe = None;
                self.write(false)?;
            }
            "toggle" => {
                self.strobe = None;
                let lit = self.cell.get().truthy();
                self.write(!lit)?;
            }
            "brightness" => {
                if let Some(level) = coerce_number(&self.cell, &payload) {
                    let level = level.clamp(0.0, 255.0).round();
                    self.board.pwm_write(self.pin, level as u8)?;
                    self.cell.set(Value::Number(level));
                }
            }
            "strobe" => {
                let period = match &payload {
                    Value::Null => Some(Self::DEFAULT_STROBE_MS as f64),
                    other => coerce_number(&self.cell, other),
                };
                if let Some(ms) = period {
                    self.start_strobe(Duration::from_millis(ms.max(1.0) as u64));
                }
            }
            "stop" => self.strobe = None,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn teardown(&mut self) {
        self.strobe = None;
        let _ = self.board.digital_write(self.pin, false);
    }
}

// =============================================================================
// Servo
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServoConfig {
    pub pin: Pin,
    #[serde(default)]
    pub min: f64,
    #[serde(default = "ServoConfig::default_max")]
    pub max: f64,
}

impl ServoConfig {
    fn default_max() -> f64 {
        180.0
    }
}

/// Positional servo. `to` clamps into the configured degree range; the
/// driver's movement-complete notice posts `"move:complete"`.
pub struct Servo {
    cell: ValueCell,
    board: Arc<dyn BoardDriver>,
    pin: Pin,
    min: f64,
    max: f64,
}

impl Servo {
    pub const KIND: &'static str = "servo";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: ServoConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Number(config.min)),
            board: Arc::clone(&seed.env.board),
            pin: config.pin,
            min: config.min,
            max: config.max,
        })
    }

    fn move_to(&mut self, degrees: f64) -> Result<(), ComponentError> {
        let degrees = degrees.clamp(self.min, self.max);
        self.board.servo_write(self.pin, degrees)?;
        self.cell.set(Value::Number(degrees));
        Ok(())
    }
}

impl Component for Servo {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, action: &str, payload: Value) -> Result<bool, ComponentError> {
        match action {
            "to" => {
                if let Some(degrees) = coerce_number(&self.cell, &payload) {
                    self.move_to(degrees)?;
                }
            }
            "min" => self.move_to(self.min)?,
            "max" => self.move_to(self.max)?,
            "center" => self.move_to((self.min + self.max) / 2.0)?,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn pin_event(&mut self, event: &PinEvent) {
        if matches!(event, PinEvent::MoveComplete) {
            self.cell.post("move:complete", self.cell.get().clone());
        }
    }

    fn watched_pins(&self) -> Vec<PinRequest> {
        vec![PinRequest::new(self.pin, PinMode::Servo)]
    }
}

// =============================================================================
// Relay
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    pub pin: Pin,
}

/// Relay. Value `true` means energized (closed); released on teardown so a
/// rebuilt graph never inherits a live load.
pub struct Relay {
    cell: ValueCell,
    board: Arc<dyn BoardDriver>,
    pin: Pin,
}

impl Relay {
    pub const KIND: &'static str = "relay";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: RelayConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Bool(false)),
            board: Arc::clone(&seed.env.board),
            pin: config.pin,
        })
    }

    fn energize(&mut self, closed: bool) -> Result<(), ComponentError> {
        self.board.digital_write(self.pin, closed)?;
        self.cell.set(Value::Bool(closed));
        Ok(())
    }
}

impl Component for Relay {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, action: &str, _payload: Value) -> Result<bool, ComponentError> {
        match action {
            "close" => self.energize(true)?,
            "open" => self.energize(false)?,
            "toggle" => {
                let closed = self.cell.get().truthy();
                self.energize(!closed)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn teardown(&mut self) {
        let _ = self.board.digital_write(self.pin, false);
    }
}

// =============================================================================
// Piezo
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PiezoConfig {
    pub pin: Pin,
    #[serde(default = "PiezoConfig::default_frequency")]
    pub frequency: f64,
    /// Default note length in milliseconds.
    #[serde(default = "PiezoConfig::default_duration")]
    pub duration: u64,
}

impl PiezoConfig {
    fn default_frequency() -> f64 {
        440.0
    }

    fn default_duration() -> u64 {
        250
    }
}

/// Piezo buzzer. `buzz` plays one tone (payload overrides the configured
/// frequency); `play` takes a melody of space-separated `freq:ms` notes
/// (`0` frequency is a rest, bare `freq` uses the default length) on an
/// owned task. The value is the sounding frequency, `0` when silent.
pub struct Piezo {
    cell: ValueCell,
    board: Arc<dyn BoardDriver>,
    pin: Pin,
    frequency: f64,
    duration: u64,
    playing: Option<TaskGuard>,
}

impl Piezo {
    pub const KIND: &'static str = "piezo";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: PiezoConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Number(0.0)),
            board: Arc::clone(&seed.env.board),
            pin: config.pin,
            frequency: config.frequency,
            duration: config.duration,
            playing: None,
        })
    }

    fn parse_melody(&self, text: &str) -> Result<Vec<(f64, u64)>, String> {
        let mut notes = Vec::new();
        for token in text.split_whitespace() {
            let (freq, ms) = match token.split_once(':') {
                Some((freq, ms)) => (freq, Some(ms)),
                None => (token, None),
            };
            let freq: f64 = freq
                .parse()
                .map_err(|_| format!("bad melody note {token:?}: frequency must be a number"))?;
            let ms = match ms {
                Some(ms) => ms
                    .parse()
                    .map_err(|_| format!("bad melody note {token:?}: duration must be integer milliseconds"))?,
                None => self.duration,
            };
            notes.push((freq, ms));
        }
        Ok(notes)
    }

    fn buzz(&mut self, frequency: f64) -> Result<(), ComponentError> {
        let duration = Duration::from_millis(self.duration);
        self.board.tone(self.pin, frequency, duration)?;
        self.cell.set(Value::Number(frequency));
        self.playing = Some(TaskGuard::once(
            self.cell.emitter().clone(),
            self.cell.id().to_string(),
            duration,
        ));
        Ok(())
    }

    fn play(&mut self, notes: Vec<(f64, u64)>) {
        let Some(first) = notes.first() else {
            return;
        };
        self.cell.set(Value::Number(first.0));

        let board = Arc::clone(&self.board);
        let pin = self.pin;
        let emitter = self.cell.emitter().clone();
        let node = self.cell.id().to_string();
        self.playing = Some(TaskGuard::spawn(async move {
            for (freq, ms) in notes {
                let length = Duration::from_millis(ms);
                if freq > 0.0 && board.tone(pin, freq, length).is_err() {
                    break;
                }
                tokio::time::sleep(length).await;
            }
            let _ = emitter.timer(&node);
        }));
    }
}

impl Component for Piezo {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, action: &str, payload: Value) -> Result<bool, ComponentError> {
        match action {
            "buzz" => {
                let frequency = match &payload {
                    Value::Null => Some(self.frequency),
                    other => coerce_number(&self.cell, other),
                };
                if let Some(frequency) = frequency {
                    self.buzz(frequency)?;
                }
            }
            "play" => match self.parse_melody(&payload.render()) {
                Ok(notes) => self.play(notes),
                Err(message) => self.cell.report(message),
            },
            "stop" => {
                self.playing = None;
                self.cell.set(Value::Number(0.0));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn timer_fired(&mut self) {
        self.playing = None;
        self.cell.set(Value::Number(0.0));
    }

    fn teardown(&mut self) {
        self.playing = None;
    }
}

// =============================================================================
// Matrix
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatrixConfig {
    /// Daisy-chain position of the display.
    pub device: u8,
}

/// 8x8 LED matrix. `draw` takes a list of up to eight row bitmasks
/// (missing rows are blank); `clear` blanks the display.
pub struct Matrix {
    cell: ValueCell,
    board: Arc<dyn BoardDriver>,
    device: u8,
}

impl Matrix {
    pub const KIND: &'static str = "matrix";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: MatrixConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::List(Vec::new())),
            board: Arc::clone(&seed.env.board),
            device: config.device,
        })
    }

    fn frame_from(&self, payload: &Value) -> Option<[u8; 8]> {
        let Value::List(items) = payload else {
            self.cell
                .report(format!("matrix frame must be a list of rows, got {payload}"));
            return None;
        };
        if items.len() > 8 {
            self.cell
                .report(format!("matrix frame has {} rows, at most 8 fit", items.len()));
            return None;
        }
        let mut rows = [0u8; 8];
        for (i, item) in items.iter().enumerate() {
            let level = coerce_number(&self.cell, item)?;
            rows[i] = level.clamp(0.0, 255.0) as u8;
        }
        Some(rows)
    }
}

impl Component for Matrix {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, action: &str, payload: Value) -> Result<bool, ComponentError> {
        match action {
            "draw" => {
                if let Some(rows) = self.frame_from(&payload) {
                    self.board.draw_matrix(self.device, rows)?;
                    self.cell.set(payload);
                }
            }
            "clear" => {
                self.board.draw_matrix(self.device, [0u8; 8])?;
                self.cell.set(Value::List(Vec::new()));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn teardown(&mut self) {
        let _ = self.board.draw_matrix(self.device, [0u8; 8]);
    }
}
