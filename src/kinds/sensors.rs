//! Input hardware kinds: button, analog sensor, switch. Each watches one
//! pin and translates driver events into value and signal updates; none of
//! them expose actions of their own.

use serde::Deserialize;

use crate::component::{BuildError, Component, ComponentError, ComponentSeed, ValueCell};
use crate::hal::{Pin, PinEvent, PinMode, PinRequest};
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinBinding {
    pub pin: Pin,
}

// =============================================================================
// Button
// =============================================================================

/// Momentary push button. Value is the pressed state; transitions post
/// `"down"`/`"up"`, and a driver-detected long press posts `"hold"`.
pub struct Button {
    cell: ValueCell,
    pin: Pin,
}

impl Button {
    pub const KIND: &'static str = "button";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: PinBinding = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Bool(false)),
            pin: config.pin,
        })
    }
}

impl Component for Button {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, _action: &str, _payload: Value) -> Result<bool, ComponentError> {
        Ok(false)
    }

    fn pin_event(&mut self, event: &PinEvent) {
        match event {
            PinEvent::Digital { level } => {
                let pressed = *level;
                self.cell.set(Value::Bool(pressed));
                self.cell
                    .post(if pressed { "down" } else { "up" }, Value::Bool(pressed));
            }
            PinEvent::Hold => {
                self.cell.post("hold", self.cell.get().clone());
            }
            _ => {}
        }
    }

    fn watched_pins(&self) -> Vec<PinRequest> {
        vec![PinRequest::new(self.pin, PinMode::Digital)]
    }
}

// =============================================================================
// Sensor
// =============================================================================

/// Analog input. Each reading becomes the value; change detection keeps a
/// steady reading from spamming the graph.
pub struct Sensor {
    cell: ValueCell,
    pin: Pin,
}

impl Sensor {
    pub const KIND: &'static str = "sensor";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: PinBinding = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Number(0.0)),
            pin: config.pin,
        })
    }
}

impl Component for Sensor {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, _action: &str, _payload: Value) -> Result<bool, ComponentError> {
        Ok(false)
    }

    fn pin_event(&mut self, event: &PinEvent) {
        if let PinEvent::Analog { level } = event {
            self.cell.set(Value::Number(f64::from(*level)));
        }
    }

    fn watched_pins(&self) -> Vec<PinRequest> {
        vec![PinRequest::new(self.pin, PinMode::Analog)]
    }
}

// =============================================================================
// Switch
// =============================================================================

/// Latching switch. Value is the closed state; transitions post
/// `"close"`/`"open"`.
pub struct Switch {
    cell: ValueCell,
    pin: Pin,
}

impl Switch {
    pub const KIND: &'static str = "switch";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: PinBinding = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Bool(false)),
            pin: config.pin,
        })
    }
}

impl Component for Switch {
    fn id(&self) -> &str {
        self.cell.id()
    }

    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn value(&self) -> &Value {
        self.cell.get()
    }

    fn invoke(&mut self, _action: &str, _payload: Value) -> Result<bool, ComponentError> {
        Ok(false)
    }

    fn pin_event(&mut self, event: &PinEvent) {
        if let PinEvent::Digital { level } = event {
            let closed = *level;
            self.cell.set(Value::Bool(closed));
            self.cell
                .post(if closed { "close" } else { "open" }, Value::Bool(closed));
        }
    }

    fn watched_pins(&self) -> Vec<PinRequest> {
        vec![PinRequest::new(self.pin, PinMode::Digital)]
    }
}
