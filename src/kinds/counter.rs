use serde::Deserialize;

use super::coerce_number;
use crate::component::{BuildError, Component, ComponentError, ComponentSeed, ValueCell};
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CounterConfig {
    /// Value the counter starts at and resets to.
    pub start: f64,
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self { start: 0.0 }
    }
}

/// Numeric accumulator. `increment`/`decrement` default to steps of 1 when
/// the incoming value carries no number of its own.
pub struct Counter {
    cell: ValueCell,
    start: f64,
}

impl Counter {
    pub const KIND: &'static str = "counter";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: CounterConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Number(config.start)),
            start: config.start,
        })
    }

    fn current(&self) -> f64 {
        match self.cell.get() {
            Value::Number(n) => *n,
            other => other.as_number().unwrap_or(0.0),
        }
    }

    /// Step amount for increment/decrement: a null payload means "no amount
    /// given", so the default step applies.
    fn amount(&self, payload: &Value, default: f64) -> Option<f64> {
        if payload.is_null() {
            return Some(default);
        }
        coerce_number(&self.cell, payload)
    }
}

impl Component for Counter {
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
            "increment" => {
                if let Some(step) = self.amount(&payload, 1.0) {
                    let next = self.current() + step;
                    self.cell.set(Value::Number(next));
                }
            }
            "decrement" => {
                if let Some(step) = self.amount(&payload, 1.0) {
                    let next = self.current() - step;
                    self.cell.set(Value::Number(next));
                }
            }
            "reset" => {
                self.cell.set(Value::Number(self.start));
            }
            "set" => {
                if let Some(next) = coerce_number(&self.cell, &payload) {
                    self.cell.set(Value::Number(next));
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}
