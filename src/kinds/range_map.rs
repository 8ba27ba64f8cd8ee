use serde::Deserialize;

use super::coerce_number;
use crate::component::{BuildError, Component, ComponentError, ComponentSeed, ValueCell};
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RangeMapConfig {
    pub in_min: f64,
    pub in_max: f64,
    pub out_min: f64,
    pub out_max: f64,
}

impl Default for RangeMapConfig {
    fn default() -> Self {
        // Analog read range onto PWM range, the common wiring.
        Self {
            in_min: 0.0,
            in_max: 1023.0,
            out_min: 0.0,
            out_max: 255.0,
        }
    }
}

/// Linear remap from `[inMin, inMax]` to `[outMin, outMax]`. Fine output
/// spans (≤ 10) keep one decimal of precision; wider spans round to whole
/// numbers. `"to"` fires only when the rounded output actually moves.
pub struct RangeMap {
    cell: ValueCell,
    config: RangeMapConfig,
}

impl RangeMap {
    pub const KIND: &'static str = "rangemap";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: RangeMapConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Number(0.0)),
            config,
        })
    }

    fn map(&self, x: f64) -> f64 {
        let c = &self.config;
        let t = (x - c.in_min) / (c.in_max - c.in_min);
        let mapped = c.out_min + t * (c.out_max - c.out_min);
        if (c.out_max - c.out_min).abs() <= 10.0 {
            (mapped * 10.0).round() / 10.0
        } else {
            mapped.round()
        }
    }
}

impl Component for RangeMap {
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
        if action != "from" {
            return Ok(false);
        }
        if let Some(x) = coerce_number(&self.cell, &payload) {
            let mapped = self.map(x);
            if self.cell.set(Value::Number(mapped)) {
                self.cell.post("to", Value::Number(mapped));
            }
        }
        Ok(true)
    }
}
