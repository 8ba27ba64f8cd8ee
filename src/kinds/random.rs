use serde::Deserialize;

use crate::component::{BuildError, Component, ComponentError, ComponentSeed, ValueCell};
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RandomConfig {
    pub min: f64,
    pub max: f64,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Uniform sampler over a configured range. Integer bounds draw whole
/// numbers (dice-style); anything else draws a continuous sample.
pub struct Random {
    cell: ValueCell,
    min: f64,
    max: f64,
}

impl Random {
    pub const KIND: &'static str = "random";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: RandomConfig = seed.parse()?;
        let (min, max) = if config.min <= config.max {
            (config.min, config.max)
        } else {
            (config.max, config.min)
        };
        Ok(Self {
            cell: seed.cell(Value::Number(min)),
            min,
            max,
        })
    }

    fn draw(&self) -> f64 {
        if self.min == self.max {
            return self.min;
        }
        if self.min.fract() == 0.0 && self.max.fract() == 0.0 {
            rand::random_range(self.min as i64..=self.max as i64) as f64
        } else {
            rand::random_range(self.min..=self.max)
        }
    }
}

impl Component for Random {
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
        if action != "generate" {
            return Ok(false);
        }
        let sample = self.draw();
        self.cell.set(Value::Number(sample));
        Ok(true)
    }
}
