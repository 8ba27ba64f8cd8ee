use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;

use crate::component::{
    BuildError, Component, ComponentError, ComponentSeed, TaskGuard, ValueCell,
};
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntervalConfig {
    /// Tick period in milliseconds. Clamped up to the runtime's floor.
    pub interval: u64,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        Self { interval: 1000 }
    }
}

/// Fixed-period ticker. Each tick assigns the current epoch-millisecond
/// timestamp, so every tick is a fresh `change`. Starts ticking at
/// construction; `start`/`stop` actions control it afterwards.
pub struct Interval {
    cell: ValueCell,
    period: Duration,
    ticker: Option<TaskGuard>,
}

impl Interval {
    pub const KIND: &'static str = "interval";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: IntervalConfig = seed.parse()?;
        let period = Duration::from_millis(config.interval).max(seed.env.timing.interval_floor);
        let cell = seed.cell(Value::Number(0.0));
        let ticker = Some(TaskGuard::every(
            cell.emitter().clone(),
            seed.id.clone(),
            period,
        ));
        Ok(Self {
            cell,
            period,
            ticker,
        })
    }
}

impl Component for Interval {
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
            "start" => {
                if self.ticker.is_none() {
                    self.ticker = Some(TaskGuard::every(
                        self.cell.emitter().clone(),
                        self.cell.id().to_string(),
                        self.period,
                    ));
                }
            }
            "stop" => self.ticker = None,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn timer_fired(&mut self) {
        self.cell
            .set(Value::Number(Utc::now().timestamp_millis() as f64));
    }

    fn teardown(&mut self) {
        self.ticker = None;
    }
}
