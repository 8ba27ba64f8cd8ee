use std::time::Duration;

use serde::Deserialize;

use crate::component::{
    BuildError, Component, ComponentError, ComponentSeed, TaskGuard, ValueCell,
};
use crate::value::Value;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelayConfig {
    /// Hold time in milliseconds.
    pub delay: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self { delay: 1000 }
    }
}

/// Holds each input for the configured duration before releasing it as the
/// node's value plus a `"to"` signal. A new input while one is pending
/// replaces the held value and restarts the clock, so only the latest
/// input is ever released.
pub struct Delay {
    cell: ValueCell,
    delay: Duration,
    pending: Option<Value>,
    timer: Option<TaskGuard>,
}

impl Delay {
    pub const KIND: &'static str = "delay";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: DelayConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Null),
            delay: Duration::from_millis(config.delay),
            pending: None,
            timer: None,
        })
    }
}

impl Component for Delay {
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
        self.pending = Some(payload);
        // Replacing the guard aborts the previous countdown.
        self.timer = Some(TaskGuard::once(
            self.cell.emitter().clone(),
            self.cell.id().to_string(),
            self.delay,
        ));
        Ok(true)
    }

    fn timer_fired(&mut self) {
        self.timer = None;
        if let Some(held) = self.pending.take() {
            self.cell.set(held.clone());
            self.cell.post("to", held);
        }
    }

    fn teardown(&mut self) {
        self.timer = None;
        self.pending = None;
    }
}
