use serde::Deserialize;

use crate::component::{
    AggregateInput, BuildError, Component, ComponentError, ComponentSeed, ValueCell,
};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateOp {
    And,
    Or,
    Xor,
    Not,
    Nand,
    Nor,
    Xnor,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GateConfig {
    pub gate: GateOp,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self { gate: GateOp::And }
    }
}

/// Boolean gate over the truthiness of every inbound value. Multi-input
/// `xor` is odd parity; `not` negates the first input only.
pub struct Gate {
    cell: ValueCell,
    op: GateOp,
}

impl Gate {
    pub const KIND: &'static str = "gate";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: GateConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Bool(false)),
            op: config.gate,
        })
    }

    fn evaluate(op: GateOp, truths: &[bool]) -> bool {
        let on = truths.iter().filter(|t| **t).count();
        match op {
            GateOp::And => on == truths.len(),
            GateOp::Or => on > 0,
            GateOp::Xor => on % 2 == 1,
            GateOp::Not => !truths[0],
            GateOp::Nand => on != truths.len(),
            GateOp::Nor => on == 0,
            GateOp::Xnor => on % 2 == 0,
        }
    }
}

impl Component for Gate {
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
        // Gates are driven through the aggregating path only.
        Ok(false)
    }

    fn as_aggregate(&self) -> Option<&dyn AggregateInput> {
        Some(self)
    }

    fn as_aggregate_mut(&mut self) -> Option<&mut dyn AggregateInput> {
        Some(self)
    }
}

impl AggregateInput for Gate {
    fn check(&mut self, inputs: Vec<Value>) {
        if inputs.is_empty() {
            return;
        }
        let truths: Vec<bool> = inputs.iter().map(Value::truthy).collect();
        let result = Self::evaluate(self.op, &truths);
        self.cell.set(Value::Bool(result));
        self.cell
            .post(if result { "true" } else { "false" }, Value::Bool(result));
    }
}
