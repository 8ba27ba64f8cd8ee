use crate::component::{BuildError, Component, ComponentError, ComponentSeed, ValueCell};
use crate::value::Value;

/// Two-way hand-off with an outside system (MQTT topic, Figma variable,
/// anything the host bridges in).
///
/// A push from outside arrives through `setExternal`: it runs full change
/// semantics and then posts a `"subscribe"` signal, so the host can tell an
/// externally-originated update from a local one. The local `set` action
/// only updates the value; the resulting `change` is what outbound bridges
/// listen for.
pub struct Bridge {
    cell: ValueCell,
}

impl Bridge {
    pub const KIND: &'static str = "bridge";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        Ok(Self {
            cell: seed.cell(Value::Null),
        })
    }
}

impl Component for Bridge {
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
        if action != "set" {
            return Ok(false);
        }
        self.cell.set(payload);
        Ok(true)
    }

    fn set_external(&mut self, value: Value) {
        self.cell.set(value.clone());
        // Posted unconditionally: the outside system spoke even when it
        // repeated itself.
        self.cell.post("subscribe", value);
    }
}
