use serde::Deserialize;

use crate::component::{
    AggregateInput, BuildError, Component, ComponentError, ComponentSeed, ValueCell,
};
use crate::value::Value;

/// Validator names as they appear on the wire (human-readable, with spaces).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "equal to")]
    EqualTo,
    #[serde(rename = "greater than")]
    GreaterThan,
    #[serde(rename = "less than")]
    LessThan,
    #[serde(rename = "between")]
    Between,
    #[serde(rename = "outside")]
    Outside,
    #[serde(rename = "even")]
    Even,
    #[serde(rename = "odd")]
    Odd,
    #[serde(rename = "includes")]
    Includes,
    #[serde(rename = "starts with")]
    StartsWith,
    #[serde(rename = "ends with")]
    EndsWith,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompareConfig {
    pub compare: CompareOp,
    /// Reference operand for the binary validators.
    pub value: Option<serde_json::Value>,
    /// Bounds for `between`/`outside`, inclusive.
    pub min: f64,
    pub max: f64,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            compare: CompareOp::EqualTo,
            value: None,
            min: 0.0,
            max: 0.0,
        }
    }
}

/// Validates every inbound value against a configured reference; the verdict
/// is the conjunction over all inputs. Validators that need a reference
/// evaluate to false when none is configured.
pub struct Compare {
    cell: ValueCell,
    op: CompareOp,
    reference: Option<Value>,
    min: f64,
    max: f64,
}

impl Compare {
    pub const KIND: &'static str = "compare";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: CompareConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Bool(false)),
            op: config.compare,
            reference: config.value.map(Value::from),
            min: config.min,
            max: config.max,
        })
    }

    fn reference_number(&self) -> Result<Option<f64>, String> {
        match &self.reference {
            None => Ok(None),
            Some(reference) => reference
                .as_number()
                .map(Some)
                .map_err(|err| err.to_string()),
        }
    }

    fn satisfies(&self, input: &Value) -> Result<bool, String> {
        match self.op {
            CompareOp::EqualTo => Ok(self.reference.as_ref().is_some_and(|r| input == r)),
            CompareOp::GreaterThan => {
                let x = input.as_number().map_err(|err| err.to_string())?;
                Ok(self.reference_number()?.is_some_and(|r| x > r))
            }
            CompareOp::LessThan => {
                let x = input.as_number().map_err(|err| err.to_string())?;
                Ok(self.reference_number()?.is_some_and(|r| x < r))
            }
            CompareOp::Between => {
                let x = input.as_number().map_err(|err| err.to_string())?;
                Ok(x >= self.min && x <= self.max)
            }
            CompareOp::Outside => {
                let x = input.as_number().map_err(|err| err.to_string())?;
                Ok(x < self.min || x > self.max)
            }
            CompareOp::Even => {
                let x = input.as_number().map_err(|err| err.to_string())?;
                Ok((x.round() as i64).rem_euclid(2) == 0)
            }
            CompareOp::Odd => {
                let x = input.as_number().map_err(|err| err.to_string())?;
                Ok((x.round() as i64).rem_euclid(2) == 1)
            }
            CompareOp::Includes => Ok(self.text_reference(|text, r| text.contains(r), input)),
            CompareOp::StartsWith => Ok(self.text_reference(|text, r| text.starts_with(r), input)),
            CompareOp::EndsWith => Ok(self.text_reference(|text, r| text.ends_with(r), input)),
        }
    }

    fn text_reference(&self, predicate: impl Fn(&str, &str) -> bool, input: &Value) -> bool {
        match &self.reference {
            None => false,
            Some(reference) => predicate(&input.render(), &reference.render()),
        }
    }
}

impl Component for Compare {
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

    fn as_aggregate(&self) -> Option<&dyn AggregateInput> {
        Some(self)
    }

    fn as_aggregate_mut(&mut self) -> Option<&mut dyn AggregateInput> {
        Some(self)
    }
}

impl AggregateInput for Compare {
    fn check(&mut self, inputs: Vec<Value>) {
        if inputs.is_empty() {
            return;
        }
        let mut result = true;
        for input in &inputs {
            match self.satisfies(input) {
                Ok(ok) => result &= ok,
                Err(message) => {
                    self.cell.report(message);
                    return;
                }
            }
        }
        self.cell.set(Value::Bool(result));
        self.cell
            .post(if result { "true" } else { "false" }, Value::Bool(result));
    }
}
