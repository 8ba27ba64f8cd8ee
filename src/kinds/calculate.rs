use serde::Deserialize;

use crate::component::{
    AggregateInput, BuildError, Component, ComponentError, ComponentSeed, ValueCell,
};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalcOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Min,
    Max,
    Pow,
    Ceil,
    Floor,
    Round,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CalculateConfig {
    pub calculate: CalcOp,
}

impl Default for CalculateConfig {
    fn default() -> Self {
        Self {
            calculate: CalcOp::Add,
        }
    }
}

/// Folds the coerced inbound numbers left to right. Division and modulo
/// follow IEEE-754 (a zero divisor yields inf/NaN, never a panic); the
/// unary ops (`ceil`/`floor`/`round`) apply to the first input.
pub struct Calculate {
    cell: ValueCell,
    op: CalcOp,
}

impl Calculate {
    pub const KIND: &'static str = "calculate";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: CalculateConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Number(0.0)),
            op: config.calculate,
        })
    }

    fn reduce(op: CalcOp, numbers: &[f64]) -> f64 {
        let first = numbers[0];
        let rest = numbers[1..].iter().copied();
        match op {
            CalcOp::Add => numbers.iter().sum(),
            CalcOp::Subtract => rest.fold(first, |acc, x| acc - x),
            CalcOp::Multiply => numbers.iter().product(),
            CalcOp::Divide => rest.fold(first, |acc, x| acc / x),
            CalcOp::Modulo => rest.fold(first, |acc, x| acc % x),
            CalcOp::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
            CalcOp::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            CalcOp::Pow => rest.fold(first, f64::powf),
            CalcOp::Ceil => first.ceil(),
            CalcOp::Floor => first.floor(),
            CalcOp::Round => first.round(),
        }
    }
}

impl Component for Calculate {
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

impl AggregateInput for Calculate {
    fn check(&mut self, inputs: Vec<Value>) {
        if inputs.is_empty() {
            return;
        }
        let mut numbers = Vec::with_capacity(inputs.len());
        for input in &inputs {
            match input.as_number() {
                Ok(n) => numbers.push(n),
                Err(err) => {
                    self.cell.report(err.to_string());
                    return;
                }
            }
        }
        let result = Self::reduce(self.op, &numbers);
        self.cell.set(Value::Number(result));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::testing::{drain_errors, harness};

    fn build(op: &str) -> Calculate {
        let h = harness("calc-1", Calculate::KIND, serde_json::json!({"calculate": op}));
        Calculate::from_seed(&h.seed).unwrap()
    }

    fn check(calc: &mut Calculate, inputs: &[f64]) -> Value {
        calc.check(inputs.iter().map(|n| Value::Number(*n)).collect());
        calc.value().clone()
    }

    #[test]
    fn binary_folds() {
        assert_eq!(check(&mut build("add"), &[1.0, 2.0, 3.0]), Value::Number(6.0));
        assert_eq!(check(&mut build("subtract"), &[10.0, 3.0, 2.0]), Value::Number(5.0));
        assert_eq!(check(&mut build("multiply"), &[2.0, 3.0, 4.0]), Value::Number(24.0));
        assert_eq!(check(&mut build("modulo"), &[10.0, 3.0]), Value::Number(1.0));
        assert_eq!(check(&mut build("pow"), &[2.0, 10.0]), Value::Number(1024.0));
        assert_eq!(check(&mut build("min"), &[4.0, -2.0, 9.0]), Value::Number(-2.0));
        assert_eq!(check(&mut build("max"), &[4.0, -2.0, 9.0]), Value::Number(9.0));
    }

    #[test]
    fn division_by_zero_is_ieee() {
        let result = check(&mut build("divide"), &[1.0, 0.0]);
        assert_eq!(result, Value::Number(f64::INFINITY));
    }

    #[test]
    fn unary_ops_use_first_input() {
        assert_eq!(check(&mut build("ceil"), &[1.2, 99.0]), Value::Number(2.0));
        assert_eq!(check(&mut build("floor"), &[1.8]), Value::Number(1.0));
        assert_eq!(check(&mut build("round"), &[2.5]), Value::Number(3.0));
    }

    #[test]
    fn coerces_text_inputs() {
        let mut calc = build("add");
        calc.check(vec![Value::Text("2".into()), Value::Bool(true)]);
        assert_eq!(calc.value(), &Value::Number(3.0));
    }

    #[test]
    fn bad_input_reports_and_leaves_value() {
        let h = harness("calc-1", Calculate::KIND, serde_json::json!({}));
        let mut calc = Calculate::from_seed(&h.seed).unwrap();
        calc.check(vec![Value::Number(5.0)]);
        calc.check(vec![Value::Null]);
        assert_eq!(calc.value(), &Value::Number(5.0));
        assert_eq!(drain_errors(&h.queue).len(), 1);
    }
}
