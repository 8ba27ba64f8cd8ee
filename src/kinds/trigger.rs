use serde::Deserialize;

use super::coerce_number;
use crate::component::{BuildError, Component, ComponentError, ComponentSeed, ValueCell};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increasing,
    Exact,
    Decreasing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriggerConfig {
    pub threshold: f64,
    pub direction: Direction,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            direction: Direction::Increasing,
        }
    }
}

/// Edge detector over successive numeric inputs.
///
/// State machine: `idle -> armed` when the input crosses the threshold in
/// the configured direction (posting one `"bang"`), `armed -> idle` when
/// the first derivative flips sign relative to the crossing. While armed,
/// further movement in the crossing direction stays silent, so a noisy
/// signal hovering past the threshold fires once per excursion.
pub struct Trigger {
    cell: ValueCell,
    threshold: f64,
    direction: Direction,
    last: Option<f64>,
    armed: bool,
    crossing_sign: f64,
}

impl Trigger {
    pub const KIND: &'static str = "trigger";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: TriggerConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Number(0.0)),
            threshold: config.threshold,
            direction: config.direction,
            last: None,
            armed: false,
            crossing_sign: 0.0,
        })
    }

    fn crossed(&self, prev: f64, next: f64) -> bool {
        match self.direction {
            Direction::Increasing => {
                next > prev && prev < self.threshold && next >= self.threshold
            }
            Direction::Decreasing => {
                next < prev && prev > self.threshold && next <= self.threshold
            }
            Direction::Exact => next == self.threshold && prev != self.threshold,
        }
    }

    fn observe(&mut self, next: f64) {
        if let Some(prev) = self.last {
            let derivative = next - prev;
            if self.armed {
                if derivative != 0.0 && derivative.signum() != self.crossing_sign {
                    self.armed = false;
                }
            } else if self.crossed(prev, next) {
                self.armed = true;
                self.crossing_sign = derivative.signum();
                self.cell.post("bang", Value::Number(next));
            }
        }
        self.last = Some(next);
        self.cell.set(Value::Number(next));
    }
}

impl Component for Trigger {
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
        if let Some(next) = coerce_number(&self.cell, &payload) {
            self.observe(next);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::testing::{drain_signals, harness};

    fn build(config: serde_json::Value) -> (Trigger, flume::Receiver<crate::component::Envelope>) {
        let h = harness("trig-1", Trigger::KIND, config);
        (Trigger::from_seed(&h.seed).unwrap(), h.queue)
    }

    fn bangs(queue: &flume::Receiver<crate::component::Envelope>) -> usize {
        drain_signals(queue)
            .iter()
            .filter(|(name, _)| name == "bang")
            .count()
    }

    #[test]
    fn fires_once_per_upward_excursion() {
        let (mut trig, queue) =
            build(serde_json::json!({"threshold": 10, "direction": "increasing"}));
        for x in [5.0, 8.0, 11.0, 13.0, 15.0] {
            trig.observe(x);
        }
        assert_eq!(bangs(&queue), 1, "continued rise must stay silent");

        // Reversal resets, next crossing fires again.
        trig.observe(7.0);
        trig.observe(12.0);
        assert_eq!(bangs(&queue), 1);
    }

    #[test]
    fn hovering_past_threshold_does_not_refire() {
        let (mut trig, queue) =
            build(serde_json::json!({"threshold": 10, "direction": "increasing"}));
        for x in [9.0, 10.5, 10.4, 10.6, 10.5, 10.7] {
            trig.observe(x);
        }
        // One crossing; the wiggle reverses (disarms) but re-crossing from
        // below the threshold never happens, so nothing refires.
        assert_eq!(bangs(&queue), 1);
    }

    #[test]
    fn decreasing_direction_mirrors() {
        let (mut trig, queue) =
            build(serde_json::json!({"threshold": 5, "direction": "decreasing"}));
        for x in [9.0, 6.0, 4.0, 2.0] {
            trig.observe(x);
        }
        assert_eq!(bangs(&queue), 1);
    }

    #[test]
    fn exact_matches_only_the_threshold_value() {
        let (mut trig, queue) = build(serde_json::json!({"threshold": 3, "direction": "exact"}));
        trig.observe(1.0);
        trig.observe(3.0);
        trig.observe(3.0);
        assert_eq!(bangs(&queue), 1);
    }

    #[test]
    fn first_sample_never_fires() {
        let (mut trig, queue) =
            build(serde_json::json!({"threshold": 0, "direction": "increasing"}));
        trig.observe(100.0);
        assert_eq!(bangs(&queue), 0);
    }

    #[test]
    fn non_numeric_input_reports() {
        let (mut trig, queue) = build(serde_json::json!({}));
        trig.invoke("from", Value::Text("whoosh".into())).unwrap();
        let errors = crate::kinds::testing::drain_errors(&queue);
        assert_eq!(errors.len(), 1);
    }
}
