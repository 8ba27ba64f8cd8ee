//! Built-in node kind implementations.
//!
//! One file per behavior family: pure logic kinds (counter, gate, compare,
//! calculate, range mapper), the timer family (interval, oscillator, delay,
//! trigger), the external-facing kinds (bridge, prompt), and the
//! hardware-bound kinds split into [`sensors`] and [`actuators`].
//!
//! Every kind follows the same shape: a serde config struct deserialized
//! from the descriptor's config map, a `from_seed` constructor used by the
//! registry, and a [`Component`](crate::component::Component) impl whose
//! `invoke` matches the action names edges may carry. Coercion failures are
//! reported through the node's [`ValueCell`](crate::component::ValueCell)
//! and never panic.

pub mod actuators;
pub mod bridge;
pub mod calculate;
pub mod compare;
pub mod counter;
pub mod delay;
pub mod gate;
pub mod interval;
pub mod oscillator;
pub mod prompt;
pub mod random;
pub mod range_map;
pub mod sensors;
pub mod trigger;

pub use actuators::{Led, Matrix, Piezo, Relay, Servo};
pub use bridge::Bridge;
pub use calculate::{CalcOp, Calculate};
pub use compare::{Compare, CompareOp};
pub use counter::Counter;
pub use delay::Delay;
pub use gate::{Gate, GateOp};
pub use interval::Interval;
pub use oscillator::{Oscillator, Waveform};
pub use prompt::Prompt;
pub use random::Random;
pub use range_map::RangeMap;
pub use sensors::{Button, Sensor, Switch};
pub use trigger::{Direction, Trigger};

use crate::component::ValueCell;
use crate::value::Value;

/// Coerce a payload to a number, reporting the failure on the node's error
/// channel. `None` means the caller should leave its value untouched.
pub(crate) fn coerce_number(cell: &ValueCell, value: &Value) -> Option<f64> {
    match value.as_number() {
        Ok(n) => Some(n),
        Err(err) => {
            cell.report(err.to_string());
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Seed construction and envelope draining shared by kind unit tests.

    use std::sync::Arc;

    use crate::component::{BuildEnv, ComponentSeed, Emission, Emitter, Envelope};
    use crate::hal::BoardDriver;
    use crate::hal::mock::MockBoard;
    use crate::llm::EchoClient;
    use crate::runtime::TimingConfig;
    use crate::value::Value;

    pub struct KindHarness {
        pub seed: ComponentSeed,
        pub queue: flume::Receiver<Envelope>,
        pub board: Arc<MockBoard>,
    }

    pub fn harness(id: &str, kind: &str, config: serde_json::Value) -> KindHarness {
        let (tx, queue) = flume::unbounded();
        let board = Arc::new(MockBoard::default());
        let driver: Arc<dyn BoardDriver> = Arc::clone(&board) as Arc<dyn BoardDriver>;
        let config = match config {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        let seed = ComponentSeed {
            id: id.to_string(),
            kind: kind.to_string(),
            config,
            env: BuildEnv {
                board: driver,
                emitter: Emitter::new(tx, 1),
                timing: TimingConfig::default(),
                prompt_client: Arc::new(EchoClient),
            },
        };
        KindHarness { seed, queue, board }
    }

    /// Drain queued emissions as `(signal_name, value)` pairs; `change`
    /// stands in for the Changed variant and error reports are skipped.
    pub fn drain_signals(queue: &flume::Receiver<Envelope>) -> Vec<(String, Value)> {
        queue
            .drain()
            .filter_map(|envelope| match envelope {
                Envelope::Emission { emission, .. } => match emission {
                    Emission::Changed { value } => Some(("change".to_string(), value)),
                    Emission::Signal { name, value, .. } => Some((name, value)),
                    Emission::Error { .. } => None,
                },
                _ => None,
            })
            .collect()
    }

    /// Drain queued error reports only.
    pub fn drain_errors(queue: &flume::Receiver<Envelope>) -> Vec<String> {
        queue
            .drain()
            .filter_map(|envelope| match envelope {
                Envelope::Emission {
                    emission: Emission::Error { message },
                    ..
                } => Some(message),
                _ => None,
            })
            .collect()
    }
}
