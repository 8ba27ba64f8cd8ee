use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::component::{
    BuildError, Component, ComponentError, ComponentSeed, TaskGuard, ValueCell,
};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OscillatorConfig {
    pub waveform: Waveform,
    /// Full cycle length in milliseconds.
    pub period: u64,
    pub min: f64,
    pub max: f64,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::Sine,
            period: 1000,
            min: 0.0,
            max: 255.0,
        }
    }
}

/// Samples a periodic waveform on the runtime's oscillator tick and scales
/// it into `[min, max]`. Phase comes from elapsed wall time, not tick
/// count, so missed ticks cause no drift. Change detection dedups the flat
/// segments of square waves.
pub struct Oscillator {
    cell: ValueCell,
    waveform: Waveform,
    period: Duration,
    min: f64,
    max: f64,
    started: Instant,
    tick: Duration,
    ticker: Option<TaskGuard>,
}

impl Oscillator {
    pub const KIND: &'static str = "oscillator";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: OscillatorConfig = seed.parse()?;
        let tick = seed.env.timing.oscillator_tick;
        let cell = seed.cell(Value::Number(config.min));
        let ticker = Some(TaskGuard::every(
            cell.emitter().clone(),
            seed.id.clone(),
            tick,
        ));
        Ok(Self {
            cell,
            waveform: config.waveform,
            period: Duration::from_millis(config.period.max(1)),
            min: config.min,
            max: config.max,
            started: Instant::now(),
            tick,
            ticker,
        })
    }

    /// Normalized sample in `[0, 1]` for a phase in `[0, 1)`.
    fn sample(waveform: Waveform, phase: f64) -> f64 {
        match waveform {
            Waveform::Sine => ((TAU * phase).sin() + 1.0) / 2.0,
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    0.0
                }
            }
            Waveform::Triangle => {
                if phase < 0.5 {
                    2.0 * phase
                } else {
                    2.0 - 2.0 * phase
                }
            }
            Waveform::Sawtooth => phase,
        }
    }

    fn current_sample(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        let phase = (elapsed / self.period.as_secs_f64()).fract();
        let s = Self::sample(self.waveform, phase);
        self.min + s * (self.max - self.min)
    }
}

impl Component for Oscillator {
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
                    self.started = Instant::now();
                    self.ticker = Some(TaskGuard::every(
                        self.cell.emitter().clone(),
                        self.cell.id().to_string(),
                        self.tick,
                    ));
                }
            }
            "stop" => self.ticker = None,
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn timer_fired(&mut self) {
        let sample = self.current_sample();
        self.cell.set(Value::Number(sample));
    }

    fn teardown(&mut self) {
        self.ticker = None;
    }
}
