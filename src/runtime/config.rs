use std::time::Duration;

use uuid::Uuid;

use crate::host::{StdOutSink, UpdateBus};

/// Timer floors and tick rates shared with every component at build time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingConfig {
    /// Smallest interval period a node may request; smaller configs clamp up.
    pub interval_floor: Duration,
    /// Sampling period for continuously evaluated kinds (oscillator).
    pub oscillator_tick: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            interval_floor: Duration::from_millis(500),
            oscillator_tick: Duration::from_millis(50),
        }
    }
}

/// Top-level runtime settings.
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Identifies this runtime instance in logs.
    pub runtime_id: String,
    pub timing: TimingConfig,
    pub bus: BusConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            runtime_id: Uuid::new_v4().to_string(),
            timing: TimingConfig::default(),
            bus: BusConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Default config with environment overrides applied:
    /// `BREADBOARD_INTERVAL_FLOOR_MS`, `BREADBOARD_OSCILLATOR_TICK_MS`,
    /// `BREADBOARD_BUS_CAPACITY`. Unparseable values keep the default.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Some(ms) = read_env_u64("BREADBOARD_INTERVAL_FLOOR_MS") {
            config.timing.interval_floor = Duration::from_millis(ms);
        }
        if let Some(ms) = read_env_u64("BREADBOARD_OSCILLATOR_TICK_MS") {
            config.timing.oscillator_tick = Duration::from_millis(ms.max(1));
        }
        if let Some(capacity) = read_env_u64("BREADBOARD_BUS_CAPACITY") {
            config.bus = BusConfig::new(capacity as usize);
        }
        config
    }

    #[must_use]
    pub fn with_runtime_id(mut self, runtime_id: impl Into<String>) -> Self {
        self.runtime_id = runtime_id.into();
        self
    }

    #[must_use]
    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn with_bus(mut self, bus: BusConfig) -> Self {
        self.bus = bus;
        self
    }
}

fn read_env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.trim().parse().ok()
}

/// Update bus settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusConfig {
    pub subscriber_capacity: usize,
}

impl BusConfig {
    pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;

    #[must_use]
    pub fn new(subscriber_capacity: usize) -> Self {
        Self {
            subscriber_capacity: if subscriber_capacity == 0 {
                Self::DEFAULT_SUBSCRIBER_CAPACITY
            } else {
                subscriber_capacity
            },
        }
    }

    /// Stand up an [`UpdateBus`] per this config: NDJSON on stdout, sized
    /// subscriber ring.
    pub fn build_bus(&self) -> UpdateBus {
        let bus = UpdateBus::with_capacity(self.subscriber_capacity);
        bus.add_sink(StdOutSink::default());
        bus
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = RuntimeConfig::default();
        assert_eq!(config.timing.interval_floor, Duration::from_millis(500));
        assert_eq!(config.timing.oscillator_tick, Duration::from_millis(50));
        assert_eq!(config.bus.subscriber_capacity, 1024);
        assert!(!config.runtime_id.is_empty());
    }

    #[test]
    fn zero_capacity_falls_back() {
        assert_eq!(
            BusConfig::new(0).subscriber_capacity,
            BusConfig::DEFAULT_SUBSCRIBER_CAPACITY
        );
    }

    #[test]
    fn builder_methods_chain() {
        let config = RuntimeConfig::default()
            .with_runtime_id("bench")
            .with_timing(TimingConfig {
                interval_floor: Duration::from_millis(100),
                oscillator_tick: Duration::from_millis(10),
            })
            .with_bus(BusConfig::new(16));
        assert_eq!(config.runtime_id, "bench");
        assert_eq!(config.timing.interval_floor, Duration::from_millis(100));
        assert_eq!(config.bus.subscriber_capacity, 16);
    }
}
