//! Kind-name to constructor mapping used by the graph instantiator.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::component::{BuildError, Component, ComponentSeed};
use crate::kinds::{
    Bridge, Button, Calculate, Compare, Counter, Delay, Gate, Interval, Led, Matrix, Oscillator,
    Piezo, Prompt, Random, RangeMap, Relay, Sensor, Servo, Switch, Trigger,
};

/// Constructor for one node kind. Failures are per-node by contract; the
/// instantiator reports them and keeps building.
pub type KindFactory =
    Arc<dyn Fn(ComponentSeed) -> Result<Box<dyn Component>, BuildError> + Send + Sync>;

fn factory<C>(build: fn(&ComponentSeed) -> Result<C, BuildError>) -> KindFactory
where
    C: Component + 'static,
{
    Arc::new(move |seed| Ok(Box::new(build(&seed)?) as Box<dyn Component>))
}

/// Maps kind names to constructors. The default registry carries every
/// built-in kind; hosts register additional kinds (or shadow built-ins)
/// before handing the registry to a runtime.
#[derive(Clone)]
pub struct ComponentRegistry {
    factories: FxHashMap<String, KindFactory>,
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry
            .register(Counter::KIND, factory(Counter::from_seed))
            .register(Gate::KIND, factory(Gate::from_seed))
            .register(Compare::KIND, factory(Compare::from_seed))
            .register(Calculate::KIND, factory(Calculate::from_seed))
            .register(RangeMap::KIND, factory(RangeMap::from_seed))
            .register(Interval::KIND, factory(Interval::from_seed))
            .register(Oscillator::KIND, factory(Oscillator::from_seed))
            .register(Delay::KIND, factory(Delay::from_seed))
            .register(Trigger::KIND, factory(Trigger::from_seed))
            .register(Bridge::KIND, factory(Bridge::from_seed))
            .register(Prompt::KIND, factory(Prompt::from_seed))
            .register(Random::KIND, factory(Random::from_seed))
            .register(Button::KIND, factory(Button::from_seed))
            .register(Sensor::KIND, factory(Sensor::from_seed))
            .register(Switch::KIND, factory(Switch::from_seed))
            .register(Led::KIND, factory(Led::from_seed))
            .register(Servo::KIND, factory(Servo::from_seed))
            .register(Relay::KIND, factory(Relay::from_seed))
            .register(Piezo::KIND, factory(Piezo::from_seed))
            .register(Matrix::KIND, factory(Matrix::from_seed));
        registry
    }
}

impl ComponentRegistry {
    /// Empty registry, no built-ins.
    pub fn new() -> Self {
        Self {
            factories: FxHashMap::default(),
        }
    }

    /// Register a factory under a kind name, replacing any previous one.
    pub fn register(&mut self, kind: impl Into<String>, factory: KindFactory) -> &mut Self {
        self.factories.insert(kind.into(), factory);
        self
    }

    /// Builder-style registration for fluent construction.
    #[must_use]
    pub fn with_factory(mut self, kind: impl Into<String>, factory: KindFactory) -> Self {
        self.register(kind, factory);
        self
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kind names in sorted order.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Construct a component for the seed's kind.
    pub fn create(&self, seed: ComponentSeed) -> Result<Box<dyn Component>, BuildError> {
        match self.factories.get(&seed.kind) {
            Some(factory) => factory(seed),
            None => Err(BuildError::UnknownKind { kind: seed.kind }),
        }
    }
}
