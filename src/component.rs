//! Component contract and the plumbing every node kind builds on.
//!
//! A [`Component`] is one live node: identity, current [`Value`], and a set
//! of stimulus hooks the runtime drives. Components never call each other;
//! they emit onto the runtime's envelope queue through an [`Emitter`] and the
//! router decides where emissions go. That keeps the whole graph inside one
//! event loop: handlers run to completion, and nothing shares mutable state.
//!
//! Kind implementors mostly interact with two helpers:
//!
//! - [`ValueCell`] — owns the value, performs change detection, and posts
//!   `change`/named signals and error reports.
//! - [`TaskGuard`] — an owned background task (interval tick, one-shot delay,
//!   in-flight prompt call) aborted on drop, so teardown can never leak a
//!   timer across a graph rebuild.

use std::sync::Arc;
use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::hal::{BoardDriver, PinEvent, PinRequest};
use crate::llm::{PromptClient, PromptError};
use crate::protocol::HostCommand;
use crate::runtime::TimingConfig;
use crate::value::Value;

// =============================================================================
// Errors
// =============================================================================

/// A node descriptor could not be turned into a live component.
///
/// Always isolated per node: the instantiator reports it and keeps building
/// the rest of the graph.
#[derive(Debug, Error, Diagnostic)]
pub enum BuildError {
    #[error("unknown node kind: {kind}")]
    #[diagnostic(
        code(breadboard::build::unknown_kind),
        help("register custom kinds with ComponentRegistry::register")
    )]
    UnknownKind { kind: String },

    #[error("invalid config for {kind} node: {source}")]
    #[diagnostic(code(breadboard::build::invalid_config))]
    InvalidConfig {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("board refused construction: {source}")]
    #[diagnostic(code(breadboard::build::board))]
    Board {
        #[from]
        source: crate::hal::BoardError,
    },
}

/// A live component failed while handling a dispatched action.
///
/// Isolated per edge: the router logs it and keeps delivering to siblings.
#[derive(Debug, Error, Diagnostic)]
pub enum ComponentError {
    #[error("board command failed: {source}")]
    #[diagnostic(code(breadboard::component::board))]
    Board {
        #[from]
        source: crate::hal::BoardError,
    },
}

/// The runtime that owned this component's queue is gone.
#[derive(Debug, Error, Diagnostic)]
#[error("runtime envelope queue closed")]
#[diagnostic(code(breadboard::component::queue_closed))]
pub struct EmitError;

// =============================================================================
// Envelope queue
// =============================================================================

/// What a component pushed at the runtime.
#[derive(Debug, Clone)]
pub(crate) enum Emission {
    /// The value actually changed (already deduplicated by [`ValueCell`]).
    Changed { value: Value },
    /// A named signal. `edge` is set on router traversal bookkeeping, which
    /// must not be routed again.
    Signal {
        name: String,
        value: Value,
        edge: Option<String>,
    },
    /// A per-call failure report (coercion and friends).
    Error { message: String },
}

/// One queued runtime event. Node-addressed variants carry the graph epoch
/// they were emitted under; the runtime drops stale ones on arrival.
#[derive(Debug)]
pub(crate) enum Envelope {
    Emission {
        epoch: u64,
        node: String,
        emission: Emission,
    },
    Timer {
        epoch: u64,
        node: String,
    },
    PromptResolved {
        epoch: u64,
        node: String,
        generation: u64,
        result: Result<String, PromptError>,
    },
    Board(crate::hal::BoardEvent),
    Command(HostCommand),
    Raw(String),
    Shutdown,
}

/// Handle onto the runtime's envelope queue, stamped with the epoch it was
/// created under. Every component holds one (usually inside its
/// [`ValueCell`]); timer and prompt tasks hold clones.
#[derive(Clone)]
pub struct Emitter {
    tx: flume::Sender<Envelope>,
    epoch: u64,
}

impl Emitter {
    pub(crate) fn new(tx: flume::Sender<Envelope>, epoch: u64) -> Self {
        Self { tx, epoch }
    }

    pub(crate) fn send(&self, node: &str, emission: Emission) -> Result<(), EmitError> {
        self.tx
            .send(Envelope::Emission {
                epoch: self.epoch,
                node: node.to_string(),
                emission,
            })
            .map_err(|_| EmitError)
    }

    /// Queue a timer firing for `node`.
    pub fn timer(&self, node: &str) -> Result<(), EmitError> {
        self.tx
            .send(Envelope::Timer {
                epoch: self.epoch,
                node: node.to_string(),
            })
            .map_err(|_| EmitError)
    }

    /// Queue a prompt resolution for `node`. Stale generations are discarded
    /// by the component on arrival.
    pub fn prompt_resolved(
        &self,
        node: &str,
        generation: u64,
        result: Result<String, PromptError>,
    ) -> Result<(), EmitError> {
        self.tx
            .send(Envelope::PromptResolved {
                epoch: self.epoch,
                node: node.to_string(),
                generation,
                result,
            })
            .map_err(|_| EmitError)
    }

    /// Traversal bookkeeping posted by the router after a dispatch.
    pub(crate) fn traversal(&self, node: &str, action: &str, value: Value, edge: &str) {
        let emission = Emission::Signal {
            name: action.to_string(),
            value,
            edge: Some(edge.to_string()),
        };
        if self.send(node, emission).is_err() {
            debug!(node, "envelope queue closed, traversal dropped");
        }
    }
}

// =============================================================================
// Value cell
// =============================================================================

/// Owns a component's value and enforces the change-detection invariant:
/// `change` fires if and only if the newly assigned value differs from the
/// previous one, exactly once per transition.
pub struct ValueCell {
    id: String,
    value: Value,
    emitter: Emitter,
}

impl ValueCell {
    pub fn new(id: String, initial: Value, emitter: Emitter) -> Self {
        Self {
            id,
            value: initial,
            emitter,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn get(&self) -> &Value {
        &self.value
    }

    /// Assign a new value. Emits `change` and returns `true` only when the
    /// value actually differs. Never fails: a closed queue is debug-logged.
    pub fn set(&mut self, next: Value) -> bool {
        if self.value == next {
            return false;
        }
        self.value = next.clone();
        if self
            .emitter
            .send(&self.id, Emission::Changed { value: next })
            .is_err()
        {
            debug!(node = %self.id, "envelope queue closed, change dropped");
        }
        true
    }

    /// Emit a named signal (e.g. `"true"`, `"to"`, `"bang"`). Does not touch
    /// the value; the host additionally receives a `change` echo so it always
    /// sees the value that accompanied a non-change action.
    pub fn post(&self, signal: &str, value: Value) {
        let emission = Emission::Signal {
            name: signal.to_string(),
            value,
            edge: None,
        };
        if self.emitter.send(&self.id, emission).is_err() {
            debug!(node = %self.id, signal, "envelope queue closed, signal dropped");
        }
    }

    /// Report a per-call failure on the host channel, leaving the value
    /// unchanged.
    pub fn report(&self, message: impl Into<String>) {
        let emission = Emission::Error {
            message: message.into(),
        };
        if self.emitter.send(&self.id, emission).is_err() {
            debug!(node = %self.id, "envelope queue closed, error report dropped");
        }
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }
}

// =============================================================================
// Owned background tasks
// =============================================================================

/// An owned background task, aborted when the guard drops. Timer-based kinds
/// and the prompt node hold their scheduled work through one of these so a
/// graph rebuild deterministically cancels it.
pub struct TaskGuard {
    handle: JoinHandle<()>,
}

impl TaskGuard {
    /// Run an arbitrary future until completion or abort.
    pub fn spawn<F>(future: F) -> Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }

    /// Fire a timer envelope for `node` every `period`, first firing one
    /// period from now.
    pub fn every(emitter: Emitter, node: String, period: Duration) -> Self {
        Self::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticks = tokio::time::interval_at(start, period);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                if emitter.timer(&node).is_err() {
                    break;
                }
            }
        })
    }

    /// Fire a single timer envelope for `node` after `delay`.
    pub fn once(emitter: Emitter, node: String, delay: Duration) -> Self {
        Self::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = emitter.timer(&node);
        })
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Construction
// =============================================================================

/// Shared construction environment: one per graph build.
#[derive(Clone)]
pub struct BuildEnv {
    pub board: Arc<dyn BoardDriver>,
    pub emitter: Emitter,
    pub timing: TimingConfig,
    pub prompt_client: Arc<dyn PromptClient>,
}

/// Everything a kind factory receives for one descriptor.
pub struct ComponentSeed {
    pub id: String,
    pub kind: String,
    pub config: serde_json::Map<String, serde_json::Value>,
    pub env: BuildEnv,
}

impl ComponentSeed {
    /// Deserialize the descriptor's config map into a typed config struct.
    pub fn parse<T: serde::de::DeserializeOwned>(&self) -> Result<T, BuildError> {
        serde_json::from_value(serde_json::Value::Object(self.config.clone())).map_err(|source| {
            BuildError::InvalidConfig {
                kind: self.kind.clone(),
                source,
            }
        })
    }

    /// Build this component's [`ValueCell`] with an initial value.
    pub fn cell(&self, initial: Value) -> ValueCell {
        ValueCell::new(self.id.clone(), initial, self.env.emitter.clone())
    }
}

// =============================================================================
// Component trait
// =============================================================================

/// One live node in the graph.
///
/// All methods run on the runtime's event loop; implementations are plain
/// sequential code. Long-running work (timers, external calls) goes through
/// [`TaskGuard`]s that feed envelopes back into the queue instead of blocking.
pub trait Component: Send {
    fn id(&self) -> &str;

    /// Kind name this component was registered under.
    fn kind(&self) -> &'static str;

    fn value(&self) -> &Value;

    /// Handle a named action dispatched by the router (default dispatch
    /// rule) with the single propagated value.
    ///
    /// Returns `Ok(false)` when the action name is not part of this kind's
    /// surface; the router skips such edges silently.
    fn invoke(&mut self, action: &str, payload: Value) -> Result<bool, ComponentError>;

    /// Aggregating capability (gate/calculate/compare): present when this
    /// kind evaluates the full current input list rather than single values.
    fn as_aggregate(&self) -> Option<&dyn AggregateInput> {
        None
    }

    fn as_aggregate_mut(&mut self) -> Option<&mut dyn AggregateInput> {
        None
    }

    /// Prompt capability: present when this kind accumulates named variables
    /// and performs an external completion call on `invoke`.
    fn as_prompt(&self) -> Option<&dyn PromptInput> {
        None
    }

    fn as_prompt_mut(&mut self) -> Option<&mut dyn PromptInput> {
        None
    }

    /// Value pushed from an outside system (`setExternal` command).
    fn set_external(&mut self, _value: Value) {}

    /// An owned timer task fired.
    fn timer_fired(&mut self) {}

    /// A watched pin produced an event.
    fn pin_event(&mut self, _event: &PinEvent) {}

    /// An in-flight prompt call resolved. `generation` identifies which
    /// `invoke` started it; stale generations must be discarded.
    fn prompt_resolved(&mut self, _generation: u64, _result: Result<String, PromptError>) {}

    /// Pins this component wants driver events for; queried once after
    /// construction.
    fn watched_pins(&self) -> Vec<PinRequest> {
        Vec::new()
    }

    /// Cancel owned tasks and drop board resources. Called exactly once,
    /// right before the component is discarded on a graph rebuild.
    fn teardown(&mut self) {}
}

/// Capability marker for kinds whose evaluation needs the current values of
/// all inbound edges at once.
pub trait AggregateInput {
    /// Evaluate against the freshly gathered input list. Coercion failures
    /// are reported internally; evaluation itself never fails outward.
    fn check(&mut self, inputs: Vec<Value>);
}

/// Capability marker for the prompt-invoking kind.
pub trait PromptInput {
    fn set_variable(&mut self, key: &str, value: String);

    /// Cancel any in-flight call and start a new one from the accumulated
    /// variables.
    fn invoke(&mut self);
}
