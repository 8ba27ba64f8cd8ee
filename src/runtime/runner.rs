//! The live graph runtime: one event loop, one component map, one epoch.
//!
//! All component state lives inside a single task that drains the envelope
//! queue. Components never call each other; they emit, the loop routes.
//! That makes `&mut` access to any component trivially safe and keeps
//! dispatch order deterministic.
//!
//! A `flow` command replaces the whole graph. Rather than chase down every
//! timer and prompt task spawned under the old graph, the loop bumps its
//! epoch: node-addressed envelopes are stamped at emission time and stale
//! stamps are dropped on arrival. Old tasks are aborted when their guards
//! drop with the old components, so the fence only has to cover the
//! in-flight tail.

use std::sync::Arc;

use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::component::{BuildEnv, Emission, Emitter, Envelope, TaskGuard};
use crate::hal::{BoardDriver, BoardEvent, Pin};
use crate::host::{UpdateBus, UpdateSink, UpdateStream};
use crate::llm::{EchoClient, PromptClient};
use crate::protocol::{BoardNotice, ErrorReport, HostCommand, Update};
use crate::registry::ComponentRegistry;
use crate::router::{Components, EdgeRouter};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::instantiator;
use crate::value::Value;

#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("runtime mailbox closed; was the runtime shut down?")]
    #[diagnostic(code(breadboard::runtime::mailbox_closed))]
    MailboxClosed,

    #[error("runtime task join error: {0}")]
    #[diagnostic(code(breadboard::runtime::join))]
    Join(#[from] tokio::task::JoinError),
}

/// Builder for a running graph runtime.
///
/// The runtime starts empty; the first `flow` command populates it. Updates
/// stream out through an [`UpdateBus`], NDJSON on stdout by default.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use breadboard::hal::MockBoard;
/// use breadboard::protocol::HostCommand;
/// use breadboard::runtime::GraphRuntime;
///
/// # async fn example() -> Result<(), breadboard::runtime::RuntimeError> {
/// let handle = GraphRuntime::new(Arc::new(MockBoard::new())).start();
/// handle.send(HostCommand::flow(vec![], vec![]))?;
/// handle.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct GraphRuntime {
    registry: ComponentRegistry,
    board: Arc<dyn BoardDriver>,
    prompt_client: Arc<dyn PromptClient>,
    config: RuntimeConfig,
    bus: Option<UpdateBus>,
}

impl GraphRuntime {
    pub fn new(board: Arc<dyn BoardDriver>) -> Self {
        Self {
            registry: ComponentRegistry::default(),
            board,
            prompt_client: Arc::new(EchoClient),
            config: RuntimeConfig::default(),
            bus: None,
        }
    }

    /// Swap in a custom kind registry.
    #[must_use]
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Client used by `prompt` nodes. Defaults to [`EchoClient`].
    #[must_use]
    pub fn with_prompt_client(mut self, client: Arc<dyn PromptClient>) -> Self {
        self.prompt_client = client;
        self
    }

    /// Replace the default stdout bus, e.g. to attach test sinks or drop
    /// stdout entirely.
    #[must_use]
    pub fn with_bus(mut self, bus: UpdateBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Spawn the event loop and hand back its mailbox.
    pub fn start(self) -> RuntimeHandle {
        let bus = self
            .bus
            .unwrap_or_else(|| self.config.bus.build_bus());
        bus.listen();

        let (tx, rx) = flume::unbounded();

        // Pump raw driver events into the envelope queue so the loop stays
        // the only consumer of board state.
        let board_events = self.board.events();
        let pump_tx = tx.clone();
        let board_pump = TaskGuard::spawn(async move {
            while let Ok(event) = board_events.recv_async().await {
                if pump_tx.send(Envelope::Board(event)).is_err() {
                    break;
                }
            }
        });

        let core = RuntimeCore {
            registry: self.registry,
            board: self.board,
            prompt_client: self.prompt_client,
            config: self.config,
            updates: bus.sender(),
            envelope_tx: tx.clone(),
            epoch: 1,
            emitter: Emitter::new(tx.clone(), 1),
            components: FxHashMap::default(),
            router: EdgeRouter::new(Vec::new()),
            watches: FxHashMap::default(),
            _board_pump: board_pump,
        };
        let task = tokio::spawn(event_loop(core, rx));

        RuntimeHandle {
            commands: tx,
            bus,
            task,
        }
    }
}

/// Mailbox onto a running [`GraphRuntime`].
pub struct RuntimeHandle {
    commands: flume::Sender<Envelope>,
    bus: UpdateBus,
    task: JoinHandle<()>,
}

impl RuntimeHandle {
    /// Queue one typed host command.
    pub fn send(&self, command: HostCommand) -> Result<(), RuntimeError> {
        self.commands
            .send(Envelope::Command(command))
            .map_err(|_| RuntimeError::MailboxClosed)
    }

    /// Queue one raw host message. Malformed input surfaces as a protocol
    /// error update, never as a send failure.
    pub fn send_json(&self, text: impl Into<String>) -> Result<(), RuntimeError> {
        self.commands
            .send(Envelope::Raw(text.into()))
            .map_err(|_| RuntimeError::MailboxClosed)
    }

    /// Live view of the outbound update stream.
    pub fn subscribe(&self) -> UpdateStream {
        self.bus.subscribe()
    }

    /// Attach another sink to the outbound bus.
    pub fn add_sink<T: UpdateSink + 'static>(&self, sink: T) {
        self.bus.add_sink(sink);
    }

    /// Tear down the graph, stop the loop and flush the bus.
    pub async fn shutdown(self) -> Result<(), RuntimeError> {
        let _ = self.commands.send(Envelope::Shutdown);
        self.task.await?;
        self.bus.stop().await;
        Ok(())
    }
}

async fn event_loop(mut core: RuntimeCore, queue: flume::Receiver<Envelope>) {
    info!(runtime = %core.config.runtime_id, "runtime loop up");
    while let Ok(envelope) = queue.recv_async().await {
        if !core.process(envelope) {
            break;
        }
    }
    core.halt();
    info!(runtime = %core.config.runtime_id, "runtime loop down");
}

/// Loop-owned state. Nothing in here is shared; the queue is the only way in.
struct RuntimeCore {
    registry: ComponentRegistry,
    board: Arc<dyn BoardDriver>,
    prompt_client: Arc<dyn PromptClient>,
    config: RuntimeConfig,
    updates: flume::Sender<Update>,
    envelope_tx: flume::Sender<Envelope>,
    epoch: u64,
    emitter: Emitter,
    components: Components,
    router: EdgeRouter,
    watches: FxHashMap<Pin, Vec<String>>,
    _board_pump: TaskGuard,
}

impl RuntimeCore {
    /// Handle one envelope. Returns `false` only on shutdown.
    fn process(&mut self, envelope: Envelope) -> bool {
        match envelope {
            Envelope::Emission {
                epoch,
                node,
                emission,
            } => {
                if epoch != self.epoch {
                    debug!(node = %node, epoch, "stale emission dropped");
                    return true;
                }
                self.emission(&node, emission);
            }
            Envelope::Timer { epoch, node } => {
                if epoch != self.epoch {
                    debug!(node = %node, epoch, "stale timer dropped");
                    return true;
                }
                if let Some(component) = self.components.get_mut(&node) {
                    component.timer_fired();
                }
            }
            Envelope::PromptResolved {
                epoch,
                node,
                generation,
                result,
            } => {
                if epoch != self.epoch {
                    debug!(node = %node, epoch, "stale prompt result dropped");
                    return true;
                }
                if let Some(component) = self.components.get_mut(&node) {
                    component.prompt_resolved(generation, result);
                }
            }
            Envelope::Board(event) => self.board_event(event),
            Envelope::Command(command) => self.command(command),
            Envelope::Raw(text) => self.raw(&text),
            Envelope::Shutdown => return false,
        }
        true
    }

    fn emission(&mut self, node: &str, emission: Emission) {
        match emission {
            Emission::Changed { value } => {
                self.post(Update::node(node, "change", value.clone()));
                self.route(node, "change", &value);
            }
            Emission::Signal {
                name,
                value,
                edge: None,
            } => {
                // Named signals echo the component's current value first so
                // the host paints state before reacting to the action.
                if let Some(component) = self.components.get(node) {
                    self.post(Update::node(node, "change", component.value().clone()));
                }
                self.post(Update::node(node, &name, value.clone()));
                self.route(node, &name, &value);
            }
            Emission::Signal {
                name,
                value,
                edge: Some(edge),
            } => {
                // Traversal bookkeeping is host-only; routing it would loop.
                self.post(Update::traversal(node, &name, value, edge));
            }
            Emission::Error { message } => {
                self.post(Update::Error(ErrorReport::node(node, message)));
            }
        }
    }

    fn route(&mut self, source: &str, signal: &str, value: &Value) {
        self.router
            .route(&mut self.components, &self.emitter, source, signal, value);
    }

    fn board_event(&mut self, event: BoardEvent) {
        match event {
            BoardEvent::Pin { pin, event } => {
                let Some(ids) = self.watches.get(&pin) else {
                    return;
                };
                for id in ids {
                    if let Some(component) = self.components.get_mut(id) {
                        component.pin_event(&event);
                    }
                }
            }
            BoardEvent::Ready => self.post(Update::Board(BoardNotice::Ready)),
            BoardEvent::Close => self.post(Update::Board(BoardNotice::Close)),
            BoardEvent::Exit => self.post(Update::Board(BoardNotice::Exit)),
            BoardEvent::Error { message } => {
                self.post(Update::Error(ErrorReport::board(message)));
            }
        }
    }

    fn command(&mut self, command: HostCommand) {
        match command {
            HostCommand::Flow { nodes, edges } => self.rebuild(nodes, edges),
            HostCommand::SetExternal { node_id, value } => {
                match self.components.get_mut(&node_id) {
                    Some(component) => component.set_external(Value::from(value)),
                    None => debug!(node = %node_id, "setExternal for unknown node ignored"),
                }
            }
        }
    }

    fn raw(&mut self, text: &str) {
        match serde_json::from_str::<HostCommand>(text) {
            Ok(command) => self.command(command),
            Err(err) => {
                warn!(error = %err, "unparseable host message");
                self.post(Update::Error(ErrorReport::protocol(format!(
                    "unrecognized host message: {err}"
                ))));
            }
        }
    }

    /// Full graph replacement. The old graph is torn down before the new
    /// one is built, and the epoch fence cuts off anything the old graph
    /// still has in flight.
    #[instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len(), epoch = self.epoch + 1))]
    fn rebuild(
        &mut self,
        nodes: Vec<crate::descriptor::NodeDescriptor>,
        edges: Vec<crate::descriptor::EdgeDescriptor>,
    ) {
        for component in self.components.values_mut() {
            component.teardown();
        }
        self.components.clear();
        self.watches.clear();
        self.board.clear_watches();

        self.epoch += 1;
        self.emitter = Emitter::new(self.envelope_tx.clone(), self.epoch);

        let env = BuildEnv {
            board: Arc::clone(&self.board),
            emitter: self.emitter.clone(),
            timing: self.config.timing,
            prompt_client: Arc::clone(&self.prompt_client),
        };
        let outcome = instantiator::build(&nodes, &self.registry, &env);
        info!(
            built = outcome.components.len(),
            failed = outcome.errors.len(),
            "graph rebuilt"
        );
        self.components = outcome.components;
        self.watches = outcome.watches;
        self.router = EdgeRouter::new(edges);
        for report in outcome.errors {
            self.post(Update::Error(report));
        }
    }

    fn post(&self, update: Update) {
        if self.updates.send(update).is_err() {
            debug!("update bus closed; dropping update");
        }
    }

    fn halt(&mut self) {
        for component in self.components.values_mut() {
            component.teardown();
        }
        self.components.clear();
        self.board.clear_watches();
    }
}
