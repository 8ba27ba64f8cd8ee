use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Deserialize;
use tracing::debug;

use crate::component::{
    BuildError, Component, ComponentError, ComponentSeed, PromptInput, TaskGuard, ValueCell,
};
use crate::llm::{PromptClient, PromptError, render_template};
use crate::value::Value;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PromptConfig {
    /// Prompt text with `{{variable}}` placeholders.
    #[serde(alias = "prompt")]
    pub template: String,
}

/// Accumulates named variables and runs one external completion per
/// `invoke`, with at most one call in flight.
///
/// `invoke` aborts the previous call and bumps the generation; a resolution
/// for an older generation is discarded even if the abort raced with its
/// send. The node's value is the busy flag, so downstream logic can gate on
/// "thinking".
pub struct Prompt {
    cell: ValueCell,
    template: String,
    vars: FxHashMap<String, String>,
    client: Arc<dyn PromptClient>,
    generation: u64,
    call: Option<TaskGuard>,
}

impl Prompt {
    pub const KIND: &'static str = "prompt";

    pub fn from_seed(seed: &ComponentSeed) -> Result<Self, BuildError> {
        let config: PromptConfig = seed.parse()?;
        Ok(Self {
            cell: seed.cell(Value::Bool(false)),
            template: config.template,
            vars: FxHashMap::default(),
            client: Arc::clone(&seed.env.prompt_client),
            generation: 0,
            call: None,
        })
    }
}

impl Component for Prompt {
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
        if action != "invoke" {
            return Ok(false);
        }
        PromptInput::invoke(self);
        Ok(true)
    }

    fn as_prompt(&self) -> Option<&dyn PromptInput> {
        Some(self)
    }

    fn as_prompt_mut(&mut self) -> Option<&mut dyn PromptInput> {
        Some(self)
    }

    fn prompt_resolved(&mut self, generation: u64, result: Result<String, PromptError>) {
        if generation != self.generation {
            debug!(
                node = %self.cell.id(),
                generation,
                current = self.generation,
                "discarding stale prompt resolution"
            );
            return;
        }
        self.call = None;
        self.cell.set(Value::Bool(false));
        match result {
            Ok(text) => self.cell.post("output", Value::Text(text)),
            Err(err) => self.cell.report(err.to_string()),
        }
    }

    fn teardown(&mut self) {
        self.call = None;
        self.generation = self.generation.wrapping_add(1);
    }
}

impl PromptInput for Prompt {
    fn set_variable(&mut self, key: &str, value: String) {
        self.vars.insert(key.to_string(), value);
    }

    fn invoke(&mut self) {
        self.generation += 1;
        self.call = None; // aborts the in-flight task, if any
        self.cell.set(Value::Bool(true));

        let generation = self.generation;
        let rendered = render_template(&self.template, &self.vars);
        let client = Arc::clone(&self.client);
        let emitter = self.cell.emitter().clone();
        let node = self.cell.id().to_string();
        self.call = Some(TaskGuard::spawn(async move {
            let result = client.complete(&rendered).await;
            let _ = emitter.prompt_resolved(&node, generation, result);
        }));
    }
}
