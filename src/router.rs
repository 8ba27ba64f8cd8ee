//! Edge dispatch: turns one emitted signal into target invocations.
//!
//! Routing is recomputed per emission from the live edge list instead of
//! pre-registered listeners, which makes dangling edges naturally harmless:
//! an edge whose endpoint is missing simply matches nothing this round.
//! Three dispatch rules, checked in order per edge:
//!
//! 1. aggregating target: regather every inbound value, call `check`;
//! 2. prompt target addressed on its `invoke` handle: rebuild the variable
//!    map from every inbound edge, then invoke;
//! 3. default: invoke the action named by the target handle with the one
//!    propagated value.
//!
//! After each successful dispatch the router posts traversal bookkeeping
//! for that edge so the host can animate the hop. Failures are isolated
//! per edge.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::component::{Component, ComponentError, Emitter};
use crate::descriptor::EdgeDescriptor;
use crate::value::Value;

pub(crate) type Components = FxHashMap<String, Box<dyn Component>>;

pub(crate) struct EdgeRouter {
    edges: Vec<EdgeDescriptor>,
}

impl EdgeRouter {
    pub fn new(edges: Vec<EdgeDescriptor>) -> Self {
        Self { edges }
    }

    /// Deliver `signal` from `source_id` along every matching edge, in edge
    /// list order. Dispatch failures are warn-logged and never stop
    /// delivery to sibling edges.
    pub fn route(
        &self,
        components: &mut Components,
        emitter: &Emitter,
        source_id: &str,
        signal: &str,
        value: &Value,
    ) {
        for edge in &self.edges {
            if edge.source_id != source_id || edge.source_handle != signal {
                continue;
            }
            match self.dispatch(components, edge, value) {
                Ok(true) => {
                    emitter.traversal(source_id, signal, value.clone(), &edge.id);
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        edge = %edge.id,
                        source = %edge.source_id,
                        target = %edge.target_id,
                        error = %err,
                        "edge dispatch failed"
                    );
                }
            }
        }
    }

    /// One edge delivery. `Ok(true)` means the target actually handled it
    /// and the traversal should be visualized.
    fn dispatch(
        &self,
        components: &mut Components,
        edge: &EdgeDescriptor,
        value: &Value,
    ) -> Result<bool, ComponentError> {
        let Some(target) = components.get(&edge.target_id) else {
            debug!(edge = %edge.id, target = %edge.target_id, "dangling edge, skipping");
            return Ok(false);
        };

        // Rule 1: aggregating targets re-check the full input list.
        if target.as_aggregate().is_some() {
            let inputs = self.gather_inputs(components, &edge.target_id);
            if let Some(target) = components.get_mut(&edge.target_id)
                && let Some(aggregate) = target.as_aggregate_mut()
            {
                aggregate.check(inputs);
                return Ok(true);
            }
            return Ok(false);
        }

        // Rule 2: invoking a prompt rebuilds its variable map first.
        if edge.target_handle == "invoke" && target.as_prompt().is_some() {
            let vars = self.gather_variables(components, &edge.target_id);
            if let Some(target) = components.get_mut(&edge.target_id)
                && let Some(prompt) = target.as_prompt_mut()
            {
                for (key, rendered) in vars {
                    prompt.set_variable(&key, rendered);
                }
                prompt.invoke();
                return Ok(true);
            }
            return Ok(false);
        }

        // Rule 3: plain action invocation.
        let Some(target) = components.get_mut(&edge.target_id) else {
            return Ok(false);
        };
        let handled = target.invoke(&edge.target_handle, value.clone())?;
        if !handled {
            debug!(
                node = %edge.target_id,
                action = %edge.target_handle,
                "target has no such action, skipping"
            );
        }
        Ok(handled)
    }

    /// Current values of every live source feeding `target_id`, in edge
    /// list order. Missing sources contribute nothing.
    fn gather_inputs(&self, components: &Components, target_id: &str) -> Vec<Value> {
        self.edges
            .iter()
            .filter(|edge| edge.target_id == target_id)
            .filter_map(|edge| components.get(&edge.source_id))
            .map(|source| source.value().clone())
            .collect()
    }

    /// Variable map for a prompt target: key is the inbound edge's target
    /// handle, value the source's rendered text. Edge order is preserved
    /// and colliding keys concatenate.
    fn gather_variables(&self, components: &Components, target_id: &str) -> Vec<(String, String)> {
        let mut vars: Vec<(String, String)> = Vec::new();
        for edge in self.edges.iter().filter(|e| e.target_id == target_id) {
            let Some(source) = components.get(&edge.source_id) else {
                continue;
            };
            let rendered = source.value().render();
            if let Some((_, existing)) = vars
                .iter_mut()
                .find(|(key, _)| *key == edge.target_handle)
            {
                existing.push_str(", ");
                existing.push_str(&rendered);
            } else {
                vars.push((edge.target_handle.clone(), rendered));
            }
        }
        vars
    }
}
