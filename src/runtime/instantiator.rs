//! Descriptor-to-component construction.
//!
//! A rebuild walks the node list once and keeps going no matter what: a
//! descriptor that cannot be built becomes an [`ErrorReport`] and the rest
//! of the graph still comes up. Duplicate ids resolve to the last
//! descriptor, with the earlier instance torn down first.

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::component::{BuildEnv, ComponentSeed};
use crate::descriptor::NodeDescriptor;
use crate::hal::Pin;
use crate::protocol::ErrorReport;
use crate::registry::ComponentRegistry;
use crate::router::Components;

/// Result of one full rebuild: live components, the pin routing table for
/// board events, and a report per descriptor that failed along the way.
pub(crate) struct BuildOutcome {
    pub components: Components,
    pub watches: FxHashMap<Pin, Vec<String>>,
    pub errors: Vec<ErrorReport>,
}

pub(crate) fn build(
    nodes: &[NodeDescriptor],
    registry: &ComponentRegistry,
    env: &BuildEnv,
) -> BuildOutcome {
    let mut components: Components = FxHashMap::default();
    let mut watches: FxHashMap<Pin, Vec<String>> = FxHashMap::default();
    let mut errors = Vec::new();

    for node in nodes {
        let seed = ComponentSeed {
            id: node.id.clone(),
            kind: node.kind.clone(),
            config: node.config.clone(),
            env: env.clone(),
        };
        let component = match registry.create(seed) {
            Ok(component) => component,
            Err(err) => {
                warn!(node = %node.id, kind = %node.kind, error = %err, "construction failed");
                errors.push(ErrorReport::construction(node.clone(), err.to_string()));
                continue;
            }
        };
        debug!(node = %node.id, kind = %node.kind, "component built");

        let requests = component.watched_pins();
        if let Some(mut earlier) = components.insert(node.id.clone(), component) {
            warn!(node = %node.id, "duplicate node id, last descriptor wins");
            earlier.teardown();
            for ids in watches.values_mut() {
                ids.retain(|id| id != &node.id);
            }
        }

        for request in requests {
            match env.board.watch(request.pin, request.mode) {
                Ok(()) => watches.entry(request.pin).or_default().push(node.id.clone()),
                Err(err) => {
                    // The component stays live; it just never hears the pin.
                    warn!(node = %node.id, pin = request.pin, error = %err, "pin watch failed");
                    errors.push(ErrorReport::node(
                        node.id.clone(),
                        format!("could not watch pin {}: {err}", request.pin),
                    ));
                }
            }
        }
    }

    BuildOutcome {
        components,
        watches,
        errors,
    }
}
