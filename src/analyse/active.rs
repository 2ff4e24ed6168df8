//! Active-node computation by reverse reachability.

use std::collections::{BTreeSet, HashSet};

use tracing::warn;

use crate::circuit::Circuit;

/// Compute the set of defined nodes that transitively feed an output.
///
/// Explicit-stack reverse traversal seeded with every output reference that
/// names a grid node; primary-input outputs contribute nothing. Order of
/// visitation is irrelevant, only membership matters. A reference to a grid
/// index with no definition (a hole) is warned about and not traversed; it
/// never aborts the analysis.
pub fn active_nodes(circuit: &Circuit) -> BTreeSet<usize> {
    let start = circuit.config.start_index();

    let mut visited = HashSet::new();
    let mut stack = Vec::new();
    for &output in &circuit.outputs {
        if output >= start && visited.insert(output) {
            stack.push(output);
        }
    }

    let mut active = BTreeSet::new();
    while let Some(index) = stack.pop() {
        let Some(node) = circuit.node(index) else {
            warn!(index, "reference to undefined grid node, not traversed");
            continue;
        };
        active.insert(index);
        for &reference in &node.inputs {
            if !circuit.config.is_primary_input(reference) && visited.insert(reference) {
                stack.push(reference);
            }
        }
    }

    active
}
