//! Per-node computational delay (longest path from a primary input).

use std::collections::BTreeMap;

use tracing::warn;

use crate::circuit::Circuit;

/// Delay of every point in the circuit, split into the two key spaces:
/// grid/primary-input indices and output positions. Consumers wanting the
/// unified string-keyed view of a delay report can use [`DelayMap::output_key`]
/// for the output rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DelayMap {
    node_delays: BTreeMap<usize, usize>,
    output_delays: Vec<usize>,
}

impl DelayMap {
    /// Delay of a primary input or defined node, if known.
    pub fn node_delay(&self, index: usize) -> Option<usize> {
        self.node_delays.get(&index).copied()
    }

    /// Delay of an output position, if it exists.
    pub fn output_delay(&self, position: usize) -> Option<usize> {
        self.output_delays.get(position).copied()
    }

    /// All node delays in increasing index order.
    pub fn node_delays(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.node_delays.iter().map(|(&index, &delay)| (index, delay))
    }

    /// All output delays in position order.
    pub fn output_delays(&self) -> &[usize] {
        &self.output_delays
    }

    /// Display key of an output position, `"output-{position}"`.
    pub fn output_key(position: usize) -> String {
        format!("output-{}", position)
    }
}

/// Compute the delay of every primary input, defined node and output.
///
/// Primary inputs have delay 0; a node's delay is the maximum over its
/// references of 0 for a primary input or the referenced node's delay plus
/// one; an output adds one more stage on top of its source. Delays are
/// propagated in increasing index order, which equals dependency order
/// because the parser forbids forward and self references.
pub fn compute_delays(circuit: &Circuit) -> DelayMap {
    let config = &circuit.config;

    let mut node_delays: BTreeMap<usize, usize> = (0..config.inputs).map(|i| (i, 0)).collect();
    for (&index, node) in &circuit.nodes {
        let delay = node
            .inputs
            .iter()
            .map(|&reference| {
                if config.is_primary_input(reference) {
                    0
                } else {
                    stage_delay(&node_delays, reference)
                }
            })
            .max()
            .unwrap_or(0);
        node_delays.insert(index, delay);
    }

    let output_delays = circuit
        .outputs
        .iter()
        .map(|&source| {
            if config.is_primary_input(source) {
                1
            } else {
                stage_delay(&node_delays, source)
            }
        })
        .collect();

    DelayMap {
        node_delays,
        output_delays,
    }
}

/// Delay contributed through a grid reference: the referenced node's delay
/// plus one stage. A reference with no recorded delay can only be a hole
/// that slipped through as a structurally legal connection; it defaults to 0.
fn stage_delay(node_delays: &BTreeMap<usize, usize>, reference: usize) -> usize {
    let base = node_delays.get(&reference).copied().unwrap_or_else(|| {
        warn!(reference, "delay requested for undefined grid node");
        0
    });
    base + 1
}
