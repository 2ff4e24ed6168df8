//! Parsing and representation of CGP circuit strings.
//!
//! A circuit string encodes a grid-addressed computation graph: a `{...}`
//! configuration header, a set of `([idx]...)` node definitions and a trailing
//! `(...)` output mapping, optionally preceded by `#` comment and `#%i`/`#%o`
//! name-directive lines. [`parser::parse`] turns the data line into a
//! [`Circuit`]; [`directive::extract`] handles the line-oriented pre-pass.

pub mod directive;
pub mod parser;

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use petgraph::graph::DiGraph;
use string_cache::DefaultAtom;

pub type Symbol = DefaultAtom;

/// Grid and function-set parameters extracted from the `{...}` header.
///
/// Field order matches the textual encoding:
/// `{inputs,outputs,rows,cols,arity,lback,funcSetSize}`. Immutable once
/// parsed; all grid arithmetic derives from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Number of primary inputs; they occupy indices `0..inputs`.
    pub inputs: usize,
    /// Number of circuit outputs.
    pub outputs: usize,
    /// Grid rows.
    pub rows: usize,
    /// Grid columns.
    pub cols: usize,
    /// Number of input connections every node carries.
    pub arity: usize,
    /// Maximum column distance a connection may span backwards.
    pub lback: usize,
    /// Number of distinct function ids, valid ids are `0..func_set_size`.
    pub func_set_size: usize,
}

impl Config {
    /// First grid-node index. Primary inputs occupy `0..start_index()`.
    pub fn start_index(&self) -> usize {
        self.inputs
    }

    /// Last valid grid-node index.
    pub fn last_index(&self) -> usize {
        self.start_index() + self.rows * self.cols - 1
    }

    /// Column of a grid index. Only meaningful for indices in
    /// `start_index()..=last_index()`.
    pub fn column_of(&self, index: usize) -> usize {
        (index - self.start_index()) / self.rows
    }

    /// Row of a grid index within its column.
    pub fn row_of(&self, index: usize) -> usize {
        (index - self.start_index()) % self.rows
    }

    /// Whether a reference names a primary input rather than a grid node.
    pub fn is_primary_input(&self, reference: usize) -> bool {
        reference < self.inputs
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{},{},{},{},{},{},{}}}",
            self.inputs, self.outputs, self.rows, self.cols, self.arity, self.lback,
            self.func_set_size
        )
    }
}

/// A defined grid node: its index, the function it applies and the ordered
/// references it reads. `inputs.len()` always equals the configured arity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDef {
    pub index: usize,
    pub func_id: usize,
    pub inputs: Vec<usize>,
}

impl fmt::Display for NodeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "([{}]{},{})",
            self.index,
            self.inputs.iter().join(","),
            self.func_id
        )
    }
}

/// A fully validated circuit: configuration, node map and output mapping.
///
/// The node map is sparse; grid slots without a definition are holes and
/// simply have no entry. Downstream analyses treat the whole structure as
/// immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    pub config: Config,
    pub nodes: BTreeMap<usize, NodeDef>,
    pub outputs: Vec<usize>,
}

/// Element of the [`DiGraph`] projection of a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphElement {
    /// Primary input terminal.
    Input(usize),
    /// Defined grid node.
    Cell {
        index: usize,
        func_id: usize,
        active: bool,
    },
    /// Output terminal at a given position.
    Output(usize),
}

impl fmt::Display for GraphElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphElement::Input(i) => write!(f, "in{}", i),
            GraphElement::Cell {
                index,
                func_id,
                active,
            } => {
                write!(f, "n{} f{}", index, func_id)?;
                if !active {
                    write!(f, " (inactive)")?;
                }
                Ok(())
            }
            GraphElement::Output(position) => write!(f, "out{}", position),
        }
    }
}

/// Unlabelled connection in the [`DiGraph`] projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire;

impl fmt::Display for Wire {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }
}

impl Circuit {
    /// Look up a node definition by grid index.
    pub fn node(&self, index: usize) -> Option<&NodeDef> {
        self.nodes.get(&index)
    }

    /// Project the circuit onto a [`DiGraph`] for DOT export. Edges point in
    /// the direction of data flow; nodes outside `active` are flagged so the
    /// rendering can grey them out.
    pub fn to_graph(&self, active: &BTreeSet<usize>) -> DiGraph<GraphElement, Wire> {
        let mut graph = DiGraph::new();
        let mut lut = BTreeMap::new();

        for i in 0..self.config.inputs {
            lut.insert(i, graph.add_node(GraphElement::Input(i)));
        }
        for (&index, node) in &self.nodes {
            lut.insert(
                index,
                graph.add_node(GraphElement::Cell {
                    index,
                    func_id: node.func_id,
                    active: active.contains(&index),
                }),
            );
        }
        for (&index, node) in &self.nodes {
            for &reference in &node.inputs {
                if let Some(&source) = lut.get(&reference) {
                    graph.add_edge(source, lut[&index], Wire);
                }
            }
        }
        for (position, &source) in self.outputs.iter().enumerate() {
            let terminal = graph.add_node(GraphElement::Output(position));
            if let Some(&source) = lut.get(&source) {
                graph.add_edge(source, terminal, Wire);
            }
        }

        graph
    }
}
