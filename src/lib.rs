//! CGP circuit string parsing and graph analyses.
//!
//! This library parses the compact textual encoding of a Cartesian Genetic
//! Programming (CGP) circuit, a directed acyclic computation graph written as
//! a configuration header, indexed node definitions and an output mapping,
//! into a validated structure. It derives two analyses over it: the set of
//! *active* nodes (those reachable backwards from an output) and each node's
//! *computational delay* (longest path from a primary input).
//!
//! # Input format
//!
//! ```text
//! #%i name1,name2,...     optional input names, index order
//! #%o name1,name2,...     optional output names, index order
//! # free-text comment     ignored
//! {inputs,outputs,rows,cols,arity,lback,funcSetSize}([idx]in1,...,inK,funcId)...(out1,...)
//! ```
//!
//! Whitespace is insignificant on the data line. Node definitions may appear
//! in any textual order; each index must be unique, every connection must
//! reference a primary input or a strictly lower grid index, and no
//! connection may reach back more than `lback` columns.
//!
//! # Usage Example
//!
//! ```
//! use cgpview::load_str;
//!
//! let parsed = load_str("{2,1,1,2,2,2,4}([2]0,1,0)([3]0,1,1)(3)").unwrap();
//! assert_eq!(parsed.circuit.outputs, vec![3]);
//! assert!(parsed.active.contains(&3));
//! assert_eq!(parsed.delays.output_delay(0), Some(1));
//! ```
//!
//! # Modules
//!
//! - **[`circuit`]**: the data model, the directive pre-pass and the
//!   regex-driven grammar parser with its [`ParseError`] taxonomy
//! - **[`analyse`]**: active-node reachability, delay propagation and the
//!   CLI report commands
//!
//! Parsing is a pure function of the input string: re-parsing the same text
//! yields structurally equal results, and a parse error suppresses all
//! downstream analysis. The only side effects are `tracing` warnings for the
//! non-fatal conditions (name-count mismatches, one-sided name directives,
//! references to undefined grid slots); installing a subscriber is the
//! embedder's concern.

use anyhow::Result;
use clap::Parser;
use std::{collections::BTreeSet, fs, path::Path};
use tracing::warn;

pub mod analyse;
pub mod circuit;

pub use analyse::{AnalyseArgs, CheckArgs, analyse_main, check_main};
pub use analyse::{DelayMap, active_nodes, compute_delays};
pub use circuit::parser::{ParseError, parse};
pub use circuit::{Circuit, Config, NodeDef, Symbol};

/// Everything a consumer needs to render a circuit: the parsed structure,
/// reconciled name lists and both analyses. Produced only by a fully
/// successful parse; treat as read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCircuit {
    pub circuit: Circuit,
    /// Exactly `config.inputs` names, directive-given or synthesized.
    pub input_names: Vec<Symbol>,
    /// Exactly `config.outputs` names, directive-given or synthesized.
    pub output_names: Vec<Symbol>,
    pub delays: DelayMap,
    pub active: BTreeSet<usize>,
}

/// Parse raw (possibly multi-line, directive-annotated) input into a
/// [`ParsedCircuit`].
///
/// Runs the directive pre-pass, the grammar parser, name reconciliation and
/// both analyses. Any parse error aborts before analysis.
pub fn load_str(raw: &str) -> Result<ParsedCircuit, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let scan = circuit::directive::extract(raw);
    if scan.saw_input_directive != scan.saw_output_directive {
        warn!(
            inputs = scan.saw_input_directive,
            outputs = scan.saw_output_directive,
            "only one of the #%i/#%o name directives is present"
        );
    }
    let data_line = scan.data_line.ok_or(ParseError::NoDataLine)?;

    let parsed = parse(&data_line)?;
    let input_names =
        circuit::directive::reconcile_names(scan.input_names, parsed.config.inputs, "Input");
    let output_names =
        circuit::directive::reconcile_names(scan.output_names, parsed.config.outputs, "Output");

    let delays = compute_delays(&parsed);
    let active = active_nodes(&parsed);

    Ok(ParsedCircuit {
        circuit: parsed,
        input_names,
        output_names,
        delays,
        active,
    })
}

/// Reads and parses a CGP circuit from a file.
///
/// Convenience wrapper over [`load_str`] used by the CLI commands.
pub fn read_file(file_name: &Path) -> Result<ParsedCircuit> {
    let file = fs::read_to_string(file_name)?;
    Ok(load_str(&file)?)
}

/// Command-line interface arguments for the CGP viewer tools.
#[derive(Debug, Parser)]
#[clap(
    name = "CGP Viewer",
    about = "Cartesian Genetic Programming circuit parsing and analysis tools"
)]
pub enum CLIArguments {
    /// Parse a circuit file and report whether it is valid.
    Check(CheckArgs),
    /// Report per-node delays, active nodes and the output mapping.
    Analyse(AnalyseArgs),
}
