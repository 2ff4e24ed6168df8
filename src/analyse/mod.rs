//! Analysis commands over parsed circuits.
//!
//! - [`check_main`]: parse a circuit file and report whether it is valid.
//! - [`analyse_main`]: render delay and activity reports, with optional DOT
//!   output of the circuit graph.

use std::{fs, io::Write, path::PathBuf};

use anyhow::{Result, bail};
use clap::Parser;
use itertools::Itertools;
use petgraph::dot::{Config as DotConfig, Dot};
use prettytable::*;

use crate::circuit::Circuit;
use crate::{ParsedCircuit, read_file};

pub mod active;
pub mod delay;

pub use active::active_nodes;
pub use delay::{DelayMap, compute_delays};

/// Command-line arguments for the check command.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// CGP circuit input file
    pub input: PathBuf,
}

/// Command-line arguments for the analyse command.
#[derive(Parser, Debug)]
pub struct AnalyseArgs {
    /// CGP circuit input file
    pub input: PathBuf,

    /// Report file for analysis results (default: stdout)
    #[clap(long, short)]
    pub report: Option<PathBuf>,

    /// DOT file displaying the circuit graph with inactive nodes flagged
    #[clap(long)]
    pub dot: Option<PathBuf>,
}

/// Parse a circuit file and print a one-paragraph verdict.
///
/// A parse failure surfaces the error and its detail verbatim and fails the
/// command; no analysis is attempted on a failed parse.
pub fn check_main(args: CheckArgs) -> Result<()> {
    let CheckArgs { input } = args;

    let text = fs::read_to_string(&input)?;
    let parsed = match crate::load_str(&text) {
        Ok(parsed) => parsed,
        Err(err) => bail!("{} {}", err, err.detail()),
    };

    let config = &parsed.circuit.config;
    let max_output_delay = parsed
        .delays
        .output_delays()
        .iter()
        .max()
        .copied()
        .unwrap_or(0);
    println!(
        "{}: valid CGP circuit; {}x{} grid, {} inputs, {} outputs, \
         {} defined nodes ({} active), max output delay {}",
        input.display(),
        config.rows,
        config.cols,
        config.inputs,
        config.outputs,
        parsed.circuit.nodes.len(),
        parsed.active.len(),
        max_output_delay,
    );

    Ok(())
}

/// Render delay and activity tables for a circuit file.
///
/// Writes to stdout or the `--report` file; `--dot` additionally dumps the
/// circuit graph in Graphviz format with inactive nodes flagged.
pub fn analyse_main(args: AnalyseArgs) -> Result<()> {
    let AnalyseArgs { input, report, dot } = args;

    // Create writer for output (file or stdout)
    let mut writer: Box<dyn Write> = match report {
        Some(path) => Box::new(fs::File::create(path)?),
        None => Box::new(std::io::stdout()),
    };

    let parsed = read_file(&input)?;

    if let Some(filename) = dot {
        let graph = parsed.circuit.to_graph(&parsed.active);
        fs::write(
            filename,
            format!("{}", Dot::with_config(&graph, &[DotConfig::EdgeNoLabel])),
        )?;
    }

    write_report(&parsed, &mut writer)?;
    Ok(())
}

fn write_report<W: Write>(parsed: &ParsedCircuit, writer: &mut W) -> Result<()> {
    let ParsedCircuit {
        circuit,
        input_names,
        output_names,
        delays,
        active,
    } = parsed;
    let config = &circuit.config;

    writeln!(
        writer,
        "Configuration {}: {}x{} grid, arity {}, lback {}, {} functions",
        config, config.rows, config.cols, config.arity, config.lback, config.func_set_size
    )?;

    let mut inputs = Table::new();
    inputs.set_titles(row!["Input", "Name", "Delay"]);
    inputs.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for (i, name) in input_names.iter().enumerate() {
        inputs.add_row(row![i, name, delays.node_delay(i).unwrap_or(0)]);
    }
    writeln!(writer, "\nPrimary inputs:")?;
    inputs.print(writer)?;

    let mut nodes = Table::new();
    nodes.set_titles(row!["A", "Node", "Row", "Col", "Function", "Inputs", "Delay"]);
    nodes.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for (&index, node) in &circuit.nodes {
        nodes.add_row(row![
            if active.contains(&index) { "*" } else { " " },
            index,
            config.row_of(index),
            config.column_of(index),
            node.func_id,
            node.inputs.iter().join(", "),
            delays.node_delay(index).unwrap_or(0),
        ]);
    }
    writeln!(
        writer,
        "\nNodes ({} defined, {} active):",
        circuit.nodes.len(),
        active.len()
    )?;
    nodes.print(writer)?;

    let mut outputs = Table::new();
    outputs.set_titles(row!["Output", "Name", "Source", "Delay"]);
    outputs.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    for (position, &source) in circuit.outputs.iter().enumerate() {
        let source = if config.is_primary_input(source) {
            format!("input {}", source)
        } else {
            format!("node {}", source)
        };
        outputs.add_row(row![
            DelayMap::output_key(position),
            output_names[position],
            source,
            delays.output_delay(position).unwrap_or(0),
        ]);
    }
    writeln!(writer, "\nOutputs:")?;
    outputs.print(writer)?;

    Ok(())
}

/// Convenience wrapper running both analyses on an already parsed circuit.
pub fn analyse_circuit(circuit: &Circuit) -> (DelayMap, std::collections::BTreeSet<usize>) {
    (compute_delays(circuit), active_nodes(circuit))
}
