//! Regex-driven parser for the single-line CGP expression.
//!
//! Validation is ordered and short-circuiting: the configuration header is
//! extracted and range-checked first, then every node definition is checked in
//! textual order (grid range, uniqueness, arity, function id, connection
//! legality, lookback), then the trailing output mapping. The first failing
//! check aborts the parse; no partial result is ever returned.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use super::{Circuit, Config, NodeDef};

/// Error response of [`parse`]. Each variant carries the concrete values
/// needed to render a specific, actionable message; [`ParseError::detail`]
/// supplies the longer explanation paired with the headline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Input is empty or whitespace-only.
    EmptyInput,
    /// Multi-line input contained only comments and directives.
    NoDataLine,
    /// No `{...}` configuration block.
    MissingConfig,
    /// A configuration token did not parse as an integer.
    NonNumericConfig { token: String },
    /// The configuration block held the wrong number of parameters.
    WrongConfigArity { found: usize },
    /// A configuration field violated its lower bound.
    ConfigFieldOutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
    },
    /// The grid node indices do not fit the machine word size.
    GridTooLarge { rows: usize, cols: usize },
    /// A node definition index fell outside the grid.
    NodeIndexOutOfRange {
        index: usize,
        min: usize,
        max: usize,
    },
    /// The same node index was defined twice.
    DuplicateNodeDefinition { index: usize },
    /// A node definition value did not parse as an integer.
    NonNumericNodeContent { index: usize, token: String },
    /// A node definition held the wrong number of values.
    WrongNodeArity {
        index: usize,
        expected: usize,
        found: usize,
    },
    /// A node's function id fell outside the function set.
    FunctionIdOutOfRange {
        index: usize,
        func_id: i64,
        func_set_size: usize,
    },
    /// A connection referenced neither a primary input nor an earlier node.
    InvalidConnection {
        index: usize,
        reference: i64,
        position: usize,
    },
    /// A connection reached further back than the configured lookback.
    LbackViolation {
        index: usize,
        reference: usize,
        distance: usize,
        lback: usize,
    },
    /// The expression defined no nodes at all.
    NoNodeDefinitions,
    /// No trailing `(...)` output block.
    MissingOutputDefinition,
    /// An output token did not parse as an integer.
    InvalidOutputDefinition { token: String },
    /// The output block held the wrong number of references.
    OutputCountMismatch { expected: usize, found: usize },
    /// An output referenced neither a primary input nor a defined node.
    InvalidOutputReference { reference: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::EmptyInput => write!(f, "CGP string is empty."),
            ParseError::NoDataLine => write!(f, "No data line found."),
            ParseError::MissingConfig => write!(f, "Missing configuration block."),
            ParseError::NonNumericConfig { token } => {
                write!(f, "Invalid configuration: non-numeric value '{}'.", token)
            }
            ParseError::WrongConfigArity { found } => {
                write!(
                    f,
                    "Invalid configuration: Expected 7 parameters, found {}.",
                    found
                )
            }
            ParseError::ConfigFieldOutOfRange { field, value, .. } => {
                write!(f, "Invalid configuration: {} is {}.", field, value)
            }
            ParseError::GridTooLarge { rows, cols } => {
                write!(
                    f,
                    "Invalid configuration: {}x{} grid is too large.",
                    rows, cols
                )
            }
            ParseError::NodeIndexOutOfRange { index, .. } => {
                write!(f, "Node index {} out of range.", index)
            }
            ParseError::DuplicateNodeDefinition { index } => {
                write!(f, "Duplicate definition of node {}.", index)
            }
            ParseError::NonNumericNodeContent { index, token } => {
                write!(f, "Node {}: non-numeric value '{}'.", index, token)
            }
            ParseError::WrongNodeArity {
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Node {}: expected {} values, found {}.",
                    index, expected, found
                )
            }
            ParseError::FunctionIdOutOfRange { index, func_id, .. } => {
                write!(f, "Node {}: function id {} out of range.", index, func_id)
            }
            ParseError::InvalidConnection {
                index, reference, ..
            } => {
                write!(f, "Node {}: invalid connection to {}.", index, reference)
            }
            ParseError::LbackViolation {
                index, reference, ..
            } => {
                write!(
                    f,
                    "Node {}: lookback violation on connection to {}.",
                    index, reference
                )
            }
            ParseError::NoNodeDefinitions => write!(f, "No node definitions found."),
            ParseError::MissingOutputDefinition => {
                write!(f, "Missing output definition block.")
            }
            ParseError::InvalidOutputDefinition { token } => {
                write!(f, "Invalid output definition: bad value '{}'.", token)
            }
            ParseError::OutputCountMismatch { expected, found } => {
                write!(
                    f,
                    "Output count mismatch: expected {}, found {}.",
                    expected, found
                )
            }
            ParseError::InvalidOutputReference { reference } => {
                write!(f, "Output references unknown node {}.", reference)
            }
        }
    }
}

impl Error for ParseError {}

impl ParseError {
    /// Longer explanation paired with the [`fmt::Display`] headline.
    pub fn detail(&self) -> String {
        match self {
            ParseError::EmptyInput => "Nothing to parse.".into(),
            ParseError::NoDataLine => {
                "Every line is a comment or directive; one non-'#' data line is required.".into()
            }
            ParseError::MissingConfig => {
                "Expected a {inputs,outputs,rows,cols,arity,lback,funcSetSize} header.".into()
            }
            ParseError::NonNumericConfig { .. } => {
                "All configuration parameters must be integers.".into()
            }
            ParseError::WrongConfigArity { .. } => {
                "The header is {inputs,outputs,rows,cols,arity,lback,funcSetSize}.".into()
            }
            ParseError::ConfigFieldOutOfRange { field, min, .. } => {
                format!("{} must be at least {}.", field, min)
            }
            ParseError::GridTooLarge { .. } => {
                "inputs + rows * cols must fit the machine word size.".into()
            }
            ParseError::NodeIndexOutOfRange { min, max, .. } => {
                format!("Valid node indices are in [{}-{}].", min, max)
            }
            ParseError::DuplicateNodeDefinition { .. } => {
                "Each grid index may be defined at most once.".into()
            }
            ParseError::NonNumericNodeContent { .. } => {
                "Node values must be integers: arity connections followed by a function id.".into()
            }
            ParseError::WrongNodeArity { expected, .. } => {
                format!(
                    "Each node takes {} values: arity connections followed by a function id.",
                    expected
                )
            }
            ParseError::FunctionIdOutOfRange { func_set_size, .. } => {
                format!("Function ids lie in [0-{}].", func_set_size - 1)
            }
            ParseError::InvalidConnection { position, .. } => {
                format!(
                    "Connection {} must reference a primary input or an earlier node; \
                     forward and self references are not allowed.",
                    position
                )
            }
            ParseError::LbackViolation {
                distance, lback, ..
            } => {
                format!(
                    "Column distance {} exceeds the configured lookback {}.",
                    distance, lback
                )
            }
            ParseError::NoNodeDefinitions => {
                "At least one ([idx]...) node definition is required.".into()
            }
            ParseError::MissingOutputDefinition => {
                "The expression must end with a (out1,out2,...) block.".into()
            }
            ParseError::InvalidOutputDefinition { .. } => {
                "Output references must be integers.".into()
            }
            ParseError::OutputCountMismatch { expected, .. } => {
                format!("The configuration declares {} outputs.", expected)
            }
            ParseError::InvalidOutputReference { .. } => {
                "Outputs must reference a primary input or a defined node.".into()
            }
        }
    }
}

lazy_static! {
    static ref CONFIG_RE: Regex = Regex::new(r"\{([^{}]*)\}").unwrap();
    static ref NODE_RE: Regex = Regex::new(r"\(\[(\d+)\]([^()]*)\)").unwrap();
    static ref OUTPUT_RE: Regex = Regex::new(r"\((\d+(?:,\d+)*)\)$").unwrap();
}

fn parse_numbers<E>(content: &str, on_bad: impl Fn(&str) -> E) -> Result<Vec<i64>, E> {
    content
        .split(',')
        .map(|token| token.parse::<i64>().map_err(|_| on_bad(token)))
        .collect()
}

/// Parse a single-line CGP expression into a validated [`Circuit`].
///
/// The input is expected to be the data line only; comment and directive
/// lines are handled by [`super::directive::extract`]. Whitespace is
/// insignificant and removed before matching.
pub fn parse(input: &str) -> Result<Circuit, ParseError> {
    let text: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if text.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let config = parse_config(&text)?;
    let start = config.start_index();
    let last = config.last_index();

    let mut nodes: BTreeMap<usize, NodeDef> = BTreeMap::new();
    for captures in NODE_RE.captures_iter(&text) {
        // An index too large for usize is out of any grid.
        let index = captures[1].parse::<usize>().unwrap_or(usize::MAX);
        if index < start || index > last {
            return Err(ParseError::NodeIndexOutOfRange {
                index,
                min: start,
                max: last,
            });
        }
        if nodes.contains_key(&index) {
            return Err(ParseError::DuplicateNodeDefinition { index });
        }

        let values = parse_numbers(&captures[2], |token| ParseError::NonNumericNodeContent {
            index,
            token: token.to_string(),
        })?;
        if values.len() != config.arity + 1 {
            return Err(ParseError::WrongNodeArity {
                index,
                expected: config.arity + 1,
                found: values.len(),
            });
        }

        let func_id = values[config.arity];
        if func_id < 0 || func_id as usize >= config.func_set_size {
            return Err(ParseError::FunctionIdOutOfRange {
                index,
                func_id,
                func_set_size: config.func_set_size,
            });
        }

        let mut inputs = Vec::with_capacity(config.arity);
        for (position, &reference) in values[..config.arity].iter().enumerate() {
            if reference >= 0 && (reference as usize) < config.inputs {
                inputs.push(reference as usize);
                continue;
            }
            // Grid references must point strictly backwards.
            if reference < start as i64 || reference as usize >= index {
                return Err(ParseError::InvalidConnection {
                    index,
                    reference,
                    position,
                });
            }
            let reference = reference as usize;
            let distance = config.column_of(index) - config.column_of(reference);
            if distance > config.lback {
                return Err(ParseError::LbackViolation {
                    index,
                    reference,
                    distance,
                    lback: config.lback,
                });
            }
            inputs.push(reference);
        }

        nodes.insert(
            index,
            NodeDef {
                index,
                func_id: func_id as usize,
                inputs,
            },
        );
    }

    if nodes.is_empty() {
        return Err(ParseError::NoNodeDefinitions);
    }

    let outputs = OUTPUT_RE
        .captures(&text)
        .ok_or(ParseError::MissingOutputDefinition)?;
    let outputs: Vec<usize> = outputs[1]
        .split(',')
        .map(|token| {
            token
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidOutputDefinition {
                    token: token.to_string(),
                })
        })
        .collect::<Result<_, _>>()?;
    if outputs.len() != config.outputs {
        return Err(ParseError::OutputCountMismatch {
            expected: config.outputs,
            found: outputs.len(),
        });
    }
    for &reference in &outputs {
        if !config.is_primary_input(reference) && !nodes.contains_key(&reference) {
            return Err(ParseError::InvalidOutputReference { reference });
        }
    }

    Ok(Circuit {
        config,
        nodes,
        outputs,
    })
}

fn parse_config(text: &str) -> Result<Config, ParseError> {
    let captures = CONFIG_RE.captures(text).ok_or(ParseError::MissingConfig)?;
    let values = parse_numbers(&captures[1], |token| ParseError::NonNumericConfig {
        token: token.to_string(),
    })?;
    if values.len() != 7 {
        return Err(ParseError::WrongConfigArity {
            found: values.len(),
        });
    }

    // Lower bounds are checked in declaration order, first violation wins.
    let bounds: [(&'static str, i64); 7] = [
        ("inputs", 0),
        ("outputs", 1),
        ("rows", 1),
        ("cols", 1),
        ("arity", 2),
        ("lback", 1),
        ("funcSetSize", 1),
    ];
    for ((field, min), &value) in bounds.iter().copied().zip(values.iter()) {
        if value < min {
            return Err(ParseError::ConfigFieldOutOfRange { field, value, min });
        }
    }

    // The grid node indices run up to inputs + rows*cols - 1; reject headers
    // whose range cannot be addressed instead of overflowing later.
    let inputs = values[0] as usize;
    let rows = values[2] as usize;
    let cols = values[3] as usize;
    if rows
        .checked_mul(cols)
        .and_then(|nodes| nodes.checked_add(inputs))
        .is_none()
    {
        return Err(ParseError::GridTooLarge { rows, cols });
    }

    Ok(Config {
        inputs,
        outputs: values[1] as usize,
        rows,
        cols,
        arity: values[4] as usize,
        lback: values[5] as usize,
        func_set_size: values[6] as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid() {
        let circuit = parse("{2,1,1,2,2,2,4}([2]0,1,0)([3]0,1,1)(3)").unwrap();
        assert_eq!(
            circuit.config,
            Config {
                inputs: 2,
                outputs: 1,
                rows: 1,
                cols: 2,
                arity: 2,
                lback: 2,
                func_set_size: 4,
            }
        );
        assert_eq!(circuit.config.start_index(), 2);
        assert_eq!(circuit.nodes.len(), 2);
        assert_eq!(circuit.nodes[&2].func_id, 0);
        assert_eq!(circuit.nodes[&2].inputs, vec![0, 1]);
        assert_eq!(circuit.nodes[&3].func_id, 1);
        assert_eq!(circuit.nodes[&3].inputs, vec![0, 1]);
        assert_eq!(circuit.outputs, vec![3]);
    }

    #[test]
    fn whitespace_is_insignificant() {
        let compact = parse("{2,1,1,2,2,2,4}([2]0,1,0)([3]0,1,1)(3)").unwrap();
        let spaced = parse(" { 2 ,1, 1,2 ,2,2,4 } ( [2] 0, 1, 0 ) ([3]0,1,1)  (3) ").unwrap();
        assert_eq!(compact, spaced);
    }

    #[test]
    fn parse_is_idempotent() {
        let input = "{2,2,2,2,2,2,4}([2]0,1,0)([3]1,1,1)([4]2,3,2)(4,2)";
        assert_eq!(parse(input).unwrap(), parse(input).unwrap());
    }

    #[test]
    fn err_empty() {
        assert_eq!(parse(""), Err(ParseError::EmptyInput));
        assert_eq!(parse("   \t "), Err(ParseError::EmptyInput));
        assert_eq!(parse("").unwrap_err().to_string(), "CGP string is empty.");
    }

    #[test]
    fn err_missing_config() {
        let err = parse("([2]0,1,0)([3]0,1,1)(3)").unwrap_err();
        assert_eq!(err, ParseError::MissingConfig);
        assert_eq!(err.to_string(), "Missing configuration block.");
    }

    #[test]
    fn err_wrong_config_arity() {
        let err = parse("{2,1,1,2,2}([2]0,1,0)([3]0,1,1)(3)").unwrap_err();
        assert_eq!(err, ParseError::WrongConfigArity { found: 5 });
        assert_eq!(
            err.to_string(),
            "Invalid configuration: Expected 7 parameters, found 5."
        );
    }

    #[test]
    fn err_non_numeric_config() {
        let err = parse("{2,1,one,2,2,2,4}([2]0,1,0)(2)").unwrap_err();
        assert_eq!(
            err,
            ParseError::NonNumericConfig {
                token: "one".into()
            }
        );
    }

    #[test]
    fn err_config_bounds_short_circuit_in_order() {
        // arity 1 and lback 0 both violate; arity comes first.
        let err = parse("{2,1,1,2,1,0,4}([2]0,1,0)(2)").unwrap_err();
        assert_eq!(
            err,
            ParseError::ConfigFieldOutOfRange {
                field: "arity",
                value: 1,
                min: 2,
            }
        );
        assert!(err.detail().contains("at least 2"));

        let err = parse("{2,0,1,2,2,2,4}([2]0,1,0)(2)").unwrap_err();
        assert_eq!(
            err,
            ParseError::ConfigFieldOutOfRange {
                field: "outputs",
                value: 0,
                min: 1,
            }
        );

        let err = parse("{-1,1,1,2,2,2,4}([2]0,1,0)(2)").unwrap_err();
        assert_eq!(
            err,
            ParseError::ConfigFieldOutOfRange {
                field: "inputs",
                value: -1,
                min: 0,
            }
        );
    }

    #[test]
    fn err_grid_too_large() {
        // rows * cols overflows usize; the header is rejected up front
        // instead of corrupting the node index range.
        let err = parse("{0,1,5000000000,5000000000,2,1,1}([1]0,0,0)(1)").unwrap_err();
        assert_eq!(
            err,
            ParseError::GridTooLarge {
                rows: 5_000_000_000,
                cols: 5_000_000_000,
            }
        );
        assert!(err.to_string().contains("too large"));

        // inputs + rows * cols overflowing is rejected the same way.
        let err = parse("{9223372036854775807,1,2,9223372036854775807,2,1,1}([1]0,0,0)(1)")
            .unwrap_err();
        assert!(matches!(err, ParseError::GridTooLarge { .. }));

        // A large but addressable grid still parses.
        let circuit = parse("{2,1,1000,1000,2,1000,4}([2]0,1,0)(2)").unwrap();
        assert_eq!(circuit.config.last_index(), 1_000_001);
    }

    #[test]
    fn err_node_index_out_of_range() {
        let err = parse("{2,1,1,2,2,2,4}([4]0,1,0)([5]0,1,1)(5)").unwrap_err();
        assert_eq!(
            err,
            ParseError::NodeIndexOutOfRange {
                index: 4,
                min: 2,
                max: 3,
            }
        );
        assert!(err.to_string().contains("Node index 4 out of range"));
        assert!(err.detail().contains("[2-3]"));

        let err = parse("{2,1,1,2,2,2,4}([1]0,1,0)(1)").unwrap_err();
        assert!(matches!(
            err,
            ParseError::NodeIndexOutOfRange { index: 1, .. }
        ));
    }

    #[test]
    fn err_duplicate_node() {
        let err = parse("{2,1,1,2,2,2,4}([2]0,1,0)([2]0,1,1)(2)").unwrap_err();
        assert_eq!(err, ParseError::DuplicateNodeDefinition { index: 2 });
    }

    #[test]
    fn err_non_numeric_node_content() {
        let err = parse("{2,1,1,2,2,2,4}([2]0,x,0)(2)").unwrap_err();
        assert_eq!(
            err,
            ParseError::NonNumericNodeContent {
                index: 2,
                token: "x".into()
            }
        );
    }

    #[test]
    fn err_wrong_node_arity() {
        let err = parse("{2,1,1,2,2,2,4}([2]0,1,0,1)(2)").unwrap_err();
        assert_eq!(
            err,
            ParseError::WrongNodeArity {
                index: 2,
                expected: 3,
                found: 4,
            }
        );
    }

    #[test]
    fn err_function_id_out_of_range() {
        let err = parse("{2,1,1,2,2,2,4}([2]0,1,4)(2)").unwrap_err();
        assert_eq!(
            err,
            ParseError::FunctionIdOutOfRange {
                index: 2,
                func_id: 4,
                func_set_size: 4,
            }
        );
        assert!(err.detail().contains("[0-3]"));
    }

    #[test]
    fn err_forward_and_self_references() {
        // Node 2 referencing node 3 is a forward reference.
        let err = parse("{2,1,1,2,2,2,4}([2]3,1,0)([3]0,1,1)(3)").unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidConnection {
                index: 2,
                reference: 3,
                position: 0,
            }
        );

        // Self reference.
        let err = parse("{2,1,1,2,2,2,4}([2]2,1,0)([3]0,1,1)(3)").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidConnection {
                index: 2,
                reference: 2,
                ..
            }
        ));

        // Negative reference.
        let err = parse("{2,1,1,2,2,2,4}([2]-1,1,0)([3]0,1,1)(3)").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidConnection { reference: -1, .. }
        ));
    }

    #[test]
    fn err_lback_violation() {
        // 1x3 grid, lback 1: node 3 (column 2) may not reach node 1 (column 0).
        let err = parse("{1,1,1,3,2,1,2}([1]0,0,0)([2]0,1,1)([3]1,2,1)(3)").unwrap_err();
        assert_eq!(
            err,
            ParseError::LbackViolation {
                index: 3,
                reference: 1,
                distance: 2,
                lback: 1,
            }
        );

        // Distance 1 is within lback.
        let circuit = parse("{1,1,1,3,2,1,2}([1]0,0,0)([2]0,1,1)([3]2,2,1)(3)").unwrap();
        assert_eq!(circuit.nodes[&3].inputs, vec![2, 2]);
    }

    #[test]
    fn lback_counts_columns_not_indices() {
        // 2x2 grid: nodes 2,3 in column 0, nodes 4,5 in column 1. Index
        // distance 4->2 is 2 but column distance is 1.
        let circuit = parse("{2,1,2,2,2,1,4}([2]0,1,0)([3]1,0,1)([4]2,3,2)([5]3,2,3)(5)").unwrap();
        assert_eq!(circuit.config.column_of(4), 1);
        assert_eq!(circuit.nodes[&4].inputs, vec![2, 3]);
    }

    #[test]
    fn err_no_node_definitions() {
        let err = parse("{2,1,1,2,2,2,4}(1)").unwrap_err();
        assert_eq!(err, ParseError::NoNodeDefinitions);
    }

    #[test]
    fn err_missing_output_definition() {
        let err = parse("{2,1,1,2,2,2,4}([2]0,1,0)([3]0,1,1)").unwrap_err();
        assert_eq!(err, ParseError::MissingOutputDefinition);
    }

    #[test]
    fn err_output_count_mismatch() {
        let err = parse("{2,2,1,2,2,2,4}([2]0,1,0)([3]0,1,1)(3)").unwrap_err();
        assert_eq!(
            err,
            ParseError::OutputCountMismatch {
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn err_invalid_output_reference() {
        // Index 3 lies in the grid but was never defined.
        let err = parse("{2,1,1,2,2,2,4}([2]0,1,0)(3)").unwrap_err();
        assert_eq!(err, ParseError::InvalidOutputReference { reference: 3 });

        // Out of the grid entirely.
        let err = parse("{2,1,1,2,2,2,4}([2]0,1,0)(9)").unwrap_err();
        assert_eq!(err, ParseError::InvalidOutputReference { reference: 9 });
    }

    #[test]
    fn output_may_reference_primary_input() {
        let circuit = parse("{2,2,1,2,2,2,4}([2]0,1,0)([3]0,1,1)(1,3)").unwrap();
        assert_eq!(circuit.outputs, vec![1, 3]);
    }

    #[test]
    fn node_definitions_may_appear_in_any_order() {
        let circuit = parse("{2,1,1,2,2,2,4}([3]2,1,1)([2]0,1,0)(3)").unwrap();
        assert_eq!(circuit.nodes[&3].inputs, vec![2, 1]);
    }

    #[test]
    fn grid_holes_are_allowed() {
        // 1x3 grid with only nodes 2 and 4 defined; 3 is a hole.
        let circuit = parse("{2,1,1,3,2,2,4}([2]0,1,0)([4]2,0,1)(4)").unwrap();
        assert_eq!(circuit.nodes.len(), 2);
        assert!(circuit.node(3).is_none());
    }
}
