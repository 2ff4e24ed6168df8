//! Pre-pass over raw multi-line input.
//!
//! Strips `#` comment lines, collects the optional `#%i`/`#%o` name
//! directives and isolates the single data line handed to [`super::parser`].

use tracing::warn;

use super::Symbol;

/// Result of scanning the raw input lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveScan {
    /// First non-comment line, if any. Content after it is ignored.
    pub data_line: Option<String>,
    pub input_names: Vec<Symbol>,
    pub output_names: Vec<Symbol>,
    pub saw_input_directive: bool,
    pub saw_output_directive: bool,
}

/// Scan raw input for directives and the data line.
///
/// `#%i`/`#%o` lines contribute comma-separated names (taken from after the
/// first space, each trimmed); any other `#` line is a comment. Scanning
/// stops at the first non-`#` line, which becomes the data line.
pub fn extract(raw: &str) -> DirectiveScan {
    let mut scan = DirectiveScan::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("#%i") {
            scan.saw_input_directive = true;
            collect_names(rest, &mut scan.input_names);
        } else if let Some(rest) = line.strip_prefix("#%o") {
            scan.saw_output_directive = true;
            collect_names(rest, &mut scan.output_names);
        } else if line.starts_with('#') {
            // Ordinary comment.
        } else {
            scan.data_line = Some(line.to_string());
            break;
        }
    }

    scan
}

fn collect_names(rest: &str, names: &mut Vec<Symbol>) {
    // Names follow the first space after the directive keyword.
    let Some((_, list)) = rest.split_once(' ') else {
        return;
    };
    names.extend(list.split(',').map(|name| Symbol::from(name.trim())));
}

/// Reconcile a directive name list against the configured count.
///
/// Too few names are padded with `"{placeholder} {i}"`, extras are dropped.
/// Either mismatch is a warning, never an error: the circuit stays usable
/// with best-effort names.
pub fn reconcile_names(mut names: Vec<Symbol>, expected: usize, placeholder: &str) -> Vec<Symbol> {
    if !names.is_empty() && names.len() != expected {
        warn!(
            found = names.len(),
            expected, placeholder, "name directive count does not match configuration"
        );
    }
    names.truncate(expected);
    for i in names.len()..expected {
        names.push(Symbol::from(format!("{} {}", placeholder, i).as_str()));
    }
    names
}
