//! C-header rendition of the pin-definition table.
//!
//! The emitted artifact is a flat `#define` list behind `#pragma once`,
//! consumed at compile time by hardware code that includes the external
//! hardware-definition library for the physical pin tokens. Parsing accepts
//! exactly what emission produces (plus arbitrary `//` comments), so
//! `parse(emit(t)) == t` holds for every valid table.

use crate::core::error::PindefsError;
use crate::core::pins::{LogicalName, PhysicalPin, PinDefs};
use sha2::{Digest, Sha256};

/// Tool identifier stamped into generated artifacts.
pub const TOOL_NAME: &str = concat!("pindefs v", env!("CARGO_PKG_VERSION"));

/// Provenance recorded in the emitted header comment block. No timestamp:
/// output must be byte-for-byte reproducible from the same inputs.
#[derive(Debug, Clone, Default)]
pub struct HeaderMeta {
    /// Schematic source the netlist was exported from, if known.
    pub source: Option<String>,
    /// SHA-256 of the netlist file bytes, if generated from one.
    pub netlist_sha256: Option<String>,
}

impl HeaderMeta {
    pub fn for_netlist(source: &str, netlist_bytes: &[u8]) -> Self {
        let digest = Sha256::digest(netlist_bytes);
        let mut hex = String::with_capacity(64);
        for byte in digest {
            hex.push_str(&format!("{:02x}", byte));
        }
        Self {
            source: Some(source.to_string()),
            netlist_sha256: Some(hex),
        }
    }
}

/// Render the table as a C header.
pub fn emit(defs: &PinDefs, meta: &HeaderMeta) -> String {
    let mut out = String::new();
    out.push_str("#pragma once\n\n");
    out.push_str(&format!("// Generated by {}.\n", TOOL_NAME));
    if let Some(source) = &meta.source {
        out.push_str(&format!("// Source: {}\n", source));
    }
    if let Some(sha) = &meta.netlist_sha256 {
        out.push_str(&format!("// Netlist-SHA256: {}\n", sha));
    }
    out.push_str("// Physical pin names are defined by the target hardware library.\n");
    out.push('\n');
    for (logical, physical) in defs.iter() {
        out.push_str(&format!("#define {} {}\n", logical, physical));
    }
    out
}

/// Parse a pin-definition header back into a table.
///
/// Accepted lines: blank, `//` comments, `#pragma once`, and
/// `#define <logical> <physical>`. Anything else is an error naming the
/// line; a conflicting duplicate define is rejected through
/// [`PinDefs::insert`].
pub fn parse(input: &str) -> Result<PinDefs, PindefsError> {
    let mut defs = PinDefs::new();
    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line.starts_with("#pragma") {
            if line.split_whitespace().collect::<Vec<_>>() != ["#pragma", "once"] {
                return Err(PindefsError::HeaderError {
                    line: line_no,
                    message: format!("unsupported pragma: `{}`", line),
                });
            }
            continue;
        }
        if let Some(rest) = line.strip_prefix("#define") {
            let tokens: Vec<&str> = rest.split_whitespace().collect();
            if tokens.len() != 2 {
                return Err(PindefsError::HeaderError {
                    line: line_no,
                    message: format!(
                        "expected `#define <logical> <physical>`, got {} token(s)",
                        tokens.len()
                    ),
                });
            }
            let logical = LogicalName::new(tokens[0]).map_err(|e| PindefsError::HeaderError {
                line: line_no,
                message: e.to_string(),
            })?;
            let physical = PhysicalPin::new(tokens[1]).map_err(|e| PindefsError::HeaderError {
                line: line_no,
                message: e.to_string(),
            })?;
            defs.insert(logical, physical)?;
            continue;
        }
        return Err(PindefsError::HeaderError {
            line: line_no,
            message: format!("unrecognized line: `{}`", line),
        });
    }
    Ok(defs)
}
