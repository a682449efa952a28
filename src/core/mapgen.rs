//! Derive the pin-definition table from a netlist.
//!
//! One snippet is the *root*: the side whose pin names are the physical
//! tokens of the hardware library (MCU GPIO names, power rails). Every net
//! that touches exactly one root pin gives each other snippet pin on it a
//! definition: `<type>_<pin>` mapped to that root pin.

use crate::core::error::PindefsError;
use crate::core::group::{self, SnippetFilter, SnippetIndex, SnippetNet};
use crate::core::ident;
use crate::core::netlist::Netlist;
use crate::core::pins::{LogicalName, PhysicalPin, PinDefs};

/// Run grouping, net conversion, and table derivation in one step.
pub fn generate(
    netlist: &Netlist,
    root: &str,
    filter: Option<&SnippetFilter>,
    warnings: &mut Vec<String>,
) -> Result<PinDefs, PindefsError> {
    let index = group::group_components(netlist, warnings)?;
    let nets = group::snippet_nets(netlist, &index, warnings)?;
    derive(&index, &nets, root, filter, warnings)
}

/// Derive the table from an already-converted snippet netlist.
pub fn derive(
    index: &SnippetIndex,
    nets: &[SnippetNet],
    root: &str,
    filter: Option<&SnippetFilter>,
    warnings: &mut Vec<String>,
) -> Result<PinDefs, PindefsError> {
    if !index.snippets.contains_key(root) {
        let names: Vec<&str> = index.names().collect();
        let hint = if names.is_empty() {
            format!(
                "there are no snippets; define them by giving at least one component a {} field",
                group::SNIPPET_TYPE_FIELD
            )
        } else {
            format!("these snippets exist: {}", names.join(", "))
        };
        return Err(PindefsError::NotFound(format!(
            "root snippet `{}` ({})",
            root, hint
        )));
    }

    // (snippet name, pin name, root pin) for every mapped pin.
    let mut entries: Vec<(&str, &str, &str)> = Vec::new();
    for net in nets {
        let root_pins: Vec<&str> = net
            .pins
            .iter()
            .filter(|(snippet, _)| snippet == root)
            .map(|(_, pin)| pin.as_str())
            .collect();
        let root_pin = match root_pins.as_slice() {
            [] => continue,
            [one] => *one,
            [first, second, ..] => {
                warnings.push(format!(
                    "at least two pins of the root snippet {}, {} and {}, are connected together; \
                     net `{}` will not be part of the map",
                    root, first, second, net.net_name
                ));
                continue;
            }
        };
        for (snippet, pin) in &net.pins {
            if snippet == root {
                continue;
            }
            if let Some(filter) = filter {
                if !filter.matches(snippet) {
                    continue;
                }
            }
            entries.push((snippet.as_str(), pin.as_str(), root_pin));
        }
    }

    // Deterministic table order: snippet name, then natural pin order.
    entries.sort_by(|a, b| {
        (a.0, ident::numeric_sort_key(a.1))
            .cmp(&(b.0, ident::numeric_sort_key(b.1)))
    });

    let mut defs = PinDefs::new();
    for (snippet, pin, root_pin) in entries {
        let type_name = &index.snippets[snippet].type_name;
        let logical = LogicalName::new(&format!(
            "{}_{}",
            ident::sanitize(type_name),
            ident::sanitize(pin)
        ))?;
        let physical = PhysicalPin::new(root_pin)?;
        defs.insert(logical, physical)?;
    }
    Ok(defs)
}
