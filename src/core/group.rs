//! Snippet grouping.
//!
//! Schematic components opt into the naming layer through fields:
//! `SnippetType` assigns a component to a snippet (identified by sheetpath
//! plus type), `SnippetPin<kicad-pin>` explicitly names one of its pins,
//! and `SnippetMapField<key>` attaches free-form metadata. Nets between
//! components become nets between snippet pins.

use crate::core::error::PindefsError;
use crate::core::netlist::Netlist;
use regex::RegexSet;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

pub const SNIPPET_TYPE_FIELD: &str = "SnippetType";
pub const SNIPPET_PIN_FIELD_PREFIX: &str = "SnippetPin";
pub const SNIPPET_MAP_FIELD_PREFIX: &str = "SnippetMapField";

#[derive(Debug, Clone)]
pub struct Snippet {
    /// Sheetpath plus type, e.g. `/Timer`; unique across the netlist.
    pub name: String,
    pub type_name: String,
    /// `SnippetMapField*` metadata, key to value.
    pub map_fields: BTreeMap<String, String>,
    /// References of the member components, sorted.
    pub components: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SnippetIndex {
    pub snippets: BTreeMap<String, Snippet>,
    by_component: FxHashMap<String, String>,
}

impl SnippetIndex {
    /// Snippet name a component belongs to, if any.
    pub fn snippet_of(&self, reference: &str) -> Option<&str> {
        self.by_component.get(reference).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.snippets.keys().map(String::as_str)
    }
}

/// A net expressed in snippet pins: the set of `(snippet name, pin name)`
/// pairs that are electrically connected.
#[derive(Debug, Clone)]
pub struct SnippetNet {
    pub net_name: String,
    pub pins: BTreeSet<(String, String)>,
}

/// Group the netlist's components into snippets.
///
/// Components without a `SnippetType` field do not participate; if such a
/// component still carries `SnippetPin*`/`SnippetMapField*` fields, a
/// warning points out the likely mistake.
pub fn group_components(
    netlist: &Netlist,
    warnings: &mut Vec<String>,
) -> Result<SnippetIndex, PindefsError> {
    let mut index = SnippetIndex::default();

    for reference in netlist.sorted_references() {
        let component = netlist.component(reference).expect("reference from netlist");
        let Some(type_name) = component.fields.get(SNIPPET_TYPE_FIELD) else {
            let false_friends: Vec<&str> = component
                .fields
                .keys()
                .filter(|f| {
                    f.starts_with(SNIPPET_PIN_FIELD_PREFIX)
                        || f.starts_with(SNIPPET_MAP_FIELD_PREFIX)
                })
                .map(String::as_str)
                .collect();
            if !false_friends.is_empty() {
                warnings.push(format!(
                    "component {} defines the field{} {} but not {}; it is not part of any snippet",
                    reference,
                    if false_friends.len() > 1 { "s" } else { "" },
                    false_friends.join(", "),
                    SNIPPET_TYPE_FIELD
                ));
            }
            continue;
        };

        let snippet_name = format!("{}{}", component.sheetpath, type_name);
        let snippet = index
            .snippets
            .entry(snippet_name.clone())
            .or_insert_with(|| Snippet {
                name: snippet_name.clone(),
                type_name: type_name.clone(),
                map_fields: BTreeMap::new(),
                components: Vec::new(),
            });
        snippet.components.push(reference.to_string());

        for (field_name, field_value) in &component.fields {
            let Some(key) = field_name.strip_prefix(SNIPPET_MAP_FIELD_PREFIX) else {
                continue;
            };
            if let Some(previous) = snippet.map_fields.get(key) {
                return Err(PindefsError::SnippetError(format!(
                    "snippet {} defines the {} `{}` twice (values `{}` and `{}`; one is on component {})",
                    snippet_name, SNIPPET_MAP_FIELD_PREFIX, key, previous, field_value, reference
                )));
            }
            snippet.map_fields.insert(key.to_string(), field_value.clone());
        }

        index
            .by_component
            .insert(reference.to_string(), snippet_name);
    }

    Ok(index)
}

/// Per-snippet explicit pin names: `(component ref, kicad pin)` to the name
/// the user chose. Snippets without any `SnippetPin` fields are absent.
type ExplicitPinNames = FxHashMap<String, FxHashMap<(String, String), String>>;

fn explicit_pin_names(
    netlist: &Netlist,
    index: &SnippetIndex,
) -> Result<ExplicitPinNames, PindefsError> {
    let mut lookups: ExplicitPinNames = FxHashMap::default();

    for snippet in index.snippets.values() {
        let mut seen_names: BTreeSet<&str> = BTreeSet::new();
        for reference in &snippet.components {
            let component = netlist.component(reference).expect("member reference");
            for (field_name, pin_name) in &component.fields {
                let Some(kicad_pin) = field_name.strip_prefix(SNIPPET_PIN_FIELD_PREFIX) else {
                    continue;
                };
                // `SnippetMapField*` also starts with letters, but not with
                // this prefix, so no overlap is possible here.
                if !seen_names.insert(pin_name) {
                    return Err(PindefsError::SnippetError(format!(
                        "the {} `{}` exists twice for snippet {}",
                        SNIPPET_PIN_FIELD_PREFIX, pin_name, snippet.name
                    )));
                }
                lookups
                    .entry(snippet.name.clone())
                    .or_default()
                    .insert(
                        (reference.clone(), kicad_pin.to_string()),
                        pin_name.clone(),
                    );
            }
        }
    }

    Ok(lookups)
}

/// Convert the component netlist into a snippet netlist.
///
/// For a snippet with explicit `SnippetPin` names only those pins belong to
/// it; otherwise every member pin participates under its KiCad
/// `pinfunction`. A pin whose fallback name would be empty is skipped with
/// a warning.
pub fn snippet_nets(
    netlist: &Netlist,
    index: &SnippetIndex,
    warnings: &mut Vec<String>,
) -> Result<Vec<SnippetNet>, PindefsError> {
    let explicit = explicit_pin_names(netlist, index)?;
    // Each snippet pin must come from exactly one physical component pin.
    let mut pin_owner: FxHashMap<(String, String), String> = FxHashMap::default();

    let mut nets = Vec::new();
    for net in &netlist.nets {
        let mut pins: BTreeSet<(String, String)> = BTreeSet::new();
        for node in &net.nodes {
            let Some(snippet_name) = index.snippet_of(&node.reference) else {
                continue;
            };

            let pin_name = match explicit.get(snippet_name) {
                Some(lookup) => {
                    match lookup.get(&(node.reference.clone(), node.pin.clone())) {
                        Some(name) => name.clone(),
                        // The snippet names its pins explicitly and this
                        // one was not named, so it does not belong to it.
                        None => continue,
                    }
                }
                None => {
                    if node.pinfunction.is_empty() {
                        warnings.push(format!(
                            "pin {} of component {} has no pinfunction; skipping it for snippet {}",
                            node.pin, node.reference, snippet_name
                        ));
                        continue;
                    }
                    node.pinfunction.clone()
                }
            };

            let key = (snippet_name.to_string(), pin_name.clone());
            if let Some(owner) = pin_owner.get(&key) {
                if *owner != node.reference {
                    return Err(PindefsError::SnippetError(format!(
                        "pin {} of snippet {} occurs in multiple components: {} and {}",
                        pin_name, snippet_name, owner, node.reference
                    )));
                }
            } else {
                pin_owner.insert(key.clone(), node.reference.clone());
            }
            pins.insert(key);
        }
        if !pins.is_empty() {
            nets.push(SnippetNet {
                net_name: net.name.clone(),
                pins,
            });
        }
    }

    Ok(nets)
}

/// Compiled snippet-name filter: a comma-separated list of path globs
/// (`*`, `**`, `?`, `[...]`); a snippet matching any glob passes.
#[derive(Debug)]
pub struct SnippetFilter {
    set: RegexSet,
}

impl SnippetFilter {
    pub fn compile(globs: &str) -> Result<Self, PindefsError> {
        let patterns: Vec<String> = globs.split(',').map(glob_to_regex).collect();
        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    pub fn matches(&self, snippet_name: &str) -> bool {
        self.set.is_match(snippet_name)
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let mut chars = glob.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => {
                if chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str(".*");
                } else {
                    out.push_str("[^/]*");
                }
            }
            '?' => out.push_str("[^/]"),
            '[' => {
                out.push('[');
                if chars.peek() == Some(&'!') {
                    chars.next();
                    out.push('^');
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    out.push(inner);
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}
