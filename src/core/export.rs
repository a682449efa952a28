//! CSV and JSON surfaces for tables and connectivity reports.

use crate::core::group::{SnippetIndex, SnippetNet};
use crate::core::header::{HeaderMeta, TOOL_NAME};
use crate::core::ident;
use crate::core::pins::PinDefs;
use serde::Serialize;
use serde_json::{Value as JsonValue, json};

/// Standard JSON envelope for command output.
pub fn envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = json!({
        "tool": TOOL_NAME,
        "cmd": cmd,
        "status": status,
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    base
}

/// `logical,physical` rows for the table, in table order.
pub fn pin_defs_csv(defs: &PinDefs) -> String {
    let mut out = String::from("logical,physical\n");
    for (logical, physical) in defs.iter() {
        out.push_str(&format!(
            "{},{}\n",
            csv_field(logical.as_str()),
            csv_field(physical.as_str())
        ));
    }
    out
}

pub fn pin_defs_json(defs: &PinDefs, meta: &HeaderMeta) -> JsonValue {
    let rows: Vec<JsonValue> = defs
        .iter()
        .map(|(l, p)| json!({"logical": l, "physical": p}))
        .collect();
    envelope(
        "gen",
        "ok",
        json!({
            "source": meta.source,
            "netlist_sha256": meta.netlist_sha256,
            "defines": rows,
        }),
    )
}

/// One snippet pin of the connectivity report.
#[derive(Debug, Clone, Serialize)]
pub struct DumpRow {
    pub snippet: String,
    pub snippet_type: String,
    pub pin: String,
    pub net: String,
    /// Root snippet pin on the same net, when a root was given and the net
    /// touches exactly one of its pins.
    pub root_pin: Option<String>,
}

/// Flatten the snippet netlist into report rows, sorted by snippet then by
/// natural pin order.
pub fn dump_rows(index: &SnippetIndex, nets: &[SnippetNet], root: Option<&str>) -> Vec<DumpRow> {
    let mut rows = Vec::new();
    for net in nets {
        let root_pins: Vec<&str> = match root {
            Some(root) => net
                .pins
                .iter()
                .filter(|(snippet, _)| snippet == root)
                .map(|(_, pin)| pin.as_str())
                .collect(),
            None => Vec::new(),
        };
        let root_pin = match root_pins.as_slice() {
            [one] => Some(one.to_string()),
            _ => None,
        };
        for (snippet, pin) in &net.pins {
            if root == Some(snippet.as_str()) {
                continue;
            }
            rows.push(DumpRow {
                snippet: snippet.clone(),
                snippet_type: index.snippets[snippet.as_str()].type_name.clone(),
                pin: pin.clone(),
                net: net.net_name.clone(),
                root_pin: root_pin.clone(),
            });
        }
    }
    rows.sort_by(|a, b| {
        (&a.snippet, ident::numeric_sort_key(&a.pin))
            .cmp(&(&b.snippet, ident::numeric_sort_key(&b.pin)))
    });
    rows
}

pub fn dump_csv(rows: &[DumpRow]) -> String {
    let mut out = String::from("snippet,snippet_type,pin,net,root_pin\n");
    for row in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&row.snippet),
            csv_field(&row.snippet_type),
            csv_field(&row.pin),
            csv_field(&row.net),
            csv_field(row.root_pin.as_deref().unwrap_or("")),
        ));
    }
    out
}

pub fn dump_json(index: &SnippetIndex, rows: &[DumpRow]) -> JsonValue {
    let snippets: Vec<JsonValue> = index
        .snippets
        .values()
        .map(|s| {
            json!({
                "name": s.name,
                "type": s.type_name,
                "components": s.components,
                "map_fields": s.map_fields,
            })
        })
        .collect();
    envelope(
        "dump",
        "ok",
        json!({
            "snippets": snippets,
            "pins": serde_json::to_value(rows).expect("serializable rows"),
        }),
    )
}

/// Minimal CSV quoting: quote only when the field needs it.
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}
