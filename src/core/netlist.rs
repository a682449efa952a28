//! KiCad netlist model.
//!
//! Binds the XML export format (`<export>` with `design`, `components`,
//! `nets` sections) to a typed in-memory netlist. Structural problems that
//! the format forbids (duplicate component references, duplicate field
//! names within one component, missing required attributes) are reported
//! as netlist errors, not ignored.

use crate::core::error::PindefsError;
use crate::core::xml::{self, Element};
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub reference: String,
    /// Schematic sheet path, e.g. `/` or `/power/`.
    pub sheetpath: String,
    /// Schematic fields, name to value.
    pub fields: BTreeMap<String, String>,
}

/// A component pin that participates in a net.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    pub reference: String,
    pub pin: String,
    /// KiCad's functional pin name; empty when the symbol does not name it.
    pub pinfunction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Net {
    pub name: String,
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Netlist {
    /// Schematic source recorded in the export's `design/source`.
    pub source: String,
    pub components: FxHashMap<String, Component>,
    pub nets: Vec<Net>,
}

impl Netlist {
    pub fn component(&self, reference: &str) -> Option<&Component> {
        self.components.get(reference)
    }

    /// Component references in deterministic order.
    pub fn sorted_references(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = self.components.keys().map(String::as_str).collect();
        refs.sort_unstable();
        refs
    }
}

/// Parse a netlist from KiCad XML export text.
pub fn parse_str(input: &str) -> Result<Netlist, PindefsError> {
    from_xml(&xml::parse(input)?)
}

pub fn from_xml(root: &Element) -> Result<Netlist, PindefsError> {
    if root.name != "export" {
        return Err(PindefsError::NetlistError(format!(
            "expected an `export` root element, found `{}`",
            root.name
        )));
    }

    let sources = root.descendants("design/source");
    if sources.len() != 1 {
        return Err(PindefsError::NetlistError(format!(
            "expected exactly one design/source element, found {}",
            sources.len()
        )));
    }
    let source = sources[0].trimmed_text().to_string();

    let mut components = FxHashMap::default();
    for comp in root.descendants("components/comp") {
        let component = parse_component(comp)?;
        if components.contains_key(&component.reference) {
            return Err(PindefsError::NetlistError(format!(
                "duplicate component reference `{}`",
                component.reference
            )));
        }
        components.insert(component.reference.clone(), component);
    }

    let mut nets = Vec::new();
    for net in root.descendants("nets/net") {
        nets.push(parse_net(net)?);
    }

    Ok(Netlist {
        source,
        components,
        nets,
    })
}

fn parse_component(comp: &Element) -> Result<Component, PindefsError> {
    let reference = comp
        .attr("ref")
        .ok_or_else(|| PindefsError::NetlistError("component without a `ref` attribute".into()))?
        .to_string();

    let sheetpaths: Vec<&Element> = comp.children_named("sheetpath").collect();
    if sheetpaths.len() != 1 {
        return Err(PindefsError::NetlistError(format!(
            "component `{}`: expected exactly one sheetpath, found {}",
            reference,
            sheetpaths.len()
        )));
    }
    let sheetpath = sheetpaths[0]
        .attr("names")
        .ok_or_else(|| {
            PindefsError::NetlistError(format!(
                "component `{}`: sheetpath without a `names` attribute",
                reference
            ))
        })?
        .to_string();

    let mut fields = BTreeMap::new();
    for field in comp.descendants("fields/field") {
        let name = field
            .attr("name")
            .ok_or_else(|| {
                PindefsError::NetlistError(format!(
                    "component `{}`: field without a `name` attribute",
                    reference
                ))
            })?
            .to_string();
        // Field text defaults to the empty string.
        let value = field.trimmed_text().to_string();
        if fields.insert(name.clone(), value).is_some() {
            return Err(PindefsError::NetlistError(format!(
                "component `{}`: duplicate field `{}`",
                reference, name
            )));
        }
    }

    Ok(Component {
        reference,
        sheetpath,
        fields,
    })
}

fn parse_net(net: &Element) -> Result<Net, PindefsError> {
    let name = net.attr("name").unwrap_or_default().to_string();
    let mut nodes = Vec::new();
    for node in net.children_named("node") {
        let reference = node
            .attr("ref")
            .ok_or_else(|| {
                PindefsError::NetlistError(format!(
                    "net `{}`: node without a `ref` attribute",
                    name
                ))
            })?
            .to_string();
        let pin = node
            .attr("pin")
            .ok_or_else(|| {
                PindefsError::NetlistError(format!(
                    "net `{}`: node without a `pin` attribute",
                    name
                ))
            })?
            .to_string();
        let pinfunction = node.attr("pinfunction").unwrap_or_default().to_string();
        nodes.push(Node {
            reference,
            pin,
            pinfunction,
        });
    }
    Ok(Net { name, nodes })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
<export version="E">
  <design><source>/tmp/board.kicad_sch</source></design>
  <components>
    <comp ref="U1">
      <sheetpath names="/" tstamps="/"/>
      <fields>
        <field name="SnippetType">Mcu</field>
        <field name="Footprint"></field>
      </fields>
    </comp>
    <comp ref="J1">
      <sheetpath names="/io/" tstamps="/x/"/>
    </comp>
  </components>
  <nets>
    <net code="1" name="Net-(U1-PD4)">
      <node ref="U1" pin="2" pinfunction="PD4"/>
      <node ref="J1" pin="1"/>
    </net>
  </nets>
</export>
"#;

    #[test]
    fn parses_components_fields_and_nets() {
        let netlist = parse_str(SMALL).unwrap();
        assert_eq!(netlist.source, "/tmp/board.kicad_sch");
        assert_eq!(netlist.components.len(), 2);

        let u1 = netlist.component("U1").unwrap();
        assert_eq!(u1.sheetpath, "/");
        assert_eq!(u1.fields["SnippetType"], "Mcu");
        assert_eq!(u1.fields["Footprint"], "");

        assert_eq!(netlist.nets.len(), 1);
        let net = &netlist.nets[0];
        assert_eq!(net.name, "Net-(U1-PD4)");
        assert_eq!(net.nodes[0].pinfunction, "PD4");
        assert_eq!(net.nodes[1].pinfunction, "");
    }

    #[test]
    fn sorted_references_are_deterministic() {
        let netlist = parse_str(SMALL).unwrap();
        assert_eq!(netlist.sorted_references(), vec!["J1", "U1"]);
    }

    #[test]
    fn rejects_duplicate_component_reference() {
        let doc = r#"
<export>
  <design><source>s</source></design>
  <components>
    <comp ref="U1"><sheetpath names="/"/></comp>
    <comp ref="U1"><sheetpath names="/"/></comp>
  </components>
</export>"#;
        let err = parse_str(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate component reference"));
    }

    #[test]
    fn rejects_duplicate_field_name() {
        let doc = r#"
<export>
  <design><source>s</source></design>
  <components>
    <comp ref="U1">
      <sheetpath names="/"/>
      <fields>
        <field name="SnippetType">A</field>
        <field name="SnippetType">B</field>
      </fields>
    </comp>
  </components>
</export>"#;
        assert!(parse_str(doc).is_err());
    }

    #[test]
    fn requires_exactly_one_design_source() {
        assert!(parse_str("<export><components/></export>").is_err());
    }

    #[test]
    fn rejects_non_export_root() {
        assert!(parse_str("<netlist/>").is_err());
    }
}
