//! XML netlist export ingestion. The export is a tree: one `<comp>` node
//! per component with named child fields, plus a nested `<fields>` list
//! scanned for part-number/description aliases.

use crate::{IngestError, IngestReport, non_empty, normalize_name, split_datasheet};
use bomcheck_model::Component;
use roxmltree::{Document, Node};

const MPN_FIELD_ALIASES: [&str; 5] = [
    "mpn",
    "part_number",
    "mfg_part_number",
    "manufacturer_part_number",
    "pn",
];

/// Parse a KiCad XML netlist export.
pub fn parse_netlist(content: &str, source_name: &str) -> Result<IngestReport, IngestError> {
    let doc = Document::parse(content)?;
    let components_node = doc
        .descendants()
        .find(|n| n.has_tag_name("components"))
        .ok_or(IngestError::MissingElement("components"))?;

    let mut report = IngestReport::default();
    for comp in components_node
        .children()
        .filter(|n| n.is_element() && n.has_tag_name("comp"))
    {
        let Some(reference) = comp.attribute("ref").map(str::trim).filter(|r| !r.is_empty())
        else {
            report.skip(format!("{source_name}: skipping <comp> without a ref attribute"));
            continue;
        };

        let value = child_text(&comp, "value").unwrap_or_default();
        let footprint = child_text(&comp, "footprint");
        let datasheet = child_text(&comp, "datasheet");
        let symbol = symbol_ref(&comp);

        let mut mpn = None;
        let mut description = None;
        let mut package = None;
        if let Some(fields) = comp.children().find(|n| n.has_tag_name("fields")) {
            for field in fields.children().filter(|n| n.has_tag_name("field")) {
                let name = normalize_name(field.attribute("name").unwrap_or(""));
                let text = field.text().and_then(non_empty);
                if MPN_FIELD_ALIASES.contains(&name.as_str()) {
                    mpn = text;
                } else if name == "description" {
                    description = text;
                } else if name == "package" {
                    package = text;
                }
            }
        }

        let mut component = Component::new(reference, value.clone());
        component.description = description.unwrap_or_else(|| {
            format!("{} {}", value, footprint.as_deref().unwrap_or(""))
                .trim()
                .to_string()
        });
        component.package = package;
        component.footprint = footprint;
        component.symbol = symbol;
        component.mpn = mpn;
        // the XML export lists each designator individually
        component.quantity = 1;
        component.source_info = format!("xml import ({source_name})");
        split_datasheet(&mut component, datasheet);
        report.push_validated(component);
    }

    Ok(report)
}

fn child_text(node: &Node, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(name))
        .and_then(|n| n.text())
        .and_then(non_empty)
}

/// `<libsource lib="Device" part="R"/>` carries the schematic symbol.
fn symbol_ref(comp: &Node) -> Option<String> {
    let libsource = comp.children().find(|n| n.has_tag_name("libsource"))?;
    let lib = libsource.attribute("lib").map(str::trim).filter(|s| !s.is_empty())?;
    let part = libsource.attribute("part").map(str::trim).filter(|s| !s.is_empty())?;
    Some(format!("{lib}:{part}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<export version="E">
  <components>
    <comp ref="R1">
      <value>10k</value>
      <footprint>Resistor_SMD:R_0805_2012Metric</footprint>
      <datasheet>https://example.com/r.pdf</datasheet>
      <libsource lib="Device" part="R"/>
      <fields>
        <field name="MPN">RC0805FR-0710KL</field>
        <field name="Description">Chip resistor</field>
      </fields>
    </comp>
    <comp ref="C1">
      <value>100n</value>
      <footprint>~</footprint>
      <datasheet>~</datasheet>
    </comp>
    <comp>
      <value>orphan</value>
    </comp>
  </components>
</export>"#;

    #[test]
    fn test_parse_export() {
        let report = parse_netlist(EXPORT, "design.xml").unwrap();
        assert_eq!(report.components.len(), 2);
        assert_eq!(report.skipped, 1);

        let r1 = &report.components[0];
        assert_eq!(r1.reference, "R1");
        assert_eq!(r1.value, "10k");
        assert_eq!(r1.quantity, 1);
        assert_eq!(r1.mpn.as_deref(), Some("RC0805FR-0710KL"));
        assert_eq!(r1.description, "Chip resistor");
        assert_eq!(r1.symbol.as_deref(), Some("Device:R"));
        assert_eq!(r1.datasheet_url.as_deref(), Some("https://example.com/r.pdf"));
    }

    #[test]
    fn test_tilde_is_empty() {
        let report = parse_netlist(EXPORT, "design.xml").unwrap();
        let c1 = &report.components[1];
        assert_eq!(c1.footprint, None);
        assert_eq!(c1.datasheet_url, None);
        assert_eq!(c1.description, "100n");
    }

    #[test]
    fn test_field_name_aliases() {
        let xml = r#"<export><components>
            <comp ref="U1">
              <value>LM358</value>
              <fields><field name="Manufacturer Part Number">LM358DR</field></fields>
            </comp>
        </components></export>"#;
        let report = parse_netlist(xml, "x.xml").unwrap();
        assert_eq!(report.components[0].mpn.as_deref(), Some("LM358DR"));
    }

    #[test]
    fn test_missing_components_element() {
        let err = parse_netlist("<export><nets/></export>", "x.xml").unwrap_err();
        assert!(matches!(err, IngestError::MissingElement("components")));
    }

    #[test]
    fn test_invalid_xml() {
        assert!(matches!(
            parse_netlist("<export", "x.xml"),
            Err(IngestError::Xml(_))
        ));
    }
}
