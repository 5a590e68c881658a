//! Delimited tabular BoM ingestion: delimiter sniffing, heuristic header
//! detection, alias-resolved columns, multi-reference quantity splitting.

use crate::{IngestReport, non_empty, normalize_name, split_datasheet};
use bomcheck_model::Component;
use csv::StringRecord;

const DELIMITER_CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

/// Known synonyms per canonical column.
const ALIASES: [(&str, &[&str]); 8] = [
    ("reference", &["reference", "references", "designator", "ref"]),
    ("value", &["value", "designation"]),
    ("footprint", &["footprint", "package", "footprint_spec"]),
    ("datasheet", &["datasheet", "ds"]),
    ("manufacturer", &["manufacturer", "mfr", "manfnumber"]),
    (
        "part_number",
        &[
            "part_number",
            "mpn",
            "mfr_part_number",
            "manfnumber_partnumber",
            "supplier_and_ref",
            "vendor_ref",
        ],
    ),
    ("description", &["description", "desc"]),
    ("quantity", &["quantity", "qty"]),
];

/// Resolved column positions. Required columns always carry a position —
/// degraded positional defaults when the header could not be resolved.
#[derive(Debug, Clone)]
struct Columns {
    reference: usize,
    value: usize,
    footprint: usize,
    datasheet: Option<usize>,
    part_number: Option<usize>,
    description: Option<usize>,
    quantity: Option<usize>,
}

impl Default for Columns {
    fn default() -> Self {
        Columns {
            reference: 0,
            value: 1,
            footprint: 2,
            datasheet: None,
            part_number: None,
            description: None,
            quantity: None,
        }
    }
}

/// Parse a delimited tabular export.
pub fn parse_tabular(content: &str, source_name: &str) -> IngestReport {
    let mut report = IngestReport::default();
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let delimiter = match sniff_delimiter(content) {
        Some(d) => d,
        None => {
            report.warn(format!(
                "{source_name}: could not detect delimiter, assuming comma-separated"
            ));
            b','
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records: Vec<StringRecord> = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => records.push(record),
            Err(e) => report.skip(format!("{source_name}: unparseable row: {e}")),
        }
    }
    if records.is_empty() {
        report.warn(format!("{source_name}: no rows found"));
        return report;
    }

    let (columns, data_start) = match resolve_header(&records[0]) {
        Some(columns) => (columns, 1),
        None => {
            // headerless export: fall back to the conventional column order
            log::debug!("{source_name}: no header row detected, using positional columns");
            (Columns::default(), 0)
        }
    };
    if data_start == 1 && columns_degraded(&records[0], &columns) {
        report.warn(format!(
            "{source_name}: could not resolve Reference/Value/Footprint headers, results may be inaccurate"
        ));
    }

    for record in &records[data_start..] {
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        process_row(record, &columns, source_name, &mut report);
    }

    report
}

/// Sample the first lines and pick the delimiter present on every sampled
/// line, scored by its minimum per-line count. Ambiguity (no candidate on
/// every line) returns `None`; the caller falls back to comma.
fn sniff_delimiter(content: &str) -> Option<u8> {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(10)
        .collect();
    if sample.is_empty() {
        return None;
    }

    let mut best: Option<(u8, usize)> = None;
    for candidate in DELIMITER_CANDIDATES {
        let min_count = sample
            .iter()
            .map(|l| l.bytes().filter(|&b| b == candidate).count())
            .min()
            .unwrap_or(0);
        if min_count == 0 {
            continue;
        }
        if best.is_none_or(|(_, n)| min_count > n) {
            best = Some((candidate, min_count));
        }
    }
    best.map(|(d, _)| d)
}

/// Treat the first record as a header when any normalized cell resolves
/// through the alias table; returns the resolved column map.
fn resolve_header(first: &StringRecord) -> Option<Columns> {
    let normalized: Vec<String> = first.iter().map(normalize_name).collect();
    let position = |canonical: &str| -> Option<usize> {
        let (_, synonyms) = ALIASES.iter().find(|(name, _)| *name == canonical)?;
        normalized
            .iter()
            .position(|cell| synonyms.contains(&cell.as_str()))
    };

    let any_resolved = ALIASES
        .iter()
        .any(|(canonical, _)| position(canonical).is_some());
    if !any_resolved {
        return None;
    }

    let defaults = Columns::default();
    Some(Columns {
        reference: position("reference").unwrap_or(defaults.reference),
        value: position("value").unwrap_or(defaults.value),
        footprint: position("footprint").unwrap_or(defaults.footprint),
        datasheet: position("datasheet"),
        part_number: position("part_number"),
        description: position("description"),
        quantity: position("quantity"),
    })
}

/// Whether any of the required headers fell back to its positional default
/// without actually being present in the header row.
fn columns_degraded(first: &StringRecord, columns: &Columns) -> bool {
    let normalized: Vec<String> = first.iter().map(normalize_name).collect();
    let resolved = |canonical: &str, position: usize| {
        ALIASES
            .iter()
            .find(|(name, _)| *name == canonical)
            .is_some_and(|(_, synonyms)| {
                normalized
                    .get(position)
                    .is_some_and(|cell| synonyms.contains(&cell.as_str()))
            })
    };
    !(resolved("reference", columns.reference)
        && resolved("value", columns.value)
        && resolved("footprint", columns.footprint))
}

fn process_row(record: &StringRecord, columns: &Columns, source_name: &str, report: &mut IngestReport) {
    let required_max = columns.reference.max(columns.value).max(columns.footprint);
    if record.len() <= required_max {
        report.skip(format!(
            "{source_name}: skipping row with {} columns (need at least {}): {:?}",
            record.len(),
            required_max + 1,
            record
        ));
        return;
    }

    let cell = |i: usize| record.get(i).unwrap_or("").trim();
    let optional = |i: Option<usize>| i.and_then(|i| record.get(i)).and_then(non_empty);

    let references: Vec<&str> = cell(columns.reference)
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect();
    if references.is_empty() {
        report.skip(format!("{source_name}: skipping row with empty reference"));
        return;
    }

    // one row may carry several designators sharing one aggregate quantity
    let total_quantity = optional(columns.quantity)
        .and_then(|q| q.parse::<u32>().ok())
        .unwrap_or(references.len() as u32);
    let quantity_per_ref = (total_quantity / references.len() as u32).max(1);

    let value = cell(columns.value).to_string();
    let footprint = non_empty(cell(columns.footprint));
    let datasheet = optional(columns.datasheet);
    let mpn = optional(columns.part_number);
    let description = optional(columns.description).unwrap_or_else(|| {
        format!("{} {}", value, footprint.as_deref().unwrap_or(""))
            .trim()
            .to_string()
    });

    for reference in references {
        let mut component = Component::new(reference, value.clone());
        component.quantity = quantity_per_ref;
        component.footprint = footprint.clone();
        component.mpn = mpn.clone();
        component.description = description.clone();
        component.source_info = format!("csv import ({source_name})");
        split_datasheet(&mut component, datasheet.clone());
        report.push_validated(component);
    }
}
