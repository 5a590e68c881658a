//! Structural parsing of `.kicad_mod` footprint files and geometry
//! extraction (pad count, estimated planar area).

use crate::KicadError;
use bomcheck_sexpr::Sexpr;
use std::fs;
use std::path::Path;

/// Layers whose outline defines the footprint courtyard.
pub const COURTYARD_LAYERS: [&str; 2] = ["F.CrtYd", "B.CrtYd"];

const GRAPHIC_TAGS: [&str; 5] = ["fp_line", "fp_rect", "fp_circle", "fp_arc", "fp_poly"];

/// A parsed footprint: the pieces this pipeline cares about, not the full
/// KiCad model.
#[derive(Debug, Clone)]
pub struct Footprint {
    pub name: String,
    pub pad_count: usize,
    pub graphics: Vec<Graphic>,
}

/// One graphical primitive, reduced to its layer and the points that bound
/// it. Circles are stored as the four corners of their bounding square.
#[derive(Debug, Clone)]
pub struct Graphic {
    pub layer: Option<String>,
    pub points: Vec<(f64, f64)>,
}

impl Footprint {
    /// Parse a footprint from source text.
    pub fn from_string(content: &str) -> Result<Self, KicadError> {
        let root = bomcheck_sexpr::parse(content)?;
        // KiCad 6+ uses `footprint`, older exports `module`
        if !matches!(root.tag(), Some("footprint") | Some("module")) {
            return Err(KicadError::InvalidFormat {
                kind: "footprint",
                reason: format!("expected (footprint ...), found {:?}", root.tag()),
            });
        }
        let items = root.as_list().unwrap_or(&[]);
        let name = items
            .get(1)
            .and_then(Sexpr::as_atom)
            .unwrap_or_default()
            .to_string();

        let pad_count = items.iter().filter(|n| n.tag() == Some("pad")).count();

        let mut graphics = Vec::new();
        for node in items {
            let Some(tag) = node.tag() else { continue };
            if !GRAPHIC_TAGS.contains(&tag) {
                continue;
            }
            let layer = node
                .find_list("layer")
                .and_then(|l| l.get(1))
                .and_then(Sexpr::as_atom)
                .map(str::to_string);
            let points = graphic_points(tag, node);
            if !points.is_empty() {
                graphics.push(Graphic { layer, points });
            }
        }

        Ok(Footprint {
            name,
            pad_count,
            graphics,
        })
    }

    /// Parse a footprint from a `.kicad_mod` file.
    pub fn from_file(path: &Path) -> Result<Self, KicadError> {
        let content = fs::read_to_string(path)?;
        Self::from_string(&content)
    }
}

fn point_of(list: &[Sexpr]) -> Option<(f64, f64)> {
    Some((list.get(1)?.as_f64()?, list.get(2)?.as_f64()?))
}

fn graphic_points(tag: &str, node: &Sexpr) -> Vec<(f64, f64)> {
    match tag {
        "fp_line" | "fp_rect" => ["start", "end"]
            .into_iter()
            .filter_map(|k| node.find_list(k).and_then(point_of))
            .collect(),
        "fp_arc" => ["start", "mid", "end"]
            .into_iter()
            .filter_map(|k| node.find_list(k).and_then(point_of))
            .collect(),
        "fp_circle" => {
            let center = node.find_list("center").and_then(point_of);
            let edge = node.find_list("end").and_then(point_of);
            match (center, edge) {
                (Some((cx, cy)), Some((ex, ey))) => {
                    let r = ((ex - cx).powi(2) + (ey - cy).powi(2)).sqrt();
                    vec![(cx - r, cy - r), (cx + r, cy + r)]
                }
                _ => Vec::new(),
            }
        }
        "fp_poly" => node
            .find_list("pts")
            .map(|pts| {
                bomcheck_sexpr::find_all_child_lists(pts, "xy")
                    .into_iter()
                    .filter_map(point_of)
                    .collect()
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Which geometry produced the area estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaSource {
    Courtyard,
    AllGraphics,
}

/// Geometry extracted from a footprint. Carries its own note/error lists;
/// extraction itself never fails.
#[derive(Debug, Clone, Default)]
pub struct FootprintGeometry {
    pub pad_count: usize,
    pub area_mm2: Option<f64>,
    pub source: Option<AreaSource>,
    pub notes: Vec<String>,
    pub errors: Vec<String>,
}

/// Estimate pad count and planar area for a parsed footprint.
///
/// Area prefers the courtyard outline bounding box; a missing or degenerate
/// courtyard falls back to the bounding box of all graphics, and the
/// fallback is recorded as a note so callers know which method produced the
/// number.
pub fn extract_geometry(fp: &Footprint) -> FootprintGeometry {
    let mut result = FootprintGeometry {
        pad_count: fp.pad_count,
        ..Default::default()
    };

    let courtyard = bounding_box(fp.graphics.iter().filter(|g| {
        g.layer
            .as_deref()
            .is_some_and(|l| COURTYARD_LAYERS.contains(&l))
    }));
    if let Some((w, h)) = courtyard {
        if w > 0.0 && h > 0.0 {
            result.area_mm2 = Some(round2(w * h));
            result.source = Some(AreaSource::Courtyard);
            return result;
        }
        log::debug!("degenerate courtyard box {w}x{h} on '{}'", fp.name);
    }

    match bounding_box(fp.graphics.iter()) {
        Some((w, h)) if w > 0.0 && h > 0.0 => {
            result.area_mm2 = Some(round2(w * h));
            result.source = Some(AreaSource::AllGraphics);
            result
                .notes
                .push("courtyard missing or degenerate, area from overall bounding box".to_string());
        }
        _ => {
            result
                .errors
                .push("no usable geometry to estimate area".to_string());
        }
    }
    result
}

fn bounding_box<'a>(graphics: impl Iterator<Item = &'a Graphic>) -> Option<(f64, f64)> {
    let mut min = (f64::INFINITY, f64::INFINITY);
    let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut seen = false;
    for g in graphics {
        for &(x, y) in &g.points {
            min = (min.0.min(x), min.1.min(y));
            max = (max.0.max(x), max.1.max(y));
            seen = true;
        }
    }
    seen.then(|| (max.0 - min.0, max.1 - min.1))
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const R0805: &str = r#"(footprint "R_0805_2012Metric"
        (layer "F.Cu")
        (fp_line (start -1.68 -0.95) (end 1.68 -0.95) (layer "F.CrtYd") (width 0.05))
        (fp_line (start 1.68 0.95) (end -1.68 0.95) (layer "F.CrtYd") (width 0.05))
        (fp_line (start -0.227064 -0.735) (end 0.227064 -0.735) (layer "F.SilkS") (width 0.12))
        (pad "1" smd roundrect (at -0.9125 0) (size 1.025 1.4) (layers "F.Cu" "F.Paste" "F.Mask"))
        (pad "2" smd roundrect (at 0.9125 0) (size 1.025 1.4) (layers "F.Cu" "F.Paste" "F.Mask"))
    )"#;

    #[test]
    fn test_parse_footprint() {
        let fp = Footprint::from_string(R0805).unwrap();
        assert_eq!(fp.name, "R_0805_2012Metric");
        assert_eq!(fp.pad_count, 2);
        assert_eq!(fp.graphics.len(), 3);
    }

    #[test]
    fn test_rejects_non_footprint() {
        let err = Footprint::from_string("(kicad_symbol_lib)").unwrap_err();
        assert!(matches!(err, KicadError::InvalidFormat { .. }));
    }

    #[test]
    fn test_courtyard_area() {
        let fp = Footprint::from_string(R0805).unwrap();
        let geo = extract_geometry(&fp);
        assert_eq!(geo.pad_count, 2);
        // courtyard box is 3.36 x 1.9
        assert_eq!(geo.area_mm2, Some(6.38));
        assert_eq!(geo.source, Some(AreaSource::Courtyard));
        assert!(geo.notes.is_empty());
        assert!(geo.errors.is_empty());
    }

    #[test]
    fn test_fallback_to_overall_bbox() {
        // silkscreen outline only, no courtyard
        let src = r#"(footprint "X"
            (fp_rect (start -1.0 -2.0) (end 1.0 2.0) (layer "F.SilkS"))
            (pad "1" smd rect (at 0 0) (size 1 1) (layers "F.Cu"))
        )"#;
        let fp = Footprint::from_string(src).unwrap();
        let geo = extract_geometry(&fp);
        assert_eq!(geo.area_mm2, Some(8.0));
        assert_eq!(geo.source, Some(AreaSource::AllGraphics));
        assert_eq!(geo.notes.len(), 1);
        assert!(geo.notes[0].contains("overall bounding box"));
    }

    #[test]
    fn test_degenerate_courtyard_falls_back() {
        // courtyard collapses to a line; outline graphics still usable
        let src = r#"(footprint "X"
            (fp_line (start 0 0) (end 4.0 0) (layer "F.CrtYd"))
            (fp_rect (start 0 0) (end 2.0 3.0) (layer "F.Fab"))
        )"#;
        let fp = Footprint::from_string(src).unwrap();
        let geo = extract_geometry(&fp);
        assert_eq!(geo.source, Some(AreaSource::AllGraphics));
        // overall box spans the degenerate line too: 4.0 x 3.0
        assert_eq!(geo.area_mm2, Some(12.0));
    }

    #[test]
    fn test_no_geometry() {
        let src = r#"(footprint "Bare" (pad "1" smd rect (at 0 0) (size 1 1)))"#;
        let fp = Footprint::from_string(src).unwrap();
        let geo = extract_geometry(&fp);
        assert_eq!(geo.pad_count, 1);
        assert_eq!(geo.area_mm2, None);
        assert_eq!(geo.source, None);
        assert_eq!(geo.errors.len(), 1);
    }

    #[test]
    fn test_circle_bbox() {
        let src = r#"(footprint "C"
            (fp_circle (center 0 0) (end 1.5 0) (layer "F.CrtYd"))
        )"#;
        let fp = Footprint::from_string(src).unwrap();
        let geo = extract_geometry(&fp);
        // bounding square of a r=1.5 circle
        assert_eq!(geo.area_mm2, Some(9.0));
        assert_eq!(geo.source, Some(AreaSource::Courtyard));
    }
}
