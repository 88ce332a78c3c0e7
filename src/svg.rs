//! SVG diagram of the declared and optimized layout of every struct.

use crate::layout::{Layout, LayoutResult};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt;

const WIDTH: f64 = 1200.0;
const BLOCK_HEIGHT: f64 = 40.0;
const PADDING_X: f64 = 10.0;
const PADDING_Y: f64 = 10.0;
const STRUCT_SPACING: f64 = 30.0;

// Vertical positions inside one struct's section.
const NAME_Y: f64 = 20.0;
const SUMMARY_Y: f64 = 40.0;
const DECLARED_CAPTION_Y: f64 = 60.0;
const DECLARED_ROW_Y: f64 = 160.0;
const OPTIMIZED_CAPTION_Y: f64 = 240.0;
const OPTIMIZED_ROW_Y: f64 = 340.0;
const SECTION_HEIGHT: f64 = 400.0;

const LABEL_GAP: f64 = 20.0;
const LABEL_SHIFT_X: f64 = 7.3;
const OFFSET_LABEL_GAP: f64 = 55.0;

const PADDING_COLOR: &str = "#CCCCCC";
const UNKNOWN_COLOR: &str = "#90A4AE";

const STYLE: &str = r#"<style>
  .field-text { font-family: Arial, sans-serif; font-size: 14px; fill: #000000; }
  .struct-name { font-family: Arial, sans-serif; font-size: 16px; font-weight: bold; fill: #000000; }
  .offset-text { font-family: Arial, sans-serif; font-size: 12px; fill: #000000; }
</style>"#;

/// Fill color for a field of the named type.
pub fn type_color(type_name: &str) -> &'static str {
    match type_name {
        "uint64" | "int64" => "#4285F4",
        "uint32" | "int32" => "#34A853",
        "uint16" | "int16" => "#FBBC05",
        "uint8" | "int8" => "#EA4335",
        "bool" => "#9C27B0",
        "string" => "#FF9800",
        "byte" => "#607D8B",
        "rune" => "#795548",
        "float64" => "#0097A7",
        "float32" => "#00BCD4",
        "" => PADDING_COLOR,
        _ => UNKNOWN_COLOR,
    }
}

pub struct SvgDiagram<'a>(pub &'a [LayoutResult]);

pub fn render_svg(results: &[LayoutResult]) -> String {
    SvgDiagram(results).to_string()
}

impl fmt::Display for SvgDiagram<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = self.0.len().max(1) as f64;
        let height = 2.0 * PADDING_Y + sections * (SECTION_HEIGHT + STRUCT_SPACING);

        writeln!(
            f,
            r#"<svg width="{WIDTH}" height="{height}" xmlns="http://www.w3.org/2000/svg">"#
        )?;
        writeln!(f, "{STYLE}")?;
        writeln!(f, r#"<rect width="100%" height="100%" fill="white"/>"#)?;

        let mut top = PADDING_Y;
        for result in self.0 {
            write_section(f, result, top)?;
            top += SECTION_HEIGHT + STRUCT_SPACING;
        }

        writeln!(f, "</svg>")
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, result: &LayoutResult, top: f64) -> fmt::Result {
    // both rows share the declared scale so their lengths compare
    let scale = (WIDTH - 2.0 * PADDING_X) / result.total_size().max(1) as f64;

    write_text(f, PADDING_X, top + NAME_Y, "struct-name", result.name())?;
    write_text(
        f,
        PADDING_X,
        top + SUMMARY_Y,
        "field-text",
        &format!(
            "Total size: {} bytes | Wasted: {} bytes ({:.2}%)",
            result.total_size(),
            result.wasted_bytes(),
            result.wasted_percent()
        ),
    )?;

    write_text(f, PADDING_X, top + DECLARED_CAPTION_Y, "field-text", "Original layout:")?;
    write_row(f, result.declared(), top + DECLARED_ROW_Y, scale)?;

    write_text(
        f,
        PADDING_X,
        top + OPTIMIZED_CAPTION_Y,
        "field-text",
        &format!(
            "Optimized layout: {} bytes (saved {} bytes, {:.2}% waste)",
            result.optimized_total_size(),
            result.saved_bytes(),
            result.optimized_wasted_percent()
        ),
    )?;
    write_row(f, result.optimized(), top + OPTIMIZED_ROW_Y, scale)
}

fn write_row(f: &mut fmt::Formatter<'_>, layout: &Layout, y: f64, scale: f64) -> fmt::Result {
    for placed in layout.placed() {
        let field = placed.field;
        let x = PADDING_X + placed.offset as f64 * scale;
        let width = field.size as f64 * scale;

        if !field.is_padding {
            let label_x = x + LABEL_SHIFT_X;
            let label_y = y - LABEL_GAP;
            writeln!(
                f,
                r#"<text x="{label_x:.1}" y="{label_y:.1}" class="field-text" text-anchor="end" transform="rotate(90 {label_x:.1} {label_y:.1})">{}</text>"#,
                encode_text(&field.name)
            )?;
        }

        let (color, stroke) = if field.is_padding {
            (PADDING_COLOR, r#"stroke="gray" stroke-dasharray="5,5""#)
        } else {
            (type_color(&field.type_name), r#"stroke="black""#)
        };

        writeln!(
            f,
            r#"<rect x="{x:.1}" y="{y:.1}" width="{width:.1}" height="{BLOCK_HEIGHT}" fill="{color}" {stroke} stroke-width="1"><title>{}</title></rect>"#,
            encode_text(&block_title(placed.field.name.as_str(), &field.type_name, field.size))
        )?;

        write_offset(f, x, y, placed.offset)?;
    }

    let end = PADDING_X + layout.total_size() as f64 * scale;
    write_offset(f, end, y, layout.total_size())
}

fn block_title(name: &str, type_name: &str, size: u64) -> String {
    if type_name.is_empty() {
        format!("{name}: {size} bytes")
    } else {
        format!("{name} {type_name}: {size} bytes")
    }
}

fn write_offset(f: &mut fmt::Formatter<'_>, x: f64, row_y: f64, offset: u64) -> fmt::Result {
    writeln!(
        f,
        r#"<text x="{x:.1}" y="{:.1}" class="offset-text" text-anchor="middle">{offset}</text>"#,
        row_y + OFFSET_LABEL_GAP
    )
}

fn write_text(f: &mut fmt::Formatter<'_>, x: f64, y: f64, class: &str, text: &str) -> fmt::Result {
    writeln!(
        f,
        r#"<text x="{x:.1}" y="{y:.1}" class="{}">{}</text>"#,
        encode_double_quoted_attribute(class),
        encode_text(text)
    )
}
