use crate::layout::{Layout, LayoutResult};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldReport {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    pub offset: u64,
    pub size: u64,
    pub align: u64,
    pub is_padding: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StructReport {
    pub name: String,
    pub original_size: u64,
    pub optimized_size: u64,
    pub wasted_bytes: u64,
    pub wasted_percent: f64,
    pub optimized_wasted_bytes: u64,
    pub optimized_wasted_percent: f64,
    pub fields: Vec<FieldReport>,
    pub optimized_fields: Vec<FieldReport>,
}

impl From<&LayoutResult> for StructReport {
    fn from(result: &LayoutResult) -> Self {
        StructReport {
            name: result.name().to_string(),
            original_size: result.total_size(),
            optimized_size: result.optimized_total_size(),
            wasted_bytes: result.wasted_bytes(),
            wasted_percent: result.wasted_percent(),
            optimized_wasted_bytes: result.optimized_wasted_bytes(),
            optimized_wasted_percent: result.optimized_wasted_percent(),
            fields: field_reports(result.declared()),
            optimized_fields: field_reports(result.optimized()),
        }
    }
}

fn field_reports(layout: &Layout) -> Vec<FieldReport> {
    layout
        .placed()
        .map(|p| FieldReport {
            name: p.field.name.clone(),
            type_name: p.field.type_name.clone(),
            offset: p.offset,
            size: p.field.size,
            align: p.field.align,
            is_padding: p.field.is_padding,
        })
        .collect()
}

pub fn to_json(results: &[LayoutResult]) -> serde_json::Result<String> {
    let reports = results.iter().map(StructReport::from).collect::<Vec<_>>();
    serde_json::to_string_pretty(&reports)
}

/// Human readable report of every struct, both layouts with offsets.
pub struct TextReport<'a>(pub &'a [LayoutResult]);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in self.0 {
            writeln!(f)?;
            writeln!(f, "Struct: {}", result.name())?;
            writeln!(f, "Original Size: {} bytes", result.total_size())?;
            writeln!(f, "Optimized Size: {} bytes", result.optimized_total_size())?;
            writeln!(
                f,
                "Wasted Space: {} bytes ({:.2}%)",
                result.wasted_bytes(),
                result.wasted_percent()
            )?;
            writeln!(
                f,
                "Optimized Wasted Space: {} bytes ({:.2}%)",
                result.optimized_wasted_bytes(),
                result.optimized_wasted_percent()
            )?;

            writeln!(f)?;
            writeln!(f, "Original Layout:")?;
            write_layout(f, result.declared())?;

            writeln!(f)?;
            writeln!(f, "Optimized Layout:")?;
            write_layout(f, result.optimized())?;
        }

        Ok(())
    }
}

fn write_layout(f: &mut fmt::Formatter<'_>, layout: &Layout) -> fmt::Result {
    for p in layout.placed() {
        if p.field.is_padding {
            writeln!(f, "  [padding] {} bytes at offset {}", p.field.size, p.offset)?;
        } else {
            writeln!(
                f,
                "  {} ({}) {} bytes at offset {}",
                p.field.name, p.field.type_name, p.field.size, p.offset
            )?;
        }
    }

    Ok(())
}

/// Go definitions of every struct with its fields in the optimized order.
pub struct SuggestedCode<'a>(pub &'a [LayoutResult]);

impl fmt::Display for SuggestedCode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// Optimized struct definitions:")?;
        writeln!(f)?;

        for result in self.0 {
            writeln!(f, "type {}Optimized struct {{", suggested_name(result.name()))?;
            for field in result.optimized().real_fields() {
                if is_embedded(&field.name, &field.type_name) {
                    writeln!(f, "\t{}", field.type_name)?;
                } else {
                    writeln!(f, "\t{} {}", field.name, field.type_name)?;
                }
            }
            writeln!(f, "}}")?;
            writeln!(f)?;
        }

        Ok(())
    }
}

// `Config.Limits` -> `ConfigLimits`
fn suggested_name(name: &str) -> String {
    name.replace('.', "")
}

// Embedded fields carry the name of their type, with any pointer and package
// qualifier stripped.
fn is_embedded(name: &str, type_name: &str) -> bool {
    let base = type_name.strip_prefix('*').unwrap_or(type_name);
    let ident = match base.split_once('.') {
        Some((package, ident)) if is_identifier(package) => ident,
        Some(_) => return false,
        None => base,
    };

    ident == name && is_identifier(ident)
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FieldDescriptor, TypeLayout};

    fn needs_padding() -> LayoutResult {
        LayoutResult::new(
            "NeedsPadding",
            &[
                FieldDescriptor::new("A", "bool", TypeLayout::new(1, 1)),
                FieldDescriptor::new("B", "int64", TypeLayout::new(8, 8)),
                FieldDescriptor::new("C", "int32", TypeLayout::new(4, 4)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn report_uses_scanned_offsets() {
        let report = StructReport::from(&needs_padding());

        let offsets = report
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.offset))
            .collect::<Vec<_>>();

        assert_eq!(
            offsets,
            vec![("A", 0), ("padding", 1), ("B", 8), ("C", 16), ("tail padding", 20)]
        );
        assert_eq!(report.original_size, 24);
        assert_eq!(report.optimized_size, 16);
    }

    #[test]
    fn json_omits_the_type_of_padding() {
        let json = to_json(&[needs_padding()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let fields = &value[0]["fields"];
        assert_eq!(fields[0]["type"], "bool");
        assert_eq!(fields[1]["is_padding"], true);
        assert!(fields[1].get("type").is_none());
        assert_eq!(value[0]["wasted_bytes"], 11);
        assert_eq!(value[0]["optimized_wasted_bytes"], 3);
    }

    #[test]
    fn embedded_detection() {
        assert!(is_embedded("Base", "Base"));
        assert!(is_embedded("Base", "*Base"));
        assert!(is_embedded("Mutex", "sync.Mutex"));
        assert!(!is_embedded("Next", "*Node"));
        assert!(!is_embedded("Items", "[]Base"));
        assert!(!is_embedded("T", "map[string]pkg.T"));
    }

    #[test]
    fn nested_names_lose_their_dots() {
        assert_eq!(suggested_name("Config.Limits.Sub"), "ConfigLimitsSub");
    }
}
