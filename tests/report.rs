use insta::assert_snapshot;
use viztruct::analyze_structs;
use viztruct::report::{to_json, SuggestedCode, TextReport};
use viztruct::svg::render_svg;

const SOURCE: &str = "
type NeedsPadding struct {
    A bool
    B int64
    C int32
}
";

#[test]
fn text_report() {
    let results = analyze_structs(SOURCE).unwrap();

    assert_snapshot!(TextReport(&results).to_string(), @r"
    Struct: NeedsPadding
    Original Size: 24 bytes
    Optimized Size: 16 bytes
    Wasted Space: 11 bytes (45.83%)
    Optimized Wasted Space: 3 bytes (18.75%)

    Original Layout:
      A (bool) 1 bytes at offset 0
      [padding] 7 bytes at offset 1
      B (int64) 8 bytes at offset 8
      C (int32) 4 bytes at offset 16
      [padding] 4 bytes at offset 20

    Optimized Layout:
      B (int64) 8 bytes at offset 0
      C (int32) 4 bytes at offset 8
      A (bool) 1 bytes at offset 12
      [padding] 3 bytes at offset 13
    ");
}

#[test]
fn suggested_code_for_nested_structs() {
    let results = analyze_structs(
        "type Base struct { ID int64 }
         type Job struct {
             Done bool
             Base
             Retry struct {
                 Max   int8
                 Delay int64
             }
         }",
    )
    .unwrap();

    let code = SuggestedCode(&results).to_string();

    assert_eq!(
        code,
        "// Optimized struct definitions:\n\
         \n\
         type BaseOptimized struct {\n\
         \tID int64\n\
         }\n\
         \n\
         type JobOptimized struct {\n\
         \tRetry struct{Max int8; Delay int64}\n\
         \tBase\n\
         \tDone bool\n\
         }\n\
         \n\
         type JobRetryOptimized struct {\n\
         \tDelay int64\n\
         \tMax int8\n\
         }\n\
         \n"
    );
}

#[test]
fn json_report() {
    let results = analyze_structs("type MyStruct struct { A int8; B int32 }").unwrap();
    let json = to_json(&results).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let expected = serde_json::json!([{
        "name": "MyStruct",
        "original_size": 8,
        "optimized_size": 8,
        "wasted_bytes": 3,
        "wasted_percent": 37.5,
        "optimized_wasted_bytes": 3,
        "optimized_wasted_percent": 37.5,
        "fields": [
            { "name": "A", "type": "int8", "offset": 0, "size": 1, "align": 1, "is_padding": false },
            { "name": "padding", "offset": 1, "size": 3, "align": 1, "is_padding": true },
            { "name": "B", "type": "int32", "offset": 4, "size": 4, "align": 4, "is_padding": false }
        ],
        "optimized_fields": [
            { "name": "B", "type": "int32", "offset": 0, "size": 4, "align": 4, "is_padding": false },
            { "name": "A", "type": "int8", "offset": 4, "size": 1, "align": 1, "is_padding": false },
            { "name": "tail padding", "offset": 5, "size": 3, "align": 1, "is_padding": true }
        ]
    }]);

    assert_eq!(value, expected);
}

#[test]
fn svg_has_a_section_per_struct() {
    let results = analyze_structs(
        "type A struct { X int8 }
         type B struct { Y bool; Z int64 }",
    )
    .unwrap();

    let svg = render_svg(&results);

    assert!(svg.contains(r#"class="struct-name">A</text>"#));
    assert!(svg.contains(r#"class="struct-name">B</text>"#));
    assert!(svg.contains("Total size: 16 bytes | Wasted: 7 bytes (43.75%)"));
    assert!(svg.contains("Optimized layout: 16 bytes (saved 0 bytes, 43.75% waste)"));
}
