use std::fs;
use std::path::PathBuf;
use viztruct::{analyze_structs, LayoutResult};

const SAMPLE_FOLDER: &str = "tests/samples/";

fn sample_paths() -> Vec<PathBuf> {
    let mut paths = fs::read_dir(SAMPLE_FOLDER)
        .unwrap()
        .filter_map(|entry| {
            let Ok(entry) = entry else { return None };
            let path = entry.path();

            if !path.is_file() {
                return None;
            }

            let Some(ext) = path.extension() else { return None };

            if ext != "go" {
                return None;
            }

            Some(path)
        })
        .collect::<Vec<_>>();

    paths.sort();
    paths
}

fn analyze_sample(name: &str) -> Vec<LayoutResult> {
    let contents = fs::read_to_string(format!("{SAMPLE_FOLDER}{name}")).unwrap();

    match analyze_structs(&contents) {
        Ok(results) => results,
        Err(e) => panic!("Analysis of sample \"{name}\" failed: {e}"),
    }
}

fn summary(results: &[LayoutResult]) -> Vec<(&str, u64, u64, u64, u64)> {
    results
        .iter()
        .map(|r| {
            (
                r.name(),
                r.total_size(),
                r.wasted_bytes(),
                r.optimized_total_size(),
                r.optimized_wasted_bytes(),
            )
        })
        .collect()
}

#[test]
fn every_sample_analyzes() {
    let paths = sample_paths();
    assert!(!paths.is_empty());

    for path in paths {
        let contents = fs::read_to_string(&path).unwrap();
        let results = analyze_structs(&contents)
            .unwrap_or_else(|e| panic!("{}: {e}", path.display()));

        for result in &results {
            assert!(result.optimized_total_size() <= result.total_size());
            assert_eq!(result.total_size() % result.declared().struct_align(), 0);
        }
    }
}

#[test]
fn basic() {
    let results = analyze_sample("basic.go");

    assert_eq!(
        summary(&results),
        vec![
            ("MyStruct", 8, 3, 8, 3),
            ("NeedsPadding", 24, 11, 16, 3),
            ("Empty", 0, 0, 0, 0),
        ]
    );
}

#[test]
fn server() {
    let results = analyze_sample("server.go");

    assert_eq!(
        summary(&results),
        vec![
            ("Peer", 304, 10, 296, 2),
            ("Server", 192, 7, 192, 7),
            ("Server.Limits", 16, 3, 16, 3),
        ]
    );

    let optimized = results[0]
        .optimized()
        .real_fields()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>();

    assert_eq!(
        optimized,
        vec!["Addr", "Latency", "Handle", "ID", "Buffer", "Connected", "Retries"]
    );

    let types = results[1]
        .declared()
        .real_fields()
        .map(|f| f.type_name.as_str())
        .collect::<Vec<_>>();

    assert_eq!(
        types,
        vec![
            "string",
            "bool",
            "[MaxPeers]*Peer",
            "chan Event",
            "func(err error) bool",
            "struct{MaxConns int32; Verbose bool; Timeout int64}",
            "map[string]uint64",
        ]
    );
}

#[test]
fn shapes() {
    let results = analyze_sample("shapes.go");

    assert_eq!(
        summary(&results),
        vec![("Point", 8, 0, 8, 0), ("Shape", 56, 9, 48, 1)]
    );
    assert_eq!(results[1].saved_bytes(), 8);
}
