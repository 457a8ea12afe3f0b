use std::io::Cursor;

use cadgraph_core::codec::{
    self, batch_dump_jsonl, canonicalize, decode, dump_jsonl, encode, load_jsonl, read_jsonl,
    CodecError, EncodeOptions,
};
use cadgraph_core::model::{Attrs, BoundingBox, Edge, EdgeType, Ir, IrParts, Node, NodeType};
use serde_json::{json, Value};

fn attrs(value: Value) -> Attrs {
    match value {
        Value::Object(map) => map,
        _ => panic!("attrs must be an object"),
    }
}

fn sample_ir() -> Ir {
    let mut parts = IrParts::new("bracket");
    parts.nodes = vec![
        Node::new("face_2", NodeType::AdvancedFace, attrs(json!({"z": 1, "a": {"y": true, "b": [3, 1]}}))),
        Node::part("Bracket", Some("root".into())),
        Node::new("face_1", NodeType::AdvancedFace, Attrs::new()),
        Node::unit("length", "mm", Some("u_len".into())),
    ];
    parts.edges = vec![
        Edge::new("root", "face_2", EdgeType::BoundedBy).unwrap(),
        Edge::new("root", "face_1", EdgeType::BoundedBy).unwrap(),
        Edge::new("face_1", "face_2", EdgeType::AdjacentTo).unwrap().with_attr("shared", 2),
        Edge::new("root", "u_len", EdgeType::MeasuredIn).unwrap(),
    ];
    parts.provenance = attrs(json!({"generator": "test", "backend": "occt", "file_size": 10}));
    parts.validation.warnings.push("Could not compute volume".into());
    parts.bounding_box = Some(BoundingBox::new([0.0, 0.0, 0.0], [1.0, 2.0, 3.0]));
    Ir::from_parts(parts)
}

#[test]
fn canonicalization_is_idempotent() {
    let ir = sample_ir();
    let once = canonicalize(&ir);
    let twice = canonicalize(&once);
    assert_eq!(
        encode(&once, EncodeOptions::verbatim()).unwrap(),
        encode(&twice, EncodeOptions::verbatim()).unwrap()
    );
}

#[test]
fn canonical_round_trip_is_byte_identical() {
    let first = encode(&sample_ir(), EncodeOptions::canonical()).unwrap();
    let decoded = decode(&first).unwrap();
    let second = encode(&decoded, EncodeOptions::canonical()).unwrap();
    assert_eq!(first, second);
}

/// Deterministic spread of non-trivial floats in [-1000, 1000).
fn float_sweep(count: usize) -> Vec<f64> {
    let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            (state >> 11) as f64 / (1u64 << 53) as f64 * 2000.0 - 1000.0
        })
        .collect()
}

#[test]
fn canonical_round_trip_keeps_every_float_digit() {
    for (idx, v) in float_sweep(5000).into_iter().enumerate() {
        let mut parts = IrParts::new(format!("float_{idx}"));
        parts.nodes = vec![Node::part("Body", Some("root".into()))
            .with_attr("volume", v)
            .with_attr("samples", json!([v / 3.0, v * 1e-7, -v]))];
        parts.bounding_box = Some(BoundingBox::new([v, -v, v / 7.0], [v + 0.1, 1.0 / (v.abs() + 1.0), 3.3]));
        let ir = Ir::from_parts(parts);

        let first = encode(&ir, EncodeOptions::canonical()).unwrap();
        let second = encode(&decode(&first).unwrap(), EncodeOptions::canonical()).unwrap();
        assert_eq!(first, second, "value {v:e}");
    }
}

#[test]
fn canonical_errors_ignore_edge_insertion_order() {
    let build = |dsts: [&str; 2]| {
        let edges = dsts.iter().map(|dst| Edge::new("n1", *dst, EdgeType::Contains).unwrap()).collect();
        let ir = Ir::new("dangling", vec![Node::bare("n1", NodeType::Part)], edges);
        let mut value = codec::to_json_value(&ir, true).unwrap();
        value["validation"]["created_at"] = Value::Null;
        value
    };

    let a = build(["ghost_a", "ghost_b"]);
    let b = build(["ghost_b", "ghost_a"]);
    assert_eq!(a, b);
    assert_eq!(
        a["validation"]["errors"],
        json!([
            "Edge references unknown destination node: ghost_a",
            "Edge references unknown destination node: ghost_b"
        ])
    );
}

#[test]
fn canonical_order_ignores_insertion_order() {
    let ir = Ir::new(
        "sorted",
        vec![
            Node::bare("zzz", NodeType::Part),
            Node::bare("aaa", NodeType::Assembly),
            Node::bare("mmm", NodeType::AdvancedFace),
        ],
        vec![],
    );
    let value = codec::to_json_value(&ir, true).unwrap();
    let ids: Vec<&str> = value["nodes"].as_array().unwrap().iter().map(|n| n["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["aaa", "zzz", "mmm"]);

    let reversed = Ir::new("sorted", ir.nodes().iter().rev().cloned().collect(), vec![]);
    let mut a = codec::to_json_value(&ir, true).unwrap();
    let mut b = codec::to_json_value(&reversed, true).unwrap();
    // Timestamps differ between the two builds.
    a["validation"]["created_at"] = Value::Null;
    b["validation"]["created_at"] = Value::Null;
    assert_eq!(a, b);
}

#[test]
fn edges_sort_by_src_dst_type() {
    let value = codec::to_json_value(&sample_ir(), true).unwrap();
    let edges: Vec<(String, String)> = value["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["src"].as_str().unwrap().to_string(), e["dst"].as_str().unwrap().to_string()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("face_1".to_string(), "face_2".to_string()),
            ("root".to_string(), "face_1".to_string()),
            ("root".to_string(), "face_2".to_string()),
            ("root".to_string(), "u_len".to_string()),
        ]
    );
}

#[test]
fn non_canonical_mode_keeps_insertion_order() {
    let text = encode(&sample_ir(), EncodeOptions::verbatim()).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["nodes"][0]["id"], "face_2");
    let keys: Vec<&String> = value["nodes"][0]["attrs"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["z", "a"]);
}

#[test]
fn document_has_expected_top_level_keys() {
    let text = encode(&sample_ir(), EncodeOptions::canonical()).unwrap();
    let value: Value = serde_json::from_str(&text).unwrap();
    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(
        keys,
        [
            "schema_version",
            "model_id",
            "validation",
            "units",
            "nodes",
            "edges",
            "provenance",
            "bounding_box"
        ]
    );
    assert_eq!(value["validation"]["is_valid"], true);
    assert_eq!(value["validation"]["node_count"], 4);
    assert_eq!(value["bounding_box"]["max_z"], 3.0);
}

#[test]
fn pretty_output_decodes_to_the_same_ir() {
    let ir = sample_ir();
    let pretty = encode(&ir, EncodeOptions::canonical().pretty()).unwrap();
    assert!(pretty.contains('\n'));
    let compact = encode(&decode(&pretty).unwrap(), EncodeOptions::canonical()).unwrap();
    assert_eq!(compact, encode(&ir, EncodeOptions::canonical()).unwrap());
}

#[test]
fn malformed_persisted_graph_decodes_with_errors_visible() {
    let line = r#"{"schema_version":"0.1.0","model_id":"bad","validation":{"created_at":"2024-01-01T00:00:00+00:00","node_count":2,"edge_count":2,"is_valid":true,"warnings":[],"errors":[]},"units":{"angle":"deg","length":"mm"},"nodes":[{"id":"dup","type":"Part","attrs":{"name":"a"}},{"id":"dup","type":"Part","attrs":{"name":"b"}}],"edges":[{"src":"dup","dst":"dup","type":"contains","attrs":{}},{"src":"dup","dst":"ghost","type":"mystery_link","attrs":{}}],"provenance":{}}"#;
    let ir = decode(line).unwrap();
    assert!(!ir.is_valid());
    assert_eq!(ir.nodes().len(), 2);
    assert_eq!(ir.edges().len(), 2);
    let errors = &ir.validation().errors;
    assert!(errors.iter().any(|e| e.contains("Duplicate node IDs found: dup")));
    assert!(errors.iter().any(|e| e.contains("Self-loops are not allowed")));
    assert!(errors.iter().any(|e| e.contains("unknown destination node: ghost")));
    assert_eq!(ir.edges()[1].edge_type().as_str(), "mystery_link");

    // Re-encoding does not pile up duplicate messages.
    let again = decode(&encode(&ir, EncodeOptions::canonical()).unwrap()).unwrap();
    assert_eq!(again.validation().errors.len(), errors.len());
}

#[test]
fn jsonl_batch_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("batch.jsonl");
    let second = Ir::new("other", vec![Node::bare("x", NodeType::VertexPoint)], vec![]);
    batch_dump_jsonl(&[sample_ir(), second], &path, true).unwrap();

    let body = std::fs::read_to_string(&path).unwrap();
    assert_eq!(body.lines().count(), 2);

    let loaded = load_jsonl(&path).unwrap();
    assert_eq!(loaded.len(), 2);
    assert_eq!(loaded[0].model_id, "bracket");
    assert_eq!(loaded[1].model_id, "other");
    assert_eq!(
        encode(&loaded[0], EncodeOptions::canonical()).unwrap(),
        body.lines().next().unwrap()
    );
}

#[test]
fn single_dump_writes_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("one.jsonl");
    dump_jsonl(&sample_ir(), &path, true).unwrap();
    assert_eq!(load_jsonl(&path).unwrap().len(), 1);
}

#[test]
fn decode_errors_carry_line_numbers() {
    let good = encode(&sample_ir(), EncodeOptions::canonical()).unwrap();
    let input = format!("{good}\n\n{{not json\n");
    match read_jsonl(Cursor::new(input)) {
        Err(CodecError::Decode { line, message }) => {
            assert_eq!(line, 3);
            assert!(!message.is_empty());
        }
        other => panic!("expected decode error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_jsonl(&dir.path().join("absent.jsonl")).unwrap_err();
    assert!(matches!(err, CodecError::NotFound(_)));
}
