mod common;

use cadgraph_core::codec::load_jsonl;
use common::{cadgraph, cadgraph_with_fake_occt, write_file, CUBE_STEP};
use predicates::prelude::*;

#[test]
fn load_reports_backend_and_units() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);

    let output = cadgraph_with_fake_occt(dir.path())
        .arg("load")
        .arg(&step)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body: serde_json::Value = serde_json::from_slice(&output).expect("load json");
    assert_eq!(body["model_id"], "cube");
    assert_eq!(body["backend"], "occt");
    assert_eq!(body["backend_version"], "occt-stepgraph 7.7.0-fake");
    assert_eq!(body["units"]["length"], "mm");
    assert_eq!(body["units"]["angle"], "deg");
    assert_eq!(body["session_stats"]["loaded_models"], 1);
    assert_eq!(body["sha256"].as_str().map(str::len), Some(64));
}

#[test]
fn load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cadgraph(dir.path())
        .arg("load")
        .arg(dir.path().join("missing.step"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load STEP file"))
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn load_empty_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let empty = write_file(dir.path(), "empty.step", "");
    cadgraph_with_fake_occt(dir.path())
        .arg("load")
        .arg(&empty)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load STEP file"));
}

#[test]
fn summarize_writes_canonical_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);
    let out = dir.path().join("ir");

    cadgraph_with_fake_occt(dir.path())
        .arg("summarize")
        .arg(&step)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Model: cube"))
        .stdout(predicate::str::contains("6 faces, 12 edges, 8 vertices"))
        .stdout(predicate::str::contains("(valid)"));

    let irs = load_jsonl(&out.join("cube.jsonl")).unwrap();
    assert_eq!(irs.len(), 1);
    assert!(irs[0].is_valid());
    assert_eq!(irs[0].provenance["backend"], "occt");
    let root = irs[0].get_node_by_id("cube_root").unwrap();
    assert_eq!(root.attrs["topology"]["faces"], 6);
    assert_eq!(irs[0].bounding_box.map(|b| b.volume()), Some(1000.0));
}

#[test]
fn summarize_as_json_prints_pretty_ir() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);

    let output = cadgraph_with_fake_occt(dir.path())
        .arg("summarize")
        .arg(&step)
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body: serde_json::Value = serde_json::from_slice(&output).expect("ir json");
    assert_eq!(body["model_id"], "cube");
    assert_eq!(body["nodes"][0]["id"], "cube_root");
    assert_eq!(body["validation"]["node_count"], 1);
}

#[test]
fn summarize_uses_configured_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);
    let out = dir.path().join("configured");
    let config = write_file(
        dir.path(),
        "cadgraph.yaml",
        &format!("output_dir: {}\n", out.display()),
    );

    cadgraph_with_fake_occt(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("summarize")
        .arg(&step)
        .assert()
        .success();
    assert!(out.join("cube.jsonl").is_file());
}

#[test]
fn bad_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);
    let config = write_file(dir.path(), "cadgraph.json", "{ nope");

    cadgraph_with_fake_occt(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("load")
        .arg(&step)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn export_gltf_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);
    let target = dir.path().join("views").join("cube.gltf");

    let output = cadgraph_with_fake_occt(dir.path())
        .arg("export")
        .arg(&step)
        .arg("--format")
        .arg("gltf")
        .arg("-o")
        .arg(&target)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let body: serde_json::Value = serde_json::from_slice(&output).expect("export json");
    assert_eq!(body["format"], "gltf");
    assert_eq!(body["mime_type"], "model/gltf+json");
    assert!(body["uri"].as_str().unwrap().starts_with("file://"));

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written["asset"]["version"], "2.0");
}

#[test]
fn export_defaults_to_glb_in_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);
    let out = dir.path().join("views");
    let config = write_file(
        dir.path(),
        "cadgraph.json",
        &serde_json::json!({ "output_dir": out }).to_string(),
    );

    cadgraph_with_fake_occt(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("export")
        .arg(&step)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported cube as glb"))
        .stdout(predicate::str::contains("model/gltf-binary"));

    let bytes = std::fs::read(out.join("cube.glb")).unwrap();
    assert_eq!(&bytes[..4], b"glTF");
}

#[test]
fn export_rejects_unknown_format() {
    let dir = tempfile::tempdir().unwrap();
    let step = write_file(dir.path(), "cube.step", CUBE_STEP);

    cadgraph_with_fake_occt(dir.path())
        .arg("export")
        .arg(&step)
        .arg("--format")
        .arg("obj")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported export format: obj"));
}
