#![cfg(feature = "occt-backend")]

use cadgraph_core::services::backends::{KernelBackend, OcctBackend};

// Env vars are process-wide, so everything touching them lives in one test.
#[test]
fn occt_backend_uses_fake_tool_output_without_occt_installed() {
    let temp = tempfile::tempdir().unwrap();
    let step = temp.path().join("cube.step");
    std::fs::write(&step, "ISO-10303-21;\nHEADER;\nENDSEC;\n").unwrap();

    let fake_load = temp.path().join("load.json");
    std::fs::write(&fake_load, r#"{"nb_roots": 1, "length_unit": "MM"}"#).unwrap();
    let fake_summary = temp.path().join("summary.json");
    std::fs::write(
        &fake_summary,
        r#"{"solids":1,"shells":1,"faces":6,"edges":12,"vertices":8,
            "bounding_box":{"min_x":0,"min_y":0,"min_z":0,"max_x":2,"max_y":3,"max_z":4},
            "surface_area":52.0,"volume":24.0}"#,
    )
    .unwrap();
    let empty_load = temp.path().join("empty.json");
    std::fs::write(&empty_load, r#"{"nb_roots": 0}"#).unwrap();

    std::env::set_var("CADGRAPH_OCCT_FAKE_VERSION", "occt-stepgraph 7.7.0-fake");
    std::env::set_var("CADGRAPH_OCCT_FAKE_LOAD", &fake_load);
    std::env::set_var("CADGRAPH_OCCT_FAKE_SUMMARY", &fake_summary);

    let backend = OcctBackend::new(None);
    let info = backend.probe().expect("fake version makes the backend available");
    assert_eq!(info.name, "occt");
    assert_eq!(info.version, "occt-stepgraph 7.7.0-fake");

    let load = backend.load(&step).expect("fake load");
    assert_eq!(load.version, "occt-stepgraph 7.7.0-fake");
    assert_eq!(load.length_unit.as_deref(), Some("MM"));
    assert_eq!(load.metadata["nb_roots"], 1);

    let summary = backend.summarize(&load.handle).expect("fake summary");
    assert_eq!(summary.faces, 6);
    assert!(summary.has_surfaces);
    assert_eq!(summary.bounding_box.map(|b| b.volume()), Some(24.0));
    assert_eq!(summary.volume, Some(24.0));

    std::env::set_var("CADGRAPH_OCCT_FAKE_LOAD", &empty_load);
    let err = backend.load(&step).unwrap_err();
    assert!(err.to_string().contains("No geometry roots"));

    std::env::remove_var("CADGRAPH_OCCT_FAKE_VERSION");
    std::env::remove_var("CADGRAPH_OCCT_FAKE_LOAD");
    std::env::remove_var("CADGRAPH_OCCT_FAKE_SUMMARY");
}
