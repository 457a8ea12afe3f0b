#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub const CUBE_STEP: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('cube'),'2;1');
FILE_NAME('cube.step','2024-01-01T00:00:00',(''),(''),'','','');
FILE_SCHEMA(('AUTOMOTIVE_DESIGN'));
ENDSEC;
DATA;
#1 = ( LENGTH_UNIT() NAMED_UNIT(*) SI_UNIT(.MILLI.,.METRE.) );
ENDSEC;
END-ISO-10303-21;
";

pub const FAKE_LOAD: &str = r#"{"nb_roots": 1, "length_unit": "MM", "reader_type": "STEPControl_Reader"}"#;

pub const FAKE_SUMMARY: &str = r#"{"solids":1,"shells":1,"faces":6,"edges":12,"vertices":8,
"bounding_box":{"min_x":0,"min_y":0,"min_z":0,"max_x":10,"max_y":10,"max_z":10},
"surface_area":600.0,"volume":1000.0}"#;

pub fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// `cadgraph` running in `dir` with no ambient backend or log configuration.
pub fn cadgraph(dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("cadgraph");
    cmd.current_dir(dir)
        .env_remove("CADGRAPH_OCCT_BIN")
        .env_remove("CADGRAPH_OCCT_FAKE_VERSION")
        .env_remove("CADGRAPH_OCCT_FAKE_LOAD")
        .env_remove("CADGRAPH_OCCT_FAKE_SUMMARY")
        .env_remove("CADGRAPH_MAX_MODELS")
        .env_remove("CADGRAPH_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Like `cadgraph`, but with the OCCT backend answering from fixture files
/// written into `dir`.
pub fn cadgraph_with_fake_occt(dir: &Path) -> Command {
    let load = write_file(dir, "fake-load.json", FAKE_LOAD);
    let summary = write_file(dir, "fake-summary.json", FAKE_SUMMARY);
    let mut cmd = cadgraph(dir);
    cmd.env("CADGRAPH_OCCT_FAKE_VERSION", "occt-stepgraph 7.7.0-fake")
        .env("CADGRAPH_OCCT_FAKE_LOAD", load)
        .env("CADGRAPH_OCCT_FAKE_SUMMARY", summary);
    cmd
}
