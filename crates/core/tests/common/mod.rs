#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cadgraph_core::model::{Attrs, BoundingBox};
use cadgraph_core::services::backends::{
    BackendError, BackendInfo, GeometryHandle, KernelBackend, KernelLoad, KernelSummary,
};
use cadgraph_core::services::ingest::LoadedModel;
use cadgraph_core::services::summary::{GeometrySummary, Summarizer, SummaryError};

pub const STEP_MM: &str = "ISO-10303-21;
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

pub fn write_file(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

pub fn write_step(dir: &Path, name: &str) -> PathBuf {
    write_file(dir, name, STEP_MM)
}

#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    Unavailable,
    Succeed,
    Fail,
    Panic,
}

/// Handle type produced by `FakeBackend`.
pub struct FakeShape {
    pub backend: &'static str,
}

/// In-memory backend with scripted behavior and call counting.
pub struct FakeBackend {
    pub name: &'static str,
    pub behavior: Behavior,
    pub length_unit: Option<&'static str>,
    pub summary: KernelSummary,
    pub loads: Arc<AtomicUsize>,
}

impl FakeBackend {
    pub fn new(name: &'static str, behavior: Behavior) -> Self {
        Self {
            name,
            behavior,
            length_unit: None,
            summary: cube_summary(),
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl KernelBackend for FakeBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn probe(&self) -> Option<BackendInfo> {
        match self.behavior {
            Behavior::Unavailable => None,
            _ => Some(BackendInfo { name: self.name.to_string(), version: format!("{} 1.0", self.name), path: None }),
        }
    }

    fn load(&self, _path: &Path) -> Result<KernelLoad, BackendError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Unavailable => Err(BackendError::Unavailable(self.name.to_string())),
            Behavior::Fail => Err(BackendError::failed(self.name, "No geometry roots found in STEP file")),
            Behavior::Panic => panic!("{} blew up", self.name),
            Behavior::Succeed => {
                let mut metadata = Attrs::new();
                metadata.insert("nb_roots".into(), 1.into());
                Ok(KernelLoad {
                    handle: GeometryHandle::new(FakeShape { backend: self.name }),
                    version: String::new(),
                    length_unit: self.length_unit.map(str::to_string),
                    metadata,
                })
            }
        }
    }

    fn summarize(&self, handle: &GeometryHandle) -> Result<KernelSummary, BackendError> {
        handle
            .downcast_ref::<FakeShape>()
            .map(|_| self.summary.clone())
            .ok_or_else(|| BackendError::ForeignHandle(self.name.to_string()))
    }
}

pub fn cube_summary() -> KernelSummary {
    KernelSummary {
        solids: 1,
        shells: 1,
        faces: 6,
        edges: 12,
        vertices: 8,
        bounding_box: Some(BoundingBox::new([0.0, 0.0, 0.0], [10.0, 10.0, 10.0])),
        surface_area: Some(600.0),
        volume: Some(1000.0),
        has_curves: true,
        has_surfaces: true,
        has_assemblies: false,
        has_pmi: false,
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SummarizerBehavior {
    Succeed,
    Fail,
    Panic,
    /// Succeed after sleeping.
    Slow(Duration),
}

/// Summarizer that counts calls and behaves as scripted.
pub struct CountingSummarizer {
    pub behavior: SummarizerBehavior,
    pub calls: Arc<AtomicUsize>,
}

impl CountingSummarizer {
    pub fn new(behavior: SummarizerBehavior) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (Self { behavior, calls: calls.clone() }, calls)
    }
}

impl Summarizer for CountingSummarizer {
    fn summarize(&self, model: &LoadedModel) -> Result<GeometrySummary, SummaryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            SummarizerBehavior::Succeed => Ok(GeometrySummary::from_kernel(model, cube_summary())),
            SummarizerBehavior::Fail => {
                Err(BackendError::failed("fake", "tessellation exploded").into())
            }
            SummarizerBehavior::Panic => panic!("summarizer crashed"),
            SummarizerBehavior::Slow(delay) => {
                std::thread::sleep(delay);
                Ok(GeometrySummary::from_kernel(model, cube_summary()))
            }
        }
    }
}
