//! Bounded in-memory cache of loaded models and their summaries.
//!
//! A `Session` is an ordinary value: create one per host (or per test) and
//! pass it around. `SharedSession` wraps it in a reader-writer lock for hosts
//! that serve requests concurrently.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{CadgraphConfig, DEFAULT_MAX_MODELS};
use crate::services::backends::{default_backend_registry, BackendRegistry};
use crate::services::ingest::{IngestError, IngestPipeline, LoadedModel};
use crate::services::panic_message;
use crate::services::summary::{GeometrySummary, KernelSummarizer, Summarizer};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Model not found in session: {0}")]
    NotFound(String),

    #[error("Failed to load STEP file: {0}")]
    BackendFailure(#[from] IngestError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    pub loaded_models: usize,
    pub max_models: usize,
    /// Oldest load first.
    pub model_ids: Vec<String>,
}

/// Cache of at most `max_models` models, evicting the least recently loaded.
///
/// Load order is tracked with a logical clock rather than wall time, so
/// eviction is deterministic even for loads within the same instant.
pub struct Session {
    pipeline: Arc<IngestPipeline>,
    summarizer: Arc<dyn Summarizer>,
    max_models: usize,
    models: HashMap<String, Arc<LoadedModel>>,
    summaries: HashMap<String, GeometrySummary>,
    load_times: HashMap<String, u64>,
    clock: u64,
}

impl Session {
    /// `max_models` below 1 is raised to 1.
    pub fn new(pipeline: IngestPipeline, summarizer: Box<dyn Summarizer>, max_models: usize) -> Self {
        let max_models = max_models.max(1);
        tracing::info!(max_models, "session initialized");
        Self {
            pipeline: Arc::new(pipeline),
            summarizer: Arc::from(summarizer),
            max_models,
            models: HashMap::new(),
            summaries: HashMap::new(),
            load_times: HashMap::new(),
            clock: 0,
        }
    }

    /// Session over `registry`, summarizing through the same backends.
    pub fn with_registry(registry: BackendRegistry, max_models: usize) -> Self {
        let registry = Arc::new(registry);
        Self::new(
            IngestPipeline::new(registry.clone()),
            Box::new(KernelSummarizer::new(registry)),
            max_models,
        )
    }

    /// Session with every compiled-in backend, configured from `config`.
    pub fn from_config(config: &CadgraphConfig) -> Self {
        Self::with_registry(default_backend_registry(&config.backends), config.max_models)
    }

    pub fn pipeline(&self) -> &Arc<IngestPipeline> {
        &self.pipeline
    }

    pub fn max_models(&self) -> usize {
        self.max_models
    }

    /// Ingest `source` and cache the result. On failure the cache is left
    /// untouched.
    pub fn load(&mut self, source: &Path) -> Result<Arc<LoadedModel>, SessionError> {
        let model = self.pipeline.ingest(source).map_err(|err| {
            tracing::error!(file = %source.display(), error = %err, "failed to load model");
            SessionError::from(err)
        })?;
        Ok(self.insert(model))
    }

    /// Store an already-ingested model under its id, stamping it with the
    /// next logical time. Re-inserting an id replaces the model and drops its
    /// cached summary.
    pub fn insert(&mut self, model: LoadedModel) -> Arc<LoadedModel> {
        let model_id = model.model_id.clone();
        let model = Arc::new(model);
        let stamp = self.clock;
        self.clock += 1;

        self.models.insert(model_id.clone(), model.clone());
        self.summaries.remove(&model_id);
        self.load_times.insert(model_id.clone(), stamp);
        tracing::debug!(model_id = %model_id, stamp, "model cached");

        self.evict_overflow();
        model
    }

    /// Drop the oldest entries until at most `max_models` remain. Returns
    /// the evicted ids, oldest first.
    pub fn evict_overflow(&mut self) -> Vec<String> {
        if self.models.len() <= self.max_models {
            return Vec::new();
        }
        let excess = self.models.len() - self.max_models;
        let evicted: Vec<String> =
            self.ids_by_load_time().into_iter().take(excess).collect();
        for model_id in &evicted {
            tracing::debug!(model_id = %model_id, "evicting model");
            self.remove(model_id);
        }
        evicted
    }

    /// Cached summary for `model_id`, computing it on first use.
    ///
    /// Summarizer failures (errors or panics) are not propagated: a
    /// placeholder carrying the failure text is cached and returned instead,
    /// and is served again until the model is removed, evicted or reloaded.
    pub fn summarize(&mut self, model_id: &str) -> Result<GeometrySummary, SessionError> {
        let model = self
            .models
            .get(model_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(model_id.to_string()))?;
        if let Some(cached) = self.summaries.get(model_id) {
            return Ok(cached.clone());
        }

        let summary = compute_summary(self.summarizer.as_ref(), &model);
        self.summaries.insert(model_id.to_string(), summary.clone());
        Ok(summary)
    }

    /// Cache `summary` for `model`, unless that exact model has since been
    /// reloaded, evicted or removed. An already cached summary wins.
    fn cache_summary(&mut self, model: &Arc<LoadedModel>, summary: GeometrySummary) -> GeometrySummary {
        let current = self.models.get(&model.model_id).is_some_and(|m| Arc::ptr_eq(m, model));
        if !current {
            tracing::debug!(model_id = %model.model_id, "model changed while summarizing, not caching");
            return summary;
        }
        self.summaries.entry(model.model_id.clone()).or_insert(summary).clone()
    }

    /// Forget a model, its summary and its load time. Unknown ids are
    /// ignored.
    pub fn remove(&mut self, model_id: &str) {
        if self.models.remove(model_id).is_some() {
            tracing::debug!(model_id, "removed model from session");
        }
        self.summaries.remove(model_id);
        self.load_times.remove(model_id);
    }

    pub fn has(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    pub fn get(&self, model_id: &str) -> Option<Arc<LoadedModel>> {
        self.models.get(model_id).cloned()
    }

    pub fn get_summary(&self, model_id: &str) -> Option<&GeometrySummary> {
        self.summaries.get(model_id)
    }

    pub fn load_timestamp(&self, model_id: &str) -> Option<u64> {
        self.load_times.get(model_id).copied()
    }

    /// Ids in load order, oldest first.
    pub fn list_ids(&self) -> Vec<String> {
        self.ids_by_load_time()
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            loaded_models: self.models.len(),
            max_models: self.max_models,
            model_ids: self.list_ids(),
        }
    }

    fn ids_by_load_time(&self) -> Vec<String> {
        let mut entries: Vec<(u64, &String)> =
            self.models.keys().map(|id| (self.load_times.get(id).copied().unwrap_or(0), id)).collect();
        entries.sort();
        entries.into_iter().map(|(_, id)| id.clone()).collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::with_registry(default_backend_registry(&Default::default()), DEFAULT_MAX_MODELS)
    }
}

/// Run the summarizer, turning errors and panics into a placeholder.
fn compute_summary(summarizer: &dyn Summarizer, model: &LoadedModel) -> GeometrySummary {
    let model_id = model.model_id.as_str();
    match catch_unwind(AssertUnwindSafe(|| summarizer.summarize(model))) {
        Ok(Ok(summary)) => summary,
        Ok(Err(err)) => {
            tracing::error!(model_id, error = %err, "failed to generate summary");
            GeometrySummary::placeholder(model_id, &err.to_string())
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(model_id, error = %message, "summarizer panicked");
            GeometrySummary::placeholder(model_id, &message)
        }
    }
}

/// `Session` behind a reader-writer lock.
///
/// Ingestion and summarizing run outside the lock; only the final cache
/// insert takes the write side, so readers are never blocked on a slow
/// kernel. Two callers summarizing the same model may both compute it; the
/// first result to be cached is the one every caller gets back afterwards.
#[derive(Clone)]
pub struct SharedSession {
    inner: Arc<RwLock<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self { inner: Arc::new(RwLock::new(session)) }
    }

    pub fn load(&self, source: &Path) -> Result<Arc<LoadedModel>, SessionError> {
        let pipeline = self.inner.read().pipeline().clone();
        let model = pipeline.ingest(source).map_err(|err| {
            tracing::error!(file = %source.display(), error = %err, "failed to load model");
            SessionError::from(err)
        })?;
        Ok(self.inner.write().insert(model))
    }

    pub fn summarize(&self, model_id: &str) -> Result<GeometrySummary, SessionError> {
        let (model, summarizer) = {
            let session = self.inner.read();
            let model =
                session.get(model_id).ok_or_else(|| SessionError::NotFound(model_id.to_string()))?;
            if let Some(cached) = session.get_summary(model_id) {
                return Ok(cached.clone());
            }
            (model, session.summarizer.clone())
        };
        let summary = compute_summary(summarizer.as_ref(), &model);
        Ok(self.inner.write().cache_summary(&model, summary))
    }

    pub fn remove(&self, model_id: &str) {
        self.inner.write().remove(model_id);
    }

    pub fn has(&self, model_id: &str) -> bool {
        self.inner.read().has(model_id)
    }

    pub fn get(&self, model_id: &str) -> Option<Arc<LoadedModel>> {
        self.inner.read().get(model_id)
    }

    pub fn get_summary(&self, model_id: &str) -> Option<GeometrySummary> {
        self.inner.read().get_summary(model_id).cloned()
    }

    pub fn list_ids(&self) -> Vec<String> {
        self.inner.read().list_ids()
    }

    pub fn stats(&self) -> SessionStats {
        self.inner.read().stats()
    }

    /// Run `f` with shared access to the underlying session.
    pub fn read<R>(&self, f: impl FnOnce(&Session) -> R) -> R {
        f(&self.inner.read())
    }
}
