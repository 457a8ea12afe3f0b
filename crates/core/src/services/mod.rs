//! Services layered on top of the IR: ingestion, summaries, the session
//! cache, export, and the host-facing tool surface.

pub mod backends;
pub mod export;
pub mod ingest;
pub mod ir_builder;
pub mod session;
pub mod summary;
pub mod tools;

/// Best-effort text for a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
