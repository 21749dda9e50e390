//! Structured logging helpers.
//!
//! Timing events go to the `mesh_split::timing` target and mesh snapshots to
//! `mesh_split::mesh_state`, so embedding applications can filter them
//! independently of the main event stream.

use std::time::Instant;
use tracing::{debug, info, Span};

use crate::types::Mesh;

/// Times an operation and logs its duration on drop.
///
/// Creates a `split_operation` span for the lifetime of the timer; nested
/// events inherit it.
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Start timing a named operation.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("split_operation", operation = name);
        {
            let _enter = span.enter();
            debug!(target: "mesh_split::timing", operation = name, "starting operation");
        }
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Start timing with mesh size context recorded on the span.
    pub fn with_context(name: &'static str, vertex_count: usize, face_count: usize) -> Self {
        let span = tracing::info_span!(
            "split_operation",
            operation = name,
            vertex_count,
            face_count
        );
        {
            let _enter = span.enter();
            debug!(
                target: "mesh_split::timing",
                operation = name,
                vertex_count,
                face_count,
                "starting operation"
            );
        }
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let _enter = self.span.enter();
        info!(
            target: "mesh_split::timing",
            operation = self.name,
            elapsed_ms = self.start.elapsed().as_millis() as u64,
            "operation complete"
        );
    }
}

/// Log a mesh's vital statistics at debug level.
pub fn log_mesh_stats(mesh: &Mesh, context: &str) {
    debug!(
        target: "mesh_split::mesh_state",
        context,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "mesh state"
    );
}

/// Log a coarse progress marker for an operation stage.
pub fn log_progress(operation: &str, current: usize, total: usize, stage: &str) {
    debug!(
        target: "mesh_split::timing",
        operation,
        current,
        total,
        stage,
        "progress"
    );
}

struct PerfGuard {
    name: &'static str,
    start: Instant,
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        debug!(
            target: "mesh_split::timing",
            section = self.name,
            elapsed_us = self.start.elapsed().as_micros() as u64,
            "section complete"
        );
    }
}

/// Time a fine-grained section; the guard logs on drop.
#[must_use]
pub fn log_perf_section(name: &'static str) -> impl Drop {
    PerfGuard {
        name,
        start: Instant::now(),
    }
}

/// Create a `split_operation` span with optional extra fields.
#[macro_export]
macro_rules! split_span {
    ($name:expr) => {
        tracing::info_span!("split_operation", operation = $name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!("split_operation", operation = $name, $($field)*)
    };
}
