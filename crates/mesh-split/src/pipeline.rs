//! Decomposition orchestrator.
//!
//! [`Decomposer`] wires the stages together: partition the source volume,
//! normalize the geometry, optionally hollow it, then cut one part per
//! cell and dress each part with connectors and a label. Configuration
//! errors and an unusable source are fatal; everything downstream of the
//! base solid degrades per cell or per face and is reported in the result
//! instead of aborting the run.

use tracing::{info, warn};

use crate::connector::{add_connectors, ConnectorConfig};
use crate::error::{SplitError, SplitResult};
use crate::evaluator::BooleanEvaluator;
use crate::extract::extract_part;
use crate::hollow::{hollow_solid, HollowConfig};
use crate::label::{add_label, LabelConfig};
use crate::normalize::normalize_mesh;
use crate::partition::{Partition, SlicingConfig};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::tracing_ext::OperationTimer;
use crate::types::{CellIndex, Mesh, Part};
use std::time::Duration;

/// Pipeline stage a skipped item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Hollow,
    Extract,
    Connectors,
    Label,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Hollow => "hollow",
            Stage::Extract => "extract",
            Stage::Connectors => "connectors",
            Stage::Label => "label",
        };
        write!(f, "{name}")
    }
}

/// Work the pipeline dropped without failing the run.
#[derive(Debug, Clone)]
pub struct SkippedItem {
    /// Cell the item belongs to; `None` for whole-solid stages.
    pub cell: Option<CellIndex>,
    pub stage: Stage,
    pub reason: String,
}

/// Aggregate counters for one decomposition run.
#[derive(Debug, Clone, Default)]
pub struct DecomposeStats {
    pub cells_total: usize,
    pub cells_degenerate: usize,
    pub cells_empty: usize,
    pub parts_produced: usize,
    pub pegs_placed: usize,
    pub sockets_placed: usize,
    pub candidates_rejected: usize,
    pub labels_placed: usize,
}

/// Everything a decomposition run produced.
#[derive(Debug)]
pub struct DecomposeResult {
    /// Parts in cell-index order.
    pub parts: Vec<Part>,
    pub partition: Partition,
    pub skipped: Vec<SkippedItem>,
    pub stats: DecomposeStats,
}

/// Builder-style front end over the decomposition stages.
///
/// Hollowing, connectors, and labels are opt-in; slicing defaults to a
/// 200 mm grid envelope.
///
/// ```
/// use mesh_split::evaluator::{BooleanEvaluator, BooleanOp, EvaluatorError};
/// use mesh_split::pipeline::Decomposer;
/// use mesh_split::types::Mesh;
///
/// struct Passthrough;
///
/// impl BooleanEvaluator for Passthrough {
///     fn evaluate(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> Result<Mesh, EvaluatorError> {
///         Ok(match op {
///             BooleanOp::Intersection => b.clone(),
///             _ => a.clone(),
///         })
///     }
/// }
///
/// let evaluator = Passthrough;
/// let result = Decomposer::new(&evaluator).run(&mesh_split::primitives::box_mesh(
///     &mesh_split::types::Aabb::new(
///         nalgebra::Point3::origin(),
///         nalgebra::Point3::new(100.0, 100.0, 100.0),
///     ),
/// ))?;
/// assert_eq!(result.parts.len(), 1);
/// # Ok::<(), mesh_split::error::SplitError>(())
/// ```
pub struct Decomposer<'a> {
    evaluator: &'a dyn BooleanEvaluator,
    slicing: SlicingConfig,
    hollow: Option<HollowConfig>,
    connectors: Option<ConnectorConfig>,
    labels: Option<LabelConfig>,
    progress: Option<ProgressCallback>,
    progress_interval: Duration,
}

impl<'a> Decomposer<'a> {
    pub fn new(evaluator: &'a dyn BooleanEvaluator) -> Self {
        Self {
            evaluator,
            slicing: SlicingConfig::default(),
            hollow: None,
            connectors: None,
            labels: None,
            progress: None,
            progress_interval: Duration::from_millis(100),
        }
    }

    /// How the source volume is divided into cells.
    pub fn slicing(mut self, config: SlicingConfig) -> Self {
        self.slicing = config;
        self
    }

    /// Hollow the solid before cutting parts.
    pub fn hollowing(mut self, config: HollowConfig) -> Self {
        self.hollow = Some(config);
        self
    }

    /// Add pegs and sockets to mating faces.
    pub fn connectors(mut self, config: ConnectorConfig) -> Self {
        self.connectors = Some(config);
        self
    }

    /// Fuse an identification plate onto each part.
    pub fn labels(mut self, config: LabelConfig) -> Self {
        self.labels = Some(config);
        self
    }

    /// Receive progress beats; return `false` from the callback to cancel.
    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Minimum time between progress callbacks. Zero disables throttling.
    pub fn progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Decompose a source solid into printable parts.
    pub fn run(&self, source: &Mesh) -> SplitResult<DecomposeResult> {
        let _timer =
            OperationTimer::with_context("decompose", source.vertex_count(), source.face_count());

        if source.is_empty() {
            return Err(SplitError::empty_source(
                "source mesh has no vertices or no faces",
            ));
        }
        let bounds = source
            .bounds()
            .ok_or_else(|| SplitError::empty_source("source mesh has no bounds"))?;

        // Partition first: an oversized or invalid slicing request must
        // fail before any geometry is touched.
        let partition = Partition::compute(&bounds, &self.slicing)?;

        let total_units = 1 + u64::from(self.hollow.is_some()) + partition.cell_count() as u64;
        let tracker = ProgressTracker::with_interval(total_units, self.progress_interval);
        let callback = self.progress.as_ref();

        let mut skipped: Vec<SkippedItem> = Vec::new();
        let mut stats = DecomposeStats {
            cells_total: partition.cell_count(),
            ..Default::default()
        };

        if !tracker.maybe_callback(callback, "normalizing source mesh".to_string()) {
            return Err(SplitError::Cancelled);
        }
        let normalized = normalize_mesh(source);
        if normalized.mesh.is_empty() {
            return Err(SplitError::base_solid(
                "normalization left no usable geometry",
            ));
        }
        let mut base = normalized.mesh;
        tracker.increment();

        if let Some(hollow_cfg) = &self.hollow {
            if !tracker.maybe_callback(callback, "hollowing solid".to_string()) {
                return Err(SplitError::Cancelled);
            }
            let hollowed = hollow_solid(&base, hollow_cfg, self.evaluator);
            if !hollowed.hollowed {
                skipped.push(SkippedItem {
                    cell: None,
                    stage: Stage::Hollow,
                    reason: "hollowing fell back to the solid input".to_string(),
                });
            } else if hollow_cfg.drain_hole && !hollowed.drain_added {
                skipped.push(SkippedItem {
                    cell: None,
                    stage: Stage::Hollow,
                    reason: "drain hole could not be cut".to_string(),
                });
            }
            base = hollowed.mesh;
            tracker.increment();
        }

        let mut parts: Vec<Part> = Vec::new();
        for cell in &partition.cells {
            if !tracker.maybe_callback(callback, format!("processing cell {}", cell.index)) {
                return Err(SplitError::Cancelled);
            }

            if cell.is_degenerate() {
                stats.cells_degenerate += 1;
                tracker.increment();
                continue;
            }

            let mut part = match extract_part(&base, cell, self.evaluator) {
                Ok(Some(part)) => part,
                Ok(None) => {
                    stats.cells_empty += 1;
                    tracker.increment();
                    continue;
                }
                Err(err) => {
                    warn!(cell = %cell.index, error = %err, "cell extraction failed");
                    skipped.push(SkippedItem {
                        cell: Some(cell.index),
                        stage: Stage::Extract,
                        reason: err.to_string(),
                    });
                    tracker.increment();
                    continue;
                }
            };

            if let Some(connector_cfg) = &self.connectors {
                let connector_stats =
                    add_connectors(&mut part, &partition, connector_cfg, self.evaluator);
                stats.pegs_placed += connector_stats.pegs_placed;
                stats.sockets_placed += connector_stats.sockets_placed;
                stats.candidates_rejected += connector_stats.candidates_rejected;
                for reason in connector_stats.skipped_faces {
                    skipped.push(SkippedItem {
                        cell: Some(cell.index),
                        stage: Stage::Connectors,
                        reason,
                    });
                }
            }

            if let Some(label_cfg) = &self.labels {
                match add_label(&mut part, label_cfg, self.evaluator) {
                    Ok(()) => stats.labels_placed += 1,
                    Err(err) => {
                        warn!(cell = %cell.index, error = %err, "label attachment failed");
                        skipped.push(SkippedItem {
                            cell: Some(cell.index),
                            stage: Stage::Label,
                            reason: err.to_string(),
                        });
                    }
                }
            }

            stats.parts_produced += 1;
            parts.push(part);
            tracker.increment();
        }

        info!(
            parts = stats.parts_produced,
            cells = stats.cells_total,
            degenerate = stats.cells_degenerate,
            empty = stats.cells_empty,
            skipped = skipped.len(),
            "decomposition finished"
        );

        Ok(DecomposeResult {
            parts,
            partition,
            skipped,
            stats,
        })
    }
}
