//! Part decomposition for 3D printing.
//!
//! This crate splits a solid that is too large for a printer bed into
//! printable parts, and synthesizes the features that make the parts
//! assemble back into the original: alignment pegs and sockets on mating
//! faces, and identification plates on part bottoms. It is the engine of a
//! print-preparation pipeline; mesh file I/O and preview live outside.
//!
//! # Features
//!
//! - **Normalization**: weld duplicate vertices, drop collapsed faces,
//!   recompute vertex normals
//! - **Partitioning**: regular grid sized by a printer envelope, or manual
//!   split planes per axis
//! - **Hollowing**: shell a solid to a wall thickness, optionally with a
//!   drain hole
//! - **Part extraction**: cut one part per grid cell out of the base solid
//! - **Connectors**: pegs and tolerance-fitted sockets on mating faces
//! - **Labels**: base plates identifying each part
//!
//! All boolean geometry goes through the [`BooleanEvaluator`] trait, so any
//! CSG backend can drive the engine. The companion `mesh-boolean` crate
//! ships a native implementation.
//!
//! # Units and Scale
//!
//! **This library assumes millimeter (mm) units.**
//!
//! - Default grid envelope is 200 mm per axis
//! - Default vertex welding tolerance is 1e-4 (0.1 micron)
//! - Default peg diameter is 5 mm with 0.2 mm radial socket tolerance
//! - Cells thinner than 0.1 mm are treated as degenerate
//!
//! # Coordinate System
//!
//! Right-handed, **Y up**: gravity points along -Y and a part's "bottom"
//! is its minimum Y. Drain holes are drilled along Y and label plates sit
//! flush with minimum Y. Face winding is **counter-clockwise viewed from
//! outside**, so normals point outward by the right-hand rule.
//!
//! # Quick Start
//!
//! ```
//! use mesh_split::evaluator::{BooleanEvaluator, BooleanOp, EvaluatorError};
//! use mesh_split::{Aabb, Decomposer, GridSlicing, Mesh, SlicingConfig};
//! use nalgebra::{Point3, Vector3};
//!
//! // Any CSG backend can drive the engine. This one hands back the
//! // cutter box, which is enough to see the part layout.
//! struct BoxClip;
//!
//! impl BooleanEvaluator for BoxClip {
//!     fn evaluate(&self, a: &Mesh, b: &Mesh, op: BooleanOp) -> Result<Mesh, EvaluatorError> {
//!         Ok(match op {
//!             BooleanOp::Intersection => b.clone(),
//!             _ => a.clone(),
//!         })
//!     }
//! }
//!
//! // A 200 mm cube split for a 120 mm envelope: 2 x 2 x 2 parts.
//! let solid = mesh_split::primitives::box_mesh(&Aabb::new(
//!     Point3::origin(),
//!     Point3::new(200.0, 200.0, 200.0),
//! ));
//!
//! let evaluator = BoxClip;
//! let result = Decomposer::new(&evaluator)
//!     .slicing(SlicingConfig::Grid(GridSlicing {
//!         envelope: Vector3::new(120.0, 120.0, 120.0),
//!     }))
//!     .run(&solid)?;
//!
//! assert_eq!(result.parts.len(), 8);
//! assert_eq!(result.parts[0].name, "part_0_0_0");
//! # Ok::<(), mesh_split::SplitError>(())
//! ```
//!
//! # Failure Model
//!
//! Only four things abort a run: an empty source mesh, a normalization
//! that leaves no geometry, a slicing request past the cell limit, and an
//! invalid slicing configuration. Everything downstream degrades per cell
//! or per face; dropped work is reported in
//! [`DecomposeResult::skipped`](pipeline::DecomposeResult::skipped).

pub mod connector;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod hollow;
pub mod label;
pub mod normalize;
pub mod partition;
pub mod pipeline;
pub mod primitives;
pub mod probe;
pub mod progress;
pub mod tracing_ext;
pub mod types;

// Serializable configuration (feature-gated)
#[cfg(feature = "config")]
pub mod config;

#[cfg(feature = "config")]
pub use config::{ConfigError, DecomposeConfig};

// Re-export core types at crate root
pub use error::{ErrorCode, RecoverySuggestion, SplitError, SplitResult};
pub use types::{Aabb, CellIndex, Mesh, Part, Triangle, Vertex};

// Re-export the evaluator seam
pub use evaluator::{BooleanEvaluator, BooleanOp, EvaluatorError};

// Re-export the pipeline front end and its stages
pub use connector::{add_connectors, ConnectorConfig, ConnectorStats};
pub use extract::extract_part;
pub use hollow::{hollow_solid, HollowConfig, HollowResult};
pub use label::{add_label, LabelConfig};
pub use normalize::{
    compute_vertex_normals, normalize_mesh, weld_vertices, NormalizeResult, WELD_EPSILON,
};
pub use partition::{
    AxisSplit, Cell, GridSlicing, ManualSlicing, Partition, SlicingConfig, MAX_CELLS,
    MIN_CELL_EXTENT,
};
pub use pipeline::{Decomposer, DecomposeResult, DecomposeStats, SkippedItem, Stage};

// Re-export supporting infrastructure
pub use primitives::{box_mesh, cylinder_mesh};
pub use probe::{ProbeHit, SurfaceProbe};
pub use progress::{
    shared_tracker, Progress, ProgressCallback, ProgressTracker, SharedProgressTracker,
};
