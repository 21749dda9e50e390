//! Approximate boolean operations for triangle meshes.
//!
//! This crate is the built-in CSG backend for the `mesh-split`
//! decomposition engine. The kernel combines operands by classifying
//! whole input faces as inside or outside the other mesh, which trades
//! exactness near the intersection curve for robustness on imperfect
//! input. [`NativeEvaluator`] adapts the kernel to the engine's
//! [`BooleanEvaluator`] seam, so a decomposition run can use it without
//! further glue.
//!
//! # Quick Start
//!
//! ```
//! use mesh_boolean::{boolean_operation, BooleanOp, BooleanParams};
//! use mesh_split::primitives::box_mesh;
//! use mesh_split::types::Aabb;
//! use nalgebra::Point3;
//!
//! # fn main() -> Result<(), mesh_boolean::BooleanError> {
//! let a = box_mesh(&Aabb::new(
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(10.0, 10.0, 10.0),
//! ));
//! let b = box_mesh(&Aabb::new(
//!     Point3::new(5.0, 5.0, 5.0),
//!     Point3::new(15.0, 15.0, 15.0),
//! ));
//!
//! let result = boolean_operation(&a, &b, BooleanOp::Union, &BooleanParams::default())?;
//! assert!(!result.mesh.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Accuracy
//!
//! Output faces are whole input faces; nothing is split along the
//! intersection curve. Finely tessellated operands therefore give results
//! close to the exact solid, while coarse operands keep slivers of the
//! other mesh near the intersection. Bounding boxes, containment, and
//! volumes away from the intersection are reliable either way, which is
//! what part decomposition needs from its cuts.

pub mod boolean;
pub mod error;
pub mod evaluator;

pub use boolean::{
    boolean_operation, BooleanParams, BooleanResult, BooleanStats, CoplanarStrategy,
};
pub use error::BooleanError;
pub use evaluator::NativeEvaluator;

// Seam types, re-exported so simple callers need only this crate.
pub use mesh_split::evaluator::{BooleanEvaluator, BooleanOp};
