//! Volume partitioner.
//!
//! Splits a bounding volume into printable cells, either on a regular grid
//! sized by a per-axis envelope or along manually chosen split planes. Cells
//! exist for every index triple of the grid; cells thinner than
//! [`MIN_CELL_EXTENT`] on any axis are degenerate and skipped downstream,
//! but they still occupy their index.

use nalgebra::Vector3;
use tracing::debug;

use crate::error::{SplitError, SplitResult};
use crate::types::{Aabb, CellIndex};

/// Hard ceiling on the number of cells a partition may produce.
pub const MAX_CELLS: usize = 500;

/// Cells thinner than this on any axis are degenerate.
pub const MIN_CELL_EXTENT: f64 = 0.1;

/// Regular-grid slicing: the build volume each part must fit in.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct GridSlicing {
    /// Per-axis printable envelope. Every component must be positive.
    pub envelope: Vector3<f64>,
}

impl Default for GridSlicing {
    fn default() -> Self {
        Self {
            envelope: Vector3::new(200.0, 200.0, 200.0),
        }
    }
}

/// One axis of a manual split.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AxisSplit {
    /// Whether this axis is split at all.
    pub enabled: bool,
    /// Distance of the split plane from the minimum bound of this axis.
    pub offset: f64,
}

/// Manual slicing: at most one split plane per axis.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "config", serde(default))]
pub struct ManualSlicing {
    pub x: AxisSplit,
    pub y: AxisSplit,
    pub z: AxisSplit,
}

/// How the source volume is divided into cells.
#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "config",
    derive(serde::Serialize, serde::Deserialize)
)]
#[cfg_attr(feature = "config", serde(tag = "mode", rename_all = "snake_case"))]
pub enum SlicingConfig {
    /// Regular grid sized by a printable envelope.
    Grid(GridSlicing),
    /// Explicit split planes, at most one per axis.
    Manual(ManualSlicing),
}

impl Default for SlicingConfig {
    fn default() -> Self {
        SlicingConfig::Grid(GridSlicing::default())
    }
}

/// One cell of a partition.
#[derive(Debug, Clone)]
pub struct Cell {
    pub index: CellIndex,
    pub bounds: Aabb,
}

impl Cell {
    /// A cell thinner than [`MIN_CELL_EXTENT`] on any axis produces no
    /// usable part.
    pub fn is_degenerate(&self) -> bool {
        let size = self.bounds.size();
        size.x < MIN_CELL_EXTENT || size.y < MIN_CELL_EXTENT || size.z < MIN_CELL_EXTENT
    }
}

/// A computed division of a bounding volume into cells.
///
/// `cells` holds one entry per index triple in lexicographic `(i, j, k)`
/// order, degenerate cells included.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Number of cells along each axis.
    pub steps: [usize; 3],
    /// The volume that was partitioned.
    pub bounds: Aabb,
    pub cells: Vec<Cell>,
}

impl Partition {
    /// Divide `bounds` according to `config`.
    ///
    /// The cell-count limit is enforced before any cell is built, so an
    /// oversized request fails without allocating.
    pub fn compute(bounds: &Aabb, config: &SlicingConfig) -> SplitResult<Partition> {
        let extent = bounds.size();

        let widths = match config {
            SlicingConfig::Grid(grid) => {
                let env = grid.envelope;
                if !(env.x > 0.0 && env.y > 0.0 && env.z > 0.0) {
                    return Err(SplitError::invalid_config(format!(
                        "slicing envelope must be positive on every axis, got {:.3} x {:.3} x {:.3}",
                        env.x, env.y, env.z
                    )));
                }
                [
                    grid_widths(extent.x, env.x),
                    grid_widths(extent.y, env.y),
                    grid_widths(extent.z, env.z),
                ]
            }
            SlicingConfig::Manual(manual) => [
                manual_widths(extent.x, &manual.x, "x")?,
                manual_widths(extent.y, &manual.y, "y")?,
                manual_widths(extent.z, &manual.z, "z")?,
            ],
        };

        let steps = [widths[0].len(), widths[1].len(), widths[2].len()];
        let total = steps[0]
            .saturating_mul(steps[1])
            .saturating_mul(steps[2]);
        if total > MAX_CELLS {
            return Err(SplitError::cell_limit(total, MAX_CELLS));
        }

        let edges = [
            axis_edges(bounds.min.x, &widths[0]),
            axis_edges(bounds.min.y, &widths[1]),
            axis_edges(bounds.min.z, &widths[2]),
        ];

        let mut cells = Vec::with_capacity(total);
        for i in 0..steps[0] {
            for j in 0..steps[1] {
                for k in 0..steps[2] {
                    let min = nalgebra::Point3::new(edges[0][i], edges[1][j], edges[2][k]);
                    let max =
                        nalgebra::Point3::new(edges[0][i + 1], edges[1][j + 1], edges[2][k + 1]);
                    cells.push(Cell {
                        index: CellIndex::new(i, j, k),
                        bounds: Aabb::new(min, max),
                    });
                }
            }
        }

        debug!(
            steps_x = steps[0],
            steps_y = steps[1],
            steps_z = steps[2],
            cells = total,
            "partition computed"
        );

        Ok(Partition {
            steps,
            bounds: *bounds,
            cells,
        })
    }

    /// Total number of cells, degenerate ones included.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Look up the cell at an index triple.
    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        if index.i >= self.steps[0] || index.j >= self.steps[1] || index.k >= self.steps[2] {
            return None;
        }
        let linear = (index.i * self.steps[1] + index.j) * self.steps[2] + index.k;
        self.cells.get(linear)
    }

    /// Whether the cell at `index` has a usable neighbor along `axis`
    /// (0 = X, 1 = Y, 2 = Z) in the positive or negative direction.
    ///
    /// A degenerate neighbor produces no mating part, so it does not count.
    pub fn has_neighbor(&self, index: CellIndex, axis: usize, positive: bool) -> bool {
        let mut coords = [index.i, index.j, index.k];
        if positive {
            coords[axis] += 1;
            if coords[axis] >= self.steps[axis] {
                return false;
            }
        } else {
            if coords[axis] == 0 {
                return false;
            }
            coords[axis] -= 1;
        }
        match self.cell(CellIndex::new(coords[0], coords[1], coords[2])) {
            Some(neighbor) => !neighbor.is_degenerate(),
            None => false,
        }
    }
}

/// Grid cell widths along one axis: full-envelope cells, then a remainder
/// cell holding whatever is left.
fn grid_widths(extent: f64, envelope: f64) -> Vec<f64> {
    let steps = ((extent / envelope).ceil() as usize).max(1);
    let mut widths = vec![envelope; steps - 1];
    widths.push(extent - (steps - 1) as f64 * envelope);
    widths
}

fn manual_widths(extent: f64, axis: &AxisSplit, name: &str) -> SplitResult<Vec<f64>> {
    if !axis.enabled {
        return Ok(vec![extent]);
    }
    if !axis.offset.is_finite() || axis.offset < 0.0 || axis.offset > extent {
        return Err(SplitError::invalid_config(format!(
            "manual split offset {:.3} on axis {} is outside the volume extent {:.3}",
            axis.offset, name, extent
        )));
    }
    Ok(vec![axis.offset, extent - axis.offset])
}

fn axis_edges(min: f64, widths: &[f64]) -> Vec<f64> {
    let mut edges = Vec::with_capacity(widths.len() + 1);
    let mut cursor = min;
    edges.push(cursor);
    for &w in widths {
        cursor += w;
        edges.push(cursor);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn bounds(size: f64) -> Aabb {
        Aabb::new(Point3::origin(), Point3::new(size, size, size))
    }

    #[test]
    fn test_grid_two_by_two_by_two() {
        let config = SlicingConfig::Grid(GridSlicing {
            envelope: Vector3::new(120.0, 120.0, 120.0),
        });
        let partition = Partition::compute(&bounds(200.0), &config).unwrap();

        assert_eq!(partition.steps, [2, 2, 2]);
        assert_eq!(partition.cell_count(), 8);

        // First cell spans the full envelope, the last takes the remainder.
        let first = partition.cell(CellIndex::new(0, 0, 0)).unwrap();
        let last = partition.cell(CellIndex::new(1, 1, 1)).unwrap();
        assert!((first.bounds.size().x - 120.0).abs() < 1e-9);
        assert!((last.bounds.size().x - 80.0).abs() < 1e-9);
        assert!((last.bounds.max.x - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_single_cell_when_envelope_covers() {
        let config = SlicingConfig::Grid(GridSlicing {
            envelope: Vector3::new(500.0, 500.0, 500.0),
        });
        let partition = Partition::compute(&bounds(200.0), &config).unwrap();
        assert_eq!(partition.steps, [1, 1, 1]);
        let cell = partition.cell(CellIndex::new(0, 0, 0)).unwrap();
        assert!((cell.bounds.size().x - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_grid_cell_limit() {
        // 10 steps per axis would be 1000 cells.
        let config = SlicingConfig::Grid(GridSlicing {
            envelope: Vector3::new(20.0, 20.0, 20.0),
        });
        let err = Partition::compute(&bounds(200.0), &config).unwrap_err();
        match err {
            SplitError::CellLimitExceeded { cells, limit } => {
                assert_eq!(cells, 1000);
                assert_eq!(limit, MAX_CELLS);
            }
            other => panic!("expected CellLimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn test_grid_rejects_nonpositive_envelope() {
        let config = SlicingConfig::Grid(GridSlicing {
            envelope: Vector3::new(100.0, 0.0, 100.0),
        });
        assert!(matches!(
            Partition::compute(&bounds(200.0), &config),
            Err(SplitError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_manual_split_single_axis() {
        let config = SlicingConfig::Manual(ManualSlicing {
            x: AxisSplit {
                enabled: true,
                offset: 60.0,
            },
            ..Default::default()
        });
        let partition = Partition::compute(&bounds(200.0), &config).unwrap();

        assert_eq!(partition.steps, [2, 1, 1]);
        let left = partition.cell(CellIndex::new(0, 0, 0)).unwrap();
        let right = partition.cell(CellIndex::new(1, 0, 0)).unwrap();
        assert!((left.bounds.size().x - 60.0).abs() < 1e-9);
        assert!((right.bounds.size().x - 140.0).abs() < 1e-9);
        // Untouched axes stay whole.
        assert!((left.bounds.size().y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_offset_out_of_range() {
        let config = SlicingConfig::Manual(ManualSlicing {
            y: AxisSplit {
                enabled: true,
                offset: 250.0,
            },
            ..Default::default()
        });
        assert!(matches!(
            Partition::compute(&bounds(200.0), &config),
            Err(SplitError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_manual_offset_at_boundary_is_degenerate_cell() {
        let config = SlicingConfig::Manual(ManualSlicing {
            x: AxisSplit {
                enabled: true,
                offset: 0.0,
            },
            ..Default::default()
        });
        let partition = Partition::compute(&bounds(200.0), &config).unwrap();
        assert_eq!(partition.steps, [2, 1, 1]);

        let empty = partition.cell(CellIndex::new(0, 0, 0)).unwrap();
        let full = partition.cell(CellIndex::new(1, 0, 0)).unwrap();
        assert!(empty.is_degenerate());
        assert!(!full.is_degenerate());
    }

    #[test]
    fn test_cells_in_lexicographic_order() {
        let config = SlicingConfig::Grid(GridSlicing {
            envelope: Vector3::new(120.0, 120.0, 120.0),
        });
        let partition = Partition::compute(&bounds(200.0), &config).unwrap();

        let mut sorted = partition.cells.clone();
        sorted.sort_by_key(|c| c.index);
        let order: Vec<CellIndex> = partition.cells.iter().map(|c| c.index).collect();
        let expected: Vec<CellIndex> = sorted.iter().map(|c| c.index).collect();
        assert_eq!(order, expected);
        assert_eq!(order[0], CellIndex::new(0, 0, 0));
        assert_eq!(order[1], CellIndex::new(0, 0, 1));
        assert_eq!(order[7], CellIndex::new(1, 1, 1));
    }

    #[test]
    fn test_has_neighbor_grid_interior_and_edges() {
        let config = SlicingConfig::Grid(GridSlicing {
            envelope: Vector3::new(120.0, 120.0, 120.0),
        });
        let partition = Partition::compute(&bounds(200.0), &config).unwrap();

        let origin = CellIndex::new(0, 0, 0);
        assert!(partition.has_neighbor(origin, 0, true));
        assert!(!partition.has_neighbor(origin, 0, false));

        let corner = CellIndex::new(1, 1, 1);
        assert!(!partition.has_neighbor(corner, 2, true));
        assert!(partition.has_neighbor(corner, 2, false));
    }

    #[test]
    fn test_degenerate_neighbor_does_not_count() {
        let config = SlicingConfig::Manual(ManualSlicing {
            x: AxisSplit {
                enabled: true,
                offset: 0.05,
            },
            ..Default::default()
        });
        let partition = Partition::compute(&bounds(200.0), &config).unwrap();

        let thin = partition.cell(CellIndex::new(0, 0, 0)).unwrap();
        assert!(thin.is_degenerate());
        assert!(!partition.has_neighbor(CellIndex::new(1, 0, 0), 0, false));
    }

    #[test]
    fn test_cell_lookup_out_of_range() {
        let partition =
            Partition::compute(&bounds(100.0), &SlicingConfig::default()).unwrap();
        assert!(partition.cell(CellIndex::new(0, 0, 0)).is_some());
        assert!(partition.cell(CellIndex::new(1, 0, 0)).is_none());
    }

    #[test]
    fn test_flat_bounds_produce_degenerate_cells() {
        let flat = Aabb::new(Point3::origin(), Point3::new(100.0, 0.0, 100.0));
        let partition = Partition::compute(&flat, &SlicingConfig::default()).unwrap();
        assert_eq!(partition.cell_count(), 1);
        assert!(partition.cells[0].is_degenerate());
    }
}
