//! Spatial meshes that can host field data and be searched for cells.

pub mod regular;

use crate::{geometry::Point3, num::BFloat};

/// Location of a point within a specific cell of a mesh.
#[derive(Clone, Debug, PartialEq)]
pub struct CellLocation<F> {
    /// Index of the cell containing the point.
    pub cell_id: usize,
    /// Index of the sub-cell for composite cells.
    pub sub_id: usize,
    /// Parametric coordinates of the point within the (sub-)cell.
    pub pcoords: Point3<F>,
}

impl<F: BFloat> CellLocation<F> {
    /// Creates a new cell location.
    pub fn new(cell_id: usize, sub_id: usize, pcoords: Point3<F>) -> Self {
        CellLocation {
            cell_id,
            sub_id,
            pcoords,
        }
    }

    /// Creates a new cell location with coordinates converted to a
    /// different floating point type.
    pub fn converted<U: BFloat>(&self) -> CellLocation<U> {
        CellLocation::new(self.cell_id, self.sub_id, Point3::from(&self.pcoords))
    }
}

/// Defines the properties of a 3D spatial mesh supporting cell search
/// and shape function evaluation.
pub trait Mesh3<F: BFloat>: Sync + Send {
    /// Returns the number of points (nodes) in the mesh.
    fn number_of_points(&self) -> usize;

    /// Returns the number of cells in the mesh.
    fn number_of_cells(&self) -> usize;

    /// Returns the length of the diagonal of the mesh bounding box.
    fn length(&self) -> F;

    /// Returns the squared length of the diagonal of the given cell.
    fn cell_squared_length(&self, cell_id: usize) -> F;

    /// Finds the cell containing the given point, if any.
    ///
    /// Points outside the mesh by no more than the square root of
    /// `squared_tolerance` are attributed to the nearest boundary cell,
    /// to absorb floating-point misses at cell and domain boundaries.
    /// The id of a previously located cell may be passed as a hint for
    /// coherent consecutive queries. On success, the shape function
    /// weights of the point within the found cell are written to
    /// `weights`.
    fn find_cell(
        &self,
        point: &Point3<F>,
        squared_tolerance: F,
        hint: Option<usize>,
        weights: &mut Vec<F>,
    ) -> Option<CellLocation<F>>;

    /// Writes the indices of the points making up the given cell into
    /// the given buffer.
    fn cell_point_ids(&self, cell_id: usize, point_ids: &mut Vec<usize>);

    /// Computes the shape function weights for the given cell location
    /// and writes them to the given buffer.
    fn shape_weights(&self, location: &CellLocation<F>, weights: &mut Vec<F>);

    /// Computes the world-space position of the given cell location.
    fn position_in_cell(&self, location: &CellLocation<F>) -> Point3<F>;
}
