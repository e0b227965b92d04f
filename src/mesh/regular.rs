//! Uniform block meshes with hexahedral cells.

use super::{CellLocation, Mesh3};
use crate::{
    geometry::{
        Dim3::{self, X, Y, Z},
        In3D, Point3, Vec3,
    },
    num::BFloat,
};

/// A uniform block mesh of axis-aligned hexahedral cells, with field
/// values attached to the cell corner points.
#[derive(Clone, Debug)]
pub struct RegularBlockMesh3<F> {
    shape: In3D<usize>,
    lower_bounds: Vec3<F>,
    upper_bounds: Vec3<F>,
    cell_extents: Vec3<F>,
}

impl<F: BFloat> RegularBlockMesh3<F> {
    /// Creates a new uniform block mesh spanning the given bounds,
    /// with the given number of cells in each dimension.
    pub fn from_bounds(shape: In3D<usize>, lower_bounds: Vec3<F>, upper_bounds: Vec3<F>) -> Self {
        for &dim in &Dim3::slice() {
            assert_ne!(
                shape[dim], 0,
                "Number of cells in {} cannot be zero.",
                dim
            );
            assert!(
                upper_bounds[dim] > lower_bounds[dim],
                "Upper bound not exceeding lower bound in {}.",
                dim
            );
        }
        let cell_extents = Vec3::with_each_component(|dim| {
            (upper_bounds[dim] - lower_bounds[dim])
                / F::from_usize(shape[dim]).expect("Conversion failed")
        });
        RegularBlockMesh3 {
            shape,
            lower_bounds,
            upper_bounds,
            cell_extents,
        }
    }

    /// Returns the number of cells in each dimension.
    pub fn shape(&self) -> &In3D<usize> {
        &self.shape
    }

    /// Returns the lower bounds of the mesh.
    pub fn lower_bounds(&self) -> &Vec3<F> {
        &self.lower_bounds
    }

    /// Returns the upper bounds of the mesh.
    pub fn upper_bounds(&self) -> &Vec3<F> {
        &self.upper_bounds
    }

    /// Returns the extent of a single cell in each dimension.
    pub fn cell_extents(&self) -> &Vec3<F> {
        &self.cell_extents
    }

    /// Returns the position of the mesh point with the given index.
    pub fn point_position(&self, point_id: usize) -> Point3<F> {
        let indices = self.point_indices(point_id);
        Point3::with_each_component(|dim| {
            self.lower_bounds[dim]
                + F::from_usize(indices[dim]).expect("Conversion failed") * self.cell_extents[dim]
        })
    }

    fn number_of_points_in(&self, dim: Dim3) -> usize {
        self.shape[dim] + 1
    }

    fn cell_id_from_indices(&self, indices: &In3D<usize>) -> usize {
        indices[X] + self.shape[X] * (indices[Y] + self.shape[Y] * indices[Z])
    }

    fn cell_indices(&self, cell_id: usize) -> In3D<usize> {
        In3D::new(
            cell_id % self.shape[X],
            (cell_id / self.shape[X]) % self.shape[Y],
            cell_id / (self.shape[X] * self.shape[Y]),
        )
    }

    fn point_id_from_indices(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.number_of_points_in(X) * (j + self.number_of_points_in(Y) * k)
    }

    fn point_indices(&self, point_id: usize) -> In3D<usize> {
        In3D::new(
            point_id % self.number_of_points_in(X),
            (point_id / self.number_of_points_in(X)) % self.number_of_points_in(Y),
            point_id / (self.number_of_points_in(X) * self.number_of_points_in(Y)),
        )
    }
}

impl<F: BFloat> Mesh3<F> for RegularBlockMesh3<F> {
    fn number_of_points(&self) -> usize {
        Dim3::slice()
            .iter()
            .map(|&dim| self.number_of_points_in(dim))
            .product()
    }

    fn number_of_cells(&self) -> usize {
        Dim3::slice().iter().map(|&dim| self.shape[dim]).product()
    }

    fn length(&self) -> F {
        (&self.upper_bounds - &self.lower_bounds).length()
    }

    fn cell_squared_length(&self, _cell_id: usize) -> F {
        // All cells share the same extent in a uniform block mesh.
        self.cell_extents.squared_length()
    }

    fn find_cell(
        &self,
        point: &Point3<F>,
        squared_tolerance: F,
        _hint: Option<usize>,
        weights: &mut Vec<F>,
    ) -> Option<CellLocation<F>> {
        // Cells are located by direct index arithmetic, so the hint
        // passed by coherent callers is not needed here.
        let mut indices = In3D::same(0);
        let mut pcoords = Point3::origin();
        let mut squared_distance_outside = F::zero();

        for &dim in &Dim3::slice() {
            let coord = point[dim];
            let lower = self.lower_bounds[dim];
            let upper = self.upper_bounds[dim];
            if coord < lower {
                let excess = lower - coord;
                squared_distance_outside = squared_distance_outside + excess * excess;
                indices[dim] = 0;
                pcoords[dim] = F::zero();
            } else if coord >= upper {
                let excess = coord - upper;
                squared_distance_outside = squared_distance_outside + excess * excess;
                indices[dim] = self.shape[dim] - 1;
                pcoords[dim] = F::one();
            } else {
                let scaled = (coord - lower) / self.cell_extents[dim];
                let index = usize::min(
                    num::cast(scaled.floor()).expect("Conversion failed"),
                    self.shape[dim] - 1,
                );
                indices[dim] = index;
                pcoords[dim] = scaled - F::from_usize(index).expect("Conversion failed");
            }
        }

        if squared_distance_outside > squared_tolerance {
            return None;
        }

        let location = CellLocation::new(self.cell_id_from_indices(&indices), 0, pcoords);
        self.shape_weights(&location, weights);
        Some(location)
    }

    fn cell_point_ids(&self, cell_id: usize, point_ids: &mut Vec<usize>) {
        let indices = self.cell_indices(cell_id);
        let (i, j, k) = (indices[X], indices[Y], indices[Z]);
        point_ids.clear();
        point_ids.extend_from_slice(&[
            self.point_id_from_indices(i, j, k),
            self.point_id_from_indices(i + 1, j, k),
            self.point_id_from_indices(i, j + 1, k),
            self.point_id_from_indices(i + 1, j + 1, k),
            self.point_id_from_indices(i, j, k + 1),
            self.point_id_from_indices(i + 1, j, k + 1),
            self.point_id_from_indices(i, j + 1, k + 1),
            self.point_id_from_indices(i + 1, j + 1, k + 1),
        ]);
    }

    fn shape_weights(&self, location: &CellLocation<F>, weights: &mut Vec<F>) {
        let (r, s, t) = (
            location.pcoords[X],
            location.pcoords[Y],
            location.pcoords[Z],
        );
        let (rm, sm, tm) = (F::one() - r, F::one() - s, F::one() - t);
        weights.clear();
        weights.extend_from_slice(&[
            rm * sm * tm,
            r * sm * tm,
            rm * s * tm,
            r * s * tm,
            rm * sm * t,
            r * sm * t,
            rm * s * t,
            r * s * t,
        ]);
    }

    fn position_in_cell(&self, location: &CellLocation<F>) -> Point3<F> {
        let indices = self.cell_indices(location.cell_id);
        Point3::with_each_component(|dim| {
            self.lower_bounds[dim]
                + (F::from_usize(indices[dim]).expect("Conversion failed")
                    + location.pcoords[dim])
                    * self.cell_extents[dim]
        })
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    fn create_mesh() -> RegularBlockMesh3<f64> {
        RegularBlockMesh3::from_bounds(
            In3D::new(4, 4, 4),
            Vec3::new(-2.0, -2.0, -2.0),
            Vec3::new(2.0, 2.0, 2.0),
        )
    }

    #[test]
    fn finding_cell_inside_works() {
        let mesh = create_mesh();
        let mut weights = Vec::new();
        let location = mesh
            .find_cell(&Point3::new(0.5, 0.5, 0.5), 0.0, None, &mut weights)
            .unwrap();
        assert_eq!(mesh.cell_indices(location.cell_id), In3D::new(2, 2, 2));
        assert_eq!(weights.len(), 8);
        assert_abs_diff_eq!(weights.iter().sum::<f64>(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn finding_cell_outside_fails() {
        let mesh = create_mesh();
        let mut weights = Vec::new();
        assert!(mesh
            .find_cell(&Point3::new(2.5, 0.0, 0.0), 0.0, None, &mut weights)
            .is_none());
    }

    #[test]
    fn tolerance_absorbs_boundary_misses() {
        let mesh = create_mesh();
        let mut weights = Vec::new();
        let squared_tolerance = 1e-6;
        let location = mesh
            .find_cell(
                &Point3::new(2.0 + 1e-4, 0.0, 0.0),
                squared_tolerance,
                None,
                &mut weights,
            )
            .unwrap();
        assert_eq!(mesh.cell_indices(location.cell_id)[Dim3::X], 3);
        assert_abs_diff_eq!(location.pcoords[Dim3::X], 1.0);
    }

    #[test]
    fn cell_position_roundtrips_through_location() {
        let mesh = create_mesh();
        let mut weights = Vec::new();
        let point = Point3::new(-1.3, 0.7, 1.9);
        let location = mesh.find_cell(&point, 0.0, None, &mut weights).unwrap();
        let reconstructed = mesh.position_in_cell(&location);
        for &dim in &Dim3::slice() {
            assert_abs_diff_eq!(reconstructed[dim], point[dim], epsilon = 1e-12);
        }
    }

    #[test]
    fn interpolation_weights_select_nearest_corner() {
        let mesh = create_mesh();
        let mut weights = Vec::new();
        let mut point_ids = Vec::new();
        let location = mesh
            .find_cell(&Point3::new(-2.0, -2.0, -2.0), 0.0, None, &mut weights)
            .unwrap();
        mesh.cell_point_ids(location.cell_id, &mut point_ids);
        assert_abs_diff_eq!(weights[0], 1.0);
        assert_eq!(point_ids[0], 0);
    }
}
