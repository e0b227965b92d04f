//! Sampling of mesh-based fields along trajectories.

use super::ftr;
use crate::{
    field::{ScalarField3, VectorField3},
    geometry::{Point3, Vec3},
    mesh::{CellLocation, Mesh3},
    num::BFloat,
};

/// Fraction of the mesh bounding box diagonal used as the cell search
/// tolerance, to absorb floating-point misses at cell boundaries.
const LOCATE_TOLERANCE_FRACTION: f64 = 1e-3;

/// Samples a vector field, and optionally a scalar field, defined on a
/// common mesh.
///
/// Locating the cell containing a query point uses the most recently
/// located cell as a hint, so consecutive queries along a trajectory
/// benefit from spatial coherence. The hint must be cleared between
/// independent trajectories, and a sampler must never be shared between
/// concurrent workers.
pub struct FieldSampler3<'a, F, M> {
    vector_field: &'a VectorField3<F, M>,
    scalar_field: Option<&'a ScalarField3<F, M>>,
    squared_tolerance: F,
    last_cell_id: Option<usize>,
    point_ids: Vec<usize>,
    weights: Vec<F>,
    cache_hits: u64,
    cache_misses: u64,
}

impl<'a, F, M> FieldSampler3<'a, F, M>
where
    F: BFloat,
    M: Mesh3<F>,
{
    /// Creates a new sampler for the given vector field and optional
    /// scalar field.
    pub fn new(
        vector_field: &'a VectorField3<F, M>,
        scalar_field: Option<&'a ScalarField3<F, M>>,
    ) -> Self {
        if let Some(scalar_field) = scalar_field {
            assert_eq!(
                scalar_field.mesh().number_of_points(),
                vector_field.mesh().number_of_points(),
                "Scalar and vector fields are not defined on the same mesh."
            );
        }
        let tolerance = vector_field.mesh().length()
            * F::from_f64(LOCATE_TOLERANCE_FRACTION).expect("Conversion failed");
        FieldSampler3 {
            vector_field,
            scalar_field,
            squared_tolerance: tolerance * tolerance,
            last_cell_id: None,
            point_ids: Vec::new(),
            weights: Vec::new(),
            cache_hits: 0,
            cache_misses: 0,
        }
    }

    /// Returns a reference to the mesh the sampled fields are defined on.
    pub fn mesh(&self) -> &M {
        self.vector_field.mesh()
    }

    /// Samples the vector field at the given position.
    ///
    /// Returns the location of the cell containing the position together
    /// with the interpolated field vector, or `None` if the position is
    /// outside the mesh.
    pub fn sample_vector(&mut self, position: &Point3<ftr>) -> Option<(CellLocation<ftr>, Vec3<ftr>)> {
        let location = self.locate(position)?;
        let vector = self
            .vector_field
            .interpolated_vector(&self.point_ids, &self.weights);
        Some((location, Vec3::from(&vector)))
    }

    /// Computes the interpolated scalar value at the most recently
    /// located position.
    ///
    /// Returns zero if no scalar field is bound; this is a no-op rather
    /// than an error.
    pub fn scalar_at_last_location(&self) -> ftr {
        match self.scalar_field {
            Some(scalar_field) => num::cast(
                scalar_field.interpolated_value(&self.point_ids, &self.weights),
            )
            .expect("Conversion failed"),
            None => 0.0,
        }
    }

    /// Samples the vector field, and scalar field if bound, at a known
    /// cell location, without performing a spatial search.
    pub fn sample_at_location(&mut self, location: &CellLocation<ftr>) -> (Vec3<ftr>, ftr) {
        let mesh = self.vector_field.mesh();
        let location = location.converted();
        mesh.shape_weights(&location, &mut self.weights);
        mesh.cell_point_ids(location.cell_id, &mut self.point_ids);
        self.last_cell_id = Some(location.cell_id);
        let vector = self
            .vector_field
            .interpolated_vector(&self.point_ids, &self.weights);
        (Vec3::from(&vector), self.scalar_at_last_location())
    }

    /// Clears the last-cell hint.
    ///
    /// Must be called before the sampler is reused for an unrelated
    /// trajectory.
    pub fn clear_cell_hint(&mut self) {
        self.last_cell_id = None;
    }

    /// Returns the number of cell searches resolved by the last-cell hint.
    pub fn cache_hits(&self) -> u64 {
        self.cache_hits
    }

    /// Returns the number of cell searches not resolved by the last-cell hint.
    pub fn cache_misses(&self) -> u64 {
        self.cache_misses
    }

    fn locate(&mut self, position: &Point3<ftr>) -> Option<CellLocation<ftr>> {
        let found = self.vector_field.mesh().find_cell(
            &Point3::from(position),
            self.squared_tolerance,
            self.last_cell_id,
            &mut self.weights,
        );
        match found {
            Some(location) => {
                if self.last_cell_id == Some(location.cell_id) {
                    self.cache_hits += 1;
                } else {
                    self.cache_misses += 1;
                    self.vector_field
                        .mesh()
                        .cell_point_ids(location.cell_id, &mut self.point_ids);
                }
                self.last_cell_id = Some(location.cell_id);
                Some(location.converted())
            }
            None => {
                self.last_cell_id = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        geometry::{Dim3, In3D},
        mesh::regular::RegularBlockMesh3,
    };
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;
    use std::sync::Arc;

    fn create_uniform_field() -> VectorField3<f64, RegularBlockMesh3<f64>> {
        let mesh = Arc::new(RegularBlockMesh3::from_bounds(
            In3D::new(4, 4, 4),
            Vec3::new(-2.0, -2.0, -2.0),
            Vec3::new(2.0, 2.0, 2.0),
        ));
        let n_points = mesh.number_of_points();
        VectorField3::new(
            "velocity".to_string(),
            mesh,
            In3D::new(
                Array1::ones(n_points),
                Array1::zeros(n_points),
                Array1::zeros(n_points),
            ),
        )
    }

    #[test]
    fn sampling_uniform_field_gives_uniform_vector() {
        let field = create_uniform_field();
        let mut sampler = FieldSampler3::new(&field, None);
        let (location, vector) = sampler.sample_vector(&Point3::new(0.3, -0.4, 1.2)).unwrap();
        assert!(location.cell_id < field.mesh().number_of_cells());
        assert_abs_diff_eq!(vector[Dim3::X], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(vector[Dim3::Y], 0.0);
        assert_abs_diff_eq!(vector[Dim3::Z], 0.0);
    }

    #[test]
    fn sampling_outside_mesh_fails() {
        let field = create_uniform_field();
        let mut sampler = FieldSampler3::new(&field, None);
        assert!(sampler.sample_vector(&Point3::new(10.0, 0.0, 0.0)).is_none());
    }

    #[test]
    fn missing_scalar_field_samples_as_zero() {
        let field = create_uniform_field();
        let mut sampler = FieldSampler3::new(&field, None);
        sampler.sample_vector(&Point3::new(0.0, 0.0, 0.0)).unwrap();
        assert_abs_diff_eq!(sampler.scalar_at_last_location(), 0.0);
    }

    #[test]
    fn coherent_queries_hit_the_cell_cache() {
        let field = create_uniform_field();
        let mut sampler = FieldSampler3::new(&field, None);
        sampler.sample_vector(&Point3::new(0.1, 0.1, 0.1)).unwrap();
        sampler.sample_vector(&Point3::new(0.2, 0.1, 0.1)).unwrap();
        assert_eq!(sampler.cache_hits(), 1);
        assert_eq!(sampler.cache_misses(), 1);
    }
}
