//! Scalar and vector fields attached to the points of a spatial mesh.

use crate::{
    geometry::{Dim3, In3D, Vec3},
    mesh::Mesh3,
    num::BFloat,
};
use ndarray::Array1;
use std::sync::Arc;

/// A scalar field with one value per mesh point.
#[derive(Clone, Debug)]
pub struct ScalarField3<F, M> {
    name: String,
    mesh: Arc<M>,
    values: Array1<F>,
}

impl<F, M> ScalarField3<F, M>
where
    F: BFloat,
    M: Mesh3<F>,
{
    /// Creates a new scalar field from the given mesh and point values.
    pub fn new(name: String, mesh: Arc<M>, values: Array1<F>) -> Self {
        assert_eq!(
            values.len(),
            mesh.number_of_points(),
            "Number of values does not match number of mesh points."
        );
        ScalarField3 { name, mesh, values }
    }

    /// Returns the name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the mesh the field values are defined on.
    pub fn mesh(&self) -> &M {
        self.mesh.as_ref()
    }

    /// Returns a new atomic reference counted pointer to the mesh.
    pub fn arc_with_mesh(&self) -> Arc<M> {
        Arc::clone(&self.mesh)
    }

    /// Returns a reference to the array of field values.
    pub fn values(&self) -> &Array1<F> {
        &self.values
    }

    /// Computes the field value interpolated over the given mesh points
    /// with the given shape function weights.
    pub fn interpolated_value(&self, point_ids: &[usize], weights: &[F]) -> F {
        point_ids
            .iter()
            .zip(weights)
            .fold(F::zero(), |value, (&point_id, &weight)| {
                value + self.values[point_id] * weight
            })
    }
}

/// A vector field with one vector per mesh point, stored componentwise.
#[derive(Clone, Debug)]
pub struct VectorField3<F, M> {
    name: String,
    mesh: Arc<M>,
    components: In3D<Array1<F>>,
}

impl<F, M> VectorField3<F, M>
where
    F: BFloat,
    M: Mesh3<F>,
{
    /// Creates a new vector field from the given mesh and componentwise
    /// point values.
    pub fn new(name: String, mesh: Arc<M>, components: In3D<Array1<F>>) -> Self {
        for &dim in &Dim3::slice() {
            assert_eq!(
                components[dim].len(),
                mesh.number_of_points(),
                "Number of {}-component values does not match number of mesh points.",
                dim
            );
        }
        VectorField3 {
            name,
            mesh,
            components,
        }
    }

    /// Returns the name of the field.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a reference to the mesh the field vectors are defined on.
    pub fn mesh(&self) -> &M {
        self.mesh.as_ref()
    }

    /// Returns a new atomic reference counted pointer to the mesh.
    pub fn arc_with_mesh(&self) -> Arc<M> {
        Arc::clone(&self.mesh)
    }

    /// Computes the field vector interpolated over the given mesh points
    /// with the given shape function weights.
    pub fn interpolated_vector(&self, point_ids: &[usize], weights: &[F]) -> Vec3<F> {
        Vec3::with_each_component(|dim| {
            point_ids
                .iter()
                .zip(weights)
                .fold(F::zero(), |value, (&point_id, &weight)| {
                    value + self.components[dim][point_id] * weight
                })
        })
    }
}
