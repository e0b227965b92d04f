//! Analytic sources for generating field data on uniform meshes.

use crate::{
    field::ScalarField3,
    geometry::{
        Dim3::{self, X, Y, Z},
        In3D, Point3, Vec3,
    },
    mesh::{regular::RegularBlockMesh3, Mesh3},
    num::BFloat,
};
use ndarray::Array1;
use std::sync::Arc;

/// Whether the pulse varies in two or three dimensions.
///
/// A two-dimensional pulse is constant along the z-axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PulseDimension {
    Two,
    Three,
}

/// Generator for a Gaussian scalar pulse sampled on a uniform block mesh.
///
/// The mesh spacing is the root spacing divided by the refinement ratio
/// once per level beyond the first, so increasing the number of levels
/// refines the sampling of the same domain.
#[derive(Clone, Debug)]
pub struct GaussianPulseSource3<F> {
    /// Lower bounds of the domain to mesh.
    pub lower_bounds: Vec3<F>,
    /// Upper bounds of the domain to mesh.
    pub upper_bounds: Vec3<F>,
    /// Mesh spacing at the coarsest level.
    pub root_spacing: F,
    /// Factor to divide the spacing by for each level of refinement.
    pub refinement_ratio: usize,
    /// Number of refinement levels (one means root spacing).
    pub number_of_levels: u32,
    /// Number of dimensions the pulse varies in.
    pub dimension: PulseDimension,
    /// Center of the pulse.
    pub pulse_origin: Point3<F>,
    /// Gaussian width of the pulse in each dimension.
    pub pulse_width: Vec3<F>,
    /// Peak value of the pulse.
    pub pulse_amplitude: F,
}

impl<F: BFloat> GaussianPulseSource3<F> {
    const DEFAULT_ROOT_SPACING: f64 = 0.25;
    const DEFAULT_REFINEMENT_RATIO: usize = 2;
    const DEFAULT_NUMBER_OF_LEVELS: u32 = 1;
    const DEFAULT_PULSE_WIDTH: f64 = 0.5;
    const DEFAULT_PULSE_AMPLITUDE: f64 = 1e-4;

    /// Creates a new pulse source for the given domain, with the pulse
    /// centered at the domain center and all other parameters at their
    /// default values.
    pub fn new(lower_bounds: Vec3<F>, upper_bounds: Vec3<F>) -> Self {
        let half = F::from_f64(0.5).expect("Conversion failed");
        let pulse_origin = ((&lower_bounds + &upper_bounds) * half).to_point3();
        GaussianPulseSource3 {
            lower_bounds,
            upper_bounds,
            root_spacing: F::from_f64(Self::DEFAULT_ROOT_SPACING).expect("Conversion failed"),
            refinement_ratio: Self::DEFAULT_REFINEMENT_RATIO,
            number_of_levels: Self::DEFAULT_NUMBER_OF_LEVELS,
            dimension: PulseDimension::Three,
            pulse_origin,
            pulse_width: Vec3::same(
                F::from_f64(Self::DEFAULT_PULSE_WIDTH).expect("Conversion failed"),
            ),
            pulse_amplitude: F::from_f64(Self::DEFAULT_PULSE_AMPLITUDE)
                .expect("Conversion failed"),
        }
    }

    /// Panics if any of the source parameters are invalid.
    pub fn validate(&self) {
        for &dim in &Dim3::slice() {
            assert!(
                self.upper_bounds[dim] > self.lower_bounds[dim],
                "Upper bounds must be larger than lower bounds."
            );
            assert!(
                self.pulse_width[dim] > F::zero(),
                "Pulse width must be larger than zero."
            );
        }
        assert!(
            self.root_spacing > F::zero(),
            "Root spacing must be larger than zero."
        );
        assert!(
            self.refinement_ratio > 1,
            "Refinement ratio must be larger than one."
        );
        assert_ne!(
            self.number_of_levels, 0,
            "Number of levels must be larger than zero."
        );
    }

    /// Computes the pulse value at the given position.
    pub fn pulse_at(&self, position: &Point3<F>) -> F {
        let dims: &[Dim3] = match self.dimension {
            PulseDimension::Two => &[X, Y],
            PulseDimension::Three => &[X, Y, Z],
        };
        let mut r = F::zero();
        for &dim in dims {
            let offset = position[dim] - self.pulse_origin[dim];
            r = r + (offset * offset) / (self.pulse_width[dim] * self.pulse_width[dim]);
        }
        self.pulse_amplitude * (-r).exp()
    }

    /// Generates the mesh at the finest refinement level.
    pub fn generate_mesh(&self) -> RegularBlockMesh3<F> {
        self.validate();
        let spacing = self.root_spacing
            / F::from_usize(self.refinement_ratio.pow(self.number_of_levels - 1))
                .expect("Conversion failed");
        let shape = In3D::with_each_component(|dim| {
            let extent = self.upper_bounds[dim] - self.lower_bounds[dim];
            let n_cells: usize = num::cast((extent / spacing).round()).expect("Conversion failed");
            n_cells.max(1)
        });
        RegularBlockMesh3::from_bounds(shape, self.lower_bounds.clone(), self.upper_bounds.clone())
    }

    /// Generates the pulse field, sampled at the points of the mesh at
    /// the finest refinement level.
    pub fn generate(&self) -> ScalarField3<F, RegularBlockMesh3<F>> {
        let mesh = Arc::new(self.generate_mesh());
        let values = Array1::from_iter(
            (0..mesh.number_of_points()).map(|point_id| self.pulse_at(&mesh.point_position(point_id))),
        );
        ScalarField3::new("pulse".to_string(), mesh, values)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::mesh::Mesh3;
    use approx::assert_abs_diff_eq;

    fn create_source() -> GaussianPulseSource3<f64> {
        let mut source =
            GaussianPulseSource3::new(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(2.0, 2.0, 2.0));
        source.pulse_amplitude = 3.0;
        source
    }

    #[test]
    fn pulse_peaks_at_the_origin_with_the_amplitude() {
        let source = create_source();
        assert_abs_diff_eq!(source.pulse_at(&Point3::origin()), 3.0);
        assert!(source.pulse_at(&Point3::new(1.0, 0.0, 0.0)) < 3.0);
    }

    #[test]
    fn two_dimensional_pulse_is_constant_along_z() {
        let mut source = create_source();
        source.dimension = PulseDimension::Two;
        let value_at_z0 = source.pulse_at(&Point3::new(0.3, -0.2, 0.0));
        let value_at_z1 = source.pulse_at(&Point3::new(0.3, -0.2, 1.5));
        assert_abs_diff_eq!(value_at_z0, value_at_z1);
    }

    #[test]
    fn generated_mesh_spans_the_domain_at_the_refined_spacing() {
        let mut source = create_source();
        source.root_spacing = 1.0;
        source.number_of_levels = 2;
        let mesh = source.generate_mesh();
        assert_eq!(mesh.shape(), &In3D::same(8));
        for &dim in &Dim3::slice() {
            assert_abs_diff_eq!(mesh.lower_bounds()[dim], source.lower_bounds[dim]);
            assert_abs_diff_eq!(mesh.upper_bounds()[dim], source.upper_bounds[dim]);
            assert_abs_diff_eq!(mesh.cell_extents()[dim], 0.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn refinement_divides_the_spacing() {
        let mut source = create_source();
        source.root_spacing = 1.0;
        let coarse_cells = source.generate_mesh().number_of_cells();
        source.number_of_levels = 2;
        let fine_cells = source.generate_mesh().number_of_cells();
        assert_eq!(fine_cells, 8 * coarse_cells);
    }

    #[test]
    fn generated_field_matches_the_analytic_pulse() {
        let source = create_source();
        let field = source.generate();
        let mesh = field.mesh();
        for point_id in [0, 17, mesh.number_of_points() - 1] {
            let position = mesh.point_position(point_id);
            assert_abs_diff_eq!(
                field.values()[point_id],
                source.pulse_at(&position),
                epsilon = 1e-12
            );
        }
    }
}
