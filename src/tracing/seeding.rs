//! Generation of seed points for streamline tracing.

use super::ftr;
use crate::geometry::{
    Dim3::{X, Y, Z},
    In3D, Point3, Vec3,
};
use rand::distributions::{Distribution, Uniform};
use std::vec;

/// Defines the properties of a 3D seed point generator.
pub trait Seeder3: IntoIterator<Item = Point3<ftr>> {
    /// Returns the number of seed points that will be produced by the seeder.
    fn number_of_points(&self) -> usize;
}

// Let a vector of points work as a seeder.
impl Seeder3 for Vec<Point3<ftr>> {
    fn number_of_points(&self) -> usize {
        self.len()
    }
}

/// Generator for seed points distributed in a volume.
#[derive(Clone, Debug)]
pub struct VolumeSeeder3 {
    seed_points: Vec<Point3<ftr>>,
}

impl VolumeSeeder3 {
    /// Creates a new seeder producing regularly spaced seed points in a box.
    ///
    /// # Parameters
    ///
    /// - `lower_bounds`: Lower bounds of the box to place seed points in.
    /// - `upper_bounds`: Upper bounds of the box to place seed points in.
    /// - `shape`: Number of seed points to generate in each dimension.
    pub fn regular(
        lower_bounds: &Vec3<ftr>,
        upper_bounds: &Vec3<ftr>,
        shape: &In3D<usize>,
    ) -> Self {
        assert!(
            shape[X] > 0 && shape[Y] > 0 && shape[Z] > 0,
            "Number of seed points must be larger than zero in each dimension."
        );
        let extents = upper_bounds - lower_bounds;
        let mut seed_points = Vec::with_capacity(shape[X] * shape[Y] * shape[Z]);
        for k in 0..shape[Z] {
            for j in 0..shape[Y] {
                for i in 0..shape[X] {
                    let center = |index: usize, dim| {
                        lower_bounds[dim]
                            + (index as ftr + 0.5) * extents[dim] / (shape[dim] as ftr)
                    };
                    seed_points.push(Point3::new(center(i, X), center(j, Y), center(k, Z)));
                }
            }
        }
        VolumeSeeder3 { seed_points }
    }

    /// Creates a new seeder producing uniformly random seed points in a box.
    ///
    /// # Parameters
    ///
    /// - `lower_bounds`: Lower bounds of the box to place seed points in.
    /// - `upper_bounds`: Upper bounds of the box to place seed points in.
    /// - `n_seeds`: Number of seed points to generate.
    pub fn random(lower_bounds: &Vec3<ftr>, upper_bounds: &Vec3<ftr>, n_seeds: usize) -> Self {
        assert_ne!(n_seeds, 0, "Number of seed points must be larger than zero.");
        let mut rng = rand::thread_rng();
        let distributions = In3D::with_each_component(|dim| {
            Uniform::new_inclusive(lower_bounds[dim], upper_bounds[dim])
        });
        let seed_points = (0..n_seeds)
            .map(|_| {
                let x = distributions[X].sample(&mut rng);
                let y = distributions[Y].sample(&mut rng);
                let z = distributions[Z].sample(&mut rng);
                Point3::new(x, y, z)
            })
            .collect();
        VolumeSeeder3 { seed_points }
    }

    /// Returns a slice with the seed points.
    pub fn points(&self) -> &[Point3<ftr>] {
        &self.seed_points
    }
}

impl IntoIterator for VolumeSeeder3 {
    type Item = Point3<ftr>;
    type IntoIter = vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.seed_points.into_iter()
    }
}

impl Seeder3 for VolumeSeeder3 {
    fn number_of_points(&self) -> usize {
        self.seed_points.len()
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn regular_seeder_produces_points_inside_bounds() {
        let lower_bounds = Vec3::new(-1.0, 0.0, 2.0);
        let upper_bounds = Vec3::new(1.0, 3.0, 4.0);
        let seeder = VolumeSeeder3::regular(&lower_bounds, &upper_bounds, &In3D::new(3, 2, 2));
        assert_eq!(seeder.number_of_points(), 12);
        for point in seeder {
            for &dim in &crate::geometry::Dim3::slice() {
                assert!(point[dim] > lower_bounds[dim] && point[dim] < upper_bounds[dim]);
            }
        }
    }

    #[test]
    fn random_seeder_produces_requested_number_of_points() {
        let seeder = VolumeSeeder3::random(
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::new(1.0, 1.0, 1.0),
            17,
        );
        assert_eq!(seeder.number_of_points(), 17);
    }
}
