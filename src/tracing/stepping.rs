//! Stepping along streamlines of a vector field.

use super::{ftr, sampling::FieldSampler3};
use crate::{
    geometry::{Point3, Vec3},
    mesh::Mesh3,
    num::BFloat,
};

/// Stepping along the streamline in the same direction as the field or opposite.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SteppingSense {
    Same,
    Opposite,
}

impl SteppingSense {
    /// Returns the sign with which the sense scales a step length.
    pub fn signum(self) -> ftr {
        match self {
            SteppingSense::Same => 1.0,
            SteppingSense::Opposite => -1.0,
        }
    }
}

/// A stepper result which is either OK (with an arbitrary value) or
/// stopped (with a cause).
#[derive(Clone, Debug)]
pub enum StepperResult<T> {
    Ok(T),
    Stopped(StoppingCause),
}

/// Reason for terminating the integration of a streamline.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum StoppingCause {
    /// The trajectory left the mesh or the containing cell could not be found.
    LeftDomain,
    /// The field magnitude dropped to the terminal speed or below.
    BelowTerminalSpeed,
    /// The maximum propagation time was reached.
    PropagationTimeExceeded,
    /// The combined speed of two consecutive points fell below the
    /// numerical floor, or the step produced no displacement.
    Stagnation,
    /// The seed point was outside the mesh, so no integration took place.
    SeedOutsideDomain,
}

/// Defines the properties of an explicit one-step scheme for advancing
/// a position through a vector field.
pub trait Stepper3: Clone + Sync + Send {
    /// Advances the given position by one step of the given signed length.
    ///
    /// # Parameters
    ///
    /// - `sampler`: Sampler providing the field vector at intermediate positions.
    /// - `position`: Position to advance.
    /// - `velocity`: Field vector already sampled at `position`.
    /// - `step_length`: Signed step length in simulation time.
    ///
    /// # Returns
    ///
    /// A `StepperResult<Point3<ftr>>` which is either:
    ///
    /// - `Ok`: Contains the candidate next position.
    /// - `Stopped`: The scheme required a field evaluation outside the mesh.
    fn next_position<F, M>(
        &self,
        sampler: &mut FieldSampler3<'_, F, M>,
        position: &Point3<ftr>,
        velocity: &Vec3<ftr>,
        step_length: ftr,
    ) -> StepperResult<Point3<ftr>>
    where
        F: BFloat,
        M: Mesh3<F>;
}

/// A 2nd-order Runge-Kutta stepper using an explicit Euler predictor
/// and a trapezoidal corrector.
#[derive(Clone, Copy, Debug, Default)]
pub struct RungeKutta2Stepper3;

impl RungeKutta2Stepper3 {
    /// Creates a new 2nd-order Runge-Kutta stepper.
    pub fn new() -> Self {
        RungeKutta2Stepper3
    }
}

impl Stepper3 for RungeKutta2Stepper3 {
    fn next_position<F, M>(
        &self,
        sampler: &mut FieldSampler3<'_, F, M>,
        position: &Point3<ftr>,
        velocity: &Vec3<ftr>,
        step_length: ftr,
    ) -> StepperResult<Point3<ftr>>
    where
        F: BFloat,
        M: Mesh3<F>,
    {
        let predicted_position = position + velocity * step_length;
        let predicted_velocity = match sampler.sample_vector(&predicted_position) {
            Some((_, velocity)) => velocity,
            None => return StepperResult::Stopped(StoppingCause::LeftDomain),
        };
        StepperResult::Ok(position + (velocity + &predicted_velocity) * (0.5 * step_length))
    }
}
