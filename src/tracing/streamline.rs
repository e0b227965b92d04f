//! Streamline sets traced through vector fields on spatial meshes.

use super::{
    ftr,
    parallel::{self, WorkerStats},
    sampling::FieldSampler3,
    seeding::Seeder3,
    stepping::{Stepper3, StepperResult, SteppingSense, StoppingCause},
    Verbose,
};
use crate::{
    field::{ScalarField3, VectorField3},
    geometry::{Point3, Vec3},
    mesh::{CellLocation, Mesh3},
    num::BFloat,
};

/// Numerical floor on the sum of two consecutive point speeds, below
/// which the trajectory is treated as stagnant.
const SPEED_EPSILON: ftr = 1e-12;

/// A single recorded sample along a streamline.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamPoint {
    /// World-space position of the sample.
    pub position: Point3<ftr>,
    /// Field vector sampled at the position.
    pub velocity: Vec3<ftr>,
    /// Location of the cell containing the position, or `None` if the
    /// position is outside the mesh.
    pub cell: Option<CellLocation<ftr>>,
    /// Interpolated scalar field value (zero if no scalar field is bound).
    pub scalar: ftr,
    /// Euclidean norm of the velocity.
    pub speed: ftr,
    /// Cumulative distance from the seed point.
    pub arc_length: ftr,
    /// Cumulative integration time from the seed point, estimated from
    /// the average of consecutive endpoint speeds.
    pub sim_time: ftr,
}

impl StreamPoint {
    fn at_position(position: Point3<ftr>) -> Self {
        StreamPoint {
            position,
            velocity: Vec3::zero(),
            cell: None,
            scalar: 0.0,
            speed: 0.0,
            arc_length: 0.0,
            sim_time: 0.0,
        }
    }
}

/// A growable sequence of stream points for one seed and one direction.
#[derive(Clone, Debug)]
pub struct StreamLine3 {
    points: Vec<StreamPoint>,
    sense: SteppingSense,
    stopping_cause: Option<StoppingCause>,
}

impl StreamLine3 {
    /// Number of points to reserve space for up front.
    const INITIAL_POINT_CAPACITY: usize = 1000;

    fn new(sense: SteppingSense) -> Self {
        StreamLine3 {
            points: Vec::with_capacity(Self::INITIAL_POINT_CAPACITY),
            sense,
            stopping_cause: None,
        }
    }

    /// Returns the sense in which the streamline is traced relative to
    /// the field direction.
    pub fn sense(&self) -> SteppingSense {
        self.sense
    }

    /// Returns a slice with the recorded points of the streamline.
    pub fn points(&self) -> &[StreamPoint] {
        &self.points
    }

    /// Returns the number of recorded points.
    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    /// Returns a reference to the last recorded point, if any.
    pub fn last_point(&self) -> Option<&StreamPoint> {
        self.points.last()
    }

    /// Returns the cause for which integration of the streamline stopped.
    pub fn stopping_cause(&self) -> Option<StoppingCause> {
        self.stopping_cause
    }

    fn add_point(&mut self, point: StreamPoint) {
        self.points.push(point);
    }
}

/// Direction(s) to integrate streamlines in, relative to the field direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntegrationDirection {
    Forward,
    Backward,
    Both,
}

/// Specification of the seed points to start streamlines from.
#[derive(Clone, Debug)]
pub enum SeedSpec3 {
    /// A single seed at the given world-space position, whose containing
    /// cell is found by spatial search at run time.
    Position(Point3<ftr>),
    /// A single seed given directly as a cell location, requiring no
    /// spatial search.
    Location(CellLocation<ftr>),
    /// One seed per point of the given collection.
    Points(Vec<Point3<ftr>>),
}

impl SeedSpec3 {
    /// Creates a seed specification with one seed per point produced by
    /// the given seeder.
    pub fn from_seeder<S: Seeder3>(seeder: S) -> Self {
        SeedSpec3::Points(seeder.into_iter().collect())
    }

    fn number_of_seeds(&self) -> usize {
        match self {
            SeedSpec3::Position(_) | SeedSpec3::Location(_) => 1,
            SeedSpec3::Points(points) => points.len(),
        }
    }
}

/// Configuration parameters for streamline tracing.
#[derive(Clone, Debug)]
pub struct StreamlineTracerConfig {
    /// Direction(s) to trace streamlines in relative to the field direction.
    pub direction: IntegrationDirection,
    /// Streamlines reaching integration times larger than this will be terminated.
    pub max_propagation_time: ftr,
    /// Fraction of the local cell size to cover in each step.
    pub step_length_fraction: ftr,
    /// Streamlines reaching field magnitudes at or below this will be terminated.
    pub terminal_speed: ftr,
    /// Integration time interval between recorded output points.
    pub save_point_interval: ftr,
    /// Whether to overwrite the scalar value of every recorded point
    /// with its speed after tracing.
    pub use_speed_scalars: bool,
    /// Whether to derive vorticity along the streamlines after tracing.
    pub compute_vorticity: bool,
    /// Number of workers to partition the streamlines across.
    pub number_of_workers: usize,
}

impl StreamlineTracerConfig {
    const DEFAULT_DIRECTION: IntegrationDirection = IntegrationDirection::Forward;
    const DEFAULT_MAX_PROPAGATION_TIME: ftr = 100.0;
    const DEFAULT_STEP_LENGTH_FRACTION: ftr = 0.2;
    const DEFAULT_TERMINAL_SPEED: ftr = 0.0;
    const DEFAULT_SAVE_POINT_INTERVAL: ftr = 1e-5;

    /// Panics if any of the configuration parameters are invalid.
    pub fn validate(&self) {
        assert!(
            self.max_propagation_time > 0.0,
            "Maximum propagation time must be larger than zero."
        );
        assert!(
            self.step_length_fraction > 0.0,
            "Step length fraction must be larger than zero."
        );
        assert!(
            self.terminal_speed >= 0.0,
            "Terminal speed must be non-negative."
        );
        assert!(
            self.save_point_interval > 0.0,
            "Save point interval must be larger than zero."
        );
        assert_ne!(
            self.number_of_workers, 0,
            "Number of workers must be larger than zero."
        );
    }
}

impl Default for StreamlineTracerConfig {
    fn default() -> Self {
        StreamlineTracerConfig {
            direction: Self::DEFAULT_DIRECTION,
            max_propagation_time: Self::DEFAULT_MAX_PROPAGATION_TIME,
            step_length_fraction: Self::DEFAULT_STEP_LENGTH_FRACTION,
            terminal_speed: Self::DEFAULT_TERMINAL_SPEED,
            save_point_interval: Self::DEFAULT_SAVE_POINT_INTERVAL,
            use_speed_scalars: false,
            compute_vorticity: false,
            number_of_workers: rayon::current_num_threads(),
        }
    }
}

/// Aggregated counters for one tracing run.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingStats {
    /// Number of streamlines that were integrated (excluding those with
    /// seeds outside the mesh).
    pub streamlines_integrated: usize,
    /// Number of points recorded during integration (excluding seed points).
    pub points_saved: usize,
    /// Number of cell searches resolved by a last-cell hint.
    pub cache_hits: u64,
    /// Number of cell searches not resolved by a last-cell hint.
    pub cache_misses: u64,
}

impl TracingStats {
    fn from_worker_stats(worker_stats: &[WorkerStats]) -> Self {
        let mut stats = TracingStats::default();
        for worker in worker_stats {
            stats.streamlines_integrated += worker.streamlines_integrated;
            stats.points_saved += worker.points_saved;
            stats.cache_hits += worker.cache_hits;
            stats.cache_misses += worker.cache_misses;
        }
        stats
    }
}

/// A set of streamlines traced from a common seed specification.
#[derive(Clone, Debug)]
pub struct StreamlineSet3 {
    streamlines: Vec<StreamLine3>,
    stats: TracingStats,
}

impl StreamlineSet3 {
    /// Traces a new set of streamlines through the given vector field.
    ///
    /// # Parameters
    ///
    /// - `seeds`: Specification of the seed points to start from.
    /// - `vector_field`: Vector field to trace streamlines of.
    /// - `scalar_field`: Optional scalar field to interpolate along the streamlines.
    /// - `stepper`: Stepper to use (cloned into each worker).
    /// - `config`: Configuration parameters for the tracing run.
    /// - `verbose`: Whether to print status messages.
    ///
    /// # Type parameters
    ///
    /// - `F`: Floating point type of the field data.
    /// - `M`: Type of mesh.
    /// - `S`: Type of stepper.
    pub fn trace<F, M, S>(
        seeds: &SeedSpec3,
        vector_field: &VectorField3<F, M>,
        scalar_field: Option<&ScalarField3<F, M>>,
        stepper: &S,
        config: &StreamlineTracerConfig,
        verbose: Verbose,
    ) -> Self
    where
        F: BFloat,
        M: Mesh3<F>,
        S: Stepper3,
    {
        config.validate();

        let mut streamlines = Self::seed_streamlines(seeds, vector_field, scalar_field, config);

        let worker_stats = parallel::integrate_streamlines(
            &mut streamlines,
            vector_field,
            scalar_field,
            stepper,
            config,
        );
        let stats = TracingStats::from_worker_stats(&worker_stats);

        let mut streamline_set = StreamlineSet3 { streamlines, stats };

        if config.use_speed_scalars {
            streamline_set.apply_speed_scalars();
        }
        if config.compute_vorticity {
            streamline_set.compute_vorticity();
        }

        if verbose.is_yes() {
            println!(
                "Traced {} streamlines ({} points saved, {} cache hits, {} cache misses)",
                streamline_set.number_of_streamlines(),
                streamline_set.stats.points_saved,
                streamline_set.stats.cache_hits,
                streamline_set.stats.cache_misses
            );
        }

        streamline_set
    }

    /// Returns a slice with the streamlines of the set.
    pub fn streamlines(&self) -> &[StreamLine3] {
        &self.streamlines
    }

    /// Returns the number of streamlines in the set.
    pub fn number_of_streamlines(&self) -> usize {
        self.streamlines.len()
    }

    /// Returns the aggregated counters for the tracing run.
    pub fn stats(&self) -> &TracingStats {
        &self.stats
    }

    /// Consumes the set and returns the streamlines.
    pub fn into_streamlines(self) -> Vec<StreamLine3> {
        self.streamlines
    }

    fn seed_streamlines<F, M>(
        seeds: &SeedSpec3,
        vector_field: &VectorField3<F, M>,
        scalar_field: Option<&ScalarField3<F, M>>,
        config: &StreamlineTracerConfig,
    ) -> Vec<StreamLine3>
    where
        F: BFloat,
        M: Mesh3<F>,
    {
        let mut sampler = FieldSampler3::new(vector_field, scalar_field);

        let seed_points: Vec<StreamPoint> = match seeds {
            SeedSpec3::Position(position) => {
                vec![Self::create_seed_point(&mut sampler, position)]
            }
            SeedSpec3::Location(location) => {
                assert!(
                    location.cell_id < vector_field.mesh().number_of_cells(),
                    "Seed cell id is out of bounds."
                );
                let position = Point3::from(
                    &vector_field
                        .mesh()
                        .position_in_cell(&location.converted()),
                );
                let (velocity, scalar) = sampler.sample_at_location(location);
                let mut point = StreamPoint::at_position(position);
                point.speed = velocity.length();
                point.velocity = velocity;
                point.scalar = scalar;
                point.cell = Some(location.clone());
                vec![point]
            }
            SeedSpec3::Points(positions) => positions
                .iter()
                .map(|position| Self::create_seed_point(&mut sampler, position))
                .collect(),
        };

        let number_of_streamlines = match config.direction {
            IntegrationDirection::Both => 2 * seed_points.len(),
            _ => seed_points.len(),
        };
        let mut streamlines = Vec::with_capacity(number_of_streamlines);

        for seed_point in seed_points {
            match config.direction {
                IntegrationDirection::Forward => {
                    streamlines.push(Self::create_streamline(SteppingSense::Same, seed_point));
                }
                IntegrationDirection::Backward => {
                    streamlines.push(Self::create_streamline(SteppingSense::Opposite, seed_point));
                }
                IntegrationDirection::Both => {
                    streamlines.push(Self::create_streamline(
                        SteppingSense::Same,
                        seed_point.clone(),
                    ));
                    streamlines.push(Self::create_streamline(SteppingSense::Opposite, seed_point));
                }
            }
        }
        streamlines
    }

    fn create_seed_point<F, M>(
        sampler: &mut FieldSampler3<'_, F, M>,
        position: &Point3<ftr>,
    ) -> StreamPoint
    where
        F: BFloat,
        M: Mesh3<F>,
    {
        // Seeds are unrelated trajectories, so the locate hint from a
        // previous seed must not leak into this one.
        sampler.clear_cell_hint();
        let mut point = StreamPoint::at_position(position.clone());
        if let Some((location, velocity)) = sampler.sample_vector(position) {
            point.scalar = sampler.scalar_at_last_location();
            point.speed = velocity.length();
            point.velocity = velocity;
            point.cell = Some(location);
        }
        point
    }

    fn create_streamline(sense: SteppingSense, seed_point: StreamPoint) -> StreamLine3 {
        let mut streamline = StreamLine3::new(sense);
        if seed_point.cell.is_none() {
            streamline.stopping_cause = Some(StoppingCause::SeedOutsideDomain);
        }
        streamline.add_point(seed_point);
        streamline
    }

    fn apply_speed_scalars(&mut self) {
        for streamline in &mut self.streamlines {
            for point in &mut streamline.points {
                point.scalar = point.speed;
            }
        }
    }

    fn compute_vorticity(&mut self) {
        // Vorticity derivation along the traced streamlines is not yet
        // implemented; this is a declared extension point.
    }
}

/// Integrates a single streamline to completion, recording points at
/// the configured time interval.
///
/// Returns the number of points recorded beyond the seed point.
pub(super) fn integrate_streamline<F, M, S>(
    streamline: &mut StreamLine3,
    sampler: &mut FieldSampler3<'_, F, M>,
    stepper: &S,
    config: &StreamlineTracerConfig,
) -> usize
where
    F: BFloat,
    M: Mesh3<F>,
    S: Stepper3,
{
    let seed_point = match streamline.points.first() {
        Some(point) => point.clone(),
        None => return 0,
    };
    if seed_point.cell.is_none() {
        return 0;
    }

    let direction = streamline.sense.signum();
    let mut current = seed_point;
    let mut next_save_time = current.sim_time;
    let mut n_saved_points = 0;

    let stopping_cause = loop {
        let cell_id = match &current.cell {
            Some(location) => location.cell_id,
            None => break StoppingCause::LeftDomain,
        };
        if current.speed <= config.terminal_speed {
            break StoppingCause::BelowTerminalSpeed;
        }
        if current.sim_time >= config.max_propagation_time {
            break StoppingCause::PropagationTimeExceeded;
        }

        // Scale the spatial displacement per step with the local cell
        // size, independently of the field magnitude.
        let cell_length: ftr = num::cast(sampler.mesh().cell_squared_length(cell_id))
            .expect("Conversion failed");
        let step_length =
            direction * config.step_length_fraction * cell_length.sqrt() / current.speed;

        let next_position = match stepper.next_position(
            sampler,
            &current.position,
            &current.velocity,
            step_length,
        ) {
            StepperResult::Ok(position) => position,
            StepperResult::Stopped(cause) => {
                current.cell = None;
                break cause;
            }
        };
        let (location, velocity) = match sampler.sample_vector(&next_position) {
            Some(sample) => sample,
            None => {
                current.cell = None;
                break StoppingCause::LeftDomain;
            }
        };

        let mut next = StreamPoint {
            scalar: sampler.scalar_at_last_location(),
            speed: velocity.length(),
            position: next_position,
            velocity,
            cell: Some(location),
            arc_length: 0.0,
            sim_time: 0.0,
        };

        let displacement = (&next.position - &current.position).length();
        next.arc_length = current.arc_length + displacement;
        if displacement == 0.0 || (current.speed + next.speed) < SPEED_EPSILON {
            next.sim_time = current.sim_time;
            current = next;
            break StoppingCause::Stagnation;
        }
        next.sim_time = current.sim_time + 2.0 * displacement / (current.speed + next.speed);

        // Record points only when the save time cursor falls within the
        // step, so memory use is bounded by the save interval rather
        // than the step count.
        if next_save_time >= current.sim_time && next_save_time <= next.sim_time {
            if streamline
                .last_point()
                .map_or(true, |last| last.position != current.position)
            {
                streamline.add_point(current.clone());
                n_saved_points += 1;
            }
            streamline.add_point(next.clone());
            n_saved_points += 1;
        }
        if next_save_time < next.sim_time {
            next_save_time += (((next.sim_time - next_save_time) / config.save_point_interval)
                .floor()
                + 1.0)
                * config.save_point_interval;
        }

        current = next;
    };

    // The trajectory end must always be recorded, even when it does not
    // fall on the sampling grid.
    let should_record_end = match streamline.last_point() {
        Some(last) => last.position != current.position || last.cell != current.cell,
        None => true,
    };
    if should_record_end {
        streamline.add_point(current);
        n_saved_points += 1;
    }

    streamline.stopping_cause = Some(stopping_cause);
    sampler.clear_cell_hint();

    n_saved_points
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn default_config_matches_documented_values() {
        let config = StreamlineTracerConfig::default();
        assert_eq!(config.direction, IntegrationDirection::Forward);
        assert_eq!(config.max_propagation_time, 100.0);
        assert_eq!(config.step_length_fraction, 0.2);
        assert_eq!(config.terminal_speed, 0.0);
        assert_eq!(config.save_point_interval, 1e-5);
        assert!(!config.use_speed_scalars);
        assert!(!config.compute_vorticity);
        assert!(config.number_of_workers > 0);
    }

    #[test]
    #[should_panic(expected = "Save point interval")]
    fn zero_save_point_interval_is_rejected() {
        let config = StreamlineTracerConfig {
            save_point_interval: 0.0,
            ..StreamlineTracerConfig::default()
        };
        config.validate();
    }
}
