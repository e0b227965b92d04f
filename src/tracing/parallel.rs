//! Parallel integration of independent streamlines.

use super::{
    sampling::FieldSampler3,
    stepping::Stepper3,
    streamline::{self, StreamLine3, StreamlineTracerConfig},
};
use crate::{
    field::{ScalarField3, VectorField3},
    mesh::Mesh3,
    num::BFloat,
};
use rayon::prelude::*;

/// Counters accumulated by a single worker during integration.
#[derive(Clone, Copy, Debug)]
pub struct WorkerStats {
    /// Index of the worker within the tracing run.
    pub worker_id: usize,
    /// Number of streamlines the worker integrated.
    pub streamlines_integrated: usize,
    /// Number of points the worker recorded beyond the seed points.
    pub points_saved: usize,
    /// Number of cell searches resolved by the worker's last-cell hint.
    pub cache_hits: u64,
    /// Number of cell searches not resolved by the worker's last-cell hint.
    pub cache_misses: u64,
}

/// Integrates the given streamlines to completion, partitioned across
/// the configured number of workers.
///
/// Streamlines are assigned to workers round-robin by index, so the
/// content of each streamline is independent of scheduling order. Each
/// worker uses its own sampler, and streamlines whose seed point lies
/// outside the mesh are left untouched.
pub fn integrate_streamlines<F, M, S>(
    streamlines: &mut [StreamLine3],
    vector_field: &VectorField3<F, M>,
    scalar_field: Option<&ScalarField3<F, M>>,
    stepper: &S,
    config: &StreamlineTracerConfig,
) -> Vec<WorkerStats>
where
    F: BFloat,
    M: Mesh3<F>,
    S: Stepper3,
{
    let n_workers = config.number_of_workers.min(streamlines.len()).max(1);

    let mut buckets: Vec<Vec<&mut StreamLine3>> = (0..n_workers).map(|_| Vec::new()).collect();
    for (idx, streamline) in streamlines.iter_mut().enumerate() {
        buckets[idx % n_workers].push(streamline);
    }

    buckets
        .into_par_iter()
        .enumerate()
        .map(|(worker_id, bucket)| {
            let mut sampler = FieldSampler3::new(vector_field, scalar_field);
            let stepper = stepper.clone();
            let mut stats = WorkerStats {
                worker_id,
                streamlines_integrated: 0,
                points_saved: 0,
                cache_hits: 0,
                cache_misses: 0,
            };
            for streamline in bucket {
                if streamline
                    .points()
                    .first()
                    .map_or(true, |point| point.cell.is_none())
                {
                    continue;
                }
                stats.points_saved +=
                    streamline::integrate_streamline(streamline, &mut sampler, &stepper, config);
                stats.streamlines_integrated += 1;
            }
            stats.cache_hits = sampler.cache_hits();
            stats.cache_misses = sampler.cache_misses();
            stats
        })
        .collect()
}
