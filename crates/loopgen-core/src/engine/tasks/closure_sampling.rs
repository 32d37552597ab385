use super::crossing_detection::{self, Crossing};
use crate::core::backbone::fragment::build_fragment_with;
use crate::core::codec::CodecError;
use crate::core::predictor::Predictor;
use crate::engine::context::SearchContext;
use crate::engine::error::EngineError;
use crate::engine::progress::Progress;
use crate::engine::state::{Candidate, RejectionReason, SearchStatistics};
use crate::engine::utils::sampling::predict_with_timeout;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

type DrawOutcome = Result<(Candidate, Option<Crossing>), RejectionReason>;

/// Evaluates one predictor draw per seed and scores the resulting candidates.
///
/// Draws are independent: a failure in one never affects another. The returned candidates are
/// in draw order and include self-crossing ones, flagged invalid.
#[instrument(skip_all, name = "closure_sampling_task", fields(population = seeds.len()))]
pub fn run(
    context: &SearchContext,
    predictor: &Arc<dyn Predictor>,
    label: &Arc<[f64]>,
    seeds: &[u64],
) -> Result<(Vec<Candidate>, SearchStatistics), EngineError> {
    info!(
        population = seeds.len(),
        residues = context.layout.len,
        "Sampling candidate fragments."
    );
    context.reporter.report(Progress::TaskStart {
        total_steps: seeds.len() as u64,
    });

    #[cfg(feature = "parallel")]
    let outcomes = match context.config.sampling.max_workers {
        Some(workers) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("loopgen-worker-{i}"))
                .build()
                .map_err(|e| EngineError::WorkerPool(e.to_string()))?;
            pool.install(|| evaluate_all(context, predictor, label, seeds))
        }
        None => evaluate_all(context, predictor, label, seeds),
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes = evaluate_all(context, predictor, label, seeds);

    context.reporter.report(Progress::TaskFinish);

    let mut statistics = SearchStatistics::new(seeds.len());
    let mut candidates = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        match outcome {
            Ok((candidate, crossing)) => {
                match crossing {
                    Some(c) => statistics.record(&crossing_reason(c)),
                    None => statistics.record_accepted(),
                }
                candidates.push(candidate);
            }
            Err(reason) => statistics.record(&reason),
        }
    }

    info!(
        accepted = statistics.accepted,
        rejected = statistics.rejected(),
        "Sampling complete."
    );
    Ok((candidates, statistics))
}

fn evaluate_all(
    context: &SearchContext,
    predictor: &Arc<dyn Predictor>,
    label: &Arc<[f64]>,
    seeds: &[u64],
) -> Vec<DrawOutcome> {
    let evaluate = |(draw, &seed): (usize, &u64)| {
        let outcome = evaluate_draw(context, predictor, label, draw, seed);
        let event = match &outcome {
            Ok((candidate, None)) => Progress::DrawAccepted {
                draw,
                closure_error: candidate.closure_error(),
            },
            Ok((_, Some(crossing))) => Progress::DrawRejected {
                draw,
                reason: crossing_reason(*crossing),
            },
            Err(reason) => Progress::DrawRejected {
                draw,
                reason: reason.clone(),
            },
        };
        context.reporter.report(event);
        context.reporter.report(Progress::TaskIncrement);
        outcome
    };

    #[cfg(not(feature = "parallel"))]
    let iterator = seeds.iter().enumerate();

    #[cfg(feature = "parallel")]
    let iterator = seeds.par_iter().enumerate();

    iterator.map(evaluate).collect()
}

fn evaluate_draw(
    context: &SearchContext,
    predictor: &Arc<dyn Predictor>,
    label: &Arc<[f64]>,
    draw: usize,
    seed: u64,
) -> DrawOutcome {
    if context.cancel.is_cancelled() {
        return Err(RejectionReason::Cancelled);
    }

    let config = context.config;
    let layout = context.layout;

    let raw = predict_with_timeout(predictor, label, seed, config.sampling.predictor_timeout)?;
    let angles = config.encoding.decode_angles(&raw)?;
    if angles.len() != layout.len {
        return Err(RejectionReason::Decode(CodecError::InvalidLength {
            len: raw.len(),
            expected: "3 values per rebuilt residue",
        }));
    }

    let fragment = build_fragment_with(
        &layout.seed,
        &angles,
        config.geometry.bond_length,
        config.geometry.collinear_policy,
    )?;
    let structure = context.reference.with_segment(layout.start_index, &fragment)?;

    let closure_error = match fragment.last() {
        Some(last) => {
            (config.geometry.bond_length - nalgebra::distance(last, &layout.downstream_anchor))
                .abs()
        }
        None => f64::INFINITY,
    };
    if !closure_error.is_finite() {
        return Err(RejectionReason::NonFiniteClosure(closure_error));
    }
    let crossing = crossing_detection::find_crossing(
        &structure,
        layout.crossing_focus(),
        config.geometry.crossing_tolerance,
    );
    debug!(draw, closure_error, crossed = crossing.is_some(), "Scored draw.");

    Ok((
        Candidate::new(draw, structure, closure_error, crossing.is_none()),
        crossing,
    ))
}

fn crossing_reason(crossing: Crossing) -> RejectionReason {
    RejectionReason::SelfCrossing {
        first: crossing.first,
        second: crossing.second,
        distance: crossing.distance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backbone::fragment::build_fragment;
    use crate::core::codec::{AnglePair, Encoding, RawOutputVector};
    use crate::core::models::atom::Atom;
    use crate::core::models::structure::Structure;
    use crate::core::predictor::PredictorError;
    use crate::engine::cancel::CancellationToken;
    use crate::engine::config::{ReconstructionConfig, ReconstructionConfigBuilder};
    use crate::engine::context::SegmentLayout;
    use crate::engine::progress::ProgressReporter;
    use crate::engine::selector;
    use nalgebra::Point3;
    use rand::rngs::StdRng;
    use rand::{Rng, RngCore, SeedableRng};
    use std::thread;
    use std::time::Duration;

    const HELIX: AnglePair = AnglePair {
        alpha: 91.0,
        theta: 50.0,
    };

    fn helix() -> Structure {
        let bend = 89.0_f64.to_radians();
        let seed = [
            Point3::origin(),
            Point3::new(3.8, 0.0, 0.0),
            Point3::new(3.8 + 3.8 * bend.cos(), 3.8 * bend.sin(), 0.0),
        ];
        let rest = build_fragment(&seed, &[HELIX; 12], 3.8).unwrap();
        let atoms = seed
            .iter()
            .chain(&rest)
            .enumerate()
            .map(|(i, &p)| Atom::new(i + 1, "ALA", 'A', i as isize + 1, p))
            .collect();
        Structure::new(atoms).unwrap()
    }

    fn builder(population: usize) -> ReconstructionConfigBuilder {
        ReconstructionConfigBuilder::new()
            .start(6)
            .end(9)
            .population(population)
            .repeats(population)
    }

    fn helix_predictor() -> Arc<dyn Predictor> {
        Arc::new(
            |_: &[f64], _: &mut dyn RngCore| -> Result<RawOutputVector, PredictorError> {
                Ok(Encoding::Mlp.encode_angles(&[HELIX; 4]))
            },
        )
    }

    fn noisy_predictor() -> Arc<dyn Predictor> {
        Arc::new(
            |_: &[f64], rng: &mut dyn RngCore| -> Result<RawOutputVector, PredictorError> {
                let angles: Vec<_> = (0..4)
                    .map(|_| AnglePair::new(91.0, 50.0 + rng.gen_range(-40.0..40.0)))
                    .collect();
                Ok(Encoding::Mlp.encode_angles(&angles))
            },
        )
    }

    fn sample(
        structure: &Structure,
        config: &ReconstructionConfig,
        predictor: Arc<dyn Predictor>,
        seeds: &[u64],
        cancel: &CancellationToken,
    ) -> (Vec<Candidate>, SearchStatistics) {
        let layout = SegmentLayout::resolve(structure, &config.range).unwrap();
        let reporter = ProgressReporter::new();
        let context = SearchContext::new(structure, config, &layout, &reporter, cancel);
        let label: Arc<[f64]> = Arc::from(vec![0.0; 3]);
        run(&context, &predictor, &label, seeds).unwrap()
    }

    #[test]
    fn crossing_draws_stay_in_the_pool_as_invalid() {
        // Segments two apart can never be more than one bond length apart.
        let config = builder(3).crossing_tolerance(4.0).build().unwrap();
        let (candidates, statistics) = sample(
            &helix(),
            &config,
            helix_predictor(),
            &[1, 2, 3],
            &CancellationToken::new(),
        );

        assert_eq!(candidates.len(), 3);
        assert!(candidates.iter().all(|c| !c.is_valid()));
        assert!(candidates.iter().all(|c| c.closure_error() < 1e-6));
        assert_eq!(statistics.crossings, 3);
        assert_eq!(statistics.accepted, 0);
        assert_eq!(statistics.rejected(), 3);
    }

    #[test]
    fn dedicated_worker_pool_matches_global_pool() {
        let structure = helix();
        let seeds: Vec<u64> = (0..12).map(|i| 1000 + i).collect();
        let global = builder(12).build().unwrap();
        let dedicated = builder(12).max_workers(Some(2)).build().unwrap();

        let summary = |config: &ReconstructionConfig| {
            let (candidates, statistics) = sample(
                &structure,
                config,
                noisy_predictor(),
                &seeds,
                &CancellationToken::new(),
            );
            let rows: Vec<(usize, f64, bool)> = candidates
                .iter()
                .map(|c| (c.draw(), c.closure_error(), c.is_valid()))
                .collect();
            (rows, statistics)
        };

        let (global_rows, global_stats) = summary(&global);
        let (dedicated_rows, dedicated_stats) = summary(&dedicated);
        assert_eq!(global_rows, dedicated_rows);
        assert_eq!(global_stats, dedicated_stats);
        assert_eq!(global_stats.population, 12);
    }

    #[test]
    fn timed_out_draws_are_dropped_without_failing_the_run() {
        // The first value a draw's RNG yields identifies its seed.
        let slow_marker = StdRng::seed_from_u64(1).next_u64();
        let predictor: Arc<dyn Predictor> = Arc::new(
            move |_: &[f64], rng: &mut dyn RngCore| -> Result<RawOutputVector, PredictorError> {
                if rng.next_u64() == slow_marker {
                    thread::sleep(Duration::from_millis(1500));
                }
                Ok(Encoding::Mlp.encode_angles(&[HELIX; 4]))
            },
        );
        let config = builder(4)
            .predictor_timeout(Some(Duration::from_millis(300)))
            .build()
            .unwrap();

        let (candidates, statistics) = sample(
            &helix(),
            &config,
            predictor,
            &[1, 2, 3, 1],
            &CancellationToken::new(),
        );

        let draws: Vec<_> = candidates.iter().map(Candidate::draw).collect();
        assert_eq!(draws, vec![1, 2]);
        assert_eq!(statistics.timeouts, 2);
        assert_eq!(statistics.accepted, 2);
        assert_eq!(statistics.rejected(), 2);
    }

    #[test]
    fn draws_scored_before_cancellation_are_still_ranked() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let predictor: Arc<dyn Predictor> = Arc::new(
            move |_: &[f64], _: &mut dyn RngCore| -> Result<RawOutputVector, PredictorError> {
                trigger.cancel();
                Ok(Encoding::Mlp.encode_angles(&[HELIX; 4]))
            },
        );
        let config = builder(6).max_workers(Some(1)).build().unwrap();
        let structure = helix();

        let (candidates, statistics) =
            sample(&structure, &config, predictor, &[1, 2, 3, 4, 5, 6], &cancel);

        assert!(statistics.accepted >= 1);
        assert!(statistics.cancelled >= 1);
        assert_eq!(statistics.accepted + statistics.cancelled, 6);
        assert_eq!(candidates.len(), statistics.accepted);

        let ranked = selector::select(&structure, candidates, 6, &statistics).unwrap();
        assert_eq!(ranked.len(), statistics.accepted);
        assert!(ranked[0].candidate.closure_error() < 1e-6);
    }

    #[test]
    fn non_finite_planar_angle_is_a_rejected_draw() {
        let predictor: Arc<dyn Predictor> = Arc::new(
            |_: &[f64], _: &mut dyn RngCore| -> Result<RawOutputVector, PredictorError> {
                let alpha = 91.0 / 180.0;
                let mut raw = vec![alpha, alpha, alpha, f64::NAN];
                raw.extend([0.5; 8]);
                Ok(raw)
            },
        );
        let config = builder(2).build().unwrap();

        let (candidates, statistics) = sample(
            &helix(),
            &config,
            predictor,
            &[7, 8],
            &CancellationToken::new(),
        );

        assert!(candidates.is_empty());
        assert_eq!(statistics.decode_failures, 2);
        assert_eq!(statistics.accepted, 0);
    }
}
