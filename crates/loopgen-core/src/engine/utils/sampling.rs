use crate::core::codec::RawOutputVector;
use crate::core::predictor::Predictor;
use crate::engine::state::RejectionReason;
use rand::prelude::*;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use tracing::{instrument, warn};

/// Draws one seed per predictor call from the master RNG, in draw order.
///
/// Seeding every draw independently keeps results reproducible whatever order the worker
/// pool evaluates them in.
pub fn draw_seeds(rng: &mut impl Rng, population: usize) -> Vec<u64> {
    (0..population).map(|_| rng.next_u64()).collect()
}

/// Runs one predictor call with an RNG seeded from `seed`, bounded by `timeout`.
///
/// With a timeout the call runs on a helper thread. A call that misses its deadline is
/// abandoned: the helper keeps running until the predictor returns and its result is dropped.
#[instrument(level = "trace", skip_all, fields(seed))]
pub fn predict_with_timeout(
    predictor: &Arc<dyn Predictor>,
    label: &Arc<[f64]>,
    seed: u64,
    timeout: Option<Duration>,
) -> Result<RawOutputVector, RejectionReason> {
    let Some(timeout) = timeout else {
        let mut rng = StdRng::seed_from_u64(seed);
        return predictor
            .predict(label, &mut rng)
            .map_err(|e| RejectionReason::PredictorFailed(e.to_string()));
    };

    let (sender, receiver) = mpsc::channel();
    let predictor = Arc::clone(predictor);
    let label = Arc::clone(label);
    let spawned = thread::Builder::new()
        .name(format!("predictor-{seed:x}"))
        .spawn(move || {
            let mut rng = StdRng::seed_from_u64(seed);
            // The receiver is gone once the caller has given up on this draw.
            let _ = sender.send(predictor.predict(&label, &mut rng));
        });
    if let Err(e) = spawned {
        return Err(RejectionReason::PredictorFailed(format!(
            "could not spawn predictor thread: {e}"
        )));
    }

    match receiver.recv_timeout(timeout) {
        Ok(result) => result.map_err(|e| RejectionReason::PredictorFailed(e.to_string())),
        Err(RecvTimeoutError::Timeout) => {
            warn!(?timeout, "Predictor call exceeded its deadline");
            Err(RejectionReason::TimedOut)
        }
        Err(RecvTimeoutError::Disconnected) => Err(RejectionReason::PredictorFailed(
            "predictor thread terminated without a result".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::predictor::PredictorError;

    fn echo_predictor() -> Arc<dyn Predictor> {
        Arc::new(|label: &[f64], rng: &mut dyn RngCore| -> Result<_, PredictorError> {
            let noise = rng.next_u64() as f64;
            Ok(vec![label[0], noise, 1.0])
        })
    }

    #[test]
    fn draw_seeds_is_reproducible_for_equal_master_seed() {
        let a = draw_seeds(&mut StdRng::seed_from_u64(5), 8);
        let b = draw_seeds(&mut StdRng::seed_from_u64(5), 8);
        let c = draw_seeds(&mut StdRng::seed_from_u64(6), 8);
        assert_eq!(a.len(), 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn predictions_depend_only_on_seed() {
        let predictor = echo_predictor();
        let label: Arc<[f64]> = Arc::from(vec![0.5]);

        let direct = predict_with_timeout(&predictor, &label, 42, None).unwrap();
        let threaded =
            predict_with_timeout(&predictor, &label, 42, Some(Duration::from_secs(5))).unwrap();
        let other = predict_with_timeout(&predictor, &label, 43, None).unwrap();

        assert_eq!(direct, threaded);
        assert_eq!(direct[0], 0.5);
        assert_ne!(direct, other);
    }

    #[test]
    fn slow_predictor_times_out() {
        let predictor: Arc<dyn Predictor> =
            Arc::new(|_: &[f64], _: &mut dyn RngCore| -> Result<_, PredictorError> {
                thread::sleep(Duration::from_millis(500));
                Ok(vec![0.5, 0.0, 1.0])
            });
        let label: Arc<[f64]> = Arc::from(vec![0.0]);

        let result = predict_with_timeout(&predictor, &label, 1, Some(Duration::from_millis(20)));
        assert_eq!(result, Err(RejectionReason::TimedOut));
    }

    #[test]
    fn predictor_errors_become_rejections() {
        let predictor: Arc<dyn Predictor> =
            Arc::new(|_: &[f64], _: &mut dyn RngCore| -> Result<RawOutputVector, _> {
                Err(PredictorError::Failed("model offline".to_string()))
            });
        let label: Arc<[f64]> = Arc::from(vec![0.0]);

        for timeout in [None, Some(Duration::from_secs(1))] {
            match predict_with_timeout(&predictor, &label, 1, timeout) {
                Err(RejectionReason::PredictorFailed(message)) => {
                    assert!(message.contains("model offline"))
                }
                other => panic!("unexpected result: {other:?}"),
            }
        }
    }
}
