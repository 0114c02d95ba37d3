//! Parallel execution of the (variant x engine) grid.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, warn};

use super::EngineRegistry;
use crate::models::config::OcrConfig;
use crate::preprocess::Variant;
use crate::select::ExtractionCandidate;

/// Wall-clock budget shared across one document's pairs.
///
/// A synchronous engine call cannot be preempted, so the deadline is
/// honored at pair boundaries: a pair that would start after expiry
/// degrades to an empty candidate instead of running.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    start: Instant,
    budget: Duration,
}

impl Deadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            start: Instant::now(),
            budget,
        }
    }

    pub fn expired(&self) -> bool {
        self.start.elapsed() >= self.budget
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Runs every registered engine over every image variant.
///
/// Pairs are mutually independent and read-only over the variants, so
/// they run on a bounded worker pool and merge at a single join point.
pub struct OcrExecutor {
    registry: Arc<EngineRegistry>,
    pool: Arc<rayon::ThreadPool>,
    noise_floor: f32,
    engine_budget: Duration,
}

impl OcrExecutor {
    pub fn new(registry: Arc<EngineRegistry>, config: &OcrConfig) -> crate::error::Result<Self> {
        let threads = if config.worker_threads == 0 {
            num_cpus::get()
        } else {
            config.worker_threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("veridok-ocr-{}", i))
            .build()
            .map_err(|e| crate::error::VeridokError::Config(e.to_string()))?;

        Ok(Self {
            registry,
            pool: Arc::new(pool),
            noise_floor: config.noise_floor,
            engine_budget: Duration::from_millis(config.engine_timeout_ms),
        })
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    /// Run the full grid and collect one candidate per pair.
    ///
    /// A failing or deadline-starved pair becomes a zero-confidence
    /// empty candidate; no pair ever aborts the batch. The returned
    /// list is in variant-major, engine-minor order regardless of
    /// completion order.
    pub fn run_grid(
        &self,
        variants: &[Variant],
        vocabulary: &[&str],
        deadline: Deadline,
    ) -> Vec<ExtractionCandidate> {
        let engines = self.registry.engines();
        let pairs: Vec<(usize, usize)> = (0..variants.len())
            .flat_map(|v| (0..engines.len()).map(move |e| (v, e)))
            .collect();

        debug!(
            "running {} (variant x engine) pairs on {} workers",
            pairs.len(),
            self.pool.current_num_threads()
        );

        let noise_floor = self.noise_floor;
        let engine_budget = self.engine_budget;
        self.pool.install(|| {
            pairs
                .par_iter()
                .map(|&(vi, ei)| {
                    let (method, image) = &variants[vi];
                    let engine = &engines[ei];

                    if deadline.expired() {
                        warn!(
                            "deadline expired before {}+{}, degrading to empty candidate",
                            method,
                            engine.name()
                        );
                        return ExtractionCandidate::failed(*method, engine.name(), ei);
                    }

                    // A synchronous engine call cannot be interrupted,
                    // so the per-engine budget is enforced after the
                    // fact: an overrunning pair has its output dropped.
                    let call_start = Instant::now();
                    let recognized = engine.recognize(image);
                    if call_start.elapsed() > engine_budget {
                        warn!(
                            "pair {}+{} overran its {}ms engine budget, dropping output",
                            method,
                            engine.name(),
                            engine_budget.as_millis()
                        );
                        return ExtractionCandidate::failed(*method, engine.name(), ei);
                    }

                    match recognized {
                        Ok(output) => ExtractionCandidate::from_output(
                            *method,
                            engine.name(),
                            ei,
                            output,
                            noise_floor,
                            vocabulary,
                        ),
                        Err(e) => {
                            warn!("pair {}+{} failed: {}", method, engine.name(), e);
                            ExtractionCandidate::failed(*method, engine.name(), ei)
                        }
                    }
                })
                .collect()
        })
    }
}
