//! Solver configuration.

/// How strictly soft restriction violations are reported.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strictness {
    /// Isset-safety violations are warnings.
    #[default]
    Default,
    /// Every restriction violation is a hard error.
    Strict,
}

/// Knobs for a `TypeInferer` run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InferConfig {
    /// Worker threads for `run_to_fixpoint` (0 = one per rayon thread).
    pub num_workers: usize,
    /// Restriction violations reported before the rest are dropped.
    pub max_reported_violations: usize,
    pub strictness: Strictness,
    /// Longest chain the counter-example search will follow.
    pub trace_max_depth: usize,
    /// Node expansions allowed per counter-example search.
    pub trace_step_budget: usize,
    /// Maximum errors kept in the outcome (0 = unlimited).
    pub error_limit: usize,
}

impl Default for InferConfig {
    fn default() -> Self {
        InferConfig {
            num_workers: 0,
            max_reported_violations: 1,
            strictness: Strictness::Default,
            trace_max_depth: 32,
            trace_step_budget: 4096,
            error_limit: 50,
        }
    }
}

impl InferConfig {
    /// Everything on the calling thread. Deterministic order, used by tests.
    pub fn single_threaded() -> Self {
        Self::default().with_workers(1)
    }

    #[must_use]
    pub fn with_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    #[must_use]
    pub fn with_max_reported_violations(mut self, n: usize) -> Self {
        self.max_reported_violations = n;
        self
    }

    #[must_use]
    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    #[must_use]
    pub fn with_trace_limits(mut self, max_depth: usize, step_budget: usize) -> Self {
        self.trace_max_depth = max_depth;
        self.trace_step_budget = step_budget;
        self
    }

    #[must_use]
    pub fn with_error_limit(mut self, limit: usize) -> Self {
        self.error_limit = limit;
        self
    }

    /// Worker count with 0 resolved against the rayon pool.
    pub fn effective_workers(&self) -> usize {
        if self.num_workers == 0 {
            rayon::current_num_threads().max(1)
        } else {
            self.num_workers
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = InferConfig::default();
        assert_eq!(config.max_reported_violations, 1);
        assert_eq!(config.trace_max_depth, 32);
        assert_eq!(config.trace_step_budget, 4096);
        assert_eq!(config.strictness, Strictness::Default);
        assert!(config.effective_workers() >= 1);
    }

    #[test]
    fn single_threaded_uses_one_worker() {
        let config = InferConfig::single_threaded();
        assert_eq!(config.effective_workers(), 1);
    }

    #[test]
    fn builders_chain() {
        let config = InferConfig::default()
            .with_workers(3)
            .with_strictness(Strictness::Strict)
            .with_max_reported_violations(10)
            .with_trace_limits(4, 16)
            .with_error_limit(0);
        assert_eq!(config.num_workers, 3);
        assert_eq!(config.strictness, Strictness::Strict);
        assert_eq!(config.max_reported_violations, 10);
        assert_eq!((config.trace_max_depth, config.trace_step_budget), (4, 16));
        assert_eq!(config.error_limit, 0);
    }
}
