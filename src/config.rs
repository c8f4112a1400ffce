use crate::constants::defaults::{
    DEFAULT_EXAMPLES_PER_BUCKET, DEFAULT_NUM_BUCKETS, DEFAULT_NUM_DEMOS, DEFAULT_SEED,
};
use crate::errors::GeneratorError;
use crate::format::ContextFormat;
use crate::hash::stable_hash_str;
use crate::types::{ConfigKey, TokenCount};

/// Knobs shared by every task of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// RNG seed that controls deterministic generation order.
    pub seed: u64,
    /// Rendering applied to the key-value context.
    pub format: ContextFormat,
    /// Number of demonstration groups per record.
    pub num_demo_groups: usize,
    /// Number of equal-width depth buckets.
    pub num_buckets: usize,
    /// Records to collect per bucket.
    pub examples_per_bucket: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            format: ContextFormat::Json,
            num_demo_groups: DEFAULT_NUM_DEMOS,
            num_buckets: DEFAULT_NUM_BUCKETS,
            examples_per_bucket: DEFAULT_EXAMPLES_PER_BUCKET,
        }
    }
}

impl GeneratorConfig {
    /// Reject values no task could run with.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.num_buckets == 0 {
            return Err(GeneratorError::Configuration(
                "num_buckets must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// One generation task: a target context size and a query-key count on top of
/// the shared base configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskConfig {
    /// Target context length in tokens.
    pub context_size: TokenCount,
    /// Keys queried per record.
    pub num_query_keys: usize,
    /// Run-wide knobs this task inherits.
    pub base: GeneratorConfig,
}

impl TaskConfig {
    /// Stable identifier, also used as the export split name.
    ///
    /// Example: `ctx_4096_num_q_2`.
    pub fn key(&self) -> ConfigKey {
        format!("ctx_{}_num_q_{}", self.context_size, self.num_query_keys)
    }

    /// Smallest pool that can host one query group and all demo groups.
    pub fn min_pairs_required(&self) -> usize {
        self.num_query_keys * (1 + self.base.num_demo_groups)
    }

    /// Task-local seed derived from the run seed and the task key, so every
    /// task draws from its own stream regardless of sibling order.
    pub fn derived_seed(&self) -> u64 {
        stable_hash_str(self.base.seed, &self.key())
    }

    /// Reject values this task cannot run with.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        self.base.validate()?;
        if self.context_size == 0 {
            return Err(GeneratorError::Configuration(
                "context_size must be positive".to_string(),
            ));
        }
        if self.num_query_keys == 0 {
            return Err(GeneratorError::Configuration(
                "num_query_keys must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// A batch of tasks: the cross product of context sizes and query-key counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunPlan {
    /// Target context lengths, one task per entry.
    pub context_sizes: Vec<TokenCount>,
    /// Query-key counts crossed with each context size.
    pub query_key_counts: Vec<usize>,
    /// Knobs shared by every task.
    pub base: GeneratorConfig,
}

impl RunPlan {
    /// Expand the plan into tasks, context sizes outermost.
    pub fn tasks(&self) -> Vec<TaskConfig> {
        self.context_sizes
            .iter()
            .flat_map(|&context_size| {
                self.query_key_counts.iter().map(move |&num_query_keys| TaskConfig {
                    context_size,
                    num_query_keys,
                    base: self.base.clone(),
                })
            })
            .collect()
    }

    /// Reject plans with nothing to do. Per-task values are checked when each
    /// task starts, so one bad entry cannot block its siblings.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        self.base.validate()?;
        if self.context_sizes.is_empty() {
            return Err(GeneratorError::Configuration(
                "context_sizes must not be empty".to_string(),
            ));
        }
        if self.query_key_counts.is_empty() {
            return Err(GeneratorError::Configuration(
                "query_key_counts must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
