use tracing::{debug, warn};

use crate::config::TaskConfig;
use crate::constants::sampler::{
    ATTEMPTS_PER_EXAMPLE, GROUP_SEED_OFFSET, PAIR_SEED_OFFSET, QUERY_JOIN_SEPARATOR,
};
use crate::data::{BenchmarkRecord, Demonstration};
use crate::errors::GeneratorError;
use crate::groups::{GroupSelection, select_groups};
use crate::metrics::{BucketFill, FillReport};
use crate::pairs::{PairPool, depth_percent};
use crate::rng::DeterministicRng;
use crate::sizer::{SizeHintCache, SizedContext, size_to_target};
use crate::tokenizer::Tokenizer;
use crate::types::PoolIndex;

/// Record generator for one task: owns the sized pair pool and draws group
/// selections until every depth bucket has its quota.
///
/// The context is sized once at construction and shared by every record the
/// task emits; only the group selection varies between attempts. Pair
/// generation and group selection draw from two independent streams derived
/// from the task seed, so a warmer or colder size-hint cache can never shift
/// which groups get sampled.
#[derive(Debug)]
pub struct DepthBucketSampler {
    task: TaskConfig,
    pool: PairPool,
    sized: SizedContext,
    group_rng: DeterministicRng,
}

impl DepthBucketSampler {
    /// Size the context for `task` and prepare the group sampling stream.
    pub fn new<T: Tokenizer + ?Sized>(
        task: TaskConfig,
        tokenizer: &T,
        hints: &mut SizeHintCache,
    ) -> Result<Self, GeneratorError> {
        task.validate()?;
        let task_seed = task.derived_seed();
        let mut pool = PairPool::new(task_seed ^ PAIR_SEED_OFFSET);
        let min_pairs = task.min_pairs_required();
        let sized = size_to_target(
            &mut pool,
            tokenizer,
            task.base.format,
            task.context_size,
            min_pairs,
            hints,
        )?;
        if sized.num_pairs < min_pairs {
            return Err(GeneratorError::InsufficientPairs {
                required: min_pairs,
                reached: sized.num_pairs,
            });
        }
        let group_rng = DeterministicRng::new(task_seed ^ GROUP_SEED_OFFSET);
        Ok(Self {
            task,
            pool,
            sized,
            group_rng,
        })
    }

    /// The task this sampler generates for.
    pub fn task(&self) -> &TaskConfig {
        &self.task
    }

    /// The sized context shared by every record of this task.
    pub fn sized_context(&self) -> &SizedContext {
        &self.sized
    }

    /// Draw one fresh group selection and compose a record from it.
    pub fn compose_record(&mut self) -> Result<BenchmarkRecord, GeneratorError> {
        let selection = select_groups(
            self.sized.num_pairs,
            self.task.num_query_keys,
            self.task.base.num_demo_groups,
            &mut self.group_rng,
        )?;
        Ok(self.record_from_selection(&selection))
    }

    /// Fill every depth bucket up to its quota, attempt-capped per bucket.
    ///
    /// Returns the collected records in bucket order plus the per-bucket fill
    /// accounting. An underfilled bucket logs a warning and the run moves on;
    /// only infrastructure failures abort.
    pub fn fill_buckets(&mut self) -> Result<(Vec<BenchmarkRecord>, FillReport), GeneratorError> {
        let num_buckets = self.task.base.num_buckets;
        let quota = self.task.base.examples_per_bucket;
        let width = 100.0 / num_buckets as f64;
        let attempt_cap = quota.saturating_mul(ATTEMPTS_PER_EXAMPLE);

        let mut records = Vec::with_capacity(num_buckets * quota);
        let mut report = FillReport::default();
        for bucket in 0..num_buckets {
            let lower = bucket as f64 * width;
            let upper = lower + width;
            let mut collected = 0;
            let mut attempts = 0;
            while collected < quota && attempts < attempt_cap {
                attempts += 1;
                let record = self.compose_record()?;
                if record.first_depth >= lower && record.first_depth < upper {
                    records.push(record);
                    collected += 1;
                }
            }
            if collected < quota {
                warn!(
                    "[haystacks:sampler] only generated {collected} of {quota} examples for bucket {bucket} ({lower:.2}% to {upper:.2}%) after {attempts} attempts"
                );
            }
            report.buckets.push(BucketFill {
                bucket,
                lower,
                upper,
                collected,
                quota,
                attempts,
            });
        }
        debug!(
            "[haystacks:sampler] task {} collected {} of {} records",
            self.task.key(),
            report.total_collected(),
            num_buckets * quota
        );
        Ok((records, report))
    }

    fn record_from_selection(&self, selection: &GroupSelection) -> BenchmarkRecord {
        let demonstrations = selection
            .demo_groups
            .iter()
            .map(|group| Demonstration {
                question: self.join_keys(group),
                answer: self.join_values(group),
            })
            .collect();

        let depths: Vec<f64> = selection
            .query_group
            .iter()
            .map(|&index| depth_percent(index, self.sized.num_pairs))
            .collect();
        let first_depth = depths[0];
        let depth = depths.iter().sum::<f64>() / depths.len() as f64;

        BenchmarkRecord {
            context: self.sized.context.clone(),
            demonstrations,
            question: self.join_keys(&selection.query_group),
            answer: self.join_values(&selection.query_group),
            first_depth,
            depth,
            num_pairs: self.sized.num_pairs,
        }
    }

    fn join_keys(&self, indices: &[PoolIndex]) -> String {
        let pairs = self.pool.pairs();
        indices
            .iter()
            .map(|&index| pairs[index].key.as_str())
            .collect::<Vec<_>>()
            .join(QUERY_JOIN_SEPARATOR)
    }

    fn join_values(&self, indices: &[PoolIndex]) -> String {
        let pairs = self.pool.pairs();
        indices
            .iter()
            .map(|&index| pairs[index].value.as_str())
            .collect::<Vec<_>>()
            .join(QUERY_JOIN_SEPARATOR)
    }
}
