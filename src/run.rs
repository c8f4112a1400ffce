use tracing::{info, warn};

use crate::config::{RunPlan, TaskConfig};
use crate::data::BenchmarkRecord;
use crate::errors::GeneratorError;
use crate::export::RecordSink;
use crate::metrics::FillReport;
use crate::sampler::DepthBucketSampler;
use crate::sizer::SizeHintCache;
use crate::tokenizer::Tokenizer;
use crate::types::ConfigKey;

/// Result of one completed task.
#[derive(Clone, Debug)]
pub struct TaskOutcome {
    /// Task key, also the split name the records were exported under.
    pub key: ConfigKey,
    /// Records exported for this task.
    pub num_records: usize,
    /// Per-bucket fill accounting.
    pub fill: FillReport,
}

/// What a batch run produced: completed tasks in plan order plus the tasks
/// skipped over a configuration-fatal error.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Tasks that generated and exported records.
    pub completed: Vec<TaskOutcome>,
    /// Skipped tasks as `(key, error message)` pairs.
    pub failed: Vec<(ConfigKey, String)>,
}

/// Generate all records for one task.
pub fn generate_task<T: Tokenizer + ?Sized>(
    task: TaskConfig,
    tokenizer: &T,
    hints: &mut SizeHintCache,
) -> Result<(Vec<BenchmarkRecord>, FillReport), GeneratorError> {
    let mut sampler = DepthBucketSampler::new(task, tokenizer, hints)?;
    sampler.fill_buckets()
}

/// Run every task of `plan`, exporting each finished split to `sink`.
///
/// A configuration-fatal failure is contained: the task is logged, recorded
/// in the summary, and its siblings still run. Infrastructure failures (IO,
/// tokenizer, export) abort the whole run immediately.
pub fn generate_run<T, S>(
    plan: &RunPlan,
    tokenizer: &T,
    sink: &mut S,
    hints: &mut SizeHintCache,
) -> Result<RunSummary, GeneratorError>
where
    T: Tokenizer + ?Sized,
    S: RecordSink + ?Sized,
{
    plan.validate()?;
    let mut summary = RunSummary::default();
    for task in plan.tasks() {
        let key = task.key();
        info!("[haystacks:run] generating {key}");
        match generate_task(task, tokenizer, hints) {
            Ok((records, fill)) => {
                sink.export(&key, &records)?;
                summary.completed.push(TaskOutcome {
                    key,
                    num_records: records.len(),
                    fill,
                });
            }
            Err(err) if err.is_task_fatal() => {
                warn!("[haystacks:run] skipping {key}: {err}");
                summary.failed.push((key, err.to_string()));
            }
            Err(err) => return Err(err),
        }
    }
    Ok(summary)
}
