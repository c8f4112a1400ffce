#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// CLI runners shared by the example binaries.
pub mod apps;
/// Generation configuration: per-run knobs, per-task settings, batch plans.
pub mod config;
/// Centralized constants used across sizing, sampling, and export.
pub mod constants;
/// Benchmark record types.
pub mod data;
/// Record sinks: JSONL files with manifests, plus an in-memory sink.
pub mod export;
/// Context serialization formats and rendering.
pub mod format;
/// Disjoint demonstration/query group selection.
pub mod groups;
/// Per-bucket fill accounting.
pub mod metrics;
/// Deterministic unique key-value pair generation.
pub mod pairs;
/// Batch driver: run every task of a plan and export the splits.
pub mod run;
/// Depth-bucket record sampling.
pub mod sampler;
/// Adaptive context sizing and the size-hint cache.
pub mod sizer;
/// Token counting boundary and built-in tokenizers.
pub mod tokenizer;
/// Shared type aliases.
pub mod types;

mod errors;
mod hash;
mod rng;

pub use config::{GeneratorConfig, RunPlan, TaskConfig};
pub use data::{BenchmarkRecord, Demonstration};
pub use errors::GeneratorError;
pub use export::{JsonlExporter, MemoryExporter, RecordSink, SplitManifest};
pub use format::{ContextFormat, render_context};
pub use groups::{GroupSelection, select_groups};
pub use metrics::{BucketFill, FillReport};
pub use pairs::{KeyValuePair, PairPool, depth_percent};
pub use run::{RunSummary, TaskOutcome, generate_run, generate_task};
pub use sampler::DepthBucketSampler;
pub use sizer::{SizeHintCache, SizedContext, size_to_target};
#[cfg(feature = "huggingface")]
pub use tokenizer::HuggingFaceTokenizer;
pub use tokenizer::{CharWindowTokenizer, Tokenizer};
pub use types::{ConfigKey, DepthPercent, PairKey, PairValue, PoolIndex, SplitName, TokenCount};
