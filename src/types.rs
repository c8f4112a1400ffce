/// Zero-based position of a pair within its pool.
/// Example: `17`
pub type PoolIndex = usize;
/// Count of tokens a tokenizer produced for some text.
/// Example: `4096`
pub type TokenCount = usize;
/// Percentage position of a pair within its pool, in `(0.0, 100.0]`.
/// Example: `62.5`
pub type DepthPercent = f64;
/// Key string of a generated pair (canonical hyphenated UUID).
/// Example: `67e55044-10b1-426f-9247-bb680e5fe0c8`
pub type PairKey = String;
/// Value string of a generated pair (canonical hyphenated UUID).
/// Example: `91f0c2ad-55b1-4e0a-8f21-4c1d3a9be077`
pub type PairValue = String;
/// Key naming one generated `(context size, query count)` combination.
/// Example: `ctx_4096_num_q_2`
pub type ConfigKey = String;
/// Name of an exported dataset split (same shape as the configuration key).
/// Example: `ctx_8192_num_q_1`
pub type SplitName = String;
