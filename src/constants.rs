/// Constants used by default generation configuration.
pub mod defaults {
    /// Default RNG seed for generation runs.
    pub const DEFAULT_SEED: u64 = 42;
    /// Default number of demonstration groups per record.
    pub const DEFAULT_NUM_DEMOS: usize = 2;
    /// Default number of equal-width depth buckets over 0-100%.
    pub const DEFAULT_NUM_BUCKETS: usize = 10;
    /// Default number of records collected per depth bucket.
    pub const DEFAULT_EXAMPLES_PER_BUCKET: usize = 1;
}

/// Constants used by the adaptive context sizer and its hint cache.
pub mod sizer {
    /// Initial pair-count guess when the hint cache has no usable entry.
    pub const DEFAULT_SIZE_GUESS: usize = 500;
    /// Schema version for persisted size-hint files.
    pub const HINT_STATE_VERSION: u32 = 1;
}

/// Constants used by record composition and bucket sampling.
pub mod sampler {
    /// Attempts allowed per requested example before a bucket is abandoned.
    pub const ATTEMPTS_PER_EXAMPLE: usize = 100;
    /// Separator joining keys (and values) into question/answer strings.
    pub const QUERY_JOIN_SEPARATOR: &str = ", ";
    /// Offset mixed into pair-stream seed derivation.
    pub const PAIR_SEED_OFFSET: u64 = 0x9E37_5EED;
    /// Offset mixed into group-selection seed derivation.
    pub const GROUP_SEED_OFFSET: u64 = 0xD15C_5EED;
}

/// Constants used by export sinks.
pub mod export {
    /// File extension for exported record files (one JSON record per line).
    pub const SPLIT_FILE_EXTENSION: &str = "jsonl";
    /// Schema version for per-split manifest sidecars.
    pub const MANIFEST_VERSION: u32 = 1;
}
