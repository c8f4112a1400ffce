use std::io;

use thiserror::Error;

/// Error type for generation, sizing, export, and persistence failures.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("unsupported context format '{tag}' (expected one of: json, csv, tsv, text)")]
    UnsupportedFormat { tag: String },
    #[error(
        "pool of {pool_size} pairs cannot fit {required} disjoint indices \
         ({num_groups} groups of {group_size})"
    )]
    InsufficientPoolSize {
        pool_size: usize,
        required: usize,
        num_groups: usize,
        group_size: usize,
    },
    #[error("sized context holds {reached} pairs, below the required floor of {required}")]
    InsufficientPairs { required: usize, reached: usize },
    #[error("tokenizer '{identity}' failed: {reason}")]
    Tokenizer { identity: String, reason: String },
    #[error("export failure for split '{split}': {reason}")]
    Export { split: String, reason: String },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GeneratorError {
    /// Whether this failure is confined to one `(context size, query count)`
    /// combination. Task-fatal errors skip that combination in a batch run;
    /// anything else (tokenizer, I/O, export) aborts the whole run.
    pub fn is_task_fatal(&self) -> bool {
        matches!(
            self,
            GeneratorError::InsufficientPoolSize { .. }
                | GeneratorError::InsufficientPairs { .. }
                | GeneratorError::Configuration(_)
        )
    }
}
