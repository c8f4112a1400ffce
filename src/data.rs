use serde::{Deserialize, Serialize};

use crate::types::DepthPercent;

/// One worked example shown before the real question: the keys of a
/// demonstration group and their values, pre-joined for prompting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demonstration {
    /// Comma-joined keys of one demonstration group.
    pub question: String,
    /// Comma-joined values, in the same order as `question`.
    pub answer: String,
}

/// A single benchmark record: one haystack plus the questions asked of it.
///
/// `first_depth` is the depth of the first-sampled query key and is the sole
/// input to bucket placement; `depth` is the mean over all query keys and is
/// reported for analysis only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    /// Rendered key-value context the answers must be extracted from.
    pub context: String,
    /// Worked examples preceding the query, in sampled order.
    pub demonstrations: Vec<Demonstration>,
    /// Comma-joined query keys.
    pub question: String,
    /// Comma-joined expected values, aligned with `question`.
    pub answer: String,
    /// Depth percentage of the first-sampled query key.
    pub first_depth: DepthPercent,
    /// Mean depth percentage over all query keys.
    pub depth: DepthPercent,
    /// Number of key-value pairs rendered into `context`.
    pub num_pairs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_flat_field_names() {
        let record = BenchmarkRecord {
            context: "{}".to_string(),
            demonstrations: vec![Demonstration {
                question: "a, b".to_string(),
                answer: "1, 2".to_string(),
            }],
            question: "c".to_string(),
            answer: "3".to_string(),
            first_depth: 25.0,
            depth: 40.0,
            num_pairs: 4,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["context"], "{}");
        assert_eq!(json["demonstrations"][0]["question"], "a, b");
        assert_eq!(json["first_depth"], 25.0);
        assert_eq!(json["depth"], 40.0);
        assert_eq!(json["num_pairs"], 4);

        let back: BenchmarkRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
