/// Fill outcome for one depth bucket after sampling.
#[derive(Clone, Debug, PartialEq)]
pub struct BucketFill {
    pub bucket: usize,
    pub lower: f64,
    pub upper: f64,
    pub collected: usize,
    pub quota: usize,
    pub attempts: usize,
}

impl BucketFill {
    /// Whether the bucket gave up before reaching its quota.
    pub fn is_underfilled(&self) -> bool {
        self.collected < self.quota
    }
}

/// Per-bucket fill accounting for one sampling run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FillReport {
    pub buckets: Vec<BucketFill>,
}

impl FillReport {
    /// Total records collected across all buckets.
    pub fn total_collected(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.collected).sum()
    }

    /// Buckets that stopped short of their quota.
    pub fn underfilled(&self) -> Vec<&BucketFill> {
        self.buckets
            .iter()
            .filter(|bucket| bucket.is_underfilled())
            .collect()
    }
}
