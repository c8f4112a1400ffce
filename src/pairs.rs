use std::collections::HashSet;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Builder;

use crate::rng::DeterministicRng;
use crate::types::{DepthPercent, PairKey, PairValue, PoolIndex};

/// One generated key/value pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    /// Lookup key embedded in the context.
    pub key: PairKey,
    /// Value the model must recall for `key`.
    pub value: PairValue,
}

/// Append-only pool of unique key/value pairs.
///
/// Keys and values share one uniqueness namespace: no string is emitted twice
/// within a pool, whether as a key or as a value. Growth only appends, so an
/// index handed out once keeps pointing at the same pair for the lifetime of
/// the pool.
#[derive(Debug, Clone)]
pub struct PairPool {
    pairs: Vec<KeyValuePair>,
    seen: HashSet<String>,
    rng: DeterministicRng,
}

impl PairPool {
    /// Create an empty pool whose pair stream derives from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            pairs: Vec::new(),
            seen: HashSet::new(),
            rng: DeterministicRng::new(seed),
        }
    }

    /// Number of pairs generated so far.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether the pool holds no pairs yet.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All pairs generated so far, in generation order.
    pub fn pairs(&self) -> &[KeyValuePair] {
        &self.pairs
    }

    /// Pair at `index`, if generated.
    pub fn get(&self, index: PoolIndex) -> Option<&KeyValuePair> {
        self.pairs.get(index)
    }

    /// Grow the pool until it holds at least `target_len` pairs.
    ///
    /// Duplicate draws are resolved by resampling and are not observable to
    /// callers; the pool content at any length is a pure function of the
    /// seed, independent of how growth calls were batched.
    pub fn ensure_len(&mut self, target_len: usize) {
        while self.pairs.len() < target_len {
            let key = self.next_unique_string();
            let value = self.next_unique_string();
            self.pairs.push(KeyValuePair { key, value });
        }
    }

    fn next_unique_string(&mut self) -> String {
        loop {
            let mut bytes = [0_u8; 16];
            self.rng.fill_bytes(&mut bytes);
            let rendered = Builder::from_random_bytes(bytes).into_uuid().to_string();
            if self.seen.insert(rendered.clone()) {
                return rendered;
            }
        }
    }
}

/// Percentage position of `index` within a pool of `pool_len` pairs.
///
/// `((index + 1) / pool_len) * 100`, in `(0.0, 100.0]`; the final index maps
/// to exactly 100.
pub fn depth_percent(index: PoolIndex, pool_len: usize) -> DepthPercent {
    ((index + 1) as f64 / pool_len as f64) * 100.0
}
