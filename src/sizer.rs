use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::sizer::{DEFAULT_SIZE_GUESS, HINT_STATE_VERSION};
use crate::errors::GeneratorError;
use crate::format::{ContextFormat, render_context};
use crate::pairs::PairPool;
use crate::tokenizer::Tokenizer;
use crate::types::TokenCount;

/// Outcome of one sizing search.
#[derive(Clone, Debug)]
pub struct SizedContext {
    /// Number of pool pairs included in the context.
    pub num_pairs: usize,
    /// Rendered context string over `pool[0..num_pairs]`.
    pub context: String,
    /// Measured token count of `context`.
    pub token_count: TokenCount,
}

/// Caller-owned cache of `(target token count -> minimal pair count)` hints.
///
/// Consulted to seed the sizing search's initial guess; never required for
/// correctness, only for skipping most of the exponential phase when a nearby
/// target was sized before. Entries are kept per format; the tokenizer
/// identity guards the cache as a whole, so hints from a different tokenizer
/// are discarded on load rather than poisoning guesses.
#[derive(Debug, Clone)]
pub struct SizeHintCache {
    tokenizer_identity: String,
    hints: BTreeMap<(ContextFormat, TokenCount), usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSizeHints {
    version: u32,
    tokenizer: String,
    hints: Vec<PersistedHint>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedHint {
    format: ContextFormat,
    target: TokenCount,
    pairs: usize,
}

impl SizeHintCache {
    /// Empty cache bound to `tokenizer_identity`.
    pub fn new(tokenizer_identity: impl Into<String>) -> Self {
        Self {
            tokenizer_identity: tokenizer_identity.into(),
            hints: BTreeMap::new(),
        }
    }

    /// Load persisted hints from `path`.
    ///
    /// A missing file starts empty. An unreadable payload, schema mismatch,
    /// or foreign tokenizer identity is logged and starts empty as well;
    /// the cache is disposable state, never worth failing a run over.
    pub fn load(path: &Path, tokenizer_identity: impl Into<String>) -> Result<Self, GeneratorError> {
        let identity = tokenizer_identity.into();
        if !path.exists() {
            return Ok(Self::new(identity));
        }
        let raw = fs::read_to_string(path)?;
        let persisted: PersistedSizeHints = match serde_json::from_str(&raw) {
            Ok(persisted) => persisted,
            Err(err) => {
                warn!(
                    "[haystacks:sizer] unreadable size-hint state {}: {err}; starting empty",
                    path.display()
                );
                return Ok(Self::new(identity));
            }
        };
        if persisted.version != HINT_STATE_VERSION || persisted.tokenizer != identity {
            warn!(
                "[haystacks:sizer] size-hint state mismatch at {} (version {}, tokenizer '{}'); starting empty",
                path.display(),
                persisted.version,
                persisted.tokenizer
            );
            return Ok(Self::new(identity));
        }
        let mut cache = Self::new(identity);
        for hint in persisted.hints {
            cache.record(hint.format, hint.target, hint.pairs);
        }
        Ok(cache)
    }

    /// Persist hints to `path` atomically (temp file, then rename).
    pub fn save(&self, path: &Path) -> Result<(), GeneratorError> {
        let persisted = PersistedSizeHints {
            version: HINT_STATE_VERSION,
            tokenizer: self.tokenizer_identity.clone(),
            hints: self
                .hints
                .iter()
                .map(|(&(format, target), &pairs)| PersistedHint {
                    format,
                    target,
                    pairs,
                })
                .collect(),
        };
        let raw = serde_json::to_vec_pretty(&persisted).map_err(io::Error::other)?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, raw)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Identity of the tokenizer these hints were measured with.
    pub fn tokenizer_identity(&self) -> &str {
        &self.tokenizer_identity
    }

    /// Number of stored hints.
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    /// Whether the cache holds no hints.
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    /// Best starting guess for `target` under `format`: the nearest cached
    /// target at or below `target`, scaled by `target / cached_target`.
    pub fn initial_guess(&self, format: ContextFormat, target: TokenCount) -> Option<usize> {
        let (&(_, cached_target), &cached_pairs) = self
            .hints
            .range((format, 0)..=(format, target))
            .next_back()?;
        let scaled = (cached_pairs as f64 * target as f64 / cached_target as f64).ceil() as usize;
        Some(scaled.max(1))
    }

    /// Record the minimal pair count observed for `target` under `format`.
    /// An existing entry is only ever replaced by a smaller observation.
    pub fn record(&mut self, format: ContextFormat, target: TokenCount, pairs: usize) {
        if target == 0 || pairs == 0 {
            return;
        }
        let entry = self.hints.entry((format, target)).or_insert(pairs);
        if pairs < *entry {
            *entry = pairs;
        }
    }
}

/// Grow `pool` and find the smallest prefix whose rendering reaches
/// `target_tokens`, subject to a `min_pairs` floor.
///
/// The search doubles a cache-seeded guess until the rendering overshoots
/// the target, then binary-searches the minimal satisfying prefix length, so
/// tokenizer invocations stay logarithmic in the final pair count. The floor
/// is applied after the search: the result is
/// `max(minimal satisfying length, min_pairs)`.
///
/// The token-sufficient minimal length (pre-floor) is recorded in `hints`.
pub fn size_to_target<T: Tokenizer + ?Sized>(
    pool: &mut PairPool,
    tokenizer: &T,
    format: ContextFormat,
    target_tokens: TokenCount,
    min_pairs: usize,
    hints: &mut SizeHintCache,
) -> Result<SizedContext, GeneratorError> {
    let guess = hints
        .initial_guess(format, target_tokens)
        .unwrap_or(DEFAULT_SIZE_GUESS);
    let mut high = guess.max(min_pairs).max(1);
    let mut low = 0_usize;
    let mut probes = 1_usize;
    let mut high_tokens = measure(pool, tokenizer, format, high)?;
    while high_tokens < target_tokens {
        low = high;
        high = high.saturating_mul(2);
        if high == low {
            return Err(GeneratorError::Configuration(format!(
                "context of {target_tokens} tokens is unreachable: pool growth saturated at {high} pairs"
            )));
        }
        high_tokens = measure(pool, tokenizer, format, high)?;
        probes += 1;
    }
    // Minimal satisfying length lies in (low, high].
    while high - low > 1 {
        let mid = low + (high - low) / 2;
        let mid_tokens = measure(pool, tokenizer, format, mid)?;
        probes += 1;
        if mid_tokens >= target_tokens {
            high = mid;
        } else {
            low = mid;
        }
    }
    hints.record(format, target_tokens, high);

    let num_pairs = high.max(min_pairs);
    pool.ensure_len(num_pairs);
    let context = render_context(&pool.pairs()[..num_pairs], format);
    let token_count = tokenizer.token_count(&context)?;
    debug!(
        "[haystacks:sizer] target={target_tokens} format={format} pairs={num_pairs} tokens={token_count} probes={probes}"
    );
    Ok(SizedContext {
        num_pairs,
        context,
        token_count,
    })
}

fn measure<T: Tokenizer + ?Sized>(
    pool: &mut PairPool,
    tokenizer: &T,
    format: ContextFormat,
    len: usize,
) -> Result<TokenCount, GeneratorError> {
    pool.ensure_len(len);
    let rendered = render_context(&pool.pairs()[..len], format);
    tokenizer.token_count(&rendered)
}
