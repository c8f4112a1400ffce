use crate::errors::GeneratorError;
use crate::hash::stable_hash_str;
use crate::types::TokenCount;

/// Token-counting boundary used by the context sizer.
///
/// Only the length of the `encode` output is ever consumed; token ids
/// themselves are opaque. Implementations must be deterministic for a fixed
/// input and identity, since persisted size hints are keyed on the identity.
pub trait Tokenizer {
    /// Encode `text` into token ids.
    fn encode(&self, text: &str) -> Result<Vec<u32>, GeneratorError>;

    /// Number of tokens `text` encodes to.
    fn token_count(&self, text: &str) -> Result<TokenCount, GeneratorError> {
        Ok(self.encode(text)?.len())
    }

    /// Stable identity string (model id or scheme name). Guards persisted
    /// size hints against tokenizer swaps between runs.
    fn identity(&self) -> String;
}

/// Character-window token estimator.
///
/// Counts `ceil(chars / chars_per_token)` tokens, so the count is strictly
/// monotone in input length, which the sizing search relies on. `exact()`
/// (one char per token) gives tests integer-precise targets; wider windows
/// roughly approximate subword tokenizers. Real benchmarks should enable the
/// `huggingface` feature instead.
#[derive(Debug, Clone)]
pub struct CharWindowTokenizer {
    chars_per_token: usize,
}

impl CharWindowTokenizer {
    /// Create an estimator with the given window width in characters.
    pub fn new(chars_per_token: usize) -> Result<Self, GeneratorError> {
        if chars_per_token == 0 {
            return Err(GeneratorError::Configuration(
                "chars_per_token must be positive".to_string(),
            ));
        }
        Ok(Self { chars_per_token })
    }

    /// Estimator counting every character as one token.
    pub fn exact() -> Self {
        Self { chars_per_token: 1 }
    }
}

impl Default for CharWindowTokenizer {
    fn default() -> Self {
        Self { chars_per_token: 4 }
    }
}

impl Tokenizer for CharWindowTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, GeneratorError> {
        let chars: Vec<char> = text.chars().collect();
        let ids = chars
            .chunks(self.chars_per_token)
            .map(|window| {
                let window: String = window.iter().collect();
                stable_hash_str(self.chars_per_token as u64, &window) as u32
            })
            .collect();
        Ok(ids)
    }

    fn token_count(&self, text: &str) -> Result<TokenCount, GeneratorError> {
        Ok(text.chars().count().div_ceil(self.chars_per_token))
    }

    fn identity(&self) -> String {
        format!("char-window/{}", self.chars_per_token)
    }
}

#[cfg(feature = "huggingface")]
pub use huggingface::HuggingFaceTokenizer;

#[cfg(feature = "huggingface")]
mod huggingface {
    use std::path::Path;

    use tokenizers::tokenizer::Tokenizer as HfTokenizer;

    use super::Tokenizer;
    use crate::errors::GeneratorError;

    /// Real token counting backed by the HuggingFace `tokenizers` crate.
    ///
    /// Special tokens are included in counts, matching what evaluation
    /// harnesses see when they encode the full context.
    pub struct HuggingFaceTokenizer {
        inner: HfTokenizer,
        identity: String,
    }

    impl HuggingFaceTokenizer {
        /// Load a tokenizer from a local `tokenizer.json` file.
        pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GeneratorError> {
            let path = path.as_ref();
            let identity = path.display().to_string();
            let inner = HfTokenizer::from_file(path).map_err(|err| GeneratorError::Tokenizer {
                identity: identity.clone(),
                reason: format!("failed loading tokenizer file: {err}"),
            })?;
            Ok(Self { inner, identity })
        }

        /// Fetch `tokenizer.json` for `model_id` from the HuggingFace hub.
        pub fn from_pretrained(model_id: &str) -> Result<Self, GeneratorError> {
            let identity = model_id.to_string();
            let api = hf_hub::api::sync::ApiBuilder::new().build().map_err(|err| {
                GeneratorError::Tokenizer {
                    identity: identity.clone(),
                    reason: format!("failed building hf-hub client: {err}"),
                }
            })?;
            let tokenizer_path = api
                .model(model_id.to_string())
                .get("tokenizer.json")
                .map_err(|err| GeneratorError::Tokenizer {
                    identity: identity.clone(),
                    reason: format!("failed fetching tokenizer.json: {err}"),
                })?;
            let inner =
                HfTokenizer::from_file(&tokenizer_path).map_err(|err| GeneratorError::Tokenizer {
                    identity: identity.clone(),
                    reason: format!("failed loading fetched tokenizer: {err}"),
                })?;
            Ok(Self { inner, identity })
        }
    }

    impl Tokenizer for HuggingFaceTokenizer {
        fn encode(&self, text: &str) -> Result<Vec<u32>, GeneratorError> {
            let encoding =
                self.inner
                    .encode(text, true)
                    .map_err(|err| GeneratorError::Tokenizer {
                        identity: self.identity.clone(),
                        reason: format!("encode failed: {err}"),
                    })?;
            Ok(encoding.get_ids().to_vec())
        }

        fn identity(&self) -> String {
            self.identity.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_counts_characters() {
        let tokenizer = CharWindowTokenizer::exact();
        assert_eq!(tokenizer.token_count("").unwrap(), 0);
        assert_eq!(tokenizer.token_count("abc").unwrap(), 3);
        assert_eq!(tokenizer.encode("abc").unwrap().len(), 3);
    }

    #[test]
    fn window_width_rounds_up() {
        let tokenizer = CharWindowTokenizer::new(4).unwrap();
        assert_eq!(tokenizer.token_count("abcd").unwrap(), 1);
        assert_eq!(tokenizer.token_count("abcde").unwrap(), 2);
        assert_eq!(tokenizer.encode("abcde").unwrap().len(), 2);
    }

    #[test]
    fn token_count_matches_encode_length() {
        let tokenizer = CharWindowTokenizer::new(3).unwrap();
        for text in ["", "a", "key => value", "67e55044-10b1-426f-9247-bb680e5fe0c8"] {
            assert_eq!(
                tokenizer.token_count(text).unwrap(),
                tokenizer.encode(text).unwrap().len()
            );
        }
    }

    #[test]
    fn zero_width_window_is_rejected() {
        assert!(CharWindowTokenizer::new(0).is_err());
    }

    #[test]
    fn identity_names_the_window_width() {
        assert_eq!(CharWindowTokenizer::exact().identity(), "char-window/1");
        assert_eq!(CharWindowTokenizer::default().identity(), "char-window/4");
    }
}
