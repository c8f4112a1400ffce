use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::GeneratorError;
use crate::pairs::KeyValuePair;

/// Serialization applied to a pair prefix to build the context blob.
///
/// The set is closed: parsing an unrecognized tag fails at the string
/// boundary with [`GeneratorError::UnsupportedFormat`], and everything past
/// that boundary matches exhaustively.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ContextFormat {
    /// One JSON object mapping every key to its value, in pool order.
    Json,
    /// `key,value` per line.
    Csv,
    /// `key<TAB>value` per line.
    Tsv,
    /// `key => value` per line.
    Text,
}

impl ContextFormat {
    /// Canonical iteration order over all formats.
    pub const ALL: [ContextFormat; 4] = [Self::Json, Self::Csv, Self::Tsv, Self::Text];

    /// Canonical lowercase tag for this format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Tsv => "tsv",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for ContextFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextFormat {
    type Err = GeneratorError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "text" => Ok(Self::Text),
            other => Err(GeneratorError::UnsupportedFormat {
                tag: other.to_string(),
            }),
        }
    }
}

/// Render `pairs` into one context string in the requested format.
///
/// Pure: the output depends only on the pair sequence and the format. JSON
/// output is a single compact object whose member order is pair order.
pub fn render_context(pairs: &[KeyValuePair], format: ContextFormat) -> String {
    match format {
        ContextFormat::Json => {
            let mut object = serde_json::Map::with_capacity(pairs.len());
            for pair in pairs {
                object.insert(
                    pair.key.clone(),
                    serde_json::Value::String(pair.value.clone()),
                );
            }
            serde_json::Value::Object(object).to_string()
        }
        ContextFormat::Csv => join_lines(pairs, |pair| format!("{},{}", pair.key, pair.value)),
        ContextFormat::Tsv => join_lines(pairs, |pair| format!("{}\t{}", pair.key, pair.value)),
        ContextFormat::Text => {
            join_lines(pairs, |pair| format!("{} => {}", pair.key, pair.value))
        }
    }
}

fn join_lines(pairs: &[KeyValuePair], line: impl Fn(&KeyValuePair) -> String) -> String {
    pairs.iter().map(line).collect::<Vec<_>>().join("\n")
}
