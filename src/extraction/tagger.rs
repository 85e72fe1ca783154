//! Tagger adapter — turns raw text into word-level `(word, label)` pairs.
//!
//! The token-classification model runs out of process. [`HttpTagger`] talks
//! to an inference server that returns one prediction per sub-word piece;
//! [`align_word_pieces`] folds those back into whole words the same way the
//! model was trained: the first piece of a word carries its label.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::labels::Label;
use super::reducer::TaggedWord;
use crate::error::ModelError;

/// Boundary and padding markers that never reach the reducer.
const SPECIAL_TOKENS: &[&str] = &["[CLS]", "[SEP]", "[PAD]"];

/// Prefix marking a sub-word continuation piece.
const CONTINUATION_PREFIX: &str = "##";

/// Word-level sequence labeller.
#[async_trait]
pub trait Tagger: Send + Sync {
    /// Tag `text`. Long inputs are truncated to the model window, not rejected.
    async fn tag(&self, text: &str) -> Result<Vec<TaggedWord>, ModelError>;
}

/// One sub-word prediction as returned by the inference server.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPrediction {
    /// Tag name or generic class name.
    #[serde(alias = "entity_group", alias = "label")]
    pub entity: String,
    /// Sub-word text, `##`-prefixed for continuation pieces.
    #[serde(alias = "token")]
    pub word: String,
    /// Position in the tokenized sequence, if the server reports it.
    #[serde(default)]
    pub index: Option<usize>,
}

impl TokenPrediction {
    pub fn new(word: impl Into<String>, entity: impl Into<String>, index: Option<usize>) -> Self {
        Self {
            entity: entity.into(),
            word: word.into(),
            index,
        }
    }
}

/// Fold sub-word predictions into tagged words.
///
/// `max_tokens` is the model window including `[CLS]` and `[SEP]`, so at most
/// `max_tokens - 2` pieces are considered. A `##` piece whose head piece is
/// missing from the response (servers may drop `O` pieces) is discarded.
pub fn align_word_pieces(
    pieces: &[TokenPrediction],
    max_tokens: usize,
) -> Result<Vec<TaggedWord>, ModelError> {
    let window = max_tokens.saturating_sub(2);
    let mut words: Vec<TaggedWord> = Vec::new();
    // Index of the last piece that was attached to `words`.
    let mut last_index: Option<usize> = None;
    let mut head_present = false;

    for (position, piece) in pieces
        .iter()
        .filter(|p| !SPECIAL_TOKENS.contains(&p.word.as_str()))
        .take(window)
        .enumerate()
    {
        let index = piece.index.unwrap_or(position + 1);

        if let Some(rest) = piece.word.strip_prefix(CONTINUATION_PREFIX) {
            let adjacent = last_index.is_some_and(|last| last + 1 == index);
            if head_present && adjacent {
                if let Some(word) = words.last_mut() {
                    word.word.push_str(rest);
                }
                last_index = Some(index);
            } else {
                head_present = false;
            }
            continue;
        }

        let label: Label = piece.entity.parse()?;
        words.push(TaggedWord::new(piece.word.clone(), label));
        last_index = Some(index);
        head_present = true;
    }

    Ok(words)
}

/// Client for a HuggingFace-style token-classification endpoint.
pub struct HttpTagger {
    url: String,
    max_tokens: usize,
    client: reqwest::Client,
}

impl HttpTagger {
    pub fn new(url: impl Into<String>, max_tokens: usize, timeout: Duration) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ModelError::RequestFailed(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            url: url.into(),
            max_tokens,
            client,
        })
    }
}

#[async_trait]
impl Tagger for HttpTagger {
    async fn tag(&self, text: &str) -> Result<Vec<TaggedWord>, ModelError> {
        let body = serde_json::json!({
            "inputs": text,
            "parameters": { "aggregation_strategy": "none" },
        });

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::RequestFailed(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(ModelError::RequestFailed(format!("{status}: {detail}")));
        }

        let pieces: Vec<TokenPrediction> = resp
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let words = align_word_pieces(&pieces, self.max_tokens)?;
        debug!(pieces = pieces.len(), words = words.len(), "Tagged text");
        Ok(words)
    }
}
