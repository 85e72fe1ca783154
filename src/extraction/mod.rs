//! Enquiry field extraction.
//!
//! Raw text flows through:
//! 1. `Tagger::tag()` — word-level labels from the external model
//! 2. `reducer::reduce()` — labels folded into named fields
//! 3. `transport::override_mode()` — keyword correction of the transport mode
//!
//! A failing or slow tagger never aborts extraction; the message simply gets
//! empty fields (the keyword override still applies).

pub mod labels;
pub mod reducer;
pub mod tagger;
pub mod transport;

pub use labels::Label;
pub use reducer::{ExtractedFields, TaggedWord, reduce, reduce_aligned, reduce_tagged};
pub use tagger::{HttpTagger, Tagger, TokenPrediction, align_word_pieces};
pub use transport::override_mode;

use std::time::Duration;

use tracing::warn;

use crate::error::ModelError;

/// Run the full extraction chain on one message body.
///
/// The returned fields are trimmed and carry the final transport mode.
pub async fn extract_fields(tagger: &dyn Tagger, text: &str, timeout: Duration) -> ExtractedFields {
    let tagged = match tokio::time::timeout(timeout, tagger.tag(text)).await {
        Ok(result) => result,
        Err(_) => Err(ModelError::Timeout(timeout)),
    };

    let mut fields = match tagged {
        Ok(words) => reduce_tagged(&words),
        Err(e) => {
            warn!(error = %e, "Tagger failed; using empty fields");
            ExtractedFields::default()
        }
    };

    fields.mode_of_transport = override_mode(text, &fields.mode_of_transport);
    fields.trimmed()
}
