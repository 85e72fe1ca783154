//! Label reducer — folds word-level tags into named enquiry fields.
//!
//! Pure string work, single left-to-right pass. The input is already
//! word-aligned: no `##` pieces and no `[CLS]`/`[SEP]`/`[PAD]` markers.

use super::labels::Label;

/// Destination-port words the tagger is known to mislabel.
const DESTINATION_STOPWORDS: &[&str] = &["door", "sea"];

/// One word and the tag the model assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedWord {
    pub word: String,
    pub label: Label,
}

impl TaggedWord {
    pub fn new(word: impl Into<String>, label: Label) -> Self {
        Self {
            word: word.into(),
            label,
        }
    }
}

/// Business fields extracted from one email.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub mode_of_transport: String,
    pub container_status: String,
    pub port_of_loading: String,
    pub port_of_destination: String,
    pub weight: String,
    pub weight_unit: String,
    pub quantity: String,
    pub package_type: String,
    pub cargo_type: String,
    pub size: String,
}

impl ExtractedFields {
    /// Strip the separators the reducer leaves behind.
    pub fn trimmed(self) -> Self {
        fn t(s: String) -> String {
            s.trim().to_string()
        }
        Self {
            mode_of_transport: t(self.mode_of_transport),
            container_status: t(self.container_status),
            port_of_loading: t(self.port_of_loading),
            port_of_destination: t(self.port_of_destination),
            weight: t(self.weight),
            weight_unit: t(self.weight_unit),
            quantity: t(self.quantity),
            package_type: t(self.package_type),
            cargo_type: t(self.cargo_type),
            size: t(self.size),
        }
    }

    /// True when no field captured anything.
    pub fn is_empty(&self) -> bool {
        [
            &self.mode_of_transport,
            &self.container_status,
            &self.port_of_loading,
            &self.port_of_destination,
            &self.weight,
            &self.weight_unit,
            &self.quantity,
            &self.package_type,
            &self.cargo_type,
            &self.size,
        ]
        .iter()
        .all(|s| s.is_empty())
    }
}

/// Reduce tagged words into fields.
///
/// Accumulating fields keep a trailing space after every word; weight
/// pieces are concatenated without a separator. Nothing is trimmed here.
pub fn reduce<'a, I>(tokens: I) -> ExtractedFields
where
    I: IntoIterator<Item = (&'a str, Label)>,
{
    let mut fields = ExtractedFields::default();

    for (word, label) in tokens {
        match label {
            // Port start tags are discarded; only the inside tokens carry text.
            Label::Outside | Label::LoadingPortStart | Label::DestinationPortStart => {}
            Label::ModeOfTransport => fields.mode_of_transport = word.to_string(),
            Label::ContainerStatus => push_word(&mut fields.container_status, word),
            Label::DestinationPortInside => {
                if !is_destination_stopword(word) {
                    push_word(&mut fields.port_of_destination, word);
                }
            }
            Label::LoadingPortInside => push_word(&mut fields.port_of_loading, word),
            Label::Weight => fields.weight.push_str(word),
            Label::WeightUnit => push_word(&mut fields.weight_unit, word),
            Label::Quantity => push_word(&mut fields.quantity, word),
            Label::Package => push_word(&mut fields.package_type, word),
            Label::CargoType => push_word(&mut fields.cargo_type, word),
            Label::Size => push_word(&mut fields.size, word),
        }
    }

    fields
}

/// Reduce a slice of [`TaggedWord`]s.
pub fn reduce_tagged(tokens: &[TaggedWord]) -> ExtractedFields {
    reduce(tokens.iter().map(|t| (t.word.as_str(), t.label)))
}

/// Reduce parallel word and label slices, stopping at the shorter one.
pub fn reduce_aligned(words: &[&str], labels: &[Label]) -> ExtractedFields {
    reduce(words.iter().copied().zip(labels.iter().copied()))
}

fn push_word(field: &mut String, word: &str) {
    field.push_str(word);
    field.push(' ');
}

fn is_destination_stopword(word: &str) -> bool {
    DESTINATION_STOPWORDS
        .iter()
        .any(|stop| word.eq_ignore_ascii_case(stop))
}
