use std::ops::Deref;

use crate::error::PipelineError;

/// The class names of the ASL alphabet, index 0 is `A`.
pub const CANONICAL_ALPHABET: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// The ordered class names of a model: label `i` names output `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSet(Vec<String>);

impl LabelSet {
    /// Returns the labels one per line, each line newline terminated.
    pub fn to_text(&self) -> String {
        self.0.iter().map(|label| format!("{label}\n")).collect()
    }
}

impl Deref for LabelSet {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Produces the `LabelSet` of a model out of an alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelWriter {
    alphabet: Vec<String>,
}

impl Default for LabelWriter {
    fn default() -> Self {
        Self {
            alphabet: CANONICAL_ALPHABET.chars().map(String::from).collect(),
        }
    }
}

impl LabelWriter {
    /// Creates a `LabelWriter` for the canonical A-Z alphabet.
    pub fn canonical() -> Self {
        Self::default()
    }

    /// Creates a `LabelWriter` where every `char` of `alphabet` is a label.
    ///
    /// # Returns
    /// An `InvalidConfig` error if the alphabet is empty, has whitespace or repeats a label.
    pub fn new(alphabet: &str) -> Result<Self, PipelineError> {
        let alphabet: Vec<String> = alphabet.chars().map(String::from).collect();

        if alphabet.is_empty() {
            return Err(PipelineError::InvalidConfig("the alphabet is empty".into()));
        }

        for (i, label) in alphabet.iter().enumerate() {
            if label.chars().any(char::is_whitespace) {
                return Err(PipelineError::InvalidConfig(format!(
                    "label {i} is whitespace"
                )));
            }

            if alphabet[..i].contains(label) {
                return Err(PipelineError::InvalidConfig(format!(
                    "label {label:?} appears more than once"
                )));
            }
        }

        Ok(Self { alphabet })
    }

    /// Returns the labels of a model with `num_classes` outputs.
    ///
    /// # Returns
    /// A `LabelCount` error if the alphabet does not have exactly `num_classes` labels.
    pub fn labels_for(&self, num_classes: usize) -> Result<LabelSet, PipelineError> {
        if self.alphabet.len() != num_classes {
            return Err(PipelineError::LabelCount {
                expected: num_classes,
                got: self.alphabet.len(),
            });
        }

        Ok(LabelSet(self.alphabet.clone()))
    }
}

/// Returns the canonical labels of a model with `num_classes` outputs.
pub fn labels_for(num_classes: usize) -> Result<LabelSet, PipelineError> {
    LabelWriter::canonical().labels_for(num_classes)
}
