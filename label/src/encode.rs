//! Conversions from per-image category lists to training targets.

use crate::{
    common::*,
    error::LabelError,
    vocab::{SpecialToken, Vocabulary, NUM_CLASSES, VOCABULARY},
};

/// The targets of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedLabels {
    /// Sequential token indices framed by `<start>` and `<end>` and padded with `<pad>`.
    pub sequence: Vec<i64>,
    /// The number of categories plus the `<start>` and `<end>` tokens.
    pub label_number: usize,
    /// Multi-hot vector indexed by classification index.
    pub multi_hot: Vec<f32>,
}

/// Builds label sequences with a fixed padding length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelEncoder {
    max_length: usize,
    sort_by_freq: bool,
}

impl LabelEncoder {
    /// Create an encoder.
    ///
    /// * `max_length` - The maximum number of categories per image plus two.
    ///   Sequences are padded up to `max_length + 1` tokens.
    /// * `sort_by_freq` - Order categories from the most to the least frequent.
    pub fn new(max_length: usize, sort_by_freq: bool) -> Self {
        Self {
            max_length,
            sort_by_freq,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn sort_by_freq(&self) -> bool {
        self.sort_by_freq
    }

    /// The sequence length of images that do not exceed `max_length`.
    pub fn padded_len(&self) -> usize {
        self.max_length + 1
    }

    /// The largest number of categories that fits in [LabelEncoder::padded_len] tokens.
    pub fn max_labels(&self) -> usize {
        self.max_length.saturating_sub(1)
    }

    pub fn encode<S>(&self, categories: &[S]) -> Result<EncodedLabels, LabelError>
    where
        S: AsRef<str>,
    {
        Ok(EncodedLabels {
            sequence: self.sequence(categories)?,
            label_number: categories.len() + 2,
            multi_hot: multi_hot(categories)?,
        })
    }

    pub fn sequence<S>(&self, categories: &[S]) -> Result<Vec<i64>, LabelError>
    where
        S: AsRef<str>,
    {
        let num_labels = categories.len();
        let mut body: Vec<(usize, i64)> = categories
            .iter()
            .map(|name| -> Result<_, LabelError> {
                let name = name.as_ref();
                let weight = VOCABULARY.frequency_weight(name)?;
                let index = VOCABULARY.sequential_index(name)?;
                Ok((weight, index))
            })
            .try_collect()?;

        if self.sort_by_freq {
            // descending on (weight, index), so equal weights keep the larger index first
            body.sort_by_key(|&pair| Reverse(pair));
        }

        let num_pads = self.max_length.saturating_sub(num_labels + 1);
        if num_labels > self.max_labels() {
            warn!(
                "{} labels exceed the maximum length {}, the sequence is not padded",
                num_labels, self.max_length
            );
        }

        let sequence: Vec<i64> = iter::once(SpecialToken::Start.index())
            .chain(body.into_iter().map(|(_weight, index)| index))
            .chain(iter::once(SpecialToken::End.index()))
            .chain(iter::repeat(SpecialToken::Pad.index()).take(num_pads))
            .collect();

        Ok(sequence)
    }
}

/// Encode categories into a multi-hot vector of length [NUM_CLASSES].
pub fn multi_hot<S>(categories: &[S]) -> Result<Vec<f32>, LabelError>
where
    S: AsRef<str>,
{
    let mut vector = vec![0f32; NUM_CLASSES];
    categories.iter().try_for_each(|name| -> Result<_, LabelError> {
        let index = VOCABULARY.classification_index(name.as_ref())?;
        vector[index] = 1.0;
        Ok(())
    })?;
    Ok(vector)
}

/// Map a token sequence back to category names.
///
/// `<start>` and `<pad>` tokens are skipped and decoding stops at the first `<end>`.
pub fn decode(sequence: &[i64]) -> Result<Vec<&'static str>, LabelError> {
    let vocab: &'static Vocabulary = &VOCABULARY;
    let start = SpecialToken::Start.index();
    let end = SpecialToken::End.index();
    let pad = SpecialToken::Pad.index();

    sequence
        .iter()
        .copied()
        .take_while(|&index| index != end)
        .filter(|&index| index != start && index != pad)
        .map(|index| vocab.token_name(index))
        .try_collect()
}
