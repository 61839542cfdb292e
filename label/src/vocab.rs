//! The COCO category vocabulary.

use crate::{common::*, error::LabelError};

/// The number of object categories.
pub const NUM_CLASSES: usize = 80;

/// COCO category names in alphabetical order.
///
/// The position of a name is its classification index.
pub const CATEGORIES: [&str; NUM_CLASSES] = [
    "airplane",
    "apple",
    "backpack",
    "banana",
    "baseball bat",
    "baseball glove",
    "bear",
    "bed",
    "bench",
    "bicycle",
    "bird",
    "boat",
    "book",
    "bottle",
    "bowl",
    "broccoli",
    "bus",
    "cake",
    "car",
    "carrot",
    "cat",
    "cell phone",
    "chair",
    "clock",
    "couch",
    "cow",
    "cup",
    "dining table",
    "dog",
    "donut",
    "elephant",
    "fire hydrant",
    "fork",
    "frisbee",
    "giraffe",
    "hair drier",
    "handbag",
    "horse",
    "hot dog",
    "keyboard",
    "kite",
    "knife",
    "laptop",
    "microwave",
    "motorcycle",
    "mouse",
    "orange",
    "oven",
    "parking meter",
    "person",
    "pizza",
    "potted plant",
    "refrigerator",
    "remote",
    "sandwich",
    "scissors",
    "sheep",
    "sink",
    "skateboard",
    "skis",
    "snowboard",
    "spoon",
    "sports ball",
    "stop sign",
    "suitcase",
    "surfboard",
    "teddy bear",
    "tennis racket",
    "tie",
    "toaster",
    "toilet",
    "toothbrush",
    "traffic light",
    "train",
    "truck",
    "tv",
    "umbrella",
    "vase",
    "wine glass",
    "zebra",
];

/// COCO category names from the most to the least frequent in the training set.
pub const CATEGORIES_BY_FREQUENCY: [&str; NUM_CLASSES] = [
    "person",
    "chair",
    "car",
    "dining table",
    "cup",
    "bottle",
    "bowl",
    "handbag",
    "truck",
    "backpack",
    "bench",
    "book",
    "cell phone",
    "sink",
    "tv",
    "couch",
    "clock",
    "knife",
    "potted plant",
    "dog",
    "sports ball",
    "traffic light",
    "cat",
    "bus",
    "umbrella",
    "tie",
    "bed",
    "fork",
    "vase",
    "skateboard",
    "spoon",
    "laptop",
    "train",
    "motorcycle",
    "tennis racket",
    "surfboard",
    "toilet",
    "bicycle",
    "airplane",
    "bird",
    "skis",
    "pizza",
    "remote",
    "boat",
    "cake",
    "horse",
    "oven",
    "baseball glove",
    "baseball bat",
    "giraffe",
    "wine glass",
    "refrigerator",
    "sandwich",
    "suitcase",
    "kite",
    "banana",
    "elephant",
    "frisbee",
    "teddy bear",
    "keyboard",
    "cow",
    "broccoli",
    "zebra",
    "mouse",
    "orange",
    "stop sign",
    "fire hydrant",
    "carrot",
    "apple",
    "snowboard",
    "sheep",
    "microwave",
    "donut",
    "hot dog",
    "toothbrush",
    "scissors",
    "bear",
    "parking meter",
    "toaster",
    "hair drier",
];

/// The shared vocabulary instance.
pub static VOCABULARY: Lazy<Vocabulary> = Lazy::new(Vocabulary::new);

/// Tokens that frame a label sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialToken {
    End,
    Start,
    Pad,
}

impl SpecialToken {
    pub const ALL: [SpecialToken; 3] = [Self::End, Self::Start, Self::Pad];

    pub fn name(&self) -> &'static str {
        match self {
            Self::End => "<end>",
            Self::Start => "<start>",
            Self::Pad => "<pad>",
        }
    }

    /// The index in the sequential vocabulary, placed right after the categories.
    pub fn index(&self) -> i64 {
        let offset = match self {
            Self::End => 0,
            Self::Start => 1,
            Self::Pad => 2,
        };
        (NUM_CLASSES + offset) as i64
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|token| token.name() == name)
    }
}

impl fmt::Display for SpecialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup tables between category names, classification indices,
/// sequential token indices and frequency weights.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    classes: IndexSet<String>,
    frequency_weights: HashMap<&'static str, usize>,
}

impl Vocabulary {
    fn new() -> Self {
        let classes: IndexSet<String> = CATEGORIES.iter().map(|name| name.to_string()).collect();
        let frequency_weights: HashMap<_, _> = CATEGORIES_BY_FREQUENCY
            .iter()
            .enumerate()
            .map(|(rank, &name)| (name, NUM_CLASSES - rank))
            .collect();

        debug_assert_eq!(classes.len(), NUM_CLASSES);
        debug_assert_eq!(frequency_weights.len(), NUM_CLASSES);

        Self {
            classes,
            frequency_weights,
        }
    }

    /// The category names ordered by classification index.
    pub fn classes(&self) -> &IndexSet<String> {
        &self.classes
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// The number of categories plus the special tokens.
    pub fn sequential_vocab_size(&self) -> usize {
        self.classes.len() + SpecialToken::ALL.len()
    }

    pub fn classification_index(&self, name: &str) -> Result<usize, LabelError> {
        self.classes
            .get_index_of(name)
            .ok_or_else(|| LabelError::UnknownCategory(name.to_owned()))
    }

    /// Look up a category name or a special token name in the sequential vocabulary.
    pub fn sequential_index(&self, token: &str) -> Result<i64, LabelError> {
        match SpecialToken::from_name(token) {
            Some(special) => Ok(special.index()),
            None => Ok(self.classification_index(token)? as i64),
        }
    }

    /// Returns the frequency weight of a category, 80 for the most frequent
    /// category down to 1 for the least frequent one.
    pub fn frequency_weight(&self, name: &str) -> Result<usize, LabelError> {
        self.frequency_weights
            .get(name)
            .copied()
            .ok_or_else(|| LabelError::UnknownCategory(name.to_owned()))
    }

    /// The inverse of [Vocabulary::sequential_index].
    pub fn token_name(&self, index: i64) -> Result<&str, LabelError> {
        if let Some(special) = SpecialToken::ALL
            .into_iter()
            .find(|token| token.index() == index)
        {
            return Ok(special.name());
        }

        usize::try_from(index)
            .ok()
            .and_then(|index| self.classes.get_index(index))
            .map(|name| name.as_str())
            .ok_or(LabelError::InvalidToken(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools as _;

    #[test]
    fn categories_are_consistent() {
        let sorted: Vec<_> = CATEGORIES.iter().copied().sorted().collect();
        assert_eq!(sorted, CATEGORIES.to_vec());

        let by_freq: Vec<_> = CATEGORIES_BY_FREQUENCY.iter().copied().sorted().collect();
        assert_eq!(by_freq, CATEGORIES.to_vec());
    }

    #[test]
    fn classification_indices() -> Result<(), LabelError> {
        assert_eq!(VOCABULARY.num_classes(), 80);
        assert_eq!(VOCABULARY.classification_index("airplane")?, 0);
        assert_eq!(VOCABULARY.classification_index("person")?, 49);
        assert_eq!(VOCABULARY.classification_index("zebra")?, 79);
        assert_eq!(
            VOCABULARY.classification_index("unicorn"),
            Err(LabelError::UnknownCategory("unicorn".into()))
        );
        Ok(())
    }

    #[test]
    fn special_tokens() -> Result<(), LabelError> {
        assert_eq!(VOCABULARY.sequential_vocab_size(), 83);
        assert_eq!(VOCABULARY.sequential_index("<end>")?, 80);
        assert_eq!(VOCABULARY.sequential_index("<start>")?, 81);
        assert_eq!(VOCABULARY.sequential_index("<pad>")?, 82);
        assert_eq!(VOCABULARY.sequential_index("dog")?, 28);
        Ok(())
    }

    #[test]
    fn frequency_weights() -> Result<(), LabelError> {
        assert_eq!(VOCABULARY.frequency_weight("person")?, 80);
        assert_eq!(VOCABULARY.frequency_weight("chair")?, 79);
        assert_eq!(VOCABULARY.frequency_weight("hair drier")?, 1);
        assert!(VOCABULARY.frequency_weight("<start>").is_err());
        Ok(())
    }

    #[test]
    fn inverse_lookup() -> Result<(), LabelError> {
        (0..VOCABULARY.sequential_vocab_size() as i64).try_for_each(|index| {
            let name = VOCABULARY.token_name(index)?;
            assert_eq!(VOCABULARY.sequential_index(name)?, index);
            Ok(())
        })?;
        assert_eq!(VOCABULARY.token_name(83), Err(LabelError::InvalidToken(83)));
        assert_eq!(VOCABULARY.token_name(-1), Err(LabelError::InvalidToken(-1)));
        Ok(())
    }
}
