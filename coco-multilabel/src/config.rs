//! Dataset configuration format.

use crate::common::*;

pub use dataset::*;
pub use preprocessor::*;

/// The main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub preprocessor: PreprocessorConfig,
    #[serde(default)]
    pub stream: StreamConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

mod dataset {
    use super::*;

    /// Dataset options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct DatasetConfig {
        /// The dataset split to load.
        pub split: Split,
        /// The kind of samples to produce.
        pub mode: Mode,
        /// The directory containing `train2014` and `val2014` image directories.
        pub image_dir: PathBuf,
        /// The JSON index file. It defaults to the split's index file in the
        /// working directory.
        pub index_file: Option<PathBuf>,
        /// If set, order label sequences from the most to the least frequent category.
        #[serde(default)]
        pub sort_by_freq: bool,
        /// Overrides the maximum number of labels per image plus two.
        pub max_length: Option<NonZeroUsize>,
    }

    impl DatasetConfig {
        pub fn index_file(&self) -> PathBuf {
            self.index_file
                .clone()
                .unwrap_or_else(|| PathBuf::from(self.split.default_index_file()))
        }

        pub fn split_image_dir(&self) -> PathBuf {
            self.image_dir.join(self.split.image_subdir())
        }

        pub fn max_length(&self) -> usize {
            self.max_length
                .map(NonZeroUsize::get)
                .unwrap_or_else(|| self.split.default_max_length())
        }
    }

    /// The dataset split.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Split {
        Train,
        Val,
    }

    impl Split {
        pub fn default_index_file(&self) -> &'static str {
            match self {
                Self::Train => "coco_train.json",
                Self::Val => "coco_val.json",
            }
        }

        pub fn image_subdir(&self) -> &'static str {
            match self {
                Self::Train => "train2014",
                Self::Val => "val2014",
            }
        }

        /// The highest number of labels of one image in the split plus the
        /// `<start>` and `<end>` tokens.
        pub fn default_max_length(&self) -> usize {
            match self {
                Self::Train => 18 + 2,
                Self::Val => 15 + 2,
            }
        }

        pub fn is_train(&self) -> bool {
            matches!(self, Self::Train)
        }
    }

    /// The kind of produced samples.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Mode {
        /// Image and multi-hot vector.
        Classification,
        /// Image, label sequence, label count and multi-hot vector.
        Sequential,
    }
}

mod preprocessor {
    use super::*;

    /// Image preprocessing options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct PreprocessorConfig {
        /// The output image height and width in pixels.
        #[serde(default = "default_image_size")]
        pub image_size: NonZeroUsize,
        /// Augmentation options applied to the training split.
        #[serde(default)]
        pub augmentation: AugmentationConfig,
        /// The device where the output tensors are placed.
        #[serde(with = "tch_serde::serde_device", default = "default_device")]
        pub device: Device,
    }

    impl Default for PreprocessorConfig {
        fn default() -> Self {
            Self {
                image_size: default_image_size(),
                augmentation: AugmentationConfig::default(),
                device: default_device(),
            }
        }
    }

    /// Training augmentation options.
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(default)]
    pub struct AugmentationConfig {
        pub enabled: bool,
        /// The maximum translation in ratio of image width and height.
        pub translation: R64,
        /// The maximum contrast change. The contrast factor is sampled from
        /// `[1 - contrast, 1 + contrast]`.
        pub contrast: R64,
        /// The probability to apply horizontal flip.
        pub horizontal_flip_prob: R64,
    }

    impl Default for AugmentationConfig {
        fn default() -> Self {
            Self {
                enabled: true,
                translation: r64(0.03),
                contrast: r64(0.25),
                horizontal_flip_prob: r64(0.5),
            }
        }
    }

    fn default_image_size() -> NonZeroUsize {
        NonZeroUsize::new(288).unwrap()
    }

    fn default_device() -> Device {
        Device::Cpu
    }
}

/// Record enumeration options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// If set, records are visited in random order.
    pub shuffle: bool,
    /// The random seed for shuffling. It is drawn from entropy if not set.
    pub seed: Option<u64>,
    /// If set, records that fail to load are logged and skipped.
    pub skip_failed: bool,
}
