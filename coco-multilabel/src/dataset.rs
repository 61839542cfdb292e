//! The COCO multi-label dataset.

use crate::{
    common::*,
    config::{Config, Mode, StreamConfig},
    index::CocoIndex,
    processor::{Preprocessor, PreprocessorInit},
};
use label::{EncodedLabels, LabelEncoder, VOCABULARY};

/// The generic dataset trait.
pub trait GenericDataset
where
    Self: Debug + Send,
{
    /// The number of color channels of the dataset.
    fn input_channels(&self) -> usize;

    /// The list of class names of the dataset.
    fn classes(&self) -> &IndexSet<String>;
}

/// The dataset that can be random accessed.
pub trait RandomAccessDataset
where
    Self: GenericDataset,
{
    /// Get number of records in the dataset.
    fn num_records(&self) -> usize;

    /// Get the nth record in the dataset.
    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<Sample>> + Send>>;
}

/// The dataset that can be enumerated through a stream.
pub trait StreamingDataset
where
    Self: GenericDataset,
{
    fn stream(&self) -> Result<Pin<Box<dyn Stream<Item = Result<Sample>> + Send>>>;
}

/// A processed image with its targets.
#[derive(Debug)]
pub enum Sample {
    Classification {
        /// `[3, image_size, image_size]` float image.
        image: Tensor,
        /// `[80]` float multi-hot vector.
        multi_hot: Tensor,
    },
    Sequential {
        /// `[3, image_size, image_size]` float image.
        image: Tensor,
        /// `[max_length + 1]` int64 token sequence, longer for images
        /// with more labels than `max_length - 1`.
        labels: Tensor,
        /// The number of labels including `<start>` and `<end>`.
        label_number: i64,
        /// `[80]` float multi-hot vector.
        multi_hot: Tensor,
    },
}

impl Sample {
    pub fn image(&self) -> &Tensor {
        match self {
            Self::Classification { image, .. } => image,
            Self::Sequential { image, .. } => image,
        }
    }

    pub fn multi_hot(&self) -> &Tensor {
        match self {
            Self::Classification { multi_hot, .. } => multi_hot,
            Self::Sequential { multi_hot, .. } => multi_hot,
        }
    }

    pub fn labels(&self) -> Option<&Tensor> {
        match self {
            Self::Classification { .. } => None,
            Self::Sequential { labels, .. } => Some(labels),
        }
    }

    pub fn label_number(&self) -> Option<i64> {
        match *self {
            Self::Classification { .. } => None,
            Self::Sequential { label_number, .. } => Some(label_number),
        }
    }
}

/// The dataset reading a JSON index and the image directory of one split.
#[derive(Debug, Clone)]
pub struct CocoMultiLabel {
    index: Arc<CocoIndex>,
    image_dir: Arc<Path>,
    preprocessor: Arc<Preprocessor>,
    encoder: LabelEncoder,
    mode: Mode,
    stream_config: StreamConfig,
}

impl CocoMultiLabel {
    pub async fn load(config: &Config) -> Result<Self> {
        let Config {
            dataset,
            preprocessor,
            stream,
        } = config;

        let index = CocoIndex::open(dataset.index_file()).await?;
        let augmentation = dataset
            .split
            .is_train()
            .then(|| preprocessor.augmentation.clone());
        let preprocessor = PreprocessorInit {
            image_size: preprocessor.image_size.get(),
            augmentation,
            device: Some(preprocessor.device),
        }
        .build()?;
        let encoder = LabelEncoder::new(dataset.max_length(), dataset.sort_by_freq);

        if dataset.sort_by_freq {
            info!("sorting by frequency");
        }
        info!(
            "loaded {} records from {:?} split",
            index.len(),
            dataset.split
        );

        Ok(Self::new(
            index,
            dataset.split_image_dir(),
            preprocessor,
            encoder,
            dataset.mode,
            stream.clone(),
        ))
    }

    pub fn new(
        index: CocoIndex,
        image_dir: impl AsRef<Path>,
        preprocessor: Preprocessor,
        encoder: LabelEncoder,
        mode: Mode,
        stream_config: StreamConfig,
    ) -> Self {
        Self {
            index: Arc::new(index),
            image_dir: image_dir.as_ref().into(),
            preprocessor: Arc::new(preprocessor),
            encoder,
            mode,
            stream_config,
        }
    }

    pub fn index(&self) -> &CocoIndex {
        &self.index
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get the image path of the nth record.
    pub fn image_path(&self, index: usize) -> Option<PathBuf> {
        self.index
            .get_index(index)
            .map(|(file_name, _)| self.image_dir.join(file_name))
    }

    /// Build the targets of the nth record without loading the image.
    pub fn labels(&self, index: usize) -> Result<EncodedLabels> {
        let (_, categories) = self
            .index
            .get_index(index)
            .ok_or_else(|| format_err!("invalid index {}", index))?;
        let labels = self.encoder.encode(categories)?;
        Ok(labels)
    }
}

impl GenericDataset for CocoMultiLabel {
    fn input_channels(&self) -> usize {
        3
    }

    fn classes(&self) -> &IndexSet<String> {
        VOCABULARY.classes()
    }
}

impl RandomAccessDataset for CocoMultiLabel {
    fn num_records(&self) -> usize {
        self.index.len()
    }

    fn nth(&self, index: usize) -> Pin<Box<dyn Future<Output = Result<Sample>> + Send>> {
        let record = self
            .image_path(index)
            .map(|path| (path, self.labels(index)));
        let preprocessor = self.preprocessor.clone();
        let mode = self.mode;

        Box::pin(async move {
            let (path, labels) = record.ok_or_else(|| format_err!("invalid index {}", index))?;
            let labels = labels?;
            let device = preprocessor.device();

            // decoding errors name the path
            let image = tokio::task::spawn_blocking(move || preprocessor.load(path)).await??;

            let EncodedLabels {
                sequence,
                label_number,
                multi_hot,
            } = labels;
            let multi_hot = Tensor::of_slice(&multi_hot).to_device(device);

            let sample = match mode {
                Mode::Classification => Sample::Classification { image, multi_hot },
                Mode::Sequential => Sample::Sequential {
                    image,
                    labels: Tensor::of_slice(&sequence).to_device(device),
                    label_number: label_number as i64,
                    multi_hot,
                },
            };

            Ok(sample)
        })
    }
}

impl StreamingDataset for CocoMultiLabel {
    fn stream(&self) -> Result<Pin<Box<dyn Stream<Item = Result<Sample>> + Send>>> {
        let StreamConfig {
            shuffle,
            seed,
            skip_failed,
        } = self.stream_config;

        let mut indices: Vec<usize> = (0..self.num_records()).collect();
        if shuffle {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            indices.shuffle(&mut rng);
        }

        let dataset = self.clone();
        let stream = stream::iter(indices)
            .then(move |index| {
                let dataset = dataset.clone();
                async move { (index, dataset.nth(index).await) }
            })
            .filter_map(move |(index, result)| {
                let item = match result {
                    Err(err) if skip_failed => {
                        warn!("skip record {}: {:#}", index, err);
                        None
                    }
                    result => Some(result),
                };
                future::ready(item)
            });

        Ok(Box::pin(stream))
    }
}
