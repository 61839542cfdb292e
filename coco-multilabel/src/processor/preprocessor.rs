//! The per-image preprocessing pipeline.

use super::{
    color_jitter::{ColorJitter, ColorJitterInit},
    image_loader::load_rgb_image,
    random_affine::{RandomAffine, RandomAffineInit},
    transform::{normalize, resize},
};
use crate::{common::*, config::AugmentationConfig};

#[derive(Debug, Clone)]
pub struct PreprocessorInit {
    /// The outcome image size in pixels.
    pub image_size: usize,
    /// Augmentation options. No augmentation is done if set to `None`.
    pub augmentation: Option<AugmentationConfig>,
    /// The outcome image device. It defaults to CPU if set to `None`.
    pub device: Option<Device>,
}

impl PreprocessorInit {
    pub fn build(self) -> Result<Preprocessor> {
        let Self {
            image_size,
            augmentation,
            device,
        } = self;
        ensure!(image_size > 0, "image_size must be positive");

        let augmentation = augmentation
            .filter(|config| config.enabled)
            .map(|config| -> Result<_> {
                let AugmentationConfig {
                    translation,
                    contrast,
                    horizontal_flip_prob,
                    ..
                } = config;

                let affine = RandomAffineInit {
                    translation: Some(translation),
                    horizontal_flip_prob: Some(horizontal_flip_prob),
                }
                .build()?;
                let jitter = ColorJitterInit {
                    contrast: Some(contrast),
                }
                .build()?;

                Ok(Augmentation { affine, jitter })
            })
            .transpose()?;

        Ok(Preprocessor {
            image_size: image_size as i64,
            augmentation,
            device: device.unwrap_or(Device::Cpu),
        })
    }
}

#[derive(Debug, Clone)]
struct Augmentation {
    affine: RandomAffine,
    jitter: ColorJitter,
}

impl Augmentation {
    fn forward<R>(&self, image: &Tensor, rng: &mut R) -> Result<Tensor>
    where
        R: Rng,
    {
        let translated = self.affine.forward_with_rng(image, rng)?;
        let jittered = self.jitter.forward_with_rng(&translated, rng)?;
        Ok(jittered)
    }
}

/// Decodes, augments, resizes and normalizes images.
#[derive(Debug, Clone)]
pub struct Preprocessor {
    image_size: i64,
    augmentation: Option<Augmentation>,
    device: Device,
}

impl Preprocessor {
    pub fn image_size(&self) -> usize {
        self.image_size as usize
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn is_augmented(&self) -> bool {
        self.augmentation.is_some()
    }

    /// Load and process an image file. This function blocks on file I/O.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Tensor> {
        let image = load_rgb_image(path)?;
        self.process(&image)
    }

    /// Process a `[3, height, width]` float image in `[0, 1]`.
    pub fn process(&self, image: &Tensor) -> Result<Tensor> {
        self.process_with_rng(image, &mut StdRng::from_entropy())
    }

    pub fn process_with_rng<R>(&self, image: &Tensor, rng: &mut R) -> Result<Tensor>
    where
        R: Rng,
    {
        let Self {
            image_size,
            device,
            ..
        } = *self;

        tch::no_grad(|| -> Result<_> {
            let image = image.to_device(device);

            let image = self.augment(image, rng);
            let image = resize(&image, image_size, image_size)?;
            let image = normalize(&image)?.set_requires_grad(false);
            Ok(image)
        })
    }

    /// Augment the image if enabled. On failure the input image is kept.
    fn augment<R>(&self, image: Tensor, rng: &mut R) -> Tensor
    where
        R: Rng,
    {
        match &self.augmentation {
            Some(augmentation) => match augmentation.forward(&image, rng) {
                Ok(augmented) => augmented,
                Err(err) => {
                    warn!("augmentation error: {:#}", err);
                    image
                }
            },
            None => image,
        }
    }
}
