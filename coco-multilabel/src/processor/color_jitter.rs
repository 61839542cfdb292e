//! The random contrast distortion algorithm.

use crate::common::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColorJitterInit {
    pub contrast: Option<R64>,
}

impl ColorJitterInit {
    pub fn build(self) -> Result<ColorJitter> {
        let Self { contrast } = self;

        let contrast = contrast
            .map(|val| {
                ensure!(val >= 0.0, "contrast must be non-negative");
                Ok(val.raw())
            })
            .transpose()?;

        Ok(ColorJitter {
            max_contrast_shift: contrast,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ColorJitter {
    max_contrast_shift: Option<f64>,
}

impl ColorJitter {
    pub fn forward(&self, rgb: &Tensor) -> Result<Tensor> {
        self.forward_with_rng(rgb, &mut StdRng::from_entropy())
    }

    pub fn forward_with_rng<R>(&self, rgb: &Tensor, rng: &mut R) -> Result<Tensor>
    where
        R: Rng,
    {
        tch::no_grad(|| -> Result<_> {
            let (channels, _height, _width) = rgb.size3()?;
            ensure!(
                channels == 3,
                "channel size must be 3, but get {}",
                channels
            );

            let output = match self.max_contrast_shift {
                Some(max_shift) => {
                    let lower = (1.0 - max_shift).max(0.0);
                    let factor = rng.gen_range(lower..=(1.0 + max_shift));
                    adjust_contrast(rgb, factor)?
                }
                None => rgb.shallow_clone(),
            };

            Ok(output)
        })
    }
}

/// Blend the image with its mean grayscale intensity.
///
/// A factor of 0 gives a solid gray image and 1 gives the original image.
pub fn adjust_contrast(rgb: &Tensor, factor: f64) -> Result<Tensor> {
    tch::no_grad(|| -> Result<_> {
        let (channels, _height, _width) = rgb.size3()?;
        ensure!(
            channels == 3,
            "channel size must be 3, but get {}",
            channels
        );

        let gray = rgb.select(0, 0) * 0.299 + rgb.select(0, 1) * 0.587 + rgb.select(0, 2) * 0.114;
        let mean = gray.mean(Kind::Float);
        let blended = (rgb * factor + mean * (1.0 - factor)).clamp(0.0, 1.0);
        Ok(blended)
    })
}
