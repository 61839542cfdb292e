//! Random translation and flipping.

use crate::common::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RandomAffineInit {
    /// The maximum translation in ratio of image width and height.
    pub translation: Option<R64>,
    /// The probability to flip the image horizontally.
    pub horizontal_flip_prob: Option<R64>,
}

impl RandomAffineInit {
    pub fn build(self) -> Result<RandomAffine> {
        let Self {
            translation,
            horizontal_flip_prob,
        } = self;

        let translation = translation
            .map(|val| {
                ensure!(val >= 0.0, "translation must be non-negative");
                ensure!(val <= 1.0, "translation must not exceed 1");
                Ok(val.raw())
            })
            .transpose()?;
        let horizontal_flip_prob = horizontal_flip_prob
            .map(|val| {
                ensure!(
                    (0.0..=1.0).contains(&val.raw()),
                    "horizontal_flip_prob must be within [0, 1]"
                );
                Ok(val.raw())
            })
            .transpose()?;

        Ok(RandomAffine {
            translation,
            horizontal_flip_prob,
        })
    }
}

impl Default for RandomAffineInit {
    fn default() -> Self {
        Self {
            translation: None,
            horizontal_flip_prob: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RandomAffine {
    translation: Option<f64>,
    horizontal_flip_prob: Option<f64>,
}

impl RandomAffine {
    pub fn forward(&self, orig_image: &Tensor) -> Result<Tensor> {
        self.forward_with_rng(orig_image, &mut StdRng::from_entropy())
    }

    pub fn forward_with_rng<R>(&self, orig_image: &Tensor, rng: &mut R) -> Result<Tensor>
    where
        R: Rng,
    {
        tch::no_grad(|| -> Result<_> {
            let (_channels, height, width) = orig_image.size3()?;

            let image = match self.translation {
                Some(max_translation) => {
                    // offsets are rounded to whole pixels
                    let max_dx = max_translation * width as f64;
                    let max_dy = max_translation * height as f64;
                    let dx = rng.gen_range(-max_dx..=max_dx).round() as i64;
                    let dy = rng.gen_range(-max_dy..=max_dy).round() as i64;
                    translate(orig_image, dy, dx)?
                }
                None => orig_image.shallow_clone(),
            };

            let image = match self.horizontal_flip_prob {
                Some(prob) if rng.gen_bool(prob) => image.flip(&[2]),
                _ => image,
            };

            Ok(image)
        })
    }
}

/// Shift a `[channels, height, width]` image by whole pixels and fill the
/// uncovered area with zeros.
///
/// Positive `dy` moves the content down and positive `dx` moves it right.
pub fn translate(image: &Tensor, dy: i64, dx: i64) -> Result<Tensor> {
    tch::no_grad(|| -> Result<_> {
        let (_channels, height, width) = image.size3()?;
        let output = image.zeros_like();

        if dy.abs() >= height || dx.abs() >= width {
            return Ok(output);
        }

        let (src_t, dst_t) = if dy >= 0 { (0, dy) } else { (-dy, 0) };
        let (src_l, dst_l) = if dx >= 0 { (0, dx) } else { (-dx, 0) };
        let inner_h = height - dy.abs();
        let inner_w = width - dx.abs();

        let src = image.i((.., src_t..(src_t + inner_h), src_l..(src_l + inner_w)));
        let mut dst = output.i((.., dst_t..(dst_t + inner_h), dst_l..(dst_l + inner_w)));
        dst.copy_(&src);

        Ok(output)
    })
}
