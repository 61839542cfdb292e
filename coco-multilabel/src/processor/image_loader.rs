//! Image decoding.

use crate::common::*;
use image::RgbImage;

/// Decode an image file into a `[3, height, width]` float tensor in `[0, 1]`.
///
/// Images in other color modes are converted to 8-bit RGB.
pub fn load_rgb_image(path: impl AsRef<Path>) -> Result<Tensor> {
    let path = path.as_ref();
    let image = image::open(path)
        .with_context(|| format!("failed to decode image '{}'", path.display()))?
        .to_rgb8();
    Ok(rgb_image_to_tensor(&image))
}

pub fn rgb_image_to_tensor(image: &RgbImage) -> Tensor {
    let (width, height) = image.dimensions();
    tch::no_grad(|| {
        Tensor::of_slice(image.as_raw())
            .view([height as i64, width as i64, 3])
            .permute(&[2, 0, 1])
            .to_kind(Kind::Float)
            / 255.0
    })
}
