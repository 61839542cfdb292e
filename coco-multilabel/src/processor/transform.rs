//! Deterministic resizing and normalization.

use crate::common::*;
use tch::vision;

/// Per-channel mean of ImageNet images in RGB order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Per-channel standard deviation of ImageNet images in RGB order.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resize a `[channels, height, width]` float image in `[0, 1]`.
///
/// The image is quantized to 8 bits and filtered on CPU, so downscaling is
/// anti-aliased. The output stays on the input device.
pub fn resize(image: &Tensor, new_height: i64, new_width: i64) -> Result<Tensor> {
    tch::no_grad(|| -> Result<_> {
        ensure!(
            new_height > 0 && new_width > 0,
            "output size must be positive, but get {}x{}",
            new_height,
            new_width
        );
        let (_channels, height, width) = image.size3()?;
        ensure!(
            image.kind() == Kind::Float,
            "expect a float image, but get {:?}",
            image.kind()
        );

        if (height, width) == (new_height, new_width) {
            return Ok(image.shallow_clone());
        }

        let device = image.device();
        let quantized = (image * 255.0)
            .round()
            .clamp(0.0, 255.0)
            .to_kind(Kind::Uint8)
            .to_device(Device::Cpu)
            .contiguous();
        let resized = vision::image::resize(&quantized, new_width, new_height)?
            .to_kind(Kind::Float)
            / 255.0;
        Ok(resized.to_device(device))
    })
}

/// Subtract the ImageNet mean and divide by the ImageNet standard deviation per channel.
pub fn normalize(image: &Tensor) -> Result<Tensor> {
    tch::no_grad(|| -> Result<_> {
        let (channels, _height, _width) = image.size3()?;
        ensure!(
            channels == 3,
            "channel size must be 3, but get {}",
            channels
        );

        let device = image.device();
        let mean = Tensor::of_slice(&IMAGENET_MEAN)
            .view([3, 1, 1])
            .to_device(device);
        let std = Tensor::of_slice(&IMAGENET_STD)
            .view([3, 1, 1])
            .to_device(device);

        Ok((image - mean) / std)
    })
}
