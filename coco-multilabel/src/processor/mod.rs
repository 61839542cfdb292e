//! Image preprocessing building blocks.

pub mod color_jitter;
pub mod image_loader;
pub mod preprocessor;
pub mod random_affine;
pub mod transform;

pub use color_jitter::*;
pub use image_loader::*;
pub use preprocessor::*;
pub use random_affine::*;
pub use transform::*;
