//! Category vocabulary and label encoding for the COCO multi-label task.

mod common;
pub mod encode;
pub mod error;
pub mod vocab;

pub use encode::*;
pub use error::*;
pub use vocab::*;
