//! Dataset adapter for multi-label classification and label sequence
//! prediction on Microsoft COCO.

mod common;
pub mod config;
pub mod dataset;
pub mod index;
pub mod processor;

pub use label;
