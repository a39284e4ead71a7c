#![deny(missing_docs)]
//! Image types for grayscale and colour rasters.

/// image representation for image processing purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

pub use crate::error::ImageError;
pub use crate::image::{Gray8, Image, ImageSize, Rgb8};
