/// Error types used by the morphological operations.
mod error;
pub use error::MorphologyError;

/// Structuring elements.
mod kernels;
pub use kernels::{box_kernel, cross_kernel, ellipse_kernel, Kernel, KernelShape};

/// Erosion, dilation, opening and closing.
mod ops;
pub use ops::{close, dilate, erode, open};
