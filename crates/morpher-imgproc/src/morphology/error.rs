use morpher_image::ImageError;

/// Errors related to morphological operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum MorphologyError {
    /// The kernel has zero width or height.
    #[error("Kernel is empty ({0}x{1})")]
    EmptyKernel(usize, usize),

    /// The source or destination image is not valid.
    #[error(transparent)]
    Image(#[from] ImageError),
}
