use morpher_image::{Image, ImageError};
use rayon::prelude::*;

use super::{Kernel, MorphologyError};
use crate::padding::{spatial_padding, Padding2D, PaddingMode};

fn check_inputs<T, const C: usize>(
    src: &Image<T, C>,
    dst: &Image<T, C>,
    kernel: &Kernel,
) -> Result<(), MorphologyError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        )
        .into());
    }

    if kernel.width() == 0 || kernel.height() == 0 {
        return Err(MorphologyError::EmptyKernel(kernel.width(), kernel.height()));
    }

    Ok(())
}

/// Slide `kernel` over `src` and reduce every neighborhood with `reduce`.
fn morph_reduce<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    padding_mode: PaddingMode,
    constant_value: [T; C],
    reduce: impl Fn(T, T) -> T + Send + Sync,
) -> Result<(), MorphologyError>
where
    T: Copy + Send + Sync,
{
    check_inputs(src, dst, kernel)?;

    let width = src.width();
    if width == 0 || src.height() == 0 {
        return Ok(());
    }

    let (anchor_y, anchor_x) = kernel.anchor();
    let padding = Padding2D {
        top: anchor_y,
        bottom: kernel.height() - 1 - anchor_y,
        left: anchor_x,
        right: kernel.width() - 1 - anchor_x,
    };

    let mut padded = Image::from_size_val(padding.padded_size(src.size()), constant_value[0])?;
    spatial_padding(src, &mut padded, padding, padding_mode, constant_value)?;

    let offsets = kernel.active_offsets();
    let padded_stride = padded.width() * C;
    let padded_data = padded.as_slice();

    dst.as_slice_mut()
        .par_chunks_exact_mut(width * C)
        .enumerate()
        .for_each(|(y, dst_row)| {
            for (x, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
                for (c, out) in dst_pixel.iter_mut().enumerate() {
                    // offsets is never empty for a non empty kernel
                    let mut acc: Option<T> = None;
                    for &(ky, kx) in offsets.iter() {
                        let val = padded_data[(y + ky) * padded_stride + (x + kx) * C + c];
                        acc = Some(match acc {
                            None => val,
                            Some(a) => reduce(a, val),
                        });
                    }
                    if let Some(v) = acc {
                        *out = v;
                    }
                }
            }
        });

    Ok(())
}

/// Dilate an image using a [`Kernel`].
///
/// Each pixel is replaced by the maximum value in the neighborhood defined by the kernel.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image (will be overwritten).
/// * `kernel` - The morphological structuring element.
/// * `padding_mode` - The border handling mode.
/// * `constant_value` - The fill value for constant padding.
///
/// # Example
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::morphology::{dilate, Kernel, KernelShape};
/// use morpher_imgproc::padding::PaddingMode;
///
/// let src = Image::<u8, 1>::new(ImageSize { width: 3, height: 1 }, vec![0, 255, 0]).unwrap();
/// let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0).unwrap();
///
/// let kernel = Kernel::new(KernelShape::Box { size: 3 });
/// dilate(&src, &mut dst, &kernel, PaddingMode::Replicate, [0]).unwrap();
///
/// assert_eq!(dst.as_slice(), &[255, 255, 255]);
/// ```
pub fn dilate<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    padding_mode: PaddingMode,
    constant_value: [T; C],
) -> Result<(), MorphologyError>
where
    T: Copy + Send + Sync + Ord,
{
    morph_reduce(src, dst, kernel, padding_mode, constant_value, Ord::max)
}

/// Erode an image using a [`Kernel`].
///
/// Each pixel is replaced by the minimum value in the neighborhood defined by the kernel.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image (will be overwritten).
/// * `kernel` - The morphological structuring element.
/// * `padding_mode` - The border handling mode.
/// * `constant_value` - The fill value for constant padding.
pub fn erode<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    padding_mode: PaddingMode,
    constant_value: [T; C],
) -> Result<(), MorphologyError>
where
    T: Copy + Send + Sync + Ord,
{
    morph_reduce(src, dst, kernel, padding_mode, constant_value, Ord::min)
}

/// Opening: erosion followed by dilation.
///
/// Removes small bright objects. The same border handling is used for both steps,
/// [`PaddingMode::Replicate`] leaves the borders unaffected.
pub fn open<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    padding_mode: PaddingMode,
    constant_value: [T; C],
) -> Result<(), MorphologyError>
where
    T: Copy + Send + Sync + Ord,
{
    let mut eroded = src.clone();
    erode(src, &mut eroded, kernel, padding_mode, constant_value)?;
    dilate(&eroded, dst, kernel, padding_mode, constant_value)
}

/// Closing: dilation followed by erosion.
///
/// Fills small dark holes. The same border handling is used for both steps,
/// [`PaddingMode::Replicate`] leaves the borders unaffected.
pub fn close<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    padding_mode: PaddingMode,
    constant_value: [T; C],
) -> Result<(), MorphologyError>
where
    T: Copy + Send + Sync + Ord,
{
    let mut dilated = src.clone();
    dilate(src, &mut dilated, kernel, padding_mode, constant_value)?;
    erode(&dilated, dst, kernel, padding_mode, constant_value)
}
