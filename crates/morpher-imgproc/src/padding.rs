use morpher_image::{Image, ImageError, ImageSize};
use rayon::prelude::*;

/// A border type for the spatial padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaddingMode {
    /// Fill the border with a single, constant value.
    ///
    /// Example: ...d c b a | 0 0 0 0...
    Constant,

    /// Repeat the outermost row or column of pixels into the padded region.
    ///
    /// Example: ...d c b a | a a a a...
    Replicate,

    /// Reflect the pixel values at the boundary, starting with the pixel 'next' to the edge.
    ///
    /// Example: ...d c b a | b c d e...
    Reflect101,

    /// Reflect the pixel values at the boundary, starting with the edge pixel itself.
    ///
    /// Example: ...d c b a | a b c d...
    Reflect,

    /// Wrap the content from the opposite side to fill the border.
    ///
    /// Example: ...d c b a | w x y z...
    Wrap,
}

impl PaddingMode {
    #[inline]
    fn reflect(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i - 1;
            } else {
                i = 2 * len - i - 1;
            }
        }
        i as usize
    }

    #[inline]
    fn reflect101(i: isize, len: usize) -> usize {
        if len == 1 {
            return 0;
        }
        let len = len as isize;
        let mut i = i;
        while i < 0 || i >= len {
            if i < 0 {
                i = -i;
            } else {
                i = 2 * len - i - 2;
            }
        }
        i as usize
    }

    /// Maps index `i` to a valid index within `[0, len)` according to the padding mode.
    ///
    /// Returns `None` for [`PaddingMode::Constant`] when `i` falls outside the
    /// valid range, meaning the constant value must be used instead.
    ///
    /// # Arguments
    /// - `i`: The (possibly out-of-range) coordinate index.
    /// - `len`: The valid length of the dimension. Must be non zero.
    #[inline]
    pub fn map_index(&self, i: isize, len: usize) -> Option<usize> {
        if i >= 0 && (i as usize) < len {
            return Some(i as usize);
        }
        match self {
            PaddingMode::Constant => None,
            PaddingMode::Replicate => Some(i.clamp(0, len as isize - 1) as usize),
            PaddingMode::Reflect => Some(Self::reflect(i, len)),
            PaddingMode::Reflect101 => Some(Self::reflect101(i, len)),
            PaddingMode::Wrap => Some(i.rem_euclid(len as isize) as usize),
        }
    }
}

/// Represents 2D padding with top, bottom, left, and right values (in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding2D {
    /// Amount of padding to add on the top side.
    pub top: usize,
    /// Amount of padding to add on the bottom side.
    pub bottom: usize,
    /// Amount of padding to add on the left side.
    pub left: usize,
    /// Amount of padding to add on the right side.
    pub right: usize,
}

impl Padding2D {
    /// Size of an image of `size` once this padding is applied.
    pub fn padded_size(&self, size: ImageSize) -> ImageSize {
        ImageSize {
            width: size.width + self.left + self.right,
            height: size.height + self.top + self.bottom,
        }
    }
}

/// Pads `src` into `dst`, centering the original image and filling the
/// border according to `padding_mode`.
///
/// # Arguments
///
/// * `src` - The source image to pad.
/// * `dst` - The destination image where the padded output will be stored.
/// * `padding` - The amount of padding for all four sides.
/// * `padding_mode` - The type of border handling to use.
/// * `constant_value` - The pixel value used for constant padding, one value per channel.
///
/// # Errors
///
/// Returns an error if the size of `dst` does not match the padded size of `src`.
///
/// # Example
///
/// ```rust
/// use morpher_image::{ImageSize, Image};
/// use morpher_imgproc::padding::{PaddingMode, Padding2D, spatial_padding};
///
/// let src = Image::<u8, 1>::new(ImageSize { width: 2, height: 1 }, vec![1, 2]).unwrap();
/// let mut dst = Image::<u8, 1>::from_size_val(ImageSize { width: 4, height: 1 }, 0).unwrap();
///
/// let padding = Padding2D { top: 0, bottom: 0, left: 1, right: 1 };
/// spatial_padding(&src, &mut dst, padding, PaddingMode::Replicate, [0]).unwrap();
///
/// assert_eq!(dst.as_slice(), &[1, 1, 2, 2]);
/// ```
pub fn spatial_padding<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    padding: Padding2D,
    padding_mode: PaddingMode,
    constant_value: [T; C],
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    let expected = padding.padded_size(src.size());
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            dst.width(),
            dst.height(),
            expected.width,
            expected.height,
        ));
    }

    if dst.width() == 0 || dst.height() == 0 {
        return Ok(());
    }

    let (src_width, src_height) = (src.width(), src.height());
    let src_stride = src_width * C;
    let src_data = src.as_slice();
    let dst_stride = dst.width() * C;

    dst.as_slice_mut()
        .par_chunks_exact_mut(dst_stride)
        .enumerate()
        .for_each(|(y, dst_row)| {
            let src_y = if src_height == 0 {
                None
            } else {
                padding_mode.map_index(y as isize - padding.top as isize, src_height)
            };

            for (x, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
                let src_x = if src_width == 0 {
                    None
                } else {
                    padding_mode.map_index(x as isize - padding.left as isize, src_width)
                };

                match (src_x, src_y) {
                    (Some(sx), Some(sy)) => {
                        let idx = sy * src_stride + sx * C;
                        dst_pixel.copy_from_slice(&src_data[idx..idx + C]);
                    }
                    _ => dst_pixel.copy_from_slice(&constant_value),
                }
            }
        });

    Ok(())
}
