use num_traits::Zero;
use rayon::prelude::*;
use std::cmp::PartialOrd;

use morpher_image::{Image, ImageError};

use crate::parallel::{ExecuteExt, ExecutionStrategy, ParallelError};

/// The largest intensity of an 8-bit sample.
pub const MAX_INTENSITY: u8 = 255;

/// Pixels per work item for the parallel reductions.
const CHUNK_SIZE: usize = 4096;

/// An error type for the threshold module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ThresholdError {
    /// The image has no pixels to estimate a threshold from.
    #[error("Cannot estimate a threshold on an empty image ({0}x{1})")]
    InvalidInput(usize, usize),

    /// One of the two intensity classes has no pixels.
    #[error("Degenerate class split: {high} pixels above and {low} pixels at or below the midpoint")]
    DegenerateClass {
        /// Number of pixels in the high intensity class.
        high: usize,
        /// Number of pixels in the low intensity class.
        low: usize,
    },

    /// The source and destination images are not compatible.
    #[error(transparent)]
    Image(#[from] ImageError),

    /// The execution strategy could not be applied.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}

/// The type of thresholding to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    /// Values above the threshold become `max_value`, the rest zero.
    Binary,
    /// Values above the threshold become zero, the rest `max_value`.
    BinaryInv,
}

/// How the threshold value is obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdPolicy {
    /// A threshold chosen by the caller.
    Fixed(f64),
    /// The mean intensity of the whole image, see [`mean_intensity_threshold`].
    GlobalAverage,
    /// The mean of the two class means, see [`two_class_mean_threshold`].
    TwoClassMean,
}

impl ThresholdPolicy {
    /// Compute the threshold value of `src` under this policy.
    ///
    /// # Arguments
    ///
    /// * `src` - The input grayscale image.
    /// * `max_value` - The maximum intensity of the image domain.
    pub fn estimate(&self, src: &Image<u8, 1>, max_value: u8) -> Result<f64, ThresholdError> {
        match self {
            ThresholdPolicy::Fixed(t) => Ok(*t),
            ThresholdPolicy::GlobalAverage => mean_intensity_threshold(src),
            ThresholdPolicy::TwoClassMean => two_class_mean_threshold(src, max_value),
        }
    }
}

fn check_same_size<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &Image<T2, C2>,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

fn check_non_empty<T, const C: usize>(src: &Image<T, C>) -> Result<(), ThresholdError> {
    if src.size().area() == 0 {
        return Err(ThresholdError::InvalidInput(src.width(), src.height()));
    }
    Ok(())
}

/// Apply a binary threshold to an image.
///
/// # Arguments
///
/// * `src` - The input image of an arbitrary number of channels and type.
/// * `dst` - The output image with the same size and channels.
/// * `threshold` - The threshold value. Must be the same type as the image.
/// * `max_value` - The value to use when the input value is greater than the threshold.
/// * `strategy` - How to distribute the work.
///
/// # Examples
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::parallel::ExecutionStrategy;
/// use morpher_imgproc::threshold::threshold_binary;
///
/// let data = vec![100u8, 200, 50, 150, 200, 250];
/// let image = Image::<_, 1>::new(ImageSize { width: 2, height: 3 }, data).unwrap();
///
/// let mut thresholded = Image::<_, 1>::from_size_val(image.size(), 0).unwrap();
///
/// threshold_binary(&image, &mut thresholded, 100, 255, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(thresholded.as_slice(), &[0, 255, 0, 255, 255, 255]);
/// ```
pub fn threshold_binary<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
    max_value: T,
    strategy: ExecutionStrategy,
) -> Result<(), ThresholdError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    check_same_size(src, dst)?;

    src.as_slice()
        .execute_with(strategy, dst.as_slice_mut(), |(src_pixel, dst_pixel)| {
            *dst_pixel = if *src_pixel > threshold {
                max_value
            } else {
                T::zero()
            };
        })?;

    Ok(())
}

/// Apply an inverse binary threshold to an image.
///
/// # Arguments
///
/// * `src` - The input image of an arbitrary number of channels and type.
/// * `dst` - The output image with the same size and channels.
/// * `threshold` - The threshold value. Must be the same type as the image.
/// * `max_value` - The value to use when the input value is not greater than the threshold.
/// * `strategy` - How to distribute the work.
///
/// # Examples
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::parallel::ExecutionStrategy;
/// use morpher_imgproc::threshold::threshold_binary_inverse;
///
/// let data = vec![100u8, 200, 50, 150, 200, 250];
/// let image = Image::<_, 1>::new(ImageSize { width: 2, height: 3 }, data).unwrap();
///
/// let mut thresholded = Image::<_, 1>::from_size_val(image.size(), 0).unwrap();
///
/// threshold_binary_inverse(&image, &mut thresholded, 100, 255, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(thresholded.as_slice(), &[255, 0, 255, 0, 0, 0]);
/// ```
pub fn threshold_binary_inverse<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
    max_value: T,
    strategy: ExecutionStrategy,
) -> Result<(), ThresholdError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    check_same_size(src, dst)?;

    src.as_slice()
        .execute_with(strategy, dst.as_slice_mut(), |(src_pixel, dst_pixel)| {
            *dst_pixel = if *src_pixel > threshold {
                T::zero()
            } else {
                max_value
            };
        })?;

    Ok(())
}

/// Binarize a grayscale image with a real valued threshold.
///
/// A sample strictly greater than `threshold` is foreground, a sample equal
/// to the threshold is background.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output binary image with the same size.
/// * `threshold` - The decision boundary.
/// * `thres_type` - Whether foreground maps to `max_value` or to zero.
/// * `max_value` - The foreground value.
///
/// # Examples
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::threshold::{apply_threshold, ThresholdType};
///
/// let image = Image::<u8, 1>::new(ImageSize { width: 4, height: 1 }, vec![0, 127, 128, 255]).unwrap();
/// let mut binary = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
///
/// apply_threshold(&image, &mut binary, 127.5, ThresholdType::Binary, 255).unwrap();
/// assert_eq!(binary.as_slice(), &[0, 0, 255, 255]);
/// ```
pub fn apply_threshold(
    src: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    threshold: f64,
    thres_type: ThresholdType,
    max_value: u8,
) -> Result<(), ThresholdError> {
    check_same_size(src, dst)?;

    let (above, below) = match thres_type {
        ThresholdType::Binary => (max_value, 0),
        ThresholdType::BinaryInv => (0, max_value),
    };

    src.as_slice()
        .par_iter()
        .zip(dst.as_slice_mut().par_iter_mut())
        .for_each(|(src_pixel, dst_pixel)| {
            *dst_pixel = if f64::from(*src_pixel) > threshold {
                above
            } else {
                below
            };
        });

    Ok(())
}

/// Compute the mean intensity of a grayscale image to use as a threshold.
///
/// `threshold = sum(intensity) / (width * height)`
///
/// # Errors
///
/// Returns [`ThresholdError::InvalidInput`] if the image has no pixels.
///
/// # Examples
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::threshold::mean_intensity_threshold;
///
/// let image = Image::<u8, 1>::new(ImageSize { width: 2, height: 2 }, vec![0, 0, 255, 255]).unwrap();
///
/// assert_eq!(mean_intensity_threshold(&image).unwrap(), 127.5);
/// ```
pub fn mean_intensity_threshold(src: &Image<u8, 1>) -> Result<f64, ThresholdError> {
    check_non_empty(src)?;

    let total: u64 = src
        .as_slice()
        .par_chunks(CHUNK_SIZE)
        .map(|chunk| chunk.iter().map(|&px| px as u64).sum::<u64>())
        .sum();

    let threshold = total as f64 / src.size().area() as f64;
    log::debug!("mean intensity threshold of {}: {threshold}", src.size());

    Ok(threshold)
}

/// Running sum and pixel count of one intensity class.
#[derive(Debug, Default, Clone, Copy)]
struct ClassStats {
    sum: u64,
    count: usize,
}

impl ClassStats {
    fn add(&mut self, px: u8) {
        self.sum += px as u64;
        self.count += 1;
    }

    fn merge(self, other: Self) -> Self {
        Self {
            sum: self.sum + other.sum,
            count: self.count + other.count,
        }
    }

    fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }
}

/// Compute the two-class mean threshold of a grayscale image.
///
/// The pixels are split once at the fixed midpoint `max_value / 2` (integer
/// division) into a high class (`> midpoint`) and a low class (`<= midpoint`).
/// The threshold is the average of the two class means. The split is not
/// iterated with the new threshold.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `max_value` - The maximum intensity of the image domain.
///
/// # Errors
///
/// Returns [`ThresholdError::InvalidInput`] if the image has no pixels and
/// [`ThresholdError::DegenerateClass`] if all pixels fall on one side of the midpoint.
///
/// # Examples
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::threshold::two_class_mean_threshold;
///
/// let image = Image::<u8, 1>::new(ImageSize { width: 2, height: 2 }, vec![0, 50, 200, 255]).unwrap();
///
/// assert_eq!(two_class_mean_threshold(&image, 255).unwrap(), 126.25);
/// ```
pub fn two_class_mean_threshold(src: &Image<u8, 1>, max_value: u8) -> Result<f64, ThresholdError> {
    check_non_empty(src)?;

    let midpoint = max_value / 2;

    let (high, low) = src
        .as_slice()
        .par_chunks(CHUNK_SIZE)
        .map(|chunk| {
            let mut high = ClassStats::default();
            let mut low = ClassStats::default();
            for &px in chunk {
                if px > midpoint {
                    high.add(px);
                } else {
                    low.add(px);
                }
            }
            (high, low)
        })
        .reduce(
            || (ClassStats::default(), ClassStats::default()),
            |(h1, l1), (h2, l2)| (h1.merge(h2), l1.merge(l2)),
        );

    if high.count == 0 || low.count == 0 {
        return Err(ThresholdError::DegenerateClass {
            high: high.count,
            low: low.count,
        });
    }

    let threshold = (high.mean() + low.mean()) / 2.0;
    log::debug!(
        "two class mean threshold of {}: {threshold} (high mean {}, low mean {})",
        src.size(),
        high.mean(),
        low.mean()
    );

    Ok(threshold)
}

/// Estimate a threshold with `policy` and binarize `src` with it.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output binary image with the same size.
/// * `policy` - How to obtain the threshold value.
/// * `thres_type` - The type of thresholding to apply.
/// * `max_value` - The maximum intensity, also used as the foreground value.
///
/// # Returns
///
/// The threshold value that was applied.
///
/// # Examples
///
/// ```
/// use morpher_image::{Image, ImageSize};
/// use morpher_imgproc::threshold::{threshold_with_policy, ThresholdPolicy, ThresholdType};
///
/// let image = Image::<u8, 1>::new(ImageSize { width: 2, height: 2 }, vec![0, 50, 200, 255]).unwrap();
/// let mut binary = Image::<u8, 1>::from_size_val(image.size(), 0).unwrap();
///
/// let t = threshold_with_policy(
///     &image,
///     &mut binary,
///     ThresholdPolicy::TwoClassMean,
///     ThresholdType::Binary,
///     255,
/// ).unwrap();
///
/// assert_eq!(t, 126.25);
/// assert_eq!(binary.as_slice(), &[0, 0, 255, 255]);
/// ```
pub fn threshold_with_policy(
    src: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    policy: ThresholdPolicy,
    thres_type: ThresholdType,
    max_value: u8,
) -> Result<f64, ThresholdError> {
    check_same_size(src, dst)?;
    let threshold = policy.estimate(src, max_value)?;
    apply_threshold(src, dst, threshold, thres_type, max_value)?;
    Ok(threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use morpher_image::ImageSize;

    fn gray(width: usize, height: usize, data: Vec<u8>) -> Result<Image<u8, 1>, ImageError> {
        Image::new(ImageSize { width, height }, data)
    }

    #[test]
    fn threshold_binary() -> Result<(), ThresholdError> {
        let image = gray(2, 3, vec![100u8, 200, 50, 150, 200, 250])?;
        let mut thresholded = Image::<_, 1>::from_size_val(image.size(), 0)?;

        for strategy in [
            ExecutionStrategy::Serial,
            ExecutionStrategy::ParallelElements,
            ExecutionStrategy::AutoRows(2),
            ExecutionStrategy::Fixed(2),
        ] {
            super::threshold_binary(&image, &mut thresholded, 100, 255, strategy)?;
            assert_eq!(thresholded.as_slice(), &[0u8, 255, 0, 255, 255, 255]);
        }

        Ok(())
    }

    #[test]
    fn threshold_binary_inverse() -> Result<(), ThresholdError> {
        let image = gray(2, 3, vec![100u8, 200, 50, 150, 200, 250])?;
        let mut thresholded = Image::<_, 1>::from_size_val(image.size(), 0)?;

        super::threshold_binary_inverse(
            &image,
            &mut thresholded,
            100,
            255,
            ExecutionStrategy::Serial,
        )?;
        assert_eq!(thresholded.as_slice(), &[255u8, 0, 255, 0, 0, 0]);

        Ok(())
    }

    #[test]
    fn threshold_size_mismatch() -> Result<(), ThresholdError> {
        let image = gray(2, 3, vec![0; 6])?;
        let mut thresholded = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 2,
            },
            0,
        )?;

        let res = super::threshold_binary(
            &image,
            &mut thresholded,
            100,
            255,
            ExecutionStrategy::Serial,
        );
        assert_eq!(
            res,
            Err(ThresholdError::Image(ImageError::InvalidImageSize(
                2, 3, 3, 2
            )))
        );

        let res = apply_threshold(&image, &mut thresholded, 1.0, ThresholdType::Binary, 255);
        assert!(matches!(res, Err(ThresholdError::Image(_))));

        Ok(())
    }

    #[test]
    fn mean_intensity_constant() -> Result<(), ThresholdError> {
        for c in [0u8, 1, 127, 200, 255] {
            let image = gray(7, 5, vec![c; 35])?;
            assert_eq!(mean_intensity_threshold(&image)?, c as f64);
        }
        Ok(())
    }

    #[test]
    fn mean_intensity_half() -> Result<(), ThresholdError> {
        let image = gray(2, 2, vec![0, 0, 255, 255])?;
        assert_eq!(mean_intensity_threshold(&image)?, 127.5);
        Ok(())
    }

    #[test]
    fn mean_intensity_large_image() -> Result<(), ThresholdError> {
        // spans several reduction chunks
        let data = (0..300 * 100).map(|i| (i % 2) as u8 * 255).collect();
        let image = gray(300, 100, data)?;
        assert_relative_eq!(mean_intensity_threshold(&image)?, 127.5);
        Ok(())
    }

    #[test]
    fn mean_intensity_empty() -> Result<(), ThresholdError> {
        let image = gray(0, 4, vec![])?;
        assert_eq!(
            mean_intensity_threshold(&image),
            Err(ThresholdError::InvalidInput(0, 4))
        );
        Ok(())
    }

    #[test]
    fn two_class_mean() -> Result<(), ThresholdError> {
        let image = gray(2, 2, vec![0, 50, 200, 255])?;
        assert_relative_eq!(two_class_mean_threshold(&image, 255)?, 126.25);
        Ok(())
    }

    #[test]
    fn two_class_mean_midpoint_is_low() -> Result<(), ThresholdError> {
        // 127 belongs to the low class, 128 to the high class
        let image = gray(2, 1, vec![127, 128])?;
        assert_relative_eq!(two_class_mean_threshold(&image, 255)?, 127.5);
        Ok(())
    }

    #[test]
    fn two_class_mean_is_single_pass() -> Result<(), ThresholdError> {
        // low = {0, 120}, high = {130}: (60 + 130) / 2 = 95.
        // re-splitting at 95 would move 120 to the high class.
        let image = gray(3, 1, vec![0, 120, 130])?;
        assert_relative_eq!(two_class_mean_threshold(&image, 255)?, 95.0);
        Ok(())
    }

    #[test]
    fn two_class_mean_degenerate() -> Result<(), ThresholdError> {
        let image = gray(3, 3, vec![0; 9])?;
        assert_eq!(
            two_class_mean_threshold(&image, 255),
            Err(ThresholdError::DegenerateClass { high: 0, low: 9 })
        );

        let image = gray(2, 1, vec![200, 255])?;
        assert_eq!(
            two_class_mean_threshold(&image, 255),
            Err(ThresholdError::DegenerateClass { high: 2, low: 0 })
        );

        let image = gray(0, 0, vec![])?;
        assert_eq!(
            two_class_mean_threshold(&image, 255),
            Err(ThresholdError::InvalidInput(0, 0))
        );

        Ok(())
    }

    #[test]
    fn apply_threshold_boundary() -> Result<(), ThresholdError> {
        let image = gray(3, 1, vec![99, 100, 101])?;
        let mut binary = Image::from_size_val(image.size(), 0)?;

        apply_threshold(&image, &mut binary, 100.0, ThresholdType::Binary, 255)?;
        assert_eq!(binary.as_slice(), &[0, 0, 255]);

        apply_threshold(&image, &mut binary, 100.0, ThresholdType::BinaryInv, 255)?;
        assert_eq!(binary.as_slice(), &[255, 255, 0]);

        Ok(())
    }

    #[test]
    fn apply_threshold_idempotent() -> Result<(), ThresholdError> {
        let image = gray(3, 2, vec![10, 90, 127, 128, 200, 255])?;
        let mut once = Image::from_size_val(image.size(), 0)?;
        let mut twice = Image::from_size_val(image.size(), 0)?;

        for t in [0.0, 64.5, 126.25, 127.5, 254.0] {
            apply_threshold(&image, &mut once, t, ThresholdType::Binary, 255)?;
            apply_threshold(&once, &mut twice, t, ThresholdType::Binary, 255)?;
            assert_eq!(once, twice);
        }

        Ok(())
    }

    #[test]
    fn apply_threshold_complementary() -> Result<(), ThresholdError> {
        let data = (0..=255u8).collect();
        let image = gray(16, 16, data)?;
        let mut binary = Image::from_size_val(image.size(), 0)?;
        let mut inverse = Image::from_size_val(image.size(), 0)?;

        for t in [0.0, 63.0, 126.25, 127.5, 255.0] {
            apply_threshold(&image, &mut binary, t, ThresholdType::Binary, 255)?;
            apply_threshold(&image, &mut inverse, t, ThresholdType::BinaryInv, 255)?;

            for (b, i) in binary.as_slice().iter().zip(inverse.as_slice()) {
                assert!(*b == 0 || *b == 255);
                assert_eq!(*b, 255 - *i);
            }
        }

        Ok(())
    }

    #[test]
    fn policy_estimate() -> Result<(), ThresholdError> {
        let image = gray(2, 2, vec![0, 50, 200, 255])?;

        assert_eq!(ThresholdPolicy::Fixed(42.0).estimate(&image, 255)?, 42.0);
        assert_relative_eq!(
            ThresholdPolicy::GlobalAverage.estimate(&image, 255)?,
            126.25
        );
        assert_relative_eq!(ThresholdPolicy::TwoClassMean.estimate(&image, 255)?, 126.25);

        Ok(())
    }

    #[test]
    fn threshold_with_policy_average() -> Result<(), ThresholdError> {
        let image = gray(4, 1, vec![10, 20, 30, 100])?;
        let mut binary = Image::from_size_val(image.size(), 0)?;

        let t = threshold_with_policy(
            &image,
            &mut binary,
            ThresholdPolicy::GlobalAverage,
            ThresholdType::Binary,
            MAX_INTENSITY,
        )?;

        assert_relative_eq!(t, 40.0);
        assert_eq!(binary.as_slice(), &[0, 0, 0, 255]);

        Ok(())
    }

    #[test]
    fn threshold_with_policy_degenerate() -> Result<(), ThresholdError> {
        let image = gray(2, 2, vec![0; 4])?;
        let mut binary = Image::from_size_val(image.size(), 7)?;

        let res = threshold_with_policy(
            &image,
            &mut binary,
            ThresholdPolicy::TwoClassMean,
            ThresholdType::Binary,
            MAX_INTENSITY,
        );

        assert!(matches!(res, Err(ThresholdError::DegenerateClass { .. })));
        // the destination is left untouched
        assert_eq!(binary.as_slice(), &[7, 7, 7, 7]);

        Ok(())
    }
}
