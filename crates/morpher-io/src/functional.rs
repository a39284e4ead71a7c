use std::path::Path;

use morpher_image::{Gray8, Image, ImageSize, Rgb8};

use crate::error::IoError;

/// Reads an image from the given file path and converts it to RGB8.
///
/// The format is guessed from the file content, so any format enabled in the
/// image crate can be read. Grayscale and alpha images are expanded or
/// flattened to three channels.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Errors
///
/// Returns [`IoError::FileDoesNotExist`] if the path does not exist and
/// [`IoError::ImageDecodeError`] if the content cannot be decoded.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Rgb8, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    log::debug!("decoded {} ({:?}) from {}", size, img.color(), file_path.display());

    let image = Image::new(size, img.into_rgb8().into_raw())?;

    Ok(image)
}

fn write_png<const C: usize>(
    file_path: &Path,
    image: &Image<u8, C>,
    color_type: image::ColorType,
) -> Result<(), IoError> {
    image::save_buffer_with_format(
        file_path,
        image.as_slice(),
        image.width() as u32,
        image.height() as u32,
        color_type,
        image::ImageFormat::Png,
    )
    .map_err(|e| IoError::PngEncodingError(e.to_string()))?;

    log::debug!("wrote {} png to {}", image.size(), file_path.display());

    Ok(())
}

/// Writes a grayscale image to the given path as an 8-bit PNG.
///
/// # Arguments
///
/// * `file_path` - The destination path.
/// * `image` - The single channel image to encode.
pub fn write_image_png_gray8(file_path: impl AsRef<Path>, image: &Gray8) -> Result<(), IoError> {
    write_png(file_path.as_ref(), image, image::ColorType::L8)
}

/// Writes an RGB image to the given path as an 8-bit PNG.
///
/// # Arguments
///
/// * `file_path` - The destination path.
/// * `image` - The three channel image to encode.
pub fn write_image_png_rgb8(file_path: impl AsRef<Path>, image: &Rgb8) -> Result<(), IoError> {
    write_png(file_path.as_ref(), image, image::ColorType::Rgb8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_read_rgb8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("rgb.png");

        let image = Rgb8::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![255, 0, 0, 10, 20, 30],
        )?;
        write_image_png_rgb8(&file_path, &image)?;

        let decoded = read_image_any_rgb8(&file_path)?;
        assert_eq!(decoded, image);

        Ok(())
    }

    #[test]
    fn write_gray8_read_rgb8() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("gray.png");

        let image = Gray8::new(
            ImageSize {
                width: 3,
                height: 2,
            },
            vec![0, 50, 100, 150, 200, 255],
        )?;
        write_image_png_gray8(&file_path, &image)?;

        let decoded = read_image_any_rgb8(&file_path)?;
        assert_eq!(decoded.size(), image.size());
        assert_eq!(decoded.channel(0)?, image);
        assert_eq!(decoded.channel(2)?, image);

        Ok(())
    }

    #[test]
    fn read_missing_file() {
        let res = read_image_any_rgb8("does/not/exist.png");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }

    #[test]
    fn read_garbage_file() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("garbage.png");
        std::fs::write(&file_path, b"definitely not an image")?;

        let res = read_image_any_rgb8(&file_path);
        assert!(matches!(res, Err(IoError::ImageDecodeError(_))));

        Ok(())
    }
}
