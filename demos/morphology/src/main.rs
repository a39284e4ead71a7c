use argh::FromArgs;
use std::path::PathBuf;

use morpher::{
    image::{Gray8, Image, Rgb8},
    imgproc::{
        color, morphology,
        padding::PaddingMode,
        parallel::ExecutionStrategy,
        threshold::{self, ThresholdError, ThresholdPolicy, ThresholdType, MAX_INTENSITY},
    },
    io::functional as F,
};

#[derive(FromArgs)]
/// Apply morphological operations and thresholds to an image and log them to Rerun
struct Args {
    /// path to an input image
    #[argh(option, short = 'i')]
    image_path: PathBuf,

    /// kernel size (default: 4)
    #[argh(option, short = 's', default = "4")]
    kernel_size: usize,

    /// kernel shape: box, cross, ellipse (default: box)
    #[argh(option, short = 'k', default = "String::from(\"box\")")]
    kernel_shape: String,

    /// directory where every result is also written as png
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,

    /// do not spawn the rerun viewer
    #[argh(switch)]
    no_viewer: bool,
}

/// Where the intermediate results go.
struct Display {
    rec: Option<rerun::RecordingStream>,
    output_dir: Option<PathBuf>,
}

impl Display {
    // entity paths are flattened into file names, e.g. `operations/erode.png`
    // becomes `operations_erode.png`
    fn file_path(&self, name: &str) -> Option<PathBuf> {
        self.output_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.png", name.replace('/', "_"))))
    }

    fn show_rgb(&self, name: &str, image: &Rgb8) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(rec) = &self.rec {
            rec.log(
                name,
                &rerun::Image::from_elements(
                    image.as_slice(),
                    image.size().into(),
                    rerun::ColorModel::RGB,
                ),
            )?;
        }

        if let Some(path) = self.file_path(name) {
            F::write_image_png_rgb8(path, image)?;
        }

        Ok(())
    }

    fn show_gray(&self, name: &str, image: &Gray8) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(rec) = &self.rec {
            let mut rgb = Rgb8::from_size_val(image.size(), 0)?;
            color::rgb_from_gray(image, &mut rgb)?;
            rec.log(
                name,
                &rerun::Image::from_elements(
                    rgb.as_slice(),
                    rgb.size().into(),
                    rerun::ColorModel::RGB,
                ),
            )?;
        }

        if let Some(path) = self.file_path(name) {
            F::write_image_png_gray8(path, image)?;
        }

        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let rec = if args.no_viewer {
        None
    } else {
        Some(rerun::RecordingStreamBuilder::new("Morpher Morphology").spawn()?)
    };

    if let Some(dir) = &args.output_dir {
        std::fs::create_dir_all(dir)?;
    }

    let display = Display {
        rec,
        output_dir: args.output_dir,
    };

    // read the image
    let rgb = F::read_image_any_rgb8(&args.image_path)?;
    log::info!("read {} image from {}", rgb.size(), args.image_path.display());
    display.show_rgb("original", &rgb)?;

    let kernel_shape = match args.kernel_shape.as_str() {
        "cross" => morphology::KernelShape::Cross {
            size: args.kernel_size,
        },
        "ellipse" => morphology::KernelShape::Ellipse {
            width: args.kernel_size,
            height: args.kernel_size,
        },
        _ => morphology::KernelShape::Box {
            size: args.kernel_size,
        },
    };
    let kernel = morphology::Kernel::new(kernel_shape);
    log::info!("using {kernel_shape:?} kernel");

    // apply all morphological operations on the colour image
    let mut eroded = Image::<u8, 3>::from_size_val(rgb.size(), 0)?;
    morphology::erode(&rgb, &mut eroded, &kernel, PaddingMode::Replicate, [0; 3])?;
    display.show_rgb("operations/erode", &eroded)?;

    let mut dilated = Image::<u8, 3>::from_size_val(rgb.size(), 0)?;
    morphology::dilate(&rgb, &mut dilated, &kernel, PaddingMode::Replicate, [0; 3])?;
    display.show_rgb("operations/dilate", &dilated)?;

    let mut opened = Image::<u8, 3>::from_size_val(rgb.size(), 0)?;
    morphology::open(&rgb, &mut opened, &kernel, PaddingMode::Replicate, [0; 3])?;
    display.show_rgb("operations/open", &opened)?;

    let mut closed = Image::<u8, 3>::from_size_val(rgb.size(), 0)?;
    morphology::close(&rgb, &mut closed, &kernel, PaddingMode::Replicate, [0; 3])?;
    display.show_rgb("operations/close", &closed)?;

    // rgb to grayscale
    let mut gray = Gray8::from_size_val(rgb.size(), 0)?;
    color::gray_from_rgb_u8(&rgb, &mut gray)?;
    display.show_gray("grayscale", &gray)?;

    // fixed thresholds at the middle of the intensity range
    let midpoint = MAX_INTENSITY / 2;

    let mut binary = Gray8::from_size_val(gray.size(), 0)?;
    threshold::threshold_binary(
        &gray,
        &mut binary,
        midpoint,
        MAX_INTENSITY,
        ExecutionStrategy::default(),
    )?;
    display.show_gray("threshold/binary", &binary)?;

    let mut binary_inv = Gray8::from_size_val(gray.size(), 0)?;
    threshold::threshold_binary_inverse(
        &gray,
        &mut binary_inv,
        midpoint,
        MAX_INTENSITY,
        ExecutionStrategy::default(),
    )?;
    display.show_gray("threshold/binary_inverse", &binary_inv)?;

    // estimated thresholds
    let mut average = Gray8::from_size_val(gray.size(), 0)?;
    let t = threshold::threshold_with_policy(
        &gray,
        &mut average,
        ThresholdPolicy::GlobalAverage,
        ThresholdType::Binary,
        MAX_INTENSITY,
    )?;
    log::info!("average threshold: {t}");
    display.show_gray("threshold/average", &average)?;

    let mut mean = Gray8::from_size_val(gray.size(), 0)?;
    match threshold::threshold_with_policy(
        &gray,
        &mut mean,
        ThresholdPolicy::TwoClassMean,
        ThresholdType::Binary,
        MAX_INTENSITY,
    ) {
        Ok(t) => {
            log::info!("mean threshold: {t}");
            display.show_gray("threshold/mean", &mean)?;
        }
        Err(err @ ThresholdError::DegenerateClass { .. }) => {
            log::warn!("skipping mean threshold: {err}");
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
