//! File-processing driver around the stretch pipeline.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::cloud::FloatImage;
use crate::colorspace;
use crate::error::{Error, Result};
use crate::quantize::{self, DEFAULT_P_HIGH, DEFAULT_P_LOW};
use crate::transform::{decorrelation_stretch, StretchTargets};

/// Color space the stretch runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    /// Stretch the sRGB channels directly.
    Rgb,
    /// Convert to CIE L\*a\*b\* first (the reference tool's primary mode;
    /// separates luminance from chroma so color differences stretch
    /// independently of brightness).
    Lab,
}

/// Options controlling stretch processing behavior.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Color space to stretch in.
    pub colorspace: ColorSpace,
    /// Desired output mean, broadcast to every channel. `None` keeps the
    /// input's own per-channel mean.
    pub target_mean: Option<f64>,
    /// Desired output standard deviation, broadcast to every channel.
    /// `None` keeps the input's own per-channel sigma.
    pub target_sigma: Option<f64>,
    /// Low percentile cut for byte quantization.
    pub p_low: f64,
    /// High percentile cut for byte quantization.
    pub p_high: f64,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            colorspace: ColorSpace::Lab,
            target_mean: None,
            target_sigma: None,
            p_low: DEFAULT_P_LOW,
            p_high: DEFAULT_P_HIGH,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (nothing to stretch).
    pub skipped: bool,
    /// Human-readable status message.
    pub message: String,
}

/// Stretch an in-memory RGB image according to the options.
///
/// # Errors
///
/// Returns [`Error::DegenerateInput`] for images whose channels carry no
/// independent variance (constant or perfectly correlated colors).
pub fn stretch_rgb_image(img: &RgbImage, opts: &ProcessOptions) -> Result<RgbImage> {
    let targets = StretchTargets::uniform(opts.target_mean, opts.target_sigma, 3);
    match opts.colorspace {
        ColorSpace::Rgb => {
            let float = FloatImage::from_rgb8(img);
            let stretched = decorrelation_stretch(&float, &targets)?;
            Ok(quantize::quantize(&stretched, opts.p_low, opts.p_high).to_rgb8())
        }
        ColorSpace::Lab => {
            let lab = colorspace::srgb_to_lab(img);
            let stretched = decorrelation_stretch(&lab, &targets)?;
            let bytes = quantize::quantize(&stretched, opts.p_low, opts.p_high);
            Ok(colorspace::lab_to_srgb(&bytes))
        }
    }
}

/// Process a single image file: load, stretch, quantize, save.
///
/// Degenerate inputs (e.g. a solid-color image) are reported as skipped
/// rather than failed; there is nothing to enhance in them.
#[must_use]
pub fn process_file(input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
    let mut result = ProcessResult {
        path: input.to_path_buf(),
        success: false,
        skipped: false,
        message: String::new(),
    };

    let dyn_img = match image::open(input) {
        Ok(img) => img,
        Err(e) => {
            result.message = format!("Failed to load: {e}");
            return result;
        }
    };
    let rgb_img = dyn_img.to_rgb8();

    let stretched = match stretch_rgb_image(&rgb_img, opts) {
        Ok(img) => img,
        Err(e @ Error::DegenerateInput { .. }) => {
            result.skipped = true;
            result.success = true;
            result.message = format!("No channel variance to stretch: {e}");
            return result;
        }
        Err(e) => {
            result.message = format!("Stretch failed: {e}");
            return result;
        }
    };

    if let Some(parent) = output.parent() {
        if !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                result.message = format!("Failed to create output directory: {e}");
                return result;
            }
        }
    }

    match save_image(&stretched, output) {
        Ok(()) => {
            result.success = true;
            result.message = "Stretched".to_string();
        }
        Err(e) => {
            result.message = format!("Failed to save: {e}");
        }
    }

    result
}

/// Process all supported images in a directory.
///
/// Uses parallel iteration when the `cli` feature is enabled (via rayon).
/// Returns a [`ProcessResult`] for each image found.
///
/// # Panics
///
/// Panics if any directory entry has no filename (should not happen for
/// regular files).
#[must_use]
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult> {
    let entries: Vec<_> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .filter(|e| is_supported_image(e.path().as_path()))
            .collect(),
        Err(e) => {
            return vec![ProcessResult {
                path: input_dir.to_path_buf(),
                success: false,
                skipped: false,
                message: format!("Failed to read directory: {e}"),
            }];
        }
    };

    if !output_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            return vec![ProcessResult {
                path: output_dir.to_path_buf(),
                success: false,
                skipped: false,
                message: format!("Failed to create output directory: {e}"),
            }];
        }
    }

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        entries
            .par_iter()
            .map(|entry| {
                let input_path = entry.path();
                let filename = input_path.file_name().unwrap();
                let output_path = output_dir.join(filename);
                process_file(&input_path, &output_path, opts)
            })
            .collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        entries
            .iter()
            .map(|entry| {
                let input_path = entry.path();
                let filename = input_path.file_name().unwrap();
                let output_path = output_dir.join(filename);
                process_file(&input_path, &output_path, opts)
            })
            .collect()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp" | "tif" | "tiff"
        ),
        None => false,
    }
}

/// Save an RGB image with format-specific quality settings.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgb8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp | ImageFormat::Tiff => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"scene.jpg"` becomes `"scene_dcs.jpg"`, matching the reference
/// processor's `-dcs` suffix convention.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_dcs.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy_gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let base = (x * 7 + y * 13) % 200;
            #[allow(clippy::cast_possible_truncation)]
            let r = (base + 20) as u8;
            #[allow(clippy::cast_possible_truncation)]
            let g = (base + (x * x + 3 * y) % 31) as u8;
            #[allow(clippy::cast_possible_truncation)]
            let b = (base / 2 + (y * y + x) % 47) as u8;
            image::Rgb([r, g, b])
        })
    }

    #[test]
    fn stretch_rgb_keeps_dimensions() {
        let img = noisy_gradient(16, 12);
        for colorspace in [ColorSpace::Rgb, ColorSpace::Lab] {
            let opts = ProcessOptions {
                colorspace,
                ..ProcessOptions::default()
            };
            let out = stretch_rgb_image(&img, &opts).unwrap();
            assert_eq!(out.dimensions(), (16, 12));
        }
    }

    #[test]
    fn solid_color_image_is_degenerate() {
        let img = RgbImage::from_pixel(8, 8, image::Rgb([90, 90, 90]));
        let err = stretch_rgb_image(&img, &ProcessOptions::default()).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput { .. }));
    }

    #[test]
    fn default_output_path_appends_dcs_suffix() {
        let p = default_output_path(Path::new("/tmp/scene.jpg"));
        assert_eq!(p, PathBuf::from("/tmp/scene_dcs.jpg"));

        let p = default_output_path(Path::new("image.png"));
        assert_eq!(p.file_name().unwrap().to_str().unwrap(), "image_dcs.png");
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("scene.jpg")));
        assert!(is_supported_image(Path::new("scene.JPEG")));
        assert!(is_supported_image(Path::new("scene.png")));
        assert!(is_supported_image(Path::new("scene.tif")));
        assert!(is_supported_image(Path::new("scene.webp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("scene.gif")));
        assert!(!is_supported_image(Path::new("scene.txt")));
        assert!(!is_supported_image(Path::new("scene")));
    }
}
