//! sRGB ↔ CIE L\*a\*b\* conversion for stretch processing.
//!
//! Channels are encoded into the 8-bit Lab range convention (`L·255/100`,
//! `a+128`, `b+128`) so the same numeric targets and the percentile
//! quantizer work identically in both color spaces.

use image::RgbImage;
use palette::{IntoColor, Lab, LinSrgb, Srgb};

use crate::cloud::FloatImage;

/// Convert an 8-bit sRGB image to byte-range L\*a\*b\* planes.
#[must_use]
pub fn srgb_to_lab(img: &RgbImage) -> FloatImage {
    let mut samples = Vec::with_capacity(img.as_raw().len());
    for pixel in img.pixels() {
        let srgb = Srgb::new(
            f32::from(pixel[0]) / 255.0,
            f32::from(pixel[1]) / 255.0,
            f32::from(pixel[2]) / 255.0,
        );
        let lin: LinSrgb<f32> = srgb.into_linear();
        let lab: Lab = lin.into_color();
        samples.push(f64::from(lab.l) * 255.0 / 100.0);
        samples.push(f64::from(lab.a) + 128.0);
        samples.push(f64::from(lab.b) + 128.0);
    }
    FloatImage::new(img.width(), img.height(), 3, samples)
}

/// Convert byte-range L\*a\*b\* planes back to an 8-bit sRGB image.
///
/// Out-of-gamut results are clamped to the displayable range.
///
/// # Panics
///
/// Panics if the image does not have exactly 3 channels.
#[must_use]
pub fn lab_to_srgb(img: &FloatImage) -> RgbImage {
    assert_eq!(img.channels(), 3, "Lab image needs exactly 3 channels");

    let mut out = RgbImage::new(img.width(), img.height());
    #[allow(clippy::cast_possible_truncation)]
    for (chunk, pixel) in img.samples().chunks_exact(3).zip(out.pixels_mut()) {
        let lab = Lab::new(
            (chunk[0] * 100.0 / 255.0) as f32,
            (chunk[1] - 128.0) as f32,
            (chunk[2] - 128.0) as f32,
        );
        let lin: LinSrgb<f32> = lab.into_color();
        let srgb: Srgb<f32> = Srgb::from_linear(lin);
        #[allow(clippy::cast_sign_loss)]
        {
            pixel[0] = (srgb.red.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
            pixel[1] = (srgb.green.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
            pixel[2] = (srgb.blue.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        }
    }
    out
}
