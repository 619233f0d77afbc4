//! Float image storage and the image ↔ point-cloud reshaping pair.
//!
//! The stretch itself is pure linear algebra over an N×n matrix (one pixel
//! per row, one channel per column); spatial layout only matters when
//! flattening the image into that matrix and when reshaping the result back.

use image::RgbImage;
use nalgebra::DMatrix;

/// A floating-point image: `width * height` pixels with `channels` samples
/// each, stored row-major interleaved.
///
/// Values are unbounded; out-of-range samples are legitimate intermediate
/// results and only get forced into a storable range by
/// [`quantize`](crate::quantize::quantize).
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    width: u32,
    height: u32,
    channels: usize,
    samples: Vec<f64>,
}

impl FloatImage {
    /// Create an image from interleaved samples.
    ///
    /// # Panics
    ///
    /// Panics if `samples.len() != width * height * channels`.
    #[must_use]
    pub fn new(width: u32, height: u32, channels: usize, samples: Vec<f64>) -> Self {
        assert_eq!(
            samples.len(),
            (width as usize) * (height as usize) * channels,
            "sample buffer does not match {width}x{height}x{channels}"
        );
        Self {
            width,
            height,
            channels,
            samples,
        }
    }

    /// Convert an 8-bit RGB image, keeping the 0..=255 value range.
    #[must_use]
    pub fn from_rgb8(img: &RgbImage) -> Self {
        let samples = img.as_raw().iter().map(|&v| f64::from(v)).collect();
        Self::new(img.width(), img.height(), 3, samples)
    }

    /// Image width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of channels per pixel.
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Interleaved row-major samples.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Extract one channel as a contiguous plane.
    ///
    /// # Panics
    ///
    /// Panics if `channel >= self.channels()`.
    #[must_use]
    pub fn plane(&self, channel: usize) -> Vec<f64> {
        assert!(channel < self.channels, "channel {channel} out of range");
        self.samples
            .iter()
            .skip(channel)
            .step_by(self.channels)
            .copied()
            .collect()
    }

    /// Assemble an image from per-channel planes.
    ///
    /// # Panics
    ///
    /// Panics if the planes differ in length or do not cover `width * height`
    /// pixels.
    #[must_use]
    pub fn from_planes(planes: &[Vec<f64>], width: u32, height: u32) -> Self {
        let pixels = (width as usize) * (height as usize);
        assert!(
            planes.iter().all(|p| p.len() == pixels),
            "every plane must hold {pixels} samples"
        );
        let channels = planes.len();
        let mut samples = Vec::with_capacity(pixels * channels);
        for i in 0..pixels {
            for plane in planes {
                samples.push(plane[i]);
            }
        }
        Self::new(width, height, channels, samples)
    }

    /// Flatten to the N×n point-cloud matrix (one pixel per row).
    #[must_use]
    pub fn to_point_cloud(&self) -> DMatrix<f64> {
        let pixels = (self.width as usize) * (self.height as usize);
        DMatrix::from_row_iterator(pixels, self.channels, self.samples.iter().copied())
    }

    /// Reshape an N×n point cloud back into an image of the given dimensions.
    ///
    /// # Panics
    ///
    /// Panics if the matrix row count does not equal `width * height`.
    #[must_use]
    pub fn from_point_cloud(cloud: &DMatrix<f64>, width: u32, height: u32) -> Self {
        let pixels = (width as usize) * (height as usize);
        assert_eq!(cloud.nrows(), pixels, "point cloud does not cover the image");
        let channels = cloud.ncols();
        let mut samples = Vec::with_capacity(pixels * channels);
        for row in cloud.row_iter() {
            samples.extend(row.iter().copied());
        }
        Self::new(width, height, channels, samples)
    }

    /// Convert a 3-channel image with 0..=255 values to an 8-bit RGB image.
    ///
    /// Samples are rounded and clamped; callers wanting percentile scaling
    /// should run [`quantize`](crate::quantize::quantize) first.
    ///
    /// # Panics
    ///
    /// Panics if the image does not have exactly 3 channels.
    #[must_use]
    pub fn to_rgb8(&self) -> RgbImage {
        assert_eq!(self.channels, 3, "RGB output needs exactly 3 channels");
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let raw: Vec<u8> = self
            .samples
            .iter()
            .map(|&v| v.round().clamp(0.0, 255.0) as u8)
            .collect();
        RgbImage::from_raw(self.width, self.height, raw)
            .expect("raw buffer length was validated at construction")
    }
}
