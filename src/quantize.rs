//! Percentile-based quantization of float planes to the 8-bit range.
//!
//! The stretch leaves samples unbounded; this step maps each channel into
//! 1..=255 by cutting the cumulative distribution of its nonzero samples at
//! a low and a high percentile. Zero samples are treated as nodata and stay
//! zero, which keeps fill regions of clipped rasters black.

use crate::cloud::FloatImage;

/// Default low percentile cut.
pub const DEFAULT_P_LOW: f64 = 0.02;
/// Default high percentile cut.
pub const DEFAULT_P_HIGH: f64 = 0.98;

const BINS: usize = 4096;

/// Quantize one float plane into byte values.
///
/// Builds a histogram of the nonzero samples, finds the values where the
/// cumulative distribution first exceeds `p_low` and `p_high`, and scales
/// that span into 1..=255. Samples outside the span saturate; zeros are
/// passed through unchanged.
#[must_use]
pub fn quantize_plane(samples: &[f64], p_low: f64, p_high: f64) -> Vec<u8> {
    let valid: Vec<f64> = samples.iter().copied().filter(|&v| v != 0.0).collect();
    if valid.is_empty() {
        return vec![0; samples.len()];
    }

    let lo = valid.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = valid.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (min_value, max_value) = if hi - lo <= f64::EPSILON {
        (lo, hi)
    } else {
        percentile_cuts(&valid, lo, hi, p_low, p_high)
    };

    let span = max_value - min_value;
    samples
        .iter()
        .map(|&v| {
            if v == 0.0 {
                0
            } else if span <= f64::EPSILON {
                // flat plane: everything sits at the low cut
                1
            } else {
                let scaled = ((v - min_value) / span * 254.0).round() + 1.0;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let byte = scaled.clamp(1.0, 255.0) as u8;
                byte
            }
        })
        .collect()
}

/// Histogram the samples over `[lo, hi]` and return the bin edges where the
/// CDF first exceeds each percentile.
fn percentile_cuts(valid: &[f64], lo: f64, hi: f64, p_low: f64, p_high: f64) -> (f64, f64) {
    let bin_width = (hi - lo) / BINS as f64;
    let mut counts = [0usize; BINS];
    for &v in valid {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = (((v - lo) / bin_width) as usize).min(BINS - 1);
        counts[bin] += 1;
    }

    #[allow(clippy::cast_precision_loss)]
    let total = valid.len() as f64;
    let mut min_value = lo;
    let mut max_value = hi;
    let mut found_low = false;
    let mut found_high = false;
    let mut cumulative = 0usize;
    for (bin, &count) in counts.iter().enumerate() {
        cumulative += count;
        #[allow(clippy::cast_precision_loss)]
        let cdf = cumulative as f64 / total;
        #[allow(clippy::cast_precision_loss)]
        let left_edge = lo + bin_width * bin as f64;
        if !found_low && cdf > p_low {
            min_value = left_edge;
            found_low = true;
        }
        if !found_high && cdf > p_high {
            max_value = left_edge;
            found_high = true;
            break;
        }
    }
    (min_value, max_value)
}

/// Quantize every channel of a float image.
///
/// The result holds byte values (still stored as floats so it can feed the
/// Lab → sRGB conversion or [`FloatImage::to_rgb8`]).
#[must_use]
pub fn quantize(image: &FloatImage, p_low: f64, p_high: f64) -> FloatImage {
    let planes: Vec<Vec<f64>> = (0..image.channels())
        .map(|c| {
            quantize_plane(&image.plane(c), p_low, p_high)
                .into_iter()
                .map(f64::from)
                .collect()
        })
        .collect();
    FloatImage::from_planes(&planes, image.width(), image.height())
}
