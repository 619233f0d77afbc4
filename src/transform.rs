//! The decorrelation-stretch transform.
//!
//! The input image is flattened to an N×n point cloud, rotated into the
//! eigenspace of its own covariance, normalized to unit variance per axis,
//! rotated back, and stretched to the requested per-channel sigma:
//!
//! ```text
//! out_row = (in_row − mean) · E·Sc·Eᵗ·St + target_mean
//! ```
//!
//! with `E` the eigenvector matrix (columns), `Sc = diag(1/sqrt(λ_i))` and
//! `St = diag(target_sigma)`. The output keeps the input's spatial shape and
//! stays floating point; see [`quantize`](crate::quantize) for storage.

use nalgebra::{DMatrix, DVector};

use crate::cloud::FloatImage;
use crate::eigen::{principal_components, Eigenbasis};
use crate::error::{Error, Result};
use crate::stats::ChannelStats;

/// Eigenvalues at or below this threshold are treated as degenerate: the
/// inverse scale 1/sqrt(λ) would blow up on a channel that carries no
/// independent variance.
pub const EIGENVALUE_EPSILON: f64 = 1e-9;

/// Desired output statistics for a stretch.
///
/// `None` keeps the input's own mean or sigma for that parameter. Supplied
/// vectors must have one entry per channel; mismatches are rejected before
/// any computation runs.
#[derive(Debug, Clone, Default)]
pub struct StretchTargets {
    /// Desired per-channel mean of the output.
    pub mean: Option<DVector<f64>>,
    /// Desired per-channel standard deviation of the output.
    pub sigma: Option<DVector<f64>>,
}

impl StretchTargets {
    /// Keep the input's own mean and sigma.
    #[must_use]
    pub fn preserve() -> Self {
        Self::default()
    }

    /// Broadcast scalar targets to every channel, the way the reference
    /// tool's per-image constants worked (e.g. mean 120, sigma 50).
    #[must_use]
    pub fn uniform(mean: Option<f64>, sigma: Option<f64>, channels: usize) -> Self {
        Self {
            mean: mean.map(|m| DVector::from_element(channels, m)),
            sigma: sigma.map(|s| DVector::from_element(channels, s)),
        }
    }

    fn validate(&self, channels: usize) -> Result<()> {
        if let Some(mean) = &self.mean {
            if mean.len() != channels {
                return Err(Error::TargetLength {
                    kind: "mean",
                    expected: channels,
                    actual: mean.len(),
                });
            }
        }
        if let Some(sigma) = &self.sigma {
            if sigma.len() != channels {
                return Err(Error::TargetLength {
                    kind: "sigma",
                    expected: channels,
                    actual: sigma.len(),
                });
            }
        }
        Ok(())
    }
}

/// Apply a decorrelation stretch to a multichannel float image.
///
/// The result has the same spatial dimensions and channel count as the
/// input. The pipeline is a pure function of its arguments: identical
/// inputs produce identical outputs.
///
/// # Errors
///
/// - [`Error::ChannelCount`] if the image has fewer than 2 channels.
/// - [`Error::TargetLength`] if a target vector's length is not the channel
///   count.
/// - [`Error::DegenerateInput`] if a covariance eigenvalue is at or below
///   [`EIGENVALUE_EPSILON`] (constant or exactly collinear channels).
pub fn decorrelation_stretch(image: &FloatImage, targets: &StretchTargets) -> Result<FloatImage> {
    let channels = image.channels();
    if channels < 2 {
        return Err(Error::ChannelCount { channels });
    }
    targets.validate(channels)?;

    let cloud = image.to_point_cloud();
    let stats = ChannelStats::of(&cloud);
    let basis = principal_components(&cloud);

    let transform = compose(&basis, &stats.sigma, targets.sigma.as_ref())?;
    let out_mean = targets.mean.as_ref().unwrap_or(&stats.mean);
    let stretched = apply(&cloud, &stats.mean, out_mean, &transform);

    Ok(FloatImage::from_point_cloud(
        &stretched,
        image.width(),
        image.height(),
    ))
}

/// Build the composed linear map `E·Sc·Eᵗ·St` for right-multiplication of
/// centered row vectors.
fn compose(
    basis: &Eigenbasis,
    own_sigma: &DVector<f64>,
    target_sigma: Option<&DVector<f64>>,
) -> Result<DMatrix<f64>> {
    for (component, &eigenvalue) in basis.values.iter().enumerate() {
        if eigenvalue <= EIGENVALUE_EPSILON {
            return Err(Error::DegenerateInput {
                component,
                eigenvalue,
                epsilon: EIGENVALUE_EPSILON,
            });
        }
    }

    let scale = DMatrix::from_diagonal(&basis.values.map(|v| 1.0 / v.sqrt()));
    let stretch = DMatrix::from_diagonal(target_sigma.unwrap_or(own_sigma));

    Ok(&basis.vectors * scale * basis.vectors.transpose() * stretch)
}

/// Center every row on `own_mean`, push it through the composed map, and
/// re-center on `out_mean`.
fn apply(
    cloud: &DMatrix<f64>,
    own_mean: &DVector<f64>,
    out_mean: &DVector<f64>,
    transform: &DMatrix<f64>,
) -> DMatrix<f64> {
    let own_mean_row = own_mean.transpose();
    let out_mean_row = out_mean.transpose();

    let mut centered = cloud.clone();
    for mut row in centered.row_iter_mut() {
        row -= &own_mean_row;
    }

    let mut out = centered * transform;
    for mut row in out.row_iter_mut() {
        row += &out_mean_row;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use approx::assert_relative_eq;

    /// A 4x3 two-channel image with strong positive correlation between the
    /// channels and enough noise to stay well-conditioned.
    fn correlated_image() -> FloatImage {
        let samples = vec![
            10.0, 12.0, 20.0, 24.0, 30.0, 28.0, 40.0, 43.0, //
            15.0, 13.0, 25.0, 27.0, 35.0, 38.0, 45.0, 42.0, //
            12.0, 11.0, 22.0, 25.0, 32.0, 30.0, 42.0, 45.0,
        ];
        FloatImage::new(4, 3, 2, samples)
    }

    fn covariance(image: &FloatImage) -> DMatrix<f64> {
        let cloud = image.to_point_cloud();
        let stats = ChannelStats::of(&cloud);
        let mut centered = cloud;
        for mut row in centered.row_iter_mut() {
            row -= &stats.mean.transpose();
        }
        #[allow(clippy::cast_precision_loss)]
        let n = centered.nrows() as f64;
        centered.transpose() * &centered / n
    }

    #[test]
    fn output_shape_matches_input() {
        let image = correlated_image();
        let out = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap();
        assert_eq!(out.width(), image.width());
        assert_eq!(out.height(), image.height());
        assert_eq!(out.channels(), image.channels());
    }

    #[test]
    fn mean_preserved_without_target() {
        let image = correlated_image();
        let before = ChannelStats::of(&image.to_point_cloud());
        let out = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap();
        let after = ChannelStats::of(&out.to_point_cloud());
        assert_relative_eq!(after.mean, before.mean, epsilon = 1e-9);
    }

    #[test]
    fn target_mean_and_sigma_are_hit() {
        let image = correlated_image();
        let targets = StretchTargets::uniform(Some(120.0), Some(50.0), 2);
        let out = decorrelation_stretch(&image, &targets).unwrap();
        let stats = ChannelStats::of(&out.to_point_cloud());
        assert_relative_eq!(stats.mean[0], 120.0, epsilon = 1e-8);
        assert_relative_eq!(stats.mean[1], 120.0, epsilon = 1e-8);
        assert_relative_eq!(stats.sigma[0], 50.0, epsilon = 1e-8);
        assert_relative_eq!(stats.sigma[1], 50.0, epsilon = 1e-8);
    }

    #[test]
    fn output_is_decorrelated() {
        let image = correlated_image();
        let cov_in = covariance(&image);
        let corr_in = cov_in[(0, 1)].abs() / (cov_in[(0, 0)] * cov_in[(1, 1)]).sqrt();
        assert!(corr_in > 0.5, "fixture should be strongly correlated");

        let out = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap();
        let cov_out = covariance(&out);
        let corr_out = cov_out[(0, 1)].abs() / (cov_out[(0, 0)] * cov_out[(1, 1)]).sqrt();
        assert!(
            corr_out < 1e-8,
            "cross-channel correlation should vanish, got {corr_out}"
        );
    }

    #[test]
    fn second_pass_with_identity_targets_is_stable() {
        let image = correlated_image();
        let first = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap();

        let stats = ChannelStats::of(&first.to_point_cloud());
        let identity_targets = StretchTargets {
            mean: Some(stats.mean),
            sigma: Some(stats.sigma),
        };
        let second = decorrelation_stretch(&first, &identity_targets).unwrap();

        for (a, b) in first.samples().iter().zip(second.samples()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
    }

    #[test]
    fn already_uncorrelated_square_keeps_its_statistics() {
        // 2x2 image, pixels (0,0), (10,0), (0,10), (10,10): zero correlation,
        // mean (5,5), population sigma (5,5)
        let image = FloatImage::new(2, 2, 2, vec![0.0, 0.0, 10.0, 0.0, 0.0, 10.0, 10.0, 10.0]);
        let out = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap();
        let stats = ChannelStats::of(&out.to_point_cloud());
        assert_relative_eq!(stats.mean[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(stats.mean[1], 5.0, epsilon = 1e-9);
        assert_relative_eq!(stats.sigma[0], 5.0, epsilon = 1e-9);
        assert_relative_eq!(stats.sigma[1], 5.0, epsilon = 1e-9);
    }

    #[test]
    fn single_channel_image_is_rejected() {
        let image = FloatImage::new(2, 2, 1, vec![1.0, 2.0, 3.0, 4.0]);
        let err = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap_err();
        assert!(matches!(err, Error::ChannelCount { channels: 1 }));
    }

    #[test]
    fn wrong_target_length_is_rejected() {
        let image = correlated_image();
        let targets = StretchTargets {
            mean: None,
            sigma: Some(DVector::from_vec(vec![50.0, 50.0, 50.0])),
        };
        let err = decorrelation_stretch(&image, &targets).unwrap_err();
        assert!(matches!(
            err,
            Error::TargetLength {
                kind: "sigma",
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn exactly_collinear_channels_are_rejected() {
        // channel 1 = 2 * channel 0 everywhere
        let image = FloatImage::new(2, 2, 2, vec![1.0, 2.0, 2.0, 4.0, 3.0, 6.0, 4.0, 8.0]);
        let err = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput { .. }));
    }

    #[test]
    fn constant_image_is_rejected_not_nan() {
        let image = FloatImage::new(2, 2, 3, vec![7.0; 12]);
        let err = decorrelation_stretch(&image, &StretchTargets::preserve()).unwrap_err();
        assert!(matches!(err, Error::DegenerateInput { .. }));
    }

    #[test]
    fn deterministic_across_calls() {
        let image = correlated_image();
        let targets = StretchTargets::uniform(Some(120.0), Some(50.0), 2);
        let a = decorrelation_stretch(&image, &targets).unwrap();
        let b = decorrelation_stretch(&image, &targets).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn output_is_not_clamped() {
        // tiny sigma in, huge target sigma out: values must be free to leave 0..=255
        let image = correlated_image();
        let targets = StretchTargets::uniform(Some(0.0), Some(500.0), 2);
        let out = decorrelation_stretch(&image, &targets).unwrap();
        assert!(out.samples().iter().any(|&v| v < 0.0));
        assert!(out.samples().iter().all(|v| v.is_finite()));
    }
}
