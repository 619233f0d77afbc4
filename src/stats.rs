//! Per-channel statistics of a point cloud.

use nalgebra::{DMatrix, DVector};

/// Per-channel mean and population standard deviation of an image treated
/// as a cloud of points in channel space.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelStats {
    /// Arithmetic mean of each channel.
    pub mean: DVector<f64>,
    /// Population standard deviation of each channel (divides by N, not N−1,
    /// consistent with the covariance normalization in
    /// [`principal_components`](crate::eigen::principal_components)).
    pub sigma: DVector<f64>,
}

impl ChannelStats {
    /// Compute statistics over every row (pixel) of the N×n point cloud.
    #[must_use]
    pub fn of(cloud: &DMatrix<f64>) -> Self {
        let mean = cloud.row_mean().transpose();
        let sigma = cloud.row_variance().transpose().map(f64::sqrt);
        Self { mean, sigma }
    }
}
