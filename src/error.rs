//! Error types for the dstretch crate.

/// Errors that can occur while computing or applying a decorrelation stretch.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The image has too few channels for a covariance-based stretch.
    #[error("decorrelation stretch needs at least 2 channels, got {channels}")]
    ChannelCount {
        /// Number of channels in the offending image.
        channels: usize,
    },

    /// A target mean or sigma vector does not match the channel count.
    #[error("target {kind} has {actual} entries, expected {expected} (one per channel)")]
    TargetLength {
        /// Which target vector was malformed ("mean" or "sigma").
        kind: &'static str,
        /// Channel count of the image.
        expected: usize,
        /// Length of the supplied vector.
        actual: usize,
    },

    /// A covariance eigenvalue is (numerically) zero, so the inverse scale
    /// is undefined. Happens when a channel is constant or exactly linearly
    /// dependent on the others.
    #[error(
        "degenerate input: eigenvalue {eigenvalue:.3e} for component {component} is below {epsilon:.0e}"
    )]
    DegenerateInput {
        /// Index of the offending principal component.
        component: usize,
        /// The eigenvalue that failed the guard.
        eigenvalue: f64,
        /// The epsilon threshold it was compared against.
        epsilon: f64,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
