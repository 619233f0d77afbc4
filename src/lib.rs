//! Decorrelation stretch (DStretch) for multichannel images.
//!
//! A decorrelation stretch removes the linear correlation between image
//! channels and rescales each to a target spread, making subtle color
//! differences visible that strong channel correlation otherwise masks
//! (rock-art panels, geological imagery, vegetation surveys). The input is
//! treated as a cloud of points in channel space: it is rotated into the
//! eigenspace of its own covariance, normalized to unit variance per axis,
//! rotated back, and re-centered on the requested mean and sigma.
//!
//! # Quick Start
//!
//! ```no_run
//! use dstretch::{stretch_rgb_image, ProcessOptions};
//!
//! let img = image::open("scene.jpg").unwrap().to_rgb8();
//! let enhanced = stretch_rgb_image(&img, &ProcessOptions::default()).unwrap();
//! enhanced.save("scene_dcs.jpg").unwrap();
//! ```
//!
//! # Core transform
//!
//! The linear-algebra core is exposed directly for callers that manage their
//! own image representation. It is a pure function over a float image and
//! never clamps; quantization to a storable range is a separate step.
//!
//! ```
//! use dstretch::{decorrelation_stretch, FloatImage, StretchTargets};
//!
//! let image = FloatImage::new(2, 2, 2, vec![0.0, 1.0, 10.0, 2.0, 0.0, 12.0, 10.0, 14.0]);
//! let targets = StretchTargets::uniform(Some(120.0), Some(50.0), 2);
//! let out = decorrelation_stretch(&image, &targets).unwrap();
//! assert_eq!(out.channels(), 2);
//! ```

#![deny(missing_docs)]

mod cloud;
pub mod colorspace;
pub mod eigen;
mod engine;
pub mod error;
pub mod quantize;
pub mod stats;
pub mod transform;

pub use cloud::FloatImage;
pub use engine::{
    default_output_path, is_supported_image, process_directory, process_file, save_image,
    stretch_rgb_image, ColorSpace, ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use transform::{decorrelation_stretch, StretchTargets, EIGENVALUE_EPSILON};
