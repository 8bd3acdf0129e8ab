//! Library to convert raw bayer captures of camera modules into
//! DNG files. The sensor properties (color matrix, white balance,
//! CFA layout) are described by [`SensorProfile`] values.
//!
//! # Example
//! ```rust,no_run
//! use rawdng::{ConvertParams, SensorProfile, SourceInfo};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   let data = std::fs::read("capture.raw")?;
//!   let profile = SensorProfile::li5m03()?;
//!   let source = SourceInfo::new("capture.raw", std::fs::metadata("capture.raw")?.modified()?);
//!   rawdng::dng::convert_file(&data, 1280, 720, 1280, &profile, &source, &ConvertParams::default(), "out.dng")?;
//!   Ok(())
//! }
//! ```

#![deny(
    //missing_docs,
    unstable_features,
  )]

pub mod cfa;
pub mod dng;
pub mod formats;
pub mod imgop;
pub mod rawframe;
pub mod sensor;
pub mod tags;

pub use cfa::CFA;
pub use dng::{ConvertParams, SourceInfo};
pub use imgop::gamma::GammaCurve;
pub use rawframe::RawFrame;
pub use sensor::SensorProfile;

use dng::DngError;
use formats::tiff::TiffError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Value of the Software tag
pub const SOFTWARE: &str = concat!("rawdng ", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum RawDngError {
  /// Parameters failed validation, nothing was written
  #[error("Invalid parameter: {}", _0)]
  InvalidParameter(String),

  /// Input buffer is too small for the image geometry
  #[error("Insufficient input: {}", _0)]
  InsufficientInput(String),

  #[error("I/O error on file {:?}: {}", path, source)]
  Io { path: PathBuf, source: std::io::Error },

  #[error("DNG encoder error: {}", _0)]
  Dng(#[from] DngError),

  #[error("TIFF error: {}", _0)]
  Tiff(#[from] TiffError),

  #[error("Sensor profile error: {}", _0)]
  Profile(String),
}

pub type Result<T> = std::result::Result<T, RawDngError>;

impl RawDngError {
  pub fn with_io_error(path: impl AsRef<Path>, error: std::io::Error) -> Self {
    Self::Io {
      path: path.as_ref().to_path_buf(),
      source: error,
    }
  }
}

#[cfg(test)]
pub(crate) fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}
