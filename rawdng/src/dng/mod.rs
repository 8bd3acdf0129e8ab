// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

pub mod convert;
pub mod writer;

use std::{
  fmt,
  time::{SystemTime, UNIX_EPOCH},
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::formats::tiff::TiffError;

pub use convert::{ConvertParams, convert, convert_file, encode, encode_file};
pub use writer::DngWriter;

pub const DNG_VERSION_V1_0: [u8; 4] = [1, 0, 0, 0];
pub const DNG_VERSION_V1_1: [u8; 4] = [1, 1, 0, 0];

/// Format of the TIFF DateTime tag
pub const DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Progress of a [`DngWriter`]
///
/// The steps must be done in this order, the writer refuses
/// to skip or repeat a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
  Open,
  ThumbnailWritten,
  RawWritten,
  /// A step failed, the output is incomplete
  Failed,
}

impl fmt::Display for EncoderState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Open => "open",
      Self::ThumbnailWritten => "thumbnail written",
      Self::RawWritten => "raw written",
      Self::Failed => "failed",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Error)]
pub enum DngError {
  #[error("Invalid encoder state: expected {expected}, but writer is {found}")]
  InvalidState { expected: EncoderState, found: EncoderState },

  #[error("TIFF error: {}", _0)]
  Tiff(#[from] TiffError),

  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DngError>;

/// Information about the capture the DNG is created from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
  /// Name of the raw file, without directories
  pub filename: String,
  /// Capture time, usually the modification time of the raw file
  pub timestamp: SystemTime,
}

impl SourceInfo {
  pub fn new(filename: impl Into<String>, timestamp: SystemTime) -> Self {
    Self {
      filename: filename.into(),
      timestamp,
    }
  }

  /// Timestamp in TIFF DateTime format, UTC
  pub fn datetime(&self) -> String {
    DateTime::<Utc>::from(self.timestamp).format(DATETIME_FORMAT).to_string()
  }
}

impl Default for SourceInfo {
  fn default() -> Self {
    Self::new("", UNIX_EPOCH)
  }
}
