// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use thiserror::Error;

pub mod entry;
pub mod ifd;
pub mod reader;
pub mod value;
pub mod writer;

pub use entry::Entry;
pub use ifd::IFD;
pub use reader::{Endian, GenericTiffReader};
pub use value::{Rational, SRational, TiffAscii, Value};
pub use writer::{DirectoryWriter, OffsetSlot, StripWriter, Strips, TiffWriter};

const TIFF_MAGIC: u16 = 42;

#[allow(clippy::upper_case_acronyms)]
pub enum CompressionMethod {
  None = 1,
}

impl From<CompressionMethod> for Value {
  fn from(value: CompressionMethod) -> Self {
    Value::Short(vec![value as u16])
  }
}

#[allow(clippy::upper_case_acronyms)]
pub enum PhotometricInterpretation {
  RGB = 2,
  // Defined by DNG
  CFA = 32803,
}

impl From<PhotometricInterpretation> for Value {
  fn from(value: PhotometricInterpretation) -> Self {
    Value::Short(vec![value as u16])
  }
}

pub enum PlanarConfiguration {
  Chunky = 1,
}

impl From<PlanarConfiguration> for Value {
  fn from(value: PlanarConfiguration) -> Self {
    Value::Short(vec![value as u16])
  }
}

pub enum Orientation {
  TopLeft = 1,
}

impl From<Orientation> for Value {
  fn from(value: Orientation) -> Self {
    Value::Short(vec![value as u16])
  }
}

/// Values for the NewSubFileType tag
pub enum SubFileType {
  FullImage = 0,
  ReducedImage = 1,
}

impl From<SubFileType> for Value {
  fn from(value: SubFileType) -> Self {
    Value::Long(vec![value as u32])
  }
}

/// Error variants for TIFF reading and writing
#[derive(Debug, Error)]
pub enum TiffError {
  /// Overflow of input, size constraints...
  #[error("Overflow error: {}", _0)]
  Overflow(String),

  #[error("General error: {}", _0)]
  General(String),

  #[error("Format mismatch: {}", _0)]
  FormatMismatch(String),

  /// Error on internal cursor type
  #[error("I/O error: {:?}", _0)]
  Io(#[from] std::io::Error),
}

/// Result type for TIFF operations
pub type Result<T> = std::result::Result<T, TiffError>;
