// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Anything that can be used as a tag number inside an IFD
pub trait TiffTag: Into<u16> + Copy {}

impl TiffTag for u16 {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum TiffCommonTag {
  NewSubFileType = 0x00FE,
  ImageWidth = 0x0100,
  ImageLength = 0x0101,
  BitsPerSample = 0x0102,
  Compression = 0x0103,
  PhotometricInt = 0x0106,
  Make = 0x010F,
  Model = 0x0110,
  StripOffsets = 0x0111,
  Orientation = 0x0112,
  SamplesPerPixel = 0x0115,
  RowsPerStrip = 0x0116,
  StripByteCounts = 0x0117,
  PlanarConfiguration = 0x011C,
  Software = 0x0131,
  DateTime = 0x0132,
  Artist = 0x013B,
  SubIFDs = 0x014A,
  CFARepeatPatternDim = 0x828D,
  CFAPattern = 0x828E,
}

impl TiffTag for TiffCommonTag {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum DngTag {
  DNGVersion = 0xC612,
  DNGBackwardVersion = 0xC613,
  UniqueCameraModel = 0xC614,
  LinearizationTable = 0xC618,
  WhiteLevel = 0xC61D,
  ColorMatrix1 = 0xC621,
  AsShotNeutral = 0xC628,
  CalibrationIlluminant1 = 0xC65A,
  OriginalRawFileName = 0xC68B,
}

impl TiffTag for DngTag {}

/// Human readable name for a known tag number
pub fn tag_name(tag: u16) -> Option<String> {
  if let Ok(t) = TiffCommonTag::try_from(tag) {
    Some(format!("{:?}", t))
  } else if let Ok(t) = DngTag::try_from(tag) {
    Some(format!("{:?}", t))
  } else {
    None
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tag_numbers() {
    assert_eq!(u16::from(TiffCommonTag::SubIFDs), 330);
    assert_eq!(u16::from(TiffCommonTag::CFAPattern), 33422);
    assert_eq!(u16::from(DngTag::LinearizationTable), 50712);
    assert_eq!(u16::from(DngTag::OriginalRawFileName), 50827);
  }

  #[test]
  fn names_for_known_tags() {
    assert_eq!(tag_name(50717).as_deref(), Some("WhiteLevel"));
    assert_eq!(tag_name(254).as_deref(), Some("NewSubFileType"));
    assert_eq!(tag_name(1), None);
  }
}
