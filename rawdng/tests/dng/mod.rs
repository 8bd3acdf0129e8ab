// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::Cursor;

use rawdng::{
  CFA, ConvertParams, GammaCurve, RawDngError, SensorProfile,
  dng::convert_file,
  formats::tiff::{GenericTiffReader, IFD, Rational, SRational, Value},
  tags::{DngTag, TiffCommonTag, TiffTag},
};

use crate::common::{check_md5_equal, convert_and_read, gradient, init_test_logger, source};

type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

fn raw_ifd(reader: &GenericTiffReader) -> &IFD {
  let subs = reader.root_ifd().sub_ifds(TiffCommonTag::SubIFDs);
  assert_eq!(subs.len(), 1, "DNG must have exactly one raw SubIFD");
  &subs[0]
}

fn u32_of(ifd: &IFD, tag: impl TiffTag) -> Option<u32> {
  ifd.get_entry(tag).map(|e| e.force_u32(0))
}

#[test]
fn hd_frame_dimensions() -> TestResult {
  init_test_logger();
  let data = gradient(1280, 720, 1280);
  let (_, reader) = convert_and_read(&data, 1280, 720, 1280, &ConvertParams::default())?;

  assert_eq!(reader.chain().len(), 1);
  let root = reader.root_ifd();
  assert_eq!(u32_of(root, TiffCommonTag::NewSubFileType), Some(1));
  assert_eq!(u32_of(root, TiffCommonTag::ImageWidth), Some(80));
  assert_eq!(u32_of(root, TiffCommonTag::ImageLength), Some(45));
  assert_eq!(u32_of(root, TiffCommonTag::PhotometricInt), Some(2));
  assert_eq!(u32_of(root, TiffCommonTag::SamplesPerPixel), Some(3));

  let raw = raw_ifd(&reader);
  assert_eq!(u32_of(raw, TiffCommonTag::NewSubFileType), Some(0));
  assert_eq!(u32_of(raw, TiffCommonTag::ImageWidth), Some(1280));
  assert_eq!(u32_of(raw, TiffCommonTag::ImageLength), Some(720));
  assert_eq!(u32_of(raw, TiffCommonTag::PhotometricInt), Some(32803));
  assert_eq!(u32_of(raw, TiffCommonTag::BitsPerSample), Some(8));
  assert_eq!(u32_of(raw, DngTag::WhiteLevel), Some(0x3fff));
  assert_eq!(reader.find_ifd_with_new_subfile_type(0).map(|ifd| ifd.offset), Some(raw.offset));
  Ok(())
}

#[test]
fn unaligned_width_creates_no_file() -> TestResult {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("out.dng");
  let data = vec![0; 1281 * 720];
  let profile = SensorProfile::li5m03()?;
  let result = convert_file(&data, 1281, 720, 1281, &profile, &source(), &ConvertParams::default(), &path);
  assert!(matches!(result, Err(RawDngError::InvalidParameter(_))));
  assert!(!path.exists());
  Ok(())
}

#[test]
fn short_buffer_creates_no_file() -> TestResult {
  let dir = tempfile::tempdir()?;
  let path = dir.path().join("out.dng");
  let data = vec![0; 16 * 16 - 1];
  let profile = SensorProfile::li5m03()?;
  let result = convert_file(&data, 16, 16, 16, &profile, &source(), &ConvertParams::default(), &path);
  assert!(matches!(result, Err(RawDngError::InsufficientInput(_))));
  assert!(!path.exists());
  Ok(())
}

#[test]
fn linearization_table_roundtrip() -> TestResult {
  let data = gradient(64, 32, 64);
  for gamma in [100.0, 180.0, 220.0] {
    let params = ConvertParams { gamma, ..Default::default() };
    let (_, reader) = convert_and_read(&data, 64, 32, 64, &params)?;
    let table = raw_ifd(&reader).get_entry(DngTag::LinearizationTable).map(|e| e.value.clone());
    assert_eq!(table, Some(Value::Short(GammaCurve::new(gamma).as_slice().to_vec())));
  }
  Ok(())
}

#[test]
fn cfa_pattern_roundtrip() -> TestResult {
  let data = gradient(32, 32, 32);
  let (_, reader) = convert_and_read(&data, 32, 32, 32, &ConvertParams::default())?;
  let raw = raw_ifd(&reader);
  assert_eq!(raw.get_entry(TiffCommonTag::CFARepeatPatternDim).map(|e| &e.value), Some(&Value::Short(vec![2, 2])));
  let pattern = raw.get_entry(TiffCommonTag::CFAPattern).ok_or("CFAPattern missing")?;
  assert_eq!(pattern.value, Value::Byte(vec![2, 1, 1, 0]));
  assert_eq!(CFA::new_from_tag(&pattern.value)?, SensorProfile::li5m03()?.cfa);
  Ok(())
}

#[test]
fn output_is_deterministic() -> TestResult {
  let data = gradient(160, 96, 160);
  let (first, reader) = convert_and_read(&data, 160, 96, 160, &ConvertParams::default())?;
  let (second, _) = convert_and_read(&data, 160, 96, 160, &ConvertParams::default())?;
  check_md5_equal(&second, &hex::encode(md5::compute(&first).0));
  assert_eq!(
    reader.root_ifd().get_entry(TiffCommonTag::DateTime).and_then(|e| e.as_string()).map(String::as_str),
    Some("2021:03:04 05:06:07")
  );
  Ok(())
}

#[test]
fn all_zero_minimal_frame() -> TestResult {
  let data = vec![0; 16 * 16];
  let (file, reader) = convert_and_read(&data, 16, 16, 16, &ConvertParams::default())?;
  let mut file = Cursor::new(file);

  let root = reader.root_ifd();
  assert_eq!(u32_of(root, TiffCommonTag::ImageWidth), Some(1));
  assert_eq!(u32_of(root, TiffCommonTag::ImageLength), Some(1));
  assert_eq!(root.strip_data(&mut file)?, vec![0; 3]);

  let raw = raw_ifd(&reader);
  assert_eq!(raw.strip_data(&mut file)?, vec![0; 16 * 16]);
  let table = raw.get_entry(DngTag::LinearizationTable).ok_or("LinearizationTable missing")?;
  assert_eq!(table.get_u16(0)?, Some(0));
  assert_eq!(table.get_u16(255)?, Some(0x3fff));
  Ok(())
}

#[test]
fn stride_padding_is_dropped() -> TestResult {
  // Capture buffer with 1.5 bytes per pixel, only the first
  // width bytes of each line are mosaic data
  let (width, height) = (64, 48);
  let stride = width * 3 / 2;
  let mut data = gradient(width, height, stride);
  for row in 0..height {
    for col in width..stride {
      data[row * stride + col] = 0xAA;
    }
  }
  let (file, reader) = convert_and_read(&data, width, height, stride, &ConvertParams::default())?;
  let pixels = raw_ifd(&reader).strip_data(&mut Cursor::new(file))?;
  assert_eq!(pixels, gradient(width, height, width));
  Ok(())
}

#[test]
fn large_frame_uses_multiple_strips() -> TestResult {
  let data = gradient(64, 1024, 64);
  let (file, reader) = convert_and_read(&data, 64, 1024, 64, &ConvertParams::default())?;
  let raw = raw_ifd(&reader);
  assert_eq!(u32_of(raw, TiffCommonTag::RowsPerStrip), Some(256));
  assert_eq!(raw.get_entry(TiffCommonTag::StripOffsets).map(|e| e.value.count()), Some(4));
  assert_eq!(raw.strip_data(&mut Cursor::new(file))?, data);
  Ok(())
}

#[test]
fn color_calibration_tags() -> TestResult {
  let data = gradient(16, 16, 16);
  let params = ConvertParams {
    artist: Some("Test Person".into()),
    ..Default::default()
  };
  let (_, reader) = convert_and_read(&data, 16, 16, 16, &params)?;
  let root = reader.root_ifd();
  let raw = raw_ifd(&reader);

  for ifd in [root, raw] {
    let matrix = ifd.get_entry(DngTag::ColorMatrix1).ok_or("ColorMatrix1 missing")?;
    match &matrix.value {
      Value::SRational(v) => {
        assert_eq!(v.len(), 9);
        assert_eq!(v[0], SRational::new(20050, 10000));
        assert_eq!(v[1], SRational::new(-7710, 10000));
        assert_eq!(v[8], SRational::new(7450, 10000));
      }
      other => panic!("Unexpected ColorMatrix1 value: {:?}", other),
    }
    assert_eq!(
      ifd.get_entry(DngTag::AsShotNeutral).map(|e| &e.value),
      Some(&Value::Rational(vec![
        Rational::new(807133, 1_000_000),
        Rational::new(1_000_000, 1_000_000),
        Rational::new(913289, 1_000_000)
      ]))
    );
    assert_eq!(u32_of(ifd, DngTag::CalibrationIlluminant1), Some(21));
    assert_eq!(
      ifd.get_entry(DngTag::UniqueCameraModel).and_then(|e| e.as_string()).map(String::as_str),
      Some("Leopard Imaging LI-5M03")
    );
    assert_eq!(
      ifd.get_entry(DngTag::OriginalRawFileName).and_then(|e| e.as_string()).map(String::as_str),
      Some("capture.raw")
    );
  }

  assert_eq!(root.get_entry(DngTag::DNGVersion).map(|e| &e.value), Some(&Value::Byte(vec![1, 1, 0, 0])));
  assert_eq!(root.get_entry(DngTag::DNGBackwardVersion).map(|e| &e.value), Some(&Value::Byte(vec![1, 0, 0, 0])));
  assert_eq!(root.get_entry(TiffCommonTag::Make).and_then(|e| e.as_string()).map(String::as_str), Some("Leopard Imaging"));
  assert_eq!(root.get_entry(TiffCommonTag::Model).and_then(|e| e.as_string()).map(String::as_str), Some("LI-5M03"));
  assert_eq!(root.get_entry(TiffCommonTag::Artist).and_then(|e| e.as_string()).map(String::as_str), Some("Test Person"));
  Ok(())
}
