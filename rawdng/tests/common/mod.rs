// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  io::Cursor,
  time::{Duration, SystemTime, UNIX_EPOCH},
};

use rawdng::{ConvertParams, SensorProfile, SourceInfo, dng::convert, formats::tiff::GenericTiffReader};

pub(crate) fn init_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn check_md5_equal(data: &[u8], expected: &str) {
  assert_eq!(hex::encode(md5::compute(data).0), expected);
}

/// Fixed capture time, 2021-03-04 05:06:07 UTC
pub(crate) fn capture_time() -> SystemTime {
  UNIX_EPOCH + Duration::from_secs(1_614_834_367)
}

pub(crate) fn source() -> SourceInfo {
  SourceInfo::new("capture.raw", capture_time())
}

/// Mosaic with a simple gradient, row and column dependent
pub(crate) fn gradient(width: usize, height: usize, stride: usize) -> Vec<u8> {
  let mut data = vec![0; stride * height];
  for row in 0..height {
    for col in 0..width {
      data[row * stride + col] = ((row + col) % 256) as u8;
    }
  }
  data
}

/// Convert into memory and parse the result again
pub(crate) fn convert_and_read(
  data: &[u8],
  width: usize,
  height: usize,
  stride: usize,
  params: &ConvertParams,
) -> std::result::Result<(Vec<u8>, GenericTiffReader), Box<dyn std::error::Error>> {
  let profile = SensorProfile::li5m03()?;
  let mut out = convert(data, width, height, stride, &profile, &source(), params, Cursor::new(Vec::new()))?;
  let reader = GenericTiffReader::new(&mut out)?;
  Ok((out.into_inner(), reader))
}
