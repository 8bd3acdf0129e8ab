use std::{
  fs::File,
  io::{BufWriter, Seek, Write},
  path::Path,
};

use log::{debug, info};

use crate::{RawDngError, Result, imgop::gamma::GammaCurve, rawframe::RawFrame, sensor::SensorProfile};

use super::{DngWriter, SourceInfo};

/// Default gamma in percent, a linear curve
pub const DEFAULT_GAMMA: f64 = 100.0;

/// Parameters for conversion
#[derive(Clone, Debug)]
pub struct ConvertParams {
  /// Gamma of the 8 bit input in percent
  pub gamma: f64,
  pub software: String,
  pub artist: Option<String>,
}

impl Default for ConvertParams {
  fn default() -> Self {
    Self {
      gamma: DEFAULT_GAMMA,
      software: String::from(crate::SOFTWARE),
      artist: None,
    }
  }
}

impl ConvertParams {
  pub fn validate(&self) -> Result<()> {
    if !self.gamma.is_finite() || self.gamma <= 0.0 {
      return Err(RawDngError::InvalidParameter(format!("Gamma must be a positive number, got {}", self.gamma)));
    }
    Ok(())
  }

  pub fn gamma_curve(&self) -> Result<GammaCurve> {
    self.validate()?;
    Ok(GammaCurve::new(self.gamma))
  }
}

/// Encode `frame` as DNG into `dest`
///
/// The linearization table is taken from `curve`, the gamma value
/// of `params` is not used here.
pub fn encode<B: Write + Seek>(frame: RawFrame, profile: &SensorProfile, curve: &GammaCurve, source: &SourceInfo, params: &ConvertParams, dest: B) -> Result<B> {
  let mut dng = DngWriter::new(dest, frame, profile, source)?;
  dng.software(&params.software);
  dng.artist(params.artist.as_deref());
  dng.write_thumbnail()?;
  dng.write_raw(curve)?;
  Ok(dng.close()?)
}

/// Encode `frame` into a new file at `path`
pub fn encode_file<P: AsRef<Path>>(
  frame: RawFrame,
  profile: &SensorProfile,
  curve: &GammaCurve,
  source: &SourceInfo,
  params: &ConvertParams,
  path: P,
) -> Result<()> {
  let path = path.as_ref();
  let file = File::create(path).map_err(|e| RawDngError::with_io_error(path, e))?;
  let buf = encode(frame, profile, curve, source, params, BufWriter::new(file))?;
  buf.into_inner().map_err(|e| RawDngError::with_io_error(path, e.into_error()))?;
  info!("DNG written to {}", path.display());
  Ok(())
}

/// Validate all inputs and encode the raw buffer into `dest`
#[allow(clippy::too_many_arguments)]
pub fn convert<B: Write + Seek>(
  data: &[u8],
  width: usize,
  height: usize,
  stride: usize,
  profile: &SensorProfile,
  source: &SourceInfo,
  params: &ConvertParams,
  dest: B,
) -> Result<B> {
  let frame = RawFrame::new(data, width, height, stride)?;
  let curve = params.gamma_curve()?;
  debug!("Converting {}x{} for sensor {} with gamma {}", width, height, profile.id, params.gamma);
  encode(frame, profile, &curve, source, params, dest)
}

/// Like [`convert`], the file at `path` is only created if all
/// inputs are valid.
#[allow(clippy::too_many_arguments)]
pub fn convert_file<P: AsRef<Path>>(
  data: &[u8],
  width: usize,
  height: usize,
  stride: usize,
  profile: &SensorProfile,
  source: &SourceInfo,
  params: &ConvertParams,
  path: P,
) -> Result<()> {
  let frame = RawFrame::new(data, width, height, stride)?;
  let curve = params.gamma_curve()?;
  debug!("Converting {}x{} for sensor {} with gamma {}", width, height, profile.id, params.gamma);
  encode_file(frame, profile, &curve, source, params, path)
}
