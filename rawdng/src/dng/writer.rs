use std::io::{Seek, Write};

use log::debug;

use crate::{
  formats::tiff::{
    CompressionMethod, DirectoryWriter, OffsetSlot, Orientation, PhotometricInterpretation, PlanarConfiguration, Rational, SRational, StripWriter,
    SubFileType, TiffWriter,
  },
  imgop::{Dim2, gamma::GammaCurve},
  rawframe::RawFrame,
  sensor::SensorProfile,
  tags::{DngTag, TiffCommonTag},
};

use super::{DNG_VERSION_V1_0, DNG_VERSION_V1_1, DngError, EncoderState, Result, SourceInfo};

/// Denominator for ColorMatrix values
const MATRIX_DENOMINATOR: i32 = 10_000;
/// Denominator for AsShotNeutral values
const NEUTRAL_DENOMINATOR: u32 = 1_000_000;

/// Raw images larger than this are split into multiple strips
const SINGLE_STRIP_LIMIT: usize = 1000;
const ROWS_PER_STRIP: usize = 256;

/// Writes a DNG with a reduced size thumbnail in IFD0 and the
/// mosaic data in a SubIFD.
///
/// Usage is strictly [`write_thumbnail`](Self::write_thumbnail),
/// [`write_raw`](Self::write_raw), [`close`](Self::close).
pub struct DngWriter<'a, B>
where
  B: Write + Seek,
{
  dng: TiffWriter<B>,
  frame: RawFrame<'a>,
  profile: &'a SensorProfile,
  source: &'a SourceInfo,
  software: String,
  artist: Option<String>,
  state: EncoderState,
  root_ifd_offset: Option<u32>,
  sub_ifd_slot: Option<OffsetSlot>,
}

impl<'a, B> DngWriter<'a, B>
where
  B: Write + Seek,
{
  pub fn new(buf: B, frame: RawFrame<'a>, profile: &'a SensorProfile, source: &'a SourceInfo) -> Result<Self> {
    let dng = TiffWriter::new(buf)?;
    Ok(Self {
      dng,
      frame,
      profile,
      source,
      software: String::from(crate::SOFTWARE),
      artist: None,
      state: EncoderState::Open,
      root_ifd_offset: None,
      sub_ifd_slot: None,
    })
  }

  pub fn software(&mut self, software: impl AsRef<str>) {
    self.software = software.as_ref().to_string();
  }

  pub fn artist(&mut self, artist: Option<impl AsRef<str>>) {
    self.artist = artist.map(|a| a.as_ref().to_string());
  }

  pub fn state(&self) -> EncoderState {
    self.state
  }

  fn expect_state(&self, expected: EncoderState) -> Result<()> {
    if self.state == expected {
      Ok(())
    } else {
      Err(DngError::InvalidState { expected, found: self.state })
    }
  }

  /// Run a writing step, a failing step poisons the writer
  fn step<F>(&mut self, expected: EncoderState, next: EncoderState, op: F) -> Result<()>
  where
    F: FnOnce(&mut Self) -> Result<()>,
  {
    self.expect_state(expected)?;
    match op(self) {
      Ok(()) => {
        debug!("DNG writer state: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
      }
      Err(err) => {
        self.state = EncoderState::Failed;
        Err(err)
      }
    }
  }

  /// Write the all-black thumbnail and IFD0. The SubIFDs entry
  /// is filled in by [`write_raw`](Self::write_raw).
  pub fn write_thumbnail(&mut self) -> Result<()> {
    self.step(EncoderState::Open, EncoderState::ThumbnailWritten, |w| w.write_thumbnail_ifd())
  }

  fn write_thumbnail_ifd(&mut self) -> Result<()> {
    let thumb = self.frame.thumbnail_dim();
    debug!("Writing thumbnail with {}", thumb);

    let strips = {
      let row = vec![0_u8; thumb.w * 3];
      let mut strips = StripWriter::new(&mut self.dng, row.len(), thumb.h, thumb.h)?;
      for y in 0..thumb.h {
        strips.write_scanline(y, &row)?;
      }
      strips.finish()?
    };

    let mut root_ifd = DirectoryWriter::new();
    root_ifd.add_tag(TiffCommonTag::NewSubFileType, SubFileType::ReducedImage);
    root_ifd.add_tag(TiffCommonTag::ImageWidth, thumb.w as u32);
    root_ifd.add_tag(TiffCommonTag::ImageLength, thumb.h as u32);
    root_ifd.add_tag(TiffCommonTag::BitsPerSample, [8_u16, 8, 8]);
    root_ifd.add_tag(TiffCommonTag::Compression, CompressionMethod::None);
    root_ifd.add_tag(TiffCommonTag::PhotometricInt, PhotometricInterpretation::RGB);
    root_ifd.add_tag(TiffCommonTag::Orientation, Orientation::TopLeft);
    root_ifd.add_tag(TiffCommonTag::SamplesPerPixel, 3_u16);
    root_ifd.add_tag(TiffCommonTag::PlanarConfiguration, PlanarConfiguration::Chunky);
    root_ifd.add_tag(TiffCommonTag::Make, self.profile.make.as_str());
    root_ifd.add_tag(TiffCommonTag::Model, self.profile.model.as_str());
    root_ifd.add_tag(TiffCommonTag::Software, self.software.as_str());
    root_ifd.add_tag(TiffCommonTag::DateTime, self.source.datetime());
    if let Some(artist) = &self.artist {
      root_ifd.add_tag(TiffCommonTag::Artist, artist.as_str());
    }
    root_ifd.add_tag(TiffCommonTag::SubIFDs, 0_u32); // resolved later
    root_ifd.add_tag(DngTag::DNGVersion, DNG_VERSION_V1_1);
    root_ifd.add_tag(DngTag::DNGBackwardVersion, DNG_VERSION_V1_0);
    self.add_color_tags(&mut root_ifd);
    strips.add_to(&mut root_ifd);

    let (offset, slot) = root_ifd.build_with_slot(&mut self.dng, TiffCommonTag::SubIFDs)?;
    self.root_ifd_offset = Some(offset);
    self.sub_ifd_slot = Some(slot);
    Ok(())
  }

  /// Write the mosaic and the raw IFD
  pub fn write_raw(&mut self, curve: &GammaCurve) -> Result<()> {
    self.step(EncoderState::ThumbnailWritten, EncoderState::RawWritten, |w| w.write_raw_ifd(curve))
  }

  fn write_raw_ifd(&mut self, curve: &GammaCurve) -> Result<()> {
    let Dim2 { w, h } = self.frame.dim();
    debug!("Writing raw image {}x{} with stride {}", w, h, self.frame.stride());

    let rows_per_strip = if h > SINGLE_STRIP_LIMIT { ROWS_PER_STRIP } else { h };
    let strips = {
      let mut strips = StripWriter::new(&mut self.dng, w, h, rows_per_strip)?;
      for (y, row) in self.frame.rows().enumerate() {
        strips.write_scanline(y, row)?;
      }
      strips.finish()?
    };

    let mut raw_ifd = DirectoryWriter::new();
    raw_ifd.add_tag(TiffCommonTag::NewSubFileType, SubFileType::FullImage);
    raw_ifd.add_tag(TiffCommonTag::ImageWidth, w as u32);
    raw_ifd.add_tag(TiffCommonTag::ImageLength, h as u32);
    raw_ifd.add_tag(TiffCommonTag::BitsPerSample, 8_u16);
    raw_ifd.add_tag(TiffCommonTag::Compression, CompressionMethod::None);
    raw_ifd.add_tag(TiffCommonTag::PhotometricInt, PhotometricInterpretation::CFA);
    raw_ifd.add_tag(TiffCommonTag::SamplesPerPixel, 1_u16);
    raw_ifd.add_tag(TiffCommonTag::PlanarConfiguration, PlanarConfiguration::Chunky);
    raw_ifd.add_tag(TiffCommonTag::CFARepeatPatternDim, [self.profile.cfa.height as u16, self.profile.cfa.width as u16]);
    raw_ifd.add_tag(TiffCommonTag::CFAPattern, self.profile.cfa.flat_pattern().as_slice());
    raw_ifd.add_tag(DngTag::LinearizationTable, curve.as_slice());
    raw_ifd.add_tag(DngTag::WhiteLevel, self.profile.white_level);
    self.add_color_tags(&mut raw_ifd);
    strips.add_to(&mut raw_ifd);

    let offset = raw_ifd.build(&mut self.dng)?;
    match self.sub_ifd_slot.take() {
      Some(slot) => self.dng.resolve_slot(slot, offset)?,
      None => {
        return Err(DngError::InvalidState {
          expected: EncoderState::ThumbnailWritten,
          found: self.state,
        });
      }
    }
    Ok(())
  }

  /// Write the file header and flush, returns the underlying writer
  pub fn close(self) -> Result<B> {
    self.expect_state(EncoderState::RawWritten)?;
    let root = self.root_ifd_offset.ok_or(DngError::InvalidState {
      expected: EncoderState::RawWritten,
      found: self.state,
    })?;
    let buf = self.dng.build(root)?;
    debug!("DNG finalized, IFD0 at {}", root);
    Ok(buf)
  }

  /// Camera identity and color calibration, required by DNG readers
  fn add_color_tags(&self, ifd: &mut DirectoryWriter) {
    let matrix: Vec<SRational> = self.profile.color_matrix.iter().map(|v| SRational::new_f32(*v, MATRIX_DENOMINATOR)).collect();
    let neutral: Vec<Rational> = self.profile.as_shot_neutral.iter().map(|v| Rational::new_f32(*v, NEUTRAL_DENOMINATOR)).collect();
    ifd.add_tag(DngTag::UniqueCameraModel, self.profile.unique_camera_model.as_str());
    ifd.add_tag(DngTag::ColorMatrix1, matrix.as_slice());
    ifd.add_tag(DngTag::AsShotNeutral, neutral.as_slice());
    ifd.add_tag(DngTag::CalibrationIlluminant1, u16::from(self.profile.illuminant));
    ifd.add_tag(DngTag::OriginalRawFileName, self.source.filename.as_str());
  }
}
