use crate::{RawDngError, Result, imgop::Dim2};

/// Both image dimensions must be a multiple of this
pub const DIM_ALIGNMENT: usize = 16;

/// Thumbnail dimensions are the image dimensions shifted by this
pub const THUMBNAIL_SHIFT: usize = 4;

/// Borrowed view of an 8 bit bayer mosaic
///
/// Rows start every `stride` bytes, only the first `width` bytes
/// of each row are pixel data.
#[derive(Debug, Clone, Copy)]
pub struct RawFrame<'a> {
  data: &'a [u8],
  width: usize,
  height: usize,
  stride: usize,
}

impl<'a> RawFrame<'a> {
  pub fn new(data: &'a [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
    if width == 0 || height == 0 {
      return Err(RawDngError::InvalidParameter(format!("Image dimensions must be positive, got {}x{}", width, height)));
    }
    if width % DIM_ALIGNMENT != 0 || height % DIM_ALIGNMENT != 0 {
      return Err(RawDngError::InvalidParameter(format!(
        "Image dimensions must be multiples of {}, got {}x{}",
        DIM_ALIGNMENT, width, height
      )));
    }
    if stride < width {
      return Err(RawDngError::InvalidParameter(format!(
        "Bytes per line ({}) must not be smaller than width ({})",
        stride, width
      )));
    }
    let required = Self::required_len(width, height, stride)
      .ok_or_else(|| RawDngError::InvalidParameter(format!("Image size {}x{} with stride {} overflows", width, height, stride)))?;
    if data.len() < required {
      return Err(RawDngError::InsufficientInput(format!(
        "Need at least {} bytes for {}x{} with {} bytes per line, got {}",
        required,
        width,
        height,
        stride,
        data.len()
      )));
    }
    if data.len() > required {
      log::debug!("Ignoring {} trailing input bytes", data.len() - required);
    }
    Ok(Self { data, width, height, stride })
  }

  /// Number of bytes needed to read all rows, the last row
  /// doesn't need the padding up to the stride.
  pub fn required_len(width: usize, height: usize, stride: usize) -> Option<usize> {
    stride.checked_mul(height.checked_sub(1)?)?.checked_add(width)
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn stride(&self) -> usize {
    self.stride
  }

  pub fn dim(&self) -> Dim2 {
    Dim2::new(self.width, self.height)
  }

  pub fn thumbnail_dim(&self) -> Dim2 {
    Dim2::new(self.width >> THUMBNAIL_SHIFT, self.height >> THUMBNAIL_SHIFT)
  }

  /// Pixel data of row `row`
  pub fn row(&self, row: usize) -> &'a [u8] {
    let start = row * self.stride;
    &self.data[start..start + self.width]
  }

  pub fn rows(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
    (0..self.height).map(move |row| self.row(row))
  }
}
