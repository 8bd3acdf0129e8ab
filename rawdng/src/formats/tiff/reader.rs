// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use super::{IFD, Result, TIFF_MAGIC, TiffError};
use crate::tags::{TiffCommonTag, TiffTag};
use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use serde::Serialize;
use std::io::{Read, Seek, SeekFrom};

/// Limit for IFD chains, protects against offset loops
const MAX_CHAINED_IFDS: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Endian {
  Big,
  #[default]
  Little,
}

impl Endian {
  #[inline]
  pub fn big(&self) -> bool {
    matches!(*self, Self::Big)
  }
}

/// Reader for TIFF files
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct GenericTiffReader {
  endian: Endian,
  chain: Vec<IFD>,
}

impl GenericTiffReader {
  /// Check if buffer looks like a TIFF file
  pub fn is_tiff<T: AsRef<[u8]>>(buffer: T) -> bool {
    matches!(buffer.as_ref(), [0x49, 0x49, 42, 0, ..] | [0x4d, 0x4d, 0, 42, ..])
  }

  /// Construct a TIFF reader from Read capable objects
  ///
  /// Endianess is detected from the TIFF header. The IFD chain and
  /// all SubIFDs are parsed.
  pub fn new<R: Read + Seek>(file: &mut R) -> Result<Self> {
    file.seek(SeekFrom::Start(0))?;
    let endian = match file.read_u16::<LittleEndian>()? {
      0x4949 => Endian::Little,
      0x4d4d => Endian::Big,
      x => {
        return Err(TiffError::FormatMismatch(format!("TIFF: don't know marker 0x{:x}", x)));
      }
    };
    let mut reader = EndianReader::new(file, endian)?;
    let magic = reader.read_u16()?;
    if magic != TIFF_MAGIC {
      return Err(TiffError::FormatMismatch(format!("Invalid magic marker for TIFF: {}", magic)));
    }
    let mut next_ifd = reader.read_u32()?;
    if next_ifd == 0 {
      return Err(TiffError::General("Invalid TIFF header, contains no root IFD".to_string()));
    }

    let sub_tags = [TiffCommonTag::SubIFDs.into()];
    let mut chain = Vec::new();
    while next_ifd != 0 {
      let ifd = IFD::new(&mut reader, next_ifd, &sub_tags, 0)?;
      if ifd.entries.is_empty() {
        return Err(TiffError::General("TIFF is invalid, IFD must contain at least one entry".to_string()));
      }
      next_ifd = ifd.next_ifd;
      chain.push(ifd);
      if chain.len() >= MAX_CHAINED_IFDS {
        log::warn!("TIFF IFD chain exceeds {} entries, stop parsing", MAX_CHAINED_IFDS);
        break;
      }
    }

    Ok(Self { endian, chain })
  }

  pub fn endian(&self) -> Endian {
    self.endian
  }

  pub fn chain(&self) -> &[IFD] {
    &self.chain
  }

  pub fn root_ifd(&self) -> &IFD {
    // Construction fails for files without IFD
    &self.chain[0]
  }

  /// All IFDs of the chain and their SubIFDs
  pub fn all_ifds(&self) -> Vec<&IFD> {
    let mut ifds = Vec::new();
    for ifd in &self.chain {
      ifd.collect_recursive(&mut ifds);
    }
    ifds
  }

  pub fn find_ifds_with_tag<T: TiffTag>(&self, tag: T) -> Vec<&IFD> {
    self.all_ifds().into_iter().filter(|ifd| ifd.has_entry(tag)).collect()
  }

  pub fn find_ifd_with_new_subfile_type(&self, typ: u32) -> Option<&IFD> {
    self
      .find_ifds_with_tag(TiffCommonTag::NewSubFileType)
      .into_iter()
      .find(|ifd| matches!(ifd.get_entry(TiffCommonTag::NewSubFileType).map(|e| e.get_u32(0)), Some(Ok(Some(v))) if v == typ))
  }
}

pub trait ReadByteOrder {
  fn read_u8(&mut self) -> std::io::Result<u8>;
  fn read_u16(&mut self) -> std::io::Result<u16>;
  fn read_u32(&mut self) -> std::io::Result<u32>;

  fn read_u8_into(&mut self, dst: &mut [u8]) -> std::io::Result<()>;
  fn read_i8_into(&mut self, dst: &mut [i8]) -> std::io::Result<()>;
  fn read_u16_into(&mut self, dst: &mut [u16]) -> std::io::Result<()>;
  fn read_i16_into(&mut self, dst: &mut [i16]) -> std::io::Result<()>;
  fn read_u32_into(&mut self, dst: &mut [u32]) -> std::io::Result<()>;
  fn read_i32_into(&mut self, dst: &mut [i32]) -> std::io::Result<()>;
  fn read_f32_into(&mut self, dst: &mut [f32]) -> std::io::Result<()>;
  fn read_f64_into(&mut self, dst: &mut [f64]) -> std::io::Result<()>;
}

pub struct EndianReader<'a, R: Read + Seek + 'a> {
  endian: Endian,
  len: u64,
  inner: &'a mut R,
}

impl<'a, R: Read + Seek + 'a> EndianReader<'a, R> {
  pub fn new(inner: &'a mut R, endian: Endian) -> Result<Self> {
    let pos = inner.stream_position()?;
    let len = inner.seek(SeekFrom::End(0))?;
    inner.seek(SeekFrom::Start(pos))?;
    Ok(Self { endian, len, inner })
  }

  pub fn endian(&self) -> Endian {
    self.endian
  }

  /// Total length of the underlying stream
  pub fn len(&self) -> u64 {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn position(&mut self) -> Result<u32> {
    let pos = self.inner.stream_position()?;
    u32::try_from(pos).map_err(|_| TiffError::Overflow(format!("Stream position {} exceeds TIFF offset range", pos)))
  }

  pub fn goto(&mut self, offset: u32) -> Result<()> {
    self.inner.seek(SeekFrom::Start(offset as u64))?;
    Ok(())
  }
}

impl<'a, R: Read + Seek + 'a> ReadByteOrder for EndianReader<'a, R> {
  fn read_u8(&mut self) -> std::io::Result<u8> {
    self.inner.read_u8()
  }

  fn read_u16(&mut self) -> std::io::Result<u16> {
    match self.endian {
      Endian::Little => self.inner.read_u16::<LittleEndian>(),
      Endian::Big => self.inner.read_u16::<BigEndian>(),
    }
  }

  fn read_u32(&mut self) -> std::io::Result<u32> {
    match self.endian {
      Endian::Little => self.inner.read_u32::<LittleEndian>(),
      Endian::Big => self.inner.read_u32::<BigEndian>(),
    }
  }

  fn read_u8_into(&mut self, dst: &mut [u8]) -> std::io::Result<()> {
    self.inner.read_exact(dst)
  }

  fn read_i8_into(&mut self, dst: &mut [i8]) -> std::io::Result<()> {
    self.inner.read_i8_into(dst)
  }

  fn read_u16_into(&mut self, dst: &mut [u16]) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.read_u16_into::<LittleEndian>(dst),
      Endian::Big => self.inner.read_u16_into::<BigEndian>(dst),
    }
  }

  fn read_i16_into(&mut self, dst: &mut [i16]) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.read_i16_into::<LittleEndian>(dst),
      Endian::Big => self.inner.read_i16_into::<BigEndian>(dst),
    }
  }

  fn read_u32_into(&mut self, dst: &mut [u32]) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.read_u32_into::<LittleEndian>(dst),
      Endian::Big => self.inner.read_u32_into::<BigEndian>(dst),
    }
  }

  fn read_i32_into(&mut self, dst: &mut [i32]) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.read_i32_into::<LittleEndian>(dst),
      Endian::Big => self.inner.read_i32_into::<BigEndian>(dst),
    }
  }

  fn read_f32_into(&mut self, dst: &mut [f32]) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.read_f32_into::<LittleEndian>(dst),
      Endian::Big => self.inner.read_f32_into::<BigEndian>(dst),
    }
  }

  fn read_f64_into(&mut self, dst: &mut [f64]) -> std::io::Result<()> {
    match self.endian {
      Endian::Little => self.inner.read_f64_into::<LittleEndian>(dst),
      Endian::Big => self.inner.read_f64_into::<BigEndian>(dst),
    }
  }
}

#[cfg(test)]
mod tests {
  use std::io::Cursor;

  use super::*;

  #[test]
  fn detect_tiff_marker() {
    assert!(GenericTiffReader::is_tiff([0x49, 0x49, 42, 0, 8, 0, 0, 0]));
    assert!(GenericTiffReader::is_tiff([0x4d, 0x4d, 0, 42]));
    assert!(!GenericTiffReader::is_tiff([0x49, 0x49]));
    assert!(!GenericTiffReader::is_tiff(b"BM\x00\x00"));
  }

  #[test]
  fn big_endian_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let data: Vec<u8> = vec![
      0x4d, 0x4d, 0, 42, 0, 0, 0, 8, // header
      0, 1, // one entry
      0x01, 0x00, 0, 3, 0, 0, 0, 1, 0x05, 0x00, 0, 0, // ImageWidth = 1280
      0, 0, 0, 0, // next IFD
    ];
    let reader = GenericTiffReader::new(&mut Cursor::new(data))?;
    assert!(reader.endian().big());
    assert_eq!(reader.root_ifd().get_entry(TiffCommonTag::ImageWidth).map(|e| e.force_u32(0)), Some(1280));
    Ok(())
  }

  #[test]
  fn reject_truncated_entry() {
    let data: Vec<u8> = vec![
      0x49, 0x49, 42, 0, 8, 0, 0, 0, // header
      1, 0, // one entry
      0x0F, 0x01, 2, 0, 100, 0, 0, 0, 0, 1, 0, 0, // Make, 100 bytes at offset 256
      0, 0, 0, 0, // next IFD
    ];
    // The broken entry is skipped, leaving an empty IFD
    assert!(GenericTiffReader::new(&mut Cursor::new(data)).is_err());
  }

  #[test]
  fn reject_unknown_marker() {
    let data = b"XX\x2a\x00\x08\x00\x00\x00".to_vec();
    assert!(matches!(GenericTiffReader::new(&mut Cursor::new(data)), Err(TiffError::FormatMismatch(_))));
  }
}
