// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  collections::BTreeMap,
  io::{Seek, SeekFrom, Write},
};

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use crate::tags::{TiffCommonTag, TiffTag};

use super::{Entry, Result, TIFF_MAGIC, TiffError, Value};

/// Size of the IFD entry count field
const IFD_COUNT_SIZE: u64 = 2;
/// Size of a single IFD entry
const IFD_ENTRY_SIZE: u64 = 12;

pub struct TiffWriter<W: Write + Seek> {
  ifd_location: u64,
  pub writer: W,
}

impl<W: Write + Seek> TiffWriter<W> {
  pub fn new(writer: W) -> Result<Self> {
    let mut tmp = Self { writer, ifd_location: 0 };
    tmp.write_header()?;
    Ok(tmp)
  }

  fn write_header(&mut self) -> Result<()> {
    self.writer.write_all(&[0x49, 0x49])?;
    self.writer.write_u16::<LittleEndian>(TIFF_MAGIC)?;
    self.ifd_location = self.writer.stream_position()?;
    self.writer.write_u32::<LittleEndian>(0_u32)?; // IFD0 placeholder
    Ok(())
  }

  pub(crate) fn pad_word_boundary(&mut self) -> Result<()> {
    let pos = self.writer.stream_position()?;
    if pos % 4 != 0 {
      let padding = [0, 0, 0];
      let padd_len = 4 - (pos % 4);
      self.writer.write_all(&padding[..padd_len as usize])?;
    }
    Ok(())
  }

  /// Current write position as TIFF offset
  pub fn position(&mut self) -> Result<u32> {
    let pos = self.writer.stream_position()?;
    u32::try_from(pos).map_err(|_| TiffError::Overflow(format!("File offset {} exceeds the 4 GiB TIFF limit", pos)))
  }

  /// Write some data into the file, word aligned. The offset of the data is returned.
  pub fn write_data(&mut self, data: &[u8]) -> Result<u32> {
    self.pad_word_boundary()?;
    let offset = self.position()?;
    self.writer.write_all(data)?;
    Ok(offset)
  }

  /// Fill a slot reserved by [`DirectoryWriter::build_with_slot`] with
  /// its final value.
  pub fn resolve_slot(&mut self, slot: OffsetSlot, value: u32) -> Result<()> {
    let curr = self.writer.stream_position()?;
    self.writer.seek(SeekFrom::Start(slot.position))?;
    self.writer.write_u32::<LittleEndian>(value)?;
    self.writer.seek(SeekFrom::Start(curr))?;
    debug!("Resolved IFD slot at {} with value {}", slot.position, value);
    Ok(())
  }

  /// Write the offset of IFD0 into the header and flush everything
  /// to the underlying writer.
  pub fn build(mut self, ifd0_offset: u32) -> Result<W> {
    self.writer.seek(SeekFrom::Start(self.ifd_location))?;
    self.writer.write_u32::<LittleEndian>(ifd0_offset)?;
    self.writer.seek(SeekFrom::End(0))?;
    self.writer.flush()?;
    Ok(self.writer)
  }
}

/// File position of a single embedded LONG value inside an
/// already written IFD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetSlot {
  position: u64,
}

#[derive(Debug, Default)]
pub struct DirectoryWriter {
  // We use BTreeMap to make sure tags are written in correct order
  entries: BTreeMap<u16, Entry>,
  next_ifd: u32,
}

impl DirectoryWriter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn entry_count(&self) -> u16 {
    self.entries.len() as u16
  }

  pub fn add_tag<T: TiffTag, V: Into<Value>>(&mut self, tag: T, value: V) {
    let tag: u16 = tag.into();
    self.entries.insert(
      tag,
      Entry {
        tag,
        value: value.into(),
        embedded: None,
      },
    );
  }

  /// Write all out-of-line values and the directory itself.
  /// Returns the offset of the directory.
  pub fn build<W: Write + Seek>(self, tiff: &mut TiffWriter<W>) -> Result<u32> {
    self.build_internal(tiff).map(|(offset, _)| offset)
  }

  /// Like [`build`](Self::build), but additionally returns the position of the
  /// value field of `tag`, which must hold exactly one LONG. The slot can be
  /// resolved later with [`TiffWriter::resolve_slot`], e.g. for a SubIFDs
  /// pointer to a directory that is not written yet.
  pub fn build_with_slot<W: Write + Seek, T: TiffTag>(self, tiff: &mut TiffWriter<W>, tag: T) -> Result<(u32, OffsetSlot)> {
    let tag: u16 = tag.into();
    let index = match self.entries.get(&tag) {
      Some(entry) if matches!(&entry.value, Value::Long(v) if v.len() == 1) => self.entries.range(..tag).count() as u64,
      Some(_) => return Err(TiffError::General(format!("Tag 0x{:X} must hold a single LONG to reserve a slot", tag))),
      None => return Err(TiffError::General(format!("Tag 0x{:X} not found in directory", tag))),
    };
    let (offset, _) = self.build_internal(tiff)?;
    let position = offset as u64 + IFD_COUNT_SIZE + index * IFD_ENTRY_SIZE + 8;
    Ok((offset, OffsetSlot { position }))
  }

  fn build_internal<W: Write + Seek>(mut self, tiff: &mut TiffWriter<W>) -> Result<(u32, u16)> {
    if self.entries.is_empty() {
      return Err(TiffError::General("IFD is empty, not allowed by TIFF specification".to_string()));
    }
    let mut embedded_values = BTreeMap::new();
    for (tag, entry) in self.entries.iter_mut() {
      if entry.value.byte_size() > 4 {
        tiff.pad_word_boundary()?;
        let offset = tiff.position()?;
        entry.value.write(&mut tiff.writer)?;
        entry.embedded.replace(offset);
        embedded_values.insert(*tag, offset.to_le_bytes());
      } else {
        embedded_values.insert(*tag, entry.value.as_embedded()?);
      }
    }

    tiff.pad_word_boundary()?;
    let offset = tiff.position()?;
    let count = self.entry_count();

    tiff.writer.write_u16::<LittleEndian>(count)?;
    for (tag, entry) in &self.entries {
      tiff.writer.write_u16::<LittleEndian>(*tag)?;
      tiff.writer.write_u16::<LittleEndian>(entry.value_type())?;
      tiff.writer.write_u32::<LittleEndian>(entry.count() as u32)?;
      tiff.writer.write_all(&embedded_values[tag])?;
    }
    tiff.writer.write_u32::<LittleEndian>(self.next_ifd)?; // Next IFD
    debug!("IFD with {} entries written at offset {}", count, offset);

    Ok((offset, count))
  }
}

/// Strip layout of an image written by [`StripWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Strips {
  pub offsets: Vec<u32>,
  pub byte_counts: Vec<u32>,
  pub rows_per_strip: u32,
}

impl Strips {
  pub fn add_to(&self, ifd: &mut DirectoryWriter) {
    ifd.add_tag(TiffCommonTag::StripOffsets, &self.offsets);
    ifd.add_tag(TiffCommonTag::StripByteCounts, &self.byte_counts);
    ifd.add_tag(TiffCommonTag::RowsPerStrip, self.rows_per_strip);
  }
}

/// Writes uncompressed image data scanline by scanline.
///
/// Scanlines must be supplied strictly in top-to-bottom order and
/// each one must have exactly `row_bytes` bytes. The rows are grouped
/// into strips of `rows_per_strip` rows.
pub struct StripWriter<'t, W: Write + Seek> {
  tiff: &'t mut TiffWriter<W>,
  row_bytes: usize,
  rows: usize,
  rows_per_strip: usize,
  next_row: usize,
  strips: Strips,
}

impl<'t, W: Write + Seek> StripWriter<'t, W> {
  pub fn new(tiff: &'t mut TiffWriter<W>, row_bytes: usize, rows: usize, rows_per_strip: usize) -> Result<Self> {
    if row_bytes == 0 || rows == 0 || rows_per_strip == 0 {
      return Err(TiffError::General(format!(
        "Invalid strip geometry: {} bytes per row, {} rows, {} rows per strip",
        row_bytes, rows, rows_per_strip
      )));
    }
    let rows_per_strip = rows_per_strip.min(rows);
    if row_bytes.checked_mul(rows_per_strip).and_then(|v| u32::try_from(v).ok()).is_none() {
      return Err(TiffError::Overflow(format!(
        "Strip of {} rows with {} bytes exceeds TIFF limits",
        rows_per_strip, row_bytes
      )));
    }
    tiff.pad_word_boundary()?;
    Ok(Self {
      tiff,
      row_bytes,
      rows,
      rows_per_strip,
      next_row: 0,
      strips: Strips {
        offsets: Vec::new(),
        byte_counts: Vec::new(),
        rows_per_strip: rows_per_strip as u32,
      },
    })
  }

  /// Write scanline `row`.
  pub fn write_scanline(&mut self, row: usize, data: &[u8]) -> Result<()> {
    if row != self.next_row {
      return Err(TiffError::General(format!("Scanline {} written out of order, expected {}", row, self.next_row)));
    }
    if row >= self.rows {
      return Err(TiffError::Overflow(format!("Scanline {} exceeds image height {}", row, self.rows)));
    }
    if data.len() != self.row_bytes {
      return Err(TiffError::FormatMismatch(format!(
        "Scanline {} has {} bytes, expected {}",
        row,
        data.len(),
        self.row_bytes
      )));
    }
    if row % self.rows_per_strip == 0 {
      self.strips.offsets.push(self.tiff.position()?);
      self.strips.byte_counts.push(0);
    }
    self.tiff.writer.write_all(data)?;
    if let Some(count) = self.strips.byte_counts.last_mut() {
      *count += self.row_bytes as u32;
    }
    self.next_row += 1;
    Ok(())
  }

  /// Finish the image, all rows must be written.
  pub fn finish(self) -> Result<Strips> {
    if self.next_row != self.rows {
      return Err(TiffError::General(format!("Image incomplete, {} of {} scanlines written", self.next_row, self.rows)));
    }
    Ok(self.strips)
  }
}
