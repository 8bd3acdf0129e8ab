// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use super::{
  Entry, Result, TiffError, Value,
  reader::{EndianReader, ReadByteOrder},
};
use crate::tags::{TiffCommonTag, TiffTag};
use log::debug;
use serde::Serialize;
use std::{
  collections::{BTreeMap, HashMap},
  io::{Read, Seek, SeekFrom},
};

/// Maximum nesting of SubIFDs
const MAX_SUB_DEPTH: usize = 4;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IFD {
  pub offset: u32,
  pub next_ifd: u32,
  pub entries: BTreeMap<u16, Entry>,
  pub sub: HashMap<u16, Vec<IFD>>,
}

impl IFD {
  pub fn new<R: Read + Seek>(reader: &mut EndianReader<R>, offset: u32, sub_tags: &[u16], depth: usize) -> Result<IFD> {
    reader.goto(offset)?;
    let mut sub_ifd_offsets = HashMap::new();
    let entry_count = reader.read_u16()?;
    let mut entries = BTreeMap::new();
    let mut next_pos = reader.position()?;
    debug!("Parse {} entries of IFD at {}", entry_count, offset);
    for _ in 0..entry_count {
      reader.goto(next_pos)?;
      next_pos += 12;
      let tag = reader.read_u16()?;

      match Entry::parse(reader, tag) {
        Ok(entry) => {
          if sub_tags.contains(&tag) {
            match &entry.value {
              Value::Long(offsets) => {
                sub_ifd_offsets.insert(tag, offsets.clone());
              }
              val => {
                log::info!(
                  "Found IFD offset tag, but type mismatch: {:?}. Ignoring SubIFD parsing for tag 0x{:X}",
                  val,
                  tag
                );
              }
            }
          }
          entries.insert(entry.tag, entry);
        }
        Err(err) => {
          log::info!("Failed to parse TIFF tag 0x{:X}, skipping: {:?}", tag, err);
        }
      }
    }

    reader.goto(next_pos)?;
    // Some TIFF writers skip the next ifd pointer
    // If we get an I/O error, we fallback to 0, signaling the end of IFD chains.
    let next_ifd = match reader.read_u32() {
      Ok(ptr) => ptr,
      Err(e) => {
        debug!(
          "TIFF IFD reader failed to get next IFD pointer, fallback to 0 and continue. Original error was: {}",
          e
        );
        0
      }
    };

    // Process SubIFDs
    let mut sub = HashMap::new();
    if depth < MAX_SUB_DEPTH {
      for (tag, offsets) in sub_ifd_offsets {
        let mut ifds = Vec::new();
        for offset in offsets {
          match Self::new(reader, offset, sub_tags, depth + 1) {
            Ok(ifd) => ifds.push(ifd),
            Err(err) => {
              log::warn!("Error while processing TIFF sub-IFD for tag 0x{:X}, ignoring it: {}", tag, err);
            }
          };
        }
        sub.insert(tag, ifds);
      }
    } else {
      log::warn!("SubIFD nesting deeper than {} levels, ignoring", MAX_SUB_DEPTH);
    }

    Ok(IFD {
      offset,
      next_ifd,
      entries,
      sub,
    })
  }

  /// SubIFDs referenced by `tag`, empty if there are none
  pub fn sub_ifds<T: TiffTag>(&self, tag: T) -> &[IFD] {
    self.sub.get(&tag.into()).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn sub_ifd_map(&self) -> &HashMap<u16, Vec<IFD>> {
    &self.sub
  }

  pub fn entry_count(&self) -> u16 {
    self.entries.len() as u16
  }

  pub fn entries(&self) -> &BTreeMap<u16, Entry> {
    &self.entries
  }

  pub fn get_entry<T: TiffTag>(&self, tag: T) -> Option<&Entry> {
    self.entries.get(&tag.into())
  }

  pub fn has_entry<T: TiffTag>(&self, tag: T) -> bool {
    self.get_entry(tag).is_some()
  }

  pub(crate) fn collect_recursive<'a>(&'a self, out: &mut Vec<&'a IFD>) {
    out.push(self);
    let mut tags: Vec<&u16> = self.sub.keys().collect();
    tags.sort();
    for tag in tags {
      for ifd in &self.sub[tag] {
        ifd.collect_recursive(out);
      }
    }
  }

  /// Read the data of all strips referenced by StripOffsets and
  /// StripByteCounts into a single buffer.
  pub fn strip_data<R: Read + Seek>(&self, file: &mut R) -> Result<Vec<u8>> {
    let (offsets, counts) = match (self.get_entry(TiffCommonTag::StripOffsets), self.get_entry(TiffCommonTag::StripByteCounts)) {
      (Some(offsets), Some(counts)) => (offsets, counts),
      _ => return Err(TiffError::General("IFD has no strips".to_string())),
    };
    if offsets.value.count() != counts.value.count() {
      return Err(TiffError::General(format!(
        "StripOffsets has {} entries but StripByteCounts {}",
        offsets.value.count(),
        counts.value.count()
      )));
    }
    let mut data = Vec::new();
    for i in 0..offsets.value.count() {
      let (offset, count) = match (offsets.get_u32(i)?, counts.get_u32(i)?) {
        (Some(o), Some(c)) => (o, c),
        _ => return Err(TiffError::General(format!("Invalid strip index {}", i))),
      };
      let start = data.len();
      data.resize(start + count as usize, 0);
      file.seek(SeekFrom::Start(offset as u64))?;
      file.read_exact(&mut data[start..])?;
    }
    Ok(data)
  }
}
