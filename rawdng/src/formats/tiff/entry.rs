// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::io::{Read, Seek};

use log::debug;
use serde::Serialize;

use super::{
  Rational, Result, SRational, TiffAscii, TiffError, Value,
  reader::{EndianReader, ReadByteOrder},
};

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;
const TYPE_RATIONAL: u16 = 5;
const TYPE_SBYTE: u16 = 6;
const TYPE_UNDEFINED: u16 = 7;
const TYPE_SSHORT: u16 = 8;
const TYPE_SLONG: u16 = 9;
const TYPE_SRATIONAL: u16 = 10;
const TYPE_FLOAT: u16 = 11;
const TYPE_DOUBLE: u16 = 12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
  pub tag: u16,
  pub value: Value,
  // Value offset for the reader and for out-of-line values
  // of the writer, None for embedded values while building.
  pub embedded: Option<u32>,
}

impl std::ops::Deref for Entry {
  type Target = Value;

  fn deref(&self) -> &Self::Target {
    &self.value
  }
}

// 0-1-2-3-4-5-6-7-8-9-10-11-12
const DATASHIFTS: [u8; 13] = [0, 0, 0, 1, 2, 3, 0, 0, 1, 2, 3, 2, 3];

impl Entry {
  pub fn value_type(&self) -> u16 {
    self.value.value_type()
  }

  pub fn count(&self) -> u32 {
    self.value.count() as u32
  }

  pub fn type_name(&self) -> String {
    self.value.value_type_name()
  }

  /// Parse the entry following the already consumed `tag` field.
  /// The reader is left at the start of the next entry.
  pub fn parse<R: Read + Seek>(reader: &mut EndianReader<R>, tag: u16) -> Result<Entry> {
    let pos = reader.position()? - 2; // tag is already read

    let typ = reader.read_u16()?;
    let count = reader.read_u32()?;

    debug!("Tag: {:#x}, Typ: {:#x}, count: {}", tag, typ, count);

    // If we don't know the type assume byte data (undefined)
    let compat_typ = if typ == 0 || typ > 12 { TYPE_UNDEFINED } else { typ };

    let bytesize: u64 = (count as u64) << DATASHIFTS[compat_typ as usize];
    let offset: u32 = if bytesize <= 4 { reader.position()? } else { reader.read_u32()? };

    if offset as u64 + bytesize > reader.len() {
      return Err(TiffError::Overflow(format!(
        "Tag 0x{:X} with {} bytes at offset {} exceeds file size {}",
        tag,
        bytesize,
        offset,
        reader.len()
      )));
    }

    reader.goto(offset)?;
    let count = count as usize;
    let value = match typ {
      TYPE_BYTE => {
        let mut v = vec![0; count];
        reader.read_u8_into(&mut v)?;
        Value::Byte(v)
      }
      TYPE_ASCII => {
        let mut v = vec![0; count];
        reader.read_u8_into(&mut v)?;
        Value::Ascii(TiffAscii::new_from_raw(&v))
      }
      TYPE_SHORT => {
        let mut v = vec![0; count];
        reader.read_u16_into(&mut v)?;
        Value::Short(v)
      }
      TYPE_LONG => {
        let mut v = vec![0; count];
        reader.read_u32_into(&mut v)?;
        Value::Long(v)
      }
      TYPE_RATIONAL => {
        let mut tmp = vec![0; count * 2]; // Rational is 2x u32
        reader.read_u32_into(&mut tmp)?;
        Value::Rational(tmp.chunks_exact(2).map(|r| Rational::new(r[0], r[1])).collect())
      }
      TYPE_SBYTE => {
        let mut v = vec![0; count];
        reader.read_i8_into(&mut v)?;
        Value::SByte(v)
      }
      TYPE_UNDEFINED => {
        let mut v = vec![0; count];
        reader.read_u8_into(&mut v)?;
        Value::Undefined(v)
      }
      TYPE_SSHORT => {
        let mut v = vec![0; count];
        reader.read_i16_into(&mut v)?;
        Value::SShort(v)
      }
      TYPE_SLONG => {
        let mut v = vec![0; count];
        reader.read_i32_into(&mut v)?;
        Value::SLong(v)
      }
      TYPE_SRATIONAL => {
        let mut tmp = vec![0; count * 2]; // SRational is 2x i32
        reader.read_i32_into(&mut tmp)?;
        Value::SRational(tmp.chunks_exact(2).map(|r| SRational::new(r[0], r[1])).collect())
      }
      TYPE_FLOAT => {
        let mut v = vec![0.0; count];
        reader.read_f32_into(&mut v)?;
        Value::Float(v)
      }
      TYPE_DOUBLE => {
        let mut v = vec![0.0; count];
        reader.read_f64_into(&mut v)?;
        Value::Double(v)
      }
      x => {
        let mut v = vec![0; count];
        reader.read_u8_into(&mut v)?;
        Value::Unknown(x, v)
      }
    };
    reader.goto(pos + 12)?; // Size of IFD entry
    Ok(Entry {
      tag,
      value,
      embedded: Some(offset),
    })
  }
}
