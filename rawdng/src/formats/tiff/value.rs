// SPDX-License-Identifier: MIT
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{fmt::Display, io::Write};

use byteorder::{LittleEndian, WriteBytesExt};
use serde::{Serialize, Serializer};

use super::{Result, TiffError};

/// Type to represent tiff values of type `RATIONAL`
#[derive(Clone, Debug, Default, PartialEq, Copy)]
pub struct Rational {
  pub n: u32,
  pub d: u32,
}

impl Display for Rational {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!("{}/{}", self.n, self.d))
  }
}

impl Display for SRational {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!("{}/{}", self.n, self.d))
  }
}

impl Rational {
  pub fn new(n: u32, d: u32) -> Self {
    Self { n, d }
  }

  /// Approximate a non-negative float with fixed denominator `d`
  pub fn new_f32(n: f32, d: u32) -> Self {
    Self {
      n: (n as f64 * d as f64).round() as u32,
      d,
    }
  }
}

impl Serialize for Rational {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let s = format!("{}/{}", self.n, self.d);
    serializer.serialize_str(&s)
  }
}

/// Type to represent tiff values of type `SRATIONAL`
#[derive(Clone, Debug, Default, PartialEq, Copy)]
pub struct SRational {
  pub n: i32,
  pub d: i32,
}

impl SRational {
  pub fn new(n: i32, d: i32) -> Self {
    Self { n, d }
  }

  /// Approximate a float with fixed denominator `d`
  pub fn new_f32(n: f32, d: i32) -> Self {
    Self {
      n: (n as f64 * d as f64).round() as i32,
      d,
    }
  }
}

impl Serialize for SRational {
  fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
  where
    S: Serializer,
  {
    let s = format!("{}/{}", self.n, self.d);
    serializer.serialize_str(&s)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Value {
  /// 8-bit unsigned integer
  Byte(Vec<u8>),
  /// 8-bit byte that contains a 7-bit ASCII code; the last byte must be zero
  Ascii(TiffAscii),
  /// 16-bit unsigned integer
  Short(Vec<u16>),
  /// 32-bit unsigned integer
  Long(Vec<u32>),
  /// Fraction stored as two 32-bit unsigned integers
  Rational(Vec<Rational>),
  /// 8-bit signed integer
  SByte(Vec<i8>),
  /// 8-bit byte that may contain anything, depending on the field
  Undefined(Vec<u8>),
  /// 16-bit signed integer
  SShort(Vec<i16>),
  /// 32-bit signed integer
  SLong(Vec<i32>),
  /// Fraction stored as two 32-bit signed integers
  SRational(Vec<SRational>),
  /// 32-bit IEEE floating point
  Float(Vec<f32>),
  /// 64-bit IEEE floating point
  Double(Vec<f64>),
  /// Unknown type, wrapped in u8
  Unknown(u16, Vec<u8>),
}

impl Value {
  pub fn long(v: u32) -> Value {
    Value::Long(vec![v])
  }

  pub fn as_string(&self) -> Option<&String> {
    match self {
      Self::Ascii(v) => v.strings().first(),
      _ => None,
    }
  }

  pub fn get_u16(&self, idx: usize) -> Result<Option<u16>> {
    match self {
      Value::Byte(v) => Ok(v.get(idx).copied().map(Into::into)),
      Value::Short(v) => Ok(v.get(idx).copied()),
      Value::Long(v) => Ok(v.get(idx).map(|v| *v as u16)),
      Value::Undefined(v) => Ok(v.get(idx).copied().map(Into::into)),
      _ => Err(TiffError::General(format!("Can not use get_u16() for tiff entry value {}", self.value_type_name()))),
    }
  }

  pub fn get_u32(&self, idx: usize) -> Result<Option<u32>> {
    match self {
      Value::Byte(v) => Ok(v.get(idx).copied().map(Into::into)),
      Value::Short(v) => Ok(v.get(idx).copied().map(Into::into)),
      Value::Long(v) => Ok(v.get(idx).copied()),
      Value::Undefined(v) => Ok(v.get(idx).copied().map(Into::into)),
      Value::SShort(v) => Ok(v.get(idx).map(|v| *v as u32)),
      Value::SLong(v) => Ok(v.get(idx).map(|v| *v as u32)),
      _ => Err(TiffError::General(format!("Can not use get_u32() for tiff entry value {}", self.value_type_name()))),
    }
  }

  /// Get a value as u32, panics if out of range or not an integer type
  pub fn force_u32(&self, idx: usize) -> u32 {
    match self.get_u32(idx) {
      Ok(Some(v)) => v,
      _ => panic!("Value {:?} at index {} is not available as u32", self, idx),
    }
  }

  pub fn visual_rep(&self, limit: usize) -> String {
    fn join<T: Display>(v: &[T], limit: usize) -> String {
      v.iter().take(limit).map(|a| format!("{}", a)).collect::<Vec<String>>().join(" ")
    }
    let rep = match self {
      Value::Byte(v) => v.iter().take(limit).map(|a| format!("{:02X}", a)).collect::<Vec<String>>().join(" "),
      Value::Short(v) => join(v, limit),
      Value::Long(v) => join(v, limit),
      Value::Rational(v) => join(v, limit),
      Value::SByte(v) => join(v, limit),
      Value::SShort(v) => join(v, limit),
      Value::SLong(v) => join(v, limit),
      Value::SRational(v) => join(v, limit),
      Value::Float(v) => join(v, limit),
      Value::Double(v) => join(v, limit),
      Value::Undefined(v) => v.iter().take(limit).map(|a| format!("{:02X}", a)).collect::<Vec<String>>().join(" "),
      Value::Unknown(_t, v) => v.iter().take(limit).map(|a| format!("{:02X}", a)).collect::<Vec<String>>().join(" "),
      Value::Ascii(v) => v.strings().join(" | "),
    };
    if self.count() > limit && !matches!(self, Value::Ascii(_)) {
      format!("{} ...", rep)
    } else {
      rep
    }
  }

  pub fn count(&self) -> usize {
    match self {
      Self::Byte(v) => v.len(),
      Self::Ascii(v) => v.count(),
      Self::Short(v) => v.len(),
      Self::Long(v) => v.len(),
      Self::Rational(v) => v.len(),
      Self::SByte(v) => v.len(),
      Self::Undefined(v) => v.len(),
      Self::SShort(v) => v.len(),
      Self::SLong(v) => v.len(),
      Self::SRational(v) => v.len(),
      Self::Float(v) => v.len(),
      Self::Double(v) => v.len(),
      Self::Unknown(_, v) => v.len(),
    }
  }

  pub fn byte_size(&self) -> usize {
    match self {
      Self::Byte(v) => v.len(),
      Self::Ascii(v) => v.count(),
      Self::Short(v) => v.len() * std::mem::size_of::<u16>(),
      Self::Long(v) => v.len() * std::mem::size_of::<u32>(),
      Self::Rational(v) => v.len() * 8,
      Self::SByte(v) => v.len(),
      Self::Undefined(v) => v.len(),
      Self::SShort(v) => v.len() * std::mem::size_of::<i16>(),
      Self::SLong(v) => v.len() * std::mem::size_of::<i32>(),
      Self::SRational(v) => v.len() * 8,
      Self::Float(v) => v.len() * std::mem::size_of::<f32>(),
      Self::Double(v) => v.len() * std::mem::size_of::<f64>(),
      Self::Unknown(_, v) => v.len(),
    }
  }

  /// Value bytes for the 4 byte value field of an IFD entry
  ///
  /// Only valid for values with `byte_size() <= 4`, shorter values
  /// are padded with zeros.
  pub fn as_embedded(&self) -> Result<[u8; 4]> {
    if self.count() == 0 {
      return Err(TiffError::General("Entry has count == 0".into()));
    }
    if self.byte_size() > 4 {
      return Err(TiffError::Overflow(format!(
        "{} value with {} bytes can't be embedded into IFD entry",
        self.value_type_name(),
        self.byte_size()
      )));
    }
    let mut buf = Vec::with_capacity(4);
    self.write(&mut buf)?;
    let mut embedded = [0; 4];
    embedded[..buf.len()].copy_from_slice(&buf);
    Ok(embedded)
  }

  pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
    match self {
      Self::Byte(val) => {
        w.write_all(val)?;
      }
      Self::Ascii(val) => {
        w.write_all(&val.as_vec_with_nul())?;
      }
      Self::Short(val) => {
        for x in val {
          w.write_u16::<LittleEndian>(*x)?;
        }
      }
      Self::Long(val) => {
        for x in val {
          w.write_u32::<LittleEndian>(*x)?;
        }
      }
      Self::Rational(val) => {
        for x in val {
          w.write_u32::<LittleEndian>(x.n)?;
          w.write_u32::<LittleEndian>(x.d)?;
        }
      }
      Self::SByte(val) => {
        for x in val {
          w.write_i8(*x)?;
        }
      }
      Self::Undefined(val) => {
        w.write_all(val)?;
      }
      Self::SShort(val) => {
        for x in val {
          w.write_i16::<LittleEndian>(*x)?;
        }
      }
      Self::SLong(val) => {
        for x in val {
          w.write_i32::<LittleEndian>(*x)?;
        }
      }
      Self::SRational(val) => {
        for x in val {
          w.write_i32::<LittleEndian>(x.n)?;
          w.write_i32::<LittleEndian>(x.d)?;
        }
      }
      Self::Float(val) => {
        for x in val {
          w.write_f32::<LittleEndian>(*x)?;
        }
      }
      Self::Double(val) => {
        for x in val {
          w.write_f64::<LittleEndian>(*x)?;
        }
      }
      Self::Unknown(_, val) => {
        w.write_all(val)?;
      }
    }
    Ok(())
  }

  pub fn value_type(&self) -> u16 {
    match self {
      Self::Byte(_) => 1,
      Self::Ascii(_) => 2,
      Self::Short(_) => 3,
      Self::Long(_) => 4,
      Self::Rational(_) => 5,
      Self::SByte(_) => 6,
      Self::Undefined(_) => 7,
      Self::SShort(_) => 8,
      Self::SLong(_) => 9,
      Self::SRational(_) => 10,
      Self::Float(_) => 11,
      Self::Double(_) => 12,
      Self::Unknown(t, _) => *t,
    }
  }

  pub fn value_type_name(&self) -> String {
    match self {
      Self::Byte(_) => "BYTE".into(),
      Self::Ascii(_) => "ASCII".into(),
      Self::Short(_) => "SHORT".into(),
      Self::Long(_) => "LONG".into(),
      Self::Rational(_) => "RATIONAL".into(),
      Self::SByte(_) => "SBYTE".into(),
      Self::Undefined(_) => "UNDEF".into(),
      Self::SShort(_) => "SSHORT".into(),
      Self::SLong(_) => "SLONG".into(),
      Self::SRational(_) => "SRATIONAL".into(),
      Self::Float(_) => "FLOAT".into(),
      Self::Double(_) => "DOUBLE".into(),
      Self::Unknown(t, _) => format!("UNKNOWN ({})", t),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TiffAscii {
  strings: Vec<String>,
}

impl TiffAscii {
  pub fn new<T: AsRef<str>>(value: T) -> Self {
    Self {
      strings: vec![String::from(value.as_ref())],
    }
  }

  pub fn strings(&self) -> &Vec<String> {
    &self.strings
  }

  /// Byte count including the NUL terminator of each string
  pub fn count(&self) -> usize {
    self.strings.iter().map(|s| s.bytes().filter(|b| *b != 0).count() + 1).sum::<usize>()
  }

  /// Interior NUL bytes would split the string on reading, they are dropped.
  pub fn as_vec_with_nul(&self) -> Vec<u8> {
    let mut out = Vec::with_capacity(self.count());
    for s in &self.strings {
      out.extend(s.bytes().filter(|b| *b != 0));
      out.push(0);
    }
    out
  }

  pub fn new_from_raw(raw: &[u8]) -> Self {
    let raw = raw.strip_suffix(&[0]).unwrap_or(raw);
    let strings = raw.split(|c| *c == 0).map(|s| String::from_utf8_lossy(s).into_owned()).collect();
    Self { strings }
  }
}

impl From<&[Rational]> for Value {
  fn from(value: &[Rational]) -> Self {
    Value::Rational(value.into())
  }
}

impl From<&[SRational]> for Value {
  fn from(value: &[SRational]) -> Self {
    Value::SRational(value.into())
  }
}

impl From<&str> for Value {
  fn from(value: &str) -> Self {
    Value::Ascii(TiffAscii::new(value))
  }
}

impl From<String> for Value {
  fn from(value: String) -> Self {
    Value::Ascii(TiffAscii::new(&value))
  }
}

impl From<&[u8]> for Value {
  fn from(value: &[u8]) -> Self {
    Value::Byte(value.into())
  }
}

impl<const N: usize> From<[u8; N]> for Value {
  fn from(value: [u8; N]) -> Self {
    Value::Byte(value.into())
  }
}

impl From<u16> for Value {
  fn from(value: u16) -> Self {
    Value::Short(vec![value])
  }
}

impl From<&[u16]> for Value {
  fn from(value: &[u16]) -> Self {
    Value::Short(value.into())
  }
}

impl<const N: usize> From<[u16; N]> for Value {
  fn from(value: [u16; N]) -> Self {
    Value::Short(value.into())
  }
}

impl From<u32> for Value {
  fn from(value: u32) -> Self {
    Value::Long(vec![value])
  }
}

impl From<&Vec<u32>> for Value {
  fn from(value: &Vec<u32>) -> Self {
    Value::Long(value.clone())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_values_are_padded() -> std::result::Result<(), Box<dyn std::error::Error>> {
    assert_eq!(Value::from([2_u16, 2]).as_embedded()?, [2, 0, 2, 0]);
    assert_eq!(Value::from(1_u16).as_embedded()?, [1, 0, 0, 0]);
    assert_eq!(Value::from([2_u8, 1, 1, 0]).as_embedded()?, [2, 1, 1, 0]);
    assert_eq!(Value::from("ab").as_embedded()?, [b'a', b'b', 0, 0]);
    assert_eq!(Value::long(0x3fff).as_embedded()?, [0xff, 0x3f, 0, 0]);
    Ok(())
  }

  #[test]
  fn large_values_not_embeddable() {
    assert!(matches!(Value::from([1_u16, 2, 3]).as_embedded(), Err(TiffError::Overflow(_))));
    assert!(Value::Short(vec![]).as_embedded().is_err());
  }

  #[test]
  fn ascii_count_includes_nul() {
    let v = Value::from("LI-5M03");
    assert_eq!(v.count(), 8);
    assert_eq!(v.byte_size(), 8);
    assert_eq!(TiffAscii::new_from_raw(b"LI-5M03\0").strings()[0], "LI-5M03");
  }

  #[test]
  fn rationals_round_to_nearest() {
    assert_eq!(Rational::new_f32(0.807133, 1_000_000), Rational::new(807133, 1_000_000));
    assert_eq!(SRational::new_f32(-0.771, 10_000), SRational::new(-7710, 10_000));
  }
}
