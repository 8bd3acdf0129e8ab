use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::formats::tiff::Value;

/// Color codes as used by the CFAPattern tag
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[allow(clippy::upper_case_acronyms)]
pub enum CFAColor {
  RED = 0,
  GREEN = 1,
  BLUE = 2,
}

impl CFAColor {
  fn from_char(c: char) -> Option<Self> {
    match c {
      'R' => Some(Self::RED),
      'G' => Some(Self::GREEN),
      'B' => Some(Self::BLUE),
      _ => None,
    }
  }

  fn as_char(self) -> char {
    match self {
      Self::RED => 'R',
      Self::GREEN => 'G',
      Self::BLUE => 'B',
    }
  }
}

/// Representation of a 2x2 bayer color filter array
///
/// # Example
/// ```
/// use rawdng::cfa::CFA;
/// let cfa = CFA::new("BGGR").unwrap();
/// assert_eq!(cfa.flat_pattern(), vec![2, 1, 1, 0]);
/// ```
#[derive(Clone, Eq, PartialEq)]
pub struct CFA {
  /// CFA pattern as a String
  pub name: String,
  /// Width of the repeating pattern
  pub width: usize,
  /// Height of the repeating pattern
  pub height: usize,

  pattern: [[CFAColor; 2]; 2],
}

impl CFA {
  /// Create a new CFA from a string like `RGGB`, where the first
  /// two characters describe the first row.
  pub fn new(patname: &str) -> Result<CFA, String> {
    let colors = patname
      .chars()
      .map(|c| CFAColor::from_char(c).ok_or_else(|| format!("Unknown CFA color \"{}\" in pattern \"{}\"", c, patname)))
      .collect::<Result<Vec<_>, _>>()?;
    if colors.len() != 4 {
      return Err(format!("Only 2x2 CFA patterns are supported, got \"{}\"", patname));
    }
    Ok(CFA {
      name: patname.to_string(),
      width: 2,
      height: 2,
      pattern: [[colors[0], colors[1]], [colors[2], colors[3]]],
    })
  }

  /// Build from the value of a CFAPattern tag
  pub fn new_from_tag(pat: &Value) -> Result<CFA, String> {
    let mut patname = String::new();
    for i in 0..pat.count() {
      let code = pat.get_u16(i).ok().flatten().ok_or_else(|| format!("Invalid CFAPattern value: {:?}", pat))?;
      let color = u8::try_from(code).ok().and_then(|c| CFAColor::try_from(c).ok()).ok_or_else(|| format!("Unknown CFA color code {}", code))?;
      patname.push(color.as_char());
    }
    CFA::new(&patname)
  }

  /// Get a flat pattern, as used by the CFAPattern tag
  pub fn flat_pattern(&self) -> Vec<u8> {
    self.pattern.iter().flatten().map(|c| u8::from(*c)).collect()
  }
}

impl fmt::Display for CFA {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

impl fmt::Debug for CFA {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "CFA {{ {} }}", self.name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bggr_pattern() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cfa = CFA::new("BGGR")?;
    assert_eq!(cfa.flat_pattern(), vec![2, 1, 1, 0]);
    assert_eq!(CFA::new("RGGB")?.flat_pattern(), vec![0, 1, 1, 2]);
    Ok(())
  }

  #[test]
  fn pattern_from_tag() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cfa = CFA::new_from_tag(&Value::Byte(vec![0, 1, 1, 2]))?;
    assert_eq!(cfa.name, "RGGB");
    Ok(())
  }

  #[test]
  fn invalid_patterns() {
    assert!(CFA::new("RGB").is_err());
    assert!(CFA::new("RGGE").is_err());
    assert!(CFA::new("RGGBRGGB").is_err());
    assert!(CFA::new_from_tag(&Value::Byte(vec![0, 1, 1, 7])).is_err());
  }
}
