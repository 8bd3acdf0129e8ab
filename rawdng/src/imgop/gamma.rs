// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

/// Largest value of the 14 bit linear range
pub const LINEAR_MAX: u16 = 0x3fff;

/// Number of entries, one for each 8 bit sample
pub const CURVE_SIZE: usize = 256;

/// Table to map gamma encoded 8 bit samples back to linear 14 bit values.
///
/// The gamma value is given in percent, so 100 means a linear
/// mapping and 220 is the common 2.2 display gamma.
#[derive(Clone, Debug, PartialEq)]
pub struct GammaCurve {
  gamma: f64,
  table: [u16; CURVE_SIZE],
}

impl GammaCurve {
  /// Build the curve for `gamma`, which must be positive and finite.
  pub fn new(gamma: f64) -> Self {
    let exp = 100.0 / gamma;
    let mut table = [0; CURVE_SIZE];
    for (i, entry) in table.iter_mut().enumerate() {
      let v = (LINEAR_MAX as f64 * (i as f64 / 255.0).powf(exp) + 0.5).floor();
      *entry = v.clamp(0.0, LINEAR_MAX as f64) as u16;
    }
    Self { gamma, table }
  }

  pub fn gamma(&self) -> f64 {
    self.gamma
  }

  pub fn as_slice(&self) -> &[u16] {
    &self.table
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn linear_curve() {
    let curve = GammaCurve::new(100.0);
    for (i, v) in curve.as_slice().iter().enumerate() {
      let expected = (16383.0 * i as f64 / 255.0).round() as u16;
      assert_eq!(*v, expected, "entry {}", i);
    }
    assert_eq!(curve.as_slice()[128], 8224);
  }

  #[test]
  fn curve_properties_for_many_gammas() {
    for gamma in [0.5, 1.0, 45.0, 100.0, 180.0, 220.0, 240.0, 1000.0, 1e6] {
      let curve = GammaCurve::new(gamma);
      let table = curve.as_slice();
      assert_eq!(table.len(), 256);
      assert_eq!(table[0], 0, "gamma {}", gamma);
      assert_eq!(table[255], LINEAR_MAX, "gamma {}", gamma);
      assert!(table.windows(2).all(|w| w[0] <= w[1]), "gamma {} not monotonic", gamma);
      assert!(table.iter().all(|v| *v <= LINEAR_MAX));
    }
  }

  #[test]
  fn higher_gamma_lifts_midtones() {
    let linear = GammaCurve::new(100.0);
    let curve = GammaCurve::new(220.0);
    assert!(curve.as_slice()[128] > linear.as_slice()[128]);
    assert_eq!(curve.gamma(), 220.0);
  }
}
