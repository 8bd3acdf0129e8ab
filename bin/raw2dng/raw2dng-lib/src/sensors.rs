// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::fmt::Write;

use clap::ArgMatches;
use rawdng::{SensorProfile, sensor::builtin_profiles};

use crate::Result;

/// Print list of built-in sensor profiles
pub fn sensors(options: &ArgMatches) -> Result<()> {
  let profiles = builtin_profiles()?;
  if options.get_flag("markdown") {
    print!("{}", markdown_table(profiles));
  } else {
    print!("{}", plain_list(profiles));
  }
  Ok(())
}

fn markdown_table(profiles: &[SensorProfile]) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "# Supported sensors\n");
  let _ = writeln!(out, "| Id     | Make  | Model   | CFA  | Remarks   |");
  let _ = writeln!(out, "|--------|-------|---------|------|-----------|");
  for p in profiles {
    let _ = writeln!(
      out,
      "| {} | {} | {} | {} | {} |",
      p.id,
      p.clean_make,
      p.clean_model,
      p.cfa,
      p.remark.as_deref().unwrap_or("")
    );
  }
  let _ = writeln!(out);
  out
}

fn plain_list(profiles: &[SensorProfile]) -> String {
  let max_id = profiles.iter().map(|p| p.id.len()).max().unwrap_or(0);
  let max_model = profiles.iter().map(|p| p.unique_camera_model.len()).max().unwrap_or(0);
  let mut out = String::new();
  let _ = writeln!(out, "{:-<80}", "");
  let _ = writeln!(out, "Built-in sensors: ({} total)", profiles.len());
  for p in profiles {
    match &p.remark {
      Some(remark) => {
        let _ = writeln!(out, "{:max_id$}  {:max_model$}  {}  ({})", p.id, p.unique_camera_model, p.cfa, remark);
      }
      None => {
        let _ = writeln!(out, "{:max_id$}  {:max_model$}  {}", p.id, p.unique_camera_model, p.cfa);
      }
    }
  }
  let _ = writeln!(out);
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn list_contains_default_sensor() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let profiles = builtin_profiles()?;
    let plain = plain_list(profiles);
    assert!(plain.contains("li5m03  Leopard Imaging LI-5M03  BGGR"));

    let md = markdown_table(profiles);
    assert!(md.contains("| li5m03 | Leopard Imaging | LI-5M03 | BGGR |"));
    Ok(())
  }
}
