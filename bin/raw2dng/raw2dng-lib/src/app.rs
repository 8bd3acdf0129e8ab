// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{path::PathBuf, time::SystemTime};

use chrono::DateTime;
use clap::{Arg, ArgAction, ArgGroup, Command, value_parser};
use log::debug;
use rawdng::{dng::convert::DEFAULT_GAMMA, sensor::DEFAULT_SENSOR};

/// Default name of the DNG file
pub const DEFAULT_OUTPUT: &str = "out.dng";

pub fn create_app() -> Command {
  debug!("Creating CLAP app configuration");
  Command::new("raw2dng")
    .version(crate::PKG_VERSION)
    .about("raw2dng - Convert raw bayer captures of camera modules into DNG")
    .subcommand_required(true)
    .arg_required_else_help(true)
    .arg(
      Arg::new("verbose")
        .short('v')
        .long("verbose")
        .global(true)
        .action(ArgAction::SetTrue)
        .help("Print more messages"),
    )
    .arg(
      Arg::new("debug")
        .short('d')
        .global(true)
        .action(ArgAction::Count)
        .help("Sets the level of debugging information"),
    )
    .subcommand(convert_command())
    .subcommand(
      Command::new("inspect")
        .about("Print the IFD structure of a DNG or TIFF file")
        .arg(Arg::new("json").long("json").action(ArgAction::SetTrue).help("Format output as JSON"))
        .arg(Arg::new("FILE").required(true).value_parser(value_parser!(PathBuf)).help("Input file")),
    )
    .subcommand(
      Command::new("sensors")
        .about("List built-in sensor profiles")
        .arg(Arg::new("markdown").long("md").action(ArgAction::SetTrue).help("Format table as Markdown")),
    )
}

fn convert_command() -> Command {
  Command::new("convert")
    .about("Convert a raw bayer capture into DNG format")
    .arg(
      Arg::new("width")
        .short('w')
        .long("width")
        .required(true)
        .value_parser(value_parser!(usize))
        .help("Width of the image in pixels, multiple of 16"),
    )
    .arg(
      Arg::new("height")
        .short('H')
        .long("height")
        .required(true)
        .value_parser(value_parser!(usize))
        .help("Height of the image in pixels, multiple of 16"),
    )
    .arg(
      Arg::new("bytes_per_line")
        .short('b')
        .long("bytes-per-line")
        .value_parser(value_parser!(usize))
        .help("Bytes per line of the input buffer [default: width]"),
    )
    .arg(
      Arg::new("gamma")
        .short('g')
        .long("gamma")
        .default_value(DEFAULT_GAMMA.to_string())
        .value_parser(parse_gamma)
        .help("Gamma of the input in percent, 100 is linear"),
    )
    .arg(
      Arg::new("OUTPUT")
        .short('o')
        .long("output")
        .default_value(DEFAULT_OUTPUT)
        .value_parser(value_parser!(PathBuf))
        .help("Output DNG file"),
    )
    .arg(
      Arg::new("sensor")
        .long("sensor")
        .help(format!("Id of a built-in sensor profile [default: {}]", DEFAULT_SENSOR)),
    )
    .arg(
      Arg::new("sensor_profile")
        .long("sensor-profile")
        .value_parser(value_parser!(PathBuf))
        .help("Sensor profile TOML file"),
    )
    .group(ArgGroup::new("profile").args(["sensor", "sensor_profile"]))
    .arg(Arg::new("artist").long("artist").help("Set the artist tag"))
    .arg(
      Arg::new("timestamp")
        .long("timestamp")
        .value_parser(parse_timestamp)
        .help("Capture time as RFC 3339 string [default: input modification time]"),
    )
    .arg(
      Arg::new("keep_mtime")
        .long("keep-mtime")
        .action(ArgAction::SetTrue)
        .help("Set the DNG file modification time to the capture time"),
    )
    .arg(
      Arg::new("override")
        .short('f')
        .long("override")
        .action(ArgAction::SetTrue)
        .help("Override existing files"),
    )
    .arg(Arg::new("INPUT").value_parser(value_parser!(PathBuf)).help("Input file, '-' or none for STDIN"))
}

fn parse_gamma(v: &str) -> Result<f64, String> {
  let gamma: f64 = v.parse().map_err(|e| format!("'{}' is not a number: {}", v, e))?;
  if gamma.is_finite() && gamma > 0.0 {
    Ok(gamma)
  } else {
    Err(format!("Gamma must be positive, got {}", v))
  }
}

fn parse_timestamp(v: &str) -> Result<SystemTime, String> {
  DateTime::parse_from_rfc3339(v)
    .map(SystemTime::from)
    .map_err(|e| format!("'{}' is not a RFC 3339 timestamp: {}", v, e))
}

#[cfg(test)]
mod tests {
  use std::time::{Duration, UNIX_EPOCH};

  use super::*;

  #[test]
  fn verify_app() {
    create_app().debug_assert();
  }

  #[test]
  fn convert_defaults() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let matches = create_app().try_get_matches_from(["raw2dng", "convert", "-w", "1280", "-H", "720", "capture.raw"])?;
    let (name, sc) = matches.subcommand().ok_or("subcommand missing")?;
    assert_eq!(name, "convert");
    assert_eq!(sc.get_one::<usize>("width"), Some(&1280));
    assert_eq!(sc.get_one::<usize>("bytes_per_line"), None);
    assert_eq!(sc.get_one::<f64>("gamma"), Some(&100.0));
    assert_eq!(sc.get_one::<PathBuf>("OUTPUT"), Some(&PathBuf::from("out.dng")));
    assert_eq!(sc.get_one::<String>("sensor"), None);
    assert!(!sc.get_flag("override"));
    Ok(())
  }

  #[test]
  fn convert_requires_dimensions() {
    assert!(create_app().try_get_matches_from(["raw2dng", "convert", "capture.raw"]).is_err());
  }

  #[test]
  fn reject_bad_gamma() {
    for gamma in ["0", "-5", "abc", "inf"] {
      let result = create_app().try_get_matches_from(["raw2dng", "convert", "-w", "16", "-H", "16", "-g", gamma]);
      assert!(result.is_err(), "gamma {}", gamma);
    }
  }

  #[test]
  fn sensor_and_profile_conflict() {
    let result = create_app().try_get_matches_from(["raw2dng", "convert", "-w", "16", "-H", "16", "--sensor", "li5m03", "--sensor-profile", "x.toml"]);
    assert!(result.is_err());
  }

  #[test]
  fn timestamp_parsing() {
    assert_eq!(parse_timestamp("2021-03-04T05:06:07Z"), Ok(UNIX_EPOCH + Duration::from_secs(1_614_834_367)));
    assert_eq!(parse_timestamp("2021-03-04T06:06:07+01:00"), Ok(UNIX_EPOCH + Duration::from_secs(1_614_834_367)));
    assert!(parse_timestamp("04/03/2021").is_err());
  }

  #[test]
  fn global_debug_flags() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let matches = create_app().try_get_matches_from(["raw2dng", "sensors", "-dd", "-v"])?;
    assert_eq!(matches.get_count("debug"), 2);
    assert!(matches.get_flag("verbose"));
    Ok(())
  }
}
