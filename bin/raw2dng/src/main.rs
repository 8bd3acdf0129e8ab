// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use fern::colors::{Color, ColoredLevelConfig};
use raw2dng_lib::{app, convert, inspect, sensors};

/// Main entry function
///
/// We initialize the fern logger here, create a Clap command line
/// parser and dispatch to the sub command.
fn main() -> anyhow::Result<()> {
  let app = app::create_app();
  let matches = app.try_get_matches().unwrap_or_else(|e| e.exit());

  let colors = ColoredLevelConfig::new().debug(Color::Magenta);
  let mut level = match matches.get_count("debug") {
    0 => log::LevelFilter::Error,
    1 => log::LevelFilter::Warn,
    2 => log::LevelFilter::Info,
    3 => log::LevelFilter::Debug,
    _ => log::LevelFilter::Trace,
  };
  if matches.get_flag("verbose") {
    level = level.max(log::LevelFilter::Info);
  }
  fern::Dispatch::new()
    .chain(std::io::stderr())
    .level(level)
    .format(move |out, message, record| {
      out.finish(format_args!(
        "[{:6}][{}] {} ({}:{})",
        colors.color(record.level()),
        record.target(),
        message,
        record.file().unwrap_or("<undefined>"),
        record.line().unwrap_or(0)
      ))
    })
    .apply()
    .expect("Invalid fern configuration, exiting");

  match matches.subcommand() {
    Some(("convert", sc)) => convert::convert(sc)?,
    Some(("inspect", sc)) => inspect::inspect(sc)?,
    Some(("sensors", sc)) => sensors::sensors(sc)?,
    _ => panic!("Unknown subcommand was used"),
  }
  Ok(())
}
