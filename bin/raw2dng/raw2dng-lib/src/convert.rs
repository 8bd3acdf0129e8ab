// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{
  fmt::Display,
  fs::{File, remove_file},
  io::{BufWriter, Read},
  path::PathBuf,
  time::{Instant, SystemTime, UNIX_EPOCH},
};

use chrono::Local;
use clap::ArgMatches;
use log::{debug, warn};
use rawdng::{
  ConvertParams, GammaCurve, RawFrame, SensorProfile, SourceInfo,
  dng::{convert::DEFAULT_GAMMA, encode},
  sensor::{self, DEFAULT_SENSOR},
};

use crate::{AppError, Result, app::DEFAULT_OUTPUT};

/// Name embedded as original file name for captures read from STDIN
const STDIN_FILENAME: &str = "stdin";

/// Job for converting a raw capture to DNG
#[derive(Debug, Clone)]
pub struct ConvertJob {
  /// Input file, `None` for STDIN
  pub input: Option<PathBuf>,
  pub output: PathBuf,
  pub width: usize,
  pub height: usize,
  pub stride: usize,
  pub profile: SensorProfile,
  /// Overrides the modification time of the input
  pub timestamp: Option<SystemTime>,
  pub keep_mtime: bool,
  pub replace: bool,
  pub params: ConvertParams,
}

impl Display for ConvertJob {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_fmt(format_args!(
      "'{}' ({}x{}, {} bytes per line, sensor {}) => '{}'",
      self.input_name(),
      self.width,
      self.height,
      self.stride,
      self.profile.id,
      self.output.display()
    ))
  }
}

impl ConvertJob {
  pub fn from_matches(options: &ArgMatches) -> Result<Self> {
    let width = *options
      .get_one::<usize>("width")
      .ok_or_else(|| AppError::InvalidCmdSwitch("Width is required".into()))?;
    let height = *options
      .get_one::<usize>("height")
      .ok_or_else(|| AppError::InvalidCmdSwitch("Height is required".into()))?;
    // 0 is accepted as "not given"
    let stride = match options.get_one::<usize>("bytes_per_line") {
      Some(&b) if b > 0 => b,
      _ => width,
    };

    let input = options.get_one::<PathBuf>("INPUT").filter(|p| p.as_os_str() != "-").cloned();
    let output = options.get_one::<PathBuf>("OUTPUT").cloned().unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let profile = match options.get_one::<PathBuf>("sensor_profile") {
      Some(path) => {
        if !path.exists() {
          return Err(AppError::NotFound(path.clone()));
        }
        SensorProfile::from_file(path)?
      }
      None => sensor::builtin(options.get_one::<String>("sensor").map(String::as_str).unwrap_or(DEFAULT_SENSOR))?,
    };

    let params = ConvertParams {
      gamma: options.get_one::<f64>("gamma").copied().unwrap_or(DEFAULT_GAMMA),
      artist: options.get_one::<String>("artist").cloned(),
      ..Default::default()
    };

    Ok(Self {
      input,
      output,
      width,
      height,
      stride,
      profile,
      timestamp: options.get_one::<SystemTime>("timestamp").copied(),
      keep_mtime: options.get_flag("keep_mtime"),
      replace: options.get_flag("override"),
      params,
    })
  }

  fn input_name(&self) -> String {
    match &self.input {
      Some(path) => path.display().to_string(),
      None => String::from("<stdin>"),
    }
  }

  fn read_input(&self) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    match &self.input {
      Some(path) => {
        if !path.exists() {
          return Err(AppError::NotFound(path.clone()));
        }
        File::open(path)?.read_to_end(&mut data)?;
      }
      None => {
        std::io::stdin().lock().read_to_end(&mut data)?;
      }
    }
    debug!("Read {} bytes from {}", data.len(), self.input_name());
    Ok(data)
  }

  /// File name and capture time to embed into the DNG
  fn source_info(&self) -> Result<SourceInfo> {
    let filename = match &self.input {
      Some(path) => path
        .file_name()
        .ok_or(AppError::General("Input has no filename".into()))?
        .to_string_lossy()
        .to_string(),
      None => String::from(STDIN_FILENAME),
    };
    let timestamp = match (self.timestamp, &self.input) {
      (Some(ts), _) => ts,
      (None, Some(path)) => std::fs::metadata(path).and_then(|md| md.modified())?,
      (None, None) => {
        warn!("No capture time available for STDIN input, using UNIX epoch");
        UNIX_EPOCH
      }
    };
    Ok(SourceInfo::new(filename, timestamp))
  }

  /// Run the conversion
  ///
  /// Inputs are validated before the output file is created. If
  /// writing fails, the incomplete output file is removed.
  pub fn exec(&self) -> Result<()> {
    if self.output.exists() && !self.replace {
      return Err(AppError::AlreadyExists(self.output.clone()));
    }
    let data = self.read_input()?;
    let source = self.source_info()?;
    let frame = RawFrame::new(&data, self.width, self.height, self.stride)?;
    let curve = self.params.gamma_curve()?;

    match self.write_dng(frame, &curve, &source) {
      Ok(file) => {
        if self.keep_mtime {
          copy_mtime(&file, source.timestamp)?;
        }
        Ok(())
      }
      Err(err) => {
        if let Err(err) = remove_file(&self.output) {
          log::error!("Failed to delete DNG file after conversion error: {:?}", err);
        }
        Err(err)
      }
    }
  }

  fn write_dng(&self, frame: RawFrame, curve: &GammaCurve, source: &SourceInfo) -> Result<File> {
    let mut dng = BufWriter::new(File::create(&self.output)?);
    encode(frame, &self.profile, curve, source, &self.params, &mut dng)?;
    let file = dng.into_inner().map_err(|e| e.into_error())?;
    Ok(file)
  }
}

fn copy_mtime(file: &File, ts: SystemTime) -> Result<()> {
  file.set_modified(ts)?;
  let datetime: chrono::DateTime<Local> = ts.into();
  debug!("Set mtime for DNG file to {}", datetime.format("%d/%m/%Y %T"));
  Ok(())
}

/// Entry point for Clap sub command `convert`
pub fn convert(options: &ArgMatches) -> Result<()> {
  let job = ConvertJob::from_matches(options)?;
  debug!("Job running: {}", job);
  let now = Instant::now();
  job.exec()?;
  eprintln!(
    "Converted {} => '{}' (in {:.2}s)",
    job.input_name(),
    job.output.display(),
    now.elapsed().as_secs_f32()
  );
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::{path::Path, time::Duration};

  use rawdng::{
    formats::tiff::GenericTiffReader,
    tags::{DngTag, TiffCommonTag},
  };

  use super::*;
  use crate::app::create_app;

  type TestResult = std::result::Result<(), Box<dyn std::error::Error>>;

  fn job_for(args: &[&str]) -> Result<ConvertJob> {
    let mut argv = vec!["raw2dng", "convert"];
    argv.extend_from_slice(args);
    let matches = create_app().try_get_matches_from(argv).map_err(|e| AppError::InvalidCmdSwitch(e.to_string()))?;
    let (_, sc) = matches.subcommand().ok_or(AppError::General("No subcommand".into()))?;
    ConvertJob::from_matches(sc)
  }

  fn write_capture(dir: &Path, name: &str, len: usize) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(&path, data)?;
    Ok(path)
  }

  fn read_dng(path: &Path) -> std::result::Result<GenericTiffReader, Box<dyn std::error::Error>> {
    let mut file = File::open(path)?;
    Ok(GenericTiffReader::new(&mut file)?)
  }

  #[test]
  fn convert_file_with_defaults() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_capture(dir.path(), "frame.raw", 32 * 16)?;
    let output = dir.path().join("frame.dng");
    let job = job_for(&["-w", "32", "-H", "16", "-o", output.to_str().ok_or("path")?, input.to_str().ok_or("path")?])?;
    assert_eq!(job.stride, 32);
    assert_eq!(job.profile.id, DEFAULT_SENSOR);
    job.exec()?;

    let reader = read_dng(&output)?;
    let root = reader.root_ifd();
    assert_eq!(
      root.get_entry(DngTag::OriginalRawFileName).and_then(|e| e.as_string()).map(String::as_str),
      Some("frame.raw")
    );
    let raw = &root.sub_ifds(TiffCommonTag::SubIFDs)[0];
    assert_eq!(raw.get_entry(TiffCommonTag::ImageWidth).map(|e| e.force_u32(0)), Some(32));
    Ok(())
  }

  #[test]
  fn existing_output_is_refused() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_capture(dir.path(), "frame.raw", 16 * 16)?;
    let output = dir.path().join("frame.dng");
    std::fs::write(&output, b"keep me")?;
    let args = ["-w", "16", "-H", "16", "-o", output.to_str().ok_or("path")?, input.to_str().ok_or("path")?];

    assert!(matches!(job_for(&args)?.exec(), Err(AppError::AlreadyExists(_))));
    assert_eq!(std::fs::read(&output)?, b"keep me");

    let mut args = args.to_vec();
    args.push("-f");
    job_for(&args)?.exec()?;
    assert!(GenericTiffReader::is_tiff(std::fs::read(&output)?));
    Ok(())
  }

  #[test]
  fn invalid_input_leaves_no_output() -> TestResult {
    let dir = tempfile::tempdir()?;
    let output = dir.path().join("out.dng");
    let out = output.to_str().ok_or("path")?;

    let input = write_capture(dir.path(), "short.raw", 16 * 16 - 1)?;
    let result = job_for(&["-w", "16", "-H", "16", "-o", out, input.to_str().ok_or("path")?])?.exec();
    assert!(matches!(result, Err(AppError::ConversionFailed(_))));
    assert!(!output.exists());

    let input = write_capture(dir.path(), "odd.raw", 24 * 16)?;
    let result = job_for(&["-w", "24", "-H", "16", "-o", out, input.to_str().ok_or("path")?])?.exec();
    assert!(matches!(result, Err(AppError::InvalidCmdSwitch(_))));
    assert!(!output.exists());
    Ok(())
  }

  #[test]
  fn missing_input_is_reported() -> TestResult {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("missing.raw");
    let output = dir.path().join("out.dng");
    let result = job_for(&["-w", "16", "-H", "16", "-o", output.to_str().ok_or("path")?, missing.to_str().ok_or("path")?])?.exec();
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(!output.exists());
    Ok(())
  }

  #[test]
  fn timestamp_and_mtime() -> TestResult {
    let dir = tempfile::tempdir()?;
    let input = write_capture(dir.path(), "frame.raw", 20 * 15 + 16)?;
    let output = dir.path().join("frame.dng");
    let job = job_for(&[
      "-w",
      "16",
      "-H",
      "16",
      "-b",
      "20",
      "--timestamp",
      "2021-03-04T05:06:07Z",
      "--keep-mtime",
      "--artist",
      "Someone",
      "-o",
      output.to_str().ok_or("path")?,
      input.to_str().ok_or("path")?,
    ])?;
    job.exec()?;

    let expected = UNIX_EPOCH + Duration::from_secs(1_614_834_367);
    assert_eq!(std::fs::metadata(&output)?.modified()?, expected);
    let reader = read_dng(&output)?;
    let root = reader.root_ifd();
    assert_eq!(
      root.get_entry(TiffCommonTag::DateTime).and_then(|e| e.as_string()).map(String::as_str),
      Some("2021:03:04 05:06:07")
    );
    assert_eq!(root.get_entry(TiffCommonTag::Artist).and_then(|e| e.as_string()).map(String::as_str), Some("Someone"));
    Ok(())
  }

  #[test]
  fn stdin_source_info() -> TestResult {
    let job = job_for(&["-w", "16", "-H", "16", "-"])?;
    assert!(job.input.is_none());
    let source = job.source_info()?;
    assert_eq!(source.filename, STDIN_FILENAME);
    assert_eq!(source.timestamp, UNIX_EPOCH);
    Ok(())
  }

  #[test]
  fn custom_sensor_profile() -> TestResult {
    let dir = tempfile::tempdir()?;
    let profile = dir.path().join("sensor.toml");
    std::fs::write(
      &profile,
      r#"
make = "Acme"
model = "Cam 1"
clean_make = "Acme"
clean_model = "Cam 1"
whitepoint = 16383
color_pattern = "RGGB"
as_shot_neutral = [0.5, 1.0, 0.6]
color_matrix = { D65 = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] }
"#,
    )?;
    let job = job_for(&["-w", "16", "-H", "16", "--sensor-profile", profile.to_str().ok_or("path")?])?;
    assert_eq!(job.profile.make, "Acme");
    assert_eq!(job.profile.cfa.to_string(), "RGGB");

    let unknown = job_for(&["-w", "16", "-H", "16", "--sensor", "nope"]);
    assert!(unknown.is_err());
    Ok(())
  }
}
