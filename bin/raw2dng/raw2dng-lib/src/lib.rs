// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::path::PathBuf;

use rawdng::{RawDngError, formats::tiff::TiffError};
use thiserror::Error;

pub mod app;
pub mod convert;
pub mod inspect;
pub mod sensors;

const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Error, Debug)]
pub enum AppError {
  #[error("{}", _0)]
  General(String),
  #[error("Invalid arguments: {}", _0)]
  InvalidCmdSwitch(String),
  #[error("I/O error: {}", _0)]
  Io(#[from] std::io::Error),
  #[error("Not found: {}", _0.display())]
  NotFound(PathBuf),
  #[error("Already exists: {}", _0.display())]
  AlreadyExists(PathBuf),
  #[error("Conversion failed: {}", _0)]
  ConversionFailed(String),
  #[error(transparent)]
  Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AppError {
  fn from(value: serde_json::Error) -> Self {
    anyhow::Error::new(value).into()
  }
}

impl From<RawDngError> for AppError {
  fn from(value: RawDngError) -> Self {
    match value {
      RawDngError::InvalidParameter(msg) => Self::InvalidCmdSwitch(msg),
      err @ RawDngError::InsufficientInput(_) => Self::ConversionFailed(err.to_string()),
      other => anyhow::Error::new(other).into(),
    }
  }
}

impl From<TiffError> for AppError {
  fn from(value: TiffError) -> Self {
    anyhow::Error::new(value).into()
  }
}

pub type Result<T> = std::result::Result<T, AppError>;
