// SPDX-License-Identifier: LGPL-2.1
// Copyright 2021 Daniel Vogelbacher <daniel@chaospixel.com>

use std::{fmt::Write, fs::File, io::BufReader, path::PathBuf};

use clap::ArgMatches;
use log::debug;
use rawdng::{
  formats::tiff::{GenericTiffReader, IFD},
  tags::tag_name,
};

use crate::{AppError, Result};

/// Number of values printed per entry
const VALUE_LIMIT: usize = 16;

/// Entry point for Clap sub command `inspect`
pub fn inspect(options: &ArgMatches) -> Result<()> {
  let in_file: &PathBuf = options
    .get_one("FILE")
    .ok_or_else(|| AppError::InvalidCmdSwitch("FILE is required".into()))?;

  debug!("Infile: {:?}", in_file);
  if !in_file.exists() {
    return Err(AppError::NotFound(in_file.clone()));
  }

  let mut stream = BufReader::new(File::open(in_file)?);
  let reader = GenericTiffReader::new(&mut stream)?;

  if options.get_flag("json") {
    let json = serde_json::to_string_pretty(&reader)?;
    println!("{}", json);
  } else {
    print!("{}", dump_structure(&reader));
  }
  Ok(())
}

/// Human readable listing of all IFDs and their entries
pub fn dump_structure(reader: &GenericTiffReader) -> String {
  let mut out = String::new();
  let _ = writeln!(out, "Byte order: {:?}", reader.endian());
  for (i, ifd) in reader.chain().iter().enumerate() {
    let _ = writeln!(out, "{:-<80}", "");
    dump_ifd(&mut out, &format!("IFD{}", i), ifd, 0);
  }
  out
}

fn dump_ifd(out: &mut String, name: &str, ifd: &IFD, level: usize) {
  let indent = "  ".repeat(level);
  let _ = writeln!(out, "{}{} at offset {} ({} entries)", indent, name, ifd.offset, ifd.entry_count());
  for (tag, entry) in ifd.entries() {
    let _ = writeln!(
      out,
      "{}  {:5}  {:<28} {:<9} {:>6}  {}",
      indent,
      tag,
      tag_name(*tag).unwrap_or_else(|| String::from("<unknown>")),
      entry.type_name(),
      entry.count(),
      entry.visual_rep(VALUE_LIMIT)
    );
  }
  let mut sub_tags: Vec<&u16> = ifd.sub_ifd_map().keys().collect();
  sub_tags.sort();
  for tag in sub_tags {
    let sub_name = tag_name(*tag).unwrap_or_else(|| format!("Tag {}", tag));
    for (i, sub) in ifd.sub_ifds(*tag).iter().enumerate() {
      dump_ifd(out, &format!("{}[{}]", sub_name, i), sub, level + 1);
    }
  }
}
