use std::env;
use std::fs::File;
use std::io::prelude::*;
use std::path::Path;

extern crate glob;
use self::glob::glob;
extern crate toml;
use toml::Value;

fn main() {
  join_sensors();
}

fn join_sensors() {
  let out_dir = env::var("OUT_DIR").expect("Missing ENV OUT_DIR");
  let dest_path = Path::new(&out_dir).join("sensors.toml");
  let mut out = File::create(dest_path).expect("Unable to create output file");

  for entry in glob("./data/sensors/*/**/*.toml").expect("Failed to read glob pattern") {
    let path = entry.expect("Invalid glob entry");
    println!("cargo:rerun-if-changed={}", path.display());
    out.write_all(b"[[sensors]]\n").expect("Failed to write sensor TOML");
    let mut f = File::open(&path).expect("failed to open sensor definition file");
    let mut toml = String::new();
    f.read_to_string(&mut toml).expect("Failed to read sensor definition file");

    {
      match toml.parse::<Value>() {
        Ok(_) => {}
        Err(e) => panic!("Error parsing {:?}: {:?}", path, e),
      };
    }

    out.write_all(&toml.into_bytes()).expect("Failed to write");
    out.write_all(b"\n").expect("Failed to write");
  }
  println!("cargo:rerun-if-changed=data/sensors");
}
