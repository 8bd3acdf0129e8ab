use std::path::Path;

use lazy_static::lazy_static;
use log::debug;
use toml::Value;

use crate::{
  RawDngError, Result,
  cfa::CFA,
  imgop::xyz::{FlatColorMatrix, Illuminant},
};

pub static SENSORS_TOML: &str = include_str!(concat!(env!("OUT_DIR"), "/sensors.toml"));

/// Identifier of the default sensor
pub const DEFAULT_SENSOR: &str = "li5m03";

lazy_static! {
  static ref SENSORS_DB: std::result::Result<Vec<SensorProfile>, String> = build_sensor_database();
}

/// Fixed color and identity properties of a camera sensor
#[derive(Debug, Clone, PartialEq)]
pub struct SensorProfile {
  pub id: String,
  pub make: String,
  pub model: String,
  pub clean_make: String,
  pub clean_model: String,
  pub unique_camera_model: String,
  pub remark: Option<String>,
  /// Largest linear sample value after linearization
  pub white_level: u32,
  pub cfa: CFA,
  pub illuminant: Illuminant,
  /// XYZ to camera matrix, row major
  pub color_matrix: FlatColorMatrix,
  pub as_shot_neutral: [f32; 3],
}

impl SensorProfile {
  /// Parse a single sensor definition
  pub fn from_toml_str(content: &str) -> Result<Self> {
    let value = content.parse::<Value>().map_err(|e| RawDngError::Profile(format!("Error parsing sensor profile: {}", e)))?;
    let table = value
      .as_table()
      .ok_or_else(|| RawDngError::Profile("Sensor profile must be a table".to_string()))?;
    Self::from_toml(table)
  }

  /// Load a single sensor definition from a TOML file
  pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| RawDngError::with_io_error(path, e))?;
    debug!("Loading sensor profile from {}", path.display());
    Self::from_toml_str(&content)
  }

  fn from_toml(ct: &toml::value::Table) -> Result<Self> {
    let mut id = None;
    let mut make = None;
    let mut model = None;
    let mut clean_make = None;
    let mut clean_model = None;
    let mut unique_camera_model = None;
    let mut remark = None;
    let mut white_level = None;
    let mut cfa = None;
    let mut color_matrix = None;
    let mut as_shot_neutral = None;

    for (name, val) in ct {
      match name.as_ref() {
        n @ "id" => id = Some(as_string(n, val)?),
        n @ "make" => make = Some(as_string(n, val)?),
        n @ "model" => model = Some(as_string(n, val)?),
        n @ "clean_make" => clean_make = Some(as_string(n, val)?),
        n @ "clean_model" => clean_model = Some(as_string(n, val)?),
        n @ "unique_camera_model" => unique_camera_model = Some(as_string(n, val)?),
        n @ "remark" => remark = Some(as_string(n, val)?),
        n @ "whitepoint" => {
          let white = val.as_integer().ok_or_else(|| invalid(n, "must be an integer"))?;
          if white <= 0 || white > u16::MAX as i64 {
            return Err(invalid(n, "must be in range 1..=65535"));
          }
          white_level = Some(white as u32);
        }
        n @ "color_pattern" => {
          cfa = Some(CFA::new(&as_string(n, val)?).map_err(|e| invalid(n, &e))?);
        }
        n @ "color_matrix" => {
          let matrices = val.as_table().ok_or_else(|| invalid(n, "must be a table of illuminants"))?;
          if matrices.len() != 1 {
            return Err(invalid(n, "must contain exactly one illuminant"));
          }
          for (illu_str, matrix) in matrices {
            let illu = Illuminant::new_from_str(illu_str).map_err(|e| invalid(n, &e))?;
            let values = as_floats(n, matrix)?;
            if values.len() != 9 {
              return Err(invalid(n, "must have 9 values"));
            }
            color_matrix = Some((illu, values));
          }
        }
        n @ "as_shot_neutral" => {
          let values = as_floats(n, val)?;
          match values.as_slice() {
            [r, g, b] if values.iter().all(|v| *v > 0.0) => as_shot_neutral = Some([*r, *g, *b]),
            _ => return Err(invalid(n, "must have 3 positive values")),
          }
        }
        unknown => {
          debug!("Ignoring unknown sensor profile key: {}", unknown);
        }
      }
    }

    let make = make.ok_or_else(|| missing("make"))?;
    let model = model.ok_or_else(|| missing("model"))?;
    let clean_make = clean_make.unwrap_or_else(|| make.clone());
    let clean_model = clean_model.unwrap_or_else(|| model.clone());
    let (illuminant, color_matrix) = color_matrix.ok_or_else(|| missing("color_matrix"))?;
    Ok(Self {
      id: id.unwrap_or_else(|| clean_model.to_lowercase().replace(|c: char| !c.is_ascii_alphanumeric(), "")),
      unique_camera_model: unique_camera_model.unwrap_or_else(|| format!("{} {}", clean_make, clean_model)),
      make,
      model,
      clean_make,
      clean_model,
      remark,
      white_level: white_level.ok_or_else(|| missing("whitepoint"))?,
      cfa: cfa.ok_or_else(|| missing("color_pattern"))?,
      illuminant,
      color_matrix,
      as_shot_neutral: as_shot_neutral.ok_or_else(|| missing("as_shot_neutral"))?,
    })
  }

  /// Leopard Imaging LI-5M03
  pub fn li5m03() -> Result<Self> {
    builtin(DEFAULT_SENSOR)
  }
}

fn as_string(name: &str, val: &Value) -> Result<String> {
  val.as_str().map(String::from).ok_or_else(|| invalid(name, "must be a string"))
}

fn as_floats(name: &str, val: &Value) -> Result<Vec<f32>> {
  val
    .as_array()
    .ok_or_else(|| invalid(name, "must be an array"))?
    .iter()
    .map(|v| {
      v.as_float()
        .or_else(|| v.as_integer().map(|i| i as f64))
        .filter(|f| f.is_finite())
        .map(|f| f as f32)
        .ok_or_else(|| invalid(name, "values must be numbers"))
    })
    .collect()
}

fn invalid(name: &str, reason: &str) -> RawDngError {
  RawDngError::Profile(format!("{} {}", name, reason))
}

fn missing(name: &str) -> RawDngError {
  RawDngError::Profile(format!("Missing required key: {}", name))
}

fn build_sensor_database() -> std::result::Result<Vec<SensorProfile>, String> {
  let toml = SENSORS_TOML.parse::<Value>().map_err(|e| format!("Error parsing sensors.toml: {:?}", e))?;
  let mut sensors = Vec::new();
  if let Some(list) = toml.get("sensors").and_then(Value::as_array) {
    for sensor in list {
      let ct = sensor.as_table().ok_or("Sensor definition must be a table")?;
      let profile = SensorProfile::from_toml(ct).map_err(|e| e.to_string())?;
      debug!("Registered built-in sensor {}", profile.id);
      sensors.push(profile);
    }
  }
  sensors.sort_by(|a, b| a.id.cmp(&b.id));
  Ok(sensors)
}

/// All built-in sensor profiles, sorted by id
pub fn builtin_profiles() -> Result<&'static [SensorProfile]> {
  SENSORS_DB.as_ref().map(Vec::as_slice).map_err(|e| RawDngError::Profile(e.clone()))
}

/// Lookup a built-in sensor profile by id
pub fn builtin(id: &str) -> Result<SensorProfile> {
  builtin_profiles()?
    .iter()
    .find(|p| p.id.eq_ignore_ascii_case(id))
    .cloned()
    .ok_or_else(|| RawDngError::Profile(format!("Unknown sensor: {}", id)))
}
