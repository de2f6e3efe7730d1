// src/config.rs

use crate::error::{Cif2StlError, Result};
use crate::model::elements::{get_atom_color, RadiusTable};
use crate::physics::bonding::BondStrategy;
use crate::rendering::primitives::ArrowShape;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StlFormat {
  Binary,
  Ascii,
}

/// Connectivity source for graph bonds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphProvider {
  /// Summed covalent radii times `covalent_factor`
  #[default]
  Covalent,
  /// Nearest-neighbor band over the periodic images, using the bond tolerance
  NearestNeighbor,
}

// --- MeshStyle ---

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshStyle {
  pub bond_radius: f64,
  pub sphere_subdivisions: u32,
  /// Segments around cylinders and cones
  pub sections: u32,
  /// Sphere radii are rescaled onto this range
  pub radius_range: (f64, f64),
  /// Extra or replacement raw radii (pm), keyed by element
  pub radius_overrides: HashMap<String, f64>,

  // Arrow proportions, relative to the atom's sphere radius
  pub arrow_length: f64,
  pub arrow_shaft_radius: f64,
  pub arrow_tip_radius: f64,
  pub arrow_tip_length: f64,

  pub bond_color: [u8; 4],
  pub arrow_color: [u8; 4],
  pub element_colors: HashMap<String, [u8; 4]>,
}

impl Default for MeshStyle {
  fn default() -> Self {
    Self {
      bond_radius: 0.25,
      sphere_subdivisions: 3,
      sections: 32,
      radius_range: (0.3, 1.5),
      radius_overrides: HashMap::new(),
      arrow_length: 1.5,
      arrow_shaft_radius: 0.15,
      arrow_tip_radius: 0.3,
      arrow_tip_length: 0.3,
      bond_color: [128, 128, 128, 255],
      arrow_color: [220, 20, 60, 255],
      element_colors: HashMap::new(),
    }
  }
}

impl MeshStyle {
  pub fn radius_table(&self) -> RadiusTable {
    RadiusTable::new(self.radius_range, &self.radius_overrides)
  }

  pub fn arrow_shape(&self, atom_radius: f64) -> ArrowShape {
    ArrowShape {
      length: atom_radius * self.arrow_length,
      shaft_radius: atom_radius * self.arrow_shaft_radius,
      tip_radius: atom_radius * self.arrow_tip_radius,
      tip_length: atom_radius * self.arrow_tip_length,
    }
  }

  /// Configured color first, CPK color otherwise
  pub fn element_color(&self, element: &str) -> [u8; 4] {
    self
      .element_colors
      .get(element)
      .copied()
      .unwrap_or_else(|| get_atom_color(element))
  }
}

// --- SupportStyle ---

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SupportStyle {
  pub slab_thickness: f64,
  /// Slab overhang past the model's XY bounds
  pub margin: f64,
  pub leg_radius: f64,
  /// Atoms whose sphere bottom is within this height of the lowest point get a leg
  pub leg_threshold: f64,
  pub color: [u8; 4],
}

impl Default for SupportStyle {
  fn default() -> Self {
    Self {
      slab_thickness: 1.0,
      margin: 1.0,
      leg_radius: 0.3,
      leg_threshold: 0.5,
      color: [200, 200, 200, 255],
    }
  }
}

// --- Main Config Struct ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
  #[serde(default = "default_tolerance")]
  pub default_tolerance: f64,

  #[serde(default)]
  pub default_bonds: BondStrategy,

  /// Bond cutoff factor on the summed covalent radii (graph bonds)
  #[serde(default = "default_covalent_factor")]
  pub covalent_factor: f64,

  #[serde(default)]
  pub graph_provider: GraphProvider,

  pub stl_format: StlFormat,

  #[serde(default)]
  pub style: MeshStyle,

  #[serde(default)]
  pub supports: SupportStyle,
}

fn default_tolerance() -> f64 {
  0.1
}

fn default_covalent_factor() -> f64 {
  1.15
}

impl Default for Config {
  fn default() -> Self {
    Self {
      default_tolerance: default_tolerance(),
      default_bonds: BondStrategy::default(),
      covalent_factor: default_covalent_factor(),
      graph_provider: GraphProvider::default(),
      stl_format: StlFormat::Binary,
      style: MeshStyle::default(),
      supports: SupportStyle::default(),
    }
  }
}

impl Config {
  /// Loads config from standard OS location (e.g., ~/.config/cif2stl/settings.json).
  /// Never fails; the message says where the values came from.
  pub fn load() -> (Self, String) {
    let path = Self::get_path();
    if path.exists() {
      match Self::load_from(&path) {
        Ok(cfg) => (cfg, format!("Config loaded from {:?}", path)),
        Err(e) => (Self::default(), format!("Error reading config: {}", e)),
      }
    } else {
      (
        Self::default(),
        "No config found. Using defaults.".to_string(),
      )
    }
  }

  /// Loads an explicit config file; unlike `load`, errors are returned
  pub fn load_from(path: &Path) -> Result<Self> {
    let file = File::open(path).map_err(|e| Cif2StlError::io(path, e))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
      .map_err(|e| Cif2StlError::parse(format!("invalid config {:?}: {}", path, e)))
  }

  /// Saves config to standard OS location
  pub fn save(&self) -> String {
    let path = Self::get_path();
    if let Some(parent) = path.parent() {
      let _ = fs::create_dir_all(parent);
    }
    match self.save_to(&path) {
      Ok(_) => format!("Config saved to {:?}", path),
      Err(e) => format!("Failed to save config: {}", e),
    }
  }

  pub fn save_to(&self, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| Cif2StlError::io(path, e))?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, self)
      .map_err(|e| Cif2StlError::io(path, std::io::Error::other(e)))
  }

  pub fn get_path() -> PathBuf {
    if let Some(proj) = ProjectDirs::from("org", "mavensgroup", "cif2stl") {
      proj.config_dir().join("settings.json")
    } else {
      PathBuf::from("settings.json")
    }
  }
}
