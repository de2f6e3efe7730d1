// src/io/mod.rs
pub mod cif;
pub mod params;
pub mod upload;

use crate::error::{Cif2StlError, Result};
use crate::model::LatticeStructure;
use std::path::Path;

pub fn load_structure(path: &Path) -> Result<LatticeStructure> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "cif" | "mcif" => cif::parse(path),
        _ => Err(Cif2StlError::parse(format!(
            "unsupported structure file {:?} (expected .cif)",
            path
        ))),
    }
}
