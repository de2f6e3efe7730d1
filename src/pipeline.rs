// src/pipeline.rs
//
// One generation request, start to finish:
// parse -> (primitive) -> expand -> transform -> bonds -> mesh -> supports -> STL

use crate::config::{Config, GraphProvider, StlFormat};
use crate::error::{Cif2StlError, Result};
use crate::io::{self, params};
use crate::model::to_primitive_cell;
use crate::physics::bonding::{
    self, BondStrategy, ConnectivityProvider, CovalentCutoff, PeriodicNearestNeighbor,
};
use crate::physics::operations::supercell::{self, SpinAssignment};
use crate::physics::operations::transform;
use crate::rendering::{build_mesh, build_supports, export_stl};
use crate::utils::report::generation_summary;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Every input of a generation, in the form a caller (CLI or form) sends it.
///
/// Spin and target fields are the raw text entries; they are parsed at the
/// start of [`generate`] so a malformed entry aborts before anything is written.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationRequest {
    pub input: PathBuf,
    /// Defaults to `<input stem>.stl` next to the input
    pub output: Option<PathBuf>,
    pub cells: [f64; 3],
    /// Degrees about x, then y, then z
    pub rotation: [f64; 3],
    pub translation: [f64; 3],
    pub base_level: f64,
    pub primitive: bool,
    /// "Yb,Si"; empty keeps every element
    pub targets: String,
    /// "0:[0,0,1],2:[0,0,-1]"
    pub site_spins: String,
    /// "Yb:[0,0,1]"
    pub element_spins: String,
    /// Falls back to the config's default tolerance
    pub tolerance: Option<f64>,
    pub supports: bool,
    pub bonds: Option<BondStrategy>,
    pub format: Option<StlFormat>,
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: None,
            cells: [1.0, 1.0, 1.0],
            rotation: [0.0; 3],
            translation: [0.0; 3],
            base_level: 0.0,
            primitive: false,
            targets: String::new(),
            site_spins: String::new(),
            element_spins: String::new(),
            tolerance: None,
            supports: false,
            bonds: None,
            format: None,
        }
    }
}

impl GenerationRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// Where the STL lands; deterministic so callers can wait on it
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(p) => p.clone(),
            None => self.input.with_extension("stl"),
        }
    }
}

/// Outcome of a successful generation
#[derive(Clone, Debug, Serialize)]
pub struct GenerationReport {
    pub output: PathBuf,
    pub atoms: usize,
    pub bonds: usize,
    pub arrows: usize,
    pub legs: usize,
    pub vertices: usize,
    pub triangles: usize,
    pub summary: String,
}

pub fn generate(request: &GenerationRequest, config: &Config) -> Result<GenerationReport> {
    // 0. The output path only exists once this run has succeeded
    let output = request.output_path();
    if output == request.input {
        return Err(Cif2StlError::InvalidRequest(format!(
            "output {:?} would overwrite the input",
            output
        )));
    }
    remove_stale_output(&output)?;

    // 1. Request text
    let targets = params::parse_target_atoms(&request.targets);
    let spins = SpinAssignment {
        by_site: params::parse_site_spins(&request.site_spins)?,
        by_element: params::parse_element_spins(&request.element_spins)?,
    };
    let tolerance = request.tolerance.unwrap_or(config.default_tolerance);
    let strategy = request.bonds.unwrap_or(config.default_bonds);
    if !(tolerance >= 0.0) || !tolerance.is_finite() {
        return Err(Cif2StlError::InvalidRequest(format!(
            "bond tolerance must be a finite value >= 0, got {}",
            tolerance
        )));
    }
    check_finite("rotation", &request.rotation)?;
    check_finite("translation", &request.translation)?;
    check_finite("base level", &[request.base_level])?;
    log::info!("Generating {:?} ({} bonds, tolerance {})", request.input, strategy, tolerance);

    // 2. Structure
    let mut structure = io::load_structure(&request.input)?;
    if request.primitive {
        structure = to_primitive_cell(&structure)?;
    }
    log::info!("Structure {} with {} sites", structure.formula, structure.site_count());

    // 3. Expansion, inheriting the site graph only when it will be used
    let covalent = CovalentCutoff {
        factor: config.covalent_factor,
    };
    let nearest = PeriodicNearestNeighbor { tolerance };
    let provider: Option<&dyn ConnectivityProvider> = match (strategy, config.graph_provider) {
        (BondStrategy::Graph, GraphProvider::Covalent) => Some(&covalent as &dyn ConnectivityProvider),
        (BondStrategy::Graph, GraphProvider::NearestNeighbor) => Some(&nearest as &dyn ConnectivityProvider),
        _ => None,
    };
    let mut atoms = supercell::expand(&structure, request.cells, targets.as_ref(), &spins, provider)?;

    // 4. Rigid transforms
    transform::rotate(&mut atoms, request.rotation);
    transform::translate(&mut atoms, request.translation);

    // 5. Bonds
    bonding::resolve(&mut atoms, strategy, tolerance)?;
    let bond_count = bonding::unique_bonds(&atoms).len();

    // 6. Mesh
    let radii = config.style.radius_table();
    let (mut mesh, counts) = build_mesh(&atoms, &radii, &config.style);

    // 7. Supports
    let mut legs = 0;
    if request.supports {
        if let Some((support, n)) =
            build_supports(&mesh, &atoms, &radii, &config.style, &config.supports, request.base_level)
        {
            mesh.append(&support);
            legs = n;
        }
    }

    // 8. Export
    let format = request.format.unwrap_or(config.stl_format);
    export_stl(&mesh, &output, format)?;

    let source = display_name(&request.input);
    Ok(GenerationReport {
        output,
        atoms: atoms.len(),
        bonds: bond_count,
        arrows: counts.arrows,
        legs,
        vertices: mesh.vertex_count(),
        triangles: mesh.face_count(),
        summary: generation_summary(&source, &atoms, bond_count, &mesh),
    })
}

fn remove_stale_output(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed previous output {:?}", path);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Cif2StlError::io(path, e)),
    }
}

fn check_finite(what: &str, values: &[f64]) -> Result<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(Cif2StlError::InvalidRequest(format!(
            "{} must be finite, got {:?}",
            what, values
        )))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let req = GenerationRequest::new("/data/uploads/Yb2Si2O7.cif");
        assert_eq!(req.output_path(), PathBuf::from("/data/uploads/Yb2Si2O7.stl"));

        let mut req = req;
        req.output = Some(PathBuf::from("/tmp/out.stl"));
        assert_eq!(req.output_path(), PathBuf::from("/tmp/out.stl"));
    }

    #[test]
    fn test_request_from_json_uses_defaults() {
        let req: GenerationRequest =
            serde_json::from_str(r#"{ "input": "a.cif", "cells": [1.5, 1, 2], "supports": true }"#).unwrap();
        assert_eq!(req.cells, [1.5, 1.0, 2.0]);
        assert!(req.supports);
        assert_eq!(req.rotation, [0.0; 3]);
        assert!(req.tolerance.is_none());
    }

    #[test]
    fn test_spin_error_aborts_before_reading() {
        let tmp = tempfile::tempdir().unwrap();
        let mut req = GenerationRequest::new(tmp.path().join("missing.cif"));
        req.site_spins = "0:[0,0]".to_string();
        let err = generate(&req, &Config::default()).unwrap_err();
        assert!(matches!(err, Cif2StlError::SpinFormat { .. }));
        assert!(!req.output_path().exists());
    }

    #[test]
    fn test_non_finite_transform_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut req = GenerationRequest::new(tmp.path().join("missing.cif"));
        req.rotation = [0.0, f64::NAN, 0.0];
        let err = generate(&req, &Config::default()).unwrap_err();
        assert!(matches!(err, Cif2StlError::InvalidRequest(_)));

        req.rotation = [0.0; 3];
        req.translation = [f64::INFINITY, 0.0, 0.0];
        let err = generate(&req, &Config::default()).unwrap_err();
        assert!(matches!(err, Cif2StlError::InvalidRequest(_)));
    }
}
