use std::fs;
use std::path::{Path, PathBuf};

use cif2stl::config::{Config, GraphProvider, StlFormat};
use cif2stl::io::upload::UploadDir;
use cif2stl::physics::bonding::BondStrategy;
use cif2stl::{generate, Cif2StlError, GenerationRequest};

const NACL: &str = "data_NaCl
_cell_length_a 5.64
_cell_length_b 5.64
_cell_length_c 5.64
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_symmetry_equiv_pos_site_id
_symmetry_equiv_pos_as_xyz
1 'x, y, z'
2 'x+1/2, y+1/2, z'
3 'x+1/2, y, z+1/2'
4 'x, y+1/2, z+1/2'
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Na1 Na+ 0.0 0.0 0.0
Cl1 Cl- 0.5 0.5 0.5
";

fn write_cif(dir: &Path) -> PathBuf {
    let path = dir.join("NaCl.cif");
    fs::write(&path, NACL).unwrap();
    path
}

#[test]
fn single_cell_binary_stl() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let report = generate(&GenerationRequest::new(&input), &Config::default()).unwrap();

    assert_eq!(report.output, tmp.path().join("NaCl.stl"));
    assert_eq!(report.atoms, 8);
    assert!(report.bonds > 0);
    assert_eq!(report.arrows, 0);

    let bytes = fs::read(&report.output).unwrap();
    assert_eq!(bytes.len(), 84 + 50 * report.triangles);
    assert!(!tmp.path().join("NaCl.stl.part").exists());
    assert!(report.summary.contains("Atoms: Cl4 Na4"));
}

#[test]
fn partial_cells_and_targets() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut req = GenerationRequest::new(&input);
    req.cells = [1.5, 1.0, 1.0];
    let report = generate(&req, &Config::default()).unwrap();
    // Sites with x = 0 are repeated in the half cell, x = 0.5 ones are not
    assert_eq!(report.atoms, 12);

    req.cells = [1.0, 1.0, 1.0];
    req.targets = "Cl".to_string();
    let report = generate(&req, &Config::default()).unwrap();
    assert_eq!(report.atoms, 4);

    req.targets = "Yb".to_string();
    let err = generate(&req, &Config::default()).unwrap_err();
    assert!(matches!(err, Cif2StlError::Parse(_)));
}

#[test]
fn spins_and_supports() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut req = GenerationRequest::new(&input);
    req.site_spins = "0:[0,0,1]".to_string();
    req.element_spins = "Cl:[1,0,0]".to_string();
    req.supports = true;
    req.base_level = -2.0;
    req.output = Some(tmp.path().join("out").with_extension("stl"));

    let report = generate(&req, &Config::default()).unwrap();
    assert_eq!(report.arrows, 5);
    assert!(report.legs > 0);
    assert!(report.output.exists());
}

#[test]
fn spin_format_error_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut req = GenerationRequest::new(&input);
    req.site_spins = "0:[0,0,1],1:[1,0".to_string();
    let err = generate(&req, &Config::default()).unwrap_err();
    assert_eq!(err.kind(), "SpinFormatError");
    assert!(!req.output_path().exists());
}

#[test]
fn failed_run_removes_previous_output() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut req = GenerationRequest::new(&input);
    let report = generate(&req, &Config::default()).unwrap();
    assert!(report.output.exists());

    req.site_spins = "0:[0,0".to_string();
    let err = generate(&req, &Config::default()).unwrap_err();
    assert!(matches!(err, Cif2StlError::SpinFormat { .. }));
    assert!(!report.output.exists());

    req.site_spins.clear();
    req.translation = [0.0, f64::NAN, 0.0];
    generate(&GenerationRequest::new(&input), &Config::default()).unwrap();
    let err = generate(&req, &Config::default()).unwrap_err();
    assert!(matches!(err, Cif2StlError::InvalidRequest(_)));
    assert!(!report.output.exists());
}

#[test]
fn output_never_replaces_input() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut req = GenerationRequest::new(&input);
    req.output = Some(input.clone());
    let err = generate(&req, &Config::default()).unwrap_err();
    assert!(matches!(err, Cif2StlError::InvalidRequest(_)));
    assert!(input.exists());
}

#[test]
fn unsupported_input_is_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    let input = tmp.path().join("model.xyz");
    fs::write(&input, "1\n\nFe 0 0 0\n").unwrap();
    let err = generate(&GenerationRequest::new(&input), &Config::default()).unwrap_err();
    assert!(matches!(err, Cif2StlError::Parse(_)));
}

#[test]
fn unwritable_output_is_io_error() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());
    let mut req = GenerationRequest::new(&input);
    req.output = Some(tmp.path().join("no").join("such").join("dir.stl"));
    let err = generate(&req, &Config::default()).unwrap_err();
    assert!(matches!(err, Cif2StlError::Io { .. }));
}

#[test]
fn ascii_output_and_shell_bonds() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut config = Config::default();
    config.stl_format = StlFormat::Ascii;
    let mut req = GenerationRequest::new(&input);
    req.bonds = Some(BondStrategy::Shells { count: 1 });

    let report = generate(&req, &config).unwrap();
    let text = fs::read_to_string(&report.output).unwrap();
    assert!(text.starts_with("solid NaCl"));
    assert_eq!(text.matches("endfacet").count(), report.triangles);
    // Na-Cl edge contacts inside one conventional cell
    assert_eq!(report.bonds, 12);
}

#[test]
fn graph_bonds_from_covalent_cutoff() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut config = Config::default();
    let mut req = GenerationRequest::new(&input);
    req.bonds = Some(BondStrategy::Graph);

    // (1.54 + 0.99) * 1.15 reaches the 2.82 Å Na-Cl contacts
    let report = generate(&req, &config).unwrap();
    assert_eq!(report.bonds, 12);

    // Below 2.82 / 2.53 nothing is bonded
    config.covalent_factor = 1.1;
    let report = generate(&req, &config).unwrap();
    assert_eq!(report.bonds, 0);
}

#[test]
fn graph_bonds_from_periodic_neighbors() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut config = Config::default();
    config.graph_provider = GraphProvider::NearestNeighbor;
    let mut req = GenerationRequest::new(&input);
    req.bonds = Some(BondStrategy::Graph);

    // Six Cl at 2.82 Å around each Na; three of them inside the cell
    let report = generate(&req, &config).unwrap();
    assert_eq!(report.bonds, 12);
}

#[test]
fn rotation_keeps_bond_count() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let plain = generate(&GenerationRequest::new(&input), &Config::default()).unwrap();
    let mut req = GenerationRequest::new(&input);
    req.rotation = [30.0, 45.0, 60.0];
    req.translation = [10.0, -5.0, 2.0];
    let moved = generate(&req, &Config::default()).unwrap();

    assert_eq!(plain.bonds, moved.bonds);
    assert_eq!(plain.triangles, moved.triangles);
}

#[test]
fn primitive_cell_reduction() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());

    let mut req = GenerationRequest::new(&input);
    req.primitive = true;
    let report = generate(&req, &Config::default()).unwrap();
    assert_eq!(report.atoms, 2);
}

#[test]
fn staged_upload_generates_next_to_it() {
    let tmp = tempfile::tempdir().unwrap();
    let input = write_cif(tmp.path());
    let uploads = UploadDir::open(tmp.path().join("uploads")).unwrap();
    fs::write(uploads.path().join("stale.cif"), "old").unwrap();

    let staged = uploads.stage(&input).unwrap();
    assert!(!uploads.path().join("stale.cif").exists());

    let report = generate(&GenerationRequest::new(&staged), &Config::default()).unwrap();
    assert_eq!(report.output, uploads.path().join("NaCl.stl"));
}
