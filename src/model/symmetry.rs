use crate::error::{Cif2StlError, Result};
use crate::model::{LatticeStructure, Site};
use crate::utils::linalg::wrap_unit;
use moyo::base::{AngleTolerance, Cell, Lattice};
use moyo::data::Setting;
use moyo::MoyoDataset;
use nalgebra::{Matrix3, Vector3};

const SYMPREC: f64 = 1e-4;

/// Reduces a structure to its primitive standardized cell.
///
/// Sites are matched back to species by (element, oxidation) pair, so the
/// oxidation labels survive the reduction.
pub fn to_primitive_cell(structure: &LatticeStructure) -> Result<LatticeStructure> {
    let l = structure.lattice;

    // 1. Setup Lattice (rows are basis vectors)
    let lattice_mat = Matrix3::new(
        l[0][0], l[0][1], l[0][2],
        l[1][0], l[1][1], l[1][2],
        l[2][0], l[2][1], l[2][2],
    );
    let lattice = Lattice::new(lattice_mat);

    // 2. Map species to Moyo type ids (1-based)
    let mut species: Vec<(String, Option<String>)> = Vec::new();
    let mut numbers = Vec::with_capacity(structure.sites.len());
    let mut positions = Vec::with_capacity(structure.sites.len());

    for site in &structure.sites {
        let key = (site.species.clone(), site.oxidation.clone());
        let id = match species.iter().position(|s| *s == key) {
            Some(i) => i,
            None => {
                species.push(key);
                species.len() - 1
            }
        };
        numbers.push(id as i32 + 1);
        positions.push(Vector3::new(site.frac[0], site.frac[1], site.frac[2]));
    }

    let cell = Cell::new(lattice, positions, numbers);

    // 3. Run Moyo
    let dataset = MoyoDataset::new(&cell, SYMPREC, AngleTolerance::Default, Setting::Spglib, true)
        .map_err(|e| Cif2StlError::Symmetry(format!("{:?}", e)))?;

    // 4. Convert Result Back (basis columns are the lattice vectors)
    let prim = dataset.prim_std_cell;
    let m = prim.lattice.basis;
    let new_lattice = [
        [m[(0, 0)], m[(1, 0)], m[(2, 0)]],
        [m[(0, 1)], m[(1, 1)], m[(2, 1)]],
        [m[(0, 2)], m[(1, 2)], m[(2, 2)]],
    ];

    let mut sites = Vec::with_capacity(prim.positions.len());
    for (pos, &type_id) in prim.positions.iter().zip(prim.numbers.iter()) {
        let idx = (type_id - 1) as usize;
        let (el, ox) = species
            .get(idx)
            .cloned()
            .unwrap_or_else(|| ("X".to_string(), None));
        sites.push(Site {
            frac: [wrap_unit(pos.x), wrap_unit(pos.y), wrap_unit(pos.z)],
            species: el,
            oxidation: ox,
        });
    }

    log::info!(
        "Primitive cell (space group #{}): {} -> {} sites",
        dataset.number,
        structure.sites.len(),
        sites.len()
    );

    Ok(LatticeStructure::new(new_lattice, sites))
}
