use crate::error::{Cif2StlError, Result};
use crate::model::{Connection, ExpandedAtom, LatticeStructure};
use crate::physics::bonding::{site_graph, ConnectivityProvider};
use crate::utils::linalg::frac_to_cart;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Spin directions requested for the expansion; a site index wins over an element.
#[derive(Clone, Debug, Default)]
pub struct SpinAssignment {
    pub by_site: BTreeMap<usize, [f64; 3]>,
    pub by_element: BTreeMap<String, [f64; 3]>,
}

impl SpinAssignment {
    pub fn spin_for(&self, site_index: usize, element: &str) -> [f64; 3] {
        self.by_site
            .get(&site_index)
            .or_else(|| self.by_element.get(element))
            .copied()
            .unwrap_or([0.0; 3])
    }
}

/// Iteration bounds for a (possibly fractional) cell request
pub fn cell_bounds(counts: [f64; 3]) -> Result<[i32; 3]> {
    let mut bounds = [0; 3];
    for (axis, &n) in counts.iter().enumerate() {
        if !n.is_finite() || n <= 0.0 {
            return Err(Cif2StlError::InvalidRequest(format!(
                "unit-cell count along axis {} must be > 0, got {}",
                axis, n
            )));
        }
        bounds[axis] = n.ceil() as i32;
    }
    Ok(bounds)
}

/// Tiles the structure over `counts` unit cells.
///
/// A site copy at `frac + offset` is kept only when every component is below
/// the requested count, so 1.5 cells gives a partial second cell. When a
/// provider is given, each atom inherits the provider's bonds, resolved to
/// the copy of the neighbor site in the matching cell; neighbors that fall
/// outside the supercell (or were filtered out) are dropped.
pub fn expand(
    structure: &LatticeStructure,
    counts: [f64; 3],
    targets: Option<&BTreeSet<String>>,
    spins: &SpinAssignment,
    provider: Option<&dyn ConnectivityProvider>,
) -> Result<Vec<ExpandedAtom>> {
    let bounds = cell_bounds(counts)?;
    if structure.sites.is_empty() {
        return Err(Cif2StlError::parse("structure has no atom sites"));
    }

    // 1. Enumerate site copies
    let mut atoms: Vec<ExpandedAtom> = Vec::new();
    for x in 0..bounds[0] {
        for y in 0..bounds[1] {
            for z in 0..bounds[2] {
                let offset = [x as f64, y as f64, z as f64];
                for (site_index, site) in structure.sites.iter().enumerate() {
                    let frac = [
                        site.frac[0] + offset[0],
                        site.frac[1] + offset[1],
                        site.frac[2] + offset[2],
                    ];
                    if !(0..3).all(|i| frac[i] < counts[i]) {
                        continue;
                    }
                    if let Some(t) = targets {
                        if !t.contains(&site.species) {
                            continue;
                        }
                    }
                    atoms.push(ExpandedAtom {
                        id: atoms.len(),
                        element: site.species.clone(),
                        oxidation: site.oxidation.clone(),
                        position: frac_to_cart(frac, structure.lattice),
                        frac,
                        cell: [x, y, z],
                        site_index,
                        spin: spins.spin_for(site_index, &site.species),
                        bonds: Vec::new(),
                    });
                }
            }
        }
    }

    if atoms.is_empty() {
        return Err(match targets {
            Some(t) => Cif2StlError::parse(format!(
                "no atoms match the target elements {:?}",
                t.iter().collect::<Vec<_>>()
            )),
            None => Cif2StlError::parse("no atoms fall inside the requested cells"),
        });
    }

    // 2. Inherit connectivity
    if let Some(provider) = provider {
        let graph = site_graph(provider, structure);
        let index: HashMap<(usize, [i32; 3]), usize> = atoms
            .iter()
            .map(|a| ((a.site_index, a.cell), a.id))
            .collect();

        let mut dropped = 0usize;
        for atom in atoms.iter_mut() {
            for sb in &graph[atom.site_index] {
                let cell = [
                    atom.cell[0] + sb.image[0],
                    atom.cell[1] + sb.image[1],
                    atom.cell[2] + sb.image[2],
                ];
                match index.get(&(sb.neighbor, cell)) {
                    Some(&id) if id != atom.id => atom.bonds.push(Connection {
                        atom_id: id,
                        length: sb.weight,
                    }),
                    _ => dropped += 1,
                }
            }
        }
        if targets.is_some() && dropped > 0 {
            log::info!(
                "Dropped {} graph bonds to atoms outside the supercell or the target elements",
                dropped
            );
        } else {
            log::debug!("Dropped {} graph bonds leaving the supercell", dropped);
        }
    }

    let spinning = atoms.iter().filter(|a| a.has_spin()).count();
    log::info!(
        "Expanded {} sites over {:?} cells: {} atoms ({} with spin)",
        structure.sites.len(),
        counts,
        atoms.len(),
        spinning
    );
    Ok(atoms)
}
