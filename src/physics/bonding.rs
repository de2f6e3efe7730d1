// src/physics/bonding.rs
//
// Bond detection, on the periodic structure (connectivity providers) and on
// the flat list of expanded atoms (bond resolvers).

use crate::error::{Cif2StlError, Result};
use crate::model::elements::get_atom_cov;
use crate::model::{Bond, Connection, ExpandedAtom, LatticeStructure, SiteBond};
use crate::utils::geometry::distance;
use crate::utils::linalg::frac_to_cart;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Distances below this are treated as the same point
const OVERLAP_EPS: f64 = 1e-8;

/// Relative width used to group distances into shells
const SHELL_WIDTH: f64 = 0.01;

/// Source of bonds on the periodic structure, queried once per site.
pub trait ConnectivityProvider {
    fn name(&self) -> &'static str;

    fn bonds_for(&self, structure: &LatticeStructure, site_index: usize) -> Vec<SiteBond>;
}

/// Runs a provider over every site
pub fn site_graph(provider: &dyn ConnectivityProvider, structure: &LatticeStructure) -> Vec<Vec<SiteBond>> {
    let graph: Vec<Vec<SiteBond>> = (0..structure.sites.len())
        .map(|i| provider.bonds_for(structure, i))
        .collect();
    log::debug!(
        "{} connectivity: {} site bonds over {} sites",
        provider.name(),
        graph.iter().map(|b| b.len()).sum::<usize>(),
        graph.len()
    );
    graph
}

/// Every periodic image of every site in the 3x3x3 block around the origin
/// cell, with its distance to `site_index`.
fn neighbor_candidates(structure: &LatticeStructure, site_index: usize) -> Vec<(SiteBond, f64)> {
    let origin = frac_to_cart(structure.sites[site_index].frac, structure.lattice);
    let mut out = Vec::with_capacity(structure.sites.len() * 27);

    for (j, site) in structure.sites.iter().enumerate() {
        for ix in -1..=1 {
            for iy in -1..=1 {
                for iz in -1..=1 {
                    if j == site_index && ix == 0 && iy == 0 && iz == 0 {
                        continue;
                    }
                    let f = [
                        site.frac[0] + ix as f64,
                        site.frac[1] + iy as f64,
                        site.frac[2] + iz as f64,
                    ];
                    let d = distance(origin, frac_to_cart(f, structure.lattice));
                    if d < OVERLAP_EPS {
                        continue;
                    }
                    let bond = SiteBond {
                        neighbor: j,
                        image: [ix, iy, iz],
                        weight: d,
                    };
                    out.push((bond, d));
                }
            }
        }
    }
    out
}

/// Nearest-neighbor band on the periodic structure: every image whose
/// distance lies within [d_min(1-t), d_min(1+t)].
#[derive(Clone, Debug)]
pub struct PeriodicNearestNeighbor {
    pub tolerance: f64,
}

impl ConnectivityProvider for PeriodicNearestNeighbor {
    fn name(&self) -> &'static str {
        "periodic-nearest-neighbor"
    }

    fn bonds_for(&self, structure: &LatticeStructure, site_index: usize) -> Vec<SiteBond> {
        let candidates = neighbor_candidates(structure, site_index);
        let d_min = candidates.iter().map(|(_, d)| *d).fold(f64::INFINITY, f64::min);
        if !d_min.is_finite() {
            return Vec::new();
        }
        let (lo, hi) = band(d_min, self.tolerance);
        candidates
            .into_iter()
            .filter(|(_, d)| *d >= lo && *d <= hi)
            .map(|(b, _)| b)
            .collect()
    }
}

/// Covalent-radius cutoff: bonded when 0.4 < d < (r_A + r_B) * factor.
#[derive(Clone, Debug)]
pub struct CovalentCutoff {
    pub factor: f64,
}

impl Default for CovalentCutoff {
    fn default() -> Self {
        Self { factor: 1.15 }
    }
}

impl ConnectivityProvider for CovalentCutoff {
    fn name(&self) -> &'static str {
        "covalent-cutoff"
    }

    fn bonds_for(&self, structure: &LatticeStructure, site_index: usize) -> Vec<SiteBond> {
        let rad1 = get_atom_cov(&structure.sites[site_index].species);
        let min_bond_dist = 0.4;

        neighbor_candidates(structure, site_index)
            .into_iter()
            .filter(|(b, d)| {
                let rad2 = get_atom_cov(&structure.sites[b.neighbor].species);
                let max_bond_dist = (rad1 + rad2) * self.factor;
                *d > min_bond_dist && *d < max_bond_dist
            })
            .map(|(b, _)| b)
            .collect()
    }
}

/// How bonds between expanded atoms are decided.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondStrategy {
    /// Keep the connectivity inherited from the site graph at expansion time
    Graph,
    /// Distance band around each atom's nearest neighbor (uses the request tolerance)
    NearestNeighbor,
    /// Bond pairs in the first `count` global distance shells
    Shells { count: usize },
}

impl Default for BondStrategy {
    fn default() -> Self {
        Self::NearestNeighbor
    }
}

impl fmt::Display for BondStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph => write!(f, "graph"),
            Self::NearestNeighbor => write!(f, "nearest"),
            Self::Shells { count } => write!(f, "shells:{}", count),
        }
    }
}

impl FromStr for BondStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "graph" => Ok(Self::Graph),
            "nearest" | "nn" => Ok(Self::NearestNeighbor),
            other => match other.strip_prefix("shells:") {
                Some(n) => n
                    .parse()
                    .map(|count| Self::Shells { count })
                    .map_err(|_| format!("'{}' is not a shell count", n)),
                None => Err(format!("unknown bond strategy '{}' (graph, nearest, shells:N)", other)),
            },
        }
    }
}

/// Applies `strategy` to the atoms in place
pub fn resolve(atoms: &mut [ExpandedAtom], strategy: BondStrategy, tolerance: f64) -> Result<()> {
    match strategy {
        BondStrategy::Graph => {
            log::debug!("Keeping graph connectivity");
            Ok(())
        }
        BondStrategy::NearestNeighbor => resolve_nearest_neighbors(atoms, tolerance),
        BondStrategy::Shells { count } => {
            resolve_shells(atoms, count);
            Ok(())
        }
    }
}

/// Distance-based resolver.
///
/// Each atom's list is built from its own nearest-neighbor band, so A may list
/// B while B does not list A. The lists are kept directed; [`unique_bonds`]
/// takes the union when geometry is emitted.
pub fn resolve_nearest_neighbors(atoms: &mut [ExpandedAtom], tolerance: f64) -> Result<()> {
    if !(tolerance >= 0.0) || !tolerance.is_finite() {
        return Err(Cif2StlError::InvalidRequest(format!(
            "bond tolerance must be a finite value >= 0, got {}",
            tolerance
        )));
    }

    let positions: Vec<[f64; 3]> = atoms.iter().map(|a| a.position).collect();
    let ids: Vec<usize> = atoms.iter().map(|a| a.id).collect();

    for (i, atom) in atoms.iter_mut().enumerate() {
        let dists: Vec<(usize, f64)> = positions
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(j, p)| (j, distance(positions[i], *p)))
            .collect();

        atom.bonds.clear();
        let d_min = dists.iter().map(|(_, d)| *d).fold(f64::INFINITY, f64::min);
        if !d_min.is_finite() {
            continue;
        }
        let (lo, hi) = band(d_min, tolerance);
        atom.bonds.extend(
            dists
                .into_iter()
                .filter(|(_, d)| *d >= lo && *d <= hi)
                .map(|(j, d)| Connection {
                    atom_id: ids[j],
                    length: d,
                }),
        );
    }

    log::info!(
        "Nearest-neighbor bonds (tolerance {}): {} unique",
        tolerance,
        unique_bonds(atoms).len()
    );
    Ok(())
}

/// Shell resolver: groups all pairwise distances into shells (1 % wide) and
/// bonds every pair that falls in one of the first `count` shells.
pub fn resolve_shells(atoms: &mut [ExpandedAtom], count: usize) {
    let mut pairs: Vec<(usize, usize, f64)> = Vec::new();
    for i in 0..atoms.len() {
        for j in (i + 1)..atoms.len() {
            pairs.push((i, j, distance(atoms[i].position, atoms[j].position)));
        }
    }

    let mut sorted: Vec<f64> = pairs.iter().map(|p| p.2).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mut shells: Vec<f64> = Vec::new();
    for d in sorted {
        match shells.last() {
            Some(last) if d <= last * (1.0 + SHELL_WIDTH) => {}
            _ => shells.push(d),
        }
    }
    log::info!("Number of nearest neighbor shells: {}", shells.len());

    for atom in atoms.iter_mut() {
        atom.bonds.clear();
    }

    if count > shells.len() {
        log::warn!(
            "Requested {} neighbor shells but only {} exist; no bonds drawn",
            count,
            shells.len()
        );
        return;
    }

    // Neighbouring bands can overlap; a pair is bonded once
    let bands: Vec<(f64, f64)> = shells[..count].iter().map(|&s| band(s, SHELL_WIDTH)).collect();
    for &(i, j, d) in &pairs {
        if bands.iter().any(|&(lo, hi)| d >= lo && d <= hi) {
            let (id_i, id_j) = (atoms[i].id, atoms[j].id);
            atoms[i].bonds.push(Connection { atom_id: id_j, length: d });
            atoms[j].bonds.push(Connection { atom_id: id_i, length: d });
        }
    }
}

/// Union of all directed lists as unordered pairs, sorted by (a, b)
pub fn unique_bonds(atoms: &[ExpandedAtom]) -> Vec<Bond> {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    let mut bonds = Vec::new();
    for atom in atoms {
        for c in &atom.bonds {
            if let Some(bond) = Bond::new(atom.id, c.atom_id, c.length) {
                if seen.insert(bond.key()) {
                    bonds.push(bond);
                }
            }
        }
    }
    bonds.sort_by_key(|b| b.key());
    bonds
}

fn band(d: f64, tolerance: f64) -> (f64, f64) {
    (d * (1.0 - tolerance), d * (1.0 + tolerance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Site;

    fn atom(id: usize, pos: [f64; 3]) -> ExpandedAtom {
        ExpandedAtom {
            id,
            element: "Fe".to_string(),
            oxidation: None,
            position: pos,
            frac: pos,
            cell: [0; 3],
            site_index: 0,
            spin: [0.0; 3],
            bonds: Vec::new(),
        }
    }

    #[test]
    fn test_two_atoms_one_bond() {
        let mut atoms = vec![atom(0, [0.0, 0.0, 0.0]), atom(1, [0.0, 0.0, 2.0])];
        resolve_nearest_neighbors(&mut atoms, 0.1).unwrap();
        let bonds = unique_bonds(&atoms);
        assert_eq!(bonds.len(), 1);
        assert!((bonds[0].length - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_every_atom_has_a_neighbor() {
        let mut atoms = vec![
            atom(0, [0.0, 0.0, 0.0]),
            atom(1, [1.0, 0.0, 0.0]),
            atom(2, [5.0, 0.0, 0.0]),
            atom(3, [5.0, 3.0, 1.0]),
        ];
        resolve_nearest_neighbors(&mut atoms, 0.0).unwrap();
        for a in &atoms {
            assert!(!a.bonds.is_empty(), "atom {} has no bond", a.id);
        }
    }

    #[test]
    fn test_directed_lists_are_kept() {
        // 0-1 at 1.0, 1-2 at 1.05: atom 1 only lists 0, atom 2 lists 1
        let mut atoms = vec![
            atom(0, [0.0, 0.0, 0.0]),
            atom(1, [1.0, 0.0, 0.0]),
            atom(2, [2.05, 0.0, 0.0]),
        ];
        resolve_nearest_neighbors(&mut atoms, 0.01).unwrap();
        assert_eq!(atoms[1].bonds.len(), 1);
        assert_eq!(atoms[1].bonds[0].atom_id, 0);
        assert_eq!(atoms[2].bonds[0].atom_id, 1);
        // 1-2 only listed by atom 2, still one bond in the union
        assert_eq!(unique_bonds(&atoms).len(), 2);
    }

    #[test]
    fn test_ties_are_retained() {
        let mut atoms = vec![
            atom(0, [0.0, 0.0, 0.0]),
            atom(1, [1.0, 0.0, 0.0]),
            atom(2, [-1.0, 0.0, 0.0]),
        ];
        resolve_nearest_neighbors(&mut atoms, 0.0).unwrap();
        assert_eq!(atoms[0].bonds.len(), 2);
    }

    #[test]
    fn test_single_atom_has_no_bonds() {
        let mut atoms = vec![atom(0, [0.0; 3])];
        resolve_nearest_neighbors(&mut atoms, 0.1).unwrap();
        assert!(atoms[0].bonds.is_empty());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut atoms = vec![atom(0, [0.0; 3]), atom(1, [1.0, 0.0, 0.0])];
        assert!(resolve_nearest_neighbors(&mut atoms, -0.5).is_err());
    }

    #[test]
    fn test_shells() {
        // Square of side 1: 4 edges at 1.0, 2 diagonals at sqrt(2)
        let mut atoms = vec![
            atom(0, [0.0, 0.0, 0.0]),
            atom(1, [1.0, 0.0, 0.0]),
            atom(2, [1.0, 1.0, 0.0]),
            atom(3, [0.0, 1.0, 0.0]),
        ];
        resolve_shells(&mut atoms, 1);
        assert_eq!(unique_bonds(&atoms).len(), 4);
        resolve_shells(&mut atoms, 2);
        assert_eq!(unique_bonds(&atoms).len(), 6);
        resolve_shells(&mut atoms, 3);
        assert!(unique_bonds(&atoms).is_empty());
    }

    #[test]
    fn test_overlapping_shells_bond_once() {
        // 1.0 and 1.008 share a shell, 1.015 opens the next; 1.008 lies in both bands
        let mut atoms = vec![
            atom(0, [0.0, 0.0, 0.0]),
            atom(1, [1.0, 0.0, 0.0]),
            atom(2, [0.0, 10.0, 0.0]),
            atom(3, [1.008, 10.0, 0.0]),
            atom(4, [0.0, 20.0, 0.0]),
            atom(5, [1.015, 20.0, 0.0]),
        ];
        resolve_shells(&mut atoms, 2);
        assert_eq!(unique_bonds(&atoms).len(), 3);
        for a in &atoms {
            assert_eq!(a.bonds.len(), 1, "atom {}", a.id);
        }
    }

    #[test]
    fn test_periodic_simple_cubic() {
        let s = LatticeStructure::new(
            [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]],
            vec![Site {
                frac: [0.0; 3],
                species: "Po".to_string(),
                oxidation: None,
            }],
        );
        let bonds = PeriodicNearestNeighbor { tolerance: 0.1 }.bonds_for(&s, 0);
        // Six face neighbors, all images of the same site
        assert_eq!(bonds.len(), 6);
        assert!(bonds.iter().all(|b| b.neighbor == 0 && (b.weight - 2.0).abs() < 1e-12));
    }

    #[test]
    fn test_covalent_cutoff() {
        // Si-O at 1.6 Å is bonded, O-O at 2.6 Å is not
        let s = LatticeStructure::new(
            [[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]],
            vec![
                Site { frac: [0.5, 0.5, 0.5], species: "Si".to_string(), oxidation: None },
                Site { frac: [0.66, 0.5, 0.5], species: "O".to_string(), oxidation: None },
                Site { frac: [0.5, 0.76, 0.5], species: "O".to_string(), oxidation: None },
            ],
        );
        let provider = CovalentCutoff::default();
        let si = provider.bonds_for(&s, 0);
        assert_eq!(si.len(), 1);
        assert_eq!(si[0].neighbor, 1);
        assert!(provider.bonds_for(&s, 2).is_empty());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("graph".parse::<BondStrategy>().unwrap(), BondStrategy::Graph);
        assert_eq!("shells:3".parse::<BondStrategy>().unwrap(), BondStrategy::Shells { count: 3 });
        assert!("shells:x".parse::<BondStrategy>().is_err());
        assert_eq!(BondStrategy::Shells { count: 2 }.to_string(), "shells:2");
    }
}
