use serde::{Deserialize, Serialize};

/// One crystallographic site of the parsed (asymmetric-expanded) unit cell.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Site {
    /// Fractional position, wrapped into [0, 1)
    pub frac: [f64; 3],
    /// Element symbol, e.g. "Yb"
    pub species: String,
    /// Full species string when it carries a charge, e.g. "Yb3+"
    pub oxidation: Option<String>,
}

/// Periodic crystal: lattice vectors as rows [a_vec, b_vec, c_vec] plus sites.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatticeStructure {
    pub lattice: [[f64; 3]; 3],
    pub sites: Vec<Site>,
    // Optional: Chemical formula string (e.g. "Yb2Si2O7")
    #[serde(default)]
    pub formula: String,
}

impl LatticeStructure {
    pub fn new(lattice: [[f64; 3]; 3], sites: Vec<Site>) -> Self {
        let formula = formula_of(&sites);
        Self {
            lattice,
            sites,
            formula,
        }
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }
}

/// A bond that is known on the periodic structure: `neighbor` site index,
/// the periodic image holding that neighbor, and the bond weight (length).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SiteBond {
    pub neighbor: usize,
    pub image: [i32; 3],
    pub weight: f64,
}

/// Directed link from an expanded atom to another one
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub atom_id: usize,
    pub length: f64,
}

/// An atom instance inside the tiled supercell.
///
/// `position` and `spin` are mutated in place by the transform steps;
/// `bonds` is rewritten by the distance-based resolvers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExpandedAtom {
    pub id: usize,
    pub element: String,
    pub oxidation: Option<String>,
    pub position: [f64; 3],
    pub frac: [f64; 3],
    pub cell: [i32; 3],
    pub site_index: usize,
    pub spin: [f64; 3],
    pub bonds: Vec<Connection>,
}

impl ExpandedAtom {
    pub fn has_spin(&self) -> bool {
        self.spin.iter().any(|c| *c != 0.0)
    }
}

/// Unordered pair of expanded atom ids, stored with `a < b`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bond {
    pub a: usize,
    pub b: usize,
    pub length: f64,
}

impl Bond {
    /// Returns `None` for self-bonds
    pub fn new(i: usize, j: usize, length: f64) -> Option<Self> {
        match i.cmp(&j) {
            std::cmp::Ordering::Less => Some(Self { a: i, b: j, length }),
            std::cmp::Ordering::Greater => Some(Self { a: j, b: i, length }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn key(&self) -> (usize, usize) {
        (self.a, self.b)
    }
}

fn formula_of(sites: &[Site]) -> String {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for site in sites {
        match counts.iter_mut().find(|(el, _)| *el == site.species) {
            Some((_, n)) => *n += 1,
            None => counts.push((site.species.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| a.0.cmp(&b.0));
    counts
        .into_iter()
        .map(|(el, count)| {
            if count > 1 {
                format!("{}{}", el, count)
            } else {
                el
            }
        })
        .collect::<Vec<_>>()
        .join("")
}
