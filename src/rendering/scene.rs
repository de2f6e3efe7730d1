// src/rendering/scene.rs

use super::primitives::{arrow, cylinder_between, icosphere, TriMesh};
use crate::config::MeshStyle;
use crate::model::{Bond, ExpandedAtom, RadiusTable};
use crate::physics::bonding::unique_bonds;
use std::collections::HashMap;

/// What went into a built mesh
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshCounts {
  pub spheres: usize,
  pub bonds: usize,
  pub arrows: usize,
}

/// Spheres, bond cylinders and spin arrows concatenated into one mesh.
pub fn build_mesh(atoms: &[ExpandedAtom], radii: &RadiusTable, style: &MeshStyle) -> (TriMesh, MeshCounts) {
  let mut mesh = TriMesh::default();
  let mut counts = MeshCounts::default();
  let by_id: HashMap<usize, &ExpandedAtom> = atoms.iter().map(|a| (a.id, a)).collect();

  // 1. Atoms
  for atom in atoms {
    let radius = radii.radius(&atom.element);
    let sphere = icosphere(radius, style.sphere_subdivisions, atom.position)
      .with_color(style.element_color(&atom.element));
    mesh.append(&sphere);
    counts.spheres += 1;
  }

  // 2. Bonds, once per unordered pair
  let bonds: Vec<Bond> = unique_bonds(atoms);
  for bond in &bonds {
    let (Some(a), Some(b)) = (by_id.get(&bond.a), by_id.get(&bond.b)) else {
      log::debug!("Bond {:?} references a missing atom", bond.key());
      continue;
    };
    match cylinder_between(a.position, b.position, style.bond_radius, style.sections) {
      Some(cyl) => {
        mesh.append(&cyl.with_color(style.bond_color));
        counts.bonds += 1;
      }
      None => log::debug!("Skipping zero-length bond {:?}", bond.key()),
    }
  }

  // 3. Spin arrows
  for atom in atoms.iter().filter(|a| a.has_spin()) {
    let shape = style.arrow_shape(radii.radius(&atom.element));
    if let Some(a) = arrow(atom.position, atom.spin, &shape, style.sections) {
      mesh.append(&a.with_color(style.arrow_color));
      counts.arrows += 1;
    }
  }

  log::info!(
    "Mesh: {} spheres, {} bonds, {} arrows ({} vertices, {} triangles)",
    counts.spheres,
    counts.bonds,
    counts.arrows,
    mesh.vertex_count(),
    mesh.face_count()
  );
  (mesh, counts)
}
