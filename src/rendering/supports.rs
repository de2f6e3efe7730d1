// src/rendering/supports.rs
//
// Print supports: a base slab whose top face sits at the base level, plus
// vertical legs from the lowest atoms down into the slab.

use super::primitives::{cuboid, cylinder_between, TriMesh};
use crate::config::{MeshStyle, SupportStyle};
use crate::model::{ExpandedAtom, RadiusTable};
use crate::utils::geometry;

/// Lowest z reached by an atom's own geometry (sphere or spin arrow)
fn atom_floor(atom: &ExpandedAtom, radii: &RadiusTable, mesh_style: &MeshStyle) -> f64 {
    let radius = radii.radius(&atom.element);
    let mut floor = atom.position[2] - radius;
    if atom.has_spin() {
        let shape = mesh_style.arrow_shape(radius);
        let reach = shape.length * 0.9 + shape.tip_length * 1.5;
        let dir = geometry::normalize(atom.spin);
        floor = floor.min(atom.position[2] + dir[2] * reach);
    }
    floor
}

/// Builds support geometry for `model`. Returns the support mesh and the
/// number of legs, or `None` when the model is empty.
pub fn build_supports(
    model: &TriMesh,
    atoms: &[ExpandedAtom],
    radii: &RadiusTable,
    mesh_style: &MeshStyle,
    style: &SupportStyle,
    base_level: f64,
) -> Option<(TriMesh, usize)> {
    let (min, max) = model.bounds()?;
    if min[2] < base_level {
        log::warn!(
            "Model reaches z = {:.3}, below the base level {:.3}; the slab will intersect it",
            min[2],
            base_level
        );
    }

    // 1. Slab
    let slab_bottom = base_level - style.slab_thickness;
    let mut supports = cuboid(
        [min[0] - style.margin, min[1] - style.margin, slab_bottom],
        [max[0] + style.margin, max[1] + style.margin, base_level],
    );

    // 2. Legs
    let anchor_z = base_level - style.slab_thickness / 2.0;
    let mut legs = 0;
    for atom in atoms {
        let floor = atom_floor(atom, radii, mesh_style);
        if floor - min[2] > style.leg_threshold || floor <= base_level {
            continue;
        }
        let top = atom.position;
        let bottom = [top[0], top[1], anchor_z];
        if let Some(leg) = cylinder_between(top, bottom, style.leg_radius, mesh_style.sections) {
            supports.append(&leg);
            legs += 1;
        }
    }

    log::info!(
        "Supports: slab {:.2} x {:.2} at z = {:.3}, {} legs",
        max[0] - min[0] + 2.0 * style.margin,
        max[1] - min[1] + 2.0 * style.margin,
        base_level,
        legs
    );
    Some((supports.with_color(style.color), legs))
}
