// src/physics/operations/transform.rs
//
// Rigid-body moves of the expanded atom set. Connectivity is stored by atom
// id, so neither operation touches the bond lists.

use crate::model::ExpandedAtom;
use nalgebra::{Rotation3, Vector3};

/// Rotation by `degrees` about the global x, then y, then z axis (R = Rz * Ry * Rx)
pub fn rotation_matrix(degrees: [f64; 3]) -> Rotation3<f64> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), degrees[0].to_radians());
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), degrees[1].to_radians());
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), degrees[2].to_radians());
    rz * ry * rx
}

/// Rotates positions and spin directions about the origin
pub fn rotate(atoms: &mut [ExpandedAtom], degrees: [f64; 3]) {
    if degrees.iter().all(|d| *d == 0.0) {
        return;
    }
    let rot = rotation_matrix(degrees);
    for atom in atoms.iter_mut() {
        let p = rot * Vector3::from(atom.position);
        atom.position = [p.x, p.y, p.z];
        let s = rot * Vector3::from(atom.spin);
        atom.spin = [s.x, s.y, s.z];
    }
    log::info!("Rotated {} atoms by {:?} degrees", atoms.len(), degrees);
}

/// Shifts positions; spins are directions and stay put
pub fn translate(atoms: &mut [ExpandedAtom], offset: [f64; 3]) {
    if offset.iter().all(|d| *d == 0.0) {
        return;
    }
    for atom in atoms.iter_mut() {
        for i in 0..3 {
            atom.position[i] += offset[i];
        }
    }
    log::info!("Translated {} atoms by {:?}", atoms.len(), offset);
}
