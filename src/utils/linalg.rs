// src/utils/linalg.rs

use nalgebra::{Matrix3, Vector3};

/// Lattice vectors as a row matrix [[ax, ay, az], [bx, by, bz], [cx, cy, cz]]
fn lattice_matrix(lattice: [[f64; 3]; 3]) -> Matrix3<f64> {
  Matrix3::from_row_slice(&[
    lattice[0][0],
    lattice[0][1],
    lattice[0][2],
    lattice[1][0],
    lattice[1][1],
    lattice[1][2],
    lattice[2][0],
    lattice[2][1],
    lattice[2][2],
  ])
}

/// Convert fractional coordinates to Cartesian using lattice matrix
///
/// # Arguments
/// * `frac` - Fractional coordinates [x, y, z]; values beyond [0, 1) address
///   neighbouring cells
/// * `lattice` - Lattice vectors as row matrix
///
/// # Formula
/// ```text
/// Cartesian = Lattice^T × Fractional
/// ```
pub fn frac_to_cart(frac: [f64; 3], lattice: [[f64; 3]; 3]) -> [f64; 3] {
  let cart_vec = lattice_matrix(lattice).transpose() * Vector3::from(frac);
  [cart_vec.x, cart_vec.y, cart_vec.z]
}

/// Wraps a fractional coordinate into [0, 1).
///
/// `rem_euclid` alone returns exactly 1.0 for tiny negatives (-1e-17), which
/// would push the site out of its own cell.
pub fn wrap_unit(v: f64) -> f64 {
  let w = v.rem_euclid(1.0);
  if w >= 1.0 - 1e-12 {
    0.0
  } else {
    w
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cubic_lattice() {
    // Simple cubic lattice 5.0 Å
    let lattice = [[5.0, 0.0, 0.0], [0.0, 5.0, 0.0], [0.0, 0.0, 5.0]];

    let frac = [0.5, 0.5, 0.5];
    let cart = frac_to_cart(frac, lattice);

    assert!((cart[0] - 2.5).abs() < 1e-10);
    assert!((cart[1] - 2.5).abs() < 1e-10);
    assert!((cart[2] - 2.5).abs() < 1e-10);
  }

  #[test]
  fn test_wrap_unit() {
    assert_eq!((-1e-17f64).rem_euclid(1.0), 1.0);
    assert_eq!(wrap_unit(-1e-17), 0.0);
    assert!((wrap_unit(-0.25) - 0.75).abs() < 1e-12);
    assert!((wrap_unit(2.5) - 0.5).abs() < 1e-12);
    assert_eq!(wrap_unit(1.0), 0.0);
    assert!(wrap_unit(0.999) < 1.0);
  }
}
