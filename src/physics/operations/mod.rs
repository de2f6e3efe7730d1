pub mod supercell;
pub mod transform;
