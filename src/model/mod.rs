//src/model/mod.rs
pub mod elements;
pub mod structure;
pub mod symmetry;

// Re-exports for cleaner imports
pub use elements::RadiusTable;
pub use structure::{Bond, Connection, ExpandedAtom, LatticeStructure, Site, SiteBond};
pub use symmetry::to_primitive_cell;
