//! Crystal structure (CIF) to STL mesh generation.
//!
//! The pipeline reads a periodic structure, tiles it over the requested
//! unit cells, resolves bonds, applies rigid transforms and turns atoms,
//! bonds and spins into one triangle mesh written as STL.

pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod physics;
pub mod pipeline;
pub mod rendering;
pub mod utils;

pub use error::{Cif2StlError, Result};
pub use pipeline::{generate, GenerationReport, GenerationRequest};
