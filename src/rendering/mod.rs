pub mod export;
pub mod primitives;
pub mod scene;
pub mod supports;

pub use export::export_stl;
pub use primitives::{Alignment, TriMesh};
pub use scene::build_mesh;
pub use supports::build_supports;
