//! # Rendering
//!
//! Everything between voxel maps and GPU bytes: the packed vertex format,
//! the mesh builder, frustum culling and the `GraphicsBackend` seam the
//! bytes leave through. Nothing in here talks to a graphics API directly.

pub mod backend;
pub mod frustum;
pub mod meshing;
pub mod vertex;

// Re-export commonly used types
pub use meshing::{MeshBuilder, MeshOutput};
pub use vertex::Vertex;
