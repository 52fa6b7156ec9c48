//! Mesh-level reader for ABAQUS `.inp` decks.
//!
//! This crate provides:
//! - **Element topology database** ([`ElementRegistry`]) mapping vendor codes
//!   to canonical [`Topology`] values, extensible at run time
//! - **Mesh model**: nodes, elements, node/element sets, surfaces
//! - **Mesh-level dispatcher** for `*NODE`, `*ELEMENT`, `*NSET`, `*ELSET`, `*SURFACE`
//! - **Part/assembly flattening** for decks written with `*PART`
//! - **Surface materialization** into explicit face elements

pub mod assembly;
pub mod builder;
pub mod error;
pub mod faces;
pub mod mesh;
pub mod reader;
pub mod topology;

pub use assembly::{ScopedMeshBuilder, is_assembly_format};
pub use builder::{InstanceRefs, MeshBuilder};
pub use error::{MeshError, Result};
pub use faces::{create_surface_elements, face_nodes};
pub use mesh::{Element, FaceId, Mesh, MeshSummary, Surface, SurfaceKind};
pub use reader::{MeshReader, parse_mesh, parse_mesh_str};
pub use topology::{ElementInfo, ElementRegistry, Topology};
