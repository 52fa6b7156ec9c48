//! Entry points: reading a mesh from text or a file.

use std::path::Path;

use abq_inp::{SourceLine, lines_from_str, read_lines, sections};

use crate::assembly::ScopedMeshBuilder;
use crate::error::Result;
use crate::mesh::Mesh;
use crate::topology::ElementRegistry;

/// Mesh-only reader configured with an element registry.
#[derive(Debug, Clone, Default)]
pub struct MeshReader {
    registry: ElementRegistry,
}

impl MeshReader {
    pub fn new(registry: ElementRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ElementRegistry {
        &mut self.registry
    }

    pub fn read_str(&self, raw: &str) -> Result<Mesh> {
        self.read_lines(&lines_from_str(raw))
    }

    /// Reads a deck from disk, expanding `*INCLUDE`s.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Mesh> {
        let lines = read_lines(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), lines = lines.len(), "read deck");
        self.read_lines(&lines)
    }

    pub fn read_lines(&self, lines: &[SourceLine]) -> Result<Mesh> {
        let mut builder = ScopedMeshBuilder::for_lines(&self.registry, lines);
        for section in sections(lines)? {
            builder.apply(&section)?;
        }
        let mesh = builder.finish()?;
        tracing::info!(
            nodes = mesh.num_nodes(),
            elements = mesh.num_elements(),
            node_sets = mesh.node_sets.len(),
            element_sets = mesh.element_sets.len(),
            surfaces = mesh.surfaces.len(),
            "mesh parsed"
        );
        Ok(mesh)
    }
}

/// Reads a mesh from a file with the built-in element registry.
pub fn parse_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    MeshReader::default().read_file(path)
}

/// Reads a mesh from deck text with the built-in element registry.
pub fn parse_mesh_str(raw: &str) -> Result<Mesh> {
    MeshReader::default().read_str(raw)
}
