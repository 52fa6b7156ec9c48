//! Entry points: reading a full model from text or a file.

use std::path::Path;

use abq_inp::{SourceLine, lines_from_str, read_lines};
use abq_mesh::ElementRegistry;

use crate::builder::ModelBuilder;
use crate::error::{ModelError, Result};
use crate::model::Model;

/// Full-model reader configured with an element registry.
#[derive(Debug, Clone, Default)]
pub struct ModelReader {
    registry: ElementRegistry,
}

impl ModelReader {
    pub fn new(registry: ElementRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ElementRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ElementRegistry {
        &mut self.registry
    }

    /// Reads deck text. The model is named `model`.
    pub fn read_str(&self, raw: &str) -> Result<Model> {
        let mut model = self.read_lines(&lines_from_str(raw))?;
        model.name = "model".to_string();
        Ok(model)
    }

    /// Reads a deck from disk, expanding `*INCLUDE`s. The model is named
    /// after the file stem.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<Model> {
        let path = path.as_ref();
        let lines = read_lines(path)?;
        tracing::debug!(path = %path.display(), lines = lines.len(), "read deck");
        let mut model = self.read_lines(&lines)?;
        model.name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string());
        model.path = Some(path.to_path_buf());
        Ok(model)
    }

    /// Runs the dispatcher over `lines` and validates the result.
    pub fn read_lines(&self, lines: &[SourceLine]) -> Result<Model> {
        let mut builder = ModelBuilder::new(&self.registry, lines);
        for line in lines {
            builder.feed(line)?;
        }
        let model = builder.finish()?;
        validate(&model)?;
        tracing::info!(
            nodes = model.mesh.num_nodes(),
            elements = model.mesh.num_elements(),
            materials = model.materials.len(),
            properties = model.properties.len(),
            steps = model.steps.len(),
            "model parsed"
        );
        Ok(model)
    }
}

fn validate(model: &Model) -> Result<()> {
    if model.mesh.nodes.is_empty() {
        return Err(ModelError::EmptyMesh("nodes"));
    }
    if model.mesh.elements.is_empty() {
        return Err(ModelError::EmptyMesh("elements"));
    }
    if !model.properties.is_empty() && model.materials.is_empty() {
        tracing::warn!(
            properties = model.properties.len(),
            "section properties but no materials, a material keyword may be unsupported"
        );
    }
    Ok(())
}

/// Reads a model from a file with the built-in element registry.
pub fn parse_model(path: impl AsRef<Path>) -> Result<Model> {
    ModelReader::default().read_file(path)
}

/// Reads a model from deck text with the built-in element registry.
pub fn parse_model_str(raw: &str) -> Result<Model> {
    ModelReader::default().read_str(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_mesh_is_rejected() {
        let err = parse_model_str("*MATERIAL, NAME=A\n").expect_err("should fail");
        assert!(matches!(err, ModelError::EmptyMesh("nodes")));

        let err = parse_model_str("*NODE\n1, 0, 0, 0\n").expect_err("should fail");
        assert!(matches!(err, ModelError::EmptyMesh("elements")));
    }

    #[test]
    fn text_input_is_named_model() {
        let model = parse_model_str("*NODE\n1,0,0\n2,1,0\n*ELEMENT, TYPE=T2D2\n1,1,2\n")
            .expect("model");
        assert_eq!(model.name, "model");
        assert!(model.path.is_none());
    }

    #[test]
    fn mesh_errors_pass_through() {
        let err = parse_model_str("*ELEMENT, TYPE=NOPE\n1, 1\n").expect_err("should fail");
        assert!(matches!(err, ModelError::Mesh(_)));
        assert!(err.to_string().contains("unknown element type NOPE"));
    }
}
