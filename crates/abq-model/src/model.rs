//! Full-model data structures built on top of the mesh.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use abq_inp::{Options, Value};
use abq_mesh::{Mesh, MeshSummary};
use indexmap::IndexMap;
use serde::Serialize;

/// One property record of a material, in the order the deck gives them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MaterialProperty {
    /// Linear isotropic elasticity.
    Elastic { modulus: f64, poisson: f64 },
    Density { density: f64 },
    /// (stress, plastic strain) table.
    Plastic { table: Vec<(f64, f64)> },
    /// Thermal expansion coefficient.
    Expansion { coefficient: f64 },
    /// Rayleigh damping coefficients.
    Damping { alpha: f64, beta: f64 },
}

/// A named material and its properties.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub name: String,
    pub properties: Vec<MaterialProperty>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Young's modulus and Poisson's ratio of the last `*ELASTIC` record.
    pub fn elastic(&self) -> Option<(f64, f64)> {
        self.properties.iter().rev().find_map(|p| match p {
            MaterialProperty::Elastic { modulus, poisson } => Some((*modulus, *poisson)),
            _ => None,
        })
    }

    pub fn density(&self) -> Option<f64> {
        self.properties.iter().rev().find_map(|p| match p {
            MaterialProperty::Density { density } => Some(*density),
            _ => None,
        })
    }
}

/// Section-kind specific data of a [`Property`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionKind {
    Solid {
        controls: Option<String>,
        /// Cross-sectional area, for truss-type solid sections.
        area: Option<f64>,
    },
    Shell {
        thickness: f64,
        integration_points: u32,
    },
    Mass {
        mass: f64,
    },
}

/// A section assignment: element set, material, section data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Property {
    pub element_set: String,
    /// `*MASS` sections carry no material.
    pub material: Option<String>,
    pub section: SectionKind,
}

/// Which loading keyword produced a [`BoundaryCondition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BoundaryKind {
    Boundary,
    Cload,
    Dload,
    Dsload,
}

impl Display for BoundaryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BoundaryKind::Boundary => "BOUNDARY",
            BoundaryKind::Cload => "CLOAD",
            BoundaryKind::Dload => "DLOAD",
            BoundaryKind::Dsload => "DSLOAD",
        })
    }
}

/// A prescribed condition or load, kept as typed data rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryCondition {
    pub kind: BoundaryKind,
    pub data: Vec<Vec<Value>>,
    pub options: Options,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputTarget {
    /// Printed to the report file (`*… PRINT`).
    Print,
    /// Written to the result file (`*… FILE`).
    File,
    /// Field/history output (`*… OUTPUT`).
    Field,
    Unknown,
}

/// An output request inside a step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRequest {
    /// `NODE`, `EL`, `SECTION`, `CONTACT` for print/file requests, the full
    /// keyword name for field output.
    pub kind: String,
    pub target: OutputTarget,
    pub data: Vec<Vec<Value>>,
    pub options: Options,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    Static,
    Frequency,
    Buckle,
    Dynamic,
    HeatTransfer,
}

impl Display for AnalysisKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AnalysisKind::Static => "static",
            AnalysisKind::Frequency => "frequency",
            AnalysisKind::Buckle => "buckle",
            AnalysisKind::Dynamic => "dynamic",
            AnalysisKind::HeatTransfer => "heat transfer",
        })
    }
}

/// An analysis step and everything scoped to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Step {
    pub name: Option<String>,
    pub analysis: Option<AnalysisKind>,
    /// Data rows of the analysis keyword, e.g. time increments.
    pub analysis_data: Vec<Vec<Value>>,
    /// Step options other than `NAME`, e.g. `NLGEOM`, `INC`, `PERTURBATION`.
    pub options: Options,
    pub boundary_conditions: Vec<BoundaryCondition>,
    pub output_requests: Vec<OutputRequest>,
}

/// A parsed deck: mesh plus materials, sections, loads and steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Model {
    pub path: Option<PathBuf>,
    pub name: String,
    pub heading: Option<String>,
    pub mesh: Mesh,
    pub materials: IndexMap<String, Material>,
    pub properties: Vec<Property>,
    /// Conditions defined outside any step.
    pub boundary_conditions: Vec<BoundaryCondition>,
    pub steps: Vec<Step>,
}

impl Model {
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.get(name).or_else(|| {
            self.materials
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// Section assignments referring to the given element set.
    pub fn properties_for(&self, element_set: &str) -> impl Iterator<Item = &Property> {
        self.properties
            .iter()
            .filter(move |p| p.element_set.eq_ignore_ascii_case(element_set))
    }

    pub fn step(&self, name: &str) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| s.name.as_deref().is_some_and(|n| n.eq_ignore_ascii_case(name)))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name.clone(),
            mesh: self.mesh.summary(),
            materials: self.materials.keys().cloned().collect(),
            properties: self.properties.len(),
            boundary_conditions: self.boundary_conditions.len(),
            steps: self
                .steps
                .iter()
                .map(|s| StepSummary {
                    name: s.name.clone(),
                    analysis: s.analysis,
                    boundary_conditions: s.boundary_conditions.len(),
                    output_requests: s.output_requests.len(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    pub name: Option<String>,
    pub analysis: Option<AnalysisKind>,
    pub boundary_conditions: usize,
    pub output_requests: usize,
}

/// Counts describing a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub mesh: MeshSummary,
    pub materials: Vec<String>,
    pub properties: usize,
    pub boundary_conditions: usize,
    pub steps: Vec<StepSummary>,
}

impl Display for ModelSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "model: {}", self.name)?;
        writeln!(f, "{}", self.mesh)?;
        writeln!(f, "materials: {}", self.materials.join(", "))?;
        writeln!(f, "properties: {}", self.properties)?;
        write!(f, "boundary_conditions: {}", self.boundary_conditions)?;
        for (i, step) in self.steps.iter().enumerate() {
            let name = step.name.as_deref().unwrap_or("-");
            let analysis = step
                .analysis
                .map_or_else(|| "-".to_string(), |a| a.to_string());
            write!(
                f,
                "\nstep {}: {name} ({analysis}), {} boundary conditions, {} output requests",
                i + 1,
                step.boundary_conditions,
                step.output_requests
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn material_accessors_use_last_record() {
        let mut steel = Material::new("STEEL");
        steel.properties.push(MaterialProperty::Elastic {
            modulus: 200e3,
            poisson: 0.3,
        });
        steel.properties.push(MaterialProperty::Density { density: 7.8e-9 });
        steel.properties.push(MaterialProperty::Elastic {
            modulus: 210e3,
            poisson: 0.3,
        });
        assert_eq!(steel.elastic(), Some((210e3, 0.3)));
        assert_eq!(steel.density(), Some(7.8e-9));
        assert_eq!(Material::new("X").elastic(), None);
    }

    #[test]
    fn lookups_ignore_case() {
        let mut model = Model::default();
        model
            .materials
            .insert("Steel".to_string(), Material::new("Steel"));
        model.steps.push(Step {
            name: Some("Load".to_string()),
            ..Step::default()
        });
        model.properties.push(Property {
            element_set: "EALL".to_string(),
            material: Some("Steel".to_string()),
            section: SectionKind::Mass { mass: 1.0 },
        });
        assert!(model.material("STEEL").is_some());
        assert!(model.step("load").is_some());
        assert_eq!(model.properties_for("Eall").count(), 1);
    }

    #[test]
    fn summary_lists_steps() {
        let model = Model {
            name: "beam".to_string(),
            steps: vec![Step {
                analysis: Some(AnalysisKind::Static),
                ..Step::default()
            }],
            ..Model::default()
        };
        let text = model.summary().to_string();
        assert!(text.contains("model: beam"));
        assert!(text.contains("step 1: - (static)"));
    }
}
