//! Full-model reader for ABAQUS `.inp` decks.
//!
//! Builds on `abq-mesh` and adds, in the same pass over the deck:
//! - **Materials** with elastic, density, plastic, expansion and damping records
//! - **Section properties** (`*SOLID SECTION`, `*SHELL SECTION`, `*MASS`)
//! - **Boundary conditions and loads**, at model level or scoped to a step
//! - **Steps** with analysis kind, options and output requests

pub mod builder;
pub mod error;
pub mod model;
pub mod reader;

pub use builder::ModelBuilder;
pub use error::{ModelError, Result};
pub use model::{
    AnalysisKind, BoundaryCondition, BoundaryKind, Material, MaterialProperty, Model,
    ModelSummary, OutputRequest, OutputTarget, Property, SectionKind, Step, StepSummary,
};
pub use reader::{ModelReader, parse_model, parse_model_str};
