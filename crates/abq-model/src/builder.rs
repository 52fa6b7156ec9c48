//! Model-level section dispatcher.
//!
//! A single pass over the deck lines. Each keyword line closes the section
//! that is open, then opens a new one. Mesh and part/assembly keywords are
//! forwarded to a [`ScopedMeshBuilder`]; model keywords run their open
//! handler when the keyword line is complete and their close handler when
//! the next keyword line (or the end of the deck) arrives. Handlers read and
//! update the current material, property and step.

use abq_inp::{Keyword, Section, SourceLine, Value, is_data, is_keyword, parse_data_row};
use abq_mesh::{ElementRegistry, ScopedMeshBuilder};

use crate::error::{ModelError, Result};
use crate::model::{
    AnalysisKind, BoundaryCondition, BoundaryKind, Material, MaterialProperty, Model,
    OutputRequest, OutputTarget, Property, SectionKind, Step,
};

/// The section currently collecting data lines.
struct OpenSection<'a> {
    section: Section<'a>,
    /// Whether the open handler has run.
    started: bool,
}

/// Line-by-line model accumulator.
pub struct ModelBuilder<'r, 'a> {
    mesh: ScopedMeshBuilder<'r>,
    model: Model,
    open: Option<OpenSection<'a>>,
    current_material: Option<usize>,
    current_property: Option<usize>,
    current_step: Option<usize>,
}

impl<'r, 'a> ModelBuilder<'r, 'a> {
    /// Part scoping is enabled when `lines` contain a `*PART`.
    pub fn new(registry: &'r ElementRegistry, lines: &[SourceLine]) -> Self {
        Self {
            mesh: ScopedMeshBuilder::for_lines(registry, lines),
            model: Model::default(),
            open: None,
            current_material: None,
            current_property: None,
            current_step: None,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Feeds one physical line.
    pub fn feed(&mut self, line: &'a SourceLine) -> Result<()> {
        if is_keyword(&line.text) {
            self.close()?;
            let mut open = OpenSection {
                section: Section::open(line)?,
                started: false,
            };
            if !open.section.continues_header() {
                self.start(&mut open)?;
            }
            self.open = Some(open);
            return Ok(());
        }
        if !is_data(&line.text) {
            return Ok(());
        }

        let Some(mut open) = self.open.take() else {
            tracing::debug!(line = line.number, "data line outside any section, dropped");
            return Ok(());
        };
        let result = if open.section.continues_header() {
            open.section.push(line).map_err(ModelError::from)
        } else {
            self.start(&mut open)
                .and_then(|()| open.section.push(line).map_err(ModelError::from))
        };
        self.open = Some(open);
        result
    }

    /// Closes the last section and returns the flattened model.
    pub fn finish(mut self) -> Result<Model> {
        self.close()?;
        if let Some(step) = self.current_step.and_then(|i| self.model.steps.get(i)) {
            tracing::warn!(
                step = step.name.as_deref().unwrap_or("-"),
                "deck ends inside a step, missing *END STEP"
            );
        }
        self.model.mesh = self.mesh.finish()?;
        Ok(self.model)
    }

    fn start(&mut self, open: &mut OpenSection<'a>) -> Result<()> {
        if !open.started {
            open.started = true;
            self.open_handler(&open.section)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut open) = self.open.take() else {
            return Ok(());
        };
        self.start(&mut open)?;
        self.close_handler(&open.section)
    }

    fn open_handler(&mut self, section: &Section<'_>) -> Result<()> {
        if !is_material_keyword(&section.keyword) {
            self.current_material = None;
        }
        match &section.keyword {
            Keyword::SolidSection => {
                let element_set = self.element_set(section)?;
                let material = required(section, "MATERIAL")?;
                let controls = section.header.options.get("CONTROLS").map(str::to_string);
                self.push_property(Property {
                    element_set,
                    material: Some(material),
                    section: SectionKind::Solid {
                        controls,
                        area: None,
                    },
                });
            }
            Keyword::ShellSection => {
                let element_set = self.element_set(section)?;
                let material = required(section, "MATERIAL")?;
                self.push_property(Property {
                    element_set,
                    material: Some(material),
                    section: SectionKind::Shell {
                        thickness: 1.0,
                        integration_points: 5,
                    },
                });
            }
            Keyword::Mass => {
                let element_set = self.element_set(section)?;
                self.push_property(Property {
                    element_set,
                    material: None,
                    section: SectionKind::Mass { mass: 1.0 },
                });
            }
            Keyword::Material => {
                let name = required(section, "NAME")?;
                let (index, previous) = self
                    .model
                    .materials
                    .insert_full(name.clone(), Material::new(name.clone()));
                if previous.is_some() {
                    tracing::warn!(line = section.line(), material = %name, "material redefined");
                }
                self.current_material = Some(index);
            }
            Keyword::Step => {
                if let Some(open) = self.current_step.and_then(|i| self.model.steps.get(i)) {
                    tracing::warn!(
                        line = section.line(),
                        step = open.name.as_deref().unwrap_or("-"),
                        "missing *END STEP, closing step"
                    );
                }
                self.model.steps.push(Step {
                    name: section.header.options.get("NAME").map(str::to_string),
                    options: section.header.options.without(&["NAME"]),
                    ..Step::default()
                });
                self.current_step = Some(self.model.steps.len() - 1);
            }
            Keyword::Static => self.set_analysis(section, AnalysisKind::Static)?,
            Keyword::Frequency => self.set_analysis(section, AnalysisKind::Frequency)?,
            Keyword::Buckle => self.set_analysis(section, AnalysisKind::Buckle)?,
            Keyword::Dynamic => self.set_analysis(section, AnalysisKind::Dynamic)?,
            Keyword::HeatTransfer => self.set_analysis(section, AnalysisKind::HeatTransfer)?,
            Keyword::EndStep => {
                if self.current_step.take().is_none() {
                    tracing::debug!(line = section.line(), "*END STEP without open step");
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close_handler(&mut self, section: &Section<'_>) -> Result<()> {
        let keyword = &section.keyword;
        if keyword.is_mesh()
            || keyword.is_scope()
            || matches!(keyword, Keyword::Include | Keyword::Unknown(_))
        {
            return Ok(self.mesh.apply(section)?);
        }

        match keyword {
            Keyword::Heading => {
                let text = section
                    .data
                    .iter()
                    .map(|l| l.text.trim_end())
                    .collect::<Vec<_>>()
                    .join("\n");
                self.model.heading = Some(text);
            }
            Keyword::SolidSection => {
                let area = first_row(section).first().and_then(Value::as_f64);
                if let Some(SectionKind::Solid { area: slot, .. }) = self.current_section_kind() {
                    *slot = area;
                }
            }
            Keyword::ShellSection => {
                let row = first_row(section);
                let thickness = row.first().and_then(Value::as_f64).unwrap_or(1.0);
                let points = match row.get(1) {
                    None => 5,
                    Some(value) => value
                        .as_int()
                        .and_then(|p| u32::try_from(p).ok())
                        .ok_or_else(|| {
                            invalid_data(
                                section,
                                format!("invalid integration point count `{value}`"),
                            )
                        })?,
                };
                if let Some(SectionKind::Shell {
                    thickness: t,
                    integration_points: p,
                }) = self.current_section_kind()
                {
                    *t = thickness;
                    *p = points;
                }
            }
            Keyword::Mass => {
                let mass = first_row(section).first().and_then(Value::as_f64).unwrap_or(1.0);
                if let Some(SectionKind::Mass { mass: slot }) = self.current_section_kind() {
                    *slot = mass;
                }
            }
            Keyword::Elastic => {
                let rows = numeric_rows(section)?;
                let property = match rows.as_slice() {
                    [row] if row.len() == 2 => MaterialProperty::Elastic {
                        modulus: row[0],
                        poisson: row[1],
                    },
                    _ => {
                        return Err(invalid_data(
                            section,
                            "expected one row `modulus, poisson`".to_string(),
                        ));
                    }
                };
                self.material(section)?.properties.push(property);
            }
            Keyword::Density => {
                let density = single_value(section)?;
                self.material(section)?
                    .properties
                    .push(MaterialProperty::Density { density });
            }
            Keyword::Expansion => {
                let coefficient = single_value(section)?;
                self.material(section)?
                    .properties
                    .push(MaterialProperty::Expansion { coefficient });
            }
            Keyword::Plastic => {
                let table = numeric_rows(section)?
                    .into_iter()
                    .map(|row| match row.as_slice() {
                        [stress, strain, ..] => Ok((*stress, *strain)),
                        _ => Err(invalid_data(
                            section,
                            "expected `stress, strain` rows".to_string(),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.material(section)?
                    .properties
                    .push(MaterialProperty::Plastic { table });
            }
            Keyword::Damping => {
                let alpha = float_option(section, "ALPHA")?;
                let beta = float_option(section, "BETA")?;
                self.material(section)?
                    .properties
                    .push(MaterialProperty::Damping { alpha, beta });
            }
            Keyword::Static
            | Keyword::Frequency
            | Keyword::Buckle
            | Keyword::Dynamic
            | Keyword::HeatTransfer => {
                if let Some(step) = self.current_step_mut() {
                    step.analysis_data = data_rows(section);
                }
            }
            Keyword::Boundary => self.add_boundary(section, BoundaryKind::Boundary),
            Keyword::Cload => self.add_boundary(section, BoundaryKind::Cload),
            Keyword::Dload => self.add_boundary(section, BoundaryKind::Dload),
            Keyword::Dsload => self.add_boundary(section, BoundaryKind::Dsload),
            Keyword::NodePrint
            | Keyword::ElPrint
            | Keyword::SectionPrint
            | Keyword::NodeFile
            | Keyword::ElFile
            | Keyword::ContactFile => {
                let request = print_request(section);
                let step = self.current_step_mut().ok_or_else(|| ModelError::NoOpenStep {
                    line: section.line(),
                    keyword: section.header.name.clone(),
                })?;
                step.output_requests.push(request);
            }
            Keyword::NodeOutput
            | Keyword::ElementOutput
            | Keyword::EnergyOutput
            | Keyword::ContactOutput => {
                let request = OutputRequest {
                    kind: section.keyword.name().to_string(),
                    target: OutputTarget::Field,
                    data: data_rows(section),
                    options: section.header.options.clone(),
                };
                match self.current_step_mut() {
                    Some(step) => step.output_requests.push(request),
                    None => tracing::debug!(
                        line = section.line(),
                        keyword = %section.keyword,
                        "output request outside any step, dropped"
                    ),
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// `ELSET=` of a section keyword, prefixed with the enclosing part.
    fn element_set(&self, section: &Section<'_>) -> Result<String> {
        let name = required(section, "ELSET")?;
        Ok(match self.mesh.current_part() {
            Some(part) => format!("{part}.{name}"),
            None => name,
        })
    }

    fn push_property(&mut self, property: Property) {
        self.model.properties.push(property);
        self.current_property = Some(self.model.properties.len() - 1);
    }

    fn current_section_kind(&mut self) -> Option<&mut SectionKind> {
        self.current_property
            .and_then(|i| self.model.properties.get_mut(i))
            .map(|p| &mut p.section)
    }

    fn material(&mut self, section: &Section<'_>) -> Result<&mut Material> {
        self.current_material
            .and_then(|i| self.model.materials.get_index_mut(i))
            .map(|(_, m)| m)
            .ok_or_else(|| ModelError::NoOpenMaterial {
                line: section.line(),
                keyword: section.header.name.clone(),
            })
    }

    fn current_step_mut(&mut self) -> Option<&mut Step> {
        self.current_step.and_then(|i| self.model.steps.get_mut(i))
    }

    fn set_analysis(&mut self, section: &Section<'_>, kind: AnalysisKind) -> Result<()> {
        let step = self.current_step_mut().ok_or_else(|| ModelError::NoOpenStep {
            line: section.line(),
            keyword: section.header.name.clone(),
        })?;
        step.analysis = Some(kind);
        Ok(())
    }

    fn add_boundary(&mut self, section: &Section<'_>, kind: BoundaryKind) {
        let condition = BoundaryCondition {
            kind,
            data: data_rows(section),
            options: section.header.options.clone(),
        };
        match self.current_step_mut() {
            Some(step) => step.boundary_conditions.push(condition),
            None => self.model.boundary_conditions.push(condition),
        }
    }
}

fn is_material_keyword(keyword: &Keyword) -> bool {
    matches!(
        keyword,
        Keyword::Material
            | Keyword::Elastic
            | Keyword::Density
            | Keyword::Plastic
            | Keyword::Expansion
            | Keyword::Damping
            | Keyword::Unknown(_)
    )
}

fn required(section: &Section<'_>, option: &'static str) -> Result<String> {
    section
        .header
        .options
        .get(option)
        .map(str::to_string)
        .ok_or_else(|| ModelError::MissingOption {
            line: section.line(),
            keyword: section.header.name.clone(),
            option,
        })
}

fn float_option(section: &Section<'_>, option: &'static str) -> Result<f64> {
    match section.header.options.get(option) {
        None => Ok(0.0),
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| ModelError::InvalidOption {
            line: section.line(),
            keyword: section.header.name.clone(),
            option,
            value: raw.to_string(),
        }),
    }
}

fn data_rows(section: &Section<'_>) -> Vec<Vec<Value>> {
    section.data.iter().map(|l| parse_data_row(&l.text)).collect()
}

fn first_row(section: &Section<'_>) -> Vec<Value> {
    section
        .data
        .first()
        .map(|l| parse_data_row(&l.text))
        .unwrap_or_default()
}

fn numeric_rows(section: &Section<'_>) -> Result<Vec<Vec<f64>>> {
    section
        .data
        .iter()
        .map(|line| {
            parse_data_row(&line.text)
                .iter()
                .map(|v| {
                    v.as_f64().ok_or_else(|| ModelError::InvalidMaterialData {
                        line: line.number,
                        keyword: section.header.name.clone(),
                        message: format!("`{v}` is not a number"),
                    })
                })
                .collect()
        })
        .collect()
}

fn single_value(section: &Section<'_>) -> Result<f64> {
    let rows = numeric_rows(section)?;
    match rows.as_slice() {
        [row] if !row.is_empty() => Ok(row[0]),
        _ => Err(invalid_data(section, "expected one row with a value".to_string())),
    }
}

fn invalid_data(section: &Section<'_>, message: String) -> ModelError {
    ModelError::InvalidMaterialData {
        line: section.line(),
        keyword: section.header.name.clone(),
        message,
    }
}

/// `NODE PRINT` → kind `NODE`, target print. A one-word name gets an
/// unknown target.
fn print_request(section: &Section<'_>) -> OutputRequest {
    let name = section.keyword.name();
    let (kind, target) = match name.split_once(' ') {
        Some((kind, "PRINT")) => (kind, OutputTarget::Print),
        Some((kind, "FILE")) => (kind, OutputTarget::File),
        Some((kind, _)) => (kind, OutputTarget::Unknown),
        None => (name, OutputTarget::Unknown),
    };
    OutputRequest {
        kind: kind.to_string(),
        target,
        data: data_rows(section),
        options: section.header.options.clone(),
    }
}
