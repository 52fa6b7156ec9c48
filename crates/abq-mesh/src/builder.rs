//! Mesh-level section dispatcher.
//!
//! Routes `*NODE`, `*ELEMENT`, `*NSET`, `*ELSET` and `*SURFACE` sections into a
//! [`Mesh`]. Every other keyword is logged and skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use abq_inp::{Keyword, Section, SourceLine, Value, integer_tokens, number_tokens, parse_data_row};
use regex::Regex;

use crate::error::{MeshError, Result};
use crate::mesh::{Element, FaceId, Mesh, Surface, SurfaceKind};
use crate::topology::ElementRegistry;

static NSET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bNSET\s*=\s*(?:"([^"]*)"|([^,\s"]+))"#).expect("valid nset regex")
});
static ELSET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bELSET\s*=\s*(?:"([^"]*)"|([^,\s"]+))"#).expect("valid elset regex")
});
static ELEMENT_FACE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+)\s*,(?:.*,)?\s*(S\d+)\s*,?\s*$").expect("valid surface regex")
});
static SET_FACE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([^,\s]+)\s*,\s*(S\d+)\s*,?\s*$").expect("valid surface regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetKind {
    Node,
    Element,
}

/// `INSTANCE=` qualifiers seen on set definitions inside an assembly. The
/// ids of a qualified set are local to the instanced part. Keys are
/// uppercase set/surface names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceRefs {
    pub node_sets: HashMap<String, String>,
    pub element_sets: HashMap<String, String>,
    /// Instance of each face, parallel to `Surface::faces`. Only surfaces
    /// with at least one qualified face are listed.
    pub surfaces: HashMap<String, Vec<Option<String>>>,
}

impl InstanceRefs {
    pub fn is_empty(&self) -> bool {
        self.node_sets.is_empty() && self.element_sets.is_empty() && self.surfaces.is_empty()
    }
}

/// Accumulates mesh sections into one [`Mesh`].
pub struct MeshBuilder<'r> {
    registry: &'r ElementRegistry,
    mesh: Mesh,
    instances: InstanceRefs,
}

impl<'r> MeshBuilder<'r> {
    pub fn new(registry: &'r ElementRegistry) -> Self {
        Self {
            registry,
            mesh: Mesh::new(),
            instances: InstanceRefs::default(),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn finish(self) -> Mesh {
        self.mesh
    }

    /// The mesh together with the instance qualifiers of its sets.
    pub fn finish_with_instances(self) -> (Mesh, InstanceRefs) {
        (self.mesh, self.instances)
    }

    /// Dispatches one section by keyword.
    pub fn apply(&mut self, section: &Section<'_>) -> Result<()> {
        match &section.keyword {
            Keyword::Node => self.process_node_section(section),
            Keyword::Element => self.process_element_section(section),
            Keyword::Nset => self.process_set_section(section, SetKind::Node),
            Keyword::Elset => self.process_set_section(section, SetKind::Element),
            Keyword::Surface => self.process_surface_section(section),
            Keyword::Unknown(name) => {
                tracing::warn!(
                    line = section.line(),
                    keyword = %name,
                    "unrecognized keyword, skipping"
                );
                Ok(())
            }
            other => {
                tracing::debug!(
                    line = section.line(),
                    keyword = %other,
                    "not a mesh keyword, skipping"
                );
                Ok(())
            }
        }
    }

    fn process_node_section(&mut self, section: &Section<'_>) -> Result<()> {
        let mut ids = Vec::new();
        for line in &section.data {
            let tokens = number_tokens(&line.text);
            let Some((first, rest)) = tokens.split_first() else {
                continue;
            };
            let id = parse_token::<i32>(first, line, "NODE")?;
            let coords = rest
                .iter()
                .map(|t| parse_token::<f64>(t, line, "NODE"))
                .collect::<Result<Vec<f64>>>()?;
            self.mesh.nodes.insert(id, coords);
            ids.push(id);
        }

        if let Some(name) = section.header.options.get("NSET") {
            add_to_set(&mut self.mesh.node_sets, name, ids);
        }
        Ok(())
    }

    fn process_element_section(&mut self, section: &Section<'_>) -> Result<()> {
        let code = section
            .header
            .options
            .get("TYPE")
            .ok_or_else(|| MeshError::MissingOption {
                line: section.line(),
                keyword: section.header.name.clone(),
                option: "TYPE",
            })?;
        let info = self
            .registry
            .lookup(code)
            .ok_or_else(|| MeshError::UnknownElementType {
                line: section.line(),
                code: code.to_string(),
            })?;
        let code = code.trim().to_ascii_uppercase();
        let expected = info.node_count;

        let mut ids = Vec::new();
        let mut current: Option<(i32, usize)> = None;
        let mut connectivity = Vec::<i32>::with_capacity(expected);

        for line in &section.data {
            let mut tokens = integer_tokens(&line.text).into_iter();
            let element_id = match current {
                Some((id, _)) => id,
                None => match tokens.next() {
                    Some(token) => {
                        let id = parse_token::<i32>(token, line, "ELEMENT")?;
                        current = Some((id, line.number));
                        id
                    }
                    None => continue,
                },
            };
            for token in tokens {
                connectivity.push(parse_token::<i32>(token, line, "ELEMENT")?);
            }

            if connectivity.len() > expected {
                return Err(MeshError::TooManyNodes {
                    line: line.number,
                    element: element_id,
                    expected,
                    found: connectivity.len(),
                });
            }
            if connectivity.len() == expected {
                self.mesh.elements.insert(
                    element_id,
                    Element {
                        id: element_id,
                        topology: info.topology,
                        code: code.clone(),
                        connectivity: std::mem::take(&mut connectivity),
                    },
                );
                ids.push(element_id);
                current = None;
            }
        }

        if let Some((element, line)) = current {
            return Err(MeshError::IncompleteElement {
                line,
                element,
                expected,
                found: connectivity.len(),
            });
        }

        if let Some(name) = section.header.options.get("ELSET") {
            add_to_set(&mut self.mesh.element_sets, name, ids);
        }
        Ok(())
    }

    fn process_set_section(&mut self, section: &Section<'_>, kind: SetKind) -> Result<()> {
        let pattern = match kind {
            SetKind::Node => &NSET_NAME,
            SetKind::Element => &ELSET_NAME,
        };
        let name = pattern
            .captures(&section.header.raw)
            .and_then(|c| c.get(1).or_else(|| c.get(2)))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| MeshError::MissingSetName {
                line: section.line(),
                keyword: section.header.name.clone(),
            })?;

        let ids = if section.header.options.has("GENERATE") {
            generate(section)?
        } else {
            let mut ids = Vec::new();
            for line in &section.data {
                for value in parse_data_row(&line.text) {
                    match value {
                        Value::Int(id) => ids.push(to_i32(id, line, &section.header.name)?),
                        Value::Symbol(other) => match self.existing_set(kind, &other) {
                            Some(members) => ids.extend_from_slice(members),
                            None => tracing::warn!(
                                line = line.number,
                                set = %name,
                                reference = %other,
                                "set member is neither an id nor a known set, skipping"
                            ),
                        },
                        Value::Float(v) => {
                            return Err(MeshError::InvalidNumber {
                                line: line.number,
                                keyword: section.header.name.clone(),
                                token: v.to_string(),
                            });
                        }
                    }
                }
            }
            ids
        };

        let (sets, qualifiers) = match kind {
            SetKind::Node => (&mut self.mesh.node_sets, &mut self.instances.node_sets),
            SetKind::Element => (&mut self.mesh.element_sets, &mut self.instances.element_sets),
        };
        if let Some(instance) = section.header.options.get("INSTANCE") {
            qualifiers.insert(name.to_ascii_uppercase(), instance.to_string());
        }
        add_to_set(sets, &name, ids);
        Ok(())
    }

    fn existing_set(&self, kind: SetKind, name: &str) -> Option<&[i32]> {
        match kind {
            SetKind::Node => self.mesh.node_set(name),
            SetKind::Element => self.mesh.element_set(name),
        }
    }

    fn process_surface_section(&mut self, section: &Section<'_>) -> Result<()> {
        let name = section
            .header
            .options
            .get("NAME")
            .ok_or_else(|| MeshError::MissingOption {
                line: section.line(),
                keyword: section.header.name.clone(),
                option: "NAME",
            })?
            .to_string();
        let kind = SurfaceKind::from_option(section.header.options.get("TYPE"));

        let mut faces = Vec::new();
        let mut origins = Vec::<Option<String>>::new();
        for line in &section.data {
            if let Some(caps) = ELEMENT_FACE_ROW.captures(&line.text) {
                let element = parse_token::<i32>(&caps[1], line, "SURFACE")?;
                faces.push((element, face_id(&caps[2], line)?));
                origins.push(None);
            } else if let Some(caps) = SET_FACE_ROW.captures(&line.text) {
                let face = face_id(&caps[2], line)?;
                let instance = self
                    .instances
                    .element_sets
                    .get(&caps[1].to_ascii_uppercase())
                    .cloned();
                match self.mesh.element_set(&caps[1]) {
                    Some(members) => {
                        faces.extend(members.iter().map(|&e| (e, face)));
                        origins.extend(std::iter::repeat_n(instance, members.len()));
                    }
                    None => tracing::warn!(
                        line = line.number,
                        surface = %name,
                        elset = &caps[1],
                        "surface references an undefined element set, skipping row"
                    ),
                }
            } else {
                return Err(MeshError::InvalidSurfaceRow {
                    line: line.number,
                    row: line.text.trim().to_string(),
                });
            }
        }

        if faces.is_empty() {
            tracing::debug!(
                line = section.line(),
                surface = %name,
                "surface has no faces, discarded"
            );
            return Ok(());
        }
        let key = name.to_ascii_uppercase();
        if origins.iter().any(Option::is_some) {
            self.instances.surfaces.insert(key, origins);
        } else {
            self.instances.surfaces.remove(&key);
        }
        self.mesh.surfaces.insert(name.clone(), Surface { name, kind, faces });
        Ok(())
    }
}

/// Every data row is `first, last[, step]`, an inclusive arithmetic
/// progression; the rows are concatenated.
fn generate(section: &Section<'_>) -> Result<Vec<i32>> {
    if section.data.is_empty() {
        return Err(MeshError::InvalidGenerate {
            line: section.line(),
            message: "no data row".to_string(),
        });
    }
    let mut ids = Vec::new();
    for line in &section.data {
        let values = integer_tokens(&line.text)
            .into_iter()
            .map(|t| parse_token::<i32>(t, line, &section.header.name))
            .collect::<Result<Vec<i32>>>()?;
        let (first, last, step) = match values.as_slice() {
            [first, last] => (*first, *last, 1),
            [first, last, step] => (*first, *last, *step),
            _ => {
                return Err(MeshError::InvalidGenerate {
                    line: line.number,
                    message: format!("expected `first, last[, step]`, got `{}`", line.text.trim()),
                });
            }
        };
        let step = usize::try_from(step)
            .ok()
            .filter(|s| *s > 0)
            .ok_or_else(|| MeshError::InvalidGenerate {
                line: line.number,
                message: format!("step must be positive, got {step}"),
            })?;
        ids.extend((first..=last).step_by(step));
    }
    Ok(ids)
}

fn add_to_set(sets: &mut indexmap::IndexMap<String, Vec<i32>>, name: &str, ids: Vec<i32>) {
    sets.entry(name.to_string()).or_default().extend(ids);
}

fn face_id(token: &str, line: &SourceLine) -> Result<FaceId> {
    token.parse::<FaceId>().map_err(|_| MeshError::InvalidSurfaceRow {
        line: line.number,
        row: line.text.trim().to_string(),
    })
}

fn parse_token<T: std::str::FromStr>(token: &str, line: &SourceLine, keyword: &str) -> Result<T> {
    token.parse::<T>().map_err(|_| MeshError::InvalidNumber {
        line: line.number,
        keyword: keyword.to_string(),
        token: token.to_string(),
    })
}

fn to_i32(value: i64, line: &SourceLine, keyword: &str) -> Result<i32> {
    i32::try_from(value).map_err(|_| MeshError::InvalidNumber {
        line: line.number,
        keyword: keyword.to_string(),
        token: value.to_string(),
    })
}
