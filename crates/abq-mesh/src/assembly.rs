//! Part/assembly decks.
//!
//! Decks written with `*PART` / `*ASSEMBLY` keep one private numbering per
//! part. Mesh sections are routed to the part, the assembly or the file-level
//! builder depending on the scope open at that point, and [`ScopedMeshBuilder::finish`]
//! flattens everything into one global numbering: each part's node and element
//! ids are shifted past the largest id already used, and its set and surface
//! names become `<part>.<name>`. Assembly-level sets written with
//! `INSTANCE=` hold part-local ids and are shifted by the offsets of the
//! instanced part.

use std::collections::HashMap;

use abq_inp::{Keyword, Section, SourceLine};
use indexmap::IndexMap;

use crate::builder::{InstanceRefs, MeshBuilder};
use crate::error::{MeshError, Result};
use crate::mesh::{Element, Mesh, Surface};
use crate::topology::ElementRegistry;

/// True if any line opens a `*PART` (case-insensitive).
pub fn is_assembly_format(lines: &[SourceLine]) -> bool {
    lines.iter().any(|l| {
        l.text
            .trim_start()
            .get(..5)
            .is_some_and(|head| head.eq_ignore_ascii_case("*PART"))
    })
}

/// Mesh accumulator that tracks part and assembly scope. Built without
/// scoping, every section goes straight to the file-level builder.
pub struct ScopedMeshBuilder<'r> {
    registry: &'r ElementRegistry,
    scoped: bool,
    global: MeshBuilder<'r>,
    assembly: MeshBuilder<'r>,
    parts: IndexMap<String, MeshBuilder<'r>>,
    /// Uppercase instance name to part name.
    instances: HashMap<String, String>,
    current_part: Option<String>,
    in_assembly: bool,
}

impl<'r> ScopedMeshBuilder<'r> {
    pub fn new(registry: &'r ElementRegistry, scoped: bool) -> Self {
        Self {
            registry,
            scoped,
            global: MeshBuilder::new(registry),
            assembly: MeshBuilder::new(registry),
            parts: IndexMap::new(),
            instances: HashMap::new(),
            current_part: None,
            in_assembly: false,
        }
    }

    /// Scoping on only when the deck contains a `*PART`.
    pub fn for_lines(registry: &'r ElementRegistry, lines: &[SourceLine]) -> Self {
        Self::new(registry, is_assembly_format(lines))
    }

    pub fn current_part(&self) -> Option<&str> {
        self.current_part.as_deref()
    }

    pub fn in_assembly(&self) -> bool {
        self.in_assembly
    }

    /// Handles scope keywords and forwards everything else to the builder of
    /// the active scope. Part scope wins over assembly scope.
    pub fn apply(&mut self, section: &Section<'_>) -> Result<()> {
        if !self.scoped {
            return self.global.apply(section);
        }
        match section.keyword {
            Keyword::Part => {
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
                if let Some(open) = &self.current_part {
                    tracing::warn!(
                        line = section.line(),
                        part = %open,
                        "missing *END PART, closing part"
                    );
                }
                let registry = self.registry;
                self.parts
                    .entry(name.clone())
                    .or_insert_with(|| MeshBuilder::new(registry));
                self.current_part = Some(name);
                Ok(())
            }
            Keyword::EndPart => {
                if self.current_part.take().is_none() {
                    tracing::debug!(line = section.line(), "*END PART without open part");
                }
                Ok(())
            }
            Keyword::Assembly => {
                self.in_assembly = true;
                Ok(())
            }
            Keyword::EndAssembly => {
                self.in_assembly = false;
                Ok(())
            }
            Keyword::Instance => {
                let options = &section.header.options;
                match (options.get("NAME"), options.get("PART")) {
                    (Some(name), Some(part)) => {
                        self.instances
                            .insert(name.to_ascii_uppercase(), part.to_string());
                    }
                    _ => tracing::warn!(
                        line = section.line(),
                        "*INSTANCE without NAME= and PART=, ignored"
                    ),
                }
                Ok(())
            }
            Keyword::EndInstance | Keyword::Include => {
                tracing::debug!(
                    line = section.line(),
                    keyword = %section.keyword,
                    "structure keyword, skipping"
                );
                Ok(())
            }
            _ => self.active().apply(section),
        }
    }

    fn active(&mut self) -> &mut MeshBuilder<'r> {
        if let Some(part) = &self.current_part
            && let Some(builder) = self.parts.get_mut(part)
        {
            return builder;
        }
        if self.in_assembly {
            &mut self.assembly
        } else {
            &mut self.global
        }
    }

    /// Flattens all scopes into one mesh. File-level entities keep their ids;
    /// parts follow in file order, then assembly-level entities.
    pub fn finish(self) -> Result<Mesh> {
        let mut flat = self.global.finish();
        let (assembly, refs) = self.assembly.finish_with_instances();
        let no_instances = HashMap::new();
        if self.parts.is_empty() {
            merge(&mut flat, assembly, &Scope::Assembly(&refs), &no_instances)?;
            return Ok(flat);
        }

        let parts: IndexMap<String, Mesh> = self
            .parts
            .into_iter()
            .map(|(name, builder)| (name, builder.finish()))
            .collect();
        let mut part_offsets = HashMap::<&str, Offsets>::new();
        for (name, part) in &parts {
            let offsets = merge(&mut flat, part.clone(), &Scope::Part(name), &no_instances)?;
            part_offsets.insert(name.as_str(), offsets);
        }
        let instance_offsets: HashMap<String, Offsets> = self
            .instances
            .iter()
            .filter_map(|(instance, part)| {
                let offsets = part_offsets.get(part.as_str()).copied();
                if offsets.is_none() {
                    tracing::warn!(
                        instance = %instance,
                        part = %part,
                        "instance of an undefined part"
                    );
                }
                offsets.map(|o| (instance.clone(), o))
            })
            .collect();
        merge(&mut flat, assembly, &Scope::Assembly(&refs), &instance_offsets)?;
        flat.parts = parts;
        Ok(flat)
    }
}

/// Shift applied to the ids of one merged mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Offsets {
    node: i32,
    element: i32,
}

enum Scope<'a> {
    Part(&'a str),
    Assembly(&'a InstanceRefs),
}

impl Scope<'_> {
    fn label(&self) -> String {
        match self {
            Scope::Part(name) => format!("part {name}"),
            Scope::Assembly(_) => "assembly".to_string(),
        }
    }
}

fn shift(id: i32, offset: i32, scope: &Scope<'_>) -> Result<i32> {
    id.checked_add(offset).ok_or_else(|| MeshError::IdOverflow {
        scope: scope.label(),
        id,
    })
}

/// Appends `mesh` to `flat`, shifting its own nodes and elements past the
/// largest ids already present, and returns that shift. Assembly sets
/// qualified with an instance use the instance's offsets instead.
fn merge(
    flat: &mut Mesh,
    mesh: Mesh,
    scope: &Scope<'_>,
    instances: &HashMap<String, Offsets>,
) -> Result<Offsets> {
    let own = Offsets {
        node: if mesh.nodes.is_empty() {
            0
        } else {
            flat.max_node_id().unwrap_or(0).max(0)
        },
        element: if mesh.elements.is_empty() {
            0
        } else {
            flat.max_element_id().unwrap_or(0).max(0)
        },
    };
    if mesh.is_empty() {
        return Ok(own);
    }
    let (prefix, refs) = match scope {
        Scope::Part(name) => (Some(*name), None),
        Scope::Assembly(refs) => (None, Some(*refs)),
    };
    let rename = |name: &str| match prefix {
        Some(part) => format!("{part}.{name}"),
        None => name.to_string(),
    };
    let resolve = |instance: Option<&String>| match instance {
        None => own,
        Some(instance) => match instances.get(&instance.to_ascii_uppercase()) {
            Some(offsets) => *offsets,
            None => {
                tracing::warn!(instance = %instance, "set names an unknown instance, ids kept");
                Offsets::default()
            }
        },
    };

    for (id, coords) in mesh.nodes {
        flat.nodes.insert(shift(id, own.node, scope)?, coords);
    }
    for (id, element) in mesh.elements {
        let id = shift(id, own.element, scope)?;
        let connectivity = element
            .connectivity
            .iter()
            .map(|&n| shift(n, own.node, scope))
            .collect::<Result<Vec<i32>>>()?;
        flat.elements.insert(
            id,
            Element {
                id,
                connectivity,
                ..element
            },
        );
    }
    for (name, ids) in mesh.node_sets {
        let offset = resolve(refs.and_then(|r| r.node_sets.get(&name.to_ascii_uppercase()))).node;
        let ids = ids
            .iter()
            .map(|&n| shift(n, offset, scope))
            .collect::<Result<Vec<i32>>>()?;
        flat.node_sets.entry(rename(&name)).or_default().extend(ids);
    }
    for (name, ids) in mesh.element_sets {
        let offset =
            resolve(refs.and_then(|r| r.element_sets.get(&name.to_ascii_uppercase()))).element;
        let ids = ids
            .iter()
            .map(|&e| shift(e, offset, scope))
            .collect::<Result<Vec<i32>>>()?;
        flat.element_sets.entry(rename(&name)).or_default().extend(ids);
    }
    for (name, surface) in mesh.surfaces {
        let origins = refs.and_then(|r| r.surfaces.get(&name.to_ascii_uppercase()));
        let faces = surface
            .faces
            .iter()
            .enumerate()
            .map(|(k, &(e, f))| {
                let instance = origins.and_then(|o| o.get(k)).and_then(Option::as_ref);
                Ok((shift(e, resolve(instance).element, scope)?, f))
            })
            .collect::<Result<Vec<_>>>()?;
        let name = rename(&name);
        flat.surfaces.insert(
            name.clone(),
            Surface {
                name,
                kind: surface.kind,
                faces,
            },
        );
    }
    Ok(own)
}

#[cfg(test)]
mod tests {
    use super::*;
    use abq_inp::{lines_from_str, sections};

    fn build(src: &str) -> Mesh {
        let registry = ElementRegistry::builtin();
        let lines = lines_from_str(src);
        let mut builder = ScopedMeshBuilder::for_lines(&registry, &lines);
        for section in sections(&lines).expect("sections") {
            builder.apply(&section).expect("apply");
        }
        builder.finish().expect("finish")
    }

    fn try_build(src: &str) -> Result<Mesh> {
        let registry = ElementRegistry::builtin();
        let lines = lines_from_str(src);
        let mut builder = ScopedMeshBuilder::for_lines(&registry, &lines);
        for section in sections(&lines)? {
            builder.apply(&section)?;
        }
        builder.finish()
    }

    const TWO_PARTS: &str = "\
*Part, name=Left
*Node
1, 0.0, 0.0
2, 1.0, 0.0
*Element, type=T2D2, elset=Bars
1, 1, 2
*Nset, nset=Ends
1, 2
*End Part
*Part, name=Right
*Node
1, 2.0, 0.0
2, 3.0, 0.0
3, 4.0, 0.0
*Element, type=T2D2
1, 1, 2
2, 2, 3
*Elset, elset=Bars
1, 2
*Surface, name=Tip
1, S1
*End Part
*Assembly, name=A
*Instance, name=Left-1, part=Left
*End Instance
*End Assembly
";

    #[test]
    fn detects_part_keyword_case_insensitively() {
        assert!(is_assembly_format(&lines_from_str("** x\n*part, name=P\n")));
        assert!(!is_assembly_format(&lines_from_str("*NODE\n1,0,0\n")));
    }

    #[test]
    fn flattens_parts_with_offsets() {
        let mesh = build(TWO_PARTS);
        assert_eq!(mesh.nodes.len(), 5);
        assert_eq!(mesh.coordinates(3), Some(&[2.0, 0.0][..]));
        assert_eq!(mesh.connectivity(2), Some(&[3, 4][..]));
        assert_eq!(mesh.connectivity(3), Some(&[4, 5][..]));
        assert_eq!(mesh.node_set("Left.Ends"), Some(&[1, 2][..]));
        assert_eq!(mesh.element_set("Left.Bars"), Some(&[1][..]));
        assert_eq!(mesh.element_set("Right.Bars"), Some(&[2, 3][..]));
        let tip = mesh.surface("Right.Tip").expect("surface");
        assert_eq!(tip.faces[0].0, 2);
    }

    #[test]
    fn keeps_unflattened_parts() {
        let mesh = build(TWO_PARTS);
        assert_eq!(mesh.parts.len(), 2);
        let right = &mesh.parts["Right"];
        assert_eq!(right.connectivity(1), Some(&[1, 2][..]));
        assert_eq!(right.element_set("Bars"), Some(&[1, 2][..]));
    }

    #[test]
    fn flat_deck_has_no_parts() {
        let mesh = build("*NODE\n1,0,0\n");
        assert!(mesh.parts.is_empty());
        assert_eq!(mesh.nodes.len(), 1);
    }

    #[test]
    fn missing_end_part_closes_previous_part() {
        let mesh = build("*Part, name=A\n*Node\n1,0,0\n*Part, name=B\n*Node\n1,1,0\n");
        assert_eq!(mesh.parts.len(), 2);
        assert_eq!(mesh.nodes.len(), 2);
    }

    const INSTANCED: &str = "\
*Part, name=A
*Node
1, 0.0, 0.0
2, 1.0, 0.0
*Element, type=T2D2
1, 1, 2
*End Part
*Part, name=B
*Node
1, 0.0, 1.0
2, 1.0, 1.0
*Element, type=T2D2
1, 1, 2
*End Part
*Assembly, name=Assembly
*Instance, name=A-1, part=A
*End Instance
*Instance, name=B-1, part=B
*End Instance
*Nset, nset=Fix, instance=B-1
1
*Elset, elset=_Edge, internal, instance=B-1
1
*Surface, type=ELEMENT, name=Load
_Edge, S1
*End Assembly
";

    #[test]
    fn instance_sets_use_part_offsets() {
        let mesh = build(INSTANCED);
        assert_eq!(mesh.nodes.len(), 4);
        assert_eq!(mesh.node_set("Fix"), Some(&[3][..]));
        assert_eq!(mesh.element_set("_Edge"), Some(&[2][..]));
        assert_eq!(mesh.surface("Load").map(|s| s.faces[0].0), Some(2));
        assert!(mesh.validate_references().is_ok());
    }

    #[test]
    fn instance_of_first_part_keeps_ids() {
        let src = "*Part, name=P\n*Node\n1,0,0\n2,1,0\n*End Part\n\
                   *Assembly, name=A\n*Instance, name=P-1, part=P\n*End Instance\n\
                   *Nset, nset=Fix, instance=P-1\n1\n*End Assembly\n";
        let mesh = build(src);
        assert_eq!(mesh.nodes.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(mesh.node_set("Fix"), Some(&[1][..]));
        assert!(mesh.validate_references().is_ok());
    }

    #[test]
    fn renumbering_past_i32_is_an_error() {
        let src = "*Part, name=A\n*Node\n2000000000, 0, 0\n*End Part\n\
                   *Part, name=B\n*Node\n2000000000, 1, 0\n*End Part\n";
        let err = try_build(src).expect_err("should fail");
        assert!(
            matches!(err, MeshError::IdOverflow { ref scope, id: 2000000000 } if scope == "part B"),
            "{err}"
        );
    }
}
