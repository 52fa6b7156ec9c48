//! Mesh data structures: nodes, elements, named sets and surfaces.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;

use crate::topology::Topology;

/// An element: connectivity in local node order plus its canonical topology.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    pub id: i32,
    pub topology: Topology,
    /// Vendor code from the `TYPE=` option, e.g. `C3D8R`.
    pub code: String,
    pub connectivity: Vec<i32>,
}

/// Local face of an element, written `S<k>` in decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct FaceId(pub u8);

impl Display for FaceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl From<FaceId> for String {
    fn from(face: FaceId) -> Self {
        face.to_string()
    }
}

impl FromStr for FaceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .strip_prefix(['S', 's'])
            .and_then(|n| n.parse::<u8>().ok())
            .map(FaceId)
            .ok_or_else(|| format!("invalid face identifier: {trimmed}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SurfaceKind {
    Element,
    Node,
    /// No `TYPE=` given.
    Unknown,
    Other(String),
}

impl SurfaceKind {
    pub fn from_option(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_uppercase()) {
            None => SurfaceKind::Unknown,
            Some(v) if v == "ELEMENT" => SurfaceKind::Element,
            Some(v) if v == "NODE" => SurfaceKind::Node,
            Some(v) => SurfaceKind::Other(v),
        }
    }
}

/// A named implicit surface: (element, local face) pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    pub name: String,
    pub kind: SurfaceKind,
    pub faces: Vec<(i32, FaceId)>,
}

/// All mesh entities of one model.
///
/// Connectivity is not checked against the node table; consumers that need
/// it to be complete should call [`Mesh::validate_references`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mesh {
    pub nodes: BTreeMap<i32, Vec<f64>>,
    pub elements: BTreeMap<i32, Element>,
    pub node_sets: IndexMap<String, Vec<i32>>,
    pub element_sets: IndexMap<String, Vec<i32>>,
    pub surfaces: IndexMap<String, Surface>,
    /// Per-part meshes, unflattened, for decks using `*PART`.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parts: IndexMap<String, Mesh>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// No nodes, elements, sets or surfaces.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.elements.is_empty()
            && self.node_sets.is_empty()
            && self.element_sets.is_empty()
            && self.surfaces.is_empty()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_elements(&self) -> usize {
        self.elements.len()
    }

    pub fn coordinates(&self, node: i32) -> Option<&[f64]> {
        self.nodes.get(&node).map(Vec::as_slice)
    }

    pub fn connectivity(&self, element: i32) -> Option<&[i32]> {
        self.elements.get(&element).map(|e| e.connectivity.as_slice())
    }

    pub fn topology(&self, element: i32) -> Option<Topology> {
        self.elements.get(&element).map(|e| e.topology)
    }

    pub fn element_code(&self, element: i32) -> Option<&str> {
        self.elements.get(&element).map(|e| e.code.as_str())
    }

    pub fn node_set(&self, name: &str) -> Option<&[i32]> {
        lookup(&self.node_sets, name).map(Vec::as_slice)
    }

    pub fn element_set(&self, name: &str) -> Option<&[i32]> {
        lookup(&self.element_sets, name).map(Vec::as_slice)
    }

    pub fn surface(&self, name: &str) -> Option<&Surface> {
        lookup(&self.surfaces, name)
    }

    pub fn max_node_id(&self) -> Option<i32> {
        self.nodes.keys().next_back().copied()
    }

    pub fn max_element_id(&self) -> Option<i32> {
        self.elements.keys().next_back().copied()
    }

    /// Element connectivity naming nodes that do not exist, as
    /// `(element, node)` pairs.
    pub fn dangling_nodes(&self) -> Vec<(i32, i32)> {
        self.elements
            .values()
            .flat_map(|e| {
                e.connectivity
                    .iter()
                    .filter(|n| !self.nodes.contains_key(n))
                    .map(move |n| (e.id, *n))
            })
            .collect()
    }

    /// Checks the reference invariants: element connectivity names existing
    /// nodes, surfaces name existing elements.
    pub fn validate_references(&self) -> Result<(), String> {
        if let Some((element, node)) = self.dangling_nodes().first() {
            return Err(format!("element {element} references missing node {node}"));
        }
        for surface in self.surfaces.values() {
            if let Some((element, _)) = surface
                .faces
                .iter()
                .find(|(e, _)| !self.elements.contains_key(e))
            {
                return Err(format!(
                    "surface {} references missing element {element}",
                    surface.name
                ));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> MeshSummary {
        let mut by_topology = BTreeMap::<Topology, usize>::new();
        for element in self.elements.values() {
            *by_topology.entry(element.topology).or_insert(0) += 1;
        }
        MeshSummary {
            nodes: self.nodes.len(),
            elements: self.elements.len(),
            by_topology,
            node_sets: self.node_sets.len(),
            element_sets: self.element_sets.len(),
            surfaces: self.surfaces.len(),
            parts: self.parts.keys().cloned().collect(),
        }
    }
}

/// Exact name match first, then case-insensitive.
fn lookup<'a, V>(map: &'a IndexMap<String, V>, name: &str) -> Option<&'a V> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    })
}

/// Counts describing a mesh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeshSummary {
    pub nodes: usize,
    pub elements: usize,
    pub by_topology: BTreeMap<Topology, usize>,
    pub node_sets: usize,
    pub element_sets: usize,
    pub surfaces: usize,
    pub parts: Vec<String>,
}

impl Display for MeshSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "nodes: {}", self.nodes)?;
        writeln!(f, "elements: {}", self.elements)?;
        for (topology, count) in &self.by_topology {
            writeln!(f, "  {topology}: {count}")?;
        }
        writeln!(f, "node_sets: {}", self.node_sets)?;
        writeln!(f, "element_sets: {}", self.element_sets)?;
        write!(f, "surfaces: {}", self.surfaces)?;
        if !self.parts.is_empty() {
            write!(f, "\nparts: {}", self.parts.join(", "))?;
        }
        Ok(())
    }
}
