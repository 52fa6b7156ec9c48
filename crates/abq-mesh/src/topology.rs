//! Element topology database.
//!
//! Maps vendor element codes (`C3D8R`, `S4`, `CPE6M`, ...) to a node count and
//! one of a small set of canonical topologies. The registry is an owned value:
//! readers hold one, tests build their own, and `register` extends it at run
//! time for codes that are not built in.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

/// Canonical, vendor-independent element shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Topology {
    Seg2,
    Seg3,
    Tri3,
    Tri6,
    Quad4,
    Quad8,
    Quad9,
    Tet4,
    Tet10,
    Pyr5,
    Wedge6,
    Wedge15,
    Hex8,
    Hex20,
    Hex27,
}

impl Topology {
    pub const ALL: [Topology; 15] = [
        Topology::Seg2,
        Topology::Seg3,
        Topology::Tri3,
        Topology::Tri6,
        Topology::Quad4,
        Topology::Quad8,
        Topology::Quad9,
        Topology::Tet4,
        Topology::Tet10,
        Topology::Pyr5,
        Topology::Wedge6,
        Topology::Wedge15,
        Topology::Hex8,
        Topology::Hex20,
        Topology::Hex27,
    ];

    pub fn num_nodes(&self) -> usize {
        match self {
            Topology::Seg2 => 2,
            Topology::Seg3 => 3,
            Topology::Tri3 => 3,
            Topology::Tri6 => 6,
            Topology::Quad4 => 4,
            Topology::Quad8 => 8,
            Topology::Quad9 => 9,
            Topology::Tet4 => 4,
            Topology::Tet10 => 10,
            Topology::Pyr5 => 5,
            Topology::Wedge6 => 6,
            Topology::Wedge15 => 15,
            Topology::Hex8 => 8,
            Topology::Hex20 => 20,
            Topology::Hex27 => 27,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::Seg2 => "Seg2",
            Topology::Seg3 => "Seg3",
            Topology::Tri3 => "Tri3",
            Topology::Tri6 => "Tri6",
            Topology::Quad4 => "Quad4",
            Topology::Quad8 => "Quad8",
            Topology::Quad9 => "Quad9",
            Topology::Tet4 => "Tet4",
            Topology::Tet10 => "Tet10",
            Topology::Pyr5 => "Pyr5",
            Topology::Wedge6 => "Wedge6",
            Topology::Wedge15 => "Wedge15",
            Topology::Hex8 => "Hex8",
            Topology::Hex20 => "Hex20",
            Topology::Hex27 => "Hex27",
        }
    }
}

impl Display for Topology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topology::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown topology: {s}"))
    }
}

/// What the database knows about one element code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ElementInfo {
    pub node_count: usize,
    pub topology: Topology,
}

const BUILTIN_ELEMENTS: &[(Topology, &[&str])] = &[
    (
        Topology::Seg2,
        &[
            "T2D2", "T2D2H", "T2D2T", "T3D2", "T3D2H", "T3D2T", "B21", "B21H", "B23", "B23H",
            "B31", "B31H", "B31R", "B31OS", "B31OSH", "B33", "B33H", "PIPE21", "PIPE21H",
            "PIPE31", "PIPE31H", "CONN2D2", "CONN3D2", "SAX1", "RAX2", "DC1D2", "DCC1D2",
            "SPRINGA", "DASHPOTA", "GAPUNI", "FRAME2D", "FRAME3D",
        ],
    ),
    (
        Topology::Seg3,
        &[
            "T2D3", "T2D3H", "T2D3T", "T3D3", "T3D3H", "T3D3T", "B22", "B22H", "B32", "B32H",
            "B32R", "B32OS", "B32OSH", "PIPE22", "PIPE22H", "PIPE32", "PIPE32H", "SAX2",
            "SAX2T", "DC1D3",
        ],
    ),
    (
        Topology::Tri3,
        &[
            "CPS3", "CPS3T", "CPE3", "CPE3H", "CPE3T", "CAX3", "CAX3H", "CAX3T", "S3", "S3R",
            "S3RS", "S3T", "S3RT", "STRI3", "M3D3", "R3D3", "SFM3D3", "DC2D3", "DS3", "WARP2D3",
            "CPEG3", "CPEG3H",
        ],
    ),
    (
        Topology::Tri6,
        &[
            "CPS6", "CPS6M", "CPS6MT", "CPE6", "CPE6H", "CPE6M", "CPE6MH", "CPE6MT", "CAX6",
            "CAX6H", "CAX6M", "CAX6MH", "CAX6MT", "S6", "STRI65", "M3D6", "SFM3D6", "DC2D6",
            "DS6", "CPEG6", "CPEG6H",
        ],
    ),
    (
        Topology::Quad4,
        &[
            "CPS4", "CPS4R", "CPS4I", "CPS4T", "CPS4RT", "CPE4", "CPE4H", "CPE4R", "CPE4RH",
            "CPE4I", "CPE4IH", "CPE4T", "CPE4RT", "CPE4HT", "CAX4", "CAX4H", "CAX4R", "CAX4RH",
            "CAX4I", "CAX4IH", "CAX4T", "CAX4RT", "S4", "S4R", "S4RS", "S4RSW", "S4R5", "S4T",
            "S4RT", "M3D4", "M3D4R", "R3D4", "SFM3D4", "SFM3D4R", "DC2D4", "DCC2D4", "DS4",
            "CPEG4", "CPEG4H", "CPEG4R", "WARP2D4", "COH2D4",
        ],
    ),
    (
        Topology::Quad8,
        &[
            "CPS8", "CPS8R", "CPS8T", "CPS8RT", "CPE8", "CPE8H", "CPE8R", "CPE8RH", "CPE8T",
            "CPE8RT", "CAX8", "CAX8H", "CAX8R", "CAX8RH", "CAX8T", "CAX8RT", "S8", "S8R",
            "S8R5", "S8RT", "M3D8", "M3D8R", "SFM3D8", "SFM3D8R", "DC2D8", "DS8", "CPEG8",
            "CPEG8H", "CPEG8R",
        ],
    ),
    (Topology::Quad9, &["S9R5", "M3D9", "M3D9R"]),
    (
        Topology::Tet4,
        &["C3D4", "C3D4H", "C3D4T", "DC3D4", "AC3D4", "C3D4E", "C3D4P"],
    ),
    (
        Topology::Tet10,
        &[
            "C3D10", "C3D10H", "C3D10I", "C3D10M", "C3D10MH", "C3D10HS", "C3D10T", "C3D10MT",
            "C3D10MHT", "C3D10E", "DC3D10", "AC3D10",
        ],
    ),
    (Topology::Pyr5, &["C3D5", "C3D5H"]),
    (
        Topology::Wedge6,
        &[
            "C3D6", "C3D6H", "C3D6T", "C3D6E", "SC6R", "SC6RT", "DC3D6", "AC3D6", "COH3D6",
        ],
    ),
    (
        Topology::Wedge15,
        &["C3D15", "C3D15H", "C3D15V", "C3D15VH", "DC3D15", "AC3D15"],
    ),
    (
        Topology::Hex8,
        &[
            "C3D8", "C3D8H", "C3D8I", "C3D8IH", "C3D8R", "C3D8RH", "C3D8S", "C3D8HS", "C3D8T",
            "C3D8HT", "C3D8RT", "C3D8RHT", "C3D8E", "C3D8P", "C3D8RP", "SC8R", "SC8RT", "CSS8",
            "DC3D8", "DCC3D8", "AC3D8", "AC3D8R", "COH3D8",
        ],
    ),
    (
        Topology::Hex20,
        &[
            "C3D20", "C3D20H", "C3D20R", "C3D20RH", "C3D20T", "C3D20HT", "C3D20RT", "C3D20RHT",
            "C3D20E", "C3D20RE", "C3D20P", "C3D20RP", "DC3D20", "AC3D20",
        ],
    ),
    (Topology::Hex27, &["C3D27", "C3D27H", "C3D27R", "C3D27RH"]),
];

#[derive(Debug, Clone)]
pub struct ElementRegistry {
    entries: HashMap<String, ElementInfo>,
}

impl ElementRegistry {
    /// A registry with no codes at all.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The built-in code table.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (topology, codes) in BUILTIN_ELEMENTS {
            for code in *codes {
                registry.register(code, topology.num_nodes(), *topology);
            }
        }
        registry
    }

    /// Adds or replaces a code. The last registration for a code wins.
    pub fn register(&mut self, code: &str, node_count: usize, topology: Topology) {
        let key = code.trim().to_ascii_uppercase();
        let info = ElementInfo {
            node_count,
            topology,
        };
        if let Some(previous) = self.entries.insert(key.clone(), info)
            && previous != info
        {
            tracing::debug!(code = %key, ?previous, ?info, "element code re-registered");
        }
    }

    pub fn lookup(&self, code: &str) -> Option<ElementInfo> {
        self.entries.get(&code.trim().to_ascii_uppercase()).copied()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.lookup(code).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All codes with their info, sorted by code.
    pub fn entries(&self) -> Vec<(&str, ElementInfo)> {
        let mut all: Vec<(&str, ElementInfo)> = self
            .entries
            .iter()
            .map(|(code, info)| (code.as_str(), *info))
            .collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }
}

impl Default for ElementRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
