//! The fixed set of keywords the readers understand.

use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    // mesh
    Node,
    Element,
    Nset,
    Elset,
    Surface,
    // assembly structure
    Part,
    EndPart,
    Assembly,
    EndAssembly,
    Instance,
    EndInstance,
    Include,
    // model
    Heading,
    SolidSection,
    ShellSection,
    Mass,
    Material,
    Elastic,
    Density,
    Plastic,
    Expansion,
    Damping,
    Step,
    Static,
    Frequency,
    Buckle,
    Dynamic,
    HeatTransfer,
    Output,
    EndStep,
    Boundary,
    Cload,
    Dload,
    Dsload,
    NodePrint,
    ElPrint,
    SectionPrint,
    NodeFile,
    ElFile,
    ContactFile,
    NodeOutput,
    ElementOutput,
    EnergyOutput,
    ContactOutput,
    /// Anything not listed above; skipped by the readers.
    Unknown(String),
}

impl Keyword {
    /// Maps a keyword name (any case) to its variant.
    pub fn from_name(name: &str) -> Self {
        let upper = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match upper.as_str() {
            "NODE" => Keyword::Node,
            "ELEMENT" => Keyword::Element,
            "NSET" => Keyword::Nset,
            "ELSET" => Keyword::Elset,
            "SURFACE" => Keyword::Surface,
            "PART" => Keyword::Part,
            "END PART" => Keyword::EndPart,
            "ASSEMBLY" => Keyword::Assembly,
            "END ASSEMBLY" => Keyword::EndAssembly,
            "INSTANCE" => Keyword::Instance,
            "END INSTANCE" => Keyword::EndInstance,
            "INCLUDE" => Keyword::Include,
            "HEADING" => Keyword::Heading,
            "SOLID SECTION" => Keyword::SolidSection,
            "SHELL SECTION" => Keyword::ShellSection,
            "MASS" => Keyword::Mass,
            "MATERIAL" => Keyword::Material,
            "ELASTIC" => Keyword::Elastic,
            "DENSITY" => Keyword::Density,
            "PLASTIC" => Keyword::Plastic,
            "EXPANSION" => Keyword::Expansion,
            "DAMPING" => Keyword::Damping,
            "STEP" => Keyword::Step,
            "STATIC" => Keyword::Static,
            "FREQUENCY" => Keyword::Frequency,
            "BUCKLE" => Keyword::Buckle,
            "DYNAMIC" => Keyword::Dynamic,
            "HEAT TRANSFER" => Keyword::HeatTransfer,
            "OUTPUT" => Keyword::Output,
            "END STEP" => Keyword::EndStep,
            "BOUNDARY" => Keyword::Boundary,
            "CLOAD" => Keyword::Cload,
            "DLOAD" => Keyword::Dload,
            "DSLOAD" => Keyword::Dsload,
            "NODE PRINT" => Keyword::NodePrint,
            "EL PRINT" => Keyword::ElPrint,
            "SECTION PRINT" => Keyword::SectionPrint,
            "NODE FILE" => Keyword::NodeFile,
            "EL FILE" => Keyword::ElFile,
            "CONTACT FILE" => Keyword::ContactFile,
            "NODE OUTPUT" => Keyword::NodeOutput,
            "ELEMENT OUTPUT" => Keyword::ElementOutput,
            "ENERGY OUTPUT" => Keyword::EnergyOutput,
            "CONTACT OUTPUT" => Keyword::ContactOutput,
            _ => Keyword::Unknown(upper),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Keyword::Node => "NODE",
            Keyword::Element => "ELEMENT",
            Keyword::Nset => "NSET",
            Keyword::Elset => "ELSET",
            Keyword::Surface => "SURFACE",
            Keyword::Part => "PART",
            Keyword::EndPart => "END PART",
            Keyword::Assembly => "ASSEMBLY",
            Keyword::EndAssembly => "END ASSEMBLY",
            Keyword::Instance => "INSTANCE",
            Keyword::EndInstance => "END INSTANCE",
            Keyword::Include => "INCLUDE",
            Keyword::Heading => "HEADING",
            Keyword::SolidSection => "SOLID SECTION",
            Keyword::ShellSection => "SHELL SECTION",
            Keyword::Mass => "MASS",
            Keyword::Material => "MATERIAL",
            Keyword::Elastic => "ELASTIC",
            Keyword::Density => "DENSITY",
            Keyword::Plastic => "PLASTIC",
            Keyword::Expansion => "EXPANSION",
            Keyword::Damping => "DAMPING",
            Keyword::Step => "STEP",
            Keyword::Static => "STATIC",
            Keyword::Frequency => "FREQUENCY",
            Keyword::Buckle => "BUCKLE",
            Keyword::Dynamic => "DYNAMIC",
            Keyword::HeatTransfer => "HEAT TRANSFER",
            Keyword::Output => "OUTPUT",
            Keyword::EndStep => "END STEP",
            Keyword::Boundary => "BOUNDARY",
            Keyword::Cload => "CLOAD",
            Keyword::Dload => "DLOAD",
            Keyword::Dsload => "DSLOAD",
            Keyword::NodePrint => "NODE PRINT",
            Keyword::ElPrint => "EL PRINT",
            Keyword::SectionPrint => "SECTION PRINT",
            Keyword::NodeFile => "NODE FILE",
            Keyword::ElFile => "EL FILE",
            Keyword::ContactFile => "CONTACT FILE",
            Keyword::NodeOutput => "NODE OUTPUT",
            Keyword::ElementOutput => "ELEMENT OUTPUT",
            Keyword::EnergyOutput => "ENERGY OUTPUT",
            Keyword::ContactOutput => "CONTACT OUTPUT",
            Keyword::Unknown(name) => name,
        }
    }

    /// Keywords whose sections hold nodes, elements, sets or surfaces.
    pub fn is_mesh(&self) -> bool {
        matches!(
            self,
            Keyword::Node | Keyword::Element | Keyword::Nset | Keyword::Elset | Keyword::Surface
        )
    }

    /// Part/assembly scoping keywords.
    pub fn is_scope(&self) -> bool {
        matches!(
            self,
            Keyword::Part
                | Keyword::EndPart
                | Keyword::Assembly
                | Keyword::EndAssembly
                | Keyword::Instance
                | Keyword::EndInstance
        )
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Keyword::Unknown(_))
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
