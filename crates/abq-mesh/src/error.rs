//! Error types for abq-mesh

use abq_inp::InpError;
use thiserror::Error;

use crate::mesh::FaceId;
use crate::topology::Topology;

pub type Result<T> = std::result::Result<T, MeshError>;

#[derive(Error, Debug)]
pub enum MeshError {
    #[error(transparent)]
    Inp(#[from] InpError),

    #[error("line {line}: *{keyword} is missing required option {option}=")]
    MissingOption {
        line: usize,
        keyword: String,
        option: &'static str,
    },

    #[error("line {line}: unknown element type {code}")]
    UnknownElementType { line: usize, code: String },

    #[error(
        "line {line}: element {element} has {found} nodes, more than the {expected} its type takes"
    )]
    TooManyNodes {
        line: usize,
        element: i32,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: element {element} ends with {found} of {expected} nodes")]
    IncompleteElement {
        line: usize,
        element: i32,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid number `{token}` in *{keyword}")]
    InvalidNumber {
        line: usize,
        keyword: String,
        token: String,
    },

    #[error("line {line}: cannot find set name in *{keyword}")]
    MissingSetName { line: usize, keyword: String },

    #[error("line {line}: invalid GENERATE row: {message}")]
    InvalidGenerate { line: usize, message: String },

    #[error("line {line}: unrecognized *SURFACE row `{row}`")]
    InvalidSurfaceRow { line: usize, row: String },

    #[error("id {id} in {scope} overflows when renumbered into the flattened mesh")]
    IdOverflow { scope: String, id: i32 },

    #[error("surface {0} not found")]
    UnknownSurface(String),

    #[error("surface {surface} references unknown element {element}")]
    UnknownElement { surface: String, element: i32 },

    #[error("no face {face} defined for topology {topology}")]
    UnsupportedFace { topology: Topology, face: FaceId },

    #[error("element {element} has no local node {position} needed by face {face}")]
    ShortConnectivity {
        element: i32,
        position: usize,
        face: FaceId,
    },
}
