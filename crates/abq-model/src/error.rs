//! Error types for abq-model

use abq_inp::InpError;
use abq_mesh::MeshError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Inp(#[from] InpError),

    #[error("line {line}: *{keyword} is missing required option {option}=")]
    MissingOption {
        line: usize,
        keyword: String,
        option: &'static str,
    },

    #[error("line {line}: *{keyword} outside of a *MATERIAL block")]
    NoOpenMaterial { line: usize, keyword: String },

    #[error("line {line}: *{keyword} outside of a *STEP block")]
    NoOpenStep { line: usize, keyword: String },

    #[error("line {line}: *{keyword}: {message}")]
    InvalidMaterialData {
        line: usize,
        keyword: String,
        message: String,
    },

    #[error("line {line}: invalid value `{value}` for {option} in *{keyword}")]
    InvalidOption {
        line: usize,
        keyword: String,
        option: &'static str,
        value: String,
    },

    #[error("model has no {0}")]
    EmptyMesh(&'static str),
}
