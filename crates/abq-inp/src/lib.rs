//! Lexical layer for ABAQUS `.inp` decks.
//!
//! This crate provides:
//! - **Line classification** (comment / keyword / data)
//! - **Keyword-line tokenizing** into an uppercase name and an option list
//! - **Section scanning**: one [`Section`] per keyword line with its data lines
//! - **Recognized keywords** as the [`Keyword`] enum
//! - **Source reading** with `*INCLUDE` expansion
//! - **Data-row typing** into [`Value`] fields

pub mod error;
pub mod keyword;
pub mod line;
pub mod row;
pub mod scanner;
pub mod source;

pub use error::{InpError, Result};
pub use keyword::Keyword;
pub use line::{
    KeywordLine, Options, Parameter, is_comment, is_data, is_keyword, parse_keyword_line,
};
pub use row::{Value, integer_tokens, number_tokens, parse_data_row};
pub use scanner::{Section, find_keyword_lines, sections};
pub use source::{SourceLine, lines_from_str, read_lines};
