//! Reading deck text into numbered lines, with `*INCLUDE` expansion for files.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{InpError, Result};
use crate::keyword::Keyword;
use crate::line::{is_keyword, parse_keyword_line};

/// A physical line of input. `number` is 1-based within the file it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

pub fn lines_from_str(raw: &str) -> Vec<SourceLine> {
    raw.lines()
        .enumerate()
        .map(|(i, text)| SourceLine {
            number: i + 1,
            text: text.to_string(),
        })
        .collect()
}

/// Reads a deck from disk, splicing `*INCLUDE, INPUT=...` files in place.
/// The `*INCLUDE` line itself is kept.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<SourceLine>> {
    let mut include_stack = Vec::<PathBuf>::new();
    let mut active = HashSet::<PathBuf>::new();
    read_lines_inner(path.as_ref(), &mut include_stack, &mut active)
}

fn read_lines_inner(
    path: &Path,
    include_stack: &mut Vec<PathBuf>,
    active: &mut HashSet<PathBuf>,
) -> Result<Vec<SourceLine>> {
    let normalized = normalize_path(path);
    if active.contains(&normalized) {
        let mut chain = include_stack
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>();
        chain.push(normalized.display().to_string());
        return Err(InpError::IncludeCycle(chain.join(" -> ")));
    }

    include_stack.push(normalized.clone());
    active.insert(normalized);

    let result = expand_file(path, include_stack, active);

    if let Some(done) = include_stack.pop() {
        active.remove(&done);
    }
    result
}

fn expand_file(
    path: &Path,
    include_stack: &mut Vec<PathBuf>,
    active: &mut HashSet<PathBuf>,
) -> Result<Vec<SourceLine>> {
    let raw = fs::read_to_string(path).map_err(|source| InpError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut expanded = Vec::new();

    for line in lines_from_str(&raw) {
        let include_target = if is_keyword(&line.text) {
            let header = parse_keyword_line(&line.text, line.number)?;
            if Keyword::from_name(&header.name) == Keyword::Include {
                let input = header
                    .options
                    .get("INPUT")
                    .ok_or(InpError::MissingIncludeInput { line: line.number })?;
                Some(resolve_include_path(base_dir, input))
            } else {
                None
            }
        } else {
            None
        };

        expanded.push(line);
        if let Some(include_path) = include_target {
            tracing::debug!(path = %include_path.display(), "expanding include");
            let included = read_lines_inner(&include_path, include_stack, active).map_err(|err| {
                match err {
                    InpError::IncludeCycle(_) => err,
                    other => InpError::Include {
                        path: include_path.clone(),
                        message: other.to_string(),
                    },
                }
            })?;
            expanded.extend(included);
        }
    }

    Ok(expanded)
}

fn resolve_include_path(base_dir: &Path, include: &str) -> PathBuf {
    let raw_path = Path::new(include.trim());
    let joined = if raw_path.is_absolute() {
        raw_path.to_path_buf()
    } else {
        base_dir.join(raw_path)
    };
    normalize_path(&joined)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_lines_from_one() {
        let lines = lines_from_str("*NODE\n1,0,0\n");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].number, 1);
        assert_eq!(lines[1].text, "1,0,0");
    }

    #[test]
    fn splices_nested_includes() {
        let tmp = tempfile::tempdir().expect("create temp directory");
        let root = tmp.path().join("root.inp");
        fs::write(&root, "*NODE\n1,0,0,0\n*INCLUDE,INPUT=mid.inc\n*STEP\n").expect("write root");
        fs::write(
            tmp.path().join("mid.inc"),
            "*INCLUDE,INPUT=leaf.inc\n*ELEMENT,TYPE=T3D2\n1,1,2\n",
        )
        .expect("write mid");
        fs::write(tmp.path().join("leaf.inc"), "*MATERIAL,NAME=STEEL\n").expect("write leaf");

        let lines = read_lines(&root).expect("read with includes");
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "*NODE",
                "1,0,0,0",
                "*INCLUDE,INPUT=mid.inc",
                "*INCLUDE,INPUT=leaf.inc",
                "*MATERIAL,NAME=STEEL",
                "*ELEMENT,TYPE=T3D2",
                "1,1,2",
                "*STEP",
            ]
        );
    }

    #[test]
    fn quoted_include_path_may_contain_comma() {
        let tmp = tempfile::tempdir().expect("create temp directory");
        let root = tmp.path().join("root.inp");
        fs::write(&root, "*INCLUDE, INPUT=\"leaf,part.inc\"\n").expect("write root");
        fs::write(tmp.path().join("leaf,part.inc"), "*NODE\n").expect("write leaf");

        let lines = read_lines(&root).expect("read with includes");
        assert_eq!(lines.last().map(|l| l.text.as_str()), Some("*NODE"));
    }

    #[test]
    fn detects_include_cycles() {
        let tmp = tempfile::tempdir().expect("create temp directory");
        let a = tmp.path().join("a.inp");
        fs::write(&a, "*INCLUDE,INPUT=b.inc\n").expect("write a");
        fs::write(tmp.path().join("b.inc"), "*INCLUDE,INPUT=a.inp\n").expect("write b");

        let err = read_lines(&a).expect_err("cycle should fail");
        assert!(matches!(err, InpError::IncludeCycle(_)), "unexpected error: {err}");
    }

    #[test]
    fn include_requires_input_parameter() {
        let tmp = tempfile::tempdir().expect("create temp directory");
        let root = tmp.path().join("root.inp");
        fs::write(&root, "*INCLUDE\n*NODE\n").expect("write root");

        let err = read_lines(&root).expect_err("missing INPUT should fail");
        assert!(matches!(err, InpError::MissingIncludeInput { line: 1 }));
    }

    #[test]
    fn reports_missing_include_file() {
        let tmp = tempfile::tempdir().expect("create temp directory");
        let root = tmp.path().join("root.inp");
        fs::write(&root, "*INCLUDE,INPUT=nowhere.inc\n").expect("write root");

        let err = read_lines(&root).expect_err("missing include should fail");
        assert!(
            err.to_string().contains("while expanding include"),
            "unexpected error: {err}"
        );
    }
}
