//! Partitioning a deck into keyword-delimited sections.

use crate::error::Result;
use crate::keyword::Keyword;
use crate::line::{KeywordLine, is_data, is_keyword, parse_keyword_line};
use crate::source::SourceLine;

/// Indices of every keyword line, followed by a sentinel equal to `lines.len()`.
pub fn find_keyword_lines(lines: &[SourceLine]) -> Vec<usize> {
    let mut indices: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| is_keyword(&l.text))
        .map(|(i, _)| i)
        .collect();
    indices.push(lines.len());
    indices
}

/// A keyword line plus the data lines that follow it.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    pub keyword: Keyword,
    pub header: KeywordLine,
    pub data: Vec<&'a SourceLine>,
}

impl<'a> Section<'a> {
    pub fn open(line: &'a SourceLine) -> Result<Self> {
        let header = parse_keyword_line(&line.text, line.number)?;
        Ok(Self {
            keyword: Keyword::from_name(&header.name),
            header,
            data: Vec::new(),
        })
    }

    /// Adds a line read after the keyword line. Blank and comment lines are
    /// ignored; while the header still ends in a comma the line continues it.
    pub fn push(&mut self, line: &'a SourceLine) -> Result<()> {
        if !is_data(&line.text) {
            return Ok(());
        }
        if self.continues_header() {
            let joined = format!("{} {}", self.header.raw, line.text.trim());
            let number = self.header.line;
            self.header = parse_keyword_line(&joined, number)?;
            self.keyword = Keyword::from_name(&self.header.name);
            return Ok(());
        }
        self.data.push(line);
        Ok(())
    }

    /// True while the next data line would be read as the rest of the
    /// keyword line.
    pub fn continues_header(&self) -> bool {
        self.data.is_empty() && self.header.raw.trim_end().ends_with(',')
    }

    pub fn line(&self) -> usize {
        self.header.line
    }
}

/// Splits the deck into one [`Section`] per keyword line. Lines before the
/// first keyword belong to no section and are dropped.
pub fn sections(lines: &[SourceLine]) -> Result<Vec<Section<'_>>> {
    let indices = find_keyword_lines(lines);
    if let Some(&first) = indices.first() {
        for orphan in lines[..first].iter().filter(|l| is_data(&l.text)) {
            tracing::debug!(line = orphan.number, "data line outside any section, dropped");
        }
    }

    let mut out = Vec::with_capacity(indices.len().saturating_sub(1));
    for span in indices.windows(2) {
        let (start, end) = (span[0], span[1]);
        let mut section = Section::open(&lines[start])?;
        for line in &lines[start + 1..end] {
            section.push(line)?;
        }
        out.push(section);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::lines_from_str;

    #[test]
    fn appends_sentinel_after_last_line() {
        let lines = lines_from_str("** c\n*NODE\n1,0,0\n*ELEMENT, TYPE=T3D2\n1,1,2\n");
        assert_eq!(find_keyword_lines(&lines), vec![1, 3, 5]);
    }

    #[test]
    fn empty_input_has_only_sentinel() {
        assert_eq!(find_keyword_lines(&[]), vec![0]);
    }

    #[test]
    fn sections_skip_comments_and_blank_lines() {
        let lines = lines_from_str(
            "*HEADING\nMy model\n\n** note\n*NODE, NSET=NALL\n1,0,0,0\n2,1,0,0\n",
        );
        let sections = sections(&lines).expect("sections should parse");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].keyword, Keyword::Heading);
        assert_eq!(sections[0].data.len(), 1);
        assert_eq!(sections[1].keyword, Keyword::Node);
        assert_eq!(sections[1].data.len(), 2);
        assert_eq!(sections[1].line(), 5);
    }

    #[test]
    fn data_before_first_keyword_is_dropped() {
        let lines = lines_from_str("1,2,3\n*NODE\n1,0,0,0\n");
        let sections = sections(&lines).expect("sections should parse");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].data.len(), 1);
    }

    #[test]
    fn trailing_comma_continues_keyword_line() {
        let lines = lines_from_str("*STEP, INC=100,\nNLGEOM\n*STATIC\n1., 1.\n");
        let sections = sections(&lines).expect("sections should parse");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].keyword, Keyword::Step);
        assert!(sections[0].header.options.has("NLGEOM"));
        assert_eq!(sections[0].header.options.get("INC"), Some("100"));
        assert!(sections[0].data.is_empty());
    }
}
