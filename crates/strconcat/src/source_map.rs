//! Byte offsets to user-facing `(file, line, column)` locations.
//!
//! Honors `#line` directives: `#line N "file"` renumbers the following lines,
//! `#line hidden` hides them until the next `#line`, `#line default` restores
//! physical numbering.
use crate::syntax::DirectiveLine;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 1-based line and column in a (possibly remapped) file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LineMapping {
    Default,
    Hidden,
    Renumber { line: usize, file: Option<String> },
}

#[derive(Debug, Clone)]
struct LineDirective {
    /// 0-based physical line of the directive itself.
    physical_line: usize,
    mapping: LineMapping,
}

#[derive(Debug, Clone)]
pub struct SourceMap {
    file: String,
    line_starts: Vec<usize>,
    directives: Vec<LineDirective>,
}

impl SourceMap {
    pub fn new(file: impl Into<String>, text: &str, directives: &[DirectiveLine]) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect::<Vec<_>>();
        let mut map = Self {
            file: file.into(),
            line_starts,
            directives: Vec::new(),
        };
        map.directives = directives
            .iter()
            .filter_map(|d| {
                let mapping = parse_line_directive(&d.text)?;
                Some(LineDirective {
                    physical_line: map.physical_line(d.range.start()),
                    mapping,
                })
            })
            .collect();
        map
    }

    /// 0-based physical line containing `offset`.
    fn physical_line(&self, offset: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1)
    }

    /// Physical 1-based `(line, column)`; the column counts characters.
    pub fn line_column(&self, text: &str, offset: usize) -> (usize, usize) {
        let line = self.physical_line(offset);
        let line_start = self.line_starts[line];
        let column = text[line_start..offset].chars().count() + 1;
        (line + 1, column)
    }

    /// Mapped location of `offset`, or `None` inside a `#line hidden` region.
    pub fn location(&self, text: &str, offset: usize) -> Option<Location> {
        let (line, column) = self.line_column(text, offset);
        let physical = line - 1;
        let active = self
            .directives
            .iter()
            .rev()
            .find(|d| d.physical_line < physical);

        match active.map(|d| (d, &d.mapping)) {
            None | Some((_, LineMapping::Default)) => Some(Location {
                file: self.file.clone(),
                line,
                column,
            }),
            Some((_, LineMapping::Hidden)) => None,
            Some((directive, LineMapping::Renumber { line: first, file })) => Some(Location {
                file: file.clone().unwrap_or_else(|| self.file.clone()),
                line: first + (physical - directive.physical_line - 1),
                column,
            }),
        }
    }
}

fn parse_line_directive(text: &str) -> Option<LineMapping> {
    let rest = text.strip_prefix("line")?.trim();
    match rest {
        "default" => Some(LineMapping::Default),
        "hidden" => Some(LineMapping::Hidden),
        _ => {
            let (number, file) = rest
                .split_once(char::is_whitespace)
                .map_or((rest, None), |(n, f)| (n, Some(f.trim())));
            let line = number.parse().ok()?;
            let file = file.map(|f| f.trim_matches('"').to_string());
            Some(LineMapping::Renumber { line, file })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn map(text: &str) -> SourceMap {
        let tree = parse(text).unwrap();
        SourceMap::new("Test0.cs", text, tree.directives())
    }

    #[test]
    fn physical_positions_are_one_based() {
        let text = "\nclass C {\n  int x;\n}\n";
        let offset = text.find("int").unwrap();
        assert_eq!(
            map(text).location(text, offset),
            Some(Location {
                file: "Test0.cs".to_string(),
                line: 3,
                column: 3,
            })
        );
    }

    #[test]
    fn columns_count_characters() {
        let text = "class C { string s = \"é\" + 1; }";
        let offset = text.find('1').unwrap();
        assert_eq!(map(text).line_column(text, offset), (1, 28));
    }

    #[test]
    fn line_directives_remap_and_hide() {
        let text = "class C {\n#line 100 \"Gen.cs\"\n  int a;\n  int b;\n#line hidden\n  int c;\n#line default\n  int d;\n}\n";
        let map = map(text);
        let at = |needle: &str| map.location(text, text.find(needle).unwrap());

        let a = at("int a").unwrap();
        assert_eq!((a.file.as_str(), a.line), ("Gen.cs", 100));
        assert_eq!(at("int b").unwrap().line, 101);
        assert_eq!(at("int c"), None);
        let d = at("int d").unwrap();
        assert_eq!((d.file.as_str(), d.line), ("Test0.cs", 8));
    }
}
