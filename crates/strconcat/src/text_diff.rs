use colored::Colorize;
use similar::{ChangeTag, TextDiff};

// From ruff CodeDiff
pub struct CodeDiff<'a> {
    diff: TextDiff<'a, 'a, 'a, str>,
    header: Option<(&'a str, &'a str)>,
    missing_newline_hint: bool,
}

impl<'a> CodeDiff<'a> {
    pub fn new(original: &'a str, modified: &'a str) -> Self {
        let diff = TextDiff::from_lines(original, modified);
        Self {
            diff,
            header: None,
            missing_newline_hint: true,
        }
    }

    #[must_use]
    pub fn header(mut self, original: &'a str, modified: &'a str) -> Self {
        self.header = Some((original, modified));
        self
    }

    pub fn has_changes(&self) -> bool {
        self.diff.ops().iter().any(|op| op.tag() != similar::DiffTag::Equal)
    }
}

impl std::fmt::Display for CodeDiff<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some((original, modified)) = self.header {
            writeln!(f, "--- {}", original.red())?;
            writeln!(f, "+++ {}", modified.green())?;
        }

        let mut unified = self.diff.unified_diff();
        unified.missing_newline_hint(self.missing_newline_hint);

        // Individual hunks (section of changes)
        for hunk in unified.iter_hunks() {
            writeln!(f, "{}", hunk.header().to_string().cyan())?;

            // Individual lines, each carrying its own line ending
            for change in hunk.iter_changes() {
                let value = change.value();
                match change.tag() {
                    ChangeTag::Equal => write!(f, " {value}")?,
                    ChangeTag::Delete => write!(f, "{}{}", "-".red(), value.red())?,
                    ChangeTag::Insert => write!(f, "{}{}", "+".green(), value.green())?,
                }
                if change.missing_newline() {
                    writeln!(f)?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shows_changed_lines() {
        colored::control::set_override(false);
        let original = "a\nb + 1\nc\n";
        let modified = "a\nb + 1.ToString()\nc\n";
        let diff = CodeDiff::new(original, modified).header("x.cs", "x.cs");
        assert!(diff.has_changes());
        let shown = diff.to_string();
        assert!(shown.starts_with("--- x.cs\n+++ x.cs\n"));
        assert!(shown.contains("-b + 1\n"));
        assert!(shown.contains("+b + 1.ToString()\n"));
    }

    #[test]
    fn identical_texts_have_no_hunks() {
        let diff = CodeDiff::new("same\n", "same\n");
        assert!(!diff.has_changes());
        assert_eq!(diff.to_string(), "");
    }
}
