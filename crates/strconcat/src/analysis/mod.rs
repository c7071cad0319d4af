//! The culture-sensitive concatenation rule: find qualifying conversions in
//! a bound document and report them.
pub mod matcher;
pub mod reporter;

use std::path::Path;

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::project::Snapshot;

pub use matcher::{ConversionMatch, ConversionMatcher, WellKnownTypes};

const GENERATED_SUFFIXES: [&str; 3] = [".g.cs", ".designer.cs", ".generated.cs"];

/// Whether a document is generated code, by file name or by an
/// `<auto-generated>` marker in its leading comment.
pub fn is_generated(path: &Path, text: &str, header: Option<crate::range::TextRange>) -> bool {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    GENERATED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
        || header.is_some_and(|header| text[header].contains("<auto-generated"))
}

/// Analyze one snapshot. Conversions are visited in document order, so
/// diagnostics come out sorted by position.
pub fn analyze(snapshot: &Snapshot, cancel: &CancellationToken) -> Result<Vec<Diagnostic>> {
    cancel.check()?;
    let Some(matcher) = ConversionMatcher::new(&snapshot.compilation) else {
        debug!(
            path = %snapshot.document.path().display(),
            "format provider or culture type missing, rule disabled"
        );
        return Ok(Vec::new());
    };

    let document = &snapshot.document;
    let source_map = document.source_map();
    let mut diagnostics = Vec::new();
    for node in snapshot.unit.conversions() {
        cancel.check()?;
        if let Some(found) = matcher.matches(&snapshot.unit, node) {
            diagnostics.push(reporter::report(
                &snapshot.compilation,
                &snapshot.unit,
                node,
                &found,
                document.text(),
                &source_map,
            ));
        }
    }
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::diagnostic::Severity;
    use crate::model::Reference;
    use crate::project::Document;
    use crate::source_map::Location;

    fn analyze_text(text: &str) -> Vec<Diagnostic> {
        let document = Document::parse("Test0.cs", text).unwrap();
        let snapshot = Snapshot::standalone(&Reference::ALL, document);
        analyze(&snapshot, &CancellationToken::new()).unwrap()
    }

    fn location(line: usize, column: usize) -> Option<Location> {
        Some(Location {
            file: "Test0.cs".to_string(),
            line,
            column,
        })
    }

    #[test]
    fn no_source_no_diagnostics() {
        assert!(analyze_text("").is_empty());
    }

    #[test]
    fn concatenation_with_existing_using() {
        let text = r#"
using System;
using System.Globalization;

class Program
{
    string Main(int val)
    {
        return "hi: " + val;
    }
}
"#;
        let diagnostics = analyze_text(text);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(
            diagnostic.message,
            "Call method 'int.ToString(System.IFormatProvider)' on type 'Int32'."
        );
        assert_eq!(diagnostic.severity, Severity::Warning);
        assert_eq!(diagnostic.location, location(9, 25));
        assert_eq!(&text[diagnostic.range.unwrap()], "val");
    }

    #[test]
    fn concatenation_without_using() {
        let text = r#"
using System;

class Program
{
    string Main(int val)
    {
        return "hi: " + val;
    }
}
"#;
        let diagnostics = analyze_text(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location, location(8, 25));
    }

    #[test]
    fn compound_assignment() {
        let text = r#"
using System;
using System.Globalization;

class Program
{
    string Main(int val)
    {
        string s = "asdf";
        s += val;
        return s;
    }
}
"#;
        let diagnostics = analyze_text(text);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].location, location(10, 14));
    }

    #[test]
    fn hidden_lines_have_no_location() {
        let text = r#"
class Program
{
    string Main(int val)
    {
#line hidden
        string hidden = "a" + val;
#line default
        return "b" + val;
    }
}
"#;
        let diagnostics = analyze_text(text);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].location, None);
        assert_eq!(diagnostics[0].range, None);
        assert!(!diagnostics[0].is_fixable());
        assert_eq!(diagnostics[1].location, location(9, 22));
    }

    #[test]
    fn remapped_lines() {
        let text = "class Program\n{\n#line 100 \"Page.razor\"\n    string M(int v) { return \"\" + v; }\n}\n";
        let diagnostics = analyze_text(text);
        assert_eq!(
            diagnostics[0].location,
            Some(Location {
                file: "Page.razor".to_string(),
                line: 100,
                column: 35,
            })
        );
    }

    #[test]
    fn several_diagnostics_in_document_order() {
        let text = r#"class P { string M(int a, double b, char c) { return a + "-" + b + "-" + c; } }"#;
        let messages: Vec<_> = analyze_text(text)
            .into_iter()
            .map(|diagnostic| diagnostic.message)
            .collect();
        assert_eq!(
            messages,
            [
                "Call method 'int.ToString(System.IFormatProvider)' on type 'Int32'.",
                "Call method 'double.ToString(System.IFormatProvider)' on type 'Double'.",
                "Call method 'char.ToString(System.IFormatProvider)' on type 'Char'.",
            ]
        );
    }

    #[test]
    fn cancelled_analysis_fails() {
        let document = Document::parse("Test0.cs", "class P { }").unwrap();
        let snapshot = Snapshot::standalone(&Reference::ALL, document);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(analyze(&snapshot, &cancel).unwrap_err().is_cancelled());
    }

    #[test]
    fn generated_documents() {
        let plain = PathBuf::from("src/Program.cs");
        assert!(!is_generated(&plain, "class P { }", None));
        assert!(is_generated(&PathBuf::from("obj/Program.g.cs"), "", None));
        assert!(is_generated(&PathBuf::from("Form1.Designer.cs"), "", None));

        let text = "// <auto-generated>\n// tool output\n// </auto-generated>\nclass P { }";
        let tree = crate::syntax::parse(text).unwrap();
        assert!(is_generated(&plain, text, tree.header()));
    }
}
