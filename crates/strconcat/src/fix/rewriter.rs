//! The code fix: replace a flagged operand `x` with
//! `x.ToString(CultureInfo.InvariantCulture)` and import the culture
//! namespace.
use std::sync::Arc;

use tracing::debug;

use super::capabilities::CapabilityRegistry;
use super::imports::{ImportInserter, ImportOutcome, ImportRequest, resolve_import};
use super::session::EditSession;
use crate::analysis::ConversionMatcher;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::project::{Document, Snapshot};
use crate::range::TextRange;

pub const GLOBALIZATION_NAMESPACE: &str = "System.Globalization";
const CULTURE_TYPE: &str = "CultureInfo";
const INVARIANT_CULTURE: &str = "CultureInfo.InvariantCulture";
const QUALIFIED_INVARIANT_CULTURE: &str = "System.Globalization.CultureInfo.InvariantCulture";

#[derive(Debug, Clone)]
pub struct ConversionFixer {
    inserter: Arc<dyn ImportInserter>,
}

impl Default for ConversionFixer {
    fn default() -> Self {
        Self::from_registry()
    }
}

impl ConversionFixer {
    pub fn new(inserter: Arc<dyn ImportInserter>) -> Self {
        Self { inserter }
    }

    /// A fixer using the process-wide import capability.
    pub fn from_registry() -> Self {
        Self::new(CapabilityRegistry::import_inserter())
    }

    /// Rewrite the conversion flagged at `span`.
    ///
    /// A span that no longer names a qualifying conversion, or a rewrite
    /// that fails, leaves the document unchanged. Only cancellation is an
    /// error.
    pub fn apply_fix(
        &self,
        snapshot: &Snapshot,
        span: TextRange,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        match self.rewrite(snapshot, span, cancel) {
            Err(err) if !err.is_cancelled() => {
                debug!(?span, "rewrite failed, document left unchanged: {err}");
                Ok(snapshot.document.clone())
            }
            result => result,
        }
    }

    fn rewrite(
        &self,
        snapshot: &Snapshot,
        span: TextRange,
        cancel: &CancellationToken,
    ) -> Result<Document> {
        cancel.check()?;
        let document = &snapshot.document;
        let Some(expr) = document.tree().innermost_expression_at(span) else {
            debug!(?span, "no expression at fix span");
            return Ok(document.clone());
        };

        let unit = &snapshot.unit;
        let qualifies = ConversionMatcher::new(&snapshot.compilation).is_some_and(|matcher| {
            unit.conversions().any(|node| {
                unit.get(node).syntax.node == Some(expr.id)
                    && matcher.matches(unit, node).is_some()
            })
        });
        if !qualifies {
            debug!(?span, "fix span is no longer a qualifying conversion");
            return Ok(document.clone());
        }

        let operand = &document.text()[expr.range];
        let receiver = if expr.is_primary() {
            operand.to_string()
        } else {
            format!("({operand})")
        };
        let replace = |culture: &str| -> Result<Document> {
            let mut session = EditSession::open(document, cancel);
            session.replace(expr.range, &format!("{receiver}.ToString({culture})"));
            session.commit()
        };

        if culture_name_clashes(snapshot) {
            return replace(QUALIFIED_INVARIANT_CULTURE);
        }

        let edited = replace(INVARIANT_CULTURE)?;
        let request = ImportRequest {
            namespace: GLOBALIZATION_NAMESPACE,
            position: expr.range.start(),
        };
        match resolve_import(self.inserter.as_ref(), &edited, &request, cancel)? {
            ImportOutcome::AlreadyInScope => Ok(edited),
            ImportOutcome::Inserted(imported) => Ok(imported),
            ImportOutcome::Unavailable => replace(QUALIFIED_INVARIANT_CULTURE),
        }
    }
}

/// A source type named `CultureInfo` would capture the short name.
fn culture_name_clashes(snapshot: &Snapshot) -> bool {
    snapshot.compilation.types().any(|(_, symbol)| {
        symbol.from_source
            && symbol.name == CULTURE_TYPE
            && symbol.namespace != GLOBALIZATION_NAMESPACE
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::analysis::analyze;
    use crate::error::Error;
    use crate::fix::imports::{NoopImportInserter, UsingDirectiveInserter};
    use crate::model::Reference;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot::standalone(&Reference::ALL, Document::parse("Test0.cs", text).unwrap())
    }

    fn fix_first_with(fixer: &ConversionFixer, text: &str) -> String {
        let snapshot = snapshot(text);
        let diagnostics = analyze(&snapshot, &CancellationToken::new()).unwrap();
        let span = diagnostics[0].range.unwrap();
        fixer
            .apply_fix(&snapshot, span, &CancellationToken::new())
            .unwrap()
            .text()
            .to_string()
    }

    fn fix_first(text: &str) -> String {
        fix_first_with(&ConversionFixer::new(Arc::new(UsingDirectiveInserter)), text)
    }

    #[test]
    fn fixes_with_existing_using() {
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
        let expected = r#"
using System;
using System.Globalization;

class Program
{
    string Main(int val)
    {
        return "hi: " + val.ToString(CultureInfo.InvariantCulture);
    }
}
"#;
        assert_eq!(fix_first(text), expected);
    }

    #[test]
    fn fixes_and_adds_using() {
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
        let expected = r#"
using System;
using System.Globalization;

class Program
{
    string Main(int val)
    {
        return "hi: " + val.ToString(CultureInfo.InvariantCulture);
    }
}
"#;
        assert_eq!(fix_first(text), expected);
    }

    #[test]
    fn fixes_compound_assignment() {
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
        let expected = r#"
using System;
using System.Globalization;

class Program
{
    string Main(int val)
    {
        string s = "asdf";
        s += val.ToString(CultureInfo.InvariantCulture);
        return s;
    }
}
"#;
        assert_eq!(fix_first(text), expected);
    }

    #[test]
    fn parenthesizes_non_primary_operands() {
        let text = r#"class P { string M(int a, int b) { return "x" + a * b; } }"#;
        assert_eq!(
            fix_first(text),
            "using System.Globalization;\n\nclass P { string M(int a, int b) { return \"x\" + (a * b).ToString(CultureInfo.InvariantCulture); } }"
        );
    }

    #[test]
    fn keeps_written_parentheses() {
        let text = r#"using System.Globalization; class P { string M(int a) { return "x" + (a + 1); } }"#;
        assert_eq!(
            fix_first(text),
            r#"using System.Globalization; class P { string M(int a) { return "x" + (a + 1).ToString(CultureInfo.InvariantCulture); } }"#
        );
    }

    #[test]
    fn qualifies_without_import_capability() {
        let text = r#"class P { string M(int a) { return "x" + a; } }"#;
        let fixer = ConversionFixer::new(Arc::new(NoopImportInserter));
        assert_eq!(
            fix_first_with(&fixer, text),
            r#"class P { string M(int a) { return "x" + a.ToString(System.Globalization.CultureInfo.InvariantCulture); } }"#
        );
    }

    #[test]
    fn qualifies_when_culture_name_clashes() {
        let text = r#"class CultureInfo { } class P { string M(int a) { return "x" + a; } }"#;
        assert_eq!(
            fix_first(text),
            r#"class CultureInfo { } class P { string M(int a) { return "x" + a.ToString(System.Globalization.CultureInfo.InvariantCulture); } }"#
        );
    }

    #[test]
    fn stale_spans_leave_the_document_unchanged() {
        let text = r#"class P { string M(int a) { return "hi: " + a; } }"#;
        let snapshot = snapshot(text);
        let fixer = ConversionFixer::default();
        let cancel = CancellationToken::new();

        let nowhere = TextRange::new(0, 3);
        let literal_start = text.find('"').unwrap();
        let literal = TextRange::new(literal_start, literal_start + 6);
        for span in [nowhere, literal] {
            let fixed = fixer.apply_fix(&snapshot, span, &cancel).unwrap();
            assert_eq!(fixed.text(), text);
            assert_eq!(fixed.version(), snapshot.document.version());
        }
    }

    #[test]
    fn fixing_twice_imports_once() {
        let text = "using System;\nclass P { string M(int a, long b) { return a + \"-\" + b; } }";
        let once = fix_first(text);
        let twice = fix_first(&once);
        assert_eq!(
            twice,
            "using System;\nusing System.Globalization;\nclass P { string M(int a, long b) { return a.ToString(CultureInfo.InvariantCulture) + \"-\" + b.ToString(CultureInfo.InvariantCulture); } }"
        );
    }

    /// An import host whose edits never produce a parsable document.
    #[derive(Debug)]
    struct BrokenInserter;

    impl ImportInserter for BrokenInserter {
        fn insert(
            &self,
            _document: &Document,
            _request: &ImportRequest<'_>,
            _cancel: &CancellationToken,
        ) -> Result<Option<Document>> {
            Err(Error::syntax("expected `;`", 0))
        }
    }

    #[test]
    fn failed_rewrites_leave_the_document_unchanged() {
        let text = r#"class P { string M(int a) { return "x" + a; } }"#;
        let fixer = ConversionFixer::new(Arc::new(BrokenInserter));
        assert_eq!(fix_first_with(&fixer, text), text);
    }

    #[test]
    fn cancelled_fixes_fail() {
        let text = r#"class P { string M(int a) { return "x" + a; } }"#;
        let snapshot = snapshot(text);
        let diagnostics = analyze(&snapshot, &CancellationToken::new()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = ConversionFixer::default().apply_fix(
            &snapshot,
            diagnostics[0].range.unwrap(),
            &cancel,
        );
        assert!(result.unwrap_err().is_cancelled());
    }
}
