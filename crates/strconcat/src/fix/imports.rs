//! Namespace imports: deciding whether a namespace is in scope and, when
//! the host can, inserting a `using` directive for it.
use std::cmp::Ordering;
use std::fmt::Debug;

use tracing::debug;

use super::session::EditSession;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::project::Document;
use crate::range::TextSize;
use crate::syntax::SyntaxTree;
use crate::syntax::ast::{NamespaceDecl, NamespaceMember, UsingDirective};

/// A request to make `namespace` usable at `position` of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportRequest<'a> {
    pub namespace: &'a str,
    pub position: TextSize,
}

#[derive(Debug, Clone)]
pub enum ImportOutcome {
    AlreadyInScope,
    Inserted(Document),
    /// The host cannot insert imports; the document is unchanged.
    Unavailable,
}

/// The host's ability to add imports to a document.
pub trait ImportInserter: Debug + Send + Sync {
    /// Insert an import for `request.namespace`, which is not yet in scope.
    ///
    /// `Ok(None)` means the capability is absent.
    fn insert(
        &self,
        document: &Document,
        request: &ImportRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Option<Document>>;
}

/// Inserts `using` directives, keeping an already sorted list sorted.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsingDirectiveInserter;

/// A host without import insertion.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopImportInserter;

impl ImportInserter for NoopImportInserter {
    fn insert(
        &self,
        _document: &Document,
        _request: &ImportRequest<'_>,
        _cancel: &CancellationToken,
    ) -> Result<Option<Document>> {
        Ok(None)
    }
}

fn enclosing_namespaces<'t>(
    members: &'t [NamespaceMember],
    position: TextSize,
    out: &mut Vec<&'t NamespaceDecl>,
) {
    for member in members {
        if let NamespaceMember::Namespace(ns) = member
            && ns.range.start() <= position
            && position <= ns.range.end()
        {
            out.push(ns);
            enclosing_namespaces(&ns.members, position, out);
        }
    }
}

fn imports(usings: &[UsingDirective], namespace: &str) -> bool {
    usings
        .iter()
        .any(|using| using.imports_namespace() && using.name.dotted() == namespace)
}

/// Whether `namespace` is imported at `position`, or encloses it.
pub fn is_in_scope(tree: &SyntaxTree, namespace: &str, position: TextSize) -> bool {
    let unit = tree.unit();
    if imports(&unit.usings, namespace) {
        return true;
    }
    let mut enclosing = Vec::new();
    enclosing_namespaces(&unit.members, position, &mut enclosing);

    let mut qualified = String::new();
    enclosing.iter().any(|ns| {
        if !qualified.is_empty() {
            qualified.push('.');
        }
        qualified.push_str(&ns.name.dotted());
        let encloses = qualified == namespace
            || qualified
                .strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with('.'));
        encloses || imports(&ns.usings, namespace)
    })
}

/// Make `request.namespace` usable, reporting how.
pub fn resolve_import(
    inserter: &dyn ImportInserter,
    document: &Document,
    request: &ImportRequest<'_>,
    cancel: &CancellationToken,
) -> Result<ImportOutcome> {
    cancel.check()?;
    if is_in_scope(document.tree(), request.namespace, request.position) {
        return Ok(ImportOutcome::AlreadyInScope);
    }
    Ok(match inserter.insert(document, request, cancel)? {
        Some(document) => ImportOutcome::Inserted(document),
        None => {
            debug!(namespace = request.namespace, "import insertion unavailable");
            ImportOutcome::Unavailable
        }
    })
}

/// Ensure `request.namespace` is imported. Idempotent; the document comes
/// back unchanged when the namespace is in scope or nothing can insert it.
pub fn ensure_import(
    inserter: &dyn ImportInserter,
    document: Document,
    request: &ImportRequest<'_>,
    cancel: &CancellationToken,
) -> Result<Document> {
    Ok(match resolve_import(inserter, &document, request, cancel)? {
        ImportOutcome::Inserted(edited) => edited,
        ImportOutcome::AlreadyInScope | ImportOutcome::Unavailable => document,
    })
}

fn is_system(name: &str) -> bool {
    name == "System" || name.starts_with("System.")
}

/// `System` namespaces first, then ordinal.
fn compare_imports(a: &str, b: &str) -> Ordering {
    is_system(b).cmp(&is_system(a)).then_with(|| a.cmp(b))
}

fn line_ending(text: &str) -> &'static str {
    if text.contains("\r\n") { "\r\n" } else { "\n" }
}

/// The whitespace between the start of the line and `offset`.
fn indentation_at(text: &str, offset: TextSize) -> &str {
    let line_start = text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    let prefix = &text[line_start..offset];
    if prefix.chars().all(char::is_whitespace) {
        prefix
    } else {
        ""
    }
}

impl UsingDirectiveInserter {
    /// Where `using namespace;` goes in a non-empty list, and the text to
    /// insert there.
    fn insertion_in_list(
        text: &str,
        usings: &[UsingDirective],
        namespace: &str,
    ) -> Option<(TextSize, String)> {
        let newline = line_ending(text);
        let first = usings.first()?;
        let indent = indentation_at(text, first.range.start());
        let directive = format!("using {namespace};");

        let plain: Vec<&UsingDirective> = usings
            .iter()
            .filter(|using| using.imports_namespace() && !using.is_global)
            .collect();
        let sorted = plain.windows(2).all(|pair| {
            compare_imports(&pair[0].name.dotted(), &pair[1].name.dotted()) != Ordering::Greater
        });
        if sorted
            && let Some(next) = plain.iter().find(|using| {
                compare_imports(&using.name.dotted(), namespace) == Ordering::Greater
            })
        {
            let indent = indentation_at(text, next.range.start());
            return Some((next.range.start(), format!("{directive}{newline}{indent}")));
        }

        // After the last plain using, or the last using of any kind.
        let last = plain.last().copied().or_else(|| usings.last())?;
        Some((last.range.end(), format!("{newline}{indent}{directive}")))
    }
}

impl ImportInserter for UsingDirectiveInserter {
    fn insert(
        &self,
        document: &Document,
        request: &ImportRequest<'_>,
        cancel: &CancellationToken,
    ) -> Result<Option<Document>> {
        let text = document.text();
        let unit = document.tree().unit();
        let namespace = request.namespace;

        let mut enclosing = Vec::new();
        enclosing_namespaces(&unit.members, request.position, &mut enclosing);
        // The innermost using list that covers the position.
        let list = enclosing
            .iter()
            .rev()
            .map(|ns| ns.usings.as_slice())
            .find(|usings| !usings.is_empty())
            .unwrap_or(unit.usings.as_slice());

        let (offset, inserted) = match Self::insertion_in_list(text, list, namespace) {
            Some(insertion) => insertion,
            None => {
                // No usings at all: open the file with one, then a blank line.
                let newline = line_ending(text);
                let offset = unit
                    .members
                    .first()
                    .map_or(text.len(), |member| match member {
                        NamespaceMember::Namespace(ns) => ns.range.start(),
                        NamespaceMember::Type(ty) => ty.range.start(),
                    });
                (offset, format!("using {namespace};{newline}{newline}"))
            }
        };

        let mut session = EditSession::open(document, cancel);
        session.insert(offset, &inserted);
        session.commit().map(Some)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const GLOBALIZATION: &str = "System.Globalization";

    fn insert(text: &str) -> String {
        let document = Document::parse("Test0.cs", text).unwrap();
        let position = text.find("class").unwrap_or(0);
        let request = ImportRequest {
            namespace: GLOBALIZATION,
            position,
        };
        ensure_import(
            &UsingDirectiveInserter,
            document,
            &request,
            &CancellationToken::new(),
        )
        .unwrap()
        .text()
        .to_string()
    }

    #[test]
    fn inserts_after_system() {
        assert_eq!(
            insert("\nusing System;\n\nclass P { }\n"),
            "\nusing System;\nusing System.Globalization;\n\nclass P { }\n"
        );
    }

    #[test]
    fn keeps_sorted_lists_sorted() {
        assert_eq!(
            insert("using System;\nusing System.Text;\nusing Zoo;\nclass P { }"),
            "using System;\nusing System.Globalization;\nusing System.Text;\nusing Zoo;\nclass P { }"
        );
        assert_eq!(
            insert("using Alpha;\nclass P { }"),
            "using System.Globalization;\nusing Alpha;\nclass P { }"
        );
    }

    #[test]
    fn appends_to_unsorted_lists() {
        assert_eq!(
            insert("using Zoo;\nusing System;\nclass P { }"),
            "using Zoo;\nusing System;\nusing System.Globalization;\nclass P { }"
        );
    }

    #[test]
    fn opens_files_without_usings() {
        assert_eq!(
            insert("class P { }"),
            "using System.Globalization;\n\nclass P { }"
        );
        assert_eq!(
            insert("// header\nclass P { }"),
            "// header\nusing System.Globalization;\n\nclass P { }"
        );
    }

    #[test]
    fn uses_the_namespace_list_when_usings_live_there() {
        let text = "namespace App\n{\n    using System;\n\n    class P { }\n}\n";
        assert_eq!(
            insert(text),
            "namespace App\n{\n    using System;\n    using System.Globalization;\n\n    class P { }\n}\n"
        );
    }

    #[test]
    fn is_idempotent() {
        let once = insert("using System;\nclass P { }");
        assert_eq!(insert(&once), once);
    }

    #[test]
    fn enclosing_namespaces_count_as_in_scope() {
        let text = "namespace System.Globalization.Extra { class P { } }";
        assert_eq!(insert(text), text);
        let tree = crate::syntax::parse(text).unwrap();
        assert!(is_in_scope(&tree, "System", text.find("class").unwrap()));
        assert!(!is_in_scope(&tree, "System.Glob", text.find("class").unwrap()));
    }

    #[test]
    fn aliases_and_static_usings_do_not_import() {
        let text = "using G = System.Globalization;\nusing static System.Globalization;\nclass P { }";
        let tree = crate::syntax::parse(text).unwrap();
        assert!(!is_in_scope(&tree, GLOBALIZATION, 0));
    }

    #[test]
    fn noop_inserter_reports_unavailable() {
        let document = Document::parse("Test0.cs", "class P { }").unwrap();
        let request = ImportRequest {
            namespace: GLOBALIZATION,
            position: 0,
        };
        let outcome = resolve_import(
            &NoopImportInserter,
            &document,
            &request,
            &CancellationToken::new(),
        )
        .unwrap();
        assert!(matches!(outcome, ImportOutcome::Unavailable));
    }
}
