use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::project::Document;
use crate::range::{TextRange, TextSize};

/// An exclusively owned working copy of one document, open for one edit.
///
/// Committing re-parses the working text into a new [`Document`]; dropping
/// the session discards it. The original document is never touched.
#[derive(Debug)]
pub struct EditSession<'a> {
    original: &'a Document,
    working: String,
    cancel: &'a CancellationToken,
}

impl<'a> EditSession<'a> {
    pub fn open(document: &'a Document, cancel: &'a CancellationToken) -> Self {
        Self {
            original: document,
            working: document.text().to_string(),
            cancel,
        }
    }

    pub fn replace(&mut self, range: TextRange, replacement: &str) {
        self.working
            .replace_range(range.start()..range.end(), replacement);
    }

    pub fn insert(&mut self, offset: TextSize, text: &str) {
        self.working.insert_str(offset, text);
    }

    pub fn text(&self) -> &str {
        &self.working
    }

    /// Publish the edit as a new document version.
    pub fn commit(self) -> Result<Document> {
        self.cancel.check()?;
        self.original.with_text(self.working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_produces_a_new_version() {
        let document = Document::parse("a.cs", "class A { }").unwrap();
        let cancel = CancellationToken::new();
        let mut session = EditSession::open(&document, &cancel);
        session.replace(TextRange::new(6, 7), "B");
        session.insert(0, "// x\n");
        let edited = session.commit().unwrap();
        assert_eq!(edited.text(), "// x\nclass B { }");
        assert_eq!(edited.version(), document.version() + 1);
        assert_eq!(document.text(), "class A { }");
    }

    #[test]
    fn cancelled_sessions_publish_nothing() {
        let document = Document::parse("a.cs", "class A { }").unwrap();
        let cancel = CancellationToken::new();
        let mut session = EditSession::open(&document, &cancel);
        session.replace(TextRange::new(6, 7), "B");
        cancel.cancel();
        assert!(session.commit().unwrap_err().is_cancelled());
        assert_eq!(document.text(), "class A { }");
    }

    #[test]
    fn unparsable_edits_fail() {
        let document = Document::parse("a.cs", "class A { }").unwrap();
        let cancel = CancellationToken::new();
        let mut session = EditSession::open(&document, &cancel);
        session.replace(TextRange::new(10, 11), "");
        assert!(session.commit().is_err());
    }
}
