//! Documents, projects and the immutable snapshots analysis runs on.
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::bind::{BoundUnit, bind_project};
use crate::error::Result;
use crate::model::{Compilation, Reference};
use crate::source_map::SourceMap;
use crate::syntax::{self, SyntaxTree};

/// One source file: its text and the tree parsed from it.
///
/// Documents are immutable; an edit produces a new document with a higher
/// version.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: Arc<str>,
    tree: Arc<SyntaxTree>,
    version: u32,
}

impl Document {
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<Arc<str>>) -> Result<Self> {
        let text = text.into();
        let tree = Arc::new(syntax::parse(&text)?);
        Ok(Self {
            path: path.into(),
            text,
            tree,
            version: 0,
        })
    }

    /// The document after an edit that left it with `text`.
    pub(crate) fn with_text(&self, text: String) -> Result<Self> {
        let tree = Arc::new(syntax::parse(&text)?);
        Ok(Self {
            path: self.path.clone(),
            text: text.into(),
            tree,
            version: self.version + 1,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub const fn version(&self) -> u32 {
        self.version
    }

    /// File name as shown in locations.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |name| {
                name.to_string_lossy().into_owned()
            })
    }

    pub fn source_map(&self) -> SourceMap {
        SourceMap::new(self.file_name(), &self.text, self.tree.directives())
    }
}

/// A set of documents compiled together against some references.
#[derive(Debug, Clone)]
pub struct Project {
    references: Vec<Reference>,
    documents: Vec<Document>,
}

impl Project {
    pub fn new(references: &[Reference]) -> Self {
        Self {
            references: references.to_vec(),
            documents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_document(mut self, document: Document) -> Self {
        self.documents.push(document);
        self
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    /// The project with document `index` replaced by `document`.
    #[must_use]
    pub fn replace_document(&self, index: usize, document: Document) -> Self {
        let mut project = self.clone();
        if let Some(slot) = project.documents.get_mut(index) {
            *slot = document;
        }
        project
    }

    /// Bind the project and return one snapshot per document.
    pub fn snapshots(&self) -> Vec<Snapshot> {
        let sources: Vec<(&str, &SyntaxTree)> = self
            .documents
            .iter()
            .map(|document| (document.text(), document.tree()))
            .collect();
        let (compilation, units) = bind_project(&self.references, &sources);
        debug!(documents = self.documents.len(), "bound project");
        let compilation = Arc::new(compilation);
        self.documents
            .iter()
            .zip(units)
            .map(|(document, unit)| Snapshot {
                document: document.clone(),
                compilation: Arc::clone(&compilation),
                unit: Arc::new(unit),
            })
            .collect()
    }

    pub fn snapshot(&self, index: usize) -> Option<Snapshot> {
        self.snapshots().into_iter().nth(index)
    }
}

/// A document together with the compilation it was bound in.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub document: Document,
    pub compilation: Arc<Compilation>,
    pub unit: Arc<BoundUnit>,
}

impl Snapshot {
    /// Snapshot of a single-document project.
    pub fn standalone(references: &[Reference], document: Document) -> Self {
        let (compilation, mut units) =
            bind_project(references, &[(document.text(), document.tree())]);
        Self {
            document,
            compilation: Arc::new(compilation),
            unit: Arc::new(units.pop().unwrap_or_default()),
        }
    }
}
