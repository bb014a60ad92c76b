//! Document collaborator types and the analysis prompt.
//!
//! Text extraction itself is external; the dispatcher only sees the parsed
//! triple (title/content/summary) folded into a prompt whose markers the
//! document-analysis rule recognizes.

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// Maximum document content carried into a prompt, in characters.
pub const CONTENT_CAP: usize = 16_000;

/// A document reduced to text by the extraction collaborator.
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// Human-readable document type, e.g. `PDF` or `CSV`.
    pub doc_type: String,
    pub title: String,
    /// Extracted text, capped at [`CONTENT_CAP`] characters.
    pub content: String,
    /// One-line description (page count, row count, ...).
    pub summary: String,
    pub metadata: HashMap<String, String>,
}

impl ParsedDocument {
    /// Enforce the content cap. Extraction implementations should call this
    /// before returning.
    pub fn capped(mut self) -> Self {
        if self.content.len() > CONTENT_CAP {
            let mut cut = CONTENT_CAP;
            while !self.content.is_char_boundary(cut) {
                cut -= 1;
            }
            self.content.truncate(cut);
        }
        self
    }
}

/// Black-box document-to-text collaborator.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn parse(&self, path: &Path) -> Result<ParsedDocument>;
}

/// Build the document-analysis prompt for a user question about `doc`.
///
/// The resulting text contains the `document analysis` and `user request`
/// markers that route it verbatim to the LLM, bypassing query rewriting.
pub fn analysis_prompt(doc: &ParsedDocument, question: &str) -> String {
    format!(
        "You are an expert document analyst. This is a document analysis request.\n\n\
         DOCUMENT: {title} ({doc_type})\n\
         DETAILS: {summary}\n\n\
         FULL DOCUMENT CONTENT:\n{content}\n\n\
         USER REQUEST: \"{question}\"\n\n\
         Analyze the entire document above and answer based only on its content. \
         If the information is not in the document, state that clearly.",
        title = doc.title,
        doc_type = doc.doc_type,
        summary = doc.summary,
        content = doc.content,
    )
}
