use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Filename recorded for documents submitted as pasted text.
pub const PASTED_TEXT_MARKER: &str = "Pasted Text";

/// Opaque identifier of the document a clause belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a document's text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum DocumentSource {
    File(String),
    Pasted,
}

impl DocumentSource {
    /// Filename for uploaded files, or the pasted-text marker.
    pub fn display_name(&self) -> &str {
        match self {
            Self::File(name) => name,
            Self::Pasted => PASTED_TEXT_MARKER,
        }
    }
}

/// A submitted document. The analyzer only reads `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub source: DocumentSource,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(id: DocumentId, source: DocumentSource, content: impl Into<String>) -> Self {
        Self {
            id,
            source,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasted_documents_use_marker_name() {
        let doc = Document::new(DocumentId(7), DocumentSource::Pasted, "text");
        assert_eq!(doc.source.display_name(), "Pasted Text");
        assert_eq!(doc.id.to_string(), "7");
    }

    #[test]
    fn content_length_counts_chars() {
        let doc = Document::new(
            DocumentId(1),
            DocumentSource::File("terms.txt".into()),
            "héllo",
        );
        assert_eq!(doc.content_length(), 5);
        assert_eq!(doc.source.display_name(), "terms.txt");
    }
}
