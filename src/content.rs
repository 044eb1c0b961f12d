//! Bundled learning-content document loader.
//!
//! Learning content does not live in the relational store: it ships as a
//! static JSON document with an ordered list of sections. Each section
//! becomes one index document whose `id` is its position in the list.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Result, SearchError};

/// The bundled learning-content document.
#[derive(Debug, Clone, Deserialize)]
pub struct LearningDocument {
    #[serde(default)]
    pub sections: Vec<LearningSection>,
}

/// One section of the learning document.
#[derive(Debug, Clone, Deserialize)]
pub struct LearningSection {
    pub title: String,
    /// Structured section body; serialized as-is into the index, never
    /// treated as rich text.
    #[serde(default)]
    pub content: serde_json::Value,
}

/// Read and parse the learning-content document from disk.
pub fn load_learning_document(path: &Path) -> Result<LearningDocument> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        SearchError::Store(format!(
            "failed to read learning content {}: {e}",
            path.display()
        ))
    })?;

    serde_json::from_str(&raw).map_err(|e| {
        SearchError::Store(format!(
            "failed to parse learning content {}: {e}",
            path.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sections":[{{"title":"Intro To Git!!","content":{{"blocks":["a"]}}}}]}}"#
        )
        .unwrap();

        let doc = load_learning_document(file.path()).unwrap();
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Intro To Git!!");
        assert_eq!(doc.sections[0].content["blocks"][0], "a");
    }

    #[test]
    fn test_missing_sections_defaults_empty() {
        let doc: LearningDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_missing_file_is_store_error() {
        let err = load_learning_document(Path::new("/nonexistent/learning.json")).unwrap_err();
        assert!(matches!(err, SearchError::Store(_)));
    }
}
