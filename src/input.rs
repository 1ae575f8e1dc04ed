//! Loading documents, embeds and citations from JSON files or stdin.

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model::{BlockNode, Document};
use crate::render::Citation;
use crate::tree::EmbedsContent;

/// Where the document JSON comes from. Stdin is read eagerly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    File(PathBuf),
    Stdin(String),
}

impl InputSource {
    /// Display name for log lines and error messages.
    pub fn name(&self) -> String {
        match self {
            InputSource::File(path) => path.display().to_string(),
            InputSource::Stdin(_) => "<stdin>".to_string(),
        }
    }

    pub fn read(self) -> Result<String> {
        match self {
            InputSource::File(path) => read_file(&path),
            InputSource::Stdin(contents) => Ok(contents),
        }
    }
}

/// `-` reads stdin, so does a missing path when stdin is piped.
pub fn determine_input_source(path: Option<&str>) -> Result<InputSource> {
    match path {
        Some("-") => read_stdin(),
        Some(path) => Ok(InputSource::File(PathBuf::from(path))),
        None if !io::stdin().is_terminal() => read_stdin(),
        None => Err(Error::Stdin(io::Error::new(
            io::ErrorKind::InvalidInput,
            "no input file given and stdin is a terminal",
        ))),
    }
}

fn read_stdin() -> Result<InputSource> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(Error::Stdin)?;
    Ok(InputSource::Stdin(buffer))
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// A document file holds either a full document or just its block list.
#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentInput {
    Content(Vec<BlockNode>),
    Document(Document),
}

pub fn parse_document(json: &str) -> Result<Document> {
    let document = match serde_json::from_str(json)? {
        DocumentInput::Document(document) => document,
        DocumentInput::Content(content) => Document::new("", content),
    };
    tracing::debug!(
        id = %document.id,
        blocks = document.content.len(),
        "parsed document"
    );
    Ok(document)
}

pub fn load_document(source: InputSource) -> Result<Document> {
    let name = source.name();
    let json = source.read()?;
    parse_document(&json).inspect_err(|err| {
        tracing::warn!(input = %name, error = %err, "failed to parse document");
    })
}

/// JSON object mapping embed block ids to resolved entities.
pub fn load_embeds(path: &Path) -> Result<EmbedsContent> {
    let embeds: EmbedsContent = serde_json::from_str(&read_file(path)?)?;
    tracing::debug!(path = %path.display(), count = embeds.len(), "loaded embeds");
    Ok(embeds)
}

/// JSON array of citations pointing into the document.
pub fn load_citations(path: &Path) -> Result<Vec<Citation>> {
    let citations: Vec<Citation> = serde_json::from_str(&read_file(path)?)?;
    tracing::debug!(path = %path.display(), count = citations.len(), "loaded citations");
    Ok(citations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BlockKind;
    use serde_json::json;

    #[test]
    fn test_parse_full_document() {
        let json = json!({
            "id": "doc1",
            "version": "v1",
            "metadata": { "name": "Hello" },
            "content": [
                { "block": { "id": "b1", "type": "heading", "text": "Title" },
                  "children": [ { "block": { "id": "b2", "type": "paragraph", "text": "Body" } } ] }
            ],
            "editors": ["alice"]
        });
        let document = parse_document(&json.to_string()).unwrap();
        assert_eq!(document.id, "doc1");
        assert_eq!(document.title(), Some("Hello"));
        assert_eq!(document.content[0].block.kind, BlockKind::Heading);
        assert_eq!(document.content[0].child_nodes()[0].id(), "b2");
    }

    #[test]
    fn test_parse_bare_content() {
        let json = json!([
            { "block": { "id": "b1", "type": "paragraph", "text": "Only" } }
        ]);
        let document = parse_document(&json.to_string()).unwrap();
        assert_eq!(document.id, "");
        assert_eq!(document.content.len(), 1);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(parse_document("{ nope"), Err(Error::Json(_))));
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let doc_path = dir.path().join("doc.json");
        fs::write(&doc_path, json!({ "id": "d", "content": [] }).to_string()).unwrap();
        let document = load_document(InputSource::File(doc_path)).unwrap();
        assert_eq!(document.id, "d");

        let embeds_path = dir.path().join("embeds.json");
        fs::write(
            &embeds_path,
            json!({
                "e1": { "type": "document", "id": "hm://d/other", "document": { "id": "other" } }
            })
            .to_string(),
        )
        .unwrap();
        let embeds = load_embeds(&embeds_path).unwrap();
        assert_eq!(embeds["e1"].id().eid, "other");

        let citations_path = dir.path().join("citations.json");
        fs::write(
            &citations_path,
            json!([{ "source": "hm://d/src", "targetFragment": "b1" }]).to_string(),
        )
        .unwrap();
        let citations = load_citations(&citations_path).unwrap();
        assert_eq!(citations[0].target_fragment.as_deref(), Some("b1"));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_document(InputSource::File("/nonexistent/doc.json".into())).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/doc.json"));
    }

    #[test]
    fn test_stdin_source_name() {
        assert_eq!(InputSource::Stdin(String::new()).name(), "<stdin>");
    }
}
