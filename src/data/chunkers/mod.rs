//! Section-based chunking
//!
//! Splits documents into named, self-contained sections for indexing.
//! The deterministic chunker understands `## ` headings and `---`
//! separators; the LLM chunker asks a completion model to produce that
//! same format for unstructured text.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::data::{ChunkRecord, Document};
use crate::llm::CompletionModel;

/// Character cap on document text sent to the LLM chunker.
const MAX_PROMPT_DOCUMENT_CHARS: usize = 15_000;

/// Sampling temperature for the section-splitting call.
const CHUNKING_TEMPERATURE: f32 = 0.3;

const SECTION_PROMPT: &str = r#"You are a text analysis assistant.

Split the provided document into meaningful, logically consistent sections
for use in a question-answering or retrieval system.

Each section should:
- Cover one specific topic or idea.
- Be self-contained and coherent.
- Retain all relevant details (no summaries).
- Be clearly separated using '---' between sections.

<DOCUMENT>
{document}
</DOCUMENT>

Return the result using this format:

## Section Name

Section content...

---

## Another Section Name

Another section content...

---"#;

/// Trait for document chunking strategies.
pub trait Chunker {
    /// Split a document into chunk records.
    fn chunk(&self, document: &Document) -> Result<Vec<ChunkRecord>>;
}

/// A named section of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    text: String,
}

/// Parse sectioned text: `## ` lines open a section, `---` lines close one.
///
/// Text before any heading becomes an unnamed leading section. Sections
/// with empty bodies are dropped.
fn parse_sections(text: &str) -> Vec<Section> {
    fn flush(sections: &mut Vec<Section>, name: &mut Option<String>, body: &mut String) {
        let text = body.trim().to_string();
        if !text.is_empty() {
            let fallback = format!("Section {}", sections.len() + 1);
            sections.push(Section {
                name: name.take().unwrap_or(fallback),
                text,
            });
        }
        *name = None;
        body.clear();
    }

    let mut sections = Vec::new();
    let mut name: Option<String> = None;
    let mut body = String::new();

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == "---" {
            flush(&mut sections, &mut name, &mut body);
        } else if let Some(heading) = trimmed.strip_prefix("## ") {
            flush(&mut sections, &mut name, &mut body);
            name = Some(heading.trim().to_string());
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }
    flush(&mut sections, &mut name, &mut body);

    sections
}

fn to_records(document: &Document, sections: Vec<Section>) -> Vec<ChunkRecord> {
    sections
        .into_iter()
        .enumerate()
        .map(|(i, section)| ChunkRecord {
            chunk_id: format!("{}_chunk_{}", document.name, i + 1),
            document_name: document.name.clone(),
            chunk_index: i + 1,
            section_name: section.name,
            text: section.text,
        })
        .collect()
}

/// Deterministic chunker for documents already carrying section markers.
#[derive(Debug, Default)]
pub struct SectionChunker;

impl SectionChunker {
    /// Create a new section chunker.
    pub fn new() -> Self {
        Self
    }
}

impl Chunker for SectionChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<ChunkRecord>> {
        Ok(to_records(document, parse_sections(&document.content)))
    }
}

/// LLM-assisted chunker for unstructured text.
///
/// Asks the completion model to rewrite the document into the marker
/// format understood by [`SectionChunker`], then parses that output.
pub struct LlmSectionChunker {
    model: Arc<dyn CompletionModel>,
}

impl LlmSectionChunker {
    /// Create a new LLM chunker over the given completion model.
    pub fn new(model: Arc<dyn CompletionModel>) -> Self {
        Self { model }
    }
}

impl Chunker for LlmSectionChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<ChunkRecord>> {
        let truncated: String = document
            .content
            .chars()
            .take(MAX_PROMPT_DOCUMENT_CHARS)
            .collect();
        let prompt = SECTION_PROMPT.replace("{document}", &truncated);

        let response = self
            .model
            .complete(&prompt, CHUNKING_TEMPERATURE)
            .with_context(|| format!("Section-splitting call failed for '{}'", document.name))?;

        let sections = parse_sections(&response);
        if sections.is_empty() {
            anyhow::bail!(
                "Model returned no sections for document '{}'",
                document.name
            );
        }

        tracing::debug!(
            "LLM chunker produced {} sections for '{}'",
            sections.len(),
            document.name
        );
        Ok(to_records(document, sections))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections_headings_and_separators() {
        let text = "## Evolutions\n\nEevee evolves into Vaporeon.\n\n---\n\n## Habitat\n\nUrban areas.\n\n---\n";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "Evolutions");
        assert_eq!(sections[0].text, "Eevee evolves into Vaporeon.");
        assert_eq!(sections[1].name, "Habitat");
    }

    #[test]
    fn test_parse_sections_unnamed_leading_text() {
        let text = "Intro paragraph.\n\n## Details\n\nBody.\n";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].name, "Section 1");
        assert_eq!(sections[1].name, "Details");
    }

    #[test]
    fn test_parse_sections_drops_empty_bodies() {
        let text = "## Empty\n\n---\n\n## Full\n\ncontent\n";
        let sections = parse_sections(text);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Full");
    }

    #[test]
    fn test_section_chunker_record_ids() {
        let document = Document::new("pikachu", "## Stats\n\nFast.\n\n---\n\n## Moves\n\nThunderbolt.\n");
        let records = SectionChunker::new().chunk(&document).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].chunk_id, "pikachu_chunk_1");
        assert_eq!(records[0].chunk_index, 1);
        assert_eq!(records[1].chunk_id, "pikachu_chunk_2");
        assert_eq!(records[1].document_name, "pikachu");
    }

    struct FixedModel(String);

    impl CompletionModel for FixedModel {
        fn complete(&self, _prompt: &str, _temperature: f32) -> Result<String> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_llm_chunker_parses_model_output() {
        let model = Arc::new(FixedModel(
            "## Overview\n\nEevee is adaptable.\n\n---\n".to_string(),
        ));
        let chunker = LlmSectionChunker::new(model);
        let document = Document::new("eevee", "raw unstructured text");

        let records = chunker.chunk(&document).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].section_name, "Overview");
    }

    #[test]
    fn test_llm_chunker_rejects_empty_output() {
        let model = Arc::new(FixedModel("   \n".to_string()));
        let chunker = LlmSectionChunker::new(model);
        let document = Document::new("eevee", "text");

        assert!(chunker.chunk(&document).is_err());
    }
}
