//! Documents and chunk artifacts
//!
//! Defines the source document type, the line-delimited JSON chunk record
//! consumed by the vector index, and the loaders that move both through
//! the filesystem.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub mod chunkers;
pub mod graph_export;

pub use chunkers::{Chunker, LlmSectionChunker, SectionChunker};

/// A source document prior to chunking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Document name, derived from the file stem.
    pub name: String,
    /// Full text content.
    pub content: String,
}

impl Document {
    /// Create a new document.
    pub fn new(name: &str, content: &str) -> Self {
        Self {
            name: name.to_string(),
            content: content.to_string(),
        }
    }
}

/// One chunk record as persisted in the JSONL artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique chunk identifier (`{document}_chunk_{n}`).
    pub chunk_id: String,
    /// Name of the source document.
    pub document_name: String,
    /// 1-based index of the chunk within its document.
    pub chunk_index: usize,
    /// Section heading assigned by the chunker.
    pub section_name: String,
    /// Chunk text content.
    pub text: String,
}

/// Load a single `.txt` file as a document named after its stem.
pub fn load_text_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document: {}", path.display()))?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .context("Document path has no file stem")?;

    Ok(Document::new(name, &content))
}

/// Load all `.txt` files in a directory, sorted by name for determinism.
pub fn load_text_documents(dir: &Path) -> Result<Vec<Document>> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    paths.iter().map(|path| load_text_document(path)).collect()
}

/// Load chunk records from a JSONL file, skipping blank lines.
pub fn load_chunks(path: &Path) -> Result<Vec<ChunkRecord>> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open chunks file: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: ChunkRecord = serde_json::from_str(&line)
            .with_context(|| format!("Invalid chunk record at line {}", line_no + 1))?;
        records.push(record);
    }

    tracing::debug!("Loaded {} chunk records from {}", records.len(), path.display());
    Ok(records)
}

/// Write chunk records as one JSON object per line.
pub fn save_chunks(records: &[ChunkRecord], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create chunks file: {}", path.display()))?;
    for record in records {
        serde_json::to_writer(&mut file, record)?;
        writeln!(file)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<ChunkRecord> {
        vec![
            ChunkRecord {
                chunk_id: "eevee_chunk_1".to_string(),
                document_name: "eevee".to_string(),
                chunk_index: 1,
                section_name: "Evolutions".to_string(),
                text: "Eevee evolves into Vaporeon with a Water Stone.".to_string(),
            },
            ChunkRecord {
                chunk_id: "eevee_chunk_2".to_string(),
                document_name: "eevee".to_string(),
                chunk_index: 2,
                section_name: "Habitat".to_string(),
                text: "Eevee is commonly found in urban areas.".to_string(),
            },
        ]
    }

    #[test]
    fn test_chunks_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");

        save_chunks(&sample_records(), &path).unwrap();
        let loaded = load_chunks(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].chunk_id, "eevee_chunk_1");
        assert_eq!(loaded[1].section_name, "Habitat");
    }

    #[test]
    fn test_load_chunks_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunks.jsonl");
        let record = serde_json::to_string(&sample_records()[0]).unwrap();
        fs::write(&path, format!("{record}\n\n")).unwrap();

        let loaded = load_chunks(&path).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_load_text_documents_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "second").unwrap();
        fs::write(dir.path().join("a.txt"), "first").unwrap();
        fs::write(dir.path().join("ignored.json"), "{}").unwrap();

        let docs = load_text_documents(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].name, "a");
        assert_eq!(docs[1].name, "b");
    }
}
