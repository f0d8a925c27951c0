//! Document store for factual attribute lookups
//!
//! Entities are matched by exact name, case-insensitively. Each requested
//! attribute projects a known document field; unrecognized attributes are
//! skipped, and an empty projection falls back to a default field set.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::router::Intent;

/// Lookup seam over the entity document collection.
pub trait DocumentStore: Send + Sync {
    /// Fetch the document whose `name` field equals `name`,
    /// case-insensitively. Returns `None` when no entity matches.
    fn find_one(&self, name: &str) -> Result<Option<Map<String, Value>>>;
}

/// In-memory document store loaded from a JSON array or JSONL file.
pub struct JsonDocumentStore {
    /// Documents keyed by lowercased entity name.
    documents: HashMap<String, Map<String, Value>>,
}

impl JsonDocumentStore {
    /// Build a store from already-parsed documents. Entries without a
    /// string `name` field are dropped with a warning.
    pub fn from_documents(documents: Vec<Value>) -> Self {
        let mut by_name = HashMap::new();
        for value in documents {
            let Value::Object(doc) = value else {
                tracing::warn!("Skipping non-object document");
                continue;
            };
            match doc.get("name").and_then(Value::as_str) {
                Some(name) => {
                    by_name.insert(name.to_lowercase(), doc);
                }
                None => tracing::warn!("Skipping document without a name field"),
            }
        }
        tracing::debug!("Document store loaded: {} entities", by_name.len());
        Self { documents: by_name }
    }

    /// Load a store from a `.json` array or a `.jsonl` file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read document file: {}", path.display()))?;

        let documents = if path.extension().and_then(|ext| ext.to_str()) == Some("jsonl") {
            raw.lines()
                .filter(|line| !line.trim().is_empty())
                .map(|line| {
                    serde_json::from_str(line)
                        .with_context(|| format!("Invalid JSON line in {}", path.display()))
                })
                .collect::<Result<Vec<Value>>>()?
        } else {
            serde_json::from_str::<Vec<Value>>(&raw)
                .with_context(|| format!("Invalid JSON array in {}", path.display()))?
        };

        Ok(Self::from_documents(documents))
    }
}

impl DocumentStore for JsonDocumentStore {
    fn find_one(&self, name: &str) -> Result<Option<Map<String, Value>>> {
        Ok(self.documents.get(&name.to_lowercase()).cloned())
    }
}

/// Projected factual evidence for one entity.
#[derive(Debug, Clone, Serialize)]
pub struct FactualRecord {
    /// Entity name as stored in the document.
    pub entity: String,
    /// Requested attributes mapped to their stored values.
    pub attributes: Map<String, Value>,
}

/// Fields returned when no requested attribute projects anything.
const DEFAULT_PROJECTION: [(&str, &str); 4] = [
    ("type", "types"),
    ("abilities", "abilities"),
    ("category", "category"),
    ("description", "description"),
];

/// Map an intent attribute to the document field it projects.
/// `relation` is graph territory and projects nothing here.
fn projected_field(attribute: &str) -> Option<(&'static str, &'static str)> {
    match attribute {
        "type" => Some(("type", "types")),
        "ability" => Some(("abilities", "abilities")),
        "stat" => Some(("stats", "stats")),
        "category" => Some(("category", "category")),
        _ => None,
    }
}

/// Answer a factual intent against the document store.
///
/// Returns `None` when the intent names no entity or the entity is not
/// stored. Unrecognized attributes are skipped; when nothing projects,
/// the default field set is returned instead.
pub fn lookup_factual(
    store: &dyn DocumentStore,
    intent: &Intent,
) -> Result<Option<FactualRecord>> {
    let Some(entity) = intent.entity.as_deref() else {
        tracing::debug!("Factual intent without entity, skipping");
        return Ok(None);
    };

    let Some(doc) = store.find_one(entity)? else {
        tracing::debug!("No document for entity {entity:?}");
        return Ok(None);
    };

    let mut attributes = Map::new();
    for attribute in &intent.attributes {
        match projected_field(attribute) {
            Some((key, field)) => {
                if let Some(value) = doc.get(field) {
                    attributes.insert(key.to_string(), value.clone());
                }
            }
            None => tracing::debug!("Attribute {attribute:?} not projectable, skipping"),
        }
    }

    if attributes.is_empty() {
        for (key, field) in DEFAULT_PROJECTION {
            if let Some(value) = doc.get(field) {
                attributes.insert(key.to_string(), value.clone());
            }
        }
    }

    let entity = doc
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or(entity)
        .to_string();

    Ok(Some(FactualRecord { entity, attributes }))
}
