//! Graph store for relational traversals
//!
//! Answers one-hop traversals over a closed relationship set. Start nodes
//! match case-insensitively; traversals that yield no targets produce no
//! record at all rather than an empty one.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::router::Intent;

/// Closed set of edge labels in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Relationship {
    /// `(Pokemon)-[:EVOLVES_TO]->(Pokemon)`
    EvolvesTo,
    /// `(Type)-[:STRONG_AGAINST]->(Type)`
    StrongAgainst,
    /// `(Type)-[:WEAK_AGAINST]->(Type)`
    WeakAgainst,
    /// `(Pokemon)-[:HAS_TYPE]->(Type)`
    HasType,
}

impl Relationship {
    /// Edge label as stored in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::EvolvesTo => "EVOLVES_TO",
            Relationship::StrongAgainst => "STRONG_AGAINST",
            Relationship::WeakAgainst => "WEAK_AGAINST",
            Relationship::HasType => "HAS_TYPE",
        }
    }

    /// Map an intent attribute to its traversal, if any. Attributes with
    /// no graph counterpart (factual ones, or unknown keywords) map to
    /// `None` and are skipped by the caller.
    pub fn from_attribute(attribute: &str) -> Option<Self> {
        match attribute {
            "evolves_to" => Some(Relationship::EvolvesTo),
            "strong_against" => Some(Relationship::StrongAgainst),
            "weak_against" => Some(Relationship::WeakAgainst),
            "has_type" => Some(Relationship::HasType),
            _ => None,
        }
    }
}

/// Traversal seam over the knowledge graph.
pub trait GraphStore: Send + Sync {
    /// All targets one hop from `start` along `relationship`. The start
    /// node matches case-insensitively; unknown nodes yield an empty list.
    fn traverse(&self, start: &str, relationship: Relationship) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct SourceTargetRow {
    source: String,
    target: String,
}

#[derive(Debug, Deserialize)]
struct TypeRelationRow {
    source: String,
    relation: String,
    target: String,
}

#[derive(Debug, Deserialize)]
struct HasTypeRow {
    pokemon: String,
    #[serde(rename = "type")]
    type_name: String,
}

/// In-memory graph store loaded from the exported edge CSVs.
pub struct CsvGraphStore {
    /// Adjacency per relationship, keyed by lowercased start node.
    edges: HashMap<Relationship, HashMap<String, Vec<String>>>,
}

impl CsvGraphStore {
    /// Load a store from a directory holding `evolutions_edges.csv`,
    /// `type_relations_edges.csv`, and `has_type_edges.csv`. Missing
    /// files leave their relationship empty.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut store = Self {
            edges: HashMap::new(),
        };

        let evolutions = dir.join("evolutions_edges.csv");
        if evolutions.is_file() {
            let mut reader = csv::Reader::from_path(&evolutions)
                .with_context(|| format!("Failed to open {}", evolutions.display()))?;
            for row in reader.deserialize::<SourceTargetRow>() {
                let row = row.context("Invalid evolution edge row")?;
                store.insert(Relationship::EvolvesTo, &row.source, row.target);
            }
        } else {
            tracing::debug!("No evolutions_edges.csv in {}", dir.display());
        }

        let relations = dir.join("type_relations_edges.csv");
        if relations.is_file() {
            let mut reader = csv::Reader::from_path(&relations)
                .with_context(|| format!("Failed to open {}", relations.display()))?;
            for row in reader.deserialize::<TypeRelationRow>() {
                let row = row.context("Invalid type relation row")?;
                match Relationship::from_attribute(&row.relation.to_lowercase()) {
                    Some(relationship) => store.insert(relationship, &row.source, row.target),
                    None => tracing::warn!("Unknown relation label {:?}, skipping", row.relation),
                }
            }
        } else {
            tracing::debug!("No type_relations_edges.csv in {}", dir.display());
        }

        let has_type = dir.join("has_type_edges.csv");
        if has_type.is_file() {
            let mut reader = csv::Reader::from_path(&has_type)
                .with_context(|| format!("Failed to open {}", has_type.display()))?;
            for row in reader.deserialize::<HasTypeRow>() {
                let row = row.context("Invalid has-type edge row")?;
                store.insert(Relationship::HasType, &row.pokemon, row.type_name);
            }
        } else {
            tracing::debug!("No has_type_edges.csv in {}", dir.display());
        }

        let total: usize = store
            .edges
            .values()
            .flat_map(|adjacency| adjacency.values())
            .map(Vec::len)
            .sum();
        tracing::info!("Graph store loaded: {total} edges from {}", dir.display());

        Ok(store)
    }

    /// Build a store directly from edge triples. Used by tests and the
    /// in-process pipeline assembly.
    pub fn from_edges(triples: Vec<(String, Relationship, String)>) -> Self {
        let mut store = Self {
            edges: HashMap::new(),
        };
        for (source, relationship, target) in triples {
            store.insert(relationship, &source, target);
        }
        store
    }

    fn insert(&mut self, relationship: Relationship, source: &str, target: String) {
        self.edges
            .entry(relationship)
            .or_default()
            .entry(source.trim().to_lowercase())
            .or_default()
            .push(target.trim().to_string());
    }
}

impl GraphStore for CsvGraphStore {
    fn traverse(&self, start: &str, relationship: Relationship) -> Result<Vec<String>> {
        Ok(self
            .edges
            .get(&relationship)
            .and_then(|adjacency| adjacency.get(&start.trim().to_lowercase()))
            .cloned()
            .unwrap_or_default())
    }
}

/// Traversal result for one entity and relationship.
#[derive(Debug, Clone, Serialize)]
pub struct RelationRecord {
    /// Entity the traversal started from.
    pub entity: String,
    /// Attribute keyword the traversal answered (e.g. `evolves_to`).
    pub relation: String,
    /// Target node names, never empty.
    pub targets: Vec<String>,
}

/// Answer a relational intent against the graph store.
///
/// One traversal per recognized attribute. Attributes without a graph
/// counterpart are skipped, and traversals with no targets are omitted
/// from the result entirely.
pub fn lookup_relational(store: &dyn GraphStore, intent: &Intent) -> Result<Vec<RelationRecord>> {
    let Some(entity) = intent.entity.as_deref() else {
        tracing::debug!("Relational intent without entity, skipping");
        return Ok(Vec::new());
    };

    let mut records = Vec::new();
    for attribute in &intent.attributes {
        let Some(relationship) = Relationship::from_attribute(attribute) else {
            tracing::debug!("Attribute {attribute:?} has no traversal, skipping");
            continue;
        };

        let targets = store.traverse(entity, relationship)?;
        tracing::debug!(
            "{entity} -[{}]-> {} target(s)",
            relationship.as_str(),
            targets.len()
        );
        if targets.is_empty() {
            continue;
        }

        records.push(RelationRecord {
            entity: entity.to_string(),
            relation: attribute.clone(),
            targets,
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::IntentKind;
    use std::fs;

    fn relational_intent(entity: Option<&str>, attributes: &[&str]) -> Intent {
        Intent {
            kind: IntentKind::Relational,
            entity: entity.map(String::from),
            attributes: attributes.iter().map(|a| a.to_string()).collect(),
            confidence: 0.9,
        }
    }

    fn sample_store() -> CsvGraphStore {
        CsvGraphStore::from_edges(vec![
            (
                "Eevee".to_string(),
                Relationship::EvolvesTo,
                "Vaporeon".to_string(),
            ),
            (
                "Eevee".to_string(),
                Relationship::EvolvesTo,
                "Jolteon".to_string(),
            ),
            (
                "Water".to_string(),
                Relationship::StrongAgainst,
                "Fire".to_string(),
            ),
            (
                "Pikachu".to_string(),
                Relationship::HasType,
                "Electric".to_string(),
            ),
        ])
    }

    #[test]
    fn test_traverse_case_insensitive() {
        let store = sample_store();

        let targets = store.traverse("eevee", Relationship::EvolvesTo).unwrap();
        assert_eq!(targets, vec!["Vaporeon", "Jolteon"]);

        let targets = store.traverse("EEVEE", Relationship::EvolvesTo).unwrap();
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_lookup_relational_eevee_evolutions() {
        let store = sample_store();
        let intent = relational_intent(Some("Eevee"), &["evolves_to"]);

        let records = lookup_relational(&store, &intent).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].entity, "Eevee");
        assert_eq!(records[0].relation, "evolves_to");
        assert!(records[0].targets.contains(&"Vaporeon".to_string()));
    }

    #[test]
    fn test_empty_traversal_omitted() {
        let store = sample_store();
        // Pikachu has no evolution edge here; Water has a matchup edge.
        let intent = relational_intent(Some("Pikachu"), &["evolves_to", "has_type"]);

        let records = lookup_relational(&store, &intent).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].relation, "has_type");
    }

    #[test]
    fn test_unknown_attribute_and_missing_entity() {
        let store = sample_store();

        let unknown = relational_intent(Some("Eevee"), &["favorite_color"]);
        assert!(lookup_relational(&store, &unknown).unwrap().is_empty());

        let no_entity = relational_intent(None, &["evolves_to"]);
        assert!(lookup_relational(&store, &no_entity).unwrap().is_empty());
    }

    #[test]
    fn test_load_from_exported_csvs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("evolutions_edges.csv"),
            "source,target\nEevee,Vaporeon\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("type_relations_edges.csv"),
            "source,relation,target\nWater,strong_against,Fire\nFire,weak_against,Water\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("has_type_edges.csv"),
            "pokemon,type\nPikachu,Electric\n",
        )
        .unwrap();

        let store = CsvGraphStore::load(dir.path()).unwrap();

        assert_eq!(
            store.traverse("Eevee", Relationship::EvolvesTo).unwrap(),
            vec!["Vaporeon"]
        );
        assert_eq!(
            store.traverse("water", Relationship::StrongAgainst).unwrap(),
            vec!["Fire"]
        );
        assert_eq!(
            store.traverse("Fire", Relationship::WeakAgainst).unwrap(),
            vec!["Water"]
        );
        assert_eq!(
            store.traverse("Pikachu", Relationship::HasType).unwrap(),
            vec!["Electric"]
        );
    }

    #[test]
    fn test_load_missing_files_leaves_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvGraphStore::load(dir.path()).unwrap();
        assert!(store
            .traverse("Eevee", Relationship::EvolvesTo)
            .unwrap()
            .is_empty());
    }
}
