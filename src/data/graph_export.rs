//! Node/edge CSV exports
//!
//! Flattens Pokémon records and relation lists into the five tabular
//! artifacts consumed by the graph store: `pokemon_nodes.csv`,
//! `type_nodes.csv`, `has_type_edges.csv`, `evolutions_edges.csv`,
//! `type_relations_edges.csv`. Rows are deduplicated and sorted so
//! repeated exports are byte-identical.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// One evolution edge: `(Pokemon)-[:EVOLVES_TO]->(Pokemon)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct EvolutionEdge {
    pub source: String,
    pub target: String,
}

/// One type-relation edge: strong/weak matchup between two types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct TypeRelationEdge {
    pub source: String,
    pub relation: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
struct PokemonNodeRow {
    id: Option<i64>,
    name: String,
    species_name: Option<String>,
    height: Option<i64>,
    weight: Option<i64>,
    generation: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct HasTypeRow {
    pokemon: String,
    #[serde(rename = "type")]
    type_name: String,
}

fn string_field(doc: &Value, key: &str) -> Option<String> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn int_field(doc: &Value, key: &str) -> Option<i64> {
    doc.get(key).and_then(Value::as_i64)
}

/// Type names attached to one Pokémon record (`types[].type.name`).
fn type_names(doc: &Value) -> Vec<String> {
    doc.get("types")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| string_field(entry.get("type").unwrap_or(&Value::Null), "name"))
                .collect()
        })
        .unwrap_or_default()
}

/// Write `pokemon_nodes.csv`: one row per distinct Pokémon name, sorted by id.
pub fn export_pokemon_nodes(docs: &[Value], out_dir: &Path) -> Result<usize> {
    let mut seen = BTreeSet::new();
    let mut rows = Vec::new();

    for doc in docs {
        let Some(name) = string_field(doc, "name") else {
            continue;
        };
        if !seen.insert(name.clone()) {
            continue;
        }
        let species = doc.get("species").unwrap_or(&Value::Null);
        rows.push(PokemonNodeRow {
            id: int_field(doc, "id"),
            name,
            species_name: string_field(doc, "species_name"),
            height: int_field(doc, "height"),
            weight: int_field(doc, "weight"),
            generation: string_field(species, "generation"),
            description: string_field(species, "description"),
        });
    }
    // Missing ids sort last, matching the original export ordering.
    rows.sort_by_key(|row| (row.id.is_none(), row.id, row.name.clone()));

    let path = out_dir.join("pokemon_nodes.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    tracing::info!("pokemon_nodes.csv: {} nodes", rows.len());
    Ok(rows.len())
}

/// Write `type_nodes.csv`: every type name seen in records or relations.
pub fn export_type_nodes(
    docs: &[Value],
    relations: &[TypeRelationEdge],
    out_dir: &Path,
) -> Result<usize> {
    let mut names: BTreeSet<String> = BTreeSet::new();
    for doc in docs {
        names.extend(type_names(doc));
    }
    for relation in relations {
        names.insert(relation.source.trim().to_string());
        names.insert(relation.target.trim().to_string());
    }
    names.remove("");

    let path = out_dir.join("type_nodes.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["name"])?;
    for name in &names {
        writer.write_record([name])?;
    }
    writer.flush()?;

    tracing::info!("type_nodes.csv: {} nodes", names.len());
    Ok(names.len())
}

/// Write `has_type_edges.csv`: `(Pokemon)-[:HAS_TYPE]->(Type)`.
pub fn export_has_type_edges(docs: &[Value], out_dir: &Path) -> Result<usize> {
    let mut edges = BTreeSet::new();
    for doc in docs {
        let Some(name) = string_field(doc, "name") else {
            continue;
        };
        for type_name in type_names(doc) {
            edges.insert(HasTypeRow {
                pokemon: name.clone(),
                type_name,
            });
        }
    }

    let path = out_dir.join("has_type_edges.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for edge in &edges {
        writer.serialize(edge)?;
    }
    writer.flush()?;

    tracing::info!("has_type_edges.csv: {} edges", edges.len());
    Ok(edges.len())
}

/// Write `evolutions_edges.csv`: `(Pokemon)-[:EVOLVES_TO]->(Pokemon)`.
pub fn export_evolutions_edges(edges: &[EvolutionEdge], out_dir: &Path) -> Result<usize> {
    let deduped: BTreeSet<_> = edges
        .iter()
        .filter(|edge| !edge.source.trim().is_empty() && !edge.target.trim().is_empty())
        .cloned()
        .collect();

    let path = out_dir.join("evolutions_edges.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for edge in &deduped {
        writer.serialize(edge)?;
    }
    writer.flush()?;

    tracing::info!("evolutions_edges.csv: {} edges", deduped.len());
    Ok(deduped.len())
}

/// Write `type_relations_edges.csv`: strong/weak matchups between types.
pub fn export_type_relations_edges(edges: &[TypeRelationEdge], out_dir: &Path) -> Result<usize> {
    let deduped: BTreeSet<_> = edges
        .iter()
        .filter(|edge| {
            !edge.source.trim().is_empty()
                && !edge.relation.trim().is_empty()
                && !edge.target.trim().is_empty()
        })
        .cloned()
        .collect();

    let path = out_dir.join("type_relations_edges.csv");
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for edge in &deduped {
        writer.serialize(edge)?;
    }
    writer.flush()?;

    tracing::info!("type_relations_edges.csv: {} edges", deduped.len());
    Ok(deduped.len())
}

/// Run all five exports into `out_dir`, creating it if needed.
pub fn export_graph(
    docs: &[Value],
    evolutions: &[EvolutionEdge],
    relations: &[TypeRelationEdge],
    out_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    export_pokemon_nodes(docs, out_dir)?;
    export_type_nodes(docs, relations, out_dir)?;
    export_has_type_edges(docs, out_dir)?;
    export_evolutions_edges(evolutions, out_dir)?;
    export_type_relations_edges(relations, out_dir)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_docs() -> Vec<Value> {
        vec![
            json!({
                "id": 25,
                "name": "Pikachu",
                "species_name": "pikachu",
                "height": 4,
                "weight": 60,
                "species": {"generation": "generation-i", "description": "Mouse Pokémon."},
                "types": [{"type": {"name": "Electric"}}],
            }),
            json!({
                "id": 133,
                "name": "Eevee",
                "types": [{"type": {"name": "Normal"}}],
            }),
            // Duplicate name, dropped by dedup.
            json!({"id": 9925, "name": "Pikachu"}),
        ]
    }

    #[test]
    fn test_export_pokemon_nodes_dedup_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let count = export_pokemon_nodes(&sample_docs(), dir.path()).unwrap();
        assert_eq!(count, 2);

        let content = fs::read_to_string(dir.path().join("pokemon_nodes.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines[0].starts_with("id,name"));
        assert!(lines[1].starts_with("25,Pikachu"));
        assert!(lines[2].starts_with("133,Eevee"));
    }

    #[test]
    fn test_export_type_nodes_union() {
        let dir = tempfile::tempdir().unwrap();
        let relations = vec![TypeRelationEdge {
            source: "Water".to_string(),
            relation: "strong_against".to_string(),
            target: "Fire".to_string(),
        }];

        let count = export_type_nodes(&sample_docs(), &relations, dir.path()).unwrap();
        assert_eq!(count, 4); // Electric, Fire, Normal, Water

        let content = fs::read_to_string(dir.path().join("type_nodes.csv")).unwrap();
        assert_eq!(content.lines().nth(1), Some("Electric"));
    }

    #[test]
    fn test_export_edges() {
        let dir = tempfile::tempdir().unwrap();
        let evolutions = vec![
            EvolutionEdge {
                source: "Eevee".to_string(),
                target: "Vaporeon".to_string(),
            },
            EvolutionEdge {
                source: "Eevee".to_string(),
                target: "Vaporeon".to_string(),
            },
        ];

        assert_eq!(export_evolutions_edges(&evolutions, dir.path()).unwrap(), 1);
        assert_eq!(export_has_type_edges(&sample_docs(), dir.path()).unwrap(), 2);

        let content = fs::read_to_string(dir.path().join("has_type_edges.csv")).unwrap();
        assert!(content.contains("Pikachu,Electric"));
    }
}
