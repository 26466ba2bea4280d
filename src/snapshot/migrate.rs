//! Schema migration pipeline.
//!
//! An ordered table of pure `Value -> Value` transforms, one per schema
//! version. `migrate` rejects snapshots from the future, applies steps
//! until the target version is reached, and fails fatally on a gap.
//!
//! Each step re-normalizes the sections it touches via merge-with-defaults,
//! so an interrupted chain can be restarted from any intermediate version
//! without corrupting already-migrated sections. Steps may change data
//! *shape*, not just add fields - v2->v3 rebuilds the topology itself.

use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::info;

use super::CURRENT_SCHEMA_VERSION;
use crate::core::workspace::DEFAULT_ROW_COUNT;
use crate::error::Scope;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MigrateError {
    #[error("snapshot version {found} is newer than supported version {supported}")]
    FutureVersion { found: u32, supported: u32 },
    #[error("no migration registered for snapshot version {version}")]
    MissingStep { version: u32 },
    #[error("snapshot is not a JSON object")]
    NotAnObject,
    #[error("migration v{from}->v{to} failed: {reason}")]
    StepFailed { from: u32, to: u32, reason: String },
}

impl MigrateError {
    pub fn scope(&self) -> Scope {
        // Migration failures abort an import entirely; no partial load.
        Scope::Fatal
    }
}

type MigrationFn = fn(&mut Map<String, Value>) -> Result<(), String>;

/// The ordered migration table: index n holds the step from version n to
/// version n+1. The driver stamps the new version after each step.
fn migration_for(version: u32) -> Option<MigrationFn> {
    match version {
        1 => Some(migrate_v1_to_v2),
        2 => Some(migrate_v2_to_v3),
        3 => Some(migrate_v3_to_v4),
        4 => Some(migrate_v4_to_v5),
        5 => Some(migrate_v5_to_v6),
        _ => None,
    }
}

/// Upgrade `doc` to the current schema version.
pub fn migrate_to_current(doc: Value) -> Result<Value, MigrateError> {
    migrate(doc, CURRENT_SCHEMA_VERSION)
}

/// Upgrade `doc` to `target`, step by step.
pub fn migrate(doc: Value, target: u32) -> Result<Value, MigrateError> {
    let Value::Object(mut map) = doc else {
        return Err(MigrateError::NotAnObject);
    };

    let mut version = read_version(&map);
    if version > target {
        return Err(MigrateError::FutureVersion {
            found: version,
            supported: target,
        });
    }

    while version < target {
        let step = migration_for(version).ok_or(MigrateError::MissingStep { version })?;
        info!(from = version, to = version + 1, "migrating snapshot");
        step(&mut map).map_err(|reason| MigrateError::StepFailed {
            from: version,
            to: version + 1,
            reason,
        })?;
        version += 1;
        map.insert("schemaVersion".to_string(), json!(version));
    }

    Ok(Value::Object(map))
}

/// A snapshot with no version tag is treated as the earliest schema.
fn read_version(map: &Map<String, Value>) -> u32 {
    map.get("schemaVersion")
        .and_then(Value::as_u64)
        .map(|v| v as u32)
        .unwrap_or(1)
}

fn ensure_object<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
) -> &'a mut Map<String, Value> {
    if !map.get(key).is_some_and(Value::is_object) {
        map.insert(key.to_string(), json!({}));
    }
    map.get_mut(key)
        .and_then(Value::as_object_mut)
        .expect("just inserted an object")
}

/// v1 -> v2: selection and persistence sections become mandatory.
fn migrate_v1_to_v2(map: &mut Map<String, Value>) -> Result<(), String> {
    ensure_object(map, "selection");
    let persistence = ensure_object(map, "persistence");
    persistence.entry("dirty").or_insert(json!(false));
    Ok(())
}

/// v2 -> v3: topology reshape. Flat `tracks` (each a lane with a
/// row-indexed instance list) become the lane+grid+cell-map workspace.
fn migrate_v2_to_v3(map: &mut Map<String, Value>) -> Result<(), String> {
    let tracks = map.remove("tracks");

    if map.get("workspace").is_some_and(Value::is_object) {
        // Replay of an interrupted chain: the workspace already exists,
        // the legacy section (if any) is simply dropped.
        return Ok(());
    }

    let mut lanes = Vec::new();
    let mut cells = Map::new();
    let mut row_count = u64::from(DEFAULT_ROW_COUNT);

    if let Some(Value::Array(tracks)) = tracks {
        for track in tracks {
            let Value::Object(track) = track else {
                return Err("track entry is not an object".into());
            };
            let Some(lane_id) = track.get("id").and_then(Value::as_str) else {
                return Err("track entry has no id".into());
            };
            let name = track
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(lane_id);
            lanes.push(json!({ "id": lane_id, "name": name }));

            if let Some(Value::Array(slots)) = track.get("lenses") {
                row_count = row_count.max(slots.len() as u64);
                for (row, slot) in slots.iter().enumerate() {
                    if let Some(instance_id) = slot.as_str() {
                        cells.insert(format!("{lane_id}:{row}"), json!(instance_id));
                    }
                }
            }
        }
    }

    map.insert(
        "workspace".to_string(),
        json!({
            "lanes": lanes,
            "rowCount": row_count,
            "cells": cells,
        }),
    );
    Ok(())
}

/// v3 -> v4: lens instances gain explicit input wiring (pick, packaging),
/// and the legacy `pinnedDraft` key is renamed.
fn migrate_v3_to_v4(map: &mut Map<String, Value>) -> Result<(), String> {
    let lenses = ensure_object(map, "lenses");
    for instance in lenses.values_mut() {
        let Some(instance) = instance.as_object_mut() else {
            continue;
        };
        if !instance.get("input").is_some_and(Value::is_object) {
            instance.insert("input".to_string(), json!({}));
        }
        let input = instance
            .get_mut("input")
            .and_then(Value::as_object_mut)
            .expect("input section just ensured");
        if let Some(pinned) = input.remove("pinnedDraft") {
            input.entry("pinned").or_insert(pinned);
        }
        input.entry("mode").or_insert(json!("auto"));
        input.entry("pick").or_insert(json!("active"));
        input.entry("packaging").or_insert(json!("single"));
    }
    Ok(())
}

/// v4 -> v5: materials gain structured provenance, clips a duration.
fn migrate_v4_to_v5(map: &mut Map<String, Value>) -> Result<(), String> {
    if let Some(Value::Array(items)) = map.get_mut("inventory") {
        for item in items {
            let Some(item) = item.as_object_mut() else {
                continue;
            };
            if let Some(source) = item.remove("sourceDraft")
                && !item.get("provenance").is_some_and(Value::is_object)
            {
                item.insert(
                    "provenance".to_string(),
                    json!({ "sourceDraftId": source }),
                );
            }
        }
    }
    if let Some(Value::Array(clips)) = map.get_mut("desk") {
        for clip in clips {
            if let Some(clip) = clip.as_object_mut() {
                clip.entry("duration").or_insert(json!(1.0));
                clip.entry("start").or_insert(json!(0.0));
            }
        }
    }
    Ok(())
}

/// v5 -> v6: meta section becomes mandatory; derived-state sections that
/// older builds wrote by mistake are dropped for good.
fn migrate_v5_to_v6(map: &mut Map<String, Value>) -> Result<(), String> {
    let meta = ensure_object(map, "meta");
    meta.entry("updatedAt").or_insert(Value::Null);
    for legacy in ["drafts", "derived", "errors", "caches"] {
        map.remove(legacy);
    }
    Ok(())
}
