//! File import: native GeoJSON handling with delegated fallback.
//!
//! Only `json`/`geojson` are interpreted here. Anything that fails to
//! parse as a feature collection, and the `kml`/`gpx` formats outright,
//! is handed to the external editor's own importer, which re-commits
//! through the normal edit path once it has parsed the file.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::bridge::MapEditor;
use crate::document::{Document, COLLECTION_KIND};
use crate::storage::StateStorage;
use crate::store::StateStore;

/// Extensions parsed by this core.
const NATIVE_EXTENSIONS: [&str; 2] = ["json", "geojson"];

/// Extensions accepted but handed to the external editor.
const DELEGATED_EXTENSIONS: [&str; 2] = ["kml", "gpx"];

/// How an accepted import was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The document was replaced from the file's feature collection.
    Replaced,
    /// The raw contents went to the external editor's importer.
    Delegated,
}

impl<S: StateStorage, E: MapEditor> StateStore<S, E> {
    /// Import a file, dispatching on its extension.
    pub fn import_file(&mut self, path: &Path) -> Result<ImportOutcome> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {path:?}"))?;
        self.import_contents(&contents, &extension)
    }

    /// Import already-read file contents. Unsupported extensions are
    /// rejected before any state is touched.
    pub fn import_contents(&mut self, contents: &str, extension: &str) -> Result<ImportOutcome> {
        let extension = extension.to_lowercase();
        if !NATIVE_EXTENSIONS.contains(&extension.as_str())
            && !DELEGATED_EXTENSIONS.contains(&extension.as_str())
        {
            bail!("unsupported file type {extension:?}, expected json, geojson, kml or gpx");
        }

        if NATIVE_EXTENSIONS.contains(&extension.as_str()) {
            match serde_json::from_str::<Value>(contents) {
                Ok(value)
                    if value.get("type").and_then(Value::as_str) == Some(COLLECTION_KIND) =>
                {
                    match Document::try_from_geojson(&value) {
                        Ok(document) => {
                            self.commit_imported(document);
                            return Ok(ImportOutcome::Replaced);
                        }
                        Err(error) => {
                            tracing::warn!(%error, "feature collection rejected, delegating import");
                        }
                    }
                }
                Ok(_) => {
                    tracing::warn!("imported JSON is not a feature collection, delegating");
                }
                Err(error) => {
                    tracing::warn!(%error, "imported file is not JSON, delegating");
                }
            }
        }

        self.delegate_to_editor(contents, &extension);
        Ok(ImportOutcome::Delegated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::RecordingEditor;
    use crate::storage::{MemoryStorage, STATE_KEY};
    use serde_json::json;
    use std::io::Write as _;

    fn fresh_store() -> StateStore<MemoryStorage, RecordingEditor> {
        StateStore::new(MemoryStorage::new(), RecordingEditor::default())
    }

    /// Storage double that counts writes.
    #[derive(Default)]
    struct CountingStorage {
        inner: MemoryStorage,
        writes: usize,
    }

    impl StateStorage for CountingStorage {
        fn read(&self, key: &str) -> Option<String> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<()> {
            self.writes += 1;
            self.inner.write(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    fn collection_with_one_point() -> String {
        json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [7.0, 46.0] },
                "properties": { "id": "imported", "type": "cafe" }
            }]
        })
        .to_string()
    }

    #[test]
    fn native_import_replaces_the_document_once() {
        let mut store = StateStore::new(CountingStorage::default(), RecordingEditor::default());

        let outcome = store
            .import_contents(&collection_with_one_point(), "geojson")
            .unwrap();

        assert_eq!(outcome, ImportOutcome::Replaced);
        assert!(store.document().feature_by_id("imported").is_some());
        // Exactly one history push and one persisted write.
        assert_eq!(store.undo_depth(), 1);
        assert_eq!(store.storage().writes, 1);
        assert!(store.storage().read(STATE_KEY).unwrap().contains("imported"));
        // The editor gets reloaded with the imported features.
        assert!(store.editor().calls.iter().any(|c| c == "load"));
    }

    #[test]
    fn import_is_case_insensitive_on_the_extension() {
        let mut store = fresh_store();
        let outcome = store
            .import_contents(&collection_with_one_point(), "GeoJSON")
            .unwrap();
        assert_eq!(outcome, ImportOutcome::Replaced);
    }

    #[test]
    fn wrong_discriminator_falls_back_to_delegation() {
        let mut store = fresh_store();
        let before = store.document();

        let outcome = store
            .import_contents("{\"type\":\"NotAFeatureCollection\"}", "json")
            .unwrap();

        assert_eq!(outcome, ImportOutcome::Delegated);
        assert_eq!(store.editor().delegated.len(), 1);
        assert!(std::sync::Arc::ptr_eq(&before, &store.document()));
        assert_eq!(store.undo_depth(), 0);
    }

    #[test]
    fn unparsable_json_falls_back_to_delegation() {
        let mut store = fresh_store();
        let outcome = store.import_contents("<gpx></gpx>", "json").unwrap();
        assert_eq!(outcome, ImportOutcome::Delegated);
    }

    #[test]
    fn bad_embedded_config_falls_back_to_delegation() {
        let mut store = fresh_store();
        let raw = json!({
            "type": "FeatureCollection",
            "features": [],
            "properties": { "waymark_config": 42 }
        })
        .to_string();

        let outcome = store.import_contents(&raw, "geojson").unwrap();
        assert_eq!(outcome, ImportOutcome::Delegated);
    }

    #[test]
    fn kml_and_gpx_are_delegated_directly() {
        let mut store = fresh_store();

        assert_eq!(
            store.import_contents("<kml/>", "kml").unwrap(),
            ImportOutcome::Delegated
        );
        assert_eq!(
            store.import_contents("<gpx/>", "gpx").unwrap(),
            ImportOutcome::Delegated
        );
        let extensions: Vec<&str> = store
            .editor()
            .delegated
            .iter()
            .map(|(_, e)| e.as_str())
            .collect();
        assert_eq!(extensions, vec!["kml", "gpx"]);
    }

    #[test]
    fn unsupported_extensions_are_rejected_with_no_state_change() {
        let mut store = fresh_store();
        let before = store.document();

        let result = store.import_contents("a,b,c", "csv");

        assert!(result.is_err());
        assert!(std::sync::Arc::ptr_eq(&before, &store.document()));
        assert!(store.editor().delegated.is_empty());
    }

    #[test]
    fn import_file_reads_and_dispatches_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trip.geojson");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(collection_with_one_point().as_bytes()).unwrap();

        let mut store = fresh_store();
        let outcome = store.import_file(&path).unwrap();

        assert_eq!(outcome, ImportOutcome::Replaced);
        assert!(store.document().feature_by_id("imported").is_some());
    }
}
