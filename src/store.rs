//! The state store: single owned register for the current document.
//!
//! All mutation is construct-then-swap. A new document is built in full,
//! then swapped in behind an `Arc`, so no reader ever observes a
//! half-applied change and pointer identity is a reliable change signal.
//! The swap observer pushes history and persists; it is suppressed while
//! an undo/redo snapshot is being restored so restoration never re-pushes
//! the entry it is consuming.

use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use crate::bridge::{feature_collection, redraw, MapEditor};
use crate::config::MapConfig;
use crate::document::Document;
use crate::geojson::Feature;
use crate::history::History;
use crate::storage::{StateStorage, STATE_KEY};

/// Owns the live document, its history and its persistence.
pub struct StateStore<S, E> {
    document: Arc<Document>,
    history: History,
    storage: S,
    editor: E,
    suppress_observer: bool,
}

impl<S: StateStorage, E: MapEditor> StateStore<S, E> {
    /// Rehydrate from storage (default empty document when the key is
    /// missing or corrupt), then hand the editor its configuration and
    /// any persisted features.
    pub fn new(storage: S, editor: E) -> Self {
        let document = match storage.read(STATE_KEY) {
            Some(raw) => Document::from_geojson_str(&raw),
            None => Document::default(),
        };
        let mut store = Self {
            document: Arc::new(document),
            history: History::new(),
            storage,
            editor,
            suppress_observer: false,
        };
        store.editor.init(store.document.config());
        if store.document.has_features() {
            store
                .editor
                .load(feature_collection(store.document.features()));
        }
        store
    }

    /// The current document. Callers clone what they need; replacement
    /// only ever happens through [`StateStore::commit`].
    pub fn document(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn editor(&self) -> &E {
        &self.editor
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    pub fn redo_depth(&self) -> usize {
        self.history.redo_depth()
    }

    /// Replace the live document. When the serialized content actually
    /// changed, the previous document goes onto the undo stack, the redo
    /// stack is invalidated and the new document is persisted. Identical
    /// content swaps the reference with no history or storage traffic.
    pub fn commit(&mut self, next: Document) {
        let next = Arc::new(next);
        let previous = std::mem::replace(&mut self.document, next);
        if self.suppress_observer {
            return;
        }
        let previous_json = previous.to_geojson();
        let next_json = self.document.to_geojson();
        if previous_json == next_json {
            return;
        }
        self.history.record_change(previous_json);
        self.persist(&next_json);
    }

    fn persist(&mut self, snapshot: &Value) {
        if let Err(error) = self.storage.write(STATE_KEY, &snapshot.to_string()) {
            tracing::warn!(%error, "state write failed, in-memory document stays authoritative");
        }
    }

    /// Edit-commit entry point for the external editor: the edited
    /// features with the current configuration carried over. No redraw,
    /// the editor is already showing the result.
    pub fn commit_edited_features(&mut self, features: Vec<Feature>) {
        let next = Document::new(features, self.document.config().clone());
        self.commit(next);
    }

    /// Restore the previous document. No-op when there is no history.
    pub fn undo(&mut self) {
        let current = self.document.to_geojson();
        let Some(snapshot) = self.history.undo(current) else {
            return;
        };
        self.restore(snapshot);
    }

    /// Restore the next document. No-op when nothing was undone.
    pub fn redo(&mut self) {
        let current = self.document.to_geojson();
        let Some(snapshot) = self.history.redo(current) else {
            return;
        };
        self.restore(snapshot);
    }

    fn restore(&mut self, snapshot: Value) {
        self.suppress_observer = true;
        self.commit(Document::from_geojson(&snapshot));
        self.suppress_observer = false;
        redraw(&mut self.editor, &self.document);
    }

    /// Drop all features, keeping the configuration. Refused when there
    /// is nothing to clear.
    pub fn clear(&mut self) -> Result<()> {
        if !self.document.has_features() {
            anyhow::bail!("no features to clear");
        }
        let next = Document::new(Vec::new(), self.document.config().clone());
        self.commit(next);
        redraw(&mut self.editor, &self.document);
        Ok(())
    }

    /// Swap in a new configuration, keeping the features.
    pub fn update_config(&mut self, config: impl Into<MapConfig>) {
        let next = Document::new(self.document.features().to_vec(), config.into());
        self.commit(next);
        redraw(&mut self.editor, &self.document);
    }

    /// Back to the built-in default configuration, keeping the features.
    pub fn reset_config(&mut self) {
        self.update_config(MapConfig::default());
    }

    /// Replace the document from an import and reload the editor.
    pub(crate) fn commit_imported(&mut self, next: Document) {
        self.commit(next);
        redraw(&mut self.editor, &self.document);
    }

    pub(crate) fn delegate_to_editor(&mut self, contents: &str, extension: &str) {
        self.editor.load_file_contents(contents, extension);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::RecordingEditor;
    use crate::document::{COLLECTION_KIND, EDITOR_CONFIG_KEY};
    use crate::geojson::Geometry;
    use crate::history::MAX_HISTORY;
    use crate::storage::MemoryStorage;
    use serde_json::{json, Map};

    fn feature(id: &str) -> Feature {
        let mut props = Map::new();
        props.insert("id".to_string(), json!(id));
        props.insert("type".to_string(), json!("cafe"));
        Feature::new(Geometry::Point { coordinates: json!([7.0, 46.0]) }, props)
    }

    fn fresh_store() -> StateStore<MemoryStorage, RecordingEditor> {
        StateStore::new(MemoryStorage::new(), RecordingEditor::default())
    }

    #[test]
    fn starts_empty_and_inits_the_editor() {
        let store = fresh_store();
        assert!(!store.document().has_features());
        assert!(!store.can_undo());
        assert_eq!(store.editor().calls, vec!["init"]);
    }

    #[test]
    fn rehydrates_persisted_state_without_pushing_history() {
        let mut storage = MemoryStorage::new();
        let mut doc = Document::default();
        doc.add_feature(feature("persisted"));
        storage
            .write(STATE_KEY, &doc.to_geojson().to_string())
            .unwrap();

        let store = StateStore::new(storage, RecordingEditor::default());
        assert!(store.document().feature_by_id("persisted").is_some());
        assert!(!store.can_undo());
        // Persisted features are handed straight to the editor.
        assert_eq!(store.editor().calls, vec!["init", "load"]);
    }

    #[test]
    fn corrupt_persisted_state_rehydrates_as_the_default_document() {
        let mut storage = MemoryStorage::new();
        storage.write(STATE_KEY, "{ not json at all").unwrap();

        let store = StateStore::new(storage, RecordingEditor::default());
        assert!(!store.document().has_features());
    }

    #[test]
    fn edit_commits_push_the_previous_document_and_persist() {
        let mut store = fresh_store();
        let before = store.document();

        store.commit_edited_features(vec![feature("a")]);

        assert_eq!(store.undo_depth(), 1);
        assert!(store.document().feature_by_id("a").is_some());
        // The snapshot on the stack is the pre-edit document.
        let persisted = store.storage.read(STATE_KEY).unwrap();
        assert!(persisted.contains("\"a\""));
        assert!(!Arc::ptr_eq(&before, &store.document()));
        // Edit commits do not redraw; the editor already shows the edit.
        assert_eq!(store.editor().calls, vec!["init"]);
    }

    #[test]
    fn identical_content_commits_are_silent() {
        let mut store = fresh_store();
        store.commit_edited_features(vec![feature("a")]);
        let depth = store.undo_depth();

        let same = (*store.document()).clone();
        store.commit(same);

        assert_eq!(store.undo_depth(), depth);
    }

    #[test]
    fn history_is_bounded_with_fifo_eviction() {
        let mut store = fresh_store();
        for n in 0..MAX_HISTORY + 5 {
            let features = (0..=n).map(|i| feature(&format!("f{i}"))).collect();
            store.commit_edited_features(features);
        }
        assert_eq!(store.undo_depth(), MAX_HISTORY);
    }

    #[test]
    fn undo_restores_and_redo_returns() {
        let mut store = fresh_store();
        store.commit_edited_features(vec![feature("a")]);
        store.commit_edited_features(vec![feature("a"), feature("b")]);

        store.undo();
        assert!(store.document().feature_by_id("b").is_none());
        assert!(store.can_redo());

        store.redo();
        assert!(store.document().feature_by_id("b").is_some());
        assert!(!store.can_redo());
    }

    #[test]
    fn undo_on_empty_history_is_a_noop() {
        let mut store = fresh_store();
        let before = store.document();
        store.undo();
        assert!(Arc::ptr_eq(&before, &store.document()));
        assert!(!store.can_redo());
    }

    #[test]
    fn restoring_does_not_push_history_and_redraws() {
        let mut store = fresh_store();
        store.commit_edited_features(vec![feature("a")]);
        assert_eq!(store.undo_depth(), 1);

        store.undo();

        // The restored snapshot was consumed, not re-pushed.
        assert_eq!(store.undo_depth(), 0);
        assert_eq!(store.redo_depth(), 1);
        assert!(store.editor().calls.iter().any(|c| c == "fit_bounds"));
        let loaded = store.editor().loaded.as_ref().unwrap();
        assert_eq!(loaded["type"], json!(COLLECTION_KIND));
        assert!(loaded.get("properties").is_none());
    }

    #[test]
    fn a_new_edit_after_undo_clears_the_redo_stack() {
        let mut store = fresh_store();
        store.commit_edited_features(vec![feature("a")]);
        store.undo();
        assert!(store.can_redo());

        store.commit_edited_features(vec![feature("c")]);
        assert!(!store.can_redo());
    }

    #[test]
    fn clear_keeps_the_config_and_is_refused_when_empty() {
        let mut store = fresh_store();
        assert!(store.clear().is_err());
        assert_eq!(store.undo_depth(), 0);

        store.commit_edited_features(vec![feature("a")]);
        let mut config = (*store.document()).config().clone();
        config.set_option("custom", json!(1));
        store.update_config(config);

        store.clear().unwrap();
        assert!(!store.document().has_features());
        assert_eq!(store.document().config_option("custom"), Some(json!(1)));
    }

    #[test]
    fn update_config_keeps_features_and_pushes_once() {
        let mut store = fresh_store();
        store.commit_edited_features(vec![feature("a")]);
        let depth = store.undo_depth();

        let mut config = (*store.document()).config().clone();
        config.set_option("show_scale", json!(true));
        store.update_config(config);

        assert_eq!(store.undo_depth(), depth + 1);
        assert!(store.document().feature_by_id("a").is_some());
        assert_eq!(store.document().config_option("show_scale"), Some(json!(true)));
        // Config replacements reload the editor.
        assert!(store.editor().calls.iter().any(|c| c == "clear"));
    }

    #[test]
    fn reset_config_returns_to_defaults() {
        let mut store = fresh_store();
        store.commit_edited_features(vec![feature("a")]);
        let mut config = (*store.document()).config().clone();
        config.set_option("custom", json!(1));
        store.update_config(config);

        store.reset_config();
        assert_eq!(store.document().config_option("custom"), None);
        assert!(store.document().feature_by_id("a").is_some());
    }

    #[test]
    fn persisted_snapshot_carries_the_editor_config_envelope() {
        let mut store = fresh_store();
        store.commit_edited_features(vec![feature("a")]);

        let raw = store.storage.read(STATE_KEY).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert!(value["properties"][EDITOR_CONFIG_KEY].is_object());
    }
}
