//! GeoJSON export with type-catalog pruning.
//!
//! The exported document is a clone of the live one, except each type
//! catalog keeps only the entries actually referenced by a feature of
//! the matching geometry family. Catalog entries are keyed by a slug of
//! their title; entries without a title never survive an export.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde_json::Value;

use crate::document::Document;
use crate::geojson::TypeFamily;

/// Normalized catalog key for a type title: lowercase, alphanumeric runs
/// kept, everything else collapsed to a single dash.
pub fn slug(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    out
}

/// Distinct `properties.type` values referenced by features of `family`.
fn used_types(document: &Document, family: TypeFamily) -> BTreeSet<String> {
    document
        .features()
        .iter()
        .filter(|f| f.family() == Some(family))
        .filter_map(|f| f.style_type())
        .map(str::to_string)
        .collect()
}

fn entry_slug(entry: &Value) -> Option<String> {
    entry.get("title").and_then(Value::as_str).map(slug)
}

/// Build the export document: the live document with every type catalog
/// filtered down to the entries in use. Fails when there is nothing to
/// export.
pub fn export_document(document: &Document) -> Result<Document> {
    if !document.has_features() {
        bail!("no features to export");
    }

    let mut export = document.clone();
    for family in TypeFamily::ALL {
        let used = used_types(document, family);
        let kept: Vec<Value> = document
            .type_catalog(family)
            .into_iter()
            .filter(|entry| entry_slug(entry).is_some_and(|s| used.contains(&s)))
            .collect();
        export.set_type_catalog(family, kept);
    }
    Ok(export)
}

/// Pretty-printed export content.
pub fn export_geojson(document: &Document) -> Result<String> {
    let export = export_document(document)?;
    serde_json::to_string_pretty(&export.to_geojson()).context("failed to serialize export")
}

/// Timestamp-derived download name.
pub fn export_filename(at: DateTime<Local>) -> String {
    format!("ogis-map-{}.geojson", at.format("%Y-%m-%d-%H-%M"))
}

/// Write the export into `dir` and return the written path.
pub fn export_to_dir(document: &Document, dir: &Path) -> Result<PathBuf> {
    let contents = export_geojson(document)?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
    let path = dir.join(export_filename(Local::now()));
    fs::write(&path, contents).with_context(|| format!("failed to write {path:?}"))?;
    Ok(path)
}
