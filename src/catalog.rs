//! The stream catalog: an ordered, read-only registry of court streams.
//!
//! Loaded once at startup from the bundled `catalog.json` or from a file the
//! user points at. Insertion order is meaningful (default entry, route order),
//! so every sorted view is a fresh copy.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::constants::constants;
use crate::error::MalformedCatalogError;

/// How an entry is played back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StreamKind {
  /// Provider-hosted video, played through its embed page.
  #[serde(alias = "youtube")]
  EmbeddedVideo,
  /// Direct media URL (HLS, MP4, ...) handed to a generic player.
  #[serde(alias = "clappr")]
  GenericMedia,
  /// A still image that the camera keeps overwriting.
  ImageFeed,
}

impl StreamKind {
  pub fn label(self) -> &'static str {
    match self {
      StreamKind::EmbeddedVideo => "embedded-video",
      StreamKind::GenericMedia => "generic-media",
      StreamKind::ImageFeed => "image-feed",
    }
  }
}

impl fmt::Display for StreamKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// One record as it appears in a catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
  pub id: i64,
  #[serde(rename = "type")]
  pub kind: StreamKind,
  #[serde(default, alias = "videoId", alias = "url")]
  pub media_ref: Option<String>,
  #[serde(default)]
  pub title: Option<String>,
  #[serde(default)]
  pub thumbnail_override: Option<String>,
}

/// A validated catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
  pub id: i64,
  pub kind: StreamKind,
  /// Provider video id for embedded video, a direct URL otherwise.
  pub media_ref: String,
  pub title: Option<String>,
  pub thumbnail_override: Option<String>,
}

impl StreamEntry {
  /// Display label: the title, or "Quadra {id}" when there is none.
  pub fn label(&self) -> String {
    match self.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
      Some(title) => title.to_string(),
      None => format!("{} {}", constants().entry_label, self.id),
    }
  }
}

/// Table layout of a catalog file. JSON files may also be a bare list of records.
#[derive(Deserialize)]
struct CatalogTable {
  #[serde(default, rename = "defaultId")]
  default_id: Option<i64>,
  streams: Vec<CatalogRecord>,
}

fn parse_error(e: impl std::fmt::Display) -> MalformedCatalogError {
  MalformedCatalogError::Parse(e.to_string())
}

#[derive(Debug)]
pub struct Catalog {
  entries: Vec<StreamEntry>,
  index: HashMap<i64, usize>,
  default_id: Option<i64>,
}

impl Catalog {
  /// Validate raw records into a catalog.
  pub fn load(records: Vec<CatalogRecord>, default_id: Option<i64>) -> Result<Self, MalformedCatalogError> {
    let mut entries = Vec::with_capacity(records.len());
    let mut index = HashMap::with_capacity(records.len());

    for record in records {
      if index.contains_key(&record.id) {
        return Err(MalformedCatalogError::DuplicateId(record.id));
      }
      let media_ref = record
        .media_ref
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(MalformedCatalogError::MissingField { id: record.id, kind: record.kind, field: "mediaRef" })?;

      index.insert(record.id, entries.len());
      entries.push(StreamEntry {
        id: record.id,
        kind: record.kind,
        media_ref,
        title: record.title,
        thumbnail_override: record.thumbnail_override.filter(|s| !s.trim().is_empty()),
      });
    }

    if let Some(id) = default_id
      && !index.contains_key(&id)
    {
      return Err(MalformedCatalogError::UnknownDefault(id));
    }

    Ok(Self { entries, index, default_id })
  }

  /// The layout is picked from the first token, so a parse error names the failing field.
  pub fn from_json_str(source: &str) -> Result<Self, MalformedCatalogError> {
    if source.trim_start().starts_with('[') {
      let records: Vec<CatalogRecord> = serde_json::from_str(source).map_err(parse_error)?;
      Self::load(records, None)
    } else {
      let table: CatalogTable = serde_json::from_str(source).map_err(parse_error)?;
      Self::load(table.streams, table.default_id)
    }
  }

  pub fn from_toml_str(source: &str) -> Result<Self, MalformedCatalogError> {
    let table: CatalogTable = toml::from_str(source).map_err(parse_error)?;
    Self::load(table.streams, table.default_id)
  }

  /// Load a catalog file; `.toml` files are parsed as TOML, anything else as JSON.
  pub fn from_path(path: &Path) -> Result<Self> {
    let content =
      std::fs::read_to_string(path).with_context(|| format!("Failed to read catalog {}", path.display()))?;
    let is_toml = path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("toml"));
    let catalog = if is_toml { Self::from_toml_str(&content) } else { Self::from_json_str(&content) };
    catalog.with_context(|| format!("Malformed catalog {}", path.display()))
  }

  /// The catalog shipped inside the binary.
  pub fn bundled() -> Result<Self, MalformedCatalogError> {
    Self::from_json_str(include_str!("../catalog.json"))
  }

  pub fn get(&self, id: i64) -> Option<&StreamEntry> {
    self.index.get(&id).and_then(|&i| self.entries.get(i))
  }

  /// Entries in insertion order.
  pub fn entries(&self) -> &[StreamEntry] {
    &self.entries
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// The designated default if the catalog names one, else the first entry.
  pub fn default_entry(&self) -> Option<&StreamEntry> {
    self.default_id.and_then(|id| self.get(id)).or_else(|| self.entries.first())
  }

  /// A freshly sorted copy, ascending by id.
  pub fn list_ordered(&self) -> Vec<StreamEntry> {
    self.list_ordered_by(|a, b| a.id.cmp(&b.id))
  }

  /// A freshly sorted copy using `compare`. The catalog itself is untouched.
  pub fn list_ordered_by<F>(&self, compare: F) -> Vec<StreamEntry>
  where
    F: FnMut(&StreamEntry, &StreamEntry) -> Ordering,
  {
    let mut view = self.entries.clone();
    view.sort_by(compare);
    view
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: i64, kind: StreamKind, media_ref: Option<&str>) -> CatalogRecord {
    CatalogRecord { id, kind, media_ref: media_ref.map(str::to_string), title: None, thumbnail_override: None }
  }

  #[test]
  fn load_keeps_insertion_order_and_indexes() {
    let catalog = Catalog::load(
      vec![record(8, StreamKind::EmbeddedVideo, Some("abc")), record(5, StreamKind::ImageFeed, Some("http://x/a.jpg"))],
      None,
    )
    .unwrap();
    let ids: Vec<i64> = catalog.entries().iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![8, 5]);
    assert_eq!(catalog.get(5).unwrap().kind, StreamKind::ImageFeed);
    assert!(catalog.get(7).is_none());
  }

  #[test]
  fn load_rejects_duplicate_ids() {
    let err = Catalog::load(
      vec![record(1, StreamKind::EmbeddedVideo, Some("a")), record(1, StreamKind::EmbeddedVideo, Some("b"))],
      None,
    )
    .unwrap_err();
    assert!(matches!(err, MalformedCatalogError::DuplicateId(1)));
  }

  #[test]
  fn load_rejects_missing_or_blank_media_ref() {
    let err = Catalog::load(vec![record(3, StreamKind::EmbeddedVideo, None)], None).unwrap_err();
    assert!(matches!(err, MalformedCatalogError::MissingField { id: 3, field: "mediaRef", .. }));

    let err = Catalog::load(vec![record(4, StreamKind::GenericMedia, Some("   "))], None).unwrap_err();
    assert!(matches!(err, MalformedCatalogError::MissingField { id: 4, .. }));
  }

  #[test]
  fn load_rejects_unknown_default() {
    let err = Catalog::load(vec![record(1, StreamKind::EmbeddedVideo, Some("a"))], Some(2)).unwrap_err();
    assert!(matches!(err, MalformedCatalogError::UnknownDefault(2)));
  }

  #[test]
  fn default_entry_prefers_designated_id() {
    let records =
      vec![record(1, StreamKind::EmbeddedVideo, Some("a")), record(2, StreamKind::EmbeddedVideo, Some("b"))];
    let catalog = Catalog::load(records.clone(), None).unwrap();
    assert_eq!(catalog.default_entry().unwrap().id, 1);
    let catalog = Catalog::load(records, Some(2)).unwrap();
    assert_eq!(catalog.default_entry().unwrap().id, 2);
  }

  #[test]
  fn empty_catalog_has_no_default() {
    let catalog = Catalog::load(Vec::new(), None).unwrap();
    assert!(catalog.is_empty());
    assert!(catalog.default_entry().is_none());
  }

  #[test]
  fn list_ordered_does_not_reorder_backing_sequence() {
    let catalog = Catalog::load(
      vec![
        record(3, StreamKind::EmbeddedVideo, Some("c")),
        record(1, StreamKind::EmbeddedVideo, Some("a")),
        record(2, StreamKind::EmbeddedVideo, Some("b")),
      ],
      None,
    )
    .unwrap();

    let sorted: Vec<i64> = catalog.list_ordered().iter().map(|e| e.id).collect();
    assert_eq!(sorted, vec![1, 2, 3]);

    let desc: Vec<i64> = catalog.list_ordered_by(|a, b| b.id.cmp(&a.id)).iter().map(|e| e.id).collect();
    assert_eq!(desc, vec![3, 2, 1]);

    let original: Vec<i64> = catalog.entries().iter().map(|e| e.id).collect();
    assert_eq!(original, vec![3, 1, 2]);
    assert_eq!(catalog.default_entry().unwrap().id, 3);
  }

  #[test]
  fn json_accepts_bare_list_and_legacy_keys() {
    let json = r#"[
      {"id": 5, "title": "Quadra 5", "type": "youtube", "videoId": "abc"},
      {"id": 6, "type": "clappr", "url": "http://x/stream.m3u8"},
      {"id": 7, "type": "image-feed", "mediaRef": "http://x/cam.jpg", "thumbnailOverride": "http://x/t.jpg"}
    ]"#;
    let catalog = Catalog::from_json_str(json).unwrap();
    assert_eq!(catalog.get(5).unwrap().kind, StreamKind::EmbeddedVideo);
    assert_eq!(catalog.get(5).unwrap().media_ref, "abc");
    assert_eq!(catalog.get(6).unwrap().kind, StreamKind::GenericMedia);
    assert_eq!(catalog.get(6).unwrap().media_ref, "http://x/stream.m3u8");
    assert_eq!(catalog.get(7).unwrap().thumbnail_override.as_deref(), Some("http://x/t.jpg"));
  }

  #[test]
  fn json_rejects_unknown_type() {
    let err = Catalog::from_json_str(r#"[{"id": 1, "type": "vhs", "mediaRef": "x"}]"#).unwrap_err();
    assert!(matches!(err, MalformedCatalogError::Parse(_)));
  }

  #[test]
  fn parse_errors_name_the_failing_field() {
    let list = Catalog::from_json_str(r#"[{"type": "image-feed", "mediaRef": "x"}]"#).unwrap_err();
    assert!(list.to_string().contains("missing field `id`"), "{}", list);

    let table = Catalog::from_json_str(r#"{"defaultId": 1, "streams": [{"id": 1, "type": "vhs"}]}"#).unwrap_err();
    assert!(table.to_string().contains("vhs"), "{}", table);

    let toml = Catalog::from_toml_str("defaultId = 1\n").unwrap_err();
    assert!(toml.to_string().contains("streams"), "{}", toml);
  }

  #[test]
  fn toml_catalog_with_default() {
    let source = r#"
defaultId = 2

[[streams]]
id = 1
type = "embedded-video"
mediaRef = "abc"

[[streams]]
id = 2
type = "generic-media"
mediaRef = "http://x/stream.m3u8"
title = "Center court"
"#;
    let catalog = Catalog::from_toml_str(source).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.default_entry().unwrap().label(), "Center court");
  }

  #[test]
  fn from_path_reads_json_file() {
    let path = std::env::temp_dir().join(format!("quadra-catalog-{}.json", std::process::id()));
    std::fs::write(&path, r#"[{"id": 1, "type": "embedded-video", "mediaRef": "abc"}]"#).unwrap();
    let catalog = Catalog::from_path(&path).unwrap();
    let _ = std::fs::remove_file(&path);
    assert_eq!(catalog.len(), 1);
  }

  #[test]
  fn from_path_missing_file_is_an_error() {
    let path = std::env::temp_dir().join("quadra-does-not-exist.json");
    assert!(Catalog::from_path(&path).is_err());
  }

  #[test]
  fn bundled_catalog_is_valid() {
    let catalog = Catalog::bundled().unwrap();
    assert!(!catalog.is_empty());
    assert!(catalog.default_entry().is_some());
  }

  #[test]
  fn label_falls_back_to_entry_label_and_id() {
    let entry = StreamEntry {
      id: 4,
      kind: StreamKind::EmbeddedVideo,
      media_ref: "abc".to_string(),
      title: None,
      thumbnail_override: None,
    };
    assert_eq!(entry.label(), format!("{} 4", constants().entry_label));
  }
}
