use tracing::debug;

use crate::catalog::{Catalog, StreamEntry};
use crate::error::EmptyCatalogError;

/// Turns a requested id (possibly absent, malformed or unknown) into an entry.
///
/// A miss never surfaces as "not found": the viewer degrades to the default
/// stream so every link stays playable.
#[derive(Debug, Clone, Copy)]
pub struct StreamResolver<'a> {
  catalog: &'a Catalog,
}

impl<'a> StreamResolver<'a> {
  pub fn new(catalog: &'a Catalog) -> Self {
    Self { catalog }
  }

  pub fn default_entry(&self) -> Result<&'a StreamEntry, EmptyCatalogError> {
    self.catalog.default_entry().ok_or(EmptyCatalogError)
  }

  pub fn resolve(&self, requested: Option<i64>) -> Result<&'a StreamEntry, EmptyCatalogError> {
    let fallback = self.default_entry()?;
    match requested {
      Some(id) => match self.catalog.get(id) {
        Some(entry) => Ok(entry),
        None => {
          debug!(requested = id, fallback = fallback.id, "resolver: unknown id, using default");
          Ok(fallback)
        }
      },
      None => Ok(fallback),
    }
  }

  /// Resolve externally supplied text. Anything that isn't an integer id
  /// resolves to the default.
  pub fn resolve_raw(&self, requested: Option<&str>) -> Result<&'a StreamEntry, EmptyCatalogError> {
    let id = requested.map(str::trim).filter(|s| !s.is_empty()).and_then(|s| s.parse::<i64>().ok());
    self.resolve(id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::{CatalogRecord, StreamKind};

  fn scenario_catalog() -> Catalog {
    Catalog::load(
      vec![
        CatalogRecord {
          id: 1,
          kind: StreamKind::EmbeddedVideo,
          media_ref: Some("abc".to_string()),
          title: None,
          thumbnail_override: None,
        },
        CatalogRecord {
          id: 2,
          kind: StreamKind::GenericMedia,
          media_ref: Some("http://x/stream.m3u8".to_string()),
          title: None,
          thumbnail_override: None,
        },
      ],
      None,
    )
    .unwrap()
  }

  #[test]
  fn known_ids_resolve_to_themselves() {
    let catalog = scenario_catalog();
    let resolver = StreamResolver::new(&catalog);
    for entry in catalog.entries() {
      assert_eq!(resolver.resolve(Some(entry.id)).unwrap().id, entry.id);
    }
  }

  #[test]
  fn unknown_ids_fall_back_to_default() {
    let catalog = scenario_catalog();
    let resolver = StreamResolver::new(&catalog);
    assert_eq!(resolver.resolve(Some(9)).unwrap().id, 1);
    assert_eq!(resolver.resolve(Some(0)).unwrap().id, 1);
    assert_eq!(resolver.resolve(Some(-3)).unwrap().id, 1);
    assert_eq!(resolver.resolve(None).unwrap().id, 1);
  }

  #[test]
  fn raw_input_that_is_not_an_id_falls_back() {
    let catalog = scenario_catalog();
    let resolver = StreamResolver::new(&catalog);
    assert_eq!(resolver.resolve_raw(Some("2")).unwrap().id, 2);
    assert_eq!(resolver.resolve_raw(Some(" 2 ")).unwrap().id, 2);
    assert_eq!(resolver.resolve_raw(Some("two")).unwrap().id, 1);
    assert_eq!(resolver.resolve_raw(Some("")).unwrap().id, 1);
    assert_eq!(resolver.resolve_raw(Some("2.5")).unwrap().id, 1);
    assert_eq!(resolver.resolve_raw(None).unwrap().id, 1);
  }

  #[test]
  fn designated_default_wins_over_first_entry() {
    let catalog = Catalog::from_json_str(
      r#"{"defaultId": 2, "streams": [
        {"id": 1, "type": "embedded-video", "mediaRef": "abc"},
        {"id": 2, "type": "embedded-video", "mediaRef": "def"}
      ]}"#,
    )
    .unwrap();
    assert_eq!(StreamResolver::new(&catalog).resolve(Some(42)).unwrap().id, 2);
  }

  #[test]
  fn empty_catalog_always_fails() {
    let catalog = Catalog::load(Vec::new(), None).unwrap();
    let resolver = StreamResolver::new(&catalog);
    assert_eq!(resolver.resolve(Some(1)).unwrap_err(), EmptyCatalogError);
    assert_eq!(resolver.resolve(None).unwrap_err(), EmptyCatalogError);
    assert_eq!(resolver.resolve_raw(Some("x")).unwrap_err(), EmptyCatalogError);
  }
}
