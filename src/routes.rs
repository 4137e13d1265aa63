//! Route table derived from the catalog: `/` plus one `/{prefix}/{id}` per entry.

use crate::catalog::Catalog;
use crate::error::EmptyCatalogError;
use crate::resolver::StreamResolver;

pub const ROOT_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
  pub path: String,
  pub entry_id: i64,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
  prefix: String,
  routes: Vec<Route>,
}

/// Strip surrounding slashes so "quadra", "/quadra/" and "quadra/" agree.
fn normalize_prefix(prefix: &str) -> String {
  prefix.trim().trim_matches('/').to_string()
}

fn entry_path(prefix: &str, id: i64) -> String {
  if prefix.is_empty() { format!("/{}", id) } else { format!("/{}/{}", prefix, id) }
}

/// Build the table: the root route bound to the default entry, then one route
/// per entry in catalog order.
pub fn build_routes(catalog: &Catalog, path_prefix: &str) -> Result<RouteTable, EmptyCatalogError> {
  let default = StreamResolver::new(catalog).default_entry()?;
  let prefix = normalize_prefix(path_prefix);

  let mut routes = Vec::with_capacity(catalog.len() + 1);
  routes.push(Route { path: ROOT_PATH.to_string(), entry_id: default.id });
  routes.extend(catalog.entries().iter().map(|e| Route { path: entry_path(&prefix, e.id), entry_id: e.id }));

  Ok(RouteTable { prefix, routes })
}

impl RouteTable {
  pub fn routes(&self) -> &[Route] {
    &self.routes
  }

  pub fn len(&self) -> usize {
    self.routes.len()
  }

  pub fn prefix(&self) -> &str {
    &self.prefix
  }

  /// Exact match on the path, ignoring a trailing slash.
  pub fn lookup(&self, path: &str) -> Option<i64> {
    let path = path.trim();
    let path = if path.len() > 1 { path.trim_end_matches('/') } else { path };
    self.routes.iter().find(|r| r.path == path).map(|r| r.entry_id)
  }

  /// The id segment of a path under this table's prefix, e.g. "7" for "/quadra/7".
  /// Paths outside the prefix yield `None`.
  pub fn entry_segment<'a>(&self, path: &'a str) -> Option<&'a str> {
    let rest = path.trim().trim_end_matches('/').strip_prefix('/')?;
    let segment = match self.prefix.as_str() {
      "" => rest,
      prefix => rest.strip_prefix(prefix)?.strip_prefix('/')?,
    };
    (!segment.is_empty() && !segment.contains('/')).then_some(segment)
  }

  /// Canonical (non-root) path of an entry.
  pub fn path_for(&self, id: i64) -> Option<&str> {
    self.routes.iter().skip(1).find(|r| r.entry_id == id).map(|r| r.path.as_str())
  }
}
