//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available,
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  pub app_name: String,
  pub site_name: String,
  /// Origin used to build shareable page URLs when preferences don't set one.
  pub site_origin: String,
  pub route_prefix: String,
  /// Label prefix for entries without a title ("Quadra 5").
  pub entry_label: String,

  // Providers
  pub thumbnail_host: String,
  pub embed_host: String,
  pub placeholder_thumbnail: String,

  // Timing
  pub thumbnail_refresh_secs: u64,
  pub copy_feedback_ms: u64,
  pub error_dismiss_secs: u64,

  // Generic media player
  pub player_start_muted: bool,
}

impl Constants {
  pub fn thumbnail_refresh_period(&self) -> Duration {
    Duration::from_secs(self.thumbnail_refresh_secs)
  }

  pub fn copy_feedback(&self) -> Duration {
    Duration::from_millis(self.copy_feedback_ms)
  }

  pub fn error_dismiss(&self) -> Duration {
    Duration::from_secs(self.error_dismiss_secs)
  }
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}
