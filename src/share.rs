//! Share links and the clipboard copy indicator.
//!
//! A terminal has no native share sheet, so the popover is always offered.
//! Every failure here (clipboard, browser) is logged and swallowed.

use anyhow::{Context, Result, anyhow};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::catalog::StreamEntry;
use crate::constants::constants;

/// Characters `encodeURIComponent` leaves alone besides alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
  .remove(b'-')
  .remove(b'_')
  .remove(b'.')
  .remove(b'!')
  .remove(b'~')
  .remove(b'*')
  .remove(b'\'')
  .remove(b'(')
  .remove(b')');

pub fn encode_component(s: &str) -> String {
  utf8_percent_encode(s, URI_COMPONENT).to_string()
}

/// Canonical page URL for a route path.
pub fn page_url(origin: &str, route_path: &str) -> String {
  format!("{}/{}", origin.trim_end_matches('/'), route_path.trim_start_matches('/'))
}

/// "Quadra 5 - Campestre TV"
pub fn share_title(entry: &StreamEntry) -> String {
  format!("{} - {}", entry.label(), constants().site_name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
  pub url: String,
  pub title: String,
}

impl ShareLinks {
  pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
    Self { url: url.into(), title: title.into() }
  }

  pub fn whatsapp(&self) -> String {
    format!("https://wa.me/?text={}", encode_component(&format!("{} - {}", self.title, self.url)))
  }

  pub fn telegram(&self) -> String {
    format!("https://t.me/share/url?url={}&text={}", encode_component(&self.url), encode_component(&self.title))
  }
}

/// Transient "copied" indicator. It reverts a fixed time after the first
/// successful copy; repeated copies don't extend it.
#[derive(Debug, Clone, Copy)]
pub struct CopyFeedback {
  copied_at: Option<Instant>,
  hold: Duration,
}

impl Default for CopyFeedback {
  fn default() -> Self {
    Self::new(constants().copy_feedback())
  }
}

impl CopyFeedback {
  pub fn new(hold: Duration) -> Self {
    Self { copied_at: None, hold }
  }

  pub fn mark_copied(&mut self, now: Instant) {
    if !self.is_copied(now) {
      self.copied_at = Some(now);
    }
  }

  pub fn is_copied(&self, now: Instant) -> bool {
    self.copied_at.is_some_and(|t| now.saturating_duration_since(t) < self.hold)
  }

  /// Reset once the hold time is over.
  pub fn expire(&mut self, now: Instant) {
    if self.copied_at.is_some() && !self.is_copied(now) {
      self.copied_at = None;
    }
  }

  pub fn reset(&mut self) {
    self.copied_at = None;
  }
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
  let mut clipboard = arboard::Clipboard::new().map_err(|e| anyhow!("clipboard unavailable: {}", e))?;
  clipboard.set_text(text.to_string()).map_err(|e| anyhow!("clipboard write failed: {}", e))?;
  Ok(())
}

/// Copy `text`, updating the indicator only on success.
pub fn copy_link(text: &str, feedback: &mut CopyFeedback) -> bool {
  match copy_to_clipboard(text) {
    Ok(()) => {
      info!(url = %text, "share: link copied");
      feedback.mark_copied(Instant::now());
      true
    }
    Err(e) => {
      warn!(err = %e, "share: copy failed");
      false
    }
  }
}

/// Open a URL in the system browser without waiting on it.
pub fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = std::process::Command::new(cmd)
    .arg(url)
    .stdin(std::process::Stdio::null())
    .stdout(std::process::Stdio::null())
    .stderr(std::process::Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to run {}", cmd))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::StreamKind;

  #[test]
  fn encode_matches_uri_component() {
    assert_eq!(encode_component("a b&c=d/e?"), "a%20b%26c%3Dd%2Fe%3F");
    assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    assert_eq!(encode_component("ção"), "%C3%A7%C3%A3o");
  }

  #[test]
  fn whatsapp_link_joins_title_and_url() {
    let links = ShareLinks::new("https://campestre.tv/quadra/5", "Quadra 5 - Campestre TV");
    assert_eq!(
      links.whatsapp(),
      "https://wa.me/?text=Quadra%205%20-%20Campestre%20TV%20-%20https%3A%2F%2Fcampestre.tv%2Fquadra%2F5"
    );
  }

  #[test]
  fn telegram_link_encodes_both_parts() {
    let links = ShareLinks::new("https://campestre.tv/quadra/5", "Quadra 5");
    assert_eq!(links.telegram(), "https://t.me/share/url?url=https%3A%2F%2Fcampestre.tv%2Fquadra%2F5&text=Quadra%205");
  }

  #[test]
  fn page_url_joins_cleanly() {
    assert_eq!(page_url("https://campestre.tv/", "/quadra/5"), "https://campestre.tv/quadra/5");
    assert_eq!(page_url("https://campestre.tv", "quadra/5"), "https://campestre.tv/quadra/5");
  }

  #[test]
  fn title_uses_entry_label() {
    let entry = StreamEntry {
      id: 5,
      kind: StreamKind::EmbeddedVideo,
      media_ref: "abc".to_string(),
      title: Some("Quadra 5".to_string()),
      thumbnail_override: None,
    };
    assert_eq!(share_title(&entry), format!("Quadra 5 - {}", constants().site_name));
  }

  #[test]
  fn copy_indicator_reverts_after_hold() {
    let start = Instant::now();
    let mut feedback = CopyFeedback::new(Duration::from_millis(2000));
    assert!(!feedback.is_copied(start));

    feedback.mark_copied(start);
    assert!(feedback.is_copied(start + Duration::from_millis(1999)));
    assert!(!feedback.is_copied(start + Duration::from_millis(2000)));

    feedback.expire(start + Duration::from_millis(2000));
    assert!(!feedback.is_copied(start + Duration::from_millis(2000)));
  }

  #[test]
  fn repeated_copies_do_not_extend_the_indicator() {
    let start = Instant::now();
    let mut feedback = CopyFeedback::new(Duration::from_millis(2000));
    feedback.mark_copied(start);
    feedback.mark_copied(start + Duration::from_millis(1500));
    assert!(!feedback.is_copied(start + Duration::from_millis(2100)));

    // After it reverts, a new copy starts a new window.
    feedback.expire(start + Duration::from_millis(2100));
    feedback.mark_copied(start + Duration::from_millis(2200));
    assert!(feedback.is_copied(start + Duration::from_millis(3000)));
  }

  #[test]
  fn expire_keeps_fresh_indicator() {
    let start = Instant::now();
    let mut feedback = CopyFeedback::new(Duration::from_millis(2000));
    feedback.mark_copied(start);
    feedback.expire(start + Duration::from_millis(500));
    assert!(feedback.is_copied(start + Duration::from_millis(600)));
    feedback.reset();
    assert!(!feedback.is_copied(start + Duration::from_millis(600)));
  }
}
