//! Live preview URLs for entries shown in the navigation list.
//!
//! Embedded videos get the provider's thumbnail endpoint with a time token so
//! the image is refetched as the live stream moves on. Every other kind has a
//! fixed preview that never changes, so only embedded entries own a task.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::catalog::{StreamEntry, StreamKind};
use crate::constants::constants;

/// Source of the cache-busting timestamp (unix millis).
pub trait Clock: Send + Sync {
  fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now_millis(&self) -> i64 {
    chrono::Utc::now().timestamp_millis()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailState {
  pub current_url: String,
  pub last_refreshed_at: i64,
}

/// Compute the preview URL for `entry` at `now_millis`.
pub fn thumbnail_url(entry: &StreamEntry, now_millis: i64) -> String {
  let c = constants();
  match entry.kind {
    StreamKind::EmbeddedVideo => {
      format!("https://{}/vi/{}/maxresdefault.jpg?t={}", c.thumbnail_host, entry.media_ref, now_millis)
    }
    StreamKind::GenericMedia | StreamKind::ImageFeed => {
      entry.thumbnail_override.clone().unwrap_or_else(|| c.placeholder_thumbnail.clone())
    }
  }
}

fn snapshot(entry: &StreamEntry, clock: &dyn Clock) -> ThumbnailState {
  let now = clock.now_millis();
  ThumbnailState { current_url: thumbnail_url(entry, now), last_refreshed_at: now }
}

/// Owns the refresh task of one displayed entry. Stopping or dropping the
/// handle aborts the task.
pub struct ThumbnailHandle {
  entry_id: i64,
  rx: watch::Receiver<ThumbnailState>,
  task: Option<JoinHandle<()>>,
}

impl ThumbnailHandle {
  pub fn current_url(&self) -> String {
    self.rx.borrow().current_url.clone()
  }

  pub fn state(&self) -> ThumbnailState {
    self.rx.borrow().clone()
  }

  /// Whether a recurring task is running for this entry.
  pub fn is_active(&self) -> bool {
    self.task.as_ref().is_some_and(|t| !t.is_finished())
  }

  /// True once per refresh, for the UI loop to pick up new URLs.
  pub fn take_changed(&mut self) -> bool {
    let changed = self.rx.has_changed().unwrap_or(false);
    if changed {
      self.rx.borrow_and_update();
    }
    changed
  }

  /// Wait for the next refresh.
  #[cfg(test)]
  pub async fn changed(&mut self) -> ThumbnailState {
    let _ = self.rx.changed().await;
    self.rx.borrow_and_update().clone()
  }

  pub fn stop(mut self) {
    self.cancel();
  }

  fn cancel(&mut self) {
    if let Some(task) = self.task.take() {
      debug!(entry = self.entry_id, "thumbnail: stopping refresh task");
      task.abort();
    }
  }
}

impl Drop for ThumbnailHandle {
  fn drop(&mut self) {
    self.cancel();
  }
}

#[derive(Clone)]
pub struct ThumbnailRefresher {
  clock: Arc<dyn Clock>,
  period: Duration,
}

impl Default for ThumbnailRefresher {
  fn default() -> Self {
    Self::new(Arc::new(SystemClock), constants().thumbnail_refresh_period())
  }
}

impl ThumbnailRefresher {
  pub fn new(clock: Arc<dyn Clock>, period: Duration) -> Self {
    Self { clock, period }
  }

  /// The first URL is available as soon as this returns; refreshes follow
  /// every `period`. Embedded entries need a running tokio runtime.
  pub fn start(&self, entry: &StreamEntry) -> ThumbnailHandle {
    let (tx, rx) = watch::channel(snapshot(entry, self.clock.as_ref()));

    let task = match entry.kind {
      StreamKind::EmbeddedVideo => {
        let entry = entry.clone();
        let clock = Arc::clone(&self.clock);
        let period = self.period;
        let first_refresh = Instant::now() + period;
        debug!(entry = entry.id, period_secs = period.as_secs(), "thumbnail: starting refresh task");
        Some(tokio::spawn(async move {
          let mut ticker = tokio::time::interval_at(first_refresh, period);
          ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
          loop {
            ticker.tick().await;
            if tx.send(snapshot(&entry, clock.as_ref())).is_err() {
              break;
            }
          }
        }))
      }
      StreamKind::GenericMedia | StreamKind::ImageFeed => None,
    };

    ThumbnailHandle { entry_id: entry.id, rx, task }
  }
}

/// One handle per displayed entry, reconciled against what the UI shows.
pub struct ThumbnailBoard {
  refresher: ThumbnailRefresher,
  handles: HashMap<i64, ThumbnailHandle>,
}

impl ThumbnailBoard {
  pub fn new(refresher: ThumbnailRefresher) -> Self {
    Self { refresher, handles: HashMap::new() }
  }

  /// Start tasks for newly displayed entries and stop the ones that left.
  pub fn show<'a, I>(&mut self, displayed: I)
  where
    I: IntoIterator<Item = &'a StreamEntry>,
  {
    let mut keep = HashSet::new();
    for entry in displayed {
      keep.insert(entry.id);
      if !self.handles.contains_key(&entry.id) {
        self.handles.insert(entry.id, self.refresher.start(entry));
      }
    }
    let gone: Vec<i64> = self.handles.keys().copied().filter(|id| !keep.contains(id)).collect();
    for id in gone {
      if let Some(handle) = self.handles.remove(&id) {
        handle.stop();
      }
    }
  }

  pub fn get(&self, id: i64) -> Option<&ThumbnailHandle> {
    self.handles.get(&id)
  }

  pub fn get_mut(&mut self, id: i64) -> Option<&mut ThumbnailHandle> {
    self.handles.get_mut(&id)
  }

  pub fn len(&self) -> usize {
    self.handles.len()
  }

  pub fn clear(&mut self) {
    for (_, handle) in self.handles.drain() {
      handle.stop();
    }
  }
}
