//! Playback dispatch: one adapter per stream kind, one live adapter per container.
//!
//! The dispatcher keys the mounted adapter on `(id, kind)`. Entering the
//! dispatch path again for the same key is a no-op while the adapter is live,
//! so a redundant redraw can never spawn a second player. A player that exited
//! on its own no longer counts as mounted and is rebuilt on the next dispatch. Switching entries always unmounts the old
//! adapter before the new one mounts.

use anyhow::Result;
use image::DynamicImage;
use reqwest::{Client, Url};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{StreamEntry, StreamKind};
use crate::constants::constants;
use crate::error::PlaybackError;
use crate::graphics::fetch_image;

/// How the generic media widget should present the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerOptions {
  pub autoplay: bool,
  pub controls: bool,
  pub responsive: bool,
  pub muted: bool,
}

impl Default for PlayerOptions {
  fn default() -> Self {
    Self { autoplay: true, controls: true, responsive: true, muted: constants().player_start_muted }
  }
}

/// What a container currently shows.
#[derive(Debug, Clone, Default)]
pub enum Surface {
  #[default]
  Empty,
  /// Provider embed page; opened in the browser on request.
  Embed { url: String },
  /// Direct media handed to the generic player.
  Media { source: String, options: PlayerOptions },
  /// Still image; `frame` fills in once fetched.
  Image { url: String, frame: Option<DynamicImage> },
  /// Inert surface for an entry that cannot be played.
  Broken { reason: String },
}

/// The region of the view an adapter mounts into.
#[derive(Debug, Default)]
pub struct Container {
  surface: Surface,
}

impl Container {
  pub fn surface(&self) -> &Surface {
    &self.surface
  }

  fn show(&mut self, surface: Surface) {
    self.surface = surface;
  }

  fn clear(&mut self) {
    self.surface = Surface::Empty;
  }
}

/// The generic media-playback widget, an external capability.
pub trait MediaWidget {
  fn start(&mut self, source: &str, options: &PlayerOptions) -> Result<()>;
  fn stop(&mut self);
  /// False once the player has exited, whether stopped or on its own.
  fn is_running(&mut self) -> bool;
  /// Latest status line, if the widget reports one.
  fn status(&mut self) -> Option<String> {
    None
  }
}

pub type WidgetFactory = Arc<dyn Fn() -> Box<dyn MediaWidget> + Send + Sync>;

pub trait PlaybackAdapter {
  fn kind(&self) -> StreamKind;
  /// Idempotent: mounting an already mounted adapter does nothing.
  fn mount(&mut self, container: &mut Container) -> Result<(), PlaybackError>;
  /// Releases everything the adapter holds and empties the container.
  fn unmount(&mut self, container: &mut Container);
  /// Mounted and still live.
  fn is_mounted(&mut self) -> bool;
  /// Pick up background progress (image fetches, player status).
  fn poll(&mut self, _container: &mut Container) {}
  fn status(&mut self) -> Option<String> {
    None
  }
}

// --- Media reference validation ---

fn invalid(entry: &StreamEntry, reason: impl Into<String>) -> PlaybackError {
  PlaybackError::InvalidMediaReference {
    id: entry.id,
    kind: entry.kind,
    media_ref: entry.media_ref.clone(),
    reason: reason.into(),
  }
}

/// Provider video ids are short tokens of `[A-Za-z0-9_-]`.
fn validate_video_id(entry: &StreamEntry) -> Result<&str, PlaybackError> {
  let id = entry.media_ref.trim();
  if id.is_empty() {
    return Err(invalid(entry, "video id is empty"));
  }
  if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
    return Err(invalid(entry, "video id contains characters outside [A-Za-z0-9_-]"));
  }
  Ok(id)
}

/// Direct references must be absolute http(s) URLs. Syntax only, nothing is
/// fetched, and the reference itself is returned untouched.
fn validate_direct_url(entry: &StreamEntry) -> Result<&str, PlaybackError> {
  let raw = entry.media_ref.trim();
  if raw.is_empty() {
    return Err(invalid(entry, "URL is empty"));
  }
  let url = Url::parse(raw).map_err(|e| invalid(entry, e.to_string()))?;
  if !matches!(url.scheme(), "http" | "https") {
    return Err(invalid(entry, format!("unsupported scheme `{}`", url.scheme())));
  }
  if url.host_str().is_none() {
    return Err(invalid(entry, "URL has no host"));
  }
  Ok(raw)
}

pub fn embed_url(video_id: &str) -> String {
  format!("https://{}/embed/{}", constants().embed_host, video_id)
}

// --- Adapters ---

#[derive(Debug)]
pub struct EmbeddedVideoAdapter {
  url: String,
  mounted: bool,
}

impl EmbeddedVideoAdapter {
  pub fn new(entry: &StreamEntry) -> Result<Self, PlaybackError> {
    let video_id = validate_video_id(entry)?;
    Ok(Self { url: embed_url(video_id), mounted: false })
  }
}

impl PlaybackAdapter for EmbeddedVideoAdapter {
  fn kind(&self) -> StreamKind {
    StreamKind::EmbeddedVideo
  }

  fn mount(&mut self, container: &mut Container) -> Result<(), PlaybackError> {
    if self.mounted {
      return Ok(());
    }
    container.show(Surface::Embed { url: self.url.clone() });
    self.mounted = true;
    Ok(())
  }

  fn unmount(&mut self, container: &mut Container) {
    container.clear();
    self.mounted = false;
  }

  fn is_mounted(&mut self) -> bool {
    self.mounted
  }
}

pub struct GenericMediaAdapter {
  entry_id: i64,
  source: String,
  options: PlayerOptions,
  widget: Box<dyn MediaWidget>,
  mounted: bool,
}

impl GenericMediaAdapter {
  pub fn new(entry: &StreamEntry, widget: Box<dyn MediaWidget>) -> Result<Self, PlaybackError> {
    let source = validate_direct_url(entry)?.to_string();
    Ok(Self { entry_id: entry.id, source, options: PlayerOptions::default(), widget, mounted: false })
  }

  /// Drop the mounted flag once the player has exited on its own.
  fn reap(&mut self) {
    if self.mounted && !self.widget.is_running() {
      info!(entry = self.entry_id, "generic media: player exited");
      self.mounted = false;
    }
  }
}

impl PlaybackAdapter for GenericMediaAdapter {
  fn kind(&self) -> StreamKind {
    StreamKind::GenericMedia
  }

  fn mount(&mut self, container: &mut Container) -> Result<(), PlaybackError> {
    self.reap();
    if self.mounted {
      return Ok(());
    }
    self
      .widget
      .start(&self.source, &self.options)
      .map_err(|source| PlaybackError::Player { id: self.entry_id, source })?;
    container.show(Surface::Media { source: self.source.clone(), options: self.options });
    self.mounted = true;
    Ok(())
  }

  fn unmount(&mut self, container: &mut Container) {
    if self.widget.is_running() {
      self.widget.stop();
    }
    container.clear();
    self.mounted = false;
  }

  fn is_mounted(&mut self) -> bool {
    self.reap();
    self.mounted
  }

  fn poll(&mut self, container: &mut Container) {
    if self.mounted {
      self.reap();
      if !self.mounted {
        container.clear();
      }
    }
  }

  fn status(&mut self) -> Option<String> {
    self.widget.status()
  }
}

pub struct ImageFeedAdapter {
  url: String,
  http: Option<Client>,
  fetch: Option<(JoinHandle<()>, oneshot::Receiver<Result<DynamicImage>>)>,
  mounted: bool,
}

impl ImageFeedAdapter {
  /// Without an HTTP client the surface shows the URL but never fetches it.
  pub fn new(entry: &StreamEntry, http: Option<Client>) -> Result<Self, PlaybackError> {
    let url = validate_direct_url(entry)?.to_string();
    Ok(Self { url, http, fetch: None, mounted: false })
  }

  fn cancel_fetch(&mut self) {
    if let Some((handle, _)) = self.fetch.take() {
      handle.abort();
    }
  }
}

impl PlaybackAdapter for ImageFeedAdapter {
  fn kind(&self) -> StreamKind {
    StreamKind::ImageFeed
  }

  fn mount(&mut self, container: &mut Container) -> Result<(), PlaybackError> {
    if self.mounted {
      return Ok(());
    }
    container.show(Surface::Image { url: self.url.clone(), frame: None });
    if let Some(client) = self.http.clone() {
      let url = self.url.clone();
      let (tx, rx) = oneshot::channel();
      let handle = tokio::spawn(async move {
        let _ = tx.send(fetch_image(&client, &url).await);
      });
      self.fetch = Some((handle, rx));
    }
    self.mounted = true;
    Ok(())
  }

  fn unmount(&mut self, container: &mut Container) {
    self.cancel_fetch();
    container.clear();
    self.mounted = false;
  }

  fn is_mounted(&mut self) -> bool {
    self.mounted
  }

  fn poll(&mut self, container: &mut Container) {
    let Some((handle, mut rx)) = self.fetch.take() else { return };
    match rx.try_recv() {
      Ok(Ok(image)) => {
        container.show(Surface::Image { url: self.url.clone(), frame: Some(image) });
      }
      Ok(Err(e)) => {
        // A broken image is accepted; the surface keeps showing the URL.
        warn!(url = %self.url, err = %e, "image feed: fetch failed");
      }
      Err(oneshot::error::TryRecvError::Empty) => {
        self.fetch = Some((handle, rx));
      }
      Err(oneshot::error::TryRecvError::Closed) => {
        warn!(url = %self.url, "image feed: fetch task ended without a result");
      }
    }
  }
}

/// Closed set of adapters, selected by one match on the entry kind.
pub enum Adapter {
  Embedded(EmbeddedVideoAdapter),
  Generic(GenericMediaAdapter),
  Image(ImageFeedAdapter),
}

impl Adapter {
  fn as_dyn(&mut self) -> &mut dyn PlaybackAdapter {
    match self {
      Adapter::Embedded(a) => a,
      Adapter::Generic(a) => a,
      Adapter::Image(a) => a,
    }
  }

  fn is_mounted(&mut self) -> bool {
    match self {
      Adapter::Embedded(a) => a.is_mounted(),
      Adapter::Generic(a) => a.is_mounted(),
      Adapter::Image(a) => a.is_mounted(),
    }
  }
}

/// Stable re-trigger identity of a mounted adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountKey {
  pub id: i64,
  pub kind: StreamKind,
}

impl From<&StreamEntry> for MountKey {
  fn from(entry: &StreamEntry) -> Self {
    Self { id: entry.id, kind: entry.kind }
  }
}

struct Mounted {
  key: MountKey,
  adapter: Adapter,
}

pub struct PlaybackDispatcher {
  widgets: WidgetFactory,
  http: Option<Client>,
  current: Option<Mounted>,
}

impl PlaybackDispatcher {
  pub fn new(widgets: WidgetFactory, http: Option<Client>) -> Self {
    Self { widgets, http, current: None }
  }

  fn build(&self, entry: &StreamEntry) -> Result<Adapter, PlaybackError> {
    Ok(match entry.kind {
      StreamKind::EmbeddedVideo => Adapter::Embedded(EmbeddedVideoAdapter::new(entry)?),
      StreamKind::GenericMedia => Adapter::Generic(GenericMediaAdapter::new(entry, (self.widgets)())?),
      StreamKind::ImageFeed => Adapter::Image(ImageFeedAdapter::new(entry, self.http.clone())?),
    })
  }

  /// Show `entry` in `container`. A failure leaves the container with an
  /// inert broken surface and no live adapter.
  pub fn dispatch(&mut self, entry: &StreamEntry, container: &mut Container) -> Result<(), PlaybackError> {
    let key = MountKey::from(entry);
    if let Some(current) = self.current.as_mut()
      && current.key == key
      && current.adapter.is_mounted()
    {
      // Same entry, still live: nothing to do.
      return Ok(());
    }

    self.release(container);

    let mut adapter = match self.build(entry) {
      Ok(adapter) => adapter,
      Err(e) => {
        warn!(entry = entry.id, err = %e, "playback: cannot build adapter");
        container.show(Surface::Broken { reason: e.to_string() });
        return Err(e);
      }
    };
    if let Err(e) = adapter.as_dyn().mount(container) {
      warn!(entry = entry.id, err = %e, "playback: mount failed");
      adapter.as_dyn().unmount(container);
      container.show(Surface::Broken { reason: e.to_string() });
      return Err(e);
    }

    info!(entry = entry.id, kind = %adapter.as_dyn().kind(), "playback: mounted");
    self.current = Some(Mounted { key, adapter });
    Ok(())
  }

  /// Unmount the live adapter, if any, and empty the container.
  pub fn release(&mut self, container: &mut Container) {
    if let Some(mut mounted) = self.current.take() {
      debug!(entry = mounted.key.id, "playback: unmounting");
      mounted.adapter.as_dyn().unmount(container);
    }
    container.clear();
  }

  pub fn poll(&mut self, container: &mut Container) {
    let Some(mounted) = self.current.as_mut() else { return };
    mounted.adapter.as_dyn().poll(container);
    if !mounted.adapter.is_mounted() {
      debug!(entry = mounted.key.id, "playback: adapter went away");
      self.current = None;
    }
  }

  pub fn status(&mut self) -> Option<String> {
    self.current.as_mut().and_then(|m| m.adapter.as_dyn().status())
  }

  pub fn current_key(&self) -> Option<MountKey> {
    self.current.as_ref().map(|m| m.key)
  }

  pub fn live_adapters(&mut self) -> usize {
    self.current.iter_mut().map(|m| m.adapter.is_mounted()).filter(|live| *live).count()
  }
}
