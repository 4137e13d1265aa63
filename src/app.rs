use anyhow::Result;
use image::DynamicImage;
use ratatui::widgets::ListState;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, StreamEntry};
use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::graphics::{FittedImage, fetch_image};
use crate::playback::{Container, PlaybackDispatcher, Surface};
use crate::resolver::StreamResolver;
use crate::routes::RouteTable;
use crate::share::{self, CopyFeedback, ShareLinks};
use crate::theme::THEMES;
use crate::thumbnail::{ThumbnailBoard, ThumbnailRefresher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  Browse,
  Goto,
  Share,
}

/// Preview image of the selected entry, refetched whenever its URL moves on.
#[derive(Default)]
pub struct Preview {
  pub url: Option<String>,
  pub image: Option<DynamicImage>,
  pub fitted: FittedImage,
  rx: Option<oneshot::Receiver<Result<DynamicImage>>>,
  task: Option<JoinHandle<()>>,
}

impl Preview {
  fn cancel(&mut self) {
    if let Some(task) = self.task.take() {
      task.abort();
    }
    self.rx = None;
  }
}

pub struct App {
  pub catalog: Arc<Catalog>,
  pub routes: RouteTable,
  /// Navigation view, ordered by id.
  pub entries: Vec<StreamEntry>,
  pub list_state: ListState,
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  pub container: Container,
  dispatcher: PlaybackDispatcher,
  pub thumbnails: ThumbnailBoard,
  pub preview: Preview,
  /// Resize cache for image-feed frames on the playback surface.
  pub surface_fit: FittedImage,
  /// Entry currently mounted in the container.
  pub current: Option<StreamEntry>,
  pub goto_input: String,
  pub goto_cursor: usize,
  pub goto_scroll: usize,
  pub copy_feedback: CopyFeedback,
  pub last_error: Option<String>,
  pub should_quit: bool,
  config: Config,
  http: Option<Client>,
  error_time: Option<Instant>,
}

impl App {
  pub fn new(
    catalog: Arc<Catalog>,
    routes: RouteTable,
    dispatcher: PlaybackDispatcher,
    config: Config,
    display_mode: DisplayMode,
    http: Option<Client>,
  ) -> Self {
    let theme_index =
      if let Some(ref name) = config.theme_name { THEMES.iter().position(|t| t.name == name).unwrap_or(0) } else { 0 };
    let entries = catalog.list_ordered();
    let mut thumbnails = ThumbnailBoard::new(ThumbnailRefresher::default());
    thumbnails.show(entries.iter());
    let mut list_state = ListState::default();
    if !entries.is_empty() {
      list_state.select(Some(0));
    }

    Self {
      catalog,
      routes,
      entries,
      list_state,
      mode: AppMode::Browse,
      theme_index,
      display_mode,
      container: Container::default(),
      dispatcher,
      thumbnails,
      preview: Preview::default(),
      surface_fit: FittedImage::default(),
      current: None,
      goto_input: String::new(),
      goto_cursor: 0,
      goto_scroll: 0,
      copy_feedback: CopyFeedback::default(),
      last_error: None,
      should_quit: false,
      config,
      http,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index is bounded by modular arithmetic in next_theme()
    // and by position() on initialization.
    &THEMES[self.theme_index]
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages once the dismiss time has passed.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= constants().error_dismiss()
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  pub fn selected_entry(&self) -> Option<&StreamEntry> {
    self.list_state.selected().and_then(|i| self.entries.get(i))
  }

  pub fn select_next(&mut self) {
    let count = self.entries.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_previous(&mut self) {
    let count = self.entries.len();
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }

  /// Route path of the mounted entry.
  pub fn current_path(&self) -> Option<&str> {
    self.current.as_ref().and_then(|e| self.routes.path_for(e.id))
  }

  /// Open a route path, or a bare id. Unknown targets, including paths outside
  /// the route prefix, show the default entry.
  pub fn navigate(&mut self, target: &str) {
    let catalog = Arc::clone(&self.catalog);
    let resolver = StreamResolver::new(&catalog);
    let resolved = match self.routes.lookup(target) {
      Some(id) => resolver.resolve(Some(id)),
      None => {
        let bare = Some(target.trim()).filter(|t| !t.contains('/'));
        resolver.resolve_raw(self.routes.entry_segment(target).or(bare))
      }
    };
    match resolved {
      Ok(entry) => {
        debug!(target = %target, entry = entry.id, "navigate");
        self.show_entry(entry.clone());
      }
      Err(e) => self.set_error(e.to_string()),
    }
  }

  pub fn play_selected(&mut self) {
    let Some(entry) = self.selected_entry().cloned() else { return };
    self.show_entry(entry);
  }

  fn show_entry(&mut self, entry: StreamEntry) {
    if let Some(i) = self.entries.iter().position(|e| e.id == entry.id) {
      self.list_state.select(Some(i));
    }
    if self.current.as_ref().is_some_and(|c| c.id != entry.id) {
      self.copy_feedback.reset();
    }
    self.clear_error();
    self.surface_fit.clear();
    if let Err(e) = self.dispatcher.dispatch(&entry, &mut self.container) {
      self.set_error(format!("Cannot play {}: {}", entry.label(), e));
    }
    self.current = Some(entry);
  }

  pub fn stop(&mut self) {
    if let Some(key) = self.dispatcher.current_key() {
      info!(entry = key.id, kind = %key.kind, "playback stopped");
    }
    self.current = None;
    self.dispatcher.release(&mut self.container);
    self.surface_fit.clear();
  }

  /// Latest status line from the mounted adapter.
  pub fn player_status(&mut self) -> Option<String> {
    self.dispatcher.status()
  }

  pub fn live_adapters(&mut self) -> usize {
    self.dispatcher.live_adapters()
  }

  /// URL a browser should open for the current surface.
  pub fn surface_url(&self) -> Option<&str> {
    match self.container.surface() {
      Surface::Embed { url } | Surface::Image { url, .. } => Some(url),
      Surface::Media { source, .. } => Some(source),
      Surface::Empty | Surface::Broken { .. } => None,
    }
  }

  pub fn open_surface_in_browser(&mut self) {
    let Some(url) = self.surface_url().map(str::to_string) else { return };
    if let Err(e) = share::open_in_browser(&url) {
      self.set_error(format!("Failed to open browser: {}", e));
    }
  }

  // --- Goto prompt ---

  pub fn begin_goto(&mut self) {
    let prefix = self.routes.prefix();
    self.goto_input = if prefix.is_empty() { "/".to_string() } else { format!("/{}/", prefix) };
    self.goto_cursor = self.goto_input.chars().count();
    self.goto_scroll = 0;
    self.mode = AppMode::Goto;
  }

  pub fn submit_goto(&mut self) {
    let target = std::mem::take(&mut self.goto_input);
    self.goto_cursor = 0;
    self.mode = AppMode::Browse;
    self.navigate(&target);
  }

  pub fn cancel_goto(&mut self) {
    self.goto_input.clear();
    self.goto_cursor = 0;
    self.mode = AppMode::Browse;
  }

  // --- Share ---

  pub fn share_links(&self) -> Option<ShareLinks> {
    let entry = self.current.as_ref()?;
    let path = self.routes.path_for(entry.id)?;
    Some(ShareLinks::new(share::page_url(self.config.site_origin(), path), share::share_title(entry)))
  }

  pub fn open_share(&mut self) {
    if self.current.is_some() {
      self.mode = AppMode::Share;
    }
  }

  pub fn close_share(&mut self) {
    self.mode = AppMode::Browse;
  }

  pub fn share_copy(&mut self) {
    if let Some(links) = self.share_links() {
      share::copy_link(&links.url, &mut self.copy_feedback);
    }
  }

  pub fn share_whatsapp(&mut self) {
    if let Some(links) = self.share_links()
      && let Err(e) = share::open_in_browser(&links.whatsapp())
    {
      warn!(err = %e, "share: whatsapp link failed");
    }
  }

  pub fn share_telegram(&mut self) {
    if let Some(links) = self.share_links()
      && let Err(e) = share::open_in_browser(&links.telegram())
    {
      warn!(err = %e, "share: telegram link failed");
    }
  }

  pub fn is_copied(&self) -> bool {
    self.copy_feedback.is_copied(Instant::now())
  }

  // --- Background work ---

  pub fn check_pending(&mut self) {
    self.dispatcher.poll(&mut self.container);
    self.refresh_preview();

    if let Some(mut rx) = self.preview.rx.take() {
      match rx.try_recv() {
        Ok(Ok(image)) => {
          self.preview.image = Some(image);
          self.preview.fitted.clear();
          self.preview.task = None;
        }
        Ok(Err(e)) => {
          // The previous preview stays up.
          debug!(err = %e, "preview: fetch failed");
          self.preview.task = None;
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.preview.rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.preview.task = None;
        }
      }
    }

    self.copy_feedback.expire(Instant::now());
    self.expire_error();
  }

  /// Start a fetch when the selected entry's preview URL differs from the one shown.
  fn refresh_preview(&mut self) {
    let Some(id) = self.selected_entry().map(|e| e.id) else { return };
    let Some(handle) = self.thumbnails.get_mut(id) else { return };
    let changed = handle.take_changed();
    let url = handle.current_url();
    if !changed && self.preview.url.as_deref() == Some(url.as_str()) {
      return;
    }
    if self.preview.url.as_deref() != Some(url.as_str()) {
      // Previous image belongs to another entry or an older timestamp; keep
      // it only while the same entry refreshes.
      let same_entry = self.preview.url.as_deref().is_some_and(|u| u.split('?').next() == url.split('?').next());
      if !same_entry {
        self.preview.image = None;
        self.preview.fitted.clear();
      }
    }
    self.preview.cancel();
    self.preview.url = Some(url.clone());

    let Some(client) = self.http.clone() else { return };
    let (tx, rx) = oneshot::channel();
    self.preview.task = Some(tokio::spawn(async move {
      let _ = tx.send(fetch_image(&client, &url).await);
    }));
    self.preview.rx = Some(rx);
  }

  /// Release everything that owns a task or a process.
  pub fn shutdown(&mut self) {
    self.dispatcher.release(&mut self.container);
    self.thumbnails.clear();
    self.preview.cancel();
  }
}
