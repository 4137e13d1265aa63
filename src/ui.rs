use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, Padding, Paragraph},
};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::graphics::ThumbnailWidget;
use crate::playback::Surface;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

fn panel<'a>(theme: &Theme, title: impl Into<Line<'a>>) -> Block<'a> {
  Block::bordered()
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(theme.border))
}

/// Centered rectangle of at most `width` x `height` inside `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
  let w = width.min(area.width);
  let h = height.min(area.height);
  Rect { x: area.x + (area.width - w) / 2, y: area.y + (area.height - h) / 2, width: w, height: h }
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);

  let [nav_area, right_area] =
    Layout::horizontal([Constraint::Percentage(34), Constraint::Percentage(66)]).areas(main_area);
  render_nav(frame, app, nav_area);
  let [surface_area, preview_area] =
    Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(right_area);
  render_surface(frame, app, surface_area);
  render_preview(frame, app, preview_area);

  render_status(frame, app, status_area);
  render_goto(frame, app, input_area);
  render_footer(frame, app, footer_area);

  if app.mode == AppMode::Share {
    render_share(frame, app, main_area);
  }
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let title = format!(" ▶ {} ", constants().site_name);
  let left = Line::from(Span::styled(title, Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(version.len() as u16), width: version.len() as u16, ..area };
  frame.render_widget(right, right_area);
}

fn render_nav(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let current_id = app.current.as_ref().map(|e| e.id);

  let items: Vec<ListItem> = app
    .entries
    .iter()
    .enumerate()
    .map(|(i, entry)| {
      let is_selected = Some(i) == app.list_state.selected();
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let marker = if current_id == Some(entry.id) { "● " } else { "  " };
      let live = app.thumbnails.get(entry.id).is_some_and(|h| h.is_active());
      let tag = if live { format!("↻ {}", entry.kind.label()) } else { entry.kind.label().to_string() };
      let label_max = inner_w.saturating_sub(tag.chars().count() + marker.chars().count() + 2);
      let label = truncate_str(&entry.label(), label_max);
      let gap = inner_w.saturating_sub(marker.chars().count() + label.chars().count() + tag.chars().count());

      let line = Line::from(vec![
        Span::styled(marker, Style::default().fg(theme.accent)),
        Span::styled(label, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(tag, Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let title = format!(" Courts ({}) ", app.entries.len());
  let list = List::new(items)
    .block(panel(theme, title))
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_surface(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let mut title = vec![Span::styled(" Now Showing ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))];
  if let Some(path) = app.current_path() {
    title.push(Span::styled(format!("{} ", path), Style::default().fg(theme.muted)));
  }
  let block = panel(theme, Line::from(title)).padding(Padding::horizontal(1));
  let inner = block.inner(area);
  let inner_w = inner.width as usize;
  frame.render_widget(block, area);

  let label = app.current.as_ref().map(|e| e.label()).unwrap_or_default();
  let heading = Line::from(Span::styled(
    truncate_str(&label, inner_w),
    Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
  ));
  let link = |url: &str| {
    Line::from(Span::styled(
      truncate_str(url, inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    ))
  };
  let hint = |text: &str| Line::from(Span::styled(text.to_string(), Style::default().fg(theme.muted)));

  let status = app.player_status();
  match app.container.surface() {
    Surface::Empty => {
      let text = vec![
        Line::from(""),
        Line::from(Span::styled("Nothing playing", Style::default().fg(theme.fg))),
        Line::from(""),
        hint("Pick a court and press Enter, or g to go to a route."),
      ];
      frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), inner);
    }
    Surface::Embed { url } => {
      let text = vec![
        Line::from(""),
        heading,
        hint("Embedded live video"),
        Line::from(""),
        link(url),
        Line::from(""),
        hint("^o opens the player in your browser"),
      ];
      frame.render_widget(Paragraph::new(text), inner);
    }
    Surface::Media { source, options } => {
      let flags = format!(
        "{}{}{}",
        if options.autoplay { "autoplay " } else { "" },
        if options.muted { "muted " } else { "" },
        if options.controls { "controls" } else { "" }
      );
      let mut text = vec![Line::from(""), heading, hint("Live stream in mpv"), Line::from(""), link(source)];
      text.push(Line::from(vec![
        Span::styled("Player    ", Style::default().fg(theme.muted)),
        Span::styled(flags.trim_end().to_string(), Style::default().fg(theme.fg)),
      ]));
      if let Some(status) = status {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(format!("♪ {}", status), Style::default().fg(theme.status))));
      }
      frame.render_widget(Paragraph::new(text), inner);
    }
    Surface::Image { url, frame: image } => {
      let [image_area, url_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
      match image {
        Some(image) => {
          let fitted = app.surface_fit.get(url, image, image_area, app.display_mode);
          frame.render_widget(ThumbnailWidget { image: fitted, display_mode: app.display_mode }, image_area);
        }
        None => {
          frame.render_widget(Paragraph::new(hint("Loading image…")).alignment(Alignment::Center), image_area);
        }
      }
      frame.render_widget(Paragraph::new(link(url)), url_area);
    }
    Surface::Broken { reason } => {
      let text = vec![
        Line::from(""),
        heading,
        Line::from(Span::styled("This stream cannot be played.", Style::default().fg(theme.error))),
        Line::from(""),
        Line::from(Span::styled(reason.clone(), Style::default().fg(theme.muted))),
      ];
      frame.render_widget(Paragraph::new(text).wrap(ratatui::widgets::Wrap { trim: true }), inner);
    }
  }
}

fn render_preview(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let title = format!(" Preview [{}] ", app.display_mode.label().to_lowercase());
  let block = panel(theme, title);
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let [image_area, url_area] = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(inner);
  if let (Some(url), Some(image)) = (app.preview.url.as_deref(), app.preview.image.as_ref()) {
    let fitted = app.preview.fitted.get(url, image, image_area, app.display_mode);
    frame.render_widget(ThumbnailWidget { image: fitted, display_mode: app.display_mode }, image_area);
  }
  let refreshed = app
    .selected_entry()
    .and_then(|e| app.thumbnails.get(e.id))
    .and_then(|h| chrono::DateTime::from_timestamp_millis(h.state().last_refreshed_at))
    .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S ").to_string())
    .unwrap_or_default();
  if let Some(url) = app.preview.url.as_deref() {
    let url_w = (url_area.width as usize).saturating_sub(refreshed.chars().count());
    let line = Line::from(vec![
      Span::styled(refreshed, Style::default().fg(theme.status)),
      Span::styled(truncate_str(url, url_w), Style::default().fg(theme.muted)),
    ]);
    frame.render_widget(Paragraph::new(line), url_area);
  }
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(entry) = &app.current {
    (format!(" ▶ {} ({})", entry.label(), entry.kind.label()), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_goto(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let active = app.mode == AppMode::Goto;
  let border_color = if active { theme.accent } else { theme.border };
  let block = Block::bordered()
    .title(" Go to ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  if !active {
    let shown = app.current_path().unwrap_or("").to_string();
    frame.render_widget(Paragraph::new(shown).style(Style::default().fg(theme.muted)).block(block), area);
    return;
  }

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.goto_input, app.goto_cursor);

  if cursor_col < app.goto_scroll {
    app.goto_scroll = cursor_col;
  } else if cursor_col >= app.goto_scroll + inner_w {
    app.goto_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .goto_input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.goto_scroll)
    .take_while(|(start, _, _)| *start < app.goto_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  frame.render_widget(Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(block), area);
  let cursor_x = area.x + 2 + (cursor_col - app.goto_scroll) as u16;
  frame.set_cursor_position((cursor_x, area.y + 1));
}

fn render_share(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let Some(links) = app.share_links() else { return };
  let popup = centered(area, 64, 9);
  let inner_w = popup.width.saturating_sub(4) as usize;

  let copy_label = if app.is_copied() { "Copied!" } else { "Copy link" };
  let key = |k: &str| Span::styled(format!(" {} ", k), Style::default().fg(theme.key_fg).bg(theme.key_bg));
  let action = |a: &str| Span::styled(format!(" {}  ", a), Style::default().fg(theme.muted));

  let text = vec![
    Line::from(Span::styled(
      truncate_str(&links.title, inner_w),
      Style::default().fg(theme.fg).add_modifier(Modifier::BOLD),
    )),
    Line::from(Span::styled(
      truncate_str(&links.url, inner_w),
      Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
    )),
    Line::from(""),
    Line::from(vec![key("c"), action(copy_label), key("w"), action("WhatsApp"), key("t"), action("Telegram")]),
    Line::from(""),
    Line::from(vec![key("Esc"), action("Close")]),
  ];

  frame.render_widget(Clear, popup);
  let block = panel(theme, " Share ").padding(Padding::horizontal(1)).style(Style::default().bg(theme.bg));
  frame.render_widget(Paragraph::new(text).block(block), popup);
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let is_playing = app.current.is_some();
  let keys: Vec<(&str, &str)> = match app.mode {
    AppMode::Browse => {
      let mut k = vec![("Enter", "Play"), ("j/k", "Navigate"), ("g", "Go to")];
      if is_playing {
        k.push(("s", "Share"));
        k.push(("^o", "Browser"));
        k.push(("^s", "Stop"));
      }
      k.push(("^t", "Theme"));
      k.push(("q", "Quit"));
      k
    }
    AppMode::Goto => vec![("Enter", "Open"), ("Esc", "Cancel")],
    AppMode::Share => vec![("c", "Copy"), ("w", "WhatsApp"), ("t", "Telegram"), ("Esc", "Close")],
  };

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_area =
    Rect { x: area.x + area.width.saturating_sub(theme_label.len() as u16), width: theme_label.len() as u16, ..area };
  frame.render_widget(right, right_area);
}
