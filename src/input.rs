use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  if key.modifiers.contains(KeyModifiers::CONTROL) {
    match key.code {
      KeyCode::Char('c') => {
        app.should_quit = true;
        return;
      }
      KeyCode::Char('t') => {
        app.next_theme();
        return;
      }
      KeyCode::Char('s') => {
        app.stop();
        return;
      }
      KeyCode::Char('o') => {
        app.open_surface_in_browser();
        return;
      }
      _ => {}
    }
  }

  match app.mode {
    AppMode::Browse => handle_browse_key(app, key),
    AppMode::Goto => handle_goto_key(app, key),
    AppMode::Share => handle_share_key(app, key),
  }
}

fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.play_selected(),
    KeyCode::Down | KeyCode::Char('j') => app.select_next(),
    KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
    KeyCode::Char('g') => app.begin_goto(),
    KeyCode::Char('s') => app.open_share(),
    KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
    _ => {}
  }
}

fn handle_goto_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => app.submit_goto(),
    KeyCode::Esc => app.cancel_goto(),
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.goto_input, app.goto_cursor);
      app.goto_input.insert(byte_idx, c);
      app.goto_cursor += 1;
    }
    KeyCode::Backspace => {
      if app.goto_cursor > 0 {
        app.goto_cursor -= 1;
        let byte_idx = char_to_byte_index(&app.goto_input, app.goto_cursor);
        app.goto_input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.goto_cursor < app.goto_input.chars().count() {
        let byte_idx = char_to_byte_index(&app.goto_input, app.goto_cursor);
        app.goto_input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.goto_cursor = app.goto_cursor.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.goto_cursor < app.goto_input.chars().count() {
        app.goto_cursor += 1;
      }
    }
    KeyCode::Home => {
      app.goto_cursor = 0;
    }
    KeyCode::End => {
      app.goto_cursor = app.goto_input.chars().count();
    }
    _ => {}
  }
}

fn handle_share_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Char('c') => app.share_copy(),
    KeyCode::Char('w') => app.share_whatsapp(),
    KeyCode::Char('t') => app.share_telegram(),
    KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('s') => app.close_share(),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6);
  }

  #[test]
  fn char_to_byte_empty() {
    assert_eq!(char_to_byte_index("", 5), 0);
  }

  // --- key handling ---

  use crate::app::tests::test_app;
  use ratatui::crossterm::event::KeyEvent;

  fn press(app: &mut App, code: KeyCode) {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
  }

  #[tokio::test]
  async fn goto_prompt_edits_and_navigates() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('g'));
    assert_eq!(app.mode, AppMode::Goto);
    press(&mut app, KeyCode::Char('2'));
    press(&mut app, KeyCode::Char('x'));
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.goto_input, "/quadra/2");
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.mode, AppMode::Browse);
    assert_eq!(app.current.as_ref().map(|e| e.id), Some(2));
  }

  #[tokio::test]
  async fn q_in_goto_prompt_is_text() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('g'));
    press(&mut app, KeyCode::Char('q'));
    assert!(!app.should_quit);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, AppMode::Browse);
    press(&mut app, KeyCode::Char('q'));
    assert!(app.should_quit);
  }

  #[tokio::test]
  async fn enter_plays_selection_and_ctrl_s_stops() {
    let mut app = test_app();
    press(&mut app, KeyCode::Char('j'));
    press(&mut app, KeyCode::Enter);
    assert_eq!(app.current.as_ref().map(|e| e.id), Some(3));
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    assert!(app.current.is_none());
    assert_eq!(app.live_adapters(), 0);
  }

  #[tokio::test]
  async fn share_popover_opens_and_closes() {
    let mut app = test_app();
    press(&mut app, KeyCode::Enter);
    press(&mut app, KeyCode::Char('s'));
    assert_eq!(app.mode, AppMode::Share);
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.mode, AppMode::Browse);
  }
}
