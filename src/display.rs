use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
}

impl CliDisplayMode {
  /// Preference-file spelling; unknown values mean auto-detect.
  pub fn from_config(s: &str) -> Self {
    match s.to_lowercase().as_str() {
      "direct" => CliDisplayMode::Direct,
      "ascii" => CliDisplayMode::Ascii,
      _ => CliDisplayMode::Auto,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  Ascii,
  Direct,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
    }
  }
}

/// Detect the best display mode the terminal supports.
///
/// - Direct: `COLORTERM` is `truecolor` or `24bit`
/// - Ascii: fallback
pub fn detect_display_mode() -> DisplayMode {
  let colorterm = std::env::var("COLORTERM").unwrap_or_default().to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" {
    return DisplayMode::Direct;
  }
  DisplayMode::Ascii
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn from_config_known_modes() {
    assert!(matches!(CliDisplayMode::from_config("Direct"), CliDisplayMode::Direct));
    assert!(matches!(CliDisplayMode::from_config("ascii"), CliDisplayMode::Ascii));
  }

  #[test]
  fn from_config_unknown_is_auto() {
    assert!(matches!(CliDisplayMode::from_config("kitty"), CliDisplayMode::Auto));
    assert!(matches!(CliDisplayMode::from_config(""), CliDisplayMode::Auto));
  }

  #[test]
  fn explicit_modes_skip_detection() {
    assert_eq!(resolve_display_mode(CliDisplayMode::Ascii), DisplayMode::Ascii);
    assert_eq!(resolve_display_mode(CliDisplayMode::Direct), DisplayMode::Direct);
  }
}
