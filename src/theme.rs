use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub muted: Color,
  pub accent: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "Clay",
    bg: Color::Rgb(28, 24, 22),
    fg: Color::Rgb(236, 228, 218),
    muted: Color::Rgb(150, 138, 126),
    accent: Color::Rgb(214, 118, 72),
    border: Color::Rgb(84, 72, 64),
    highlight_fg: Color::Rgb(28, 24, 22),
    highlight_bg: Color::Rgb(214, 118, 72),
    stripe_bg: Color::Rgb(36, 31, 28),
    status: Color::Rgb(230, 190, 110),
    error: Color::Rgb(232, 96, 88),
    key_fg: Color::Rgb(28, 24, 22),
    key_bg: Color::Rgb(150, 138, 126),
  },
  Theme {
    name: "Grass",
    bg: Color::Rgb(18, 28, 22),
    fg: Color::Rgb(224, 238, 228),
    muted: Color::Rgb(128, 154, 138),
    accent: Color::Rgb(75, 213, 115),
    border: Color::Rgb(56, 84, 66),
    highlight_fg: Color::Rgb(18, 28, 22),
    highlight_bg: Color::Rgb(75, 213, 115),
    stripe_bg: Color::Rgb(24, 36, 29),
    status: Color::Rgb(200, 220, 120),
    error: Color::Rgb(236, 104, 96),
    key_fg: Color::Rgb(18, 28, 22),
    key_bg: Color::Rgb(128, 154, 138),
  },
  Theme {
    name: "Hard Court",
    bg: Color::Rgb(16, 22, 36),
    fg: Color::Rgb(226, 232, 244),
    muted: Color::Rgb(132, 144, 170),
    accent: Color::Rgb(96, 160, 240),
    border: Color::Rgb(52, 64, 92),
    highlight_fg: Color::Rgb(16, 22, 36),
    highlight_bg: Color::Rgb(96, 160, 240),
    stripe_bg: Color::Rgb(22, 30, 46),
    status: Color::Rgb(236, 214, 120),
    error: Color::Rgb(240, 100, 110),
    key_fg: Color::Rgb(16, 22, 36),
    key_bg: Color::Rgb(132, 144, 170),
  },
];
