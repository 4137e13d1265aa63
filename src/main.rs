mod app;
mod catalog;
mod config;
mod constants;
mod display;
mod error;
mod graphics;
mod input;
mod playback;
mod player;
mod resolver;
mod routes;
mod share;
mod theme;
mod thumbnail;
mod ui;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use directories::ProjectDirs;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use catalog::Catalog;
use config::Config;
use constants::constants;
use display::CliDisplayMode;
use playback::{MediaWidget, PlaybackDispatcher, WidgetFactory};
use player::MpvPlayer;
use routes::{RouteTable, build_routes};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Catalog file (JSON, or TOML with a .toml extension). Defaults to the bundled catalog.
  #[arg(short, long)]
  catalog: Option<PathBuf>,

  /// Route to open on start, e.g. '/quadra/6'
  #[arg(short, long, default_value = "/")]
  route: String,

  /// Path segment for per-entry routes (default: 'quadra')
  #[arg(short, long)]
  prefix: Option<String>,

  /// Display mode: 'auto', 'direct', or 'ascii' (default: auto-detect)
  #[arg(short, long)]
  display_mode: Option<CliDisplayMode>,

  /// Print the route table and exit
  #[arg(long)]
  list_routes: bool,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<clap_complete::Shell>,
}

// --- Setup ---

/// Log to a file in the data dir; stdout belongs to the TUI.
fn init_logging() -> Option<WorkerGuard> {
  let app_name = &constants().app_name;
  let dirs = ProjectDirs::from("", "", app_name)?;
  let log_dir = dirs.data_dir();
  std::fs::create_dir_all(log_dir).ok()?;

  let appender = tracing_appender::rolling::never(log_dir, format!("{}.log", app_name));
  let (writer, guard) = tracing_appender::non_blocking(appender);
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).with_ansi(false).init();
  Some(guard)
}

fn load_catalog(args: &Args, config: &Config) -> Result<Catalog> {
  let path = args.catalog.as_deref().or(config.catalog_path.as_deref().map(Path::new));
  match path {
    Some(path) => Catalog::from_path(path),
    None => Catalog::bundled().context("Bundled catalog is malformed"),
  }
}

fn print_routes(catalog: &Catalog, routes: &RouteTable) {
  for route in routes.routes() {
    if let Some(entry) = catalog.get(route.entry_id) {
      println!("{:<16} {} ({})", route.path, entry.label(), entry.kind);
    }
  }
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), env!("CARGO_PKG_NAME"), &mut std::io::stdout());
    return Ok(());
  }

  let config = Config::load();
  let catalog = load_catalog(&args, &config)?;
  let prefix = args.prefix.as_deref().or(config.route_prefix.as_deref()).unwrap_or(&constants().route_prefix);
  let routes = build_routes(&catalog, prefix).context("Cannot start without a default stream")?;

  if args.list_routes {
    print_routes(&catalog, &routes);
    return Ok(());
  }

  let _log_guard = init_logging();
  info!(entries = catalog.len(), routes = routes.len(), "catalog loaded");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let result = run(&mut terminal, args, config, catalog, routes).await;
  ratatui::restore();
  result
}

async fn run(
  terminal: &mut DefaultTerminal,
  args: Args,
  config: Config,
  catalog: Catalog,
  routes: RouteTable,
) -> Result<()> {
  let cli_mode = args
    .display_mode
    .or_else(|| config.display_mode.as_deref().map(CliDisplayMode::from_config))
    .unwrap_or(CliDisplayMode::Auto);
  let display_mode = display::resolve_display_mode(cli_mode);

  let http =
    reqwest::Client::builder().timeout(Duration::from_secs(10)).build().context("Failed to build HTTP client")?;
  let widgets: WidgetFactory = Arc::new(|| Box::new(MpvPlayer::new()) as Box<dyn MediaWidget>);
  let dispatcher = PlaybackDispatcher::new(widgets, Some(http.clone()));

  let mut app = App::new(Arc::new(catalog), routes, dispatcher, config, display_mode, Some(http));
  app.navigate(&args.route);

  loop {
    app.check_pending();

    terminal.draw(|frame| ui::ui(frame, &mut app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(&mut app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  app.shutdown();
  Ok(())
}
