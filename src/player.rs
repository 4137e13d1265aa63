use anyhow::{Context, Result, anyhow};
use std::process::Stdio;
use tokio::{
  io::AsyncBufReadExt,
  io::BufReader as TokioBufReader,
  process::{Child as TokioChild, Command},
  sync::mpsc,
  task::JoinHandle,
};
use tracing::{info, warn};

use crate::playback::{MediaWidget, PlayerOptions};

/// Generic media widget backed by an `mpv` window.
#[derive(Default)]
pub struct MpvPlayer {
  current_process: Option<TokioChild>,
  monitor_handle: Option<JoinHandle<()>>,
  status_rx: Option<mpsc::Receiver<String>>,
  last_status: Option<String>,
}

impl MpvPlayer {
  pub fn new() -> Self {
    Self::default()
  }
}

/// mpv flags for the given presentation options.
pub fn mpv_args(source: &str, options: &PlayerOptions) -> Vec<String> {
  let mut args = vec![
    "--force-window=immediate".to_string(),
    "--term-status-msg=${time-pos/full} | ${media-title} | ${pause}".to_string(),
    format!("--pause={}", if options.autoplay { "no" } else { "yes" }),
    format!("--osc={}", if options.controls { "yes" } else { "no" }),
    format!("--mute={}", if options.muted { "yes" } else { "no" }),
  ];
  if options.responsive {
    args.push("--autofit-larger=90%x90%".to_string());
    args.push("--keepaspect-window=yes".to_string());
  }
  args.push("--".to_string());
  args.push(source.to_string());
  args
}

impl MediaWidget for MpvPlayer {
  fn start(&mut self, source: &str, options: &PlayerOptions) -> Result<()> {
    self.stop();

    let mut cmd = Command::new("mpv");
    cmd.args(mpv_args(source, options));
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    // Send stderr to null; if piped but never drained, the pipe buffer
    // fills and mpv blocks.
    cmd.stderr(Stdio::null());
    cmd.kill_on_drop(true);

    let mut child = cmd.spawn().map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        anyhow!("mpv not found. Install it with: brew install mpv (macOS) or apt install mpv (Linux)")
      } else {
        anyhow!(e).context("Failed to spawn mpv process")
      }
    })?;

    let stdout = child.stdout.take().context("Failed to get mpv stdout")?;
    let (tx, rx) = mpsc::channel::<String>(10);
    let monitor_handle = tokio::spawn(async move {
      let mut lines = TokioBufReader::new(stdout).lines();
      while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).await.is_err() {
          break;
        }
      }
    });

    info!(source = %source, "mpv: started");
    self.current_process = Some(child);
    self.monitor_handle = Some(monitor_handle);
    self.status_rx = Some(rx);
    Ok(())
  }

  fn stop(&mut self) {
    if let Some(handle) = self.monitor_handle.take() {
      handle.abort();
    }
    self.status_rx = None;
    self.last_status = None;

    if let Some(mut child) = self.current_process.take() {
      if let Err(e) = child.start_kill() {
        warn!(err = %e, "mpv: failed to kill process");
      }
      info!("mpv: stopped");
    }
  }

  fn is_running(&mut self) -> bool {
    let Some(child) = self.current_process.as_mut() else { return false };
    match child.try_wait() {
      Ok(None) => true,
      Ok(Some(status)) => {
        info!(status = %status, "mpv: exited");
        self.current_process = None;
        false
      }
      Err(e) => {
        warn!(err = %e, "mpv: cannot query process state");
        self.current_process = None;
        false
      }
    }
  }

  fn status(&mut self) -> Option<String> {
    if let Some(rx) = &mut self.status_rx {
      while let Ok(status) = rx.try_recv() {
        self.last_status = Some(status);
      }
    }
    self.last_status.clone()
  }
}

impl Drop for MpvPlayer {
  fn drop(&mut self) {
    self.stop();
  }
}
