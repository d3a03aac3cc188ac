//! livescroll-tweets: a live-updating social search dashboard for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐ append  ┌──────────┐  newest(n)  ┌──────────┐
//! │ poll.rs  │ ──────► │ feed.rs  │ ◄────────── │  ui.rs   │
//! │ (task)   │         │ (shared) │             │ (render) │
//! └──────────┘         └──────────┘             └──────────┘
//!      │                                          ▲      │ publish()
//!      │ fetch_recent()          UiRequest::Redraw│      ▼
//!      ▼                                          │ ┌──────────┐
//! ┌──────────┐         ┌──────────┐ ──────────────┘ │DrawnFrame│
//! │ source/  │         │ input.rs │ ◄────────────── │ (shared) │
//! │ (HTTP)   │         │ (thread) │  entry_at_row() └──────────┘
//! └──────────┘         └──────────┘
//!                           │ open()
//!                           ▼
//!                      ┌──────────┐
//!                      │browser.rs│
//!                      └──────────┘
//! ```
//!
//! * **`source/`**: the `SearchApi` trait, pagination, and the Twitter/X
//!   recent-search client.
//! * **`poll`**: tokio task that fetches on a timer and appends to the feed.
//! * **`feed`**: the shared append-only feed and the current viewport size.
//! * **`ui`**: pure rendering: lays the newest entries out row by row and
//!   keeps the last drawn layout for click resolution.
//! * **`input`**: blocking event thread: clicks (resolved against the frame
//!   on screen), resizes, quit keys.
//! * **`main`**: wires everything together: load config, set up logging and
//!   the terminal, start the loops, and tear down in order.

mod age;
mod browser;
mod config;
mod error;
mod feed;
mod input;
mod poll;
mod shutdown;
mod source;
mod ui;

use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use browser::SystemBrowser;
use config::Config;
use feed::{Feed, Viewport};
use input::{InputHandler, UiRequest};
use ui::DrawnFrame;
use poll::Poller;
use shutdown::Shutdown;
use source::TwitterSearch;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages raw mode, the alternate screen and mouse capture via [`Drop`].
///
/// Constructing this struct enters all three.  When the value is dropped
/// (normally, on an error return, or during unwinding) the terminal is
/// restored.
struct TerminalGuard {
    terminal: Tui,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            self.terminal.backend_mut(),
            DisableMouseCapture,
            LeaveAlternateScreen
        );
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Send tracing output to `path`; the terminal itself belongs to the UI.
///
/// If the file can't be created the dashboard runs without logging.
fn init_logging(path: &Path) {
    let file = match File::create(path) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("logging disabled: cannot create {}: {e}", path.display());
            return;
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

// ---------------------------------------------------------------------------
// Render loop
// ---------------------------------------------------------------------------

/// Redraw every `interval`, or immediately when the input thread reports a
/// resize, until `shutdown` fires.
///
/// After each flush the layout that was drawn is published to `drawn`.
async fn render_loop(
    terminal: &mut Tui,
    feed: &Feed,
    viewport: &Viewport,
    drawn: &DrawnFrame,
    interval: Duration,
    mut ui_rx: UnboundedReceiver<UiRequest>,
    shutdown: &Shutdown,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            Some(UiRequest::Redraw) = ui_rx.recv() => terminal.autoresize()?,
            _ = shutdown.wait() => break,
        }

        let mut placements = Vec::new();
        let completed = terminal.draw(|f| placements = ui::draw(feed, f, Utc::now()))?;
        viewport.set(completed.area.width, completed.area.height);
        drawn.publish(placements);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    install_panic_hook();

    // -- configuration and logging -------------------------------------------
    let config = Config::load().context("failed to load configuration")?;
    init_logging(&config.log_path);
    info!(query = %config.query, api = %config.api_base, "starting");

    let api = Arc::new(
        TwitterSearch::new(&config.api_base, &config.token)
            .context("failed to build HTTP client")?,
    );

    // -- terminal setup (restored on drop) --------------------------------
    let mut guard = TerminalGuard::new()?;
    let size = guard.terminal.size()?;

    let feed = Feed::new();
    let viewport = Viewport::new(size.width, size.height);
    let drawn = DrawnFrame::new();
    let shutdown = Shutdown::new();

    // -- start background loops ----------------------------------------------
    let start_time = Utc::now() - config.lookback;
    let poller = Poller::new(api, feed.clone(), viewport.clone(), config.query.clone(), start_time);
    let poll_task = tokio::spawn(poller.run(config.poll_interval, shutdown.clone()));

    let (ui_tx, ui_rx) = tokio::sync::mpsc::unbounded_channel();
    let handler = InputHandler::new(drawn.clone(), viewport.clone(), SystemBrowser::new(), ui_tx);
    let input_thread = input::spawn(handler, shutdown.clone());

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.trigger();
            }
        });
    }

    // -- main render loop ----------------------------------------------------
    let result = render_loop(
        &mut guard.terminal,
        &feed,
        &viewport,
        &drawn,
        config.render_interval,
        ui_rx,
        &shutdown,
    )
    .await;

    // -- teardown ------------------------------------------------------------
    shutdown.trigger();
    if let Err(e) = poll_task.await {
        warn!(error = %e, "poller task ended abnormally");
    }
    if tokio::task::spawn_blocking(move || input_thread.join())
        .await
        .map_or(true, |joined| joined.is_err())
    {
        warn!("input thread ended abnormally");
    }

    drop(guard);
    info!(entries = feed.len(), "stopped");
    result
}
