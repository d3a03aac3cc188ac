//! Terminal input handling.
//!
//! Runs on its own OS thread because crossterm's event reader blocks.  The
//! thread waits for the next event, maps it to an action, and goes back to
//! waiting; it checks the shared [`Shutdown`] between events so it exits
//! together with the other loops.
//!
//! | Event                | Action                                         |
//! |----------------------|------------------------------------------------|
//! | left click on a row  | open that entry's permalink in the browser     |
//! | terminal resize      | record the new size, ask the render loop to redraw |
//! | `Esc`, `Ctrl-C`, `q` | shut everything down                           |
//!
//! Clicks are resolved against the [`DrawnFrame`] the render loop published
//! after its last flush, so a click opens the entry drawn on that row even if
//! the feed or the age labels have moved on since.
//!
//! ## For contributors
//!
//! * New keybindings go in `handle_key_event`; return [`Flow::Quit`] only
//!   for keys that should end the whole program.
//! * Anything the render loop must react to immediately becomes a new
//!   [`UiRequest`] variant, handled in `render_loop` in `main.rs`.

use std::thread;
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::browser::UrlOpener;
use crate::feed::Viewport;
use crate::shutdown::Shutdown;
use crate::ui::DrawnFrame;

/// How long a single wait for input may block before re-checking shutdown.
const EVENT_WAIT: Duration = Duration::from_millis(200);

/// Requests from the input thread to the render loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiRequest {
    /// The surface changed size; resize and redraw now.
    Redraw,
}

/// What the input loop should do after handling an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct InputHandler<O: UrlOpener> {
    frame: DrawnFrame,
    viewport: Viewport,
    opener: O,
    ui_tx: UnboundedSender<UiRequest>,
}

impl<O: UrlOpener> InputHandler<O> {
    pub fn new(
        frame: DrawnFrame,
        viewport: Viewport,
        opener: O,
        ui_tx: UnboundedSender<UiRequest>,
    ) -> Self {
        Self {
            frame,
            viewport,
            opener,
            ui_tx,
        }
    }

    /// Process a single terminal event.
    pub fn handle_event(&self, event: Event) -> Flow {
        match event {
            Event::Key(key) => handle_key_event(key),
            Event::Mouse(mouse) => {
                self.handle_mouse_event(mouse);
                Flow::Continue
            }
            Event::Resize(width, height) => {
                debug!(width, height, "terminal resized");
                self.viewport.set(width, height);
                // The render loop may already be gone during shutdown.
                let _ = self.ui_tx.send(UiRequest::Redraw);
                Flow::Continue
            }
            _ => Flow::Continue,
        }
    }

    fn handle_mouse_event(&self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let Some(entry) = self.frame.entry_at_row(mouse.row) else {
            return;
        };
        let url = entry.url();
        if url.is_empty() {
            return;
        }
        match self.opener.open(url) {
            Ok(()) => info!(url, "opened entry"),
            Err(e) => warn!(url, error = %e, "could not open entry"),
        }
    }
}

/// Only key presses count, so each physical keypress is one action.
fn handle_key_event(key: KeyEvent) -> Flow {
    if key.kind != KeyEventKind::Press {
        return Flow::Continue;
    }
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') => Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Flow::Quit,
        _ => Flow::Continue,
    }
}

/// Spawn the input thread.  It triggers `shutdown` when the user quits or the
/// terminal stops delivering events.
pub fn spawn<O>(handler: InputHandler<O>, shutdown: Shutdown) -> thread::JoinHandle<()>
where
    O: UrlOpener + 'static,
{
    thread::spawn(move || {
        while !shutdown.is_triggered() {
            let ready = match event::poll(EVENT_WAIT) {
                Ok(ready) => ready,
                Err(e) => {
                    error!(error = %e, "failed to poll terminal events");
                    break;
                }
            };
            if !ready {
                continue;
            }
            match event::read() {
                Ok(ev) => {
                    if handler.handle_event(ev) == Flow::Quit {
                        info!("quit requested");
                        break;
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to read terminal event");
                    break;
                }
            }
        }
        shutdown.trigger();
    })
}
