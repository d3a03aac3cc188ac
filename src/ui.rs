//! Terminal UI rendering.
//!
//! Each frame is a pure projection of the feed: the newest entry starts on
//! the top row and every following entry is one step older.  Long lines wrap
//! onto as many rows as they need; whatever falls past the bottom edge is
//! clipped.  [`draw`] returns the placements it drew, and the render loop
//! publishes them through [`DrawnFrame`] so clicks resolve against the frame
//! on screen rather than a fresh layout.
//!
//! ## For contributors
//!
//! * Each [`FeedEntry`] variant gets its colours in `entry_style`; the text
//!   of a row comes from [`display_line`], which only uses the variant-neutral
//!   accessors on `FeedEntry`.
//! * Anything that changes how many rows an entry takes must go through
//!   [`layout`], otherwise click targets drift from what was drawn.

use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    Frame,
};
use unicode_width::UnicodeWidthChar;

use crate::age::{elapsed_secs, format_age};
use crate::feed::Feed;
use crate::source::FeedEntry;

/// One entry placed on screen.
#[derive(Debug, Clone)]
pub struct Placement {
    pub entry: Arc<FeedEntry>,
    /// First screen row occupied by the entry.
    pub top: u16,
    /// The wrapped, already-clipped rows of text.
    pub lines: Vec<String>,
}

impl Placement {
    fn contains_row(&self, row: u16) -> bool {
        row >= self.top && usize::from(row - self.top) < self.lines.len()
    }
}

/// `[<source>] <age> - <handle>: <text>`
pub fn display_line(entry: &FeedEntry, now: DateTime<Utc>) -> String {
    let age = format_age(elapsed_secs(entry.created_at(), now));
    format!(
        "[{}] {} - {}: {}",
        entry.source_tag(),
        age,
        entry.author_handle(),
        entry.text()
    )
}

/// Split `text` into rows no wider than `width` terminal cells.
pub fn wrap_cells(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width);
    let mut rows = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width && !current.is_empty() {
            rows.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += w;
    }
    if !current.is_empty() || rows.is_empty() {
        rows.push(current);
    }
    rows
}

/// Place `window` (newest first) onto a `width` x `height` screen.
pub fn layout(
    window: &[Arc<FeedEntry>],
    width: u16,
    height: u16,
    now: DateTime<Utc>,
) -> Vec<Placement> {
    let mut placements = Vec::new();
    if width == 0 {
        return placements;
    }

    let mut row: u16 = 0;
    for entry in window {
        if row >= height {
            break;
        }
        let mut lines = wrap_cells(&display_line(entry, now), width);
        lines.truncate(usize::from(height - row));
        let used = lines.len() as u16;

        placements.push(Placement {
            entry: Arc::clone(entry),
            top: row,
            lines,
        });
        row += used;
    }
    placements
}

/// The entry drawn on `row`, if any.
pub fn entry_at_row(placements: &[Placement], row: u16) -> Option<&Arc<FeedEntry>> {
    placements
        .iter()
        .find(|p| p.contains_row(row))
        .map(|p| &p.entry)
}

/// The placements of the frame most recently flushed to the terminal.
///
/// Written by the render loop after every draw, read by the input thread.
#[derive(Clone, Default)]
pub struct DrawnFrame {
    placements: Arc<RwLock<Vec<Placement>>>,
}

impl DrawnFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, placements: Vec<Placement>) {
        *self.placements.write().unwrap_or_else(PoisonError::into_inner) = placements;
    }

    /// The entry that was drawn on `row` in the last published frame.
    pub fn entry_at_row(&self, row: u16) -> Option<Arc<FeedEntry>> {
        let placements = self.placements.read().unwrap_or_else(PoisonError::into_inner);
        entry_at_row(&placements, row).cloned()
    }
}

fn entry_style(entry: &FeedEntry) -> Style {
    match entry {
        FeedEntry::Twitter(_) => Style::default().fg(Color::White).bg(Color::Blue),
    }
}

/// Draw the complete UI for one frame and return what was placed where.
pub fn draw(feed: &Feed, frame: &mut Frame, now: DateTime<Utc>) -> Vec<Placement> {
    let area = frame.area();
    render_feed(feed, area, frame.buffer_mut(), now)
}

fn render_feed(feed: &Feed, area: Rect, buf: &mut Buffer, now: DateTime<Utc>) -> Vec<Placement> {
    // Every entry takes at least one row, so `height` entries always suffice.
    let window = feed.newest(usize::from(area.height));
    let placements = layout(&window, area.width, area.height, now);
    for placement in &placements {
        let style = entry_style(&placement.entry);
        for (offset, line) in placement.lines.iter().enumerate() {
            buf.set_string(area.x, area.y + placement.top + offset as u16, line, style);
        }
    }
    placements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::fake::post;
    use chrono::TimeZone;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    /// `post()` stamps entries at 1_700_000_000 + secs.
    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn display_line_has_tag_age_handle_and_text() {
        let entry = post("1", 0, "ferris", "hello crabs");
        assert_eq!(display_line(&entry, at(65)), "[Twitter] 1m 5s - ferris: hello crabs");
    }

    #[test]
    fn wrap_splits_on_cell_width() {
        assert_eq!(wrap_cells("abcdefg", 3), ["abc", "def", "g"]);
        assert_eq!(wrap_cells("abc", 3), ["abc"]);
        assert_eq!(wrap_cells("", 3), [""]);
    }

    #[test]
    fn wrap_counts_wide_characters_as_two_cells() {
        assert_eq!(wrap_cells("日本語", 4), ["日本", "語"]);
    }

    #[test]
    fn layout_puts_newest_on_top() {
        let window: Vec<_> = (1..=3).rev().map(|i| Arc::new(post(&i.to_string(), i, "a", "x"))).collect();
        let placed = layout(&window, 80, 10, at(10));

        let tops: Vec<_> = placed.iter().map(|p| (p.entry.id().to_string(), p.top)).collect();
        assert_eq!(tops, [("3".into(), 0), ("2".into(), 1), ("1".into(), 2)]);
    }

    #[test]
    fn wrapped_entries_push_later_ones_down_and_clip_at_bottom() {
        let long = "y".repeat(60);
        let window = vec![
            Arc::new(post("2", 2, "a", &long)),
            Arc::new(post("1", 1, "a", &long)),
        ];
        // "[Twitter] 8s - a: " is 18 cells, so each line is 78 cells = 4 rows of 20.
        let placed = layout(&window, 20, 6, at(10));

        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].top, 0);
        assert_eq!(placed[0].lines.len(), 4);
        assert_eq!(placed[1].top, 4);
        assert_eq!(placed[1].lines.len(), 2, "clipped at the bottom edge");
    }

    #[test]
    fn layout_stops_when_screen_is_full() {
        let window: Vec<_> = (0..10).map(|i| Arc::new(post(&i.to_string(), i, "a", "x"))).collect();
        assert_eq!(layout(&window, 80, 4, at(20)).len(), 4);
        assert!(layout(&window, 0, 4, at(20)).is_empty());
    }

    #[test]
    fn entry_at_row_covers_every_wrapped_row() {
        let window = vec![
            Arc::new(post("2", 2, "a", &"z".repeat(30))),
            Arc::new(post("1", 1, "a", "short")),
        ];
        let placed = layout(&window, 20, 10, at(5));

        assert_eq!(entry_at_row(&placed, 0).unwrap().id(), "2");
        assert_eq!(entry_at_row(&placed, 2).unwrap().id(), "2");
        assert_eq!(entry_at_row(&placed, 3).unwrap().id(), "1");
        assert!(entry_at_row(&placed, 9).is_none());
    }

    // -- rendering -----------------------------------------------------------

    #[test]
    fn draw_does_not_panic_with_no_items() {
        let feed = Feed::new();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| {
            draw(&feed, f, at(0));
        })
        .unwrap();
    }

    #[test]
    fn draw_renders_newest_first() {
        let feed = Feed::new();
        feed.append(vec![post("1", 0, "old", "first"), post("2", 5, "new", "second")]);

        let mut terminal = Terminal::new(TestBackend::new(60, 5)).unwrap();
        terminal.draw(|f| {
            draw(&feed, f, at(10));
        })
        .unwrap();

        let buf = terminal.backend().buffer().clone();
        assert_eq!(row_text(&buf, 0), "[Twitter] 5s - new: second");
        assert_eq!(row_text(&buf, 1), "[Twitter] 10s - old: first");
        assert_eq!(row_text(&buf, 2), "");
    }

    #[test]
    fn drawn_frame_answers_from_the_published_placements() {
        let feed = Feed::new();
        feed.append(vec![post("1", 0, "old", "first"), post("2", 5, "new", "second")]);
        let drawn = DrawnFrame::new();
        assert!(drawn.entry_at_row(0).is_none(), "nothing drawn yet");

        let mut terminal = Terminal::new(TestBackend::new(60, 5)).unwrap();
        terminal.draw(|f| drawn.publish(draw(&feed, f, at(10)))).unwrap();

        // Later appends don't move what is already on screen.
        feed.append(vec![post("3", 9, "newer", "third")]);
        assert_eq!(drawn.entry_at_row(0).unwrap().id(), "2");
        assert_eq!(drawn.entry_at_row(1).unwrap().id(), "1");
        assert!(drawn.entry_at_row(2).is_none());
    }

    #[test]
    fn draw_shows_only_the_most_recent_window() {
        let feed = Feed::new();
        feed.append((0..10).map(|i| post(&i.to_string(), i, "a", &format!("n{i}"))));

        let mut terminal = Terminal::new(TestBackend::new(40, 3)).unwrap();
        terminal.draw(|f| {
            draw(&feed, f, at(10));
        })
        .unwrap();

        let buf = terminal.backend().buffer().clone();
        assert!(row_text(&buf, 0).ends_with("n9"));
        assert!(row_text(&buf, 2).ends_with("n7"));
    }
}
