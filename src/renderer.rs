use std::io;
use std::sync::Mutex;

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::Utterance;
use crate::screen::{Screen, Style};

/// Column where words start on the first row of a region, leaving room for
/// the label.
pub const LABEL_WIDTH: u16 = 15;

/// Result of trying to place a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Placed,
    /// The region is full; nothing was written.
    Overflow,
}

/// Lays words out left to right inside a band of screen rows, wrapping at the
/// screen width.
#[derive(Debug, Clone)]
pub struct TranscriptRenderer {
    first_row: u16,
    end_row: u16,
    row: u16,
    col: u16,
}

impl TranscriptRenderer {
    /// Renderer for rows `first_row..end_row`; `end_row` is further capped by
    /// the screen height.
    pub fn new(first_row: u16, end_row: u16) -> Self {
        Self {
            first_row,
            end_row,
            row: first_row,
            col: LABEL_WIDTH,
        }
    }

    /// Writes `label` at the start of the region.
    pub fn write_label(&mut self, screen: &mut dyn Screen, label: &str) -> io::Result<Placement> {
        let (_, height) = screen.size();
        if self.first_row >= self.end_row.min(height) {
            return Ok(Placement::Overflow);
        }
        screen.put_str(self.first_row, 0, label, Style::Label)?;
        screen.refresh()?;
        Ok(Placement::Placed)
    }

    /// Places `text` after the previous word, moving to the next row when it
    /// would reach the right edge.
    pub fn place(
        &mut self,
        screen: &mut dyn Screen,
        text: &str,
        style: Style,
    ) -> io::Result<Placement> {
        let (width, height) = screen.size();
        let len = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
        if self.col.saturating_add(len).saturating_add(1) >= width {
            self.row = self.row.saturating_add(1);
            self.col = 0;
        }
        if self.row >= self.end_row.min(height) {
            return Ok(Placement::Overflow);
        }
        screen.put_str(self.row, self.col, text, style)?;
        screen.refresh()?;
        self.col = self.col.saturating_add(len).saturating_add(1);
        Ok(Placement::Placed)
    }

    /// Current `(row, col)` cursor.
    pub fn cursor(&self) -> (u16, u16) {
        (self.row, self.col)
    }
}

/// Counts reported by [`render_stream`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Words written to the screen.
    pub placed: usize,
    /// Whether rendering stopped because the region was full.
    pub truncated: bool,
}

/// Draws every item of `items` under `label`, styling each with `style_of`.
///
/// Rendering stops silently when the region overflows; the rest of the stream
/// is left unconsumed. Screen write failures are logged and returned. The
/// screen lock is only held while writing.
pub async fn render_stream<St, T, S>(
    mut items: St,
    screen: &Mutex<S>,
    mut renderer: TranscriptRenderer,
    label: &str,
    style_of: impl Fn(&T) -> Style,
) -> io::Result<RenderSummary>
where
    St: Stream<Item = T> + Unpin,
    T: AsRef<str>,
    S: Screen,
{
    let mut summary = RenderSummary::default();
    let labelled = {
        let mut screen = lock(screen)?;
        renderer.write_label(&mut *screen, label)
    }
    .inspect_err(|e| warn!(label, error = %e, "render failed"))?;
    if labelled == Placement::Overflow {
        summary.truncated = true;
        return Ok(summary);
    }
    while let Some(item) = items.next().await {
        let placement = {
            let mut screen = lock(screen)?;
            renderer.place(&mut *screen, item.as_ref(), style_of(&item))
        }
        .inspect_err(|e| warn!(label, placed = summary.placed, error = %e, "render failed"))?;
        match placement {
            Placement::Placed => summary.placed += 1,
            Placement::Overflow => {
                debug!(label, placed = summary.placed, "viewport full, truncating");
                summary.truncated = true;
                break;
            }
        }
    }
    Ok(summary)
}

/// Style used for paced output: fillers stand out from real tokens.
pub fn utterance_style(u: &Utterance) -> Style {
    if u.is_filler() {
        Style::Filler
    } else {
        Style::Spoken
    }
}

fn lock<S>(screen: &Mutex<S>) -> io::Result<std::sync::MutexGuard<'_, S>> {
    screen
        .lock()
        .map_err(|_| io::Error::other("screen lock poisoned"))
}
