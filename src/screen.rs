use std::io::{self, Write};

/// How a piece of text should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Row captions such as `Input Stream :`.
    Label,
    /// Tokens as they arrive from the source.
    Input,
    /// Real tokens in the paced output.
    Spoken,
    /// Filler phrases in the paced output.
    Filler,
}

/// A character grid that text can be placed on.
pub trait Screen {
    /// Viewport size as `(width, height)` in cells.
    fn size(&self) -> (u16, u16);

    /// Writes `text` starting at `row`, `col`.
    fn put_str(&mut self, row: u16, col: u16, text: &str, style: Style) -> io::Result<()>;

    /// Makes pending writes visible.
    fn refresh(&mut self) -> io::Result<()>;
}

/// [`Screen`] that positions text with ANSI escape sequences.
///
/// Input and spoken tokens are yellow, fillers and labels green.
pub struct AnsiScreen<W: Write> {
    out: W,
    width: u16,
    height: u16,
}

impl AnsiScreen<io::Stdout> {
    /// Screen on stdout, sized from `COLUMNS`/`LINES` or 80x24.
    pub fn stdout() -> Self {
        let width = env_dimension("COLUMNS").unwrap_or(80);
        let height = env_dimension("LINES").unwrap_or(24);
        Self::new(io::stdout(), width, height)
    }
}

impl<W: Write> AnsiScreen<W> {
    pub fn new(out: W, width: u16, height: u16) -> Self {
        Self { out, width, height }
    }

    /// Overrides the viewport size where given.
    pub fn with_size(mut self, width: Option<u16>, height: Option<u16>) -> Self {
        self.width = width.unwrap_or(self.width);
        self.height = height.unwrap_or(self.height);
        self
    }

    /// Clears the viewport and homes the cursor.
    pub fn clear(&mut self) -> io::Result<()> {
        self.out.write_all(b"\x1b[2J\x1b[H")?;
        self.out.flush()
    }

    /// Moves the cursor below the viewport so a shell prompt does not
    /// overwrite the output.
    pub fn finish(&mut self) -> io::Result<()> {
        write!(self.out, "\x1b[{};1H\r\n", self.height)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Screen for AnsiScreen<W> {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn put_str(&mut self, row: u16, col: u16, text: &str, style: Style) -> io::Result<()> {
        let colour = match style {
            Style::Input | Style::Spoken => "33",
            Style::Label | Style::Filler => "32",
        };
        // ANSI positions are 1-based.
        write!(
            self.out,
            "\x1b[{};{}H\x1b[{}m{}\x1b[0m",
            row + 1,
            col + 1,
            colour,
            text
        )
    }

    fn refresh(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn env_dimension(name: &str) -> Option<u16> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .filter(|v| *v > 0)
}

/// In-memory [`Screen`] recording every write.
#[derive(Debug, Clone)]
pub struct BufferScreen {
    width: u16,
    height: u16,
    cells: Vec<Vec<char>>,
    writes: Vec<(u16, u16, String, Style)>,
}

impl BufferScreen {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![vec![' '; width as usize]; height as usize],
            writes: Vec::new(),
        }
    }

    /// Text of `row` with trailing blanks removed.
    pub fn row_text(&self, row: u16) -> String {
        self.cells
            .get(row as usize)
            .map(|r| r.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// Every `put_str` call in order as `(row, col, text, style)`.
    pub fn writes(&self) -> &[(u16, u16, String, Style)] {
        &self.writes
    }
}

impl Screen for BufferScreen {
    fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    fn put_str(&mut self, row: u16, col: u16, text: &str, style: Style) -> io::Result<()> {
        let Some(line) = self.cells.get_mut(row as usize) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("row {row} outside screen"),
            ));
        };
        // Text running past the right edge is clipped.
        for (cell, ch) in line.iter_mut().skip(col as usize).zip(text.chars()) {
            *cell = ch;
        }
        self.writes.push((row, col, text.to_string(), style));
        Ok(())
    }

    fn refresh(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_screen_places_and_clips_text() {
        let mut screen = BufferScreen::new(8, 2);
        screen.put_str(1, 2, "hello world", Style::Spoken).unwrap();
        assert_eq!(screen.row_text(0), "");
        assert_eq!(screen.row_text(1), "  hello");
        assert_eq!(screen.writes().len(), 1);
        assert!(screen.put_str(2, 0, "x", Style::Filler).is_err());
    }

    #[test]
    fn ansi_screen_emits_positioned_coloured_text() {
        let mut screen = AnsiScreen::new(Vec::new(), 80, 24);
        screen.put_str(0, 15, "hi", Style::Filler).unwrap();
        screen.refresh().unwrap();
        let out = String::from_utf8(screen.into_inner()).unwrap();
        assert_eq!(out, "\x1b[1;16H\x1b[32mhi\x1b[0m");
    }
}
